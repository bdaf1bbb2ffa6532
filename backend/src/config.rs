//! Runtime configuration from the environment.
//!
//! `.env` files are loaded by the binary through `dotenvy` before
//! [`Config::from_env`] is called; CLI flags override what is read here.

use std::env;
use std::path::PathBuf;

/// Dataset location, relative to the working directory by default.
pub const DEFAULT_DATASET_PATH: &str = "BBDD.xlsx";
pub const DEFAULT_PORT: u16 = 3000;

pub const DATASET_ENV: &str = "BUSCADOR_DATASET";
pub const PORT_ENV: &str = "BUSCADOR_PORT";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub dataset_path: PathBuf,
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dataset_path: PathBuf::from(DEFAULT_DATASET_PATH),
            port: DEFAULT_PORT,
        }
    }
}

impl Config {
    /// Read `BUSCADOR_DATASET` and `BUSCADOR_PORT`, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let dataset_path = lookup(DATASET_ENV)
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.dataset_path);

        // An unparsable port falls back to the default
        let port = lookup(PORT_ENV)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(defaults.port);

        Self { dataset_path, port }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        assert_eq!(Config::from_lookup(lookup(&[])), Config::default());
        assert_eq!(Config::default().dataset_path, PathBuf::from("BBDD.xlsx"));
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            (DATASET_ENV, "/data/proyectos.csv"),
            (PORT_ENV, "8080"),
        ]));
        assert_eq!(config.dataset_path, PathBuf::from("/data/proyectos.csv"));
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_bad_port_and_blank_path() {
        let config = Config::from_lookup(lookup(&[(DATASET_ENV, "  "), (PORT_ENV, "puerto")]));
        assert_eq!(config, Config::default());
    }
}
