//! Buscador CLI - Search the cooperation projects spreadsheet
//!
//! # Commands
//!
//! ```bash
//! buscador serve                               # Start HTTP server (port 3000)
//! buscador search BBDD.xlsx --keywords agua    # Search and print results as JSON
//! buscador options BBDD.xlsx -d Cauca          # Option lists for every filter
//! buscador inspect BBDD.xlsx                   # Columns, row count, source info
//! ```
//!
//! The dataset defaults to `BUSCADOR_DATASET` (or `BBDD.xlsx`) when no file
//! is given. A `.env` file in the working directory is honoured.

use buscador::{
    compute_results, filter_options, parse_criteria_str, write_xlsx, Config, CriteriaError, DatasetCache,
    DateRange, FilterCriteria, SchemaResponse, SearchResponse, Selection,
};
use buscador::transform::{end_date_bounds, parse_iso_date};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "buscador")]
#[command(about = "Search and summarize development cooperation projects", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show recognised columns, row count and source info
    Inspect {
        /// Dataset file (.xlsx, .xls, .ods, .csv)
        input: Option<PathBuf>,
    },

    /// Print the option lists of every filter as JSON
    Options {
        /// Dataset file (.xlsx, .xls, .ods, .csv)
        input: Option<PathBuf>,

        /// Selected departments, to narrow municipalities
        #[arg(short, long = "department")]
        departments: Vec<String>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Filter the dataset and print rows, summaries and chart series as JSON
    Search(SearchArgs),

    /// Start HTTP server
    Serve {
        /// Port to listen on (default: BUSCADOR_PORT or 3000)
        #[arg(short, long)]
        port: Option<u16>,

        /// Dataset file (default: BUSCADOR_DATASET or BBDD.xlsx)
        #[arg(long)]
        dataset: Option<PathBuf>,
    },
}

#[derive(Args)]
struct SearchArgs {
    /// Dataset file (.xlsx, .xls, .ods, .csv)
    input: Option<PathBuf>,

    /// Comma-separated keywords matched in name and general objective
    #[arg(short, long)]
    keywords: Option<String>,

    /// Start year (repeatable; "Todos" for all)
    #[arg(short, long = "year")]
    years: Vec<String>,

    #[arg(short, long = "department")]
    departments: Vec<String>,

    #[arg(short, long = "municipality")]
    municipalities: Vec<String>,

    #[arg(long = "actor-first-level")]
    actor_first_level: Vec<String>,

    #[arg(long = "actor-second-level")]
    actor_second_level: Vec<String>,

    #[arg(long = "actor")]
    actor_names: Vec<String>,

    #[arg(long = "origin")]
    actor_origins: Vec<String>,

    #[arg(long)]
    ods: Vec<String>,

    #[arg(long = "status")]
    statuses: Vec<String>,

    /// Government sector (`SECTORES GOB`)
    #[arg(long = "sector")]
    sectors: Vec<String>,

    /// Earliest end date, YYYY-MM-DD
    #[arg(long)]
    end_from: Option<String>,

    /// Latest end date, YYYY-MM-DD
    #[arg(long)]
    end_to: Option<String>,

    /// Criteria JSON file; flags given on the command line take precedence
    #[arg(short, long)]
    criteria: Option<PathBuf>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Also write the filtered rows as an .xlsx workbook
    #[arg(short, long)]
    export: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let config = Config::from_env();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Inspect { input } => cmd_inspect(&dataset_path(input, &config)),

        Commands::Options {
            input,
            departments,
            output,
        } => cmd_options(&dataset_path(input, &config), departments, output.as_deref()),

        Commands::Search(args) => {
            let path = dataset_path(args.input.clone(), &config);
            cmd_search(&path, args)
        }

        Commands::Serve { port, dataset } => {
            let port = port.unwrap_or(config.port);
            cmd_serve(&dataset_path(dataset, &config), port).await
        }
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn dataset_path(input: Option<PathBuf>, config: &Config) -> PathBuf {
    input.unwrap_or_else(|| config.dataset_path.clone())
}

fn cmd_inspect(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Inspecting: {}", input.display());

    let dataset = DatasetCache::new(input).get_or_load()?;
    let source = dataset.source();

    eprintln!("   Format: {}", source.format);
    if let Some(ref sheet) = source.sheet_name {
        eprintln!("   Sheet: {}", sheet);
    }
    if let Some(ref encoding) = source.encoding {
        eprintln!("   Encoding: {}", encoding);
    }
    if let Some(delimiter) = source.delimiter {
        eprintln!("   Delimiter: '{}'", format_delimiter(delimiter));
    }
    eprintln!("   Rows: {}", dataset.len());
    eprintln!("   Columns: {}", dataset.headers().join(", "));

    let response = SchemaResponse::new(&dataset, &Value::Null);
    if !response.missing.is_empty() {
        eprintln!("   ⚠️  Missing: {}", response.missing.join(", "));
    }

    let json = serde_json::to_string_pretty(&response)?;
    write_output(&json, None)
}

fn cmd_options(
    input: &Path,
    departments: Vec<String>,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let dataset = DatasetCache::new(input).get_or_load()?;

    // String parsing cannot fail
    let selection = Selection::parse(&departments).unwrap_or_default();
    let options = filter_options(&dataset, &selection);
    eprintln!(
        "📋 {} years, {} departments, {} municipalities",
        options.years.len(),
        options.departments.len(),
        options.municipalities.len()
    );

    let json = serde_json::to_string_pretty(&options)?;
    write_output(&json, output)
}

fn cmd_search(input: &Path, args: SearchArgs) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("🔎 Searching: {}", input.display());

    let dataset = DatasetCache::new(input).get_or_load()?;

    let mut criteria = match &args.criteria {
        Some(path) => parse_criteria_str(&fs::read_to_string(path)?)?,
        None => FilterCriteria::default(),
    };
    apply_flags(&mut criteria, &args)?;

    let observed = end_date_bounds(&dataset);
    if let Some(range) = end_range(args.end_from.as_deref(), args.end_to.as_deref(), observed)? {
        criteria.end_date_range = Some(range);
    }

    let results = compute_results(&dataset, &criteria)?;
    eprintln!("   Registros encontrados: {}", results.total_records());

    if let Some(ref export_path) = args.export {
        let bytes = write_xlsx(&results.view)?;
        fs::write(export_path, bytes)?;
        eprintln!("   💾 Export written to: {}", export_path.display());
    }

    let response = SearchResponse::from(&results);
    let json = serde_json::to_string_pretty(&response)?;
    write_output(&json, args.output.as_deref())?;

    eprintln!("\n✨ Done!");
    Ok(())
}

/// Overlay command-line filters onto `criteria`; only given flags replace values.
fn apply_flags(criteria: &mut FilterCriteria, args: &SearchArgs) -> Result<(), CriteriaError> {
    if let Some(ref keywords) = args.keywords {
        criteria.keywords = keywords.clone();
    }
    if !args.years.is_empty() {
        criteria.start_years = Selection::parse(&args.years).map_err(CriteriaError::InvalidYear)?;
    }

    let text_flags = [
        (&args.departments, &mut criteria.departments),
        (&args.municipalities, &mut criteria.municipalities),
        (&args.actor_first_level, &mut criteria.actor_first_level),
        (&args.actor_second_level, &mut criteria.actor_second_level),
        (&args.actor_names, &mut criteria.actor_names),
        (&args.actor_origins, &mut criteria.actor_origins),
        (&args.ods, &mut criteria.ods),
        (&args.statuses, &mut criteria.statuses),
        (&args.sectors, &mut criteria.sectors),
    ];
    for (values, selection) in text_flags {
        if !values.is_empty() {
            // String parsing cannot fail
            *selection = Selection::parse(values).unwrap_or_default();
        }
    }

    Ok(())
}

/// End-date range from the CLI bounds.
///
/// A missing bound defaults to the observed one, or to an open end when the
/// dataset has no end dates.
fn end_range(
    from: Option<&str>,
    to: Option<&str>,
    observed: Option<DateRange>,
) -> Result<Option<DateRange>, CriteriaError> {
    if from.is_none() && to.is_none() {
        return Ok(None);
    }

    let min = match from {
        Some(text) => parse_iso_date(text)?,
        None => observed.map_or(NaiveDate::MIN, |r| r.min),
    };
    let max = match to {
        Some(text) => parse_iso_date(text)?,
        None => observed.map_or(NaiveDate::MAX, |r| r.max),
    };

    DateRange::new(min, max).map(Some)
}

async fn cmd_serve(dataset: &Path, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Loading dataset: {}", dataset.display());
    let dataset = DatasetCache::new(dataset).get_or_load()?;
    buscador::server::start_server(port, dataset).await
}

fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Parser)]
    struct SearchCli {
        #[command(flatten)]
        args: SearchArgs,
    }

    fn search_args(argv: &[&str]) -> SearchArgs {
        SearchCli::parse_from(argv).args
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_end_range_defaults_to_observed() {
        let observed = DateRange::new(ymd(2019, 1, 1), ymd(2030, 12, 31)).ok();

        assert_eq!(end_range(None, None, observed).unwrap(), None);

        let range = end_range(Some("2022-01-01"), None, observed).unwrap().unwrap();
        assert_eq!((range.min, range.max), (ymd(2022, 1, 1), ymd(2030, 12, 31)));

        let range = end_range(None, Some("2022-06-30"), observed).unwrap().unwrap();
        assert_eq!((range.min, range.max), (ymd(2019, 1, 1), ymd(2022, 6, 30)));
    }

    #[test]
    fn test_end_range_errors() {
        assert!(matches!(
            end_range(Some("30/06/2022"), None, None),
            Err(CriteriaError::InvalidDate(_))
        ));
        assert!(matches!(
            end_range(Some("2023-01-01"), Some("2022-01-01"), None),
            Err(CriteriaError::InvertedRange { .. })
        ));
    }

    #[test]
    fn test_flags_override_criteria_file() {
        let mut criteria = FilterCriteria {
            keywords: "agua".into(),
            departments: Selection::of(["Huila".to_string()]),
            ..Default::default()
        };
        let args = search_args(&["search", "--year", "2021", "--year", "Todos", "-d", "Cauca"]);
        apply_flags(&mut criteria, &args).unwrap();

        assert_eq!(criteria.keywords, "agua");
        assert!(criteria.start_years.has_all_marker());
        assert_eq!(criteria.start_years.values(), [2021]);
        assert_eq!(criteria.departments, Selection::of(["Cauca".to_string()]));
    }

    #[test]
    fn test_sector_flag() {
        let mut criteria = FilterCriteria::default();
        let args = search_args(&["search", "--sector", "Salud", "--sector", "Educación"]);
        apply_flags(&mut criteria, &args).unwrap();
        assert_eq!(
            criteria.sectors,
            Selection::of(["Salud".to_string(), "Educación".to_string()])
        );
    }

    #[test]
    fn test_bad_year_flag() {
        let args = search_args(&["search", "--year", "dos mil"]);
        let err = apply_flags(&mut FilterCriteria::default(), &args).unwrap_err();
        assert!(matches!(err, CriteriaError::InvalidYear(ref y) if y == "dos mil"));
    }
}
