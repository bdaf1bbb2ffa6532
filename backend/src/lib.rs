//! # Buscador - Search over development cooperation projects
//!
//! Buscador loads the projects spreadsheet (`BBDD.xlsx` or a CSV export),
//! filters it by keywords, start year, end date and categorical fields, and
//! summarizes contributions in USD by origin, department, sector and year.
//! Filtered rows can be exported as a new workbook.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  BBDD.xlsx  │────▶│   Parser    │────▶│   Filter    │────▶│  Summaries  │
//! │  (or CSV)   │     │  (coerce)   │     │  (AND view) │     │  + export   │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use buscador::{compute_results, load_dataset, FilterCriteria, Selection};
//!
//! let dataset = load_dataset("BBDD.xlsx")?;
//! let criteria = FilterCriteria {
//!     keywords: "agua, saneamiento".into(),
//!     departments: Selection::of(["Cauca".to_string()]),
//!     ..Default::default()
//! };
//! let results = compute_results(&dataset, &criteria)?;
//! println!("Registros encontrados: {}", results.total_records());
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Dataset, fields and cell values
//! - [`parser`] - Workbook and CSV loading with type coercion
//! - [`transform`] - Filters, option lists, aggregates and the search pipeline
//! - [`export`] - `.xlsx` export of filtered rows
//! - [`validation`] - Criteria JSON Schema validation
//! - [`cache`] - Per-process dataset cache
//! - [`config`] - Environment configuration
//! - [`api`] - HTTP API server

// Core modules
pub mod error;
pub mod models;

// Helpers
pub mod format;
pub mod text;

// Parsing
pub mod parser;

// Search
pub mod transform;

// Output
pub mod export;

// Validation
pub mod validation;

// Caching
pub mod cache;

// Configuration
pub mod config;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    CriteriaError, CriteriaResult, ExportError, ExportResult, LoadError, LoadResult, PipelineError,
    PipelineResult, ServerError, ServerResult,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{CellValue, Dataset, Field, Record, Schema, SourceInfo, ALL_MARKER};

// =============================================================================
// Re-exports - Parsing
// =============================================================================

pub use parser::{load_dataset, load_dataset_bytes, SourceFormat};

// =============================================================================
// Re-exports - Search
// =============================================================================

pub use transform::{
    compute_results, export_results, filter_dataset, filter_options, group_sum, summarize, yearly_totals,
    Aggregate, DateRange, FilterCriteria, FilterOptions, FilteredView, GroupTotal, SearchResults, Selection,
    YearTotal,
};

// =============================================================================
// Re-exports - Export
// =============================================================================

pub use export::{write_xlsx, EXPORT_FILE_NAME, EXPORT_SHEET_NAME, XLSX_MIME};

// =============================================================================
// Re-exports - Validation, cache, config
// =============================================================================

pub use validation::{parse_criteria, parse_criteria_str, validate_criteria};

pub use cache::DatasetCache;

pub use config::Config;

// =============================================================================
// Re-exports - API
// =============================================================================

pub use api::types::{error_response, OptionsRequest, SchemaResponse, SearchResponse};

// Server
pub mod server {
    pub use crate::api::server::{router, start_server, AppState};
}
