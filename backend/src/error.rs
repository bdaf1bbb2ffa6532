//! Error types for the project search pipeline.
//!
//! One error type per layer:
//!
//! - [`LoadError`] - Reading the source dataset
//! - [`CriteriaError`] - Building filter criteria from user input
//! - [`ExportError`] - Writing the filtered workbook
//! - [`PipelineError`] - Top-level orchestration errors
//! - [`ServerError`] - HTTP layer errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

// =============================================================================
// Loading Errors
// =============================================================================

/// Errors while loading the source dataset.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// The workbook could not be opened or its first sheet read.
    #[error("Invalid workbook: {0}")]
    Workbook(#[from] calamine::Error),

    /// Invalid delimited text.
    #[error("Invalid CSV format: {0}")]
    Csv(#[from] csv::Error),

    /// The file extension is not a supported tabular format.
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// The workbook has no sheets.
    #[error("Workbook has no sheets")]
    NoSheets,

    /// No header row found.
    #[error("No header row found in dataset")]
    NoHeaders,
}

// =============================================================================
// Criteria Errors
// =============================================================================

/// Errors while building filter criteria.
#[derive(Debug, Error)]
pub enum CriteriaError {
    /// A year selection token is neither an integer nor the match-all marker.
    #[error("Invalid year: '{0}'")]
    InvalidYear(String),

    /// A date could not be parsed.
    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    /// The end-date range has its bounds inverted.
    #[error("Invalid date range: {min} is after {max}")]
    InvertedRange { min: String, max: String },

    /// The keyword pattern could not be compiled.
    #[error("Invalid keyword pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// Criteria JSON rejected by the schema.
    #[error("Invalid criteria: {errors:?}")]
    Schema { errors: Vec<String> },

    /// Criteria JSON could not be deserialized.
    #[error("Criteria JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// =============================================================================
// Export Errors
// =============================================================================

/// Errors while writing the filtered workbook.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Workbook writer failure.
    #[error("Failed to write workbook: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    /// More columns than a worksheet can hold.
    #[error("Too many columns for a worksheet: {0}")]
    TooManyColumns(usize),

    /// More rows than a worksheet can hold.
    #[error("Too many rows for a worksheet: {0}")]
    TooManyRows(usize),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline errors.
///
/// Wraps every lower-level error so callers driving the whole flow
/// (load, search, export) can use a single `?`.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Dataset loading error.
    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    /// Criteria error.
    #[error("Criteria error: {0}")]
    Criteria(#[from] CriteriaError),

    /// Export error.
    #[error("Export error: {0}")]
    Export(#[from] ExportError),
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Pipeline error.
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Server internal error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<CriteriaError> for ServerError {
    fn from(err: CriteriaError) -> Self {
        ServerError::Pipeline(PipelineError::Criteria(err))
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for loading operations.
pub type LoadResult<T> = Result<T, LoadError>;

/// Result type for criteria construction.
pub type CriteriaResult<T> = Result<T, CriteriaError>;

/// Result type for export operations.
pub type ExportResult<T> = Result<T, ExportError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;
