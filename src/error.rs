use thiserror::Error;

/// Errors surfaced by the scout outside of the per-page extraction loop.
#[derive(Debug, Error)]
pub enum ScoutError {
    /// Missing or invalid command-line input.
    #[error("Invalid argument: {0}")]
    Argument(String),

    /// The output file exists but its columns don't match the dataset schema.
    #[error("Output file has the wrong structure: {0}")]
    Schema(String),

    /// A listing page never yielded usable values.
    #[error("Extraction failed for listing {listing}: {reason}")]
    Extraction { listing: String, reason: String },

    /// An input row carries a source tag we don't scrape.
    #[error("Unknown source '{0}'")]
    UnknownSource(String),

    #[error("I/O error")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl ScoutError {
    /// Errors that end the process with exit code 1 before any scraping starts.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ScoutError::Argument(_) | ScoutError::Schema(_) | ScoutError::Io(_) | ScoutError::Csv(_)
        )
    }
}

/// Failure of a single extraction attempt against a loaded page.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ExtractError {
    /// Expected values are missing, the page has probably not rendered yet.
    #[error("page not ready: {0}")]
    NotReady(String),

    /// Values are present but can't be interpreted; retrying won't help.
    #[error("malformed page data: {0}")]
    Malformed(String),
}

impl ExtractError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, ExtractError::NotReady(_))
    }
}
