use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashError {
    #[error("Row {row} is missing required column {column}")]
    MissingColumn { row: usize, column: &'static str },

    #[error("Row {row} has invalid STATUS {value:?}")]
    InvalidStatus { row: usize, value: String },

    #[error("Malformed job table: {0}")]
    MalformedTable(String),

    #[error("Unknown facet: {0}")]
    UnknownFacet(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Job source returned {status}: {body}")]
    Upstream { status: u16, body: String },
}

impl DashError {
    /// True when the source delivered data that does not form a valid job table.
    pub fn is_bad_table(&self) -> bool {
        matches!(
            self,
            DashError::MissingColumn { .. }
                | DashError::InvalidStatus { .. }
                | DashError::MalformedTable(_)
                | DashError::Json(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, DashError>;
