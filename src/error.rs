use thiserror::Error;

/// Errors surfaced at the crate's I/O boundaries.
///
/// The keystroke and metrics paths never fail; empty denominators and
/// missing samples are handled with fixed defaults instead.
#[derive(Debug, Error)]
pub enum Error {
    #[error("target text must not be empty")]
    EmptyText,

    #[error("text provider returned no usable text: {0}")]
    TextUnavailable(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("results log error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
