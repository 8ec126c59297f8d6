use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid token: {0}")]
    InvalidToken(String),
    #[error("Contract violation: {0}")]
    Contract(String),
    #[error("Failed to decode event on line {line}: {source}")]
    Decode {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("Line {line} exceeds the maximum length of {max} bytes")]
    LineTooLong { line: usize, max: usize },
    #[error("Failed to encode event: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
