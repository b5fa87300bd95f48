use reqwest::StatusCode;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("remote returned {0}")]
    Status(StatusCode),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid task record: {0}")]
    InvalidRecord(String),

    /// Category indices are 1-based; zero and negatives never name a category.
    #[error("category index must start at 1, got {0}")]
    InvalidCategory(i64),

    #[error("category index {0} is too large")]
    CategoryOutOfRange(i64),

    #[error("no category at index {0}")]
    UnknownCategory(u32),

    #[error("task rejected: {0}")]
    Rejected(String),
}
