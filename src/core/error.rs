use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Method Not Allowed")]
    MethodNotAllowed,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Remote error: {0}")]
    Remote(String),

    #[error("Lock error: {0}")]
    Lock(String),
}

impl TrackerError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    pub fn remote(message: impl Into<String>) -> Self {
        Self::Remote(message.into())
    }

    /// True for failures a caller may reasonably retry later.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::Remote(_) | Self::Lock(_))
    }
}

pub type Result<T> = std::result::Result<T, TrackerError>;

impl<T> From<std::sync::PoisonError<T>> for TrackerError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::Lock(err.to_string())
    }
}

impl From<serde_json::Error> for TrackerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
