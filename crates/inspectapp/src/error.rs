use thiserror::Error;

#[derive(Error, Debug)]
pub enum InspectError {
    #[error("Record not found: {collection} #{id}")]
    NotFound { collection: &'static str, id: u64 },

    /// A lifecycle guard refused the transition. The message is meant for the end user.
    #[error("{0}")]
    Precondition(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Api Error: {0}")]
    Api(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl InspectError {
    pub fn not_found(collection: &'static str, id: u64) -> Self {
        InspectError::NotFound { collection, id }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, InspectError::NotFound { .. })
    }

    pub fn is_precondition(&self) -> bool {
        matches!(self, InspectError::Precondition(_))
    }
}

pub type Result<T> = std::result::Result<T, InspectError>;
