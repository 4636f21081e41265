/// Message reported when a user has already rated every movie in the catalog
pub const NO_CANDIDATES_MESSAGE: &str = "No unrated movies found for this user.";

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{}", NO_CANDIDATES_MESSAGE)]
    NoCandidates,

    #[error("Dependency unavailable: {0}")]
    Dependency(String),

    /// An optional collaborator the request needs was never configured
    #[error("{0}")]
    Unconfigured(String),

    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    #[error("HTTP client error: {0}")]
    HttpClient(reqwest::Error),

    #[error("External service error: {0}")]
    ExternalService(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether the error belongs in the envelope's `validation_error` slot
    /// rather than its `error` slot.
    pub fn is_validation(&self) -> bool {
        matches!(self, AppError::Validation(_) | AppError::NoCandidates)
    }
}

/// Request URLs can carry API keys, so they never reach the message
impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::HttpClient(err.without_url())
    }
}

pub type AppResult<T> = Result<T, AppError>;
