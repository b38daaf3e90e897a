use thiserror::Error;

#[derive(Error, Debug)]
pub enum BookingError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Capacity error: {0}")]
    Capacity(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(#[from] eyre::Report),

    #[error("Internal server error: {0}")]
    Internal(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl BookingError {
    /// The message without the category prefix, suitable for showing to a user.
    pub fn user_message(&self) -> String {
        match self {
            BookingError::Validation(msg)
            | BookingError::NotFound(msg)
            | BookingError::Authentication(msg)
            | BookingError::Forbidden(msg)
            | BookingError::InvalidState(msg)
            | BookingError::Capacity(msg)
            | BookingError::Duplicate(msg) => msg.clone(),
            BookingError::Database(_) | BookingError::Internal(_) => {
                "Internal server error".to_string()
            }
        }
    }

    /// Whether the caller can recover from this error by changing its input or waiting.
    pub fn is_expected(&self) -> bool {
        !matches!(self, BookingError::Database(_) | BookingError::Internal(_))
    }
}

pub type BookingResult<T> = Result<T, BookingError>;
