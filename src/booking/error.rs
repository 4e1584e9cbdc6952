use thiserror::Error;

#[derive(Debug, Error)]
pub enum BookingError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Doctor already has maximum appointments for this day")]
    CapacityExceeded,

    #[error("{0}")]
    Conflict(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl BookingError {
    pub fn invalid(message: impl Into<String>) -> Self {
        BookingError::InvalidRequest(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        BookingError::NotFound(message.into())
    }
}

impl From<sqlx::Error> for BookingError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                BookingError::Conflict(db.message().to_string())
            }
            _ => BookingError::Storage(e.to_string()),
        }
    }
}
