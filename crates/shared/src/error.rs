use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// A required field was left empty; shown inline and recoverable.
    Validation,
    /// Durable storage failed or held a corrupt value.
    Persistence,
    /// The caller broke an API contract (wiring defect).
    Misuse,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingError {
    pub code: ErrorCode,
    pub message: String,
}

impl BookingError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn is_user_facing(&self) -> bool {
        self.code == ErrorCode::Validation
    }
}

#[derive(Debug, Error)]
#[error("{code:?}: {message}")]
pub struct BookingException {
    pub code: ErrorCode,
    pub message: String,
}

impl BookingException {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl From<BookingException> for BookingError {
    fn from(value: BookingException) -> Self {
        Self {
            code: value.code,
            message: value.message,
        }
    }
}

impl From<BookingError> for BookingException {
    fn from(value: BookingError) -> Self {
        Self {
            code: value.code,
            message: value.message,
        }
    }
}
