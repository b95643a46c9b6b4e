use std::fmt;

use thiserror::Error;

use crate::auth::Field;
use crate::session::SessionError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Please fill in all required fields")]
    Validation { missing: Vec<Field> },
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Not available on this screen")]
    WrongMode,
    #[error("{0}")]
    Storage(#[from] sqlx::Error),
    #[error("{0}")]
    Session(#[from] SessionError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    Success,
    Error,
}

/// User-visible outcome of a controller action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub kind: AlertKind,
    pub message: String,
}

impl Alert {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: AlertKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: AlertKind::Error,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.kind == AlertKind::Success
    }
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let title = match self.kind {
            AlertKind::Success => "Success",
            AlertKind::Error => "Error",
        };
        write!(f, "{}: {}", title, self.message)
    }
}

impl AppError {
    pub fn alert(&self) -> Alert {
        Alert::error(self.to_string())
    }
}

impl From<AppError> for Alert {
    fn from(e: AppError) -> Self {
        e.alert()
    }
}
