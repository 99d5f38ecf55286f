//! Error handling for tag renumbering
//!
//! This module provides a unified error type and result type for the
//! renumbering passes and the notebook layer.

use std::fmt;

/// Renumbering error type
#[derive(Debug, Clone)]
pub enum RenumberError {
    /// Invalid input, e.g. a notebook without a `cells` array
    InvalidInput { message: String },
    /// IO error (for file operations)
    IoError { message: String },
    /// Internal error - an invariant of the parse tree was violated
    InternalError { message: String },
}

impl fmt::Display for RenumberError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenumberError::InvalidInput { message } => {
                write!(f, "Invalid input: {}", message)
            }
            RenumberError::IoError { message } => {
                write!(f, "IO error: {}", message)
            }
            RenumberError::InternalError { message } => {
                write!(f, "Internal error: {}", message)
            }
        }
    }
}

impl std::error::Error for RenumberError {}

impl From<std::io::Error> for RenumberError {
    fn from(err: std::io::Error) -> Self {
        RenumberError::IoError {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for RenumberError {
    fn from(err: serde_json::Error) -> Self {
        RenumberError::InvalidInput {
            message: format!("malformed notebook JSON: {}", err),
        }
    }
}

/// Result type for renumbering operations
pub type RenumberResult<T> = Result<T, RenumberError>;

// Convenience constructors for errors
impl RenumberError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        RenumberError::InvalidInput {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        RenumberError::InternalError {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(
            RenumberError::internal("bad span").to_string(),
            "Internal error: bad span"
        );
        assert_eq!(
            RenumberError::invalid_input("no cells").to_string(),
            "Invalid input: no cells"
        );
    }

    #[test]
    fn test_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert!(matches!(RenumberError::from(io), RenumberError::IoError { .. }));
    }
}
