//! Error types for the runtime crate.

use std::fmt;

/// Errors from driver lifecycle operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartError {
    /// The driver was already started in this process.
    AlreadyStarted,
}

impl fmt::Display for StartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyStarted => write!(f, "sweep driver already started"),
        }
    }
}

impl std::error::Error for StartError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_error_display() {
        assert!(
            StartError::AlreadyStarted
                .to_string()
                .contains("already started")
        );
    }
}
