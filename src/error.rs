//! Error types and handling for `TripWeave` application

use thiserror::Error;

/// Main error type for the `TripWeave` application
#[derive(Error, Debug)]
pub enum TripWeaveError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Generative or mapping API communication errors
    #[error("API error: {message}")]
    Api { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// General application errors
    #[error("Application error: {message}")]
    General { message: String },
}

impl TripWeaveError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new API error
    pub fn api<S: Into<String>>(message: S) -> Self {
        Self::Api {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new general error
    pub fn general<S: Into<String>>(message: S) -> Self {
        Self::General {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            TripWeaveError::Config { .. } => {
                "Configuration error. Please check your config file and API keys.".to_string()
            }
            TripWeaveError::Api { .. } => {
                "Itinerary generation failed. Please check your internet connection and try again."
                    .to_string()
            }
            TripWeaveError::Validation { message } => {
                format!("Invalid input: {message}")
            }
            TripWeaveError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
            TripWeaveError::General { message } => message.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let config_err = TripWeaveError::config("missing API key");
        assert!(matches!(config_err, TripWeaveError::Config { .. }));

        let api_err = TripWeaveError::api("completion request failed");
        assert!(matches!(api_err, TripWeaveError::Api { .. }));

        let validation_err = TripWeaveError::validation("end date before start date");
        assert!(matches!(validation_err, TripWeaveError::Validation { .. }));
    }

    #[test]
    fn test_user_messages() {
        let config_err = TripWeaveError::config("test");
        assert!(config_err.user_message().contains("Configuration error"));

        let api_err = TripWeaveError::api("test");
        assert!(api_err.user_message().contains("generation failed"));

        let validation_err = TripWeaveError::validation("test input");
        assert!(validation_err.user_message().contains("test input"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let trip_err: TripWeaveError = io_err.into();
        assert!(matches!(trip_err, TripWeaveError::Io { .. }));
    }
}
