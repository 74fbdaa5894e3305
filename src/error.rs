//! Error taxonomy for the conversion pipeline.

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Input does not look like the expected document
    FormatError,
    UnknownCalendar,

    // Internal errors
    SerializationError,
    IoError,
}

/// Errors produced while reading, converting, merging or writing documents.
///
/// Duplicate tasks are not errors. They are skipped and reported through
/// [`crate::events::EventSink`].
#[derive(Debug, Error)]
pub enum ConvertError {
    /// A document does not match the schema shape the converter expects.
    #[error("invalid {what}: {message}")]
    Format { what: &'static str, message: String },

    /// The configured calendar is not registered in the Tasks.org backup.
    #[error("invalid calendar uuid {uuid:?}: not found in $.data.caldavCalendars[*].uuid")]
    UnknownCalendar { uuid: String },

    /// Encoding an in-memory document failed.
    #[error("serialize output: {0}")]
    Serialization(#[source] serde_json::Error),

    /// Reading an input or writing the output failed.
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConvertError {
    pub fn format(what: &'static str, message: impl Into<String>) -> Self {
        Self::Format {
            what,
            message: message.into(),
        }
    }

    pub fn unknown_calendar(uuid: &str) -> Self {
        Self::UnknownCalendar {
            uuid: uuid.to_string(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Format { .. } => ErrorCode::FormatError,
            Self::UnknownCalendar { .. } => ErrorCode::UnknownCalendar,
            Self::Serialization(_) => ErrorCode::SerializationError,
            Self::Io { .. } => ErrorCode::IoError,
        }
    }

    /// Format errors abort the run because the input is wrong, not the program.
    pub fn is_format_error(&self) -> bool {
        matches!(self, Self::Format { .. } | Self::UnknownCalendar { .. })
    }
}

/// Result type for conversion operations.
pub type ConvertResult<T> = std::result::Result<T, ConvertError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            ConvertError::format("export", "boom").code(),
            ErrorCode::FormatError
        );
        assert_eq!(
            ConvertError::unknown_calendar("cal").code(),
            ErrorCode::UnknownCalendar
        );
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert_eq!(ConvertError::io("a.json", io).code(), ErrorCode::IoError);
    }

    #[test]
    fn test_error_code_serializes_screaming_snake() {
        let json = serde_json::to_string(&ErrorCode::UnknownCalendar).unwrap();
        assert_eq!(json, "\"UNKNOWN_CALENDAR\"");
    }

    #[test]
    fn test_display_messages() {
        let err = ConvertError::unknown_calendar("cal-9");
        assert!(err.to_string().contains("\"cal-9\""));
        assert!(err.is_format_error());

        let err = ConvertError::format("Google Tasks export", "unknown kind");
        assert_eq!(err.to_string(), "invalid Google Tasks export: unknown kind");

        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = ConvertError::io("/tmp/in.json", io);
        assert_eq!(err.to_string(), "/tmp/in.json: gone");
        assert!(!err.is_format_error());
    }
}
