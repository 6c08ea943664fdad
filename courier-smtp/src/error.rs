//! Error types for the SMTP client codec.
//!
//! Encoding cannot fail. Decoding distinguishes between running out of input,
//! which is only an error once the stream has ended, and malformed replies,
//! after which the connection must be closed and not reused.

use std::{io, sync::Arc};

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum SmtpError {
    /// The stream ended in the middle of a reply line.
    #[error("Incomplete reply, more data is required")]
    IncompleteMessage,

    /// The first three bytes of a reply line are not a decimal status code.
    #[error("Invalid reply code: {:?}", String::from_utf8_lossy(.0))]
    InvalidCode(Vec<u8>),

    /// The reply text is not valid UTF-8.
    #[error("Reply text is not valid UTF-8")]
    InvalidMessage,

    /// Transport failure reported through the codec.
    #[error("I/O error: {0}")]
    Io(Arc<io::Error>),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SmtpError {
    /// Everything but [`SmtpError::IncompleteMessage`] ends the session.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !matches!(self, Self::IncompleteMessage)
    }
}

impl From<io::Error> for SmtpError {
    fn from(err: io::Error) -> Self {
        Self::Io(Arc::new(err))
    }
}

impl PartialEq for SmtpError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::IncompleteMessage, Self::IncompleteMessage)
            | (Self::InvalidMessage, Self::InvalidMessage) => true,
            (Self::InvalidCode(code1), Self::InvalidCode(code2)) => code1 == code2,
            (Self::Io(error1), Self::Io(error2)) => error1.kind() == error2.kind(),
            (Self::Internal(reason1), Self::Internal(reason2)) => reason1 == reason2,
            _ => false,
        }
    }
}

/// Specialized `Result` type for codec operations.
pub type Result<T> = std::result::Result<T, SmtpError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(
            SmtpError::InvalidCode(b"25 ".to_vec()).to_string(),
            "Invalid reply code: \"25 \""
        );
        assert_eq!(
            SmtpError::IncompleteMessage.to_string(),
            "Incomplete reply, more data is required"
        );
    }

    #[test]
    fn test_fatal_kinds() {
        assert!(!SmtpError::IncompleteMessage.is_fatal());
        assert!(SmtpError::InvalidCode(Vec::new()).is_fatal());
        assert!(SmtpError::InvalidMessage.is_fatal());
        assert!(SmtpError::Internal(String::from("unreachable")).is_fatal());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::ConnectionReset, "connection reset");
        let err: SmtpError = io_err.into();
        assert_eq!(
            err,
            SmtpError::from(io::Error::from(io::ErrorKind::ConnectionReset))
        );
        assert!(err.is_fatal());
    }
}
