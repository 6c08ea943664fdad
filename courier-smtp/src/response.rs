//! SMTP reply lines.

use core::fmt::{self, Display, Formatter};

/// A single reply line as sent by the server.
///
/// Continuation lines (`250-...`) are not merged with the final line of
/// their reply; each line is its own `ServerResponse`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServerResponse {
    /// The three digit status code (e.g. 220, 250, 550).
    pub code: u16,
    /// Text after the code, without the separator and the CRLF.
    pub message: String,
}

impl ServerResponse {
    #[must_use]
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// 2xx: the requested action has been completed.
    #[must_use]
    pub const fn is_positive_completion(&self) -> bool {
        self.code >= 200 && self.code < 300
    }

    /// 3xx: the server waits for more input, e.g. after `DATA` or during `AUTH`.
    #[must_use]
    pub const fn is_positive_intermediate(&self) -> bool {
        self.code >= 300 && self.code < 400
    }

    /// 4xx: the command may succeed if retried later.
    #[must_use]
    pub const fn is_transient_failure(&self) -> bool {
        self.code >= 400 && self.code < 500
    }

    /// 5xx: the command will not succeed.
    #[must_use]
    pub const fn is_permanent_failure(&self) -> bool {
        self.code >= 500 && self.code < 600
    }
}

impl Display for ServerResponse {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code, self.message)
    }
}
