//! Configuration for composing and sending mail.
//!
//! Loading these from disk is left to the embedding application; everything
//! here only derives `Deserialize` with sensible defaults so a partial
//! document is enough.

use serde::{Deserialize, Serialize};

/// Settings that shape the generated DATA payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComposerConfig {
    /// Right-hand side of the generated `Message-Id` header.
    ///
    /// Default: `localhost`
    #[serde(default = "defaults::message_id_domain")]
    pub message_id_domain: String,

    /// Maximum number of base64 characters per attachment line.
    ///
    /// Default: 76 (RFC 2045 Section 6.8)
    #[serde(default = "defaults::line_length")]
    pub line_length: usize,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            message_id_domain: defaults::message_id_domain(),
            line_length: defaults::line_length(),
        }
    }
}

/// Settings for an outbound SMTP transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Name announced in `EHLO`.
    ///
    /// Default: `localhost`
    #[serde(default = "defaults::hostname")]
    pub hostname: String,

    /// Whether to issue `STARTTLS` (and re-greet) before the mail transaction.
    ///
    /// Default: false
    #[serde(default)]
    pub starttls: bool,

    #[serde(default)]
    pub composer: ComposerConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            hostname: defaults::hostname(),
            starttls: false,
            composer: ComposerConfig::default(),
        }
    }
}

mod defaults {
    pub fn message_id_domain() -> String {
        String::from("localhost")
    }

    pub const fn line_length() -> usize {
        76
    }

    pub fn hostname() -> String {
        String::from("localhost")
    }
}
