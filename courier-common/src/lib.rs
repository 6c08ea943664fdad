pub mod config;
pub mod headers;
pub mod identity;
pub mod logging;
pub mod mail;

pub use tracing;

pub use config::{ClientConfig, ComposerConfig};
pub use identity::{IdSource, SequentialIds, SystemIds};
pub use mail::{ContentType, Disposition, Mail, MailAttachment, MailBuilder, MailError, MailUser};
