//! The mail to be sent: envelope, headers and content.

use std::collections::BTreeSet;

use thiserror::Error;

use crate::identity::{IdSource, SystemIds};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MailError {
    /// A mail needs at least one `To` recipient before it can be sent.
    #[error("Mail {0} has no recipients")]
    NoRecipients(String),

    /// An address would break the command or header line it is written to.
    #[error("Invalid address: {0:?}")]
    InvalidAddress(String),
}

fn is_valid_address(email: &str) -> bool {
    !email
        .chars()
        .any(|c| c.is_whitespace() || c.is_control() || c == '<' || c == '>')
}

/// A mailbox with an optional display name.
///
/// The address is written verbatim into `MAIL FROM`, `RCPT TO` and the
/// address headers; [`Mail::validate`] rejects addresses that would break
/// those lines.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MailUser {
    name: Option<String>,
    email: String,
}

impl MailUser {
    #[must_use]
    pub fn new(name: Option<String>, email: impl Into<String>) -> Self {
        Self {
            name,
            email: email.into(),
        }
    }

    #[must_use]
    pub fn named(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self::new(Some(name.into()), email)
    }

    /// The name displayed by mail clients, if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }
}

impl From<&str> for MailUser {
    fn from(email: &str) -> Self {
        Self::new(None, email)
    }
}

impl From<String> for MailUser {
    fn from(email: String) -> Self {
        Self::new(None, email)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Disposition {
    Inline,
    #[default]
    Attachment,
}

impl Disposition {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Inline => "inline",
            Self::Attachment => "attachment",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailAttachment {
    name: String,
    content_type: String,
    disposition: Disposition,
    data: Vec<u8>,
}

impl MailAttachment {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        content_type: impl Into<String>,
        disposition: Disposition,
        data: Vec<u8>,
    ) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            disposition,
            data,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    #[must_use]
    pub const fn disposition(&self) -> Disposition {
        self.disposition
    }

    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// Media type of the mail text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ContentType {
    #[default]
    Plain,
    Html,
}

impl ContentType {
    #[must_use]
    pub const fn as_mime(self) -> &'static str {
        match self {
            Self::Plain => "text/plain",
            Self::Html => "text/html",
        }
    }
}

/// An immutable mail, created through [`MailBuilder`].
///
/// Recipients are sets: adding the same user twice has no effect. `Bcc`
/// recipients only ever appear in the envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mail {
    message_id: String,
    from: MailUser,
    to: BTreeSet<MailUser>,
    cc: BTreeSet<MailUser>,
    bcc: BTreeSet<MailUser>,
    subject: String,
    content_type: ContentType,
    text: String,
    attachments: Vec<MailAttachment>,
}

impl Mail {
    #[must_use]
    pub fn builder(from: impl Into<MailUser>) -> MailBuilder {
        MailBuilder::new(from)
    }

    /// Identifier assigned when the mail was built. Unrelated to the
    /// `Message-Id` header, which is generated per rendering.
    #[must_use]
    pub fn message_id(&self) -> &str {
        &self.message_id
    }

    #[must_use]
    pub const fn from(&self) -> &MailUser {
        &self.from
    }

    #[must_use]
    pub const fn to(&self) -> &BTreeSet<MailUser> {
        &self.to
    }

    #[must_use]
    pub const fn cc(&self) -> &BTreeSet<MailUser> {
        &self.cc
    }

    #[must_use]
    pub const fn bcc(&self) -> &BTreeSet<MailUser> {
        &self.bcc
    }

    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    #[must_use]
    pub const fn content_type(&self) -> ContentType {
        self.content_type
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn attachments(&self) -> &[MailAttachment] {
        &self.attachments
    }

    /// Envelope recipients: `To`, then `Cc`, then `Bcc`, each address once.
    pub fn recipients(&self) -> impl Iterator<Item = &str> {
        let mut seen = BTreeSet::new();

        self.to
            .iter()
            .chain(&self.cc)
            .chain(&self.bcc)
            .map(MailUser::email)
            .filter(move |email| seen.insert(*email))
    }

    /// Checks the precondition for handing this mail to a server.
    ///
    /// # Errors
    ///
    /// Returns [`MailError::NoRecipients`] if the `To` set is empty, and
    /// [`MailError::InvalidAddress`] for the first address containing
    /// whitespace, control characters, `<` or `>`.
    pub fn validate(&self) -> Result<(), MailError> {
        if self.to.is_empty() {
            return Err(MailError::NoRecipients(self.message_id.clone()));
        }

        std::iter::once(&self.from)
            .chain(&self.to)
            .chain(&self.cc)
            .chain(&self.bcc)
            .map(MailUser::email)
            .find(|email| !is_valid_address(email))
            .map_or(Ok(()), |email| {
                Err(MailError::InvalidAddress(email.to_string()))
            })
    }
}

/// Builder for [`Mail`].
///
/// # Examples
///
/// ```
/// use courier_common::mail::{Mail, MailUser};
///
/// let mail = Mail::builder(MailUser::named("Alice", "alice@example.com"))
///     .to("bob@example.com")
///     .subject("Lunch")
///     .text("Noon?")
///     .build();
///
/// assert_eq!(mail.to().len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct MailBuilder {
    from: MailUser,
    to: BTreeSet<MailUser>,
    cc: BTreeSet<MailUser>,
    bcc: BTreeSet<MailUser>,
    subject: String,
    content_type: ContentType,
    text: String,
    attachments: Vec<MailAttachment>,
}

impl MailBuilder {
    #[must_use]
    pub fn new(from: impl Into<MailUser>) -> Self {
        Self {
            from: from.into(),
            to: BTreeSet::new(),
            cc: BTreeSet::new(),
            bcc: BTreeSet::new(),
            subject: String::new(),
            content_type: ContentType::default(),
            text: String::new(),
            attachments: Vec::new(),
        }
    }

    #[must_use]
    pub fn to(mut self, user: impl Into<MailUser>) -> Self {
        self.to.insert(user.into());
        self
    }

    #[must_use]
    pub fn cc(mut self, user: impl Into<MailUser>) -> Self {
        self.cc.insert(user.into());
        self
    }

    #[must_use]
    pub fn bcc(mut self, user: impl Into<MailUser>) -> Self {
        self.bcc.insert(user.into());
        self
    }

    #[must_use]
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    #[must_use]
    pub const fn content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = content_type;
        self
    }

    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    #[must_use]
    pub fn attach(mut self, attachment: MailAttachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// Builds the mail with a random message id.
    #[must_use]
    pub fn build(self) -> Mail {
        self.build_with(&SystemIds)
    }

    #[must_use]
    pub fn build_with(self, ids: &dyn IdSource) -> Mail {
        Mail {
            message_id: ids.unique_id().to_string(),
            from: self.from,
            to: self.to,
            cc: self.cc,
            bcc: self.bcc,
            subject: self.subject,
            content_type: self.content_type,
            text: self.text,
            attachments: self.attachments,
        }
    }
}
