//! RFC 5322 header generation.
//!
//! Header values that are not plain printable ASCII are written as RFC 2047
//! "Q" encoded words (`=?UTF-8?Q?...?=`).

use std::borrow::Cow;

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

use crate::{
    config::ComposerConfig,
    identity::IdSource,
    mail::{Mail, MailUser},
};

/// `strftime` pattern for the `Date` header, e.g. `Fri, 1 Mar 2024 09:05:00 +0100`.
pub const DATE_FORMAT: &str = "%a, %-d %b %Y %H:%M:%S %z";

/// Everything outside the URL query character class, plus the characters
/// that carry meaning inside an encoded word.
const Q_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b',')
    .add(b'<')
    .add(b'>')
    .add(b'=')
    .add(b'?')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'_')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// Ordered header list. Names are unique; inserting an existing name
/// replaces its value but keeps its position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(Cow<'static, str>, String)>,
}

impl Headers {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn insert(&mut self, name: impl Into<Cow<'static, str>>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();

        match self
            .entries
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(&name))
        {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((name, value)),
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_ref(), value.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Derives the header set for `mail`, in the order `Message-Id`, `Date`,
    /// `From`, `To`, `Cc` (only when there are Cc recipients), `Subject`,
    /// `MIME-Version`. `Bcc` is never rendered.
    #[must_use]
    pub fn for_mail(mail: &Mail, ids: &dyn IdSource, config: &ComposerConfig) -> Self {
        let mut headers = Self::new();

        headers.insert(
            "Message-Id",
            format!(
                "<{}@{}>",
                ids.unique_id().hyphenated(),
                config.message_id_domain
            ),
        );
        headers.insert("Date", ids.now().format(DATE_FORMAT).to_string());
        headers.insert("From", mailbox(mail.from()));
        headers.insert("To", mailbox_list(mail.to()));

        if !mail.cc().is_empty() {
            headers.insert("Cc", mailbox_list(mail.cc()));
        }

        headers.insert("Subject", encode_word(mail.subject()));
        headers.insert("MIME-Version", "1.0");

        headers
    }
}

/// Printable ASCII that would change how a header or an encoded word reads.
const RESERVED: &[char] = &['"', '%', ',', '=', '?', '\\', '_'];

fn needs_encoding(value: &str) -> bool {
    value
        .chars()
        .any(|c| !c.is_ascii() || c.is_ascii_control() || RESERVED.contains(&c))
}

/// Q-encodes `value` unconditionally.
///
/// Spaces become `_`; every other byte in [`Q_ENCODE_SET`] and every
/// non-ASCII byte becomes `=XX`.
#[must_use]
pub fn q_encode(value: &str) -> String {
    let quoted = utf8_percent_encode(value, Q_ENCODE_SET)
        .to_string()
        .replace("%20", "_")
        .replace('%', "=");

    format!("=?UTF-8?Q?{quoted}?=")
}

/// Returns `value` untouched if it is printable ASCII free of reserved
/// characters, otherwise its Q-encoded form.
#[must_use]
pub fn encode_word(value: &str) -> Cow<'_, str> {
    if needs_encoding(value) {
        Cow::Owned(q_encode(value))
    } else {
        Cow::Borrowed(value)
    }
}

/// Renders a single user as `"Name" <email>`, `=?UTF-8?Q?...?= <email>`
/// or a bare `email`.
#[must_use]
pub fn mailbox(user: &MailUser) -> String {
    match user.name().map(encode_word) {
        Some(Cow::Borrowed(name)) => format!("\"{name}\" <{}>", user.email()),
        Some(Cow::Owned(encoded)) => format!("{encoded} <{}>", user.email()),
        None => user.email().to_string(),
    }
}

fn mailbox_list<'a>(users: impl IntoIterator<Item = &'a MailUser>) -> String {
    users.into_iter().map(mailbox).collect::<Vec<_>>().join(", ")
}
