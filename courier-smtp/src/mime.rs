//! Composition of the `multipart/mixed` payload sent after `DATA`.
//!
//! A mail is first broken into an ordered list of [`Segment`]s which are then
//! rendered by [`render`]. The payload always ends with the closing boundary
//! followed by the lone `.` that terminates the DATA phase; the command
//! encoder supplies the final CRLF.

use std::{borrow::Cow, fmt, sync::Arc};

use base64::{Engine, engine::general_purpose::STANDARD};
use courier_common::{
    config::ComposerConfig,
    headers::{Headers, encode_word},
    identity::{IdSource, SystemIds},
    mail::{Mail, MailAttachment},
};

const CRLF: &str = "\r\n";

/// One piece of the rendered payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    /// `Name: Value` in the message header block.
    Header { name: String, value: String },
    /// Last header of the message, announcing the boundary, followed by the
    /// blank line that starts the body.
    MultipartType { boundary: String },
    /// `--boundary`, opening a part.
    Boundary { boundary: String },
    /// The headers of a part and the blank line after them.
    PartHeaders(Vec<(&'static str, Cow<'a, str>)>),
    /// Part content followed by an empty line.
    Content(Cow<'a, str>),
    /// `--boundary--` and the end-of-data marker.
    Terminator { boundary: String },
}

impl Segment<'_> {
    pub fn render_into(&self, out: &mut String) {
        match self {
            Self::Header { name, value } => push_header(out, name, value),
            Self::MultipartType { boundary } => {
                out.push_str("Content-Type: multipart/mixed; boundary=\"");
                out.push_str(boundary);
                out.push('"');
                out.push_str(CRLF);
                out.push_str(CRLF);
            }
            Self::Boundary { boundary } => {
                out.push_str("--");
                out.push_str(boundary);
                out.push_str(CRLF);
            }
            Self::PartHeaders(headers) => {
                for (name, value) in headers {
                    push_header(out, name, value);
                }
                out.push_str(CRLF);
            }
            Self::Content(content) => {
                out.push_str(content);
                out.push_str(CRLF);
                out.push_str(CRLF);
            }
            Self::Terminator { boundary } => {
                out.push_str("--");
                out.push_str(boundary);
                out.push_str("--");
                out.push_str(CRLF);
                out.push('.');
            }
        }
    }
}

fn push_header(out: &mut String, name: &str, value: &str) {
    out.push_str(name);
    out.push_str(": ");
    out.push_str(value);
    out.push_str(CRLF);
}

/// Serialises segments in order.
#[must_use]
pub fn render(segments: &[Segment<'_>]) -> String {
    let mut out = String::with_capacity(1024);

    for segment in segments {
        segment.render_into(&mut out);
    }

    out
}

/// Base64 with lines of at most `width` characters, separated by CRLF.
/// A `width` of zero disables wrapping.
#[must_use]
pub fn base64_wrapped(data: &[u8], width: usize) -> String {
    let encoded = STANDARD.encode(data);

    if width == 0 || encoded.len() <= width {
        return encoded;
    }

    let mut out = String::with_capacity(encoded.len() + (encoded.len() / width) * CRLF.len());
    for (index, c) in encoded.chars().enumerate() {
        if index > 0 && index % width == 0 {
            out.push_str(CRLF);
        }
        out.push(c);
    }

    out
}

/// Builds DATA payloads. Cheap to clone; identifiers are drawn from the
/// shared [`IdSource`].
#[derive(Clone)]
pub struct Composer {
    ids: Arc<dyn IdSource>,
    config: ComposerConfig,
}

impl fmt::Debug for Composer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Composer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for Composer {
    fn default() -> Self {
        Self::new(Arc::new(SystemIds), ComposerConfig::default())
    }
}

impl Composer {
    #[must_use]
    pub fn new(ids: Arc<dyn IdSource>, config: ComposerConfig) -> Self {
        Self { ids, config }
    }

    /// A fresh boundary token: 32 lowercase hexadecimal digits.
    #[must_use]
    pub fn boundary(&self) -> String {
        self.ids.unique_id().simple().to_string()
    }

    #[must_use]
    pub fn headers(&self, mail: &Mail) -> Headers {
        Headers::for_mail(mail, self.ids.as_ref(), &self.config)
    }

    /// Breaks `mail` into the segments of its DATA payload.
    #[must_use]
    pub fn segments<'m>(&self, mail: &'m Mail) -> Vec<Segment<'m>> {
        let headers = self.headers(mail);
        let boundary = self.boundary();

        let mut segments = Vec::with_capacity(headers.len() + 4 + mail.attachments().len() * 3);

        segments.extend(headers.iter().map(|(name, value)| Segment::Header {
            name: name.to_string(),
            value: value.to_string(),
        }));
        segments.push(Segment::MultipartType {
            boundary: boundary.clone(),
        });

        segments.push(Segment::Boundary {
            boundary: boundary.clone(),
        });
        segments.push(Segment::PartHeaders(vec![
            (
                "Content-Type",
                Cow::Owned(format!(
                    "{}; charset=\"utf-8\"",
                    mail.content_type().as_mime()
                )),
            ),
            ("Content-Transfer-Encoding", Cow::Borrowed("7bit")),
        ]));
        segments.push(Segment::Content(Cow::Borrowed(mail.text())));

        for attachment in mail.attachments() {
            segments.push(Segment::Boundary {
                boundary: boundary.clone(),
            });
            segments.extend(self.attachment_segments(attachment));
        }

        segments.push(Segment::Terminator { boundary });

        segments
    }

    fn attachment_segments<'m>(&self, attachment: &'m MailAttachment) -> [Segment<'m>; 2] {
        [
            Segment::PartHeaders(vec![
                ("Content-Type", Cow::Borrowed(attachment.content_type())),
                ("Content-Transfer-Encoding", Cow::Borrowed("base64")),
                (
                    "Content-Disposition",
                    Cow::Owned(format!(
                        "{}; filename=\"{}\"",
                        attachment.disposition().as_str(),
                        encode_word(attachment.name())
                    )),
                ),
            ]),
            Segment::Content(Cow::Owned(base64_wrapped(
                attachment.data(),
                self.config.line_length,
            ))),
        ]
    }

    /// The complete DATA payload, ending in `--boundary--\r\n.`.
    #[must_use]
    pub fn compose(&self, mail: &Mail) -> String {
        render(&self.segments(mail))
    }
}
