use core::fmt::{self, Display, Formatter};

use base64::{Engine, engine::general_purpose::STANDARD};
use bytes::{BufMut, BytesMut};
use courier_common::mail::Mail;

use crate::mime::Composer;

/// Commands a client sends to an SMTP server.
///
/// `AuthenticateUser` and `AuthenticatePassword` answer the server's
/// challenges after `AUTH LOGIN`; their payload is base64 encoded on the
/// wire. The SASL exchange itself is driven by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCommand<'a> {
    Helo(&'a str),
    Ehlo(&'a str),
    /// `MAIL FROM` with the sender of the mail.
    StartMail(&'a Mail),
    /// `RCPT TO` for a single envelope recipient.
    MailRecipient(&'a str),
    /// `DATA`
    StartMailData,
    /// The composed mail, sent after the server accepted `DATA`.
    MailData(&'a Mail),
    StartTls,
    AuthenticatePlain,
    AuthenticateLogin,
    AuthenticateCramMd5,
    AuthenticateXOAuth2(&'a str),
    AuthenticateUser(&'a str),
    AuthenticatePassword(&'a str),
    /// Sent verbatim.
    Custom(&'a str),
    Quit,
}

impl ClientCommand<'_> {
    /// Whether the command carries credentials that must not be logged.
    #[must_use]
    pub const fn is_sensitive(&self) -> bool {
        matches!(
            self,
            Self::AuthenticateXOAuth2(_) | Self::AuthenticateUser(_) | Self::AuthenticatePassword(_)
        )
    }
}

/// Wire text without the trailing CRLF. Credentials are redacted and mail
/// data is summarised, so the output is only suitable for logs.
impl Display for ClientCommand<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Helo(host) => write!(f, "HELO {host}"),
            Self::Ehlo(host) => write!(f, "EHLO {host}"),
            Self::StartMail(mail) => write!(f, "MAIL FROM: <{}> BODY=8BITMIME", mail.from().email()),
            Self::MailRecipient(address) => write!(f, "RCPT TO: <{address}>"),
            Self::StartMailData => f.write_str("DATA"),
            Self::MailData(mail) => write!(f, "<mail data for {}>", mail.message_id()),
            Self::StartTls => f.write_str("STARTTLS"),
            Self::AuthenticatePlain => f.write_str("AUTH PLAIN"),
            Self::AuthenticateLogin => f.write_str("AUTH LOGIN"),
            Self::AuthenticateCramMd5 => f.write_str("AUTH CRAM-MD5"),
            Self::AuthenticateXOAuth2(_) => f.write_str("AUTH XOAUTH2 <redacted>"),
            Self::AuthenticateUser(_) | Self::AuthenticatePassword(_) => f.write_str("<redacted>"),
            Self::Custom(text) => f.write_str(text),
            Self::Quit => f.write_str("QUIT"),
        }
    }
}

/// Turns commands into CRLF terminated wire lines.
#[derive(Debug, Clone, Default)]
pub struct CommandEncoder {
    composer: Composer,
}

impl CommandEncoder {
    #[must_use]
    pub const fn new(composer: Composer) -> Self {
        Self { composer }
    }

    #[must_use]
    pub const fn composer(&self) -> &Composer {
        &self.composer
    }

    /// Appends the wire form of `command` to `dst`.
    pub fn encode(&self, command: &ClientCommand<'_>, dst: &mut BytesMut) {
        match command {
            ClientCommand::Helo(host) => {
                dst.put_slice(b"HELO ");
                dst.put_slice(host.as_bytes());
            }
            ClientCommand::Ehlo(host) => {
                dst.put_slice(b"EHLO ");
                dst.put_slice(host.as_bytes());
            }
            ClientCommand::StartMail(mail) => {
                dst.put_slice(b"MAIL FROM: <");
                dst.put_slice(mail.from().email().as_bytes());
                dst.put_slice(b"> BODY=8BITMIME");
            }
            ClientCommand::MailRecipient(address) => {
                dst.put_slice(b"RCPT TO: <");
                dst.put_slice(address.as_bytes());
                dst.put_slice(b">");
            }
            ClientCommand::StartMailData => dst.put_slice(b"DATA"),
            ClientCommand::MailData(mail) => {
                dst.put_slice(self.composer.compose(mail).as_bytes());
            }
            ClientCommand::StartTls => dst.put_slice(b"STARTTLS"),
            ClientCommand::AuthenticatePlain => dst.put_slice(b"AUTH PLAIN"),
            ClientCommand::AuthenticateLogin => dst.put_slice(b"AUTH LOGIN"),
            ClientCommand::AuthenticateCramMd5 => dst.put_slice(b"AUTH CRAM-MD5"),
            ClientCommand::AuthenticateXOAuth2(token) => {
                dst.put_slice(b"AUTH XOAUTH2 ");
                dst.put_slice(token.as_bytes());
            }
            ClientCommand::AuthenticateUser(text) | ClientCommand::AuthenticatePassword(text) => {
                dst.put_slice(STANDARD.encode(text).as_bytes());
            }
            ClientCommand::Custom(text) => dst.put_slice(text.as_bytes()),
            ClientCommand::Quit => dst.put_slice(b"QUIT"),
        }

        dst.put_slice(b"\r\n");
    }

    #[must_use]
    pub fn to_bytes(&self, command: &ClientCommand<'_>) -> BytesMut {
        let mut dst = BytesMut::new();
        self.encode(command, &mut dst);
        dst
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{DateTime, Utc};
    use courier_common::{config::ComposerConfig, identity::SequentialIds};

    use super::*;

    fn encode(command: &ClientCommand<'_>) -> String {
        let bytes = CommandEncoder::default().to_bytes(command);
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_simple_commands() {
        let cases = [
            (ClientCommand::Helo("example.com"), "HELO example.com\r\n"),
            (ClientCommand::Ehlo("client.example.com"), "EHLO client.example.com\r\n"),
            (
                ClientCommand::MailRecipient("bob@example.com"),
                "RCPT TO: <bob@example.com>\r\n",
            ),
            (ClientCommand::StartMailData, "DATA\r\n"),
            (ClientCommand::StartTls, "STARTTLS\r\n"),
            (ClientCommand::AuthenticatePlain, "AUTH PLAIN\r\n"),
            (ClientCommand::AuthenticateLogin, "AUTH LOGIN\r\n"),
            (ClientCommand::AuthenticateCramMd5, "AUTH CRAM-MD5\r\n"),
            (
                ClientCommand::AuthenticateXOAuth2("dXNlcj1ib2IBAQ=="),
                "AUTH XOAUTH2 dXNlcj1ib2IBAQ==\r\n",
            ),
            (ClientCommand::Custom("VRFY bob"), "VRFY bob\r\n"),
            (ClientCommand::Quit, "QUIT\r\n"),
        ];

        for (command, expected) in cases {
            assert_eq!(encode(&command), expected, "{command:?}");
        }
    }

    #[test]
    fn test_sasl_login_payloads_are_base64() {
        assert_eq!(encode(&ClientCommand::AuthenticateUser("bob")), "Ym9i\r\n");
        assert_eq!(
            encode(&ClientCommand::AuthenticatePassword("hunter2")),
            "aHVudGVyMg==\r\n"
        );
    }

    #[test]
    fn test_start_mail_uses_sender() {
        let mail = Mail::builder(courier_common::mail::MailUser::named(
            "Alice",
            "alice@example.com",
        ))
        .to("bob@example.com")
        .build();

        assert_eq!(
            encode(&ClientCommand::StartMail(&mail)),
            "MAIL FROM: <alice@example.com> BODY=8BITMIME\r\n"
        );
    }

    #[test]
    fn test_mail_data_has_single_trailing_crlf() {
        let ids = Arc::new(SequentialIds::new(DateTime::<Utc>::UNIX_EPOCH.fixed_offset()));
        let encoder = CommandEncoder::new(Composer::new(ids.clone(), ComposerConfig::default()));
        let mail = Mail::builder("alice@example.com")
            .to("bob@example.com")
            .text("Hello")
            .build_with(ids.as_ref());

        let bytes = encoder.to_bytes(&ClientCommand::MailData(&mail));

        assert!(bytes.ends_with(b"--00000000000000000000000000000003--\r\n.\r\n"));
        assert!(!bytes.ends_with(b"\r\n.\r\n\r\n"));
    }

    #[test]
    fn test_display_redacts_credentials() {
        assert_eq!(ClientCommand::AuthenticateUser("bob").to_string(), "<redacted>");
        assert_eq!(
            ClientCommand::AuthenticateXOAuth2("secret").to_string(),
            "AUTH XOAUTH2 <redacted>"
        );
        assert!(ClientCommand::AuthenticatePassword("pw").is_sensitive());
        assert!(!ClientCommand::Quit.is_sensitive());
        assert_eq!(ClientCommand::Helo("example.com").to_string(), "HELO example.com");
    }
}
