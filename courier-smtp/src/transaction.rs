//! The command sequence of a complete outbound transaction.

use courier_common::{
    config::ClientConfig,
    mail::{Mail, MailError},
};

use crate::command::ClientCommand;

/// Lists the commands that deliver `mail`, in the order they are sent:
///
/// 1. `EHLO` with the configured hostname
/// 2. `STARTTLS` and a second `EHLO`, if enabled (RFC 3207 requires the
///    client to greet again once TLS is up)
/// 3. `MAIL FROM`
/// 4. one `RCPT TO` per envelope recipient
/// 5. `DATA`, the composed mail and `QUIT`
///
/// Each command is meant to be sent only after the reply to the previous one
/// has been checked.
///
/// # Errors
///
/// [`MailError::NoRecipients`] if the mail has no `To` recipient,
/// [`MailError::InvalidAddress`] if an address would break its command line.
pub fn plan<'a>(
    mail: &'a Mail,
    config: &'a ClientConfig,
) -> Result<Vec<ClientCommand<'a>>, MailError> {
    mail.validate()?;

    let mut commands = vec![ClientCommand::Ehlo(&config.hostname)];

    if config.starttls {
        commands.push(ClientCommand::StartTls);
        commands.push(ClientCommand::Ehlo(&config.hostname));
    }

    commands.push(ClientCommand::StartMail(mail));
    commands.extend(mail.recipients().map(ClientCommand::MailRecipient));
    commands.extend([
        ClientCommand::StartMailData,
        ClientCommand::MailData(mail),
        ClientCommand::Quit,
    ]);

    Ok(commands)
}
