//! Per-connection client state without any I/O.
//!
//! The transport owning the socket feeds received bytes into
//! [`ClientSession::receive`] and writes whatever [`ClientSession::send`]
//! returns. Each sent command arms a completion target which resolves with
//! the reply lines decoded by the next `receive` call that completes at least
//! one line.

use std::{
    future::Future,
    io,
    pin::Pin,
    task::{Context, Poll},
};

use bytes::{Bytes, BytesMut};
use courier_common::{command, internal};
use tokio::sync::oneshot::{self, error::TryRecvError};

use crate::{
    command::{ClientCommand, CommandEncoder},
    decoder::ResponseDecoder,
    error::{Result, SmtpError},
    mime::Composer,
    response::ServerResponse,
};

type Reply = Result<Vec<ServerResponse>>;

fn abandoned() -> SmtpError {
    SmtpError::Internal(String::from("Reply target was dropped before completion"))
}

/// Resolves with the reply lines for a command.
///
/// Dropping it abandons the wait; the session discards the reply when it
/// arrives.
#[derive(Debug)]
pub struct PendingReply {
    receiver: oneshot::Receiver<Reply>,
}

impl PendingReply {
    /// Non-blocking check, `None` while the reply is still outstanding.
    pub fn try_reply(&mut self) -> Option<Reply> {
        match self.receiver.try_recv() {
            Ok(reply) => Some(reply),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => Some(Err(abandoned())),
        }
    }
}

impl Future for PendingReply {
    type Output = Reply;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|received| received.unwrap_or_else(|_| Err(abandoned())))
    }
}

#[derive(Debug, Default)]
pub struct ClientSession {
    encoder: CommandEncoder,
    decoder: ResponseDecoder,
    buffer: BytesMut,
    pending: Option<oneshot::Sender<Reply>>,
    failure: Option<SmtpError>,
}

impl ClientSession {
    #[must_use]
    pub fn new(composer: Composer) -> Self {
        Self {
            encoder: CommandEncoder::new(composer),
            ..Self::default()
        }
    }

    /// The fatal error that ended this session, if any.
    #[must_use]
    pub const fn failure(&self) -> Option<&SmtpError> {
        self.failure.as_ref()
    }

    /// Arms the completion target without sending anything, e.g. for the
    /// greeting the server sends on connect.
    pub fn expect_reply(&mut self) -> PendingReply {
        let (sender, receiver) = oneshot::channel();

        if self.pending.replace(sender).is_some() {
            internal!(level = DEBUG, "Replaced an unresolved reply target");
        }

        PendingReply { receiver }
    }

    /// Encodes `command` and arms the completion target for its reply.
    /// The returned bytes must be written to the transport by the caller.
    ///
    /// # Errors
    ///
    /// Returns the earlier fatal error if the session has failed.
    pub fn send(&mut self, command: ClientCommand<'_>) -> Result<(Bytes, PendingReply)> {
        if let Some(failure) = &self.failure {
            return Err(failure.clone());
        }

        let mut out = BytesMut::new();
        self.encoder.encode(&command, &mut out);
        command!("{command}");

        Ok((out.freeze(), self.expect_reply()))
    }

    /// Appends received bytes and resolves the completion target with every
    /// reply line completed by them.
    ///
    /// # Errors
    ///
    /// Returns a fatal decode error, which also fails the completion target.
    /// Once failed, every further call returns the same error.
    pub fn receive(&mut self, bytes: &[u8]) -> Result<()> {
        if let Some(failure) = &self.failure {
            return Err(failure.clone());
        }

        self.buffer.extend_from_slice(bytes);

        match self.decoder.decode(&mut self.buffer) {
            Ok(Some(responses)) => {
                self.resolve(Ok(responses));
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(err) => Err(self.fail(err)),
        }
    }

    /// The transport reached end of stream.
    ///
    /// # Errors
    ///
    /// [`SmtpError::IncompleteMessage`] if a partial reply line is left over,
    /// or any fatal decode error.
    pub fn finish(&mut self) -> Result<()> {
        if let Some(failure) = &self.failure {
            return Err(failure.clone());
        }

        match self.decoder.decode_eof(&mut self.buffer) {
            Ok(Some(responses)) => {
                self.resolve(Ok(responses));
                self.finish()
            }
            Ok(None) => {
                if self.pending.is_some() {
                    self.resolve(Err(SmtpError::from(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "Connection closed before the reply arrived",
                    ))));
                }
                Ok(())
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    fn fail(&mut self, err: SmtpError) -> SmtpError {
        internal!(level = ERROR, "Session failed: {err}");

        self.resolve(Err(err.clone()));
        self.failure = Some(err.clone());

        err
    }

    fn resolve(&mut self, reply: Reply) {
        match self.pending.take() {
            Some(sender) => {
                if sender.send(reply).is_err() {
                    internal!(level = DEBUG, "Reply arrived after its target was abandoned");
                }
            }
            None => internal!(level = WARN, "Unsolicited reply: {reply:?}"),
        }
    }
}
