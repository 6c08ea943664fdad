use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::{
    command::{ClientCommand, CommandEncoder},
    decoder::ResponseDecoder,
    error::SmtpError,
    mime::Composer,
    response::ServerResponse,
};

/// Client side SMTP codec for use with `tokio_util::codec::Framed`.
///
/// Each decoded item holds the reply lines that were complete when the
/// decoder ran, in arrival order.
#[derive(Debug, Clone, Default)]
pub struct SmtpCodec {
    encoder: CommandEncoder,
    decoder: ResponseDecoder,
}

impl SmtpCodec {
    #[must_use]
    pub fn new(composer: Composer) -> Self {
        Self {
            encoder: CommandEncoder::new(composer),
            decoder: ResponseDecoder::new(),
        }
    }
}

impl Decoder for SmtpCodec {
    type Item = Vec<ServerResponse>;
    type Error = SmtpError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        self.decoder.decode(src)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        self.decoder.decode_eof(src)
    }
}

impl<'a> Encoder<ClientCommand<'a>> for SmtpCodec {
    type Error = SmtpError;

    fn encode(&mut self, item: ClientCommand<'a>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        self.encoder.encode(&item, dst);
        Ok(())
    }
}
