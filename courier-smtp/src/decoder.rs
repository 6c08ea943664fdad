//! Incremental decoding of server replies.
//!
//! Every reply line has the shape `<code><separator><text>\r\n`, where the
//! separator is `-` for continuation lines and a space for the final line.
//! Bytes may arrive in arbitrary fragments: complete lines are consumed and
//! returned, a trailing partial line stays in the buffer untouched until the
//! rest of it arrives.

use bytes::{Buf, BytesMut};
use courier_common::reply;

use crate::{
    error::{Result, SmtpError},
    response::ServerResponse,
};

const CODE_LEN: usize = 3;
const CRLF: &[u8] = b"\r\n";

/// Position of the first `\r\n` in `buf` at or after `from`.
fn find_crlf(buf: &[u8], from: usize) -> Option<usize> {
    buf.get(from..)?
        .windows(CRLF.len())
        .position(|window| window == CRLF)
        .map(|position| from + position)
}

fn parse_code(raw: &[u8]) -> Result<u16> {
    if raw.len() != CODE_LEN || !raw.iter().all(u8::is_ascii_digit) {
        return Err(SmtpError::InvalidCode(raw.to_vec()));
    }

    Ok(raw
        .iter()
        .fold(0, |code, digit| code * 10 + u16::from(digit - b'0')))
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseDecoder {
    /// How far the current partial line has already been searched for CRLF.
    searched: usize,
}

impl ResponseDecoder {
    #[must_use]
    pub const fn new() -> Self {
        Self { searched: 0 }
    }

    /// Drains every complete reply line from `src`.
    ///
    /// Returns `Ok(None)` when not a single complete line is available yet.
    /// Lines are not merged: `250-a\r\n250 b\r\n` yields two responses.
    ///
    /// # Errors
    ///
    /// [`SmtpError::InvalidCode`] if a line does not start with three
    /// digits, [`SmtpError::InvalidMessage`] if its text is not UTF-8. Both
    /// are fatal for the connection.
    pub fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Vec<ServerResponse>>> {
        let mut responses = Vec::new();

        while !src.is_empty() {
            match self.decode_line(src)? {
                Some(response) => {
                    reply!("{response}");
                    responses.push(response);
                }
                None => break,
            }
        }

        Ok((!responses.is_empty()).then_some(responses))
    }

    /// Like [`ResponseDecoder::decode`], for when the stream has ended.
    ///
    /// # Errors
    ///
    /// In addition to the errors of [`ResponseDecoder::decode`], returns
    /// [`SmtpError::IncompleteMessage`] if unparsed bytes remain.
    pub fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Vec<ServerResponse>>> {
        match self.decode(src)? {
            Some(responses) => Ok(Some(responses)),
            None if src.is_empty() => Ok(None),
            None => Err(SmtpError::IncompleteMessage),
        }
    }

    fn decode_line(&mut self, src: &mut BytesMut) -> Result<Option<ServerResponse>> {
        if src.len() < CODE_LEN {
            return Ok(None);
        }

        let code = parse_code(&src[..CODE_LEN])?;

        let Some(end) = find_crlf(src, self.searched.max(CODE_LEN)) else {
            // A lone trailing '\r' may be the start of the terminator
            self.searched = src.len().saturating_sub(1);
            return Ok(None);
        };

        let text =
            std::str::from_utf8(&src[CODE_LEN..end]).map_err(|_| SmtpError::InvalidMessage)?;
        let message = text.strip_prefix([' ', '-']).unwrap_or(text).to_string();

        src.advance(end + CRLF.len());
        self.searched = 0;

        Ok(Some(ServerResponse { code, message }))
    }
}
