//! Newline framing with a length cap
//!
//! Lines end with `\n` (an optional `\r` before it is dropped). Bytes that are
//! not valid UTF-8 are replaced. A line longer than the cap is discarded up to
//! its newline and reported once as [`Inbound::TooLong`], so a client cannot
//! make the server buffer without bound.

use bytes::{Buf, BytesMut};
use tokio_util::codec::Decoder;

/// One framed unit of client input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Line(String),
    /// A line that went past the cap; its content is gone
    TooLong,
}

#[derive(Debug)]
pub struct ChatLineCodec {
    max_length: usize,
    /// Inside an overlong line, dropping bytes until its newline
    discarding: bool,
}

impl ChatLineCodec {
    /// `max_length` counts bytes, without the line terminator
    pub fn new(max_length: usize) -> Self {
        Self {
            max_length,
            discarding: false,
        }
    }
}

impl Decoder for ChatLineCodec {
    type Item = Inbound;
    type Error = std::io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match src.iter().position(|b| *b == b'\n') {
            Some(pos) => {
                let line = src.split_to(pos + 1);
                if std::mem::take(&mut self.discarding) {
                    return Ok(Some(Inbound::TooLong));
                }

                let text = decode_line(&line);
                if text.len() > self.max_length {
                    return Ok(Some(Inbound::TooLong));
                }
                Ok(Some(Inbound::Line(text)))
            }
            None => {
                if src.len() > self.max_length {
                    src.advance(src.len());
                    self.discarding = true;
                }
                Ok(None)
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(frame) = self.decode(src)? {
            return Ok(Some(frame));
        }

        // Unterminated tail at end of stream.
        if src.is_empty() {
            return Ok(None);
        }
        let tail = src.split_to(src.len());
        if std::mem::take(&mut self.discarding) {
            return Ok(Some(Inbound::TooLong));
        }
        Ok(Some(Inbound::Line(decode_line(&tail))))
    }
}

fn decode_line(buf: &[u8]) -> String {
    String::from_utf8_lossy(buf)
        .trim_end_matches(['\r', '\n'])
        .to_string()
}
