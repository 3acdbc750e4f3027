//! Frame codecs for `tokio_util::codec`. Packets carry no length prefix, so decoding parses
//! optimistically and waits for more bytes whenever the buffer ends mid-packet.

use crate::error::{CobbleError, Result};
use crate::protocol::packet::{ClientPacket, Frame, ServerPacket};
use bytes::{Buf, BufMut, BytesMut};
use std::io::Cursor;
use tokio_util::codec::{Decoder, Encoder};

/// Server side of a connection: decodes what clients send, encodes what the server sends.
#[derive(Debug, Clone, Copy, Default)]
pub struct ServerCodec;

/// Client side of a connection. The mirror image of [`ServerCodec`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ClientCodec;

fn decode_frame<P, F>(src: &mut BytesMut, read: F) -> Result<Option<Frame<P>>>
where
    F: FnOnce(&mut Cursor<&[u8]>) -> Result<Frame<P>>,
{
    if src.is_empty() {
        return Ok(None);
    }
    let mut cursor = Cursor::new(&src[..]);
    match read(&mut cursor) {
        Ok(frame) => {
            let consumed = cursor.position() as usize;
            src.advance(consumed);
            Ok(Some(frame))
        }
        Err(err) if err.is_incomplete() => Ok(None),
        Err(err) => Err(err),
    }
}

impl Decoder for ServerCodec {
    type Item = Frame<ClientPacket>;
    type Error = CobbleError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        decode_frame(src, |cursor| ClientPacket::read(cursor))
    }
}

impl Encoder<ServerPacket> for ServerCodec {
    type Error = CobbleError;

    fn encode(&mut self, item: ServerPacket, dst: &mut BytesMut) -> Result<()> {
        item.write(&mut dst.writer())
    }
}

impl Decoder for ClientCodec {
    type Item = Frame<ServerPacket>;
    type Error = CobbleError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        decode_frame(src, |cursor| ServerPacket::read(cursor))
    }
}

impl Encoder<ClientPacket> for ClientCodec {
    type Error = CobbleError;

    fn encode(&mut self, item: ClientPacket, dst: &mut BytesMut) -> Result<()> {
        item.write(&mut dst.writer())
    }
}
