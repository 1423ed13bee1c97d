//! `tokio_util::codec` adapter for length-prefixed packet streams.

use bytes::{Bytes, BytesMut};
use tokio::io::AsyncRead;
use tokio_util::codec::{Decoder, Encoder, FramedRead};

use crate::codec::{decode_packet, encode_packet, PacketConfig, RawPacket};
use crate::error::CodecError;
use crate::family::Direction;

/// Frames packets for `FramedRead` / `FramedWrite`.
#[derive(Debug, Clone)]
pub struct PacketCodec {
    direction: Direction,
    config: PacketConfig,
}

impl PacketCodec {
    /// Codec tagging decoded packets with `direction`.
    pub fn new(direction: Direction) -> Self {
        Self::with_config(direction, PacketConfig::default())
    }

    /// Codec with explicit configuration.
    pub fn with_config(direction: Direction, config: PacketConfig) -> Self {
        Self { direction, config }
    }
}

impl Decoder for PacketCodec {
    type Item = RawPacket;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        Ok(decode_packet(src, self.config.max_packet_size)?
            .map(|bytes| RawPacket::new(self.direction, bytes)))
    }
}

impl Encoder<Bytes> for PacketCodec {
    type Error = CodecError;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<(), Self::Error> {
        if item.len() > self.config.max_packet_size {
            return Err(CodecError::PacketTooLarge {
                size: item.len(),
                max: self.config.max_packet_size,
            });
        }
        encode_packet(item.as_ref(), dst)
    }
}

/// Stream of packets read from an async byte source.
pub fn packet_stream<R: AsyncRead>(inner: R, direction: Direction) -> FramedRead<R, PacketCodec> {
    FramedRead::new(inner, PacketCodec::new(direction))
}
