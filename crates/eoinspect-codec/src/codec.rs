use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{CodecError, Result};
use crate::family::{resolve_identifier, ClassId, Direction};
use crate::number::{decode_number, encode_number, MAX_SHORT};

/// Length prefix: one short-encoded number (2 bytes).
pub const LENGTH_SIZE: usize = 2;

/// Largest packet a two-byte length prefix can describe.
pub const MAX_PACKET_SIZE: usize = MAX_SHORT as usize;

/// A captured packet: action, family, then body bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPacket {
    /// Which side sent the packet.
    pub direction: Direction,
    /// Packet bytes, starting with the action and family codes.
    pub bytes: Bytes,
}

impl RawPacket {
    /// Create a new packet.
    pub fn new(direction: Direction, bytes: impl Into<Bytes>) -> Self {
        Self {
            direction,
            bytes: bytes.into(),
        }
    }

    /// Action code (byte 0).
    pub fn action_byte(&self) -> Option<u8> {
        self.bytes.first().copied()
    }

    /// Family code (byte 1).
    pub fn family_byte(&self) -> Option<u8> {
        self.bytes.get(1).copied()
    }

    /// Resolve the class identifier from the header bytes.
    pub fn identifier(&self) -> Option<ClassId> {
        resolve_identifier(self.direction, self.family_byte()?, self.action_byte()?)
    }

    /// Packet length in bytes (without framing).
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True if the packet has no bytes at all.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The total wire size of this packet (length prefix + bytes).
    pub fn wire_size(&self) -> usize {
        LENGTH_SIZE + self.bytes.len()
    }
}

/// Encode a packet into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────────────┬────────┬────────┬──────────────────┐
/// │ Length (2B)  │ Action │ Family │ Body             │
/// │ short-coded  │ (1B)   │ (1B)   │ (Length - 2 B)   │
/// └──────────────┴────────┴────────┴──────────────────┘
/// ```
pub fn encode_packet(packet: &[u8], dst: &mut BytesMut) -> Result<()> {
    if packet.is_empty() {
        return Err(CodecError::EmptyPacket);
    }
    if packet.len() > MAX_PACKET_SIZE {
        return Err(CodecError::PacketTooLarge {
            size: packet.len(),
            max: MAX_PACKET_SIZE,
        });
    }

    let length = encode_number(packet.len() as u32)?;
    dst.reserve(LENGTH_SIZE + packet.len());
    dst.put_slice(&length[..LENGTH_SIZE]);
    dst.put_slice(packet);
    Ok(())
}

/// Decode one packet from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete packet yet.
/// On success, consumes the packet bytes from the buffer. A zero length
/// prefix is consumed and reported as [`CodecError::EmptyPacket`].
pub fn decode_packet(src: &mut BytesMut, max_packet_size: usize) -> Result<Option<Bytes>> {
    if src.len() < LENGTH_SIZE {
        return Ok(None); // Need more data
    }

    let length = decode_number(&src[..LENGTH_SIZE]) as usize;
    if length == 0 {
        tracing::debug!("skipping zero-length packet prefix");
        src.advance(LENGTH_SIZE);
        return Err(CodecError::EmptyPacket);
    }

    if length > max_packet_size {
        return Err(CodecError::PacketTooLarge {
            size: length,
            max: max_packet_size,
        });
    }

    if src.len() < LENGTH_SIZE + length {
        return Ok(None); // Need more data
    }

    src.advance(LENGTH_SIZE);
    Ok(Some(src.split_to(length).freeze()))
}

/// Configuration for packet framing.
#[derive(Debug, Clone)]
pub struct PacketConfig {
    /// Maximum packet size in bytes. Default and ceiling: 64008.
    pub max_packet_size: usize,
}

impl Default for PacketConfig {
    fn default() -> Self {
        Self {
            max_packet_size: MAX_PACKET_SIZE,
        }
    }
}
