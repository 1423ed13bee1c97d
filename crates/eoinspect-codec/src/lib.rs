//! Wire-level building blocks for the EO game protocol.
//!
//! Every packet starts with an action byte and a family byte, followed by
//! a body made of number-encoded integers and framed strings:
//! - [`number`]: the four-digit base-253 number encoding
//! - [`StreamReader`]: a cursor with typed reads over a packet
//! - [`family`]: family/action tables and class identifiers
//! - [`codec`]: 2-byte length-prefix framing for captured streams

pub mod codec;
pub mod error;
pub mod family;
pub mod number;
pub mod reader;
pub mod stream;

#[cfg(feature = "async")]
pub mod async_codec;

pub use codec::{
    decode_packet, encode_packet, PacketConfig, RawPacket, LENGTH_SIZE, MAX_PACKET_SIZE,
};
pub use error::{CodecError, Result};
pub use family::{resolve_identifier, ClassId, Direction, PacketAction, PacketFamily};
pub use number::{decode_number, encode_number, BREAK_BYTE};
pub use reader::PacketReader;
pub use stream::{StreamReader, HEADER_SIZE};

#[cfg(feature = "async")]
pub use async_codec::{packet_stream, PacketCodec};
