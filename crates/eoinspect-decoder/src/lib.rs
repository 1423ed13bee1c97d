//! Schema-driven packet decoding.
//!
//! [`PacketDecoder`] resolves a packet's class from its header, looks the
//! layout up in a [`SchemaRegistry`](eoinspect_schema::SchemaRegistry)
//! snapshot and walks it over the body. Values of sensitive fields are
//! masked before anything is returned, including the partial fields carried
//! by [`DecodeError::Truncated`] and [`DecodeError::MissingBreak`].

pub mod config;
pub mod decoder;
pub mod error;
pub mod value;

pub use config::{DecoderConfig, DEFAULT_MASK_TOKEN};
pub use decoder::PacketDecoder;
pub use error::{DecodeError, Result};
pub use value::{describe_raw, DecodedPacket, Fields, RawDescription, Value};
