//! Decode and inspect EO game protocol packets.
//!
//! Packets are decoded against layouts compiled from a JSON protocol
//! description. The description can be replaced at any time; decodes in
//! flight finish against the layouts they started with.
//!
//! # Crate Structure
//!
//! - [`codec`]: number encoding, stream reader, packet taxonomy and framing
//! - [`schema`]: layouts, the description compiler and the schema registry
//! - [`decoder`]: schema-driven decoding with redaction of sensitive fields
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! use eoinspect::codec::{Direction, RawPacket};
//! use eoinspect::decoder::PacketDecoder;
//! use eoinspect::schema::{JsonCompiler, SchemaRegistry};
//!
//! let registry = Arc::new(SchemaRegistry::new());
//! registry
//!     .load_file(&JsonCompiler::new(), Path::new("protocol.json"))
//!     .unwrap();
//!
//! let decoder = PacketDecoder::new(registry);
//! let packet = RawPacket::new(Direction::Server, vec![8u8, 5, 2, 4, b'b', b'o', b'b']);
//! match decoder.decode(&packet) {
//!     Ok(decoded) => println!("{}", decoded.id()),
//!     Err(err) => eprintln!("{err}"),
//! }
//! ```

/// Re-export wire-level types.
pub mod codec {
    pub use eoinspect_codec::*;
}

/// Re-export schema types.
pub mod schema {
    pub use eoinspect_schema::*;
}

/// Re-export decoder types.
pub mod decoder {
    pub use eoinspect_decoder::*;
}
