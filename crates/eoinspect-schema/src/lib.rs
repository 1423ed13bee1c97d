//! Packet layouts and the registry that serves them to the decoder.
//!
//! A protocol description (JSON) is compiled into a [`ProtocolSchema`],
//! one [`FieldLayout`] per packet class. The [`SchemaRegistry`] holds the
//! active schema and can swap it for a freshly compiled one while decodes
//! are in flight.

pub mod compiler;
pub mod config;
pub mod error;
pub mod layout;
pub mod registry;
mod validator;

pub use compiler::{JsonCompiler, SchemaCompiler};
pub use config::{CompilerConfig, RegistryConfig};
pub use error::{Result, SchemaError};
pub use layout::{FieldKind, FieldLayout, FieldSpec, Length, ProtocolSchema};
pub use registry::{read_description, SchemaRegistry};
