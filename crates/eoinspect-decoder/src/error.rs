use eoinspect_codec::ClassId;

use crate::value::DecodedPacket;

/// Reasons a packet could not be fully decoded.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The header bytes do not name a known family/action pair.
    #[error("unknown packet type (family {family}, action {action})")]
    UnknownPacketType { family: u8, action: u8 },

    /// The packet class is known but the active schema does not describe it.
    #[error("no layout for {0}")]
    NoSchema(ClassId),

    /// The packet ended before its layout did.
    #[error(
        "{} truncated at `{field}` (needed {needed} bytes, {remaining} remaining)",
        .partial.id()
    )]
    Truncated {
        /// Fields decoded before the overrun, already redacted.
        partial: Box<DecodedPacket>,
        /// Path of the field that could not be read.
        field: String,
        needed: usize,
        remaining: usize,
    },

    /// A break byte was expected but the packet held something else.
    #[error("{} expected a break at `{field}`, found byte {found}", .partial.id())]
    MissingBreak {
        /// Fields decoded before the mismatch, already redacted.
        partial: Box<DecodedPacket>,
        field: String,
        found: u8,
    },
}

impl DecodeError {
    /// Fields recovered before a truncation or a missing break.
    pub fn partial(&self) -> Option<&DecodedPacket> {
        match self {
            DecodeError::Truncated { partial, .. } | DecodeError::MissingBreak { partial, .. } => {
                Some(partial)
            }
            _ => None,
        }
    }

    /// Class identifier, when the header resolved.
    pub fn class_id(&self) -> Option<ClassId> {
        match self {
            DecodeError::UnknownPacketType { .. } => None,
            DecodeError::NoSchema(id) => Some(*id),
            DecodeError::Truncated { partial, .. } | DecodeError::MissingBreak { partial, .. } => {
                Some(partial.id())
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, DecodeError>;
