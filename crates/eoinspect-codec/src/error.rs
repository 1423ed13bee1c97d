/// Errors that can occur in the codec layer.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// A read needed more bytes than the buffer had left.
    #[error("unexpected end of packet (needed {needed} bytes, {remaining} remaining)")]
    UnexpectedEnd { needed: usize, remaining: usize },

    /// The value cannot be represented by the four-digit number encoding.
    #[error("number {value} exceeds encodable maximum {max}")]
    NumberTooLarge { value: u32, max: u32 },

    /// The packet exceeds the configured (or encodable) maximum size.
    #[error("packet too large ({size} bytes, max {max})")]
    PacketTooLarge { size: usize, max: usize },

    /// A length prefix announced a packet with no body.
    #[error("empty packet (zero length prefix)")]
    EmptyPacket,

    /// An I/O error occurred while reading or writing packets.
    #[error("packet I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream was closed before a complete packet was received.
    #[error("connection closed (incomplete packet)")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, CodecError>;
