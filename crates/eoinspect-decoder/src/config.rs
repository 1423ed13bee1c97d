/// Mask written in place of sensitive values.
pub const DEFAULT_MASK_TOKEN: &str = "********";

/// Decoder behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoderConfig {
    /// Replacement text for values of sensitive fields.
    pub mask_token: String,
    /// Skip the sequence byte that follows the header of client packets
    /// (every family except Init).
    pub skip_client_sequence: bool,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            mask_token: DEFAULT_MASK_TOKEN.to_string(),
            skip_client_sequence: true,
        }
    }
}
