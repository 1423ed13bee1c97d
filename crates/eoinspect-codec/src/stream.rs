use crate::error::{CodecError, Result};
use crate::number::{decode_number, BREAK_BYTE};

/// Bytes occupied by the action and family codes at the start of a packet.
pub const HEADER_SIZE: usize = 2;

/// Forward-only cursor over a packet body with typed reads.
///
/// The cursor starts just past the action/family header. Reads never fail:
/// bytes past the end read as zero (or an empty string) and the cursor still
/// moves by the read's width. Callers that care about truncation check
/// [`StreamReader::require`] or [`StreamReader::find_break`] first.
#[derive(Debug, Clone)]
pub struct StreamReader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> StreamReader<'a> {
    /// Create a reader positioned after the packet header.
    pub fn new(data: &'a [u8]) -> Self {
        Self::at(data, HEADER_SIZE)
    }

    /// Create a reader at an explicit offset.
    pub fn at(data: &'a [u8], position: usize) -> Self {
        Self { data, position }
    }

    /// True once the cursor has reached or passed the end of the buffer.
    pub fn eof(&self) -> bool {
        self.position >= self.data.len()
    }

    /// Current cursor offset.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Bytes left between the cursor and the end of the buffer.
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// Fail unless at least `needed` bytes remain.
    pub fn require(&self, needed: usize) -> Result<()> {
        let remaining = self.remaining();
        if remaining < needed {
            return Err(CodecError::UnexpectedEnd { needed, remaining });
        }
        Ok(())
    }

    /// Offset of the next break byte relative to the cursor, if any.
    pub fn find_break(&self) -> Option<usize> {
        self.data
            .get(self.position..)
            .and_then(|rest| rest.iter().position(|&byte| byte == BREAK_BYTE))
    }

    /// Move the cursor to an absolute offset.
    pub fn seek(&mut self, position: usize) {
        self.position = position;
    }

    /// Advance the cursor without reading.
    pub fn skip(&mut self, count: usize) {
        self.position = self.position.saturating_add(count);
    }

    /// Byte under the cursor, without advancing.
    pub fn peek_byte(&self) -> Option<u8> {
        self.data.get(self.position).copied()
    }

    /// One raw byte.
    pub fn get_byte(&mut self) -> u8 {
        let byte = self.peek_byte().unwrap_or(0);
        self.skip(1);
        byte
    }

    /// One byte decoded as a number.
    pub fn get_char(&mut self) -> u32 {
        self.get_number(1)
    }

    /// Two bytes decoded as a number.
    pub fn get_short(&mut self) -> u32 {
        self.get_number(2)
    }

    /// Three bytes decoded as a number.
    pub fn get_three(&mut self) -> u32 {
        self.get_number(3)
    }

    /// Four bytes decoded as a number.
    pub fn get_int(&mut self) -> u32 {
        self.get_number(4)
    }

    /// `length` bytes as text.
    pub fn get_fixed_string(&mut self, length: usize) -> String {
        let text = String::from_utf8_lossy(self.window(length)).into_owned();
        self.skip(length);
        text
    }

    /// Text up to the next break byte; the break byte is consumed too.
    ///
    /// Without a terminator the rest of the buffer is returned.
    pub fn get_break_string(&mut self) -> String {
        let length = self.find_break().unwrap_or_else(|| self.remaining());
        let text = self.get_fixed_string(length);
        self.skip(1);
        text
    }

    /// A char-encoded length followed by that many bytes of text.
    pub fn get_prefix_string(&mut self) -> String {
        let length = self.get_char() as usize;
        self.get_fixed_string(length)
    }

    /// All remaining bytes as text.
    pub fn get_end_string(&mut self) -> String {
        let length = self.remaining();
        self.get_fixed_string(length)
    }

    fn get_number(&mut self, width: usize) -> u32 {
        let value = decode_number(self.window(width));
        self.skip(width);
        value
    }

    fn window(&self, length: usize) -> &'a [u8] {
        let start = self.position.min(self.data.len());
        let end = self.position.saturating_add(length).min(self.data.len());
        &self.data[start..end]
    }
}
