use std::sync::Arc;

use eoinspect_codec::{
    decode_number, resolve_identifier, ClassId, Direction, PacketFamily, RawPacket, StreamReader,
    BREAK_BYTE,
};
use eoinspect_schema::{FieldKind, FieldLayout, FieldSpec, Length, SchemaRegistry};
use tracing::{debug, trace, warn};

use crate::config::DecoderConfig;
use crate::error::{DecodeError, Result};
use crate::value::{DecodedPacket, Fields, Value};

/// Pseudo-field reported when a client packet ends before its sequence byte.
const SEQUENCE_FIELD: &str = "sequence";

/// Decodes raw packets using the layouts of a [`SchemaRegistry`].
///
/// Each call works against one snapshot of the registry, so a schema
/// installed mid-decode only affects later calls.
#[derive(Debug, Clone)]
pub struct PacketDecoder {
    registry: Arc<SchemaRegistry>,
    config: DecoderConfig,
}

impl PacketDecoder {
    pub fn new(registry: Arc<SchemaRegistry>) -> Self {
        Self::with_config(registry, DecoderConfig::default())
    }

    pub fn with_config(registry: Arc<SchemaRegistry>, config: DecoderConfig) -> Self {
        Self { registry, config }
    }

    /// Decoder over the process-wide registry.
    pub fn global() -> Self {
        Self::new(SchemaRegistry::global())
    }

    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Decode one captured packet.
    pub fn decode(&self, packet: &RawPacket) -> Result<DecodedPacket> {
        self.decode_bytes(packet.direction, &packet.bytes)
    }

    /// Decode packet bytes (header included) sent in `direction`.
    pub fn decode_bytes(&self, direction: Direction, bytes: &[u8]) -> Result<DecodedPacket> {
        let action = bytes.first().copied().unwrap_or(0);
        let family = bytes.get(1).copied().unwrap_or(0);
        let id = resolve_identifier(direction, family, action)
            .ok_or(DecodeError::UnknownPacketType { family, action })?;

        let mut reader = StreamReader::new(bytes);
        if self.has_sequence(&id) {
            if reader.require(1).is_err() {
                return Err(self.truncated(id, Fields::new(), Overrun::new(SEQUENCE_FIELD, 1, 0)));
            }
            reader.skip(1);
        }

        let schema = self.registry.snapshot();
        let layout = schema.get(&id).ok_or(DecodeError::NoSchema(id))?;

        let mut walk = Walk {
            reader,
            mask_token: &self.config.mask_token,
            scopes: Vec::new(),
        };
        let mut fields = Fields::new();
        match walk.layout(layout, "", &mut fields) {
            Ok(()) => {
                trace!(
                    id = %id,
                    fields = fields.len(),
                    unread = walk.reader.remaining(),
                    "decoded packet"
                );
                Ok(DecodedPacket::new(id, fields))
            }
            Err(overrun) => Err(self.truncated(id, fields, overrun)),
        }
    }

    fn has_sequence(&self, id: &ClassId) -> bool {
        self.config.skip_client_sequence
            && id.direction == Direction::Client
            && id.family != PacketFamily::Init
    }

    fn truncated(&self, id: ClassId, partial: Fields, overrun: Overrun) -> DecodeError {
        let partial = Box::new(DecodedPacket::new(id, partial));
        if let Some(found) = overrun.found {
            warn!(id = %id, field = %overrun.field, found, "expected a break byte");
            return DecodeError::MissingBreak {
                partial,
                field: overrun.field,
                found,
            };
        }
        warn!(
            id = %id,
            field = %overrun.field,
            needed = overrun.needed,
            remaining = overrun.remaining,
            "packet shorter than its layout"
        );
        DecodeError::Truncated {
            partial,
            field: overrun.field,
            needed: overrun.needed,
            remaining: overrun.remaining,
        }
    }
}

/// A read that ran past the end of the packet, or a break that was not there.
#[derive(Debug)]
struct Overrun {
    field: String,
    needed: usize,
    remaining: usize,
    /// Byte found where a break was expected.
    found: Option<u8>,
    /// What the enclosing struct or array had decoded so far.
    partial: Option<Value>,
}

impl Overrun {
    fn new(field: &str, needed: usize, remaining: usize) -> Self {
        Self {
            field: field.to_string(),
            needed,
            remaining,
            found: None,
            partial: None,
        }
    }

    fn missing_break(field: &str, found: u8) -> Self {
        Self {
            found: Some(found),
            ..Self::new(field, 1, 0)
        }
    }
}

type Step<T> = std::result::Result<T, Overrun>;

/// State of one decode call.
struct Walk<'a, 'p> {
    reader: StreamReader<'p>,
    mask_token: &'a str,
    /// Numeric values decoded so far, one frame per open struct.
    scopes: Vec<Vec<(&'a str, u32)>>,
}

impl<'a> Walk<'a, '_> {
    fn layout(&mut self, layout: &'a FieldLayout, prefix: &str, out: &mut Fields) -> Step<()> {
        self.scopes.push(Vec::new());
        let result = self.fields(layout, prefix, out);
        self.scopes.pop();
        result
    }

    fn fields(&mut self, layout: &'a FieldLayout, prefix: &str, out: &mut Fields) -> Step<()> {
        for field in layout {
            let path = join_path(prefix, &field.name);
            match self.value(&field.kind, &path) {
                Ok(Some(value)) => {
                    if let (true, Some(number)) = (field.kind.is_numeric(), value.as_number()) {
                        self.declare(&field.name, number);
                    }
                    out.push(field.name.as_str(), self.redact(field, value));
                }
                Ok(None) => {}
                Err(mut overrun) => {
                    if let Some(value) = overrun.partial.take() {
                        out.push(field.name.as_str(), self.redact(field, value));
                    }
                    return Err(overrun);
                }
            }
        }
        Ok(())
    }

    /// Read one value; `None` for kinds that produce no value.
    fn value(&mut self, kind: &'a FieldKind, path: &str) -> Step<Option<Value>> {
        let value = match kind {
            FieldKind::Byte => {
                self.need(path, 1)?;
                Value::Byte(self.reader.get_byte())
            }
            FieldKind::Char => {
                self.need(path, 1)?;
                Value::Number(self.reader.get_char())
            }
            FieldKind::Short => {
                self.need(path, 2)?;
                Value::Number(self.reader.get_short())
            }
            FieldKind::Three => {
                self.need(path, 3)?;
                Value::Number(self.reader.get_three())
            }
            FieldKind::Int => {
                self.need(path, 4)?;
                Value::Number(self.reader.get_int())
            }
            FieldKind::FixedString(length) => {
                let length = self
                    .count(length, path)
                    .unwrap_or_else(|| self.reader.remaining());
                self.need(path, length)?;
                Value::Text(self.reader.get_fixed_string(length))
            }
            FieldKind::PrefixString => {
                self.need(path, 1)?;
                let length = decode_number(&[self.reader.peek_byte().unwrap_or(0)]) as usize;
                self.need(path, length.saturating_add(1))?;
                Value::Text(self.reader.get_prefix_string())
            }
            FieldKind::BreakString => {
                if self.reader.find_break().is_none() {
                    let remaining = self.reader.remaining();
                    return Err(Overrun::new(path, remaining.saturating_add(1), remaining));
                }
                Value::Text(self.reader.get_break_string())
            }
            FieldKind::EndString => Value::Text(self.reader.get_end_string()),
            FieldKind::Break => {
                self.need(path, 1)?;
                self.expect_break(path)?;
                return Ok(None);
            }
            FieldKind::Struct(layout) => {
                let mut fields = Fields::new();
                if let Err(mut overrun) = self.layout(layout, path, &mut fields) {
                    overrun.partial = Some(Value::Struct(fields));
                    return Err(overrun);
                }
                Value::Struct(fields)
            }
            FieldKind::Array {
                element,
                length,
                delimited,
            } => self.array(element, length, *delimited, path)?,
        };
        Ok(Some(value))
    }

    fn array(
        &mut self,
        element: &'a FieldKind,
        length: &Length,
        delimited: bool,
        path: &str,
    ) -> Step<Value> {
        let count = self.count(length, path);
        let mut items = Vec::new();
        let mut index = 0usize;

        loop {
            match count {
                Some(count) if index >= count => break,
                None if self.reader.eof() => break,
                _ => {}
            }

            let start = self.reader.position();
            match self.value(element, &format!("{path}[{index}]")) {
                Ok(Some(item)) => items.push(item),
                Ok(None) => {}
                Err(mut overrun) => {
                    if let Some(item) = overrun.partial.take() {
                        items.push(item);
                    }
                    overrun.partial = Some(Value::Array(items));
                    return Err(overrun);
                }
            }
            // The last delimiter may be cut by the end of the packet.
            if delimited && !ends_with_break(element) && !self.reader.eof() {
                if let Err(mut overrun) = self.expect_break(&format!("{path}[{index}]")) {
                    overrun.partial = Some(Value::Array(items));
                    return Err(overrun);
                }
            }
            index += 1;

            // An element that occupies no bytes would repeat forever.
            if count.is_none() && self.reader.position() == start {
                break;
            }
        }

        Ok(Value::Array(items))
    }

    /// Resolve a length; `None` means "up to the end of the packet".
    fn count(&self, length: &Length, path: &str) -> Option<usize> {
        match length {
            Length::Fixed(count) => Some(*count),
            Length::Field(name) => {
                let value = self.lookup(name).unwrap_or_else(|| {
                    debug!(field = path, reference = %name, "length field not decoded, using 0");
                    0
                });
                Some(value as usize)
            }
            Length::Remaining => None,
        }
    }

    /// Consume one break byte at the cursor.
    fn expect_break(&mut self, path: &str) -> Step<()> {
        match self.reader.peek_byte() {
            Some(BREAK_BYTE) => {
                self.reader.skip(1);
                Ok(())
            }
            Some(found) => Err(Overrun::missing_break(path, found)),
            None => Err(Overrun::new(path, 1, 0)),
        }
    }

    fn need(&self, path: &str, needed: usize) -> Step<()> {
        self.reader
            .require(needed)
            .map_err(|_| Overrun::new(path, needed, self.reader.remaining()))
    }

    fn declare(&mut self, name: &'a str, value: u32) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.push((name, value));
        }
    }

    /// Most recent value of `name`, innermost struct first.
    fn lookup(&self, name: &str) -> Option<u32> {
        self.scopes
            .iter()
            .rev()
            .flat_map(|scope| scope.iter().rev())
            .find(|(declared, _)| *declared == name)
            .map(|(_, value)| *value)
    }

    fn redact(&self, field: &FieldSpec, value: Value) -> Value {
        if field.sensitive {
            Value::Masked(self.mask_token.to_string())
        } else {
            value
        }
    }
}

/// Whether reading `kind` already consumes a trailing break.
fn ends_with_break(kind: &FieldKind) -> bool {
    match kind {
        FieldKind::BreakString | FieldKind::Break => true,
        FieldKind::Struct(layout) => layout
            .iter()
            .last()
            .is_some_and(|field| ends_with_break(&field.kind)),
        _ => false,
    }
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}
