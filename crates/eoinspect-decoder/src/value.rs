//! Decoded field values.

use std::fmt;

use eoinspect_codec::{ClassId, RawPacket};
use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Serialize, Serializer};

/// One decoded field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// A raw byte.
    Byte(u8),
    /// A number-encoded integer (char, short, three or int).
    Number(u32),
    Text(String),
    Struct(Fields),
    Array(Vec<Value>),
    /// A sensitive value replaced by the mask token.
    Masked(String),
}

impl Value {
    /// Numeric value of a byte or number field.
    pub fn as_number(&self) -> Option<u32> {
        match self {
            Value::Byte(byte) => Some(u32::from(*byte)),
            Value::Number(number) => Some(*number),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&Fields> {
        match self {
            Value::Struct(fields) => Some(fields),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn is_masked(&self) -> bool {
        matches!(self, Value::Masked(_))
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Byte(byte) => serializer.serialize_u8(*byte),
            Value::Number(number) => serializer.serialize_u32(*number),
            Value::Text(text) | Value::Masked(text) => serializer.serialize_str(text),
            Value::Struct(fields) => fields.serialize(serializer),
            Value::Array(items) => items.serialize(serializer),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Byte(byte) => write!(f, "{byte}"),
            Value::Number(number) => write!(f, "{number}"),
            Value::Text(text) => write!(f, "{text:?}"),
            Value::Masked(token) => f.write_str(token),
            Value::Struct(fields) => {
                f.write_str("{")?;
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{name}: {value}")?;
                }
                f.write_str("}")
            }
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

/// Named values in layout order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fields {
    entries: Vec<(String, Value)>,
}

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, value: Value) {
        self.entries.push((name.into(), value));
    }

    /// First value with the given name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IntoIterator for Fields {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl Serialize for Fields {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// A packet decoded against its layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPacket {
    id: ClassId,
    fields: Fields,
}

impl DecodedPacket {
    pub fn new(id: ClassId, fields: Fields) -> Self {
        Self { id, fields }
    }

    pub fn id(&self) -> ClassId {
        self.id
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn into_fields(self) -> Fields {
        self.fields
    }
}

impl Serialize for DecodedPacket {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut packet = serializer.serialize_struct("DecodedPacket", 3)?;
        packet.serialize_field("direction", self.id.direction.as_str())?;
        packet.serialize_field("id", &self.id.packet_id())?;
        packet.serialize_field("fields", &self.fields)?;
        packet.end()
    }
}

/// Fallback rendering of a packet that could not be fully decoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawDescription {
    pub direction: &'static str,
    /// `Family_Action` when both header bytes name something.
    pub id: Option<String>,
    pub bytes: Vec<u8>,
}

impl fmt::Display for RawDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id.as_deref().unwrap_or("?"))?;
        f.write_str(":")?;
        for byte in &self.bytes {
            write!(f, " {byte}")?;
        }
        Ok(())
    }
}

/// Describe a packet by its identifier (when resolvable) and raw bytes.
pub fn describe_raw(packet: &RawPacket) -> RawDescription {
    RawDescription {
        direction: packet.direction.as_str(),
        id: packet.identifier().map(|id| id.packet_id()),
        bytes: packet.bytes.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use eoinspect_codec::{Direction, PacketAction, PacketFamily};
    use serde_json::json;

    use super::*;

    fn sample() -> DecodedPacket {
        let mut coords = Fields::new();
        coords.push("x", Value::Number(3));
        coords.push("y", Value::Number(4));

        let mut fields = Fields::new();
        fields.push("name", Value::Text("bob".to_string()));
        fields.push("id", Value::Number(1));
        fields.push("at", Value::Struct(coords));
        fields.push("flags", Value::Array(vec![Value::Byte(1), Value::Byte(2)]));
        fields.push("password", Value::Masked("********".to_string()));

        DecodedPacket::new(
            ClassId::new(Direction::Server, PacketFamily::Welcome, PacketAction::Player),
            fields,
        )
    }

    #[test]
    fn serializes_fields_in_layout_order() {
        let text = serde_json::to_string(&sample()).unwrap();
        assert_eq!(
            text,
            r#"{"direction":"server","id":"Welcome_Player","fields":{"name":"bob","id":1,"at":{"x":3,"y":4},"flags":[1,2],"password":"********"}}"#
        );
    }

    #[test]
    fn accessors() {
        let packet = sample();
        assert_eq!(packet.get("id").and_then(Value::as_number), Some(1));
        assert_eq!(packet.get("name").and_then(Value::as_text), Some("bob"));
        assert_eq!(packet.get("flags").and_then(Value::as_array).map(<[Value]>::len), Some(2));
        assert!(packet.get("password").is_some_and(Value::is_masked));
        assert!(packet.get("missing").is_none());

        let at = packet.get("at").and_then(Value::as_struct).unwrap();
        assert_eq!(at.names().collect::<Vec<_>>(), ["x", "y"]);
    }

    #[test]
    fn display_is_compact() {
        let packet = sample();
        assert_eq!(packet.get("at").unwrap().to_string(), "{x: 3, y: 4}");
        assert_eq!(packet.get("name").unwrap().to_string(), "\"bob\"");
    }

    #[test]
    fn raw_description_names_known_packets() {
        let known = describe_raw(&RawPacket::new(Direction::Server, vec![8u8, 5, 2, 4]));
        assert_eq!(known.id.as_deref(), Some("Welcome_Player"));
        assert_eq!(known.to_string(), "Welcome_Player: 8 5 2 4");

        let unknown = describe_raw(&RawPacket::new(Direction::Client, vec![1u8, 250]));
        assert!(unknown.id.is_none());
        assert_eq!(
            serde_json::to_value(&unknown).unwrap(),
            json!({ "direction": "client", "id": null, "bytes": [1, 250] })
        );
    }
}
