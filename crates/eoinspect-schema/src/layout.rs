//! Compiled packet layouts.
//!
//! A [`ProtocolSchema`] maps each [`ClassId`] to the ordered list of fields
//! the decoder reads for it. Schemas are built once by a compiler and never
//! mutated after they are installed.

use std::collections::HashMap;
use std::sync::Arc;

use eoinspect_codec::ClassId;

/// How many bytes or elements a string or array holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Length {
    /// A constant count.
    Fixed(usize),
    /// The value of an earlier numeric field in the same or an enclosing struct.
    Field(String),
    /// Everything up to the end of the packet.
    Remaining,
}

/// Primitive or composite shape of a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    /// One raw byte.
    Byte,
    /// One-byte encoded number.
    Char,
    /// Two-byte encoded number.
    Short,
    /// Three-byte encoded number.
    Three,
    /// Four-byte encoded number.
    Int,
    /// Text of a given length.
    FixedString(Length),
    /// Text preceded by a char-encoded length.
    PrefixString,
    /// Text terminated by a break byte.
    BreakString,
    /// Text running to the end of the packet.
    EndString,
    /// A lone break byte separating sections; never surfaced as a value.
    Break,
    /// A nested group of fields.
    Struct(FieldLayout),
    /// Repeated elements of one kind.
    Array {
        element: Box<FieldKind>,
        length: Length,
        /// Each element is followed by a break byte.
        delimited: bool,
    },
}

impl FieldKind {
    /// Byte width of fixed-size numeric kinds.
    pub fn numeric_width(&self) -> Option<usize> {
        match self {
            FieldKind::Byte | FieldKind::Char => Some(1),
            FieldKind::Short => Some(2),
            FieldKind::Three => Some(3),
            FieldKind::Int => Some(4),
            _ => None,
        }
    }

    /// True for kinds whose value can serve as a length.
    pub fn is_numeric(&self) -> bool {
        self.numeric_width().is_some()
    }
}

/// One named field of a layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    /// Decoded values of sensitive fields are masked before they leave the decoder.
    pub sensitive: bool,
}

impl FieldSpec {
    /// A non-sensitive field.
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            sensitive: false,
        }
    }

    /// Tag this field as sensitive.
    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }
}

/// Ordered field descriptors for one packet class (or one struct).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldLayout {
    fields: Vec<FieldSpec>,
}

impl FieldLayout {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FieldSpec> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// True if any field, at any depth, is tagged sensitive.
    pub fn has_sensitive(&self) -> bool {
        self.fields.iter().any(|field| {
            field.sensitive
                || match &field.kind {
                    FieldKind::Struct(inner) => inner.has_sensitive(),
                    FieldKind::Array { element, .. } => match element.as_ref() {
                        FieldKind::Struct(inner) => inner.has_sensitive(),
                        _ => false,
                    },
                    _ => false,
                }
        })
    }
}

impl FromIterator<FieldSpec> for FieldLayout {
    fn from_iter<I: IntoIterator<Item = FieldSpec>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a FieldLayout {
    type Item = &'a FieldSpec;
    type IntoIter = std::slice::Iter<'a, FieldSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

/// Class identifier to field layout mapping.
#[derive(Debug, Clone, Default)]
pub struct ProtocolSchema {
    layouts: HashMap<ClassId, Arc<FieldLayout>>,
    label: Option<String>,
}

impl ProtocolSchema {
    /// An empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a diagnostic label (e.g. the description file name).
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Add a layout while building; returns the layout it replaced, if any.
    pub fn insert(&mut self, id: ClassId, layout: FieldLayout) -> Option<Arc<FieldLayout>> {
        self.layouts.insert(id, Arc::new(layout))
    }

    pub fn get(&self, id: &ClassId) -> Option<&Arc<FieldLayout>> {
        self.layouts.get(id)
    }

    pub fn contains(&self, id: &ClassId) -> bool {
        self.layouts.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.layouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layouts.is_empty()
    }

    /// Described class identifiers, sorted.
    pub fn ids(&self) -> Vec<ClassId> {
        let mut ids: Vec<ClassId> = self.layouts.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use eoinspect_codec::{Direction, PacketAction, PacketFamily};

    use super::*;

    fn id(direction: Direction, family: PacketFamily, action: PacketAction) -> ClassId {
        ClassId::new(direction, family, action)
    }

    #[test]
    fn numeric_widths() {
        assert_eq!(FieldKind::Byte.numeric_width(), Some(1));
        assert_eq!(FieldKind::Char.numeric_width(), Some(1));
        assert_eq!(FieldKind::Short.numeric_width(), Some(2));
        assert_eq!(FieldKind::Three.numeric_width(), Some(3));
        assert_eq!(FieldKind::Int.numeric_width(), Some(4));
        assert!(!FieldKind::PrefixString.is_numeric());
    }

    #[test]
    fn layout_preserves_order() {
        let layout: FieldLayout = ["a", "b", "c"]
            .into_iter()
            .map(|name| FieldSpec::new(name, FieldKind::Char))
            .collect();
        let names: Vec<&str> = layout.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["a", "b", "c"]);
    }

    #[test]
    fn nested_sensitive_fields_are_found() {
        let inner = FieldLayout::new(vec![FieldSpec::new("password", FieldKind::BreakString).sensitive()]);
        let outer = FieldLayout::new(vec![FieldSpec::new("login", FieldKind::Struct(inner))]);
        assert!(outer.has_sensitive());
        assert!(!FieldLayout::new(vec![FieldSpec::new("x", FieldKind::Char)]).has_sensitive());
    }

    #[test]
    fn schema_ids_are_sorted() {
        let mut schema = ProtocolSchema::new().with_label("test");
        schema.insert(
            id(Direction::Server, PacketFamily::Walk, PacketAction::Player),
            FieldLayout::default(),
        );
        schema.insert(
            id(Direction::Client, PacketFamily::Welcome, PacketAction::Request),
            FieldLayout::default(),
        );

        let ids = schema.ids();
        assert_eq!(ids.len(), 2);
        assert_eq!(ids[0].direction, Direction::Client);
        assert_eq!(schema.label(), Some("test"));
        assert!(schema.contains(&ids[1]));
    }

    #[test]
    fn insert_reports_replaced_layout() {
        let key = id(Direction::Server, PacketFamily::Talk, PacketAction::Msg);
        let mut schema = ProtocolSchema::new();
        assert!(schema.insert(key, FieldLayout::default()).is_none());
        assert!(schema.insert(key, FieldLayout::default()).is_some());
    }
}
