//! Turning protocol description text into a [`ProtocolSchema`].

use std::collections::BTreeMap;

use eoinspect_codec::{ClassId, Direction, PacketAction, PacketFamily};
use serde::Deserialize;
use serde_json::Value;

use crate::config::CompilerConfig;
use crate::error::{Result, SchemaError};
use crate::layout::{FieldKind, FieldLayout, FieldSpec, Length, ProtocolSchema};
use crate::validator::validate_description;

/// Compiles description text into a protocol schema.
///
/// A compiler must either return a complete schema or an error; registries
/// only install what a compiler fully accepted.
pub trait SchemaCompiler {
    fn compile(&self, source: &str) -> Result<ProtocolSchema>;
}

impl<F> SchemaCompiler for F
where
    F: Fn(&str) -> Result<ProtocolSchema>,
{
    fn compile(&self, source: &str) -> Result<ProtocolSchema> {
        self(source)
    }
}

/// Compiler for the JSON protocol description format.
#[derive(Debug, Clone, Default)]
pub struct JsonCompiler {
    config: CompilerConfig,
}

impl JsonCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: CompilerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }
}

impl SchemaCompiler for JsonCompiler {
    fn compile(&self, source: &str) -> Result<ProtocolSchema> {
        let value: Value = serde_json::from_str(source)?;
        validate_description(&value, self.config.strict_mode)?;
        let description: Description = serde_json::from_value(value)?;

        let mut resolver = Resolver {
            structs: &description.structs,
            config: &self.config,
            resolving: Vec::new(),
        };

        let mut schema = ProtocolSchema::new();
        for packet in &description.packets {
            let id = packet.class_id()?;
            if schema.contains(&id) {
                return Err(SchemaError::DuplicatePacket(id.to_string()));
            }
            let mut scope = Scope::default();
            let layout = resolver.layout(&packet.fields, &mut scope)?;
            schema.insert(id, layout);
        }

        Ok(schema)
    }
}

#[derive(Debug, Deserialize)]
struct Description {
    #[serde(default)]
    structs: BTreeMap<String, Vec<FieldDef>>,
    packets: Vec<PacketDef>,
}

#[derive(Debug, Deserialize)]
struct PacketDef {
    direction: String,
    family: String,
    action: String,
    #[serde(default)]
    fields: Vec<FieldDef>,
}

impl PacketDef {
    fn class_id(&self) -> Result<ClassId> {
        let direction = Direction::parse(&self.direction)
            .ok_or_else(|| SchemaError::UnknownDirection(self.direction.clone()))?;
        let family = PacketFamily::from_name(&self.family)
            .ok_or_else(|| SchemaError::UnknownFamily(self.family.clone()))?;
        let action = PacketAction::from_name(&self.action)
            .ok_or_else(|| SchemaError::UnknownAction(self.action.clone()))?;
        Ok(ClassId::new(direction, family, action))
    }
}

#[derive(Debug, Deserialize)]
struct FieldDef {
    name: String,
    #[serde(default)]
    sensitive: bool,
    #[serde(flatten)]
    kind: KindDef,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum KindDef {
    Byte,
    Char,
    Short,
    Three,
    Int,
    String {
        length: LengthDef,
    },
    PrefixString,
    BreakString,
    EndString,
    Break,
    Struct {
        #[serde(default)]
        fields: Option<Vec<FieldDef>>,
        #[serde(default, rename = "ref")]
        reference: Option<String>,
    },
    Array {
        element: Box<KindDef>,
        #[serde(default)]
        length: Option<LengthDef>,
        #[serde(default)]
        delimited: bool,
    },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LengthDef {
    Count(usize),
    Field(String),
}

/// Numeric field names visible at a point in a layout, innermost struct last.
#[derive(Debug, Default)]
struct Scope {
    frames: Vec<Vec<String>>,
}

impl Scope {
    fn push(&mut self) {
        self.frames.push(Vec::new());
    }

    fn pop(&mut self) {
        self.frames.pop();
    }

    fn declare(&mut self, name: &str) {
        if let Some(frame) = self.frames.last_mut() {
            frame.push(name.to_string());
        }
    }

    fn contains(&self, name: &str) -> bool {
        self.frames
            .iter()
            .any(|frame| frame.iter().any(|declared| declared == name))
    }
}

struct Resolver<'a> {
    structs: &'a BTreeMap<String, Vec<FieldDef>>,
    config: &'a CompilerConfig,
    /// Struct names currently being expanded, for cycle detection.
    resolving: Vec<String>,
}

impl Resolver<'_> {
    fn layout(&mut self, defs: &[FieldDef], scope: &mut Scope) -> Result<FieldLayout> {
        scope.push();
        let mut fields = Vec::with_capacity(defs.len());
        for def in defs {
            let kind = self.kind(&def.name, &def.kind, scope)?;
            if kind.is_numeric() {
                scope.declare(&def.name);
            }
            fields.push(FieldSpec {
                name: def.name.clone(),
                kind,
                sensitive: def.sensitive || self.config.is_sensitive_name(&def.name),
            });
        }
        scope.pop();
        Ok(FieldLayout::new(fields))
    }

    fn kind(&mut self, field: &str, def: &KindDef, scope: &mut Scope) -> Result<FieldKind> {
        let kind = match def {
            KindDef::Byte => FieldKind::Byte,
            KindDef::Char => FieldKind::Char,
            KindDef::Short => FieldKind::Short,
            KindDef::Three => FieldKind::Three,
            KindDef::Int => FieldKind::Int,
            KindDef::String { length } => {
                FieldKind::FixedString(self.length(field, Some(length), scope)?)
            }
            KindDef::PrefixString => FieldKind::PrefixString,
            KindDef::BreakString => FieldKind::BreakString,
            KindDef::EndString => FieldKind::EndString,
            KindDef::Break => FieldKind::Break,
            KindDef::Struct { fields, reference } => {
                FieldKind::Struct(self.structure(field, fields.as_deref(), reference.as_deref(), scope)?)
            }
            KindDef::Array {
                element,
                length,
                delimited,
            } => {
                let length = self.length(field, length.as_ref(), scope)?;
                let element = self.kind(field, element, scope)?;
                FieldKind::Array {
                    element: Box::new(element),
                    length,
                    delimited: *delimited,
                }
            }
        };
        Ok(kind)
    }

    fn structure(
        &mut self,
        field: &str,
        inline: Option<&[FieldDef]>,
        reference: Option<&str>,
        scope: &mut Scope,
    ) -> Result<FieldLayout> {
        if let Some(defs) = inline {
            return self.layout(defs, scope);
        }

        let Some(name) = reference else {
            return Err(SchemaError::CompileFailed(format!(
                "struct field {field} has neither fields nor ref"
            )));
        };
        if self.resolving.iter().any(|open| open == name) {
            return Err(SchemaError::RecursiveStruct(name.to_string()));
        }
        let structs = self.structs;
        let defs = structs
            .get(name)
            .ok_or_else(|| SchemaError::UnknownStruct(name.to_string()))?;

        self.resolving.push(name.to_string());
        let layout = self.layout(defs, scope);
        self.resolving.pop();
        layout
    }

    fn length(&self, field: &str, def: Option<&LengthDef>, scope: &Scope) -> Result<Length> {
        match def {
            None => Ok(Length::Remaining),
            Some(LengthDef::Count(count)) => Ok(Length::Fixed(*count)),
            Some(LengthDef::Field(reference)) if scope.contains(reference) => {
                Ok(Length::Field(reference.clone()))
            }
            Some(LengthDef::Field(reference)) => Err(SchemaError::InvalidLengthRef {
                field: field.to_string(),
                reference: reference.clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn welcome_player() -> ClassId {
        ClassId::new(Direction::Server, PacketFamily::Welcome, PacketAction::Player)
    }

    fn compile(source: &str) -> Result<ProtocolSchema> {
        JsonCompiler::new().compile(source)
    }

    #[test]
    fn compiles_simple_packet() {
        let schema = compile(
            r#"{"packets":[{"direction":"server","family":"Welcome","action":"Player",
                "fields":[{"name":"id","type":"char"},{"name":"name","type":"prefix_string"}]}]}"#,
        )
        .unwrap();

        let layout = schema.get(&welcome_player()).unwrap();
        assert_eq!(
            layout.fields(),
            &[
                FieldSpec::new("id", FieldKind::Char),
                FieldSpec::new("name", FieldKind::PrefixString),
            ]
        );
    }

    #[test]
    fn packet_without_fields_is_empty_layout() {
        let schema =
            compile(r#"{"packets":[{"direction":"client","family":"Connection","action":"Ping"}]}"#)
                .unwrap();
        let id = ClassId::new(Direction::Client, PacketFamily::Connection, PacketAction::Ping);
        assert!(schema.get(&id).unwrap().is_empty());
    }

    #[test]
    fn resolves_struct_refs_and_arrays() {
        let schema = compile(
            r#"{
                "structs": { "Coords": [{"name":"x","type":"char"},{"name":"y","type":"char"}] },
                "packets": [{
                    "direction": "server", "family": "Walk", "action": "Player",
                    "fields": [
                        {"name":"count","type":"char"},
                        {"name":"steps","type":"array","length":"count",
                         "element":{"type":"struct","ref":"Coords"}},
                        {"name":"tail","type":"array","element":{"type":"short"}}
                    ]
                }]
            }"#,
        )
        .unwrap();

        let id = ClassId::new(Direction::Server, PacketFamily::Walk, PacketAction::Player);
        let layout = schema.get(&id).unwrap();
        let coords = FieldLayout::new(vec![
            FieldSpec::new("x", FieldKind::Char),
            FieldSpec::new("y", FieldKind::Char),
        ]);
        assert_eq!(
            layout.fields()[1].kind,
            FieldKind::Array {
                element: Box::new(FieldKind::Struct(coords)),
                length: Length::Field("count".to_string()),
                delimited: false,
            }
        );
        assert_eq!(
            layout.fields()[2].kind,
            FieldKind::Array {
                element: Box::new(FieldKind::Short),
                length: Length::Remaining,
                delimited: false,
            }
        );
    }

    #[test]
    fn password_fields_are_tagged_sensitive() {
        let schema = compile(
            r#"{"packets":[{"direction":"client","family":"Login","action":"Request",
                "fields":[{"name":"user","type":"break_string"},
                          {"name":"Password","type":"break_string"},
                          {"name":"pin","type":"short","sensitive":true}]}]}"#,
        )
        .unwrap();

        let id = ClassId::new(Direction::Client, PacketFamily::Login, PacketAction::Request);
        let sensitive: Vec<bool> = schema.get(&id).unwrap().iter().map(|f| f.sensitive).collect();
        assert_eq!(sensitive, [false, true, true]);
    }

    #[test]
    fn configured_sensitive_names_apply() {
        let compiler = JsonCompiler::with_config(CompilerConfig {
            sensitive_names: vec!["secret".to_string()],
            ..CompilerConfig::default()
        });
        let schema = compiler
            .compile(
                r#"{"packets":[{"direction":"client","family":"Account","action":"Create",
                    "fields":[{"name":"secret","type":"end_string"},{"name":"password","type":"break_string"}]}]}"#,
            )
            .unwrap();
        let id = ClassId::new(Direction::Client, PacketFamily::Account, PacketAction::Create);
        let sensitive: Vec<bool> = schema.get(&id).unwrap().iter().map(|f| f.sensitive).collect();
        assert_eq!(sensitive, [true, false]);
    }

    #[test]
    fn unknown_names_are_rejected() {
        assert!(matches!(
            compile(r#"{"packets":[{"direction":"sideways","family":"Welcome","action":"Player"}]}"#),
            Err(SchemaError::UnknownDirection(_))
        ));
        assert!(matches!(
            compile(r#"{"packets":[{"direction":"server","family":"Nope","action":"Player"}]}"#),
            Err(SchemaError::UnknownFamily(name)) if name == "Nope"
        ));
        assert!(matches!(
            compile(r#"{"packets":[{"direction":"server","family":"Welcome","action":"Nope"}]}"#),
            Err(SchemaError::UnknownAction(_))
        ));
    }

    #[test]
    fn duplicate_packets_are_rejected() {
        let result = compile(
            r#"{"packets":[
                {"direction":"server","family":"Welcome","action":"Player"},
                {"direction":"Server","family":"Welcome","action":"Player"}
            ]}"#,
        );
        assert!(matches!(result, Err(SchemaError::DuplicatePacket(id)) if id == "Server:Welcome_Player"));
    }

    #[test]
    fn struct_refs_must_exist_and_not_recurse() {
        let unknown = compile(
            r#"{"packets":[{"direction":"server","family":"Walk","action":"Player",
                "fields":[{"name":"at","type":"struct","ref":"Missing"}]}]}"#,
        );
        assert!(matches!(unknown, Err(SchemaError::UnknownStruct(_))));

        let recursive = compile(
            r#"{"structs":{
                    "A":[{"name":"b","type":"struct","ref":"B"}],
                    "B":[{"name":"a","type":"struct","ref":"A"}]},
                "packets":[{"direction":"server","family":"Walk","action":"Player",
                    "fields":[{"name":"root","type":"struct","ref":"A"}]}]}"#,
        );
        assert!(matches!(recursive, Err(SchemaError::RecursiveStruct(_))));
    }

    #[test]
    fn same_struct_may_be_used_twice() {
        let schema = compile(
            r#"{"structs":{"Coords":[{"name":"x","type":"char"}]},
                "packets":[{"direction":"server","family":"Walk","action":"Player",
                    "fields":[{"name":"from","type":"struct","ref":"Coords"},
                              {"name":"to","type":"struct","ref":"Coords"}]}]}"#,
        );
        assert!(schema.is_ok());
    }

    #[test]
    fn length_refs_must_name_earlier_numeric_fields() {
        let later = compile(
            r#"{"packets":[{"direction":"server","family":"Talk","action":"Msg",
                "fields":[{"name":"text","type":"string","length":"len"},{"name":"len","type":"char"}]}]}"#,
        );
        assert!(matches!(
            later,
            Err(SchemaError::InvalidLengthRef { field, reference }) if field == "text" && reference == "len"
        ));

        let textual = compile(
            r#"{"packets":[{"direction":"server","family":"Talk","action":"Msg",
                "fields":[{"name":"len","type":"break_string"},{"name":"text","type":"string","length":"len"}]}]}"#,
        );
        assert!(matches!(textual, Err(SchemaError::InvalidLengthRef { .. })));
    }

    #[test]
    fn length_refs_see_enclosing_structs() {
        let schema = compile(
            r#"{"packets":[{"direction":"server","family":"Talk","action":"Msg",
                "fields":[
                    {"name":"len","type":"char"},
                    {"name":"body","type":"struct","fields":[{"name":"text","type":"string","length":"len"}]}
                ]}]}"#,
        );
        assert!(schema.is_ok());

        let sibling_struct = compile(
            r#"{"packets":[{"direction":"server","family":"Talk","action":"Msg",
                "fields":[
                    {"name":"head","type":"struct","fields":[{"name":"len","type":"char"}]},
                    {"name":"text","type":"string","length":"len"}
                ]}]}"#,
        );
        assert!(matches!(sibling_struct, Err(SchemaError::InvalidLengthRef { .. })));
    }

    #[test]
    fn invalid_json_and_shape_errors() {
        assert!(matches!(compile("{"), Err(SchemaError::InvalidJson(_))));
        assert!(matches!(
            compile(r#"{"packets":"nope"}"#),
            Err(SchemaError::CompileFailed(_))
        ));
    }

    #[test]
    fn closures_are_compilers() {
        let compiler = |_: &str| -> Result<ProtocolSchema> { Ok(ProtocolSchema::new().with_label("empty")) };
        let schema = compiler.compile("anything").unwrap();
        assert_eq!(schema.label(), Some("empty"));
    }
}
