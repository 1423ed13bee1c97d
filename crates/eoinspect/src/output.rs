use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use eoinspect_codec::RawPacket;
use eoinspect_decoder::{describe_raw, DecodeError, DecodedPacket, Fields};
use eoinspect_schema::ProtocolSchema;
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

const PACKET_SCHEMA_ID: &str = "eoinspect/cli/v1/packet";
const CHECK_SCHEMA_ID: &str = "eoinspect/cli/v1/schema-check";
const IDS_SCHEMA_ID: &str = "eoinspect/cli/v1/ids";

#[derive(Serialize)]
struct PacketOutput<'a> {
    schema_id: &'a str,
    index: usize,
    direction: &'a str,
    id: Option<String>,
    status: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<&'a Fields>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    raw: Option<Vec<u8>>,
}

fn status(result: &Result<DecodedPacket, DecodeError>) -> &'static str {
    match result {
        Ok(_) => "decoded",
        Err(DecodeError::UnknownPacketType { .. }) => "unknown_packet_type",
        Err(DecodeError::NoSchema(_)) => "no_schema",
        Err(DecodeError::Truncated { .. }) => "truncated",
        Err(DecodeError::MissingBreak { .. }) => "missing_break",
    }
}

/// Print one decode result. Failures carry the raw bytes as a fallback.
pub fn print_packet(
    index: usize,
    packet: &RawPacket,
    result: &Result<DecodedPacket, DecodeError>,
    format: OutputFormat,
) {
    let raw = describe_raw(packet);
    let fields = match result {
        Ok(decoded) => Some(decoded.fields()),
        Err(err) => err.partial().map(DecodedPacket::fields),
    };
    let error = result.as_ref().err().map(ToString::to_string);

    match format {
        OutputFormat::Json => {
            let out = PacketOutput {
                schema_id: PACKET_SCHEMA_ID,
                index,
                direction: raw.direction,
                id: raw.id.clone(),
                status: status(result),
                fields,
                error,
                raw: result.is_err().then(|| raw.bytes.clone()),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec![
                    format!("#{index} {}", raw.direction),
                    raw.id.clone().unwrap_or_else(|| "?".to_string()),
                ]);
            for (name, value) in fields.into_iter().flat_map(Fields::iter) {
                table.add_row(vec![name.to_string(), value.to_string()]);
            }
            if let Some(error) = &error {
                table.add_row(vec!["error".to_string(), error.clone()]);
                table.add_row(vec!["raw".to_string(), join_bytes(&raw.bytes)]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            let id = raw.id.as_deref().unwrap_or("?");
            match &error {
                None => println!("#{index} {} {id}", raw.direction),
                Some(error) => println!("#{index} {} {id} [{}] {error}", raw.direction, status(result)),
            }
            for (name, value) in fields.into_iter().flat_map(Fields::iter) {
                println!("  {name} = {value}");
            }
            if error.is_some() {
                println!("  raw: {}", join_bytes(&raw.bytes));
            }
        }
        OutputFormat::Raw => println!("{raw}"),
    }
}

#[derive(Serialize)]
struct SchemaOutput<'a> {
    schema_id: &'a str,
    label: Option<&'a str>,
    generation: u64,
    classes: usize,
    packets: Vec<PacketSummary>,
}

#[derive(Serialize)]
struct PacketSummary {
    id: String,
    direction: &'static str,
    family: &'static str,
    action: &'static str,
    fields: usize,
    sensitive: bool,
}

fn summarize(schema: &ProtocolSchema) -> Vec<PacketSummary> {
    schema
        .ids()
        .into_iter()
        .filter_map(|id| {
            let layout = schema.get(&id)?;
            Some(PacketSummary {
                id: id.to_string(),
                direction: id.direction.as_str(),
                family: id.family.name(),
                action: id.action.name(),
                fields: layout.len(),
                sensitive: layout.has_sensitive(),
            })
        })
        .collect()
}

/// Print the classes described by a compiled schema.
pub fn print_schema(schema: &ProtocolSchema, generation: u64, format: OutputFormat) {
    let packets = summarize(schema);

    match format {
        OutputFormat::Json => {
            let out = SchemaOutput {
                schema_id: CHECK_SCHEMA_ID,
                label: schema.label(),
                generation,
                classes: packets.len(),
                packets,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["DIRECTION", "FAMILY", "ACTION", "FIELDS", "SENSITIVE"]);
            for packet in &packets {
                table.add_row(vec![
                    packet.direction.to_string(),
                    packet.family.to_string(),
                    packet.action.to_string(),
                    packet.fields.to_string(),
                    if packet.sensitive { "yes" } else { "" }.to_string(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "{}: {} packet classes",
                schema.label().unwrap_or("schema"),
                packets.len()
            );
            for packet in &packets {
                let marker = if packet.sensitive { " (sensitive)" } else { "" };
                println!("  {} [{} fields]{marker}", packet.id, packet.fields);
            }
        }
        OutputFormat::Raw => {
            for packet in &packets {
                println!("{}", packet.id);
            }
        }
    }
}

/// A named taxonomy entry.
#[derive(Serialize)]
pub struct TaxonomyEntry {
    pub kind: &'static str,
    pub name: &'static str,
    pub byte: u8,
}

#[derive(Serialize)]
struct IdsOutput<'a> {
    schema_id: &'a str,
    entries: &'a [TaxonomyEntry],
}

pub fn print_taxonomy(entries: &[TaxonomyEntry], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = IdsOutput {
                schema_id: IDS_SCHEMA_ID,
                entries,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["KIND", "NAME", "BYTE"]);
            for entry in entries {
                table.add_row(vec![
                    entry.kind.to_string(),
                    entry.name.to_string(),
                    entry.byte.to_string(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for entry in entries {
                println!("{:<7} {:<14} {:>3}", entry.kind, entry.name, entry.byte);
            }
        }
        OutputFormat::Raw => {
            for entry in entries {
                println!("{} {}", entry.name, entry.byte);
            }
        }
    }
}

fn join_bytes(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(u8::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use eoinspect_codec::{ClassId, Direction, PacketAction, PacketFamily};
    use eoinspect_decoder::Value;

    use super::*;

    #[test]
    fn failure_status_names() {
        let id = ClassId::new(Direction::Server, PacketFamily::Welcome, PacketAction::Player);
        let ok: Result<DecodedPacket, DecodeError> = Ok(DecodedPacket::new(id, Fields::new()));
        assert_eq!(status(&ok), "decoded");
        assert_eq!(status(&Err(DecodeError::NoSchema(id))), "no_schema");
        assert_eq!(
            status(&Err(DecodeError::UnknownPacketType { family: 0, action: 0 })),
            "unknown_packet_type"
        );
        let missing = DecodeError::MissingBreak {
            partial: Box::new(DecodedPacket::new(id, Fields::new())),
            field: "lines[0]".to_string(),
            found: 3,
        };
        assert_eq!(status(&Err(missing)), "missing_break");
    }

    #[test]
    fn packet_output_omits_raw_on_success() {
        let id = ClassId::new(Direction::Server, PacketFamily::Welcome, PacketAction::Player);
        let mut fields = Fields::new();
        fields.push("id", Value::Number(1));
        let out = PacketOutput {
            schema_id: PACKET_SCHEMA_ID,
            index: 0,
            direction: "server",
            id: Some(id.packet_id()),
            status: "decoded",
            fields: Some(&fields),
            error: None,
            raw: None,
        };
        let json = serde_json::to_string(&out).unwrap();
        assert_eq!(
            json,
            r#"{"schema_id":"eoinspect/cli/v1/packet","index":0,"direction":"server","id":"Welcome_Player","status":"decoded","fields":{"id":1}}"#
        );
    }

    #[test]
    fn bytes_are_space_separated() {
        assert_eq!(join_bytes(&[8, 5, 255]), "8 5 255");
        assert_eq!(join_bytes(&[]), "");
    }
}
