use std::fs::File;
use std::io::BufReader;

use eoinspect_codec::{Direction, PacketReader, RawPacket};

use crate::cmd::DecodeArgs;
use crate::exit::{codec_error, io_error, CliError, CliResult, DATA_INVALID, SUCCESS, USAGE};
use crate::output::{print_packet, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let compiler = args.schema.compiler();
    let registry = args.schema.load(&compiler)?;
    let decoder = args.options.decoder(registry);
    let direction: Direction = args.options.direction.into();

    let mut failed = 0usize;
    let mut decode = |index: usize, packet: RawPacket| {
        let result = decoder.decode(&packet);
        if result.is_err() {
            failed += 1;
        }
        print_packet(index, &packet, &result, format);
    };

    if let Some(hex) = &args.hex {
        decode(0, RawPacket::new(direction, parse_hex(hex)?));
    } else if let Some(path) = &args.file {
        let file = File::open(path)
            .map_err(|err| io_error(&format!("failed opening {}", path.display()), err))?;
        let reader = PacketReader::new(BufReader::new(file), direction);
        for (index, packet) in reader.enumerate() {
            let packet = packet.map_err(|err| {
                codec_error(&format!("failed reading {}", path.display()), err)
            })?;
            decode(index, packet);
        }
    }

    if failed == 0 {
        Ok(SUCCESS)
    } else {
        Ok(DATA_INVALID)
    }
}

/// Parse whitespace- or comma-separated hex into bytes.
///
/// Tokens may hold several bytes (`"0805"`) and may carry a `0x` prefix.
pub fn parse_hex(input: &str) -> CliResult<Vec<u8>> {
    let mut bytes = Vec::new();
    for token in input
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|token| !token.is_empty())
    {
        let digits = token
            .strip_prefix("0x")
            .or_else(|| token.strip_prefix("0X"))
            .unwrap_or(token);
        if digits.is_empty() || digits.len() % 2 != 0 || !digits.is_ascii() {
            return Err(CliError::new(USAGE, format!("invalid hex byte(s): {token}")));
        }
        for pair in digits.as_bytes().chunks(2) {
            let pair = std::str::from_utf8(pair).unwrap_or_default();
            let byte = u8::from_str_radix(pair, 16)
                .map_err(|_| CliError::new(USAGE, format!("invalid hex byte(s): {token}")))?;
            bytes.push(byte);
        }
    }

    if bytes.is_empty() {
        return Err(CliError::new(USAGE, "--hex needs at least one byte"));
    }
    Ok(bytes)
}
