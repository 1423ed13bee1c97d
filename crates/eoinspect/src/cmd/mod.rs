use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, Subcommand, ValueEnum};
use eoinspect_codec::Direction;
use eoinspect_decoder::{DecoderConfig, PacketDecoder, DEFAULT_MASK_TOKEN};
use eoinspect_schema::{CompilerConfig, JsonCompiler, SchemaRegistry};

use crate::exit::{schema_error, CliResult};
use crate::output::OutputFormat;

pub mod check;
pub mod decode;
pub mod ids;
pub mod version;
pub mod watch;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Decode a hex packet or every packet in a capture file.
    Decode(DecodeArgs),
    /// Decode packets framed on stdin, reloading the description when it changes.
    Watch(WatchArgs),
    /// Compile a protocol description and list the packets it describes.
    Check(CheckArgs),
    /// Print the packet family and action tables.
    Ids(IdsArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Decode(args) => decode::run(args, format),
        Command::Watch(args) => watch::run(args, format),
        Command::Check(args) => check::run(args, format),
        Command::Ids(args) => ids::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum DirectionArg {
    Client,
    Server,
}

impl From<DirectionArg> for Direction {
    fn from(direction: DirectionArg) -> Self {
        match direction {
            DirectionArg::Client => Direction::Client,
            DirectionArg::Server => Direction::Server,
        }
    }
}

/// Where the protocol description comes from and how it is compiled.
#[derive(Args, Debug)]
pub struct SchemaArgs {
    /// Protocol description file (JSON).
    #[arg(long, value_name = "FILE", env = "EOINSPECT_SCHEMA")]
    pub schema: PathBuf,
    /// Reject descriptions containing unknown keys.
    #[arg(long)]
    pub strict: bool,
    /// Extra field names to redact (repeatable, case-insensitive).
    #[arg(long = "sensitive", value_name = "NAME")]
    pub sensitive: Vec<String>,
}

impl SchemaArgs {
    pub fn compiler(&self) -> JsonCompiler {
        let mut config = CompilerConfig {
            strict_mode: self.strict,
            ..CompilerConfig::default()
        };
        config.sensitive_names.extend(self.sensitive.iter().cloned());
        JsonCompiler::with_config(config)
    }

    /// Load the description into the process-wide registry.
    pub fn load(&self, compiler: &JsonCompiler) -> CliResult<Arc<SchemaRegistry>> {
        let registry = SchemaRegistry::global();
        registry
            .load_file(compiler, &self.schema)
            .map_err(|err| schema_error(&context(&self.schema), err))?;
        Ok(registry)
    }
}

/// How decoded packets are presented.
#[derive(Args, Debug)]
pub struct DecodeOptions {
    /// Direction the packets were sent in.
    #[arg(long, value_enum)]
    pub direction: DirectionArg,
    /// Replacement text for sensitive values.
    #[arg(long, value_name = "TOKEN", default_value = DEFAULT_MASK_TOKEN)]
    pub mask_token: String,
    /// Treat client packets as having no sequence byte after the header.
    #[arg(long)]
    pub no_sequence: bool,
}

impl DecodeOptions {
    pub fn decoder(&self, registry: Arc<SchemaRegistry>) -> PacketDecoder {
        PacketDecoder::with_config(
            registry,
            DecoderConfig {
                mask_token: self.mask_token.clone(),
                skip_client_sequence: !self.no_sequence,
            },
        )
    }
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    #[command(flatten)]
    pub schema: SchemaArgs,
    #[command(flatten)]
    pub options: DecodeOptions,
    /// A single packet as hex (e.g. "08 05 02 04 62 6f 62").
    #[arg(long, conflicts_with = "file", required_unless_present = "file")]
    pub hex: Option<String>,
    /// Capture file of length-prefixed packets.
    #[arg(long, value_name = "CAPTURE")]
    pub file: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct WatchArgs {
    #[command(flatten)]
    pub schema: SchemaArgs,
    #[command(flatten)]
    pub options: DecodeOptions,
    /// Exit after decoding N packets.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    #[command(flatten)]
    pub schema: SchemaArgs,
}

#[derive(Args, Debug)]
pub struct IdsArgs {
    /// Only list packet families.
    #[arg(long, conflicts_with = "actions")]
    pub families: bool,
    /// Only list packet actions.
    #[arg(long)]
    pub actions: bool,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

fn context(path: &Path) -> String {
    format!("protocol description {}", path.display())
}
