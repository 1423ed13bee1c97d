use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

use eoinspect_codec::{CodecError, Direction, PacketReader};
use eoinspect_schema::{JsonCompiler, SchemaRegistry};
use tracing::{info, warn};

use crate::cmd::WatchArgs;
use crate::exit::{codec_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{print_packet, OutputFormat};

pub fn run(args: WatchArgs, format: OutputFormat) -> CliResult<i32> {
    let compiler = args.schema.compiler();
    let registry = args.schema.load(&compiler)?;
    let mut description = DescriptionWatch::new(&args.schema.schema);
    let decoder = args.options.decoder(Arc::clone(&registry));
    let direction: Direction = args.options.direction.into();

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let stdin = std::io::stdin();
    let mut reader = PacketReader::new(stdin.lock(), direction);
    let mut decoded = 0usize;

    while running.load(Ordering::SeqCst) {
        let packet = match reader.read_packet() {
            Ok(packet) => packet,
            Err(CodecError::ConnectionClosed) if reader.is_drained() => break,
            Err(err) => return Err(codec_error("failed reading stdin", err)),
        };
        if !running.load(Ordering::SeqCst) {
            break;
        }

        description.reload_if_changed(&registry, &compiler);
        let result = decoder.decode(&packet);
        print_packet(decoded, &packet, &result, format);
        decoded = decoded.saturating_add(1);

        if args.count.is_some_and(|count| decoded >= count) {
            break;
        }
    }

    info!(
        packets = decoded,
        generation = registry.generation(),
        "watch finished"
    );
    Ok(SUCCESS)
}

/// Tracks the description file's modification time between packets.
struct DescriptionWatch {
    path: PathBuf,
    modified: Option<SystemTime>,
}

impl DescriptionWatch {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            modified: modified_time(path),
        }
    }

    /// Recompile and install when the file changed; a rejected edit keeps
    /// the active schema.
    fn reload_if_changed(&mut self, registry: &SchemaRegistry, compiler: &JsonCompiler) -> Option<u64> {
        let modified = modified_time(&self.path);
        if modified == self.modified {
            return None;
        }
        self.modified = modified;

        match registry.load_file(compiler, &self.path) {
            Ok(generation) => {
                info!(
                    generation,
                    path = %self.path.display(),
                    "reloaded protocol description"
                );
                Some(generation)
            }
            Err(err) => {
                warn!(
                    error = %err,
                    path = %self.path.display(),
                    "reload failed, keeping previous protocol description"
                );
                None
            }
        }
    }
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path)
        .and_then(|metadata| metadata.modified())
        .ok()
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
