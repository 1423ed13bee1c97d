use std::io::Read;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use eoinspect_codec::ClassId;
use tracing::{debug, warn};

use crate::compiler::SchemaCompiler;
use crate::config::RegistryConfig;
use crate::error::{Result, SchemaError};
use crate::layout::{FieldLayout, ProtocolSchema};

/// Holder of the active protocol schema.
///
/// Readers take an [`Arc`] snapshot and keep using it for as long as they
/// like; [`install`](Self::install) swaps in a new schema without waiting
/// for them. A reader therefore sees either the old schema or the new one,
/// never a mix of both.
pub struct SchemaRegistry {
    active: RwLock<Arc<ProtocolSchema>>,
    generation: AtomicU64,
    config: RegistryConfig,
}

impl SchemaRegistry {
    /// Create a registry with an empty schema and default config.
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create a registry with an empty schema and explicit config.
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            active: RwLock::new(Arc::new(ProtocolSchema::new())),
            generation: AtomicU64::new(0),
            config,
        }
    }

    /// The process-wide registry.
    pub fn global() -> Arc<SchemaRegistry> {
        static GLOBAL: OnceLock<Arc<SchemaRegistry>> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(SchemaRegistry::new())))
    }

    /// Replace the active schema. Returns the new generation.
    pub fn install(&self, schema: ProtocolSchema) -> u64 {
        let classes = schema.len();
        let label = schema.label().map(str::to_owned);
        let schema = Arc::new(schema);

        let (generation, previous) = {
            let mut active = self.active.write().unwrap_or_else(PoisonError::into_inner);
            let previous = std::mem::replace(&mut *active, schema);
            let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
            (generation, previous)
        };
        // The old schema is released outside the lock; snapshots still
        // holding it keep it alive.
        drop(previous);

        debug!(
            generation,
            classes,
            label = label.as_deref().unwrap_or("-"),
            "installed protocol schema"
        );
        generation
    }

    /// Compile `source` and install the result.
    ///
    /// On any error the previously active schema stays in place.
    pub fn install_source<C>(&self, compiler: &C, source: &str) -> Result<u64>
    where
        C: SchemaCompiler + ?Sized,
    {
        self.compile_and_install(compiler, source, None)
    }

    /// Read a description file, compile it and install the result.
    pub fn load_file<C>(&self, compiler: &C, path: &Path) -> Result<u64>
    where
        C: SchemaCompiler + ?Sized,
    {
        let source = read_description(path, self.config.max_description_size)?;
        let label = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());
        self.compile_and_install(compiler, &source, label)
    }

    fn compile_and_install<C>(
        &self,
        compiler: &C,
        source: &str,
        label: Option<String>,
    ) -> Result<u64>
    where
        C: SchemaCompiler + ?Sized,
    {
        let max = self.config.max_description_size;
        if source.len() > max {
            return Err(SchemaError::DescriptionTooLarge {
                size: source.len(),
                max,
            });
        }

        match compiler.compile(source) {
            Ok(schema) => {
                let schema = match (label, schema.label().is_none()) {
                    (Some(label), true) => schema.with_label(label),
                    _ => schema,
                };
                Ok(self.install(schema))
            }
            Err(err) => {
                warn!(
                    error = %err,
                    generation = self.generation(),
                    "protocol description rejected, keeping active schema"
                );
                Err(err)
            }
        }
    }

    /// Self-consistent view of the active schema.
    pub fn snapshot(&self) -> Arc<ProtocolSchema> {
        Arc::clone(&self.active.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Layout for one class identifier in the active schema.
    pub fn lookup(&self, id: &ClassId) -> Option<Arc<FieldLayout>> {
        self.snapshot().get(id).cloned()
    }

    /// Check if the active schema describes a class.
    pub fn has_schema(&self, id: &ClassId) -> bool {
        self.snapshot().contains(id)
    }

    /// Described class identifiers in the active schema, sorted.
    pub fn ids(&self) -> Vec<ClassId> {
        self.snapshot().ids()
    }

    /// Number of installs since creation.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Install an empty schema.
    pub fn clear(&self) -> u64 {
        self.install(ProtocolSchema::new())
    }

    /// Get registry configuration.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaRegistry")
            .field("generation", &self.generation())
            .field("classes", &self.snapshot().len())
            .field("config", &self.config)
            .finish()
    }
}

/// Read a description file, refusing anything over `max_bytes`.
pub fn read_description(path: &Path, max_bytes: usize) -> Result<String> {
    let file = std::fs::File::open(path)
        .map_err(|err| SchemaError::LoadFailed(format!("{}: {err}", path.display())))?;
    let metadata = file
        .metadata()
        .map_err(|err| SchemaError::LoadFailed(format!("{}: {err}", path.display())))?;
    if !metadata.is_file() {
        return Err(SchemaError::LoadFailed(format!(
            "not a regular file: {}",
            path.display()
        )));
    }
    if metadata.len() > max_bytes as u64 {
        return Err(SchemaError::DescriptionTooLarge {
            size: usize::try_from(metadata.len()).unwrap_or(usize::MAX),
            max: max_bytes,
        });
    }

    let read_limit = u64::try_from(max_bytes.saturating_add(1)).unwrap_or(u64::MAX);
    let mut content = String::new();
    file.take(read_limit)
        .read_to_string(&mut content)
        .map_err(|err| {
            SchemaError::LoadFailed(format!("failed reading {}: {err}", path.display()))
        })?;
    if content.len() > max_bytes {
        return Err(SchemaError::DescriptionTooLarge {
            size: content.len(),
            max: max_bytes,
        });
    }

    Ok(content)
}
