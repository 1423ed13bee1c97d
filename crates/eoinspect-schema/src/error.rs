/// Errors that can occur while loading or compiling a protocol description.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// The description file could not be loaded.
    #[error("failed to load protocol description: {0}")]
    LoadFailed(String),

    /// The description exceeds the configured size limit.
    #[error("protocol description too large ({size} bytes, max {max})")]
    DescriptionTooLarge { size: usize, max: usize },

    /// The description is not valid JSON or does not match the expected shape.
    #[error("protocol description is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The description could not be compiled.
    #[error("failed to compile protocol description: {0}")]
    CompileFailed(String),

    /// A packet names a direction other than client or server.
    #[error("unknown direction: {0}")]
    UnknownDirection(String),

    /// A packet names a family missing from the taxonomy.
    #[error("unknown packet family: {0}")]
    UnknownFamily(String),

    /// A packet names an action missing from the taxonomy.
    #[error("unknown packet action: {0}")]
    UnknownAction(String),

    /// A struct field refers to an undeclared struct.
    #[error("unknown struct: {0}")]
    UnknownStruct(String),

    /// A struct contains itself, directly or through other structs.
    #[error("struct {0} refers to itself")]
    RecursiveStruct(String),

    /// Two packets describe the same class identifier.
    #[error("packet {0} is described more than once")]
    DuplicatePacket(String),

    /// A length refers to a field that is not an earlier numeric field in scope.
    #[error("field {field}: length refers to {reference}, which is not an earlier numeric field")]
    InvalidLengthRef { field: String, reference: String },
}

pub type Result<T> = std::result::Result<T, SchemaError>;
