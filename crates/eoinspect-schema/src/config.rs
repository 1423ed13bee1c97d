/// Controls how protocol descriptions are compiled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerConfig {
    /// When true, descriptions with unknown keys are rejected.
    pub strict_mode: bool,
    /// Field names tagged sensitive even when the description doesn't say so.
    /// Matched case-insensitively.
    pub sensitive_names: Vec<String>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            strict_mode: false,
            sensitive_names: vec!["password".to_string()],
        }
    }
}

impl CompilerConfig {
    /// True if `name` is in the configured sensitive set.
    pub fn is_sensitive_name(&self, name: &str) -> bool {
        self.sensitive_names
            .iter()
            .any(|candidate| candidate.eq_ignore_ascii_case(name))
    }
}

/// Controls registry loading behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Maximum bytes accepted from a description file.
    pub max_description_size: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_description_size: 1024 * 1024,
        }
    }
}
