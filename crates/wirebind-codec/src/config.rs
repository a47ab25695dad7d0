/// Controls adapter resolution and schema registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Protocol version used by `encode_default` / `decode_default`.
    pub default_version: u32,
    /// Largest element count a sequence field may declare.
    pub max_sequence_len: usize,
    /// Deepest record nesting accepted by `encode` / `decode`.
    pub max_depth: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            default_version: 1,
            max_sequence_len: 4096,
            max_depth: 64,
        }
    }
}
