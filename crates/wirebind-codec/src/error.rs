/// Errors that can occur while binding, encoding or decoding records.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// A record schema or field rule can never be applied.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    /// No factory produced an adapter for the type at this version.
    #[error("no adapter for {type_name} at protocol version {version}")]
    NoAdapter {
        type_name: &'static str,
        version: u32,
    },

    /// An adapter slot was referenced before its resolution finished.
    #[error("adapter slot {0} is not resolved")]
    UnresolvedAdapter(usize),

    /// A value of the wrong runtime type was handed to an adapter.
    #[error("type mismatch: expected {expected}")]
    TypeMismatch { expected: &'static str },

    /// A BCD field value is not a sequence of hex digit pairs.
    #[error("invalid BCD string: {0}")]
    InvalidBcd(String),

    /// An ASCII field value contains characters outside 7-bit ASCII.
    #[error("string is not ASCII: {0:?}")]
    NonAsciiString(String),

    /// The declared length cannot be used for this type.
    #[error("unsupported length {length} for {type_name}")]
    UnsupportedLength {
        type_name: &'static str,
        length: usize,
    },

    /// Records nest deeper than `RegistryConfig::max_depth`.
    #[error("record nesting exceeds {limit} levels")]
    NestingTooDeep { limit: usize },
}

pub type Result<T> = std::result::Result<T, CodecError>;
