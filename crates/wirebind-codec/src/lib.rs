//! Versioned field-binding codec for fixed-structure binary records.
//!
//! A record type is described once by a [`RecordSchema`]: its fields in wire
//! order, each with a [`FieldSpec`] (byte order, length, string kind, fill,
//! offset rule, protocol-version range). The [`AdapterRegistry`] binds the
//! schema to adapters per protocol version and reads or writes records
//! field by field.
//!
//! - Integers of 1-4 and 8 bytes with add/subtract/multiply/divide offsets
//! - BCD, UTF-8 and ASCII strings with fill padding
//! - Scaled decimals, booleans, bytes
//! - Fixed-count sequences, optional values, polymorphic enums
//! - Recursive record types

pub mod adapter;
pub mod config;
pub mod containers;
pub mod decimal;
pub mod error;
pub mod field;
pub mod primitives;
pub mod record;
pub mod registry;
pub mod runtime;
pub mod types;

pub use adapter::{erase, AdapterId, AdapterKind, DynAdapter, TypeAdapter, WireContext};
pub use config::RegistryConfig;
pub use decimal::Decimal;
pub use error::{CodecError, Result};
pub use field::{ByteOrder, FieldSpec, OffsetRule, StringKind};
pub use primitives::fill_bytes;
pub use record::RecordSchema;
pub use registry::{AdapterFactory, AdapterRegistry, RegistryBuilder, Resolver};
pub use runtime::RuntimeTyped;
pub use types::{Polymorphic, Sequence, Shape, TypeDesc, TypeKey, WireType};
