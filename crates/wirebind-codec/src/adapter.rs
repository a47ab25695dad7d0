use std::any::{type_name, Any};
use std::marker::PhantomData;
use std::sync::Arc;

use bytes::{Bytes, BytesMut};

use crate::error::{CodecError, Result};
use crate::field::FieldSpec;
use crate::registry::AdapterRegistry;
use crate::types::{TypeDesc, WireType};

/// Index of an adapter in the registry's adapter table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AdapterId(pub(crate) usize);

impl AdapterId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Where an adapter came from. Drives the runtime-type selection rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterKind {
    /// Built-in scalar or container adapter.
    Builtin,
    /// Registered by the caller for a specific type.
    Custom,
    /// Record binder or polymorphic dispatcher.
    Generic,
}

/// Codec for values of type `T`.
///
/// Adapters are stateless and shared across threads. `read` returns
/// `Ok(None)` when the buffer holds too few bytes for the field; `write`
/// receives `None` for an absent value and decides what to emit.
pub trait TypeAdapter<T>: Send + Sync + 'static {
    fn read(&self, cx: &WireContext<'_>, src: &mut Bytes, field: &FieldSpec) -> Result<Option<T>>;

    fn write(
        &self,
        cx: &WireContext<'_>,
        dst: &mut BytesMut,
        value: Option<&T>,
        field: &FieldSpec,
    ) -> Result<()>;
}

/// Type-erased adapter stored in the registry table.
pub trait DynAdapter: Send + Sync {
    fn kind(&self) -> AdapterKind;

    /// Name of the type this adapter encodes.
    fn type_name(&self) -> &'static str;

    fn read_any(
        &self,
        cx: &WireContext<'_>,
        src: &mut Bytes,
        field: &FieldSpec,
    ) -> Result<Option<Box<dyn Any>>>;

    fn write_any(
        &self,
        cx: &WireContext<'_>,
        dst: &mut BytesMut,
        value: Option<&dyn Any>,
        field: &FieldSpec,
    ) -> Result<()>;
}

struct Erased<T, A> {
    inner: A,
    kind: AdapterKind,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Any, A: TypeAdapter<T>> DynAdapter for Erased<T, A> {
    fn kind(&self) -> AdapterKind {
        self.kind
    }

    fn type_name(&self) -> &'static str {
        type_name::<T>()
    }

    fn read_any(
        &self,
        cx: &WireContext<'_>,
        src: &mut Bytes,
        field: &FieldSpec,
    ) -> Result<Option<Box<dyn Any>>> {
        Ok(self
            .inner
            .read(cx, src, field)?
            .map(|value| Box::new(value) as Box<dyn Any>))
    }

    fn write_any(
        &self,
        cx: &WireContext<'_>,
        dst: &mut BytesMut,
        value: Option<&dyn Any>,
        field: &FieldSpec,
    ) -> Result<()> {
        let value = match value {
            Some(any) => Some(any.downcast_ref::<T>().ok_or(CodecError::TypeMismatch {
                expected: type_name::<T>(),
            })?),
            None => None,
        };
        self.inner.write(cx, dst, value, field)
    }
}

/// Erase a typed adapter for storage in the registry table.
pub fn erase<T: Any, A: TypeAdapter<T>>(adapter: A, kind: AdapterKind) -> Arc<dyn DynAdapter> {
    Arc::new(Erased {
        inner: adapter,
        kind,
        _marker: PhantomData,
    })
}

/// Unbox a decoded value.
pub(crate) fn downcast<T: Any>(value: Box<dyn Any>) -> Result<T> {
    value
        .downcast::<T>()
        .map(|boxed| *boxed)
        .map_err(|_| CodecError::TypeMismatch {
            expected: type_name::<T>(),
        })
}

/// Per-call view of the registry handed to adapters.
///
/// Adapters reach nested adapters through the context, by id or by type.
/// The context also counts how many records deep the call currently is.
#[derive(Clone, Copy)]
pub struct WireContext<'a> {
    registry: &'a AdapterRegistry,
    version: u32,
    depth: usize,
}

impl<'a> WireContext<'a> {
    pub(crate) fn new(registry: &'a AdapterRegistry, version: u32) -> Self {
        Self {
            registry,
            version,
            depth: 0,
        }
    }

    /// Protocol version of the current encode/decode call.
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Number of records entered so far.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Context for one record level further down.
    ///
    /// Fails with [`CodecError::NestingTooDeep`] past
    /// [`RegistryConfig::max_depth`](crate::RegistryConfig::max_depth).
    pub fn nested(&self) -> Result<Self> {
        let limit = self.registry.config().max_depth;
        if self.depth >= limit {
            return Err(CodecError::NestingTooDeep { limit });
        }
        Ok(Self {
            depth: self.depth + 1,
            ..*self
        })
    }

    pub fn registry(&self) -> &'a AdapterRegistry {
        self.registry
    }

    /// Look up a resolved adapter.
    pub fn adapter(&self, id: AdapterId) -> Result<Arc<dyn DynAdapter>> {
        self.registry.adapter(id)
    }

    /// Resolve the adapter for `desc` at the current version.
    pub fn resolve(&self, desc: &TypeDesc) -> Result<AdapterId> {
        self.registry.resolve(desc, self.version)
    }

    /// Decode a `T` with whatever adapter the registry holds for it.
    pub fn read<T: WireType>(&self, src: &mut Bytes, field: &FieldSpec) -> Result<Option<T>> {
        let id = self.resolve(&T::describe())?;
        self.read_as(id, src, field)
    }

    /// Encode a `T` with whatever adapter the registry holds for it.
    pub fn write<T: WireType>(
        &self,
        dst: &mut BytesMut,
        value: Option<&T>,
        field: &FieldSpec,
    ) -> Result<()> {
        let id = self.resolve(&T::describe())?;
        self.write_as(id, dst, value, field)
    }

    pub fn read_as<T: Any>(
        &self,
        id: AdapterId,
        src: &mut Bytes,
        field: &FieldSpec,
    ) -> Result<Option<T>> {
        self.adapter(id)?
            .read_any(self, src, field)?
            .map(downcast::<T>)
            .transpose()
    }

    pub fn write_as<T: Any>(
        &self,
        id: AdapterId,
        dst: &mut BytesMut,
        value: Option<&T>,
        field: &FieldSpec,
    ) -> Result<()> {
        self.adapter(id)?
            .write_any(self, dst, value.map(|v| v as &dyn Any), field)
    }
}
