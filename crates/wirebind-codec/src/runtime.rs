//! Dispatch on the runtime type of polymorphic values.

use std::any::Any;
use std::marker::PhantomData;
use std::sync::Arc;

use bytes::{Bytes, BytesMut};

use crate::adapter::{AdapterId, AdapterKind, DynAdapter, TypeAdapter, WireContext};
use crate::error::{CodecError, Result};
use crate::field::FieldSpec;
use crate::types::{Polymorphic, Shape, TypeDesc, TypeKey};

/// A declared adapter that re-resolves for the value's concrete type on
/// write when the declared type is polymorphic.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeTyped {
    declared: AdapterId,
    desc: TypeDesc,
}

impl RuntimeTyped {
    pub fn new(declared: AdapterId, desc: TypeDesc) -> Self {
        Self { declared, desc }
    }

    pub fn declared(&self) -> AdapterId {
        self.declared
    }

    pub fn desc(&self) -> &TypeDesc {
        &self.desc
    }

    pub fn read(
        &self,
        cx: &WireContext<'_>,
        src: &mut Bytes,
        field: &FieldSpec,
    ) -> Result<Option<Box<dyn Any>>> {
        cx.adapter(self.declared)?.read_any(cx, src, field)
    }

    pub fn write(
        &self,
        cx: &WireContext<'_>,
        dst: &mut BytesMut,
        value: Option<&dyn Any>,
        field: &FieldSpec,
    ) -> Result<()> {
        let declared = cx.adapter(self.declared)?;
        let (Shape::Polymorphic(shape), Some(value)) = (self.desc.shape(), value) else {
            return declared.write_any(cx, dst, value, field);
        };

        match (shape.concrete)(value) {
            Some((concrete, payload)) if concrete.key() != self.desc.key() => {
                let runtime = cx.adapter(cx.resolve(&concrete)?)?;
                if prefer_runtime(declared.as_ref(), runtime.as_ref()) {
                    runtime.write_any(cx, dst, Some(payload), field)
                } else {
                    declared.write_any(cx, dst, Some(value), field)
                }
            }
            _ => declared.write_any(cx, dst, Some(value), field),
        }
    }
}

/// A concrete adapter wins unless it is a generic binder and the declared
/// one was chosen deliberately (custom or built-in).
fn prefer_runtime(declared: &dyn DynAdapter, runtime: &dyn DynAdapter) -> bool {
    runtime.kind() != AdapterKind::Generic || declared.kind() == AdapterKind::Generic
}

/// Adapter for a [`Polymorphic`] type without a custom adapter.
///
/// Writing delegates to the adapter of the held variant. The wire carries no
/// type tag, so reading needs a custom adapter that knows the protocol.
pub struct PolymorphicAdapter<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> PolymorphicAdapter<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for PolymorphicAdapter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Polymorphic> TypeAdapter<T> for PolymorphicAdapter<T> {
    fn read(&self, cx: &WireContext<'_>, _src: &mut Bytes, _field: &FieldSpec) -> Result<Option<T>> {
        Err(CodecError::NoAdapter {
            type_name: TypeKey::of::<T>().name(),
            version: cx.version(),
        })
    }

    fn write(
        &self,
        cx: &WireContext<'_>,
        dst: &mut BytesMut,
        value: Option<&T>,
        field: &FieldSpec,
    ) -> Result<()> {
        let Some(value) = value else {
            return Ok(());
        };
        let (concrete, payload) = value.concrete();
        if concrete.key() == TypeKey::of::<T>() {
            return Err(CodecError::NoAdapter {
                type_name: concrete.name(),
                version: cx.version(),
            });
        }
        let adapter = cx.adapter(cx.resolve(&concrete)?)?;
        adapter.write_any(cx, dst, Some(payload), field)
    }
}

pub(crate) fn polymorphic_adapter<T: Polymorphic>() -> Arc<dyn DynAdapter> {
    crate::adapter::erase(PolymorphicAdapter::<T>::new(), AdapterKind::Generic)
}
