use std::any::Any;
use std::marker::PhantomData;

use bytes::{Buf, Bytes, BytesMut};

use crate::adapter::{downcast, TypeAdapter, WireContext};
use crate::error::Result;
use crate::field::FieldSpec;
use crate::runtime::RuntimeTyped;
use crate::types::{Sequence, WireType};

/// Fixed-repetition sequence: `field.length` elements back to back, no
/// count prefix on the wire. `[E; N]` always uses `N`.
pub struct SequenceAdapter<S> {
    element: RuntimeTyped,
    _marker: PhantomData<fn() -> S>,
}

impl<S> SequenceAdapter<S> {
    pub fn new(element: RuntimeTyped) -> Self {
        Self {
            element,
            _marker: PhantomData,
        }
    }
}

impl<S: Sequence + Any> TypeAdapter<S> for SequenceAdapter<S> {
    fn read(&self, cx: &WireContext<'_>, src: &mut Bytes, field: &FieldSpec) -> Result<Option<S>> {
        if !src.has_remaining() {
            return Ok(None);
        }

        let count = S::FIXED_LEN.unwrap_or(field.length);
        let element_field = field.element_spec();
        let mut elements = Vec::with_capacity(count.min(src.remaining()));
        for index in 0..count {
            match self.element.read(cx, src, &element_field)? {
                Some(value) => elements.push(downcast::<S::Elem>(value)?),
                None => {
                    tracing::debug!(
                        element = self.element.desc().name(),
                        index,
                        count,
                        "sequence truncated by end of buffer"
                    );
                    break;
                }
            }
        }
        Ok(S::from_elements(elements))
    }

    fn write(
        &self,
        cx: &WireContext<'_>,
        dst: &mut BytesMut,
        value: Option<&S>,
        field: &FieldSpec,
    ) -> Result<()> {
        let Some(sequence) = value else {
            return Ok(());
        };
        let element_field = field.element_spec();
        for element in sequence.elements() {
            self.element
                .write(cx, dst, Some(element as &dyn Any), &element_field)?;
        }
        Ok(())
    }
}

/// `Option<E>`: reads always succeed, an absent inner value becomes `None`.
pub struct OptionAdapter<E> {
    inner: RuntimeTyped,
    _marker: PhantomData<fn() -> E>,
}

impl<E> OptionAdapter<E> {
    pub fn new(inner: RuntimeTyped) -> Self {
        Self {
            inner,
            _marker: PhantomData,
        }
    }
}

impl<E: WireType> TypeAdapter<Option<E>> for OptionAdapter<E> {
    fn read(
        &self,
        cx: &WireContext<'_>,
        src: &mut Bytes,
        field: &FieldSpec,
    ) -> Result<Option<Option<E>>> {
        let value = self.inner.read(cx, src, field)?.map(downcast::<E>).transpose()?;
        Ok(Some(value))
    }

    fn write(
        &self,
        cx: &WireContext<'_>,
        dst: &mut BytesMut,
        value: Option<&Option<E>>,
        field: &FieldSpec,
    ) -> Result<()> {
        let inner = value.and_then(Option::as_ref).map(|v| v as &dyn Any);
        self.inner.write(cx, dst, inner, field)
    }
}
