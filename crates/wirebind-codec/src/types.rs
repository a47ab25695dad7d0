//! Compile-time type descriptors that drive adapter resolution.

use std::any::{type_name, Any, TypeId};
use std::collections::VecDeque;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::adapter::DynAdapter;
use crate::containers::{OptionAdapter, SequenceAdapter};
use crate::decimal::Decimal;
use crate::runtime::{polymorphic_adapter, RuntimeTyped};

/// Identity of a Rust type, printable by name.
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    pub fn of<T: Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// How the registry should build an adapter for a type.
#[derive(Clone, Copy, Debug)]
pub enum Shape {
    /// Built-in scalar (integers, `bool`, `String`, `Decimal`).
    Scalar,
    /// Record bound through a registered `RecordSchema`.
    Record,
    /// `Option<E>`.
    Optional(ContainerShape),
    /// `Vec<E>`, `VecDeque<E>` or `[E; N]`.
    Sequence(ContainerShape),
    /// Closed set of concrete types, dispatched on the value at write time.
    Polymorphic(PolymorphicShape),
}

/// Element type of a container plus the constructor of its adapter.
#[derive(Clone, Copy)]
pub struct ContainerShape {
    pub element: fn() -> TypeDesc,
    pub build: fn(RuntimeTyped) -> Arc<dyn DynAdapter>,
    /// Element count fixed by the type itself (`[E; N]`).
    pub fixed_len: Option<usize>,
}

impl fmt::Debug for ContainerShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerShape")
            .field("element", &(self.element)().key)
            .field("fixed_len", &self.fixed_len)
            .finish()
    }
}

/// Projection from a polymorphic value to its concrete payload.
#[derive(Clone, Copy)]
pub struct PolymorphicShape {
    pub concrete: fn(&dyn Any) -> Option<(TypeDesc, &dyn Any)>,
    /// Dispatching adapter used when no custom adapter is registered.
    pub build: fn() -> Arc<dyn DynAdapter>,
}

impl fmt::Debug for PolymorphicShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PolymorphicShape")
    }
}

/// A type's identity and shape.
#[derive(Clone, Copy, Debug)]
pub struct TypeDesc {
    key: TypeKey,
    shape: Shape,
}

impl TypeDesc {
    pub fn new(key: TypeKey, shape: Shape) -> Self {
        Self { key, shape }
    }

    pub fn scalar<T: Any>() -> Self {
        Self::new(TypeKey::of::<T>(), Shape::Scalar)
    }

    pub fn record<T: Any>() -> Self {
        Self::new(TypeKey::of::<T>(), Shape::Record)
    }

    pub fn polymorphic<T: Polymorphic>() -> Self {
        Self::new(
            TypeKey::of::<T>(),
            Shape::Polymorphic(PolymorphicShape {
                concrete: concrete_of::<T>,
                build: polymorphic_adapter::<T>,
            }),
        )
    }

    pub fn of<T: WireType>() -> Self {
        T::describe()
    }

    pub fn key(&self) -> TypeKey {
        self.key
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn name(&self) -> &'static str {
        self.key.name
    }

    pub fn is_polymorphic(&self) -> bool {
        matches!(self.shape, Shape::Polymorphic(_))
    }
}

/// A type that can appear on the wire.
///
/// Records only need an empty impl (`impl WireType for Meter {}`) plus a
/// registered `RecordSchema`. Containers and scalars are covered here.
pub trait WireType: Any + Sized {
    fn describe() -> TypeDesc {
        TypeDesc::record::<Self>()
    }
}

/// A closed family of concrete types, usually an enum whose variants wrap
/// records. Encoding dispatches on the variant held.
///
/// ```
/// use std::any::Any;
/// use wirebind_codec::{Polymorphic, TypeDesc, WireType};
///
/// #[derive(Default)]
/// struct Relay { on: bool }
/// #[derive(Default)]
/// struct Dimmer { level: u8 }
/// impl WireType for Relay {}
/// impl WireType for Dimmer {}
///
/// enum Device { Relay(Relay), Dimmer(Dimmer) }
///
/// impl WireType for Device {
///     fn describe() -> TypeDesc {
///         TypeDesc::polymorphic::<Self>()
///     }
/// }
///
/// impl Polymorphic for Device {
///     fn concrete(&self) -> (TypeDesc, &dyn Any) {
///         match self {
///             Device::Relay(r) => (TypeDesc::of::<Relay>(), r),
///             Device::Dimmer(d) => (TypeDesc::of::<Dimmer>(), d),
///         }
///     }
/// }
/// ```
pub trait Polymorphic: WireType {
    fn concrete(&self) -> (TypeDesc, &dyn Any);
}

fn concrete_of<T: Polymorphic>(value: &dyn Any) -> Option<(TypeDesc, &dyn Any)> {
    value.downcast_ref::<T>().map(Polymorphic::concrete)
}

macro_rules! scalar_wire_types {
    ($($t:ty),* $(,)?) => {
        $(
            impl WireType for $t {
                fn describe() -> TypeDesc {
                    TypeDesc::scalar::<Self>()
                }
            }
        )*
    };
}

scalar_wire_types!(u8, i8, u16, i16, u32, i32, u64, i64, bool, String, Decimal);

/// A container materialized from a run of decoded elements.
pub trait Sequence: Sized {
    type Elem: WireType;

    /// Element count fixed by the type, if any.
    const FIXED_LEN: Option<usize> = None;

    /// Build the container; `None` if the element count does not fit.
    fn from_elements(elements: Vec<Self::Elem>) -> Option<Self>;

    fn elements(&self) -> impl Iterator<Item = &Self::Elem>;
}

impl<E: WireType> Sequence for Vec<E> {
    type Elem = E;

    fn from_elements(elements: Vec<E>) -> Option<Self> {
        Some(elements)
    }

    fn elements(&self) -> impl Iterator<Item = &E> {
        self.iter()
    }
}

impl<E: WireType> Sequence for VecDeque<E> {
    type Elem = E;

    fn from_elements(elements: Vec<E>) -> Option<Self> {
        Some(elements.into())
    }

    fn elements(&self) -> impl Iterator<Item = &E> {
        self.iter()
    }
}

impl<E: WireType, const N: usize> Sequence for [E; N] {
    type Elem = E;
    const FIXED_LEN: Option<usize> = Some(N);

    fn from_elements(elements: Vec<E>) -> Option<Self> {
        elements.try_into().ok()
    }

    fn elements(&self) -> impl Iterator<Item = &E> {
        self.iter()
    }
}

fn sequence_desc<S: Sequence + Any>() -> TypeDesc {
    TypeDesc::new(
        TypeKey::of::<S>(),
        Shape::Sequence(ContainerShape {
            element: <S::Elem as WireType>::describe,
            build: build_sequence::<S>,
            fixed_len: S::FIXED_LEN,
        }),
    )
}

fn build_sequence<S: Sequence + Any>(element: RuntimeTyped) -> Arc<dyn DynAdapter> {
    crate::adapter::erase(
        SequenceAdapter::<S>::new(element),
        crate::adapter::AdapterKind::Builtin,
    )
}

fn build_option<E: WireType>(element: RuntimeTyped) -> Arc<dyn DynAdapter> {
    crate::adapter::erase(
        OptionAdapter::<E>::new(element),
        crate::adapter::AdapterKind::Builtin,
    )
}

impl<E: WireType> WireType for Vec<E> {
    fn describe() -> TypeDesc {
        sequence_desc::<Self>()
    }
}

impl<E: WireType> WireType for VecDeque<E> {
    fn describe() -> TypeDesc {
        sequence_desc::<Self>()
    }
}

impl<E: WireType, const N: usize> WireType for [E; N] {
    fn describe() -> TypeDesc {
        sequence_desc::<Self>()
    }
}

impl<E: WireType> WireType for Option<E> {
    fn describe() -> TypeDesc {
        TypeDesc::new(
            TypeKey::of::<Self>(),
            Shape::Optional(ContainerShape {
                element: E::describe,
                build: build_option::<E>,
                fixed_len: None,
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_compare_by_type() {
        assert_eq!(TypeKey::of::<u16>(), TypeKey::of::<u16>());
        assert_ne!(TypeKey::of::<u16>(), TypeKey::of::<i16>());
        assert!(TypeKey::of::<String>().name().ends_with("String"));
    }

    #[test]
    fn container_shapes() {
        match <[u8; 4]>::describe().shape() {
            Shape::Sequence(shape) => {
                assert_eq!(shape.fixed_len, Some(4));
                assert_eq!((shape.element)().key(), TypeKey::of::<u8>());
            }
            other => panic!("unexpected shape {other:?}"),
        }
        assert!(matches!(
            <Vec<String>>::describe().shape(),
            Shape::Sequence(ContainerShape { fixed_len: None, .. })
        ));
        assert!(matches!(
            <Option<u32>>::describe().shape(),
            Shape::Optional(_)
        ));
        assert!(matches!(bool::describe().shape(), Shape::Scalar));
    }

    #[test]
    fn arrays_require_exact_count() {
        assert_eq!(<[u8; 2]>::from_elements(vec![1, 2]), Some([1, 2]));
        assert_eq!(<[u8; 2]>::from_elements(vec![1]), None);
    }
}
