//! Record schemas: ordered field lists bound to adapters per version.

use std::any::{type_name, Any};
use std::marker::PhantomData;
use std::sync::Arc;

use bytes::{Bytes, BytesMut};

use crate::adapter::{erase, AdapterKind, DynAdapter, TypeAdapter, WireContext};
use crate::config::RegistryConfig;
use crate::error::{CodecError, Result};
use crate::field::FieldSpec;
use crate::registry::Resolver;
use crate::runtime::RuntimeTyped;
use crate::types::{Shape, TypeDesc, TypeKey, WireType};

/// Typed access to one field of a record.
trait FieldAccess<T>: Send + Sync {
    fn desc(&self) -> TypeDesc;
    fn get<'a>(&self, record: &'a T) -> &'a dyn Any;
    /// Store a decoded value; `false` if it has the wrong type.
    fn set(&self, record: &mut T, value: Box<dyn Any>) -> bool;
}

struct Accessor<F, G, S> {
    get: G,
    set: S,
    _marker: PhantomData<fn() -> F>,
}

impl<T, F, G, S> FieldAccess<T> for Accessor<F, G, S>
where
    F: WireType,
    G: Fn(&T) -> &F + Send + Sync,
    S: Fn(&mut T, F) + Send + Sync,
{
    fn desc(&self) -> TypeDesc {
        F::describe()
    }

    fn get<'a>(&self, record: &'a T) -> &'a dyn Any {
        (self.get)(record)
    }

    fn set(&self, record: &mut T, value: Box<dyn Any>) -> bool {
        match value.downcast::<F>() {
            Ok(value) => {
                (self.set)(record, *value);
                true
            }
            Err(_) => false,
        }
    }
}

struct FieldDef<T> {
    name: &'static str,
    spec: FieldSpec,
    access: Box<dyn FieldAccess<T>>,
    adapter: Option<Arc<dyn DynAdapter>>,
}

/// Wire layout of a record type: fields in wire order, each with its rules
/// and accessors.
///
/// ```
/// use wirebind_codec::{AdapterRegistry, FieldSpec, RecordSchema, WireType};
///
/// #[derive(Debug, Default, PartialEq)]
/// struct Address {
///     ip: String,
///     port: i32,
/// }
///
/// impl WireType for Address {}
///
/// let schema = RecordSchema::<Address>::new()
///     .field("ip", FieldSpec::new().length(15), |a| &a.ip, |a, v| a.ip = v)
///     .field("port", FieldSpec::new().length(4).big_endian(), |a| &a.port, |a, v| a.port = v);
///
/// let mut builder = AdapterRegistry::builder();
/// builder.register_record(schema).unwrap();
/// let registry = builder.build();
///
/// let address = Address { ip: "10.0.0.1".into(), port: 502 };
/// let mut wire = registry.to_bytes(&address, 1).unwrap();
/// assert_eq!(wire.len(), 19);
/// assert_eq!(registry.decode::<Address>(&mut wire, 1).unwrap(), Some(address));
/// ```
pub struct RecordSchema<T> {
    fields: Vec<FieldDef<T>>,
    create: Box<dyn Fn() -> T + Send + Sync>,
}

impl<T: WireType + Default> RecordSchema<T> {
    /// A schema whose instances start from `T::default()`.
    pub fn new() -> Self {
        Self::with_factory(T::default)
    }
}

impl<T: WireType + Default> Default for RecordSchema<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: WireType> RecordSchema<T> {
    /// A schema whose instances are built by `create` before fields are read.
    pub fn with_factory(create: impl Fn() -> T + Send + Sync + 'static) -> Self {
        Self {
            fields: Vec::new(),
            create: Box::new(create),
        }
    }

    /// Append a field encoded by the registry's adapter for `F`.
    pub fn field<F: WireType>(
        self,
        name: &'static str,
        spec: FieldSpec,
        get: impl Fn(&T) -> &F + Send + Sync + 'static,
        set: impl Fn(&mut T, F) + Send + Sync + 'static,
    ) -> Self {
        self.push(name, spec, get, set, None)
    }

    /// Append a field encoded by `adapter` instead of the registry's choice.
    pub fn field_with_adapter<F: WireType, A: TypeAdapter<F>>(
        self,
        name: &'static str,
        spec: FieldSpec,
        adapter: A,
        get: impl Fn(&T) -> &F + Send + Sync + 'static,
        set: impl Fn(&mut T, F) + Send + Sync + 'static,
    ) -> Self {
        let adapter = erase(adapter, AdapterKind::Custom);
        self.push(name, spec, get, set, Some(adapter))
    }

    fn push<F: WireType>(
        mut self,
        name: &'static str,
        spec: FieldSpec,
        get: impl Fn(&T) -> &F + Send + Sync + 'static,
        set: impl Fn(&mut T, F) + Send + Sync + 'static,
        adapter: Option<Arc<dyn DynAdapter>>,
    ) -> Self {
        self.fields.push(FieldDef {
            name,
            spec,
            access: Box::new(Accessor {
                get,
                set,
                _marker: PhantomData,
            }),
            adapter,
        });
        self
    }

    /// Field names and rules in wire order.
    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &FieldSpec)> + '_ {
        self.fields.iter().map(|def| (def.name, &def.spec))
    }

    /// Field names carried at `version`.
    pub fn fields_at(&self, version: u32) -> Vec<&'static str> {
        self.fields
            .iter()
            .filter(|def| def.spec.applies_to(version))
            .map(|def| def.name)
            .collect()
    }
}

/// Type-erased schema held by the registry.
pub(crate) trait RecordBinder: Send + Sync {
    fn type_name(&self) -> &'static str;

    fn validate(&self, config: &RegistryConfig) -> Result<()>;

    /// Resolve the adapters of the fields present at the resolver's version.
    fn bind(self: Arc<Self>, resolver: &mut Resolver<'_>) -> Result<Arc<dyn DynAdapter>>;
}

impl<T: WireType> RecordBinder for RecordSchema<T> {
    fn type_name(&self) -> &'static str {
        type_name::<T>()
    }

    fn validate(&self, config: &RegistryConfig) -> Result<()> {
        for def in &self.fields {
            let context = |err: CodecError| match err {
                CodecError::InvalidSchema(msg) => {
                    CodecError::InvalidSchema(format!("{}.{}: {msg}", type_name::<T>(), def.name))
                }
                other => other,
            };
            def.spec.validate().map_err(context)?;

            let desc = def.access.desc();
            let Shape::Sequence(shape) = desc.shape() else {
                continue;
            };
            match shape.fixed_len {
                Some(n) if def.spec.length != 0 && def.spec.length != n => {
                    return Err(CodecError::UnsupportedLength {
                        type_name: desc.name(),
                        length: def.spec.length,
                    });
                }
                None if def.spec.length > config.max_sequence_len => {
                    return Err(context(CodecError::InvalidSchema(format!(
                        "sequence length {} exceeds max_sequence_len ({})",
                        def.spec.length, config.max_sequence_len
                    ))));
                }
                _ => {}
            }

            let count = shape.fixed_len.unwrap_or(def.spec.length);
            if count > 0
                && def.spec.element_spec().length == 0
                && holds_string(&(shape.element)())
            {
                return Err(context(CodecError::InvalidSchema(
                    "string elements need a non-zero element length".to_string(),
                )));
            }
        }
        Ok(())
    }

    fn bind(self: Arc<Self>, resolver: &mut Resolver<'_>) -> Result<Arc<dyn DynAdapter>> {
        let version = resolver.version();
        let mut fields = Vec::new();
        for (index, def) in self.fields.iter().enumerate() {
            if !def.spec.applies_to(version) {
                continue;
            }
            let target = match &def.adapter {
                Some(adapter) => FieldTarget::Override(Arc::clone(adapter)),
                None => {
                    let desc = def.access.desc();
                    FieldTarget::Declared(RuntimeTyped::new(resolver.resolve(&desc)?, desc))
                }
            };
            fields.push(BoundField { index, target });
        }

        tracing::debug!(
            record = type_name::<T>(),
            version,
            bound = fields.len(),
            declared = self.fields.len(),
            "record schema bound"
        );
        Ok(erase(
            RecordAdapter {
                schema: self,
                fields,
            },
            AdapterKind::Generic,
        ))
    }
}

/// A string, directly or behind an `Option`. With length 0 it consumes the
/// rest of the buffer.
fn holds_string(desc: &TypeDesc) -> bool {
    match desc.shape() {
        Shape::Optional(shape) => holds_string(&(shape.element)()),
        _ => desc.key() == TypeKey::of::<String>(),
    }
}

enum FieldTarget {
    /// Per-field adapter from `field_with_adapter`; used as is.
    Override(Arc<dyn DynAdapter>),
    Declared(RuntimeTyped),
}

struct BoundField {
    index: usize,
    target: FieldTarget,
}

/// Reads and writes the fields of one record type at one version.
struct RecordAdapter<T> {
    schema: Arc<RecordSchema<T>>,
    fields: Vec<BoundField>,
}

impl<T: WireType> TypeAdapter<T> for RecordAdapter<T> {
    fn read(&self, cx: &WireContext<'_>, src: &mut Bytes, _field: &FieldSpec) -> Result<Option<T>> {
        let cx = &cx.nested()?;
        let mut record = (self.schema.create)();
        for bound in &self.fields {
            let def = &self.schema.fields[bound.index];
            let value = match &bound.target {
                FieldTarget::Override(adapter) => adapter.read_any(cx, src, &def.spec)?,
                FieldTarget::Declared(adapter) => adapter.read(cx, src, &def.spec)?,
            };
            // Absent values keep whatever the instance was built with.
            if let Some(value) = value {
                if !def.access.set(&mut record, value) {
                    tracing::warn!(
                        record = type_name::<T>(),
                        field = def.name,
                        "decoded value has the wrong type; field skipped"
                    );
                }
            }
        }
        Ok(Some(record))
    }

    fn write(
        &self,
        cx: &WireContext<'_>,
        dst: &mut BytesMut,
        value: Option<&T>,
        _field: &FieldSpec,
    ) -> Result<()> {
        let Some(record) = value else {
            return Ok(());
        };
        let cx = &cx.nested()?;
        for bound in &self.fields {
            let def = &self.schema.fields[bound.index];
            let value = def.access.get(record);
            let written = match &bound.target {
                FieldTarget::Override(adapter) => adapter.write_any(cx, dst, Some(value), &def.spec),
                FieldTarget::Declared(adapter) => adapter.write(cx, dst, Some(value), &def.spec),
            };
            match written {
                Err(CodecError::TypeMismatch { expected }) => {
                    tracing::warn!(
                        record = type_name::<T>(),
                        field = def.name,
                        expected,
                        "field value has the wrong type; field skipped"
                    );
                }
                other => other?,
            }
        }
        Ok(())
    }
}
