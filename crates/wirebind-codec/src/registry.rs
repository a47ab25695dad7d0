use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use dashmap::DashMap;
use parking_lot::RwLock;

use crate::adapter::{erase, AdapterId, AdapterKind, DynAdapter, TypeAdapter, WireContext};
use crate::config::RegistryConfig;
use crate::error::{CodecError, Result};
use crate::field::FieldSpec;
use crate::primitives::builtin_scalars;
use crate::record::{RecordBinder, RecordSchema};
use crate::runtime::RuntimeTyped;
use crate::types::{Shape, TypeDesc, TypeKey, WireType};

/// Builds adapters for type descriptors.
///
/// Factories are consulted in order; the first `Some` wins. Nested types
/// are resolved through the `Resolver`, which tolerates cycles.
pub trait AdapterFactory: Send + Sync {
    fn create(
        &self,
        resolver: &mut Resolver<'_>,
        desc: &TypeDesc,
    ) -> Result<Option<Arc<dyn DynAdapter>>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CacheKey {
    ty: TypeKey,
    version: u32,
}

/// Collects schemas and custom adapters before the registry is shared.
pub struct RegistryBuilder {
    config: RegistryConfig,
    records: HashMap<TypeId, Arc<dyn RecordBinder>>,
    custom: HashMap<TypeId, Arc<dyn DynAdapter>>,
    factories: Vec<Arc<dyn AdapterFactory>>,
}

impl RegistryBuilder {
    /// Create an empty builder with default config.
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create an empty builder with explicit config.
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            config,
            records: HashMap::new(),
            custom: HashMap::new(),
            factories: Vec::new(),
        }
    }

    /// Register the wire layout of record type `T`.
    ///
    /// Field rules are validated here. Registering the same type twice fails.
    pub fn register_record<T: WireType>(&mut self, schema: RecordSchema<T>) -> Result<()> {
        let desc = T::describe();
        if !matches!(desc.shape(), Shape::Record) {
            return Err(CodecError::InvalidSchema(format!(
                "{} is not described as a record",
                desc.name()
            )));
        }
        if self.records.contains_key(&TypeId::of::<T>()) {
            return Err(CodecError::InvalidSchema(format!(
                "record {} registered twice",
                desc.name()
            )));
        }

        schema.validate(&self.config)?;
        tracing::debug!(
            record = schema.type_name(),
            fields = schema.fields().count(),
            "record schema registered"
        );
        self.records.insert(TypeId::of::<T>(), Arc::new(schema));
        Ok(())
    }

    /// Use `adapter` for every occurrence of `T`, ahead of the built-ins.
    pub fn register_adapter<T: WireType, A: TypeAdapter<T>>(&mut self, adapter: A) {
        self.custom
            .insert(TypeId::of::<T>(), erase(adapter, AdapterKind::Custom));
    }

    /// Consult `factory` after per-type adapters and before the built-ins.
    pub fn register_factory<F: AdapterFactory + 'static>(&mut self, factory: F) {
        self.factories.push(Arc::new(factory));
    }

    pub fn build(self) -> AdapterRegistry {
        let mut factories: Vec<Arc<dyn AdapterFactory>> =
            vec![Arc::new(CustomAdapters(self.custom))];
        factories.extend(self.factories);
        factories.push(Arc::new(PrimitiveFactory(builtin_scalars())));
        factories.push(Arc::new(ContainerFactory));
        factories.push(Arc::new(PolymorphicFactory));
        factories.push(Arc::new(RecordFactory));

        AdapterRegistry {
            factories,
            records: self.records,
            cache: DashMap::new(),
            table: RwLock::new(AdapterTable::default()),
            config: self.config,
        }
    }
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Adapter slots plus the slots released by failed resolutions.
#[derive(Default)]
struct AdapterTable {
    slots: Vec<Option<Arc<dyn DynAdapter>>>,
    free: Vec<usize>,
}

/// Resolves `(type, protocol version)` pairs to adapters and runs encode /
/// decode calls.
///
/// The registry is immutable once built apart from its adapter cache, so it
/// can be shared behind an `Arc`. Adapters live in a slot table and refer to
/// each other by [`AdapterId`], which lets recursive record types resolve.
/// Published slots are never reused.
pub struct AdapterRegistry {
    factories: Vec<Arc<dyn AdapterFactory>>,
    records: HashMap<TypeId, Arc<dyn RecordBinder>>,
    cache: DashMap<CacheKey, AdapterId>,
    table: RwLock<AdapterTable>,
    config: RegistryConfig,
}

impl AdapterRegistry {
    /// A registry with the built-in adapters only.
    pub fn new() -> Self {
        RegistryBuilder::new().build()
    }

    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Get registry configuration.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Check if a record schema is registered for `T`.
    pub fn has_record<T: WireType>(&self) -> bool {
        self.records.contains_key(&TypeId::of::<T>())
    }

    /// Number of `(type, version)` pairs resolved so far.
    pub fn cached_adapters(&self) -> usize {
        self.cache.len()
    }

    /// Size of the adapter table, free slots included.
    pub fn adapter_slots(&self) -> usize {
        self.table.read().slots.len()
    }

    /// Resolve the adapter for `desc` at `version`.
    pub fn resolve(&self, desc: &TypeDesc, version: u32) -> Result<AdapterId> {
        let key = CacheKey {
            ty: desc.key(),
            version,
        };
        if let Some(id) = self.cached(&key) {
            return Ok(id);
        }

        let mut resolver = Resolver::new(self, version);
        match resolver.resolve(desc) {
            Ok(id) => Ok(resolver.publish(key, id)),
            Err(err) => {
                resolver.abandon();
                Err(err)
            }
        }
    }

    /// Look up a resolved adapter by id.
    pub fn adapter(&self, id: AdapterId) -> Result<Arc<dyn DynAdapter>> {
        self.table
            .read()
            .slots
            .get(id.0)
            .and_then(|slot| slot.clone())
            .ok_or(CodecError::UnresolvedAdapter(id.0))
    }

    /// Encode `value` as protocol `version` onto `dst`.
    pub fn encode<T: WireType>(&self, value: &T, version: u32, dst: &mut BytesMut) -> Result<()> {
        let id = self.resolve(&T::describe(), version)?;
        WireContext::new(self, version).write_as(id, dst, Some(value), &FieldSpec::default())
    }

    /// Decode a `T` from the front of `src` as protocol `version`.
    ///
    /// `Ok(None)` means the buffer ran out before a value could be read.
    pub fn decode<T: WireType>(&self, src: &mut Bytes, version: u32) -> Result<Option<T>> {
        let id = self.resolve(&T::describe(), version)?;
        WireContext::new(self, version).read_as(id, src, &FieldSpec::default())
    }

    /// Encode at the configured default version.
    pub fn encode_default<T: WireType>(&self, value: &T, dst: &mut BytesMut) -> Result<()> {
        self.encode(value, self.config.default_version, dst)
    }

    /// Decode at the configured default version.
    pub fn decode_default<T: WireType>(&self, src: &mut Bytes) -> Result<Option<T>> {
        self.decode(src, self.config.default_version)
    }

    /// Encode `value` into a fresh buffer.
    pub fn to_bytes<T: WireType>(&self, value: &T, version: u32) -> Result<Bytes> {
        let mut dst = BytesMut::new();
        self.encode(value, version, &mut dst)?;
        Ok(dst.freeze())
    }

    fn cached(&self, key: &CacheKey) -> Option<AdapterId> {
        self.cache.get(key).map(|entry| *entry)
    }

    fn reserve_slot(&self) -> AdapterId {
        let mut table = self.table.write();
        if let Some(index) = table.free.pop() {
            return AdapterId(index);
        }
        table.slots.push(None);
        AdapterId(table.slots.len() - 1)
    }

    fn fill_slot(&self, id: AdapterId, adapter: Arc<dyn DynAdapter>) {
        let mut table = self.table.write();
        let slot = &mut table.slots[id.0];
        assert!(slot.is_none(), "adapter slot {} filled twice", id.0);
        *slot = Some(adapter);
    }

    /// Empty slots that were never published and make them reusable.
    fn release_slots(&self, ids: &[AdapterId]) {
        let mut table = self.table.write();
        for id in ids {
            table.slots[id.0] = None;
            table.free.push(id.0);
        }
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// State of one top-level resolution.
///
/// Keys being resolved map to reserved table slots, so a type that refers
/// back to itself gets the placeholder id instead of recursing. Results are
/// published to the shared cache only once every slot is filled; a failed
/// resolution hands its slots back to the table.
pub struct Resolver<'r> {
    registry: &'r AdapterRegistry,
    version: u32,
    in_flight: HashMap<CacheKey, AdapterId>,
    resolved: HashMap<CacheKey, AdapterId>,
    reserved: Vec<AdapterId>,
}

impl<'r> Resolver<'r> {
    fn new(registry: &'r AdapterRegistry, version: u32) -> Self {
        Self {
            registry,
            version,
            in_flight: HashMap::new(),
            resolved: HashMap::new(),
            reserved: Vec::new(),
        }
    }

    pub fn registry(&self) -> &'r AdapterRegistry {
        self.registry
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// Resolve `desc`, reusing cached, in-flight or already resolved slots.
    pub fn resolve(&mut self, desc: &TypeDesc) -> Result<AdapterId> {
        let key = CacheKey {
            ty: desc.key(),
            version: self.version,
        };
        if let Some(id) = self.registry.cached(&key) {
            return Ok(id);
        }
        if let Some(&id) = self.resolved.get(&key) {
            return Ok(id);
        }
        if let Some(&id) = self.in_flight.get(&key) {
            tracing::trace!(ty = desc.name(), slot = id.0, "recursive reference");
            return Ok(id);
        }

        let id = self.registry.reserve_slot();
        self.reserved.push(id);
        self.in_flight.insert(key, id);
        let created = self.create(desc);
        self.in_flight.remove(&key);

        let adapter = created?.ok_or(CodecError::NoAdapter {
            type_name: desc.name(),
            version: self.version,
        })?;
        tracing::debug!(
            ty = desc.name(),
            version = self.version,
            slot = id.0,
            kind = ?adapter.kind(),
            "adapter resolved"
        );
        self.registry.fill_slot(id, adapter);
        self.resolved.insert(key, id);
        Ok(id)
    }

    fn create(&mut self, desc: &TypeDesc) -> Result<Option<Arc<dyn DynAdapter>>> {
        let registry = self.registry;
        for factory in &registry.factories {
            if let Some(adapter) = factory.create(self, desc)? {
                return Ok(Some(adapter));
            }
        }
        Ok(None)
    }

    /// Publish every slot filled by this resolution; returns the cached id
    /// for `top`, which is another thread's if it won the race.
    fn publish(self, top: CacheKey, id: AdapterId) -> AdapterId {
        let mut winner = id;
        for (key, id) in self.resolved {
            let cached = *self.registry.cache.entry(key).or_insert(id);
            if key == top {
                winner = cached;
            }
        }
        winner
    }

    fn abandon(self) {
        if self.reserved.is_empty() {
            return;
        }
        tracing::debug!(
            version = self.version,
            slots = self.reserved.len(),
            "resolution failed; releasing slots"
        );
        self.registry.release_slots(&self.reserved);
    }
}

struct CustomAdapters(HashMap<TypeId, Arc<dyn DynAdapter>>);

impl AdapterFactory for CustomAdapters {
    fn create(
        &self,
        _resolver: &mut Resolver<'_>,
        desc: &TypeDesc,
    ) -> Result<Option<Arc<dyn DynAdapter>>> {
        Ok(self.0.get(&desc.key().id()).cloned())
    }
}

struct PrimitiveFactory(HashMap<TypeId, Arc<dyn DynAdapter>>);

impl AdapterFactory for PrimitiveFactory {
    fn create(
        &self,
        _resolver: &mut Resolver<'_>,
        desc: &TypeDesc,
    ) -> Result<Option<Arc<dyn DynAdapter>>> {
        if !matches!(desc.shape(), Shape::Scalar) {
            return Ok(None);
        }
        Ok(self.0.get(&desc.key().id()).cloned())
    }
}

struct ContainerFactory;

impl AdapterFactory for ContainerFactory {
    fn create(
        &self,
        resolver: &mut Resolver<'_>,
        desc: &TypeDesc,
    ) -> Result<Option<Arc<dyn DynAdapter>>> {
        let (Shape::Optional(shape) | Shape::Sequence(shape)) = desc.shape() else {
            return Ok(None);
        };
        let element = (shape.element)();
        let id = resolver.resolve(&element)?;
        Ok(Some((shape.build)(RuntimeTyped::new(id, element))))
    }
}

struct PolymorphicFactory;

impl AdapterFactory for PolymorphicFactory {
    fn create(
        &self,
        _resolver: &mut Resolver<'_>,
        desc: &TypeDesc,
    ) -> Result<Option<Arc<dyn DynAdapter>>> {
        match desc.shape() {
            Shape::Polymorphic(shape) => Ok(Some((shape.build)())),
            _ => Ok(None),
        }
    }
}

struct RecordFactory;

impl AdapterFactory for RecordFactory {
    fn create(
        &self,
        resolver: &mut Resolver<'_>,
        desc: &TypeDesc,
    ) -> Result<Option<Arc<dyn DynAdapter>>> {
        if !matches!(desc.shape(), Shape::Record) {
            return Ok(None);
        }
        match resolver.registry().records.get(&desc.key().id()) {
            Some(binder) => Arc::clone(binder).bind(resolver).map(Some),
            None => Ok(None),
        }
    }
}
