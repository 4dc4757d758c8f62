//! The adapter registry: named configuration descriptors and the live
//! adapters built from them.
//!
//! Lifecycle: `register` descriptors while wiring the application, call
//! [`AdapterRegistry::build`] once with the mapper, then read adapters out
//! of the [`DefaultMap`] accessors. `reset` returns the registry to its
//! post-construction state.

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::debug;

use crate::descriptor::AdapterConfig;
use crate::mapper::Mapper;
use crate::{Adapter, AdapterDescriptor, AdapterName, AdapterType, ModelError};

/// Insertion-ordered map with a distinguished default value.
///
/// The default slot holds a value, not a key: overwriting the entry it was
/// taken from does not move it.
pub struct DefaultMap<V> {
    entries: IndexMap<AdapterName, V>,
    default: Option<V>,
}

impl<V> DefaultMap<V> {
    fn new() -> Self {
        Self {
            entries: IndexMap::new(),
            default: None,
        }
    }

    /// Value stored under `name`, if any.
    pub fn get(&self, name: &AdapterName) -> Option<&V> {
        self.entries.get(name)
    }

    /// The designated default value, if one has been set.
    pub fn default(&self) -> Option<&V> {
        self.default.as_ref()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&AdapterName, &V)> {
        self.entries.iter()
    }

    /// Registered names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &AdapterName> {
        self.entries.keys()
    }

    pub fn contains(&self, name: &AdapterName) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(&mut self, name: AdapterName, value: V) {
        self.entries.insert(name, value);
    }

    fn set_default(&mut self, value: V) {
        self.default = Some(value);
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.default = None;
    }
}

/// Inputs to [`AdapterRegistry::register`].
#[derive(Clone, Debug)]
pub struct RegisterOptions {
    /// Name the adapter is registered and looked up under.
    pub name: AdapterName,
    /// Storage backend kind.
    pub adapter_type: AdapterType,
    /// Connection URI, handed to the descriptor unvalidated.
    pub uri: String,
    /// Force this adapter to become the registry default.
    pub default: bool,
}

impl RegisterOptions {
    pub fn new<S: Into<String>>(name: AdapterName, adapter_type: AdapterType, uri: S) -> Self {
        Self {
            name,
            adapter_type,
            uri: uri.into(),
            default: false,
        }
    }

    /// Mark this registration as the default adapter.
    pub fn make_default(mut self) -> Self {
        self.default = true;
        self
    }
}

/// A collection of adapter configurations and the adapters built from them.
///
/// Generic over the descriptor type so the registry depends only on the
/// [`AdapterConfig`] seam; [`AdapterDescriptor`] is the shipped
/// implementation.
pub struct AdapterRegistry<C: AdapterConfig = AdapterDescriptor> {
    descriptors: DefaultMap<C>,
    adapters: DefaultMap<Arc<dyn Adapter>>,
}

impl<C: AdapterConfig> AdapterRegistry<C> {
    pub fn new() -> Self {
        Self {
            descriptors: DefaultMap::new(),
            adapters: DefaultMap::new(),
        }
    }

    /// Register a new adapter configuration.
    ///
    /// The descriptor is constructed from `adapter_type` + `uri` and stored
    /// under `name`, silently replacing any previous registration with that
    /// name. It becomes the default when no default has been set yet, or
    /// when the options say so.
    ///
    /// Constructor failures of the descriptor propagate unchanged.
    pub fn register(&mut self, options: RegisterOptions) -> Result<(), ModelError> {
        let config = C::new(options.adapter_type, &options.uri)?;
        let make_default = self.descriptors.default().is_none() || options.default;
        debug!(
            name = %options.name,
            adapter_type = %options.adapter_type,
            default = make_default,
            "registering adapter"
        );
        self.descriptors.insert(options.name, config.clone());
        if make_default {
            self.descriptors.set_default(config);
        }
        Ok(())
    }

    /// Instantiate every registered descriptor against `mapper`.
    ///
    /// Adapters land in the adapters mapping under their registration name,
    /// in descriptor insertion order; the one built from the current
    /// default descriptor becomes the adapters default. The first failing
    /// descriptor aborts the pass, leaving adapters built before it in
    /// place. A no-op on an empty registry.
    pub fn build(&mut self, mapper: &Mapper) -> Result<(), ModelError> {
        for (name, config) in self.descriptors.iter() {
            let adapter = config.build(mapper)?;
            debug!(name = %name, "built adapter");
            if self.is_default(config) {
                self.adapters.set_default(Arc::clone(&adapter));
            }
            self.adapters.insert(name.clone(), adapter);
        }
        Ok(())
    }

    /// Drop every descriptor, every built adapter, and both defaults.
    pub fn reset(&mut self) {
        self.descriptors.clear();
        self.adapters.clear();
    }

    /// Registered configuration descriptors.
    pub fn descriptors(&self) -> &DefaultMap<C> {
        &self.descriptors
    }

    /// Adapters produced by the last `build` pass.
    pub fn adapters(&self) -> &DefaultMap<Arc<dyn Adapter>> {
        &self.adapters
    }

    /// Equality check against the descriptors' current default.
    fn is_default(&self, config: &C) -> bool {
        self.descriptors.default().is_some_and(|d| d == config)
    }
}

impl<C: AdapterConfig> Default for AdapterRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::{AttributeKind, Collection};

    fn name(s: &str) -> AdapterName {
        AdapterName::new(s).expect("valid name")
    }

    fn mapper() -> Mapper {
        Mapper::new().collection(
            Collection::new("books")
                .attribute("title", AttributeKind::Text)
                .attribute("pages", AttributeKind::Integer),
        )
    }

    fn registry() -> AdapterRegistry {
        AdapterRegistry::new()
    }

    fn memory(n: &str, uri: &str) -> RegisterOptions {
        RegisterOptions::new(name(n), AdapterType::Memory, uri)
    }

    #[test]
    fn register_stores_descriptor_under_name() {
        let mut reg = registry();
        reg.register(memory("cache", "memory://cache")).unwrap();

        let d = reg.descriptors().get(&name("cache")).expect("registered");
        assert_eq!(d.adapter_type(), AdapterType::Memory);
        assert_eq!(d.uri(), "memory://cache");
        assert_eq!(reg.descriptors().len(), 1);
    }

    #[test]
    fn first_registration_becomes_default() {
        let mut reg = registry();
        reg.register(memory("a", "memory://a")).unwrap();
        reg.register(memory("b", "memory://b")).unwrap();

        let default = reg.descriptors().default().expect("default set");
        assert_eq!(default.uri(), "memory://a");
    }

    #[test]
    fn explicit_default_flag_always_wins() {
        let mut reg = registry();
        reg.register(memory("a", "memory://u1")).unwrap();
        reg.register(memory("b", "memory://u2").make_default())
            .unwrap();

        let default = reg.descriptors().default().expect("default set");
        assert_eq!(default.uri(), "memory://u2");

        // and again, regardless of registration order
        reg.register(memory("c", "memory://u3").make_default())
            .unwrap();
        assert_eq!(reg.descriptors().default().unwrap().uri(), "memory://u3");
    }

    #[test]
    fn names_keep_insertion_order() {
        let mut reg = registry();
        for n in ["one", "two", "three"] {
            reg.register(memory(n, "memory://x")).unwrap();
        }
        let names: Vec<_> = reg.descriptors().names().map(|n| n.as_str()).collect();
        assert_eq!(names, ["one", "two", "three"]);
    }

    #[test]
    fn reregistering_overwrites_without_touching_default() {
        let mut reg = registry();
        reg.register(memory("main", "memory://old")).unwrap();
        reg.register(memory("main", "memory://new")).unwrap();

        assert_eq!(reg.descriptors().len(), 1);
        let stored = reg.descriptors().get(&name("main")).unwrap();
        assert_eq!(stored.uri(), "memory://new");

        // The default tracks the old descriptor by value, not the name.
        let default = reg.descriptors().default().expect("default survives");
        assert_eq!(default.uri(), "memory://old");
    }

    #[test]
    fn build_populates_one_adapter_per_descriptor() {
        let mut reg = registry();
        reg.register(memory("a", "memory://a")).unwrap();
        reg.register(memory("b", "memory://b")).unwrap();
        reg.build(&mapper()).unwrap();

        assert_eq!(reg.adapters().len(), 2);
        assert!(reg.adapters().contains(&name("a")));
        assert!(reg.adapters().contains(&name("b")));
        let order: Vec<_> = reg.adapters().names().map(|n| n.as_str()).collect();
        assert_eq!(order, ["a", "b"]);
    }

    #[test]
    fn build_sets_adapters_default_from_default_descriptor() {
        let mut reg = registry();
        reg.register(memory("a", "memory://a")).unwrap();
        reg.register(memory("b", "memory://b").make_default())
            .unwrap();
        reg.build(&mapper()).unwrap();

        let by_name = reg.adapters().get(&name("b")).expect("built");
        let default = reg.adapters().default().expect("default adapter set");
        assert!(Arc::ptr_eq(by_name, default));
    }

    #[test]
    fn build_on_empty_registry_is_a_noop() {
        let mut reg = registry();
        reg.build(&mapper()).unwrap();
        assert!(reg.adapters().is_empty());
        assert!(reg.adapters().default().is_none());
    }

    #[test]
    fn stale_default_produces_no_default_adapter() {
        let mut reg = registry();
        reg.register(memory("main", "memory://old")).unwrap();
        // Overwrite the only registration; the value-tracked default now
        // matches nothing in the mapping.
        reg.register(memory("main", "memory://new")).unwrap();
        reg.build(&mapper()).unwrap();

        assert_eq!(reg.adapters().len(), 1);
        assert!(reg.adapters().default().is_none());
    }

    #[test]
    fn default_adapter_usable_through_the_port() {
        let mut reg = registry();
        reg.register(memory("main", "memory://main")).unwrap();
        reg.build(&mapper()).unwrap();

        let adapter = reg.adapters().default().expect("default adapter");
        let mut record = crate::Record::new();
        record.insert("title".into(), serde_json::Value::String("dune".into()));
        record.insert("pages".into(), serde_json::Value::from(412));
        let id = adapter.create("books", record).unwrap();
        let found = adapter.find("books", id).unwrap().expect("stored");
        assert_eq!(found["title"], "dune");
    }

    #[test]
    fn reset_clears_everything() {
        let mut reg = registry();
        reg.register(memory("a", "memory://a")).unwrap();
        reg.build(&mapper()).unwrap();
        reg.reset();

        assert!(reg.descriptors().is_empty());
        assert!(reg.descriptors().default().is_none());
        assert!(reg.adapters().is_empty());
        assert!(reg.adapters().default().is_none());
    }

    #[cfg(feature = "sqlite")]
    #[test]
    fn sql_registration_builds_default_sqlite_adapter() {
        let dir = tempfile::tempdir().expect("tempdir");
        let uri = format!("sqlite://{}", dir.path().join("test.db").display());

        let mut reg = registry();
        reg.register(RegisterOptions::new(name("sql"), AdapterType::Sql, &uri))
            .unwrap();
        reg.build(&mapper()).unwrap();

        let by_name = reg.adapters().get(&name("sql")).expect("built");
        let default = reg.adapters().default().expect("default adapter set");
        assert!(Arc::ptr_eq(by_name, default));

        let mut record = crate::Record::new();
        record.insert("title".into(), serde_json::Value::String("dune".into()));
        record.insert("pages".into(), serde_json::Value::from(412));
        let id = by_name.create("books", record).unwrap();
        assert!(by_name.find("books", id).unwrap().is_some());
    }
}
