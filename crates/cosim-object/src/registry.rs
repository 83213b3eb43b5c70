//! Object type descriptors and the run-owned type registry.
//!
//! # Design
//!
//! The original family of systems kept one global default-instance pointer
//! per type.  Here every run context owns a [`TypeRegistry`]; nothing is
//! process-wide.  A registered [`ObjectType`] bundles the factory (the
//! `create` lifecycle call), the pass capability set, and the declared
//! property table, and is shared by `Arc` with every object of that type.

use std::sync::Arc;

use cosim_core::{CosimError, CosimResult, PassSet};
use rustc_hash::FxHashMap;

use crate::{ObjectModel, PropertyDef};

/// Construct a fresh, default-configured model instance.  Pure — factories
/// must not reach for other objects or shared mutable state.
pub type FactoryFn = Box<dyn Fn() -> Box<dyn ObjectModel> + Send + Sync>;

// ── ObjectType ────────────────────────────────────────────────────────────────

/// Descriptor for one registered object type.
pub struct ObjectType {
    key:        String,
    passes:     PassSet,
    properties: Vec<PropertyDef>,
    factory:    FactoryFn,
}

impl ObjectType {
    /// Start a descriptor with the default capability set (everything) and
    /// no declared properties.
    pub fn new(key: impl Into<String>, factory: FactoryFn) -> Self {
        Self {
            key:        key.into(),
            passes:     PassSet::default(),
            properties: Vec::new(),
            factory,
        }
    }

    /// Narrow the lifecycle calls this type participates in.
    pub fn passes(mut self, passes: PassSet) -> Self {
        self.passes = passes;
        self
    }

    /// Declare an externally accessible property.
    pub fn property(mut self, def: PropertyDef) -> Self {
        self.properties.push(def);
        self
    }

    /// The `create` lifecycle call: build a fresh model instance.
    pub fn create(&self) -> Box<dyn ObjectModel> {
        (self.factory)()
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn pass_set(&self) -> PassSet {
        self.passes
    }

    /// Look up a declared property by name.
    pub fn find_property(&self, name: &str) -> Option<&PropertyDef> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn property_count(&self) -> usize {
        self.properties.len()
    }
}

impl std::fmt::Debug for ObjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectType")
            .field("key", &self.key)
            .field("passes", &self.passes)
            .field("properties", &self.properties.len())
            .finish()
    }
}

// ── TypeRegistry ──────────────────────────────────────────────────────────────

/// All object types known to one run context, keyed by type name.
#[derive(Default, Debug)]
pub struct TypeRegistry {
    map: FxHashMap<String, Arc<ObjectType>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a type descriptor.  Duplicate keys are a configuration
    /// error — two collaborators claiming one name is never intentional.
    pub fn register(&mut self, otype: ObjectType) -> CosimResult<Arc<ObjectType>> {
        let key = otype.key.clone();
        if self.map.contains_key(&key) {
            return Err(CosimError::Config(format!(
                "object type '{key}' registered twice"
            )));
        }
        let shared = Arc::new(otype);
        self.map.insert(key, Arc::clone(&shared));
        Ok(shared)
    }

    /// Look up a type by key.
    pub fn get(&self, key: &str) -> CosimResult<Arc<ObjectType>> {
        self.map
            .get(key)
            .cloned()
            .ok_or_else(|| CosimError::TypeNotFound(key.to_string()))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
