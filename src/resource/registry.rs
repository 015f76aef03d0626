//! Resource Registry
//!
//! Built once at startup and passed around by reference. It is never mutated
//! after construction, so lifecycle operations on independent resources can
//! share it freely.

use super::Resource;
use crate::error::{ProviderError, Result};
use crate::resources;
use std::collections::BTreeMap;

pub struct ResourceRegistry {
    resources: BTreeMap<String, Box<dyn Resource>>,
}

impl ResourceRegistry {
    /// Registry holding every built-in resource type
    pub fn new() -> Self {
        let mut registry = Self::empty();
        resources::register_all(&mut registry);
        tracing::debug!("Registered {} resource types", registry.len());
        registry
    }

    pub fn empty() -> Self {
        Self {
            resources: BTreeMap::new(),
        }
    }

    pub fn register<R: Resource + 'static>(&mut self, resource: R) {
        let name = resource.type_name().to_string();
        if self.resources.insert(name.clone(), Box::new(resource)).is_some() {
            tracing::warn!("Resource type {} registered twice", name);
        }
    }

    /// Get a resource definition by type name
    pub fn get(&self, type_name: &str) -> Option<&dyn Resource> {
        self.resources.get(type_name).map(|r| r.as_ref())
    }

    pub fn require(&self, type_name: &str) -> Result<&dyn Resource> {
        self.get(type_name)
            .ok_or_else(|| ProviderError::UnknownResource(type_name.to_string()))
    }

    /// All type names, sorted
    pub fn type_names(&self) -> Vec<&str> {
        self.resources.keys().map(|s| s.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

impl Default for ResourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}
