//! Declarative resource graph.
//!
//! A deployment synthesizes into a set of typed, json-configured resources.
//! The set is a pure value: the external provisioning engine owns diffing,
//! creation, update and deletion.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Configuration for one declared resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceConfig {
    /// Resource type (e.g. "bucket", "scaling-group", "volume")
    pub resource_type: String,

    /// Resource identifier, unique within its type
    pub id: String,

    /// Resource-specific configuration
    pub config: serde_json::Value,
}

impl ResourceConfig {
    pub fn new(
        resource_type: impl Into<String>,
        id: impl Into<String>,
        config: serde_json::Value,
    ) -> Self {
        Self {
            resource_type: resource_type.into(),
            id: id.into(),
            config,
        }
    }

    /// Get the full resource key (type:id)
    pub fn key(&self) -> String {
        format!("{}:{}", self.resource_type, self.id)
    }

    /// Get a configuration value as a specific type
    pub fn get_config<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.config
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}

/// Set of resources declared by one synthesis pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceSet {
    /// Resources indexed by type:id
    pub resources: HashMap<String, ResourceConfig>,
}

impl ResourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, resource: ResourceConfig) {
        self.resources.insert(resource.key(), resource);
    }

    pub fn get(&self, resource_type: &str, id: &str) -> Option<&ResourceConfig> {
        self.resources.get(&format!("{resource_type}:{id}"))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourceConfig> {
        self.resources.values()
    }

    pub fn by_type(&self, resource_type: &str) -> Vec<&ResourceConfig> {
        self.resources
            .values()
            .filter(|r| r.resource_type == resource_type)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Consume the set into a deterministically ordered list.
    pub fn into_sorted(self) -> Vec<ResourceConfig> {
        let mut resources: Vec<ResourceConfig> = self.resources.into_values().collect();
        resources.sort_by(|a, b| a.key().cmp(&b.key()));
        resources
    }
}

/// Deploy-time reference to an attribute of another declared resource,
/// resolved by the provisioning engine.
pub fn attr_ref(resource_type: &str, id: &str, attr: &str) -> String {
    format!("${{{resource_type}:{id}.{attr}}}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resource_set_keys() {
        let mut set = ResourceSet::new();
        set.add(ResourceConfig::new("bucket", "logs", json!({})));
        set.add(ResourceConfig::new("bucket", "artifacts", json!({})));
        set.add(ResourceConfig::new("volume", "agents-data-0-0", json!({})));

        assert_eq!(set.len(), 3);
        assert!(set.get("bucket", "logs").is_some());
        assert!(set.get("bucket", "missing").is_none());
        assert_eq!(set.by_type("bucket").len(), 2);
    }

    #[test]
    fn test_into_sorted_is_deterministic() {
        let mut set = ResourceSet::new();
        set.add(ResourceConfig::new("volume", "b", json!({})));
        set.add(ResourceConfig::new("bucket", "a", json!({})));

        let keys: Vec<String> = set.into_sorted().iter().map(ResourceConfig::key).collect();
        assert_eq!(keys, vec!["bucket:a", "volume:b"]);
    }

    #[test]
    fn test_attr_ref_format() {
        assert_eq!(
            attr_ref("bucket", "artifacts", "name"),
            "${bucket:artifacts.name}"
        );
    }

    #[test]
    fn test_get_config() {
        let resource = ResourceConfig::new("bucket", "logs", json!({"auto_delete": true}));
        assert_eq!(resource.get_config::<bool>("auto_delete"), Some(true));
        assert_eq!(resource.get_config::<bool>("missing"), None);
    }
}
