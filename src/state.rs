//! Declarative resource state
//!
//! [`ResourceData`] is the attribute map a resource is configured with and
//! the state it is packed back into. Getters return zero values for absent
//! arguments, the same way the API leaves unset fields at their zero value.
//!
//! [`StateFile`] persists the state of every applied resource for the CLI.

use crate::error::{ProviderError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceData {
    #[serde(default)]
    id: String,
    #[serde(default)]
    attributes: Map<String, Value>,
}

impl ResourceData {
    pub fn new(attributes: Map<String, Value>) -> Self {
        Self {
            id: String::new(),
            attributes,
        }
    }

    /// Build from a JSON/YAML object value
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(attributes) => Ok(Self::new(attributes)),
            Value::Null => Ok(Self::default()),
            other => Err(ProviderError::validation(format!(
                "resource configuration must be a map of arguments, got {}",
                other
            ))),
        }
    }

    /// Empty state carrying only an id, used for import
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attributes: Map::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }

    /// Mark the resource as gone from the remote side
    pub fn clear_id(&mut self) {
        self.id.clear();
    }

    pub fn is_absent(&self) -> bool {
        self.id.is_empty()
    }

    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.attributes
    }

    pub fn into_attributes(self) -> Map<String, Value> {
        self.attributes
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key).filter(|v| !v.is_null())
    }

    pub fn get_string(&self, key: &str) -> String {
        self.get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }

    /// `None` when absent or empty
    pub fn get_opt_string(&self, key: &str) -> Option<String> {
        Some(self.get_string(key)).filter(|s| !s.is_empty())
    }

    pub fn get_bool(&self, key: &str) -> bool {
        self.get(key).and_then(Value::as_bool).unwrap_or_default()
    }

    pub fn get_int(&self, key: &str) -> i64 {
        self.get(key).and_then(Value::as_i64).unwrap_or_default()
    }

    pub fn get_string_list(&self, key: &str) -> Vec<String> {
        string_list(self.get(key))
    }

    /// Sorted and de-duplicated
    pub fn get_string_set(&self, key: &str) -> Vec<String> {
        string_set(self.get_string_list(key))
    }

    pub fn get_string_map(&self, key: &str) -> BTreeMap<String, String> {
        self.get(key)
            .and_then(Value::as_object)
            .map(|m| {
                m.iter()
                    .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Nested blocks, each as its own `ResourceData`
    pub fn get_blocks(&self, key: &str) -> Vec<ResourceData> {
        match self.get(key) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_object)
                .map(|m| ResourceData::new(m.clone()))
                .collect(),
            Some(Value::Object(m)) => vec![ResourceData::new(m.clone())],
            _ => Vec::new(),
        }
    }

    /// First nested block, if any
    pub fn get_block(&self, key: &str) -> Option<ResourceData> {
        self.get_blocks(key).into_iter().next()
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.attributes.insert(key.to_string(), value.into());
    }

    pub fn set_blocks(&mut self, key: &str, blocks: Vec<ResourceData>) {
        let items = blocks
            .into_iter()
            .map(|b| Value::Object(b.attributes))
            .collect();
        self.attributes.insert(key.to_string(), Value::Array(items));
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.attributes.remove(key)
    }
}

/// Canonical form of a set of strings: sorted, without duplicates
pub fn string_set<S: Into<String>>(items: impl IntoIterator<Item = S>) -> Vec<String> {
    let mut items: Vec<String> = items.into_iter().map(Into::into).collect();
    items.sort();
    items.dedup();
    items
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}

/// Key of a resource in the state file
pub fn state_key(type_name: &str, id: &str) -> String {
    format!("{}.{}", type_name, id)
}

/// Local record of applied resources, keyed by `<type>.<id>`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StateFile {
    #[serde(default)]
    pub resources: BTreeMap<String, ResourceData>,
    #[serde(skip)]
    path: PathBuf,
}

impl StateFile {
    /// Load state; a missing file is an empty state
    pub fn load(path: &Path) -> Result<Self> {
        let mut state = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            serde_json::from_str::<StateFile>(&content)
                .map_err(|e| ProviderError::decode(format!("state file {}", path.display()), e))?
        } else {
            StateFile::default()
        };
        state.path = path.to_path_buf();
        Ok(state)
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ProviderError::encode("state file", e))?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }

    pub fn get(&self, type_name: &str, id: &str) -> Option<&ResourceData> {
        self.resources.get(&state_key(type_name, id))
    }

    pub fn put(&mut self, type_name: &str, data: ResourceData) {
        self.resources
            .insert(state_key(type_name, data.id()), data);
    }

    pub fn remove(&mut self, type_name: &str, id: &str) -> Option<ResourceData> {
        self.resources.remove(&state_key(type_name, id))
    }

    /// Ids recorded for a resource type
    pub fn ids(&self, type_name: &str) -> Vec<&str> {
        self.resources
            .iter()
            .filter(|(key, data)| **key == state_key(type_name, data.id()))
            .map(|(_, data)| data.id())
            .collect()
    }

    /// State an apply starts from
    ///
    /// An explicit `recorded` id must exist. Otherwise the id the
    /// configuration carries is looked up, and a miss while other objects of
    /// the type are recorded is logged, since a renamed key plans a create.
    pub fn prior(
        &self,
        type_name: &str,
        recorded: Option<&str>,
        configured: Option<&str>,
    ) -> Result<Option<&ResourceData>> {
        if let Some(id) = recorded {
            return self.get(type_name, id).map(Some).ok_or_else(|| {
                ProviderError::Config(format!(
                    "{} {} is not in {}",
                    type_name,
                    id,
                    self.path.display()
                ))
            });
        }

        let found = configured.and_then(|id| self.get(type_name, id));
        if found.is_none() {
            let recorded = self.ids(type_name);
            if !recorded.is_empty() {
                tracing::warn!(
                    "{} {} is not recorded; pass --id to apply over one of {:?}",
                    type_name,
                    configured.unwrap_or_default(),
                    recorded
                );
            }
        }
        Ok(found)
    }
}
