//! Declarative resource schemas
//!
//! Every resource describes its arguments with a [`Schema`]: a map from
//! argument name to [`FieldSchema`]. Schemas drive three things:
//!
//! - defaults applied to a configuration before it is unpacked
//! - validation that runs before any network call
//! - the `schema` CLI command, which prints them as JSON
//!
//! Schemas are built once when the [`crate::resource::ResourceRegistry`] is
//! constructed and are read-only afterwards.

pub mod validation;

use crate::error::{ProviderError, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub use validation::{validate_cron, Validation};

/// Value type of an argument
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldType {
    String,
    Bool,
    Int,
    StringList,
    /// Unordered, de-duplicated list of strings
    StringSet,
    StringMap,
    /// Nested block(s), stored as a list of attribute maps
    Block {
        schema: Schema,
        max_items: Option<usize>,
    },
}

impl FieldType {
    fn describe(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Bool => "bool",
            FieldType::Int => "number",
            FieldType::StringList => "list of string",
            FieldType::StringSet => "set of string",
            FieldType::StringMap => "map of string",
            FieldType::Block { .. } => "block",
        }
    }

    fn accepts(&self, value: &Value) -> bool {
        let all_strings = |items: &Vec<Value>| items.iter().all(Value::is_string);
        match self {
            FieldType::String => value.is_string(),
            FieldType::Bool => value.is_boolean(),
            FieldType::Int => value.is_i64() || value.is_u64(),
            FieldType::StringList | FieldType::StringSet => {
                value.as_array().map(all_strings).unwrap_or(false)
            }
            FieldType::StringMap => value
                .as_object()
                .map(|m| m.values().all(Value::is_string))
                .unwrap_or(false),
            FieldType::Block { .. } => value
                .as_array()
                .map(|items| items.iter().all(Value::is_object))
                .unwrap_or(false),
        }
    }
}

/// Definition of a single argument
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSchema {
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub required: bool,
    /// Filled in from the API when not configured
    pub computed: bool,
    /// Changing this argument replaces the remote object
    pub force_new: bool,
    pub sensitive: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub validations: Vec<Validation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FieldSchema {
    fn of(field_type: FieldType) -> Self {
        Self {
            field_type,
            required: false,
            computed: false,
            force_new: false,
            sensitive: false,
            default: None,
            validations: Vec::new(),
            description: None,
        }
    }

    pub fn string() -> Self {
        Self::of(FieldType::String)
    }

    pub fn bool() -> Self {
        Self::of(FieldType::Bool)
    }

    pub fn int() -> Self {
        Self::of(FieldType::Int)
    }

    pub fn string_list() -> Self {
        Self::of(FieldType::StringList)
    }

    pub fn string_set() -> Self {
        Self::of(FieldType::StringSet)
    }

    pub fn string_map() -> Self {
        Self::of(FieldType::StringMap)
    }

    pub fn block(schema: Schema, max_items: Option<usize>) -> Self {
        Self::of(FieldType::Block { schema, max_items })
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn validate(mut self, validation: Validation) -> Self {
        self.validations.push(validation);
        self
    }

    pub fn description(mut self, text: &str) -> Self {
        self.description = Some(text.to_string());
        self
    }
}

/// A configured argument whose value differs from state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    /// Dotted path, e.g. `replications.0.url`
    pub path: String,
    pub force_new: bool,
}

/// Argument definitions for one resource (or one nested block)
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Schema {
    fields: BTreeMap<String, FieldSchema>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: &str, field: FieldSchema) -> Self {
        self.fields.insert(name.to_string(), field);
        self
    }

    /// Merge `other` into this schema; `other` wins on name clashes
    pub fn merge(mut self, other: Schema) -> Self {
        self.fields.extend(other.fields);
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldSchema)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Fill in defaults for absent arguments and normalise block values.
    ///
    /// A block given as a single map is wrapped into a one-element list, which
    /// is how blocks are stored in state.
    pub fn apply_defaults(&self, attrs: &mut Map<String, Value>) {
        for (name, field) in &self.fields {
            match attrs.get_mut(name) {
                None | Some(Value::Null) => {
                    if let Some(default) = &field.default {
                        attrs.insert(name.clone(), default.clone());
                    }
                }
                Some(value) => {
                    if let FieldType::Block { schema, .. } = &field.field_type {
                        if value.is_object() {
                            *value = Value::Array(vec![value.take()]);
                        }
                        if let Some(items) = value.as_array_mut() {
                            for item in items.iter_mut() {
                                if let Some(block) = item.as_object_mut() {
                                    schema.apply_defaults(block);
                                }
                            }
                        }
                    }
                }
            }
        }
    }

    /// Configured arguments whose value differs from `state`.
    ///
    /// Only arguments set in `config` are compared, recursively inside blocks,
    /// so computed values never show up as changes. Sets compare without
    /// order. Sensitive arguments inside blocks are skipped because state holds
    /// the remote form there, not the value that was sent.
    pub fn changes(&self, config: &Map<String, Value>, state: &Map<String, Value>) -> Vec<Change> {
        let mut changes = Vec::new();
        self.collect_changes("", config, state, false, &mut changes);
        changes
    }

    fn collect_changes(
        &self,
        prefix: &str,
        config: &Map<String, Value>,
        state: &Map<String, Value>,
        nested: bool,
        changes: &mut Vec<Change>,
    ) {
        for (name, wanted) in config.iter().filter(|(_, v)| !v.is_null()) {
            let Some(field) = self.fields.get(name) else {
                continue;
            };
            if nested && field.sensitive {
                continue;
            }

            let path = format!("{}{}", prefix, name);
            let differs = match (&field.field_type, state.get(name).filter(|v| !v.is_null())) {
                (_, None) => true,
                (FieldType::StringSet, Some(current)) => set_of(wanted) != set_of(current),
                (FieldType::Block { schema, .. }, Some(current)) => {
                    let wanted = blocks_of(wanted);
                    let current = blocks_of(current);
                    if wanted.len() != current.len() {
                        true
                    } else {
                        for (i, (w, c)) in wanted.into_iter().zip(current).enumerate() {
                            schema.collect_changes(&format!("{}.{}.", path, i), w, c, true, changes);
                        }
                        false
                    }
                }
                (_, Some(current)) => wanted != current,
            };

            if differs {
                changes.push(Change {
                    path,
                    force_new: field.force_new,
                });
            }
        }
    }

    /// Check a configuration against this schema, reporting every problem
    pub fn validate(&self, attrs: &Map<String, Value>) -> Result<()> {
        let mut errors = Vec::new();
        self.collect_errors("", attrs, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ProviderError::Validation(errors.join("; ")))
        }
    }

    fn collect_errors(&self, prefix: &str, attrs: &Map<String, Value>, errors: &mut Vec<String>) {
        for name in attrs.keys() {
            if !self.fields.contains_key(name) {
                errors.push(format!("unsupported argument \"{}{}\"", prefix, name));
            }
        }

        for (name, field) in &self.fields {
            let path = format!("{}{}", prefix, name);
            let value = match attrs.get(name) {
                None | Some(Value::Null) => {
                    if field.required {
                        errors.push(format!("the argument \"{}\" is required", path));
                    }
                    continue;
                }
                Some(value) => value,
            };

            if !field.field_type.accepts(value) {
                errors.push(format!(
                    "{}: expected {}, got {}",
                    path,
                    field.field_type.describe(),
                    value
                ));
                continue;
            }

            match &field.field_type {
                FieldType::Block { schema, max_items } => {
                    let items = value.as_array().map(Vec::as_slice).unwrap_or_default();
                    if field.required && items.is_empty() {
                        errors.push(format!("at least 1 \"{}\" block is required", path));
                    }
                    if let Some(max) = max_items {
                        if items.len() > *max {
                            errors.push(format!(
                                "too many \"{}\" blocks: no more than {} allowed",
                                path, max
                            ));
                        }
                    }
                    for (i, item) in items.iter().enumerate() {
                        if let Some(block) = item.as_object() {
                            schema.collect_errors(&format!("{}.{}.", path, i), block, errors);
                        }
                    }
                }
                _ => {
                    let scalars: Vec<&Value> = match value {
                        Value::Array(items) => items.iter().collect(),
                        Value::Object(_) => Vec::new(),
                        other => vec![other],
                    };
                    for validation in &field.validations {
                        for scalar in &scalars {
                            if let Err(message) = validation.check(&path, scalar) {
                                errors.push(message);
                            }
                        }
                    }
                }
            }
        }
    }
}

fn set_of(value: &Value) -> Vec<&str> {
    let mut items: Vec<&str> = value
        .as_array()
        .map(|items| items.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();
    items.sort_unstable();
    items.dedup();
    items
}

fn blocks_of(value: &Value) -> Vec<&Map<String, Value>> {
    match value {
        Value::Array(items) => items.iter().filter_map(Value::as_object).collect(),
        Value::Object(map) => vec![map],
        _ => Vec::new(),
    }
}
