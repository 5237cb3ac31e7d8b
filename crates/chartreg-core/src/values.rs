//! Configuration trees with deep merge support
//!
//! `Values` is the unit the merge engine operates on: a nested mapping of
//! string keys to scalars, sequences or further mappings. The merge rules
//! follow the Helm coalesce behavior, including null-deletes.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::path::Path;

use crate::error::{CoreError, Result};

/// Configuration tree with deep merge capability
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Values(pub JsonValue);

impl Values {
    /// Create an empty tree
    pub fn new() -> Self {
        Self(JsonValue::Object(serde_json::Map::new()))
    }

    /// Load values from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse values from a YAML string
    ///
    /// An empty document parses to an empty tree, not null.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let value: JsonValue = serde_yaml::from_str(yaml)?;
        match value {
            JsonValue::Null => Ok(Self::new()),
            other => Ok(Self(other)),
        }
    }

    /// Parse values from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let value: JsonValue = serde_json::from_str(json)?;
        Ok(Self(value))
    }

    /// Deep merge an overlay into this tree, overlay wins
    ///
    /// Rules:
    /// - Mappings: merged recursively, key by key
    /// - Scalars and sequences: overlay replaces base wholesale
    /// - An explicit `null` in the overlay deletes the key from the result
    pub fn merge(&mut self, overlay: &Values) {
        deep_merge(&mut self.0, &overlay.0);
    }

    /// Fold the three configuration tiers into a final tree
    ///
    /// Precedence, highest wins: `component` > `platform` > `chart_defaults`.
    /// The fold is applied exactly twice: platform onto chart defaults, then
    /// component onto that result.
    pub fn merge_layers(chart_defaults: &Values, platform: &Values, component: &Values) -> Values {
        let mut result = chart_defaults.clone();
        result.merge(platform);
        result.merge(component);
        result
    }

    /// Set a value by dotted path (e.g. "image.tag")
    pub fn set(&mut self, path: &str, value: JsonValue) -> Result<()> {
        let parts: Vec<&str> = path.split('.').collect();
        set_nested(&mut self.0, &parts, value)
    }

    /// Get a value by dotted path
    pub fn get(&self, path: &str) -> Option<&JsonValue> {
        let parts: Vec<&str> = path.split('.').collect();
        get_nested(&self.0, &parts)
    }

    /// Borrow the inner JSON value
    pub fn inner(&self) -> &JsonValue {
        &self.0
    }

    /// Convert into the inner JSON value
    pub fn into_inner(self) -> JsonValue {
        self.0
    }

    /// Check if the tree is empty
    pub fn is_empty(&self) -> bool {
        match &self.0 {
            JsonValue::Object(map) => map.is_empty(),
            JsonValue::Null => true,
            _ => false,
        }
    }
}

/// Deep merge two JSON values, overlay wins
///
/// A null overlay value inside a mapping removes the key entirely instead of
/// shadowing the base value. Keys only present in the base are kept.
fn deep_merge(base: &mut JsonValue, overlay: &JsonValue) {
    match (base, overlay) {
        (JsonValue::Object(base_map), JsonValue::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                if overlay_value.is_null() {
                    base_map.remove(key);
                    continue;
                }
                match base_map.get_mut(key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => {
                        base_map.insert(key.clone(), overlay_value.clone());
                    }
                }
            }
        }
        (base, overlay) => {
            *base = overlay.clone();
        }
    }
}

/// Set a nested value by path
fn set_nested(value: &mut JsonValue, path: &[&str], new_value: JsonValue) -> Result<()> {
    if path.is_empty() {
        *value = new_value;
        return Ok(());
    }

    let key = path[0];
    let remaining = &path[1..];

    if key.is_empty() {
        return Err(CoreError::Values {
            message: "empty key segment in path".to_string(),
        });
    }

    if !value.is_object() {
        *value = JsonValue::Object(serde_json::Map::new());
    }

    // SAFETY: just ensured it's an object above
    let map = value
        .as_object_mut()
        .expect("value should be an object after initialization");

    if remaining.is_empty() {
        map.insert(key.to_string(), new_value);
    } else {
        let entry = map
            .entry(key.to_string())
            .or_insert_with(|| JsonValue::Object(serde_json::Map::new()));
        set_nested(entry, remaining, new_value)?;
    }

    Ok(())
}

/// Get a nested value by path
fn get_nested<'a>(value: &'a JsonValue, path: &[&str]) -> Option<&'a JsonValue> {
    if path.is_empty() {
        return Some(value);
    }

    match value {
        JsonValue::Object(map) => map
            .get(path[0])
            .and_then(|v| get_nested(v, &path[1..])),
        _ => None,
    }
}
