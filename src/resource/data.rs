//! Local declarative record of one resource.
//!
//! A [`ResourceData`] is what the hosting caller persists between runs: the
//! encoded composite identifier (absent while the record is unbound) and the
//! declared/observed field values keyed by field name.

use crate::error::CrudError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(default)]
    fields: BTreeMap<String, Value>,
}

impl ResourceData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record seeded from declared field values
    pub fn from_fields(fields: Map<String, Value>) -> Self {
        Self {
            id: None,
            fields: fields.into_iter().collect(),
        }
    }

    /// Encoded composite identifier, if bound
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn is_bound(&self) -> bool {
        self.id.is_some()
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = Some(id.into());
    }

    pub fn clear_id(&mut self) {
        self.id = None;
    }

    pub fn fields(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }

    /// Raw value, including explicit nulls and zero values
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Value only if it is set to something other than its zero value.
    /// `null`, `""`, `0`, `false`, `[]` and `{}` all count as not set.
    pub fn get_ok(&self, key: &str) -> Option<&Value> {
        self.fields.get(key).filter(|v| !is_zero(v))
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get_ok(key).and_then(Value::as_str)
    }

    /// Booleans are read with [`Self::get`] since `false` is meaningful
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    /// Declared string. `null` and `""` count as not set; any other
    /// non-string value is rejected.
    pub fn try_str(&self, key: &str) -> Result<Option<&str>, CrudError> {
        Ok(self
            .typed(key, "a string", Value::as_str)?
            .filter(|s| !s.is_empty()))
    }

    pub fn try_bool(&self, key: &str) -> Result<Option<bool>, CrudError> {
        self.typed(key, "a boolean", Value::as_bool)
    }

    /// Declared integer; `0` is kept
    pub fn try_i64(&self, key: &str) -> Result<Option<i64>, CrudError> {
        self.typed(key, "an integer", Value::as_i64)
    }

    /// Declared non-negative integer; `0` counts as not set
    pub fn try_u64(&self, key: &str) -> Result<Option<u64>, CrudError> {
        Ok(self
            .typed(key, "a non-negative integer", Value::as_u64)?
            .filter(|v| *v != 0))
    }

    /// Declared non-empty list of strings. A list holding anything other
    /// than strings is rejected as a whole.
    pub fn try_string_list(&self, key: &str) -> Result<Option<Vec<String>>, CrudError> {
        let list = self.typed(key, "a list of strings", |value| {
            value
                .as_array()?
                .iter()
                .map(|item| item.as_str().map(String::from))
                .collect::<Option<Vec<_>>>()
        })?;
        Ok(list.filter(|items| !items.is_empty()))
    }

    /// `None` when absent or `null`, otherwise `extract` must accept the value
    fn typed<'a, T>(
        &'a self,
        key: &str,
        expected: &str,
        extract: impl FnOnce(&'a Value) -> Option<T>,
    ) -> Result<Option<T>, CrudError> {
        match self.fields.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => extract(value).map(Some).ok_or_else(|| {
                CrudError::Validation(format!("{key} must be {expected}, got {value}"))
            }),
        }
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.fields.insert(key.to_string(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.remove(key)
    }
}

fn is_zero(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data(value: Value) -> ResourceData {
        match value {
            Value::Object(map) => ResourceData::from_fields(map),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_get_ok_skips_zero_values() {
        let d = data(json!({
            "name": "",
            "tags": [],
            "regex_priority": 0,
            "headers": {},
            "username": null,
            "custom_id": "c-1"
        }));
        for key in ["name", "tags", "regex_priority", "headers", "username", "missing"] {
            assert!(d.get_ok(key).is_none(), "{key} should not be set");
        }
        assert_eq!(d.get_str("custom_id"), Some("c-1"));
    }

    #[test]
    fn test_get_bool_keeps_false() {
        let d = data(json!({ "strip_path": false }));
        assert_eq!(d.get_bool("strip_path"), Some(false));
        assert!(d.get_ok("strip_path").is_none());
    }

    #[test]
    fn test_string_list() {
        let d = data(json!({ "paths": ["/foo", "/bar"], "hosts": [] }));
        assert_eq!(
            d.try_string_list("paths").unwrap(),
            Some(vec!["/foo".to_string(), "/bar".to_string()])
        );
        assert_eq!(d.try_string_list("hosts").unwrap(), None);
        assert_eq!(d.try_string_list("missing").unwrap(), None);
    }

    #[test]
    fn test_mistyped_values_are_rejected() {
        let d = data(json!({
            "paths": ["/foo", 42],
            "methods": "GET",
            "https_redirect_status_code": "301",
            "regex_priority": "5",
            "strip_path": "yes",
            "name": 7,
            "port": -1
        }));

        for err in [
            d.try_string_list("paths").unwrap_err(),
            d.try_string_list("methods").unwrap_err(),
            d.try_u64("https_redirect_status_code").unwrap_err(),
            d.try_i64("regex_priority").unwrap_err(),
            d.try_bool("strip_path").unwrap_err(),
            d.try_str("name").unwrap_err(),
            d.try_u64("port").unwrap_err(),
        ] {
            assert!(matches!(err, CrudError::Validation(_)), "{err}");
        }
    }

    #[test]
    fn test_null_and_zero_values() {
        let d = data(json!({
            "name": null,
            "path": "",
            "regex_priority": 0,
            "port": 0,
            "strip_path": false
        }));
        assert_eq!(d.try_str("name").unwrap(), None);
        assert_eq!(d.try_str("path").unwrap(), None);
        assert_eq!(d.try_i64("regex_priority").unwrap(), Some(0));
        assert_eq!(d.try_u64("port").unwrap(), None);
        assert_eq!(d.try_bool("strip_path").unwrap(), Some(false));
    }

    #[test]
    fn test_id_lifecycle() {
        let mut d = ResourceData::new();
        assert!(!d.is_bound());
        d.set_id("g1::r1");
        assert_eq!(d.id(), Some("g1::r1"));
        d.clear_id();
        assert_eq!(d.id(), None);
    }

    #[test]
    fn test_unbound_record_serializes_without_id() {
        let mut d = ResourceData::new();
        d.set("name", "foo");
        let encoded = serde_json::to_value(&d).unwrap();
        assert_eq!(encoded, json!({ "fields": { "name": "foo" } }));
    }
}
