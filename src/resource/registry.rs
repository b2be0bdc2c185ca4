//! Resource Registry - Load resource definitions from JSON
//!
//! Display metadata for every managed resource kind (names, list columns) is
//! kept in an embedded JSON file and looked up by collection name.

use super::dispatch::ResourceKind;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Embedded resource definitions (compiled into the binary)
const RESOURCE_FILE: &str = include_str!("../resources/konnect.json");

/// Column definition from JSON
#[derive(Debug, Clone, Deserialize)]
pub struct ColumnDef {
    pub header: String,
    pub json_path: String,
    pub width: u16,
}

/// Resource definition from JSON
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceDef {
    pub kind: ResourceKind,
    pub display_name: String,
    pub columns: Vec<ColumnDef>,
}

/// Root structure of resources/konnect.json
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceConfig {
    #[serde(default)]
    pub resources: BTreeMap<String, ResourceDef>,
}

/// Global registry loaded from JSON
static REGISTRY: OnceLock<ResourceConfig> = OnceLock::new();

/// Get the resource registry (loads from embedded JSON on first access)
pub fn get_registry() -> &'static ResourceConfig {
    REGISTRY.get_or_init(|| {
        serde_json::from_str(RESOURCE_FILE)
            .unwrap_or_else(|e| panic!("Failed to parse embedded resource JSON: {}", e))
    })
}

/// Get a resource definition by collection name
pub fn get_resource(key: &str) -> Option<&'static ResourceDef> {
    get_registry().resources.get(key)
}

/// Definition for a resource kind
pub fn resource_for_kind(kind: ResourceKind) -> Option<&'static ResourceDef> {
    get_resource(kind.plural())
}

/// Get all resource keys (for help output)
pub fn get_all_resource_keys() -> Vec<&'static str> {
    get_registry()
        .resources
        .keys()
        .map(|s| s.as_str())
        .collect()
}

/// Extract a display value from JSON using a dot-notation path
pub fn extract_json_value(item: &Value, path: &str) -> String {
    let mut current = item;

    for part in path.split('.') {
        // Handle array index
        let next = match part.parse::<usize>() {
            Ok(idx) => current.get(idx),
            Err(_) => current.get(part),
        };
        current = match next {
            Some(v) => v,
            None => return "-".to_string(),
        };
    }

    match current {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "-".to_string(),
        Value::Array(arr) => format!("[{} items]", arr.len()),
        Value::Object(_) => "[object]".to_string(),
    }
}

/// Render items as a fixed-width table using the kind's columns
pub fn render_table(def: &ResourceDef, items: &[Value]) -> String {
    let mut out = String::new();
    let header: Vec<String> = def
        .columns
        .iter()
        .map(|c| pad(&c.header, c.width))
        .collect();
    out.push_str(header.join("  ").trim_end());
    out.push('\n');

    for item in items {
        let row: Vec<String> = def
            .columns
            .iter()
            .map(|c| pad(&extract_json_value(item, &c.json_path), c.width))
            .collect();
        out.push_str(row.join("  ").trim_end());
        out.push('\n');
    }
    out
}

fn pad(value: &str, width: u16) -> String {
    let width = width as usize;
    let truncated: String = value.chars().take(width).collect();
    format!("{:<width$}", truncated, width = width)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_registry_loads_successfully() {
        let registry = get_registry();
        assert!(
            !registry.resources.is_empty(),
            "Registry should have resources"
        );
    }

    #[test]
    fn test_every_kind_has_a_definition() {
        for kind in ResourceKind::ALL {
            let def = resource_for_kind(kind);
            assert!(def.is_some(), "{kind} should be registered");
            assert_eq!(def.unwrap().kind, kind);
        }
    }

    #[test]
    fn test_get_all_resource_keys() {
        let keys = get_all_resource_keys();
        assert!(keys.contains(&"routes"), "Should contain routes");
        assert!(keys.contains(&"consumers"), "Should contain consumers");
    }

    #[test]
    fn test_extract_json_value_paths() {
        let item = json!({
            "id": "r1",
            "paths": ["/a", "/b"],
            "service": { "id": "s1" },
            "port": 8080,
            "name": null
        });
        assert_eq!(extract_json_value(&item, "service.id"), "s1");
        assert_eq!(extract_json_value(&item, "paths.1"), "/b");
        assert_eq!(extract_json_value(&item, "paths"), "[2 items]");
        assert_eq!(extract_json_value(&item, "port"), "8080");
        assert_eq!(extract_json_value(&item, "name"), "-");
        assert_eq!(extract_json_value(&item, "missing.path"), "-");
    }

    #[test]
    fn test_render_table() {
        let def = resource_for_kind(ResourceKind::Consumer).unwrap();
        let table = render_table(def, &[json!({ "id": "c1", "username": "alice" })]);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("ID"));
        assert!(lines[1].starts_with("c1"));
        assert!(lines[1].contains("alice"));
    }
}
