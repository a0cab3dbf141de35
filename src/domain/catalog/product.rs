//! Immutable product snapshot.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::ComponentKind;

/// A catalogue product as returned by the product graph.
///
/// Products are read-only from the configurator's perspective; a `Product`
/// held in the cart is a snapshot taken at selection time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Opaque catalogue identifier.
    pub gin: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub kind: ComponentKind,
    /// Typed attribute bag (specifications) keyed by attribute name.
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}

impl Product {
    /// Creates a product snapshot with an empty attribute bag.
    pub fn new(gin: impl Into<String>, name: impl Into<String>, kind: ComponentKind) -> Self {
        Self {
            gin: gin.into(),
            name: name.into(),
            description: None,
            kind,
            attributes: BTreeMap::new(),
            available: true,
        }
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Adds an attribute.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Marks the product unavailable.
    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    /// Returns a string attribute, if present and a string.
    pub fn attribute_str(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).and_then(Value::as_str)
    }

    /// Normalized form of the name used for fuzzy matching: lowercase with
    /// whitespace removed.
    pub fn normalized_name(&self) -> String {
        normalize_product_name(&self.name)
    }

    /// Returns true if `raw` fuzzily names this product (either normalized
    /// form contains the other).
    pub fn name_matches(&self, raw: &str) -> bool {
        let candidate = self.normalized_name();
        let mention = normalize_product_name(raw);
        if mention.is_empty() {
            return false;
        }
        candidate.contains(&mention) || mention.contains(&candidate)
    }
}

/// Lowercases and strips whitespace for name comparison.
pub fn normalize_product_name(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aristo() -> Product {
        Product::new("0446200880", "Aristo 500ix", ComponentKind::PowerSource)
            .with_description("500 A MIG (GMAW) power source, 3-phase")
            .with_attribute("current", "500 A")
    }

    #[test]
    fn builder_sets_fields() {
        let p = aristo();
        assert_eq!(p.gin, "0446200880");
        assert_eq!(p.attribute_str("current"), Some("500 A"));
        assert!(p.available);
    }

    #[test]
    fn name_matching_ignores_case_and_spacing() {
        let p = aristo();
        assert!(p.name_matches("aristo500ix"));
        assert!(p.name_matches("ARISTO 500ix"));
        assert!(p.name_matches("Aristo"));
    }

    #[test]
    fn name_matching_rejects_unrelated_names() {
        let p = aristo();
        assert!(!p.name_matches("Warrior 400i"));
        assert!(!p.name_matches(""));
    }

    #[test]
    fn serializes_with_snake_case_kind() {
        let json = serde_json::to_string(&aristo()).unwrap();
        assert!(json.contains("\"kind\":\"power_source\""));
    }

    #[test]
    fn missing_available_defaults_to_true() {
        let p: Product = serde_json::from_str(
            r#"{"gin":"1","name":"Cool2","kind":"cooler"}"#,
        )
        .unwrap();
        assert!(p.available);
    }
}
