//! Product Repository Port - catalogue lookup and compatibility search.
//!
//! Three query shapes, all bounded and availability-filtered:
//!
//! 1. product-by-name, for direct product mentions;
//! 2. compatibility-filtered attribute search;
//! 3. compatibility-only search, the fallback when (2) finds nothing.
//!
//! The repository never mutates the catalogue.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::catalog::{ComponentKind, Product};
use crate::domain::configurator::{CompatibilityPredicate, ParameterBag};

/// Every repository query is capped at this many results.
pub const RESULT_CAP: usize = 5;

/// One attribute filter: OR over `values`, AND across filters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeFilter {
    pub attribute: String,
    pub values: Vec<String>,
}

impl AttributeFilter {
    /// Builds the filter set for a parameter bag, expanding measurement
    /// tokens into their word-boundary set.
    pub fn from_bag(bag: &ParameterBag) -> Vec<AttributeFilter> {
        bag.attributes
            .iter()
            .map(|(attribute, value)| AttributeFilter {
                attribute: attribute.clone(),
                values: expand_measurement_terms(value),
            })
            .collect()
    }
}

static MEASUREMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)( ?)([A-Za-z]+)$").unwrap());

/// Expands a measurement token into a leading-space word-boundary set so a
/// substring match on `"5m"` cannot land inside `"15.0m"`:
/// `"5m"` → `[" 5m", " 5.0m"]`. Non-measurement values pass through
/// unchanged.
pub fn expand_measurement_terms(value: &str) -> Vec<String> {
    match MEASUREMENT_RE.captures(value) {
        Some(caps) => {
            let number = &caps[1];
            let space = &caps[2];
            let unit = &caps[3];
            vec![
                format!(" {number}{space}{unit}"),
                format!(" {number}.0{space}{unit}"),
            ]
        }
        None => vec![value.to_string()],
    }
}

/// Result of an attribute search, tagged when the compatibility-only
/// fallback produced it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchOutcome {
    pub products: Vec<Product>,
    pub fallback: bool,
}

/// Repository failures. All variants are transport-level; an empty result
/// set is not an error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RepositoryError {
    #[error("product graph unavailable: {0}")]
    Unavailable(String),

    #[error("graph query timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("graph query failed: {0}")]
    QueryFailed(String),
}

/// Port for compatibility-constrained product search.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Fuzzy name lookup for direct product mentions. Ties break by
    /// alphabetic order of canonical name. Capped at [`RESULT_CAP`].
    async fn lookup_by_name(
        &self,
        kind: ComponentKind,
        raw_name: &str,
    ) -> Result<Vec<Product>, RepositoryError>;

    /// Attribute-filtered search under a compatibility predicate. Attribute
    /// match is a case-insensitive substring over name, description, and
    /// embedding text; OR within one attribute's values, AND across
    /// attributes; only available products. Capped at [`RESULT_CAP`].
    async fn search(
        &self,
        kind: ComponentKind,
        bag: &ParameterBag,
        predicate: &CompatibilityPredicate,
    ) -> Result<Vec<Product>, RepositoryError>;

    /// Compatibility-only search, dropping attribute filters. Capped at
    /// [`RESULT_CAP`].
    async fn find_all_compatible(
        &self,
        kind: ComponentKind,
        predicate: &CompatibilityPredicate,
    ) -> Result<Vec<Product>, RepositoryError>;

    /// Attribute search with the internal fallback rule: when the filtered
    /// search is empty and filters were non-empty, rerun compatibility-only
    /// and tag the outcome.
    async fn search_with_fallback(
        &self,
        kind: ComponentKind,
        bag: &ParameterBag,
        predicate: &CompatibilityPredicate,
    ) -> Result<SearchOutcome, RepositoryError> {
        let products = self.search(kind, bag, predicate).await?;
        if products.is_empty() && !bag.attributes.is_empty() {
            let products = self.find_all_compatible(kind, predicate).await?;
            return Ok(SearchOutcome { products, fallback: true });
        }
        Ok(SearchOutcome { products, fallback: false })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn measurement_tokens_expand_with_leading_space() {
        assert_eq!(expand_measurement_terms("5m"), vec![" 5m", " 5.0m"]);
        assert_eq!(expand_measurement_terms("25 ft"), vec![" 25 ft", " 25.0 ft"]);
    }

    #[test]
    fn non_measurement_values_pass_through() {
        assert_eq!(expand_measurement_terms("MIG (GMAW)"), vec!["MIG (GMAW)"]);
        assert_eq!(expand_measurement_terms("water"), vec!["water"]);
        assert_eq!(expand_measurement_terms("0.035 inch"), vec!["0.035 inch"]);
    }

    #[test]
    fn expansion_prevents_suffix_collisions() {
        // " 5m" must not be found inside "15.0m" or "15m"
        for term in expand_measurement_terms("5m") {
            assert!(!"cable 15.0m".contains(&term));
            assert!(!"cable 15m".contains(&term));
            assert!("cable 5.0m".contains(&term) || "cable 5m".contains(&term));
        }
    }

    #[test]
    fn filters_expand_per_attribute() {
        let mut bag = ParameterBag::new();
        bag.set("cable_length", "5m");
        bag.set("cooling_type", "water");

        let filters = AttributeFilter::from_bag(&bag);
        assert_eq!(filters.len(), 2);

        let cable = filters.iter().find(|f| f.attribute == "cable_length").unwrap();
        assert_eq!(cable.values.len(), 2);

        let cooling = filters.iter().find(|f| f.attribute == "cooling_type").unwrap();
        assert_eq!(cooling.values, vec!["water"]);
    }
}
