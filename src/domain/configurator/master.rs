//! The master parameter record.
//!
//! The master record is the normalized representation of what the user has
//! *asked for*, one parameter bag per component kind. It grows across turns
//! under a field-level last-write-wins merge and is only ever pruned by the
//! downstream-clear cascade.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::catalog::{ComponentKind, Product};

use super::normalize::vocabulary_for;

/// Normalized requirements for one component kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterBag {
    /// Attribute name → canonical value. Writes overwrite; attributes are
    /// never auto-deleted.
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    /// Free-text token naming a specific product, if the user mentioned one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direct_product_mention: Option<String>,
}

impl ParameterBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of attribute fields.
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty() && self.direct_product_mention.is_none()
    }

    /// True when the bag is enough to run a product search: at least one
    /// attribute or a direct product mention.
    pub fn is_searchable(&self) -> bool {
        !self.attributes.is_empty() || self.direct_product_mention.is_some()
    }

    /// Returns an attribute value.
    pub fn get(&self, attribute: &str) -> Option<&str> {
        self.attributes.get(attribute).map(String::as_str)
    }

    /// Writes an attribute (last write wins).
    pub fn set(&mut self, attribute: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(attribute.into(), value.into());
    }

    /// Applies a delta of attribute writes, field by field.
    pub fn merge(&mut self, updates: &BTreeMap<String, String>) {
        for (attribute, value) in updates {
            self.attributes.insert(attribute.clone(), value.clone());
        }
    }

    /// Resets the bag to empty.
    pub fn clear(&mut self) {
        self.attributes.clear();
        self.direct_product_mention = None;
    }
}

/// The full master record: one bag per component kind. Accessory subkinds
/// share a single bag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasterRecord {
    #[serde(default)]
    pub power_source: ParameterBag,
    #[serde(default)]
    pub feeder: ParameterBag,
    #[serde(default)]
    pub cooler: ParameterBag,
    #[serde(default)]
    pub interconnector: ParameterBag,
    #[serde(default)]
    pub torch: ParameterBag,
    #[serde(default)]
    pub accessories: ParameterBag,
}

impl MasterRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the bag for a component kind.
    pub fn bag(&self, kind: ComponentKind) -> &ParameterBag {
        match kind {
            ComponentKind::PowerSource => &self.power_source,
            ComponentKind::Feeder => &self.feeder,
            ComponentKind::Cooler => &self.cooler,
            ComponentKind::Interconnector => &self.interconnector,
            ComponentKind::Torch => &self.torch,
            ComponentKind::Accessory(_) => &self.accessories,
        }
    }

    /// Returns the mutable bag for a component kind.
    pub fn bag_mut(&mut self, kind: ComponentKind) -> &mut ParameterBag {
        match kind {
            ComponentKind::PowerSource => &mut self.power_source,
            ComponentKind::Feeder => &mut self.feeder,
            ComponentKind::Cooler => &mut self.cooler,
            ComponentKind::Interconnector => &mut self.interconnector,
            ComponentKind::Torch => &mut self.torch,
            ComponentKind::Accessory(_) => &mut self.accessories,
        }
    }

    /// Merges an extraction delta into one component's bag, last write wins
    /// per field. A direct mention never wipes existing attributes, and an
    /// attribute delta without a mention supersedes a mention from an
    /// earlier turn, so later searches filter on the fresh attributes
    /// instead of re-running a stale name lookup.
    pub fn merge_component(
        &mut self,
        kind: ComponentKind,
        updates: &BTreeMap<String, String>,
        direct_product_mention: Option<&str>,
    ) {
        let bag = self.bag_mut(kind);
        bag.merge(updates);
        match direct_product_mention {
            Some(mention) if !mention.trim().is_empty() => {
                bag.direct_product_mention = Some(mention.trim().to_string());
            }
            _ if !updates.is_empty() => bag.direct_product_mention = None,
            _ => {}
        }
    }

    /// Enriches a bag with attributes from a looked-up product without
    /// overwriting what the user already asked for. Only attributes in the
    /// kind's vocabulary are copied.
    pub fn enrich_from_product(&mut self, kind: ComponentKind, product: &Product) {
        let bag = self.bag_mut(kind);
        for attribute in vocabulary_for(kind) {
            if bag.attributes.contains_key(*attribute) {
                continue;
            }
            if let Some(value) = product.attribute_str(attribute) {
                bag.attributes.insert((*attribute).to_string(), value.to_string());
            }
        }
    }

    /// Zeroes the bag of a component kind (downstream-clear cascade).
    pub fn clear_kind(&mut self, kind: ComponentKind) {
        self.bag_mut(kind).clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::AccessoryKind;

    fn delta(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn merge_is_last_write_wins_per_field() {
        let mut master = MasterRecord::new();
        master.merge_component(
            ComponentKind::PowerSource,
            &delta(&[("current", "500 A"), ("process", "MIG (GMAW)")]),
            None,
        );
        master.merge_component(ComponentKind::PowerSource, &delta(&[("current", "300 A")]), None);

        let bag = master.bag(ComponentKind::PowerSource);
        assert_eq!(bag.get("current"), Some("300 A"));
        assert_eq!(bag.get("process"), Some("MIG (GMAW)"));
    }

    #[test]
    fn direct_mention_preserves_attributes() {
        let mut master = MasterRecord::new();
        master.merge_component(ComponentKind::Feeder, &delta(&[("wire_size", "0.035 inch")]), None);
        master.merge_component(ComponentKind::Feeder, &delta(&[]), Some("RobustFeed"));

        let bag = master.bag(ComponentKind::Feeder);
        assert_eq!(bag.get("wire_size"), Some("0.035 inch"));
        assert_eq!(bag.direct_product_mention.as_deref(), Some("RobustFeed"));
    }

    #[test]
    fn attribute_only_delta_clears_stale_mention() {
        let mut master = MasterRecord::new();
        master.merge_component(ComponentKind::PowerSource, &delta(&[]), Some("Aristo 500ix"));
        master.merge_component(ComponentKind::PowerSource, &delta(&[("current", "300 A")]), None);

        let bag = master.bag(ComponentKind::PowerSource);
        assert!(bag.direct_product_mention.is_none());
        assert_eq!(bag.get("current"), Some("300 A"));
    }

    #[test]
    fn empty_delta_without_mention_keeps_prior_mention() {
        let mut master = MasterRecord::new();
        master.merge_component(ComponentKind::Cooler, &delta(&[]), Some("Cool2"));
        master.merge_component(ComponentKind::Cooler, &delta(&[]), None);

        assert_eq!(
            master.bag(ComponentKind::Cooler).direct_product_mention.as_deref(),
            Some("Cool2")
        );
    }

    #[test]
    fn blank_mention_is_ignored() {
        let mut master = MasterRecord::new();
        master.merge_component(ComponentKind::Cooler, &delta(&[]), Some("   "));
        assert!(master.bag(ComponentKind::Cooler).direct_product_mention.is_none());
    }

    #[test]
    fn accessory_subkinds_share_one_bag() {
        let mut master = MasterRecord::new();
        master.merge_component(
            ComponentKind::Accessory(AccessoryKind::Remote),
            &delta(&[("cable_length", "25 ft")]),
            None,
        );

        let bag = master.bag(ComponentKind::Accessory(AccessoryKind::General));
        assert_eq!(bag.get("cable_length"), Some("25 ft"));
    }

    #[test]
    fn enrich_fills_only_missing_vocabulary_attributes() {
        let mut master = MasterRecord::new();
        master.merge_component(ComponentKind::PowerSource, &delta(&[("current", "300 A")]), None);

        let product = Product::new("1", "Aristo 500ix", ComponentKind::PowerSource)
            .with_attribute("current", "500 A")
            .with_attribute("voltage", "230V")
            .with_attribute("weight_kg", "47");
        master.enrich_from_product(ComponentKind::PowerSource, &product);

        let bag = master.bag(ComponentKind::PowerSource);
        // user's value wins over the product's
        assert_eq!(bag.get("current"), Some("300 A"));
        // vocabulary attribute copied from the product
        assert_eq!(bag.get("voltage"), Some("230V"));
        // non-vocabulary attribute not copied
        assert_eq!(bag.get("weight_kg"), None);
    }

    #[test]
    fn clear_kind_zeroes_bag() {
        let mut master = MasterRecord::new();
        master.merge_component(
            ComponentKind::Torch,
            &delta(&[("cooling_type", "water")]),
            Some("PSF 305"),
        );
        master.clear_kind(ComponentKind::Torch);

        assert!(master.bag(ComponentKind::Torch).is_empty());
    }

    #[test]
    fn searchable_requires_attribute_or_mention() {
        let mut bag = ParameterBag::new();
        assert!(!bag.is_searchable());

        bag.direct_product_mention = Some("Cool2".to_string());
        assert!(bag.is_searchable());

        let mut bag = ParameterBag::new();
        bag.set("cooling_type", "water");
        assert!(bag.is_searchable());
    }
}
