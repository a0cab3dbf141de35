//! The response cart: what the user has actually selected.

use serde::{Deserialize, Serialize};

use crate::domain::catalog::{ComponentKind, Product};
use crate::domain::foundation::DomainError;

/// One cart slot outcome.
///
/// A `Selected` entry is locked: it is only replaced through an explicit
/// user replacement, which triggers the downstream-clear cascade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CartEntry {
    Selected { product: Product },
    Skipped,
    NotApplicable,
}

impl CartEntry {
    pub fn is_selected(&self) -> bool {
        matches!(self, CartEntry::Selected { .. })
    }

    pub fn product(&self) -> Option<&Product> {
        match self {
            CartEntry::Selected { product } => Some(product),
            _ => None,
        }
    }
}

/// The cart across all component kinds. Single-valued kinds hold one
/// optional entry (`None` = not yet visited); accessories accumulate an
/// ordered list of entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power_source: Option<CartEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feeder: Option<CartEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooler: Option<CartEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interconnector: Option<CartEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub torch: Option<CartEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub accessories: Vec<CartEntry>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, kind: ComponentKind) -> Option<&Option<CartEntry>> {
        match kind {
            ComponentKind::PowerSource => Some(&self.power_source),
            ComponentKind::Feeder => Some(&self.feeder),
            ComponentKind::Cooler => Some(&self.cooler),
            ComponentKind::Interconnector => Some(&self.interconnector),
            ComponentKind::Torch => Some(&self.torch),
            ComponentKind::Accessory(_) => None,
        }
    }

    fn slot_mut(&mut self, kind: ComponentKind) -> Option<&mut Option<CartEntry>> {
        match kind {
            ComponentKind::PowerSource => Some(&mut self.power_source),
            ComponentKind::Feeder => Some(&mut self.feeder),
            ComponentKind::Cooler => Some(&mut self.cooler),
            ComponentKind::Interconnector => Some(&mut self.interconnector),
            ComponentKind::Torch => Some(&mut self.torch),
            ComponentKind::Accessory(_) => None,
        }
    }

    /// Returns the entry for a single-valued kind.
    pub fn entry(&self, kind: ComponentKind) -> Option<&CartEntry> {
        self.slot(kind).and_then(|slot| slot.as_ref())
    }

    /// Returns the selected product for a single-valued kind, if any.
    pub fn selected(&self, kind: ComponentKind) -> Option<&Product> {
        self.entry(kind).and_then(CartEntry::product)
    }

    /// Returns the selected accessory products, in selection order.
    pub fn selected_accessories(&self) -> Vec<&Product> {
        self.accessories
            .iter()
            .filter_map(CartEntry::product)
            .collect()
    }

    /// Commits a product into the cart.
    ///
    /// For single-valued kinds this overwrites the slot (the caller is
    /// responsible for running the cascade when the slot already held a
    /// selection); for accessories it appends.
    pub fn select(&mut self, product: Product) -> Result<(), DomainError> {
        if product.kind.is_accessory() {
            self.accessories.push(CartEntry::Selected { product });
            return Ok(());
        }
        let kind = product.kind;
        let slot = self
            .slot_mut(kind)
            .ok_or_else(|| DomainError::integrity("no cart slot for kind"))?;
        *slot = Some(CartEntry::Selected { product });
        Ok(())
    }

    /// Marks a kind skipped. The power source is mandatory and may never be
    /// skipped.
    pub fn skip(&mut self, kind: ComponentKind) -> Result<(), DomainError> {
        if kind == ComponentKind::PowerSource {
            return Err(DomainError::integrity("PowerSource cannot be skipped"));
        }
        match self.slot_mut(kind) {
            Some(slot) => {
                // A locked selection is not silently discarded by a skip.
                if slot.as_ref().is_some_and(CartEntry::is_selected) {
                    return Ok(());
                }
                *slot = Some(CartEntry::Skipped);
            }
            // Skipping accessories just moves on without a marker entry.
            None => {}
        }
        Ok(())
    }

    /// Marks a kind not applicable per the power source's applicability.
    pub fn mark_not_applicable(&mut self, kind: ComponentKind) -> Result<(), DomainError> {
        if kind == ComponentKind::PowerSource {
            return Err(DomainError::integrity("PowerSource cannot be marked not applicable"));
        }
        match self.slot_mut(kind) {
            Some(slot) => *slot = Some(CartEntry::NotApplicable),
            None => self.accessories = vec![CartEntry::NotApplicable],
        }
        Ok(())
    }

    /// Resets a kind to unset (downstream-clear cascade).
    pub fn reset(&mut self, kind: ComponentKind) {
        match self.slot_mut(kind) {
            Some(slot) => *slot = None,
            None => self.accessories.clear(),
        }
    }

    /// The real-component count: `Selected` entries, accessories counted
    /// individually.
    pub fn selected_count(&self) -> usize {
        let singles = ComponentKind::single_valued()
            .iter()
            .filter(|kind| self.selected(**kind).is_some())
            .count();
        singles + self.selected_accessories().len()
    }

    /// Iterates every entry currently in the cart (single slots first, then
    /// accessories in order).
    pub fn entries(&self) -> impl Iterator<Item = (ComponentKind, &CartEntry)> {
        ComponentKind::single_valued()
            .iter()
            .filter_map(|kind| self.entry(*kind).map(|entry| (*kind, entry)))
            .chain(self.accessories.iter().map(|entry| {
                let kind = entry
                    .product()
                    .map(|p| p.kind)
                    .unwrap_or(ComponentKind::Accessory(
                        crate::domain::catalog::AccessoryKind::General,
                    ));
                (kind, entry)
            }))
    }
}
