//! Compatibility anchor derivation.
//!
//! When searching for a component, the candidate must share a
//! `COMPATIBLE_WITH` edge with each *anchor*: specific earlier selections in
//! the cart. Which selections anchor which search is a fixed table; skipped
//! and not-applicable entries never constrain anything.

use serde::{Deserialize, Serialize};

use crate::domain::catalog::{AccessoryKind, ComponentKind};

use super::Cart;

/// One compatibility constraint: the candidate must be compatible with the
/// product identified by `gin`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anchor {
    pub kind: ComponentKind,
    pub gin: String,
}

impl Anchor {
    fn from_cart(cart: &Cart, kind: ComponentKind) -> Option<Anchor> {
        cart.selected(kind).map(|product| Anchor {
            kind,
            gin: product.gin.clone(),
        })
    }
}

/// The predicate handed to the product repository: a candidate satisfies it
/// iff it is compatible with every anchor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompatibilityPredicate {
    pub anchors: Vec<Anchor>,
}

impl CompatibilityPredicate {
    pub fn unconstrained() -> Self {
        Self::default()
    }

    pub fn is_unconstrained(&self) -> bool {
        self.anchors.is_empty()
    }

    /// The anchor gins, in table order.
    pub fn anchor_gins(&self) -> Vec<&str> {
        self.anchors.iter().map(|a| a.gin.as_str()).collect()
    }
}

/// Builds the compatibility predicate for searching `target` against the
/// current cart.
///
/// Anchor table:
///
/// | target           | anchors                                            |
/// |------------------|----------------------------------------------------|
/// | PowerSource      | none                                               |
/// | Feeder           | PowerSource                                        |
/// | Cooler           | PowerSource, Feeder?                               |
/// | Interconnector   | PowerSource, Feeder?, Cooler?                      |
/// | Torch            | Feeder? else PowerSource, and Cooler?              |
/// | PS accessory     | PowerSource                                        |
/// | Feeder accessory | Feeder                                             |
/// | Connectivity/Remote/General accessory | PowerSource, Feeder?          |
///
/// `?` marks anchors that only apply when that kind holds a selection.
pub fn anchors_for(target: ComponentKind, cart: &Cart) -> CompatibilityPredicate {
    let mut anchors = Vec::new();

    match target {
        ComponentKind::PowerSource => {}
        ComponentKind::Feeder => {
            anchors.extend(Anchor::from_cart(cart, ComponentKind::PowerSource));
        }
        ComponentKind::Cooler => {
            anchors.extend(Anchor::from_cart(cart, ComponentKind::PowerSource));
            anchors.extend(Anchor::from_cart(cart, ComponentKind::Feeder));
        }
        ComponentKind::Interconnector => {
            anchors.extend(Anchor::from_cart(cart, ComponentKind::PowerSource));
            anchors.extend(Anchor::from_cart(cart, ComponentKind::Feeder));
            anchors.extend(Anchor::from_cart(cart, ComponentKind::Cooler));
        }
        ComponentKind::Torch => {
            // A selected feeder supersedes the power source as the primary
            // anchor; the cooler constrains additionally when selected.
            let primary = Anchor::from_cart(cart, ComponentKind::Feeder)
                .or_else(|| Anchor::from_cart(cart, ComponentKind::PowerSource));
            anchors.extend(primary);
            anchors.extend(Anchor::from_cart(cart, ComponentKind::Cooler));
        }
        ComponentKind::Accessory(AccessoryKind::PowerSourceAccessory) => {
            anchors.extend(Anchor::from_cart(cart, ComponentKind::PowerSource));
        }
        ComponentKind::Accessory(AccessoryKind::FeederAccessory) => {
            anchors.extend(Anchor::from_cart(cart, ComponentKind::Feeder));
        }
        ComponentKind::Accessory(_) => {
            anchors.extend(Anchor::from_cart(cart, ComponentKind::PowerSource));
            anchors.extend(Anchor::from_cart(cart, ComponentKind::Feeder));
        }
    }

    CompatibilityPredicate { anchors }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::Product;

    fn cart_with(kinds: &[ComponentKind]) -> Cart {
        let mut cart = Cart::new();
        for kind in kinds {
            let gin = format!("{}-gin", kind.category().to_lowercase());
            cart.select(Product::new(gin, kind.category(), *kind)).unwrap();
        }
        cart
    }

    fn gins(predicate: &CompatibilityPredicate) -> Vec<&str> {
        predicate.anchor_gins()
    }

    #[test]
    fn power_source_search_is_unconstrained() {
        let cart = cart_with(&[ComponentKind::Feeder]);
        let predicate = anchors_for(ComponentKind::PowerSource, &cart);
        assert!(predicate.is_unconstrained());
    }

    #[test]
    fn feeder_anchors_on_power_source() {
        let cart = cart_with(&[ComponentKind::PowerSource]);
        let predicate = anchors_for(ComponentKind::Feeder, &cart);
        assert_eq!(gins(&predicate), vec!["powersource-gin"]);
    }

    #[test]
    fn interconnector_anchors_on_all_selected_upstream() {
        let cart = cart_with(&[
            ComponentKind::PowerSource,
            ComponentKind::Feeder,
            ComponentKind::Cooler,
        ]);
        let predicate = anchors_for(ComponentKind::Interconnector, &cart);
        assert_eq!(
            gins(&predicate),
            vec!["powersource-gin", "feeder-gin", "cooler-gin"]
        );
    }

    #[test]
    fn torch_prefers_feeder_over_power_source() {
        let cart = cart_with(&[ComponentKind::PowerSource, ComponentKind::Feeder]);
        let predicate = anchors_for(ComponentKind::Torch, &cart);
        assert_eq!(gins(&predicate), vec!["feeder-gin"]);
    }

    #[test]
    fn torch_falls_back_to_power_source_and_adds_cooler() {
        let cart = cart_with(&[ComponentKind::PowerSource, ComponentKind::Cooler]);
        let predicate = anchors_for(ComponentKind::Torch, &cart);
        assert_eq!(gins(&predicate), vec!["powersource-gin", "cooler-gin"]);
    }

    #[test]
    fn skipped_entries_contribute_no_anchor() {
        let mut cart = cart_with(&[ComponentKind::PowerSource]);
        cart.skip(ComponentKind::Feeder).unwrap();

        let predicate = anchors_for(ComponentKind::Cooler, &cart);
        assert_eq!(gins(&predicate), vec!["powersource-gin"]);
    }

    #[test]
    fn accessory_subkinds_use_their_own_anchor_rows() {
        let cart = cart_with(&[ComponentKind::PowerSource, ComponentKind::Feeder]);

        let ps_acc = anchors_for(
            ComponentKind::Accessory(AccessoryKind::PowerSourceAccessory),
            &cart,
        );
        assert_eq!(gins(&ps_acc), vec!["powersource-gin"]);

        let feeder_acc =
            anchors_for(ComponentKind::Accessory(AccessoryKind::FeederAccessory), &cart);
        assert_eq!(gins(&feeder_acc), vec!["feeder-gin"]);

        let remote = anchors_for(ComponentKind::Accessory(AccessoryKind::Remote), &cart);
        assert_eq!(gins(&remote), vec!["powersource-gin", "feeder-gin"]);
    }
}
