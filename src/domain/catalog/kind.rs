//! Component kind vocabulary.
//!
//! Component kinds form a closed set. Accessories carry a subkind because
//! their compatibility anchors and catalogue categories differ per subkind;
//! everywhere the flow treats accessories as one slot, the subkind is
//! irrelevant and `is_accessory()` is what matters.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Accessory subkinds as they appear in the catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessoryKind {
    PowerSourceAccessory,
    FeederAccessory,
    ConnectivityAccessory,
    Remote,
    /// Uncategorized accessories.
    General,
}

impl AccessoryKind {
    /// Returns the catalogue category label for this subkind.
    pub fn category(&self) -> &'static str {
        match self {
            AccessoryKind::PowerSourceAccessory => "PowerSourceAccessory",
            AccessoryKind::FeederAccessory => "FeederAccessory",
            AccessoryKind::ConnectivityAccessory => "ConnectivityAccessory",
            AccessoryKind::Remote => "Remote",
            AccessoryKind::General => "Accessory",
        }
    }

    /// Best-effort mapping from a free-form `accessory_type` token.
    pub fn from_token(token: &str) -> Self {
        let token = token.to_lowercase();
        if token.contains("remote") {
            AccessoryKind::Remote
        } else if token.contains("power") {
            AccessoryKind::PowerSourceAccessory
        } else if token.contains("feed") {
            AccessoryKind::FeederAccessory
        } else if token.contains("connect") {
            AccessoryKind::ConnectivityAccessory
        } else {
            AccessoryKind::General
        }
    }
}

/// The closed set of component kinds in a configuration.
///
/// `Accessory` is the only multi-valued kind; all others hold at most one
/// cart entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    PowerSource,
    Feeder,
    Cooler,
    Interconnector,
    Torch,
    Accessory(AccessoryKind),
}

impl ComponentKind {
    /// Returns the single-valued kinds in their S1→S5 selection order.
    pub fn single_valued() -> &'static [ComponentKind] {
        &[
            ComponentKind::PowerSource,
            ComponentKind::Feeder,
            ComponentKind::Cooler,
            ComponentKind::Interconnector,
            ComponentKind::Torch,
        ]
    }

    /// Returns true for any accessory subkind.
    pub fn is_accessory(&self) -> bool {
        matches!(self, ComponentKind::Accessory(_))
    }

    /// Returns true for kinds that hold at most one cart entry.
    pub fn is_single_valued(&self) -> bool {
        !self.is_accessory()
    }

    /// Returns the catalogue category label used by the product graph.
    pub fn category(&self) -> &'static str {
        match self {
            ComponentKind::PowerSource => "PowerSource",
            ComponentKind::Feeder => "Feeder",
            ComponentKind::Cooler => "Cooler",
            ComponentKind::Interconnector => "Interconnector",
            ComponentKind::Torch => "Torch",
            ComponentKind::Accessory(sub) => sub.category(),
        }
    }

    /// Parses a catalogue category label.
    pub fn from_category(category: &str) -> Option<ComponentKind> {
        match category {
            "PowerSource" => Some(ComponentKind::PowerSource),
            "Feeder" => Some(ComponentKind::Feeder),
            "Cooler" => Some(ComponentKind::Cooler),
            "Interconnector" => Some(ComponentKind::Interconnector),
            "Torch" => Some(ComponentKind::Torch),
            "PowerSourceAccessory" => {
                Some(ComponentKind::Accessory(AccessoryKind::PowerSourceAccessory))
            }
            "FeederAccessory" => Some(ComponentKind::Accessory(AccessoryKind::FeederAccessory)),
            "ConnectivityAccessory" => {
                Some(ComponentKind::Accessory(AccessoryKind::ConnectivityAccessory))
            }
            "Remote" => Some(ComponentKind::Accessory(AccessoryKind::Remote)),
            "Accessory" => Some(ComponentKind::Accessory(AccessoryKind::General)),
            _ => None,
        }
    }

    /// Returns the master-record key for this kind (accessory subkinds share
    /// one bag).
    pub fn master_key(&self) -> &'static str {
        match self {
            ComponentKind::PowerSource => "power_source",
            ComponentKind::Feeder => "feeder",
            ComponentKind::Cooler => "cooler",
            ComponentKind::Interconnector => "interconnector",
            ComponentKind::Torch => "torch",
            ComponentKind::Accessory(_) => "accessories",
        }
    }

    /// Parses a master-record key. Accessories resolve to the general
    /// subkind.
    pub fn from_master_key(key: &str) -> Option<ComponentKind> {
        match key {
            "power_source" => Some(ComponentKind::PowerSource),
            "feeder" => Some(ComponentKind::Feeder),
            "cooler" => Some(ComponentKind::Cooler),
            "interconnector" => Some(ComponentKind::Interconnector),
            "torch" => Some(ComponentKind::Torch),
            "accessories" => Some(ComponentKind::Accessory(AccessoryKind::General)),
            _ => None,
        }
    }

    /// Returns the user-facing display name.
    pub fn display_name(&self) -> &'static str {
        match self {
            ComponentKind::PowerSource => "Power Source",
            ComponentKind::Feeder => "Wire Feeder",
            ComponentKind::Cooler => "Cooling System",
            ComponentKind::Interconnector => "Interconnector",
            ComponentKind::Torch => "Torch",
            ComponentKind::Accessory(_) => "Accessories",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_valued_has_five_kinds_in_selection_order() {
        let kinds = ComponentKind::single_valued();
        assert_eq!(kinds.len(), 5);
        assert_eq!(kinds[0], ComponentKind::PowerSource);
        assert_eq!(kinds[4], ComponentKind::Torch);
    }

    #[test]
    fn accessory_kinds_share_master_key() {
        assert_eq!(
            ComponentKind::Accessory(AccessoryKind::Remote).master_key(),
            "accessories"
        );
        assert_eq!(
            ComponentKind::Accessory(AccessoryKind::FeederAccessory).master_key(),
            "accessories"
        );
    }

    #[test]
    fn category_round_trips() {
        for kind in [
            ComponentKind::PowerSource,
            ComponentKind::Feeder,
            ComponentKind::Cooler,
            ComponentKind::Interconnector,
            ComponentKind::Torch,
            ComponentKind::Accessory(AccessoryKind::PowerSourceAccessory),
            ComponentKind::Accessory(AccessoryKind::FeederAccessory),
            ComponentKind::Accessory(AccessoryKind::ConnectivityAccessory),
            ComponentKind::Accessory(AccessoryKind::Remote),
            ComponentKind::Accessory(AccessoryKind::General),
        ] {
            assert_eq!(ComponentKind::from_category(kind.category()), Some(kind));
        }
    }

    #[test]
    fn unknown_category_is_rejected() {
        assert_eq!(ComponentKind::from_category("Helmet"), None);
    }

    #[test]
    fn accessory_token_mapping_is_lenient() {
        assert_eq!(AccessoryKind::from_token("remote control"), AccessoryKind::Remote);
        assert_eq!(
            AccessoryKind::from_token("power source trolley"),
            AccessoryKind::PowerSourceAccessory
        );
        assert_eq!(AccessoryKind::from_token("wheel kit"), AccessoryKind::General);
    }
}
