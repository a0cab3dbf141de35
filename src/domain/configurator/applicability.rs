//! Per-power-source component applicability.
//!
//! Some power sources are self-contained units that take no feeder or
//! cooler. The applicability table records, per power-source identifier,
//! which downstream components apply at all. Unknown identifiers default to
//! everything applicable.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::catalog::ComponentKind;
use crate::domain::foundation::ValidationError;

use super::ConfiguratorState;

/// Y/N applicability flag, serialized as `"Y"` / `"N"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplicabilityFlag {
    #[serde(rename = "Y")]
    Yes,
    #[serde(rename = "N")]
    No,
}

impl ApplicabilityFlag {
    pub fn is_yes(&self) -> bool {
        matches!(self, ApplicabilityFlag::Yes)
    }
}

impl Default for ApplicabilityFlag {
    fn default() -> Self {
        ApplicabilityFlag::Yes
    }
}

/// Which downstream components a selected power source takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Applicability {
    #[serde(rename = "Feeder", default)]
    pub feeder: ApplicabilityFlag,
    #[serde(rename = "Cooler", default)]
    pub cooler: ApplicabilityFlag,
    #[serde(rename = "Interconnector", default)]
    pub interconnector: ApplicabilityFlag,
    #[serde(rename = "Torch", default)]
    pub torch: ApplicabilityFlag,
    #[serde(rename = "Accessories", default)]
    pub accessories: ApplicabilityFlag,
}

impl Applicability {
    /// The default policy: every component applies.
    pub fn all_yes() -> Self {
        Self::default()
    }

    /// Returns the flag for a component kind. The power source itself is
    /// always applicable.
    pub fn flag_for(&self, kind: ComponentKind) -> ApplicabilityFlag {
        match kind {
            ComponentKind::PowerSource => ApplicabilityFlag::Yes,
            ComponentKind::Feeder => self.feeder,
            ComponentKind::Cooler => self.cooler,
            ComponentKind::Interconnector => self.interconnector,
            ComponentKind::Torch => self.torch,
            ComponentKind::Accessory(_) => self.accessories,
        }
    }

    /// Returns true if the component kind applies.
    pub fn is_applicable(&self, kind: ComponentKind) -> bool {
        self.flag_for(kind).is_yes()
    }

    /// Returns true if a state belongs to the active path. S1 and S7 are
    /// always active.
    pub fn is_state_active(&self, state: ConfiguratorState) -> bool {
        match state.selection_kind() {
            None => true,
            Some(kind) => self.is_applicable(kind),
        }
    }

    /// Kinds this record marks inapplicable, in selection order.
    pub fn inapplicable_kinds(&self) -> Vec<ComponentKind> {
        let mut kinds: Vec<ComponentKind> = ComponentKind::single_valued()
            .iter()
            .copied()
            .filter(|kind| !self.is_applicable(*kind))
            .collect();
        if !self.accessories.is_yes() {
            kinds.push(ComponentKind::Accessory(
                crate::domain::catalog::AccessoryKind::General,
            ));
        }
        kinds
    }
}

/// On-disk entry for one power source.
#[derive(Debug, Clone, Deserialize)]
struct PowerSourceEntry {
    applicability: Applicability,
}

/// On-disk table layout.
#[derive(Debug, Clone, Deserialize)]
struct TableFile {
    #[serde(default)]
    power_sources: HashMap<String, PowerSourceEntry>,
    #[serde(default)]
    default_policy: Option<PowerSourceEntry>,
}

/// The applicability table, loaded once at startup and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct ApplicabilityTable {
    by_gin: HashMap<String, Applicability>,
    default_policy: Applicability,
}

impl ApplicabilityTable {
    /// Parses the serialized table.
    ///
    /// Layout: `{"power_sources": {"<gin>": {"applicability": {...}}},
    /// "default_policy": {"applicability": {...}}}`.
    pub fn from_json_str(json: &str) -> Result<Self, ValidationError> {
        let file: TableFile = serde_json::from_str(json)
            .map_err(|e| ValidationError::invalid_format("applicability_table", e.to_string()))?;

        Ok(Self {
            by_gin: file
                .power_sources
                .into_iter()
                .map(|(gin, entry)| (gin, entry.applicability))
                .collect(),
            default_policy: file
                .default_policy
                .map(|entry| entry.applicability)
                .unwrap_or_else(Applicability::all_yes),
        })
    }

    /// Builds a table from explicit entries (used by tests and tools).
    pub fn from_entries(entries: impl IntoIterator<Item = (String, Applicability)>) -> Self {
        Self {
            by_gin: entries.into_iter().collect(),
            default_policy: Applicability::all_yes(),
        }
    }

    /// Looks up the applicability for a power source. Unknown identifiers
    /// fall back to the default policy (all-Y unless the file overrides it).
    pub fn lookup(&self, power_source_gin: &str) -> Applicability {
        self.by_gin
            .get(power_source_gin)
            .copied()
            .unwrap_or(self.default_policy)
    }

    /// Number of explicit power-source entries.
    pub fn len(&self) -> usize {
        self.by_gin.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_gin.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::AccessoryKind;

    const TABLE_JSON: &str = r#"{
        "power_sources": {
            "0446200880": {
                "applicability": {
                    "Feeder": "N",
                    "Cooler": "N",
                    "Interconnector": "N",
                    "Torch": "Y",
                    "Accessories": "Y"
                }
            }
        },
        "default_policy": {
            "applicability": {}
        }
    }"#;

    #[test]
    fn parses_table_and_looks_up_by_gin() {
        let table = ApplicabilityTable::from_json_str(TABLE_JSON).unwrap();
        let applicability = table.lookup("0446200880");

        assert!(!applicability.is_applicable(ComponentKind::Feeder));
        assert!(!applicability.is_applicable(ComponentKind::Cooler));
        assert!(applicability.is_applicable(ComponentKind::Torch));
    }

    #[test]
    fn unknown_gin_defaults_to_all_yes() {
        let table = ApplicabilityTable::from_json_str(TABLE_JSON).unwrap();
        let applicability = table.lookup("9999999999");
        assert_eq!(applicability, Applicability::all_yes());
    }

    #[test]
    fn missing_flags_default_to_yes() {
        let applicability: Applicability = serde_json::from_str(r#"{"Feeder": "N"}"#).unwrap();
        assert!(!applicability.is_applicable(ComponentKind::Feeder));
        assert!(applicability.is_applicable(ComponentKind::Cooler));
    }

    #[test]
    fn malformed_table_is_rejected() {
        assert!(ApplicabilityTable::from_json_str("not json").is_err());
    }

    #[test]
    fn power_source_is_always_applicable() {
        let mut applicability = Applicability::all_yes();
        applicability.feeder = ApplicabilityFlag::No;
        assert!(applicability.is_applicable(ComponentKind::PowerSource));
    }

    #[test]
    fn inapplicable_kinds_lists_no_flags_in_order() {
        let mut applicability = Applicability::all_yes();
        applicability.cooler = ApplicabilityFlag::No;
        applicability.accessories = ApplicabilityFlag::No;

        let kinds = applicability.inapplicable_kinds();
        assert_eq!(
            kinds,
            vec![
                ComponentKind::Cooler,
                ComponentKind::Accessory(AccessoryKind::General),
            ]
        );
    }

    #[test]
    fn flag_serializes_as_single_letter() {
        assert_eq!(serde_json::to_string(&ApplicabilityFlag::Yes).unwrap(), "\"Y\"");
        assert_eq!(serde_json::to_string(&ApplicabilityFlag::No).unwrap(), "\"N\"");
    }
}
