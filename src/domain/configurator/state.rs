//! The S1→S7 configurator state machine.
//!
//! States progress in a fixed order, but the *active* path through them is
//! decided dynamically: once a power source is selected, its applicability
//! record prunes the states whose component the power source does not take.
//! S1 (power source) and S7 (finalize) are always active.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::catalog::{AccessoryKind, ComponentKind};

use super::Applicability;

/// The seven configurator states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfiguratorState {
    PowerSourceSelection,
    FeederSelection,
    CoolerSelection,
    InterconnectorSelection,
    TorchSelection,
    AccessoriesSelection,
    Finalize,
}

impl ConfiguratorState {
    /// All states in S1→S7 order.
    pub fn all() -> &'static [ConfiguratorState] {
        &[
            ConfiguratorState::PowerSourceSelection,
            ConfiguratorState::FeederSelection,
            ConfiguratorState::CoolerSelection,
            ConfiguratorState::InterconnectorSelection,
            ConfiguratorState::TorchSelection,
            ConfiguratorState::AccessoriesSelection,
            ConfiguratorState::Finalize,
        ]
    }

    /// The entry state of every session.
    pub fn entry() -> ConfiguratorState {
        ConfiguratorState::PowerSourceSelection
    }

    /// Returns the 0-based position of this state in the S1→S7 order.
    pub fn order_index(&self) -> usize {
        Self::all()
            .iter()
            .position(|s| s == self)
            .expect("state must appear in all()")
    }

    /// The component kind selected in this state, if it is a selection state.
    ///
    /// Accessory states select the general subkind; the orchestrator narrows
    /// the subkind from the extracted `accessory_type` attribute.
    pub fn selection_kind(&self) -> Option<ComponentKind> {
        match self {
            ConfiguratorState::PowerSourceSelection => Some(ComponentKind::PowerSource),
            ConfiguratorState::FeederSelection => Some(ComponentKind::Feeder),
            ConfiguratorState::CoolerSelection => Some(ComponentKind::Cooler),
            ConfiguratorState::InterconnectorSelection => Some(ComponentKind::Interconnector),
            ConfiguratorState::TorchSelection => Some(ComponentKind::Torch),
            ConfiguratorState::AccessoriesSelection => {
                Some(ComponentKind::Accessory(AccessoryKind::General))
            }
            ConfiguratorState::Finalize => None,
        }
    }

    /// The state in which a component kind is selected.
    pub fn for_kind(kind: ComponentKind) -> ConfiguratorState {
        match kind {
            ComponentKind::PowerSource => ConfiguratorState::PowerSourceSelection,
            ComponentKind::Feeder => ConfiguratorState::FeederSelection,
            ComponentKind::Cooler => ConfiguratorState::CoolerSelection,
            ComponentKind::Interconnector => ConfiguratorState::InterconnectorSelection,
            ComponentKind::Torch => ConfiguratorState::TorchSelection,
            ComponentKind::Accessory(_) => ConfiguratorState::AccessoriesSelection,
        }
    }

    /// Derives the active path for a session.
    ///
    /// Before S1 commits there is no applicability record and every state is
    /// active. Afterwards, states whose component the power source marks `N`
    /// drop out; S1 and S7 always remain.
    pub fn active_states(applicability: Option<&Applicability>) -> Vec<ConfiguratorState> {
        Self::all()
            .iter()
            .copied()
            .filter(|state| match applicability {
                None => true,
                Some(a) => a.is_state_active(*state),
            })
            .collect()
    }

    /// Returns the next active state after the current one, or `None` when
    /// the current state is the last (Finalize).
    pub fn next_active(
        &self,
        applicability: Option<&Applicability>,
    ) -> Option<ConfiguratorState> {
        let own_index = self.order_index();
        Self::all()
            .iter()
            .copied()
            .filter(|s| s.order_index() > own_index)
            .find(|state| match applicability {
                None => true,
                Some(a) => a.is_state_active(*state),
            })
    }

    /// Returns the wire label (snake_case) of this state.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfiguratorState::PowerSourceSelection => "power_source_selection",
            ConfiguratorState::FeederSelection => "feeder_selection",
            ConfiguratorState::CoolerSelection => "cooler_selection",
            ConfiguratorState::InterconnectorSelection => "interconnector_selection",
            ConfiguratorState::TorchSelection => "torch_selection",
            ConfiguratorState::AccessoriesSelection => "accessories_selection",
            ConfiguratorState::Finalize => "finalize",
        }
    }
}

impl fmt::Display for ConfiguratorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::configurator::ApplicabilityFlag;

    #[test]
    fn order_starts_at_power_source_and_ends_at_finalize() {
        let all = ConfiguratorState::all();
        assert_eq!(all.len(), 7);
        assert_eq!(all[0], ConfiguratorState::PowerSourceSelection);
        assert_eq!(all[6], ConfiguratorState::Finalize);
        assert_eq!(ConfiguratorState::entry(), all[0]);
    }

    #[test]
    fn every_selection_state_maps_to_a_kind() {
        for state in ConfiguratorState::all() {
            if *state == ConfiguratorState::Finalize {
                assert!(state.selection_kind().is_none());
            } else {
                let kind = state.selection_kind().unwrap();
                assert_eq!(ConfiguratorState::for_kind(kind), *state);
            }
        }
    }

    #[test]
    fn all_states_active_without_applicability() {
        assert_eq!(ConfiguratorState::active_states(None).len(), 7);
    }

    #[test]
    fn inapplicable_states_drop_out_of_active_path() {
        let mut applicability = Applicability::all_yes();
        applicability.feeder = ApplicabilityFlag::No;
        applicability.cooler = ApplicabilityFlag::No;
        applicability.interconnector = ApplicabilityFlag::No;

        let active = ConfiguratorState::active_states(Some(&applicability));
        assert_eq!(
            active,
            vec![
                ConfiguratorState::PowerSourceSelection,
                ConfiguratorState::TorchSelection,
                ConfiguratorState::AccessoriesSelection,
                ConfiguratorState::Finalize,
            ]
        );
    }

    #[test]
    fn next_active_skips_inapplicable_states() {
        let mut applicability = Applicability::all_yes();
        applicability.feeder = ApplicabilityFlag::No;
        applicability.cooler = ApplicabilityFlag::No;

        let next = ConfiguratorState::PowerSourceSelection
            .next_active(Some(&applicability))
            .unwrap();
        assert_eq!(next, ConfiguratorState::InterconnectorSelection);
    }

    #[test]
    fn next_active_from_finalize_is_none() {
        assert_eq!(ConfiguratorState::Finalize.next_active(None), None);
    }

    #[test]
    fn serializes_to_snake_case() {
        let json = serde_json::to_string(&ConfiguratorState::FeederSelection).unwrap();
        assert_eq!(json, "\"feeder_selection\"");
    }
}
