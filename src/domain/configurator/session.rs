//! The full session snapshot.
//!
//! `SessionState` is the unit of persistence: everything a turn needs is in
//! here, and the orchestrator is its only mutator. Serialization must stay
//! stable because snapshots round-trip through the hot cache and land in the
//! archive verbatim.

use serde::{Deserialize, Serialize};

use crate::domain::catalog::{ComponentKind, Product};
use crate::domain::foundation::{SessionId, Timestamp};
use crate::domain::messages::LanguageTag;

use super::{Applicability, Cart, ConfiguratorState, MasterRecord};

/// Who authored a conversation entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationRole {
    User,
    Assistant,
}

/// One conversation log entry, appended in arrival order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationEntry {
    pub role: ConversationRole,
    pub text: String,
    pub at: Timestamp,
}

/// The complete state of one configuration session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub session_id: SessionId,
    pub current_state: ConfiguratorState,
    pub master: MasterRecord,
    pub cart: Cart,
    /// Set once, at S1 commit time; reloaded if the power source is replaced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applicability: Option<Applicability>,
    #[serde(default)]
    pub conversation_log: Vec<ConversationEntry>,
    /// Options presented to the user at the end of the previous turn. A bare
    /// "yes" commits when exactly one option is pending.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub presented_options: Vec<Product>,
    #[serde(default)]
    pub completed: bool,
    pub language: LanguageTag,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl SessionState {
    /// Creates a fresh session at the entry state.
    pub fn new(session_id: SessionId, language: LanguageTag) -> Self {
        let now = Timestamp::now();
        Self {
            session_id,
            current_state: ConfiguratorState::entry(),
            master: MasterRecord::new(),
            cart: Cart::new(),
            applicability: None,
            conversation_log: Vec::new(),
            presented_options: Vec::new(),
            completed: false,
            language,
            created_at: now,
            updated_at: now,
        }
    }

    /// Appends a conversation log entry.
    pub fn add_message(&mut self, role: ConversationRole, text: impl Into<String>) {
        self.conversation_log.push(ConversationEntry {
            role,
            text: text.into(),
            at: Timestamp::now(),
        });
        self.touch();
    }

    /// Returns the last `n` log entries, oldest first.
    pub fn last_messages(&self, n: usize) -> &[ConversationEntry] {
        let len = self.conversation_log.len();
        &self.conversation_log[len.saturating_sub(n)..]
    }

    /// Bumps the updated-at timestamp.
    pub fn touch(&mut self) {
        self.updated_at = Timestamp::now();
    }

    /// The active S1→S7 path for this session.
    pub fn active_states(&self) -> Vec<ConfiguratorState> {
        ConfiguratorState::active_states(self.applicability.as_ref())
    }

    /// Advances to the next active state, if there is one.
    pub fn advance(&mut self) {
        if let Some(next) = self.current_state.next_active(self.applicability.as_ref()) {
            self.current_state = next;
            self.touch();
        }
    }

    /// Records the applicability loaded at S1 commit and marks every
    /// N-flagged kind `NotApplicable` in the cart. Returns the kinds that
    /// were marked, for the composer notice.
    pub fn apply_applicability(&mut self, applicability: Applicability) -> Vec<ComponentKind> {
        let inapplicable = applicability.inapplicable_kinds();
        for kind in &inapplicable {
            // flag_for() guards PowerSource, so this cannot fail
            let _ = self.cart.mark_not_applicable(*kind);
        }
        self.applicability = Some(applicability);
        self.touch();
        inapplicable
    }

    /// Downstream-clear cascade: resets the cart entry and zeroes the master
    /// bag of every active state strictly after `changed`, then moves to the
    /// next active state.
    pub fn cascade_downstream(&mut self, changed: ConfiguratorState) {
        let changed_index = changed.order_index();
        for state in self.active_states() {
            if state.order_index() <= changed_index {
                continue;
            }
            if let Some(kind) = state.selection_kind() {
                self.cart.reset(kind);
                self.master.clear_kind(kind);
            }
        }
        self.presented_options.clear();
        if let Some(next) = changed.next_active(self.applicability.as_ref()) {
            self.current_state = next;
        }
        self.touch();
    }

    /// Remembers the options shown to the user this turn.
    pub fn present_options(&mut self, options: Vec<Product>) {
        self.presented_options = options;
    }

    /// The single pending option, if exactly one was presented.
    pub fn pending_single_option(&self) -> Option<&Product> {
        match self.presented_options.as_slice() {
            [only] => Some(only),
            _ => None,
        }
    }

    /// Real-component count toward the finalization threshold.
    pub fn real_component_count(&self) -> usize {
        self.cart.selected_count()
    }

    /// Marks the session terminally completed.
    pub fn mark_completed(&mut self) {
        self.completed = true;
        self.current_state = ConfiguratorState::Finalize;
        self.touch();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::configurator::ApplicabilityFlag;

    fn session() -> SessionState {
        SessionState::new(SessionId::new(), LanguageTag::En)
    }

    fn product(gin: &str, kind: ComponentKind) -> Product {
        Product::new(gin, gin.to_uppercase(), kind)
    }

    #[test]
    fn new_session_starts_at_s1() {
        let s = session();
        assert_eq!(s.current_state, ConfiguratorState::PowerSourceSelection);
        assert!(!s.completed);
        assert!(s.applicability.is_none());
    }

    #[test]
    fn conversation_log_appends_in_order() {
        let mut s = session();
        s.add_message(ConversationRole::User, "I need 500 amps");
        s.add_message(ConversationRole::Assistant, "Here are your options");

        assert_eq!(s.conversation_log.len(), 2);
        assert_eq!(s.conversation_log[0].role, ConversationRole::User);
        assert_eq!(s.last_messages(1)[0].text, "Here are your options");
    }

    #[test]
    fn apply_applicability_marks_cart_and_reports_kinds() {
        let mut s = session();
        let mut applicability = Applicability::all_yes();
        applicability.feeder = ApplicabilityFlag::No;
        applicability.cooler = ApplicabilityFlag::No;

        let marked = s.apply_applicability(applicability);

        assert_eq!(marked, vec![ComponentKind::Feeder, ComponentKind::Cooler]);
        assert!(!s.cart.entry(ComponentKind::Feeder).unwrap().is_selected());
        assert_eq!(
            s.active_states(),
            vec![
                ConfiguratorState::PowerSourceSelection,
                ConfiguratorState::InterconnectorSelection,
                ConfiguratorState::TorchSelection,
                ConfiguratorState::AccessoriesSelection,
                ConfiguratorState::Finalize,
            ]
        );
    }

    #[test]
    fn advance_follows_active_path() {
        let mut s = session();
        let mut applicability = Applicability::all_yes();
        applicability.feeder = ApplicabilityFlag::No;
        s.apply_applicability(applicability);

        s.advance();
        assert_eq!(s.current_state, ConfiguratorState::CoolerSelection);
    }

    #[test]
    fn cascade_clears_downstream_cart_and_master() {
        let mut s = session();
        s.cart.select(product("ps", ComponentKind::PowerSource)).unwrap();
        s.cart.select(product("f", ComponentKind::Feeder)).unwrap();
        s.cart.select(product("c", ComponentKind::Cooler)).unwrap();
        s.master.bag_mut(ComponentKind::Feeder).set("wire_size", "0.035 inch");
        s.master.bag_mut(ComponentKind::Cooler).set("cooling_type", "water");
        s.apply_applicability(Applicability::all_yes());

        s.cascade_downstream(ConfiguratorState::PowerSourceSelection);

        assert!(s.cart.selected(ComponentKind::PowerSource).is_some());
        assert!(s.cart.entry(ComponentKind::Feeder).is_none());
        assert!(s.cart.entry(ComponentKind::Cooler).is_none());
        assert!(s.master.bag(ComponentKind::Feeder).is_empty());
        assert!(s.master.bag(ComponentKind::Cooler).is_empty());
        assert_eq!(s.current_state, ConfiguratorState::FeederSelection);
    }

    #[test]
    fn cascade_leaves_upstream_untouched() {
        let mut s = session();
        s.cart.select(product("ps", ComponentKind::PowerSource)).unwrap();
        s.cart.select(product("f", ComponentKind::Feeder)).unwrap();
        s.cart.select(product("t", ComponentKind::Torch)).unwrap();
        s.apply_applicability(Applicability::all_yes());
        s.master.bag_mut(ComponentKind::PowerSource).set("current", "500 A");

        s.cascade_downstream(ConfiguratorState::FeederSelection);

        assert!(s.cart.selected(ComponentKind::PowerSource).is_some());
        assert!(s.cart.selected(ComponentKind::Feeder).is_some());
        assert!(s.cart.entry(ComponentKind::Torch).is_none());
        assert_eq!(s.master.bag(ComponentKind::PowerSource).get("current"), Some("500 A"));
        assert_eq!(s.current_state, ConfiguratorState::CoolerSelection);
    }

    #[test]
    fn pending_single_option_requires_exactly_one() {
        let mut s = session();
        assert!(s.pending_single_option().is_none());

        s.present_options(vec![product("a", ComponentKind::PowerSource)]);
        assert_eq!(s.pending_single_option().unwrap().gin, "a");

        s.present_options(vec![
            product("a", ComponentKind::PowerSource),
            product("b", ComponentKind::PowerSource),
        ]);
        assert!(s.pending_single_option().is_none());
    }

    #[test]
    fn session_state_round_trips_through_json() {
        let mut s = session();
        s.add_message(ConversationRole::User, "hello");
        s.cart.select(product("ps", ComponentKind::PowerSource)).unwrap();
        s.apply_applicability(Applicability::all_yes());
        s.master.bag_mut(ComponentKind::PowerSource).set("current", "500 A");
        s.present_options(vec![product("f", ComponentKind::Feeder)]);

        let json = serde_json::to_string(&s).unwrap();
        let back: SessionState = serde_json::from_str(&json).unwrap();
        assert_eq!(s, back);
    }
}
