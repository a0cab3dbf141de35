//! Configurator domain: the S1→S7 flow.
//!
//! This module owns the pure logic of the configuration flow: the state
//! machine and its applicability-derived active path, the master parameter
//! record, the cart, compatibility anchor derivation, canonical-form
//! normalization, keyword intent classification, and the session snapshot
//! that ties them together.
//!
//! Nothing in here performs I/O; the orchestrator in the application layer
//! drives these types against the ports.

mod applicability;
mod cart;
mod compatibility;
mod intent;
mod master;
mod normalize;
mod session;
mod state;

pub use applicability::{Applicability, ApplicabilityFlag, ApplicabilityTable};
pub use cart::{Cart, CartEntry};
pub use compatibility::{anchors_for, Anchor, CompatibilityPredicate};
pub use intent::TurnIntent;
pub use master::{MasterRecord, ParameterBag};
pub use normalize::{validate_attribute, validate_bag_updates, vocabulary_for};
pub use session::{ConversationEntry, ConversationRole, SessionState};
pub use state::ConfiguratorState;
