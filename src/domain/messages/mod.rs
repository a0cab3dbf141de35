//! User-facing message composition.
//!
//! The composer turns orchestrator outcomes into localized text. No business
//! logic lives here; every decision has already been made by the time an
//! intent reaches the composer.

mod composer;
mod locale;

pub use composer::{ConfigurationSummary, MessageComposer, MessageIntent, SummaryEntry};
pub use locale::LanguageTag;
