//! Keyword intent classification.
//!
//! The orchestrator recognizes unambiguous command keywords before invoking
//! the LLM extractor; everything else is treated as data for extraction.

use serde::{Deserialize, Serialize};

/// What a turn is asking for, as far as keywords can tell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnIntent {
    /// Skip the current component.
    Skip,
    /// Move to finalization ("done" / "finish" / "finalize").
    Finalize,
    /// Discard the session and start over.
    Reset,
    /// Affirm the pending single option ("yes" / "ok" / ...).
    Confirm,
    /// Free text to run through extraction.
    Data,
}

impl TurnIntent {
    /// Classifies a raw user message by exact keyword match (after trimming
    /// and lowercasing). Anything ambiguous is `Data`.
    pub fn classify(message: &str) -> TurnIntent {
        let normalized = message.trim().trim_end_matches(['.', '!']).to_lowercase();
        match normalized.as_str() {
            "skip" => TurnIntent::Skip,
            "done" | "finish" | "finalize" => TurnIntent::Finalize,
            "reset" | "start over" => TurnIntent::Reset,
            "yes" | "ok" | "okay" | "sure" | "confirm" | "looks good" | "yes please" => {
                TurnIntent::Confirm
            }
            _ => TurnIntent::Data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_skip() {
        assert_eq!(TurnIntent::classify("skip"), TurnIntent::Skip);
        assert_eq!(TurnIntent::classify("  Skip  "), TurnIntent::Skip);
    }

    #[test]
    fn classifies_finalize_synonyms() {
        for word in ["done", "finish", "finalize", "Done!"] {
            assert_eq!(TurnIntent::classify(word), TurnIntent::Finalize, "{word}");
        }
    }

    #[test]
    fn classifies_reset() {
        assert_eq!(TurnIntent::classify("reset"), TurnIntent::Reset);
        assert_eq!(TurnIntent::classify("start over"), TurnIntent::Reset);
    }

    #[test]
    fn classifies_confirmations() {
        for word in ["yes", "OK", "sure", "looks good", "confirm"] {
            assert_eq!(TurnIntent::classify(word), TurnIntent::Confirm, "{word}");
        }
    }

    #[test]
    fn embedded_keywords_are_data() {
        assert_eq!(
            TurnIntent::classify("skip the small talk, I need 500 amps"),
            TurnIntent::Data
        );
        assert_eq!(TurnIntent::classify("yes and also a torch"), TurnIntent::Data);
    }
}
