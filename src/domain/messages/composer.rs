//! Composer intents and rendering.

use serde::{Deserialize, Serialize};

use crate::domain::catalog::{ComponentKind, Product};
use crate::domain::configurator::Cart;

use super::locale::{LanguageTag, Phrases};

/// Identifier, name, and description of one configured entry. This is the
/// only product data the finalization summary carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryEntry {
    pub gin: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl SummaryEntry {
    fn from_product(product: &Product) -> Self {
        Self {
            gin: product.gin.clone(),
            name: product.name.clone(),
            description: product.description.clone(),
        }
    }
}

/// Structured configuration summary; accessories keep selection order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigurationSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power_source: Option<SummaryEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feeder: Option<SummaryEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooler: Option<SummaryEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interconnector: Option<SummaryEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub torch: Option<SummaryEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub accessories: Vec<SummaryEntry>,
}

impl ConfigurationSummary {
    /// Builds the summary from a cart's `Selected` entries.
    pub fn from_cart(cart: &Cart) -> Self {
        let entry = |kind| cart.selected(kind).map(SummaryEntry::from_product);
        Self {
            power_source: entry(ComponentKind::PowerSource),
            feeder: entry(ComponentKind::Feeder),
            cooler: entry(ComponentKind::Cooler),
            interconnector: entry(ComponentKind::Interconnector),
            torch: entry(ComponentKind::Torch),
            accessories: cart
                .selected_accessories()
                .into_iter()
                .map(SummaryEntry::from_product)
                .collect(),
        }
    }

    fn lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        let named = [
            (ComponentKind::PowerSource, &self.power_source),
            (ComponentKind::Feeder, &self.feeder),
            (ComponentKind::Cooler, &self.cooler),
            (ComponentKind::Interconnector, &self.interconnector),
            (ComponentKind::Torch, &self.torch),
        ];
        for (kind, entry) in named {
            if let Some(entry) = entry {
                lines.push(format!("{}: {} ({})", kind.display_name(), entry.name, entry.gin));
            }
        }
        for entry in &self.accessories {
            lines.push(format!("Accessory: {} ({})", entry.name, entry.gin));
        }
        lines
    }
}

/// What the composer should say this turn.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageIntent {
    /// Fresh-session greeting; `expired` prepends the session-expired note.
    Greeting { expired: bool },
    /// Ask the user what they need for a component.
    PromptFor { kind: ComponentKind },
    /// Present search results. `fallback` marks a compatibility-only rerun.
    PresentOptions {
        kind: ComponentKind,
        products: Vec<Product>,
        fallback: bool,
        compatibility_constrained: bool,
    },
    /// Acknowledge a committed selection.
    Confirm { kind: ComponentKind, product: Product },
    /// Acknowledge a skipped component.
    SkipConfirmed { kind: ComponentKind },
    /// The mandatory-power-source rule fired.
    RejectSkipOfPowerSource,
    /// Components auto-marked NotApplicable at S1 commit.
    NotApplicableNotice { kinds: Vec<ComponentKind> },
    /// Summary shown on entering S7, asking for the explicit confirmation.
    FinalizePreview { summary: ConfigurationSummary },
    /// Terminal summary of the completed configuration.
    FinalizationSummary { summary: ConfigurationSummary },
    /// Cannot finalize yet.
    ThresholdNotMet { current: usize, required: usize },
    /// Extraction failed or was unintelligible; ask the user to restate.
    ExtractionFallback,
    /// A clarification question authored by the extractor.
    Clarification { question: String },
    /// Catalogue momentarily unavailable.
    RepositoryUnavailable,
    /// Accessories are multi-valued; hint how to move on.
    AccessoriesContinue,
    /// Generic error for uncategorized failures; never leaks internals.
    GenericError,
}

/// Renders composer intents into localized user-facing text.
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageComposer;

impl MessageComposer {
    pub fn new() -> Self {
        Self
    }

    /// Renders one intent.
    pub fn render(&self, intent: &MessageIntent, language: LanguageTag) -> String {
        let p = Phrases::for_tag(language);
        match intent {
            MessageIntent::Greeting { expired } => {
                if *expired {
                    format!("{} {}", p.expired, p.greeting)
                } else {
                    p.greeting.to_string()
                }
            }
            MessageIntent::PromptFor { kind } => {
                let attributes = crate::domain::configurator::vocabulary_for(*kind).join(", ");
                format!("{} {} ({}).", p.prompt_for, kind.display_name(), attributes)
            }
            MessageIntent::PresentOptions {
                kind,
                products,
                fallback,
                compatibility_constrained,
            } => self.render_options(p, *kind, products, *fallback, *compatibility_constrained),
            MessageIntent::Confirm { kind, product } => format!(
                "{} {} ({}) — {}.",
                p.selected,
                product.name,
                product.gin,
                kind.display_name()
            ),
            MessageIntent::SkipConfirmed { kind } => {
                format!("{} {}.", p.skipped, kind.display_name())
            }
            MessageIntent::RejectSkipOfPowerSource => p.power_source_required.to_string(),
            MessageIntent::NotApplicableNotice { kinds } => {
                let names: Vec<&str> = kinds.iter().map(|k| k.display_name()).collect();
                format!("{} {}.", p.not_applicable, names.join(", "))
            }
            MessageIntent::FinalizePreview { summary } => {
                let mut text = String::new();
                for line in summary.lines() {
                    text.push_str(&line);
                    text.push('\n');
                }
                text.push_str(p.confirm_prompt);
                text
            }
            MessageIntent::FinalizationSummary { summary } => {
                let mut text = p.completed.to_string();
                for line in summary.lines() {
                    text.push('\n');
                    text.push_str(&line);
                }
                text
            }
            MessageIntent::ThresholdNotMet { current, required } => {
                format!("{} ({}/{}).", p.threshold_not_met, current, required)
            }
            MessageIntent::ExtractionFallback => p.restate.to_string(),
            MessageIntent::Clarification { question } => question.clone(),
            MessageIntent::RepositoryUnavailable => p.unavailable.to_string(),
            MessageIntent::AccessoriesContinue => p.done_hint.to_string(),
            MessageIntent::GenericError => p.generic_error.to_string(),
        }
    }

    /// Renders a sequence of intents as one message.
    pub fn render_all(&self, intents: &[MessageIntent], language: LanguageTag) -> String {
        intents
            .iter()
            .map(|intent| self.render(intent, language))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    fn render_options(
        &self,
        p: &Phrases,
        kind: ComponentKind,
        products: &[Product],
        fallback: bool,
        compatibility_constrained: bool,
    ) -> String {
        match products {
            [] => p.no_options.to_string(),
            [only] => {
                let mut text = format!(
                    "{} {}: {} ({}).",
                    p.found_options,
                    kind.display_name(),
                    only.name,
                    only.gin
                );
                if fallback {
                    text = format!("{}\n{}", p.fallback_note, text);
                }
                format!("{} {}", text, p.single_option)
            }
            many => {
                let mut text = String::new();
                if fallback {
                    text.push_str(p.fallback_note);
                    text.push('\n');
                }
                text.push_str(&format!("{} {}:\n", p.found_options, kind.display_name()));
                for (index, product) in many.iter().enumerate() {
                    text.push_str(&format!("{}. {} ({})\n", index + 1, product.name, product.gin));
                    if let Some(description) = &product.description {
                        text.push_str(&format!("   {}\n", description));
                    }
                }
                if compatibility_constrained && !fallback {
                    text.push_str(p.compatible_note);
                    text.push('\n');
                }
                text.push_str(p.select_hint);
                if kind != ComponentKind::PowerSource {
                    text.push(' ');
                    text.push_str(p.skip_hint);
                }
                text
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::AccessoryKind;

    fn composer() -> MessageComposer {
        MessageComposer::new()
    }

    fn product(gin: &str, name: &str, kind: ComponentKind) -> Product {
        Product::new(gin, name, kind).with_description("desc")
    }

    #[test]
    fn zero_options_render_guidance() {
        let text = composer().render(
            &MessageIntent::PresentOptions {
                kind: ComponentKind::Feeder,
                products: vec![],
                fallback: false,
                compatibility_constrained: true,
            },
            LanguageTag::En,
        );
        assert!(text.contains("couldn't find"));
    }

    #[test]
    fn single_option_asks_for_confirmation() {
        let text = composer().render(
            &MessageIntent::PresentOptions {
                kind: ComponentKind::PowerSource,
                products: vec![product("1", "Aristo 500ix", ComponentKind::PowerSource)],
                fallback: false,
                compatibility_constrained: false,
            },
            LanguageTag::En,
        );
        assert!(text.contains("Aristo 500ix"));
        assert!(text.contains("Shall I add it?"));
    }

    #[test]
    fn multiple_options_are_numbered() {
        let products = vec![
            product("1", "Warrior 400i", ComponentKind::PowerSource),
            product("2", "Aristo 500ix", ComponentKind::PowerSource),
        ];
        let text = composer().render(
            &MessageIntent::PresentOptions {
                kind: ComponentKind::PowerSource,
                products,
                fallback: false,
                compatibility_constrained: false,
            },
            LanguageTag::En,
        );
        assert!(text.contains("1. Warrior 400i (1)"));
        assert!(text.contains("2. Aristo 500ix (2)"));
        // the power source is mandatory, no skip hint
        assert!(!text.contains("skip"));
    }

    #[test]
    fn non_mandatory_kinds_offer_skip() {
        let text = composer().render(
            &MessageIntent::PresentOptions {
                kind: ComponentKind::Cooler,
                products: vec![
                    product("1", "Cool2", ComponentKind::Cooler),
                    product("2", "CoolMini", ComponentKind::Cooler),
                ],
                fallback: false,
                compatibility_constrained: true,
            },
            LanguageTag::En,
        );
        assert!(text.contains("'skip'"));
        assert!(text.contains("compatible with your current selection"));
    }

    #[test]
    fn fallback_results_carry_the_fallback_note() {
        let text = composer().render(
            &MessageIntent::PresentOptions {
                kind: ComponentKind::Torch,
                products: vec![
                    product("1", "PSF 305", ComponentKind::Torch),
                    product("2", "PSF 410w", ComponentKind::Torch),
                ],
                fallback: true,
                compatibility_constrained: true,
            },
            LanguageTag::En,
        );
        assert!(text.starts_with("None matched your requirements exactly"));
    }

    #[test]
    fn finalization_summary_lists_accessories_in_order() {
        let mut cart = Cart::new();
        cart.select(product("ps", "Aristo 500ix", ComponentKind::PowerSource)).unwrap();
        cart.select(product(
            "a1",
            "Remote AT1",
            ComponentKind::Accessory(AccessoryKind::Remote),
        ))
        .unwrap();
        cart.select(product(
            "a2",
            "Trolley",
            ComponentKind::Accessory(AccessoryKind::General),
        ))
        .unwrap();

        let summary = ConfigurationSummary::from_cart(&cart);
        let text = composer().render(
            &MessageIntent::FinalizationSummary { summary: summary.clone() },
            LanguageTag::En,
        );

        assert_eq!(summary.accessories.len(), 2);
        assert_eq!(summary.accessories[0].gin, "a1");
        let at1 = text.find("Remote AT1").unwrap();
        let trolley = text.find("Trolley").unwrap();
        assert!(at1 < trolley);
    }

    #[test]
    fn summary_excludes_skipped_entries() {
        let mut cart = Cart::new();
        cart.select(product("ps", "Aristo 500ix", ComponentKind::PowerSource)).unwrap();
        cart.skip(ComponentKind::Feeder).unwrap();

        let summary = ConfigurationSummary::from_cart(&cart);
        assert!(summary.feeder.is_none());
        assert!(summary.power_source.is_some());
    }

    #[test]
    fn threshold_message_shows_counts() {
        let text = composer().render(
            &MessageIntent::ThresholdNotMet { current: 1, required: 3 },
            LanguageTag::En,
        );
        assert!(text.contains("(1/3)"));
    }

    #[test]
    fn renders_localized_greeting() {
        let text = composer().render(&MessageIntent::Greeting { expired: false }, LanguageTag::De);
        assert!(text.contains("Willkommen"));
    }

    #[test]
    fn expired_greeting_mentions_expiry() {
        let text = composer().render(&MessageIntent::Greeting { expired: true }, LanguageTag::En);
        assert!(text.contains("expired"));
    }

    #[test]
    fn render_all_joins_with_blank_lines() {
        let text = composer().render_all(
            &[
                MessageIntent::SkipConfirmed { kind: ComponentKind::Cooler },
                MessageIntent::PromptFor { kind: ComponentKind::Torch },
            ],
            LanguageTag::En,
        );
        assert!(text.contains("Cooling System"));
        assert!(text.contains("\n\n"));
        assert!(text.contains("Torch"));
    }
}
