//! Language tags and phrase tables.
//!
//! Twelve supported tags; any tag without a translated phrase table renders
//! with the English one.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported interface languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageTag {
    En,
    De,
    Fr,
    Es,
    It,
    Pt,
    Nl,
    Sv,
    Pl,
    Cs,
    Da,
    Fi,
}

impl LanguageTag {
    /// All supported tags.
    pub fn all() -> &'static [LanguageTag] {
        &[
            LanguageTag::En,
            LanguageTag::De,
            LanguageTag::Fr,
            LanguageTag::Es,
            LanguageTag::It,
            LanguageTag::Pt,
            LanguageTag::Nl,
            LanguageTag::Sv,
            LanguageTag::Pl,
            LanguageTag::Cs,
            LanguageTag::Da,
            LanguageTag::Fi,
        ]
    }

    /// Lenient parse: primary subtag only, unknown tags fall back to English.
    pub fn parse_or_default(tag: &str) -> LanguageTag {
        tag.parse().unwrap_or(LanguageTag::En)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LanguageTag::En => "en",
            LanguageTag::De => "de",
            LanguageTag::Fr => "fr",
            LanguageTag::Es => "es",
            LanguageTag::It => "it",
            LanguageTag::Pt => "pt",
            LanguageTag::Nl => "nl",
            LanguageTag::Sv => "sv",
            LanguageTag::Pl => "pl",
            LanguageTag::Cs => "cs",
            LanguageTag::Da => "da",
            LanguageTag::Fi => "fi",
        }
    }
}

impl Default for LanguageTag {
    fn default() -> Self {
        LanguageTag::En
    }
}

impl fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for LanguageTag {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let primary = s.trim().to_lowercase();
        let primary = primary.split(['-', '_']).next().unwrap_or("");
        match primary {
            "en" => Ok(LanguageTag::En),
            "de" => Ok(LanguageTag::De),
            "fr" => Ok(LanguageTag::Fr),
            "es" => Ok(LanguageTag::Es),
            "it" => Ok(LanguageTag::It),
            "pt" => Ok(LanguageTag::Pt),
            "nl" => Ok(LanguageTag::Nl),
            "sv" => Ok(LanguageTag::Sv),
            "pl" => Ok(LanguageTag::Pl),
            "cs" => Ok(LanguageTag::Cs),
            "da" => Ok(LanguageTag::Da),
            "fi" => Ok(LanguageTag::Fi),
            _ => Err(()),
        }
    }
}

/// The fixed phrases a rendered message is assembled from.
pub(super) struct Phrases {
    pub greeting: &'static str,
    pub prompt_for: &'static str,
    pub found_options: &'static str,
    pub compatible_note: &'static str,
    pub fallback_note: &'static str,
    pub single_option: &'static str,
    pub no_options: &'static str,
    pub select_hint: &'static str,
    pub skip_hint: &'static str,
    pub selected: &'static str,
    pub skipped: &'static str,
    pub power_source_required: &'static str,
    pub not_applicable: &'static str,
    pub threshold_not_met: &'static str,
    pub restate: &'static str,
    pub unavailable: &'static str,
    pub expired: &'static str,
    pub completed: &'static str,
    pub done_hint: &'static str,
    pub confirm_prompt: &'static str,
    pub generic_error: &'static str,
}

const EN: Phrases = Phrases {
    greeting: "Welcome! Let's configure your welding setup. What are your power source requirements?",
    prompt_for: "Tell me what you need for the",
    found_options: "I found these options for the",
    compatible_note: "All options are compatible with your current selection.",
    fallback_note: "None matched your requirements exactly, so these are all compatible options.",
    single_option: "This option matches. Shall I add it?",
    no_options: "I couldn't find matching options. Could you adjust your requirements, or say 'skip'?",
    select_hint: "Reply with a number or product name to select.",
    skip_hint: "Say 'skip' if you don't need one.",
    selected: "Selected",
    skipped: "Skipping",
    power_source_required: "A power source is required and cannot be skipped. Please tell me your power source requirements.",
    not_applicable: "This power source is self-contained; the following are not applicable:",
    threshold_not_met: "Your configuration is not complete yet",
    restate: "Sorry, I didn't catch that. Could you restate your requirements?",
    unavailable: "The catalogue is momentarily unavailable. Please try again.",
    expired: "Your previous session expired, so we're starting fresh.",
    completed: "Your configuration is complete. Here is your summary:",
    done_hint: "Say 'done' to finalize your configuration.",
    confirm_prompt: "Say 'yes' to confirm and complete your configuration.",
    generic_error: "Something went wrong on our side. Please try again.",
};

const DE: Phrases = Phrases {
    greeting: "Willkommen! Konfigurieren wir Ihre Schweißausrüstung. Welche Anforderungen haben Sie an die Stromquelle?",
    prompt_for: "Was benötigen Sie für",
    found_options: "Ich habe diese Optionen gefunden für",
    compatible_note: "Alle Optionen sind mit Ihrer aktuellen Auswahl kompatibel.",
    fallback_note: "Keine Option entsprach genau Ihren Anforderungen, daher zeige ich alle kompatiblen Optionen.",
    single_option: "Diese Option passt. Soll ich sie hinzufügen?",
    no_options: "Ich konnte keine passenden Optionen finden. Passen Sie Ihre Anforderungen an oder sagen Sie 'skip'.",
    select_hint: "Antworten Sie mit einer Nummer oder einem Produktnamen.",
    skip_hint: "Sagen Sie 'skip', wenn Sie keines benötigen.",
    selected: "Ausgewählt",
    skipped: "Überspringe",
    power_source_required: "Eine Stromquelle ist erforderlich und kann nicht übersprungen werden. Bitte nennen Sie Ihre Anforderungen.",
    not_applicable: "Diese Stromquelle ist eigenständig; Folgendes entfällt:",
    threshold_not_met: "Ihre Konfiguration ist noch nicht vollständig",
    restate: "Das habe ich leider nicht verstanden. Können Sie Ihre Anforderungen neu formulieren?",
    unavailable: "Der Katalog ist vorübergehend nicht erreichbar. Bitte versuchen Sie es erneut.",
    expired: "Ihre vorherige Sitzung ist abgelaufen, wir beginnen neu.",
    completed: "Ihre Konfiguration ist abgeschlossen. Hier ist Ihre Übersicht:",
    done_hint: "Sagen Sie 'done', um die Konfiguration abzuschließen.",
    confirm_prompt: "Sagen Sie 'yes', um Ihre Konfiguration zu bestätigen und abzuschließen.",
    generic_error: "Bei uns ist etwas schiefgelaufen. Bitte versuchen Sie es erneut.",
};

const FR: Phrases = Phrases {
    greeting: "Bienvenue ! Configurons votre équipement de soudage. Quelles sont vos exigences pour la source de courant ?",
    prompt_for: "Dites-moi ce qu'il vous faut pour",
    found_options: "J'ai trouvé ces options pour",
    compatible_note: "Toutes les options sont compatibles avec votre sélection actuelle.",
    fallback_note: "Aucune option ne correspondait exactement, voici donc toutes les options compatibles.",
    single_option: "Cette option correspond. Dois-je l'ajouter ?",
    no_options: "Je n'ai pas trouvé d'options correspondantes. Ajustez vos exigences ou dites 'skip'.",
    select_hint: "Répondez par un numéro ou un nom de produit.",
    skip_hint: "Dites 'skip' si vous n'en avez pas besoin.",
    selected: "Sélectionné",
    skipped: "Je passe",
    power_source_required: "Une source de courant est obligatoire et ne peut pas être ignorée. Indiquez vos exigences.",
    not_applicable: "Cette source de courant est autonome ; les éléments suivants ne s'appliquent pas :",
    threshold_not_met: "Votre configuration n'est pas encore complète",
    restate: "Désolé, je n'ai pas compris. Pouvez-vous reformuler vos exigences ?",
    unavailable: "Le catalogue est momentanément indisponible. Veuillez réessayer.",
    expired: "Votre session précédente a expiré, nous repartons de zéro.",
    completed: "Votre configuration est terminée. Voici votre récapitulatif :",
    done_hint: "Dites 'done' pour finaliser votre configuration.",
    confirm_prompt: "Dites 'yes' pour confirmer et terminer votre configuration.",
    generic_error: "Une erreur s'est produite de notre côté. Veuillez réessayer.",
};

const ES: Phrases = Phrases {
    greeting: "¡Bienvenido! Configuremos su equipo de soldadura. ¿Qué requisitos tiene para la fuente de energía?",
    prompt_for: "Dígame qué necesita para",
    found_options: "Encontré estas opciones para",
    compatible_note: "Todas las opciones son compatibles con su selección actual.",
    fallback_note: "Ninguna coincidió exactamente con sus requisitos, así que estas son todas las opciones compatibles.",
    single_option: "Esta opción coincide. ¿La agrego?",
    no_options: "No encontré opciones coincidentes. Ajuste sus requisitos o diga 'skip'.",
    select_hint: "Responda con un número o nombre de producto.",
    skip_hint: "Diga 'skip' si no lo necesita.",
    selected: "Seleccionado",
    skipped: "Omitiendo",
    power_source_required: "La fuente de energía es obligatoria y no se puede omitir. Indique sus requisitos.",
    not_applicable: "Esta fuente de energía es autónoma; lo siguiente no aplica:",
    threshold_not_met: "Su configuración aún no está completa",
    restate: "Lo siento, no entendí. ¿Puede reformular sus requisitos?",
    unavailable: "El catálogo no está disponible momentáneamente. Inténtelo de nuevo.",
    expired: "Su sesión anterior expiró, empezamos de nuevo.",
    completed: "Su configuración está completa. Aquí está su resumen:",
    done_hint: "Diga 'done' para finalizar su configuración.",
    confirm_prompt: "Diga 'yes' para confirmar y completar su configuración.",
    generic_error: "Algo salió mal de nuestro lado. Inténtelo de nuevo.",
};

const SV: Phrases = Phrases {
    greeting: "Välkommen! Nu konfigurerar vi din svetsutrustning. Vilka krav har du på strömkällan?",
    prompt_for: "Berätta vad du behöver för",
    found_options: "Jag hittade dessa alternativ för",
    compatible_note: "Alla alternativ är kompatibla med ditt nuvarande val.",
    fallback_note: "Inget motsvarade dina krav exakt, så här är alla kompatibla alternativ.",
    single_option: "Det här alternativet passar. Ska jag lägga till det?",
    no_options: "Jag hittade inga matchande alternativ. Justera dina krav eller säg 'skip'.",
    select_hint: "Svara med ett nummer eller produktnamn.",
    skip_hint: "Säg 'skip' om du inte behöver någon.",
    selected: "Valde",
    skipped: "Hoppar över",
    power_source_required: "En strömkälla krävs och kan inte hoppas över. Ange dina krav.",
    not_applicable: "Den här strömkällan är fristående; följande är inte tillämpligt:",
    threshold_not_met: "Din konfiguration är inte komplett ännu",
    restate: "Jag förstod tyvärr inte. Kan du omformulera dina krav?",
    unavailable: "Katalogen är tillfälligt otillgänglig. Försök igen.",
    expired: "Din tidigare session har gått ut, vi börjar om.",
    completed: "Din konfiguration är klar. Här är din sammanställning:",
    done_hint: "Säg 'done' för att slutföra konfigurationen.",
    confirm_prompt: "Säg 'yes' för att bekräfta och slutföra din konfiguration.",
    generic_error: "Något gick fel hos oss. Försök igen.",
};

impl Phrases {
    /// Phrase table for a tag; untranslated tags render in English.
    pub(super) fn for_tag(tag: LanguageTag) -> &'static Phrases {
        match tag {
            LanguageTag::En => &EN,
            LanguageTag::De => &DE,
            LanguageTag::Fr => &FR,
            LanguageTag::Es => &ES,
            LanguageTag::Sv => &SV,
            _ => &EN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supports_twelve_tags() {
        assert_eq!(LanguageTag::all().len(), 12);
    }

    #[test]
    fn parses_primary_subtag() {
        assert_eq!(LanguageTag::parse_or_default("de-AT"), LanguageTag::De);
        assert_eq!(LanguageTag::parse_or_default("sv_SE"), LanguageTag::Sv);
        assert_eq!(LanguageTag::parse_or_default("PT"), LanguageTag::Pt);
    }

    #[test]
    fn unknown_tags_fall_back_to_english() {
        assert_eq!(LanguageTag::parse_or_default("ja"), LanguageTag::En);
        assert_eq!(LanguageTag::parse_or_default(""), LanguageTag::En);
    }

    #[test]
    fn untranslated_tags_render_english_phrases() {
        let phrases = Phrases::for_tag(LanguageTag::Fi);
        assert_eq!(phrases.greeting, EN.greeting);
    }

    #[test]
    fn translated_tags_have_their_own_phrases() {
        assert_ne!(Phrases::for_tag(LanguageTag::De).greeting, EN.greeting);
        assert_ne!(Phrases::for_tag(LanguageTag::Sv).greeting, EN.greeting);
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(serde_json::to_string(&LanguageTag::De).unwrap(), "\"de\"");
    }
}
