//! Canonical attribute forms and per-kind vocabularies.
//!
//! Every attribute the extractor may emit has a canonical textual form.
//! These checks run on *receipt* of extractor output; a value outside its
//! canonical form is an extraction failure, never silently accepted.
//!
//! | attribute     | canonical form              | example        |
//! |---------------|-----------------------------|----------------|
//! | current       | `<int> A`                   | `500 A`        |
//! | voltage       | `<int>V`                    | `230V`         |
//! | phase         | `single-phase` / `3-phase`  |                |
//! | process       | `<Name> (<Abbrev>)`         | `MIG (GMAW)`   |
//! | cooling_type  | `water` / `air` / `none`    |                |
//! | wire_size     | `0.XXX inch`                | `0.035 inch`   |
//! | cable_length  | `<int> ft`                  | `25 ft`        |
//! | portability   | `portable` / `stationary`   |                |
//! | material      | lowercase token             | `aluminum`     |
//! | accessory_type| lowercase token             | `remote`       |

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

use crate::domain::catalog::ComponentKind;
use crate::domain::foundation::ValidationError;

static CURRENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+ A$").unwrap());
static VOLTAGE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+V$").unwrap());
static PROCESS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z/ -]* \([A-Z]+\)$").unwrap());
static WIRE_SIZE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^0\.\d{3} inch$").unwrap());
static CABLE_LENGTH_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+ ft$").unwrap());
static TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z][a-z0-9 -]*$").unwrap());

/// The attribute vocabulary for a component kind.
pub fn vocabulary_for(kind: ComponentKind) -> &'static [&'static str] {
    match kind {
        ComponentKind::PowerSource => {
            &["process", "current", "voltage", "phase", "material", "portability"]
        }
        ComponentKind::Feeder => {
            &["process", "wire_size", "cooling_type", "portability", "material"]
        }
        ComponentKind::Cooler => &["cooling_type"],
        ComponentKind::Interconnector => &["cable_length", "current", "cooling_type"],
        ComponentKind::Torch => &["process", "current", "cooling_type"],
        ComponentKind::Accessory(_) => &["accessory_type", "cable_length"],
    }
}

/// Validates one attribute write against the kind's vocabulary and the
/// attribute's canonical form.
pub fn validate_attribute(
    kind: ComponentKind,
    attribute: &str,
    value: &str,
) -> Result<(), ValidationError> {
    if !vocabulary_for(kind).contains(&attribute) {
        return Err(ValidationError::unknown_attribute(kind.master_key(), attribute));
    }

    let ok = match attribute {
        "current" => CURRENT_RE.is_match(value),
        "voltage" => VOLTAGE_RE.is_match(value),
        "phase" => value == "single-phase" || value == "3-phase",
        "process" => PROCESS_RE.is_match(value),
        "cooling_type" => matches!(value, "water" | "air" | "none"),
        "wire_size" => WIRE_SIZE_RE.is_match(value),
        "cable_length" => CABLE_LENGTH_RE.is_match(value),
        "portability" => value == "portable" || value == "stationary",
        "material" | "accessory_type" => TOKEN_RE.is_match(value),
        _ => false,
    };

    if ok {
        Ok(())
    } else {
        Err(ValidationError::invalid_format(
            attribute,
            format!("'{}' is not in canonical form", value),
        ))
    }
}

/// Validates a whole per-component delta as received from the extractor.
pub fn validate_bag_updates(
    kind: ComponentKind,
    updates: &BTreeMap<String, String>,
) -> Result<(), ValidationError> {
    for (attribute, value) in updates {
        validate_attribute(kind, attribute, value)?;
    }
    Ok(())
}
