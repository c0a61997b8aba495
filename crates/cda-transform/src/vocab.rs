//! Source-to-target vocabulary normalization.
//!
//! Aggregator extracts carry free-text demographics and staging values from
//! dozens of upstream programs. Normalization maps them onto the closed
//! target code sets; a value outside a closed set is a `FieldMapping` error,
//! which callers record as a warning rather than failing the record.

use serde_json::{Value, json};

use cda_model::TransformError;

/// Canonical `CodeableConcept`-shaped field value.
pub fn codeable_concept(system: &str, code: &str, display: &str) -> Value {
    json!({
        "coding": [{ "system": system, "code": code, "display": display }],
        "text": display,
    })
}

/// Text-only concept for values passed through without a code lookup.
pub fn concept_text(text: &str) -> Value {
    json!({ "text": text })
}

/// Day-denominated quantity (ages and offsets arrive as day counts).
pub fn days_quantity(days: i64) -> Value {
    json!({
        "value": days,
        "unit": "days",
        "system": "http://unitsofmeasure.org",
        "code": "d",
    })
}

/// Keep only ASCII alphanumerics, uppercased, for lenient matching.
fn compact_key(value: &str) -> String {
    value
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|ch| ch.to_ascii_uppercase())
        .collect()
}

/// CDA `sex` to the target birth-sex code (`M`/`F`/`UNK`).
pub fn normalize_sex(raw: &str) -> Result<&'static str, TransformError> {
    match raw.trim() {
        "male" | "Male" | "M" => Ok("M"),
        "female" | "Female" | "F" => Ok("F"),
        "Unspecified" | "Not specified in data" | "O" | "U" | "0000" => Ok("UNK"),
        other => Err(TransformError::field_mapping(
            "sex",
            other,
            "not a recognized birth-sex value",
        )),
    }
}

/// CDA `vital_status` to the deceased flag.
pub fn normalize_vital_status(raw: &str) -> Result<bool, TransformError> {
    match raw.trim() {
        "Dead" => Ok(true),
        "Alive" => Ok(false),
        other => Err(TransformError::field_mapping(
            "vital_status",
            other,
            "not a recognized vital status",
        )),
    }
}

/// CDA `race` to the target race category. Open-ended upstream values fall
/// back to `not reported`, matching the aggregator convention.
pub fn normalize_race(raw: &str) -> &'static str {
    match compact_key(raw).as_str() {
        "WHITE" => "White",
        "BLACKORAFRICANAMERICAN" => "Black or African American",
        "ASIAN" => "Asian",
        "NATIVEHAWAIIANOROTHERPACIFICISLANDER" => "Native Hawaiian or Other Pacific Islander",
        "AMERICANINDIANORALASKANATIVE" => "American Indian or Alaska Native",
        _ => "not reported",
    }
}

/// CDA `ethnicity` to the target ethnicity category.
pub fn normalize_ethnicity(raw: &str) -> &'static str {
    let compact = compact_key(raw);
    if compact.starts_with("NOTHISPANIC") || compact.starts_with("NONHISPANIC") {
        return "not hispanic or latino";
    }
    if compact.starts_with("HISPANIC") {
        return "hispanic or latino";
    }
    match compact.as_str() {
        "ANONYMOUS" | "ANONYMIZED" | "REMOVED" | "PATIENTREFUSED" | "PATIENTDECLINED" => {
            "not reported"
        }
        _ => "unknown",
    }
}

/// Pathologic/clinical stage to a canonical `Stage ...` display.
pub fn normalize_stage(raw: &str) -> Result<String, TransformError> {
    let compact = compact_key(raw);
    let body = compact.strip_prefix("STAGE").unwrap_or(&compact);
    let (numeral, modifier) = split_stage_body(body);
    let valid_numeral = matches!(numeral, "0" | "I" | "II" | "III" | "IV");
    let valid_modifier = modifier.is_empty() || matches!(modifier, "A" | "B" | "C");
    if body.is_empty() || !valid_numeral || !valid_modifier {
        return Err(TransformError::field_mapping(
            "stage",
            raw,
            "not a recognized stage value",
        ));
    }
    Ok(format!("Stage {numeral}{modifier}"))
}

fn split_stage_body(body: &str) -> (&str, &str) {
    let split = body
        .char_indices()
        .find(|(_, ch)| !matches!(ch, 'I' | 'V' | '0'))
        .map_or(body.len(), |(idx, _)| idx);
    body.split_at(split)
}
