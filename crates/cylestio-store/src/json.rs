use cylestio_types::Value;

use crate::Result;

/// Columns typed `TEXT` but carrying JSON (`data`, `prompt`, `input_params`,
/// `matched_terms`, ...) are stored as their `serde_json` text form and
/// decoded back on read.
pub fn encode(value: &Value) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

pub fn decode(raw: &str) -> Result<Value> {
    Ok(serde_json::from_str(raw)?)
}

pub fn encode_opt(value: &Option<Value>) -> Result<Option<String>> {
    value.as_ref().map(encode).transpose()
}

pub fn decode_opt(raw: Option<String>) -> Result<Option<Value>> {
    raw.as_deref().map(decode).transpose()
}

pub fn encode_strings(values: &[String]) -> Result<String> {
    Ok(serde_json::to_string(values)?)
}

pub fn decode_strings(raw: &str) -> Result<Vec<String>> {
    Ok(serde_json::from_str(raw)?)
}

pub fn encode_strings_opt(values: &Option<Vec<String>>) -> Result<Option<String>> {
    values
        .as_ref()
        .map(|v| encode_strings(v))
        .transpose()
}

pub fn decode_strings_opt(raw: Option<String>) -> Result<Option<Vec<String>>> {
    raw.as_deref().map(decode_strings).transpose()
}
