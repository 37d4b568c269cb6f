//! Response-shape normalisation.
//!
//! Upstream model servers answer in several formats. Each known shape is one
//! row of [`EXTRACTORS`]; the first row that yields a string wins, and an
//! unrecognised body falls back to its compact JSON rendering. Supporting a
//! new format means adding a row.

use serde_json::Value;
use tracing::debug;

/// Pulls the reply text out of one response shape.
pub type Extractor = fn(&Value) -> Option<String>;

/// Known shapes, tried in order.
pub const EXTRACTORS: &[(&str, Extractor)] = &[
    ("gateway", gateway_reply),
    ("openai", openai_choices),
    ("huggingface", generated_text),
    ("ollama", response_field),
    ("output", output_field),
];

fn string_at(value: &Value, pointer: &str) -> Option<String> {
    value.pointer(pointer).and_then(Value::as_str).map(str::to_owned)
}

fn gateway_reply(body: &Value) -> Option<String> {
    string_at(body, "/reply/content")
}

fn openai_choices(body: &Value) -> Option<String> {
    string_at(body, "/choices/0/message/content")
}

fn generated_text(body: &Value) -> Option<String> {
    string_at(body, "/generated_text").or_else(|| string_at(body, "/0/generated_text"))
}

fn response_field(body: &Value) -> Option<String> {
    string_at(body, "/response")
}

fn output_field(body: &Value) -> Option<String> {
    string_at(body, "/output")
}

/// Name of the first matching shape and the text it yields.
#[must_use]
pub fn match_shape(body: &Value) -> Option<(&'static str, String)> {
    EXTRACTORS
        .iter()
        .find_map(|(name, extract)| extract(body).map(|text| (*name, text)))
}

/// Reply text from any known shape, or the whole body as compact JSON.
#[must_use]
pub fn extract_content(body: &Value) -> String {
    match match_shape(body) {
        Some((shape, text)) => {
            debug!(shape, "Matched response shape");
            text
        }
        None => {
            debug!("Unrecognised response shape, returning raw body");
            body.to_string()
        }
    }
}
