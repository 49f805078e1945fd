//! Tolerant unwrapping and strict validation of model responses.
//!
//! The only tolerance is for a surrounding fenced code block. Everything
//! inside must be a JSON object carrying all five metadata fields with the
//! right shapes; nothing is coerced or defaulted.

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{SynthesisError, SynthesisResult};
use crate::types::record::MetadataRecord;

const FENCE: &str = "```";

/// Field names the model must return.
pub const METADATA_FIELDS: [&str; 5] = [
    "website_name",
    "img_url",
    "summary",
    "key_features",
    "associated_links",
];

/// Remove a surrounding fenced code block, if present.
///
/// Accepts an optional info string after the opening fence (```` ```json ````).
/// Text that is not fully wrapped is returned trimmed but otherwise unchanged.
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();

    let Some(inner) = trimmed
        .strip_prefix(FENCE)
        .and_then(|rest| rest.strip_suffix(FENCE))
    else {
        return trimmed;
    };

    let info_len = inner
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
        .unwrap_or(inner.len());

    inner[info_len..].trim()
}

/// Parse a raw model response into a validated [`MetadataRecord`].
pub fn parse_metadata_response(raw: &str) -> SynthesisResult<MetadataRecord> {
    let body = strip_code_fence(raw);

    let value: Value =
        serde_json::from_str(body).map_err(|e| SynthesisError::InvalidJson(e.to_string()))?;

    let object = match value {
        Value::Object(object) => object,
        other => {
            return Err(SynthesisError::schema(
                "$",
                format!("expected a JSON object, found {}", type_name(&other)),
            ))
        }
    };

    let extra: Vec<_> = object
        .keys()
        .filter(|k| !METADATA_FIELDS.contains(&k.as_str()))
        .collect();
    if !extra.is_empty() {
        debug!(fields = ?extra, "Ignoring unexpected fields in model response");
    }

    Ok(MetadataRecord {
        website_name: required_string(&object, "website_name")?,
        img_url: required_string(&object, "img_url")?,
        summary: required_string(&object, "summary")?,
        key_features: required_string_list(&object, "key_features")?,
        associated_links: required_string_list(&object, "associated_links")?,
    })
}

fn required<'a>(object: &'a Map<String, Value>, field: &str) -> SynthesisResult<&'a Value> {
    object
        .get(field)
        .ok_or_else(|| SynthesisError::schema(field, "is missing"))
}

fn required_string(object: &Map<String, Value>, field: &str) -> SynthesisResult<String> {
    match required(object, field)? {
        Value::String(s) => Ok(s.clone()),
        other => Err(SynthesisError::schema(
            field,
            format!("must be a string, found {}", type_name(other)),
        )),
    }
}

fn required_string_list(object: &Map<String, Value>, field: &str) -> SynthesisResult<Vec<String>> {
    match required(object, field)? {
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| match item {
                Value::String(s) => Ok(s.clone()),
                other => Err(SynthesisError::schema(
                    format!("{}[{}]", field, i),
                    format!("must be a string, found {}", type_name(other)),
                )),
            })
            .collect(),
        other => Err(SynthesisError::schema(
            field,
            format!("must be an array of strings, found {}", type_name(other)),
        )),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"{
        "website_name": "Example Co",
        "img_url": "https://example.com/favicon.ico",
        "summary": "Example Co builds examples.",
        "key_features": ["Fast", "Reliable"],
        "associated_links": ["https://example.com/about"]
    }"#;

    fn schema_field(err: SynthesisError) -> String {
        match err {
            SynthesisError::SchemaViolation { field, .. } => field,
            other => panic!("expected schema violation, got {:?}", other),
        }
    }

    #[test]
    fn test_parses_plain_json() {
        let record = parse_metadata_response(VALID).unwrap();
        assert_eq!(record.website_name, "Example Co");
        assert_eq!(record.key_features, vec!["Fast", "Reliable"]);
        assert_eq!(record.associated_links, vec!["https://example.com/about"]);
    }

    #[test]
    fn test_strips_fences() {
        let tagged = format!("```json\n{}\n```", VALID);
        let bare = format!("```\n{}\n```", VALID);
        let inline = format!("  ```JSON{}```  ", VALID);

        let expected = parse_metadata_response(VALID).unwrap();
        assert_eq!(parse_metadata_response(&tagged).unwrap(), expected);
        assert_eq!(parse_metadata_response(&bare).unwrap(), expected);
        assert_eq!(parse_metadata_response(&inline).unwrap(), expected);
    }

    #[test]
    fn test_strip_code_fence_leaves_unwrapped_text() {
        assert_eq!(strip_code_fence("  {\"a\": 1} "), "{\"a\": 1}");
        assert_eq!(strip_code_fence("```json\n{\"a\": 1}"), "```json\n{\"a\": 1}");
    }

    #[test]
    fn test_invalid_json() {
        let err = parse_metadata_response("Sure! Here is the JSON you asked for.").unwrap_err();
        assert_eq!(err.reason(), "invalid_json");

        let truncated = parse_metadata_response("```json\n{\"website_name\": \"Ex").unwrap_err();
        assert_eq!(truncated.reason(), "invalid_json");
    }

    #[test]
    fn test_missing_key_features() {
        let json = r#"{
            "website_name": "Example",
            "img_url": "",
            "summary": "s",
            "associated_links": []
        }"#;
        let err = parse_metadata_response(json).unwrap_err();
        assert_eq!(err.reason(), "schema_violation");
        assert_eq!(schema_field(err), "key_features");
    }

    #[test]
    fn test_wrong_shapes() {
        let not_list = r#"{"website_name":"E","img_url":"","summary":"s","key_features":"Fast","associated_links":[]}"#;
        assert_eq!(
            schema_field(parse_metadata_response(not_list).unwrap_err()),
            "key_features"
        );

        let bad_item = r#"{"website_name":"E","img_url":"","summary":"s","key_features":["a", 2],"associated_links":[]}"#;
        assert_eq!(
            schema_field(parse_metadata_response(bad_item).unwrap_err()),
            "key_features[1]"
        );

        let null_img = r#"{"website_name":"E","img_url":null,"summary":"s","key_features":[],"associated_links":[]}"#;
        assert_eq!(
            schema_field(parse_metadata_response(null_img).unwrap_err()),
            "img_url"
        );
    }

    #[test]
    fn test_non_object_top_level() {
        let err = parse_metadata_response(r#"["website_name"]"#).unwrap_err();
        assert_eq!(schema_field(err), "$");
    }

    #[test]
    fn test_empty_img_url_and_extra_fields_accepted() {
        let json = r#"{"website_name":"E","img_url":"","summary":"s","key_features":[],"associated_links":[],"confidence":0.9}"#;
        let record = parse_metadata_response(json).unwrap();
        assert_eq!(record.img_url, "");
        assert!(record.key_features.is_empty());
    }
}
