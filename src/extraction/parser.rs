use serde_json::Value;

use super::{ExtractionError, RawLabValues};

/// Parse the model's reply into a raw value map.
///
/// Code-fence markers are removed and any prose around the outermost
/// `{...}` is discarded. The result must be a JSON object.
pub fn parse_extraction_response(response: &str) -> Result<RawLabValues, ExtractionError> {
    let cleaned = strip_code_fences(response);
    let json_str = outermost_object(&cleaned)
        .ok_or_else(|| ExtractionError::MalformedResponse("No JSON object found".into()))?;

    let value: Value = serde_json::from_str(json_str)
        .map_err(|e| ExtractionError::MalformedResponse(e.to_string()))?;

    match value {
        Value::Object(map) => Ok(map),
        _ => Err(ExtractionError::MalformedResponse(
            "Top-level JSON is not an object".into(),
        )),
    }
}

fn strip_code_fences(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_string()
}

fn outermost_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}
