use crate::labs::registry;

/// System prompt asking for one JSON object keyed by every registry parameter.
pub fn build_system_prompt() -> String {
    let mut schema = String::from("{\n  \"report_date\": \"YYYY-MM\"");
    for def in registry::all() {
        schema.push_str(&format!(",\n  \"{}\": number", def.key));
    }
    schema.push_str("\n}");

    format!(
        "You are a medical data extraction specialist. Extract blood test results from the PDF.\n\
         Return ONLY a valid JSON object with these exact keys (use null if not found):\n\
         {schema}\n\
         Numeric values only. No units, no text. Just the JSON."
    )
}

/// User instruction accompanying the attached document.
pub fn build_user_prompt(filename: &str) -> String {
    format!("Extract blood test values from: {filename}")
}
