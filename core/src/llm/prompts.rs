//! The schema-instruction system prompt appended before a structured call.

/// Builds the system-prompt text instructing the model to return JSON
/// conforming to `schema` and nothing else.
#[must_use]
pub fn generate(schema: &str) -> String {
    format!(
        r#"You must respond with valid JSON that strictly conforms to the following JSON schema:

{schema}

Requirements:
- Your response must be ONLY valid JSON, no additional text, explanations, or markdown
- The JSON must exactly match the schema structure and types
- All required fields must be present
- Use appropriate data types (strings, numbers, booleans, arrays, objects)
- Ensure proper JSON syntax with correct quotes, brackets, and commas
- Do not include any text before or after the JSON"#
    )
}
