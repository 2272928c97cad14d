//! Common utility functions used across Voyage components

use uuid::Uuid;

/// Generate a short ID for display purposes (8 characters)
pub fn generate_short_id() -> String {
    Uuid::new_v4().to_string()[..8].to_string()
}

/// Truncate to at most `max_chars` characters, appending "..." when cut
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

/// Pull the JSON object out of an LLM reply.
///
/// Models wrap JSON in markdown fences or prose despite instructions; this
/// returns the span from the first `{` to the last `}`.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_id_length() {
        assert_eq!(generate_short_id().len(), 8);
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("hello", 10), "hello");
        assert_eq!(truncate_chars("hello world", 5), "hello...");
        // multi-byte characters are never split
        assert_eq!(truncate_chars("héllo", 2), "hé...");
    }

    #[test]
    fn test_extract_json_object() {
        let fenced = "```json\n{\"intent\": \"confirm\"}\n```";
        assert_eq!(extract_json_object(fenced), Some("{\"intent\": \"confirm\"}"));
        assert_eq!(extract_json_object("no json here"), None);
        assert_eq!(extract_json_object("} backwards {"), None);
    }
}
