use std::sync::OnceLock;

use regex::Regex;
use serde::de::DeserializeOwned;

use super::GenerationError;

fn fence_regex() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| {
        Regex::new(r"(?is)```(?:json)?(.*?)```").expect("fence pattern is valid")
    })
}

/// JSON payload of a model reply: the first fenced block if any, else the whole reply.
pub fn extract_fenced_json(response: &str) -> &str {
    match fence_regex().captures(response).and_then(|c| c.get(1)) {
        Some(block) => block.as_str().trim(),
        None => response.trim(),
    }
}

/// Strip code fences and any prose around the outermost JSON object.
pub fn trim_to_json_object(response: &str) -> String {
    let without_fences = response.replace("```json", "").replace("```", "");
    let start = without_fences.find('{');
    let end = without_fences.rfind('}');
    match (start, end) {
        (Some(s), Some(e)) if s <= e => without_fences[s..=e].trim().to_string(),
        _ => String::new(),
    }
}

/// Parse the fenced (or bare) JSON payload of a reply into `T`.
pub fn parse_fenced<T: DeserializeOwned>(response: &str) -> Result<T, GenerationError> {
    serde_json::from_str(extract_fenced_json(response))
        .map_err(|e| GenerationError::ResponseParsing(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Reply {
        summary: String,
    }

    #[test]
    fn fenced_json_block_is_extracted() {
        let reply = "Here you go:\n```json\n{\"summary\": \"ok\"}\n```\nThanks";
        assert_eq!(extract_fenced_json(reply), "{\"summary\": \"ok\"}");
    }

    #[test]
    fn fence_without_language_tag() {
        let reply = "```\n{\"summary\": \"plain\"}\n```";
        let reply_json: Reply = parse_fenced(reply).unwrap();
        assert_eq!(reply_json.summary, "plain");
    }

    #[test]
    fn uppercase_language_tag_is_accepted() {
        let reply = "```JSON\n{\"summary\": \"upper\"}\n```";
        let reply_json: Reply = parse_fenced(reply).unwrap();
        assert_eq!(reply_json.summary, "upper");
    }

    #[test]
    fn bare_reply_is_trimmed() {
        assert_eq!(extract_fenced_json("  {\"a\":1}\n"), "{\"a\":1}");
    }

    #[test]
    fn prose_reply_fails_to_parse() {
        let result: Result<Reply, _> = parse_fenced("I cannot read this prescription.");
        assert!(matches!(result, Err(GenerationError::ResponseParsing(_))));
    }

    #[test]
    fn outermost_object_is_kept() {
        let reply = "Sure! ```json {\"a\": {\"b\": 1}} ``` Hope this helps.";
        assert_eq!(trim_to_json_object(reply), "{\"a\": {\"b\": 1}}");
    }

    #[test]
    fn no_braces_yields_empty() {
        assert_eq!(trim_to_json_object("nothing here"), "");
        assert_eq!(trim_to_json_object("} backwards {"), "");
    }
}
