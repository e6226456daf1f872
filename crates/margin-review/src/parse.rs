//! Tolerant parsing of LLM JSON responses.

use serde::de::DeserializeOwned;

/// Strip an optional surrounding ```json fence, then trim.
pub(crate) fn strip_json_fence(response: &str) -> &str {
    let trimmed = response.trim();

    let Some(rest) = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
    else {
        return trimmed;
    };

    let rest = rest.strip_prefix('\n').unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.strip_suffix('\n').unwrap_or(rest).trim()
}

/// Fence-strip and parse a JSON array of `T`.
pub(crate) fn parse_json_array<T: DeserializeOwned>(
    response: &str,
) -> Result<Vec<T>, serde_json::Error> {
    serde_json::from_str(strip_json_fence(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Item {
        quote: String,
    }

    #[test]
    fn test_bare_json_passes_through() {
        assert_eq!(strip_json_fence("[1, 2]"), "[1, 2]");
    }

    #[test]
    fn test_json_fence_is_stripped() {
        assert_eq!(strip_json_fence("```json\n[1, 2]\n```"), "[1, 2]");
        assert_eq!(strip_json_fence("```\n[1, 2]\n```"), "[1, 2]");
    }

    #[test]
    fn test_fence_without_newlines() {
        assert_eq!(strip_json_fence("```json[1]```"), "[1]");
    }

    #[test]
    fn test_surrounding_whitespace_ignored() {
        assert_eq!(strip_json_fence("  \n```json\n[]\n```\n  "), "[]");
    }

    #[test]
    fn test_parse_array_of_items() {
        let parsed: Vec<Item> =
            parse_json_array("```json\n[{\"quote\": \"abc\"}]\n```").unwrap();
        assert_eq!(
            parsed,
            vec![Item {
                quote: "abc".to_string()
            }]
        );
    }

    #[test]
    fn test_non_json_is_an_error() {
        assert!(parse_json_array::<Item>("I refuse to answer.").is_err());
    }

    #[test]
    fn test_object_instead_of_array_is_an_error() {
        assert!(parse_json_array::<Item>("{\"quote\": \"abc\"}").is_err());
    }
}
