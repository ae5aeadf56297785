//! Parse provider output into event candidates

use crate::LlmError;
use docket_domain::CharInterval;
use serde_json::Value;
use tracing::{debug, warn};

/// One event as returned by a provider, before numbering and attribution
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedEvent {
    /// Description of the event
    pub particulars: String,
    /// Verbatim citation, or empty
    pub citation: String,
    /// Date, or empty
    pub date: String,
    /// Location of the citation in the source text, once grounded
    pub char_interval: Option<CharInterval>,
}

/// Parse a provider's JSON content into event candidates
///
/// Accepts a JSON array, an object wrapping the array under `events` or
/// `extractions`, or a single event object. Markdown code fences and leading
/// prose are tolerated. Items without particulars are skipped.
pub fn parse_event_response(response: &str) -> Result<Vec<ParsedEvent>, LlmError> {
    let json_str = extract_json(response)?;

    let json: Value = serde_json::from_str(json_str)
        .map_err(|e| LlmError::InvalidResponse(format!("JSON parse error: {}", e)))?;

    let items = match json {
        Value::Array(items) => items,
        Value::Object(mut obj) => {
            if let Some(Value::Array(items)) = obj.remove("events") {
                items
            } else if let Some(Value::Array(items)) = obj.remove("extractions") {
                items
            } else {
                vec![Value::Object(obj)]
            }
        }
        _ => {
            return Err(LlmError::InvalidResponse(
                "Expected a JSON array or object".to_string(),
            ))
        }
    };

    let mut events = Vec::with_capacity(items.len());
    for (idx, item) in items.iter().enumerate() {
        match parse_event_json(item) {
            Ok(event) => events.push(event),
            Err(e) => warn!("Skipping extraction {}: {}", idx, e),
        }
    }

    Ok(events)
}

/// Extract the JSON payload, handling markdown code blocks and leading prose
fn extract_json(response: &str) -> Result<&str, LlmError> {
    let trimmed = response.trim();
    if trimmed.is_empty() {
        return Err(LlmError::InvalidResponse("Empty response".to_string()));
    }

    if let Some(rest) = trimmed.strip_prefix("```") {
        // Skip the fence line (```json or ```) and the closing fence
        let body = match rest.find('\n') {
            Some(pos) => &rest[pos + 1..],
            None => return Err(LlmError::InvalidResponse("Empty code block".to_string())),
        };
        let body = body.trim_end();
        let body = body.strip_suffix("```").unwrap_or(body);
        return Ok(body.trim());
    }

    // Some models wrap the JSON in a sentence before or after it
    let start = trimmed.find(['[', '{']).ok_or_else(|| {
        LlmError::InvalidResponse("No JSON found in response".to_string())
    })?;
    if start > 0 {
        debug!("Discarding {} chars of prose before JSON", start);
    }
    let candidate = &trimmed[start..];
    match closing_bracket(candidate) {
        Some(end) => {
            if end + 1 < candidate.len() {
                debug!("Discarding {} chars after JSON", candidate.len() - end - 1);
            }
            Ok(&candidate[..=end])
        }
        None => Ok(candidate),
    }
}

/// Byte index of the bracket closing the one `text` starts with
///
/// Brackets inside JSON strings are ignored.
fn closing_bracket(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '[' | '{' => depth += 1,
            ']' | '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(idx);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parse a single event from JSON
fn parse_event_json(json: &Value) -> Result<ParsedEvent, String> {
    let obj = json
        .as_object()
        .ok_or_else(|| "Extraction is not a JSON object".to_string())?;

    let particulars = obj
        .get("event_particulars")
        .map(value_to_string)
        .unwrap_or_default();
    if particulars.is_empty() {
        return Err("Missing or empty 'event_particulars'".to_string());
    }

    // document_reference is deliberately ignored; the orchestrator assigns it
    let citation = normalize_citation(&obj.get("citation").map(value_to_string).unwrap_or_default());
    let date = normalize_date(&obj.get("date").map(value_to_string).unwrap_or_default());

    Ok(ParsedEvent {
        particulars,
        citation,
        date,
        char_interval: None,
    })
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

fn is_placeholder(value: &str) -> bool {
    let lowered = value
        .trim()
        .trim_end_matches(['.', ';', ','])
        .to_ascii_lowercase();
    matches!(
        lowered.as_str(),
        "" | "-" | "n/a" | "na" | "none" | "null" | "nil" | "unknown" | "not applicable"
            | "not available" | "not specified"
    )
}

/// Replace placeholder citations such as `N/A` or `No citation available` with `""`
pub fn normalize_citation(raw: &str) -> String {
    let trimmed = raw.trim();
    if is_placeholder(trimmed) || trimmed.to_ascii_lowercase().starts_with("no citation") {
        String::new()
    } else {
        trimmed.to_string()
    }
}

/// Replace placeholder dates such as `Date not available` with `""`
pub fn normalize_date(raw: &str) -> String {
    let trimmed = raw.trim();
    let lowered = trimmed.to_ascii_lowercase();
    if is_placeholder(trimmed) || lowered.starts_with("date not") || lowered == "no date" {
        String::new()
    } else {
        trimmed.to_string()
    }
}

/// Blank citations that do not occur in `source` and locate the ones that do
///
/// Matching ignores case and collapses whitespace runs, so line breaks in the
/// source do not defeat a verbatim citation.
pub fn ground_citations(events: &mut [ParsedEvent], source: &str) {
    let (haystack, offsets) = normalize_with_offsets(source);

    for event in events.iter_mut().filter(|e| !e.citation.is_empty()) {
        let (needle, _) = normalize_with_offsets(&event.citation);
        match find(&haystack, &needle) {
            Some(start) => {
                let last = start + needle.len() - 1;
                event.char_interval = Some(CharInterval {
                    start: offsets[start],
                    end: offsets[last] + 1,
                });
            }
            None => {
                warn!("Dropping citation not found in source text: {:?}", event.citation);
                event.citation.clear();
                event.char_interval = None;
            }
        }
    }
}

/// Lowercased characters with whitespace runs collapsed, and each character's
/// offset in the original text
fn normalize_with_offsets(text: &str) -> (Vec<char>, Vec<usize>) {
    let mut chars = Vec::with_capacity(text.len());
    let mut offsets = Vec::with_capacity(text.len());
    let mut in_space = false;

    for (idx, c) in text.chars().enumerate() {
        if c.is_whitespace() {
            if !in_space && !chars.is_empty() {
                chars.push(' ');
                offsets.push(idx);
            }
            in_space = true;
        } else {
            in_space = false;
            for lower in c.to_lowercase() {
                chars.push(lower);
                offsets.push(idx);
            }
        }
    }
    if chars.last() == Some(&' ') {
        chars.pop();
        offsets.pop();
    }
    (chars, offsets)
}

fn find(haystack: &[char], needle: &[char]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_array() {
        let response = r#"[
            {
                "event_particulars": "The plaintiff filed a complaint for breach of contract.",
                "citation": "Cal. Civ. Code § 3300",
                "document_reference": "",
                "date": "2021-03-15"
            }
        ]"#;

        let events = parse_event_response(response).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].citation, "Cal. Civ. Code § 3300");
        assert_eq!(events[0].date, "2021-03-15");
    }

    #[test]
    fn test_parse_json_with_markdown_wrapper() {
        let response = "```json\n[{\"event_particulars\": \"Hearing held.\", \"citation\": \"\", \"document_reference\": \"\", \"date\": \"\"}]\n```";
        let events = parse_event_response(response).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].particulars, "Hearing held.");
    }

    #[test]
    fn test_parse_wrapped_object() {
        let events = parse_event_response(
            r#"{"events": [{"event_particulars": "A"}, {"event_particulars": "B"}]}"#,
        )
        .unwrap();
        assert_eq!(events.len(), 2);

        let events =
            parse_event_response(r#"{"extractions": [{"event_particulars": "C"}]}"#).unwrap();
        assert_eq!(events[0].particulars, "C");
    }

    #[test]
    fn test_parse_single_object() {
        let events =
            parse_event_response(r#"{"event_particulars": "Order entered.", "date": "May 1"}"#)
                .unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].date, "May 1");
    }

    #[test]
    fn test_prose_before_json() {
        let events =
            parse_event_response("Here are the events:\n[{\"event_particulars\": \"X\"}]").unwrap();
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_prose_after_json() {
        let response = "[{\"event_particulars\": \"Motion [ECF 12] granted.\", \"citation\": \"\"}]\n\nLet me know if you need anything else.";
        let events = parse_event_response(response).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].particulars, "Motion [ECF 12] granted.");

        let events = parse_event_response(
            "Result: {\"events\": [{\"event_particulars\": \"Y\"}]} (2 tokens)",
        )
        .unwrap();
        assert_eq!(events[0].particulars, "Y");
    }

    #[test]
    fn test_closing_bracket_skips_strings() {
        assert_eq!(closing_bracket(r#"{"a": "}\"]"} tail"#), Some(12));
        assert_eq!(closing_bracket("[1, [2]"), None);
    }

    #[test]
    fn test_missing_optional_fields_become_empty() {
        let events =
            parse_event_response(r#"[{"event_particulars": "X", "citation": null}]"#).unwrap();
        assert_eq!(events[0].citation, "");
        assert_eq!(events[0].date, "");
    }

    #[test]
    fn test_items_without_particulars_are_skipped() {
        let events = parse_event_response(
            r#"[{"event_particulars": ""}, {"citation": "x"}, "text", {"event_particulars": "Kept"}]"#,
        )
        .unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].particulars, "Kept");
    }

    #[test]
    fn test_empty_array_is_ok() {
        assert!(parse_event_response("[]").unwrap().is_empty());
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            parse_event_response("This is not JSON"),
            Err(LlmError::InvalidResponse(_))
        ));
        assert!(parse_event_response("").is_err());
        assert!(parse_event_response("42").is_err());
    }

    #[test]
    fn test_placeholder_citations_become_empty() {
        for placeholder in [
            "N/A",
            "None",
            "null",
            "No citation available",
            "No citation available (extraction failed)",
            "Not applicable.",
        ] {
            assert_eq!(normalize_citation(placeholder), "", "{placeholder}");
        }
        assert_eq!(normalize_citation(" 28 U.S.C. § 1332 "), "28 U.S.C. § 1332");
    }

    #[test]
    fn test_placeholder_dates_become_empty() {
        assert_eq!(normalize_date("Date not available"), "");
        assert_eq!(normalize_date("unknown"), "");
        assert_eq!(normalize_date("January 5, 2020"), "January 5, 2020");
    }

    #[test]
    fn test_ground_citation_found_across_line_break() {
        let source = "The court relied on Fed. R.\nCiv. P. 12(b)(6) in dismissing.";
        let mut events = vec![ParsedEvent {
            particulars: "Dismissed.".into(),
            citation: "Fed. R. Civ. P. 12(b)(6)".into(),
            date: String::new(),
            char_interval: None,
        }];
        ground_citations(&mut events, source);

        let interval = events[0].char_interval.unwrap();
        assert_eq!(events[0].citation, "Fed. R. Civ. P. 12(b)(6)");
        let located: String = source
            .chars()
            .skip(interval.start)
            .take(interval.end - interval.start)
            .collect();
        assert_eq!(located, "Fed. R.\nCiv. P. 12(b)(6)");
    }

    #[test]
    fn test_ground_citation_blanks_fabrications() {
        let source = "The parties met on June 1 to discuss settlement.";
        let mut events = vec![ParsedEvent {
            particulars: "Settlement meeting.".into(),
            citation: "Smith v. Jones, 123 F.3d 456".into(),
            date: "June 1".into(),
            char_interval: None,
        }];
        ground_citations(&mut events, source);

        assert_eq!(events[0].citation, "");
        assert!(events[0].char_interval.is_none());
        assert_eq!(events[0].date, "June 1");
    }
}
