//! Prompt contract shared by every event provider
//!
//! Every adapter asks for a JSON array whose elements have exactly four keys:
//! `event_particulars`, `citation`, `document_reference` and `date`. Changing
//! the keys means changing [`crate::parser`] and every adapter with it.

/// Keys each extracted item must carry
pub const CONTRACT_KEYS: [&str; 4] = ["event_particulars", "citation", "document_reference", "date"];

/// Instructions describing the four-key contract
pub const LEGAL_EVENTS_PROMPT: &str = r#"Extract legal events from this document. For each event, return exactly four JSON keys:

1. "event_particulars" - REQUIRED: a complete description (2-8 sentences as appropriate) of what happened, including relevant context, parties involved, procedural background and implications. Use verbatim or paraphrased text from the document. Never leave this field empty.
2. "citation" - The exact legal authority cited for the event (statute, rule, case, docket number). Copy the reference verbatim from the document. Use an empty string "" when no explicit legal citation appears. Never invent a citation.
3. "document_reference" - Always an empty string "". The caller fills it with the source file name.
4. "date" - The specific date mentioned for the event, or an empty string "" if none is given.

Requirements:
- Use empty strings ("") for missing values, except "event_particulars" which must never be empty.
- "citation" may only contain legal references that actually appear in the text.
- Return all four keys for every extraction.

Extract all legally significant events, proceedings, filings, agreements and deadlines."#;

/// Closing instruction for APIs that do not enforce JSON output
pub const JSON_ARRAY_INSTRUCTION: &str =
    "Return your response as a valid JSON array containing the extracted events, with no other text.";

/// Closing instruction for APIs in JSON-object mode, which cannot return a bare array
pub const JSON_OBJECT_INSTRUCTION: &str =
    "Return your response as a JSON object of the form {\"events\": [...]} containing the extracted events.";

/// System message for message-array APIs
pub fn system_prompt(json_object_mode: bool) -> String {
    let closing = if json_object_mode {
        JSON_OBJECT_INSTRUCTION
    } else {
        JSON_ARRAY_INSTRUCTION
    };
    format!("{}\n\n{}", LEGAL_EVENTS_PROMPT, closing)
}

/// User message carrying the document text
pub fn user_message(text: &str) -> String {
    format!("Extract legal events from this document:\n\n{}", text)
}

/// Single prompt for APIs without a separate system role
pub fn single_prompt(text: &str) -> String {
    let mut prompt = String::with_capacity(LEGAL_EVENTS_PROMPT.len() + text.len() + 256);
    prompt.push_str(LEGAL_EVENTS_PROMPT);
    prompt.push_str("\n\n");
    prompt.push_str(JSON_ARRAY_INSTRUCTION);
    prompt.push_str("\n\nDocument:\n---\n");
    prompt.push_str(text);
    prompt.push_str("\n---\n");
    prompt
}
