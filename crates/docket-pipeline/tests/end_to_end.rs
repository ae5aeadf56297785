//! End-to-end runs over real files with a scripted provider

use docket_llm::{MapEnv, ScriptedTransport};
use docket_pipeline::{
    AppConfig, EventTable, ExportFormat, ExtraColumn, Pipeline, PipelineError, CANONICAL_COLUMNS,
};
use serde_json::{json, Value};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

const DOCKET_TEXT: &str = "On January 10, 2022 the defendant moved to dismiss under \
                           Fed. R. Civ. P. 12(b)(6). On February 3, 2022 the court \
                           heard argument and took the motion under advisement.";

fn gemini_response(content: &str) -> Value {
    json!({
        "candidates": [{ "content": { "parts": [{ "text": content }] } }],
        "usageMetadata": { "promptTokenCount": 120, "candidatesTokenCount": 40 }
    })
}

fn write_docs(dir: &TempDir) -> Vec<PathBuf> {
    let docket = dir.path().join("docket.txt");
    fs::write(&docket, DOCKET_TEXT).unwrap();
    let notes = dir.path().join("notes.md");
    fs::write(&notes, "# Notes\n\nNothing happened here.").unwrap();
    vec![docket, notes]
}

fn gemini_only_env() -> MapEnv {
    MapEnv::new()
        .with("EVENT_EXTRACTOR", "langextract")
        .with("GOOGLE_API_KEY", "g-test-key")
        .with("ENABLE_PERFORMANCE_TIMING", "true")
}

#[test]
fn test_run_with_only_selected_provider_key() {
    let dir = TempDir::new().unwrap();
    let paths = write_docs(&dir);
    let events = r#"```json
    [
      {"event_particulars": "The defendant moved to dismiss the complaint.",
       "citation": "Fed. R. Civ. P. 12(b)(6)", "document_reference": "x", "date": "January 10, 2022"},
      {"event_particulars": "The court heard argument on the motion.",
       "citation": "Smith v. Jones, 123 F.3d 456 (9th Cir. 1999)", "document_reference": "", "date": "February 3, 2022"}
    ]
    ```"#;
    let transport = ScriptedTransport::new()
        .respond_json(gemini_response(events))
        .respond_json(gemini_response("[]"));

    let config = AppConfig::from_env(&gemini_only_env());
    let pipeline =
        Pipeline::from_config_with_transport(&config, Arc::new(transport.clone())).unwrap();
    let report = pipeline.process_documents(&paths);

    assert_eq!(transport.call_count(), 2);
    assert_eq!(report.documents.len(), 2);

    let docket = &report.documents[0];
    assert_eq!(docket.document, "docket.txt");
    assert_eq!(docket.events.len(), 2);
    assert_eq!(docket.events[0].citation, "Fed. R. Civ. P. 12(b)(6)");
    // Not in the source text, so it must not survive
    assert_eq!(docket.events[1].citation, "");
    assert!(docket.events.iter().all(|r| r.document_reference == "docket.txt"));
    let timing = docket.timing.unwrap();
    assert!(docket.events.iter().all(|r| r.attributes.timing == Some(timing)));

    let notes = &report.documents[1];
    assert!(notes.is_fallback());
    assert_eq!(notes.events[0].document_reference, "notes.md");
    assert_eq!(notes.events[0].citation, "");
    assert_eq!(notes.events[0].date, "");
}

#[test]
fn test_export_every_format() {
    let dir = TempDir::new().unwrap();
    let paths = write_docs(&dir);
    let transport = ScriptedTransport::new()
        .respond_json(gemini_response(
            r#"[{"event_particulars": "Motion to dismiss filed.", "citation": "", "document_reference": "", "date": "2022-01-10"}]"#,
        ))
        .respond_json(gemini_response("[]"));

    let config = AppConfig::from_env(&gemini_only_env());
    let pipeline = Pipeline::from_config_with_transport(&config, Arc::new(transport)).unwrap();
    let records = pipeline.process_documents(&paths).into_records();
    let table = EventTable::build(
        &records,
        &[ExtraColumn::DocumentExtraction, ExtraColumn::EventExtraction, ExtraColumn::Total],
    )
    .unwrap();

    let csv_path = dir.path().join("events.csv");
    table.export(ExportFormat::Csv, &csv_path).unwrap();
    let csv = fs::read_to_string(&csv_path).unwrap();
    assert!(csv.starts_with(&CANONICAL_COLUMNS.join(",")));
    assert_eq!(csv.lines().count(), 3);
    assert!(csv.contains("Motion to dismiss filed.,,docket.txt"));

    let json_path = dir.path().join("events.json");
    table.export(ExportFormat::Json, &json_path).unwrap();
    let json: Value = serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(json.as_array().unwrap().len(), 2);
    assert_eq!(json[1]["Document Reference"], "notes.md");
    assert!(json[0]["Total (s)"].is_number());

    let xlsx_path = dir.path().join("events.xlsx");
    table.export(ExportFormat::Xlsx, &xlsx_path).unwrap();
    assert!(fs::metadata(&xlsx_path).unwrap().len() > 0);

    let summary = table.summary();
    assert_eq!(summary.total_events, 2);
    assert_eq!(summary.unique_documents, 2);
    assert_eq!(summary.events_with_citations, 0);
}

#[test]
fn test_provider_outage_becomes_fallback_row() {
    let dir = TempDir::new().unwrap();
    let paths = write_docs(&dir);
    let transport = ScriptedTransport::new()
        .respond(503, "overloaded")
        .respond(401, "bad key");

    let env = gemini_only_env().with("PROVIDER_MAX_RETRIES", "1");
    let config = AppConfig::from_env(&env);
    let pipeline = Pipeline::from_config_with_transport(&config, Arc::new(transport)).unwrap();
    let report = pipeline.process_documents(&paths);

    assert_eq!(
        report.documents[0].events[0].particulars,
        "extraction failed: langextract is temporarily unavailable"
    );
    assert!(report.documents[1].events[0]
        .particulars
        .starts_with("extraction failed: authentication with langextract failed"));
    assert_eq!(report.fallback_documents(), 2);
}

#[test]
fn test_other_providers_keys_never_required() {
    // Every provider but the selected one is unconfigured
    let env = MapEnv::new()
        .with("EVENT_EXTRACTOR", "opencode_zen")
        .with("OPENCODEZEN_API_KEY", "zen-key");
    let config = AppConfig::from_env(&env);
    assert!(Pipeline::from_config_with_transport(&config, Arc::new(ScriptedTransport::new())).is_ok());

    // And the selected one without its key names only its own variable
    let env = MapEnv::new()
        .with("EVENT_EXTRACTOR", "opencode_zen")
        .with("GEMINI_API_KEY", "g-key");
    let config = AppConfig::from_env(&env);
    let err = Pipeline::from_config_with_transport(&config, Arc::new(ScriptedTransport::new()))
        .unwrap_err();
    assert!(matches!(err, PipelineError::Validation { .. }));
    assert!(err.to_string().contains("OPENCODEZEN_API_KEY"));
    assert!(!err.to_string().contains("GEMINI_API_KEY"));
}
