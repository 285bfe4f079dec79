//! End-to-end tests: config and catalog files on disk through to output.

use std::fs;

use modpipe::cli::OutputFormat;
use modpipe::commands::CommandExecutor;
use modpipe::config::AppConfig;
use serde_json::Value;

const CATALOG: &str = r#"{
    "includeStandardModules": false,
    "modules": [
        {"id": "0d9c6a53-1a3e-4a53-9f61-3c2e4f0f6b10", "name": "import", "type": "Import",
         "ops": [{"type": "ADD_BEFORE", "apply": [{"className": "Fetch", "image": "core"}],
                  "filter": {"type": "EQUAL", "processor": "Import"}}]},
        {"name": "ocr", "type": "Text Detection (OCR)",
         "ops": [{"type": "SET_ARGS", "apply": {"ocr": true},
                  "filter": {"type": "SUBSTR", "processor": "Import"}}]}
    ],
    "pipelines": [
        {"id": "9a3b8f61-5a1d-4f0e-8f3a-2d7e6c5b4a39", "name": "ingest",
         "modules": ["0d9c6a53-1a3e-4a53-9f61-3c2e4f0f6b10"]}
    ]
}"#;

const CONFIG: &str = r#"
output = "json"

[resolver]
standard_pipeline = [
    { className = "Import", image = "core" },
]
"#;

fn setup() -> (tempfile::TempDir, CommandExecutor) {
    let dir = tempfile::tempdir().unwrap();
    let catalog = dir.path().join("catalog.json");
    let config = dir.path().join("config.toml");
    fs::write(&catalog, CATALOG).unwrap();
    fs::write(&config, CONFIG).unwrap();

    let config = AppConfig::load(Some(&config)).unwrap();
    let executor = CommandExecutor::new(config, Some(&catalog), false).unwrap();
    (dir, executor)
}

#[test]
fn test_resolve_stored_pipeline_with_added_module() {
    let (_dir, executor) = setup();
    assert_eq!(executor.config().output, OutputFormat::Json);

    let output = executor
        .run_resolve(&["ocr".to_string()], Some("ingest"), false, OutputFormat::Json)
        .unwrap();
    let value: Value = serde_json::from_str(&output).unwrap();

    let execute = value["execute"].as_array().unwrap();
    assert_eq!(execute.len(), 2);
    assert_eq!(execute[0]["className"], "Fetch");
    assert_eq!(execute[1]["className"], "Import");
    assert_eq!(execute[1]["args"]["ocr"], true);
    assert_eq!(
        value["globalArgs"]["pipeline.objectives"],
        serde_json::json!(["Import", "Text Detection (OCR)"])
    );
}

#[test]
fn test_unknown_module_is_reported() {
    let (_dir, executor) = setup();
    let err = executor
        .run_resolve(&["ghost".to_string(), "phantom".to_string()], None, false, OutputFormat::Pretty)
        .unwrap_err();
    assert_eq!(err.to_string(), "Pipeline module not found: ghost, phantom");
}

#[test]
fn test_standard_uses_configured_pipeline() {
    let (_dir, executor) = setup();
    let output = executor.run_standard(OutputFormat::JsonCompact).unwrap();
    assert_eq!(output, r#"[{"className":"Import","image":"core"}]"#);
}
