//! Configuration file handling and logging setup

use crate::common::*;
use annota::{init_tracing, AnnotaConfig, DiffEngine, Error, CONFIG_FILE_NAME};
use serde_json::json;
use tempfile::TempDir;

#[test]
fn config_file_drives_document_and_diff() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join(CONFIG_FILE_NAME);
    std::fs::write(
        &file,
        "[document]\nmax_nesting_depth = 2\n\n[diff]\nmark_ancestors = false\n",
    )
    .unwrap();

    let config = AnnotaConfig::from_file(&file).unwrap();
    assert_eq!(config.document.max_nesting_depth, 2);
    assert!(!config.diff.mark_ancestors);
    assert_eq!(config.logging.filter, "info");

    let too_deep = MemoryDocument::with_config(json!({"a": {"b": {"c": 1}}}).into(), &config);
    assert!(matches!(too_deep, Err(Error::Limit(_))));

    let doc = MemoryDocument::with_config(json!({"x": {"y": 1}}).into(), &config).unwrap();
    let handle: DocHandle = doc.clone();
    let before = handle.heads();
    doc.put(&path("x.y"), 2.into()).unwrap();

    let annotations = DiffEngine::new(config.diff.clone())
        .diff_of_doc(&handle, Some(before))
        .unwrap();
    assert_eq!(annotations.len(), 1);
}

#[test]
fn tracing_init_is_idempotent() {
    let config = AnnotaConfig::default();
    init_tracing(&config.logging);
    assert!(!init_tracing(&config.logging));
}
