//! Tests for the interactive shell
//!
//! Drives whole sessions from scripted input and checks the rendered output.

use std::sync::Arc;

use todo_cli::config::StoreConfig;
use todo_cli::storage::{IdStrategy, InMemoryRepository, TodoRecord, TodoRepository};
use todo_cli::transport::shell::run_shell;
use todo_cli::transport::PlainTextRenderer;
use todo_cli::ui_backend::TodoService;

async fn run_script(
    records: Vec<TodoRecord>,
    script: &str,
) -> (String, Arc<InMemoryRepository>, TodoService) {
    let repo = Arc::new(InMemoryRepository::with_records(records).unwrap());
    let config = StoreConfig {
        clear_input_on_add: true,
        id_strategy: IdStrategy::Sequential,
    };
    let mut service = TodoService::new(repo.clone(), &config);
    let mut renderer = PlainTextRenderer::new(Vec::new());

    run_shell(&mut service, &mut renderer, script.as_bytes())
        .await
        .unwrap();

    let output = String::from_utf8(renderer.into_inner()).unwrap();
    (output, repo, service)
}

#[tokio::test]
async fn test_add_toggle_and_remove() {
    let script = "add Buy milk\nadd Walk dog\ntoggle 2\nrm 1\nquit\n";
    let (output, repo, _service) = run_script(Vec::new(), script).await;

    let records = repo.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "Walk dog");
    assert!(records[0].completed);
    assert!(output.contains("  1. [ ] Buy milk\n"));
    assert!(output.contains("  2. [x] Walk dog\n"));
    assert!(output.trim_end().ends_with("0 remaining"));
}

#[tokio::test]
async fn test_type_then_add_uses_field() {
    let (output, repo, _service) = run_script(Vec::new(), "type Buy milk\nadd\n").await;

    assert!(output.contains("New item: [Buy milk]\n"));
    assert_eq!(repo.records()[0].name, "Buy milk");
    assert!(output.trim_end().ends_with("1 remaining"));
}

#[tokio::test]
async fn test_inline_edit_flow() {
    let script = "edit 1\ntext 1 Oat milk\ntoggle 2\nsave 1\n";
    let (output, repo, _service) = run_script(
        vec![TodoRecord::new(1u64, "Milk"), TodoRecord::new(2u64, "Eggs")],
        script,
    )
    .await;

    assert!(output.contains("  1. [ ] Oat milk  (editing)\n"));
    // Still editing after the unrelated toggle
    assert!(output.contains("  1. [ ] Oat milk  (editing)\n  2. [x] Eggs\n"));
    assert_eq!(repo.records()[0].name, "Oat milk");
    assert!(output.contains("  1. [ ] Oat milk\n  2. [x] Eggs\n"));
}

#[tokio::test]
async fn test_errors_are_reported_and_session_continues() {
    let script = "frobnicate\ntoggle 5\nadd\nadd Real item\n";
    let (output, repo, _service) = run_script(Vec::new(), script).await;

    assert!(output.contains("unknown command 'frobnicate'"));
    assert!(output.contains("No item at row 5"));
    assert!(output.contains("(nothing changed)"));
    assert_eq!(repo.records().len(), 1);
}

#[tokio::test]
async fn test_session_end_detaches() {
    let (_output, repo, service) = run_script(Vec::new(), "help\n").await;

    assert!(!service.is_attached());
    assert_eq!(repo.subscriber_count(), 0);
}
