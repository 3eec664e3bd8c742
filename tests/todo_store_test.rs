//! Tests for TodoService
//!
//! End-to-end behavior of the screen store driven through commands, against
//! both repository backends.

use std::sync::Arc;

use futures::StreamExt;
use todo_cli::config::StoreConfig;
use todo_cli::storage::{
    IdStrategy, InMemoryRepository, JsonFileRepository, TodoId, TodoRecord, TodoRepository,
};
use todo_cli::ui_backend::{Command, CommandOutcome, ServiceError, TodoService, TodoUiItem};

fn store_config() -> StoreConfig {
    StoreConfig {
        clear_input_on_add: true,
        id_strategy: IdStrategy::Sequential,
    }
}

/// Create a service over an in-memory repository seeded with `records`
fn create_service(records: Vec<TodoRecord>) -> (TodoService, Arc<InMemoryRepository>) {
    let repo = Arc::new(InMemoryRepository::with_records(records).unwrap());
    let service = TodoService::new(repo.clone(), &store_config());
    (service, repo)
}

fn item(service: &TodoService, id: u64) -> TodoUiItem {
    service
        .screen()
        .item(TodoId::new(id))
        .cloned()
        .expect("item on screen")
}

#[test]
fn test_add_from_empty_screen() {
    let (mut service, _repo) = create_service(Vec::new());

    service.update_new_item_input_text("Buy milk").unwrap();
    service.on_add_new_item_button_click().unwrap();

    let screen = service.screen();
    assert_eq!(screen.todo_list_items.len(), 1);
    let added = &screen.todo_list_items[0];
    assert_eq!(added.name, "Buy milk");
    assert!(!added.completed);
    assert!(!added.is_being_modified);
    assert!(screen.new_item_input_text.is_empty());
}

#[test]
fn test_editing_survives_toggle_of_another_item() {
    let (mut service, _repo) = create_service(vec![
        TodoRecord::new(1u64, "A"),
        TodoRecord::new(2u64, "B"),
    ]);

    service.on_edit_button_click(&item(&service, 1)).unwrap();
    service.toggle_checked(&item(&service, 2)).unwrap();

    assert!(item(&service, 1).is_being_modified);
    assert!(!item(&service, 2).is_being_modified);
    assert!(item(&service, 2).completed);
}

#[test]
fn test_editing_survives_add_and_delete_of_other_items() {
    let (mut service, _repo) = create_service(vec![
        TodoRecord::new(1u64, "A"),
        TodoRecord::new(2u64, "B"),
    ]);

    service.on_edit_button_click(&item(&service, 1)).unwrap();
    service.update_item_text(TodoId::new(1), "A draft").unwrap();
    service.update_new_item_input_text("C").unwrap();
    service.on_add_new_item_button_click().unwrap();
    service.on_delete_button_click(&item(&service, 2)).unwrap();

    let a = item(&service, 1);
    assert!(a.is_being_modified);
    assert_eq!(a.name, "A draft");
    assert_eq!(service.screen().todo_list_items.len(), 2);
}

#[test]
fn test_submit_for_absent_item_leaves_screen_unchanged() {
    let (mut service, _repo) = create_service(vec![TodoRecord::new(1u64, "A")]);
    let before = service.screen();
    let version = service.version();

    let ghost = TodoUiItem::from_record(&TodoRecord::new(42u64, "ghost"), true);
    let outcome = service.on_update_item_submit(&ghost).unwrap();

    assert_eq!(outcome, CommandOutcome::Ignored);
    assert_eq!(*service.screen(), *before);
    assert_eq!(service.version(), version);
}

#[test]
fn test_submit_same_name_touches_nothing_in_storage() {
    let (mut service, repo) = create_service(vec![
        TodoRecord::new(1u64, "A"),
        TodoRecord::new(2u64, "B"),
    ]);
    let mut records = repo.subscribe();
    assert!(records.try_recv().is_some());

    service.on_edit_button_click(&item(&service, 1)).unwrap();
    service.on_edit_button_click(&item(&service, 2)).unwrap();
    service.on_update_item_submit(&item(&service, 1)).unwrap();

    assert!(records.try_recv().is_none());
    assert!(!item(&service, 1).is_being_modified);
    assert!(item(&service, 2).is_being_modified);
}

#[test]
fn test_rename_keeps_position_and_completion() {
    let mut done = TodoRecord::new(2u64, "B");
    done.completed = true;
    let (mut service, repo) = create_service(vec![
        TodoRecord::new(1u64, "A"),
        done,
        TodoRecord::new(3u64, "C"),
    ]);

    service.on_edit_button_click(&item(&service, 2)).unwrap();
    service.update_item_text(TodoId::new(2), "Bee").unwrap();
    service.on_update_item_submit(&item(&service, 2)).unwrap();

    let records = repo.records();
    assert_eq!(records[1].name, "Bee");
    assert!(records[1].completed);
    let names: Vec<_> = service
        .screen()
        .todo_list_items
        .iter()
        .map(|i| i.name.clone())
        .collect();
    assert_eq!(names, vec!["A", "Bee", "C"]);
}

#[test]
fn test_blank_submit_keeps_editor_open() {
    let (mut service, repo) = create_service(vec![TodoRecord::new(1u64, "A")]);

    service.on_edit_button_click(&item(&service, 1)).unwrap();
    service.update_item_text(TodoId::new(1), "   ").unwrap();
    let outcome = service.on_update_item_submit(&item(&service, 1)).unwrap();

    assert_eq!(outcome, CommandOutcome::Ignored);
    assert!(item(&service, 1).is_being_modified);
    assert_eq!(repo.records()[0].name, "A");
}

#[test]
fn test_handle_command_runs_normalization() {
    let (mut service, repo) = create_service(Vec::new());

    service
        .handle_command(Command::UpdateNewItemInputText("Buy\nmilk".into()))
        .unwrap();
    assert_eq!(service.screen().new_item_input_text, "Buy milk");

    service.handle_command(Command::AddNewItem).unwrap();
    assert_eq!(repo.records()[0].name, "Buy milk");
}

#[test]
fn test_screen_subscriber_tracks_commands() {
    let (mut service, _repo) = create_service(Vec::new());
    let mut screen = service.subscribe();
    screen.latest();

    service.update_new_item_input_text("x").unwrap();
    assert!(screen.has_changed());
    assert_eq!(screen.latest().new_item_input_text, "x");

    // Identical snapshot is not republished
    service.update_new_item_input_text("x").unwrap();
    assert!(!screen.has_changed());
}

#[test]
fn test_detached_service_rejects_commands() {
    let (mut service, repo) = create_service(vec![TodoRecord::new(1u64, "A")]);
    let a = item(&service, 1);
    assert_eq!(repo.subscriber_count(), 1);

    service.shutdown();

    assert_eq!(repo.subscriber_count(), 0);
    assert!(matches!(
        service.handle_command(Command::DeleteItem(a)),
        Err(ServiceError::Detached)
    ));
    assert_eq!(repo.records().len(), 1);
}

#[test]
fn test_dropping_service_unsubscribes() {
    let (service, repo) = create_service(Vec::new());
    assert_eq!(repo.subscriber_count(), 1);
    drop(service);
    assert_eq!(repo.subscriber_count(), 0);
}

#[tokio::test]
async fn test_pump_sees_other_handle_mutations() {
    let (mut service, repo) = create_service(Vec::new());

    let writer = repo.clone();
    tokio::spawn(async move {
        writer.add_item(TodoRecord::new(9u64, "from elsewhere")).unwrap();
    })
    .await
    .unwrap();

    assert!(service.pump().await.unwrap());
    assert_eq!(item(&service, 9).name, "from elsewhere");
}

#[tokio::test]
async fn test_record_stream_emits_on_mutation() {
    let repo = InMemoryRepository::new();
    let mut stream = repo.subscribe();

    assert_eq!(stream.next().await, Some(Vec::new()));
    repo.add_item(TodoRecord::new(1u64, "A")).unwrap();
    repo.toggle_completed(TodoId::new(1)).unwrap();

    let added = stream.next().await.unwrap();
    assert!(!added[0].completed);
    let toggled = stream.next().await.unwrap();
    assert!(toggled[0].completed);
}

#[test]
fn test_file_backed_session_persists() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("todos.json");

    {
        let repo = Arc::new(JsonFileRepository::open(&path).unwrap());
        let mut service = TodoService::new(repo, &store_config());
        service.update_new_item_input_text("Buy milk").unwrap();
        service.on_add_new_item_button_click().unwrap();
        service.update_new_item_input_text("Walk dog").unwrap();
        service.on_add_new_item_button_click().unwrap();
        service.toggle_checked(&item(&service, 2)).unwrap();
    }

    let repo = Arc::new(JsonFileRepository::open(&path).unwrap());
    let service = TodoService::new(repo, &store_config());
    let screen = service.screen();
    assert_eq!(screen.todo_list_items.len(), 2);
    assert_eq!(screen.todo_list_items[0].name, "Buy milk");
    assert!(screen.todo_list_items[1].completed);
    assert!(screen.todo_list_items.iter().all(|i| !i.is_being_modified));
}

#[test]
fn test_deleted_id_is_not_reused_after_reopen() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("todos.json");

    {
        let repo = Arc::new(JsonFileRepository::open(&path).unwrap());
        let mut service = TodoService::new(repo.clone(), &store_config());
        service.update_new_item_input_text("a").unwrap();
        service.on_add_new_item_button_click().unwrap();
        service.update_new_item_input_text("b").unwrap();
        service.on_add_new_item_button_click().unwrap();
        assert_eq!(repo.records()[1].id, TodoId::new(2));
        service.on_delete_button_click(&item(&service, 2)).unwrap();
    }

    let repo = Arc::new(JsonFileRepository::open(&path).unwrap());
    let mut service = TodoService::new(repo.clone(), &store_config());
    service.update_new_item_input_text("c").unwrap();
    service.on_add_new_item_button_click().unwrap();

    let ids: Vec<TodoId> = repo.records().iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![TodoId::new(1), TodoId::new(3)]);
}

#[test]
fn test_sequential_ids_continue_after_existing() {
    let (mut service, repo) = create_service(vec![TodoRecord::new(7u64, "A")]);
    service.update_new_item_input_text("B").unwrap();
    service.on_add_new_item_button_click().unwrap();

    assert_eq!(repo.records()[1].id, TodoId::new(8));
}

#[test]
fn test_command_targets_record_added_by_other_handle() {
    let (mut service, repo) = create_service(Vec::new());
    let record = TodoRecord::new(4u64, "from elsewhere");
    repo.add_item(record.clone()).unwrap();

    let target = TodoUiItem::from_record(&record, false);
    let outcome = service.handle_command(Command::DeleteItem(target)).unwrap();

    assert_eq!(outcome, CommandOutcome::Applied);
    assert!(repo.records().is_empty());
    assert!(service.screen().todo_list_items.is_empty());
}
