use lazytodo_core::{TodoRecord, TodoValidationError};
use uuid::Uuid;

#[test]
fn serialization_uses_expected_wire_fields() {
    let mut todo = TodoRecord::with_created_at("Buy milk", "2% milk", "3/14/2026, 9:05:00 AM")
        .unwrap();
    todo.completed = true;

    let json = serde_json::to_value(&todo).unwrap();
    assert_eq!(json["id"], todo.id.to_string());
    assert_eq!(json["title"], "Buy milk");
    assert_eq!(json["body"], "2% milk");
    assert_eq!(json["completed"], true);
    assert_eq!(json["date"], "3/14/2026, 9:05:00 AM");

    let decoded: TodoRecord = serde_json::from_value(json).unwrap();
    assert_eq!(decoded, todo);
}

#[test]
fn legacy_documents_without_id_get_fresh_ids() {
    let value = serde_json::json!([
        {"title": "a", "body": "", "completed": false, "date": "1/2/2024, 3:04:05 PM"},
        {"title": "b", "body": "x", "completed": true, "date": "1/2/2024, 3:04:06 PM"}
    ]);

    let todos: Vec<TodoRecord> = serde_json::from_value(value).unwrap();
    assert_eq!(todos.len(), 2);
    assert_ne!(todos[0].id, todos[1].id);
    assert!(todos.iter().all(|todo| !todo.id.is_nil()));
    assert!(todos[1].completed);
    assert_eq!(todos[1].body, "x");
}

#[test]
fn created_at_alias_is_accepted() {
    let value = serde_json::json!({
        "title": "a",
        "createdAt": "1/2/2024, 3:04:05 PM"
    });

    let todo: TodoRecord = serde_json::from_value(value).unwrap();
    assert_eq!(todo.created_at, "1/2/2024, 3:04:05 PM");
    assert_eq!(todo.body, "");
    assert!(!todo.completed);
}

#[test]
fn deserialize_rejects_blank_title() {
    let value = serde_json::json!({
        "title": "   ",
        "body": "",
        "completed": false,
        "date": "1/2/2024, 3:04:05 PM"
    });

    let err = serde_json::from_value::<TodoRecord>(value).unwrap_err();
    assert!(
        err.to_string().contains("todo title must not be empty"),
        "unexpected error: {err}"
    );
}

#[test]
fn validate_rejects_nil_id() {
    let mut todo = TodoRecord::new("title", "").unwrap();
    todo.id = Uuid::nil();
    assert_eq!(todo.validate(), Err(TodoValidationError::NilId));
}
