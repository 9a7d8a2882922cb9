use itemproc_core::{Item, ItemStatus, ItemValidationError};
use uuid::Uuid;

#[test]
fn item_new_sets_defaults() {
    let item = Item::new("Test Item", "test@example.com");

    assert!(!item.id.is_nil());
    assert_eq!(item.name, "Test Item");
    assert_eq!(item.description, "");
    assert_eq!(item.status, ItemStatus::Pending);
    assert_eq!(item.email, "test@example.com");
    assert_eq!(item.validate(), Ok(()));
}

#[test]
fn mark_processed_sets_terminal_status() {
    let mut item = Item::new("Test Item", "test@example.com");
    item.mark_processed();

    assert_eq!(item.status, ItemStatus::Processed);
    assert!(item.status.is_terminal());
}

#[test]
fn serialization_uses_upper_case_status() {
    let id = Uuid::parse_str("11111111-2222-4333-8444-555555555555").unwrap();
    let item = Item::with_id(id, "Test Item", "test@example.com")
        .with_description("Test Description")
        .with_status(ItemStatus::Processing);

    let json = serde_json::to_value(&item).unwrap();
    assert_eq!(json["id"], id.to_string());
    assert_eq!(json["name"], "Test Item");
    assert_eq!(json["description"], "Test Description");
    assert_eq!(json["status"], "PROCESSING");
    assert_eq!(json["email"], "test@example.com");

    let decoded: Item = serde_json::from_value(json).unwrap();
    assert_eq!(decoded, item);
}

#[test]
fn deserialize_rejects_unknown_status() {
    let value = serde_json::json!({
        "id": "11111111-2222-4333-8444-555555555555",
        "name": "Test Item",
        "status": "DONE",
        "email": "test@example.com"
    });

    assert!(serde_json::from_value::<Item>(value).is_err());
}

#[test]
fn validate_rejects_each_bad_field() {
    let base = Item::new("Test Item", "test@example.com");

    let mut nil_id = base.clone();
    nil_id.id = Uuid::nil();
    assert_eq!(nil_id.validate(), Err(ItemValidationError::NilId));

    let mut blank_name = base.clone();
    blank_name.name = "   ".to_string();
    assert_eq!(blank_name.validate(), Err(ItemValidationError::BlankName));

    let mut short_name = base.clone();
    short_name.name = "A".to_string();
    assert_eq!(
        short_name.validate(),
        Err(ItemValidationError::NameLength { chars: 1 })
    );

    let mut long_name = base.clone();
    long_name.name = "A".repeat(101);
    assert_eq!(
        long_name.validate(),
        Err(ItemValidationError::NameLength { chars: 101 })
    );

    let long_description = base.clone().with_description("A".repeat(501));
    assert_eq!(
        long_description.validate(),
        Err(ItemValidationError::DescriptionTooLong { chars: 501 })
    );

    let mut blank_email = base.clone();
    blank_email.email = String::new();
    assert_eq!(blank_email.validate(), Err(ItemValidationError::BlankEmail));

    let mut bad_email = base;
    bad_email.email = "invalid-email".to_string();
    assert_eq!(
        bad_email.validate(),
        Err(ItemValidationError::InvalidEmail("invalid-email".to_string()))
    );
}

#[test]
fn validate_accepts_boundary_lengths() {
    let item = Item::new("AB", "a.b+c@example.com").with_description("A".repeat(500));
    assert_eq!(item.validate(), Ok(()));
}
