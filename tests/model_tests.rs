use event_portal::models::{Event, EventPayload, User};
use garde::Validate;

// --- User Schema Tests ---

#[test]
fn test_user_role_defaults_on_deserialization() {
    let user: User = serde_json::from_str(r#"{ "uid": "u1", "username": "ana" }"#).unwrap();
    assert_eq!(user.role, "user");
}

#[test]
fn test_user_validation_accepts_both_roles() {
    for role in ["user", "admin"] {
        let user = User {
            uid: "u1".to_string(),
            username: "ana".to_string(),
            role: role.to_string(),
        };
        assert!(user.validate(&()).is_ok(), "role '{}' should pass", role);
    }
}

#[test]
fn test_user_validation_rejects_unknown_role() {
    let user = User {
        uid: "u1".to_string(),
        username: "ana".to_string(),
        role: "superuser".to_string(),
    };
    let report = user.validate(&()).unwrap_err();
    assert!(report.to_string().contains("role must be"));
}

#[test]
fn test_user_validation_rejects_empty_keys() {
    let user = User {
        uid: String::new(),
        username: "ana".to_string(),
        role: "user".to_string(),
    };
    assert!(user.validate(&()).is_err());

    let user = User {
        uid: "u1".to_string(),
        username: String::new(),
        role: "user".to_string(),
    };
    assert!(user.validate(&()).is_err());
}

// --- Event Schema Tests ---

#[test]
fn test_event_serializes_creator_in_camel_case() {
    let json_output = serde_json::to_string(&Event::default()).unwrap();

    // The creator key crosses the wire as "createdBy"; every other field stays snake_case.
    assert!(json_output.contains(r#""createdBy""#));
    assert!(!json_output.contains(r#""created_by""#));
    assert!(json_output.contains(r#""start_time""#));
}

#[test]
fn test_event_payload_fills_documented_defaults() {
    let payload: EventPayload =
        serde_json::from_str(r#"{ "createdBy": "u1", "title": "Picnic" }"#).unwrap();

    assert_eq!(payload.status, "draft");
    assert!(payload.is_public);
    assert!(!payload.rsvp_required);
    assert!(!payload.is_featured);
    assert_eq!(payload.max_attendees, 0);
    assert_eq!(payload.attendees_count, 0);
    assert!(payload.tags.is_empty());
    assert!(payload.images.is_empty());
    assert!(payload.start_time.is_none());
    assert!(payload.end_time.is_none());
}

#[test]
fn test_event_payload_requires_the_camel_case_creator_key() {
    // A snake_case key is not recognized, which leaves the mandatory field missing.
    let result = serde_json::from_str::<EventPayload>(r#"{ "created_by": "u1", "title": "X" }"#);
    assert!(result.is_err());
}

#[test]
fn test_event_payload_rejects_negative_counters() {
    let payload = EventPayload {
        created_by: "u1".to_string(),
        title: "Picnic".to_string(),
        max_attendees: -1,
        ..EventPayload::default()
    };
    assert!(payload.validate(&()).is_err());
}

#[test]
fn test_event_payload_rejects_blank_title() {
    let payload = EventPayload {
        created_by: "u1".to_string(),
        ..EventPayload::default()
    };
    assert!(payload.validate(&()).is_err());
}

#[test]
fn test_tag_order_survives_a_serde_round_trip() {
    let payload = EventPayload {
        created_by: "u1".to_string(),
        title: "Picnic".to_string(),
        tags: vec!["zebra".to_string(), "apple".to_string(), "mango".to_string()],
        ..EventPayload::default()
    };

    let encoded = serde_json::to_string(&payload).unwrap();
    let decoded: EventPayload = serde_json::from_str(&encoded).unwrap();
    assert_eq!(decoded.tags, payload.tags);
}
