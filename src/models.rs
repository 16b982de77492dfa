use chrono::{DateTime, Utc};
use garde::Validate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// Represents a registered account in the `users` table. The `uid` is supplied by the
/// caller (it mirrors the identity provider's subject id) rather than being generated
/// here, so both key fields carry a non-empty rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema, FromRow, Default)]
pub struct User {
    // Primary key, caller-supplied.
    #[garde(length(min = 1))]
    pub uid: String,
    // Display name, unique across the table.
    #[garde(length(min = 1))]
    pub username: String,
    // 'user' or 'admin'. Advisory for now; the access gate does not consult it.
    #[serde(default = "default_role")]
    #[garde(custom(known_role))]
    pub role: String,
}

/// Event
///
/// Represents an event record from the `events` table. This is the full row shape,
/// including the columns the store maintains itself (`id`, `created_at`, `updated_at`).
/// The `images` and `tags` lists live in JSONB columns and keep their order through
/// storage round trips.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, FromRow, Default)]
pub struct Event {
    pub id: i64,
    // FK to users.uid (the creator).
    #[serde(rename = "createdBy")]
    pub created_by: String,
    pub title: String,
    pub description: String,
    pub location: String,
    pub organizer_contact_info: String,
    pub external_link: String,
    pub event_type: String,
    pub updated_by: String,
    #[sqlx(json)]
    pub images: Vec<String>,
    #[sqlx(json)]
    pub tags: Vec<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    // draft | published | cancelled. Stored as text, not enforced by the schema.
    pub status: String,
    pub max_attendees: i32,
    pub attendees_count: i32,
    pub is_public: bool,
    pub rsvp_required: bool,
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- Request Payloads (Input Schemas) ---

/// EventPayload
///
/// Input payload for creating or replacing an event (POST /api/event, PUT /api/event/{id}).
/// Carries every writable column; PUT is a full-row replacement, so there are no
/// `Option<T>` partial-update fields here. Serde defaults fill in what the caller
/// omits, matching the column defaults in the schema.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema, Default)]
pub struct EventPayload {
    #[serde(rename = "createdBy")]
    #[garde(length(min = 1))]
    pub created_by: String,
    #[garde(length(min = 1))]
    pub title: String,
    #[serde(default)]
    #[garde(skip)]
    pub description: String,
    #[serde(default)]
    #[garde(skip)]
    pub location: String,
    #[serde(default)]
    #[garde(skip)]
    pub organizer_contact_info: String,
    #[serde(default)]
    #[garde(skip)]
    pub external_link: String,
    #[serde(default)]
    #[garde(skip)]
    pub event_type: String,
    #[serde(default)]
    #[garde(skip)]
    pub updated_by: String,
    #[serde(default)]
    #[garde(skip)]
    pub images: Vec<String>,
    #[serde(default)]
    #[garde(skip)]
    pub tags: Vec<String>,
    #[serde(default)]
    #[garde(skip)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    #[garde(skip)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default = "default_status")]
    #[garde(skip)]
    pub status: String,
    #[serde(default)]
    #[garde(range(min = 0))]
    pub max_attendees: i32,
    #[serde(default)]
    #[garde(range(min = 0))]
    pub attendees_count: i32,
    #[serde(default = "default_true")]
    #[garde(skip)]
    pub is_public: bool,
    #[serde(default)]
    #[garde(skip)]
    pub rsvp_required: bool,
    #[serde(default)]
    #[garde(skip)]
    pub is_featured: bool,
}

// --- Serde Default Helpers ---

fn default_role() -> String {
    "user".to_string()
}

fn default_status() -> String {
    "draft".to_string()
}

fn default_true() -> bool {
    true
}

/// known_role
///
/// Garde validator for the `role` field. The set is closed: anything outside it is a
/// client mistake, not a forward-compatible extension point.
fn known_role(value: &str, _context: &()) -> garde::Result {
    match value {
        "user" | "admin" => Ok(()),
        other => Err(garde::Error::new(format!(
            "role must be 'user' or 'admin', got '{}'",
            other
        ))),
    }
}
