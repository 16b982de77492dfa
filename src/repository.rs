use crate::models::{Event, EventPayload, User};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, types::Json};
use std::collections::BTreeMap;
use std::sync::{
    Arc,
    atomic::{AtomicI64, Ordering},
};
use thiserror::Error;
use tokio::sync::RwLock;

/// StoreError
///
/// The failure taxonomy of the storage layer. Handlers never see raw `sqlx::Error`
/// values; Postgres constraint violations are classified here so the service layer can
/// map them onto the HTTP surface (409 for duplicates, 400 for dangling references,
/// 500 for everything else).
#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique constraint was violated (duplicate uid or username).
    #[error("{0}")]
    Conflict(String),

    /// A foreign key constraint was violated (event creator does not exist).
    #[error("{0}")]
    InvalidReference(String),

    /// Any other database failure.
    #[error("database failure: {0}")]
    Database(#[from] sqlx::Error),
}

/// classify
///
/// Maps a raw sqlx error onto the StoreError taxonomy by inspecting the database
/// error kind. Only constraint violations get a dedicated variant; everything else
/// stays a Database failure with the original error attached.
fn classify(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db) = err {
        match db.kind() {
            sqlx::error::ErrorKind::UniqueViolation => {
                return StoreError::Conflict(db.message().to_string());
            }
            sqlx::error::ErrorKind::ForeignKeyViolation => {
                return StoreError::InvalidReference(db.message().to_string());
            }
            _ => {}
        }
    }
    StoreError::Database(err)
}

// --- Store Contracts ---

/// UserStore
///
/// The abstract persistence contract for user records. Handlers and services interact
/// with the data layer through this trait only, which is what lets the test suite run
/// against the in-memory backend below.
///
/// **Send + Sync + async_trait** are required to make the trait object
/// (`Arc<dyn UserStore>`) safely shareable across Axum's asynchronous task boundaries.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a new user. Fails with `Conflict` when the uid or username is taken.
    async fn create(&self, user: &User) -> Result<(), StoreError>;
    /// Fetches one user. A missing row is `Ok(None)`, not an error.
    async fn get(&self, uid: &str) -> Result<Option<User>, StoreError>;
    /// Lists every user, ordered by uid so output is deterministic.
    async fn list(&self) -> Result<Vec<User>, StoreError>;
    /// Replaces the row with the given uid. Returns false when no such row exists.
    async fn update(&self, user: &User) -> Result<bool, StoreError>;
    /// Removes the row if present. Deleting an absent uid is not an error.
    async fn delete(&self, uid: &str) -> Result<(), StoreError>;
}

/// EventStore
///
/// The abstract persistence contract for event records. Unlike users, events carry
/// store-maintained columns (generated id, timestamps), so create and update hand the
/// finished row back.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Inserts a new event and returns the stored row with its generated id.
    /// Fails with `InvalidReference` when the creator uid is unknown.
    async fn create(&self, payload: &EventPayload) -> Result<Event, StoreError>;
    /// Fetches one event. A missing row is `Ok(None)`, not an error.
    async fn get(&self, id: i64) -> Result<Option<Event>, StoreError>;
    /// Lists every event, ordered by id.
    async fn list(&self) -> Result<Vec<Event>, StoreError>;
    /// Replaces the row with the given id and returns the refreshed row,
    /// or None when no such row exists.
    async fn update(&self, id: i64, payload: &EventPayload) -> Result<Option<Event>, StoreError>;
    /// Removes the row if present. Deleting an absent id is not an error.
    async fn delete(&self, id: i64) -> Result<(), StoreError>;
}

// --- Schema Bootstrap ---

/// init_schema
///
/// Creates the two application tables if they are missing. Runs once at startup,
/// standing in for a migration tool at this stage of the project.
pub async fn init_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            uid      VARCHAR(255) PRIMARY KEY,
            username VARCHAR(255) NOT NULL UNIQUE,
            role     VARCHAR(50)  NOT NULL DEFAULT 'user'
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS events (
            id                     BIGSERIAL PRIMARY KEY,
            created_by             VARCHAR(255) NOT NULL REFERENCES users(uid),
            title                  TEXT NOT NULL,
            description            TEXT NOT NULL DEFAULT '',
            location               TEXT NOT NULL DEFAULT '',
            organizer_contact_info TEXT NOT NULL DEFAULT '',
            external_link          TEXT NOT NULL DEFAULT '',
            event_type             TEXT NOT NULL DEFAULT '',
            updated_by             TEXT NOT NULL DEFAULT '',
            images                 JSONB NOT NULL DEFAULT '[]',
            tags                   JSONB NOT NULL DEFAULT '[]',
            start_time             TIMESTAMPTZ,
            end_time               TIMESTAMPTZ,
            status                 TEXT NOT NULL DEFAULT 'draft',
            max_attendees          INT NOT NULL DEFAULT 0,
            attendees_count        INT NOT NULL DEFAULT 0,
            is_public              BOOLEAN NOT NULL DEFAULT TRUE,
            rsvp_required          BOOLEAN NOT NULL DEFAULT FALSE,
            is_featured            BOOLEAN NOT NULL DEFAULT FALSE,
            created_at             TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at             TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

// --- Postgres Implementations ---

/// PostgresUserStore
///
/// The concrete `UserStore` backed by the PostgreSQL `users` table.
pub struct PostgresUserStore {
    pool: PgPool,
}

impl PostgresUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PostgresUserStore {
    async fn create(&self, user: &User) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO users (uid, username, role) VALUES ($1, $2, $3)")
            .bind(&user.uid)
            .bind(&user.username)
            .bind(&user.role)
            .execute(&self.pool)
            .await
            .map_err(classify)?;
        Ok(())
    }

    async fn get(&self, uid: &str) -> Result<Option<User>, StoreError> {
        let user =
            sqlx::query_as::<_, User>("SELECT uid, username, role FROM users WHERE uid = $1")
                .bind(uid)
                .fetch_optional(&self.pool)
                .await
                .map_err(classify)?;
        Ok(user)
    }

    async fn list(&self) -> Result<Vec<User>, StoreError> {
        let users =
            sqlx::query_as::<_, User>("SELECT uid, username, role FROM users ORDER BY uid")
                .fetch_all(&self.pool)
                .await
                .map_err(classify)?;
        Ok(users)
    }

    async fn update(&self, user: &User) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE users SET username = $2, role = $3 WHERE uid = $1")
            .bind(&user.uid)
            .bind(&user.username)
            .bind(&user.role)
            .execute(&self.pool)
            .await
            .map_err(classify)?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, uid: &str) -> Result<(), StoreError> {
        // Absent rows are fine; the operation is idempotent by contract.
        sqlx::query("DELETE FROM users WHERE uid = $1")
            .bind(uid)
            .execute(&self.pool)
            .await
            .map_err(classify)?;
        Ok(())
    }
}

/// PostgresEventStore
///
/// The concrete `EventStore` backed by the PostgreSQL `events` table. The tag and
/// image lists are bound as `Json` values into the JSONB columns, which preserves
/// element order exactly as received.
pub struct PostgresEventStore {
    pool: PgPool,
}

impl PostgresEventStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventStore for PostgresEventStore {
    async fn create(&self, payload: &EventPayload) -> Result<Event, StoreError> {
        let event = sqlx::query_as::<_, Event>(
            r#"
            INSERT INTO events (
                created_by, title, description, location, organizer_contact_info,
                external_link, event_type, updated_by, images, tags,
                start_time, end_time, status, max_attendees, attendees_count,
                is_public, rsvp_required, is_featured, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                    $11, $12, $13, $14, $15, $16, $17, $18, NOW(), NOW())
            RETURNING id, created_by, title, description, location, organizer_contact_info,
                      external_link, event_type, updated_by, images, tags,
                      start_time, end_time, status, max_attendees, attendees_count,
                      is_public, rsvp_required, is_featured, created_at, updated_at
            "#,
        )
        .bind(&payload.created_by)
        .bind(&payload.title)
        .bind(&payload.description)
        .bind(&payload.location)
        .bind(&payload.organizer_contact_info)
        .bind(&payload.external_link)
        .bind(&payload.event_type)
        .bind(&payload.updated_by)
        .bind(Json(&payload.images))
        .bind(Json(&payload.tags))
        .bind(payload.start_time)
        .bind(payload.end_time)
        .bind(&payload.status)
        .bind(payload.max_attendees)
        .bind(payload.attendees_count)
        .bind(payload.is_public)
        .bind(payload.rsvp_required)
        .bind(payload.is_featured)
        .fetch_one(&self.pool)
        .await
        .map_err(classify)?;
        Ok(event)
    }

    async fn get(&self, id: i64) -> Result<Option<Event>, StoreError> {
        let event = sqlx::query_as::<_, Event>(
            r#"
            SELECT id, created_by, title, description, location, organizer_contact_info,
                   external_link, event_type, updated_by, images, tags,
                   start_time, end_time, status, max_attendees, attendees_count,
                   is_public, rsvp_required, is_featured, created_at, updated_at
            FROM events WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(classify)?;
        Ok(event)
    }

    async fn list(&self) -> Result<Vec<Event>, StoreError> {
        let events = sqlx::query_as::<_, Event>(
            r#"
            SELECT id, created_by, title, description, location, organizer_contact_info,
                   external_link, event_type, updated_by, images, tags,
                   start_time, end_time, status, max_attendees, attendees_count,
                   is_public, rsvp_required, is_featured, created_at, updated_at
            FROM events ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(classify)?;
        Ok(events)
    }

    async fn update(&self, id: i64, payload: &EventPayload) -> Result<Option<Event>, StoreError> {
        let event = sqlx::query_as::<_, Event>(
            r#"
            UPDATE events
            SET created_by = $2, title = $3, description = $4, location = $5,
                organizer_contact_info = $6, external_link = $7, event_type = $8,
                updated_by = $9, images = $10, tags = $11, start_time = $12,
                end_time = $13, status = $14, max_attendees = $15, attendees_count = $16,
                is_public = $17, rsvp_required = $18, is_featured = $19, updated_at = NOW()
            WHERE id = $1
            RETURNING id, created_by, title, description, location, organizer_contact_info,
                      external_link, event_type, updated_by, images, tags,
                      start_time, end_time, status, max_attendees, attendees_count,
                      is_public, rsvp_required, is_featured, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&payload.created_by)
        .bind(&payload.title)
        .bind(&payload.description)
        .bind(&payload.location)
        .bind(&payload.organizer_contact_info)
        .bind(&payload.external_link)
        .bind(&payload.event_type)
        .bind(&payload.updated_by)
        .bind(Json(&payload.images))
        .bind(Json(&payload.tags))
        .bind(payload.start_time)
        .bind(payload.end_time)
        .bind(&payload.status)
        .bind(payload.max_attendees)
        .bind(payload.attendees_count)
        .bind(payload.is_public)
        .bind(payload.rsvp_required)
        .bind(payload.is_featured)
        .fetch_optional(&self.pool)
        .await
        .map_err(classify)?;
        Ok(event)
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(classify)?;
        Ok(())
    }
}

// --- Mock Implementations (For Unit Tests) ---

/// MockUserStore
///
/// In-memory `UserStore` used by the test suite. Enforces the same uniqueness rules
/// as the Postgres backend so handler and service tests observe identical behavior
/// without a database connection.
#[derive(Clone, Default)]
pub struct MockUserStore {
    users: Arc<RwLock<BTreeMap<String, User>>>,
    /// When true, every operation reports a simulated database failure.
    should_fail: bool,
}

impl MockUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self {
            users: Arc::default(),
            should_fail: true,
        }
    }

    fn outage() -> StoreError {
        StoreError::Database(sqlx::Error::PoolClosed)
    }
}

#[async_trait]
impl UserStore for MockUserStore {
    async fn create(&self, user: &User) -> Result<(), StoreError> {
        if self.should_fail {
            return Err(Self::outage());
        }
        let mut users = self.users.write().await;
        if users.contains_key(&user.uid) {
            return Err(StoreError::Conflict(format!(
                "user '{}' already exists",
                user.uid
            )));
        }
        if users.values().any(|u| u.username == user.username) {
            return Err(StoreError::Conflict(format!(
                "username '{}' already exists",
                user.username
            )));
        }
        users.insert(user.uid.clone(), user.clone());
        Ok(())
    }

    async fn get(&self, uid: &str) -> Result<Option<User>, StoreError> {
        if self.should_fail {
            return Err(Self::outage());
        }
        Ok(self.users.read().await.get(uid).cloned())
    }

    async fn list(&self) -> Result<Vec<User>, StoreError> {
        if self.should_fail {
            return Err(Self::outage());
        }
        // BTreeMap iteration already yields uid order.
        Ok(self.users.read().await.values().cloned().collect())
    }

    async fn update(&self, user: &User) -> Result<bool, StoreError> {
        if self.should_fail {
            return Err(Self::outage());
        }
        let mut users = self.users.write().await;
        if users
            .values()
            .any(|u| u.username == user.username && u.uid != user.uid)
        {
            return Err(StoreError::Conflict(format!(
                "username '{}' already exists",
                user.username
            )));
        }
        match users.get_mut(&user.uid) {
            Some(slot) => {
                *slot = user.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, uid: &str) -> Result<(), StoreError> {
        if self.should_fail {
            return Err(Self::outage());
        }
        self.users.write().await.remove(uid);
        Ok(())
    }
}

/// MockEventStore
///
/// In-memory `EventStore`. Holds a handle to the user map of the `MockUserStore` it
/// was linked to, so the creator reference rule behaves like the real foreign key.
pub struct MockEventStore {
    events: RwLock<BTreeMap<i64, Event>>,
    next_id: AtomicI64,
    users: Arc<RwLock<BTreeMap<String, User>>>,
    should_fail: bool,
}

impl MockEventStore {
    /// Builds an event store that validates creators against the given user store.
    pub fn linked_to(users: &MockUserStore) -> Self {
        Self {
            events: RwLock::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
            users: users.users.clone(),
            should_fail: false,
        }
    }

    pub fn new_failing() -> Self {
        let mut store = Self::linked_to(&MockUserStore::new());
        store.should_fail = true;
        store
    }

    fn outage() -> StoreError {
        StoreError::Database(sqlx::Error::PoolClosed)
    }

    async fn check_creator(&self, uid: &str) -> Result<(), StoreError> {
        if self.users.read().await.contains_key(uid) {
            Ok(())
        } else {
            Err(StoreError::InvalidReference(format!(
                "event creator '{}' does not exist",
                uid
            )))
        }
    }
}

#[async_trait]
impl EventStore for MockEventStore {
    async fn create(&self, payload: &EventPayload) -> Result<Event, StoreError> {
        if self.should_fail {
            return Err(Self::outage());
        }
        self.check_creator(&payload.created_by).await?;
        let now = Utc::now();
        let event = Event {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            created_by: payload.created_by.clone(),
            title: payload.title.clone(),
            description: payload.description.clone(),
            location: payload.location.clone(),
            organizer_contact_info: payload.organizer_contact_info.clone(),
            external_link: payload.external_link.clone(),
            event_type: payload.event_type.clone(),
            updated_by: payload.updated_by.clone(),
            images: payload.images.clone(),
            tags: payload.tags.clone(),
            start_time: payload.start_time,
            end_time: payload.end_time,
            status: payload.status.clone(),
            max_attendees: payload.max_attendees,
            attendees_count: payload.attendees_count,
            is_public: payload.is_public,
            rsvp_required: payload.rsvp_required,
            is_featured: payload.is_featured,
            created_at: now,
            updated_at: now,
        };
        self.events.write().await.insert(event.id, event.clone());
        Ok(event)
    }

    async fn get(&self, id: i64) -> Result<Option<Event>, StoreError> {
        if self.should_fail {
            return Err(Self::outage());
        }
        Ok(self.events.read().await.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Event>, StoreError> {
        if self.should_fail {
            return Err(Self::outage());
        }
        Ok(self.events.read().await.values().cloned().collect())
    }

    async fn update(&self, id: i64, payload: &EventPayload) -> Result<Option<Event>, StoreError> {
        if self.should_fail {
            return Err(Self::outage());
        }
        self.check_creator(&payload.created_by).await?;
        let mut events = self.events.write().await;
        match events.get_mut(&id) {
            Some(event) => {
                let created_at = event.created_at;
                *event = Event {
                    id,
                    created_by: payload.created_by.clone(),
                    title: payload.title.clone(),
                    description: payload.description.clone(),
                    location: payload.location.clone(),
                    organizer_contact_info: payload.organizer_contact_info.clone(),
                    external_link: payload.external_link.clone(),
                    event_type: payload.event_type.clone(),
                    updated_by: payload.updated_by.clone(),
                    images: payload.images.clone(),
                    tags: payload.tags.clone(),
                    start_time: payload.start_time,
                    end_time: payload.end_time,
                    status: payload.status.clone(),
                    max_attendees: payload.max_attendees,
                    attendees_count: payload.attendees_count,
                    is_public: payload.is_public,
                    rsvp_required: payload.rsvp_required,
                    is_featured: payload.is_featured,
                    created_at,
                    updated_at: Utc::now(),
                };
                Ok(Some(event.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        if self.should_fail {
            return Err(Self::outage());
        }
        self.events.write().await.remove(&id);
        Ok(())
    }
}
