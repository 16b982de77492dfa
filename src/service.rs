use crate::error::ApiError;
use crate::models::{Event, EventPayload, User};
use crate::repository::{EventStore, UserStore};
use garde::Validate;
use std::sync::Arc;

/// UserService
///
/// Thin application layer over the user store. Validates payloads before they reach
/// storage and maps missing rows onto `ApiError::NotFound`, so the REST handlers and
/// the admin pages share one rule set.
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn UserStore>,
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, user: User) -> Result<User, ApiError> {
        user.validate(&())?;
        self.store.create(&user).await?;
        Ok(user)
    }

    pub async fn get(&self, uid: &str) -> Result<User, ApiError> {
        self.store
            .get(uid)
            .await?
            .ok_or(ApiError::NotFound("user"))
    }

    pub async fn list(&self) -> Result<Vec<User>, ApiError> {
        Ok(self.store.list().await?)
    }

    pub async fn update(&self, user: User) -> Result<User, ApiError> {
        user.validate(&())?;
        if self.store.update(&user).await? {
            Ok(user)
        } else {
            Err(ApiError::NotFound("user"))
        }
    }

    pub async fn delete(&self, uid: &str) -> Result<(), ApiError> {
        Ok(self.store.delete(uid).await?)
    }
}

/// EventService
///
/// Application layer over the event store. Same shape as `UserService`; the store
/// hands back the finished row on create and update because the id and timestamps
/// are generated server side.
#[derive(Clone)]
pub struct EventService {
    store: Arc<dyn EventStore>,
}

impl EventService {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, payload: EventPayload) -> Result<Event, ApiError> {
        payload.validate(&())?;
        Ok(self.store.create(&payload).await?)
    }

    pub async fn get(&self, id: i64) -> Result<Event, ApiError> {
        self.store
            .get(id)
            .await?
            .ok_or(ApiError::NotFound("event"))
    }

    pub async fn list(&self) -> Result<Vec<Event>, ApiError> {
        Ok(self.store.list().await?)
    }

    pub async fn update(&self, id: i64, payload: EventPayload) -> Result<Event, ApiError> {
        payload.validate(&())?;
        self.store
            .update(id, &payload)
            .await?
            .ok_or(ApiError::NotFound("event"))
    }

    pub async fn delete(&self, id: i64) -> Result<(), ApiError> {
        Ok(self.store.delete(id).await?)
    }
}
