use async_trait::async_trait;
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use event_portal::{
    AppConfig, AppState,
    auth::{
        AccessGate, CredentialVerifier, ProviderAccount, RemoteSession, SessionVerifier,
        VerifiedSession,
    },
    error::ApiError,
    handlers,
    models::{EventPayload, User},
    repository::{MockEventStore, MockUserStore, UserStore},
    service::{EventService, UserService},
};
use std::sync::Arc;
use tokio::test;

// --- TEST UTILITIES ---

// The gate is wired but unused here; handler tests never cross the middleware.
const VERIFYING_KEY: &str = "-----BEGIN PUBLIC KEY-----
MIIBIjANBgkqhkiG9w0BAQEFAAOCAQ8AMIIBCgKCAQEA2hQrC3/1FooA/RfcapV0
/uRmEzEtpLkT5/WfakUunTwVMQXS4QCrDdjcdAvG569Urt1osEYDllv9zYYdCqg9
Y9D6BPie7zGvGLUGR9rjYxBHY4wJgy8ZvrFgImhSFRcVuAEAgrdUMl1BIHue5Aum
amyE5TMFFqgRsDqmxljcYLOy8KmjFtfcxKQ2hQDE+rejeRWa2qj05GBwAghmLthj
Jy6QC9aBfzoJIE5JmrAg6uP2moov/Iey8KIE3tbuN/CCfVRDGdoKwSvEvMqwm6BI
uuSe0uko6nh5onyxiD07BoCIGXFE5ngIYafplrNQaSitSTycBzE3IHcDEgAkrXHG
WQIDAQAB
-----END PUBLIC KEY-----";

struct RejectingProvider;

#[async_trait]
impl SessionVerifier for RejectingProvider {
    async fn verify_session(&self, _token: &str) -> Result<RemoteSession, String> {
        Err("unused".to_string())
    }

    async fn fetch_account(&self, _subject: &str) -> Result<ProviderAccount, String> {
        Err("unused".to_string())
    }
}

// Creates an AppState over the given mock stores.
fn create_test_state(users: MockUserStore, events: MockEventStore) -> AppState {
    let verifier = CredentialVerifier::from_pem(VERIFYING_KEY.as_bytes()).expect("pem parse");
    AppState {
        users: UserService::new(Arc::new(users)),
        events: EventService::new(Arc::new(events)),
        gate: Arc::new(AccessGate::new(verifier, Arc::new(RejectingProvider))),
        config: AppConfig::default(),
    }
}

fn test_user(uid: &str, username: &str) -> User {
    User {
        uid: uid.to_string(),
        username: username.to_string(),
        role: "user".to_string(),
    }
}

async fn into_status_and_body(response: Response) -> (StatusCode, String) {
    let (parts, body) = response.into_parts();
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    (parts.status, String::from_utf8(bytes.to_vec()).unwrap())
}

// --- USER HANDLER TESTS ---

#[test]
async fn test_create_user_success() {
    let users = MockUserStore::new();
    let events = MockEventStore::linked_to(&users);
    let state = create_test_state(users, events);

    let result = handlers::create_user(State(state), Ok(Json(test_user("u1", "ana")))).await;

    let (status, Json(user)) = result.expect("should create");
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(user.uid, "u1");
}

#[test]
async fn test_create_user_rejects_empty_uid() {
    let users = MockUserStore::new();
    let events = MockEventStore::linked_to(&users);
    let state = create_test_state(users, events);

    let result = handlers::create_user(State(state), Ok(Json(test_user("", "ana")))).await;

    let err = result.expect_err("should refuse");
    assert!(matches!(err, ApiError::Validation(_)));
    let (status, body) = into_status_and_body(err.into_response()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("error"));
}

#[test]
async fn test_get_user_not_found() {
    let users = MockUserStore::new();
    let events = MockEventStore::linked_to(&users);
    let state = create_test_state(users, events);

    let result = handlers::get_user(State(state), Path("missing".to_string())).await;

    let err = result.expect_err("should miss");
    let (status, body) = into_status_and_body(err.into_response()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("user not found"));
}

#[test]
async fn test_update_user_target_comes_from_the_path() {
    let users = MockUserStore::new();
    let events = MockEventStore::linked_to(&users);
    users.create(&test_user("u1", "ana")).await.unwrap();
    let state = create_test_state(users.clone(), events);

    // The body claims a different uid; the path decides which row changes.
    let body = test_user("someone-else", "renamed");
    let result = handlers::update_user(State(state), Path("u1".to_string()), Ok(Json(body))).await;

    let Json(updated) = result.expect("should update");
    assert_eq!(updated.uid, "u1");
    assert_eq!(updated.username, "renamed");

    // The row under the body's uid never appeared.
    assert!(users.get("someone-else").await.unwrap().is_none());
}

#[test]
async fn test_update_missing_user_is_not_found() {
    let users = MockUserStore::new();
    let events = MockEventStore::linked_to(&users);
    let state = create_test_state(users, events);

    let result = handlers::update_user(
        State(state),
        Path("ghost".to_string()),
        Ok(Json(test_user("ghost", "ana"))),
    )
    .await;

    let err = result.expect_err("should miss");
    let (status, _body) = into_status_and_body(err.into_response()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[test]
async fn test_delete_user_is_idempotent() {
    let users = MockUserStore::new();
    let events = MockEventStore::linked_to(&users);
    users.create(&test_user("u1", "ana")).await.unwrap();
    let state = create_test_state(users, events);

    let first = handlers::delete_user(State(state.clone()), Path("u1".to_string())).await;
    assert_eq!(first.expect("should delete"), StatusCode::NO_CONTENT);

    let second = handlers::delete_user(State(state), Path("u1".to_string())).await;
    assert_eq!(second.expect("should still be 204"), StatusCode::NO_CONTENT);
}

// --- EVENT HANDLER TESTS ---

#[test]
async fn test_create_event_with_unknown_creator_is_refused() {
    let users = MockUserStore::new();
    let events = MockEventStore::linked_to(&users);
    let state = create_test_state(users, events);

    let payload = EventPayload {
        created_by: "ghost".to_string(),
        title: "Seance".to_string(),
        ..EventPayload::default()
    };
    let result = handlers::create_event(State(state), Ok(Json(payload))).await;

    let err = result.expect_err("should refuse");
    let (status, body) = into_status_and_body(err.into_response()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("does not exist"));
}

#[test]
async fn test_event_create_then_update_keeps_the_id() {
    let users = MockUserStore::new();
    let events = MockEventStore::linked_to(&users);
    users.create(&test_user("u1", "ana")).await.unwrap();
    let state = create_test_state(users, events);

    let payload = EventPayload {
        created_by: "u1".to_string(),
        title: "Picnic".to_string(),
        ..EventPayload::default()
    };
    let result = handlers::create_event(State(state.clone()), Ok(Json(payload.clone()))).await;
    let (status, Json(created)) = result.expect("should create");
    assert_eq!(status, StatusCode::CREATED);

    let renamed = EventPayload {
        title: "Company Picnic".to_string(),
        ..payload
    };
    let result = handlers::update_event(
        State(state),
        Ok(Path(created.id)),
        Ok(Json(renamed)),
    )
    .await;
    let Json(updated) = result.expect("should update");
    assert_eq!(updated.id, created.id);
    assert_eq!(updated.title, "Company Picnic");
    assert_eq!(updated.created_at, created.created_at);
}

#[test]
async fn test_storage_failure_is_a_generic_500() {
    let users = MockUserStore::new_failing();
    let events = MockEventStore::new_failing();
    let state = create_test_state(users, events);

    let result = handlers::list_users(State(state)).await;

    let err = result.expect_err("should fail");
    assert!(matches!(err, ApiError::Storage(_)));
    let (status, body) = into_status_and_body(err.into_response()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    // The wire message stays generic regardless of the underlying cause.
    assert!(body.contains("internal error"));
    assert!(!body.contains("PoolClosed"));
}

// --- ADMIN PAGE HANDLER TESTS ---

#[test]
async fn test_admin_users_page_renders_the_table() {
    let users = MockUserStore::new();
    let events = MockEventStore::linked_to(&users);
    users.create(&test_user("u1", "ana")).await.unwrap();
    let state = create_test_state(users, events);

    let response = handlers::admin_users_page(State(state)).await;

    let (status, body) = into_status_and_body(response).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("<h1>Users</h1>"));
    assert!(body.contains("ana"));
}

#[test]
async fn test_admin_home_shows_the_session_subject() {
    let users = MockUserStore::new();
    let events = MockEventStore::linked_to(&users);
    let state = create_test_state(users, events);
    let session = VerifiedSession {
        subject: "acct_9".to_string(),
        account: None,
    };

    let response = handlers::admin_home(State(state), Extension(session)).await;

    let (status, body) = into_status_and_body(response).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("acct_9"));
}

#[test]
async fn test_admin_page_failure_renders_html() {
    let users = MockUserStore::new_failing();
    let events = MockEventStore::new_failing();
    let state = create_test_state(users, events);

    let response = handlers::admin_users_page(State(state)).await;

    let (status, body) = into_status_and_body(response).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("could not load page data"));
    assert!(body.contains("<html"));
}
