use crate::{
    AppState,
    auth::VerifiedSession,
    error::ApiError,
    models::{Event, EventPayload, User},
    views,
};
use axum::{
    Extension, Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

// --- User API Handlers ---

/// create_user
///
/// [Public Route] Registers a user record, mirroring an account that exists at the
/// identity provider. The uid is client-supplied for exactly that reason.
#[utoipa::path(
    post,
    path = "/api/user",
    request_body = User,
    responses(
        (status = 201, description = "Created", body = User),
        (status = 400, description = "Malformed or invalid payload"),
        (status = 409, description = "Duplicate uid or username")
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<User>, JsonRejection>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let Json(user) = payload?;
    let created = state.users.create(user).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// list_users
///
/// [Public Route] Lists every user, ordered by uid.
#[utoipa::path(
    get,
    path = "/api/user",
    responses((status = 200, description = "All users", body = [User]))
)]
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>, ApiError> {
    Ok(Json(state.users.list().await?))
}

/// get_user
///
/// [Public Route] Retrieves a single user by uid.
#[utoipa::path(
    get,
    path = "/api/user/{uid}",
    params(("uid" = String, Path, description = "User uid")),
    responses(
        (status = 200, description = "Found", body = User),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(uid): Path<String>,
) -> Result<Json<User>, ApiError> {
    Ok(Json(state.users.get(&uid).await?))
}

/// update_user
///
/// [Public Route] Replaces a user record.
///
/// *Note*: the path segment names the target; any uid carried in the body is ignored.
#[utoipa::path(
    put,
    path = "/api/user/{uid}",
    request_body = User,
    responses(
        (status = 200, description = "Updated", body = User),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Duplicate username")
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    Path(uid): Path<String>,
    payload: Result<Json<User>, JsonRejection>,
) -> Result<Json<User>, ApiError> {
    let Json(mut user) = payload?;
    user.uid = uid;
    Ok(Json(state.users.update(user).await?))
}

/// delete_user
///
/// [Public Route] Removes a user. Deleting a uid that never existed still answers
/// 204, so the operation can be retried safely.
#[utoipa::path(
    delete,
    path = "/api/user/{uid}",
    responses(
        (status = 204, description = "Deleted"),
        (status = 400, description = "User still owns events")
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(uid): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.users.delete(&uid).await?;
    Ok(StatusCode::NO_CONTENT)
}

// --- Event API Handlers ---

/// create_event
///
/// [Public Route] Creates an event. The id and timestamps are generated by the
/// store; everything else comes from the payload, with the documented defaults
/// filling any omitted field.
#[utoipa::path(
    post,
    path = "/api/event",
    request_body = EventPayload,
    responses(
        (status = 201, description = "Created", body = Event),
        (status = 400, description = "Malformed payload or unknown creator")
    )
)]
pub async fn create_event(
    State(state): State<AppState>,
    payload: Result<Json<EventPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<Event>), ApiError> {
    let Json(payload) = payload?;
    let created = state.events.create(payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// list_events
///
/// [Public Route] Lists every event, ordered by id.
#[utoipa::path(
    get,
    path = "/api/event",
    responses((status = 200, description = "All events", body = [Event]))
)]
pub async fn list_events(State(state): State<AppState>) -> Result<Json<Vec<Event>>, ApiError> {
    Ok(Json(state.events.list().await?))
}

/// get_event
///
/// [Public Route] Retrieves a single event by id. A non-numeric id is a 400, a
/// numeric id with no row behind it a 404.
#[utoipa::path(
    get,
    path = "/api/event/{id}",
    params(("id" = i64, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Found", body = Event),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_event(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Event>, ApiError> {
    let Path(id) = id?;
    Ok(Json(state.events.get(id).await?))
}

/// update_event
///
/// [Public Route] Replaces an event. The target id comes from the path alone; the
/// payload shape has no id to disagree with it.
#[utoipa::path(
    put,
    path = "/api/event/{id}",
    request_body = EventPayload,
    responses(
        (status = 200, description = "Updated", body = Event),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_event(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<EventPayload>, JsonRejection>,
) -> Result<Json<Event>, ApiError> {
    let Path(id) = id?;
    let Json(payload) = payload?;
    Ok(Json(state.events.update(id, payload).await?))
}

/// delete_event
///
/// [Public Route] Removes an event. Idempotent like user deletion.
#[utoipa::path(
    delete,
    path = "/api/event/{id}",
    params(("id" = i64, Path, description = "Event ID")),
    responses((status = 204, description = "Deleted"))
)]
pub async fn delete_event(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = id?;
    state.events.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// --- Page Handlers ---

/// home
///
/// [Public Page] The landing page.
pub async fn home() -> Html<String> {
    Html(views::home_page())
}

/// sign_in
///
/// [Public Page] Form for pasting a provider session token into the session cookie.
pub async fn sign_in() -> Html<String> {
    Html(views::sign_in_page())
}

/// admin_home
///
/// [Protected Page] The dashboard, summarizing both stores for the verified session.
pub async fn admin_home(
    State(state): State<AppState>,
    Extension(session): Extension<VerifiedSession>,
) -> Response {
    let users = match state.users.list().await {
        Ok(users) => users,
        Err(err) => return page_failure(err),
    };
    let events = match state.events.list().await {
        Ok(events) => events,
        Err(err) => return page_failure(err),
    };
    Html(views::dashboard_page(
        &session.subject,
        users.len(),
        events.len(),
    ))
    .into_response()
}

/// admin_users_page
///
/// [Protected Page] The user table with inline create and delete controls.
pub async fn admin_users_page(State(state): State<AppState>) -> Response {
    match state.users.list().await {
        Ok(users) => Html(views::users_page(&users)).into_response(),
        Err(err) => page_failure(err),
    }
}

/// admin_events_page
///
/// [Protected Page] The event table with inline create and delete controls.
pub async fn admin_events_page(State(state): State<AppState>) -> Response {
    match state.events.list().await {
        Ok(events) => Html(views::events_page(&events)).into_response(),
        Err(err) => page_failure(err),
    }
}

/// Renders the HTML failure page for admin handlers. The underlying error is logged
/// here; the page itself only says the data could not be loaded.
fn page_failure(err: ApiError) -> Response {
    tracing::error!(error = ?err, "failed to load admin page data");
    let status = StatusCode::INTERNAL_SERVER_ERROR;
    (status, Html(views::error_page(status, "could not load page data"))).into_response()
}
