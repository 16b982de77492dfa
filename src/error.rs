use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

use crate::{repository::StoreError, views};

/// ApiError
///
/// The single error surface of the REST endpoints. Every handler returns
/// `Result<_, ApiError>` and every failure renders as a `{"error": ...}` JSON body
/// with the status the variant maps to. Storage details are logged server-side and
/// never leak into the response.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request body could not be parsed at all (malformed JSON, wrong shape).
    #[error("{0}")]
    BadInput(String),

    /// The body parsed but violated a field rule (empty id, unknown role, ...).
    #[error("{0}")]
    Validation(String),

    /// Lookup for the named resource came back empty.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// A uniqueness rule was violated (duplicate uid or username).
    #[error("{0}")]
    Conflict(String),

    /// The storage layer failed for reasons unrelated to the request.
    #[error("storage failure")]
    Storage(#[source] StoreError),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(msg) => ApiError::Conflict(msg),
            StoreError::InvalidReference(msg) => ApiError::Validation(msg),
            other => ApiError::Storage(other),
        }
    }
}

impl From<garde::Report> for ApiError {
    fn from(report: garde::Report) -> Self {
        ApiError::Validation(report.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadInput(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadInput(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::BadInput(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, self.to_string()),
            ApiError::Storage(err) => {
                // The caller sees a generic message; the real cause goes to the log.
                tracing::error!("storage failure: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal error".to_string(),
                )
            }
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

/// AuthError
///
/// The error surface of the access gate. Gate denials happen on the HTML side of the
/// application (admin pages, Swagger UI), so these render as a full error page rather
/// than a JSON body.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The session cookie was absent or empty.
    #[error("authentication is needed")]
    MissingCredentials,

    /// Neither the local key nor the identity provider would vouch for the token.
    #[error("{0}")]
    VerificationFailed(String),

    /// The identity provider flagged the account.
    #[error("user is banned")]
    Banned,

    /// The token verified but the account record could not be fetched.
    #[error("{0}")]
    ProviderUnavailable(String),
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::MissingCredentials
            | AuthError::VerificationFailed(_)
            | AuthError::Banned => StatusCode::FORBIDDEN,
            AuthError::ProviderUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AuthError::ProviderUnavailable(detail) => {
                tracing::error!("account lookup failed: {}", detail);
                "Failed to get user information".to_string()
            }
            other => format!("Access denied: {}", other),
        };
        (status, Html(views::error_page(status, &message))).into_response()
    }
}
