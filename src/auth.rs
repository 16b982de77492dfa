use crate::AppState;
use crate::config::AppConfig;
use crate::error::AuthError;
use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Name of the session cookie issued by the identity provider's browser SDK.
pub const SESSION_COOKIE: &str = "__session";

/// Clock skew tolerated when checking the expiry reported by the provider.
const REMOTE_LEEWAY_SECS: i64 = 10;

/// Claims
///
/// The claim set carried by a provider-issued session token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the provider-side account id of the signed-in user.
    pub sub: String,
    /// Expiration Time (exp): timestamp after which the token must not be accepted.
    pub exp: usize,
    /// Issued At (iat): timestamp when the token was issued.
    pub iat: usize,
}

/// Why the local signature check declined a token. Either way the caller falls
/// through to the provider, but expiry is common enough to log distinctly.
#[derive(Debug)]
pub enum LocalVerifyError {
    Expired,
    Invalid(String),
}

/// CredentialVerifier
///
/// Verifies session tokens locally against the provider's published RSA public key.
/// This is the fast path: no network round trip when the signature and expiry check
/// out.
pub struct CredentialVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl CredentialVerifier {
    /// Builds a verifier from a PEM-encoded RSA public key.
    pub fn from_pem(pem: &[u8]) -> Result<Self, jsonwebtoken::errors::Error> {
        let key = DecodingKey::from_rsa_pem(pem)?;
        let mut validation = Validation::new(Algorithm::RS256);

        // Ensure expiration time validation is always active.
        validation.validate_exp = true;

        Ok(Self { key, validation })
    }

    pub fn verify(&self, token: &str) -> Result<Claims, LocalVerifyError> {
        match decode::<Claims>(token, &self.key, &self.validation) {
            Ok(data) => Ok(data.claims),
            Err(e) => match e.kind() {
                // Token expired: the most common failure for a valid-but-old token.
                ErrorKind::ExpiredSignature => Err(LocalVerifyError::Expired),
                // Catch all other failure types (bad signature, malformed token, etc.).
                _ => Err(LocalVerifyError::Invalid(e.to_string())),
            },
        }
    }
}

/// RemoteSession
///
/// The provider's answer to a session verification call.
#[derive(Debug, Deserialize)]
pub struct RemoteSession {
    pub subject: String,
    pub expires_at: i64,
}

/// ProviderAccount
///
/// The provider's account record for a session subject. Only the moderation state
/// matters to this application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderAccount {
    pub id: String,
    pub banned: bool,
}

/// SessionVerifier
///
/// The remote half of session verification, kept behind a trait so tests can swap in
/// a scripted provider instead of a live HTTP endpoint. Errors are plain strings; the
/// gate decides how each call site's failure maps onto the HTTP surface.
#[async_trait]
pub trait SessionVerifier: Send + Sync {
    /// Asks the provider whether the raw session token is currently valid.
    async fn verify_session(&self, token: &str) -> Result<RemoteSession, String>;
    /// Fetches the provider's account record for a verified subject.
    async fn fetch_account(&self, subject: &str) -> Result<ProviderAccount, String>;
}

/// HttpSessionVerifier
///
/// `SessionVerifier` backed by the provider's REST API. All calls authenticate with
/// the server-side API key; the session token itself travels in the request body.
pub struct HttpSessionVerifier {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpSessionVerifier {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            api_key,
        }
    }
}

#[async_trait]
impl SessionVerifier for HttpSessionVerifier {
    async fn verify_session(&self, token: &str) -> Result<RemoteSession, String> {
        let response = self
            .client
            .post(format!("{}/v1/tokens/verify", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({ "token": token }))
            .send()
            .await
            .map_err(|e| format!("provider request failed: {e}"))?;

        if !response.status().is_success() {
            return Err(format!(
                "provider rejected the session ({})",
                response.status()
            ));
        }

        response
            .json::<RemoteSession>()
            .await
            .map_err(|e| format!("provider returned an unreadable session: {e}"))
    }

    async fn fetch_account(&self, subject: &str) -> Result<ProviderAccount, String> {
        let response = self
            .client
            .get(format!("{}/v1/users/{}", self.base_url, subject))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| format!("provider request failed: {e}"))?;

        if !response.status().is_success() {
            return Err(format!(
                "provider rejected the account lookup ({})",
                response.status()
            ));
        }

        response
            .json::<ProviderAccount>()
            .await
            .map_err(|e| format!("provider returned an unreadable account: {e}"))
    }
}

/// VerifiedSession
///
/// What the gate attaches to a request after a successful check. The account is only
/// present when the remote path ran; the local fast path trusts the signature alone.
#[derive(Debug, Clone)]
pub struct VerifiedSession {
    pub subject: String,
    pub account: Option<ProviderAccount>,
}

/// AccessGate
///
/// Two-stage session check guarding the admin surface. A token that passes the local
/// RSA verification is accepted outright. A token the local check declines, whether
/// expired or malformed, is handed to the provider for the authoritative answer, and
/// only then is the account's moderation state consulted.
pub struct AccessGate {
    local: CredentialVerifier,
    remote: Arc<dyn SessionVerifier>,
}

impl AccessGate {
    pub fn new(local: CredentialVerifier, remote: Arc<dyn SessionVerifier>) -> Self {
        Self { local, remote }
    }

    /// Wires the gate from application config: local key from the configured PEM,
    /// remote calls against the configured provider endpoint.
    pub fn from_config(config: &AppConfig) -> Result<Self, jsonwebtoken::errors::Error> {
        let local = CredentialVerifier::from_pem(config.jwt_public_key.as_bytes())?;
        let remote =
            HttpSessionVerifier::new(config.auth_api_url.clone(), config.auth_api_key.clone());
        Ok(Self::new(local, Arc::new(remote)))
    }

    pub async fn authorize(&self, token: &str) -> Result<VerifiedSession, AuthError> {
        // 1. Local fast path.
        match self.local.verify(token) {
            Ok(claims) => {
                return Ok(VerifiedSession {
                    subject: claims.sub,
                    account: None,
                });
            }
            Err(LocalVerifyError::Expired) => {
                tracing::debug!("local session check expired, deferring to provider");
            }
            Err(LocalVerifyError::Invalid(reason)) => {
                tracing::debug!(%reason, "local session check failed, deferring to provider");
            }
        }

        // 2. Authoritative remote check.
        let session = self
            .remote
            .verify_session(token)
            .await
            .map_err(AuthError::VerificationFailed)?;

        if session.expires_at + REMOTE_LEEWAY_SECS < Utc::now().timestamp() {
            return Err(AuthError::VerificationFailed(
                "session has expired".to_string(),
            ));
        }

        // 3. Moderation state.
        let account = self
            .remote
            .fetch_account(&session.subject)
            .await
            .map_err(AuthError::ProviderUnavailable)?;

        if account.banned {
            return Err(AuthError::Banned);
        }

        Ok(VerifiedSession {
            subject: session.subject,
            account: Some(account),
        })
    }
}

/// Pulls the session cookie value out of the request headers, if present and
/// non-empty.
fn session_cookie(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    for pair in cookies.split(';') {
        if let Some((name, value)) = pair.trim().split_once('=') {
            if name == SESSION_COOKIE && !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }
    None
}

/// require_session
///
/// Middleware for the protected route groups. Requests without a session cookie are
/// refused before any verification work happens; verified sessions are attached as a
/// request extension for downstream handlers.
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = session_cookie(request.headers()).ok_or(AuthError::MissingCredentials)?;
    let session = state.gate.authorize(&token).await?;
    request.extensions_mut().insert(session);
    Ok(next.run(request).await)
}
