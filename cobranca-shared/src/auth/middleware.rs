/// Authentication gate for Axum
///
/// Protected routes resolve the caller from the `Authorization: Bearer <token>`
/// header. The token is verified, its subject is loaded from the
/// [`CredentialStore`] and the resulting [`AuthContext`] is placed in the
/// request extensions. When any step fails the downstream handler never runs.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use axum::{middleware, routing::get, Router};
/// use chrono::Duration;
/// use cobranca_shared::auth::jwt::TokenService;
/// use cobranca_shared::auth::middleware::{require_auth, AuthContext, AuthGate};
/// use sqlx::PgPool;
///
/// async fn profile(auth: AuthContext) -> String {
///     format!("Olá, {}!", auth.user.name)
/// }
///
/// fn router(pool: PgPool) -> Router {
///     let tokens = Arc::new(TokenService::new("secret-key-at-least-32-bytes-long!", Duration::hours(8)));
///     let gate = AuthGate::new(tokens, Arc::new(pool));
///
///     Router::new()
///         .route("/usuario", get(profile))
///         .layer(middleware::from_fn_with_state(gate, require_auth))
/// }
/// ```

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{debug, error};

use super::jwt::{JwtError, TokenService};
use crate::models::user::{CredentialStore, User};

/// Authenticated caller, available to handlers behind the gate
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user: User,
}

impl AuthContext {
    pub fn user_id(&self) -> i32 {
        self.user.id
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or(AuthError::MissingCredentials)
    }
}

/// Error type for the authentication gate
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No `Authorization` header
    #[error("Missing credentials")]
    MissingCredentials,

    /// Not a bearer token, or the token failed verification
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// Token was valid once but its expiration has passed
    #[error("Token has expired")]
    Expired,

    /// Token subject no longer exists
    #[error("Unknown user")]
    UnknownUser,

    /// Credential store failure
    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => AuthError::Expired,
            other => AuthError::InvalidToken(other.to_string()),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AuthError::MissingCredentials => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "Para acessar este recurso um token de autenticação válido deve ser enviado.",
            ),
            AuthError::InvalidToken(_) | AuthError::UnknownUser => {
                (StatusCode::UNAUTHORIZED, "unauthorized", "Token inválido.")
            }
            AuthError::Expired => (StatusCode::UNAUTHORIZED, "unauthorized", "Token expirado."),
            AuthError::Storage(err) => {
                error!(error = %err, "Credential store failure during authentication");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Erro interno do servidor.",
                )
            }
        };

        (status, Json(json!({ "erro": code, "mensagem": message }))).into_response()
    }
}

/// State for [`require_auth`]
#[derive(Clone)]
pub struct AuthGate {
    tokens: Arc<TokenService>,
    store: Arc<dyn CredentialStore>,
}

impl AuthGate {
    pub fn new(tokens: Arc<TokenService>, store: Arc<dyn CredentialStore>) -> Self {
        Self { tokens, store }
    }
}

/// Resolves the caller identified by the bearer token in `headers`
///
/// # Errors
///
/// - [`AuthError::MissingCredentials`] if there is no `Authorization` header
/// - [`AuthError::InvalidToken`] for a non-bearer header or a bad token
/// - [`AuthError::Expired`] once the token's expiration has passed
/// - [`AuthError::UnknownUser`] if the subject is not in the store
/// - [`AuthError::Storage`] if the store lookup fails
pub async fn authenticate<S>(
    headers: &HeaderMap,
    tokens: &TokenService,
    store: &S,
) -> Result<User, AuthError>
where
    S: CredentialStore + ?Sized,
{
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingCredentials)?
        .to_str()
        .map_err(|_| AuthError::InvalidToken("Non-ASCII authorization header".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AuthError::InvalidToken("Expected Bearer token".to_string()))?;

    let claims = tokens.verify(token)?;

    store
        .find_by_id(claims.sub)
        .await
        .map_err(|e| AuthError::Storage(e.to_string()))?
        .ok_or(AuthError::UnknownUser)
}

/// Middleware guarding every protected route
///
/// Use with `axum::middleware::from_fn_with_state(gate, require_auth)`.
pub async fn require_auth(
    State(gate): State<AuthGate>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let user = match authenticate(req.headers(), &gate.tokens, gate.store.as_ref()).await {
        Ok(user) => user,
        Err(err) => {
            debug!(error = %err, path = %req.uri().path(), "Authentication rejected");
            return Err(err);
        }
    };

    debug!(user_id = user.id, "Request authenticated");
    req.extensions_mut().insert(AuthContext { user });

    Ok(next.run(req).await)
}
