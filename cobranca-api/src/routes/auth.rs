/// Public account endpoints
///
/// - `GET /verificar-email?email=` - Check whether an e-mail is free
/// - `POST /usuario` - Register a new user
/// - `POST /login` - Exchange e-mail and password for a token

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{non_blank, ValidatedJson},
};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use cobranca_shared::{
    auth::password,
    models::{
        contact::ContactField,
        user::{CreateUser, User},
    },
};
use serde::{Deserialize, Serialize};
use validator::Validate;

const INVALID_CREDENTIALS: &str = "E-mail ou senha inválidos.";

#[derive(Debug, Deserialize)]
pub struct CheckEmailQuery {
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CheckEmailResponse {
    #[serde(rename = "existe")]
    pub exists: bool,
}

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[serde(rename = "nome")]
    #[validate(
        required(message = "O campo nome é obrigatório."),
        length(min = 1, max = 255, message = "O campo nome deve ter entre 1 e 255 caracteres.")
    )]
    pub name: Option<String>,

    #[validate(
        required(message = "O campo email é obrigatório."),
        email(message = "E-mail inválido."),
        length(max = 255, message = "O campo email deve ter no máximo 255 caracteres.")
    )]
    pub email: Option<String>,

    #[serde(rename = "senha")]
    #[validate(
        required(message = "O campo senha é obrigatório."),
        length(min = 1, message = "O campo senha é obrigatório.")
    )]
    pub password: Option<String>,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(
        required(message = "O campo email é obrigatório."),
        length(min = 1, message = "O campo email é obrigatório.")
    )]
    pub email: Option<String>,

    #[serde(rename = "senha")]
    #[validate(
        required(message = "O campo senha é obrigatório."),
        length(min = 1, message = "O campo senha é obrigatório.")
    )]
    pub password: Option<String>,
}

/// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    #[serde(rename = "usuario")]
    pub user: User,

    pub token: String,
}

/// Reports whether `email` is still available
///
/// # Errors
///
/// - `400 Bad Request`: missing e-mail, or e-mail already registered
pub async fn check_email(
    State(state): State<AppState>,
    Query(query): Query<CheckEmailQuery>,
) -> ApiResult<Json<CheckEmailResponse>> {
    let email = non_blank(query.email)
        .ok_or_else(|| ApiError::invalid_field("email", "E-mail é obrigatório."))?;

    if User::email_exists(&state.db, &email).await? {
        return Err(ApiError::Conflict {
            field: Some(ContactField::Email.wire_name()),
            message: "E-mail já está cadastrado.".to_string(),
        });
    }

    Ok(Json(CheckEmailResponse { exists: false }))
}

/// Registers a user
///
/// ```text
/// POST /usuario
///
/// { "nome": "Maria", "email": "maria@example.com", "senha": "segredo" }
/// ```
///
/// Responds `201 Created` with the user (no password hash).
///
/// # Errors
///
/// - `400 Bad Request`: missing fields, invalid e-mail, or e-mail taken
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let data = CreateUser {
        name: req.name.unwrap_or_default(),
        email: req.email.unwrap_or_default(),
        password_hash: password::hash_password(&req.password.unwrap_or_default())?,
    };

    let mut tx = state.db.begin().await?;

    if User::email_exists(&mut *tx, &data.email).await? {
        return Err(ApiError::field_conflict(ContactField::Email));
    }

    // A concurrent insert of the same e-mail still fails on users_email_key
    let user = User::create(&mut *tx, &data).await?;
    tx.commit().await?;

    tracing::info!(user_id = user.id, "User registered");

    Ok((StatusCode::CREATED, Json(user)))
}

/// Authenticates a user and returns an identity token
///
/// # Errors
///
/// - `400 Bad Request`: missing fields
/// - `401 Unauthorized`: unknown e-mail or wrong password
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let email = req.email.unwrap_or_default();
    let password = req.password.unwrap_or_default();

    let Some(user) = User::find_by_email(&state.db, &email).await? else {
        password::verify_dummy(&password)?;
        tracing::debug!("Login rejected: unknown e-mail");
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    };

    if !password::verify_password(&password, &user.password_hash)? {
        tracing::debug!(user_id = user.id, "Login rejected: wrong password");
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    let token = state.tokens.issue(user.id)?;

    tracing::info!(user_id = user.id, "User logged in");

    Ok(Json(LoginResponse { user, token }))
}
