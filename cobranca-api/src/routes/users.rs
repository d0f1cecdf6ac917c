/// The caller's own profile
///
/// - `GET /usuario` - Profile of the authenticated user
/// - `PUT /usuario` - Full profile update

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{non_blank, ValidatedJson},
};
use axum::{extract::State, http::StatusCode, Json};
use cobranca_shared::{
    auth::{middleware::AuthContext, password},
    models::user::{UpdateUser, User},
};
use serde::Deserialize;
use validator::Validate;

/// Exact length of CPF and phone numbers, digits only
const DOCUMENT_LEN: usize = 11;

/// Profile update request
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
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

    #[serde(rename = "cpf")]
    pub national_id: Option<String>,

    #[serde(rename = "telefone")]
    pub phone: Option<String>,
}

/// Optional documents after trimming; blank means absent
#[derive(Debug, PartialEq, Eq)]
struct Documents {
    national_id: Option<String>,
    phone: Option<String>,
}

impl UpdateProfileRequest {
    fn documents(&self) -> ApiResult<Documents> {
        let national_id = non_blank(self.national_id.clone());
        let phone = non_blank(self.phone.clone());

        if national_id.as_ref().is_some_and(|v| v.chars().count() != DOCUMENT_LEN) {
            return Err(ApiError::invalid_field("cpf", "CPF deve ter 11 caracteres."));
        }

        if phone.as_ref().is_some_and(|v| v.chars().count() != DOCUMENT_LEN) {
            return Err(ApiError::invalid_field(
                "telefone",
                "Telefone deve ter 11 caracteres.",
            ));
        }

        Ok(Documents { national_id, phone })
    }
}

pub async fn profile(auth: AuthContext) -> Json<User> {
    Json(auth.user)
}

/// Overwrites the caller's profile
///
/// E-mail, CPF and phone must not belong to another user; the first
/// collision, checked in that order, is reported. Responds `204 No Content`.
///
/// # Errors
///
/// - `400 Bad Request`: missing fields, bad document length, or a collision
pub async fn update_profile(
    State(state): State<AppState>,
    auth: AuthContext,
    ValidatedJson(req): ValidatedJson<UpdateProfileRequest>,
) -> ApiResult<StatusCode> {
    let documents = req.documents()?;

    let mut data = UpdateUser {
        name: req.name.unwrap_or_default(),
        email: req.email.unwrap_or_default(),
        password_hash: String::new(),
        national_id: documents.national_id,
        phone: documents.phone,
    };

    let mut tx = state.db.begin().await?;

    if let Some(field) = User::find_conflict(&mut *tx, data.contact_values(), Some(auth.user_id())).await? {
        return Err(ApiError::field_conflict(field));
    }

    data.password_hash = password::hash_password(&req.password.unwrap_or_default())?;

    User::update(&mut *tx, auth.user_id(), &data)
        .await?
        .ok_or_else(|| ApiError::NotFound("Usuário não encontrado.".to_string()))?;
    tx.commit().await?;

    tracing::info!(user_id = auth.user_id(), "Profile updated");

    Ok(StatusCode::NO_CONTENT)
}
