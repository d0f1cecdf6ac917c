/// Error handling for the API server
///
/// All handlers return `Result<T, ApiError>`, which converts into a status
/// code and a JSON body:
///
/// ```json
/// { "erro": "conflict", "mensagem": "O e-mail já está cadastrado.", "campo": "email" }
/// ```
///
/// Validation failures add `detalhes`, one entry per failed field, and use
/// the first of them as `mensagem`.
///
/// # Example
///
/// ```
/// use cobranca_api::error::{ApiError, ApiResult};
///
/// fn find(id: i32) -> ApiResult<i32> {
///     if id == 7 {
///         Ok(id)
///     } else {
///         Err(ApiError::NotFound("Cliente não encontrado.".to_string()))
///     }
/// }
///
/// assert!(find(1).is_err());
/// ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use cobranca_shared::auth::{jwt::JwtError, password::PasswordError};
use cobranca_shared::models::contact::ContactField;
use serde::{Deserialize, Serialize};
use std::fmt;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

const INTERNAL_MESSAGE: &str = "Erro interno do servidor.";

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400)
    BadRequest(String),

    /// Missing, invalid or expired token, or bad login (401)
    Unauthorized(String),

    /// Absent, or owned by someone else (404)
    NotFound(String),

    /// Uniqueness or business rule violation (400)
    Conflict {
        field: Option<&'static str>,
        message: String,
    },

    /// Missing or malformed fields (400)
    ValidationError(Vec<ValidationErrorDetail>),

    /// Internal server error (500); the message is logged, never returned
    InternalError(String),
}

/// Validation error detail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field name as sent on the wire
    #[serde(rename = "campo")]
    pub field: String,

    #[serde(rename = "mensagem")]
    pub message: String,
}

impl ValidationErrorDetail {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Machine-readable code (e.g. "not_found")
    #[serde(rename = "erro")]
    pub error: String,

    #[serde(rename = "mensagem")]
    pub message: String,

    #[serde(rename = "campo", skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,

    #[serde(rename = "detalhes", skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

/// Request fields in reporting order, with their wire names
const FIELDS: &[(&str, &str)] = &[
    ("customer_id", "cliente_id"),
    ("name", "nome"),
    ("description", "descricao"),
    ("email", "email"),
    ("password", "senha"),
    ("national_id", "cpf"),
    ("phone", "telefone"),
    ("postal_code", "cep"),
    ("street", "endereco"),
    ("complement", "complemento"),
    ("district", "bairro"),
    ("city", "cidade"),
    ("state", "estado"),
    ("status", "status"),
    ("amount", "valor"),
    ("due_date", "vencimento"),
];

fn wire_field(field: &str) -> (usize, String) {
    FIELDS
        .iter()
        .position(|(rust, _)| *rust == field)
        .map(|index| (index, FIELDS[index].1.to_string()))
        .unwrap_or((FIELDS.len(), field.to_string()))
}

impl ApiError {
    /// Single-field validation failure
    pub fn invalid_field(field: &str, message: impl Into<String>) -> Self {
        ApiError::ValidationError(vec![ValidationErrorDetail::new(field, message)])
    }

    /// A contact value already taken
    pub fn field_conflict(field: ContactField) -> Self {
        ApiError::Conflict {
            field: Some(field.wire_name()),
            message: field.conflict_message().to_string(),
        }
    }

    /// A business rule violation not tied to a field
    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict {
            field: None,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Conflict { .. } | ApiError::ValidationError(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict { field: Some(field), message } => {
                write!(f, "Conflict on {}: {}", field, message)
            }
            ApiError::Conflict { field: None, message } => write!(f, "Conflict: {}", message),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match self {
            ApiError::BadRequest(msg) => ErrorResponse {
                error: "bad_request".to_string(),
                message: msg,
                field: None,
                details: None,
            },
            ApiError::Unauthorized(msg) => ErrorResponse {
                error: "unauthorized".to_string(),
                message: msg,
                field: None,
                details: None,
            },
            ApiError::NotFound(msg) => ErrorResponse {
                error: "not_found".to_string(),
                message: msg,
                field: None,
                details: None,
            },
            ApiError::Conflict { field, message } => ErrorResponse {
                error: "conflict".to_string(),
                message,
                field: field.map(str::to_string),
                details: None,
            },
            ApiError::ValidationError(errors) => ErrorResponse {
                error: "validation_error".to_string(),
                message: errors
                    .first()
                    .map(|detail| detail.message.clone())
                    .unwrap_or_else(|| "Dados inválidos.".to_string()),
                field: errors.first().map(|detail| detail.field.clone()),
                details: Some(errors),
            },
            ApiError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                ErrorResponse {
                    error: "internal_error".to_string(),
                    message: INTERNAL_MESSAGE.to_string(),
                    field: None,
                    details: None,
                }
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Convert sqlx errors to API errors
///
/// Unique violations on contact columns become the matching field conflict.
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if let Some(field) = db_err.constraint().and_then(ContactField::from_constraint) {
                return ApiError::field_conflict(field);
            }
        }

        ApiError::InternalError(format!("Database error: {}", err))
    }
}

/// Convert validator errors, ordered by field and renamed to wire names
impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut details: Vec<(usize, ValidationErrorDetail)> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                let (order, wire) = wire_field(field);
                errors.iter().map(move |error| {
                    (
                        order,
                        ValidationErrorDetail::new(
                            wire.clone(),
                            error
                                .message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| format!("O campo {} é inválido.", wire)),
                        ),
                    )
                })
            })
            .collect();

        details.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.field.cmp(&b.1.field)));

        ApiError::ValidationError(details.into_iter().map(|(_, detail)| detail).collect())
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::InternalError(format!("Password operation failed: {}", err))
    }
}

impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::CreateError(msg) => ApiError::InternalError(format!("Token creation failed: {}", msg)),
            JwtError::Expired => ApiError::Unauthorized("Token expirado.".to_string()),
            JwtError::InvalidIssuer | JwtError::Invalid(_) => {
                ApiError::Unauthorized("Token inválido.".to_string())
            }
        }
    }
}
