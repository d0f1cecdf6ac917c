/// Charge endpoints
///
/// Charges are reached through their customer, so every lookup checks that
/// the customer belongs to the caller.
///
/// - `POST /cobrancas` - Create a charge
/// - `GET /cobrancas` - Every charge of the caller's customers
/// - `GET /cobrancas/cliente/:id` - Charges of one customer
/// - `PUT /cobrancas/:id` - Full update
/// - `DELETE /cobrancas/:id` - Delete an unpaid charge
///
/// A charge sent as `pendente` with a due date already in the past is stored
/// as `vencida`.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{IdPath, ValidatedJson},
};
use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use cobranca_shared::{
    auth::middleware::AuthContext,
    models::{
        charge::{Charge, ChargeInput, ChargeStatus, ChargeWithCustomer},
        customer::Customer,
    },
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

const NOT_FOUND: &str = "Cobrança não encontrada.";
const PAID_NOT_DELETABLE: &str = "Cobranças pagas não podem ser excluídas.";

/// Create request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateChargeRequest {
    #[serde(rename = "cliente_id")]
    #[validate(required(message = "O campo cliente_id é obrigatório."))]
    pub customer_id: Option<i32>,

    #[serde(rename = "descricao")]
    #[validate(
        required(message = "O campo descricao é obrigatório."),
        length(min = 1, message = "O campo descricao é obrigatório.")
    )]
    pub description: Option<String>,

    #[validate(
        required(message = "O campo status é obrigatório."),
        length(min = 1, message = "O campo status é obrigatório.")
    )]
    pub status: Option<String>,

    /// Number or numeric string
    #[serde(rename = "valor")]
    #[validate(required(message = "O campo valor é obrigatório."))]
    pub amount: Option<Decimal>,

    /// `YYYY-MM-DD` or an RFC 3339 timestamp
    #[serde(rename = "vencimento")]
    #[validate(
        required(message = "O campo vencimento é obrigatório."),
        length(min = 1, message = "O campo vencimento é obrigatório.")
    )]
    pub due_date: Option<String>,
}

impl CreateChargeRequest {
    fn split(self) -> (i32, ChargeFields) {
        (
            self.customer_id.unwrap_or_default(),
            ChargeFields {
                description: self.description,
                status: self.status,
                amount: self.amount,
                due_date: self.due_date,
            },
        )
    }
}

/// Update request; the customer of a charge never changes
#[derive(Debug, Deserialize, Validate)]
pub struct ChargeFields {
    #[serde(rename = "descricao")]
    #[validate(
        required(message = "O campo descricao é obrigatório."),
        length(min = 1, message = "O campo descricao é obrigatório.")
    )]
    pub description: Option<String>,

    #[validate(
        required(message = "O campo status é obrigatório."),
        length(min = 1, message = "O campo status é obrigatório.")
    )]
    pub status: Option<String>,

    #[serde(rename = "valor")]
    #[validate(required(message = "O campo valor é obrigatório."))]
    pub amount: Option<Decimal>,

    #[serde(rename = "vencimento")]
    #[validate(
        required(message = "O campo vencimento é obrigatório."),
        length(min = 1, message = "O campo vencimento é obrigatório.")
    )]
    pub due_date: Option<String>,
}

impl ChargeFields {
    /// Applies the charge rules to validated fields, as of `now`
    fn into_input(self, now: DateTime<Utc>) -> ApiResult<ChargeInput> {
        let status = self
            .status
            .as_deref()
            .map(str::trim)
            .and_then(ChargeStatus::from_request)
            .ok_or_else(|| {
                ApiError::invalid_field("status", "O status deve ser 'pago' ou 'pendente'.")
            })?;

        let amount = self.amount.unwrap_or_default().round_dp(2);
        if amount <= Decimal::ZERO {
            return Err(ApiError::invalid_field("valor", "O valor deve ser maior que zero."));
        }
        if amount > max_amount() {
            return Err(ApiError::invalid_field(
                "valor",
                "O valor deve ser menor que 10.000.000.000,00.",
            ));
        }

        let due = self
            .due_date
            .as_deref()
            .and_then(parse_due_date)
            .ok_or_else(|| ApiError::invalid_field("vencimento", "Data de vencimento inválida."))?;

        let description = self.description.unwrap_or_default();

        Ok(match due {
            DueDate::Day(date) => ChargeInput::new(description, amount, date, status, now),
            DueDate::At(instant) => ChargeInput::due_at(description, amount, instant, status, now),
        })
    }
}

/// Largest amount `NUMERIC(12, 2)` holds
fn max_amount() -> Decimal {
    Decimal::new(999_999_999_999, 2)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DueDate {
    Day(NaiveDate),
    At(DateTime<Utc>),
}

/// Accepts a calendar date or an RFC 3339 timestamp
fn parse_due_date(raw: &str) -> Option<DueDate> {
    let raw = raw.trim();

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(DueDate::Day)
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|ts| DueDate::At(ts.with_timezone(&Utc)))
        })
}

#[derive(Debug, Serialize)]
pub struct ChargeResponse {
    #[serde(rename = "mensagem")]
    pub message: &'static str,

    #[serde(rename = "cobranca")]
    pub charge: Charge,
}

#[derive(Debug, Serialize)]
pub struct ChargeListResponse {
    #[serde(rename = "cobrancas")]
    pub charges: Vec<Charge>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    #[serde(rename = "mensagem")]
    pub message: &'static str,
}

/// Creates a charge for one of the caller's customers
///
/// Responds `201 Created`.
///
/// # Errors
///
/// - `400 Bad Request`: missing field, bad status, amount or date
/// - `404 Not Found`: the customer isn't the caller's
pub async fn create_charge(
    State(state): State<AppState>,
    auth: AuthContext,
    ValidatedJson(req): ValidatedJson<CreateChargeRequest>,
) -> ApiResult<(StatusCode, Json<ChargeResponse>)> {
    let (customer_id, fields) = req.split();
    let input = fields.into_input(Utc::now())?;

    let mut tx = state.db.begin().await?;

    if !Customer::is_owned_by(&mut *tx, customer_id, auth.user_id()).await? {
        return Err(ApiError::NotFound("Cliente não encontrado.".to_string()));
    }

    let charge = Charge::create(&mut *tx, customer_id, &input).await?;
    tx.commit().await?;

    tracing::info!(
        user_id = auth.user_id(),
        customer_id,
        charge_id = charge.id,
        status = charge.status.as_str(),
        "Charge created"
    );

    Ok((
        StatusCode::CREATED,
        Json(ChargeResponse {
            message: "Cobrança cadastrada com sucesso.",
            charge,
        }),
    ))
}

/// Every charge of the caller's customers, with the customer name
pub async fn list_charges(
    State(state): State<AppState>,
    auth: AuthContext,
) -> ApiResult<Json<Vec<ChargeWithCustomer>>> {
    let charges = Charge::list_by_owner(&state.db, auth.user_id()).await?;

    Ok(Json(charges))
}

/// Charges of one customer, latest due date first
///
/// A customer that doesn't exist, or isn't the caller's, has no charges.
pub async fn list_customer_charges(
    State(state): State<AppState>,
    auth: AuthContext,
    IdPath(customer_id): IdPath,
) -> ApiResult<Json<ChargeListResponse>> {
    let charges = if Customer::is_owned_by(&state.db, customer_id, auth.user_id()).await? {
        Charge::list_by_customer(&state.db, customer_id).await?
    } else {
        Vec::new()
    };

    Ok(Json(ChargeListResponse { charges }))
}

/// Overwrites one of the caller's charges
///
/// # Errors
///
/// - `400 Bad Request`: missing field, bad status, amount or date
/// - `404 Not Found`: no such charge among the caller's
pub async fn update_charge(
    State(state): State<AppState>,
    auth: AuthContext,
    IdPath(id): IdPath,
    ValidatedJson(fields): ValidatedJson<ChargeFields>,
) -> ApiResult<Json<ChargeResponse>> {
    let input = fields.into_input(Utc::now())?;

    let mut tx = state.db.begin().await?;

    Charge::find_owned_for_update(&mut *tx, id, auth.user_id())
        .await?
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND.to_string()))?;

    let charge = Charge::update(&mut *tx, id, &input)
        .await?
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND.to_string()))?;
    tx.commit().await?;

    tracing::info!(
        user_id = auth.user_id(),
        charge_id = id,
        status = charge.status.as_str(),
        "Charge updated"
    );

    Ok(Json(ChargeResponse {
        message: "Cobrança atualizada com sucesso.",
        charge,
    }))
}

/// Deletes one of the caller's charges unless it is paid
///
/// # Errors
///
/// - `400 Bad Request`: the charge is paid
/// - `404 Not Found`: no such charge among the caller's
pub async fn delete_charge(
    State(state): State<AppState>,
    auth: AuthContext,
    IdPath(id): IdPath,
) -> ApiResult<Json<MessageResponse>> {
    let mut tx = state.db.begin().await?;

    let charge = Charge::find_owned_for_update(&mut *tx, id, auth.user_id())
        .await?
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND.to_string()))?;

    if charge.status == ChargeStatus::Paid {
        return Err(ApiError::conflict(PAID_NOT_DELETABLE));
    }

    if !Charge::delete_unpaid(&mut *tx, id).await? {
        return Err(ApiError::conflict(PAID_NOT_DELETABLE));
    }
    tx.commit().await?;

    tracing::info!(user_id = auth.user_id(), charge_id = id, "Charge deleted");

    Ok(Json(MessageResponse {
        message: "Cobrança deletada com sucesso.",
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn fields(status: &str, amount: Decimal, due_date: &str) -> ChargeFields {
        ChargeFields {
            description: Some("Mensalidade".to_string()),
            status: Some(status.to_string()),
            amount: Some(amount),
            due_date: Some(due_date.to_string()),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
    }

    fn invalid_field(err: ApiError) -> String {
        match err {
            ApiError::ValidationError(details) => details[0].field.clone(),
            other => panic!("expected a validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_due_date() {
        let day = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();

        assert_eq!(parse_due_date("2025-07-01"), Some(DueDate::Day(day)));
        assert_eq!(
            parse_due_date("2025-07-01T00:00:00Z"),
            Some(DueDate::At(Utc.with_ymd_and_hms(2025, 7, 1, 0, 0, 0).unwrap()))
        );
        assert_eq!(
            parse_due_date("2025-07-01T02:00:00+03:00"),
            Some(DueDate::At(Utc.with_ymd_and_hms(2025, 6, 30, 23, 0, 0).unwrap()))
        );
        assert_eq!(parse_due_date("01/07/2025"), None);
        assert_eq!(parse_due_date(""), None);
    }

    #[test]
    fn test_timestamp_due_later_today_stays_pending() {
        let input = fields("pendente", dec!(100), "2025-06-15T18:00:00Z")
            .into_input(now())
            .unwrap();
        assert_eq!(input.status(), ChargeStatus::Pending);
        assert_eq!(input.due_date(), NaiveDate::from_ymd_opt(2025, 6, 15).unwrap());

        let input = fields("pendente", dec!(100), "2025-06-15T11:59:00Z")
            .into_input(now())
            .unwrap();
        assert_eq!(input.status(), ChargeStatus::Overdue);
    }

    #[test]
    fn test_past_pending_becomes_overdue() {
        let input = fields("pendente", dec!(100), "2000-01-01").into_input(now()).unwrap();
        assert_eq!(input.status(), ChargeStatus::Overdue);
    }

    #[test]
    fn test_future_pending_stays_pending() {
        let input = fields("pending", dec!(100), "2025-06-16").into_input(now()).unwrap();
        assert_eq!(input.status(), ChargeStatus::Pending);
    }

    #[test]
    fn test_paid_is_never_reclassified() {
        let input = fields("pago", dec!(10), "2000-01-01").into_input(now()).unwrap();
        assert_eq!(input.status(), ChargeStatus::Paid);
    }

    #[test]
    fn test_overdue_cannot_be_requested() {
        let err = fields("vencida", dec!(10), "2030-01-01").into_input(now()).unwrap_err();
        assert_eq!(invalid_field(err), "status");
    }

    #[test]
    fn test_amount_must_be_positive() {
        let err = fields("pago", dec!(0), "2030-01-01").into_input(now()).unwrap_err();
        assert_eq!(invalid_field(err), "valor");

        let err = fields("pago", dec!(-5), "2030-01-01").into_input(now()).unwrap_err();
        assert_eq!(invalid_field(err), "valor");

        let input = fields("pago", dec!(10.005), "2030-01-01").into_input(now()).unwrap();
        assert_eq!(input.amount(), dec!(10.00));
    }

    #[test]
    fn test_amount_must_fit_the_column() {
        let input = fields("pago", dec!(9999999999.99), "2030-01-01").into_input(now()).unwrap();
        assert_eq!(input.amount(), dec!(9999999999.99));

        let err = fields("pago", dec!(10000000000), "2030-01-01").into_input(now()).unwrap_err();
        assert_eq!(invalid_field(err), "valor");

        let err = fields("pago", dec!(100000000000), "2030-01-01").into_input(now()).unwrap_err();
        assert_eq!(invalid_field(err), "valor");
    }

    #[test]
    fn test_bad_due_date() {
        let err = fields("pago", dec!(10), "amanhã").into_input(now()).unwrap_err();
        assert_eq!(invalid_field(err), "vencimento");
    }

    #[test]
    fn test_create_request_deserializes_numbers_and_strings() {
        let req: CreateChargeRequest = serde_json::from_str(
            r#"{"cliente_id": 7, "descricao": "x", "status": "pendente", "valor": 100, "vencimento": "2000-01-01"}"#,
        )
        .unwrap();
        assert!(req.validate().is_ok());
        assert_eq!(req.customer_id, Some(7));
        assert_eq!(req.amount, Some(dec!(100)));

        let req: CreateChargeRequest = serde_json::from_str(
            r#"{"cliente_id": 7, "descricao": "x", "status": "pago", "valor": "99.90", "vencimento": "2030-01-01"}"#,
        )
        .unwrap();
        assert_eq!(req.amount, Some(dec!(99.90)));

        let (customer_id, fields) = req.split();
        assert_eq!(customer_id, 7);
        assert_eq!(fields.status.as_deref(), Some("pago"));
    }

    #[test]
    fn test_create_request_reports_missing_fields() {
        let req: CreateChargeRequest = serde_json::from_str(r#"{"descricao": "x"}"#).unwrap();
        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();

        assert!(fields.contains_key("customer_id"));
        assert!(fields.contains_key("amount"));
        assert!(fields.contains_key("due_date"));
        assert!(!fields.contains_key("description"));
    }
}
