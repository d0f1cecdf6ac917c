/// Customer endpoints
///
/// Every operation is scoped to the authenticated user: customers of other
/// users behave exactly like customers that don't exist.
///
/// - `POST /clientes` - Create a customer
/// - `GET /clientes?pagina=&limite=&todos=` - List with payment standing
/// - `GET /clientes/:id` - Customer with its charges
/// - `PUT /clientes/:id` - Full update

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{non_blank, IdPath, ValidatedJson},
};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use cobranca_shared::{
    auth::middleware::AuthContext,
    models::{
        charge::Charge,
        customer::{Customer, CustomerInput, CustomerSummary},
        pagination::Page,
    },
};
use serde::{Deserialize, Serialize};
use validator::Validate;

const NOT_FOUND: &str = "Cliente não encontrado.";

/// Create and update request
///
/// Maximum lengths follow the `customers` columns.
#[derive(Debug, Deserialize, Validate)]
pub struct CustomerRequest {
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

    #[serde(rename = "cpf")]
    #[validate(
        required(message = "O campo cpf é obrigatório."),
        length(min = 1, max = 14, message = "O campo cpf deve ter entre 1 e 14 caracteres.")
    )]
    pub national_id: Option<String>,

    #[serde(rename = "telefone")]
    #[validate(
        required(message = "O campo telefone é obrigatório."),
        length(min = 1, max = 20, message = "O campo telefone deve ter entre 1 e 20 caracteres.")
    )]
    pub phone: Option<String>,

    #[serde(rename = "cep")]
    #[validate(length(max = 9, message = "O campo cep deve ter no máximo 9 caracteres."))]
    pub postal_code: Option<String>,

    #[serde(rename = "endereco")]
    #[validate(length(max = 255, message = "O campo endereco deve ter no máximo 255 caracteres."))]
    pub street: Option<String>,

    #[serde(rename = "complemento")]
    #[validate(length(max = 255, message = "O campo complemento deve ter no máximo 255 caracteres."))]
    pub complement: Option<String>,

    #[serde(rename = "bairro")]
    #[validate(length(max = 255, message = "O campo bairro deve ter no máximo 255 caracteres."))]
    pub district: Option<String>,

    #[serde(rename = "cidade")]
    #[validate(length(max = 255, message = "O campo cidade deve ter no máximo 255 caracteres."))]
    pub city: Option<String>,

    #[serde(rename = "estado")]
    #[validate(length(max = 2, message = "O campo estado deve ter no máximo 2 caracteres."))]
    pub state: Option<String>,
}

impl CustomerRequest {
    /// Converts a validated request; blank address fields are stored as NULL
    fn into_input(self) -> CustomerInput {
        CustomerInput {
            name: self.name.unwrap_or_default(),
            email: self.email.unwrap_or_default(),
            national_id: self.national_id.unwrap_or_default(),
            phone: self.phone.unwrap_or_default(),
            postal_code: non_blank(self.postal_code),
            street: non_blank(self.street),
            complement: non_blank(self.complement),
            district: non_blank(self.district),
            city: non_blank(self.city),
            state: non_blank(self.state),
        }
    }
}

/// Raw listing query; unparseable numbers fall back to defaults
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub pagina: Option<String>,
    pub limite: Option<String>,
    pub todos: Option<String>,
}

impl ListQuery {
    /// `None` when every customer was requested
    fn page(&self) -> Option<Page> {
        if self.todos.as_deref() == Some("true") {
            None
        } else {
            Some(Page::from_query(self.pagina.as_deref(), self.limite.as_deref()))
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum CustomerListResponse {
    All {
        #[serde(rename = "clientes")]
        customers: Vec<CustomerSummary>,
        total: i64,
    },
    Paged {
        #[serde(rename = "clientes")]
        customers: Vec<CustomerSummary>,
        total: i64,
        #[serde(rename = "pagina")]
        page: i64,
        #[serde(rename = "limite")]
        page_size: i64,
        #[serde(rename = "totalPaginas")]
        total_pages: i64,
    },
}

#[derive(Debug, Serialize)]
pub struct CustomerDetailResponse {
    #[serde(rename = "cliente")]
    pub customer: Customer,

    #[serde(rename = "cobrancas")]
    pub charges: Vec<Charge>,
}

#[derive(Debug, Serialize)]
pub struct CustomerUpdatedResponse {
    #[serde(rename = "mensagem")]
    pub message: &'static str,

    #[serde(rename = "cliente")]
    pub customer: Customer,
}

/// Creates a customer owned by the caller
///
/// E-mail, CPF and phone must be unique among the caller's customers; the
/// first collision, checked in that order, is reported. Responds
/// `201 Created` with the new record.
pub async fn create_customer(
    State(state): State<AppState>,
    auth: AuthContext,
    ValidatedJson(req): ValidatedJson<CustomerRequest>,
) -> ApiResult<(StatusCode, Json<Customer>)> {
    let input = req.into_input();
    let owner = auth.user_id();

    let mut tx = state.db.begin().await?;

    if let Some(field) = Customer::find_conflict(&mut *tx, owner, &input, None).await? {
        return Err(ApiError::field_conflict(field));
    }

    let customer = Customer::create(&mut *tx, owner, &input).await?;
    tx.commit().await?;

    tracing::info!(user_id = owner, customer_id = customer.id, "Customer created");

    Ok((StatusCode::CREATED, Json(customer)))
}

/// Lists the caller's customers with totals, standing and charges
pub async fn list_customers(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<CustomerListResponse>> {
    let owner = auth.user_id();
    let page = query.page();

    let mut conn = state.db.acquire().await?;

    let customers = Customer::list_by_owner(&mut *conn, owner, page).await?;
    let ids: Vec<i32> = customers.iter().map(|c| c.id).collect();
    let charges = Charge::list_by_customers(&mut *conn, &ids).await?;

    let summaries = CustomerSummary::from_rows(customers, charges, Utc::now().date_naive());

    let response = match page {
        None => CustomerListResponse::All {
            total: summaries.len() as i64,
            customers: summaries,
        },
        Some(page) => {
            let total = Customer::count_by_owner(&mut *conn, owner).await?;
            CustomerListResponse::Paged {
                customers: summaries,
                total,
                page: page.number,
                page_size: page.size,
                total_pages: page.total_pages(total),
            }
        }
    };

    Ok(Json(response))
}

/// Returns one of the caller's customers with its charges, latest due first
pub async fn get_customer(
    State(state): State<AppState>,
    auth: AuthContext,
    IdPath(id): IdPath,
) -> ApiResult<Json<CustomerDetailResponse>> {
    let customer = Customer::find_owned(&state.db, id, auth.user_id())
        .await?
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND.to_string()))?;

    let charges = Charge::list_by_customer(&state.db, customer.id).await?;

    Ok(Json(CustomerDetailResponse { customer, charges }))
}

/// Overwrites one of the caller's customers
pub async fn update_customer(
    State(state): State<AppState>,
    auth: AuthContext,
    IdPath(id): IdPath,
    ValidatedJson(req): ValidatedJson<CustomerRequest>,
) -> ApiResult<Json<CustomerUpdatedResponse>> {
    let input = req.into_input();
    let owner = auth.user_id();

    let mut tx = state.db.begin().await?;

    if !Customer::is_owned_by(&mut *tx, id, owner).await? {
        return Err(ApiError::NotFound(NOT_FOUND.to_string()));
    }

    if let Some(field) = Customer::find_conflict(&mut *tx, owner, &input, Some(id)).await? {
        return Err(ApiError::field_conflict(field));
    }

    let customer = Customer::update(&mut *tx, id, owner, &input)
        .await?
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND.to_string()))?;
    tx.commit().await?;

    tracing::info!(user_id = owner, customer_id = id, "Customer updated");

    Ok(Json(CustomerUpdatedResponse {
        message: "Cliente atualizado com sucesso.",
        customer,
    }))
}
