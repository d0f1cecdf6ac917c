/// Customer model and database operations
///
/// Customers are owned by exactly one user. Every query takes the owner id
/// and filters on it; e-mail, CPF and phone are unique per owner only, so two
/// users may each have a customer with the same e-mail.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE customers (
///     id SERIAL PRIMARY KEY,
///     owner_user_id INTEGER NOT NULL REFERENCES users (id),
///     name VARCHAR(255) NOT NULL,
///     email VARCHAR(255) NOT NULL,
///     national_id VARCHAR(14) NOT NULL,
///     phone VARCHAR(20) NOT NULL,
///     postal_code, street, complement, district, city, state (nullable),
///     UNIQUE (owner_user_id, email),
///     UNIQUE (owner_user_id, national_id),
///     UNIQUE (owner_user_id, phone)
/// );
/// ```

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{PgConnection, PgExecutor};
use std::collections::HashMap;

use super::charge::{Charge, ChargeStatus};
use super::contact::{find_first_conflict, ContactField, ContactScope, ContactValues};
use super::pagination::Page;

const CUSTOMER_COLUMNS: &str = "id, owner_user_id, name, email, national_id, phone, \
     postal_code, street, complement, district, city, state";

/// Customer record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Customer {
    pub id: i32,

    #[serde(rename = "usuario_id")]
    pub owner_user_id: i32,

    #[serde(rename = "nome")]
    pub name: String,

    pub email: String,

    #[serde(rename = "cpf")]
    pub national_id: String,

    #[serde(rename = "telefone")]
    pub phone: String,

    #[serde(rename = "cep")]
    pub postal_code: Option<String>,

    #[serde(rename = "endereco")]
    pub street: Option<String>,

    #[serde(rename = "complemento")]
    pub complement: Option<String>,

    #[serde(rename = "bairro")]
    pub district: Option<String>,

    #[serde(rename = "cidade")]
    pub city: Option<String>,

    #[serde(rename = "estado")]
    pub state: Option<String>,
}

/// Values written on create and on full update
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerInput {
    pub name: String,
    pub email: String,
    pub national_id: String,
    pub phone: String,
    pub postal_code: Option<String>,
    pub street: Option<String>,
    pub complement: Option<String>,
    pub district: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
}

impl CustomerInput {
    pub fn contact_values(&self) -> ContactValues<'_> {
        ContactValues {
            email: &self.email,
            national_id: Some(&self.national_id),
            phone: Some(&self.phone),
        }
    }
}

/// Payment standing derived from a customer's charges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CustomerStatus {
    #[serde(rename = "inadimplente")]
    Delinquent,

    #[serde(rename = "em dia")]
    Current,
}

/// Customer decorated with the aggregates shown in listings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerSummary {
    #[serde(flatten)]
    pub customer: Customer,

    pub status: CustomerStatus,

    #[serde(rename = "totalPago")]
    pub total_paid: Decimal,

    #[serde(rename = "totalVencido")]
    pub total_overdue: Decimal,

    #[serde(rename = "cobrancas")]
    pub charges: Vec<Charge>,
}

impl CustomerSummary {
    /// Computes totals and status from the customer's charges as of `today`
    pub fn new(customer: Customer, charges: Vec<Charge>, today: NaiveDate) -> Self {
        let total_paid: Decimal = charges
            .iter()
            .filter(|charge| charge.status == ChargeStatus::Paid)
            .map(|charge| charge.amount)
            .sum();

        let total_overdue: Decimal = charges
            .iter()
            .filter(|charge| charge.is_overdue_on(today))
            .map(|charge| charge.amount)
            .sum();

        let status = if total_overdue > Decimal::ZERO {
            CustomerStatus::Delinquent
        } else {
            CustomerStatus::Current
        };

        Self {
            customer,
            status,
            total_paid,
            total_overdue,
            charges,
        }
    }

    /// Pairs each customer with its charges, preserving customer order
    ///
    /// Charges of customers not in `customers` are dropped.
    pub fn from_rows(customers: Vec<Customer>, charges: Vec<Charge>, today: NaiveDate) -> Vec<Self> {
        let mut by_customer: HashMap<i32, Vec<Charge>> = HashMap::new();
        for charge in charges {
            by_customer.entry(charge.customer_id).or_default().push(charge);
        }

        customers
            .into_iter()
            .map(|customer| {
                let own = by_customer.remove(&customer.id).unwrap_or_default();
                CustomerSummary::new(customer, own, today)
            })
            .collect()
    }
}

impl Customer {
    pub async fn create<'e, E>(
        executor: E,
        owner_user_id: i32,
        input: &CustomerInput,
    ) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let sql = format!(
            r#"
            INSERT INTO customers (owner_user_id, name, email, national_id, phone,
                                   postal_code, street, complement, district, city, state)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {}
            "#,
            CUSTOMER_COLUMNS
        );

        sqlx::query_as::<_, Customer>(&sql)
            .bind(owner_user_id)
            .bind(&input.name)
            .bind(&input.email)
            .bind(&input.national_id)
            .bind(&input.phone)
            .bind(&input.postal_code)
            .bind(&input.street)
            .bind(&input.complement)
            .bind(&input.district)
            .bind(&input.city)
            .bind(&input.state)
            .fetch_one(executor)
            .await
    }

    /// Finds customer `id` if owned by `owner_user_id`
    pub async fn find_owned<'e, E>(
        executor: E,
        id: i32,
        owner_user_id: i32,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let sql = format!(
            "SELECT {} FROM customers WHERE id = $1 AND owner_user_id = $2",
            CUSTOMER_COLUMNS
        );

        sqlx::query_as::<_, Customer>(&sql)
            .bind(id)
            .bind(owner_user_id)
            .fetch_optional(executor)
            .await
    }

    /// Whether customer `id` exists and is owned by `owner_user_id`
    pub async fn is_owned_by<'e, E>(
        executor: E,
        id: i32,
        owner_user_id: i32,
    ) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM customers WHERE id = $1 AND owner_user_id = $2)",
        )
        .bind(id)
        .bind(owner_user_id)
        .fetch_one(executor)
        .await
    }

    /// Overwrites every column of customer `id`, if owned
    pub async fn update<'e, E>(
        executor: E,
        id: i32,
        owner_user_id: i32,
        input: &CustomerInput,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let sql = format!(
            r#"
            UPDATE customers
            SET name = $3, email = $4, national_id = $5, phone = $6, postal_code = $7,
                street = $8, complement = $9, district = $10, city = $11, state = $12
            WHERE id = $1 AND owner_user_id = $2
            RETURNING {}
            "#,
            CUSTOMER_COLUMNS
        );

        sqlx::query_as::<_, Customer>(&sql)
            .bind(id)
            .bind(owner_user_id)
            .bind(&input.name)
            .bind(&input.email)
            .bind(&input.national_id)
            .bind(&input.phone)
            .bind(&input.postal_code)
            .bind(&input.street)
            .bind(&input.complement)
            .bind(&input.district)
            .bind(&input.city)
            .bind(&input.state)
            .fetch_optional(executor)
            .await
    }

    /// Customers of `owner_user_id` ordered by id, optionally one page only
    pub async fn list_by_owner<'e, E>(
        executor: E,
        owner_user_id: i32,
        page: Option<Page>,
    ) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        match page {
            None => {
                let sql = format!(
                    "SELECT {} FROM customers WHERE owner_user_id = $1 ORDER BY id",
                    CUSTOMER_COLUMNS
                );

                sqlx::query_as::<_, Customer>(&sql)
                    .bind(owner_user_id)
                    .fetch_all(executor)
                    .await
            }
            Some(page) => {
                let sql = format!(
                    "SELECT {} FROM customers WHERE owner_user_id = $1 ORDER BY id LIMIT $2 OFFSET $3",
                    CUSTOMER_COLUMNS
                );

                sqlx::query_as::<_, Customer>(&sql)
                    .bind(owner_user_id)
                    .bind(page.size)
                    .bind(page.offset())
                    .fetch_all(executor)
                    .await
            }
        }
    }

    pub async fn count_by_owner<'e, E>(executor: E, owner_user_id: i32) -> Result<i64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar("SELECT COUNT(*) FROM customers WHERE owner_user_id = $1")
            .bind(owner_user_id)
            .fetch_one(executor)
            .await
    }

    /// First contact field of `input` already used by another customer of the owner
    ///
    /// Checks e-mail, then CPF, then phone. `exclude_id` skips the customer
    /// being edited.
    pub async fn find_conflict(
        conn: &mut PgConnection,
        owner_user_id: i32,
        input: &CustomerInput,
        exclude_id: Option<i32>,
    ) -> Result<Option<ContactField>, sqlx::Error> {
        find_first_conflict(
            conn,
            ContactScope::Customers { owner_user_id },
            input.contact_values(),
            exclude_id,
        )
        .await
    }
}
