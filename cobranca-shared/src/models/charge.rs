/// Charge model and database operations
///
/// A charge belongs to one customer and, through it, to the customer's owner.
/// Every lookup that starts from a charge id joins `customers` so that a user
/// only ever sees charges of their own customers.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE charge_status AS ENUM ('pago', 'pendente', 'vencida');
///
/// CREATE TABLE charges (
///     id SERIAL PRIMARY KEY,
///     customer_id INTEGER NOT NULL REFERENCES customers (id),
///     description TEXT NOT NULL,
///     amount NUMERIC(12, 2) NOT NULL CHECK (amount > 0),
///     due_date DATE NOT NULL,
///     status charge_status NOT NULL
/// );
/// ```
///
/// # Overdue reclassification
///
/// A charge written as [`ChargeStatus::Pending`] whose due date (taken as
/// 00:00 UTC of that day) is before the moment of the write is stored as
/// [`ChargeStatus::Overdue`]. [`ChargeInput::new`] applies the rule, so no
/// pending-and-past charge reaches the database. Stored rows are not
/// re-evaluated afterwards.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;

const CHARGE_COLUMNS: &str = "c.id, c.customer_id, c.description, c.amount, c.due_date, c.status";

/// Payment status of a charge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "charge_status")]
pub enum ChargeStatus {
    #[sqlx(rename = "pago")]
    #[serde(rename = "pago", alias = "paid")]
    Paid,

    #[sqlx(rename = "pendente")]
    #[serde(rename = "pendente", alias = "pending")]
    Pending,

    /// Only ever produced by reclassification
    #[sqlx(rename = "vencida")]
    #[serde(rename = "vencida", alias = "overdue")]
    Overdue,
}

impl ChargeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChargeStatus::Paid => "pago",
            ChargeStatus::Pending => "pendente",
            ChargeStatus::Overdue => "vencida",
        }
    }

    /// Parses a status sent by a client
    ///
    /// Only paid and pending may be requested; overdue is derived.
    ///
    /// ```
    /// use cobranca_shared::models::charge::ChargeStatus;
    ///
    /// assert_eq!(ChargeStatus::from_request("pendente"), Some(ChargeStatus::Pending));
    /// assert_eq!(ChargeStatus::from_request("paid"), Some(ChargeStatus::Paid));
    /// assert_eq!(ChargeStatus::from_request("vencida"), None);
    /// ```
    pub fn from_request(value: &str) -> Option<Self> {
        match value {
            "pago" | "paid" => Some(ChargeStatus::Paid),
            "pendente" | "pending" => Some(ChargeStatus::Pending),
            _ => None,
        }
    }

    /// Applies overdue reclassification at write time `now`
    ///
    /// A bare date is due from 00:00 UTC of that day.
    pub fn reclassify(self, due_date: NaiveDate, now: DateTime<Utc>) -> Self {
        self.reclassify_at(start_of_day(due_date), now)
    }

    /// Same as [`ChargeStatus::reclassify`] for a due instant
    pub fn reclassify_at(self, due_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        match self {
            ChargeStatus::Pending if due_at < now => ChargeStatus::Overdue,
            status => status,
        }
    }
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

/// Charge record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Charge {
    pub id: i32,

    #[serde(rename = "cliente_id")]
    pub customer_id: i32,

    #[serde(rename = "descricao")]
    pub description: String,

    #[serde(rename = "valor")]
    pub amount: Decimal,

    #[serde(rename = "vencimento")]
    pub due_date: NaiveDate,

    pub status: ChargeStatus,
}

impl Charge {
    /// Whether this charge adds to a customer's overdue total on `today`
    ///
    /// Only pending charges due before `today` count (date-only comparison).
    /// Charges already stored as overdue do not.
    pub fn is_overdue_on(&self, today: NaiveDate) -> bool {
        self.status == ChargeStatus::Pending && self.due_date < today
    }
}

/// Charge joined with the name of its customer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct ChargeWithCustomer {
    pub id: i32,

    #[serde(rename = "cliente_nome")]
    pub customer_name: String,

    #[serde(rename = "cliente_id")]
    pub customer_id: i32,

    #[serde(rename = "descricao")]
    pub description: String,

    #[serde(rename = "valor")]
    pub amount: Decimal,

    #[serde(rename = "vencimento")]
    pub due_date: NaiveDate,

    pub status: ChargeStatus,
}

/// Validated values for creating or editing a charge
///
/// The status is already reclassified; construct through [`ChargeInput::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChargeInput {
    description: String,
    amount: Decimal,
    due_date: NaiveDate,
    status: ChargeStatus,
}

impl ChargeInput {
    pub fn new(
        description: String,
        amount: Decimal,
        due_date: NaiveDate,
        requested: ChargeStatus,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            description,
            amount,
            due_date,
            status: requested.reclassify(due_date, now),
        }
    }

    /// Builds an input whose due moment is a full timestamp
    ///
    /// The stored due date is the UTC calendar date of `due_at`.
    pub fn due_at(
        description: String,
        amount: Decimal,
        due_at: DateTime<Utc>,
        requested: ChargeStatus,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            description,
            amount,
            due_date: due_at.date_naive(),
            status: requested.reclassify_at(due_at, now),
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn due_date(&self) -> NaiveDate {
        self.due_date
    }

    pub fn status(&self) -> ChargeStatus {
        self.status
    }
}

impl Charge {
    pub async fn create<'e, E>(
        executor: E,
        customer_id: i32,
        input: &ChargeInput,
    ) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Charge>(
            r#"
            INSERT INTO charges (customer_id, description, amount, due_date, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, customer_id, description, amount, due_date, status
            "#,
        )
        .bind(customer_id)
        .bind(&input.description)
        .bind(input.amount)
        .bind(input.due_date)
        .bind(input.status)
        .fetch_one(executor)
        .await
    }

    /// Finds charge `id` if its customer belongs to `owner_user_id`
    pub async fn find_owned<'e, E>(
        executor: E,
        id: i32,
        owner_user_id: i32,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let sql = format!(
            r#"
            SELECT {}
            FROM charges c
            JOIN customers cu ON cu.id = c.customer_id
            WHERE c.id = $1 AND cu.owner_user_id = $2
            "#,
            CHARGE_COLUMNS
        );

        sqlx::query_as::<_, Charge>(&sql)
            .bind(id)
            .bind(owner_user_id)
            .fetch_optional(executor)
            .await
    }

    /// Locks charge `id` for the rest of the transaction, if owned
    pub async fn find_owned_for_update<'e, E>(
        executor: E,
        id: i32,
        owner_user_id: i32,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let sql = format!(
            r#"
            SELECT {}
            FROM charges c
            JOIN customers cu ON cu.id = c.customer_id
            WHERE c.id = $1 AND cu.owner_user_id = $2
            FOR UPDATE OF c
            "#,
            CHARGE_COLUMNS
        );

        sqlx::query_as::<_, Charge>(&sql)
            .bind(id)
            .bind(owner_user_id)
            .fetch_optional(executor)
            .await
    }

    /// Overwrites description, amount, due date and status of charge `id`
    pub async fn update<'e, E>(
        executor: E,
        id: i32,
        input: &ChargeInput,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Charge>(
            r#"
            UPDATE charges
            SET description = $2, amount = $3, due_date = $4, status = $5
            WHERE id = $1
            RETURNING id, customer_id, description, amount, due_date, status
            "#,
        )
        .bind(id)
        .bind(&input.description)
        .bind(input.amount)
        .bind(input.due_date)
        .bind(input.status)
        .fetch_optional(executor)
        .await
    }

    /// Deletes charge `id` unless it is paid
    ///
    /// Returns true if a row was deleted.
    pub async fn delete_unpaid<'e, E>(executor: E, id: i32) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM charges WHERE id = $1 AND status <> 'pago'")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Charges of one customer, latest due date first
    pub async fn list_by_customer<'e, E>(
        executor: E,
        customer_id: i32,
    ) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let sql = format!(
            "SELECT {} FROM charges c WHERE c.customer_id = $1 ORDER BY c.due_date DESC, c.id DESC",
            CHARGE_COLUMNS
        );

        sqlx::query_as::<_, Charge>(&sql)
            .bind(customer_id)
            .fetch_all(executor)
            .await
    }

    /// Charges of several customers in one query
    pub async fn list_by_customers<'e, E>(
        executor: E,
        customer_ids: &[i32],
    ) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        if customer_ids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT {} FROM charges c WHERE c.customer_id = ANY($1) ORDER BY c.due_date DESC, c.id DESC",
            CHARGE_COLUMNS
        );

        sqlx::query_as::<_, Charge>(&sql)
            .bind(customer_ids)
            .fetch_all(executor)
            .await
    }

    /// Every charge of every customer owned by `owner_user_id`
    pub async fn list_by_owner<'e, E>(
        executor: E,
        owner_user_id: i32,
    ) -> Result<Vec<ChargeWithCustomer>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, ChargeWithCustomer>(
            r#"
            SELECT c.id, cu.name AS customer_name, c.customer_id, c.description,
                   c.amount, c.due_date, c.status
            FROM charges c
            JOIN customers cu ON cu.id = c.customer_id
            WHERE cu.owner_user_id = $1
            ORDER BY c.due_date DESC, c.id DESC
            "#,
        )
        .bind(owner_user_id)
        .fetch_all(executor)
        .await
    }
}
