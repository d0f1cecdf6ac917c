/// User model and the credential store
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id SERIAL PRIMARY KEY,
///     name VARCHAR(255) NOT NULL,
///     email VARCHAR(255) NOT NULL UNIQUE,
///     password_hash VARCHAR(255) NOT NULL,
///     national_id CHAR(11) UNIQUE,
///     phone CHAR(11) UNIQUE
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use cobranca_shared::models::user::{CreateUser, User};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let user = User::create(
///     &pool,
///     &CreateUser {
///         name: "Maria".to_string(),
///         email: "maria@example.com".to_string(),
///         password_hash: "$argon2id$...".to_string(),
///     },
/// )
/// .await?;
///
/// let found = User::find_by_email(&pool, "maria@example.com").await?;
/// assert_eq!(found.map(|u| u.id), Some(user.id));
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use serde::Serialize;
use sqlx::{PgConnection, PgExecutor, PgPool};

use super::contact::{find_first_conflict, ContactField, ContactScope, ContactValues};

const USER_COLUMNS: &str = "id, name, email, password_hash, national_id, phone";

/// User account
///
/// The password hash is never serialized, so a `User` can be returned from
/// any endpoint as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: i32,

    #[serde(rename = "nome")]
    pub name: String,

    pub email: String,

    /// Argon2id PHC string
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// CPF, 11 characters
    #[serde(rename = "cpf")]
    pub national_id: Option<String>,

    /// 11 characters including area code
    #[serde(rename = "telefone")]
    pub phone: Option<String>,
}

/// Input for registering a user
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub name: String,
    pub email: String,

    /// Argon2id hash (NOT the plaintext password)
    pub password_hash: String,
}

/// Input for a full profile update
///
/// Every column is written; `None` clears the optional ones.
#[derive(Debug, Clone)]
pub struct UpdateUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub national_id: Option<String>,
    pub phone: Option<String>,
}

impl UpdateUser {
    pub fn contact_values(&self) -> ContactValues<'_> {
        ContactValues {
            email: &self.email,
            national_id: self.national_id.as_deref(),
            phone: self.phone.as_deref(),
        }
    }
}

impl User {
    /// Inserts a new user
    ///
    /// # Errors
    ///
    /// Fails with a unique violation on `users_email_key` when the e-mail is
    /// taken.
    pub async fn create<'e, E>(executor: E, data: &CreateUser) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let sql = format!(
            "INSERT INTO users (name, email, password_hash) VALUES ($1, $2, $3) RETURNING {}",
            USER_COLUMNS
        );

        sqlx::query_as::<_, User>(&sql)
            .bind(&data.name)
            .bind(&data.email)
            .bind(&data.password_hash)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id<'e, E>(executor: E, id: i32) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);

        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    pub async fn find_by_email<'e, E>(executor: E, email: &str) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let sql = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);

        sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(executor)
            .await
    }

    /// Whether any user is registered with `email`
    pub async fn email_exists<'e, E>(executor: E, email: &str) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE email = $1)")
            .bind(email)
            .fetch_one(executor)
            .await
    }

    /// Overwrites every profile column of user `id`
    ///
    /// Returns `None` if the user doesn't exist.
    pub async fn update<'e, E>(
        executor: E,
        id: i32,
        data: &UpdateUser,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let sql = format!(
            r#"
            UPDATE users
            SET name = $2, email = $3, password_hash = $4, national_id = $5, phone = $6
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        );

        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(&data.name)
            .bind(&data.email)
            .bind(&data.password_hash)
            .bind(&data.national_id)
            .bind(&data.phone)
            .fetch_optional(executor)
            .await
    }

    /// First contact field of `values` used by a user other than `exclude_id`
    ///
    /// Checks e-mail, then CPF, then phone.
    pub async fn find_conflict(
        conn: &mut PgConnection,
        values: ContactValues<'_>,
        exclude_id: Option<i32>,
    ) -> Result<Option<ContactField>, sqlx::Error> {
        find_first_conflict(conn, ContactScope::Users, values, exclude_id).await
    }
}

/// Persistence seam for user records
///
/// The authentication gate depends on this trait rather than on the pool, so
/// it can be exercised against any backing store.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error>;

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, sqlx::Error>;

    async fn create(&self, data: CreateUser) -> Result<User, sqlx::Error>;

    async fn update(&self, id: i32, data: UpdateUser) -> Result<Option<User>, sqlx::Error>;
}

#[async_trait]
impl CredentialStore for PgPool {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        User::find_by_email(self, email).await
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, sqlx::Error> {
        User::find_by_id(self, id).await
    }

    async fn create(&self, data: CreateUser) -> Result<User, sqlx::Error> {
        User::create(self, &data).await
    }

    async fn update(&self, id: i32, data: UpdateUser) -> Result<Option<User>, sqlx::Error> {
        User::update(self, id, &data).await
    }
}
