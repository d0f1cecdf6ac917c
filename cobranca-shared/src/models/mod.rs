/// Database models for Cobrança
///
/// Each model owns its SQL. Query functions are generic over
/// [`sqlx::PgExecutor`] so the same code runs against the pool or inside a
/// transaction (`&mut *tx`).
///
/// # Models
///
/// - `user`: Accounts and the [`user::CredentialStore`] seam
/// - `customer`: Customers owned by a user, with listing aggregates
/// - `charge`: Charges owned by a customer, with overdue reclassification
/// - `contact`: The e-mail / CPF / phone fields that must be unique
/// - `pagination`: Page/size parsing for list endpoints
///
/// # Example
///
/// ```no_run
/// use cobranca_shared::models::user::{CreateUser, User};
/// use cobranca_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let user = User::create(
///     &pool,
///     &CreateUser {
///         name: "Maria".to_string(),
///         email: "maria@example.com".to_string(),
///         password_hash: "$argon2id$...".to_string(),
///     },
/// )
/// .await?;
/// # Ok(())
/// # }
/// ```

pub mod charge;
pub mod contact;
pub mod customer;
pub mod pagination;
pub mod user;
