/// Contact fields subject to uniqueness
///
/// Users and customers both carry an e-mail, a CPF and a phone number that
/// must not collide. Collisions are checked in [`ContactField::CHECK_ORDER`]
/// and the first one found is reported; the schema's unique constraints are
/// the final authority and map back to the same field through
/// [`ContactField::from_constraint`].

use serde::Serialize;
use sqlx::PgConnection;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ContactField {
    #[serde(rename = "email")]
    Email,
    #[serde(rename = "cpf")]
    NationalId,
    #[serde(rename = "telefone")]
    Phone,
}

impl ContactField {
    /// Order in which collisions are checked; the first match wins
    pub const CHECK_ORDER: [ContactField; 3] =
        [ContactField::Email, ContactField::NationalId, ContactField::Phone];

    /// Column name in `users` and `customers`
    pub fn column(&self) -> &'static str {
        match self {
            ContactField::Email => "email",
            ContactField::NationalId => "national_id",
            ContactField::Phone => "phone",
        }
    }

    /// Field name on the wire
    pub fn wire_name(&self) -> &'static str {
        match self {
            ContactField::Email => "email",
            ContactField::NationalId => "cpf",
            ContactField::Phone => "telefone",
        }
    }

    pub fn conflict_message(&self) -> &'static str {
        match self {
            ContactField::Email => "O e-mail já está cadastrado.",
            ContactField::NationalId => "O CPF já está cadastrado.",
            ContactField::Phone => "O telefone já está cadastrado.",
        }
    }

    /// Maps a unique constraint name from the schema to its field
    ///
    /// ```
    /// use cobranca_shared::models::contact::ContactField;
    ///
    /// assert_eq!(
    ///     ContactField::from_constraint("customers_owner_email_key"),
    ///     Some(ContactField::Email)
    /// );
    /// assert_eq!(ContactField::from_constraint("charges_pkey"), None);
    /// ```
    pub fn from_constraint(constraint: &str) -> Option<Self> {
        match constraint {
            "users_email_key" | "customers_owner_email_key" => Some(ContactField::Email),
            "users_national_id_key" | "customers_owner_national_id_key" => {
                Some(ContactField::NationalId)
            }
            "users_phone_key" | "customers_owner_phone_key" => Some(ContactField::Phone),
            _ => None,
        }
    }
}

/// Borrowed view over the contact values of a record being written
#[derive(Debug, Clone, Copy)]
pub struct ContactValues<'a> {
    pub email: &'a str,
    pub national_id: Option<&'a str>,
    pub phone: Option<&'a str>,
}

impl<'a> ContactValues<'a> {
    pub fn get(&self, field: ContactField) -> Option<&'a str> {
        match field {
            ContactField::Email => Some(self.email),
            ContactField::NationalId => self.national_id,
            ContactField::Phone => self.phone,
        }
    }
}

/// Table whose rows are checked for collisions
#[derive(Debug, Clone, Copy)]
pub(crate) enum ContactScope {
    /// Unique across all users
    Users,
    /// Unique among the customers of one owner
    Customers { owner_user_id: i32 },
}

/// Returns the first field of `values` already taken by another row
///
/// `exclude_id` skips the row being edited.
pub(crate) async fn find_first_conflict(
    conn: &mut PgConnection,
    scope: ContactScope,
    values: ContactValues<'_>,
    exclude_id: Option<i32>,
) -> Result<Option<ContactField>, sqlx::Error> {
    for field in ContactField::CHECK_ORDER {
        let Some(value) = values.get(field) else {
            continue;
        };

        let taken: bool = match scope {
            ContactScope::Users => {
                let sql = format!(
                    "SELECT EXISTS (SELECT 1 FROM users WHERE {} = $1 AND ($2::INT IS NULL OR id <> $2))",
                    field.column()
                );
                sqlx::query_scalar(&sql)
                    .bind(value)
                    .bind(exclude_id)
                    .fetch_one(&mut *conn)
                    .await?
            }
            ContactScope::Customers { owner_user_id } => {
                let sql = format!(
                    "SELECT EXISTS (SELECT 1 FROM customers WHERE owner_user_id = $1 AND {} = $2 AND ($3::INT IS NULL OR id <> $3))",
                    field.column()
                );
                sqlx::query_scalar(&sql)
                    .bind(owner_user_id)
                    .bind(value)
                    .bind(exclude_id)
                    .fetch_one(&mut *conn)
                    .await?
            }
        };

        if taken {
            return Ok(Some(field));
        }
    }

    Ok(None)
}
