/// Authentication utilities
///
/// This module provides the authentication primitives for Cobrança:
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`jwt`]: Identity token issuance and verification
/// - [`middleware`]: The authentication gate for protected routes
///
/// # Example
///
/// ```no_run
/// use cobranca_shared::auth::password::{hash_password, verify_password};
/// use cobranca_shared::auth::jwt::TokenService;
/// use chrono::Duration;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("senha-do-usuario")?;
/// assert!(verify_password("senha-do-usuario", &hash)?);
///
/// let tokens = TokenService::new("secret-key-at-least-32-bytes-long!", Duration::hours(8));
/// let token = tokens.issue(42)?;
/// assert_eq!(tokens.verify(&token)?.sub, 42);
/// # Ok(())
/// # }
/// ```

pub mod jwt;
pub mod middleware;
pub mod password;
