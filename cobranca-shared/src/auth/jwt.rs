/// Identity token issuance and verification
///
/// Tokens are HS256-signed JWTs that carry the user id as `sub` plus the
/// usual time claims. They are stateless: nothing is persisted server-side and
/// a token stops being accepted only when it expires.
///
/// # Security
///
/// - **Algorithm**: HS256 (HMAC with SHA-256)
/// - **Expiration**: Configurable per service (default 8 hours)
/// - **Validation**: Signature, issuer, `nbf` and `exp` with zero leeway
/// - **Secret Management**: Secrets should be at least 32 bytes (256 bits)
///
/// # Example
///
/// ```
/// use cobranca_shared::auth::jwt::TokenService;
/// use chrono::Duration;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let tokens = TokenService::new("your-secret-key-at-least-32-bytes", Duration::hours(8));
///
/// let token = tokens.issue(7)?;
/// let claims = tokens.verify(&token)?;
/// assert_eq!(claims.sub, 7);
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Issuer claim stamped on every token
pub const ISSUER: &str = "cobranca";

/// Default token lifetime
pub const DEFAULT_TTL_HOURS: i64 = 8;

/// Error type for token operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// Token was not issued by this service
    #[error("Invalid issuer")]
    InvalidIssuer,

    /// Bad signature or malformed token
    #[error("Invalid token: {0}")]
    Invalid(String),
}

/// JWT claims
///
/// - `sub`: User ID
/// - `iss`: Always [`ISSUER`]
/// - `iat`: Issued at (Unix timestamp)
/// - `nbf`: Not before (Unix timestamp)
/// - `exp`: Expiration (Unix timestamp)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i32,
    pub iss: String,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
}

impl Claims {
    /// Creates claims for `user_id` expiring `expires_in` from now
    ///
    /// A negative duration yields already-expired claims.
    pub fn new(user_id: i32, expires_in: Duration) -> Self {
        let now = Utc::now();
        let expiration = now + expires_in;

        Self {
            sub: user_id,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: expiration.timestamp(),
        }
    }

    /// Checks if the token has expired (the expiration instant itself counts)
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// Signs and verifies identity tokens
///
/// Built once at startup from the configured secret and shared behind an
/// `Arc` for the lifetime of the process.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    /// Creates a token service from a signing secret and a token lifetime
    pub fn new(secret: &str, ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[ISSUER]);
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        }
    }

    /// Issues a token for `user_id` using the configured lifetime
    ///
    /// # Example
    ///
    /// ```
    /// use cobranca_shared::auth::jwt::TokenService;
    /// use chrono::Duration;
    ///
    /// let tokens = TokenService::new("secret", Duration::hours(1));
    /// let token = tokens.issue(1).unwrap();
    /// assert_eq!(token.split('.').count(), 3);
    /// ```
    pub fn issue(&self, user_id: i32) -> Result<String, JwtError> {
        self.issue_with_ttl(user_id, self.ttl)
    }

    /// Issues a token for `user_id` with an explicit lifetime
    pub fn issue_with_ttl(&self, user_id: i32, ttl: Duration) -> Result<String, JwtError> {
        self.sign(&Claims::new(user_id, ttl))
    }

    /// Signs arbitrary claims
    pub fn sign(&self, claims: &Claims) -> Result<String, JwtError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
    }

    /// Verifies a token and returns its claims
    ///
    /// # Errors
    ///
    /// - `JwtError::Expired` when the current time is at or after `exp`
    /// - `JwtError::InvalidIssuer` when `iss` is not [`ISSUER`]
    /// - `JwtError::Invalid` for bad signatures and malformed tokens
    pub fn verify(&self, token: &str) -> Result<Claims, JwtError> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(
            |e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
                jsonwebtoken::errors::ErrorKind::InvalidIssuer => JwtError::InvalidIssuer,
                _ => JwtError::Invalid(e.to_string()),
            },
        )?;

        // jsonwebtoken accepts exp == now; the expiration instant is already invalid here
        if token_data.claims.is_expired() {
            return Err(JwtError::Expired);
        }

        Ok(token_data.claims)
    }
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}
