/// Middleware for the API server
///
/// - `security`: Security response headers
///
/// Authentication lives in `cobranca_shared::auth::middleware`.

pub mod security;
