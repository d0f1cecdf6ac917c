/// API route handlers, organized by resource:
///
/// - `health`: Liveness and database connectivity
/// - `auth`: E-mail availability, registration and login (public)
/// - `users`: The caller's own profile
/// - `customers`: Customers of the caller
/// - `charges`: Charges of the caller's customers

pub mod auth;
pub mod charges;
pub mod customers;
pub mod health;
pub mod users;
