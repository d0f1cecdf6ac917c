/// Database layer
///
/// - `pool`: connection pool creation, health check and shutdown
/// - `migrations`: embedded schema migrations
///
/// Queries live next to their types in the `models` module.

pub mod migrations;
pub mod pool;
