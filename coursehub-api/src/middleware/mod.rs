/// Middleware modules for the API server
///
/// - `auth`: bearer authentication and the admin guard
/// - `security`: security response headers

pub mod auth;
pub mod security;
