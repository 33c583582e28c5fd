/// Authentication primitives
///
/// - [`password`]: Argon2id hashing and the signup password policy
/// - [`jwt`]: HS256 access and refresh tokens
/// - [`identity`]: the [`identity::IdentityVerifier`] port used by the bearer
///   middleware, and its JWT implementation

pub mod identity;
pub mod jwt;
pub mod password;
