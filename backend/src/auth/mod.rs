//! Authentication module
//!
//! Provides JWT access/refresh tokens, argon2 password hashing and the
//! middleware that gates protected routes.

mod jwt;
mod middleware;
mod password;

pub use jwt::{Claims, Identity, TokenError, TokenIssuer};
pub use middleware::{authenticate, require_auth, AuthUser};
pub use password::PasswordService;
