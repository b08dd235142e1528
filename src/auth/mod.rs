//! Authentication and authorization module

pub mod cookie;
pub mod jwt;
pub mod middleware;
pub mod ownership;
pub mod password;

pub use jwt::{AccessClaims, Claims, RefreshClaims, TokenCodec, TokenError, TokenKind};
pub use middleware::{extract_token, require_auth, AuthContext, AuthGuard};
pub use ownership::{require_owner, Owned, OwnershipGuard};
pub use password::PasswordHasher;
