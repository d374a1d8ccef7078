//! Bearer-token authentication and ownership checks.
//!
//! Dual-token system: short-lived access tokens (1 min) presented as
//! `Authorization: Bearer`, and long-lived refresh tokens (30 days) carried in
//! an HTTP-only cookie and exchanged for new access tokens. Both are
//! stateless; logging out only clears the cookie.

mod cookie;
mod errors;
mod extractors;
mod ownership;
mod state;

pub use cookie::{CookiePolicy, REFRESH_COOKIE_NAME, get_cookie, read_refresh_token};
pub use errors::{ApiAuthError, AuthErrorKind};
pub use extractors::{Authenticated, authenticate, bearer_token};
pub use ownership::{Access, Owned, authorize};
pub use state::HasAuthBackend;
