//! Refresh token cookie handling.
//!
//! The cookie is modelled as two plain functions: request headers to an
//! optional token, and a policy to a `Set-Cookie` value.

use axum::http::{HeaderMap, header};

use crate::cli::DeployMode;
use crate::jwt::IssuedToken;

/// Cookie name for the refresh token (long-lived, 30 days).
pub const REFRESH_COOKIE_NAME: &str = "refreshToken";

/// Extract a cookie value from the Cookie header.
pub fn get_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    let cookie_header = headers.get(header::COOKIE)?.to_str().ok()?;
    for part in cookie_header.split(';') {
        let part = part.trim();
        if let Some((key, value)) = part.split_once('=') {
            if key.trim() == name {
                return Some(value.trim());
            }
        }
    }
    None
}

/// Read the refresh token from request headers. An empty value counts as absent.
pub fn read_refresh_token(headers: &HeaderMap) -> Option<&str> {
    get_cookie(headers, REFRESH_COOKIE_NAME).filter(|token| !token.is_empty())
}

/// Cookie attributes for the refresh token.
///
/// Setting and clearing must use identical attributes, otherwise browsers keep
/// the old cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CookiePolicy {
    secure: bool,
}

impl CookiePolicy {
    /// `Secure; SameSite=None` in production (cross-site frontend over HTTPS),
    /// `SameSite=Lax` without `Secure` otherwise.
    pub fn for_mode(mode: DeployMode) -> Self {
        Self {
            secure: mode == DeployMode::Production,
        }
    }

    fn attributes(&self) -> &'static str {
        if self.secure {
            "Path=/; HttpOnly; Secure; SameSite=None"
        } else {
            "Path=/; HttpOnly; SameSite=Lax"
        }
    }

    /// `Set-Cookie` value carrying a refresh token. The cookie lives exactly
    /// as long as the token.
    pub fn refresh_cookie(&self, refresh: &IssuedToken) -> String {
        format!(
            "{}={}; {}; Max-Age={}",
            REFRESH_COOKIE_NAME,
            refresh.token,
            self.attributes(),
            refresh.duration
        )
    }

    /// `Set-Cookie` value deleting the refresh token.
    pub fn clear_refresh_cookie(&self) -> String {
        format!(
            "{}=; {}; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT",
            REFRESH_COOKIE_NAME,
            self.attributes()
        )
    }
}
