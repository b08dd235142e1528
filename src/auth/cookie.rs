//! Session cookie parsing and Set-Cookie construction

use axum::http::{header, HeaderMap, HeaderValue};

use crate::error::AppError;

/// Cookie carrying the access token
pub const ACCESS_COOKIE_NAME: &str = "accessToken";

/// Cookie carrying the refresh token
pub const REFRESH_COOKIE_NAME: &str = "refreshToken";

/// Extract a cookie value from the Cookie header.
pub fn get_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    for cookie_header in headers.get_all(header::COOKIE) {
        let Ok(cookie_header) = cookie_header.to_str() else {
            continue;
        };
        for part in cookie_header.split(';') {
            if let Some((key, value)) = part.trim().split_once('=') {
                if key.trim() == name {
                    return Some(value.trim());
                }
            }
        }
    }
    None
}

/// `HttpOnly; SameSite=Strict` cookie holding `value` for `max_age_secs`
pub fn session_cookie(
    name: &str,
    value: &str,
    max_age_secs: u64,
    secure: bool,
) -> Result<HeaderValue, AppError> {
    let secure = if secure { "; Secure" } else { "" };
    HeaderValue::from_str(&format!(
        "{}={}; HttpOnly; SameSite=Strict; Path=/; Max-Age={}{}",
        name, value, max_age_secs, secure
    ))
    .map_err(|_| AppError::internal_error("Failed to build session cookie"))
}

/// Expired cookie that makes the browser drop `name`
pub fn cleared_cookie(name: &str, secure: bool) -> HeaderValue {
    let secure = if secure { "; Secure" } else { "" };
    let value = format!("{}=; HttpOnly; SameSite=Strict; Path=/; Max-Age=0{}", name, secure);
    // Name and flags are ASCII constants
    HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static(""))
}
