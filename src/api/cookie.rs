//! Token cookie helpers

use axum::http::{header, HeaderMap, HeaderValue};

/// Name of the cookie carrying the auth token
pub const TOKEN_COOKIE: &str = "token";

/// Build the `Set-Cookie` value for a freshly issued token
pub fn token_cookie(token: &str, max_age_secs: i64, secure: bool) -> HeaderValue {
    let mut cookie = format!("{}={}; HttpOnly", TOKEN_COOKIE, token);
    if secure {
        cookie.push_str("; Secure");
    }
    cookie.push_str(&format!("; SameSite=Lax; Path=/; Max-Age={}", max_age_secs));

    HeaderValue::from_str(&cookie).unwrap_or_else(|_| HeaderValue::from_static(""))
}

/// Build the `Set-Cookie` value that removes the token cookie
pub fn clear_token_cookie() -> HeaderValue {
    HeaderValue::from_static("token=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0")
}

/// Extract a cookie value from headers
pub fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .find_map(|cookie| {
            let (key, value) = cookie.trim().split_once('=')?;
            (key == name).then(|| value.to_string())
        })
}
