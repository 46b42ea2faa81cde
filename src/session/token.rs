//! Reading the access token out of the identity provider's session cookie.
//!
//! The provider's browser client has written the cookie in several shapes over
//! time: a bare JWT, a JSON object with `access_token`, a JSON array whose first
//! element is the token, and `base64-` prefixed JSON. Values over the browser
//! size limit are split into `<name>.0`, `<name>.1`, ... chunks.

use axum::http::{HeaderMap, header::COOKIE};
use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use cookie::Cookie;
use std::collections::HashMap;

const BASE64_PREFIX: &str = "base64-";

/// Collect request cookies by name; the first occurrence of a name wins
pub fn request_cookies(headers: &HeaderMap) -> HashMap<String, String> {
    let mut cookies = HashMap::new();
    for value in headers.get_all(COOKIE) {
        let Ok(raw) = value.to_str() else {
            continue;
        };
        for cookie in Cookie::split_parse(raw).flatten() {
            cookies
                .entry(cookie.name().to_string())
                .or_insert_with(|| cookie.value().to_string());
        }
    }
    cookies
}

/// The raw session cookie value, joining numbered chunks when unchunked is absent
pub fn session_cookie_value(cookies: &HashMap<String, String>, name: &str) -> Option<String> {
    if let Some(value) = cookies.get(name) {
        return Some(value.clone());
    }

    let mut joined = String::new();
    for index in 0.. {
        match cookies.get(&format!("{}.{}", name, index)) {
            Some(chunk) => joined.push_str(chunk),
            None => break,
        }
    }

    if joined.is_empty() { None } else { Some(joined) }
}

/// Extract the access token from a session cookie value
pub fn access_token_from_value(value: &str) -> Option<String> {
    let value = urlencoding::decode(value)
        .map(|v| v.into_owned())
        .unwrap_or_else(|_| value.to_string());
    let value = value.trim();

    if let Some(encoded) = value.strip_prefix(BASE64_PREFIX) {
        let decoded = URL_SAFE_NO_PAD
            .decode(encoded.trim_end_matches('='))
            .or_else(|_| STANDARD.decode(encoded))
            .ok()?;
        let decoded = String::from_utf8(decoded).ok()?;
        return token_from_json(&decoded);
    }

    if value.starts_with('{') || value.starts_with('[') {
        return token_from_json(value);
    }

    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn token_from_json(raw: &str) -> Option<String> {
    let json: serde_json::Value = serde_json::from_str(raw).ok()?;
    let token = match &json {
        serde_json::Value::Object(map) => map.get("access_token")?.as_str()?,
        serde_json::Value::Array(items) => items.first()?.as_str()?,
        _ => return None,
    };
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// Find the access token in a request's cookies, if any
pub fn access_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let cookies = request_cookies(headers);
    session_cookie_value(&cookies, cookie_name).and_then(|value| access_token_from_value(&value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with_cookie(raw: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, raw.parse().unwrap());
        headers
    }

    #[test]
    fn test_raw_token() {
        let headers = headers_with_cookie("sb-auth-token=header.payload.sig; theme=dark");
        assert_eq!(
            access_token(&headers, "sb-auth-token"),
            Some("header.payload.sig".to_string())
        );
    }

    #[test]
    fn test_json_object() {
        let value = urlencoding::encode(r#"{"access_token":"tok","refresh_token":"ref"}"#);
        let headers = headers_with_cookie(&format!("sb-auth-token={}", value));
        assert_eq!(access_token(&headers, "sb-auth-token"), Some("tok".to_string()));
    }

    #[test]
    fn test_json_array() {
        assert_eq!(
            access_token_from_value(r#"["tok","ref",null,null,null]"#),
            Some("tok".to_string())
        );
    }

    #[test]
    fn test_base64_prefixed() {
        let encoded = URL_SAFE_NO_PAD.encode(r#"{"access_token":"b64tok"}"#);
        assert_eq!(
            access_token_from_value(&format!("base64-{}", encoded)),
            Some("b64tok".to_string())
        );

        let padded = STANDARD.encode(r#"{"access_token":"padded"}"#);
        assert_eq!(
            access_token_from_value(&format!("base64-{}", padded)),
            Some("padded".to_string())
        );
    }

    #[test]
    fn test_chunked_cookie() {
        let encoded = URL_SAFE_NO_PAD.encode(r#"{"access_token":"chunked-token"}"#);
        let (first, second) = encoded.split_at(encoded.len() / 2);
        let headers = headers_with_cookie(&format!(
            "sb-auth-token.1={}; sb-auth-token.0=base64-{}",
            second, first
        ));
        assert_eq!(
            access_token(&headers, "sb-auth-token"),
            Some("chunked-token".to_string())
        );
    }

    #[test]
    fn test_chunks_stop_at_gap() {
        let mut cookies = HashMap::new();
        cookies.insert("s.0".to_string(), "a".to_string());
        cookies.insert("s.2".to_string(), "c".to_string());
        assert_eq!(session_cookie_value(&cookies, "s"), Some("a".to_string()));
    }

    #[test]
    fn test_unusable_values() {
        assert_eq!(access_token_from_value(""), None);
        assert_eq!(access_token_from_value("{not json"), None);
        assert_eq!(access_token_from_value(r#"{"refresh_token":"x"}"#), None);
        assert_eq!(access_token_from_value(r#"{"access_token":""}"#), None);
        assert_eq!(access_token_from_value("base64-!!!"), None);
        assert_eq!(access_token_from_value("[]"), None);
    }

    #[test]
    fn test_no_cookie_header() {
        assert_eq!(access_token(&HeaderMap::new(), "sb-auth-token"), None);
    }

    #[test]
    fn test_multiple_cookie_headers() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, "theme=dark".parse().unwrap());
        headers.append(COOKIE, "sb-auth-token=tok".parse().unwrap());
        assert_eq!(access_token(&headers, "sb-auth-token"), Some("tok".to_string()));
    }
}
