//! Request scenarios for exercising a router without starting a server
//!
//! # Example
//!
//! ```rust,ignore
//! use coursegate::{App, ConfigBuilder, testing};
//!
//! #[tokio::test]
//! async fn signout_redirects() {
//!     let app = App::new(ConfigBuilder::new().build().unwrap()).into_router();
//!
//!     testing::post(app, "/auth/signout")
//!         .cookie("sb-auth-token", "abc")
//!         .execute()
//!         .await
//!         .assert_redirect("/login");
//! }
//! ```

use axum::{
    Router,
    body::Body,
    http::{HeaderName, HeaderValue, Method, Request, StatusCode, header},
};
use serde::Deserialize;
use tower::ServiceExt;

/// Test scenario builder for a single request
pub struct Scenario {
    app: Router,
    request: Request<Body>,
}

impl Scenario {
    pub fn new(app: Router) -> Self {
        Self {
            app,
            request: Request::builder()
                .method(Method::GET)
                .uri("/")
                .body(Body::empty())
                .unwrap(),
        }
    }

    pub fn method(mut self, method: Method) -> Self {
        *self.request.method_mut() = method;
        self
    }

    pub fn uri(mut self, uri: &str) -> Self {
        *self.request.uri_mut() = uri.parse().unwrap();
        self
    }

    /// Add a header, keeping earlier values with the same name
    pub fn header(mut self, key: &str, value: &str) -> Self {
        self.request.headers_mut().append(
            HeaderName::from_bytes(key.as_bytes()).unwrap(),
            value.parse().unwrap(),
        );
        self
    }

    /// Add a cookie to the request's `Cookie` header
    ///
    /// The value is percent-encoded the way browsers store JSON session values.
    pub fn cookie(mut self, name: &str, value: &str) -> Self {
        let pair = format!("{}={}", name, urlencoding::encode(value));
        let headers = self.request.headers_mut();
        let combined = match headers.get(header::COOKIE).and_then(|v| v.to_str().ok()) {
            Some(existing) => format!("{}; {}", existing, pair),
            None => pair,
        };
        headers.insert(header::COOKIE, HeaderValue::from_str(&combined).unwrap());
        self
    }

    /// Set the body to exact bytes, as a webhook sender would
    pub fn raw_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        *self.request.body_mut() = Body::from(body.into());
        self.request
            .headers_mut()
            .insert(header::CONTENT_TYPE, "application/json".parse().unwrap());
        self
    }

    pub async fn execute(self) -> ScenarioAssert {
        let response = self.app.oneshot(self.request).await.unwrap();
        ScenarioAssert { response }
    }
}

/// Assertion builder for test responses
pub struct ScenarioAssert {
    response: axum::response::Response,
}

impl ScenarioAssert {
    pub fn assert_status(self, expected: StatusCode) -> Self {
        assert_eq!(
            self.response.status(),
            expected,
            "Expected status {}, got {}",
            expected,
            self.response.status()
        );
        self
    }

    pub fn assert_ok(self) -> Self {
        self.assert_status(StatusCode::OK)
    }

    pub fn assert_bad_request(self) -> Self {
        self.assert_status(StatusCode::BAD_REQUEST)
    }

    pub fn assert_unauthorized(self) -> Self {
        self.assert_status(StatusCode::UNAUTHORIZED)
    }

    pub fn assert_not_found(self) -> Self {
        self.assert_status(StatusCode::NOT_FOUND)
    }

    /// Assert a `303 See Other` to the given location
    pub fn assert_redirect(self, location: &str) -> Self {
        self.assert_status(StatusCode::SEE_OTHER)
            .assert_header(header::LOCATION.as_str(), location)
    }

    pub fn assert_header(self, key: &str, expected: &str) -> Self {
        let value = self
            .response
            .headers()
            .get(key)
            .unwrap_or_else(|| panic!("Header '{}' not found", key))
            .to_str()
            .unwrap();
        assert_eq!(value, expected, "Header '{}' value mismatch", key);
        self
    }

    pub fn assert_json(self) -> Self {
        let content_type = self
            .response
            .headers()
            .get(header::CONTENT_TYPE)
            .expect("Content-Type header not found")
            .to_str()
            .unwrap();
        assert!(
            content_type.contains("application/json"),
            "Expected JSON content type, got: {}",
            content_type
        );
        self
    }

    /// Every `Set-Cookie` header value, in order
    pub fn set_cookies(&self) -> Vec<String> {
        self.response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect()
    }

    pub async fn body_bytes(self) -> Vec<u8> {
        axum::body::to_bytes(self.response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    pub async fn json<T: for<'de> Deserialize<'de>>(self) -> T {
        let bytes = self.body_bytes().await;
        serde_json::from_slice(&bytes).expect("Failed to parse JSON response")
    }

    /// Assert a JSON value by dotted path, e.g. `"checks.0.status"`
    pub async fn assert_json_path(self, path: &str, expected: serde_json::Value) -> Self {
        let bytes = axum::body::to_bytes(self.response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        let actual =
            json_path_get(&json, path).unwrap_or_else(|| panic!("Path '{}' not found in JSON", path));

        assert_eq!(actual, &expected, "JSON path '{}' value mismatch", path);

        Self {
            response: axum::response::Response::new(Body::from(bytes)),
        }
    }

    /// Get the underlying response for custom assertions
    pub fn response(self) -> axum::response::Response {
        self.response
    }
}

fn json_path_get<'a>(json: &'a serde_json::Value, path: &str) -> Option<&'a serde_json::Value> {
    let mut current = json;

    for part in path.split('.') {
        current = match part.parse::<usize>() {
            Ok(index) => current.get(index)?,
            Err(_) => current.get(part)?,
        };
    }

    Some(current)
}

pub fn get(app: Router, uri: &str) -> Scenario {
    Scenario::new(app).method(Method::GET).uri(uri)
}

pub fn post(app: Router, uri: &str) -> Scenario {
    Scenario::new(app).method(Method::POST).uri(uri)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Json,
        http::HeaderMap,
        response::{IntoResponse, Redirect},
        routing::{get as axum_get, post as axum_post},
    };
    use serde_json::json;

    async fn echo_cookie(headers: HeaderMap) -> Json<serde_json::Value> {
        let cookie = headers
            .get(header::COOKIE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        Json(json!({"cookie": cookie}))
    }

    async fn leave() -> impl IntoResponse {
        let mut response = Redirect::to("/login").into_response();
        response
            .headers_mut()
            .append(header::SET_COOKIE, HeaderValue::from_static("a=; Max-Age=0"));
        response
            .headers_mut()
            .append(header::SET_COOKIE, HeaderValue::from_static("b=; Max-Age=0"));
        response
    }

    #[tokio::test]
    async fn test_cookies_are_combined_and_encoded() {
        let app = Router::new().route("/echo", axum_get(echo_cookie));

        get(app, "/echo")
            .cookie("a", "1")
            .cookie("b", "{\"x\":1}")
            .execute()
            .await
            .assert_ok()
            .assert_json()
            .assert_json_path("cookie", json!("a=1; b=%7B%22x%22%3A1%7D"))
            .await;
    }

    #[tokio::test]
    async fn test_redirect_and_set_cookies() {
        let app = Router::new().route("/leave", axum_post(leave));

        let response = post(app, "/leave").execute().await.assert_redirect("/login");
        assert_eq!(response.set_cookies(), vec!["a=; Max-Age=0", "b=; Max-Age=0"]);
    }

    #[test]
    fn test_json_path_get() {
        let value = json!({"checks": [{"name": "application"}]});
        assert_eq!(
            json_path_get(&value, "checks.0.name"),
            Some(&json!("application"))
        );
        assert_eq!(json_path_get(&value, "checks.1.name"), None);
    }
}
