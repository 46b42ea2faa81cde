//! Authentication routes.
//!
//! Sign-in happens in the browser against the identity provider; the server
//! only has to take part in sign-out.

pub mod signout;

pub use signout::{SignOut, SignOutResponse, sign_out};

use crate::app::AppContext;
use crate::http::RouteModule;
use axum::{Router, routing::post};

/// Routes under `/auth`
pub struct AuthModule;

impl RouteModule for AuthModule {
    fn routes(&self) -> Router<AppContext> {
        Router::new().route("/signout", post(sign_out))
    }

    fn prefix(&self) -> Option<&str> {
        Some("/auth")
    }
}
