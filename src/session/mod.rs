//! Session cookie handling.
//!
//! Reads the identity provider's session cookie and builds the list of cookie
//! variants that sign-out clears.

mod config;
pub mod token;
mod variants;

pub use config::SessionConfig;
pub use token::access_token;
pub use variants::{CookieVariant, CookieVariants, is_cookie_name};
