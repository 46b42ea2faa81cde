//! The declarative list of session cookie variants cleared on sign-out.
//!
//! Browsers key cookies by `(name, domain, path)`. A clearing cookie only
//! overwrites a stored cookie when all three match, so every combination a
//! past deployment may have written is listed here and cleared the same way.

use cookie::time::{Duration, OffsetDateTime};
use cookie::{Cookie, SameSite};
use serde::{Deserialize, Serialize};
use crate::session::SessionConfig;

/// One `(name, domain, path)` combination a session cookie may live under
///
/// `domain: None` is a host-only cookie (no `Domain` attribute).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct CookieVariant {
    pub name: String,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default = "default_path")]
    pub path: String,
}

impl CookieVariant {
    pub fn new(name: impl Into<String>, domain: Option<&str>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            domain: domain.and_then(normalize_domain),
            path: path.into(),
        }
    }

    /// An already-expired cookie that overwrites this variant in the browser
    pub fn clearing_cookie(&self, secure: bool) -> Cookie<'static> {
        let mut builder = Cookie::build((self.name.clone(), ""))
            .path(self.path.clone())
            .max_age(Duration::ZERO)
            .expires(OffsetDateTime::UNIX_EPOCH)
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(secure);

        if let Some(ref domain) = self.domain {
            builder = builder.domain(domain.clone());
        }

        builder.build()
    }
}

/// Ordered, duplicate-free set of cookie variants
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieVariants {
    variants: Vec<CookieVariant>,
}

impl CookieVariants {
    /// Build the list from session configuration
    ///
    /// Every cookie name is paired with host-only plus each configured domain,
    /// and with each configured path; explicit extra variants follow.
    pub fn from_config(config: &SessionConfig) -> Self {
        let domains: Vec<Option<&str>> = std::iter::once(None)
            .chain(config.cookie_domains.iter().map(|d| Some(d.as_str())))
            .collect();

        let mut variants = Self::default();
        for name in config.cookie_names() {
            for domain in &domains {
                for path in &config.cookie_paths {
                    variants.push(CookieVariant::new(name.clone(), *domain, path.clone()));
                }
            }
        }
        for extra in &config.extra_variants {
            variants.push(CookieVariant::new(
                extra.name.clone(),
                extra.domain.as_deref(),
                extra.path.clone(),
            ));
        }
        variants
    }

    /// Append a variant unless an identical one is already listed
    pub fn push(&mut self, variant: CookieVariant) {
        if !self.variants.contains(&variant) {
            self.variants.push(variant);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &CookieVariant> {
        self.variants.iter()
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    /// Clearing cookies for every variant, in list order
    pub fn clearing_cookies(&self, secure: bool) -> Vec<Cookie<'static>> {
        self.variants
            .iter()
            .map(|variant| variant.clearing_cookie(secure))
            .collect()
    }
}

/// Lowercase and strip a leading dot; `.example.com` and `example.com` are the same scope.
fn normalize_domain(domain: &str) -> Option<String> {
    let domain = domain.trim().trim_start_matches('.').to_ascii_lowercase();
    if domain.is_empty() { None } else { Some(domain) }
}

/// Whether `name` is an RFC 6265 cookie-name token
///
/// Visible ASCII except separators, so it can be written into `Set-Cookie` as is.
pub fn is_cookie_name(name: &str) -> bool {
    !name.is_empty()
        && name.bytes().all(|b| {
            b.is_ascii_graphic() && !b"()<>@,;:\\\"/[]?={}".contains(&b)
        })
}

fn default_path() -> String {
    "/".to_string()
}
