use serde::{Deserialize, Serialize};
use crate::session::CookieVariant;
use crate::utils::{get_env_with_prefix, parse_bool, split_list};

/// Session cookie configuration
///
/// Describes every cookie that may hold session state in a browser, including
/// names and domains used by earlier deployments, so sign-out can clear them all.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
    /// Cookie written by the identity provider's client library
    ///
    /// Large sessions are split into `<name>.0`, `<name>.1`, ... chunks.
    #[serde(default = "default_session_cookie")]
    pub session_cookie: String,

    /// Other cookie names that held session state at some point
    #[serde(default = "default_legacy_cookies")]
    pub legacy_cookies: Vec<String>,

    /// Domains cookies may have been scoped to (host-only is always cleared)
    #[serde(default)]
    pub cookie_domains: Vec<String>,

    /// Paths cookies may have been scoped to
    #[serde(default = "default_cookie_paths")]
    pub cookie_paths: Vec<String>,

    /// Number of numbered chunks cleared per cookie name
    #[serde(default = "default_chunk_count")]
    pub chunk_count: usize,

    /// Send clearing cookies with the `Secure` attribute
    #[serde(default = "default_secure")]
    pub cookie_secure: bool,

    /// Variants outside the name x domain x path product
    #[serde(default)]
    pub extra_variants: Vec<CookieVariant>,

    /// Where sign-out redirects to
    #[serde(default = "default_signout_redirect")]
    pub signout_redirect: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_cookie: default_session_cookie(),
            legacy_cookies: default_legacy_cookies(),
            cookie_domains: Vec::new(),
            cookie_paths: default_cookie_paths(),
            chunk_count: default_chunk_count(),
            cookie_secure: default_secure(),
            extra_variants: Vec::new(),
            signout_redirect: default_signout_redirect(),
        }
    }
}

impl SessionConfig {
    /// Load session configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(name) = get_env_with_prefix("SESSION_COOKIE_NAME") {
            config.session_cookie = name;
        }

        if let Some(names) = get_env_with_prefix("SESSION_LEGACY_COOKIES") {
            config.legacy_cookies = split_list(&names);
        }

        if let Some(domains) = get_env_with_prefix("SESSION_COOKIE_DOMAINS") {
            config.cookie_domains = split_list(&domains);
        }

        if let Some(paths) = get_env_with_prefix("SESSION_COOKIE_PATHS") {
            let paths = split_list(&paths);
            if !paths.is_empty() {
                config.cookie_paths = paths;
            }
        }

        if let Some(chunks) = get_env_with_prefix("SESSION_COOKIE_CHUNKS") {
            if let Ok(chunks) = chunks.parse() {
                config.chunk_count = chunks;
            }
        }

        if let Some(secure) = get_env_with_prefix("SESSION_COOKIE_SECURE") {
            config.cookie_secure = parse_bool("SESSION_COOKIE_SECURE", &secure, true);
        }

        if let Some(redirect) = get_env_with_prefix("SIGNOUT_REDIRECT") {
            // values mounted from secret files often end in a newline
            config.signout_redirect = redirect.trim().to_string();
        }

        config
    }

    /// All cookie names to clear, chunk names included
    pub fn cookie_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        for base in std::iter::once(&self.session_cookie).chain(&self.legacy_cookies) {
            names.push(base.clone());
            names.extend((0..self.chunk_count).map(|i| format!("{}.{}", base, i)));
        }
        names
    }
}

fn default_session_cookie() -> String {
    "sb-auth-token".to_string()
}

fn default_legacy_cookies() -> Vec<String> {
    vec!["sb-access-token".to_string(), "sb-refresh-token".to_string()]
}

fn default_cookie_paths() -> Vec<String> {
    vec!["/".to_string()]
}

fn default_chunk_count() -> usize {
    5
}

fn default_secure() -> bool {
    true
}

fn default_signout_redirect() -> String {
    "/login".to_string()
}
