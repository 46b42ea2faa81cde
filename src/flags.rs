//! Feature flags.
//!
//! Flags come from a comma separated list (`FEATURE_FLAGS=group_calls,new_player`)
//! parsed once into an immutable [`FeatureFlags`]. Lookups on a `FeatureFlags`
//! value are pure. Code that cannot reach the application context can use the
//! process-wide registry, which must be filled explicitly with [`init`].
//!
//! ```rust
//! use coursegate::flags::FeatureFlags;
//!
//! let flags = FeatureFlags::parse(" Group_Calls, ,new_player");
//! assert!(flags.is_enabled("group_calls"));
//! assert!(flags.is_enabled("NEW_PLAYER"));
//! assert!(!flags.is_enabled("beta_quiz"));
//! ```

use crate::app::AppContext;
use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::{Arc, RwLock};

/// An immutable set of enabled feature flags
///
/// Names are stored lowercase and compared case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct FeatureFlags {
    enabled: BTreeSet<String>,
}

impl FeatureFlags {
    /// Parse a comma separated flag list
    ///
    /// Entries are trimmed and lowercased; empty entries are dropped.
    pub fn parse(raw: &str) -> Self {
        Self::from_names(raw.split(','))
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let enabled = names
            .into_iter()
            .map(|name| name.as_ref().trim().to_ascii_lowercase())
            .filter(|name| !name.is_empty())
            .collect();
        Self { enabled }
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        self.enabled.contains(&name.trim().to_ascii_lowercase())
    }

    /// Enabled flag names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.enabled.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.enabled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.enabled.is_empty()
    }
}

impl From<Vec<String>> for FeatureFlags {
    fn from(names: Vec<String>) -> Self {
        Self::from_names(names)
    }
}

impl From<FeatureFlags> for Vec<String> {
    fn from(flags: FeatureFlags) -> Self {
        flags.enabled.into_iter().collect()
    }
}

static REGISTRY: RwLock<Option<Arc<FeatureFlags>>> = RwLock::new(None);

/// Install the process-wide flag set, replacing any previous one
pub fn init(flags: FeatureFlags) {
    tracing::info!(
        flags = ?flags.names().collect::<Vec<_>>(),
        "Feature flags initialized"
    );
    let mut registry = REGISTRY.write().unwrap_or_else(|poisoned| poisoned.into_inner());
    *registry = Some(Arc::new(flags));
}

/// The process-wide flag set, if [`init`] has been called
pub fn current() -> Option<Arc<FeatureFlags>> {
    REGISTRY
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .clone()
}

/// Look up a flag in the process-wide set; `false` before [`init`]
pub fn is_enabled(name: &str) -> bool {
    current().is_some_and(|flags| flags.is_enabled(name))
}

/// Clear the process-wide set
pub fn reset() {
    let mut registry = REGISTRY.write().unwrap_or_else(|poisoned| poisoned.into_inner());
    *registry = None;
}

/// `GET /flags`: enabled flag names, sorted
pub async fn list_flags(State(ctx): State<AppContext>) -> Json<Vec<String>> {
    Json(ctx.flags.names().map(str::to_string).collect())
}
