/// Get an environment variable with the `COURSEGATE_` prefix, falling back to the bare name
///
/// `get_env_with_prefix("PORT")` checks `COURSEGATE_PORT` first, then `PORT`, so platform
/// provided variables keep working.
pub fn get_env_with_prefix(key: &str) -> Option<String> {
    std::env::var(format!("COURSEGATE_{}", key))
        .or_else(|_| std::env::var(key))
        .ok()
}

/// Split a comma separated environment value into trimmed, non-empty items
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse a boolean environment value
///
/// Accepts `true/false`, `1/0`, `yes/no` and `on/off` in any case. Anything else
/// is logged and replaced with `default`.
pub fn parse_bool(key: &str, raw: &str, default: bool) -> bool {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => true,
        "false" | "0" | "no" | "off" => false,
        _ => {
            tracing::warn!(
                key,
                value = raw,
                default,
                "Unrecognized boolean in environment, using default"
            );
            default
        }
    }
}
