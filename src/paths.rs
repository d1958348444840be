//! Storage key and URL path helpers shared by both adapters.
//!
//! Paths are joined, never validated: whatever the caller passes in is carried
//! through to the key unchanged apart from separator handling at the seams.

const SEPARATOR: char = '/';

/// Prefixes `path` with `directory` when one is configured.
pub fn compute_path(directory: &str, path: &str) -> String {
    if directory.is_empty() {
        path.to_string()
    } else {
        format!("{}{}{}", directory, SEPARATOR, path)
    }
}

/// Joins a host URL and a key, dropping one trailing separator from the host
/// and one leading separator from the key.
pub fn join_url(host: &str, key: &str) -> String {
    let host = host.strip_suffix(SEPARATOR).unwrap_or(host);
    let key = key.strip_prefix(SEPARATOR).unwrap_or(key);
    format!("{}{}{}", host, SEPARATOR, key)
}

/// Forces exactly one leading separator.
pub fn normalize_invalidation_path(path: &str) -> String {
    format!("{}{}", SEPARATOR, path.trim_start_matches(SEPARATOR))
}
