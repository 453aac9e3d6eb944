//! Field-name to lookup-key derivation.
//!
//! The default mapper turns a field name into SCREAMING_SNAKE_CASE with
//! acronym-aware word boundaries: `DatabaseURL` → `DATABASE_URL`,
//! `HTTPServer` → `HTTP_SERVER`. Rust's snake_case field names pass through
//! as plain uppercasing, and the mapping is idempotent, so already-canonical
//! keys survive a second pass unchanged.

/// Maps a single field name to its lookup-key segment.
///
/// Swap the mapper via [`Options::mapper`](crate::Options::mapper) to change
/// the naming scheme without touching the binder or the merger. Nested-path
/// joining (segments separated by `_`) is the binder's job, not the mapper's.
pub trait KeyMapper: Send + Sync {
    fn field(&self, name: &str) -> String;
}

/// The default mapper: acronym-aware SCREAMING_SNAKE_CASE.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScreamingSnake;

impl KeyMapper for ScreamingSnake {
    fn field(&self, name: &str) -> String {
        screaming_snake(name)
    }
}

/// A boundary goes before an uppercase letter when the previous character is
/// lowercase, or when the previous character is uppercase and the next one is
/// lowercase (the tail of an acronym: the `S` in `HTTPServer`).
pub(crate) fn screaming_snake(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c.is_ascii_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase());
            if prev.is_ascii_lowercase() || (prev.is_ascii_uppercase() && next_is_lower) {
                out.push('_');
            }
        }
        out.push(c.to_ascii_uppercase());
    }

    out
}
