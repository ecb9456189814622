//! Slug derivation for content entries.
//!
//! `posts/Hola Mundo.md` → `posts/hola-mundo`

/// Derive a slug from an entry id (path relative to its collection).
pub fn slug_from_id(id: &str) -> String {
    let stem = match id.rsplit_once('.') {
        Some((stem, ext)) if !ext.contains('/') => stem,
        _ => id,
    };

    stem.split('/')
        .map(slugify_segment)
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Lowercase, turn whitespace into `-` and drop punctuation other than `-`/`_`.
pub fn slugify_segment(text: &str) -> String {
    text.trim()
        .chars()
        .filter_map(|c| match c {
            c if c.is_whitespace() => Some('-'),
            c if c.is_alphanumeric() || c == '-' || c == '_' => Some(c),
            _ => None,
        })
        .flat_map(char::to_lowercase)
        .collect()
}
