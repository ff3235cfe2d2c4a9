// src/matcher/path.rs

//! Path normalization and segment helpers.
//!
//! Every path that enters or is compared inside the matcher goes through
//! [`normalize`] first, so that `a/b/`, `a/b` and `./a/b` are the same key.
//! Comparisons are done on the `/`-delimited segment sequence, never on raw
//! string prefixes.

/// Path separator used for node/target keys.
pub const SEPARATOR: char = '/';

/// Canonicalize a node/target path.
///
/// - Trailing separators are removed (`a/b/` -> `a/b`).
/// - Leading `./` segments are removed, any number of them
///   (`././a/b` -> `a/b`).
///
/// The function is idempotent: `normalize(&normalize(p)) == normalize(p)`.
pub fn normalize(path: &str) -> String {
    let mut rest = path.trim_end_matches(SEPARATOR);
    while let Some(stripped) = rest.strip_prefix("./") {
        rest = stripped;
    }
    rest.to_string()
}

/// Split a normalized path into its segments.
pub fn segments(path: &str) -> Vec<&str> {
    path.split(SEPARATOR).collect()
}

/// Parent directory of `path`, with the same conventions as POSIX `dirname`.
///
/// - `a/b/c` -> `a/b`
/// - `file` -> `.`
/// - `/file` -> `/`
pub fn dirname(path: &str) -> &str {
    match path.rfind(SEPARATOR) {
        Some(0) => "/",
        Some(idx) => &path[..idx],
        None => ".",
    }
}

/// Final segment of `path`.
pub fn basename(path: &str) -> &str {
    match path.rfind(SEPARATOR) {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

/// Hidden paths (basename starting with `.`) never take part in matching.
pub fn is_hidden(path: &str) -> bool {
    basename(path).starts_with('.')
}

/// Returns true if `ancestor` is a *strict* segment-wise ancestor of `path`.
///
/// `path/to/node` is an ancestor of `path/to/node/target`, but not of
/// `path/to/nodeX`.
pub fn is_ancestor(ancestor: &str, path: &str) -> bool {
    let anc = segments(ancestor);
    let segs = segments(path);
    anc.len() < segs.len() && segs[..anc.len()] == anc[..]
}

/// Returns true if `path` equals `prefix` or descends from it.
pub fn is_segment_prefix(prefix: &str, path: &str) -> bool {
    prefix == path || is_ancestor(prefix, path)
}
