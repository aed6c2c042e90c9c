//! Path normalization for archive keys.
//!
//! Archive keys are slash-delimited with no leading slash. Callers may pass
//! absolute paths, relative paths, `.` and `..` segments, repeated or
//! trailing slashes; all collapse to one canonical key. `..` never climbs
//! above the root. The root itself normalizes to the empty string.

/// Normalize a caller-supplied path to an archive key.
pub fn normalize(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            s => parts.push(s),
        }
    }
    parts.join("/")
}

/// Join path elements with `/` and normalize the result.
pub fn join<S: AsRef<str>>(elems: &[S]) -> String {
    let joined = elems
        .iter()
        .map(|e| e.as_ref())
        .filter(|e| !e.is_empty())
        .collect::<Vec<_>>()
        .join("/");
    normalize(&joined)
}

/// Prefix that every key nested under `dir` starts with.
///
/// Empty for the root, `dir/` otherwise.
pub fn child_prefix(dir: &str) -> String {
    if dir.is_empty() {
        String::new()
    } else {
        format!("{dir}/")
    }
}

/// Proper ancestors of a key, nearest first, excluding the root.
///
/// `a/b/c` yields `a/b`, then `a`.
pub fn ancestors(key: &str) -> impl Iterator<Item = &str> {
    let mut rest = key;
    std::iter::from_fn(move || {
        let cut = rest.rfind('/')?;
        rest = &rest[..cut];
        Some(rest)
    })
}

/// The part of `key` below `base`, or `None` if `key` is not under `base`.
///
/// `base` itself maps to the empty string.
pub fn strip_base<'a>(key: &'a str, base: &str) -> Option<&'a str> {
    if base.is_empty() {
        return Some(key);
    }
    if key == base {
        return Some("");
    }
    key.strip_prefix(base)?.strip_prefix('/')
}
