//! Shell-style glob patterns over slash-delimited entry names.
//!
//! Syntax:
//!
//! - `*` matches any run of characters except `/`
//! - `?` matches one character except `/`
//! - `[abc]`, `[a-z]`, `[^a-z]` / `[!a-z]` match a character class
//! - `\x` matches `x` literally
//!
//! A pattern must match the whole name.

use regex::Regex;

use crate::error::{ArchiveError, ArchiveResult};

/// A compiled glob pattern.
#[derive(Debug, Clone)]
pub struct Pattern {
    regex: Regex,
}

impl Pattern {
    /// Compile a glob pattern.
    pub fn new(pattern: &str) -> ArchiveResult<Self> {
        let translated = translate(pattern)?;
        let regex = Regex::new(&translated)
            .map_err(|e| ArchiveError::bad_pattern(pattern, e.to_string()))?;
        Ok(Self { regex })
    }

    /// Returns true if `name` matches the whole pattern.
    pub fn matches(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }
}

/// Escape glob metacharacters so `text` matches only itself.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn translate(pattern: &str) -> ArchiveResult<String> {
    let mut out = String::from("^");
    let mut chars = pattern.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '*' => out.push_str("[^/]*"),
            '?' => out.push_str("[^/]"),
            '\\' => {
                let escaped = chars
                    .next()
                    .ok_or_else(|| ArchiveError::bad_pattern(pattern, "trailing backslash"))?;
                out.push_str(&regex::escape(&escaped.to_string()));
            }
            '[' => {
                out.push('[');
                if matches!(chars.peek(), Some('^') | Some('!')) {
                    chars.next();
                    out.push('^');
                }

                let mut items = 0usize;
                loop {
                    let c = chars
                        .next()
                        .ok_or_else(|| ArchiveError::bad_pattern(pattern, "unterminated class"))?;
                    if c == ']' {
                        if items == 0 {
                            return Err(ArchiveError::bad_pattern(pattern, "empty class"));
                        }
                        break;
                    }

                    let lo = class_char(pattern, c, &mut chars)?;
                    if chars.peek() == Some(&'-') {
                        chars.next();
                        let hi = chars
                            .next()
                            .ok_or_else(|| ArchiveError::bad_pattern(pattern, "unterminated range"))?;
                        let hi = class_char(pattern, hi, &mut chars)?;
                        if hi < lo {
                            return Err(ArchiveError::bad_pattern(pattern, "reversed range"));
                        }
                        out.push_str(&regex::escape(&lo.to_string()));
                        out.push('-');
                        out.push_str(&regex::escape(&hi.to_string()));
                    } else {
                        out.push_str(&regex::escape(&lo.to_string()));
                    }
                    items += 1;
                }
                out.push(']');
            }
            other => out.push_str(&regex::escape(&other.to_string())),
        }
    }

    out.push('$');
    Ok(out)
}

fn class_char(
    pattern: &str,
    c: char,
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
) -> ArchiveResult<char> {
    match c {
        '\\' => chars
            .next()
            .ok_or_else(|| ArchiveError::bad_pattern(pattern, "trailing backslash")),
        '-' | ']' => Err(ArchiveError::bad_pattern(
            pattern,
            format!("unescaped {c:?} in class"),
        )),
        c => Ok(c),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(pattern: &str, name: &str) -> bool {
        Pattern::new(pattern).unwrap().matches(name)
    }

    #[test]
    fn test_star_stops_at_slash() {
        assert!(m("*", "file"));
        assert!(!m("*", "dir/file"));
        assert!(m("dir/*", "dir/file"));
        assert!(!m("dir/*", "dir/sub/file"));
        assert!(m("dir/*/*", "dir/sub/file"));
    }

    #[test]
    fn test_question_and_class() {
        assert!(m("a?c", "abc"));
        assert!(!m("a?c", "a/c"));
        assert!(m("[a-c]x", "bx"));
        assert!(!m("[a-c]x", "dx"));
        assert!(m("[^a-c]x", "dx"));
        assert!(m("[!a-c]x", "dx"));
    }

    #[test]
    fn test_literal_metacharacters() {
        assert!(m("a.b", "a.b"));
        assert!(!m("a.b", "axb"));
        assert!(m("\\*", "*"));
        assert!(!m("\\*", "x"));
    }

    #[test]
    fn test_escape_round_trip() {
        let name = "we[ir]d*name?";
        let pattern = format!("{}/*", escape(name));
        assert!(m(&pattern, "we[ir]d*name?/child"));
        assert!(!m(&pattern, "weid/child"));
    }

    #[test]
    fn test_bad_patterns() {
        assert!(Pattern::new("[abc").is_err());
        assert!(Pattern::new("abc\\").is_err());
        assert!(Pattern::new("[]").is_err());
        assert!(Pattern::new("[z-a]").is_err());
    }
}
