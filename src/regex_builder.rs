//! Component B — Regex Builder (spec.md §4.B, dialect design in §9).
//!
//! Two regex dialects share one builder. `Dialect::Analysis` backs rule and
//! condition matching (`fancy-regex`, supports backreferences/lookaround —
//! DevSkim-style security patterns lean on these); `Dialect::Fix` backs fix
//! substitution (plain `regex`, no dot-all support, `$1`-style replacement).

use crate::model::{Pattern, PatternKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Analysis,
    Fix,
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("invalid regex '{pattern}': {source}")]
    Analysis {
        pattern: String,
        #[source]
        source: fancy_regex::Error,
    },
    #[error("invalid regex '{pattern}': {source}")]
    Fix {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// A compiled pattern in one of the two dialects.
pub enum CompiledPattern {
    Analysis(fancy_regex::Regex),
    Fix(regex::Regex),
}

impl CompiledPattern {
    /// Find the first match at or after byte offset `start`. Returns
    /// absolute `(start, end)` byte offsets. Mirrors "global scanning from a
    /// cursor" (§4.B) by always searching the suffix `text[start..]`.
    pub fn find_from(&self, text: &str, start: usize) -> Option<(usize, usize)> {
        if start > text.len() || !text.is_char_boundary(start) {
            return None;
        }
        let hay = &text[start..];
        match self {
            CompiledPattern::Analysis(re) => re
                .find(hay)
                .ok()
                .flatten()
                .map(|m| (start + m.start(), start + m.end())),
            CompiledPattern::Fix(re) => re.find(hay).map(|m| (start + m.start(), start + m.end())),
        }
    }

    /// Substitute the first occurrence within `text` using this pattern's
    /// replacement template. Only meaningful for `Dialect::Fix` patterns,
    /// which is the only case the fix builder invokes this from.
    pub fn replace_first<'a>(&self, text: &'a str, replacement: &str) -> std::borrow::Cow<'a, str> {
        match self {
            CompiledPattern::Fix(re) => re.replacen(text, 1, replacement),
            CompiledPattern::Analysis(_) => std::borrow::Cow::Borrowed(text),
        }
    }
}

/// Advance a scanning cursor past a match, guaranteeing forward progress for
/// zero-width matches (spec.md §4.E/§4.D: "must advance by at least one
/// character to avoid livelock") without landing mid-codepoint. A non-empty
/// match advances to its end as usual; a zero-width match advances to the
/// start of the next `char`, not merely the next byte — `doc[m_start..]`
/// may begin with a multi-byte UTF-8 character, and a byte-only advance
/// would hand `find_from` a non-char-boundary offset, which it rejects with
/// `None`, silently ending the scan.
pub fn next_cursor(doc: &str, m_start: usize, m_end: usize) -> usize {
    if m_end > m_start {
        return m_end;
    }
    doc[m_start..]
        .chars()
        .next()
        .map_or(m_start + 1, |c| m_start + c.len_utf8())
}

/// Drop or translate modifier characters for the target dialect. `d` means
/// "dot matches newline": the analysis dialect maps it to `s` (the flag both
/// `regex` and `fancy-regex` use for the same behavior); the fix dialect has
/// no equivalent and silently drops it.
fn effective_flags(modifiers: &[char], dialect: Dialect) -> String {
    modifiers
        .iter()
        .filter_map(|&c| {
            if c == 'd' {
                match dialect {
                    Dialect::Analysis => Some('s'),
                    Dialect::Fix => None,
                }
            } else {
                Some(c)
            }
        })
        .collect()
}

fn body_for_kind(kind: PatternKind, pattern: &str) -> String {
    match kind {
        PatternKind::Regex => pattern.to_string(),
        PatternKind::RegexWord => format!("\\b{}\\b", pattern),
        PatternKind::String => format!("\\b{}\\b", regex::escape(pattern)),
        PatternKind::Substring => regex::escape(pattern),
    }
}

fn source_for(pattern: &Pattern, dialect: Dialect) -> String {
    let body = body_for_kind(pattern.kind, &pattern.pattern);
    let flags = effective_flags(&pattern.modifiers, dialect);
    if flags.is_empty() {
        body
    } else {
        format!("(?{}){}", flags, body)
    }
}

/// Build a compiled pattern for the given dialect.
pub fn build(pattern: &Pattern, dialect: Dialect) -> Result<CompiledPattern, BuildError> {
    let source = source_for(pattern, dialect);
    match dialect {
        Dialect::Analysis => fancy_regex::Regex::new(&source)
            .map(CompiledPattern::Analysis)
            .map_err(|source_err| BuildError::Analysis {
                pattern: source,
                source: source_err,
            }),
        Dialect::Fix => regex::Regex::new(&source)
            .map(CompiledPattern::Fix)
            .map_err(|source_err| BuildError::Fix {
                pattern: source,
                source: source_err,
            }),
    }
}
