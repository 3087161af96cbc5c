//! Component A — Comment Oracle (spec.md §4.A, delimiter table in §6).
//!
//! Deliberately an approximation: delimiter scanning, not parsing. Ignores
//! string literals and conditional-compilation constructs, as documented in
//! spec.md §4.A.

use std::collections::HashSet;

use crate::model::Scope;

/// Line/block comment delimiters for a language id. Empty string means "this
/// language has no such comment form".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delimiters {
    pub line: &'static str,
    pub block_open: &'static str,
    pub block_close: &'static str,
}

const NONE: Delimiters = Delimiters {
    line: "",
    block_open: "",
    block_close: "",
};

const C_FAMILY: Delimiters = Delimiters {
    line: "//",
    block_open: "/*",
    block_close: "*/",
};

/// Lower-cases `lang_id` and looks it up in the fixed table from spec.md §6.
pub fn delimiters_for(lang_id: &str) -> Delimiters {
    match lang_id.to_lowercase().as_str() {
        "vb" => Delimiters { line: "'", ..NONE },
        "lua" | "sql" | "tsql" => Delimiters { line: "--", ..NONE },
        "clojure" => Delimiters { line: ";;", ..NONE },
        "yaml" | "shellscript" | "ruby" | "powershell" | "coffeescript" | "python" | "r"
        | "perl" | "perl6" => Delimiters { line: "#", ..NONE },
        "jade" => Delimiters { line: "//-", ..NONE },
        "fsharp" => Delimiters {
            line: "//",
            block_open: "(*",
            block_close: "*)",
        },
        "html" | "xml" => Delimiters {
            block_open: "<!--",
            block_close: "-->",
            ..NONE
        },
        "c" | "cpp" | "csharp" | "groovy" | "php" | "javascript" | "javascriptreact"
        | "typescript" | "typescriptreact" | "java" | "objective-c" | "swift" | "go" | "rust" => {
            C_FAMILY
        }
        _ => NONE,
    }
}

/// Offset of the last `\n` in `prefix`, or -1 (as `isize`) if none.
pub fn last_newline_index(prefix: &str) -> isize {
    match prefix.rfind('\n') {
        Some(i) => i as isize,
        None => -1,
    }
}

fn slice_from(prefix: &str, newline_index: isize) -> &str {
    let start = if newline_index < 0 {
        0
    } else {
        (newline_index as usize) + 1
    };
    &prefix[start..]
}

/// §4.A `isInComment`.
pub fn is_in_comment(prefix: &str, newline_index: isize, only_block: bool, lang_id: &str) -> bool {
    let delims = delimiters_for(lang_id);

    if !only_block && !delims.line.is_empty() {
        let current_line = slice_from(prefix, newline_index);
        if current_line.contains(delims.line) {
            return true;
        }
    }

    if !delims.block_open.is_empty() {
        let last_open = prefix.rfind(delims.block_open);
        let last_close = prefix.rfind(delims.block_close);
        return match (last_open, last_close) {
            (Some(open), Some(close)) => open > close,
            (Some(_), None) => true,
            _ => false,
        };
    }

    false
}

/// §4.A `isWholeLineLineComment`.
pub fn is_whole_line_line_comment(prefix: &str, newline_index: isize, lang_id: &str) -> bool {
    let delims = delimiters_for(lang_id);
    if delims.line.is_empty() {
        return false;
    }
    slice_from(prefix, newline_index).trim_start().starts_with(delims.line)
}

/// §4.A `isWholeLineBlockCommented`.
pub fn is_whole_line_block_commented(prefix: &str, lang_id: &str) -> bool {
    let delims = delimiters_for(lang_id);
    if delims.block_open.is_empty() {
        return false;
    }
    let t = prefix.trim();
    let last_open = t.rfind(delims.block_open);
    let last_close = t.rfind(delims.block_close);
    match (last_open, last_close) {
        (Some(open), Some(close)) => open < close && close == t.len() - delims.block_close.len(),
        _ => false,
    }
}

/// Shared scope test used by both the Rule Matcher (§4.E) and the Condition
/// Evaluator (§4.D): with `docPrefix = doc[0:matchOffset]`, a match is in
/// scope if `scopes` contains `"all"`, or if it contains `"code"`/`"comment"`
/// consistently with whether the offset is inside a comment.
pub fn scope_matches(scopes: &HashSet<Scope>, doc: &str, match_offset: usize, lang_id: &str) -> bool {
    if scopes.contains(&Scope::All) {
        return true;
    }
    let prefix = &doc[..match_offset.min(doc.len())];
    let newline_index = last_newline_index(prefix);
    let in_comment = is_in_comment(prefix, newline_index, false, lang_id);
    (scopes.contains(&Scope::Code) && !in_comment) || (scopes.contains(&Scope::Comment) && in_comment)
}
