//! Component C — Suppression Detector (spec.md §4.C), plus the
//! suppression-authoring fix edit spec.md §4.E references as an "external
//! collaborator" (supplemented in SPEC_FULL.md §4).
//!
//! The directive grammar is the external contract from spec.md §6:
//! `<keyword>: ignore <id-list>` or `<keyword>: ignore <id-list> until
//! <YYYY-MM-DD>`, with `reviewed` substituting for `ignore` on
//! ManualReview-severity rules.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::comment_oracle::{self, Delimiters};
use crate::model::Severity;
use crate::problem::{Position, Range};

/// Keyword prefix recognized in directive comments.
const DIRECTIVE_KEYWORD: &str = "DevSkim";

// Matched separately from the id-list/until-date tail: an id list like
// `DS001 until` would let a single greedy capture group swallow the `until
// <date>` suffix as if it were another id (both are bare word characters),
// which would silently defeat expiration. Parsing the keyword head and the
// tail in two passes keeps the two unambiguous.
static DIRECTIVE_HEAD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)devskim\s*:\s*(ignore|reviewed)\b").expect("directive regex is a fixed literal")
});

static UNTIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\buntil\s+(\d{4}-\d{2}-\d{2})").expect("until regex is a fixed literal")
});

/// Result of a suppression lookup at a candidate finding offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuppressionResult {
    pub suppressed: bool,
    /// Range of the rule id (or the directive anchor, if the directive
    /// applies to all rules on the line) inside the comment, for building the
    /// WarningInfo marker (spec.md §4.E). `None` when not suppressed, or when
    /// suppressed but the directive's exact column could not be located.
    pub marker_range: Option<Range>,
}

const NOT_SUPPRESSED: SuppressionResult = SuppressionResult {
    suppressed: false,
    marker_range: None,
};

/// Region of physical lines that make up the candidate comment: either the
/// single line carrying a line-comment, or the span of a block comment that
/// covers the finding's line.
fn candidate_region(lines: &[&str], lang_id: &str, finding_line: usize, delims: Delimiters) -> Option<(usize, usize)> {
    if !delims.line.is_empty() && lines[finding_line].contains(delims.line) {
        return Some((finding_line, finding_line));
    }

    // "immediately before the finding's line" (spec.md §4.C/§6): a standalone
    // line-comment on the previous line also anchors a directive.
    if !delims.line.is_empty() && finding_line > 0 {
        let prev = finding_line - 1;
        if lines[prev].trim_start().starts_with(delims.line) {
            return Some((prev, prev));
        }
    }

    if delims.block_open.is_empty() {
        return None;
    }

    // Same idea for a block comment that opens and closes entirely on the
    // previous line: by the finding's line it's already closed, so the
    // "still inside an open block" check below never sees it.
    if finding_line > 0 {
        let prev = finding_line - 1;
        let trimmed = lines[prev].trim_start();
        if trimmed.starts_with(delims.block_open) && lines[prev].contains(delims.block_close) {
            return Some((prev, prev));
        }
    }

    if lines[finding_line].contains(delims.block_open) {
        let closer = ((finding_line)..lines.len())
            .find(|&li| lines[li].contains(delims.block_close))
            .unwrap_or(finding_line);
        return Some((finding_line, closer));
    }

    // Is the start of the finding's line already inside an open block comment?
    let prefix_before_line: String = lines[..finding_line].join("\n");
    let prefix_before_line = if finding_line == 0 {
        String::new()
    } else {
        prefix_before_line + "\n"
    };
    let newline_index = comment_oracle::last_newline_index(&prefix_before_line);
    if !comment_oracle::is_in_comment(&prefix_before_line, newline_index, true, lang_id) {
        return None;
    }

    let owner = (0..=finding_line)
        .rev()
        .find(|&li| lines[li].contains(delims.block_open))?;
    let closer = ((owner)..lines.len())
        .find(|&li| lines[li].contains(delims.block_close))
        .unwrap_or(finding_line.max(owner));
    Some((owner, closer))
}

/// Build the joined region text plus a per-line starting offset table so a
/// match inside the joined text can be mapped back to `(line, column)`.
fn join_region(lines: &[&str], region: (usize, usize)) -> (String, Vec<(usize, usize)>) {
    let (start, end) = region;
    let mut text = String::new();
    let mut offsets = Vec::new();
    for li in start..=end {
        offsets.push((li, text.len()));
        text.push_str(lines[li]);
        text.push('\n');
    }
    (text, offsets)
}

fn offset_to_line_col(offsets: &[(usize, usize)], lines: &[&str], abs: usize) -> (usize, usize) {
    let mut chosen = offsets[0];
    for &(li, start) in offsets {
        if start <= abs {
            chosen = (li, start);
        } else {
            break;
        }
    }
    let col = abs - chosen.1;
    let col = col.min(lines[chosen.0].len());
    (chosen.0, col)
}

fn is_expired(until: &str, today: time::Date) -> bool {
    let format = time::macros::format_description!("[year]-[month]-[day]");
    match time::Date::parse(until, &format) {
        Ok(date) => date < today,
        // Malformed date: be lenient, treat the directive as still active.
        Err(_) => false,
    }
}

/// §4.C `detect`. `today` is injected so the caller controls what "now" means
/// (invariant v: the engine is a pure function of its inputs).
pub fn detect(
    doc: &str,
    lang_id: &str,
    offset: usize,
    rule_id: &str,
    severity: Severity,
    today: time::Date,
) -> SuppressionResult {
    let delims = comment_oracle::delimiters_for(lang_id);
    if delims.line.is_empty() && delims.block_open.is_empty() {
        return NOT_SUPPRESSED;
    }

    let lines: Vec<&str> = doc.lines().collect();
    if lines.is_empty() {
        return NOT_SUPPRESSED;
    }
    let finding_line = doc[..offset.min(doc.len())].matches('\n').count().min(lines.len() - 1);

    let Some(region) = candidate_region(&lines, lang_id, finding_line, delims) else {
        return NOT_SUPPRESSED;
    };
    let (mut text, offsets) = join_region(&lines, region);

    // Truncate at the block close marker so an id-list match doesn't run
    // past the comment into code.
    if !delims.block_close.is_empty() {
        if let Some(close_pos) = text.find(delims.block_close) {
            text.truncate(close_pos);
        }
    }

    for head in DIRECTIVE_HEAD_RE.captures_iter(&text) {
        let keyword = head.get(1).unwrap().as_str().to_lowercase();
        let applies_to_severity = match keyword.as_str() {
            "ignore" => true,
            "reviewed" => severity == Severity::ManualReview,
            _ => false,
        };
        if !applies_to_severity {
            continue;
        }

        let head_end = head.get(0).unwrap().end();
        let line_end = text[head_end..].find('\n').map(|i| head_end + i).unwrap_or(text.len());
        let tail = &text[head_end..line_end];

        // Split the tail into the id-list portion and an optional `until
        // <date>` suffix. Searching for `until` first (rather than one
        // combined capture group) keeps a bare id like `DS001` from ever
        // being confused with the expiration keyword.
        let (id_list_span, until_date) = match UNTIL_RE.captures(tail) {
            Some(m) => {
                let whole = m.get(0).unwrap();
                (&tail[..whole.start()], Some(m.get(1).unwrap().as_str()))
            }
            None => (tail, None),
        };

        if let Some(until) = until_date {
            if is_expired(until, today) {
                continue;
            }
        }

        let id_list_match = {
            let trimmed = id_list_span.trim();
            if trimmed.is_empty() {
                None
            } else {
                let local_start = id_list_span.len() - id_list_span.trim_start().len();
                Some((head_end + local_start, trimmed))
            }
        };
        let ids_applicable = match id_list_match {
            None => true,
            Some((_, ids)) => ids
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|s| !s.is_empty())
                .any(|id| id.eq_ignore_ascii_case(rule_id)),
        };
        if !ids_applicable {
            continue;
        }

        let (anchor_start, anchor_end) = match id_list_match {
            Some((abs_start, ids)) => {
                let local = ids.to_lowercase().find(&rule_id.to_lowercase()).unwrap_or(0);
                (abs_start + local, abs_start + local + rule_id.len())
            }
            None => (head_end, head_end),
        };

        let (start_line, start_col) = offset_to_line_col(&offsets, &lines, anchor_start);
        let (end_line, end_col) = offset_to_line_col(&offsets, &lines, anchor_end);
        return SuppressionResult {
            suppressed: true,
            marker_range: Some(Range::new(
                Position::new(start_line, start_col),
                Position::new(end_line, end_col),
            )),
        };
    }

    NOT_SUPPRESSED
}

/// Synthesize the fix edit that authors a suppression directive at the end
/// of the finding's line (spec.md §4.E's "suppression-authoring fixes").
pub fn suppression_fix_edit(lang_id: &str, finding_line: usize, line_text: &str, rule_id: &str) -> Option<crate::problem::FixEdit> {
    let delims = comment_oracle::delimiters_for(lang_id);
    if delims.line.is_empty() && delims.block_open.is_empty() {
        return None;
    }
    let directive = format!("{}: ignore {}", DIRECTIVE_KEYWORD, rule_id);
    let new_text = if !delims.line.is_empty() {
        format!(" {} {}", delims.line, directive)
    } else {
        format!(" {} {} {}", delims.block_open, directive, delims.block_close)
    };
    let end_col = line_text.len();
    Some(crate::problem::FixEdit {
        label: format!("Suppress this {} finding", rule_id),
        range: Range::new(
            Position::new(finding_line, end_col),
            Position::new(finding_line, end_col),
        ),
        new_text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> time::Date {
        time::Date::from_calendar_date(2026, time::Month::July, 26).unwrap()
    }

    #[test]
    fn line_comment_directive_suppresses_matching_id() {
        let doc = "strcpy(a,b); // DevSkim: ignore DS001\n";
        let offset = doc.find("strcpy").unwrap();
        let result = detect(doc, "c", offset, "DS001", Severity::Critical, today());
        assert!(result.suppressed);
        let r = result.marker_range.unwrap();
        assert_eq!(r.start.line, 0);
    }

    #[test]
    fn directive_on_preceding_standalone_comment_line_suppresses() {
        let doc = "// DevSkim: ignore DS001\nstrcpy(a,b);\n";
        let offset = doc.find("strcpy").unwrap();
        let result = detect(doc, "c", offset, "DS001", Severity::Critical, today());
        assert!(result.suppressed);
        let r = result.marker_range.unwrap();
        assert_eq!(r.start.line, 0);
    }

    #[test]
    fn directive_in_self_contained_block_comment_on_preceding_line_suppresses() {
        let doc = "/* DevSkim: ignore DS001 */\nstrcpy(a,b);\n";
        let offset = doc.find("strcpy").unwrap();
        let result = detect(doc, "cpp", offset, "DS001", Severity::Critical, today());
        assert!(result.suppressed);
        let r = result.marker_range.unwrap();
        assert_eq!(r.start.line, 0);
    }

    #[test]
    fn directive_without_id_list_suppresses_all_rules() {
        let doc = "strcpy(a,b); // DevSkim: ignore\n";
        let offset = doc.find("strcpy").unwrap();
        let result = detect(doc, "c", offset, "DS999", Severity::Critical, today());
        assert!(result.suppressed);
    }

    #[test]
    fn directive_with_other_id_does_not_suppress() {
        let doc = "strcpy(a,b); // DevSkim: ignore DS999\n";
        let offset = doc.find("strcpy").unwrap();
        let result = detect(doc, "c", offset, "DS001", Severity::Critical, today());
        assert!(!result.suppressed);
    }

    #[test]
    fn reviewed_only_suppresses_manual_review_severity() {
        let doc = "strcpy(a,b); // DevSkim: reviewed DS001\n";
        let offset = doc.find("strcpy").unwrap();
        assert!(!detect(doc, "c", offset, "DS001", Severity::Critical, today()).suppressed);
        assert!(detect(doc, "c", offset, "DS001", Severity::ManualReview, today()).suppressed);
    }

    #[test]
    fn expired_until_does_not_suppress() {
        let doc = "strcpy(a,b); // DevSkim: ignore DS001 until 2020-01-01\n";
        let offset = doc.find("strcpy").unwrap();
        assert!(!detect(doc, "c", offset, "DS001", Severity::Critical, today()).suppressed);
    }

    #[test]
    fn future_until_still_suppresses() {
        let doc = "strcpy(a,b); // DevSkim: ignore DS001 until 2099-01-01\n";
        let offset = doc.find("strcpy").unwrap();
        assert!(detect(doc, "c", offset, "DS001", Severity::Critical, today()).suppressed);
    }

    #[test]
    fn no_directive_comment_not_suppressed() {
        let doc = "strcpy(a,b);\n";
        let offset = doc.find("strcpy").unwrap();
        assert!(!detect(doc, "c", offset, "DS001", Severity::Critical, today()).suppressed);
    }

    #[test]
    fn block_comment_directive_suppresses() {
        let doc = "strcpy(a,b); /* DevSkim: ignore DS001 */\n";
        let offset = doc.find("strcpy").unwrap();
        assert!(detect(doc, "cpp", offset, "DS001", Severity::Critical, today()).suppressed);
    }

    #[test]
    fn fix_edit_authors_correct_comment_form() {
        let edit = suppression_fix_edit("c", 0, "strcpy(a,b);", "DS001").unwrap();
        assert!(edit.new_text.contains("// DevSkim: ignore DS001"));
    }

    #[test]
    fn fix_edit_none_for_language_without_comments() {
        assert!(suppression_fix_edit("plaintext", 0, "x", "DS001").is_none());
    }
}
