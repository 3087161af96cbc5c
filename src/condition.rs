//! Component D — Condition Evaluator (spec.md §4.D).

use crate::comment_oracle::scope_matches;
use crate::model::{Condition, SearchIn};
use crate::problem::{Position, Range};
use crate::regex_builder::{self, Dialect};

fn add_clamped(line: usize, delta: i64) -> usize {
    (line as i64 + delta).max(0) as usize
}

/// Offset of the start of `doc`'s `line_idx`-th (zero-based) line. Returns
/// `doc.len()` if the document has fewer lines than `line_idx`.
fn line_start_offset(doc: &str, line_idx: usize) -> usize {
    if line_idx == 0 {
        return 0;
    }
    let mut seen = 0usize;
    for (i, c) in doc.char_indices() {
        if c == '\n' {
            seen += 1;
            if seen == line_idx {
                return i + 1;
            }
        }
    }
    doc.len()
}

fn pos_to_offset(doc: &str, pos: Position) -> usize {
    (line_start_offset(doc, pos.line) + pos.character).min(doc.len())
}

/// §4.D step 1: resolve `(startOffset, endOffset)` from `search_in`.
fn region_for(search_in: SearchIn, doc: &str, finding_range: Range) -> (usize, usize) {
    match search_in {
        SearchIn::FindingOnly => (
            pos_to_offset(doc, finding_range.start),
            pos_to_offset(doc, finding_range.end),
        ),
        SearchIn::LineRange => (
            line_start_offset(doc, finding_range.start.line),
            line_start_offset(doc, finding_range.end.line + 1),
        ),
        SearchIn::FindingRegion(a, b) => {
            let start_line = add_clamped(finding_range.start.line, a);
            let end_line_plus_one = add_clamped(finding_range.end.line, b) + 1;
            (
                line_start_offset(doc, start_line),
                line_start_offset(doc, end_line_plus_one),
            )
        }
    }
}

fn evaluate_one(condition: &Condition, doc: &str, finding_range: Range, lang_id: &str) -> bool {
    let (start_offset, end_offset) = region_for(condition.search_in, doc, finding_range);
    let Ok(compiled) = regex_builder::build(&condition.pattern, Dialect::Analysis) else {
        // MalformedRule: an unbuildable condition pattern can never be
        // satisfied, so the condition (and therefore the rule) does not fire.
        return false;
    };

    let mut cursor = start_offset.min(doc.len());
    let scopes = condition.pattern.effective_scopes();
    let mut found = false;

    loop {
        let Some((m_start, m_end)) = compiled.find_from(doc, cursor) else {
            break;
        };
        if m_start > end_offset {
            break;
        }
        if !scope_matches(&scopes, doc, m_start, lang_id) {
            cursor = regex_builder::next_cursor(doc, m_start, m_end);
            if cursor > doc.len() {
                break;
            }
            continue;
        }
        if condition.negate_finding {
            return false;
        }
        found = true;
        break;
    }

    if condition.negate_finding {
        true
    } else {
        found
    }
}

/// §4.D `evaluate`: every condition must hold; short-circuits on first
/// failure; conditions and their internal matches are both scanned
/// left-to-right as authored.
pub fn evaluate(conditions: &[Condition], doc: &str, finding_range: Range, lang_id: &str) -> bool {
    conditions
        .iter()
        .all(|c| evaluate_one(c, doc, finding_range, lang_id))
}
