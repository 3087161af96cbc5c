//! Output types: `Range`, `Problem`, `FixEdit` (spec.md §3 "Problem"/"Range", §6).

use crate::model::Severity;

/// Zero-based line/character position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize)]
pub struct Position {
    pub line: usize,
    pub character: usize,
}

impl Position {
    pub fn new(line: usize, character: usize) -> Position {
        Position { line, character }
    }
}

/// Half-open `start..end` document range, both ends zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(start: Position, end: Position) -> Range {
        Range { start, end }
    }
}

/// A single automatic-fix edit (spec.md §4.G, §6).
#[derive(Debug, Clone, serde::Serialize)]
pub struct FixEdit {
    pub label: String,
    pub range: Range,
    pub new_text: String,
}

/// A finding emitted by the engine (spec.md §3 "Problem").
#[derive(Debug, Clone, serde::Serialize)]
pub struct Problem {
    pub rule_id: String,
    pub severity: Severity,
    pub range: Range,
    pub message: String,
    pub name: String,
    pub recommendation: String,
    pub rule_info: String,
    pub fixes: Vec<FixEdit>,
    /// Rule ids this problem's rule overrides; drained to empty by §4.F.
    pub overrides: Vec<String>,
    /// Present only when this Problem is a suppression marker rather than a
    /// live finding (invariant iv).
    pub suppressed_finding_range: Option<Range>,
}

impl Problem {
    /// Invariant (i): the problem's range must be non-empty-backwards and
    /// within the document's line count. `line_count` is the number of lines
    /// `doc` was split into (at least 1 for a non-empty document).
    pub fn range_is_valid(&self, line_count: usize) -> bool {
        let r = &self.range;
        r.start <= r.end && r.end.line < line_count.max(1)
    }
}
