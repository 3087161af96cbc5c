//! Rule/pattern/condition/fix data model (spec.md §3).

use std::collections::HashSet;

use serde::Deserialize;

/// Severity level of a rule, and by extension of the findings it produces.
///
/// Ordering matters for settings gating: `Critical`, `Important` and
/// `Moderate` are unconditionally enabled; `BestPractice` and `ManualReview`
/// are gated by settings flags; `WarningInfo` is reserved for suppression
/// markers and never assigned to an authored rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Severity {
    Critical,
    Important,
    Moderate,
    BestPractice,
    ManualReview,
    WarningInfo,
}

impl Severity {
    /// Case-insensitive mapping from a rule's raw `severity` string.
    /// Unknown strings map to `BestPractice` (§4.E step 3).
    pub fn parse(raw: &str) -> Severity {
        match raw.to_lowercase().as_str() {
            "critical" => Severity::Critical,
            "important" => Severity::Important,
            "moderate" => Severity::Moderate,
            "best-practice" | "bestpractice" | "best_practice" => Severity::BestPractice,
            "manual-review" | "manualreview" | "manual_review" => Severity::ManualReview,
            "warning-info" | "warninginfo" | "warning_info" => Severity::WarningInfo,
            _ => Severity::BestPractice,
        }
    }

    /// Whether a rule at this severity is enabled under the given settings.
    pub fn enabled(&self, settings: &crate::settings::Settings) -> bool {
        match self {
            Severity::Critical | Severity::Important | Severity::Moderate => true,
            Severity::BestPractice => settings.enable_best_practice_rules,
            Severity::ManualReview => settings.enable_manual_review_rules,
            // A rule is never authored at WarningInfo; treat as always-on so a
            // malformed rule file doesn't silently vanish.
            Severity::WarningInfo => true,
        }
    }
}

/// Lexical scope a pattern is permitted to match in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Code,
    Comment,
    All,
}

impl Scope {
    fn parse(raw: &str) -> Option<Scope> {
        match raw.to_lowercase().as_str() {
            "code" => Some(Scope::Code),
            "comment" => Some(Scope::Comment),
            "all" => Some(Scope::All),
            _ => None,
        }
    }
}

/// `kind` discriminant for a [`Pattern`] (spec.md §3, §4.B).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    Regex,
    RegexWord,
    String,
    Substring,
}

impl PatternKind {
    fn parse(raw: &str) -> PatternKind {
        match raw.to_lowercase().as_str() {
            "regex-word" => PatternKind::RegexWord,
            "string" => PatternKind::String,
            "substring" => PatternKind::Substring,
            _ => PatternKind::Regex,
        }
    }
}

/// A single match pattern: a regex dialect, its raw source, flags, and the
/// lexical scopes it is permitted to fire in.
#[derive(Debug, Clone)]
pub struct Pattern {
    pub kind: PatternKind,
    pub pattern: String,
    pub modifiers: Vec<char>,
    pub scopes: HashSet<Scope>,
}

impl Pattern {
    /// Empty `scopes` defaults to `{all}` (§3 Pattern, §4.E "Scope test").
    pub fn effective_scopes(&self) -> HashSet<Scope> {
        if self.scopes.is_empty() {
            let mut s = HashSet::with_capacity(1);
            s.insert(Scope::All);
            s
        } else {
            self.scopes.clone()
        }
    }
}

/// Where a [`Condition`]'s region is anchored relative to the finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchIn {
    /// Unset, truthy, or an unrecognized token — the finding's line range.
    LineRange,
    /// `"finding-only"` — the finding's exact character range.
    FindingOnly,
    /// `finding-region(dStart, dEnd)`.
    FindingRegion(i64, i64),
}

impl SearchIn {
    /// Parse the raw `search_in` token. Explicit `finding-only` /
    /// `finding-region(a,b)` forms take precedence over the generic
    /// "anything truthy means line range" fallback (resolves the Open
    /// Question in spec.md §9).
    pub fn parse(raw: Option<&str>) -> SearchIn {
        let Some(raw) = raw else { return SearchIn::LineRange };
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("finding-only") {
            return SearchIn::FindingOnly;
        }
        if let Some(inner) = trimmed
            .strip_prefix("finding-region(")
            .and_then(|s| s.strip_suffix(')'))
        {
            let mut parts = inner.split(',').map(str::trim);
            if let (Some(a), Some(b)) = (parts.next(), parts.next()) {
                if let (Ok(a), Ok(b)) = (a.parse::<i64>(), b.parse::<i64>()) {
                    return SearchIn::FindingRegion(a, b);
                }
            }
        }
        SearchIn::LineRange
    }
}

/// A secondary pattern that must (or must not) match in a region relative to
/// the candidate finding for it to be emitted (spec.md §4.D).
#[derive(Debug, Clone)]
pub struct Condition {
    pub pattern: Pattern,
    pub search_in: SearchIn,
    pub negate_finding: bool,
}

/// An automatic-fix template: a secondary pattern matched against the
/// finding's exact substring, plus a substitution template (spec.md §4.G).
#[derive(Debug, Clone)]
pub struct FixTemplate {
    pub name: String,
    pub pattern: Pattern,
    pub replacement: String,
}

/// A loaded, validated rule (spec.md §3 "Rule").
#[derive(Debug, Clone)]
pub struct Rule {
    pub id: String,
    pub name: String,
    pub description: String,
    pub recommendation: String,
    pub rule_info: String,
    pub severity: Severity,
    pub applies_to: Vec<String>,
    pub overrides: Vec<String>,
    pub patterns: Vec<Pattern>,
    pub conditions: Vec<Condition>,
    pub fix_its: Vec<FixTemplate>,
}

impl Rule {
    /// §4.E step 2: applies if `appliesTo` is empty, matches `langID`
    /// case-insensitively, or is a filename-fragment substring of `uri`
    /// (a filename-fragment entry is identified by containing a dot).
    pub fn applies(&self, lang_id: &str, uri: &str) -> bool {
        if self.applies_to.is_empty() {
            return true;
        }
        self.applies_to.iter().any(|entry| {
            if entry.contains('.') {
                uri.contains(entry.as_str())
            } else {
                entry.eq_ignore_ascii_case(lang_id)
            }
        })
    }
}

// --- on-disk JSON rule file shape (consumed by `ruleset::load_dir`) ---

#[derive(Debug, Deserialize)]
pub struct RuleFile {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub recommendation: String,
    #[serde(default, rename = "ruleInfo")]
    pub rule_info: String,
    pub severity: String,
    #[serde(default, rename = "appliesTo")]
    pub applies_to: Vec<String>,
    #[serde(default)]
    pub overrides: Vec<String>,
    pub patterns: Vec<PatternFile>,
    #[serde(default)]
    pub conditions: Vec<ConditionFile>,
    #[serde(default, rename = "fixIts")]
    pub fix_its: Vec<FixItFile>,
}

#[derive(Debug, Deserialize)]
pub struct PatternFile {
    #[serde(default = "default_kind")]
    pub kind: String,
    pub pattern: String,
    #[serde(default)]
    pub modifiers: String,
    #[serde(default)]
    pub scopes: Vec<String>,
}

fn default_kind() -> String {
    "regex".to_string()
}

#[derive(Debug, Deserialize)]
pub struct ConditionFile {
    pub pattern: PatternFile,
    #[serde(default, rename = "search_in")]
    pub search_in: Option<String>,
    #[serde(default, rename = "negateFinding")]
    pub negate_finding: bool,
}

#[derive(Debug, Deserialize)]
pub struct FixItFile {
    #[serde(default)]
    pub name: String,
    pub pattern: PatternFile,
    pub replacement: String,
}

impl PatternFile {
    pub(crate) fn into_pattern(self) -> Pattern {
        let scopes: HashSet<Scope> = self
            .scopes
            .iter()
            .filter_map(|s| Scope::parse(s))
            .collect();
        Pattern {
            kind: PatternKind::parse(&self.kind),
            pattern: self.pattern,
            modifiers: self.modifiers.chars().collect(),
            scopes,
        }
    }
}

impl RuleFile {
    /// Convert a parsed rule file into a [`Rule`], never failing on its own —
    /// callers that need regex validation should attempt to build each
    /// pattern with [`crate::regex_builder`] first.
    pub(crate) fn into_rule(self) -> Rule {
        Rule {
            id: self.id,
            name: self.name,
            description: self.description,
            recommendation: self.recommendation,
            rule_info: self.rule_info,
            severity: Severity::parse(&self.severity),
            applies_to: self.applies_to,
            overrides: self.overrides,
            patterns: self.patterns.into_iter().map(PatternFile::into_pattern).collect(),
            conditions: self
                .conditions
                .into_iter()
                .map(|c| Condition {
                    pattern: c.pattern.into_pattern(),
                    search_in: SearchIn::parse(c.search_in.as_deref()),
                    negate_finding: c.negate_finding,
                })
                .collect(),
            fix_its: self
                .fix_its
                .into_iter()
                .map(|f| FixTemplate {
                    name: f.name,
                    pattern: f.pattern.into_pattern(),
                    replacement: f.replacement,
                })
                .collect(),
        }
    }
}
