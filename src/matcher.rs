//! Component E — Rule Matcher (spec.md §4.E).

use crate::comment_oracle::scope_matches;
use crate::condition;
use crate::fixbuilder;
use crate::model::Rule;
use crate::problem::{Position, Problem, Range};
use crate::regex_builder::{self, Dialect};
use crate::settings::Settings;
use crate::suppression;

/// §4.E bullet: derive `(lineStart, columnStart, lineEnd, columnEnd)` from a
/// match's absolute byte offsets.
fn compute_range(doc: &str, match_start: usize, match_end: usize) -> Range {
    let prefix = &doc[..match_start];
    let line_start = prefix.matches('\n').count();
    let offset_of_line_start = prefix.rfind('\n').map(|i| i + 1).unwrap_or(0);
    let column_start = match_start - offset_of_line_start;

    let matched = &doc[match_start..match_end];
    let match_len = match_end - match_start;
    let newlines_in_match = matched.matches('\n').count();

    let (line_end, column_end) = if newlines_in_match == 0 {
        (line_start, column_start + match_len)
    } else {
        let last_newline_in_match = matched.rfind('\n').unwrap();
        (line_start + newlines_in_match, match_len - last_newline_in_match - 1)
    };

    Range::new(
        Position::new(line_start, column_start),
        Position::new(line_end, column_end),
    )
}

fn line_text(doc: &str, line_idx: usize) -> &str {
    doc.lines().nth(line_idx).unwrap_or("")
}

/// Drive every applicable rule/pattern over `doc`, consulting the comment
/// oracle, suppression detector and condition evaluator, and emitting
/// candidate problems with fixes attached.
pub fn run(
    rules: &[Rule],
    doc: &str,
    lang_id: &str,
    uri: &str,
    settings: &Settings,
    today: time::Date,
) -> Vec<Problem> {
    let mut problems = Vec::new();

    for rule in rules {
        if settings.ignore_rules_list.iter().any(|id| id == &rule.id) {
            continue;
        }
        if !rule.applies(lang_id, uri) {
            continue;
        }
        if !rule.severity.enabled(settings) {
            continue;
        }

        for pattern in &rule.patterns {
            let Ok(compiled) = regex_builder::build(pattern, Dialect::Analysis) else {
                // MalformedRule: skip the offending pattern, keep scanning
                // the rule's remaining patterns (§7).
                continue;
            };
            let scopes = pattern.effective_scopes();

            let mut cursor = 0usize;
            while let Some((m_start, m_end)) = compiled.find_from(doc, cursor) {
                let range = compute_range(doc, m_start, m_end);
                let suppression_result =
                    suppression::detect(doc, lang_id, m_start, &rule.id, rule.severity, today);

                if !suppression_result.suppressed {
                    let in_scope = scope_matches(&scopes, doc, m_start, lang_id);
                    if in_scope && condition::evaluate(&rule.conditions, doc, range, lang_id) {
                        let matched_text = &doc[m_start..m_end];
                        let mut fixes = fixbuilder::build_fixes(rule, matched_text, range);
                        if let Some(supp_fix) = suppression::suppression_fix_edit(
                            lang_id,
                            range.start.line,
                            line_text(doc, range.start.line),
                            &rule.id,
                        ) {
                            fixes.push(supp_fix);
                        }
                        problems.push(Problem {
                            rule_id: rule.id.clone(),
                            severity: rule.severity,
                            range,
                            message: rule.description.clone(),
                            name: rule.name.clone(),
                            recommendation: rule.recommendation.clone(),
                            rule_info: rule.rule_info.clone(),
                            fixes,
                            overrides: rule.overrides.clone(),
                            suppressed_finding_range: None,
                        });
                    }
                } else if let Some(marker_range) = suppression_result.marker_range {
                    problems.push(Problem {
                        rule_id: rule.id.clone(),
                        severity: crate::model::Severity::WarningInfo,
                        range: marker_range,
                        message: rule.description.clone(),
                        name: rule.name.clone(),
                        recommendation: rule.recommendation.clone(),
                        rule_info: rule.rule_info.clone(),
                        fixes: vec![],
                        overrides: rule.overrides.clone(),
                        suppressed_finding_range: Some(range),
                    });
                }

                cursor = regex_builder::next_cursor(doc, m_start, m_end);
                if cursor > doc.len() {
                    break;
                }
            }
        }
    }

    problems
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Pattern, PatternKind, Severity};
    use std::collections::HashSet;

    fn today() -> time::Date {
        time::Date::from_calendar_date(2026, time::Month::July, 26).unwrap()
    }

    fn simple_rule(id: &str, pattern: &str, kind: PatternKind, scopes: &[crate::model::Scope], severity: Severity) -> Rule {
        Rule {
            id: id.into(),
            name: "n".into(),
            description: "d".into(),
            recommendation: String::new(),
            rule_info: String::new(),
            severity,
            applies_to: vec![],
            overrides: vec![],
            patterns: vec![Pattern {
                kind,
                pattern: pattern.into(),
                modifiers: vec![],
                scopes: scopes.iter().copied().collect::<HashSet<_>>(),
            }],
            conditions: vec![],
            fix_its: vec![],
        }
    }

    #[test]
    fn scenario_1_plain_substring_in_code() {
        let rule = simple_rule("DS1", "strcpy", PatternKind::Substring, &[crate::model::Scope::Code], Severity::Critical);
        let problems = run(&[rule], "strcpy(a,b);\n", "c", "f.c", &Settings::default(), today());
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].range.start, Position::new(0, 0));
        assert_eq!(problems[0].range.end, Position::new(0, 6));
    }

    #[test]
    fn scenario_2_match_inside_comment_code_only_scope() {
        let rule = simple_rule("DS1", "strcpy", PatternKind::Substring, &[crate::model::Scope::Code], Severity::Critical);
        let problems = run(&[rule], "// strcpy(a,b)\n", "c", "f.c", &Settings::default(), today());
        assert!(problems.is_empty());
    }

    #[test]
    fn scenario_3_match_inside_block_comment_scope() {
        let rule = simple_rule("DS1", "TODO", PatternKind::Substring, &[crate::model::Scope::Comment], Severity::BestPractice);
        let mut settings = Settings::default();
        settings.enable_best_practice_rules = true;
        let problems = run(&[rule], "/* TODO use strcpy */\n", "cpp", "f.cpp", &settings, today());
        assert_eq!(problems.len(), 1);
    }

    #[test]
    fn scenario_4_suppression_marker() {
        let rule = simple_rule("DS001", "strcpy", PatternKind::Substring, &[crate::model::Scope::All], Severity::Critical);
        let doc = "strcpy(a,b); // DevSkim: ignore DS001\n";
        let problems = run(&[rule], doc, "c", "f.c", &Settings::default(), today());
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].severity, Severity::WarningInfo);
        assert_eq!(
            problems[0].suppressed_finding_range,
            Some(Range::new(Position::new(0, 0), Position::new(0, 6)))
        );
    }

    #[test]
    fn zero_width_match_advances_cursor() {
        let rule = simple_rule("DS1", "a*", PatternKind::Regex, &[crate::model::Scope::All], Severity::Critical);
        let doc = "bbb";
        let problems = run(&[rule], doc, "c", "f.c", &Settings::default(), today());
        // Must terminate; zero-width matches at each position (including end) are expected.
        assert!(problems.len() >= 3);
    }

    #[test]
    fn zero_width_match_advances_past_multibyte_char_without_dropping_later_matches() {
        // "é" is a 2-byte UTF-8 character; a byte-only advance from a
        // zero-width match just before it would land mid-codepoint and
        // make `find_from` return `None` on the next call, silently
        // terminating the scan before the later `strcpy` match.
        let rule = simple_rule("DS1", "a*", PatternKind::Regex, &[crate::model::Scope::All], Severity::Critical);
        let doc = "bé strcpy";
        let problems = run(&[rule], doc, "c", "f.c", &Settings::default(), today());
        assert!(problems.iter().any(|p| p.range.start == Position::new(0, doc.find("strcpy").unwrap())));
    }

    #[test]
    fn best_practice_rule_gated_off_by_default() {
        let rule = simple_rule("DS1", "TODO", PatternKind::Substring, &[crate::model::Scope::All], Severity::BestPractice);
        let problems = run(&[rule], "TODO\n", "c", "f.c", &Settings::default(), today());
        assert!(problems.is_empty());
    }

    #[test]
    fn ignored_rule_id_is_skipped() {
        let rule = simple_rule("DS1", "strcpy", PatternKind::Substring, &[crate::model::Scope::All], Severity::Critical);
        let mut settings = Settings::default();
        settings.ignore_rules_list.push("DS1".to_string());
        let problems = run(&[rule], "strcpy(a,b);\n", "c", "f.c", &settings, today());
        assert!(problems.is_empty());
    }
}
