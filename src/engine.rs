//! Component H — Engine Facade (spec.md §4.H, §5 concurrency model).

use std::collections::HashMap;
use std::sync::Mutex;

use crate::matcher;
use crate::model::Rule;
use crate::overrides;
use crate::problem::{FixEdit, Problem, Range};
use crate::settings::Settings;

/// Entry point: filters by workspace-ignore, drives the Rule Matcher, then
/// the Override Resolver. Pure function of its inputs (invariant v) — `today`
/// is threaded through explicitly rather than read from the system clock
/// inside the engine.
pub fn analyze(
    rules: &[Rule],
    doc: &str,
    lang_id: &str,
    uri: &str,
    settings: &Settings,
    today: time::Date,
) -> Vec<Problem> {
    if rules.is_empty() || settings.ignores_uri(uri) {
        return Vec::new();
    }
    let candidates = matcher::run(rules, doc, lang_id, uri, settings, today);
    overrides::resolve(candidates)
}

fn composite_key(range: Range, diagnostic_code: &str) -> String {
    format!(
        "{}:{}:{}:{}:{}",
        range.start.line, range.start.character, range.end.line, range.end.character, diagnostic_code
    )
}

/// Two-level fix-action cache keyed by `(uri, composite-key ++ ordinal)`
/// (spec.md §4.H). The only mutable state the facade owns; guarded for
/// concurrent access across parallel `analyze` calls on different documents
/// (spec.md §5).
#[derive(Default)]
pub struct Engine {
    actions: Mutex<HashMap<String, HashMap<String, FixEdit>>>,
}

impl Engine {
    pub fn new() -> Engine {
        Engine::default()
    }

    /// Store `fix` for later retrieval, defaulting its label to
    /// `"Fix this {ruleId} problem"` when the template supplied an empty
    /// name. `ordinal` is the smallest non-negative integer that avoids a
    /// composite-key collision for this `uri`.
    pub fn record_code_action(&self, uri: &str, range: Range, diagnostic_code: &str, rule_id: &str, mut fix: FixEdit) {
        if fix.label.is_empty() {
            fix.label = format!("Fix this {rule_id} problem");
        }
        let base_key = composite_key(range, diagnostic_code);
        let mut actions = self.actions.lock().unwrap();
        let by_key = actions.entry(uri.to_string()).or_default();

        let mut ordinal = 0usize;
        loop {
            let key = format!("{base_key}#{ordinal}");
            if !by_key.contains_key(&key) {
                by_key.insert(key, fix);
                break;
            }
            ordinal += 1;
        }
    }

    pub fn fix_actions_for(&self, uri: &str) -> Vec<FixEdit> {
        let actions = self.actions.lock().unwrap();
        actions
            .get(uri)
            .map(|by_key| {
                let mut keys: Vec<&String> = by_key.keys().collect();
                keys.sort();
                keys.into_iter().map(|k| by_key[k].clone()).collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Pattern, PatternKind, Severity};
    use crate::problem::Position;
    use std::collections::HashSet;

    fn today() -> time::Date {
        time::Date::from_calendar_date(2026, time::Month::July, 26).unwrap()
    }

    fn rule(id: &str, pattern: &str) -> Rule {
        Rule {
            id: id.into(),
            name: String::new(),
            description: String::new(),
            recommendation: String::new(),
            rule_info: String::new(),
            severity: Severity::Critical,
            applies_to: vec![],
            overrides: vec![],
            patterns: vec![Pattern {
                kind: PatternKind::Substring,
                pattern: pattern.into(),
                modifiers: vec![],
                scopes: HashSet::from([crate::model::Scope::All]),
            }],
            conditions: vec![],
            fix_its: vec![],
        }
    }

    #[test]
    fn empty_rule_set_returns_no_problems() {
        let problems = analyze(&[], "strcpy(a,b);\n", "c", "f.c", &Settings::default(), today());
        assert!(problems.is_empty());
    }

    #[test]
    fn every_emitted_problem_has_a_valid_range() {
        // Invariant (i): every Problem's range lies within the analyzed
        // document, including suppression markers whose range points into
        // the directive comment rather than the live finding.
        let doc = "strcpy(a,b); // DevSkim: ignore DS1\nstrcpy(c,d);\n";
        let problems = analyze(&[rule("DS1", "strcpy")], doc, "c", "f.c", &Settings::default(), today());
        let line_count = doc.lines().count();
        assert!(!problems.is_empty());
        for p in &problems {
            assert!(p.range_is_valid(line_count), "invalid range: {:?}", p.range);
        }
    }

    #[test]
    fn ignored_uri_short_circuits() {
        let mut settings = Settings::default();
        settings.ignore_files_list.push("vendor/**".to_string());
        let problems = analyze(
            &[rule("DS1", "strcpy")],
            "strcpy(a,b);\n",
            "c",
            "vendor/lib.c",
            &settings,
            today(),
        );
        assert!(problems.is_empty());
    }

    #[test]
    fn analyze_runs_matcher_then_overrides() {
        let generic = {
            let mut r = rule("DS-generic-md5", "MD5");
            r.id = "DS-generic-md5".into();
            r
        };
        let mut specific = rule("DS-java-md5", "MD5");
        specific.overrides = vec!["DS-generic-md5".to_string()];

        let problems = analyze(&[generic, specific], "MD5\n", "java", "f.java", &Settings::default(), today());
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].rule_id, "DS-java-md5");
    }

    #[test]
    fn record_code_action_defaults_empty_label() {
        let engine = Engine::new();
        let range = Range::new(Position::new(0, 0), Position::new(0, 6));
        engine.record_code_action(
            "f.c",
            range,
            "DS001",
            "DS001",
            FixEdit {
                label: String::new(),
                range,
                new_text: "strlcpy".into(),
            },
        );
        let actions = engine.fix_actions_for("f.c");
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].label, "Fix this DS001 problem");
    }

    #[test]
    fn record_code_action_avoids_ordinal_collision() {
        let engine = Engine::new();
        let range = Range::new(Position::new(0, 0), Position::new(0, 6));
        for i in 0..3 {
            engine.record_code_action(
                "f.c",
                range,
                "DS001",
                "DS001",
                FixEdit {
                    label: format!("fix {i}"),
                    range,
                    new_text: String::new(),
                },
            );
        }
        let actions = engine.fix_actions_for("f.c");
        assert_eq!(actions.len(), 3);
    }
}
