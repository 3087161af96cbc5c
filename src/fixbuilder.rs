//! Component G — Fix Builder (spec.md §4.G).

use crate::model::Rule;
use crate::problem::{FixEdit, Range};
use crate::regex_builder::{self, Dialect};

/// Build fix edits for a single matched finding. Author order is preserved
/// (invariant ii): each template is attempted in the order the rule lists
/// `fixIts`, and a template that fails to build or substitute is silently
/// skipped rather than aborting the rest (spec.md §7).
pub fn build_fixes(rule: &Rule, matched_text: &str, match_range: Range) -> Vec<FixEdit> {
    let mut fixes = Vec::with_capacity(rule.fix_its.len());
    for template in &rule.fix_its {
        let Ok(compiled) = regex_builder::build(&template.pattern, Dialect::Fix) else {
            continue;
        };
        let new_text = compiled.replace_first(matched_text, &template.replacement).into_owned();
        fixes.push(FixEdit {
            label: template.name.clone(),
            range: match_range,
            new_text,
        });
    }
    fixes
}
