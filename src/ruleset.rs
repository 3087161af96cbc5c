//! Rule-set loading/validation from a directory of JSON rule files.
//!
//! This is explicitly the "external loader" spec.md places out of scope for
//! the engine itself (§1), generalized from `Config::load`'s single-TOML-file
//! shape (size cap, one validation pass, typed error variants) to many JSON
//! rule files.

use std::io::Read as _;
use std::path::Path;

use crate::error::{Result, RuleWatchError};
use crate::model::{Rule, RuleFile};
use crate::regex_builder::{self, Dialect};

/// Rule files larger than this are rejected before parsing.
const MAX_RULE_FILE_BYTES: u64 = 1024 * 1024; // 1 MiB

fn read_capped(path: &Path) -> Result<String> {
    let mut file = std::fs::File::open(path).map_err(|source| RuleWatchError::FileRead {
        path: path.into(),
        source,
    })?;
    if file.metadata().map(|m| m.len()).unwrap_or(0) > MAX_RULE_FILE_BYTES {
        return Err(RuleWatchError::RuleInvalid {
            path: path.into(),
            reason: "rule file exceeds 1 MiB size limit".to_string(),
        });
    }
    let mut content = String::new();
    file.read_to_string(&mut content)
        .map_err(|source| RuleWatchError::FileRead {
            path: path.into(),
            source,
        })?;
    Ok(content)
}

/// Validate that every regex-bearing part of `rule` compiles: patterns and
/// conditions under the analysis dialect, fix templates under the fix
/// dialect. Consumes `settings.validateRulesFiles` (spec.md §6).
fn validate(rule: &Rule, path: &Path) -> Result<()> {
    for pattern in &rule.patterns {
        if let Err(e) = regex_builder::build(pattern, Dialect::Analysis) {
            return Err(RuleWatchError::RuleInvalid {
                path: path.into(),
                reason: format!("rule '{}': {e}", rule.id),
            });
        }
    }
    for condition in &rule.conditions {
        if let Err(e) = regex_builder::build(&condition.pattern, Dialect::Analysis) {
            return Err(RuleWatchError::RuleInvalid {
                path: path.into(),
                reason: format!("rule '{}' condition: {e}", rule.id),
            });
        }
    }
    for fix_it in &rule.fix_its {
        if let Err(e) = regex_builder::build(&fix_it.pattern, Dialect::Fix) {
            return Err(RuleWatchError::RuleInvalid {
                path: path.into(),
                reason: format!("rule '{}' fixIt '{}': {e}", rule.id, fix_it.name),
            });
        }
    }
    if rule.patterns.is_empty() {
        return Err(RuleWatchError::RuleInvalid {
            path: path.into(),
            reason: format!("rule '{}' has no patterns", rule.id),
        });
    }
    Ok(())
}

/// Load every `*.json` rule file directly under `dir`, in directory-listing
/// order (sorted by filename for determinism). When `validate` is true, each
/// rule's patterns/conditions/fixIts must compile or the whole load fails;
/// when false, a malformed individual pattern is tolerated here and left for
/// the Rule Matcher to skip at scan time (spec.md §7 MalformedRule).
pub fn load_dir(dir: &Path, validate_files: bool) -> Result<Vec<Rule>> {
    let mut entries: Vec<_> = std::fs::read_dir(dir)
        .map_err(|source| RuleWatchError::FileRead {
            path: dir.into(),
            source,
        })?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("json"))
        .collect();
    entries.sort();

    let mut rules = Vec::with_capacity(entries.len());
    for path in entries {
        let content = read_capped(&path)?;
        let rule_file: RuleFile =
            serde_json::from_str(&content).map_err(|source| RuleWatchError::RuleParse {
                path: path.clone(),
                source,
            })?;
        let rule = rule_file.into_rule();
        if validate_files {
            validate(&rule, &path)?;
        }
        rules.push(rule);
    }
    Ok(rules)
}
