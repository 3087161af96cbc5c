//! Component F — Override Resolver (spec.md §4.F).

use std::collections::HashSet;

use crate::problem::Problem;

/// Resolve overrides to a fixed point: while any problem still carries a
/// non-empty `overrides` list, remove every other same-start-position problem
/// whose rule id is named, then clear that list. Implemented as a bounded
/// loop (one `overrides` list is drained to empty per iteration) rather than
/// recursion, per spec.md §9's closure note.
pub fn resolve(mut problems: Vec<Problem>) -> Vec<Problem> {
    loop {
        let Some(idx) = problems.iter().position(|p| !p.overrides.is_empty()) else {
            break;
        };

        let overridden_ids: HashSet<String> = problems[idx].overrides.drain(..).collect();
        let anchor_start = problems[idx]
            .suppressed_finding_range
            .unwrap_or(problems[idx].range)
            .start;

        let mut kept = Vec::with_capacity(problems.len());
        for (i, q) in problems.into_iter().enumerate() {
            let removed = i != idx && overridden_ids.contains(&q.rule_id) && q.range.start == anchor_start;
            if !removed {
                kept.push(q);
            }
        }
        problems = kept;
    }
    problems
}
