//! Pattern-based source-code security linter engine: rules, conditions,
//! suppression and fix computation (spec.md §1).

pub mod comment_oracle;
pub mod condition;
pub mod diff;
pub mod engine;
pub mod error;
pub mod fixbuilder;
pub mod matcher;
pub mod model;
pub mod overrides;
pub mod problem;
pub mod regex_builder;
pub mod ruleset;
pub mod settings;
pub mod suppression;

pub use engine::{analyze, Engine};
pub use model::{
    Condition, FixTemplate, Pattern, PatternKind, Rule, Scope, SearchIn, Severity,
};
pub use problem::{FixEdit, Position, Problem, Range};
pub use settings::Settings;
