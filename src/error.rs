use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RuleWatchError {
    #[error("Cannot read '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("'{path}' exceeds the size limit for analysis")]
    FileTooLarge { path: PathBuf },

    #[error("Cannot parse settings at '{path}': {source}")]
    SettingsParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid settings: {0}")]
    SettingsInvalid(String),

    #[error("Cannot parse rule file '{path}': {source}")]
    RuleParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid rule in '{path}': {reason}")]
    RuleInvalid { path: PathBuf, reason: String },

    #[error("Cannot write output to '{path}': {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, RuleWatchError>;

/// Exit codes for rulewatch.
/// 0  = success (no findings)
/// 1  = I/O error
/// 2  = settings / rule parse error
/// 10 = findings exist (used with --fail)
pub mod exit_code {
    #[allow(dead_code)]
    pub const SUCCESS: i32 = 0;
    pub const IO_ERROR: i32 = 1;
    pub const CONFIG_ERROR: i32 = 2;
    pub const FINDINGS: i32 = 10;
}
