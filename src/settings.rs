//! Settings record (spec.md §6), loaded from TOML the way `Config` loads
//! `unai.toml`.

use std::io::Read as _;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Result, RuleWatchError};

/// Settings files larger than this are rejected before parsing.
const MAX_SETTINGS_BYTES: u64 = 1024 * 1024; // 1 MiB

/// Recognized options (spec.md §6 "Settings record").
#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub ignore_files_list: Vec<String>,
    #[serde(default)]
    pub ignore_rules_list: Vec<String>,
    #[serde(default)]
    pub enable_best_practice_rules: bool,
    #[serde(default)]
    pub enable_manual_review_rules: bool,
    /// Consumed by the external loader (`ruleset::load_dir`), not by the
    /// engine itself.
    #[serde(default)]
    pub validate_rules_files: bool,
}

impl Default for Settings {
    fn default() -> Settings {
        Settings {
            ignore_files_list: Vec::new(),
            ignore_rules_list: Vec::new(),
            enable_best_practice_rules: false,
            enable_manual_review_rules: false,
            validate_rules_files: false,
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Settings> {
        let mut file = std::fs::File::open(path).map_err(|source| RuleWatchError::FileRead {
            path: path.into(),
            source,
        })?;
        if file.metadata().map(|m| m.len()).unwrap_or(0) > MAX_SETTINGS_BYTES {
            return Err(RuleWatchError::SettingsInvalid(
                "settings file exceeds 1 MiB size limit".to_string(),
            ));
        }
        let mut content = String::new();
        file.read_to_string(&mut content)
            .map_err(|source| RuleWatchError::FileRead {
                path: path.into(),
                source,
            })?;
        let settings: Settings =
            toml::from_str(&content).map_err(|source| RuleWatchError::SettingsParse {
                path: path.into(),
                source,
            })?;
        Ok(settings)
    }

    pub fn load_from_cwd() -> Result<Option<Settings>> {
        let path = Path::new("rulewatch.toml");
        match Settings::load(path) {
            Ok(settings) => Ok(Some(settings)),
            Err(RuleWatchError::FileRead { source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// §4.H step 1: does `uri` match any of `ignoreFilesList`'s glob patterns?
    pub fn ignores_uri(&self, uri: &str) -> bool {
        self.ignore_files_list.iter().any(|raw_pattern| {
            glob::Pattern::new(raw_pattern)
                .map(|pattern| pattern.matches(uri))
                .unwrap_or(false)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    static CWD_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

    fn write_temp_settings(content: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn defaults_are_all_disabled() {
        let s = Settings::default();
        assert!(!s.enable_best_practice_rules);
        assert!(!s.enable_manual_review_rules);
        assert!(s.ignore_files_list.is_empty());
    }

    #[test]
    fn parse_minimal_settings() {
        let f = write_temp_settings("");
        let s = Settings::load(f.path()).unwrap();
        assert!(s.ignore_rules_list.is_empty());
    }

    #[test]
    fn parse_full_settings() {
        let toml = r#"
ignore_files_list = ["**/*.generated.*", "vendor/**"]
ignore_rules_list = ["DS999"]
enable_best_practice_rules = true
enable_manual_review_rules = true
validate_rules_files = true
"#;
        let f = write_temp_settings(toml);
        let s = Settings::load(f.path()).unwrap();
        assert_eq!(s.ignore_rules_list, vec!["DS999"]);
        assert!(s.enable_best_practice_rules);
        assert!(s.enable_manual_review_rules);
        assert!(s.validate_rules_files);
    }

    #[test]
    fn ignores_uri_matches_glob() {
        let mut s = Settings::default();
        s.ignore_files_list.push("vendor/**".to_string());
        assert!(s.ignores_uri("vendor/lib/thing.c"));
        assert!(!s.ignores_uri("src/thing.c"));
    }

    #[test]
    fn missing_settings_file_returns_none() {
        let _lock = CWD_LOCK.lock().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        let original = std::env::current_dir().unwrap();
        std::env::set_current_dir(tmp.path()).unwrap();
        let result = Settings::load_from_cwd();
        std::env::set_current_dir(original).unwrap();
        assert!(result.unwrap().is_none());
    }

    #[test]
    fn settings_too_large_rejected() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        let data = vec![b'#'; 1024 * 1024 + 1];
        f.write_all(&data).unwrap();
        let err = Settings::load(f.path()).unwrap_err();
        assert!(err.to_string().contains("size limit"));
    }
}
