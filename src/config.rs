use std::{
    collections::HashMap,
    env, fs,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, bail, Context, Result};
use glob::Pattern;
use log::{debug, warn};

use crate::{
    errors::LintLevel,
    rules::{RuleRegistry, RuleSettings},
};

const IGNORE_GLOBS_KEY: &str = "ignore_patterns";
const LEVEL_KEY: &str = "level";

/// Directory that relative `ignore_patterns` resolve against. `None` means
/// the current directory.
#[derive(Debug, Clone)]
pub struct ConfigDir(pub Option<PathBuf>);

#[derive(Debug, Default)]
pub struct Config {
    pub(crate) rule_registry: RuleRegistry,
    pub(crate) rule_specific_settings: HashMap<String, RuleSettings>,
    ignore_globs: Vec<Pattern>,
}

/// A top-level config key, sorted by what it configures.
#[derive(Debug)]
enum ConfigEntry {
    IgnorePatterns(Vec<toml::Value>),
    DisabledRule(String),
    RuleTable(String, toml::Table),
}

impl ConfigEntry {
    fn classify(key: String, value: toml::Value) -> Result<Option<Self>> {
        if key == IGNORE_GLOBS_KEY {
            return match value {
                toml::Value::Array(globs) => Ok(Some(Self::IgnorePatterns(globs))),
                other => bail!("{IGNORE_GLOBS_KEY} must be an array of globs, found {other}"),
            };
        }

        if !RuleRegistry::is_valid_rule(&key) {
            warn!("Ignoring unknown config key {key}");
            return Ok(None);
        }

        match value {
            toml::Value::Boolean(false) => Ok(Some(Self::DisabledRule(key))),
            toml::Value::Boolean(true) => Ok(None),
            toml::Value::Table(table) => Ok(Some(Self::RuleTable(key, table))),
            other => bail!("[{key}] must be a table of settings or false, found {other}"),
        }
    }
}

impl Config {
    /// Read the rule configuration from a TOML file.
    ///
    /// Each rule is configured by a table named after the rule. Besides the
    /// rule's own count settings, a table may set `level` to `"error"` or
    /// `"warning"`. A rule set to `false` is turned off, and a rule's table
    /// can live in a separate file pulled in with `include()`.
    ///
    /// Example:
    ///
    /// ```toml
    /// ignore_patterns = ["vendor/**"]
    ///
    /// [Rule001BraceSpacing]
    /// level = "warning"
    /// empty_lines_after_opening_brace = 1
    /// empty_lines_before_closing_brace = "1"
    ///
    /// Rule002MethodSpacing = "include('method_spacing.toml')"
    /// ```
    pub fn from_config_file<P: AsRef<Path>>(config_file: P) -> Result<Self> {
        let config_path = config_file.as_ref();
        let config_dir = config_path
            .parent()
            .ok_or_else(|| anyhow!("Config file {config_path:?} has no parent directory"))?;

        let content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file {config_path:?}"))?;
        let table: toml::Table = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {config_path:?}"))?;
        let table = resolve_includes(table, config_dir)?;

        Self::from_serializable(table, &ConfigDir(Some(config_dir.to_path_buf())))
    }

    /// Builds a config from any value that serializes to a table shaped like
    /// the TOML file. Rule settings are checked here, so a config that loads
    /// also sets up.
    pub fn from_serializable<T: serde::Serialize>(
        config: T,
        config_dir: &ConfigDir,
    ) -> Result<Self> {
        let toml::Value::Table(table) = toml::Value::try_from(config)? else {
            bail!("Invalid configuration. Must be serializable to a table.");
        };
        let root_dir = match &config_dir.0 {
            Some(dir) => dir.clone(),
            None => env::current_dir()?,
        };

        let mut config = Self::default();
        for (key, value) in table {
            match ConfigEntry::classify(key, value)? {
                Some(ConfigEntry::IgnorePatterns(globs)) => {
                    for glob in globs {
                        config.ignore_globs.push(ignore_pattern(&glob, &root_dir)?);
                    }
                }
                Some(ConfigEntry::DisabledRule(rule_name)) => {
                    debug!("Rule {rule_name} is turned off");
                    config.rule_registry.deactivate_rule(&rule_name);
                }
                Some(ConfigEntry::RuleTable(rule_name, table)) => {
                    let (level, settings) = read_rule_table(&rule_name, table)?;
                    if let Some(level) = level {
                        config.rule_registry.save_configured_level(&rule_name, level);
                    }
                    config.rule_specific_settings.insert(rule_name, settings);
                }
                None => {}
            }
        }

        Ok(config)
    }

    pub fn is_ignored(&self, path: &Path) -> bool {
        if self.ignore_globs.is_empty() {
            return false;
        }

        let path = match env::current_dir() {
            Ok(current_dir) if path.is_relative() => current_dir.join(path),
            _ => path.to_path_buf(),
        };
        match self
            .ignore_globs
            .iter()
            .find(|pattern| pattern.matches_path(&path))
        {
            Some(pattern) => {
                debug!("{path:?} matches ignore pattern {}", pattern.as_str());
                true
            }
            None => false,
        }
    }
}

/// Replaces `Rule = "include('file.toml')"` entries with the parsed file,
/// resolved against `base_dir`.
fn resolve_includes(table: toml::Table, base_dir: &Path) -> Result<toml::Table> {
    table
        .into_iter()
        .map(|(key, value)| {
            let Some(include) = include_target(&value).map(str::to_string) else {
                return Ok((key, value));
            };

            let include_path = base_dir.join(include);
            let content = fs::read_to_string(&include_path)
                .with_context(|| format!("Failed to read [{key}] include {include_path:?}"))?;
            let included: toml::Table = toml::from_str(&content)
                .with_context(|| format!("Failed to parse [{key}] include {include_path:?}"))?;
            debug!("Loaded [{key}] from {include_path:?}");
            Ok((key, toml::Value::Table(included)))
        })
        .collect()
}

fn include_target(value: &toml::Value) -> Option<&str> {
    value
        .as_str()?
        .strip_prefix("include('")?
        .strip_suffix("')")
}

fn ignore_pattern(glob: &toml::Value, root_dir: &Path) -> Result<Pattern> {
    let glob = glob
        .as_str()
        .ok_or_else(|| anyhow!("{IGNORE_GLOBS_KEY} entries must be strings, found {glob}"))?;
    let glob = root_dir.join(glob);
    Pattern::new(&glob.to_string_lossy())
        .with_context(|| format!("Invalid ignore pattern {glob:?}"))
}

/// Splits `level` off a rule table and checks the remaining keys against
/// the rule's count settings.
fn read_rule_table(
    rule_name: &str,
    mut table: toml::Table,
) -> Result<(Option<LintLevel>, RuleSettings)> {
    let level = match table.remove(LEVEL_KEY) {
        None => None,
        Some(toml::Value::String(level)) => Some(
            LintLevel::try_from(level.as_str()).map_err(|err| anyhow!("[{rule_name}] {err}"))?,
        ),
        Some(other) => bail!("[{rule_name}] {LEVEL_KEY} must be a string, found {other}"),
    };

    let known = RuleRegistry::count_settings(rule_name);
    if let Some(unknown) = table.keys().find(|key| !known.contains(&key.as_str())) {
        bail!(
            "[{rule_name}] has no setting named {unknown}; expected one of: {}",
            known.join(", ")
        );
    }

    let settings = RuleSettings::new(table);
    for key in known {
        settings
            .get_count(key)
            .with_context(|| format!("Invalid setting in [{rule_name}]"))?;
    }

    Ok((level, settings))
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn from_json(value: serde_json::Value) -> Result<Config> {
        Config::from_serializable(value, &ConfigDir(None))
    }

    #[test]
    fn test_rule_table_keeps_counts_and_level() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = write_config(
            &dir,
            "spacing.toml",
            r#"
[Rule001BraceSpacing]
level = "warning"
empty_lines_after_opening_brace = 0
empty_lines_before_closing_brace = "2"
"#,
        );
        let config = Config::from_config_file(path)?;

        let settings = &config.rule_specific_settings["Rule001BraceSpacing"];
        assert_eq!(
            settings.get_count("empty_lines_after_opening_brace"),
            Ok(Some(0))
        );
        assert_eq!(
            settings.get_count("empty_lines_before_closing_brace"),
            Ok(Some(2))
        );
        assert!(!settings.has_key(LEVEL_KEY));
        assert!(config.rule_registry.is_rule_active("Rule002MethodSpacing"));
        Ok(())
    }

    #[test]
    fn test_include_is_read_from_config_dir() -> Result<()> {
        let dir = tempfile::tempdir()?;
        write_config(&dir, "methods.toml", "blank_lines_between_methods = 1\n");
        let path = write_config(
            &dir,
            "spacing.toml",
            r#"Rule002MethodSpacing = "include('methods.toml')""#,
        );

        let config = Config::from_config_file(path)?;
        assert_eq!(
            config.rule_specific_settings["Rule002MethodSpacing"]
                .get_count("blank_lines_between_methods"),
            Ok(Some(1))
        );
        Ok(())
    }

    #[test]
    fn test_missing_include_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            "spacing.toml",
            r#"Rule002MethodSpacing = "include('missing.toml')""#,
        );
        assert!(Config::from_config_file(path).is_err());
    }

    #[test]
    fn test_unparseable_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "spacing.toml", "blank lines = two");
        assert!(Config::from_config_file(path).is_err());
    }

    #[test]
    fn test_invalid_count_is_rejected_at_load() {
        for value in [json!(-1), json!("two"), json!(1.5)] {
            let config = from_json(json!({
                "Rule002MethodSpacing": { "blank_lines_between_methods": value },
            }));
            assert!(config.is_err(), "Expected {value} to be rejected");
        }
    }

    #[test]
    fn test_unknown_setting_in_rule_table_is_rejected() {
        let err = from_json(json!({
            "Rule002MethodSpacing": { "blank_lines_between_method": 2 },
        }))
        .unwrap_err();
        assert!(err.to_string().contains("blank_lines_between_method"));
        assert!(err.to_string().contains("blank_lines_between_methods"));
    }

    #[test]
    fn test_invalid_level_is_rejected() {
        assert!(from_json(json!({
            "Rule001BraceSpacing": { "level": "fatal" },
        }))
        .is_err());
        assert!(from_json(json!({
            "Rule001BraceSpacing": { "level": 1 },
        }))
        .is_err());
    }

    #[test]
    fn test_rule_must_be_table_or_false() {
        assert!(from_json(json!({ "Rule001BraceSpacing": 2 })).is_err());
        assert!(from_json(json!({ "Rule001BraceSpacing": true })).is_ok());
    }

    #[test]
    fn test_unknown_rule_is_ignored() {
        let config = from_json(json!({ "Rule099Unknown": { "anything": 1 } })).unwrap();
        assert!(config.rule_specific_settings.is_empty());
    }

    #[test]
    fn test_disabled_rule_is_deactivated() {
        let config = from_json(json!({ "Rule002MethodSpacing": false })).unwrap();
        assert!(!config.rule_registry.is_rule_active("Rule002MethodSpacing"));
        assert!(config.rule_registry.is_rule_active("Rule001BraceSpacing"));
    }

    #[test]
    fn test_non_table_config_is_rejected() {
        assert!(Config::from_serializable(vec![1, 2, 3], &ConfigDir(None)).is_err());
    }

    #[test]
    fn test_ignore_patterns_resolve_against_config_dir() {
        let config = Config::from_serializable(
            json!({ "ignore_patterns": ["vendor/**"] }),
            &ConfigDir(Some(PathBuf::from("/project"))),
        )
        .unwrap();
        assert!(config.is_ignored(Path::new("/project/vendor/lib/tokens.json")));
        assert!(!config.is_ignored(Path::new("/project/src/tokens.json")));
    }

    #[test]
    fn test_ignore_patterns_must_be_strings() {
        assert!(from_json(json!({ "ignore_patterns": [1] })).is_err());
        assert!(from_json(json!({ "ignore_patterns": "vendor/**" })).is_err());
    }
}
