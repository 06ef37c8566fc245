use std::{collections::HashMap, sync::LazyLock};

use anyhow::Result;
use log::{debug, trace};

use crate::{
    app_error::SettingsError,
    errors::{LintError, LintLevel},
    token::{Token, TokenFile, TokenKind},
};

pub mod rule001_brace_spacing;
pub mod rule002_method_spacing;

pub use rule001_brace_spacing::Rule001BraceSpacing;
pub use rule002_method_spacing::Rule002MethodSpacing;

fn all_rules() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(Rule001BraceSpacing::default()),
        Box::new(Rule002MethodSpacing::default()),
    ]
}

static ALL_RULE_NAMES: LazyLock<Vec<&'static str>> =
    LazyLock::new(|| all_rules().iter().map(|rule| rule.name()).collect());

pub trait Rule: std::fmt::Debug + RuleName {
    fn default_level(&self) -> LintLevel;

    /// Reads and validates the rule's settings. Called once, before any file
    /// is linted.
    fn setup(&mut self, _settings: Option<&RuleSettings>) -> Result<(), SettingsError> {
        Ok(())
    }

    /// Names of the rule's count settings. Config tables may only use these
    /// keys, plus `level`.
    fn count_settings(&self) -> &'static [&'static str] {
        &[]
    }

    /// Token kinds this rule fires on.
    fn register(&self) -> &'static [TokenKind];

    fn process(&self, invocation: &Invocation<'_>, level: LintLevel) -> Option<Vec<LintError>>;
}

pub trait RuleName {
    fn name(&self) -> &'static str;
}

/// The file and triggering position handed to a rule.
#[derive(Debug, Clone, Copy)]
pub struct Invocation<'file> {
    file: &'file TokenFile,
    position: usize,
}

impl<'file> Invocation<'file> {
    pub fn new(file: &'file TokenFile, position: usize) -> Self {
        Self { file, position }
    }

    pub fn file(&self) -> &'file TokenFile {
        self.file
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn token(&self) -> Option<&'file Token> {
        self.file.get(self.position)
    }
}

#[derive(Clone, Debug)]
pub struct RuleSettings(toml::Value);

impl RuleSettings {
    pub fn new(table: toml::Table) -> Self {
        Self(toml::Value::Table(table))
    }

    pub fn has_key(&self, key: &str) -> bool {
        self.0.get(key).is_some()
    }

    /// A non-negative count. Numeric strings are accepted, since some
    /// configuration sources only produce strings.
    pub fn get_count(&self, key: &str) -> Result<Option<usize>, SettingsError> {
        let invalid = |value: &dyn std::fmt::Display| SettingsError::InvalidCount {
            key: key.to_string(),
            value: value.to_string(),
        };

        match self.0.get(key) {
            None => Ok(None),
            Some(toml::Value::Integer(int)) => {
                usize::try_from(*int).map(Some).map_err(|_| invalid(int))
            }
            Some(toml::Value::String(string)) => string
                .trim()
                .parse::<usize>()
                .map(Some)
                .map_err(|_| invalid(&format!("{string:?}"))),
            Some(other) => Err(invalid(other)),
        }
    }
}

#[derive(Debug)]
pub(crate) struct RuleRegistry {
    state: RuleRegistryState,
    rules: Vec<Box<dyn Rule>>,
    configured_levels: HashMap<String, LintLevel>,
}

#[derive(Debug)]
enum RuleRegistryState {
    PreSetup,
    Setup,
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self {
            state: RuleRegistryState::PreSetup,
            rules: all_rules(),
            configured_levels: HashMap::new(),
        }
    }

    pub fn is_valid_rule(rule_name: &str) -> bool {
        ALL_RULE_NAMES.contains(&rule_name)
    }

    pub fn count_settings(rule_name: &str) -> &'static [&'static str] {
        all_rules()
            .iter()
            .find(|rule| rule.name() == rule_name)
            .map(|rule| rule.count_settings())
            .unwrap_or_default()
    }

    pub fn deactivate_rule(&mut self, rule_name: &str) {
        self.rules.retain(|rule| rule.name() != rule_name);
    }

    pub fn is_rule_active(&self, rule_name: &str) -> bool {
        self.rules.iter().any(|rule| rule.name() == rule_name)
    }

    pub fn save_configured_level(&mut self, rule_name: &str, level: LintLevel) {
        self.configured_levels.insert(rule_name.to_string(), level);
    }

    fn level_for(&self, rule: &dyn Rule) -> LintLevel {
        self.configured_levels
            .get(rule.name())
            .copied()
            .unwrap_or_else(|| rule.default_level())
    }

    pub fn setup(&mut self, settings: &HashMap<String, RuleSettings>) -> Result<()> {
        match self.state {
            RuleRegistryState::PreSetup => {
                for rule in &mut self.rules {
                    let name = rule.name();
                    rule.setup(settings.get(name))
                        .map_err(|err| anyhow::anyhow!("Invalid settings for {name}: {err}"))?;
                    debug!("Set up rule {name}: {rule:?}");
                }
                self.state = RuleRegistryState::Setup;
                Ok(())
            }
            RuleRegistryState::Setup => Err(anyhow::anyhow!(
                "Cannot setup rule registry if it is already set up"
            )),
        }
    }

    /// Walks the file once, handing each token to every rule registered for
    /// its kind.
    pub fn run(&self, file: &TokenFile) -> Result<Vec<LintError>> {
        match self.state {
            RuleRegistryState::PreSetup => Err(anyhow::anyhow!(
                "Cannot run rule registry in pre-setup state"
            )),
            RuleRegistryState::Setup => {
                let mut errors = Vec::new();
                for (position, token) in file.tokens().iter().enumerate() {
                    for rule in &self.rules {
                        if !rule.register().contains(&token.kind) {
                            continue;
                        }
                        trace!("Running {} on token {position} ({})", rule.name(), token.kind);
                        let invocation = Invocation::new(file, position);
                        if let Some(rule_errors) =
                            rule.process(&invocation, self.level_for(rule.as_ref()))
                        {
                            errors.extend(rule_errors);
                        }
                    }
                }
                Ok(errors)
            }
        }
    }
}
