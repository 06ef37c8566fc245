use std::{fs, path::Path};

use anyhow::Result;
use bon::bon;
use log::{debug, warn};

mod app_error;
mod config;
mod errors;
mod fix;
mod output;
mod rules;
mod spacing;
#[cfg(test)]
mod test_utils;
mod token;

pub use app_error::{AppError, PublicError, SettingsError};
pub use config::{Config, ConfigDir};
pub use errors::{LintError, LintLevel};
pub use fix::{Changeset, FixSummary, Fixer, LintCorrection};
pub use output::{json::JsonFormatter, simple::SimpleFormatter, LintOutput, OutputFormatter};
pub use rules::{
    Invocation, Rule, Rule001BraceSpacing, Rule002MethodSpacing, RuleName, RuleSettings,
};
pub use token::{Token, TokenFile, TokenKind};

/// Extension of host token dumps picked up when linting a directory.
const TOKEN_DUMP_EXTENSION: &str = "json";

#[derive(Debug)]
pub struct Linter {
    config: Config,
}

#[bon]
impl Linter {
    #[builder]
    pub fn new(#[builder(default)] config: Config) -> Result<Self> {
        let mut config = config;
        let settings = config.rule_specific_settings.clone();
        config.rule_registry.setup(&settings)?;
        Ok(Self { config })
    }
}

impl Linter {
    /// Lints one host-tokenized file.
    pub fn lint_tokens(&self, file: &TokenFile) -> Result<Vec<LintError>> {
        self.config.rule_registry.run(file)
    }

    /// Lints a JSON token dump, or every dump under a directory.
    pub fn lint_path(&self, path: &Path) -> Result<Vec<LintOutput>> {
        let mut outputs = Vec::new();
        self.lint_path_internal(path, &mut outputs)?;
        Ok(outputs)
    }

    fn lint_path_internal(&self, path: &Path, outputs: &mut Vec<LintOutput>) -> Result<()> {
        if self.config.is_ignored(path) {
            debug!("Skipping ignored path {path:?}");
            return Ok(());
        }

        if path.is_dir() {
            let mut entries = fs::read_dir(path)
                .map_err(|err| {
                    AppError::FileSystemError(format!("reading directory {path:?}"), err)
                })?
                .filter_map(|entry| {
                    entry
                        .inspect_err(|err| warn!("Skipping unreadable entry in {path:?}: {err}"))
                        .ok()
                })
                .map(|entry| entry.path())
                .collect::<Vec<_>>();
            entries.sort();

            for entry in entries {
                if entry.is_dir()
                    || entry
                        .extension()
                        .is_some_and(|ext| ext == TOKEN_DUMP_EXTENSION)
                {
                    self.lint_path_internal(&entry, outputs)?;
                }
            }
            return Ok(());
        }

        let file = load_token_file(path)?;
        let errors = self.lint_tokens(&file)?;
        debug!("Found {} violation(s) in {path:?}", errors.len());
        outputs.push(LintOutput::new(path.to_string_lossy(), errors));
        Ok(())
    }
}

/// Reads and validates a JSON token dump.
pub fn load_token_file(path: &Path) -> Result<TokenFile> {
    let content = fs::read_to_string(path)
        .map_err(|err| AppError::FileSystemError(format!("reading token dump {path:?}"), err))?;
    Ok(TokenFile::from_json(&path.to_string_lossy(), &content)?)
}

#[cfg(test)]
use ctor::ctor;

#[cfg(test)]
#[ctor]
fn init_test_logger() {
    env_logger::builder().is_test(true).try_init().unwrap();
}
