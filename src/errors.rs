use std::fmt::Display;

use bon::bon;
use serde::{Deserialize, Serialize};

use crate::{fix::Changeset, token::TokenFile};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LintLevel {
    Error,
    Warning,
}

impl Display for LintLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "ERROR"),
            Self::Warning => write!(f, "WARNING"),
        }
    }
}

impl TryFrom<&str> for LintLevel {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, <Self as TryFrom<&str>>::Error> {
        match value.to_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warning" => Ok(Self::Warning),
            other => Err(format!("Invalid lint level: {other}")),
        }
    }
}

/// A style violation, anchored at a token position.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LintError {
    pub(crate) rule: String,
    pub(crate) code: String,
    pub(crate) level: LintLevel,
    pub(crate) message: String,
    pub(crate) position: usize,
    pub(crate) line: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) fix: Option<Changeset>,
}

#[bon]
impl LintError {
    /// Returns `None` if `position` is outside the file.
    #[builder]
    pub(crate) fn from_token(
        file: &TokenFile,
        position: usize,
        rule: &str,
        code: &str,
        level: LintLevel,
        message: &str,
        fix: Option<Changeset>,
    ) -> Option<Self> {
        let token = file.get(position)?;
        Some(Self {
            rule: rule.to_string(),
            code: code.to_string(),
            level,
            message: message.to_string(),
            position,
            line: token.line,
            fix: fix.filter(|changeset| !changeset.is_empty()),
        })
    }
}

impl LintError {
    pub fn rule(&self) -> &str {
        &self.rule
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn level(&self) -> LintLevel {
        self.level
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn fix(&self) -> Option<&Changeset> {
        self.fix.as_ref()
    }

    pub fn is_fixable(&self) -> bool {
        self.fix.is_some()
    }
}
