use std::{io::Write, str::FromStr};

use anyhow::Result;
use serde::Serialize;

use crate::{
    app_error,
    errors::{LintError, LintLevel},
};

pub mod json;
pub mod simple;

#[derive(Debug, Serialize)]
pub struct LintOutput {
    file_path: String,
    errors: Vec<LintError>,
}

impl LintOutput {
    pub fn new(file_path: impl AsRef<str>, errors: Vec<LintError>) -> Self {
        Self {
            file_path: file_path.as_ref().to_string(),
            errors,
        }
    }

    pub fn file_path(&self) -> &str {
        &self.file_path
    }

    pub fn errors(&self) -> &[LintError] {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        self.errors
            .iter()
            .any(|error| error.level() == LintLevel::Error)
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct OutputSummary {
    pub(crate) num_files: usize,
    pub(crate) num_errors: usize,
    pub(crate) num_warnings: usize,
}

impl OutputSummary {
    pub(crate) fn from_outputs(output: &[LintOutput]) -> Self {
        output.iter().fold(
            Self {
                num_files: output.len(),
                ..Default::default()
            },
            |mut summary, output| {
                for error in output.errors() {
                    match error.level() {
                        LintLevel::Error => summary.num_errors += 1,
                        LintLevel::Warning => summary.num_warnings += 1,
                    }
                }
                summary
            },
        )
    }
}

#[non_exhaustive]
#[derive(Debug, Clone)]
pub enum OutputFormatter {
    Simple(simple::SimpleFormatter),
    Json(json::JsonFormatter),
}

impl OutputFormatter {
    pub fn format<Writer: Write>(&self, output: &[LintOutput], io: &mut Writer) -> Result<()> {
        match self {
            Self::Simple(formatter) => formatter.format(output, io),
            Self::Json(formatter) => formatter.format(output, io),
        }
    }

    pub fn should_log_metadata(&self) -> bool {
        match self {
            Self::Simple(formatter) => formatter.should_log_metadata(),
            Self::Json(formatter) => formatter.should_log_metadata(),
        }
    }
}

impl FromStr for OutputFormatter {
    type Err = app_error::PublicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "simple" => Ok(Self::Simple(simple::SimpleFormatter)),
            "json" => Ok(Self::Json(json::JsonFormatter)),
            other => Err(app_error::PublicError::VariantNotFound(other.to_string())),
        }
    }
}
