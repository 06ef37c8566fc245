use std::collections::{HashMap, HashSet};

use anyhow::Result;
use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::{
    errors::LintError,
    token::{TokenFile, TokenKind},
    Linter,
};

/// Upper bound on lint-then-fix passes over one file.
const MAX_FIX_PASSES: usize = 50;

/// A single token edit, positioned against the file the violation was found
/// in. `Delete` blanks the token, `InsertNewline` adds a line ending after it.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LintCorrection {
    Delete { position: usize },
    InsertNewline { position: usize },
}

impl LintCorrection {
    pub fn position(&self) -> usize {
        match self {
            Self::Delete { position } | Self::InsertNewline { position } => *position,
        }
    }
}

/// Corrections that must be applied together or not at all.
#[derive(Debug, Clone, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Changeset(Vec<LintCorrection>);

impl Changeset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LintCorrection> {
        self.0.iter()
    }

    fn positions(&self) -> HashSet<usize> {
        self.0.iter().map(LintCorrection::position).collect()
    }
}

impl FromIterator<LintCorrection> for Changeset {
    fn from_iter<T: IntoIterator<Item = LintCorrection>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Applies changesets to a working copy of a token file.
///
/// Within one pass, a changeset touching a token that an earlier changeset
/// already edited is skipped whole. The caller re-lints and tries again on
/// the next pass.
#[derive(Debug)]
pub struct Fixer {
    file: TokenFile,
    /// Newlines to emit after a non-whitespace token.
    trailing_newlines: HashMap<usize, usize>,
    touched: HashSet<usize>,
    applied: usize,
}

impl Fixer {
    pub fn new(file: &TokenFile) -> Self {
        Self {
            file: file.clone(),
            trailing_newlines: HashMap::new(),
            touched: HashSet::new(),
            applied: 0,
        }
    }

    /// Returns whether the changeset was applied.
    pub fn apply(&mut self, changeset: &Changeset) -> bool {
        let positions = changeset.positions();
        if positions.iter().any(|position| *position >= self.file.len()) {
            debug!("Skipping changeset with out-of-range position: {changeset:?}");
            return false;
        }
        if !self.touched.is_disjoint(&positions) {
            trace!("Changeset conflicts with an earlier one this pass: {changeset:?}");
            return false;
        }

        let eol = self.file.eol().to_string();
        let tokens = self.file.tokens_mut();
        for correction in changeset.iter() {
            match *correction {
                LintCorrection::Delete { position } => {
                    tokens[position].content.clear();
                    self.trailing_newlines.remove(&position);
                }
                LintCorrection::InsertNewline { position } => {
                    if tokens[position].kind == TokenKind::Whitespace {
                        tokens[position].content.push_str(&eol);
                    } else {
                        *self.trailing_newlines.entry(position).or_default() += 1;
                    }
                }
            }
        }

        self.applied += changeset.len();
        self.touched.extend(positions);
        true
    }

    pub fn applied(&self) -> usize {
        self.applied
    }

    /// Finishes the pass. The result is laid out the way the host tokenizer
    /// would lay out the edited text, with line numbers recomputed.
    pub fn finish(self) -> TokenFile {
        let mut file = self.file.split_line_breaks(&self.trailing_newlines);
        file.renumber_lines();
        file
    }
}

#[derive(Debug)]
pub struct FixSummary {
    pub file: TokenFile,
    pub passes: usize,
    pub corrections_applied: usize,
    /// Violations still present after the last pass.
    pub remaining: Vec<LintError>,
}

impl FixSummary {
    pub fn fixed_source(&self) -> String {
        self.file.render()
    }
}

impl Linter {
    /// Repeatedly lints and applies fixes until nothing fixable is left, a
    /// pass makes no progress, or the pass limit is hit.
    pub fn fix(&self, file: &TokenFile) -> Result<FixSummary> {
        let mut current = file.clone();
        let mut passes = 0;
        let mut corrections_applied = 0;

        loop {
            let errors = self.lint_tokens(&current)?;
            let fixable: Vec<&LintError> =
                errors.iter().filter(|error| error.is_fixable()).collect();
            if fixable.is_empty() || passes == MAX_FIX_PASSES {
                debug!(
                    "Fixing stopped after {passes} pass(es) with {} violation(s) remaining",
                    errors.len()
                );
                return Ok(FixSummary {
                    file: current,
                    passes,
                    corrections_applied,
                    remaining: errors,
                });
            }

            passes += 1;
            let mut fixer = Fixer::new(&current);
            for changeset in fixable.iter().filter_map(|error| error.fix()) {
                fixer.apply(changeset);
            }
            debug!(
                "Fix pass {passes} applied {} correction(s)",
                fixer.applied()
            );

            let applied = fixer.applied();
            let next = fixer.finish();
            if applied == 0 || next.render() == current.render() {
                debug!("Fix pass {passes} made no progress");
                let remaining = self.lint_tokens(&next)?;
                return Ok(FixSummary {
                    file: next,
                    passes,
                    corrections_applied: corrections_applied + applied,
                    remaining,
                });
            }

            corrections_applied += applied;
            current = next;
        }
    }
}
