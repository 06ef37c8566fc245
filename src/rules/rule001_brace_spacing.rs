use log::debug;
use spacing_sniffs_macros::RuleName;

use crate::{
    app_error::SettingsError,
    errors::{LintError, LintLevel},
    spacing::{blank_line_changeset, line_breaks},
    token::{TokenFile, TokenKind},
};

use super::{Invocation, Rule, RuleName, RuleSettings};

const OPEN_BRACE_CODE: &str = "OpenBraceFollowedByEmptyLines";
const CLOSE_BRACE_CODE: &str = "CloseBracePrecededByEmptyLines";

const AFTER_OPENING_KEY: &str = "empty_lines_after_opening_brace";
const BEFORE_CLOSING_KEY: &str = "empty_lines_before_closing_brace";

/// Tokens allowed to sit directly after an opening brace.
const HUGS_OPENING_BRACE: [TokenKind; 3] = [TokenKind::Const, TokenKind::Comment, TokenKind::Use];

/// Class and interface bodies must have a fixed number of empty lines after
/// the opening brace and before the closing brace.
///
/// ## Examples
///
/// ### Valid
///
/// ```php
/// class Foo
/// {
///
///     public $bar;
///
/// }
/// ```
///
/// ### Invalid
///
/// ```php
/// class Foo
/// {
///     public $bar;
/// }
/// ```
///
/// ## Exceptions
///
/// A constant, `use` statement, or comment may follow the opening brace
/// directly.
///
/// ## Settings
///
/// - `empty_lines_after_opening_brace` (default 1)
/// - `empty_lines_before_closing_brace` (default 1)
#[derive(Debug, Clone, RuleName)]
pub struct Rule001BraceSpacing {
    empty_lines_after_opening_brace: usize,
    empty_lines_before_closing_brace: usize,
}

impl Default for Rule001BraceSpacing {
    fn default() -> Self {
        Self {
            empty_lines_after_opening_brace: 1,
            empty_lines_before_closing_brace: 1,
        }
    }
}

impl Rule for Rule001BraceSpacing {
    fn default_level(&self) -> LintLevel {
        LintLevel::Error
    }

    fn setup(&mut self, settings: Option<&RuleSettings>) -> Result<(), SettingsError> {
        if let Some(settings) = settings {
            if let Some(count) = settings.get_count(AFTER_OPENING_KEY)? {
                self.empty_lines_after_opening_brace = count;
            }
            if let Some(count) = settings.get_count(BEFORE_CLOSING_KEY)? {
                self.empty_lines_before_closing_brace = count;
            }
        }
        Ok(())
    }

    fn count_settings(&self) -> &'static [&'static str] {
        &[AFTER_OPENING_KEY, BEFORE_CLOSING_KEY]
    }

    fn register(&self) -> &'static [TokenKind] {
        &[TokenKind::Class, TokenKind::Interface]
    }

    fn process(&self, invocation: &Invocation<'_>, level: LintLevel) -> Option<Vec<LintError>> {
        let declaration = invocation.token()?;
        let (Some(opener), Some(closer)) = (declaration.scope_opener, declaration.scope_closer)
        else {
            debug!(
                "Skipping {} at {} without a body",
                declaration.content,
                invocation.position()
            );
            return None;
        };

        let errors: Vec<LintError> = [
            self.check_opening_brace(invocation, opener, level),
            self.check_closing_brace(invocation, closer, level),
        ]
        .into_iter()
        .flatten()
        .collect();

        if errors.is_empty() {
            None
        } else {
            Some(errors)
        }
    }
}

impl Rule001BraceSpacing {
    fn check_opening_brace(
        &self,
        invocation: &Invocation<'_>,
        opener: usize,
        level: LintLevel,
    ) -> Option<LintError> {
        let file = invocation.file();
        let brace = file.get(opener)?;
        let next = file.find_next(&[TokenKind::Whitespace], opener + 1, None, true)?;
        let next_token = file.get(next)?;
        if HUGS_OPENING_BRACE.contains(&next_token.kind) {
            return None;
        }

        let found = next_token.line_delta(brace) - 1;
        let expected = self.empty_lines_after_opening_brace as isize;
        if found == expected {
            return None;
        }

        let message = format!(
            "Opening brace for the {} should be followed by {expected} empty line(s); \
             {found} empty line(s) found.",
            declaration_text(file, invocation.position())
        );
        let removable = line_breaks(file, opener + 1..next);
        LintError::from_token()
            .file(file)
            .position(opener)
            .rule(self.name())
            .code(OPEN_BRACE_CODE)
            .level(level)
            .message(&message)
            .fix(blank_line_changeset(found, expected, opener, &removable))
            .call()
    }

    fn check_closing_brace(
        &self,
        invocation: &Invocation<'_>,
        closer: usize,
        level: LintLevel,
    ) -> Option<LintError> {
        let file = invocation.file();
        let brace = file.get(closer)?;
        let previous =
            file.find_previous(&[TokenKind::Whitespace], closer.checked_sub(1)?, None, true)?;
        let previous_token = file.get(previous)?;

        let found = brace.line_delta(previous_token) - 1;
        let expected = self.empty_lines_before_closing_brace as isize;
        if found == expected {
            return None;
        }

        let message = format!(
            "Closing brace for the {} should be preceded by {expected} empty line(s); \
             {found} found.",
            declaration_text(file, invocation.position())
        );
        let removable = line_breaks(file, previous + 1..closer);
        LintError::from_token()
            .file(file)
            .position(closer)
            .rule(self.name())
            .code(CLOSE_BRACE_CODE)
            .level(level)
            .message(&message)
            .fix(blank_line_changeset(found, expected, previous, &removable))
            .call()
    }
}

fn declaration_text(file: &TokenFile, position: usize) -> &str {
    file.get(position)
        .map_or("declaration", |token| token.content.as_str())
}
