use log::trace;
use spacing_sniffs_macros::RuleName;

use crate::{
    app_error::SettingsError,
    errors::{LintError, LintLevel},
    spacing::{blank_line_changeset, line_breaks},
    token::{TokenFile, TokenKind},
};

use super::{Invocation, Rule, RuleName, RuleSettings};

const CODE: &str = "BlankLinesAfterMethod";
const BLANK_LINES_KEY: &str = "blank_lines_between_methods";

/// Blank lines following a method, plus where a fix should edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MethodGap {
    pub(crate) blank_lines: isize,
    pub(crate) edit_anchor: usize,
}

/// Methods must be followed by a fixed number of empty lines.
///
/// ## Exceptions
///
/// - The last method in a class, followed only by the closing brace.
/// - Any method in a file that declares an interface.
/// - A method at the end of the file.
///
/// ## Settings
///
/// - `blank_lines_between_methods` (default 2)
#[derive(Debug, Clone, RuleName)]
pub struct Rule002MethodSpacing {
    blank_lines_between_methods: usize,
}

impl Default for Rule002MethodSpacing {
    fn default() -> Self {
        Self {
            blank_lines_between_methods: 2,
        }
    }
}

impl Rule for Rule002MethodSpacing {
    fn default_level(&self) -> LintLevel {
        LintLevel::Error
    }

    fn setup(&mut self, settings: Option<&RuleSettings>) -> Result<(), SettingsError> {
        if let Some(count) = settings
            .map(|settings| settings.get_count(BLANK_LINES_KEY))
            .transpose()?
            .flatten()
        {
            self.blank_lines_between_methods = count;
        }
        Ok(())
    }

    fn count_settings(&self) -> &'static [&'static str] {
        &[BLANK_LINES_KEY]
    }

    fn register(&self) -> &'static [TokenKind] {
        &[TokenKind::Function]
    }

    fn process(&self, invocation: &Invocation<'_>, level: LintLevel) -> Option<Vec<LintError>> {
        let file = invocation.file();
        if is_interface_file(file) {
            trace!(
                "Skipping method at {}: file declares an interface",
                invocation.position()
            );
            return None;
        }

        let closer = scope_closer(invocation)?;
        let next_line_start = next_line_start(file, closer);
        let next_content = next_line_start
            .and_then(|start| file.find_next(&[TokenKind::Whitespace], start, None, true));

        if next_content
            .and_then(|position| file.get(position))
            .is_some_and(|token| token.kind == TokenKind::CloseCurlyBracket)
        {
            trace!("Skipping method at {}: last in class", invocation.position());
            return None;
        }

        let expected = self.blank_lines_between_methods as isize;
        let gap = self.measure_gap(file, closer, next_line_start, next_content);
        if gap.blank_lines == expected {
            return None;
        }

        let message = format!(
            "Method should have {expected} empty line(s) after itself, {} found.",
            gap.blank_lines
        );
        let removable = line_breaks(file, closer + 1..next_content.unwrap_or(file.len()));
        LintError::from_token()
            .file(file)
            .position(invocation.position())
            .rule(self.name())
            .code(CODE)
            .level(level)
            .message(&message)
            .fix(blank_line_changeset(
                gap.blank_lines,
                expected,
                gap.edit_anchor,
                &removable,
            ))
            .call()
            .map(|error| vec![error])
    }
}

impl Rule002MethodSpacing {
    fn measure_gap(
        &self,
        file: &TokenFile,
        closer: usize,
        next_line_start: Option<usize>,
        next_content: Option<usize>,
    ) -> MethodGap {
        let blank_lines = match (next_line_start, next_content) {
            (Some(start), Some(content)) => match (file.get(start), file.get(content)) {
                (Some(start), Some(content)) => content.line_delta(start),
                _ => self.blank_lines_between_methods as isize,
            },
            // End of file counts as correctly spaced.
            _ => self.blank_lines_between_methods as isize,
        };

        let edit_anchor = next_content
            .or(next_line_start)
            .map_or(closer, |position| position.saturating_sub(2).max(closer));

        MethodGap {
            blank_lines,
            edit_anchor,
        }
    }
}

fn is_interface_file(file: &TokenFile) -> bool {
    file.find_next(&[TokenKind::Interface], 0, None, false)
        .is_some()
}

/// The body's closing brace, or for a signature without a body, the
/// terminating semicolon.
fn scope_closer(invocation: &Invocation<'_>) -> Option<usize> {
    match invocation.token()?.scope_closer {
        Some(closer) => Some(closer),
        None => invocation.file().find_next(
            &[TokenKind::Semicolon],
            invocation.position(),
            None,
            false,
        ),
    }
}

/// The token after the first line ending at or after `closer`, if any.
fn next_line_start(file: &TokenFile, closer: usize) -> Option<usize> {
    let eol = (closer..file.len()).find(|&position| file.contains_eol(position))?;
    let start = eol + 1;
    (start < file.len()).then_some(start)
}
