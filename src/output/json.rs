use std::io::Write;

use anyhow::Result;

use super::LintOutput;

/// Outputs the full diagnostics, fixes included, as a JSON array with one
/// entry per linted file.
#[derive(Debug, Clone)]
pub struct JsonFormatter;

impl JsonFormatter {
    pub(super) fn format<Writer: Write>(
        &self,
        output: &[LintOutput],
        io: &mut Writer,
    ) -> Result<()> {
        serde_json::to_writer_pretty(&mut *io, output)?;
        writeln!(io)?;
        Ok(())
    }

    pub(super) fn should_log_metadata(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;
    use crate::{
        errors::{LintError, LintLevel},
        fix::{Changeset, LintCorrection},
        token::{Token, TokenFile, TokenKind},
    };

    #[test]
    fn test_json_formatter_includes_fix() {
        let file = TokenFile::new(vec![
            Token::new(TokenKind::OpenCurlyBracket, 1, "{"),
            Token::new(TokenKind::Whitespace, 1, "\n"),
        ]);
        let error = LintError::from_token()
            .file(&file)
            .position(0)
            .rule("Rule001BraceSpacing")
            .code("OpenBraceFollowedByEmptyLines")
            .level(LintLevel::Error)
            .message("message")
            .fix(Changeset::from_iter([LintCorrection::InsertNewline {
                position: 0,
            }]))
            .call()
            .unwrap();

        let mut buffer = Vec::new();
        JsonFormatter
            .format(&[LintOutput::new("a.json", vec![error])], &mut buffer)
            .unwrap();
        let value: Value = serde_json::from_slice(&buffer).unwrap();

        assert_eq!(value[0]["file_path"], "a.json");
        assert_eq!(value[0]["errors"][0]["level"], "ERROR");
        assert_eq!(value[0]["errors"][0]["fix"][0]["type"], "insert_newline");
        assert_eq!(value[0]["errors"][0]["fix"][0]["position"], 0);
    }
}
