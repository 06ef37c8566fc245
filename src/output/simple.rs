use std::io::Write;

use anyhow::Result;

use super::{LintOutput, OutputSummary};

/// Outputs linter diagnostics in the simple format, for CLI display, which has
/// the structure:
///
/// ```text
/// <file path>:<line>: [<severity>] <msg> (<rule>.<code>)
/// ```
///
/// The diagnostics are followed by a summary of the number of linted files,
/// total errors, and total warnings.
#[derive(Debug, Clone)]
pub struct SimpleFormatter;

impl SimpleFormatter {
    pub(super) fn format<Writer: Write>(
        &self,
        output: &[LintOutput],
        io: &mut Writer,
    ) -> Result<()> {
        // Whether anything has been written to the output, used to determine
        // whether to write a newline before the summary.
        let mut written = false;

        for output in output.iter() {
            for error in output.errors().iter() {
                written |= true;
                writeln!(
                    io,
                    "{}:{}: [{}] {} ({}.{})",
                    output.file_path(),
                    error.line(),
                    error.level(),
                    error.message(),
                    error.rule(),
                    error.code(),
                )?;
            }
        }

        if written {
            writeln!(io)?;
        }
        writeln!(io, "{}", self.format_summary(output))?;
        Ok(())
    }

    pub(super) fn should_log_metadata(&self) -> bool {
        true
    }

    fn format_summary(&self, output: &[LintOutput]) -> String {
        let OutputSummary {
            num_files,
            num_errors,
            num_warnings,
        } = OutputSummary::from_outputs(output);

        let diagnostic_message = match (num_errors, num_warnings) {
            (0, 0) => "No errors or warnings found".to_string(),
            (0, num_warnings) => format!(
                "Found {} warning{}",
                num_warnings,
                if num_warnings != 1 { "s" } else { "" }
            ),
            (num_errors, 0) => format!(
                "Found {} error{}",
                num_errors,
                if num_errors != 1 { "s" } else { "" }
            ),
            (num_errors, num_warnings) => format!(
                "Found {} error{} and {} warning{}",
                num_errors,
                if num_errors != 1 { "s" } else { "" },
                num_warnings,
                if num_warnings != 1 { "s" } else { "" }
            ),
        };

        format!(
            "{diagnostic_message} in {num_files} file{}",
            if num_files != 1 { "s" } else { "" }
        )
    }
}
