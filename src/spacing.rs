//! Blank-line helpers shared by the spacing rules.

use std::ops::Range;

use itertools::repeat_n;

use crate::{
    fix::{Changeset, LintCorrection},
    token::{TokenFile, TokenKind},
};

/// Whitespace tokens within `range` that end a line.
pub(crate) fn line_breaks(file: &TokenFile, range: Range<usize>) -> Vec<usize> {
    range
        .filter(|&position| {
            file.get(position)
                .is_some_and(|token| token.kind == TokenKind::Whitespace)
                && file.contains_eol(position)
        })
        .collect()
}

/// Corrections that turn `found` blank lines into `expected`.
///
/// Missing lines are appended to `anchor`. Surplus lines are removed from the
/// end of `removable`, nearest the following content.
pub(crate) fn blank_line_changeset(
    found: isize,
    expected: isize,
    anchor: usize,
    removable: &[usize],
) -> Changeset {
    if found > expected {
        let surplus = (found - expected) as usize;
        removable[removable.len().saturating_sub(surplus)..]
            .iter()
            .map(|&position| LintCorrection::Delete { position })
            .collect()
    } else if found < expected {
        repeat_n(
            LintCorrection::InsertNewline { position: anchor },
            (expected - found) as usize,
        )
        .collect()
    } else {
        Changeset::new()
    }
}
