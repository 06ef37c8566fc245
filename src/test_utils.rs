//! A small PHP lexer for test fixtures. It only knows enough to produce the
//! token layout PHP_CodeSniffer would: whitespace split after each line
//! ending, `//` comments carrying their newline, and scope openers/closers
//! for classes, interfaces and functions.

use crate::{
    errors::{LintError, LintLevel},
    fix::Fixer,
    rules::{Invocation, Rule},
    token::{Token, TokenFile, TokenKind},
};

pub(crate) fn tokenize(source: &str) -> TokenFile {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut line = 1;
    let mut index = 0;

    while index < chars.len() {
        let start = index;
        let c = chars[index];
        let kind = if source[byte_offset(&chars, index)..].starts_with("<?php") {
            index += 5;
            if chars.get(index) == Some(&'\n') {
                index += 1;
            }
            TokenKind::Other
        } else if c == ' ' || c == '\t' || c == '\n' {
            while index < chars.len() && (chars[index] == ' ' || chars[index] == '\t') {
                index += 1;
            }
            if chars.get(index) == Some(&'\n') {
                index += 1;
            }
            TokenKind::Whitespace
        } else if c == '/' && chars.get(index + 1) == Some(&'/') {
            while index < chars.len() && chars[index] != '\n' {
                index += 1;
            }
            if index < chars.len() {
                index += 1;
            }
            TokenKind::Comment
        } else if c.is_alphanumeric() || c == '_' || c == '$' || c == '\\' {
            while index < chars.len()
                && (chars[index].is_alphanumeric() || matches!(chars[index], '_' | '$' | '\\'))
            {
                index += 1;
            }
            let word: String = chars[start..index].iter().collect();
            match word.to_ascii_lowercase().as_str() {
                "class" => TokenKind::Class,
                "interface" => TokenKind::Interface,
                "function" => TokenKind::Function,
                "const" => TokenKind::Const,
                "use" => TokenKind::Use,
                _ => TokenKind::Other,
            }
        } else {
            index += 1;
            match c {
                '{' => TokenKind::OpenCurlyBracket,
                '}' => TokenKind::CloseCurlyBracket,
                ';' => TokenKind::Semicolon,
                _ => TokenKind::Other,
            }
        };

        let content: String = chars[start..index].iter().collect();
        let newlines = content.matches('\n').count();
        tokens.push(Token::new(kind, line, content));
        line += newlines;
    }

    assign_scopes(&mut tokens);
    TokenFile::new(tokens)
}

fn byte_offset(chars: &[char], index: usize) -> usize {
    chars[..index].iter().map(|c| c.len_utf8()).sum()
}

fn assign_scopes(tokens: &mut [Token]) {
    let mut pairs = vec![None; tokens.len()];
    let mut open = Vec::new();
    for (position, token) in tokens.iter().enumerate() {
        match token.kind {
            TokenKind::OpenCurlyBracket => open.push(position),
            TokenKind::CloseCurlyBracket => {
                if let Some(opener) = open.pop() {
                    pairs[opener] = Some(position);
                }
            }
            _ => {}
        }
    }

    for position in 0..tokens.len() {
        if !matches!(
            tokens[position].kind,
            TokenKind::Class | TokenKind::Interface | TokenKind::Function
        ) {
            continue;
        }
        let opener = (position + 1..tokens.len()).find(|&next| {
            matches!(
                tokens[next].kind,
                TokenKind::OpenCurlyBracket | TokenKind::Semicolon
            )
        });
        if let Some(opener) =
            opener.filter(|&opener| tokens[opener].kind == TokenKind::OpenCurlyBracket)
        {
            if let Some(closer) = pairs[opener] {
                tokens[position].scope_opener = Some(opener);
                tokens[position].scope_closer = Some(closer);
            }
        }
    }
}

/// Runs a single rule over every token it registered for.
pub(crate) fn check(rule: &dyn Rule, source: &str) -> Vec<LintError> {
    check_file(rule, &tokenize(source))
}

fn check_file(rule: &dyn Rule, file: &TokenFile) -> Vec<LintError> {
    let mut errors = Vec::new();
    for (position, token) in file.tokens().iter().enumerate() {
        if rule.register().contains(&token.kind) {
            if let Some(rule_errors) =
                rule.process(&Invocation::new(file, position), LintLevel::Error)
            {
                errors.extend(rule_errors);
            }
        }
    }
    errors
}

/// Applies a single rule's fixes until it stops reporting fixable errors.
pub(crate) fn fix(rule: &dyn Rule, source: &str) -> String {
    let mut file = tokenize(source);
    for _ in 0..10 {
        let errors = check_file(rule, &file);
        if errors.iter().all(|error| !error.is_fixable()) {
            break;
        }
        let mut fixer = Fixer::new(&file);
        for changeset in errors.iter().filter_map(|error| error.fix()) {
            fixer.apply(changeset);
        }
        file = fixer.finish();
    }
    file.render()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_layout() {
        let file = tokenize("<?php\nclass Foo {\n\n    // note\n}\n");
        let kinds: Vec<TokenKind> = file.tokens().iter().map(|token| token.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Other,
                TokenKind::Class,
                TokenKind::Whitespace,
                TokenKind::Other,
                TokenKind::Whitespace,
                TokenKind::OpenCurlyBracket,
                TokenKind::Whitespace,
                TokenKind::Whitespace,
                TokenKind::Whitespace,
                TokenKind::Comment,
                TokenKind::CloseCurlyBracket,
                TokenKind::Whitespace,
            ]
        );
        assert_eq!(file.get(1).unwrap().scope_opener, Some(5));
        assert_eq!(file.get(1).unwrap().scope_closer, Some(10));
        assert_eq!(file.get(9).unwrap().content, "// note\n");
        assert_eq!(file.get(10).unwrap().line, 5);
        assert_eq!(file.render(), "<?php\nclass Foo {\n\n    // note\n}\n");
    }

    #[test]
    fn test_signature_has_no_scope() {
        let file = tokenize("<?php\ninterface A\n{\n    function b();\n}\n");
        let function = file
            .find_next(&[TokenKind::Function], 0, None, false)
            .unwrap();
        assert_eq!(file.get(function).unwrap().scope_closer, None);
    }
}
