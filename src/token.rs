use std::{collections::HashMap, fmt::Display};

use serde::{Deserialize, Serialize};

use crate::app_error::AppError;

/// Token categories the sniffs care about. Everything else the host
/// tokenizer emits collapses into `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum TokenKind {
    Whitespace,
    Comment,
    Const,
    Use,
    OpenCurlyBracket,
    CloseCurlyBracket,
    Function,
    Class,
    Interface,
    Semicolon,
    Other,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Whitespace => "whitespace",
            Self::Comment => "comment",
            Self::Const => "const",
            Self::Use => "use",
            Self::OpenCurlyBracket => "open_curly_bracket",
            Self::CloseCurlyBracket => "close_curly_bracket",
            Self::Function => "function",
            Self::Class => "class",
            Self::Interface => "interface",
            Self::Semicolon => "semicolon",
            Self::Other => "other",
        }
    }
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Accepts both the crate's own names and PHP_CodeSniffer's (`T_WHITESPACE`).
impl From<&str> for TokenKind {
    fn from(value: &str) -> Self {
        let value = value.strip_prefix("T_").unwrap_or(value);
        match value.to_ascii_lowercase().as_str() {
            "whitespace" => Self::Whitespace,
            "comment" => Self::Comment,
            "const" => Self::Const,
            "use" => Self::Use,
            "open_curly_bracket" => Self::OpenCurlyBracket,
            "close_curly_bracket" => Self::CloseCurlyBracket,
            "function" => Self::Function,
            "class" => Self::Class,
            "interface" => Self::Interface,
            "semicolon" => Self::Semicolon,
            _ => Self::Other,
        }
    }
}

impl From<String> for TokenKind {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<TokenKind> for String {
    fn from(kind: TokenKind) -> Self {
        kind.as_str().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    /// 1-indexed
    pub line: usize,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope_opener: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope_closer: Option<usize>,
}

impl Token {
    pub fn new(kind: TokenKind, line: usize, content: impl Into<String>) -> Self {
        Self {
            kind,
            line,
            content: content.into(),
            scope_opener: None,
            scope_closer: None,
        }
    }

    pub fn with_scope(mut self, opener: usize, closer: usize) -> Self {
        self.scope_opener = Some(opener);
        self.scope_closer = Some(closer);
        self
    }

    pub(crate) fn line_delta(&self, other: &Token) -> isize {
        self.line as isize - other.line as isize
    }
}

fn default_eol() -> String {
    "\n".to_string()
}

/// A host-tokenized file. Positions are stable indexes into `tokens`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TokenFile {
    #[serde(default = "default_eol")]
    eol: String,
    tokens: Vec<Token>,
}

impl TokenFile {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            eol: default_eol(),
            tokens,
        }
    }

    pub fn with_eol(mut self, eol: impl Into<String>) -> Self {
        self.eol = eol.into();
        self
    }

    /// Reads a JSON token dump, as produced by the host tokenizer, and
    /// validates it. Whitespace spanning several lines is split so that each
    /// line ending sits in its own token.
    pub fn from_json(source_name: &str, json: &str) -> Result<Self, AppError> {
        let file: Self = serde_json::from_str(json)
            .map_err(|err| AppError::TokenStreamError(source_name.to_string(), err))?;
        file.validate()?;
        Ok(file.split_line_breaks(&HashMap::new()))
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.eol.is_empty() {
            return Err(AppError::InvalidTokenStream(
                "end-of-line marker must not be empty".to_string(),
            ));
        }

        let mut previous_line = 1;
        for (position, token) in self.tokens.iter().enumerate() {
            if token.line < previous_line {
                return Err(AppError::InvalidTokenStream(format!(
                    "token {position} is on line {} after a token on line {previous_line}",
                    token.line
                )));
            }
            previous_line = token.line;

            for scope in [token.scope_opener, token.scope_closer].into_iter().flatten() {
                if scope >= self.tokens.len() {
                    return Err(AppError::InvalidTokenStream(format!(
                        "token {position} points at scope position {scope}, \
                         but the file has {} tokens",
                        self.tokens.len()
                    )));
                }
            }
        }

        Ok(())
    }

    pub fn eol(&self) -> &str {
        &self.eol
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub(crate) fn tokens_mut(&mut self) -> &mut [Token] {
        &mut self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&Token> {
        self.tokens.get(position)
    }

    pub fn contains_eol(&self, position: usize) -> bool {
        self.get(position)
            .is_some_and(|token| token.content.contains(self.eol.as_str()))
    }

    /// Searches `start..end` for the first token whose kind is in `kinds`, or
    /// with `exclude`, the first token whose kind is not.
    pub fn find_next(
        &self,
        kinds: &[TokenKind],
        start: usize,
        end: Option<usize>,
        exclude: bool,
    ) -> Option<usize> {
        let end = end.unwrap_or(self.tokens.len()).min(self.tokens.len());
        (start..end).find(|&position| kinds.contains(&self.tokens[position].kind) != exclude)
    }

    /// Searches backwards from `start` down to `end` (inclusive).
    pub fn find_previous(
        &self,
        kinds: &[TokenKind],
        start: usize,
        end: Option<usize>,
        exclude: bool,
    ) -> Option<usize> {
        if self.tokens.is_empty() {
            return None;
        }
        let start = start.min(self.tokens.len() - 1);
        let end = end.unwrap_or(0);
        if end > start {
            return None;
        }
        (end..=start)
            .rev()
            .find(|&position| kinds.contains(&self.tokens[position].kind) != exclude)
    }

    pub fn render(&self) -> String {
        self.tokens.iter().map(|token| token.content.as_str()).collect()
    }

    /// Rebuilds the token list with one whitespace token per line ending and
    /// no empty whitespace. `trailing_newlines` adds line-ending tokens after
    /// the given positions. Scope positions keep pointing at the same tokens.
    pub(crate) fn split_line_breaks(&self, trailing_newlines: &HashMap<usize, usize>) -> Self {
        let mut remapped = Vec::with_capacity(self.tokens.len());
        let mut tokens: Vec<Token> = Vec::with_capacity(self.tokens.len());

        for (position, token) in self.tokens.iter().enumerate() {
            remapped.push(tokens.len());
            let mut line = token.line;
            if token.kind == TokenKind::Whitespace {
                for piece in split_lines(&token.content, &self.eol) {
                    tokens.push(Token::new(TokenKind::Whitespace, line, piece));
                    line += piece.matches(self.eol.as_str()).count();
                }
                continue;
            }

            tokens.push(token.clone());
            line += token.content.matches(self.eol.as_str()).count();
            let newlines = trailing_newlines.get(&position).copied().unwrap_or(0);
            for offset in 0..newlines {
                tokens.push(Token::new(
                    TokenKind::Whitespace,
                    line + offset,
                    self.eol.as_str(),
                ));
            }
        }

        let last = tokens.len().saturating_sub(1);
        for token in tokens.iter_mut() {
            token.scope_opener = token.scope_opener.map(|old| remapped[old].min(last));
            token.scope_closer = token.scope_closer.map(|old| remapped[old].min(last));
        }

        Self {
            eol: self.eol.clone(),
            tokens,
        }
    }

    /// Reassigns line numbers from token contents, starting from the first
    /// token's line.
    pub(crate) fn renumber_lines(&mut self) {
        let mut line = self.tokens.first().map_or(1, |token| token.line);
        let eol = self.eol.clone();
        for token in self.tokens.iter_mut() {
            token.line = line;
            line += token.content.matches(eol.as_str()).count();
        }
    }
}

/// Splits whitespace after each line ending, dropping empty pieces.
fn split_lines<'a>(content: &'a str, eol: &str) -> impl Iterator<Item = &'a str> + 'a {
    let mut cuts: Vec<usize> = content
        .match_indices(eol)
        .map(|(index, _)| index + eol.len())
        .collect();
    cuts.push(content.len());

    let mut start = 0;
    cuts.into_iter().filter_map(move |end| {
        let piece = &content[start..end];
        start = end;
        (!piece.is_empty()).then_some(piece)
    })
}
