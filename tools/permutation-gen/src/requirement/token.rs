//! Requirement expression tokenizer with source spans

use std::fmt;

use crate::error::RequirementError;

/// Source span (byte offsets)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn merge(&self, other: &Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Token kinds
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// Axis name
    Ident(String),
    /// Quoted literal value
    Str(String),
    /// `and` / `&&`
    And,
    /// `or` / `||`
    Or,
    /// `not` / `!`
    Not,
    In,
    True,
    False,
    EqEq,
    NotEq,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Eof,
}

/// Words that can't be used as axis names.
pub const RESERVED_WORDS: &[&str] = &["and", "or", "not", "in", "true", "false", "True", "False"];

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Ident(name) => write!(f, "`{}`", name),
            TokenKind::Str(value) => write!(f, "'{}'", value),
            TokenKind::And => write!(f, "`and`"),
            TokenKind::Or => write!(f, "`or`"),
            TokenKind::Not => write!(f, "`not`"),
            TokenKind::In => write!(f, "`in`"),
            TokenKind::True => write!(f, "`true`"),
            TokenKind::False => write!(f, "`false`"),
            TokenKind::EqEq => write!(f, "`==`"),
            TokenKind::NotEq => write!(f, "`!=`"),
            TokenKind::LParen => write!(f, "`(`"),
            TokenKind::RParen => write!(f, "`)`"),
            TokenKind::LBracket => write!(f, "`[`"),
            TokenKind::RBracket => write!(f, "`]`"),
            TokenKind::Comma => write!(f, "`,`"),
            TokenKind::Eof => write!(f, "end of expression"),
        }
    }
}

/// Token with span
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Tokenizer for requirement expressions
pub struct Tokenizer<'a> {
    input: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.char_indices().peekable(),
        }
    }

    /// Tokenize entire input; the last token is always `Eof`.
    pub fn tokenize(input: &str) -> Result<Vec<Token>, RequirementError> {
        let mut tokenizer = Tokenizer::new(input);
        let mut tokens = Vec::new();

        loop {
            let token = tokenizer.next_token()?;
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }

        Ok(tokens)
    }

    /// Get next token
    pub fn next_token(&mut self) -> Result<Token, RequirementError> {
        self.skip_whitespace();

        let start = self.current_pos();

        let Some(c) = self.peek_char() else {
            return Ok(Token::new(TokenKind::Eof, Span::new(start, start)));
        };

        match c {
            '(' => Ok(self.single(TokenKind::LParen, start)),
            ')' => Ok(self.single(TokenKind::RParen, start)),
            '[' => Ok(self.single(TokenKind::LBracket, start)),
            ']' => Ok(self.single(TokenKind::RBracket, start)),
            ',' => Ok(self.single(TokenKind::Comma, start)),
            '\'' | '"' => self.read_string(c, start),
            '=' => self.read_pair('=', TokenKind::EqEq, start),
            '&' => self.read_pair('&', TokenKind::And, start),
            '|' => self.read_pair('|', TokenKind::Or, start),
            '!' => {
                self.advance();
                if self.peek_char() == Some('=') {
                    self.advance();
                    Ok(Token::new(TokenKind::NotEq, Span::new(start, self.current_pos())))
                } else {
                    Ok(Token::new(TokenKind::Not, Span::new(start, self.current_pos())))
                }
            }
            c if is_ident_start(c) => Ok(self.read_word(start)),
            c if c.is_ascii_digit() || c == '-' => {
                while let Some(c) = self.peek_char() {
                    if c.is_whitespace() || is_delimiter(c) {
                        break;
                    }
                    self.advance();
                }
                let span = Span::new(start, self.current_pos());
                Err(RequirementError::syntax(
                    format!(
                        "unquoted value `{}` (values are strings, write '{}')",
                        &self.input[span.start..span.end],
                        &self.input[span.start..span.end]
                    ),
                    span,
                ))
            }
            c => {
                self.advance();
                Err(RequirementError::syntax(
                    format!("unexpected character `{}`", c),
                    Span::new(start, self.current_pos()),
                ))
            }
        }
    }

    fn single(&mut self, kind: TokenKind, start: usize) -> Token {
        self.advance();
        Token::new(kind, Span::new(start, self.current_pos()))
    }

    /// Two-character operators (`==`, `&&`, `||`)
    fn read_pair(
        &mut self,
        c: char,
        kind: TokenKind,
        start: usize,
    ) -> Result<Token, RequirementError> {
        self.advance();
        if self.peek_char() == Some(c) {
            self.advance();
            return Ok(Token::new(kind, Span::new(start, self.current_pos())));
        }
        Err(RequirementError::syntax(
            format!("expected `{c}{c}`"),
            Span::new(start, self.current_pos()),
        ))
    }

    fn read_string(&mut self, quote: char, start: usize) -> Result<Token, RequirementError> {
        self.advance(); // consume opening quote

        let mut value = String::new();

        loop {
            match self.peek_char() {
                None => {
                    return Err(RequirementError::syntax(
                        "unterminated string",
                        Span::new(start, self.current_pos()),
                    ));
                }
                Some(c) if c == quote => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    self.advance();
                    let Some(escaped) = self.peek_char() else {
                        return Err(RequirementError::syntax(
                            "unterminated escape sequence",
                            Span::new(start, self.current_pos()),
                        ));
                    };
                    self.advance();
                    value.push(escaped);
                }
                Some(c) => {
                    self.advance();
                    value.push(c);
                }
            }
        }

        Ok(Token::new(
            TokenKind::Str(value),
            Span::new(start, self.current_pos()),
        ))
    }

    fn read_word(&mut self, start: usize) -> Token {
        while let Some(c) = self.peek_char() {
            if is_ident_continue(c) {
                self.advance();
            } else {
                break;
            }
        }

        let word = &self.input[start..self.current_pos()];
        let kind = match word {
            "and" => TokenKind::And,
            "or" => TokenKind::Or,
            "not" => TokenKind::Not,
            "in" => TokenKind::In,
            "true" | "True" => TokenKind::True,
            "false" | "False" => TokenKind::False,
            _ => TokenKind::Ident(word.to_string()),
        };

        Token::new(kind, Span::new(start, self.current_pos()))
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek_char() {
            if c.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn advance(&mut self) -> Option<char> {
        self.chars.next().map(|(_, c)| c)
    }

    fn current_pos(&mut self) -> usize {
        self.chars
            .peek()
            .map(|(i, _)| *i)
            .unwrap_or(self.input.len())
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn is_delimiter(c: char) -> bool {
    matches!(c, '(' | ')' | '[' | ']' | ',' | '=' | '!' | '&' | '|')
}

/// Whether `name` can be bound as an axis in requirement expressions.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if is_ident_start(c) => {}
        _ => return false,
    }
    chars.all(is_ident_continue) && !RESERVED_WORDS.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        Tokenizer::tokenize(input)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_python_style_expression() {
        assert_eq!(
            kinds("A == '1' or B == \"x\""),
            vec![
                TokenKind::Ident("A".to_string()),
                TokenKind::EqEq,
                TokenKind::Str("1".to_string()),
                TokenKind::Or,
                TokenKind::Ident("B".to_string()),
                TokenKind::EqEq,
                TokenKind::Str("x".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_symbolic_operators() {
        assert_eq!(
            kinds("!(A != 'a') && B||C"),
            vec![
                TokenKind::Not,
                TokenKind::LParen,
                TokenKind::Ident("A".to_string()),
                TokenKind::NotEq,
                TokenKind::Str("a".to_string()),
                TokenKind::RParen,
                TokenKind::And,
                TokenKind::Ident("B".to_string()),
                TokenKind::Or,
                TokenKind::Ident("C".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_keywords_and_lists() {
        assert_eq!(
            kinds("X not in ['a', 'b'] and True"),
            vec![
                TokenKind::Ident("X".to_string()),
                TokenKind::Not,
                TokenKind::In,
                TokenKind::LBracket,
                TokenKind::Str("a".to_string()),
                TokenKind::Comma,
                TokenKind::Str("b".to_string()),
                TokenKind::RBracket,
                TokenKind::And,
                TokenKind::True,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_spans_are_byte_offsets() {
        let tokens = Tokenizer::tokenize("  MODE == 'lit'").unwrap();
        assert_eq!(tokens[0].span, Span::new(2, 6));
        assert_eq!(tokens[1].span, Span::new(7, 9));
        assert_eq!(tokens[2].span, Span::new(10, 15));
        assert_eq!(tokens[3].span, Span::new(15, 15));
    }

    #[test]
    fn test_escaped_quote_in_string() {
        assert_eq!(
            kinds(r"'it\'s'"),
            vec![TokenKind::Str("it's".to_string()), TokenKind::Eof]
        );
    }

    #[test]
    fn test_unterminated_string() {
        let err = Tokenizer::tokenize("A == 'open").unwrap_err();
        assert_eq!(err.span(), Span::new(5, 10));
        assert!(err.to_string().contains("unterminated string"));
    }

    #[test]
    fn test_unquoted_number_rejected_with_hint() {
        let err = Tokenizer::tokenize("COUNT == 4").unwrap_err();
        assert_eq!(err.span(), Span::new(9, 10));
        assert!(err.to_string().contains("write '4'"), "{err}");
    }

    #[test]
    fn test_single_equals_rejected() {
        let err = Tokenizer::tokenize("A = 'x'").unwrap_err();
        assert!(err.to_string().contains("expected `==`"), "{err}");
    }

    #[test]
    fn test_python_builtins_are_not_operators() {
        let err = Tokenizer::tokenize("__import__('os').system('x')").unwrap_err();
        assert!(err.to_string().contains("unexpected character `.`"), "{err}");
    }

    #[test]
    fn test_is_identifier() {
        assert!(is_identifier("NORMAL_MAP"));
        assert!(is_identifier("_x2"));
        assert!(!is_identifier("2x"));
        assert!(!is_identifier("with space"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("and"));
        assert!(!is_identifier("True"));
    }
}
