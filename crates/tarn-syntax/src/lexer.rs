//! Lexer for the Tarn specification language.
//!
//! Converts source text into a stream of tokens. There are no lexical
//! errors: characters that start no token are skipped, and whatever
//! damage that does to the token stream surfaces as a parse error.

use crate::token::{Span, Token, TokenKind};
use std::str::Chars;

/// Lexer for Tarn source code.
pub struct Lexer<'a> {
    /// Source text being lexed.
    source: &'a str,
    /// Character iterator.
    chars: Chars<'a>,
    /// Current byte position.
    pos: usize,
    /// Current line number (1-indexed).
    line: u32,
    /// Current column number (1-indexed).
    column: u32,
    /// Start position of current token.
    token_start: usize,
    /// Start line of current token.
    token_start_line: u32,
    /// Start column of current token.
    token_start_column: u32,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given source text.
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.chars(),
            pos: 0,
            line: 1,
            column: 1,
            token_start: 0,
            token_start_line: 1,
            token_start_column: 1,
        }
    }

    /// Tokenize the entire source, returning all tokens including EOF.
    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let is_eof = token.is_eof();
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }

    /// Get the next token.
    pub fn next_token(&mut self) -> Token {
        loop {
            self.skip_whitespace();

            // Line comment: discard to end of line.
            if self.peek() == Some('#') {
                while let Some(c) = self.peek() {
                    if c == '\n' {
                        break;
                    }
                    self.advance();
                }
                continue;
            }

            self.mark_token_start();

            let Some(c) = self.peek() else {
                return self.make_token(TokenKind::Eof);
            };

            if c.is_ascii_alphabetic() || c == '_' {
                return self.lex_identifier();
            }

            if let Some(token) = self.lex_operator_or_punctuation() {
                return token;
            }
            // Unrecognized character: silently skipped.
        }
    }

    /// Skip whitespace characters.
    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Mark the start of a new token.
    fn mark_token_start(&mut self) {
        self.token_start = self.pos;
        self.token_start_line = self.line;
        self.token_start_column = self.column;
    }

    /// Peek at the current character without consuming it.
    fn peek(&self) -> Option<char> {
        self.chars.clone().next()
    }

    /// Peek at the character `n` positions ahead (0 = current).
    fn peek_at(&self, n: usize) -> Option<char> {
        self.chars.clone().nth(n)
    }

    /// Advance to the next character, returning it.
    fn advance(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    /// Create a token spanning from the marked start to the current position.
    fn make_token(&self, kind: TokenKind) -> Token {
        Token::new(
            kind,
            Span::new(
                self.token_start,
                self.pos,
                self.token_start_line,
                self.token_start_column,
            ),
        )
    }

    /// Get the text of the current token.
    fn token_text(&self) -> &'a str {
        &self.source[self.token_start..self.pos]
    }

    /// Lex an identifier or keyword.
    fn lex_identifier(&mut self) -> Token {
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                self.advance();
            } else {
                break;
            }
        }

        let text = self.token_text();
        if let Some(keyword) = TokenKind::keyword(text) {
            self.make_token(keyword)
        } else {
            self.make_token(TokenKind::Ident(text.to_string()))
        }
    }

    /// Lex an operator or punctuation token. Returns `None` when the
    /// current character starts no token; the character has been
    /// consumed in that case.
    fn lex_operator_or_punctuation(&mut self) -> Option<Token> {
        let c = self.advance()?;

        let kind = match c {
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '.' => TokenKind::Dot,
            ';' => TokenKind::Semi,
            ',' => TokenKind::Comma,
            '&' => TokenKind::Ampersand,
            '|' => TokenKind::Pipe,
            '=' => TokenKind::Equal,
            ':' => {
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::ColonEquals
                } else {
                    TokenKind::Colon
                }
            }
            '!' => {
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::NotEq
                } else {
                    TokenKind::Bang
                }
            }
            '-' => {
                if self.peek() == Some('>') {
                    self.advance();
                    TokenKind::Implies
                } else {
                    return None;
                }
            }
            '<' => {
                if self.peek() == Some('-') && self.peek_at(1) == Some('>') {
                    self.advance();
                    self.advance();
                    TokenKind::Iff
                } else {
                    return None;
                }
            }
            _ => return None,
        };

        Some(self.make_token(kind))
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.next_token();
        if token.is_eof() {
            None
        } else {
            Some(token)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> Vec<TokenKind> {
        Lexer::new(source)
            .tokenize()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_empty() {
        assert_eq!(lex(""), vec![TokenKind::Eof]);
    }

    #[test]
    fn test_whitespace() {
        assert_eq!(lex("   \n\t  "), vec![TokenKind::Eof]);
    }

    #[test]
    fn test_keywords() {
        assert_eq!(
            lex("sort mutable relation transition"),
            vec![
                TokenKind::Sort,
                TokenKind::Mutable,
                TokenKind::Relation,
                TokenKind::Transition,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_identifiers() {
        assert_eq!(
            lex("foo bar_baz _private x0"),
            vec![
                TokenKind::Ident("foo".to_string()),
                TokenKind::Ident("bar_baz".to_string()),
                TokenKind::Ident("_private".to_string()),
                TokenKind::Ident("x0".to_string()),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_punctuation() {
        assert_eq!(
            lex("( ) [ ] { } . : := ; ! <-> -> | = != , &"),
            vec![
                TokenKind::LParen,
                TokenKind::RParen,
                TokenKind::LBracket,
                TokenKind::RBracket,
                TokenKind::LBrace,
                TokenKind::RBrace,
                TokenKind::Dot,
                TokenKind::Colon,
                TokenKind::ColonEquals,
                TokenKind::Semi,
                TokenKind::Bang,
                TokenKind::Iff,
                TokenKind::Implies,
                TokenKind::Pipe,
                TokenKind::Equal,
                TokenKind::NotEq,
                TokenKind::Comma,
                TokenKind::Ampersand,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_compound_vs_simple() {
        assert_eq!(
            lex("!= ! := : ->"),
            vec![
                TokenKind::NotEq,
                TokenKind::Bang,
                TokenKind::ColonEquals,
                TokenKind::Colon,
                TokenKind::Implies,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_comments_discarded() {
        assert_eq!(
            lex("foo # a comment with sort keywords\nbar"),
            vec![
                TokenKind::Ident("foo".to_string()),
                TokenKind::Ident("bar".to_string()),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_comment_at_eof() {
        assert_eq!(
            lex("foo # no trailing newline"),
            vec![TokenKind::Ident("foo".to_string()), TokenKind::Eof]
        );
    }

    #[test]
    fn test_unrecognized_characters_skipped() {
        // `@`, `$`, a lone `<` and a lone `-` start no token and are dropped.
        assert_eq!(
            lex("foo @ $ < - bar"),
            vec![
                TokenKind::Ident("foo".to_string()),
                TokenKind::Ident("bar".to_string()),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_keyword_prefix_is_identifier() {
        assert_eq!(
            lex("sorted transitions"),
            vec![
                TokenKind::Ident("sorted".to_string()),
                TokenKind::Ident("transitions".to_string()),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_span_tracking() {
        let tokens = Lexer::new("foo bar").tokenize();
        assert_eq!(tokens[0].span.line, 1);
        assert_eq!(tokens[0].span.column, 1);
        assert_eq!(tokens[1].span.line, 1);
        assert_eq!(tokens[1].span.column, 5);
    }

    #[test]
    fn test_span_multiline() {
        let tokens = Lexer::new("foo\n  bar").tokenize();
        assert_eq!(tokens[0].span.line, 1);
        assert_eq!(tokens[1].span.line, 2);
        assert_eq!(tokens[1].span.column, 3);
    }

    #[test]
    fn test_sample_declaration() {
        let tokens = lex("mutable relation pending(node, node)");
        assert_eq!(
            tokens,
            vec![
                TokenKind::Mutable,
                TokenKind::Relation,
                TokenKind::Ident("pending".to_string()),
                TokenKind::LParen,
                TokenKind::Ident("node".to_string()),
                TokenKind::Comma,
                TokenKind::Ident("node".to_string()),
                TokenKind::RParen,
                TokenKind::Eof
            ]
        );
    }
}
