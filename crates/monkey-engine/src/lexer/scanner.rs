//! The scanner that produces tokens from source text.

use super::{Span, Token, TokenKind};

/// A scanner that tokenizes Monkey source code.
pub struct Scanner<'a> {
    source: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    current_pos: usize,
    finished: bool,
}

impl<'a> Scanner<'a> {
    /// Creates a new scanner for the given source code.
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            current_pos: 0,
            finished: false,
        }
    }

    /// Returns the next token from the source.
    ///
    /// Once the input is exhausted every further call yields `Eof`.
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace_and_comments();

        let start = self.current_pos;

        let Some((_pos, ch)) = self.advance() else {
            return Token::new(TokenKind::Eof, Span::new(start, start));
        };

        let kind = match ch {
            // Single-character tokens
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Asterisk,
            '/' => TokenKind::Slash,
            '<' => TokenKind::Lt,
            '>' => TokenKind::Gt,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            ':' => TokenKind::Colon,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,

            // One- or two-character tokens
            '=' => self.scan_equal(),
            '!' => self.scan_bang(),

            '"' => self.scan_string(),

            '0'..='9' => self.scan_number(start),

            _ if is_id_start(ch) => self.scan_identifier(start),

            _ => TokenKind::Illegal(ch.to_string()),
        };

        Token::new(kind, Span::new(start, self.current_pos))
    }

    fn advance(&mut self) -> Option<(usize, char)> {
        let result = self.chars.next();
        if let Some((pos, ch)) = result {
            self.current_pos = pos + ch.len_utf8();
        }
        result
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, ch)| *ch)
    }

    fn peek_next(&self) -> Option<char> {
        let mut iter = self.chars.clone();
        iter.next();
        iter.next().map(|(_, ch)| ch)
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.peek() {
                Some(' ' | '\t' | '\n' | '\r') => {
                    self.advance();
                }
                Some('/') if self.peek_next() == Some('/') => {
                    while let Some(ch) = self.peek() {
                        if ch == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    fn scan_equal(&mut self) -> TokenKind {
        if self.peek() == Some('=') {
            self.advance();
            TokenKind::Eq
        } else {
            TokenKind::Assign
        }
    }

    fn scan_bang(&mut self) -> TokenKind {
        if self.peek() == Some('=') {
            self.advance();
            TokenKind::NotEq
        } else {
            TokenKind::Bang
        }
    }

    fn scan_string(&mut self) -> TokenKind {
        let mut value = String::new();

        loop {
            match self.advance() {
                None => return TokenKind::Illegal(format!("\"{}", value)),
                Some((_, '"')) => break,
                Some((_, '\\')) => match self.advance() {
                    Some((_, 'n')) => value.push('\n'),
                    Some((_, 't')) => value.push('\t'),
                    Some((_, 'r')) => value.push('\r'),
                    Some((_, '"')) => value.push('"'),
                    Some((_, '\\')) => value.push('\\'),
                    Some((_, other)) => {
                        value.push('\\');
                        value.push(other);
                    }
                    None => return TokenKind::Illegal(format!("\"{}\\", value)),
                },
                Some((_, ch)) => value.push(ch),
            }
        }

        TokenKind::String(value)
    }

    fn scan_number(&mut self, start: usize) -> TokenKind {
        while matches!(self.peek(), Some('0'..='9')) {
            self.advance();
        }
        TokenKind::Int(self.source[start..self.current_pos].to_string())
    }

    fn scan_identifier(&mut self, start: usize) -> TokenKind {
        while let Some(ch) = self.peek() {
            if !is_id_continue(ch) {
                break;
            }
            self.advance();
        }

        let text = &self.source[start..self.current_pos];
        TokenKind::keyword(text).unwrap_or_else(|| TokenKind::Identifier(text.to_string()))
    }
}

/// Checks if a character can start an identifier.
fn is_id_start(ch: char) -> bool {
    ch == '_' || unicode_xid::UnicodeXID::is_xid_start(ch)
}

/// Checks if a character can continue an identifier.
fn is_id_continue(ch: char) -> bool {
    ch == '_' || unicode_xid::UnicodeXID::is_xid_continue(ch)
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let token = self.next_token();
        if token.kind == TokenKind::Eof {
            self.finished = true;
            None
        } else {
            Some(token)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Scanner::new(source).map(|t| t.kind).collect()
    }

    fn ident(name: &str) -> TokenKind {
        TokenKind::Identifier(name.to_string())
    }

    fn int(text: &str) -> TokenKind {
        TokenKind::Int(text.to_string())
    }

    #[test]
    fn test_single_character_tokens() {
        assert_eq!(
            kinds("=+(){},;"),
            vec![
                TokenKind::Assign,
                TokenKind::Plus,
                TokenKind::LParen,
                TokenKind::RParen,
                TokenKind::LBrace,
                TokenKind::RBrace,
                TokenKind::Comma,
                TokenKind::Semicolon,
            ]
        );
    }

    #[test]
    fn test_let_and_function() {
        let source = "let five = 5;\nlet add = fn(x, y) { x + y; };";
        assert_eq!(
            kinds(source),
            vec![
                TokenKind::Let,
                ident("five"),
                TokenKind::Assign,
                int("5"),
                TokenKind::Semicolon,
                TokenKind::Let,
                ident("add"),
                TokenKind::Assign,
                TokenKind::Function,
                TokenKind::LParen,
                ident("x"),
                TokenKind::Comma,
                ident("y"),
                TokenKind::RParen,
                TokenKind::LBrace,
                ident("x"),
                TokenKind::Plus,
                ident("y"),
                TokenKind::Semicolon,
                TokenKind::RBrace,
                TokenKind::Semicolon,
            ]
        );
    }

    #[test]
    fn test_operators_and_keywords() {
        let source = "!-/*5; 5 < 10 > 5; if (5 < 10) { return true; } else { return false; } 10 == 10; 10 != 9;";
        assert_eq!(
            kinds(source),
            vec![
                TokenKind::Bang,
                TokenKind::Minus,
                TokenKind::Slash,
                TokenKind::Asterisk,
                int("5"),
                TokenKind::Semicolon,
                int("5"),
                TokenKind::Lt,
                int("10"),
                TokenKind::Gt,
                int("5"),
                TokenKind::Semicolon,
                TokenKind::If,
                TokenKind::LParen,
                int("5"),
                TokenKind::Lt,
                int("10"),
                TokenKind::RParen,
                TokenKind::LBrace,
                TokenKind::Return,
                TokenKind::True,
                TokenKind::Semicolon,
                TokenKind::RBrace,
                TokenKind::Else,
                TokenKind::LBrace,
                TokenKind::Return,
                TokenKind::False,
                TokenKind::Semicolon,
                TokenKind::RBrace,
                int("10"),
                TokenKind::Eq,
                int("10"),
                TokenKind::Semicolon,
                int("10"),
                TokenKind::NotEq,
                int("9"),
                TokenKind::Semicolon,
            ]
        );
    }

    #[test]
    fn test_strings_arrays_and_hashes() {
        assert_eq!(
            kinds(r#""foobar" "foo bar" [1, 2]; {"foo": "bar"}"#),
            vec![
                TokenKind::String("foobar".into()),
                TokenKind::String("foo bar".into()),
                TokenKind::LBracket,
                int("1"),
                TokenKind::Comma,
                int("2"),
                TokenKind::RBracket,
                TokenKind::Semicolon,
                TokenKind::LBrace,
                TokenKind::String("foo".into()),
                TokenKind::Colon,
                TokenKind::String("bar".into()),
                TokenKind::RBrace,
            ]
        );
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            kinds(r#""a\nb\t\"c\"""#),
            vec![TokenKind::String("a\nb\t\"c\"".into())]
        );
    }

    #[test]
    fn test_unterminated_string_is_illegal() {
        let tokens = kinds("\"abc");
        assert!(matches!(tokens.as_slice(), [TokenKind::Illegal(_)]));
    }

    #[test]
    fn test_comments_are_skipped() {
        assert_eq!(
            kinds("// leading comment\nx // trailing\n"),
            vec![ident("x")]
        );
    }

    #[test]
    fn test_illegal_character() {
        assert_eq!(kinds("@"), vec![TokenKind::Illegal("@".into())]);
    }

    #[test]
    fn test_spans() {
        let mut scanner = Scanner::new("let x");
        assert_eq!(scanner.next_token().span, Span::new(0, 3));
        assert_eq!(scanner.next_token().span, Span::new(4, 5));
        assert_eq!(scanner.next_token().kind, TokenKind::Eof);
        assert_eq!(scanner.next_token().kind, TokenKind::Eof);
    }
}
