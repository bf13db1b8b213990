//! Hand-written tokenizer, grounded on the teacher's `ori_lexer_core`:
//! a single forward scan over the byte slice with `memchr` used to fast-
//! forward through runs of plain text (string-literal bodies, line
//! comments) rather than hand-rolled byte-at-a-time loops.

use lumina_ir::{Location, Position};

use crate::token::{Token, TokenKind};

pub struct Lexer<'a> {
    src: &'a [u8],
    pos: usize,
    line: u32,
    column: u32,
}

fn keyword(word: &str) -> Option<TokenKind> {
    Some(match word {
        "fn" => TokenKind::KwFn,
        "let" => TokenKind::KwLet,
        "mut" => TokenKind::KwMut,
        "return" => TokenKind::KwReturn,
        "if" => TokenKind::KwIf,
        "else" => TokenKind::KwElse,
        "while" => TokenKind::KwWhile,
        "for" => TokenKind::KwFor,
        "match" => TokenKind::KwMatch,
        "struct" => TokenKind::KwStruct,
        "enum" => TokenKind::KwEnum,
        "trait" => TokenKind::KwTrait,
        "impl" => TokenKind::KwImpl,
        "type" => TokenKind::KwType,
        "import" => TokenKind::KwImport,
        "as" => TokenKind::KwAs,
        "from" => TokenKind::KwFrom,
        "extern" => TokenKind::KwExtern,
        "pub" => TokenKind::KwPub,
        "const" => TokenKind::KwConst,
        "is" => TokenKind::KwIs,
        "ref" => TokenKind::KwRef,
        "true" => TokenKind::Boolean(true),
        "false" => TokenKind::Boolean(false),
        "_" => TokenKind::Underscore,
        _ => return None,
    })
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Lexer { src: src.as_bytes(), pos: 0, line: 1, column: 1 }
    }

    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.src.get(self.pos + offset).copied()
    }

    fn position(&self) -> Position {
        Position::new(self.line, self.column, self.pos as u32)
    }

    fn advance(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        if b == b'\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(b)
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(b' ') | Some(b'\t') | Some(b'\r') | Some(b'\n') => {
                    self.advance();
                }
                Some(b'/') if self.peek_at(1) == Some(b'/') => {
                    // Fast-forward to end of line with memchr rather than
                    // advancing byte-by-byte.
                    match memchr::memchr(b'\n', &self.src[self.pos..]) {
                        Some(rel) => {
                            for _ in 0..rel {
                                self.advance();
                            }
                        }
                        None => {
                            while self.peek().is_some() {
                                self.advance();
                            }
                        }
                    }
                }
                _ => break,
            }
        }
    }

    fn lex_number(&mut self) -> TokenKind {
        let start = self.pos;
        while matches!(self.peek(), Some(b) if b.is_ascii_digit()) {
            self.advance();
        }
        if self.peek() == Some(b'.') && matches!(self.peek_at(1), Some(b) if b.is_ascii_digit()) {
            self.advance();
            while matches!(self.peek(), Some(b) if b.is_ascii_digit()) {
                self.advance();
            }
        }
        let text = std::str::from_utf8(&self.src[start..self.pos]).unwrap_or("0");
        TokenKind::Number(text.parse().unwrap_or(0.0))
    }

    fn lex_string(&mut self) -> TokenKind {
        self.advance(); // opening quote
        let mut value = String::new();
        loop {
            match self.peek() {
                None => return TokenKind::Error("unterminated string literal".to_string()),
                Some(b'"') => {
                    self.advance();
                    break;
                }
                Some(b'\\') => {
                    self.advance();
                    match self.advance() {
                        Some(b'n') => value.push('\n'),
                        Some(b't') => value.push('\t'),
                        Some(b'"') => value.push('"'),
                        Some(b'\\') => value.push('\\'),
                        Some(other) => value.push(other as char),
                        None => return TokenKind::Error("unterminated string literal".to_string()),
                    }
                }
                Some(_) => {
                    // Fast-forward through the run of plain characters up
                    // to the next quote/backslash.
                    let rel_quote = memchr::memchr(b'"', &self.src[self.pos..]);
                    let rel_escape = memchr::memchr(b'\\', &self.src[self.pos..]);
                    let stop = match (rel_quote, rel_escape) {
                        (Some(q), Some(e)) => q.min(e),
                        (Some(q), None) => q,
                        (None, Some(e)) => e,
                        (None, None) => self.src.len() - self.pos,
                    };
                    let start = self.pos;
                    for _ in 0..stop {
                        self.advance();
                    }
                    value.push_str(std::str::from_utf8(&self.src[start..self.pos]).unwrap_or(""));
                }
            }
        }
        TokenKind::String(value)
    }

    fn lex_identifier(&mut self) -> TokenKind {
        let start = self.pos;
        while matches!(self.peek(), Some(b) if b.is_ascii_alphanumeric() || b == b'_') {
            self.advance();
        }
        let text = std::str::from_utf8(&self.src[start..self.pos]).unwrap_or("");
        keyword(text).unwrap_or_else(|| TokenKind::Identifier(text.to_string()))
    }

    pub fn next_token(&mut self) -> Token {
        self.skip_trivia();
        let start = self.position();
        let kind = match self.peek() {
            None => TokenKind::Eof,
            Some(b) if b.is_ascii_digit() => self.lex_number(),
            Some(b'"') => self.lex_string(),
            Some(b) if b.is_ascii_alphabetic() || b == b'_' => self.lex_identifier(),
            Some(b'+') => { self.advance(); TokenKind::Plus }
            Some(b'-') => {
                self.advance();
                if self.peek() == Some(b'>') {
                    self.advance();
                    TokenKind::Arrow
                } else {
                    TokenKind::Minus
                }
            }
            Some(b'*') => { self.advance(); TokenKind::StarOp }
            Some(b'/') => { self.advance(); TokenKind::Slash }
            Some(b'%') => { self.advance(); TokenKind::Percent }
            Some(b'=') => {
                self.advance();
                if self.peek() == Some(b'=') {
                    self.advance();
                    TokenKind::EqEq
                } else {
                    TokenKind::Eq
                }
            }
            Some(b'!') => {
                self.advance();
                if self.peek() == Some(b'=') {
                    self.advance();
                    TokenKind::NotEq
                } else {
                    TokenKind::Error("unexpected `!`".to_string())
                }
            }
            Some(b'<') => {
                self.advance();
                if self.peek() == Some(b'=') {
                    self.advance();
                    TokenKind::Le
                } else {
                    TokenKind::Lt
                }
            }
            Some(b'>') => {
                self.advance();
                if self.peek() == Some(b'=') {
                    self.advance();
                    TokenKind::Ge
                } else {
                    TokenKind::Gt
                }
            }
            Some(b'&') => {
                self.advance();
                if self.peek() == Some(b'&') {
                    self.advance();
                    TokenKind::AndAnd
                } else {
                    TokenKind::Error("unexpected `&`".to_string())
                }
            }
            Some(b'|') => {
                self.advance();
                match self.peek() {
                    Some(b'|') => {
                        self.advance();
                        TokenKind::OrOr
                    }
                    Some(b'>') => {
                        self.advance();
                        TokenKind::PipeGt
                    }
                    _ => TokenKind::Error("unexpected `|`".to_string()),
                }
            }
            Some(b':') => {
                self.advance();
                if self.peek() == Some(b':') {
                    self.advance();
                    TokenKind::ColonColon
                } else {
                    TokenKind::Colon
                }
            }
            Some(b',') => { self.advance(); TokenKind::Comma }
            Some(b'.') => { self.advance(); TokenKind::Dot }
            Some(b'(') => { self.advance(); TokenKind::LParen }
            Some(b')') => { self.advance(); TokenKind::RParen }
            Some(b'{') => { self.advance(); TokenKind::LBrace }
            Some(b'}') => { self.advance(); TokenKind::RBrace }
            Some(b'[') => { self.advance(); TokenKind::LBracket }
            Some(b']') => { self.advance(); TokenKind::RBracket }
            Some(b';') => { self.advance(); TokenKind::Semicolon }
            Some(other) => {
                self.advance();
                TokenKind::Error(format!("invalid character `{}`", other as char))
            }
        };
        let end = self.position();
        Token { kind, location: Location::new(start, end) }
    }

    /// Tokenize the whole input, always ending in exactly one `Eof` token.
    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token();
            let done = tok.kind == TokenKind::Eof;
            tokens.push(tok);
            if done {
                break;
            }
        }
        tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::new(src).tokenize().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn lexes_function_signature() {
        let toks = kinds("fn inc(x: int) -> int { x }");
        assert_eq!(
            toks,
            vec![
                TokenKind::KwFn,
                TokenKind::Identifier("inc".into()),
                TokenKind::LParen,
                TokenKind::Identifier("x".into()),
                TokenKind::Colon,
                TokenKind::Identifier("int".into()),
                TokenKind::RParen,
                TokenKind::Arrow,
                TokenKind::Identifier("int".into()),
                TokenKind::LBrace,
                TokenKind::Identifier("x".into()),
                TokenKind::RBrace,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lexes_pipe_and_string() {
        let toks = kinds(r#"3 |> double("hi\n")"#);
        assert_eq!(
            toks,
            vec![
                TokenKind::Number(3.0),
                TokenKind::PipeGt,
                TokenKind::Identifier("double".into()),
                TokenKind::LParen,
                TokenKind::String("hi\n".into()),
                TokenKind::RParen,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn skips_line_comments() {
        let toks = kinds("// hello\nlet x = 1");
        assert_eq!(
            toks,
            vec![TokenKind::KwLet, TokenKind::Identifier("x".into()), TokenKind::Eq, TokenKind::Number(1.0), TokenKind::Eof]
        );
    }

    #[test]
    fn reports_unterminated_string_as_error_token_not_panic() {
        let toks = kinds("\"unterminated");
        assert!(matches!(toks[0], TokenKind::Error(_)));
    }
}
