//! Source text → token stream.
//!
//! A straightforward single-pass scanner over `Vec<char>` (not raw bytes —
//! string/identifier content may contain accented Spanish letters, so
//! indexing by byte offset would risk slicing mid-codepoint). Comments run
//! to end of line; whitespace is otherwise skipped; `line` is tracked so
//! every token (and every error) can point back at a source line.

use crate::error::{HispanoError, Result};
use crate::token::{Interner, Literal, Span, TemplatePayload, Token, TokenKind, lookup_keyword};

pub struct Lexer<'a> {
    interner: &'a mut Interner,
    chars: Vec<char>,
    byte_offsets: Vec<usize>,
    start: usize,
    current: usize,
    line: usize,
}

/// Token kinds that can sit immediately to the left of a value — used to
/// decide whether a bare `y` reads as the logical-AND operator or as an
/// ordinary identifier.
fn is_value_producing(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Identifier
            | TokenKind::Number
            | TokenKind::String
            | TokenKind::TemplateString
            | TokenKind::Verdadero
            | TokenKind::Falso
            | TokenKind::Nulo
            | TokenKind::Indefinido
            | TokenKind::RightParen
            | TokenKind::RightBracket
    )
}

impl<'a> Lexer<'a> {
    pub fn new(source: &str, interner: &'a mut Interner) -> Self {
        let chars: Vec<char> = source.chars().collect();
        let mut byte_offsets = Vec::with_capacity(chars.len() + 1);
        let mut offset = 0;
        for c in &chars {
            byte_offsets.push(offset);
            offset += c.len_utf8();
        }
        byte_offsets.push(offset);

        Lexer { interner, chars, byte_offsets, start: 0, current: 0, line: 1 }
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            self.skip_trivia();
            self.start = self.current;
            if self.is_at_end() {
                tokens.push(self.make_token(TokenKind::Eof, None));
                break;
            }
            let token = self.scan_token(tokens.last().map(|t: &Token| t.kind))?;
            tokens.push(token);
        }
        Ok(tokens)
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.chars.len()
    }

    fn peek(&self) -> char {
        *self.chars.get(self.current).unwrap_or(&'\0')
    }

    fn peek_at(&self, offset: usize) -> char {
        *self.chars.get(self.current + offset).unwrap_or(&'\0')
    }

    fn advance(&mut self) -> char {
        let c = self.chars[self.current];
        self.current += 1;
        c
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.is_at_end() || self.chars[self.current] != expected {
            return false;
        }
        self.current += 1;
        true
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                ' ' | '\r' | '\t' => {
                    self.current += 1;
                }
                '\n' => {
                    self.line += 1;
                    self.current += 1;
                }
                '/' if self.peek_at(1) == '/' => {
                    while self.peek() != '\n' && !self.is_at_end() {
                        self.current += 1;
                    }
                }
                _ => break,
            }
        }
    }

    fn current_span(&self) -> Span {
        let byte_start = self.byte_offsets[self.start];
        let byte_end = self.byte_offsets[self.current];
        Span::new(byte_start, byte_end, self.line)
    }

    fn lexeme_text(&self) -> String {
        self.chars[self.start..self.current].iter().collect()
    }

    fn make_token(&mut self, kind: TokenKind, literal: Option<Literal>) -> Token {
        let text = self.lexeme_text();
        let symbol = self.interner.intern(&text);
        Token::new(kind, symbol, literal, self.current_span())
    }

    fn scan_token(&mut self, previous_kind: Option<TokenKind>) -> Result<Token> {
        let c = self.advance();
        use TokenKind::*;
        let token = match c {
            '{' => self.make_token(LeftBrace, None),
            '}' => self.make_token(RightBrace, None),
            '(' => self.make_token(LeftParen, None),
            ')' => self.make_token(RightParen, None),
            '[' => self.make_token(LeftBracket, None),
            ']' => self.make_token(RightBracket, None),
            ',' => self.make_token(Comma, None),
            ';' => self.make_token(Semicolon, None),
            ':' => self.make_token(Colon, None),
            '.' => self.make_token(Dot, None),
            '+' => {
                if self.match_char('+') {
                    self.make_token(PlusPlus, None)
                } else if self.match_char('=') {
                    self.make_token(PlusEqual, None)
                } else {
                    self.make_token(Plus, None)
                }
            }
            '-' => {
                if self.match_char('-') {
                    self.make_token(MinusMinus, None)
                } else if self.match_char('=') {
                    self.make_token(MinusEqual, None)
                } else {
                    self.make_token(Minus, None)
                }
            }
            '*' => {
                if self.match_char('=') {
                    self.make_token(StarEqual, None)
                } else {
                    self.make_token(Star, None)
                }
            }
            '/' => {
                if self.match_char('=') {
                    self.make_token(SlashEqual, None)
                } else {
                    self.make_token(Slash, None)
                }
            }
            '%' => {
                if self.match_char('=') {
                    self.make_token(PercentEqual, None)
                } else {
                    self.make_token(Percent, None)
                }
            }
            '=' => {
                if self.match_char('=') {
                    self.make_token(EqualEqual, None)
                } else if self.match_char('>') {
                    self.make_token(FatArrow, None)
                } else {
                    self.make_token(Equal, None)
                }
            }
            '!' => {
                if self.match_char('=') {
                    self.make_token(BangEqual, None)
                } else {
                    self.make_token(Bang, None)
                }
            }
            '<' => {
                if self.match_char('=') {
                    self.make_token(LessEqual, None)
                } else {
                    self.make_token(Less, None)
                }
            }
            '>' => {
                if self.match_char('=') {
                    self.make_token(GreaterEqual, None)
                } else {
                    self.make_token(Greater, None)
                }
            }
            '"' | '\'' => self.scan_string(c)?,
            '`' => self.scan_template()?,
            _ if c.is_ascii_digit() => self.scan_number(),
            _ if is_identifier_start(c) => self.scan_identifier(previous_kind),
            other => {
                return Err(HispanoError::UnexpectedCharacter { found: other, span: self.current_span() });
            }
        };
        Ok(token)
    }

    fn scan_string(&mut self, quote: char) -> Result<Token> {
        let content_start = self.current;
        while self.peek() != quote && !self.is_at_end() {
            if self.peek() == '\n' {
                self.line += 1;
            }
            self.current += 1;
        }
        if self.is_at_end() {
            return Err(HispanoError::UnterminatedString { span: self.current_span() });
        }
        let content: String = self.chars[content_start..self.current].iter().collect();
        self.current += 1; // closing quote
        Ok(self.make_token(TokenKind::String, Some(Literal::String(content))))
    }

    /// Scans a backtick template, splitting it into literal `parts` and raw
    /// `${ ... }` expression sources. Brace depth is tracked so
    /// `${ {x: 1} }` does not end the interpolation at the inner `}`.
    fn scan_template(&mut self) -> Result<Token> {
        let mut parts = Vec::new();
        let mut expressions = Vec::new();
        let mut current_part = String::new();

        loop {
            if self.is_at_end() {
                return Err(HispanoError::UnterminatedTemplate { span: self.current_span() });
            }
            let c = self.advance();
            match c {
                '`' => {
                    parts.push(current_part);
                    break;
                }
                '\n' => {
                    self.line += 1;
                    current_part.push(c);
                }
                '$' if self.peek() == '{' => {
                    self.current += 1; // consume '{'
                    parts.push(std::mem::take(&mut current_part));
                    let mut depth = 1usize;
                    let mut expr_src = String::new();
                    loop {
                        if self.is_at_end() {
                            return Err(HispanoError::UnterminatedTemplate { span: self.current_span() });
                        }
                        let ec = self.advance();
                        match ec {
                            '{' => {
                                depth += 1;
                                expr_src.push(ec);
                            }
                            '}' => {
                                depth -= 1;
                                if depth == 0 {
                                    break;
                                }
                                expr_src.push(ec);
                            }
                            '\n' => {
                                self.line += 1;
                                expr_src.push(ec);
                            }
                            _ => expr_src.push(ec),
                        }
                    }
                    expressions.push(expr_src);
                }
                _ => current_part.push(c),
            }
        }

        Ok(self.make_token(TokenKind::TemplateString, Some(Literal::Template(TemplatePayload { parts, expressions }))))
    }

    fn scan_number(&mut self) -> Token {
        while self.peek().is_ascii_digit() {
            self.current += 1;
        }
        if self.peek() == '.' && self.peek_at(1).is_ascii_digit() {
            self.current += 1;
            while self.peek().is_ascii_digit() {
                self.current += 1;
            }
        }
        let text = self.lexeme_text();
        let value: f64 = text.parse().unwrap_or(0.0);
        self.make_token(TokenKind::Number, Some(Literal::Number(value)))
    }

    fn scan_identifier(&mut self, previous_kind: Option<TokenKind>) -> Token {
        while is_identifier_continue(self.peek()) {
            self.current += 1;
        }
        let text = self.lexeme_text();

        if text == "y" && self.is_logical_and_position(previous_kind) {
            return self.make_token(TokenKind::Y, None);
        }

        match lookup_keyword(&text) {
            Some(kind) => self.make_token(kind, None),
            None => self.make_token(TokenKind::Identifier, None),
        }
    }

    /// Implements's contextual `y` rule: `y` reads as logical-AND
    /// only when the previous token produced a value and the next character
    /// is whitespace, `)`, `}`, `;`, or end of input.
    fn is_logical_and_position(&self, previous_kind: Option<TokenKind>) -> bool {
        let prev_ok = previous_kind.map(is_value_producing).unwrap_or(false);
        if !prev_ok {
            return false;
        }
        let next = self.peek();
        next == '\0' || next.is_whitespace() || matches!(next, ')' | '}' | ';')
    }
}

fn is_identifier_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_identifier_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_variable_declaration() {
        let mut interner = Interner::new();
        let lexer = Lexer::new("variable a = 10", &mut interner);
        let tokens = lexer.tokenize().unwrap();
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Variable,
                TokenKind::Identifier,
                TokenKind::Equal,
                TokenKind::Number,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn skips_line_comments() {
        let mut interner = Interner::new();
        let lexer = Lexer::new("// todo esto es un comentario\nmostrar 1", &mut interner);
        let tokens = lexer.tokenize().unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Mostrar);
    }

    #[test]
    fn y_after_value_is_logical_and() {
        let mut interner = Interner::new();
        let lexer = Lexer::new("verdadero y falso", &mut interner);
        let tokens = lexer.tokenize().unwrap();
        assert_eq!(tokens[1].kind, TokenKind::Y);
    }

    #[test]
    fn y_as_identifier_stays_identifier() {
        let mut interner = Interner::new();
        let lexer = Lexer::new("variable y = 5", &mut interner);
        let tokens = lexer.tokenize().unwrap();
        assert_eq!(tokens[1].kind, TokenKind::Identifier);
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let mut interner = Interner::new();
        let lexer = Lexer::new("\"sin cerrar", &mut interner);
        assert!(matches!(lexer.tokenize(), Err(HispanoError::UnterminatedString { .. })));
    }

    #[test]
    fn template_string_splits_parts_and_expressions() {
        let mut interner = Interner::new();
        let lexer = Lexer::new("`Hola ${n}, hoy es ${dia}.`", &mut interner);
        let tokens = lexer.tokenize().unwrap();
        match &tokens[0].literal {
            Some(Literal::Template(payload)) => {
                assert_eq!(payload.parts.len(), payload.expressions.len() + 1);
                assert_eq!(payload.parts[0], "Hola ");
                assert_eq!(payload.expressions[0].trim(), "n");
            }
            other => panic!("expected template literal, got {other:?}"),
        }
    }

    #[test]
    fn nested_braces_inside_template_expression_are_balanced() {
        let mut interner = Interner::new();
        let lexer = Lexer::new("`${ {x: 1} }`", &mut interner);
        let tokens = lexer.tokenize().unwrap();
        match &tokens[0].literal {
            Some(Literal::Template(payload)) => {
                assert_eq!(payload.expressions[0].trim(), "{x: 1}");
            }
            other => panic!("expected template literal, got {other:?}"),
        }
    }

    #[test]
    fn tracks_line_numbers_across_newlines() {
        let mut interner = Interner::new();
        let lexer = Lexer::new("variable a = 1\nmostrar a", &mut interner);
        let tokens = lexer.tokenize().unwrap();
        let mostrar = tokens.iter().find(|t| t.kind == TokenKind::Mostrar).unwrap();
        assert_eq!(mostrar.span.line, 2);
    }

    #[test]
    fn number_literal_parses_fractional_part() {
        let mut interner = Interner::new();
        let lexer = Lexer::new("3.5", &mut interner);
        let tokens = lexer.tokenize().unwrap();
        assert_eq!(tokens[0].literal, Some(Literal::Number(3.5)));
    }
}
