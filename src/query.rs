/*
Copyright 2021 Google LLC

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

     https://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/

//! The query DSL parser: `fn:name == "handle"`, `fn:argcount in {2,3}`,
//! `cls:parent == "Base"`. Grammar:
//!
//! ```text
//! field       = identifier , ":" , identifier ;
//! op          = "==" | "!=" | "in" | "not" , "in" ;
//! literal     = string | number ;
//! set         = "{" , literal , { "," , literal } , "}" ;
//! assertion   = field , [ op , ( literal | set ) ] ;
//! expression  = assertion , { "," , assertion } ;
//! query       = expression , { ";" , expression } ;
//! ```
//!
//! Hand-written recursive-descent: the grammar is flat (no precedence, no
//! left recursion) so a lexer plus one-token-lookahead parser is all this
//! needs.

use crate::error::ScryError;

/// A parsed literal value. Sets keep appearance order but are matched as
/// sets by the evaluator (duplicates and order are not observable).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Int(i64),
    Set(Vec<Value>),
}

impl Value {
    pub fn contains(&self, needle: &Value) -> bool {
        match self {
            Value::Set(items) => items.contains(needle),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    Ne,
    In,
    NotIn,
}

/// `(selector_kind, selector_attr)`, optionally `(op, value)`. The bare
/// shorthand form normalizes `op`/`value` to `None`, meaning "match
/// every node of this kind".
#[derive(Debug, Clone, PartialEq)]
pub struct Assertion {
    pub kind: String,
    pub attr: String,
    pub op: Option<Op>,
    pub value: Option<Value>,
}

pub type Expression = Vec<Assertion>;
pub type QueryTree = Vec<Expression>;

// --- Lexer --------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Ident(String),
    Str(String),
    Num(i64),
    Colon,
    Comma,
    Semi,
    LBrace,
    RBrace,
    EqEq,
    NotEq,
    In,
    Not,
    Eof,
}

struct Token {
    tok: Tok,
    line: usize,
    col: usize,
}

struct Lexer<'a> {
    input: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    line: usize,
    col: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Lexer {
            input,
            chars: input.char_indices().peekable(),
            line: 1,
            col: 1,
        }
    }

    fn advance(&mut self) -> Option<(usize, char)> {
        let next = self.chars.next();
        if let Some((_, c)) = next {
            if c == '\n' {
                self.line += 1;
                self.col = 1;
            } else {
                self.col += 1;
            }
        }
        next
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn err(&self, line: usize, col: usize, message: impl Into<String>) -> ScryError {
        ScryError::Parse {
            line,
            column: col,
            message: message.into(),
            input: self.input.to_string(),
        }
    }

    fn tokens(mut self) -> Result<Vec<Token>, ScryError> {
        let mut out = Vec::new();
        loop {
            while matches!(self.peek_char(), Some(c) if c.is_whitespace()) {
                self.advance();
            }
            let (line, col) = (self.line, self.col);
            let Some(c) = self.peek_char() else {
                out.push(Token { tok: Tok::Eof, line, col });
                break;
            };
            let tok = match c {
                ':' => {
                    self.advance();
                    Tok::Colon
                }
                ',' => {
                    self.advance();
                    Tok::Comma
                }
                ';' => {
                    self.advance();
                    Tok::Semi
                }
                '{' => {
                    self.advance();
                    Tok::LBrace
                }
                '}' => {
                    self.advance();
                    Tok::RBrace
                }
                '=' => {
                    self.advance();
                    if self.peek_char() == Some('=') {
                        self.advance();
                        Tok::EqEq
                    } else {
                        return Err(self.err(line, col, "expected '==', found single '='"));
                    }
                }
                '!' => {
                    self.advance();
                    if self.peek_char() == Some('=') {
                        self.advance();
                        Tok::NotEq
                    } else {
                        return Err(self.err(line, col, "expected '!=', found bare '!'"));
                    }
                }
                '"' | '\'' => {
                    let quote = c;
                    self.advance();
                    let mut s = String::new();
                    loop {
                        match self.advance() {
                            Some((_, ch)) if ch == quote => break,
                            Some((_, ch)) => s.push(ch),
                            None => return Err(self.err(line, col, "unterminated string literal")),
                        }
                    }
                    Tok::Str(s)
                }
                c if c.is_ascii_digit() => {
                    let mut s = String::new();
                    while matches!(self.peek_char(), Some(c) if c.is_ascii_digit()) {
                        s.push(self.advance().unwrap().1);
                    }
                    Tok::Num(s.parse().map_err(|_| self.err(line, col, "malformed integer literal"))?)
                }
                c if c.is_alphabetic() || c == '_' => {
                    let mut s = String::new();
                    while matches!(self.peek_char(), Some(c) if c.is_alphanumeric() || c == '_') {
                        s.push(self.advance().unwrap().1);
                    }
                    match s.as_str() {
                        "in" => Tok::In,
                        "not" => Tok::Not,
                        _ => Tok::Ident(s),
                    }
                }
                other => return Err(self.err(line, col, format!("unexpected character '{other}'"))),
            };
            out.push(Token { tok, line, col });
        }
        Ok(out)
    }
}

// --- Parser ---------------------------------------------------------------

struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    input: &'a str,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> &Tok {
        &self.tokens[self.pos].tok
    }

    fn peek_pos(&self) -> (usize, usize) {
        (self.tokens[self.pos].line, self.tokens[self.pos].col)
    }

    fn bump(&mut self) -> Tok {
        let tok = self.tokens[self.pos].tok.clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn err(&self, message: impl Into<String>) -> ScryError {
        let (line, col) = self.peek_pos();
        ScryError::Parse {
            line,
            column: col,
            message: message.into(),
            input: self.input.to_string(),
        }
    }

    fn expect_ident(&mut self) -> Result<String, ScryError> {
        match self.bump() {
            Tok::Ident(s) => Ok(s),
            other => Err(self.err(format!("expected identifier, found {other:?}"))),
        }
    }

    fn parse_query(&mut self) -> Result<QueryTree, ScryError> {
        let mut query = vec![self.parse_expression()?];
        while matches!(self.peek(), Tok::Semi) {
            self.bump();
            query.push(self.parse_expression()?);
        }
        if !matches!(self.peek(), Tok::Eof) {
            return Err(self.err(format!("unexpected trailing token {:?}", self.peek())));
        }
        Ok(query)
    }

    fn parse_expression(&mut self) -> Result<Expression, ScryError> {
        let mut expr = vec![self.parse_assertion()?];
        while matches!(self.peek(), Tok::Comma) {
            self.bump();
            expr.push(self.parse_assertion()?);
        }
        Ok(expr)
    }

    fn parse_assertion(&mut self) -> Result<Assertion, ScryError> {
        let kind = self.expect_ident()?;
        if !matches!(self.peek(), Tok::Colon) {
            return Err(self.err(format!("expected ':' after selector kind '{kind}'")));
        }
        self.bump();
        let attr = self.expect_ident()?;

        if matches!(self.peek(), Tok::Comma | Tok::Semi | Tok::Eof) {
            return Ok(Assertion { kind, attr, op: None, value: None });
        }

        let op = self.parse_op()?;
        let value = self.parse_value_or_set()?;
        Ok(Assertion { kind, attr, op: Some(op), value: Some(value) })
    }

    fn parse_op(&mut self) -> Result<Op, ScryError> {
        match self.bump() {
            Tok::EqEq => Ok(Op::Eq),
            Tok::NotEq => Ok(Op::Ne),
            Tok::In => Ok(Op::In),
            Tok::Not => {
                if matches!(self.peek(), Tok::In) {
                    self.bump();
                    Ok(Op::NotIn)
                } else {
                    Err(self.err("expected 'in' after 'not'"))
                }
            }
            other => Err(self.err(format!("expected an operator, found {other:?}"))),
        }
    }

    fn parse_value_or_set(&mut self) -> Result<Value, ScryError> {
        if matches!(self.peek(), Tok::LBrace) {
            self.bump();
            let mut items = vec![self.parse_literal()?];
            while matches!(self.peek(), Tok::Comma) {
                self.bump();
                items.push(self.parse_literal()?);
            }
            if !matches!(self.peek(), Tok::RBrace) {
                return Err(self.err("expected '}' to close set literal"));
            }
            self.bump();
            Ok(Value::Set(items))
        } else {
            self.parse_literal()
        }
    }

    fn parse_literal(&mut self) -> Result<Value, ScryError> {
        match self.bump() {
            Tok::Str(s) => Ok(Value::Str(s)),
            Tok::Num(n) => Ok(Value::Int(n)),
            other => Err(self.err(format!("expected a string or number literal, found {other:?}"))),
        }
    }
}

/// Parse a full query string. Fails with `ScryError::Parse` (carrying
/// line, column, and a caret-pointed diagnostic) unless the entire input
/// is consumed by the grammar.
pub fn parse(input: &str) -> Result<QueryTree, ScryError> {
    let tokens = Lexer::new(input).tokens()?;
    let mut parser = Parser { tokens, pos: 0, input };
    parser.parse_query()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assertion(kind: &str, attr: &str, op: Option<Op>, value: Option<Value>) -> Assertion {
        Assertion { kind: kind.to_string(), attr: attr.to_string(), op, value }
    }

    #[test]
    fn shorthand_has_no_op() {
        let q = parse("fn:name").unwrap();
        assert_eq!(q, vec![vec![assertion("fn", "name", None, None)]]);
    }

    #[test]
    fn equality_with_string_literal() {
        let q = parse(r#"fn:name == "fn1""#).unwrap();
        assert_eq!(
            q,
            vec![vec![assertion("fn", "name", Some(Op::Eq), Some(Value::Str("fn1".to_string())))]]
        );
    }

    #[test]
    fn single_quoted_strings_supported() {
        let q = parse("fn:name == 'fn1'").unwrap();
        assert_eq!(
            q,
            vec![vec![assertion("fn", "name", Some(Op::Eq), Some(Value::Str("fn1".to_string())))]]
        );
    }

    #[test]
    fn not_in_normalizes_to_single_operator() {
        let q = parse("fn:argcount not in {2}").unwrap();
        assert_eq!(
            q,
            vec![vec![assertion(
                "fn",
                "argcount",
                Some(Op::NotIn),
                Some(Value::Set(vec![Value::Int(2)]))
            )]]
        );
    }

    #[test]
    fn comma_builds_one_expression_semicolon_builds_many() {
        let q = parse(r#"fn:name == "fn1", fn:name == "fn2"; cls:name == "C""#).unwrap();
        assert_eq!(q.len(), 2);
        assert_eq!(q[0].len(), 2);
        assert_eq!(q[1].len(), 1);
    }

    #[test]
    fn set_literal_preserves_order() {
        let q = parse(r#"fn:name in {"fn1","fn2"}"#).unwrap();
        let Assertion { value: Some(Value::Set(items)), .. } = &q[0][0] else {
            panic!("expected set value");
        };
        assert_eq!(items, &vec![Value::Str("fn1".to_string()), Value::Str("fn2".to_string())]);
    }

    #[test]
    fn unexpected_trailing_token_is_a_parse_error() {
        let err = parse("fn:name == \"fn1\" garbage").unwrap_err();
        assert!(matches!(err, ScryError::Parse { .. }));
    }

    #[test]
    fn missing_colon_is_a_parse_error() {
        assert!(parse("fnname").is_err());
    }

    #[test]
    fn empty_input_is_a_parse_error() {
        assert!(parse("").is_err());
    }

    #[test]
    fn single_equals_is_rejected() {
        assert!(parse("fn:name = \"fn1\"").is_err());
    }

    #[test]
    fn whitespace_is_insignificant() {
        let a = parse("fn:name==\"fn1\"").unwrap();
        let b = parse("  fn : name  ==  \"fn1\"  ").unwrap();
        assert_eq!(a, b);
    }
}
