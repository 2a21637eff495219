//! `when` predicate expressions.
//!
//! Boolean expressions over mirrored conditions and variables:
//!
//! ```text
//! editorTextFocus && !macroRecording
//! pendingOperator == operator.delete
//! resourceLangId == "rust" || resourceLangId == "toml"
//! ```
//!
//! Grammar (precedence low to high): `||`, `&&`, `!`, parentheses. A bare
//! identifier tests a condition; `ident == value` / `ident != value` test a
//! variable against a literal (quoted or bare word).

use crate::KeymapContext;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PredicateError {
    #[error("unexpected character `{0}` in predicate")]
    UnexpectedChar(char),
    #[error("unexpected end of predicate")]
    UnexpectedEnd,
    #[error("unexpected token `{0}`")]
    UnexpectedToken(String),
    #[error("expected value after comparison operator")]
    MissingValue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Bare condition reference; unset conditions read as false.
    Cond(String),
    Eq(String, String),
    Ne(String, String),
    Not(Box<Predicate>),
    And(Box<Predicate>, Box<Predicate>),
    Or(Box<Predicate>, Box<Predicate>),
}

impl Predicate {
    pub fn parse(input: &str) -> Result<Predicate, PredicateError> {
        let tokens = lex(input)?;
        let mut p = Parser { tokens, pos: 0 };
        let expr = p.or_expr()?;
        match p.peek() {
            None => Ok(expr),
            Some(t) => Err(PredicateError::UnexpectedToken(format!("{t:?}"))),
        }
    }

    pub fn eval(&self, ctx: &KeymapContext) -> bool {
        match self {
            Predicate::Cond(name) => ctx.condition(name),
            Predicate::Eq(var, val) => ctx.variables.get(var).is_some_and(|v| v == val),
            Predicate::Ne(var, val) => !ctx.variables.get(var).is_some_and(|v| v == val),
            Predicate::Not(inner) => !inner.eval(ctx),
            Predicate::And(a, b) => a.eval(ctx) && b.eval(ctx),
            Predicate::Or(a, b) => a.eval(ctx) || b.eval(ctx),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Word(String),
    Str(String),
    Not,
    AndAnd,
    OrOr,
    EqEq,
    NotEq,
    LParen,
    RParen,
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '.' | '-')
}

fn lex(input: &str) -> Result<Vec<Token>, PredicateError> {
    let mut out = Vec::new();
    let mut chars = input.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' => {
                chars.next();
            }
            '(' => {
                chars.next();
                out.push(Token::LParen);
            }
            ')' => {
                chars.next();
                out.push(Token::RParen);
            }
            '&' => {
                chars.next();
                match chars.next() {
                    Some('&') => out.push(Token::AndAnd),
                    _ => return Err(PredicateError::UnexpectedChar('&')),
                }
            }
            '|' => {
                chars.next();
                match chars.next() {
                    Some('|') => out.push(Token::OrOr),
                    _ => return Err(PredicateError::UnexpectedChar('|')),
                }
            }
            '=' => {
                chars.next();
                match chars.next() {
                    Some('=') => out.push(Token::EqEq),
                    _ => return Err(PredicateError::UnexpectedChar('=')),
                }
            }
            '!' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    out.push(Token::NotEq);
                } else {
                    out.push(Token::Not);
                }
            }
            '"' | '\'' => {
                let quote = c;
                chars.next();
                let mut s = String::new();
                loop {
                    match chars.next() {
                        Some(ch) if ch == quote => break,
                        Some(ch) => s.push(ch),
                        None => return Err(PredicateError::UnexpectedEnd),
                    }
                }
                out.push(Token::Str(s));
            }
            c if is_word_char(c) => {
                let mut s = String::new();
                while let Some(&ch) = chars.peek() {
                    if is_word_char(ch) {
                        s.push(ch);
                        chars.next();
                    } else {
                        break;
                    }
                }
                out.push(Token::Word(s));
            }
            other => return Err(PredicateError::UnexpectedChar(other)),
        }
    }
    Ok(out)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.pos).cloned();
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    fn or_expr(&mut self) -> Result<Predicate, PredicateError> {
        let mut lhs = self.and_expr()?;
        while self.peek() == Some(&Token::OrOr) {
            self.next();
            let rhs = self.and_expr()?;
            lhs = Predicate::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn and_expr(&mut self) -> Result<Predicate, PredicateError> {
        let mut lhs = self.unary()?;
        while self.peek() == Some(&Token::AndAnd) {
            self.next();
            let rhs = self.unary()?;
            lhs = Predicate::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Predicate, PredicateError> {
        match self.peek() {
            Some(Token::Not) => {
                self.next();
                Ok(Predicate::Not(Box::new(self.unary()?)))
            }
            _ => self.primary(),
        }
    }

    fn primary(&mut self) -> Result<Predicate, PredicateError> {
        match self.next() {
            Some(Token::LParen) => {
                let inner = self.or_expr()?;
                match self.next() {
                    Some(Token::RParen) => Ok(inner),
                    Some(t) => Err(PredicateError::UnexpectedToken(format!("{t:?}"))),
                    None => Err(PredicateError::UnexpectedEnd),
                }
            }
            Some(Token::Word(name)) => match self.peek() {
                Some(Token::EqEq) => {
                    self.next();
                    Ok(Predicate::Eq(name, self.value()?))
                }
                Some(Token::NotEq) => {
                    self.next();
                    Ok(Predicate::Ne(name, self.value()?))
                }
                _ => Ok(Predicate::Cond(name)),
            },
            Some(t) => Err(PredicateError::UnexpectedToken(format!("{t:?}"))),
            None => Err(PredicateError::UnexpectedEnd),
        }
    }

    fn value(&mut self) -> Result<String, PredicateError> {
        match self.next() {
            Some(Token::Word(s)) | Some(Token::Str(s)) => Ok(s),
            _ => Err(PredicateError::MissingValue),
        }
    }
}
