//! Whitelisted arithmetic expressions for formula-based dispersion.
//!
//! A formula is a function of the single variable `x`, the vacuum wavelength
//! in micrometers. The grammar is deliberately small:
//!
//! - numeric literals, with an optional exponent and an optional trailing `j`
//!   for imaginary literals (`0.01j`)
//! - the variable `x` and the constants `pi` and `e`
//! - `+ - * /`, exponentiation with `^` or `**`, unary `+`/`-` and parentheses
//! - the unary functions listed in [`Func`]
//!
//! Anything else is rejected when the formula is parsed. Evaluation happens in
//! complex arithmetic so that formulas may describe absorbing media.

use std::fmt;

use nalgebra::Complex;
use serde::{Deserialize, Serialize};

use crate::error::ExpressionError;

/// Most tokens a formula may have. Bounds the depth of the parsed tree.
pub const MAX_TOKENS: usize = 1024;
/// Most nested parentheses, calls, signs and exponents.
pub const MAX_DEPTH: usize = 256;


/// Whitelisted unary functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Func {
    Sqrt,
    Exp,
    Ln,
    Log10,
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Sinh,
    Cosh,
    Tanh,
    Abs,
}

impl Func {
    fn from_name(name: &str) -> Option<Self> {
        let func = match name {
            "sqrt" => Func::Sqrt,
            "exp" => Func::Exp,
            "ln" | "log" => Func::Ln,
            "log10" => Func::Log10,
            "sin" => Func::Sin,
            "cos" => Func::Cos,
            "tan" => Func::Tan,
            "asin" | "arcsin" => Func::Asin,
            "acos" | "arccos" => Func::Acos,
            "atan" | "arctan" => Func::Atan,
            "sinh" => Func::Sinh,
            "cosh" => Func::Cosh,
            "tanh" => Func::Tanh,
            "abs" => Func::Abs,
            _ => return None,
        };
        Some(func)
    }

    fn apply(self, z: Complex<f64>) -> Complex<f64> {
        match self {
            Func::Sqrt => z.sqrt(),
            Func::Exp => z.exp(),
            Func::Ln => z.ln(),
            Func::Log10 => z.ln() / std::f64::consts::LN_10,
            Func::Sin => z.sin(),
            Func::Cos => z.cos(),
            Func::Tan => z.tan(),
            Func::Asin => z.asin(),
            Func::Acos => z.acos(),
            Func::Atan => z.atan(),
            Func::Sinh => z.sinh(),
            Func::Cosh => z.cosh(),
            Func::Tanh => z.tanh(),
            Func::Abs => Complex::new(z.norm(), 0.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Const(Complex<f64>),
    Var,
    Neg(Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    Call(Func, Box<Expr>),
}

impl Expr {
    fn eval(&self, x: Complex<f64>) -> Complex<f64> {
        match self {
            Expr::Const(value) => *value,
            Expr::Var => x,
            Expr::Neg(inner) => -inner.eval(x),
            Expr::Call(func, arg) => func.apply(arg.eval(x)),
            Expr::Binary(op, lhs, rhs) => {
                let (a, b) = (lhs.eval(x), rhs.eval(x));
                match op {
                    BinOp::Add => a + b,
                    BinOp::Sub => a - b,
                    BinOp::Mul => a * b,
                    BinOp::Div => a / b,
                    BinOp::Pow => pow(a, b),
                }
            }
        }
    }

    fn references_var(&self) -> bool {
        match self {
            Expr::Const(_) => false,
            Expr::Var => true,
            Expr::Neg(inner) | Expr::Call(_, inner) => inner.references_var(),
            Expr::Binary(_, lhs, rhs) => lhs.references_var() || rhs.references_var(),
        }
    }
}

/// Integer powers stay exact for negative real bases.
fn pow(base: Complex<f64>, exponent: Complex<f64>) -> Complex<f64> {
    if exponent.im != 0.0 {
        return base.powc(exponent);
    }
    let e = exponent.re;
    if e.fract() == 0.0 && e.abs() <= i32::MAX as f64 {
        base.powi(e as i32)
    } else {
        base.powf(e)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Imaginary(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(v) => write!(f, "number {}", v),
            Token::Imaginary(v) => write!(f, "number {}j", v),
            Token::Ident(name) => write!(f, "'{}'", name),
            Token::Plus => write!(f, "'+'"),
            Token::Minus => write!(f, "'-'"),
            Token::Star => write!(f, "'*'"),
            Token::Slash => write!(f, "'/'"),
            Token::Caret => write!(f, "'^'"),
            Token::LParen => write!(f, "'('"),
            Token::RParen => write!(f, "')'"),
        }
    }
}

/// Splits a formula into positioned tokens.
struct Tokenizer<'a> {
    src: &'a str,
    offset: usize,
}

impl<'a> Tokenizer<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, offset: 0 }
    }

    fn peek_char(&self) -> Option<char> {
        self.src[self.offset..].chars().next()
    }

    fn next_char(&mut self) -> Option<(usize, char)> {
        let ch = self.peek_char()?;
        let pos = self.offset;
        self.offset += ch.len_utf8();
        Some((pos, ch))
    }

    /// Advances while `pred` holds and returns the consumed slice.
    fn take_while(&mut self, start: usize, pred: impl Fn(char) -> bool) -> &'a str {
        let src = self.src;
        while let Some(ch) = self.peek_char() {
            if !pred(ch) {
                break;
            }
            self.offset += ch.len_utf8();
        }
        &src[start..self.offset]
    }

    fn number(&mut self, start: usize) -> Result<Token, ExpressionError> {
        let src = self.src;
        self.take_while(start, |c| c.is_ascii_digit() || c == '.');
        // exponent part, only when followed by digits
        if matches!(self.peek_char(), Some('e' | 'E')) {
            let mut chars = src[self.offset + 1..].chars();
            let marker_len = match chars.next() {
                Some('+' | '-') if chars.next().is_some_and(|c| c.is_ascii_digit()) => Some(2),
                Some(c) if c.is_ascii_digit() => Some(1),
                _ => None,
            };
            if let Some(len) = marker_len {
                self.offset += len;
                self.take_while(start, |c| c.is_ascii_digit());
            }
        }
        let text = &src[start..self.offset];
        let value: f64 = text
            .parse()
            .map_err(|_| ExpressionError::InvalidNumber(text.to_string()))?;
        if self.peek_char() == Some('j') {
            self.offset += 1;
            return Ok(Token::Imaginary(value));
        }
        Ok(Token::Number(value))
    }
}

impl Iterator for Tokenizer<'_> {
    type Item = Result<(usize, Token), ExpressionError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (pos, ch) = self.next_char()?;
            let token = match ch {
                c if c.is_whitespace() => continue,
                '+' => Token::Plus,
                '-' => Token::Minus,
                '/' => Token::Slash,
                '^' => Token::Caret,
                '(' => Token::LParen,
                ')' => Token::RParen,
                '*' => {
                    if self.peek_char() == Some('*') {
                        self.offset += 1;
                        Token::Caret
                    } else {
                        Token::Star
                    }
                }
                c if c.is_ascii_digit() || c == '.' => {
                    return Some(self.number(pos).map(|token| (pos, token)));
                }
                c if c.is_alphabetic() || c == '_' => {
                    let name = self.take_while(pos, |c| c.is_alphanumeric() || c == '_');
                    Token::Ident(name.to_string())
                }
                ch => return Some(Err(ExpressionError::UnexpectedChar { pos, ch })),
            };
            return Some(Ok((pos, token)));
        }
    }
}

/// Recursive-descent parser over a token list.
struct Parser {
    tokens: Vec<(usize, Token)>,
    cursor: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.cursor).map(|(_, token)| token)
    }

    fn advance(&mut self) -> Option<(usize, Token)> {
        let item = self.tokens.get(self.cursor).cloned();
        self.cursor += 1;
        item
    }

    fn unexpected(pos: usize, token: &Token) -> ExpressionError {
        ExpressionError::UnexpectedToken {
            pos,
            found: token.to_string(),
        }
    }

    fn expect(&mut self, expected: Token) -> Result<(), ExpressionError> {
        match self.advance() {
            Some((_, token)) if token == expected => Ok(()),
            Some((pos, token)) => Err(Self::unexpected(pos, &token)),
            None => Err(ExpressionError::UnexpectedEnd),
        }
    }

    fn expr(&mut self) -> Result<Expr, ExpressionError> {
        let mut lhs = self.term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinOp::Add,
                Some(Token::Minus) => BinOp::Sub,
                _ => return Ok(lhs),
            };
            self.cursor += 1;
            let rhs = self.term()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn term(&mut self) -> Result<Expr, ExpressionError> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinOp::Mul,
                Some(Token::Slash) => BinOp::Div,
                _ => return Ok(lhs),
            };
            self.cursor += 1;
            let rhs = self.unary()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    /// Every nested subexpression passes through here.
    fn unary(&mut self) -> Result<Expr, ExpressionError> {
        if self.depth >= MAX_DEPTH {
            return Err(ExpressionError::TooDeep { limit: MAX_DEPTH });
        }
        self.depth += 1;
        let expr = self.signed();
        self.depth -= 1;
        expr
    }

    fn signed(&mut self) -> Result<Expr, ExpressionError> {
        match self.peek() {
            Some(Token::Minus) => {
                self.cursor += 1;
                Ok(Expr::Neg(Box::new(self.unary()?)))
            }
            Some(Token::Plus) => {
                self.cursor += 1;
                self.unary()
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> Result<Expr, ExpressionError> {
        let base = self.primary()?;
        if self.peek() == Some(&Token::Caret) {
            self.cursor += 1;
            // right-associative, and the exponent may carry its own sign
            let exponent = self.unary()?;
            return Ok(Expr::Binary(BinOp::Pow, Box::new(base), Box::new(exponent)));
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<Expr, ExpressionError> {
        let Some((pos, token)) = self.advance() else {
            return Err(ExpressionError::UnexpectedEnd);
        };
        match token {
            Token::Number(value) => Ok(Expr::Const(Complex::new(value, 0.0))),
            Token::Imaginary(value) => Ok(Expr::Const(Complex::new(0.0, value))),
            Token::LParen => {
                let inner = self.expr()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Token::Ident(name) => match name.as_str() {
                "x" => Ok(Expr::Var),
                "pi" => Ok(Expr::Const(Complex::new(std::f64::consts::PI, 0.0))),
                "e" => Ok(Expr::Const(Complex::new(std::f64::consts::E, 0.0))),
                _ => {
                    let func = Func::from_name(&name)
                        .ok_or(ExpressionError::DisallowedSymbol(name))?;
                    self.expect(Token::LParen)?;
                    let arg = self.expr()?;
                    self.expect(Token::RParen)?;
                    Ok(Expr::Call(func, Box::new(arg)))
                }
            },
            other => Err(Self::unexpected(pos, &other)),
        }
    }
}

/// A parsed formula `n(x)` with `x` the wavelength in micrometers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Formula {
    source: String,
    expr: Expr,
}

impl Formula {
    /// Parses and validates a formula.
    pub fn parse(source: &str) -> Result<Self, ExpressionError> {
        let tokens = Tokenizer::new(source).collect::<Result<Vec<_>, _>>()?;
        if tokens.is_empty() {
            return Err(ExpressionError::Empty);
        }
        if tokens.len() > MAX_TOKENS {
            return Err(ExpressionError::TooLong {
                tokens: tokens.len(),
                limit: MAX_TOKENS,
            });
        }

        let mut parser = Parser {
            tokens,
            cursor: 0,
            depth: 0,
        };
        let expr = parser.expr()?;
        if let Some((pos, token)) = parser.advance() {
            return Err(Parser::unexpected(pos, &token));
        }
        if !expr.references_var() {
            return Err(ExpressionError::MissingVariable);
        }

        Ok(Self {
            source: source.trim().to_string(),
            expr,
        })
    }

    /// Evaluates the formula at `wavelength_um`.
    pub fn eval(&self, wavelength_um: f64) -> Complex<f64> {
        self.expr.eval(Complex::new(wavelength_um, 0.0))
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

impl TryFrom<String> for Formula {
    type Error = ExpressionError;

    fn try_from(source: String) -> Result<Self, Self::Error> {
        Formula::parse(&source)
    }
}

impl From<Formula> for String {
    fn from(formula: Formula) -> Self {
        formula.source
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}
