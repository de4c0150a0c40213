//! Arithmetic evaluation over a whitelisted grammar.
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := factor (('*' | '/') factor)*
//! factor  := ('+' | '-') factor | primary
//! primary := number | '(' expr ')'
//! number  := digits ['.' digits] | '.' digits
//! ```
//!
//! Nothing outside this grammar is accepted, so the evaluator never runs
//! anything but arithmetic.

use super::{ToolErrorKind, ToolOutcome};

const MAX_EXPRESSION_LEN: usize = 256;
const MAX_NESTING: usize = 32;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    #[error("{0}")]
    Invalid(String),

    #[error("division by zero is not allowed")]
    DivisionByZero,
}

fn invalid(message: impl Into<String>) -> EvalError {
    EvalError::Invalid(message.into())
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

fn tokenize(input: &str) -> Result<Vec<Token>, EvalError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        match c {
            c if c.is_ascii_whitespace() => {
                chars.next();
            }
            '0'..='9' | '.' => {
                let mut end = start;
                let mut seen_dot = false;
                let mut seen_digit = false;
                while let Some(&(i, c)) = chars.peek() {
                    if c.is_ascii_digit() {
                        seen_digit = true;
                    } else if c == '.' && !seen_dot {
                        seen_dot = true;
                    } else {
                        break;
                    }
                    end = i + c.len_utf8();
                    chars.next();
                }
                if !seen_digit {
                    return Err(invalid("a number must contain at least one digit"));
                }
                let literal = &input[start..end];
                let number = literal
                    .parse::<f64>()
                    .map_err(|_| invalid(format!("'{}' is not a valid number", literal)))?;
                tokens.push(Token::Number(number));
            }
            _ => {
                let token = match c {
                    '+' => Token::Plus,
                    '-' => Token::Minus,
                    '*' => Token::Star,
                    '/' => Token::Slash,
                    '(' => Token::LParen,
                    ')' => Token::RParen,
                    other => {
                        return Err(invalid(format!(
                            "unsupported character '{}'",
                            other.escape_default()
                        )));
                    }
                };
                tokens.push(token);
                chars.next();
            }
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.peek();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expr(&mut self) -> Result<f64, EvalError> {
        let mut value = self.term()?;
        while let Some(op @ (Token::Plus | Token::Minus)) = self.peek() {
            self.pos += 1;
            let rhs = self.term()?;
            value = if op == Token::Plus { value + rhs } else { value - rhs };
        }
        Ok(value)
    }

    fn term(&mut self) -> Result<f64, EvalError> {
        let mut value = self.factor()?;
        while let Some(op @ (Token::Star | Token::Slash)) = self.peek() {
            self.pos += 1;
            let rhs = self.factor()?;
            value = if op == Token::Star {
                value * rhs
            } else {
                if rhs == 0.0 {
                    return Err(EvalError::DivisionByZero);
                }
                value / rhs
            };
        }
        Ok(value)
    }

    fn factor(&mut self) -> Result<f64, EvalError> {
        match self.peek() {
            Some(Token::Plus) => {
                self.pos += 1;
                self.factor()
            }
            Some(Token::Minus) => {
                self.pos += 1;
                Ok(-self.factor()?)
            }
            _ => self.primary(),
        }
    }

    fn primary(&mut self) -> Result<f64, EvalError> {
        match self.next() {
            Some(Token::Number(n)) => Ok(n),
            Some(Token::LParen) => {
                self.depth += 1;
                if self.depth > MAX_NESTING {
                    return Err(invalid(format!(
                        "parentheses nested deeper than {} levels",
                        MAX_NESTING
                    )));
                }
                let value = self.expr()?;
                match self.next() {
                    Some(Token::RParen) => {
                        self.depth -= 1;
                        Ok(value)
                    }
                    _ => Err(invalid("missing closing parenthesis")),
                }
            }
            Some(Token::RParen) => Err(invalid("unexpected ')'")),
            Some(_) => Err(invalid("expected a number or '('")),
            None => Err(invalid("unexpected end of expression")),
        }
    }
}

/// Evaluate an arithmetic expression with floating-point semantics.
pub fn evaluate(expression: &str) -> Result<f64, EvalError> {
    let expression = expression.trim();
    if expression.is_empty() {
        return Err(invalid("expression is empty"));
    }
    if expression.len() > MAX_EXPRESSION_LEN {
        return Err(invalid(format!(
            "expression is longer than {} characters",
            MAX_EXPRESSION_LEN
        )));
    }

    let tokens = tokenize(expression)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };

    let value = parser.expr()?;
    if parser.pos != parser.tokens.len() {
        return Err(invalid("unexpected input after the end of the expression"));
    }
    if !value.is_finite() {
        return Err(invalid("result is not a finite number"));
    }

    Ok(value)
}

/// Integral values print without a fractional part (`252`, not `252.0`).
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        // Also covers -0.0.
        return "0".to_string();
    }
    format!("{}", value)
}

pub struct MathTool;

impl MathTool {
    pub fn execute(&self, expression: &str) -> ToolOutcome {
        match evaluate(expression) {
            Ok(value) => ToolOutcome::Success(format_number(value)),
            Err(EvalError::DivisionByZero) => ToolOutcome::failure(
                ToolErrorKind::DivisionByZero,
                EvalError::DivisionByZero.to_string(),
            ),
            Err(EvalError::Invalid(message)) => {
                ToolOutcome::failure(ToolErrorKind::InvalidExpression, message)
            }
        }
    }
}
