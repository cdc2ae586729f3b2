//! Property expansion and condition evaluation
//!
//! Conditions are small boolean expressions over string and boolean
//! literals, evaluated after `${name}` references have been expanded
//! against a config group:
//!
//! ```text
//! expr    := or
//! or      := and ( "||" and )*
//! and     := compare ( "&&" compare )*
//! compare := unary ( ("==" | "!=") unary )?
//! unary   := "!" unary | primary
//! primary := STRING | "true" | "false" | "(" expr ")"
//! ```

use crate::group::ConfigGroup;
use thiserror::Error;
use tracing::warn;

/// Failure to parse or evaluate a condition
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ExpressionError {
    #[error("unexpected character '{ch}' at offset {offset}")]
    UnexpectedChar { ch: char, offset: usize },

    #[error("unterminated string literal starting at offset {offset}")]
    UnterminatedString { offset: usize },

    #[error("unexpected {found}")]
    UnexpectedToken { found: String },

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("operator '{operator}' cannot be applied to {operands}")]
    TypeMismatch {
        operator: &'static str,
        operands: &'static str,
    },

    #[error("expression does not evaluate to a boolean")]
    NotBoolean,
}

/// Replace every `${name}` in `text` with the group's value for `name`
///
/// Placeholders the group has no value for are kept verbatim.
#[must_use]
pub fn expand_property_expression(text: &str, group: &dyn ConfigGroup) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            return out;
        };
        let name = &after[..end];
        match group.property(name) {
            Some(value) => out.push_str(&value),
            None => out.push_str(&rest[start..start + 2 + end + 1]),
        }
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    out
}

/// Evaluate an optional condition against a config group
///
/// A missing or blank condition is true. Conditions that fail to parse or
/// evaluate are also treated as true; the failure is logged.
#[must_use]
pub fn evaluate_condition(condition: Option<&str>, group: &dyn ConfigGroup) -> bool {
    let Some(condition) = condition.filter(|text| !text.trim().is_empty()) else {
        return true;
    };

    let expanded = expand_property_expression(condition, group);
    match parse_condition(&expanded) {
        Ok(result) => result,
        Err(err) => {
            warn!("Condition '{condition}' could not be evaluated, treating it as true: {err}");
            true
        }
    }
}

/// Strictly evaluate an already expanded condition
///
/// # Errors
///
/// Returns an `ExpressionError` on a syntax error, an operand type mismatch
/// or a non-boolean result
pub fn parse_condition(text: &str) -> Result<bool, ExpressionError> {
    let tokens = tokenize(text)?;
    let mut parser = Parser { tokens, pos: 0 };
    let value = parser.expr()?;
    if let Some(token) = parser.tokens.get(parser.pos) {
        return Err(ExpressionError::UnexpectedToken {
            found: token.describe(),
        });
    }
    match value {
        Value::Bool(result) => Ok(result),
        Value::Str(_) => Err(ExpressionError::NotBoolean),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Str(String),
    Bool(bool),
    Eq,
    Ne,
    And,
    Or,
    Not,
    LParen,
    RParen,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Self::Str(text) => format!("string '{text}'"),
            Self::Bool(value) => format!("'{value}'"),
            Self::Eq => "'=='".to_owned(),
            Self::Ne => "'!='".to_owned(),
            Self::And => "'&&'".to_owned(),
            Self::Or => "'||'".to_owned(),
            Self::Not => "'!'".to_owned(),
            Self::LParen => "'('".to_owned(),
            Self::RParen => "')'".to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Value {
    Str(String),
    Bool(bool),
}

fn tokenize(text: &str) -> Result<Vec<Token>, ExpressionError> {
    let mut tokens = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some((offset, ch)) = chars.next() {
        match ch {
            _ if ch.is_whitespace() => {}
            '(' => tokens.push(Token::LParen),
            ')' => tokens.push(Token::RParen),
            '\'' | '"' => {
                let mut literal = String::new();
                let mut closed = false;
                while let Some((_, next)) = chars.next() {
                    match next {
                        _ if next == ch => {
                            closed = true;
                            break;
                        }
                        '\\' => {
                            if let Some((_, escaped)) = chars.next() {
                                literal.push(escaped);
                            }
                        }
                        _ => literal.push(next),
                    }
                }
                if !closed {
                    return Err(ExpressionError::UnterminatedString { offset });
                }
                tokens.push(Token::Str(literal));
            }
            '=' | '!' | '&' | '|' => {
                let doubled = chars.next_if(|&(_, next)| match ch {
                    '!' => next == '=',
                    _ => next == ch,
                });
                // Accept the strict forms as well
                if doubled.is_some() && matches!(ch, '=' | '!') {
                    chars.next_if(|&(_, next)| next == '=');
                }
                let token = match (ch, doubled.is_some()) {
                    ('=', true) => Token::Eq,
                    ('!', true) => Token::Ne,
                    ('!', false) => Token::Not,
                    ('&', true) => Token::And,
                    ('|', true) => Token::Or,
                    _ => return Err(ExpressionError::UnexpectedChar { ch, offset }),
                };
                tokens.push(token);
            }
            _ if ch.is_ascii_alphabetic() => {
                let mut word = String::from(ch);
                while let Some((_, next)) = chars.next_if(|&(_, next)| next.is_ascii_alphanumeric()) {
                    word.push(next);
                }
                match word.as_str() {
                    "true" => tokens.push(Token::Bool(true)),
                    "false" => tokens.push(Token::Bool(false)),
                    _ => {
                        return Err(ExpressionError::UnexpectedToken {
                            found: format!("identifier '{word}'"),
                        });
                    }
                }
            }
            _ => return Err(ExpressionError::UnexpectedChar { ch, offset }),
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expr(&mut self) -> Result<Value, ExpressionError> {
        self.or()
    }

    fn or(&mut self) -> Result<Value, ExpressionError> {
        let mut left = self.and()?;
        while self.peek() == Some(&Token::Or) {
            self.pos += 1;
            let right = self.and()?;
            left = Value::Bool(as_bool(&left, "||")? || as_bool(&right, "||")?);
        }
        Ok(left)
    }

    fn and(&mut self) -> Result<Value, ExpressionError> {
        let mut left = self.compare()?;
        while self.peek() == Some(&Token::And) {
            self.pos += 1;
            let right = self.compare()?;
            left = Value::Bool(as_bool(&left, "&&")? && as_bool(&right, "&&")?);
        }
        Ok(left)
    }

    fn compare(&mut self) -> Result<Value, ExpressionError> {
        let left = self.unary()?;
        let negate = match self.peek() {
            Some(Token::Eq) => false,
            Some(Token::Ne) => true,
            _ => return Ok(left),
        };
        self.pos += 1;
        let right = self.unary()?;

        let equal = match (&left, &right) {
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            _ => {
                return Err(ExpressionError::TypeMismatch {
                    operator: if negate { "!=" } else { "==" },
                    operands: "a string and a boolean",
                });
            }
        };
        Ok(Value::Bool(equal != negate))
    }

    fn unary(&mut self) -> Result<Value, ExpressionError> {
        if self.peek() == Some(&Token::Not) {
            self.pos += 1;
            let operand = self.unary()?;
            return Ok(Value::Bool(!as_bool(&operand, "!")?));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Value, ExpressionError> {
        match self.advance() {
            Some(Token::Str(text)) => Ok(Value::Str(text)),
            Some(Token::Bool(value)) => Ok(Value::Bool(value)),
            Some(Token::LParen) => {
                let value = self.expr()?;
                match self.advance() {
                    Some(Token::RParen) => Ok(value),
                    Some(other) => Err(ExpressionError::UnexpectedToken {
                        found: other.describe(),
                    }),
                    None => Err(ExpressionError::UnexpectedEnd),
                }
            }
            Some(other) => Err(ExpressionError::UnexpectedToken {
                found: other.describe(),
            }),
            None => Err(ExpressionError::UnexpectedEnd),
        }
    }
}

fn as_bool(value: &Value, operator: &'static str) -> Result<bool, ExpressionError> {
    match *value {
        Value::Bool(result) => Ok(result),
        Value::Str(_) => Err(ExpressionError::TypeMismatch {
            operator,
            operands: "a string",
        }),
    }
}
