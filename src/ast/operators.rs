use std::{cmp::Ordering, fmt};

use regex::Regex;
use thiserror::Error;

use crate::value::{JsonValue, Kind, Value, compare_numbers, json_equal};

/// An operator was applied to a value of the wrong kind.
///
/// Not fatal: a filter treats it as "does not match".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Type error: {0}")]
pub struct TypeError(pub String);

/// Unary operators.
///
/// Precedence is higher-binds-tighter. Both operators are right-associative.
#[derive(Debug, Clone)]
pub enum UnaryOperator {
    /// Logical not (`!`)
    ///
    /// Returns `true` when the operand is falsy, per [`JsonValue::is_false`].
    Not,

    /// Regular expression match (`=~ /pattern/flags`)
    ///
    /// Only strings can be matched; anything else is a [`TypeError`].
    /// `flags` is kept as written so that two operators compare and print
    /// the way their source did.
    Regex { regex: Regex, flags: String },
}

impl UnaryOperator {
    pub const NOT_PRECEDENCE: u8 = 1;
    pub const REGEX_PRECEDENCE: u8 = 7;

    /// Regex match operator from an already compiled pattern.
    pub fn matching(regex: Regex, flags: impl Into<String>) -> Self {
        UnaryOperator::Regex {
            regex,
            flags: flags.into(),
        }
    }

    pub fn precedence(&self) -> u8 {
        match self {
            UnaryOperator::Not => Self::NOT_PRECEDENCE,
            UnaryOperator::Regex { .. } => Self::REGEX_PRECEDENCE,
        }
    }

    pub fn is_right_associative(&self) -> bool {
        true
    }

    /// Apply the operator to one value.
    ///
    /// ```
    /// use jsonsift::ast::UnaryOperator;
    /// use jsonsift::Value;
    /// use regex::Regex;
    /// use serde_json::json;
    ///
    /// let starts_with_h = UnaryOperator::matching(Regex::new("^h").unwrap(), "");
    /// assert_eq!(starts_with_h.evaluate(&json!("hello")), Ok(Value::Boolean(true)));
    /// assert!(starts_with_h.evaluate(&json!(5)).is_err());
    ///
    /// assert_eq!(UnaryOperator::Not.evaluate(&json!([])), Ok(Value::Boolean(true)));
    /// ```
    pub fn evaluate<V>(&self, value: &V) -> Result<Value, TypeError>
    where
        V: JsonValue + ?Sized,
    {
        match self {
            UnaryOperator::Not => Ok(Value::Boolean(value.is_false())),
            UnaryOperator::Regex { regex, .. } => match value.as_str() {
                Some(s) if value.kind() == Kind::String => Ok(Value::Boolean(regex.is_match(s))),
                _ => Err(TypeError(format!(
                    "regex match requires a string, got {}",
                    value.kind()
                ))),
            },
        }
    }
}

impl PartialEq for UnaryOperator {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (UnaryOperator::Not, UnaryOperator::Not) => true,
            (
                UnaryOperator::Regex { regex: a, flags: fa },
                UnaryOperator::Regex { regex: b, flags: fb },
            ) => a.as_str() == b.as_str() && fa == fb,
            _ => false,
        }
    }
}

impl fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOperator::Not => f.write_str("!"),
            UnaryOperator::Regex { regex, flags } => write!(f, "=~ /{}/{}", regex.as_str().replace('/', "\\/"), flags),
        }
    }
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    /// Logical OR (`||`)
    Or,
    /// Logical AND (`&&`)
    And,
    /// Equal (`==`)
    Equal,
    /// Not equal (`!=`)
    NotEqual,
    /// Less than (`<`)
    LessThan,
    /// Less than or equal (`<=`)
    LessEqual,
    /// Greater than (`>`)
    GreaterThan,
    /// Greater than or equal (`>=`)
    GreaterEqual,
}

impl BinaryOperator {
    pub fn precedence(&self) -> u8 {
        use BinaryOperator::*;
        match self {
            Or => 2,
            And => 3,
            Equal | NotEqual => 4,
            LessThan | LessEqual | GreaterThan | GreaterEqual => 5,
        }
    }

    pub fn is_right_associative(&self) -> bool {
        false
    }

    pub fn symbol(&self) -> &'static str {
        use BinaryOperator::*;
        match self {
            Or => "||",
            And => "&&",
            Equal => "==",
            NotEqual => "!=",
            LessThan => "<",
            LessEqual => "<=",
            GreaterThan => ">",
            GreaterEqual => ">=",
        }
    }

    /// Apply the operator to two values.
    ///
    /// `||` and `&&` return one of their operands, JMESPath style. Ordering
    /// operators accept two numbers or two strings and fail on anything else.
    pub fn evaluate<L, R>(&self, left: &L, right: &R) -> Result<Value, TypeError>
    where
        L: JsonValue + ?Sized,
        R: JsonValue + ?Sized,
    {
        use BinaryOperator::*;
        match self {
            Or => Ok(if left.is_false() {
                right.to_value()
            } else {
                left.to_value()
            }),
            And => Ok(if left.is_false() {
                left.to_value()
            } else {
                right.to_value()
            }),
            Equal => Ok(Value::Boolean(json_equal(left, right))),
            NotEqual => Ok(Value::Boolean(!json_equal(left, right))),
            LessThan | LessEqual | GreaterThan | GreaterEqual => {
                let ordering = match (left.kind(), right.kind()) {
                    (Kind::Number, Kind::Number) => compare_numbers(left, right),
                    (Kind::String, Kind::String) => left.as_str().zip(right.as_str()).map(|(a, b)| a.cmp(b)),
                    (l, r) => {
                        return Err(TypeError(format!(
                            "cannot compare {} {} {}",
                            l,
                            self.symbol(),
                            r
                        )));
                    }
                };
                let result = ordering.is_some_and(|ord| match self {
                    LessThan => ord == Ordering::Less,
                    LessEqual => ord != Ordering::Greater,
                    GreaterThan => ord == Ordering::Greater,
                    _ => ord != Ordering::Less,
                });
                Ok(Value::Boolean(result))
            }
        }
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}
