//! Conditional WHERE-clause fragments.
//!
//! A [`Condition`] is a validated `(field, operator, value)` triple. Rendering
//! it for a [`Dialect`] yields the SQL fragment and the parameters it binds.

use crate::db::Value;
use crate::dialect::Dialect;
use crate::error::{GenDbError, Result};
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Longest accepted field name.
pub const MAX_FIELD_LEN: usize = 128;

fn field_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9_]{1,128}$").expect("field pattern is valid")
    })
}

/// Checks a field name: ASCII alphanumerics and underscores, 1 to 128 chars.
pub fn validate_field(field: &str) -> Result<()> {
    if field_pattern().is_match(field) {
        Ok(())
    } else {
        Err(GenDbError::condition(format!(
            "Incompatible field '{field}'. Must be 1-{MAX_FIELD_LEN} characters of alphanumerics and underscore"
        )))
    }
}

/// Comparison operators accepted in conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    Gt,
    Lt,
    Ge,
    Le,
    /// `<>`
    LtGt,
    /// `!=`
    Ne,
    In,
    NotIn,
    Like,
    NotLike,
}

impl Operator {
    pub const ALL: [Operator; 11] = [
        Operator::Eq,
        Operator::Gt,
        Operator::Lt,
        Operator::Ge,
        Operator::Le,
        Operator::LtGt,
        Operator::Ne,
        Operator::In,
        Operator::NotIn,
        Operator::Like,
        Operator::NotLike,
    ];

    /// SQL spelling of the operator.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Ge => ">=",
            Self::Le => "<=",
            Self::LtGt => "<>",
            Self::Ne => "!=",
            Self::In => "in",
            Self::NotIn => "not in",
            Self::Like => "like",
            Self::NotLike => "not like",
        }
    }

    /// True for `in` and `not in`.
    pub fn is_membership(&self) -> bool {
        matches!(self, Self::In | Self::NotIn)
    }

    /// True for `!=` and `<>`.
    pub fn is_inequality(&self) -> bool {
        matches!(self, Self::Ne | Self::LtGt)
    }
}

impl FromStr for Operator {
    type Err = GenDbError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
        Self::ALL
            .into_iter()
            .find(|op| op.as_sql() == normalized)
            .ok_or_else(|| {
                let allowed: Vec<&str> = Self::ALL.iter().map(|op| op.as_sql()).collect();
                GenDbError::condition(format!(
                    "Incompatible conditional '{s}'. Allowed options: {}",
                    allowed.join(", ")
                ))
            })
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// The right-hand side of a condition.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionValue {
    /// Matches with `IS NULL` / `IS NOT NULL`.
    Null,
    /// A single bound value.
    Scalar(Value),
    /// A group of bound values for `in` / `not in`.
    List(Vec<Value>),
}

impl From<Value> for ConditionValue {
    fn from(v: Value) -> Self {
        match v {
            Value::Null => Self::Null,
            other => Self::Scalar(other),
        }
    }
}

impl From<bool> for ConditionValue {
    fn from(v: bool) -> Self {
        Self::Scalar(v.into())
    }
}

impl From<i32> for ConditionValue {
    fn from(v: i32) -> Self {
        Self::Scalar(v.into())
    }
}

impl From<i64> for ConditionValue {
    fn from(v: i64) -> Self {
        Self::Scalar(v.into())
    }
}

impl From<f64> for ConditionValue {
    fn from(v: f64) -> Self {
        Self::Scalar(v.into())
    }
}

impl From<&str> for ConditionValue {
    fn from(v: &str) -> Self {
        Self::Scalar(v.into())
    }
}

impl From<String> for ConditionValue {
    fn from(v: String) -> Self {
        Self::Scalar(v.into())
    }
}

impl<T> From<Option<T>> for ConditionValue
where
    T: Into<Value>,
{
    fn from(v: Option<T>) -> Self {
        Value::from(v).into()
    }
}

impl<T> From<Vec<T>> for ConditionValue
where
    T: Into<Value>,
{
    fn from(v: Vec<T>) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}

/// A validated condition, ready to render.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub field: String,
    pub operator: Operator,
    pub value: ConditionValue,
}

/// SQL fragment for a condition plus the parameters it binds, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedCondition {
    pub fragment: String,
    pub params: Vec<Value>,
}

impl Condition {
    /// Validates the operator and field name.
    pub fn new(field: &str, operator: &str, value: impl Into<ConditionValue>) -> Result<Self> {
        let operator: Operator = operator.parse()?;
        validate_field(field)?;
        Ok(Self {
            field: field.to_string(),
            operator,
            value: value.into(),
        })
    }

    /// Renders the condition for `dialect`.
    ///
    /// Null only combines with equality and inequality, and lists only with
    /// `in` / `not in`; anything else is rejected rather than dropped.
    pub fn render(&self, dialect: Dialect) -> Result<RenderedCondition> {
        let field = self.field.as_str();
        let op = self.operator;

        match &self.value {
            ConditionValue::Null | ConditionValue::Scalar(Value::Null) => {
                let fragment = match op {
                    Operator::Eq => format!("{field} is null"),
                    _ if op.is_inequality() => format!("{field} is not null"),
                    _ => {
                        return Err(GenDbError::condition(format!(
                            "Operator '{op}' cannot be used with a null value on '{field}'. Use '=', '!=' or '<>'"
                        )))
                    }
                };
                Ok(RenderedCondition {
                    fragment,
                    params: Vec::new(),
                })
            }

            ConditionValue::List(values) => {
                if !op.is_membership() {
                    return Err(GenDbError::condition(format!(
                        "A list value on '{field}' needs 'in' or 'not in', got '{op}'"
                    )));
                }
                if values.is_empty() {
                    return Err(GenDbError::condition(format!(
                        "Empty list for '{field} {op}'"
                    )));
                }
                let group = vec!["?"; values.len()].join(",");
                Ok(RenderedCondition {
                    fragment: format!("{field} {op} ({group})"),
                    params: values.clone(),
                })
            }

            ConditionValue::Scalar(value) => {
                let lhs = if value.is_numeric() {
                    dialect.numeric_operand(field, value)
                } else {
                    field.to_string()
                };
                let rhs = if op.is_membership() { "(?)" } else { "?" };
                Ok(RenderedCondition {
                    fragment: format!("{lhs} {op} {rhs}"),
                    params: vec![value.clone()],
                })
            }
        }
    }
}
