//! # TQL Module
//!
//! Builder for TQL (Threat Query Language) expressions, the filter syntax the
//! v3 API accepts on every collection endpoint.
//!
//! Generated `<Resource>Filter` types wrap a [`Tql`] and expose one method per
//! keyword. Each method passes the keyword's [`TqlType`] along so operator
//! misuse (e.g. `>` on a string keyword) is rejected when the filter is built,
//! not when the API answers.
//!
//! ```rust
//! use tcv3::tql::{Tql, TqlOperator, TqlType};
//!
//! let mut tags = Tql::new();
//! tags.add_filter("name", TqlOperator::Eq, "malware".into(), TqlType::String).unwrap();
//!
//! let mut tql = Tql::new();
//! tql.add_filter("rating", TqlOperator::Ge, 3i64.into(), TqlType::Integer).unwrap();
//! tql.add_nested("hasTag", tags);
//! assert_eq!(tql.as_str(), r#"rating >= 3 and hasTag(name = "malware")"#);
//! ```

use std::fmt;
use std::str::FromStr;

/// Comparison operators understood by TQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TqlOperator {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    In,
    NotIn,
}

impl TqlOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            TqlOperator::Eq => "=",
            TqlOperator::Ne => "!=",
            TqlOperator::Gt => ">",
            TqlOperator::Ge => ">=",
            TqlOperator::Lt => "<",
            TqlOperator::Le => "<=",
            TqlOperator::Contains => "CONTAINS",
            TqlOperator::NotContains => "NOT CONTAINS",
            TqlOperator::StartsWith => "STARTSWITH",
            TqlOperator::EndsWith => "ENDSWITH",
            TqlOperator::In => "IN",
            TqlOperator::NotIn => "NOT IN",
        }
    }

    fn is_ordering(&self) -> bool {
        matches!(
            self,
            TqlOperator::Gt | TqlOperator::Ge | TqlOperator::Lt | TqlOperator::Le
        )
    }

    fn is_text(&self) -> bool {
        matches!(
            self,
            TqlOperator::Contains
                | TqlOperator::NotContains
                | TqlOperator::StartsWith
                | TqlOperator::EndsWith
        )
    }

    fn is_list(&self) -> bool {
        matches!(self, TqlOperator::In | TqlOperator::NotIn)
    }
}

impl fmt::Display for TqlOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Semantic type of a TQL keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TqlType {
    String,
    Integer,
    BigInteger,
    Number,
    Date,
    Boolean,
    Enum,
    Object,
}

impl TqlType {
    /// Whether `operator` may be applied to a keyword of this type.
    ///
    /// Ordering operators need an ordered type, text operators need a textual
    /// one. `Object` and `Boolean` keywords only compare for equality.
    pub fn supports(&self, operator: TqlOperator) -> bool {
        match self {
            TqlType::Object | TqlType::Boolean => {
                matches!(operator, TqlOperator::Eq | TqlOperator::Ne)
            }
            TqlType::Integer | TqlType::BigInteger | TqlType::Number | TqlType::Date => {
                !operator.is_text()
            }
            TqlType::String | TqlType::Enum => !operator.is_ordering(),
        }
    }

    /// Name of the variant as generated code spells it.
    pub fn as_str(&self) -> &'static str {
        match self {
            TqlType::String => "String",
            TqlType::Integer => "Integer",
            TqlType::BigInteger => "BigInteger",
            TqlType::Number => "Number",
            TqlType::Date => "Date",
            TqlType::Boolean => "Boolean",
            TqlType::Enum => "Enum",
            TqlType::Object => "Object",
        }
    }

    fn is_quoted(&self) -> bool {
        matches!(
            self,
            TqlType::String | TqlType::Enum | TqlType::Date | TqlType::Object
        )
    }
}

impl fmt::Display for TqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TqlType {
    type Err = TqlError;

    /// Accepts the type names the API reports, case-insensitively, plus the
    /// JSON-schema primitive names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "string" | "str" => Ok(TqlType::String),
            "integer" | "int" => Ok(TqlType::Integer),
            "biginteger" | "long" => Ok(TqlType::BigInteger),
            "number" | "double" | "float" => Ok(TqlType::Number),
            "date" | "datetime" | "date-time" => Ok(TqlType::Date),
            "boolean" | "bool" => Ok(TqlType::Boolean),
            "enum" => Ok(TqlType::Enum),
            "object" | "assoc" => Ok(TqlType::Object),
            _ => Err(TqlError::UnknownType(s.to_string())),
        }
    }
}

/// A value on the right-hand side of a TQL comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum TqlValue {
    String(String),
    Integer(i64),
    Number(f64),
    Boolean(bool),
    List(Vec<TqlValue>),
}

impl TqlValue {
    /// Whether this value may be compared against a keyword of `tql_type`.
    ///
    /// Strings are only accepted where they are rendered quoted, so a value can
    /// never add clauses of its own.
    fn fits(&self, tql_type: TqlType) -> bool {
        match self {
            TqlValue::List(items) => items.iter().all(|v| v.fits(tql_type)),
            TqlValue::String(_) => tql_type.is_quoted(),
            TqlValue::Integer(_) => !matches!(tql_type, TqlType::Boolean),
            TqlValue::Number(_) => !matches!(
                tql_type,
                TqlType::Boolean | TqlType::Integer | TqlType::BigInteger
            ),
            TqlValue::Boolean(_) => tql_type == TqlType::Boolean,
        }
    }

    fn render(&self, tql_type: TqlType) -> String {
        match self {
            TqlValue::List(items) => {
                let items: Vec<String> = items.iter().map(|v| v.render(tql_type)).collect();
                format!("({})", items.join(", "))
            }
            TqlValue::String(s) => quote(s),
            TqlValue::Integer(i) if tql_type.is_quoted() => quote(&i.to_string()),
            TqlValue::Integer(i) => i.to_string(),
            TqlValue::Number(n) if tql_type.is_quoted() => quote(&n.to_string()),
            TqlValue::Number(n) => n.to_string(),
            TqlValue::Boolean(b) => b.to_string(),
        }
    }
}

fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

impl From<&str> for TqlValue {
    fn from(v: &str) -> Self {
        TqlValue::String(v.to_string())
    }
}

impl From<String> for TqlValue {
    fn from(v: String) -> Self {
        TqlValue::String(v)
    }
}

impl From<i64> for TqlValue {
    fn from(v: i64) -> Self {
        TqlValue::Integer(v)
    }
}

impl From<i32> for TqlValue {
    fn from(v: i32) -> Self {
        TqlValue::Integer(i64::from(v))
    }
}

impl From<f64> for TqlValue {
    fn from(v: f64) -> Self {
        TqlValue::Number(v)
    }
}

impl From<bool> for TqlValue {
    fn from(v: bool) -> Self {
        TqlValue::Boolean(v)
    }
}

impl<T: Into<TqlValue>> From<Vec<T>> for TqlValue {
    fn from(v: Vec<T>) -> Self {
        TqlValue::List(v.into_iter().map(Into::into).collect())
    }
}

/// Errors raised while building a TQL expression.
#[derive(Debug, Clone, PartialEq)]
pub enum TqlError {
    /// The operator does not apply to the keyword's type.
    InvalidOperator {
        keyword: String,
        operator: TqlOperator,
        tql_type: TqlType,
    },
    /// `IN`/`NOT IN` need a list, every other operator a scalar.
    InvalidValue {
        keyword: String,
        operator: TqlOperator,
    },
    /// The value's kind does not match the keyword's type (e.g. text for an
    /// integer keyword).
    MismatchedValue { keyword: String, tql_type: TqlType },
    UnknownType(String),
}

impl fmt::Display for TqlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TqlError::InvalidOperator {
                keyword,
                operator,
                tql_type,
            } => write!(
                f,
                "operator {operator} is not valid for {tql_type} keyword '{keyword}'"
            ),
            TqlError::InvalidValue { keyword, operator } if operator.is_list() => {
                write!(f, "operator {operator} on '{keyword}' requires a list value")
            }
            TqlError::InvalidValue { keyword, operator } => {
                write!(f, "operator {operator} on '{keyword}' requires a single value")
            }
            TqlError::MismatchedValue { keyword, tql_type } => {
                write!(f, "value for {tql_type} keyword '{keyword}' has the wrong type")
            }
            TqlError::UnknownType(t) => write!(f, "unknown TQL type '{t}'"),
        }
    }
}

impl std::error::Error for TqlError {}

#[derive(Debug, Clone, PartialEq)]
enum Clause {
    Filter {
        keyword: String,
        operator: TqlOperator,
        value: TqlValue,
        tql_type: TqlType,
    },
    Nested {
        keyword: String,
        tql: Tql,
    },
}

/// An ordered conjunction of TQL clauses.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tql {
    clauses: Vec<Clause>,
}

impl Tql {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Append `keyword <operator> value`.
    ///
    /// # Errors
    ///
    /// Returns [`TqlError::InvalidOperator`] if the operator does not apply to
    /// `tql_type`, or [`TqlError::InvalidValue`] if a list was given where a
    /// scalar is expected (or the reverse), or [`TqlError::MismatchedValue`]
    /// if the value's kind does not fit `tql_type`.
    pub fn add_filter(
        &mut self,
        keyword: &str,
        operator: TqlOperator,
        value: TqlValue,
        tql_type: TqlType,
    ) -> Result<&mut Self, TqlError> {
        if !tql_type.supports(operator) {
            return Err(TqlError::InvalidOperator {
                keyword: keyword.to_string(),
                operator,
                tql_type,
            });
        }
        if operator.is_list() != matches!(value, TqlValue::List(_)) {
            return Err(TqlError::InvalidValue {
                keyword: keyword.to_string(),
                operator,
            });
        }
        if !value.fits(tql_type) {
            return Err(TqlError::MismatchedValue {
                keyword: keyword.to_string(),
                tql_type,
            });
        }
        self.clauses.push(Clause::Filter {
            keyword: keyword.to_string(),
            operator,
            value,
            tql_type,
        });
        Ok(self)
    }

    /// Append a nested filter, rendered as `keyword(<inner>)`.
    pub fn add_nested(&mut self, keyword: &str, tql: Tql) -> &mut Self {
        self.clauses.push(Clause::Nested {
            keyword: keyword.to_string(),
            tql,
        });
        self
    }

    /// Render the expression; clauses are joined with `and`.
    pub fn as_str(&self) -> String {
        self.clauses
            .iter()
            .map(|clause| match clause {
                Clause::Filter {
                    keyword,
                    operator,
                    value,
                    tql_type,
                } => format!("{keyword} {operator} {}", value.render(*tql_type)),
                Clause::Nested { keyword, tql } => format!("{keyword}({})", tql.as_str()),
            })
            .collect::<Vec<_>>()
            .join(" and ")
    }
}

impl fmt::Display for Tql {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str())
    }
}
