//! Query model shared by the client surface and the store backends.
//!
//! A query is a conjunction of [`FieldFilter`]s over a single collection, optionally
//! followed by an ordering, an offset and a limit. Filters are usually built either from
//! operator strings, the way a remote client would pass them:
//!
//! ```ignore
//! use docmock::query::FieldFilter;
//!
//! let filter = FieldFilter::parse("age", ">=", 18)?;
//! ```
//!
//! or through the [`Filter`] helpers:
//!
//! ```ignore
//! use docmock::query::Filter;
//!
//! let filter = Filter::in_values("status", vec!["open", "pending"]);
//! ```

use std::{fmt, str::FromStr};

use bson::Bson;

use crate::error::{StoreError, StoreResult};

/// Sort direction for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    /// Ascending order (A to Z, 0 to 9, earliest to latest).
    #[default]
    Asc,
    /// Descending order (Z to A, 9 to 0, latest to earliest).
    Desc,
}

/// Sort specification for query results.
#[derive(Debug, Clone, PartialEq)]
pub struct Sort {
    /// The field name to sort by.
    pub field: String,
    /// The sort direction.
    pub direction: SortDirection,
}

/// Field comparison operators supported by `where` filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldOp {
    /// `==`
    Eq,
    /// `<`
    Lt,
    /// `<=`
    Lte,
    /// `>`
    Gt,
    /// `>=`
    Gte,
    /// `array-contains`: the array field contains the value.
    ArrayContains,
    /// `in`: the field equals one of up to ten values.
    In,
    /// `array-contains-any`: the array field contains one of up to ten values.
    ArrayContainsAny,
}

impl FieldOp {
    /// Returns the operator string used by remote clients.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldOp::Eq => "==",
            FieldOp::Lt => "<",
            FieldOp::Lte => "<=",
            FieldOp::Gt => ">",
            FieldOp::Gte => ">=",
            FieldOp::ArrayContains => "array-contains",
            FieldOp::In => "in",
            FieldOp::ArrayContainsAny => "array-contains-any",
        }
    }

    /// Whether the operator takes a list of values rather than a single one.
    pub fn takes_value_list(&self) -> bool {
        matches!(self, FieldOp::In | FieldOp::ArrayContainsAny)
    }
}

impl fmt::Display for FieldOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldOp {
    type Err = StoreError;

    fn from_str(op: &str) -> Result<Self, Self::Err> {
        match op {
            "==" => Ok(FieldOp::Eq),
            "<" => Ok(FieldOp::Lt),
            "<=" => Ok(FieldOp::Lte),
            ">" => Ok(FieldOp::Gt),
            ">=" => Ok(FieldOp::Gte),
            "array-contains" => Ok(FieldOp::ArrayContains),
            "in" => Ok(FieldOp::In),
            "array-contains-any" => Ok(FieldOp::ArrayContainsAny),
            other => Err(StoreError::UnsupportedOperator(other.to_string())),
        }
    }
}

/// A single `field <op> value` predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    /// The field name, or a dotted path into nested maps.
    pub field: String,
    /// The comparison operator.
    pub op: FieldOp,
    /// The operand. A list for `in` and `array-contains-any`.
    pub value: Bson,
}

impl FieldFilter {
    /// Creates a filter from an already parsed operator.
    pub fn new(field: impl Into<String>, op: FieldOp, value: impl Into<Bson>) -> Self {
        Self {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    /// Creates a filter from an operator string.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnsupportedOperator`] for unknown operator strings.
    pub fn parse(field: impl Into<String>, op: &str, value: impl Into<Bson>) -> StoreResult<Self> {
        Ok(Self::new(field, op.parse()?, value))
    }
}

/// Helper struct for constructing field filters.
///
/// # Example
///
/// ```ignore
/// use docmock::query::Filter;
///
/// let adults = Filter::gte("age", 18);
/// let tagged = Filter::array_contains("tags", "rust");
/// ```
pub struct Filter;

impl Filter {
    /// Matches documents where the field equals the value.
    pub fn eq(field: impl Into<String>, value: impl Into<Bson>) -> FieldFilter {
        FieldFilter::new(field, FieldOp::Eq, value)
    }

    /// Matches documents where the field is less than the value.
    pub fn lt(field: impl Into<String>, value: impl Into<Bson>) -> FieldFilter {
        FieldFilter::new(field, FieldOp::Lt, value)
    }

    /// Matches documents where the field is less than or equal to the value.
    pub fn lte(field: impl Into<String>, value: impl Into<Bson>) -> FieldFilter {
        FieldFilter::new(field, FieldOp::Lte, value)
    }

    /// Matches documents where the field is greater than the value.
    pub fn gt(field: impl Into<String>, value: impl Into<Bson>) -> FieldFilter {
        FieldFilter::new(field, FieldOp::Gt, value)
    }

    /// Matches documents where the field is greater than or equal to the value.
    pub fn gte(field: impl Into<String>, value: impl Into<Bson>) -> FieldFilter {
        FieldFilter::new(field, FieldOp::Gte, value)
    }

    /// Matches documents whose array field contains the value.
    pub fn array_contains(field: impl Into<String>, value: impl Into<Bson>) -> FieldFilter {
        FieldFilter::new(field, FieldOp::ArrayContains, value)
    }

    /// Matches documents whose field equals any of the values.
    pub fn in_values<V: Into<Bson>>(field: impl Into<String>, values: Vec<V>) -> FieldFilter {
        FieldFilter::new(field, FieldOp::In, Self::list(values))
    }

    /// Matches documents whose array field contains any of the values.
    pub fn array_contains_any<V: Into<Bson>>(field: impl Into<String>, values: Vec<V>) -> FieldFilter {
        FieldFilter::new(field, FieldOp::ArrayContainsAny, Self::list(values))
    }

    fn list<V: Into<Bson>>(values: Vec<V>) -> Bson {
        Bson::Array(values.into_iter().map(Into::into).collect())
    }
}

/// The full description of a query over one collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryDefinition {
    /// Filters that all have to match.
    pub filters: Vec<FieldFilter>,
    /// Maximum number of documents to return.
    pub limit: Option<usize>,
    /// Number of documents to skip.
    pub offset: Option<usize>,
    /// Sort specification for results.
    pub sort: Option<Sort>,
}

impl QueryDefinition {
    /// Creates an empty definition matching every document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the definition narrows the collection at all.
    pub fn has_filters(&self) -> bool {
        !self.filters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_every_supported_operator() {
        for op in [
            FieldOp::Eq,
            FieldOp::Lt,
            FieldOp::Lte,
            FieldOp::Gt,
            FieldOp::Gte,
            FieldOp::ArrayContains,
            FieldOp::In,
            FieldOp::ArrayContainsAny,
        ] {
            assert_eq!(op.as_str().parse::<FieldOp>().unwrap(), op);
        }
    }

    #[test]
    fn test_parse_unknown_operator() {
        let err = FieldFilter::parse("age", "!=", 3).unwrap_err();
        assert_eq!(err, StoreError::UnsupportedOperator("!=".to_string()));
    }

    #[test]
    fn test_filter_helpers_build_lists() {
        let filter = Filter::in_values("status", vec!["open", "closed"]);
        assert_eq!(filter.op, FieldOp::In);
        assert_eq!(
            filter.value,
            Bson::Array(vec![Bson::String("open".into()), Bson::String("closed".into())])
        );
        assert!(filter.op.takes_value_list());
        assert!(!Filter::eq("a", 1).op.takes_value_list());
    }
}
