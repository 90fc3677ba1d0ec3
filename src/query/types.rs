use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Default number of rows per page requested from the container.
pub(crate) const DEFAULT_PAGE_SIZE: usize = 100;

/// Projection of a query: one aggregate row or whole documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Selection {
    Count,
    Items,
}

impl Selection {
    #[must_use]
    pub const fn clause(self) -> &'static str {
        match self {
            Self::Count => "VALUE COUNT(1)",
            Self::Items => "*",
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Count => f.write_str("count"),
            Self::Items => f.write_str("list"),
        }
    }
}

/// Structural form of the WHERE clause, evaluated by containers that do not parse text.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    And(Vec<Filter>),
    Eq { path: String, value: Value },
}

impl Filter {
    #[must_use]
    pub fn eq(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq { path: path.into(), value: value.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqlParameter {
    pub name: String,
    pub value: Value,
}

/// Executable query: placeholder text plus bound parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlQuery {
    pub text: String,
    pub parameters: Vec<SqlParameter>,
    pub selection: Selection,
    pub filter: Filter,
}

impl SqlQuery {
    /// Render with parameter values inlined as quoted string literals.
    #[must_use]
    pub fn to_literal(&self) -> String {
        // Single pass so inlined values are never scanned for placeholders again.
        let mut out = String::with_capacity(self.text.len());
        let mut rest = self.text.as_str();
        while let Some(at) = rest.find('@') {
            out.push_str(&rest[..at]);
            let tail = &rest[at + 1..];
            let end = tail.find(|c: char| !(c.is_ascii_alphanumeric() || c == '_')).unwrap_or(tail.len());
            let name = &rest[at..=at + end];
            match self.parameters.iter().find(|p| p.name == name) {
                Some(p) => out.push_str(&literal(&p.value)),
                None => out.push_str(name),
            }
            rest = &tail[end..];
        }
        out.push_str(rest);
        out
    }
}

fn literal(v: &Value) -> String {
    match v {
        Value::String(s) => format!("'{}'", s.replace('\'', "''")),
        other => other.to_string(),
    }
}

/// Per-request execution options handed to the container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedOptions {
    pub partition_key: String,
    pub populate_query_metrics: bool,
    pub max_item_count: usize,
}

impl FeedOptions {
    #[must_use]
    pub fn new(partition_key: impl Into<String>) -> Self {
        Self {
            partition_key: partition_key.into(),
            populate_query_metrics: false,
            max_item_count: DEFAULT_PAGE_SIZE,
        }
    }
}
