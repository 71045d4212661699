//! Query and result types shared by the fetch and panel layers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A request descriptor for one panel query.
///
/// Only [`Query::text`] takes part in change detection; everything else
/// travels with the query to the executor untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    pub text: String,
    /// Query language, e.g. `flux` or `influxql`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl Query {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: None,
        }
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }
}

impl std::fmt::Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

/// Undecoded payload returned by the network for one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub body: String,
}

impl RawResponse {
    pub fn new(body: impl Into<String>) -> Self {
        Self { body: body.into() }
    }
}

/// One decoded result table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub id: String,
    pub name: String,
    /// Name of the result set this table belongs to.
    pub result: String,
    pub group_key: BTreeMap<String, String>,
    pub columns: Vec<String>,
    /// Data rows, header excluded.
    pub data: Vec<Vec<String>>,
}

impl Table {
    pub fn row_count(&self) -> usize {
        self.data.len()
    }

    pub fn has_rows(&self) -> bool {
        !self.data.is_empty()
    }
}

/// Ordered concatenation of every query's decoded tables.
pub type QueryResult = Vec<Table>;

/// Whether any table carries at least one data row.
pub fn has_values(tables: &[Table]) -> bool {
    tables.iter().any(Table::has_rows)
}
