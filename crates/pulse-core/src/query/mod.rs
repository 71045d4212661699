pub mod diff;
pub mod types;

pub use diff::{queries_differ, query_difference};
pub use types::{Query, QueryResult, RawResponse, Table, has_values};
