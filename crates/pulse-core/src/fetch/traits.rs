//! Seams to the outside world: the network and the response decoder.
//!
//! Neither is implemented here. Hosts plug in their HTTP client and their
//! tabular-format decoder; tests use [`crate::fetch::mock`].

use async_trait::async_trait;

use super::errors::{DecodeError, FetchError};
use crate::query::{Query, RawResponse, Table};

/// Runs one query against a data source.
///
/// Calls may be issued concurrently and settle in any order. There is no
/// cancellation: once started, a call always runs to success or failure.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(&self, link: &str, query: &Query) -> Result<RawResponse, FetchError>;
}

/// Turns one raw response into its tables. Synchronous and side-effect free.
pub trait ResponseDecoder: Send + Sync {
    fn decode(&self, raw: &RawResponse) -> Result<Vec<Table>, DecodeError>;
}
