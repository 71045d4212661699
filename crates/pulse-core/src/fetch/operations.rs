use futures::future::join_all;

use super::errors::{DecodeError, FetchError};
use super::traits::{QueryExecutor, ResponseDecoder};
use crate::query::{Query, QueryResult, RawResponse};

/// Issue one request per query concurrently and wait for all of them.
///
/// Every request settles before the batch does; none is dropped early.
/// Any failure fails the whole batch with the first error in query order.
/// Responses keep query order.
pub async fn execute_all(
    executor: &dyn QueryExecutor,
    link: &str,
    queries: &[Query],
) -> Result<Vec<RawResponse>, FetchError> {
    join_all(queries.iter().map(|query| executor.execute(link, query)))
        .await
        .into_iter()
        .collect()
}

/// Decode each response and concatenate the tables in response order.
pub fn decode_all(
    decoder: &dyn ResponseDecoder,
    responses: &[RawResponse],
) -> Result<QueryResult, DecodeError> {
    let mut tables = QueryResult::new();
    for response in responses {
        tables.extend(decoder.decode(response)?);
    }
    Ok(tables)
}
