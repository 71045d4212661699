//! Network and decoder boundaries used by the panel orchestrator.

pub mod errors;
pub mod mock;
pub mod operations;
pub mod traits;

pub use errors::{DecodeError, FetchError};
pub use operations::{decode_all, execute_all};
pub use traits::{QueryExecutor, ResponseDecoder};
