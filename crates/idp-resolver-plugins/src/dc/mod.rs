//! Data connector implementations.

mod search;
mod static_connector;

pub use search::{SearchDataConnector, SearchExecutor};
pub use static_connector::StaticDataConnector;
