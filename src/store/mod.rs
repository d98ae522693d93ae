//! Spatial store boundary.
//!
//! The store executes what the query builder produces. A real deployment
//! implements [`SpatialStore`] over a geography-capable SQL database by
//! running [`SpatialQuery::to_statement`](crate::query::SpatialQuery::to_statement)
//! output; [`MemoryStore`] evaluates the same expression trees in-process.

mod index;
mod memory;

use thiserror::Error;

use crate::query::{ScalarQuery, SpatialQuery};

pub use memory::{MemoryStore, RowRecord};

/// Row identifier in a store table
pub type RowId = i64;

/// Failures reported by the store while executing a query.
///
/// Passed through to callers unchanged; nothing in this crate retries.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Geography text the store could not parse.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// Coordinates outside the WGS84 geography range.
    #[error("coordinates out of range: {0}")]
    OutOfRange(String),

    #[error("unknown table: {0}")]
    UnknownTable(String),

    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// Connection or driver failure.
    #[error("store backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Single value returned by a scalar query.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    Bool(bool),
    Float(f64),
    Text(String),
    /// SQL NULL, or no row matched
    Null,
}

impl ScalarValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            ScalarValue::Bool(_) => "bool",
            ScalarValue::Float(_) => "float",
            ScalarValue::Text(_) => "text",
            ScalarValue::Null => "null",
        }
    }
}

/// A store able to execute spatial filters and scalar spatial functions.
///
/// Each call is one round trip; the caller awaits it to completion.
#[allow(async_fn_in_trait)]
pub trait SpatialStore {
    /// Execute a row filter and return matching ids in result order.
    async fn select_ids(&self, query: &SpatialQuery) -> Result<Vec<RowId>, StoreError>;

    /// Execute a query producing a single value.
    async fn scalar(&self, query: &ScalarQuery) -> Result<ScalarValue, StoreError>;
}

impl<S: SpatialStore> SpatialStore for &S {
    async fn select_ids(&self, query: &SpatialQuery) -> Result<Vec<RowId>, StoreError> {
        (**self).select_ids(query).await
    }

    async fn scalar(&self, query: &ScalarQuery) -> Result<ScalarValue, StoreError> {
        (**self).scalar(query).await
    }
}
