//! Error types for spatial search.

use thiserror::Error;

use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum Error {
    /// The searching entity has neither a geography point nor lat/lng.
    #[error("no geography point or lat/lng to search from")]
    MissingLocation,

    /// Failure reported by the store, unchanged.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Centroid requested for zero points.
    #[error("cannot compute the centroid of an empty point set")]
    EmptyInput,

    /// The store answered with a value of the wrong type.
    #[error("store returned {found} where {expected} was expected")]
    UnexpectedScalar {
        expected: &'static str,
        found: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
