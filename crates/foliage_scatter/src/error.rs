//! Error types and result alias for the crate.
//!
//! This module defines [`enum@crate::error::Error`] and the crate-wide [Result] alias.
//! Most variants are reported and then absorbed by the placement engine: an invalid
//! surface is skipped, an incomplete rule turns its operation into a no-op, and an
//! unavailable spatial query backend is treated as "no conflict found".
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid surface: {0}")]
    InvalidSurface(String),

    #[error("placement rule has no prefab assigned")]
    MissingPrefab,

    #[error("placement rule has no parent object assigned")]
    MissingParent,

    #[error("spatial query backend returned no data")]
    QueryUnavailable,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("{0}")]
    Other(String),
}

impl From<String> for Error {
    fn from(value: String) -> Self {
        Error::Other(value)
    }
}

impl From<&str> for Error {
    fn from(value: &str) -> Self {
        Error::Other(value.to_owned())
    }
}
