//! Core error type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A setting is present but unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, Error>;
