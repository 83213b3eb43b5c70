//! Framework error type.
//!
//! Sub-crates may define their own error enums and convert them into
//! `CosimError` via `From` impls, or keep them separate and wrap `CosimError`
//! as one variant.  Both patterns are acceptable; prefer whichever keeps
//! error sites clean.

use thiserror::Error;

/// The top-level error type for `cosim-core` and a common base for sub-crates.
#[derive(Debug, Error)]
pub enum CosimError {
    #[error("object type '{0}' is not registered")]
    TypeNotFound(String),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Shorthand result type for all `cosim-*` crates.
pub type CosimResult<T> = Result<T, CosimError>;
