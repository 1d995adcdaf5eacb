use thiserror::Error;

/// Errors raised by the [`Index`](crate::Index) layer.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum IndexError {
    /// `enter` was given an empty keyword.
    #[error("keyword must be non-empty")]
    InvalidKeyword,
    /// `enter` or `fix` was called after the index had already been frozen.
    #[error("index is already frozen")]
    AlreadyFrozen,
    /// `query` was called before the index was frozen.
    #[error("index has not been frozen yet; call fix() first")]
    NotFrozen,
}

/// Errors raised by the [`Registry`](crate::Registry) layer.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// `enter` was called after the registry's index had already been
    /// frozen (which happens automatically on the first `query`).
    #[error("registry is already frozen; enter() cannot be called after query()")]
    AlreadyFrozen,
    /// (feature `confirm` only) a regex failed to compile.
    #[cfg(feature = "confirm")]
    #[error("failed to compile regex: {0}")]
    Regex(#[from] regex::Error),
}
