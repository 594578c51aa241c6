use std::fmt::Debug;

/// Failures reported by tree construction and encoding.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error<T: Debug> {
    /// Construction was requested without any frequency entries.
    #[error("cannot build a code for an empty alphabet")]
    EmptyAlphabet,

    /// A symbol was not part of the frequency table the code was built from.
    #[error("symbol {0:?} is not in the code table")]
    UnknownSymbol(T),
}

pub type Result<V, T> = std::result::Result<V, Error<T>>;
