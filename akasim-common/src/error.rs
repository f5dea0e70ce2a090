//! Error types for akasim

use thiserror::Error;

/// Error types for the akasim library.
#[derive(Debug, Error)]
pub enum Error {
    /// A fixed-width input or derived field has the wrong length.
    #[error("length of {field} should be {expected}, got: {actual}")]
    LengthMismatch {
        /// Name of the offending field (K, OP, RAND, ...).
        field: &'static str,
        /// Width the field must have, in bytes.
        expected: usize,
        /// Width that was observed.
        actual: usize,
    },

    /// MCC/MNC validation or serving network name assembly failed.
    #[error("invalid serving network inputs: {0}")]
    ServingNetwork(String),

    /// The underlying block cipher rejected its key.
    ///
    /// Key widths are checked before the cipher is ever built, so this
    /// kind is declared for completeness and is not produced by any
    /// derivation path.
    #[error("cipher init error: {0}")]
    CipherInit(String),

    /// A derivation was requested before the values it consumes exist.
    #[error("crypto error: {0}")]
    Crypto(String),

    /// Configuration-related errors.
    #[error("configuration error: {0}")]
    Config(String),

    /// File I/O errors.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing errors.
    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),
}
