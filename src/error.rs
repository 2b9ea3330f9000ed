use thiserror::Error;

/// Failure taxonomy shared by the whole crate.
///
/// Every fallible operation funnels into this enum so the ABI layer can
/// surface a single descriptive message per failing call.
#[derive(Debug, Error)]
pub enum TexError {
    /// Invalid handle or layer/mipmap index.
    #[error("{0}: index out of range")]
    NotFound(String),

    /// The format has no translation into the required external space,
    /// or is outside the set a given operation accepts.
    #[error("unsupported format: {0}")]
    Unsupported(String),

    /// A buffer does not match the geometry-derived expected size.
    #[error("size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// The compression/decompression backend returned non-success.
    #[error("texture compression failed: {0}")]
    Codec(String),

    /// The progress callback requested an abort.
    #[error("aborted by user")]
    Cancelled,

    /// A container reader could not make sense of the file contents.
    #[error("could not load image: {0}")]
    Decode(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, TexError>;
