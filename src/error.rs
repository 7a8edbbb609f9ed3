use thiserror::Error;

/// Failures of the file/image codec.
///
/// Declining to encode because compression did not help is not an error;
/// see [`crate::codec::EncodeOutcome::Aborted`].
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("compression failed: {0}")]
    Compression(String),

    #[error("corrupt data: {0}")]
    CorruptData(String),

    #[error("conversion panicked: {0}")]
    Panicked(String),

    #[error("conversion task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, CodecError>;
