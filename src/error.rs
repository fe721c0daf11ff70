use thiserror::Error;

/// Failures raised by the durable storage tier.
///
/// These never cross the public cache API: the cache catches every one,
/// logs it, and degrades to a miss or a memory-only write.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
