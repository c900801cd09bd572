use pixelpipe_image::ImageError;
use thiserror::Error;

/// Errors that can occur while building or running filters.
#[derive(Error, Debug, PartialEq)]
pub enum FilterError {
    /// A constructor parameter or call argument is invalid.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The filter implements neither the context-free nor the context-aware transform.
    #[error("no valid pixel transform implemented for filter: {0}")]
    InvalidFilterState(String),

    /// The registry has no filter under the requested name.
    #[error("unknown filter: {name}. Available: {}", available.join(", "))]
    UnknownFilter {
        /// The requested name.
        name: String,
        /// The registered names, sorted.
        available: Vec<String>,
    },

    /// A worker panicked while processing its row partition.
    #[error("worker failed on rows {start}..{end}: {reason}")]
    WorkerFailure {
        /// First row of the failed partition.
        start: usize,
        /// One past the last row of the failed partition.
        end: usize,
        /// The panic message, when one could be recovered.
        reason: String,
    },

    /// The worker pool could not be built.
    #[error("failed to build thread pool: {0}")]
    ThreadPool(String),

    /// An error from the underlying image type.
    #[error(transparent)]
    Image(#[from] ImageError),
}
