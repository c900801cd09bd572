#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// pointwise color filters.
pub mod color;

/// the filter trait and the generic per-pixel algorithm.
pub mod core;

/// statistic-dependent enhancement filters.
pub mod enhance;

/// error types for the filter module.
pub mod error;

/// convolution kernels.
pub mod kernels;

/// module containing the parallel execution engine.
pub mod parallel;

/// sequential composition of filters.
pub mod pipeline;

/// filter lookup by name and option parsing.
pub mod registry;

/// image resizing filters.
pub mod resize;

/// neighborhood filters.
pub mod spatial;

pub use crate::core::{Capability, Filter, SharedFilter};
pub use crate::error::FilterError;
pub use crate::parallel::{run, ExecutionConfig, ParallelRunner};
pub use crate::pipeline::FilterPipeline;
pub use crate::registry::{FilterOptions, FilterRegistry};
