use std::borrow::Cow;

use log::trace;
use pixelpipe_image::Image;

use crate::{
    core::{Capability, Filter, SharedFilter},
    error::FilterError,
    parallel::ParallelRunner,
};

/// A composite filter that applies a sequence of filters in order.
///
/// Nested pipelines are flattened at construction, so a pipeline never
/// contains another pipeline. The pixel transforms are unsupported: neighborhood
/// filters in the middle of a pipeline need a fully materialized intermediate
/// image, so only [`Filter::apply`] is meaningful.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use pixelpipe_image::{Color, Image};
/// use pixelpipe_filter::{color::{Grayscale, Invert}, pipeline::FilterPipeline, Filter};
///
/// let pipeline = FilterPipeline::new(vec![Arc::new(Grayscale), Arc::new(Invert)]).unwrap();
/// assert_eq!(pipeline.name(), "grayscale|invert");
///
/// let image = Image::from_size_val([1, 1].into(), Color::RED).unwrap();
/// let out = pipeline.apply(&image).unwrap();
/// assert_eq!(out.get_pixel(0, 0).unwrap(), Color::gray(179));
/// ```
#[derive(Clone)]
pub struct FilterPipeline {
    filters: Vec<SharedFilter>,
}

impl FilterPipeline {
    /// Create a pipeline from a non-empty list of filters.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::InvalidArgument`] if `filters` is empty.
    pub fn new(filters: Vec<SharedFilter>) -> Result<Self, FilterError> {
        if filters.is_empty() {
            return Err(FilterError::InvalidArgument(
                "filter pipeline requires at least one filter".to_string(),
            ));
        }

        let mut flat = Vec::with_capacity(filters.len());
        for filter in filters {
            match filter.stages() {
                // members of a pipeline are already flat
                Some(stages) => flat.extend(stages.iter().cloned()),
                None => flat.push(filter),
            }
        }

        Ok(Self { filters: flat })
    }

    /// The number of filters in the pipeline.
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Always false, a pipeline holds at least one filter.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Iterate over the member filters in application order.
    pub fn iter(&self) -> impl Iterator<Item = &SharedFilter> {
        self.filters.iter()
    }

    /// Apply each stage through `runner` instead of each stage's own `apply`.
    ///
    /// Per-pixel stages are partitioned across the runner's workers; the
    /// result is identical to [`Filter::apply`].
    pub fn apply_with(&self, src: &Image, runner: &ParallelRunner) -> Result<Image, FilterError> {
        let (first, rest) = self.split_first();
        let mut current = runner.run(first.as_ref(), src)?;
        for filter in rest {
            trace!("pipeline stage {}", filter.name());
            current = runner.run(filter.as_ref(), &current)?;
        }
        Ok(current)
    }

    fn split_first(&self) -> (&SharedFilter, &[SharedFilter]) {
        // construction guarantees at least one filter
        let (first, rest) = self.filters.split_at(1);
        (&first[0], rest)
    }
}

impl std::fmt::Debug for FilterPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("FilterPipeline").field(&self.name()).finish()
    }
}

impl Filter for FilterPipeline {
    fn name(&self) -> Cow<'_, str> {
        let names: Vec<Cow<'_, str>> = self.filters.iter().map(|f| f.name()).collect();
        names.join("|").into()
    }

    fn capability(&self) -> Capability {
        Capability::WholeImage
    }

    fn apply(&self, src: &Image) -> Result<Image, FilterError> {
        let (first, rest) = self.split_first();
        let mut current = first.apply(src)?;
        for filter in rest {
            trace!("pipeline stage {}", filter.name());
            current = filter.apply(&current)?;
        }
        Ok(current)
    }

    fn stages(&self) -> Option<&[SharedFilter]> {
        Some(&self.filters)
    }
}
