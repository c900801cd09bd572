use std::panic::{self, AssertUnwindSafe};

use log::{debug, trace, warn};
use pixelpipe_image::Image;
use rayon::prelude::*;

use crate::{
    core::{transform_rows, Capability, Filter},
    error::FilterError,
    registry::FilterOptions,
};

/// Option key reserved for the worker count.
pub const THREADS_OPTION: &str = "threads";

/// Controls how [`ParallelRunner`] executes filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionConfig {
    /// Number of workers. `0` and `1` both run on the calling thread.
    pub threads: usize,

    /// Delegate to a filter's own whole-image algorithm when it has one.
    pub allow_whole_image: bool,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            threads: default_threads(),
            allow_whole_image: true,
        }
    }
}

impl ExecutionConfig {
    /// Set the number of workers.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Allow or forbid delegation to whole-image algorithms.
    pub fn with_whole_image(mut self, allow: bool) -> Self {
        self.allow_whole_image = allow;
        self
    }

    /// Build a config from user options, reading the reserved `threads` key.
    ///
    /// A missing, non-positive or unparsable value keeps the host default.
    pub fn from_options(options: &FilterOptions) -> Self {
        let config = Self::default();
        let Some(raw) = options.get(THREADS_OPTION) else {
            return config;
        };
        match raw.trim().parse::<usize>() {
            Ok(threads) if threads > 0 => config.with_threads(threads),
            _ => {
                warn!("invalid thread count: {raw}, using {}", config.threads);
                config
            }
        }
    }
}

/// Number of threads the host can run in parallel, at least one.
pub fn default_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Runs filters over images, partitioning rows across a fixed pool of workers.
///
/// The pool is built once and reused by every call to [`ParallelRunner::run`].
///
/// # Example
///
/// ```
/// use pixelpipe_image::{Color, Image};
/// use pixelpipe_filter::{color::Invert, ExecutionConfig, ParallelRunner};
///
/// let runner = ParallelRunner::new(ExecutionConfig::default().with_threads(2)).unwrap();
/// let image = Image::from_size_val([4, 4].into(), Color::BLACK).unwrap();
///
/// let out = runner.run(&Invert, &image).unwrap();
/// assert!(out.pixels().all(|p| p == Color::WHITE));
/// ```
pub struct ParallelRunner {
    config: ExecutionConfig,
    pool: Option<rayon::ThreadPool>,
}

impl ParallelRunner {
    /// Create a runner, building its worker pool when more than one thread is requested.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::ThreadPool`] if the pool cannot be built.
    pub fn new(config: ExecutionConfig) -> Result<Self, FilterError> {
        let pool = if config.threads > 1 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(config.threads)
                .thread_name(|i| format!("pixelpipe-worker-{i}"))
                .build()
                .map_err(|e| FilterError::ThreadPool(e.to_string()))?;
            Some(pool)
        } else {
            None
        };

        Ok(Self { config, pool })
    }

    /// The configuration of the runner.
    pub fn config(&self) -> &ExecutionConfig {
        &self.config
    }

    /// Apply `filter` to `src`.
    ///
    /// Filters tagged [`Capability::WholeImage`] run their own algorithm on the
    /// calling thread when the config allows it. Every other filter runs the
    /// generic per-pixel algorithm with rows split into contiguous partitions,
    /// one per worker. The output is identical to the serial
    /// [`crate::core::apply_per_pixel`].
    ///
    /// # Errors
    ///
    /// Fails fast with the first partition error. A panicking worker is
    /// reported as [`FilterError::WorkerFailure`].
    pub fn run<F: Filter + ?Sized>(&self, filter: &F, src: &Image) -> Result<Image, FilterError> {
        if self.config.allow_whole_image && filter.capability() == Capability::WholeImage {
            debug!("{}: using whole-image algorithm", filter.name());
            return filter.apply(src);
        }
        self.run_per_pixel(filter, src)
    }

    fn run_per_pixel<F: Filter + ?Sized>(
        &self,
        filter: &F,
        src: &Image,
    ) -> Result<Image, FilterError> {
        let height = src.height();
        let stride = src.row_stride();
        let mut data = vec![0u8; src.as_slice().len()];

        match &self.pool {
            None => {
                debug!("{}: per-pixel on the calling thread", filter.name());
                run_partition(filter, src, 0, &mut data)?;
            }
            Some(pool) => {
                let workers = pool.current_num_threads().min(height);
                let rows_per_partition = height.div_ceil(workers);
                debug!(
                    "{}: per-pixel on {workers} workers, {rows_per_partition} rows each",
                    filter.name()
                );
                pool.install(|| {
                    data.par_chunks_mut(rows_per_partition * stride)
                        .enumerate()
                        .try_for_each(|(i, rows)| {
                            run_partition(filter, src, i * rows_per_partition, rows)
                        })
                })?;
            }
        }

        Ok(Image::new(src.size(), data)?)
    }
}

/// Transform one partition of rows, turning a panic into [`FilterError::WorkerFailure`].
fn run_partition<F: Filter + ?Sized>(
    filter: &F,
    src: &Image,
    first_row: usize,
    rows: &mut [u8],
) -> Result<(), FilterError> {
    let end = first_row + rows.len() / src.row_stride();
    trace!("partition rows {first_row}..{end}");

    panic::catch_unwind(AssertUnwindSafe(|| {
        transform_rows(filter, src, first_row, rows)
    }))
    .unwrap_or_else(|payload| {
        let reason = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        Err(FilterError::WorkerFailure {
            start: first_row,
            end,
            reason,
        })
    })
}

/// Apply `filter` to `src` with `threads` workers.
///
/// Convenience wrapper that builds a [`ParallelRunner`] for a single call.
///
/// # Arguments
///
/// * `filter` - The filter to apply.
/// * `src` - The input image.
/// * `threads` - The number of workers; `<= 1` runs on the calling thread.
/// * `allow_whole_image` - Whether to use the filter's own whole-image algorithm.
pub fn run<F: Filter + ?Sized>(
    filter: &F,
    src: &Image,
    threads: usize,
    allow_whole_image: bool,
) -> Result<Image, FilterError> {
    let config = ExecutionConfig {
        threads,
        allow_whole_image,
    };
    ParallelRunner::new(config)?.run(filter, src)
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use pixelpipe_image::Color;

    use super::*;
    use crate::{
        color::Invert,
        core::apply_per_pixel,
        enhance::AutoContrast,
        spatial::{EdgeDetection, GaussianBlur},
    };

    struct ConstantRed;

    impl Filter for ConstantRed {
        fn name(&self) -> Cow<'_, str> {
            "constantred".into()
        }

        fn transform_color(&self, _color: Color) -> Option<Color> {
            Some(Color::RED)
        }
    }

    /// Whole-image filter whose pixel transform must never be used.
    struct BlackApplyOnly;

    impl Filter for BlackApplyOnly {
        fn name(&self) -> Cow<'_, str> {
            "blackapplyonly".into()
        }

        fn capability(&self) -> Capability {
            Capability::WholeImage
        }

        fn transform_color(&self, _color: Color) -> Option<Color> {
            Some(Color::WHITE)
        }

        fn apply(&self, src: &Image) -> Result<Image, FilterError> {
            Ok(Image::from_size_val(src.size(), Color::BLACK)?)
        }
    }

    /// Panics on one row.
    struct PanicOnRow(usize);

    impl Filter for PanicOnRow {
        fn name(&self) -> Cow<'_, str> {
            "panics".into()
        }

        fn transform_at(&self, src: &Image, x: usize, y: usize) -> Option<Color> {
            if y == self.0 {
                panic!("boom at row {y}");
            }
            Some(src.get_unchecked(x, y))
        }
    }

    fn gradient(width: usize, height: usize) -> Result<Image, FilterError> {
        let pixels: Vec<Color> = (0..width * height)
            .map(|i| Color::new((i * 7 % 256) as u8, (i * 13 % 256) as u8, (i % 256) as u8))
            .collect();
        Ok(Image::from_pixels([width, height].into(), &pixels)?)
    }

    #[test]
    fn run_serial_and_fixed() -> Result<(), FilterError> {
        let image = Image::from_size_val([3, 3].into(), Color::BLACK)?;
        for threads in [0, 1, 2, 3, 4] {
            let out = run(&ConstantRed, &image, threads, true)?;
            assert!(out.pixels().all(|p| p == Color::RED), "threads = {threads}");
        }
        Ok(())
    }

    #[test]
    fn run_matches_serial_apply() -> Result<(), FilterError> {
        let image = gradient(13, 11)?;
        let blur = GaussianBlur::new();
        let expected = blur.apply(&image)?;

        for threads in [1, 2, 3, 8, 32] {
            assert_eq!(run(&blur, &image, threads, true)?, expected);
            assert_eq!(run(&Invert, &image, threads, true)?, Invert.apply(&image)?);
        }
        Ok(())
    }

    #[test]
    fn run_delegates_to_whole_image() -> Result<(), FilterError> {
        let image = Image::from_size_val([2, 2].into(), Color::RED)?;

        let out = run(&BlackApplyOnly, &image, 4, true)?;
        assert!(out.pixels().all(|p| p == Color::BLACK));

        // forcing the per-pixel path uses the color transform
        let out = run(&BlackApplyOnly, &image, 4, false)?;
        assert!(out.pixels().all(|p| p == Color::WHITE));
        Ok(())
    }

    #[test]
    fn run_without_primitives_fails() -> Result<(), FilterError> {
        let image = gradient(4, 4)?;
        assert_eq!(
            run(&EdgeDetection, &image, 2, false),
            Err(FilterError::InvalidFilterState("edgedetection".to_string()))
        );
        Ok(())
    }

    #[test]
    fn run_forced_per_pixel_autocontrast_is_identity() -> Result<(), FilterError> {
        let image = gradient(5, 5)?;
        let out = run(&AutoContrast::new(), &image, 3, false)?;
        assert_eq!(out, apply_per_pixel(&AutoContrast::new(), &image)?);
        assert_eq!(out, image);
        Ok(())
    }

    #[test]
    fn run_reports_worker_panic() -> Result<(), FilterError> {
        let image = gradient(4, 8)?;
        let res = run(&PanicOnRow(5), &image, 4, true);

        match res {
            Err(FilterError::WorkerFailure { start, end, reason }) => {
                assert_eq!((start, end), (4, 6));
                assert!(reason.contains("boom at row 5"));
            }
            other => panic!("expected worker failure, got {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn runner_is_reusable() -> Result<(), FilterError> {
        let runner = ParallelRunner::new(ExecutionConfig::default().with_threads(3))?;
        assert_eq!(runner.config().threads, 3);

        let image = gradient(6, 7)?;
        let once = runner.run(&Invert, &image)?;
        let twice = runner.run(&Invert, &once)?;
        assert_eq!(twice, image);
        Ok(())
    }

    #[test]
    fn config_from_options() {
        let options = FilterOptions::from_pairs([("threads", "3")]);
        assert_eq!(ExecutionConfig::from_options(&options).threads, 3);

        let fallback = ExecutionConfig::default().threads;
        for raw in ["0", "-2", "many"] {
            let options = FilterOptions::from_pairs([("THREADS", raw)]);
            assert_eq!(ExecutionConfig::from_options(&options).threads, fallback);
        }

        let config = ExecutionConfig::from_options(&FilterOptions::new());
        assert!(config.allow_whole_image);
        assert!(config.threads >= 1);
    }
}
