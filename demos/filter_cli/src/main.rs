use argh::FromArgs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use pixelpipe::{
    filter::{
        parallel::THREADS_OPTION, pipeline::FilterPipeline, ExecutionConfig, Filter,
        FilterOptions, FilterRegistry, ParallelRunner,
    },
    image::Image,
};

#[derive(FromArgs)]
/// Apply a filter or a `|` separated pipeline of filters to an image
struct Args {
    /// the filter spec, e.g. `grayscale|scale(factor=0.5)`, or `list`
    #[argh(positional)]
    filter: String,

    /// path to the input image
    #[argh(positional)]
    input: Option<PathBuf>,

    /// path to the output image, defaults to `<stem>_<filter><ext>`
    #[argh(option, short = 'o')]
    output: Option<PathBuf>,

    /// filter option as `key=value`; `threads` sets the worker count
    #[argh(option, short = 'p')]
    param: Vec<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    let registry = FilterRegistry::default();

    if args.filter.eq_ignore_ascii_case("list") {
        println!("Available filters:");
        for (name, usage) in registry.usage() {
            println!("  {name:<16} {usage}");
        }
        return Ok(());
    }

    let Some(input) = args.input else {
        return Err("missing input image path".into());
    };

    let mut options = FilterOptions::new();
    for param in &args.param {
        match param.split_once('=') {
            Some((key, value)) => options.insert(key, value.trim()),
            None => log::warn!("ignoring malformed option: {param}"),
        }
    }

    let config = ExecutionConfig::from_options(&options);
    options.remove(THREADS_OPTION);

    let pipeline = FilterPipeline::new(vec![registry.parse(&args.filter, &options)?])?;
    let runner = ParallelRunner::new(config)?;

    let img = image::open(&input)?.to_rgb8();
    let (width, height) = img.dimensions();
    let src = Image::new([width as usize, height as usize].into(), img.into_raw())?;
    log::info!("loaded {} ({})", input.display(), src.size());

    let start = Instant::now();
    let out = pipeline.apply_with(&src, &runner)?;
    log::info!(
        "{} took {:?} with {} threads",
        pipeline.name(),
        start.elapsed(),
        config.threads
    );

    let output = args
        .output
        .unwrap_or_else(|| default_output_path(&input, &pipeline.name()));

    let (width, height) = (out.width() as u32, out.height() as u32);
    let img = image::RgbImage::from_raw(width, height, out.into_vec())
        .ok_or("output buffer does not match its size")?;
    img.save(&output)?;

    println!("Saved {}", output.display());

    Ok(())
}

/// `<dir>/<stem>_<filter><ext>` next to the input image.
fn default_output_path(input: &Path, filter_name: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let ext = input
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "jpg".to_string());
    let filter_name = filter_name.replace('|', "-");
    input.with_file_name(format!("{stem}_{filter_name}.{ext}"))
}
