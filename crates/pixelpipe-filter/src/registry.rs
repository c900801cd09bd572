use std::collections::BTreeMap;
use std::sync::Arc;

use log::debug;

use crate::{
    color::{Grayscale, Invert},
    core::SharedFilter,
    enhance::{AutoBrightness, AutoContrast},
    error::FilterError,
    pipeline::FilterPipeline,
    resize::Scale,
    spatial::{EdgeDetection, GaussianBlur},
};

/// Case-insensitive `key=value` options passed to filter constructors.
///
/// Keys are stored lowercase; values keep their case.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOptions(BTreeMap<String, String>);

impl FilterOptions {
    /// Create an empty set of options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build options from `(key, value)` pairs.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut options = Self::new();
        for (k, v) in pairs {
            options.insert(k.as_ref(), v);
        }
        options
    }

    /// Insert an option, replacing any previous value for the same key.
    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        self.0.insert(key.trim().to_lowercase(), value.into());
    }

    /// Get the value of an option.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(&key.to_lowercase()).map(String::as_str)
    }

    /// Remove an option and return its value.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(&key.to_lowercase())
    }

    /// Whether there are no options.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the options sorted by key.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Add every option of `other` that is not already set.
    pub fn merge_missing(&mut self, other: &FilterOptions) {
        for (k, v) in other.iter() {
            self.0.entry(k.to_string()).or_insert_with(|| v.to_string());
        }
    }
}

/// Builds a filter from its options.
pub type FilterConstructor =
    Box<dyn Fn(&FilterOptions) -> Result<SharedFilter, FilterError> + Send + Sync>;

struct FilterEntry {
    constructor: FilterConstructor,
    usage: String,
}

/// Resolves filter names and option strings into filter instances.
///
/// The registry is a plain value: build it once at startup and pass it by
/// reference. [`FilterRegistry::default`] registers the built-in filters.
///
/// # Example
///
/// ```
/// use pixelpipe_filter::{Filter, FilterRegistry};
///
/// let registry = FilterRegistry::default();
/// let filter = registry.parse("Grayscale | scale(factor=0.5) | invert", &Default::default()).unwrap();
/// assert_eq!(filter.name(), "grayscale|scale|invert");
/// ```
pub struct FilterRegistry {
    entries: BTreeMap<String, FilterEntry>,
}

impl Default for FilterRegistry {
    fn default() -> Self {
        let mut registry = Self::new();
        registry.register("autocontrast", "Auto contrast adjustment", |_| {
            Ok(Arc::new(AutoContrast::new()))
        });
        registry.register("autobrightness", "Auto brightness adjustment", |_| {
            Ok(Arc::new(AutoBrightness))
        });
        registry.register("invert", "Inverts image colors", |_| Ok(Arc::new(Invert)));
        registry.register("grayscale", "Converts to grayscale", |_| {
            Ok(Arc::new(Grayscale))
        });
        registry.register("edgedetection", "Detects edges", |_| {
            Ok(Arc::new(EdgeDetection))
        });
        registry.register("gaussianblur", "Applies Gaussian blur", |_| {
            Ok(Arc::new(GaussianBlur::new()))
        });
        registry.register(
            "scale",
            "Scales the image. Usage: scale(factor=0.5)",
            |options| Ok(Arc::new(Scale::from_options(options)?)),
        );
        registry
    }
}

impl FilterRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Register a filter constructor under a case-insensitive name.
    ///
    /// Registering an existing name replaces the previous entry.
    pub fn register<F>(&mut self, name: &str, usage: &str, constructor: F)
    where
        F: Fn(&FilterOptions) -> Result<SharedFilter, FilterError> + Send + Sync + 'static,
    {
        self.entries.insert(
            name.to_lowercase(),
            FilterEntry {
                constructor: Box::new(constructor),
                usage: usage.to_string(),
            },
        );
    }

    /// Whether a filter is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&name.to_lowercase())
    }

    /// The registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    /// `(name, usage)` pairs sorted by name.
    pub fn usage(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, entry)| (name.as_str(), entry.usage.as_str()))
    }

    /// Construct the filter registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::UnknownFilter`] listing the valid names when
    /// `name` is not registered, or the constructor's own error.
    pub fn resolve(&self, name: &str, options: &FilterOptions) -> Result<SharedFilter, FilterError> {
        let key = name.trim().to_lowercase();
        let entry = self
            .entries
            .get(&key)
            .ok_or_else(|| FilterError::UnknownFilter {
                name: name.trim().to_string(),
                available: self.names().iter().map(|s| s.to_string()).collect(),
            })?;
        debug!("resolving filter {key} with {options:?}");
        (entry.constructor)(options)
    }

    /// Parse and construct a single filter spec such as `scale(factor=0.5)`.
    pub fn parse_spec(&self, spec: &str) -> Result<SharedFilter, FilterError> {
        let (name, options) = split_spec(spec);
        self.resolve(&name, &options)
    }

    /// Parse a `|` separated list of filter specs into a pipeline.
    ///
    /// `|` inside parentheses does not split.
    pub fn parse_pipeline(&self, spec: &str) -> Result<FilterPipeline, FilterError> {
        let filters = split_pipeline(spec)
            .into_iter()
            .map(|part| self.parse_spec(part))
            .collect::<Result<Vec<_>, _>>()?;
        FilterPipeline::new(filters)
    }

    /// Parse a filter or pipeline spec.
    ///
    /// A spec without a top-level `|` yields a single filter; `defaults` fill
    /// any option the spec does not set inline. Pipelines only use inline
    /// options.
    pub fn parse(&self, spec: &str, defaults: &FilterOptions) -> Result<SharedFilter, FilterError> {
        if split_pipeline(spec).len() > 1 {
            return Ok(Arc::new(self.parse_pipeline(spec)?));
        }
        let (name, mut options) = split_spec(spec);
        options.merge_missing(defaults);
        self.resolve(&name, &options)
    }
}

/// Split a pipeline string on `|` outside parentheses.
fn split_pipeline(spec: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, c) in spec.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            '|' if depth == 0 => {
                parts.push(&spec[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&spec[start..]);
    parts
}

/// Split `name(key=value,...)` into a lowercase name and its options.
///
/// Malformed pairs without `=` are skipped.
fn split_spec(spec: &str) -> (String, FilterOptions) {
    let spec = spec.trim();
    let mut options = FilterOptions::new();

    let (Some(open), Some(close)) = (spec.find('('), spec.rfind(')')) else {
        return (spec.to_lowercase(), options);
    };
    if close <= open {
        return (spec.to_lowercase(), options);
    }

    for pair in spec[open + 1..close].split(',') {
        if let Some((k, v)) = pair.split_once('=') {
            options.insert(k, v.trim());
        }
    }
    (spec[..open].trim().to_lowercase(), options)
}

#[cfg(test)]
mod tests {
    use pixelpipe_image::{Color, Image};

    use super::*;
    use crate::core::Filter;

    #[test]
    fn default_registry_names() {
        let registry = FilterRegistry::default();
        assert_eq!(
            registry.names(),
            vec![
                "autobrightness",
                "autocontrast",
                "edgedetection",
                "gaussianblur",
                "grayscale",
                "invert",
                "scale"
            ]
        );
        assert!(registry.contains("GrayScale"));
        assert!(registry
            .usage()
            .any(|(name, usage)| name == "scale" && usage.contains("factor")));
    }

    #[test]
    fn resolve_is_case_insensitive() -> Result<(), FilterError> {
        let registry = FilterRegistry::default();
        let filter = registry.resolve("INVERT", &FilterOptions::new())?;
        assert_eq!(filter.name(), "invert");
        Ok(())
    }

    #[test]
    fn resolve_unknown_lists_names() {
        let registry = FilterRegistry::default();
        match registry.resolve("sepia", &FilterOptions::new()) {
            Err(err @ FilterError::UnknownFilter { .. }) => {
                let msg = err.to_string();
                assert!(msg.contains("sepia"));
                assert!(msg.contains("grayscale, invert"));
            }
            Err(err) => panic!("expected unknown filter, got {err:?}"),
            Ok(_) => panic!("expected unknown filter"),
        }
    }

    #[test]
    fn parse_spec_with_options() -> Result<(), FilterError> {
        let (name, options) = split_spec(" Scale( Factor = 0.5 , junk ) ");
        assert_eq!(name, "scale");
        assert_eq!(options.get("factor"), Some("0.5"));
        assert_eq!(options.iter().count(), 1);

        let registry = FilterRegistry::default();
        let image = Image::from_size_val([4, 2].into(), Color::RED)?;
        let out = registry.parse_spec("scale(factor=0.5)")?.apply(&image)?;
        assert_eq!((out.width(), out.height()), (2, 1));
        Ok(())
    }

    #[test]
    fn parse_spec_rejects_bad_factor() {
        let registry = FilterRegistry::default();
        assert!(matches!(
            registry.parse_spec("scale(factor=abc)"),
            Err(FilterError::InvalidArgument(_))
        ));
    }

    #[test]
    fn split_pipeline_respects_parentheses() {
        assert_eq!(
            split_pipeline("a|b(x=1|2)|c"),
            vec!["a", "b(x=1|2)", "c"]
        );
        assert_eq!(split_pipeline("single"), vec!["single"]);
    }

    #[test]
    fn parse_pipeline_scenario() -> Result<(), FilterError> {
        let registry = FilterRegistry::default();
        let pipeline = registry.parse_pipeline("grayscale|invert")?;
        assert_eq!(pipeline.name(), "grayscale|invert");

        let image = Image::from_size_val([1, 1].into(), Color::RED)?;
        assert_eq!(pipeline.apply(&image)?.get_pixel(0, 0)?, Color::gray(179));
        Ok(())
    }

    #[test]
    fn parse_merges_default_options() -> Result<(), FilterError> {
        let registry = FilterRegistry::default();
        let defaults = FilterOptions::from_pairs([("factor", "2"), ("threads", "4")]);
        let image = Image::from_size_val([2, 2].into(), Color::RED)?;

        let out = registry.parse("scale", &defaults)?.apply(&image)?;
        assert_eq!(out.width(), 4);

        // inline options win over defaults
        let out = registry.parse("scale(factor=0.5)", &defaults)?.apply(&image)?;
        assert_eq!(out.width(), 1);
        Ok(())
    }

    #[test]
    fn parse_unknown_in_pipeline() {
        let registry = FilterRegistry::default();
        assert!(matches!(
            registry.parse("grayscale||invert", &FilterOptions::new()),
            Err(FilterError::UnknownFilter { .. })
        ));
    }

    #[test]
    fn register_custom_filter() -> Result<(), FilterError> {
        let mut registry = FilterRegistry::new();
        assert!(registry.names().is_empty());

        registry.register("Negative", "Alias for invert", |_| Ok(Arc::new(Invert)));
        let filter = registry.resolve("negative", &FilterOptions::new())?;
        assert_eq!(filter.name(), "invert");
        Ok(())
    }
}
