use crate::domain::{Category, Source};
use crate::errors::{AlertError, AlertResult};

/// Built-in feed table: (label, endpoint, category)
const DEFAULT_SOURCES: &[(&str, &str, Category)] = &[
    (
        "TMD weather warnings",
        "https://tmd.go.th/rss/warning.php",
        Category::Regional,
    ),
    (
        "TMD earthquake watch",
        "https://tmd.go.th/rss/earthquake.php",
        Category::Regional,
    ),
    (
        "DDPM disaster news",
        "https://www.disaster.go.th/th/rss/news_disaster.xml",
        Category::Regional,
    ),
    (
        "USGS earthquakes M4.5+",
        "https://earthquake.usgs.gov/earthquakes/feed/v1.0/summary/4.5_day.atom",
        Category::Global,
    ),
];

pub struct SourceRegistry {
    sources: Vec<Source>,
}

impl SourceRegistry {
    pub fn new() -> AlertResult<Self> {
        let mut registry = Self::empty();

        for (name, endpoint, category) in DEFAULT_SOURCES {
            registry.register(Source::new(name, endpoint, *category)?)?;
        }

        Ok(registry)
    }

    pub fn empty() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    /// Add a source; labels must be unique
    pub fn register(&mut self, source: Source) -> AlertResult<()> {
        if self.by_name(&source.name).is_some() {
            return Err(AlertError::InvalidInput(format!(
                "Duplicate source name: {}",
                source.name
            )));
        }

        self.sources.push(source);
        Ok(())
    }

    pub fn by_name(&self, name: &str) -> Option<&Source> {
        self.sources.iter().find(|s| s.name == name)
    }

    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    pub fn into_sources(self) -> Vec<Source> {
        self.sources
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
