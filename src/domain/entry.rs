use serde::{Deserialize, Serialize};

/// One item of a fetched feed. Identity for deduplication is the title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedEntry {
    pub title: String,
    pub description: String,
    pub link: Option<String>,
}

impl FeedEntry {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            link: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_link(mut self, link: Option<String>) -> Self {
        self.link = link;
        self
    }

    /// Text handed to the location extractor
    pub fn alert_text(&self) -> String {
        format!("{} {}", self.title, self.description)
    }
}
