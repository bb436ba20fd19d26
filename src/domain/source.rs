use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::{AlertError, AlertResult};

/// Interest bucket a source feeds into; subscribers and channel bindings
/// are keyed by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Global,
    Regional,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::Global, Category::Regional];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Global => "global",
            Category::Regional => "regional",
        }
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "global" | "world" => Ok(Category::Global),
            "regional" | "thai" | "th" | "local" => Ok(Category::Regional),
            _ => Err(format!("Unknown category: {}", s)),
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub name: String,
    pub endpoint: Url,
    pub category: Category,
}

impl Source {
    pub fn new(name: &str, endpoint: &str, category: Category) -> AlertResult<Self> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| AlertError::InvalidUrl(format!("{}: {}", endpoint, e)))?;

        match endpoint.scheme() {
            "http" | "https" => {}
            scheme => {
                return Err(AlertError::InvalidUrl(format!(
                    "unsupported scheme '{}' for {}",
                    scheme, name
                )))
            }
        }

        Ok(Self {
            name: name.to_string(),
            endpoint,
            category,
        })
    }
}
