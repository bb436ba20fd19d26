use chrono::{DateTime, Utc};
use url::Url;

use super::{extract_location, Coordinates, FeedEntry, Source};

/// Maximum number of characters of the area summary carried in a payload
pub const AREA_MAX_CHARS: usize = 400;

const MAPS_SEARCH_URL: &str = "https://www.google.com/maps/search/";

#[derive(Debug, Clone, PartialEq)]
pub struct NotificationPayload {
    pub headline: String,
    pub body: String,
    pub area: String,
    pub coordinates: Option<Coordinates>,
    pub map_link: Option<String>,
    pub source_link: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl NotificationPayload {
    pub fn render(entry: &FeedEntry, source: &Source, timestamp: DateTime<Utc>) -> Self {
        let location = extract_location(&entry.alert_text());
        let map_link = location.coordinates.map(|c| google_maps_link(&c));

        Self {
            headline: source.name.clone(),
            body: entry.title.clone(),
            area: truncate_chars(&location.area, AREA_MAX_CHARS),
            coordinates: location.coordinates,
            map_link,
            source_link: entry.link.clone().filter(|l| !l.trim().is_empty()),
            timestamp,
        }
    }

    /// Single-line rendering used by dry runs and logs
    pub fn format(&self) -> String {
        let mut message = format!("[{}] {}", self.headline, self.body);

        if let Some(coords) = &self.coordinates {
            message.push_str(&format!(" @ {},{}", coords.latitude, coords.longitude));
        }

        if let Some(link) = &self.source_link {
            message.push(' ');
            message.push_str(link);
        }

        message
    }
}

fn google_maps_link(coords: &Coordinates) -> String {
    let query = format!("{},{}", coords.latitude, coords.longitude);
    match Url::parse_with_params(MAPS_SEARCH_URL, &[("api", "1"), ("query", query.as_str())]) {
        Ok(url) => url.into(),
        Err(_) => format!("{}?api=1&query={}", MAPS_SEARCH_URL, query),
    }
}

/// Truncate string to at most `max_chars` characters, respecting char boundaries
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}
