use std::time::Duration;

use async_trait::async_trait;
use feed_rs::parser;
use reqwest::Client;
use scraper::Html;

use crate::domain::{FeedEntry, Source};
use crate::errors::{AlertError, AlertResult};
use crate::sources::traits::FeedFetcher;

const USER_AGENT: &str = concat!("alertbot/", env!("CARGO_PKG_VERSION"));

/// Fetches RSS 0.9/1.0/2.0, Atom and JSON Feed sources over HTTP(S).
pub struct HttpFeedFetcher {
    client: Client,
}

impl HttpFeedFetcher {
    pub fn new(timeout: Duration) -> AlertResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self { client })
    }

    pub fn parse_bytes(bytes: &[u8]) -> AlertResult<Vec<FeedEntry>> {
        let parsed = parser::parse(bytes).map_err(|e| AlertError::FeedParse(e.to_string()))?;

        Ok(parsed.entries.into_iter().map(Self::entry_from).collect())
    }

    fn entry_from(entry: feed_rs::model::Entry) -> FeedEntry {
        let link = entry.links.first().map(|l| l.href.clone());

        // The title is the dedup key, so an untitled entry falls back to
        // something unique to it.
        let title = entry
            .title
            .map(|t| strip_html(&t.content))
            .filter(|t| !t.is_empty())
            .or_else(|| link.clone())
            .or_else(|| Some(entry.id.trim().to_string()).filter(|id| !id.is_empty()))
            .unwrap_or_else(|| "Untitled".to_string());

        // RSS <description> and Atom <summary> land in `summary`; some feeds
        // only carry a full <content> body.
        let description = entry
            .summary
            .map(|s| s.content)
            .or_else(|| entry.content.and_then(|c| c.body))
            .map(|d| strip_html(&d))
            .unwrap_or_default();

        FeedEntry::new(title)
            .with_description(description)
            .with_link(link)
    }
}

#[async_trait]
impl FeedFetcher for HttpFeedFetcher {
    async fn fetch(&self, source: &Source) -> AlertResult<Vec<FeedEntry>> {
        let response = self.client.get(source.endpoint.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AlertError::HttpStatus(status.as_u16()));
        }

        let bytes = response.bytes().await?;
        Self::parse_bytes(&bytes)
    }
}

/// Flatten an HTML fragment to plain text with collapsed whitespace
pub fn strip_html(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let text: Vec<&str> = fragment.root_element().text().collect();

    text.join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Category;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    // Sample RSS feed (based on the TMD earthquake feed format)
    const SAMPLE_RSS: &[u8] = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Earthquake Report</title>
    <link>https://tmd.go.th/</link>
    <description>Thai Meteorological Department earthquake reports</description>
    <item>
      <title>แผ่นดินไหว ขนาด 3.2 จ.เชียงราย</title>
      <link>https://tmd.go.th/quake/101</link>
      <description><![CDATA[<p>Latitude 19.9 Longitude 99.8</p> <b>depth</b> 5 km]]></description>
      <guid>quake-101</guid>
    </item>
    <item>
      <title>Earthquake Myanmar</title>
      <link>https://tmd.go.th/quake/100</link>
      <guid>quake-100</guid>
    </item>
  </channel>
</rss>"#
        .as_bytes();

    // Sample Atom feed (USGS summary format)
    const SAMPLE_ATOM: &[u8] = br#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>USGS Magnitude 4.5+ Earthquakes, Past Day</title>
  <id>https://earthquake.usgs.gov/earthquakes/feed/v1.0/summary/4.5_day.atom</id>
  <updated>2025-03-28T06:30:00Z</updated>
  <entry>
    <id>urn:earthquake-usgs-gov:us:7000pn9s</id>
    <title>M 7.7 - 2025 Mandalay, Burma (Myanmar) Earthquake</title>
    <updated>2025-03-28T06:25:00Z</updated>
    <link rel="alternate" type="text/html" href="https://earthquake.usgs.gov/earthquakes/eventpage/us7000pn9s"/>
    <summary type="html"><![CDATA[<dl><dt>Location</dt><dd>22.011&deg;N 95.936&deg;E</dd></dl>]]></summary>
  </entry>
</feed>"#;

    fn test_source(endpoint: &str) -> Source {
        Source::new("Test", endpoint, Category::Regional).unwrap()
    }

    #[test]
    fn test_rss_entries_parsed_in_order() {
        let entries = HttpFeedFetcher::parse_bytes(SAMPLE_RSS).unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].title, "แผ่นดินไหว ขนาด 3.2 จ.เชียงราย");
        assert_eq!(entries[0].description, "Latitude 19.9 Longitude 99.8 depth 5 km");
        assert_eq!(entries[0].link.as_deref(), Some("https://tmd.go.th/quake/101"));

        assert_eq!(entries[1].title, "Earthquake Myanmar");
        assert!(entries[1].description.is_empty());
    }

    #[test]
    fn test_atom_summary_becomes_description() {
        let entries = HttpFeedFetcher::parse_bytes(SAMPLE_ATOM).unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "M 7.7 - 2025 Mandalay, Burma (Myanmar) Earthquake");
        assert!(entries[0].description.contains("22.011"));
        assert!(!entries[0].description.contains("<dd>"));
        assert_eq!(
            entries[0].link.as_deref(),
            Some("https://earthquake.usgs.gov/earthquakes/eventpage/us7000pn9s")
        );
    }

    #[test]
    fn test_untitled_entries_keep_distinct_titles() {
        let feed = br#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>TMD warnings</title>
    <link>https://tmd.go.th</link>
    <description>Warnings</description>
    <item><link>https://tmd.go.th/warning/1</link><description>Storm</description></item>
    <item><link>https://tmd.go.th/warning/2</link><description>Storm</description></item>
    <item><guid isPermaLink="false">tmd-warning-3</guid><description>Flood</description></item>
  </channel>
</rss>"#;

        let entries = HttpFeedFetcher::parse_bytes(feed).unwrap();

        assert_eq!(entries[0].title, "https://tmd.go.th/warning/1");
        assert_eq!(entries[1].title, "https://tmd.go.th/warning/2");
        assert_eq!(entries[2].title, "tmd-warning-3");
    }

    #[test]
    fn test_garbage_is_a_parse_error() {
        let result = HttpFeedFetcher::parse_bytes(b"<html><body>maintenance</body></html>");
        assert!(matches!(result, Err(AlertError::FeedParse(_))));
    }

    #[test]
    fn test_strip_html_collapses_whitespace() {
        assert_eq!(strip_html("<p>Heavy\n  rain</p><p>in <i>Nan</i></p>"), "Heavy rain in Nan");
        assert_eq!(strip_html("plain text"), "plain text");
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rss/earthquake.php"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(SAMPLE_RSS))
            .mount(&server)
            .await;

        let fetcher = HttpFeedFetcher::new(Duration::from_secs(5)).unwrap();
        let source = test_source(&format!("{}/rss/earthquake.php", server.uri()));

        let entries = fetcher.fetch(&source).await.unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[tokio::test]
    async fn test_fetch_non_success_status() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let fetcher = HttpFeedFetcher::new(Duration::from_secs(5)).unwrap();
        let source = test_source(&format!("{}/rss/warning.php", server.uri()));

        let result = fetcher.fetch(&source).await;
        assert!(matches!(result, Err(AlertError::HttpStatus(503))));
    }

    #[tokio::test]
    async fn test_fetch_timeout_is_an_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(SAMPLE_RSS)
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let fetcher = HttpFeedFetcher::new(Duration::from_millis(200)).unwrap();
        let source = test_source(&format!("{}/slow", server.uri()));

        let result = fetcher.fetch(&source).await;
        assert!(matches!(result, Err(AlertError::Http(_))));
    }
}
