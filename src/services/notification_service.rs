use async_trait::async_trait;
use discord_rest::{CreateMessage, DiscordClient, Embed, EmbedField, EmbedFooter, EmbedMedia};
use url::Url;

use crate::config::Config;
use crate::domain::notification::truncate_chars;
use crate::domain::NotificationPayload;
use crate::errors::AlertResult;

// Discord embed limits, in characters
const TITLE_LIMIT: usize = 256;
const DESCRIPTION_LIMIT: usize = 4096;
const FIELD_VALUE_LIMIT: usize = 1024;

const ALERT_COLOR: u32 = 0xff0000;
const WARNING_ICON_URL: &str = "https://cdn-icons-png.flaticon.com/512/179/179386.png";
const STATIC_MAP_URL: &str = "https://www.mapquestapi.com/staticmap/v5/map";
const FOOTER_TEXT: &str = "Emergency disaster alert service (Thailand)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Recipient {
    /// A guild channel bound to a category
    Channel(u64),
    /// A subscriber, reached by direct message
    User(u64),
}

impl std::fmt::Display for Recipient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Recipient::Channel(id) => write!(f, "channel {}", id),
            Recipient::User(id) => write!(f, "user {}", id),
        }
    }
}

#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send(&self, recipient: Recipient, payload: &NotificationPayload) -> AlertResult<()>;
}

pub struct DiscordMessenger {
    client: DiscordClient,
    mapquest_key: Option<String>,
}

impl DiscordMessenger {
    pub fn new(config: &Config) -> AlertResult<Self> {
        let token = config.require_token()?;
        let client = DiscordClient::new(&config.discord_api_url, token)?;

        Ok(Self {
            client,
            mapquest_key: config.mapquest_key.clone(),
        })
    }

    /// Build the rich message for a payload, clamped to Discord's limits
    pub fn build_embed(&self, payload: &NotificationPayload) -> Embed {
        let mut fields = vec![EmbedField {
            name: "📍 Affected area".to_string(),
            value: code_block(&payload.area),
            inline: false,
        }];

        let mut image = None;
        let mut thumbnail = None;

        match (&payload.coordinates, &payload.map_link) {
            (Some(coords), Some(map_link)) => {
                fields.push(EmbedField {
                    name: "🗺️ Navigation".to_string(),
                    value: truncate_chars(
                        &format!("[Open in Google Maps]({})", map_link),
                        FIELD_VALUE_LIMIT,
                    ),
                    inline: false,
                });

                image = self.mapquest_key.as_deref().and_then(|key| {
                    static_map_url(coords.latitude, coords.longitude, key)
                        .map(|url| EmbedMedia { url })
                });
            }
            _ => {
                thumbnail = Some(EmbedMedia {
                    url: WARNING_ICON_URL.to_string(),
                });
            }
        }

        if let Some(link) = &payload.source_link {
            fields.push(EmbedField {
                name: "🔗 Source".to_string(),
                value: truncate_chars(&format!("[Read the full report]({})", link), FIELD_VALUE_LIMIT),
                inline: false,
            });
        }

        Embed {
            title: Some(truncate_chars(&format!("🚨 {}", payload.headline), TITLE_LIMIT)),
            description: Some(truncate_chars(&format!("**{}**", payload.body), DESCRIPTION_LIMIT)),
            color: Some(ALERT_COLOR),
            timestamp: Some(payload.timestamp.to_rfc3339()),
            fields,
            image,
            thumbnail,
            footer: Some(EmbedFooter {
                text: FOOTER_TEXT.to_string(),
            }),
            ..Default::default()
        }
    }
}

#[async_trait]
impl Messenger for DiscordMessenger {
    async fn send(&self, recipient: Recipient, payload: &NotificationPayload) -> AlertResult<()> {
        let message = CreateMessage::with_embed(self.build_embed(payload));

        match recipient {
            Recipient::Channel(channel_id) => {
                self.client.send_message(channel_id, &message).await?;
            }
            Recipient::User(user_id) => {
                self.client.send_direct_message(user_id, &message).await?;
            }
        }

        Ok(())
    }
}

fn code_block(text: &str) -> String {
    // A zero-width space keeps embedded fences from closing the block
    let escaped = text.replace("```", "`\u{200b}`\u{200b}`");
    // 8 characters of fence and newlines
    let body = truncate_chars(&escaped, FIELD_VALUE_LIMIT - 8);
    format!("```\n{}\n```", body)
}

fn static_map_url(latitude: f64, longitude: f64, key: &str) -> Option<String> {
    let locations = format!("{},{}", latitude, longitude);
    Url::parse_with_params(
        STATIC_MAP_URL,
        &[
            ("locations", locations.as_str()),
            ("size", "600,400@2x"),
            ("defaultMarker", "marker-ff0000"),
            ("key", key),
        ],
    )
    .ok()
    .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Category, FeedEntry, Source};
    use chrono::{TimeZone, Utc};

    fn messenger(mapquest_key: Option<&str>) -> DiscordMessenger {
        DiscordMessenger {
            client: DiscordClient::new("http://127.0.0.1:9", "token").unwrap(),
            mapquest_key: mapquest_key.map(str::to_string),
        }
    }

    fn payload(title: &str, link: Option<&str>) -> NotificationPayload {
        let source = Source::new(
            "TMD earthquake watch",
            "https://tmd.go.th/rss/earthquake.php",
            Category::Regional,
        )
        .unwrap();
        let entry = FeedEntry::new(title).with_link(link.map(str::to_string));
        NotificationPayload::render(
            &entry,
            &source,
            Utc.with_ymd_and_hms(2025, 3, 28, 6, 20, 0).unwrap(),
        )
    }

    #[test]
    fn test_embed_with_coordinates_and_map_key() {
        let embed = messenger(Some("k3y"))
            .build_embed(&payload("จังหวัดเชียงราย 19.9 99.8", Some("https://tmd.go.th/q/1")));

        assert_eq!(embed.title.as_deref(), Some("🚨 TMD earthquake watch"));
        assert_eq!(embed.description.as_deref(), Some("**จังหวัดเชียงราย 19.9 99.8**"));
        assert_eq!(embed.color, Some(0xff0000));
        assert_eq!(embed.fields.len(), 3);
        assert_eq!(embed.fields[0].value, "```\nจังหวัดเชียงราย 19.9 99.8 \n```");
        assert!(embed.fields[1].value.contains("google.com/maps"));
        assert!(embed.fields[2].value.contains("https://tmd.go.th/q/1"));

        let image = embed.image.unwrap();
        assert!(image.url.starts_with("https://www.mapquestapi.com/staticmap/v5/map?"));
        assert!(image.url.contains("key=k3y"));
        assert!(embed.thumbnail.is_none());
    }

    #[test]
    fn test_embed_without_coordinates_uses_thumbnail() {
        let embed = messenger(Some("k3y")).build_embed(&payload("Heavy rain warning", None));

        assert_eq!(embed.fields.len(), 1);
        assert!(embed.image.is_none());
        assert_eq!(embed.thumbnail.unwrap().url, WARNING_ICON_URL);
    }

    #[test]
    fn test_no_static_map_without_key() {
        let embed = messenger(None).build_embed(&payload("อ.แม่สาย 20.4 99.9", None));

        assert!(embed.image.is_none());
        assert!(embed.thumbnail.is_none());
        assert_eq!(embed.fields.len(), 2);
    }

    #[test]
    fn test_backtick_fence_in_area_stays_inside_block() {
        let mut alert = payload("x", None);
        alert.area = "จ.น่าน ```ignore``` flood".to_string();

        let embed = messenger(None).build_embed(&alert);
        let value = &embed.fields[0].value;

        assert!(value.starts_with("```\n"));
        assert!(value.ends_with("\n```"));
        assert_eq!(value.matches("```").count(), 2);
        assert!(value.contains("`\u{200b}`\u{200b}`ignore"));
    }

    #[test]
    fn test_long_title_clamped() {
        let mut long = payload("x", None);
        long.headline = "h".repeat(400);
        long.body = "b".repeat(5000);

        let embed = messenger(None).build_embed(&long);

        assert_eq!(embed.title.unwrap().chars().count(), TITLE_LIMIT);
        assert_eq!(embed.description.unwrap().chars().count(), DESCRIPTION_LIMIT);
    }
}
