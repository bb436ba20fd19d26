//! Minimal Discord REST bindings for Rust
//! Provides functions to open DM channels and send embed messages to channels or users

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, USER_AGENT};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "https://discord.com/api/v10";

#[derive(Error, Debug)]
pub enum DiscordError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("Invalid header value")]
    InvalidHeader,
    #[error("Missing permissions or recipient does not accept messages")]
    Forbidden,
    #[error("Unknown user or channel")]
    NotFound,
    #[error("Rate limited by Discord")]
    RateLimited,
    #[error("Payload too large")]
    PayloadTooLarge,
    #[error("Discord returned status {0}")]
    Status(u16),
}

fn deserialize_snowflake<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};
    use std::fmt;

    struct SnowflakeVisitor;

    impl<'de> Visitor<'de> for SnowflakeVisitor {
        type Value = u64;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a snowflake as string or integer")
        }

        fn visit_u64<E>(self, v: u64) -> Result<u64, E> {
            Ok(v)
        }

        fn visit_i64<E>(self, v: i64) -> Result<u64, E>
        where
            E: de::Error,
        {
            u64::try_from(v).map_err(de::Error::custom)
        }

        fn visit_str<E>(self, v: &str) -> Result<u64, E>
        where
            E: de::Error,
        {
            v.parse().map_err(de::Error::custom)
        }
    }

    deserializer.deserialize_any(SnowflakeVisitor)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DmChannel {
    #[serde(deserialize_with = "deserialize_snowflake")]
    pub id: u64,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    #[serde(deserialize_with = "deserialize_snowflake")]
    pub id: u64,
    #[serde(deserialize_with = "deserialize_snowflake")]
    pub channel_id: u64,
    #[serde(default)]
    pub content: String,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EmbedMedia {
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EmbedFooter {
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Embed {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
    /// ISO8601 timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<EmbedMedia>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<EmbedMedia>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<EmbedFooter>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,
}

impl CreateMessage {
    pub fn with_embed(embed: Embed) -> Self {
        Self {
            content: None,
            embeds: vec![embed],
        }
    }
}

#[derive(Debug, Serialize)]
struct CreateDmPayload {
    recipient_id: String,
}

pub struct DiscordClient {
    url: String,
    client: Client,
}

impl DiscordClient {
    pub fn new(url: &str, token: &str) -> Result<Self, DiscordError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static("authorization"),
            HeaderValue::from_str(&format!("Bot {}", token))
                .map_err(|_| DiscordError::InvalidHeader)?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static("DiscordBot (https://github.com/ogomez92/alertbot, 0.1)"),
        );

        let client = Client::builder().default_headers(headers).build()?;

        Ok(Self {
            url: url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Open (or reuse) the DM channel with a user
    pub async fn open_dm(&self, user_id: u64) -> Result<DmChannel, DiscordError> {
        let payload = CreateDmPayload {
            recipient_id: user_id.to_string(),
        };

        let response = self
            .client
            .post(format!("{}/users/@me/channels", self.url))
            .json(&payload)
            .send()
            .await?;

        Ok(check_status(response)?.json().await?)
    }

    /// Send a message to a guild or DM channel
    pub async fn send_message(
        &self,
        channel_id: u64,
        message: &CreateMessage,
    ) -> Result<Message, DiscordError> {
        let response = self
            .client
            .post(format!("{}/channels/{}/messages", self.url, channel_id))
            .json(message)
            .send()
            .await?;

        Ok(check_status(response)?.json().await?)
    }

    /// Send a message to a user, opening the DM channel first
    pub async fn send_direct_message(
        &self,
        user_id: u64,
        message: &CreateMessage,
    ) -> Result<Message, DiscordError> {
        let channel = self.open_dm(user_id).await?;
        self.send_message(channel.id, message).await
    }
}

fn check_status(response: reqwest::Response) -> Result<reqwest::Response, DiscordError> {
    match response.status() {
        status if status.is_success() => Ok(response),
        StatusCode::FORBIDDEN => Err(DiscordError::Forbidden),
        StatusCode::NOT_FOUND => Err(DiscordError::NotFound),
        StatusCode::TOO_MANY_REQUESTS => Err(DiscordError::RateLimited),
        StatusCode::PAYLOAD_TOO_LARGE => Err(DiscordError::PayloadTooLarge),
        status => Err(DiscordError::Status(status.as_u16())),
    }
}
