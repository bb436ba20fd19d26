use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::domain::{Category, ChannelBinding, Subscriber};
use crate::errors::AlertResult;
use crate::storage::traits::{ChannelBindingRepository, SubscriberRepository};

#[derive(Debug, Default)]
pub struct ImportResult {
    pub added: Vec<u64>,
    pub duplicates: Vec<u64>,
    pub invalid: Vec<(String, String)>, // (raw id or key, error_message)
    pub bindings: Vec<ChannelBinding>,
}

/// Snowflakes appear as JSON numbers in older files and as strings in newer ones
fn parse_id(raw: &Value) -> Result<u64, (String, String)> {
    let parsed = match raw {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };

    parsed.ok_or_else(|| (display_raw(raw), "not a snowflake id".to_string()))
}

fn display_raw(raw: &Value) -> String {
    match raw {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

#[derive(Debug, Serialize)]
struct ExportDocument {
    subscribers: BTreeMap<String, BTreeMap<Category, bool>>,
    channels: BTreeMap<Category, String>,
}

pub struct SnapshotService<S: SubscriberRepository, B: ChannelBindingRepository> {
    subscribers: S,
    bindings: B,
}

impl<S: SubscriberRepository, B: ChannelBindingRepository> SnapshotService<S, B> {
    pub fn new(subscribers: S, bindings: B) -> Self {
        Self {
            subscribers,
            bindings,
        }
    }

    /// Import a snapshot file. A missing or unreadable file is an empty snapshot.
    pub fn import_file<P: AsRef<Path>>(&self, path: P) -> AlertResult<ImportResult> {
        let path = path.as_ref();

        match std::fs::read_to_string(path) {
            Ok(content) => self.import_json(&content),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "snapshot unreadable, treating as empty");
                Ok(ImportResult::default())
            }
        }
    }

    /// Import subscribers and channel bindings from snapshot JSON.
    /// Corrupt content is treated as an empty snapshot.
    pub fn import_json(&self, content: &str) -> AlertResult<ImportResult> {
        let mut result = ImportResult::default();

        if content.trim().is_empty() {
            return Ok(result);
        }

        let document: Value = match serde_json::from_str(content) {
            Ok(document) => document,
            Err(e) => {
                warn!(error = %e, "corrupt snapshot, treating as empty");
                return Ok(result);
            }
        };

        // Unknown keys (moderation toggles, banned words, ...) are ignored.
        let (subscribers, channels) = match document {
            Value::Array(ids) => (Value::Array(ids), Value::Null),
            Value::Object(mut object) => (
                object.remove("subscribers").unwrap_or(Value::Null),
                object.remove("channels").unwrap_or(Value::Null),
            ),
            other => {
                warn!(kind = %json_kind(&other), "snapshot is not a list or object, treating as empty");
                return Ok(result);
            }
        };

        for subscriber in Self::collect_subscribers(subscribers, &mut result) {
            if self.subscribers.add(&subscriber)? {
                result.added.push(subscriber.user_id);
            } else {
                result.duplicates.push(subscriber.user_id);
            }
        }

        for binding in Self::collect_bindings(channels, &mut result) {
            self.bindings.set(binding.category, binding.channel_id)?;
            result.bindings.push(binding);
        }

        Ok(result)
    }

    fn collect_subscribers(section: Value, result: &mut ImportResult) -> Vec<Subscriber> {
        let mut subscribers = Vec::new();

        match section {
            Value::Null => {}
            // Presence in the list is the preference
            Value::Array(ids) => {
                for raw in &ids {
                    match parse_id(raw) {
                        Ok(user_id) => subscribers.push(Subscriber::new(user_id, &[])),
                        Err(invalid) => result.invalid.push(invalid),
                    }
                }
            }
            Value::Object(entries) => {
                for (raw, flags) in entries {
                    let Ok(user_id) = raw.trim().parse::<u64>() else {
                        result.invalid.push((raw, "not a snowflake id".to_string()));
                        continue;
                    };

                    let mut subscriber = Subscriber::new(user_id, &[]);
                    match flags {
                        Value::Object(flags) => {
                            for (key, enabled) in flags {
                                let category = match key.parse::<Category>() {
                                    Ok(category) => category,
                                    Err(e) => {
                                        result.invalid.push((key, e));
                                        continue;
                                    }
                                };

                                match enabled {
                                    Value::Bool(enabled) => {
                                        subscriber.preferences.insert(category, enabled);
                                    }
                                    other => result.invalid.push((
                                        format!("{}.{}", user_id, key),
                                        format!("expected true or false, got {}", other),
                                    )),
                                }
                            }
                        }
                        other => {
                            result.invalid.push((
                                raw,
                                format!("expected category flags, got {}", json_kind(&other)),
                            ));
                            continue;
                        }
                    }
                    subscribers.push(subscriber);
                }
            }
            other => result.invalid.push((
                "subscribers".to_string(),
                format!("expected a list or object, got {}", json_kind(&other)),
            )),
        }

        subscribers
    }

    fn collect_bindings(section: Value, result: &mut ImportResult) -> Vec<ChannelBinding> {
        let entries = match section {
            Value::Null => return Vec::new(),
            Value::Object(entries) => entries,
            other => {
                result.invalid.push((
                    "channels".to_string(),
                    format!("expected an object, got {}", json_kind(&other)),
                ));
                return Vec::new();
            }
        };

        let mut bindings = Vec::new();

        for (key, raw_id) in entries {
            let category = match key.parse::<Category>() {
                Ok(category) => category,
                Err(e) => {
                    result.invalid.push((key, e));
                    continue;
                }
            };

            match parse_id(&raw_id) {
                Ok(channel_id) => bindings.push(ChannelBinding {
                    category,
                    channel_id,
                }),
                Err(invalid) => result.invalid.push(invalid),
            }
        }

        bindings
    }

    /// Export the store in the richer snapshot form
    pub fn export_json(&self) -> AlertResult<String> {
        let subscribers = self
            .subscribers
            .get_all()?
            .into_iter()
            .map(|s| (s.user_id.to_string(), s.preferences))
            .collect();

        let channels = self
            .bindings
            .get_all()?
            .into_iter()
            .map(|b| (b.category, b.channel_id.to_string()))
            .collect();

        let document = ExportDocument {
            subscribers,
            channels,
        };

        Ok(serde_json::to_string_pretty(&document)?)
    }
}
