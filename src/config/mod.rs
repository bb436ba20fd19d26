use std::str::FromStr;
use std::time::Duration;

use crate::errors::{AlertError, AlertResult};

const DEFAULT_POLL_INTERVAL_SECS: u64 = 180;
const DEFAULT_ENTRIES_PER_CYCLE: usize = 3;
const DEFAULT_LEDGER_CAPACITY: usize = 5000;
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: Option<String>,
    pub discord_api_url: String,
    pub db_path: String,
    pub poll_interval: Duration,
    pub entries_per_cycle: usize,
    pub ledger_capacity: usize,
    pub fetch_timeout: Duration,
    pub admin_ids: Vec<u64>,
    pub mapquest_key: Option<String>,
    pub log_level: String,
}

impl Config {
    /// Get the directory where the executable is located
    fn exe_dir() -> Option<std::path::PathBuf> {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    pub fn from_env() -> AlertResult<Self> {
        let exe_dir = Self::exe_dir();

        // Try to load .env from executable's directory first
        if let Some(ref dir) = exe_dir {
            let env_path = dir.join(".env");
            if env_path.exists() {
                dotenvy::from_path(&env_path).ok();
            }
        }
        // Fall back to current directory
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| std::env::var(key).ok(), exe_dir)
    }

    fn from_lookup<F>(lookup: F, exe_dir: Option<std::path::PathBuf>) -> AlertResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let discord_token = lookup("DISCORD_TOKEN").filter(|t| !t.trim().is_empty());

        let discord_api_url = lookup("DISCORD_API_URL")
            .unwrap_or_else(|| discord_rest::DEFAULT_API_URL.to_string());

        // Default db_path is relative to executable directory
        let db_path = lookup("ALERTBOT_DB_PATH").unwrap_or_else(|| {
            exe_dir
                .map(|d| d.join("alertbot.db").to_string_lossy().into_owned())
                .unwrap_or_else(|| "./alertbot.db".to_string())
        });

        let poll_interval_secs: u64 = parse_positive(
            &lookup,
            "ALERTBOT_POLL_INTERVAL_SECS",
            DEFAULT_POLL_INTERVAL_SECS,
        )?;
        let entries_per_cycle: usize = parse_positive(
            &lookup,
            "ALERTBOT_ENTRIES_PER_CYCLE",
            DEFAULT_ENTRIES_PER_CYCLE,
        )?;
        let ledger_capacity: usize =
            parse_positive(&lookup, "ALERTBOT_LEDGER_CAPACITY", DEFAULT_LEDGER_CAPACITY)?;
        let fetch_timeout_secs: u64 = parse_positive(
            &lookup,
            "ALERTBOT_FETCH_TIMEOUT_SECS",
            DEFAULT_FETCH_TIMEOUT_SECS,
        )?;

        let admin_ids = match lookup("ALERTBOT_ADMIN_IDS") {
            Some(raw) => parse_id_list(&raw)?,
            None => Vec::new(),
        };

        let mapquest_key = lookup("ALERTBOT_MAPQUEST_KEY").filter(|k| !k.trim().is_empty());
        let log_level = lookup("ALERTBOT_LOG").unwrap_or_else(|| "info".to_string());

        Ok(Self {
            discord_token,
            discord_api_url,
            db_path,
            poll_interval: Duration::from_secs(poll_interval_secs),
            entries_per_cycle,
            ledger_capacity,
            fetch_timeout: Duration::from_secs(fetch_timeout_secs),
            admin_ids,
            mapquest_key,
            log_level,
        })
    }

    /// The bot token, required before anything is delivered
    pub fn require_token(&self) -> AlertResult<&str> {
        self.discord_token
            .as_deref()
            .ok_or_else(|| AlertError::MissingEnvVar("DISCORD_TOKEN".to_string()))
    }

    pub fn is_admin(&self, user_id: u64) -> bool {
        self.admin_ids.contains(&user_id)
    }
}

fn parse_positive<F, T>(lookup: &F, key: &str, default: T) -> AlertResult<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + PartialEq + Default,
{
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };

    let value: T = raw
        .trim()
        .parse()
        .map_err(|_| AlertError::Config(format!("{} must be a positive integer, got '{}'", key, raw)))?;

    if value == T::default() {
        return Err(AlertError::Config(format!("{} must be greater than zero", key)));
    }

    Ok(value)
}

fn parse_id_list(raw: &str) -> AlertResult<Vec<u64>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse()
                .map_err(|_| AlertError::Config(format!("Invalid admin id: {}", s)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> AlertResult<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned(), None)
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();

        assert!(config.discord_token.is_none());
        assert_eq!(config.discord_api_url, "https://discord.com/api/v10");
        assert_eq!(config.db_path, "./alertbot.db");
        assert_eq!(config.poll_interval, Duration::from_secs(180));
        assert_eq!(config.entries_per_cycle, 3);
        assert_eq!(config.ledger_capacity, 5000);
        assert!(config.admin_ids.is_empty());
    }

    #[test]
    fn test_missing_token_is_reported_on_demand() {
        let config = config_from(&[("DISCORD_TOKEN", "  ")]).unwrap();

        let err = config.require_token().unwrap_err();
        assert!(matches!(err, AlertError::MissingEnvVar(ref name) if name == "DISCORD_TOKEN"));
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("DISCORD_TOKEN", "abc"),
            ("ALERTBOT_POLL_INTERVAL_SECS", "60"),
            ("ALERTBOT_ENTRIES_PER_CYCLE", "5"),
            ("ALERTBOT_ADMIN_IDS", "10, 20,,30"),
        ])
        .unwrap();

        assert_eq!(config.require_token().unwrap(), "abc");
        assert_eq!(config.poll_interval, Duration::from_secs(60));
        assert_eq!(config.entries_per_cycle, 5);
        assert_eq!(config.admin_ids, vec![10, 20, 30]);
        assert!(config.is_admin(20));
        assert!(!config.is_admin(40));
    }

    #[test]
    fn test_zero_and_garbage_rejected() {
        assert!(matches!(
            config_from(&[("ALERTBOT_ENTRIES_PER_CYCLE", "0")]),
            Err(AlertError::Config(_))
        ));
        assert!(matches!(
            config_from(&[("ALERTBOT_POLL_INTERVAL_SECS", "soon")]),
            Err(AlertError::Config(_))
        ));
        assert!(matches!(
            config_from(&[("ALERTBOT_ADMIN_IDS", "12,abc")]),
            Err(AlertError::Config(_))
        ));
    }
}
