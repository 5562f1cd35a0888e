use std::{
    env, fmt::Display, net::SocketAddr, num::NonZeroU64, path::PathBuf, str::FromStr,
    time::Duration,
};

use tracing::{info, warn};
use url::Url;

use crate::error::ConfigError;

pub struct Config {
    pub bot_token: String,
    pub database_url: String,
    pub webhook: Option<Webhook>,
    pub tick_interval: Duration,
    pub render_interval: Duration,
    pub assets_dir: Option<PathBuf>,
}

pub struct Webhook {
    pub url: Url,
    pub addr: SocketAddr,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let webhook = match (lookup("WEBHOOK_URL"), lookup("WEBHOOK_ADDR")) {
            (Some(url), Some(addr)) => Some(Webhook {
                url: parse("WEBHOOK_URL", &url)?,
                addr: parse("WEBHOOK_ADDR", &addr)?,
            }),
            (None, None) => None,
            _ => return Err(ConfigError::PartialWebhook),
        };

        Ok(Self {
            bot_token: required(&lookup, "TELOXIDE_TOKEN")?,
            database_url: required(&lookup, "DATABASE_URL")?,
            webhook,
            tick_interval: millis(&lookup, "QUIZ_TICK_MS", "500")?,
            render_interval: millis(&lookup, "RENDER_INTERVAL_MS", "1000")?,
            assets_dir: lookup("QUIZ_ASSETS_DIR").map(PathBuf::from),
        })
    }
}

fn required(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<String, ConfigError> {
    lookup(key).ok_or(ConfigError::Missing(key))
}

/// Timer periods must be positive, a zero period would stall the timers.
fn millis(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: &str,
) -> Result<Duration, ConfigError> {
    let millis: NonZeroU64 = try_load(lookup, key, default)?;
    Ok(Duration::from_millis(millis.get()))
}

fn try_load<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: &str,
) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    let value = lookup(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    parse(key, &value)
}

fn parse<T: FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    value.trim().parse().map_err(|e: T::Err| {
        warn!("Invalid {key} value: {e}");
        ConfigError::Invalid {
            key,
            reason: e.to_string(),
        }
    })
}
