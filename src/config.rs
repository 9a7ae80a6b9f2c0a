use std::{env, fmt::Display, path::PathBuf, str::FromStr, time::Duration};

use tracing::{info, warn};

/// Collaborator endpoints, read from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Random target endpoint. Unset means play from the local panorama file.
    pub target_url: Option<String>,
    pub imagery_url: Option<String>,
    pub imagery_key: Option<String>,
    pub cache_dir: PathBuf,
    pub http_timeout: Duration,
}

impl Config {
    pub fn load() -> Self {
        Self {
            target_url: var("GEOSCORE_TARGET_URL"),
            imagery_url: var("GEOSCORE_IMAGERY_URL"),
            imagery_key: var("GEOSCORE_IMAGERY_KEY"),
            cache_dir: var("GEOSCORE_CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| {
                    info!("GEOSCORE_CACHE_DIR not set, using default: .geoscore-cache");
                    PathBuf::from(".geoscore-cache")
                }),
            http_timeout: Duration::from_secs(try_load("GEOSCORE_HTTP_TIMEOUT_SECS", 10)),
        }
    }

    /// Both the endpoint and its key are needed for remote imagery.
    pub fn imagery(&self) -> Option<(&str, &str)> {
        match (&self.imagery_url, &self.imagery_key) {
            (Some(url), Some(key)) => Some((url.as_str(), key.as_str())),
            (Some(_), None) => {
                warn!("GEOSCORE_IMAGERY_URL set without GEOSCORE_IMAGERY_KEY, ignoring");
                None
            }
            _ => None,
        }
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn try_load<T: FromStr + Display>(key: &str, default: T) -> T
where
    T::Err: Display,
{
    let Some(raw) = var(key) else {
        info!("{key} not set, using default: {default}");
        return default;
    };
    match raw.parse() {
        Ok(value) => value,
        Err(e) => {
            warn!("Invalid {key} value {raw:?}: {e}, using default: {default}");
            default
        }
    }
}
