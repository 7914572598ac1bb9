use std::time::Duration;

use gallery_core::pagination::{clamp_page_size, DEFAULT_PAGE_SIZE};

/// Path of the backend's realtime update endpoint, relative to the API host.
const DEFAULT_WS_PATH: &str = "/ws/image-updates";

/// Default HTTP request timeout.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base HTTP URL of the backend, e.g. `http://gallery.local:8000`.
    pub api_url: String,
    /// Websocket URL of the realtime notifier.
    pub ws_url: String,
    /// Bearer token for authenticated sessions. `None` browses anonymously.
    pub token: Option<String>,
    /// Items requested per page.
    pub page_size: usize,
    pub request_timeout: Duration,
}

impl ClientConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var                        | Default                                   |
    /// |--------------------------------|-------------------------------------------|
    /// | `GALLERY_API_URL`              | required                                  |
    /// | `GALLERY_WS_URL`               | `ws(s)://<api host>/ws/image-updates`     |
    /// | `GALLERY_TOKEN`                | none (anonymous)                          |
    /// | `GALLERY_PAGE_SIZE`            | `60`                                      |
    /// | `GALLERY_REQUEST_TIMEOUT_SECS` | `30`                                      |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup("GALLERY_API_URL")
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::Missing("GALLERY_API_URL"))?;

        let ws_url = match lookup("GALLERY_WS_URL").filter(|v| !v.trim().is_empty()) {
            Some(url) => url.trim().to_string(),
            None => derive_ws_url(&api_url)?,
        };

        let token = lookup("GALLERY_TOKEN").filter(|t| !t.trim().is_empty());

        let page_size = match lookup("GALLERY_PAGE_SIZE") {
            Some(raw) => clamp_page_size(Some(parse_var("GALLERY_PAGE_SIZE", &raw)?)),
            None => DEFAULT_PAGE_SIZE,
        };

        let timeout_secs: u64 = match lookup("GALLERY_REQUEST_TIMEOUT_SECS") {
            Some(raw) => parse_var("GALLERY_REQUEST_TIMEOUT_SECS", &raw)?,
            None => DEFAULT_REQUEST_TIMEOUT_SECS,
        };

        Ok(Self {
            api_url,
            ws_url,
            token,
            page_size,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

fn parse_var<T: std::str::FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::Invalid {
        key,
        value: raw.to_string(),
    })
}

/// Map `http(s)://host[/prefix]` to `ws(s)://host[/prefix]/ws/image-updates`.
fn derive_ws_url(api_url: &str) -> Result<String, ConfigError> {
    let invalid = || ConfigError::Invalid {
        key: "GALLERY_API_URL",
        value: api_url.to_string(),
    };

    let mut url = reqwest::Url::parse(api_url).map_err(|_| invalid())?;
    let scheme = match url.scheme() {
        "http" => "ws",
        "https" => "wss",
        _ => return Err(invalid()),
    };
    url.set_scheme(scheme).map_err(|_| invalid())?;

    let path = format!("{}{}", url.path().trim_end_matches('/'), DEFAULT_WS_PATH);
    url.set_path(&path);
    Ok(url.to_string())
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{key} has an invalid value: '{value}'")]
    Invalid { key: &'static str, value: String },
}
