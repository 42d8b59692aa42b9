use std::{fs, path::Path, time::Duration};

use anyhow::{bail, Context};
use serde::Deserialize;
use shared::protocol::DEFAULT_SERVER_URL;
use url::Url;

pub const SETTINGS_FILE_NAME: &str = "client.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub server_url: String,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.into(),
            request_timeout_secs: 120,
            connect_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    server_url: Option<String>,
    request_timeout_secs: Option<u64>,
    connect_timeout_secs: Option<u64>,
}

impl ClientSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn server_base_url(&self) -> anyhow::Result<Url> {
        parse_server_url(&self.server_url)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.server_base_url()?;
        if self.request_timeout_secs == 0 {
            bail!("request_timeout_secs must be greater than zero");
        }
        if self.connect_timeout_secs == 0 {
            bail!("connect_timeout_secs must be greater than zero");
        }
        Ok(())
    }
}

/// Defaults, then `client.toml` in the working directory, then environment.
pub fn load_settings() -> anyhow::Result<ClientSettings> {
    let mut settings = load_settings_file(Path::new(SETTINGS_FILE_NAME))?;
    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    settings.validate()?;
    Ok(settings)
}

/// A missing file yields defaults; an unreadable or malformed one is an error.
pub fn load_settings_file(path: &Path) -> anyhow::Result<ClientSettings> {
    let mut settings = ClientSettings::default();

    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(settings),
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read settings file '{}'", path.display()))
        }
    };

    let file_cfg: FileSettings = toml::from_str(&raw)
        .with_context(|| format!("failed to parse settings file '{}'", path.display()))?;
    if let Some(v) = file_cfg.server_url {
        settings.server_url = v;
    }
    if let Some(v) = file_cfg.request_timeout_secs {
        settings.request_timeout_secs = v;
    }
    if let Some(v) = file_cfg.connect_timeout_secs {
        settings.connect_timeout_secs = v;
    }

    Ok(settings)
}

pub fn apply_env_overrides(
    settings: &mut ClientSettings,
    lookup: impl Fn(&str) -> Option<String>,
) {
    if let Some(v) = lookup("ANALYZER_SERVER_URL") {
        settings.server_url = v;
    }
    if let Some(v) = lookup("APP__SERVER_URL") {
        settings.server_url = v;
    }

    if let Some(v) = lookup("APP__REQUEST_TIMEOUT_SECS") {
        match v.parse::<u64>() {
            Ok(parsed) => settings.request_timeout_secs = parsed,
            Err(err) => tracing::warn!(value = %v, "ignoring APP__REQUEST_TIMEOUT_SECS: {err}"),
        }
    }
    if let Some(v) = lookup("APP__CONNECT_TIMEOUT_SECS") {
        match v.parse::<u64>() {
            Ok(parsed) => settings.connect_timeout_secs = parsed,
            Err(err) => tracing::warn!(value = %v, "ignoring APP__CONNECT_TIMEOUT_SECS: {err}"),
        }
    }
}

pub fn parse_server_url(raw: &str) -> anyhow::Result<Url> {
    let raw = raw.trim();
    if raw.is_empty() {
        bail!("server url must not be empty");
    }

    let url = Url::parse(raw).with_context(|| format!("invalid server url '{raw}'"))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("server url '{raw}' must use http or https");
    }
    if url.cannot_be_a_base() || url.host_str().is_none() {
        bail!("server url '{raw}' has no host");
    }
    Ok(url)
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
