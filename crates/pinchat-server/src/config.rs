use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use pinchat_chat::Settings;
use pinchat_db::pin::PinHashScheme;

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub upload_dir: PathBuf,
    pub jwt_secret: String,
    pub pin_hash: PinHashScheme,
    pub settings: Settings,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let jwt_secret = get("PINCHAT_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("PINCHAT_JWT_SECRET is unset or still a placeholder");
        }

        let defaults = Settings::default();
        let settings = Settings {
            presence_window: Duration::from_secs(parse_or(
                &get,
                "PINCHAT_PRESENCE_WINDOW_SECS",
                defaults.presence_window.as_secs(),
            )?),
            default_page_size: parse_or(
                &get,
                "PINCHAT_DEFAULT_PAGE_SIZE",
                defaults.default_page_size,
            )?,
            max_attachment_bytes: parse_or(
                &get,
                "PINCHAT_MAX_UPLOAD_BYTES",
                defaults.max_attachment_bytes,
            )?,
        };
        if settings.default_page_size == 0 {
            bail!("PINCHAT_DEFAULT_PAGE_SIZE must be positive");
        }

        Ok(Self {
            host: get("PINCHAT_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse_or(&get, "PINCHAT_PORT", 3000)?,
            db_path: get("PINCHAT_DB_PATH").unwrap_or_else(|| "chat.db".into()).into(),
            upload_dir: get("PINCHAT_UPLOAD_DIR").unwrap_or_else(|| "uploads".into()).into(),
            jwt_secret,
            pin_hash: get("PINCHAT_PIN_HASH")
                .map(|v| v.parse::<PinHashScheme>())
                .transpose()?
                .unwrap_or_default(),
            settings,
        })
    }
}

fn parse_or<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid value for {}: '{}'", key, raw)),
        None => Ok(default),
    }
}
