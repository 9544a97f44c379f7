use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    // Discord
    pub discord_token: String,

    // Catálogo de clips
    pub audio_dir: PathBuf,
    pub clip_extension: String,

    // Límites
    pub max_queue_size: usize,
    pub connect_timeout: Duration,
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            discord_token: std::env::var("DISCORD_TOKEN")?,

            audio_dir: std::env::var("AUDIO_DIR")
                .unwrap_or_else(|_| "audios".to_string())
                .into(),
            clip_extension: std::env::var("CLIP_EXTENSION")
                .unwrap_or_else(|_| "mp3".to_string())
                .trim_start_matches('.')
                .to_string(),

            max_queue_size: std::env::var("MAX_QUEUE_SIZE")
                .unwrap_or_else(|_| "100".to_string())
                .parse()?,
            connect_timeout: humantime::parse_duration(
                &std::env::var("CONNECT_TIMEOUT").unwrap_or_else(|_| "10s".to_string()),
            )?,
        };

        config.validate()?;

        Ok(config)
    }

    /// Validates configuration values for correctness.
    ///
    /// # Validation Rules
    ///
    /// - The Discord token must not be empty
    /// - The clip extension must not be empty
    /// - Queue size and connect timeout must be greater than zero
    pub fn validate(&self) -> Result<()> {
        if self.discord_token.trim().is_empty() {
            anyhow::bail!("DISCORD_TOKEN must not be empty");
        }

        if self.clip_extension.is_empty() {
            anyhow::bail!("Clip extension must not be empty");
        }

        if self.max_queue_size == 0 {
            anyhow::bail!("Max queue size must be greater than 0");
        }

        if self.connect_timeout.is_zero() {
            anyhow::bail!("Connect timeout must be greater than 0");
        }

        Ok(())
    }

    /// Returns a summary of the current configuration for logging.
    ///
    /// The token is never included.
    pub fn summary(&self) -> String {
        format!(
            "Config Summary:\n  \
            Clips: {} (*.{})\n  \
            Limits: {} queue, {} connect timeout",
            self.audio_dir.display(),
            self.clip_extension,
            self.max_queue_size,
            humantime::format_duration(self.connect_timeout),
        )
    }
}

/// Default configuration values.
///
/// Used as fallbacks when environment variables are not provided.
impl Default for Config {
    fn default() -> Self {
        Self {
            // Discord (no defaults - must be provided)
            discord_token: String::new(),

            audio_dir: "audios".into(),
            clip_extension: "mp3".to_string(),

            max_queue_size: 100,
            connect_timeout: Duration::from_secs(10),
        }
    }
}
