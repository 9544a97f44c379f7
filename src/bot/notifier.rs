use anyhow::{Context, Result};
use async_trait::async_trait;
use serenity::{http::Http, model::id::ChannelId};
use std::sync::{Arc, OnceLock};
use tracing::warn;

use crate::audio::transport::Notifier;

/// Publica los avisos de la sesión con la API HTTP de Discord.
///
/// The player is built before the serenity client exists, so the client's
/// [`Http`] (and its rate limiter) is attached once the client is built.
#[derive(Default)]
pub struct HttpNotifier {
    http: OnceLock<Arc<Http>>,
}

impl HttpNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Usa el cliente HTTP del bot. Solo el primero se conserva.
    pub fn attach(&self, http: Arc<Http>) {
        if self.http.set(http).is_err() {
            warn!("El notificador ya tenía un cliente HTTP asignado");
        }
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn notify(&self, channel_id: ChannelId, content: String) -> Result<()> {
        let http = self
            .http
            .get()
            .context("notificador sin cliente HTTP")?;
        channel_id.say(http, content).await?;
        Ok(())
    }
}
