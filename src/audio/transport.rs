use async_trait::async_trait;
use serenity::model::id::{ChannelId, GuildId};
use std::{fmt, path::Path, sync::Arc};

use crate::error::TransportError;

/// Estado terminal de una reproducción reportado por el transporte.
#[derive(Debug, Clone)]
pub enum PlaybackOutcome {
    Finished,
    Failed(TransportError),
}

/// Voice session transport (joining channels, producing playable audio).
///
/// The session state machine only talks to voice through this trait, so the
/// production Songbird binding and the in-memory test transport are
/// interchangeable.
#[async_trait]
pub trait VoiceTransport: Send + Sync + 'static {
    type Resource: Send + 'static;
    type Connection: VoiceConnection<Resource = Self::Resource>;

    /// Establishes a voice session for `channel_id`.
    async fn connect(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> Result<Self::Connection, TransportError>;

    /// Produces a playable resource from a clip on disk.
    async fn create_resource(&self, clip_path: &Path) -> Result<Self::Resource, TransportError>;

    /// Tears down whatever voice session a connect that never produced a
    /// [`VoiceConnection`] (cancelled, timed out or failed) left for the guild.
    async fn abandon(&self, guild_id: GuildId);
}

/// A live link to a voice channel, exclusively owned by one guild session.
#[async_trait]
pub trait VoiceConnection: Send + Sync + 'static {
    type Resource: Send + 'static;
    type Player: PlaybackHandle;

    /// Hands `resource` to a fresh player subscribed to this connection and
    /// starts playback. Terminal status is reported through `observer`.
    async fn subscribe(
        &mut self,
        resource: Self::Resource,
        observer: PlaybackObserver,
    ) -> Result<Self::Player, TransportError>;

    /// Leaves the voice channel. Calling it more than once is a no-op.
    async fn release(&mut self);
}

/// Controlador de la reproducción activa.
pub trait PlaybackHandle: Send + Sync + 'static {
    fn stop(&self);
}

/// Callback que el transporte invoca cuando una reproducción termina o falla.
#[derive(Clone)]
pub struct PlaybackObserver {
    callback: Arc<dyn Fn(PlaybackOutcome) + Send + Sync>,
}

impl PlaybackObserver {
    pub fn new(callback: impl Fn(PlaybackOutcome) + Send + Sync + 'static) -> Self {
        Self {
            callback: Arc::new(callback),
        }
    }

    pub fn finished(&self) {
        (self.callback)(PlaybackOutcome::Finished);
    }

    pub fn failed(&self, error: TransportError) {
        (self.callback)(PlaybackOutcome::Failed(error));
    }
}

impl fmt::Debug for PlaybackObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackObserver").finish_non_exhaustive()
    }
}

/// Publica mensajes de estado en el canal de texto de la solicitud.
#[async_trait]
pub trait Notifier: Send + Sync + 'static {
    async fn notify(&self, channel_id: ChannelId, content: String) -> anyhow::Result<()>;
}
