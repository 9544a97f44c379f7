use async_trait::async_trait;
use serenity::model::id::{ChannelId, GuildId};
use songbird::{
    input::{File, Input},
    tracks::TrackHandle,
    Call, Event, EventContext, EventHandler as VoiceEventHandler, Songbird, TrackEvent,
};
use std::{path::Path, sync::Arc};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::{
    audio::transport::{PlaybackHandle, PlaybackObserver, VoiceConnection, VoiceTransport},
    error::TransportError,
};

/// [`VoiceTransport`] backed by the Songbird manager registered on the
/// serenity client.
pub struct SongbirdTransport {
    manager: Arc<Songbird>,
}

impl SongbirdTransport {
    pub fn new(manager: Arc<Songbird>) -> Self {
        Self { manager }
    }
}

#[async_trait]
impl VoiceTransport for SongbirdTransport {
    type Resource = Input;
    type Connection = SongbirdConnection;

    async fn connect(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> Result<SongbirdConnection, TransportError> {
        let call = self
            .manager
            .join(guild_id, channel_id)
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;

        info!("🔊 Conectado al canal de voz {} en guild {}", channel_id, guild_id);

        Ok(SongbirdConnection {
            manager: self.manager.clone(),
            guild_id,
            call,
            released: false,
        })
    }

    async fn create_resource(&self, clip_path: &Path) -> Result<Input, TransportError> {
        let exists = tokio::fs::try_exists(clip_path)
            .await
            .map_err(|e| TransportError::Resource {
                path: clip_path.to_path_buf(),
                reason: e.to_string(),
            })?;

        if !exists {
            return Err(TransportError::Resource {
                path: clip_path.to_path_buf(),
                reason: "file no longer exists".to_string(),
            });
        }

        // Symphonia decodifica el archivo de forma perezosa al reproducir
        Ok(File::new(clip_path.to_path_buf()).into())
    }

    async fn abandon(&self, guild_id: GuildId) {
        if self.manager.get(guild_id).is_none() {
            return;
        }

        match self.manager.remove(guild_id).await {
            Ok(()) => info!("🧹 Conexión de voz pendiente descartada en guild {}", guild_id),
            Err(e) => debug!(
                "No había conexión de voz pendiente en guild {}: {:?}",
                guild_id, e
            ),
        }
    }
}

pub struct SongbirdConnection {
    manager: Arc<Songbird>,
    guild_id: GuildId,
    call: Arc<Mutex<Call>>,
    released: bool,
}

#[async_trait]
impl VoiceConnection for SongbirdConnection {
    type Resource = Input;
    type Player = TrackHandle;

    async fn subscribe(
        &mut self,
        resource: Input,
        observer: PlaybackObserver,
    ) -> Result<TrackHandle, TransportError> {
        let track = {
            let mut call = self.call.lock().await;
            call.play_only_input(resource)
        };

        track
            .add_event(
                Event::Track(TrackEvent::End),
                TrackEndHandler {
                    guild_id: self.guild_id,
                    observer: observer.clone(),
                },
            )
            .map_err(|e| TransportError::Subscribe(e.to_string()))?;

        track
            .add_event(
                Event::Track(TrackEvent::Error),
                TrackErrorHandler {
                    guild_id: self.guild_id,
                    observer,
                },
            )
            .map_err(|e| TransportError::Subscribe(e.to_string()))?;

        Ok(track)
    }

    async fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        match self.manager.remove(self.guild_id).await {
            Ok(()) => info!("👋 Desconectado del canal de voz en guild {}", self.guild_id),
            Err(e) => debug!(
                "Conexión de voz ya cerrada en guild {}: {:?}",
                self.guild_id, e
            ),
        }
    }
}

impl PlaybackHandle for TrackHandle {
    fn stop(&self) {
        if let Err(e) = TrackHandle::stop(self) {
            debug!("Track ya detenido: {:?}", e);
        }
    }
}

/// Handler para cuando termina un track (también al detenerlo)
struct TrackEndHandler {
    guild_id: GuildId,
    observer: PlaybackObserver,
}

#[async_trait]
impl VoiceEventHandler for TrackEndHandler {
    async fn act(&self, _ctx: &EventContext<'_>) -> Option<Event> {
        debug!("Track terminado en guild {}", self.guild_id);
        self.observer.finished();
        None
    }
}

/// Handler para errores de tracks
struct TrackErrorHandler {
    guild_id: GuildId,
    observer: PlaybackObserver,
}

#[async_trait]
impl VoiceEventHandler for TrackErrorHandler {
    async fn act(&self, ctx: &EventContext<'_>) -> Option<Event> {
        let mut reason = "unknown playback error".to_string();
        if let EventContext::Track(track_list) = ctx {
            for (state, _handle) in *track_list {
                reason = format!("{:?}", state.playing);
            }
        }

        debug!("Error de track en guild {}: {}", self.guild_id, reason);
        self.observer.failed(TransportError::Playback(reason));
        None
    }
}
