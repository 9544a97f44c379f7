use serenity::model::id::{ChannelId, GuildId};
use std::{sync::Arc, time::Duration};
use tokio::sync::MutexGuard;
use tracing::{debug, error, info, warn};

use crate::{
    audio::{
        queue::{GuildSession, PlaybackRequest, QueuedRequest, RequestId, SessionState},
        registry::{SessionHandle, SessionRegistry},
        transport::{
            Notifier, PlaybackHandle, PlaybackObserver, PlaybackOutcome, VoiceConnection,
            VoiceTransport,
        },
    },
    error::{SoundboardError, TransportError},
    ui::replies,
};

type Connection<T> = <T as VoiceTransport>::Connection;
type Player<T> = <Connection<T> as VoiceConnection>::Player;
type SessionGuard<'a, T> = MutexGuard<'a, GuildSession<Connection<T>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// La solicitud quedó como cabeza; el aviso "reproduciendo" lo envía la sesión.
    Started,
    /// `position` audios la preceden en la espera (1 = la siguiente).
    Queued { position: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipOutcome {
    Skipped { label: String },
    NothingToSkip,
    NothingPlaying,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    Stopped { cleared: usize },
    NothingPlaying,
}

/// Per-guild clip playback: owns every guild session and drives the
/// connect, play, advance, disconnect lifecycle against a [`VoiceTransport`].
///
/// Every transition of a guild runs under that guild's session lock,
/// including transport completion callbacks, so a skip can never race a
/// natural completion of the same head. Advances carry the [`RequestId`] of
/// the head they were issued for and are dropped when it is no longer the
/// head.
///
/// Establishing the voice connection is the one slow step and runs with the
/// lock released. It races the session's cancellation token, so `stop` never
/// waits for a stalled gateway.
pub struct AudioPlayer<T: VoiceTransport> {
    registry: SessionRegistry<Connection<T>>,
    transport: Arc<T>,
    notifier: Arc<dyn Notifier>,
    max_queue_size: usize,
    connect_timeout: Duration,
}

impl<T: VoiceTransport> AudioPlayer<T> {
    pub fn new(
        transport: Arc<T>,
        notifier: Arc<dyn Notifier>,
        max_queue_size: usize,
        connect_timeout: Duration,
    ) -> Self {
        Self {
            registry: SessionRegistry::new(),
            transport,
            notifier,
            max_queue_size,
            connect_timeout,
        }
    }

    /// Agrega un clip a la cola del guild; si la cola estaba vacía, lo reproduce
    pub async fn enqueue(
        self: &Arc<Self>,
        guild_id: GuildId,
        request: PlaybackRequest,
    ) -> Result<EnqueueOutcome, SoundboardError> {
        loop {
            let handle = self.registry.get_or_create(guild_id, self.max_queue_size);
            let mut session = handle.lock().await;

            // Cerrada entre el lookup y el lock: pedir una sesión nueva
            if session.is_closed() {
                debug!("♻️ Sesión cerrada en guild {}, reintentando", guild_id);
                continue;
            }

            let position = session.push(request)?;
            debug!(
                "Solicitud {} en posición {} (guild {})",
                position.id, position.index, guild_id
            );
            if !position.is_head() {
                return Ok(EnqueueOutcome::Queued {
                    position: position.index,
                });
            }

            self.drive(guild_id, &handle, session).await;
            return Ok(EnqueueOutcome::Started);
        }
    }

    /// Salta la cabeza actual. Requiere un siguiente audio y un reproductor activo.
    pub async fn skip(self: &Arc<Self>, guild_id: GuildId) -> SkipOutcome {
        let Some(handle) = self.registry.get(guild_id) else {
            return SkipOutcome::NothingToSkip;
        };
        let mut session = handle.lock().await;

        if session.is_closed() || session.len() < 2 {
            return SkipOutcome::NothingToSkip;
        }
        if !session.has_player() {
            return SkipOutcome::NothingPlaying;
        }

        let (connection, player) = session.take_transport();
        Self::release(connection, player, true).await;
        let label = session
            .pop_head()
            .map(|item| item.request.label)
            .unwrap_or_default();
        session.begin_connecting();
        info!("⏭️ Saltando {} en guild {}", label, guild_id);

        // El siguiente arranca en otra tarea para que la respuesta "saltando"
        // llegue antes que el aviso de reproducción.
        self.spawn_resume(guild_id, handle.clone());

        SkipOutcome::Skipped { label }
    }

    /// Detiene todo, vacía la cola y desconecta. Idempotente.
    ///
    /// Una conexión en curso se cancela y su sesión de voz se descarta.
    pub async fn stop(&self, guild_id: GuildId) -> StopOutcome {
        let Some(handle) = self.registry.get(guild_id) else {
            return StopOutcome::NothingPlaying;
        };
        let mut session = handle.lock().await;

        if session.is_closed() {
            return StopOutcome::NothingPlaying;
        }

        let connecting = session.state() == SessionState::Connecting;
        let (connection, player) = session.take_transport();
        Self::release(connection, player, true).await;
        let cleared = session.len();
        session.close();
        if connecting {
            self.transport.abandon(guild_id).await;
        }
        self.registry.remove(guild_id, &handle);

        info!("⏹️ Reproducción detenida en guild {}", guild_id);
        StopOutcome::Stopped { cleared }
    }

    /// Cola actual del guild (cabeza primero), sin modificarla
    pub async fn queue(&self, guild_id: GuildId) -> Vec<PlaybackRequest> {
        let Some(handle) = self.registry.get(guild_id) else {
            return Vec::new();
        };
        let session = handle.lock().await;
        if session.is_closed() {
            return Vec::new();
        }
        session.snapshot()
    }

    pub fn has_session(&self, guild_id: GuildId) -> bool {
        self.registry.contains(guild_id)
    }

    pub fn active_sessions(&self) -> usize {
        self.registry.len()
    }

    /// Transport callback: the head bound to `request_id` finished normally.
    pub async fn on_playback_finished(
        self: &Arc<Self>,
        guild_id: GuildId,
        handle: SessionHandle<Connection<T>>,
        request_id: RequestId,
    ) {
        self.advance(guild_id, handle, request_id, PlaybackOutcome::Finished)
            .await;
    }

    /// Transport callback: the head bound to `request_id` failed. The queue
    /// still advances; the clip is never retried.
    pub async fn on_playback_failed(
        self: &Arc<Self>,
        guild_id: GuildId,
        handle: SessionHandle<Connection<T>>,
        request_id: RequestId,
        error: TransportError,
    ) {
        self.advance(
            guild_id,
            handle,
            request_id,
            PlaybackOutcome::Failed(error),
        )
        .await;
    }

    async fn advance(
        self: &Arc<Self>,
        guild_id: GuildId,
        handle: SessionHandle<Connection<T>>,
        request_id: RequestId,
        outcome: PlaybackOutcome,
    ) {
        let mut session = handle.lock().await;

        if session.is_closed() || !session.is_head(request_id) {
            debug!(
                "Evento de fin obsoleto en guild {} (solicitud {})",
                guild_id, request_id
            );
            return;
        }

        if let Some(head) = session.head() {
            match &outcome {
                PlaybackOutcome::Finished => {
                    debug!("🎵 Terminó {} en guild {}", head.request.label, guild_id)
                }
                PlaybackOutcome::Failed(e) => error!(
                    "❌ Error al reproducir {} en guild {}: {}",
                    head.request.label, guild_id, e
                ),
            }
        }

        let (connection, player) = session.take_transport();
        Self::release(connection, player, false).await;
        session.pop_head();

        self.drive(guild_id, &handle, session).await;
    }

    fn spawn_resume(self: &Arc<Self>, guild_id: GuildId, handle: SessionHandle<Connection<T>>) {
        let player = Arc::clone(self);
        tokio::spawn(async move {
            let session = handle.lock().await;
            if session.is_closed() || session.state() == SessionState::Playing {
                return;
            }
            player.drive(guild_id, &handle, session).await;
        });
    }

    /// Starts the current head, dropping heads that fail to start, until one
    /// plays, the queue drains or the session is stopped. A drained session is
    /// closed and removed.
    ///
    /// The lock is released only while connecting. Nothing can replace the
    /// head meanwhile: `skip` needs a bound player, advances need a bound head
    /// and enqueues only append. Only `stop` can intervene, and it closes the
    /// session.
    async fn drive<'a>(
        self: &Arc<Self>,
        guild_id: GuildId,
        handle: &'a SessionHandle<Connection<T>>,
        mut session: SessionGuard<'a, T>,
    ) {
        loop {
            let Some(head) = session.head().cloned() else {
                session.close();
                self.registry.remove(guild_id, handle);
                info!("📭 Cola vacía, sesión cerrada en guild {}", guild_id);
                return;
            };
            session.begin_connecting();
            let cancel = session.cancellation();
            drop(session);

            let connected = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(
                        "🚫 Conexión cancelada para {} en guild {}",
                        head.request.label, guild_id
                    );
                    return;
                }
                connected = self.connect(guild_id, &head) => connected,
            };

            session = handle.lock().await;
            if session.is_closed() || !session.is_head(head.id) {
                // `stop` ya descartó la sesión de voz del guild
                debug!(
                    "Sesión detenida mientras conectaba {} en guild {}",
                    head.request.label, guild_id
                );
                return;
            }

            match self.start_head(guild_id, handle, &head, connected).await {
                Ok((connection, player)) => {
                    session.bind(connection, player);
                    drop(session);

                    let waited = chrono::Utc::now() - head.request.requested_at;
                    info!(
                        "🎙️ Reproduciendo {} en guild {} (pedido por {}, esperó {}s)",
                        head.request.label,
                        guild_id,
                        head.request.requested_by,
                        waited.num_seconds()
                    );
                    self.notify(
                        head.request.reply_channel,
                        replies::now_playing(&head.request.display_name()),
                    )
                    .await;
                    return;
                }
                Err(e) => {
                    warn!(
                        "⚠️ No se pudo iniciar {} en guild {}: {}",
                        head.request.label, guild_id, e
                    );
                    session.pop_head();
                }
            }
        }
    }

    async fn connect(
        &self,
        guild_id: GuildId,
        head: &QueuedRequest,
    ) -> Result<Connection<T>, TransportError> {
        tokio::time::timeout(
            self.connect_timeout,
            self.transport
                .connect(guild_id, head.request.target_channel),
        )
        .await
        .map_err(|_| TransportError::ConnectTimeout(self.connect_timeout))?
    }

    async fn start_head(
        self: &Arc<Self>,
        guild_id: GuildId,
        handle: &SessionHandle<Connection<T>>,
        head: &QueuedRequest,
        connected: Result<Connection<T>, TransportError>,
    ) -> Result<(Connection<T>, Player<T>), TransportError> {
        let mut connection = match connected {
            Ok(connection) => connection,
            Err(e) => {
                self.transport.abandon(guild_id).await;
                return Err(e);
            }
        };

        let resource = match self.transport.create_resource(&head.request.clip_path).await {
            Ok(resource) => resource,
            Err(e) => {
                connection.release().await;
                return Err(e);
            }
        };

        let observer = self.observer(guild_id, handle, head.id);
        match connection.subscribe(resource, observer).await {
            Ok(player) => Ok((connection, player)),
            Err(e) => {
                connection.release().await;
                Err(e)
            }
        }
    }

    /// Builds the callback the transport fires when the head ends. The advance
    /// runs in its own task so transports may call it from any context,
    /// including while a session lock is held.
    fn observer(
        self: &Arc<Self>,
        guild_id: GuildId,
        handle: &SessionHandle<Connection<T>>,
        request_id: RequestId,
    ) -> PlaybackObserver {
        let player = Arc::downgrade(self);
        let session = Arc::downgrade(handle);

        PlaybackObserver::new(move |outcome| {
            let (Some(player), Some(session)) = (player.upgrade(), session.upgrade()) else {
                return;
            };
            tokio::spawn(async move {
                match outcome {
                    PlaybackOutcome::Finished => {
                        player
                            .on_playback_finished(guild_id, session, request_id)
                            .await
                    }
                    PlaybackOutcome::Failed(e) => {
                        player
                            .on_playback_failed(guild_id, session, request_id, e)
                            .await
                    }
                }
            });
        })
    }

    async fn release(
        connection: Option<Connection<T>>,
        player: Option<Player<T>>,
        stop_player: bool,
    ) {
        if let Some(player) = player {
            if stop_player {
                player.stop();
            }
        }
        if let Some(mut connection) = connection {
            connection.release().await;
        }
    }

    async fn notify(&self, channel_id: ChannelId, content: String) {
        if let Err(e) = self.notifier.notify(channel_id, content).await {
            error!("Error al enviar mensaje al canal {}: {:?}", channel_id, e);
        }
    }
}
