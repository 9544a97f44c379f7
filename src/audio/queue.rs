use chrono::{DateTime, Utc};
use serenity::model::id::{ChannelId, UserId};
use std::{collections::VecDeque, path::PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::{audio::transport::VoiceConnection, error::SoundboardError};

/// Identificador de una solicitud dentro de su sesión.
pub type RequestId = u64;

/// A request to play one clip, created by the dispatcher on a successful
/// enqueue and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct PlaybackRequest {
    pub clip_path: PathBuf,
    pub target_channel: ChannelId,
    pub reply_channel: ChannelId,
    pub label: String,
    pub requested_by: UserId,
    pub requested_at: DateTime<Utc>,
}

impl PlaybackRequest {
    pub fn new(
        clip_path: PathBuf,
        target_channel: ChannelId,
        reply_channel: ChannelId,
        label: impl Into<String>,
        requested_by: UserId,
    ) -> Self {
        Self {
            clip_path,
            target_channel,
            reply_channel,
            label: label.into(),
            requested_by,
            requested_at: Utc::now(),
        }
    }

    /// Nombre de archivo del clip (`intro.mp3`), o la etiqueta si no hay uno.
    pub fn display_name(&self) -> String {
        self.clip_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.label.clone())
    }
}

#[derive(Debug, Clone)]
pub struct QueuedRequest {
    pub id: RequestId,
    pub request: PlaybackRequest,
}

/// Posición asignada por [`GuildSession::push`]. El índice 0 es la cabeza.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueuePosition {
    pub id: RequestId,
    pub index: usize,
}

impl QueuePosition {
    pub fn is_head(&self) -> bool {
        self.index == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Connecting,
    Playing,
}

/// Playback state for one guild.
///
/// The head of `queue` is the only request ever bound to `connection` and
/// `player`. Both handles are present together while `Playing`, and both are
/// absent otherwise except while a head is being connected.
///
/// A closed session has been stopped or drained and removed from the
/// registry; it never accepts requests again. Closing also cancels any
/// connect still in flight for it.
pub struct GuildSession<C: VoiceConnection> {
    queue: VecDeque<QueuedRequest>,
    connection: Option<C>,
    player: Option<C::Player>,
    state: SessionState,
    next_id: RequestId,
    max_size: usize,
    closed: bool,
    cancel: CancellationToken,
}

impl<C: VoiceConnection> GuildSession<C> {
    pub fn new(max_size: usize) -> Self {
        Self {
            queue: VecDeque::new(),
            connection: None,
            player: None,
            state: SessionState::Idle,
            next_id: 0,
            max_size,
            closed: false,
            cancel: CancellationToken::new(),
        }
    }

    /// Agrega una solicitud al final de la cola (FIFO estricto)
    pub fn push(&mut self, request: PlaybackRequest) -> Result<QueuePosition, SoundboardError> {
        if self.queue.len() >= self.max_size {
            return Err(SoundboardError::QueueFull { max: self.max_size });
        }

        let id = self.next_id;
        self.next_id += 1;

        info!(
            "➕ Agregado a la cola: {} (pedido por {})",
            request.label, request.requested_by
        );
        self.queue.push_back(QueuedRequest { id, request });

        Ok(QueuePosition {
            id,
            index: self.queue.len() - 1,
        })
    }

    pub fn head(&self) -> Option<&QueuedRequest> {
        self.queue.front()
    }

    pub fn is_head(&self, id: RequestId) -> bool {
        self.head().is_some_and(|head| head.id == id)
    }

    /// Quita la cabeza de la cola
    pub fn pop_head(&mut self) -> Option<QueuedRequest> {
        let head = self.queue.pop_front();
        if let Some(ref item) = head {
            debug!("➡️ Cabeza removida: {}", item.request.label);
        }
        head
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn has_player(&self) -> bool {
        self.player.is_some()
    }

    /// Copia de la cola en orden de reproducción
    pub fn snapshot(&self) -> Vec<PlaybackRequest> {
        self.queue.iter().map(|item| item.request.clone()).collect()
    }

    /// Token que se cancela cuando la sesión se cierra
    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn begin_connecting(&mut self) {
        self.state = SessionState::Connecting;
    }

    /// Binds the transport handles of the current head and marks it playing.
    pub fn bind(&mut self, connection: C, player: C::Player) {
        self.connection = Some(connection);
        self.player = Some(player);
        self.state = SessionState::Playing;
    }

    /// Hands the transport handles to the caller for teardown.
    pub fn take_transport(&mut self) -> (Option<C>, Option<C::Player>) {
        if self.state == SessionState::Playing {
            self.state = SessionState::Connecting;
        }
        (self.connection.take(), self.player.take())
    }

    /// Vacía la cola y marca la sesión como terminada
    pub fn close(&mut self) {
        if !self.queue.is_empty() {
            info!("🗑️ Cola limpiada ({} audios)", self.queue.len());
        }
        self.queue.clear();
        self.state = SessionState::Idle;
        self.closed = true;
        self.cancel.cancel();
    }
}
