use dashmap::DashMap;
use serenity::model::id::GuildId;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::audio::{queue::GuildSession, transport::VoiceConnection};

/// Sesión de un guild detrás de su propio lock asíncrono.
pub type SessionHandle<C> = Arc<Mutex<GuildSession<C>>>;

/// Concurrent map from guild to its playback session.
///
/// The map itself is only locked for the duration of a lookup, insert or
/// remove (one shard at a time). All mutation of a session happens under that
/// session's own [`Mutex`], so guilds never wait on each other.
pub struct SessionRegistry<C: VoiceConnection> {
    sessions: DashMap<GuildId, SessionHandle<C>>,
}

impl<C: VoiceConnection> SessionRegistry<C> {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    /// Devuelve la sesión del guild, creándola de forma atómica si no existe
    pub fn get_or_create(&self, guild_id: GuildId, max_size: usize) -> SessionHandle<C> {
        self.sessions
            .entry(guild_id)
            .or_insert_with(|| {
                debug!("🆕 Sesión creada para guild {}", guild_id);
                Arc::new(Mutex::new(GuildSession::new(max_size)))
            })
            .clone()
    }

    pub fn get(&self, guild_id: GuildId) -> Option<SessionHandle<C>> {
        self.sessions.get(&guild_id).map(|entry| entry.clone())
    }

    /// Removes the entry only if it still points at `handle`, so a session
    /// that was already replaced is never evicted by its predecessor.
    pub fn remove(&self, guild_id: GuildId, handle: &SessionHandle<C>) -> bool {
        let removed = self
            .sessions
            .remove_if(&guild_id, |_, current| Arc::ptr_eq(current, handle))
            .is_some();
        if removed {
            debug!("🧹 Sesión eliminada para guild {}", guild_id);
        }
        removed
    }

    pub fn contains(&self, guild_id: GuildId) -> bool {
        self.sessions.contains_key(&guild_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl<C: VoiceConnection> Default for SessionRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}
