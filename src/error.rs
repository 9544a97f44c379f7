use std::{path::PathBuf, time::Duration};

use thiserror::Error;

/// Errores visibles para el usuario, detectados antes de tocar la sesión.
#[derive(Debug, Error)]
pub enum SoundboardError {
    #[error("clip not found: {0}")]
    ClipNotFound(String),

    #[error("member is not connected to a voice channel")]
    NotInVoiceChannel,

    #[error("queue is full (max {max} clips)")]
    QueueFull { max: usize },

    #[error("clip catalog is unreadable: {0}")]
    CatalogUnreadable(#[source] std::io::Error),

    #[error("no clips available in the catalog")]
    NoClips,
}

/// Fallos del transporte de voz.
///
/// Nunca llegan al dispatcher: la sesión los absorbe y avanza la cola.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("could not join voice channel: {0}")]
    Connect(String),

    #[error("timed out after {0:?} joining voice channel")]
    ConnectTimeout(Duration),

    #[error("could not create playable resource from {}: {reason}", .path.display())]
    Resource { path: PathBuf, reason: String },

    #[error("could not start playback: {0}")]
    Subscribe(String),

    #[error("playback failed: {0}")]
    Playback(String),
}
