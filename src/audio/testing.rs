//! In-memory transport and notifier that record every call.

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use serenity::model::id::{ChannelId, GuildId, UserId};
use std::{
    collections::{HashMap, HashSet},
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use crate::{
    audio::{
        queue::PlaybackRequest,
        transport::{Notifier, PlaybackHandle, PlaybackObserver, VoiceConnection, VoiceTransport},
    },
    error::TransportError,
};

pub(crate) fn request(label: &str) -> PlaybackRequest {
    request_in(label, 10)
}

pub(crate) fn request_in(label: &str, voice_channel: u64) -> PlaybackRequest {
    PlaybackRequest::new(
        PathBuf::from(format!("audios/{label}.mp3")),
        ChannelId::new(voice_channel),
        ChannelId::new(99),
        label,
        UserId::new(7),
    )
}

/// Polls `check` until it holds, panicking after ~2s.
pub(crate) async fn eventually(check: impl Fn() -> bool) {
    for _ in 0..400 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached in time");
}

#[derive(Default)]
struct Shared {
    events: Vec<String>,
    observers: Vec<(String, PlaybackObserver)>,
    open_connections: HashMap<GuildId, usize>,
}

#[derive(Default)]
pub(crate) struct FakeTransport {
    shared: Arc<Mutex<Shared>>,
    failing_resources: Mutex<HashSet<String>>,
    fail_connect: Mutex<bool>,
    hang_connect: Mutex<bool>,
}

impl FakeTransport {
    pub(crate) fn fail_resource(&self, file_name: &str) {
        self.failing_resources.lock().insert(file_name.to_string());
    }

    pub(crate) fn fail_connect(&self) {
        *self.fail_connect.lock() = true;
    }

    /// Connects never complete until [`FakeTransport::unblock_connect`].
    pub(crate) fn hang_connect(&self) {
        *self.hang_connect.lock() = true;
    }

    /// Connects started afterwards complete normally; hung ones stay hung.
    pub(crate) fn unblock_connect(&self) {
        *self.hang_connect.lock() = false;
    }

    pub(crate) fn events(&self) -> Vec<String> {
        self.shared.lock().events.clone()
    }

    /// Clips handed to a player, in order.
    pub(crate) fn plays(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| event.strip_prefix("play:").map(str::to_string))
            .collect()
    }

    pub(crate) fn open_connections(&self) -> usize {
        self.shared.lock().open_connections.values().sum()
    }

    pub(crate) fn finish(&self, file_name: &str) {
        if let Some(observer) = self.observer_for(file_name) {
            observer.finished();
        }
    }

    pub(crate) fn fail(&self, file_name: &str, reason: &str) {
        if let Some(observer) = self.observer_for(file_name) {
            observer.failed(TransportError::Playback(reason.to_string()));
        }
    }

    fn observer_for(&self, file_name: &str) -> Option<PlaybackObserver> {
        self.shared
            .lock()
            .observers
            .iter()
            .rev()
            .find(|(name, _)| name == file_name)
            .map(|(_, observer)| observer.clone())
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[async_trait]
impl VoiceTransport for FakeTransport {
    type Resource = PathBuf;
    type Connection = FakeConnection;

    async fn connect(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> Result<FakeConnection, TransportError> {
        self.shared
            .lock()
            .events
            .push(format!("connect:{channel_id}"));

        let hang = *self.hang_connect.lock();
        if hang {
            std::future::pending::<()>().await;
        }

        if *self.fail_connect.lock() {
            return Err(TransportError::Connect("voice gateway unavailable".to_string()));
        }
        *self
            .shared
            .lock()
            .open_connections
            .entry(guild_id)
            .or_default() += 1;

        Ok(FakeConnection {
            guild_id,
            channel_id,
            shared: self.shared.clone(),
            released: false,
        })
    }

    async fn create_resource(&self, clip_path: &Path) -> Result<PathBuf, TransportError> {
        let name = file_name(clip_path);
        self.shared.lock().events.push(format!("resource:{name}"));
        if self.failing_resources.lock().contains(&name) {
            return Err(TransportError::Resource {
                path: clip_path.to_path_buf(),
                reason: "unreadable".to_string(),
            });
        }
        Ok(clip_path.to_path_buf())
    }

    /// Like Songbird's `remove`, drops every connection the guild holds.
    async fn abandon(&self, guild_id: GuildId) {
        let mut shared = self.shared.lock();
        shared.events.push(format!("abandon:{guild_id}"));
        shared.open_connections.remove(&guild_id);
    }
}

pub(crate) struct FakeConnection {
    guild_id: GuildId,
    channel_id: ChannelId,
    shared: Arc<Mutex<Shared>>,
    released: bool,
}

#[async_trait]
impl VoiceConnection for FakeConnection {
    type Resource = PathBuf;
    type Player = FakePlayer;

    async fn subscribe(
        &mut self,
        resource: PathBuf,
        observer: PlaybackObserver,
    ) -> Result<FakePlayer, TransportError> {
        let name = file_name(&resource);
        let mut shared = self.shared.lock();
        shared.events.push(format!("play:{name}"));
        shared.observers.push((name.clone(), observer.clone()));

        Ok(FakePlayer {
            name,
            shared: self.shared.clone(),
            observer,
        })
    }

    async fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        let mut shared = self.shared.lock();
        shared.events.push(format!("release:{}", self.channel_id));
        if let Some(open) = shared.open_connections.get_mut(&self.guild_id) {
            *open = open.saturating_sub(1);
        }
    }
}

pub(crate) struct FakePlayer {
    name: String,
    shared: Arc<Mutex<Shared>>,
    observer: PlaybackObserver,
}

impl PlaybackHandle for FakePlayer {
    /// Como Songbird, detener el track dispara su evento de fin.
    fn stop(&self) {
        self.shared.lock().events.push(format!("stop:{}", self.name));
        self.observer.finished();
    }
}

#[derive(Default)]
pub(crate) struct FakeNotifier {
    sent: Mutex<Vec<(ChannelId, String)>>,
}

impl FakeNotifier {
    pub(crate) fn messages(&self) -> Vec<String> {
        self.sent.lock().iter().map(|(_, text)| text.clone()).collect()
    }
}

#[async_trait]
impl Notifier for FakeNotifier {
    async fn notify(&self, channel_id: ChannelId, content: String) -> Result<()> {
        self.sent.lock().push((channel_id, content));
        Ok(())
    }
}
