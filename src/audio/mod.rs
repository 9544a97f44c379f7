//! # Audio Module
//!
//! Per-guild clip queues and their voice playback lifecycle.
//!
//! ## Architecture
//!
//! ### [`queue`] - Guild Session
//! - FIFO queue of [`queue::PlaybackRequest`]s; the head is the clip playing
//!   or about to play
//! - Owns the voice connection and player bound to the head
//! - Idle → Connecting → Playing state tracking
//!
//! ### [`registry`] - Session Registry
//! - Concurrent guild → session map with atomic get-or-create
//! - One async lock per guild; no lock spans guilds
//!
//! ### [`player`] - Playback driver
//! - `enqueue`, `skip`, `stop` and the transport completion callbacks
//! - Transport failures are absorbed here and turned into queue advances
//!
//! ### [`transport`] / [`voice`] - Voice Transport
//! - Trait seam for joining channels and playing clips
//! - Songbird implementation used in production
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use momo_soundboard::audio::{player::AudioPlayer, queue::PlaybackRequest, voice::SongbirdTransport};
//! use serenity::all::{ChannelId, GuildId, UserId};
//! use std::{sync::Arc, time::Duration};
//!
//! # async fn example(
//! #     songbird: Arc<songbird::Songbird>,
//! #     notifier: Arc<dyn momo_soundboard::audio::transport::Notifier>,
//! # ) -> anyhow::Result<()> {
//! let transport = Arc::new(SongbirdTransport::new(songbird));
//! let player = Arc::new(AudioPlayer::new(transport, notifier, 100, Duration::from_secs(10)));
//!
//! let request = PlaybackRequest::new(
//!     "audios/intro.mp3".into(),
//!     ChannelId::new(2),
//!     ChannelId::new(3),
//!     "intro",
//!     UserId::new(4),
//! );
//! player.enqueue(GuildId::new(1), request).await?;
//! player.skip(GuildId::new(1)).await;
//! player.stop(GuildId::new(1)).await;
//! # Ok(())
//! # }
//! ```

pub mod player;
pub mod queue;
pub mod registry;
pub mod transport;
pub mod voice;

#[cfg(test)]
pub(crate) mod testing;
