//! # Bot Module
//!
//! Discord front end of the soundboard.
//!
//! This module contains:
//! - Text command parsing (`!menu`, `!cola`, `!skip`, `!stop`, `!<clip>`)
//! - The request dispatcher that maps commands to playback operations
//! - The serenity [`EventHandler`] that feeds messages to the dispatcher
//!
//! ## Example
//!
//! ```rust,no_run
//! # use std::sync::Arc;
//! # use momo_soundboard::{audio::{player::AudioPlayer, voice::SongbirdTransport}, bot::{handlers::RequestDispatcher, SoundboardBot}, config::Config, sources::DirectoryCatalog};
//! # fn example(config: Config, player: Arc<AudioPlayer<SongbirdTransport>>) {
//! let catalog = Arc::new(DirectoryCatalog::new(&config.audio_dir, &config.clip_extension));
//! let dispatcher = RequestDispatcher::new(catalog, player);
//! let bot = SoundboardBot::new(config, dispatcher);
//! # }
//! ```

use serenity::{
    all::{ChannelId, Context, EventHandler, GuildId, Message, Ready, UserId},
    async_trait,
};
use std::sync::Arc;
use tracing::{debug, error, info};

pub mod commands;
pub mod handlers;
pub mod notifier;

use crate::{audio::voice::SongbirdTransport, config::Config};
use commands::Command;
use handlers::{CommandContext, RequestDispatcher};

/// Main Discord event handler.
///
/// Ignores messages from bots and from outside a guild; everything else that
/// parses as a [`Command`] goes through the [`RequestDispatcher`] and the
/// reply (if any) is posted as a reply to the triggering message.
pub struct SoundboardBot {
    config: Arc<Config>,
    dispatcher: RequestDispatcher<SongbirdTransport>,
}

impl SoundboardBot {
    pub fn new(config: Config, dispatcher: RequestDispatcher<SongbirdTransport>) -> Self {
        Self {
            config: Arc::new(config),
            dispatcher,
        }
    }
}

#[async_trait]
impl EventHandler for SoundboardBot {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!("✅ Bot conectado como {}", ready.user.name);
        info!("📊 Conectado a {} servidores", ready.guilds.len());
        info!("📁 Audios en {}", self.config.audio_dir.display());
    }

    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot {
            return;
        }
        let Some(guild_id) = msg.guild_id else {
            return;
        };
        let Some(command) = Command::parse(&msg.content) else {
            return;
        };

        info!(
            "📝 Comando {} usado por {} en guild {}",
            command, msg.author.name, guild_id
        );

        let command_ctx = CommandContext {
            guild_id,
            user_id: msg.author.id,
            reply_channel: msg.channel_id,
            voice_channel: member_voice_channel(&ctx, guild_id, msg.author.id),
        };

        if let Some(reply) = self.dispatcher.dispatch(&command_ctx, command).await {
            if let Err(e) = msg.reply(&ctx.http, reply).await {
                error!("Error al responder en guild {}: {:?}", guild_id, e);
            }
        }
    }
}

/// Canal de voz actual del miembro según la caché
fn member_voice_channel(ctx: &Context, guild_id: GuildId, user_id: UserId) -> Option<ChannelId> {
    let Some(guild) = guild_id.to_guild_cached(&ctx.cache) else {
        debug!("Guild {} no encontrada en caché", guild_id);
        return None;
    };

    guild
        .voice_states
        .get(&user_id)
        .and_then(|voice_state| voice_state.channel_id)
}
