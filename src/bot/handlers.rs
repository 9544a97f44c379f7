use serenity::model::id::{ChannelId, GuildId, UserId};
use std::sync::Arc;
use tracing::info;

use crate::{
    audio::{
        player::{AudioPlayer, EnqueueOutcome, SkipOutcome, StopOutcome},
        queue::PlaybackRequest,
        transport::VoiceTransport,
    },
    bot::commands::Command,
    error::SoundboardError,
    sources::ClipCatalog,
    ui::replies,
};

/// Datos del mensaje que originó el comando.
#[derive(Debug, Clone, Copy)]
pub struct CommandContext {
    pub guild_id: GuildId,
    pub user_id: UserId,
    pub reply_channel: ChannelId,
    /// Canal de voz en el que está el autor, si está en alguno
    pub voice_channel: Option<ChannelId>,
}

/// Maps a parsed command to a playback operation and the reply text.
///
/// Catalog and voice-channel checks happen here, before any session is
/// touched, so a rejected `!<clip>` never leaves partial state behind.
pub struct RequestDispatcher<T: VoiceTransport> {
    catalog: Arc<dyn ClipCatalog>,
    player: Arc<AudioPlayer<T>>,
}

impl<T: VoiceTransport> RequestDispatcher<T> {
    pub fn new(catalog: Arc<dyn ClipCatalog>, player: Arc<AudioPlayer<T>>) -> Self {
        Self { catalog, player }
    }

    /// Ejecuta el comando. `None` significa que no hay respuesta directa
    /// (el aviso "reproduciendo" lo publica la sesión).
    pub async fn dispatch(&self, ctx: &CommandContext, command: Command) -> Option<String> {
        let reply = match command {
            Command::Menu => self.list().await,
            Command::ShowQueue => self.show_queue(ctx.guild_id).await,
            Command::Skip => self.skip(ctx.guild_id).await,
            Command::Stop => self.stop_all(ctx.guild_id).await,
            Command::Play(name) => return self.play(ctx, &name).await,
        };

        Some(reply)
    }

    async fn list(&self) -> String {
        match self.catalog.list().await {
            Ok(labels) if labels.is_empty() => replies::error(&SoundboardError::NoClips),
            Ok(labels) => replies::menu(&labels),
            Err(e) => replies::error(&e),
        }
    }

    async fn show_queue(&self, guild_id: GuildId) -> String {
        replies::queue(&self.player.queue(guild_id).await)
    }

    async fn skip(&self, guild_id: GuildId) -> String {
        match self.player.skip(guild_id).await {
            SkipOutcome::Skipped { .. } => replies::skipping(),
            SkipOutcome::NothingToSkip => replies::nothing_to_skip(),
            SkipOutcome::NothingPlaying => replies::nothing_playing(),
        }
    }

    async fn stop_all(&self, guild_id: GuildId) -> String {
        match self.player.stop(guild_id).await {
            StopOutcome::Stopped { .. } => replies::stopped(),
            StopOutcome::NothingPlaying => replies::stopped_idle(),
        }
    }

    async fn play(&self, ctx: &CommandContext, name: &str) -> Option<String> {
        let request = match self.prepare(ctx, name).await {
            Ok(request) => request,
            Err(e) => {
                info!("🚫 {} rechazado en guild {}: {}", name, ctx.guild_id, e);
                return Some(replies::error(&e));
            }
        };

        let display_name = request.display_name();
        match self.player.enqueue(ctx.guild_id, request).await {
            Ok(EnqueueOutcome::Started) => None,
            Ok(EnqueueOutcome::Queued { position }) => {
                Some(replies::queued(&display_name, position))
            }
            Err(e) => Some(replies::error(&e)),
        }
    }

    async fn prepare(
        &self,
        ctx: &CommandContext,
        name: &str,
    ) -> Result<PlaybackRequest, SoundboardError> {
        let clip_path = self
            .catalog
            .resolve(name)
            .await
            .ok_or_else(|| SoundboardError::ClipNotFound(name.to_string()))?;

        let target_channel = ctx
            .voice_channel
            .ok_or(SoundboardError::NotInVoiceChannel)?;

        Ok(PlaybackRequest::new(
            clip_path,
            target_channel,
            ctx.reply_channel,
            name,
            ctx.user_id,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        audio::testing::{eventually, FakeNotifier, FakeTransport},
        sources::MockClipCatalog,
    };
    use pretty_assertions::assert_eq;
    use std::{path::PathBuf, time::Duration};

    fn ctx(voice_channel: Option<u64>) -> CommandContext {
        CommandContext {
            guild_id: GuildId::new(1),
            user_id: UserId::new(7),
            reply_channel: ChannelId::new(99),
            voice_channel: voice_channel.map(ChannelId::new),
        }
    }

    /// Catálogo que conoce los clips dados, en `audios/<name>.mp3`
    fn catalog(clips: &'static [&'static str]) -> MockClipCatalog {
        let mut catalog = MockClipCatalog::new();
        catalog.expect_resolve().returning(move |name| {
            clips
                .iter()
                .any(|clip| *clip == name)
                .then(|| PathBuf::from(format!("audios/{name}.mp3")))
        });
        catalog
    }

    fn setup(
        catalog: MockClipCatalog,
    ) -> (
        RequestDispatcher<FakeTransport>,
        Arc<FakeTransport>,
        Arc<FakeNotifier>,
    ) {
        let transport = Arc::new(FakeTransport::default());
        let notifier = Arc::new(FakeNotifier::default());
        let player = Arc::new(AudioPlayer::new(
            transport.clone(),
            notifier.clone(),
            100,
            Duration::from_secs(1),
        ));
        (
            RequestDispatcher::new(Arc::new(catalog), player),
            transport,
            notifier,
        )
    }

    fn play(name: &str) -> Command {
        Command::Play(name.to_string())
    }

    #[tokio::test]
    async fn test_menu_lists_catalog() {
        let mut catalog = MockClipCatalog::new();
        catalog
            .expect_list()
            .times(1)
            .returning(|| Ok(vec!["airhorn".to_string(), "intro".to_string()]));
        let (dispatcher, _, _) = setup(catalog);

        let reply = dispatcher.dispatch(&ctx(None), Command::Menu).await.unwrap();

        assert_eq!(reply, replies::menu(&["airhorn".to_string(), "intro".to_string()]));
    }

    #[tokio::test]
    async fn test_menu_reports_empty_and_unreadable_catalog() {
        let mut empty = MockClipCatalog::new();
        empty.expect_list().returning(|| Ok(Vec::new()));
        let (dispatcher, _, _) = setup(empty);
        assert_eq!(
            dispatcher.dispatch(&ctx(None), Command::Menu).await.unwrap(),
            replies::error(&SoundboardError::NoClips)
        );

        let mut broken = MockClipCatalog::new();
        broken.expect_list().returning(|| {
            Err(SoundboardError::CatalogUnreadable(std::io::Error::from(
                std::io::ErrorKind::NotFound,
            )))
        });
        let (dispatcher, _, _) = setup(broken);
        assert_eq!(
            dispatcher.dispatch(&ctx(None), Command::Menu).await.unwrap(),
            "❌ Error al leer la carpeta de audios."
        );
    }

    #[tokio::test]
    async fn test_unknown_clip_is_rejected_before_voice_check() {
        let mut catalog = MockClipCatalog::new();
        catalog.expect_resolve().times(1).returning(|name| {
            assert_eq!(name, "nope");
            None
        });
        let (dispatcher, transport, _) = setup(catalog);

        let reply = dispatcher.dispatch(&ctx(None), play("nope")).await;

        assert_eq!(reply, Some(replies::error(&SoundboardError::ClipNotFound("nope".into()))));
        assert!(transport.events().is_empty());
    }

    #[tokio::test]
    async fn test_member_must_be_in_voice_channel() {
        let (dispatcher, transport, _) = setup(catalog(&["intro"]));

        let reply = dispatcher.dispatch(&ctx(None), play("intro")).await;

        assert_eq!(reply, Some(replies::error(&SoundboardError::NotInVoiceChannel)));
        assert!(transport.events().is_empty());
        assert_eq!(
            dispatcher.dispatch(&ctx(None), Command::ShowQueue).await,
            Some(replies::queue(&[]))
        );
    }

    #[tokio::test]
    async fn test_head_plays_silently_and_rest_are_queued() {
        let (dispatcher, transport, notifier) = setup(catalog(&["intro", "laugh", "airhorn"]));
        let ctx = ctx(Some(10));

        assert_eq!(dispatcher.dispatch(&ctx, play("intro")).await, None);
        assert_eq!(
            dispatcher.dispatch(&ctx, play("laugh")).await,
            Some(replies::queued("laugh.mp3", 1))
        );
        assert_eq!(
            dispatcher.dispatch(&ctx, play("airhorn")).await,
            Some(replies::queued("airhorn.mp3", 2))
        );

        assert_eq!(notifier.messages(), vec![replies::now_playing("intro.mp3")]);
        assert_eq!(transport.plays(), vec!["intro.mp3"]);

        let queue = dispatcher.dispatch(&ctx, Command::ShowQueue).await.unwrap();
        assert_eq!(
            queue,
            "📂 Audios en cola:\n```\n▶️ intro.mp3\n⏳ laugh.mp3\n⏳ airhorn.mp3\n```"
        );
    }

    #[tokio::test]
    async fn test_skip_replies() {
        let (dispatcher, transport, _) = setup(catalog(&["a", "b"]));
        let ctx = ctx(Some(10));

        assert_eq!(
            dispatcher.dispatch(&ctx, Command::Skip).await,
            Some(replies::nothing_to_skip())
        );

        dispatcher.dispatch(&ctx, play("a")).await;
        assert_eq!(
            dispatcher.dispatch(&ctx, Command::Skip).await,
            Some(replies::nothing_to_skip())
        );
        assert_eq!(
            dispatcher.dispatch(&ctx, Command::ShowQueue).await.unwrap(),
            "📂 Audios en cola:\n```\n▶️ a.mp3\n```"
        );

        dispatcher.dispatch(&ctx, play("b")).await;
        assert_eq!(
            dispatcher.dispatch(&ctx, Command::Skip).await,
            Some(replies::skipping())
        );
        eventually(|| transport.plays().len() == 2).await;
        assert_eq!(
            dispatcher.dispatch(&ctx, Command::ShowQueue).await.unwrap(),
            "📂 Audios en cola:\n```\n▶️ b.mp3\n```"
        );
    }

    #[tokio::test]
    async fn test_stop_replies() {
        let (dispatcher, transport, _) = setup(catalog(&["a", "b"]));
        let ctx = ctx(Some(10));

        assert_eq!(
            dispatcher.dispatch(&ctx, Command::Stop).await,
            Some(replies::stopped_idle())
        );

        dispatcher.dispatch(&ctx, play("a")).await;
        dispatcher.dispatch(&ctx, play("b")).await;
        assert_eq!(
            dispatcher.dispatch(&ctx, Command::Stop).await,
            Some(replies::stopped())
        );
        assert_eq!(transport.open_connections(), 0);
        assert_eq!(
            dispatcher.dispatch(&ctx, Command::ShowQueue).await,
            Some(replies::queue(&[]))
        );
    }
}
