use anyhow::Result;
use momo_soundboard::{
    audio::{player::AudioPlayer, voice::SongbirdTransport},
    bot::{handlers::RequestDispatcher, notifier::HttpNotifier, SoundboardBot},
    config::Config,
    sources::{ClipCatalog, DirectoryCatalog},
};
use serenity::{model::gateway::GatewayIntents, Client};
use songbird::{SerenityInit, Songbird};
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // Inicializar logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("momo_soundboard=debug".parse()?)
                .add_directive("serenity=info".parse()?)
                .add_directive("songbird=info".parse()?),
        )
        .init();

    info!("🎵 Iniciando Momo Soundboard v{}", env!("CARGO_PKG_VERSION"));

    // Cargar configuración
    let config = Config::load()?;
    info!("{}", config.summary());

    let catalog = Arc::new(DirectoryCatalog::new(
        &config.audio_dir,
        &config.clip_extension,
    ));

    // Manejar health check si es necesario
    if std::env::args().any(|arg| arg == "--health-check") {
        return health_check(catalog.as_ref()).await;
    }

    // Configurar intents mínimos necesarios
    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_VOICE_STATES
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    // Transporte de voz y cola por guild
    let songbird = Songbird::serenity();
    let notifier = Arc::new(HttpNotifier::new());
    let player = Arc::new(AudioPlayer::new(
        Arc::new(SongbirdTransport::new(songbird.clone())),
        notifier.clone(),
        config.max_queue_size,
        config.connect_timeout,
    ));

    // Crear handler del bot
    let dispatcher = RequestDispatcher::new(catalog, player);
    let handler = SoundboardBot::new(config.clone(), dispatcher);

    // Construir cliente
    let mut client = Client::builder(&config.discord_token, intents)
        .event_handler(handler)
        .register_songbird_with(songbird)
        .await?;

    // Los avisos comparten el cliente HTTP (y sus límites de tasa) del bot
    notifier.attach(client.http.clone());

    // Manejar shutdown graceful
    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("Error al registrar Ctrl+C");
        info!("⚠️ Señal de shutdown recibida, cerrando...");
        shard_manager.shutdown_all().await;
    });

    // Iniciar bot
    info!("🚀 Bot iniciado exitosamente");
    if let Err(why) = client.start().await {
        error!("Error al ejecutar cliente: {:?}", why);
    }

    Ok(())
}

async fn health_check(catalog: &DirectoryCatalog) -> Result<()> {
    // Verificar que la carpeta de audios sea legible
    let clips = catalog.list().await?;
    info!("📜 {} audios en {}", clips.len(), catalog.dir().display());
    println!("OK");
    Ok(())
}
