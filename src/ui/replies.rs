//! Textos de respuesta del bot.

use crate::{audio::queue::PlaybackRequest, error::SoundboardError};

/// Comandos generales que se listan en el menú
pub const GENERAL_COMMANDS: &[&str] = &["!menu", "!help", "!cola", "!skip", "!stop"];

pub fn menu(labels: &[String]) -> String {
    let general = GENERAL_COMMANDS
        .iter()
        .map(|command| format!("`{command}`"))
        .collect::<Vec<_>>()
        .join(", ");
    let clips = labels
        .iter()
        .map(|label| format!("!{label}"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "👋 ¡Bienvenido al Bot del Momo!\n\n\
        📌 Comandos generales:\n{general}\n\n\
        📜 Audios disponibles:\n```\n{clips}\n```\n\
        Usá el comando correspondiente para reproducir un audio."
    )
}

/// Lista la cola: la cabeza con ▶️ y el resto con ⏳, en orden
pub fn queue(requests: &[PlaybackRequest]) -> String {
    if requests.is_empty() {
        return "📭 No hay audios en la cola de reproducción.".to_string();
    }

    let lines = requests
        .iter()
        .enumerate()
        .map(|(index, request)| {
            let marker = if index == 0 { "▶️" } else { "⏳" };
            format!("{} {}", marker, request.display_name())
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!("📂 Audios en cola:\n```\n{lines}\n```")
}

pub fn now_playing(display_name: &str) -> String {
    format!("🎙️ Reproduciendo `{display_name}`...")
}

pub fn queued(display_name: &str, position: usize) -> String {
    format!("⏳ Audio añadido a la lista de espera: `{display_name}` (posición {position})")
}

pub fn skipping() -> String {
    "⏭️ Saltando al siguiente audio...".to_string()
}

pub fn nothing_to_skip() -> String {
    "⛔ No hay audios en cola para saltar.".to_string()
}

pub fn nothing_playing() -> String {
    "⚠️ No se está reproduciendo ningún audio.".to_string()
}

pub fn stopped() -> String {
    "⏹️ Reproducción detenida y cola eliminada.".to_string()
}

pub fn stopped_idle() -> String {
    "⏹️ No había nada reproduciéndose.".to_string()
}

pub fn error(error: &SoundboardError) -> String {
    match error {
        SoundboardError::ClipNotFound(_) => {
            "❌ No encontré ese audio, probá con otro comando.".to_string()
        }
        SoundboardError::NotInVoiceChannel => {
            "🚫 Tenés que estar en un canal de voz para escuchar audios.".to_string()
        }
        SoundboardError::QueueFull { max } => {
            format!("🚫 La cola está llena (máximo {max} audios).")
        }
        SoundboardError::CatalogUnreadable(_) => {
            "❌ Error al leer la carpeta de audios.".to_string()
        }
        SoundboardError::NoClips => "⚠️ No hay audios disponibles en la carpeta.".to_string(),
    }
}
