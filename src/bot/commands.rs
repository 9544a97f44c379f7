use std::fmt;

/// Comando de texto con prefijo `!`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Menu,
    ShowQueue,
    Skip,
    Stop,
    Play(String),
}

impl Command {
    pub const PREFIX: char = '!';

    /// Interpreta el contenido de un mensaje. Exacto y sensible a mayúsculas.
    pub fn parse(content: &str) -> Option<Self> {
        let name = content.strip_prefix(Self::PREFIX)?;

        let command = match name {
            "" => return None,
            "menu" | "help" => Self::Menu,
            "cola" => Self::ShowQueue,
            "skip" => Self::Skip,
            "stop" => Self::Stop,
            clip => Self::Play(clip.to_string()),
        };

        Some(command)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Menu => write!(f, "!menu"),
            Self::ShowQueue => write!(f, "!cola"),
            Self::Skip => write!(f, "!skip"),
            Self::Stop => write!(f, "!stop"),
            Self::Play(clip) => write!(f, "!{clip}"),
        }
    }
}
