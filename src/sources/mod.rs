pub mod directory;

use async_trait::async_trait;
use std::path::PathBuf;

use crate::error::SoundboardError;

pub use directory::DirectoryCatalog;

/// Trait común para los catálogos de clips
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClipCatalog: Send + Sync {
    /// Etiquetas de todos los clips disponibles, ordenadas
    async fn list(&self) -> Result<Vec<String>, SoundboardError>;

    /// Resuelve el nombre de un clip a su archivo, si existe
    async fn resolve(&self, name: &str) -> Option<PathBuf>;
}
