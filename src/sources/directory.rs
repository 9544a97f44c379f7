use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

use super::ClipCatalog;
use crate::error::SoundboardError;

/// Clips stored as `<dir>/<name>.<extension>`.
#[derive(Debug, Clone)]
pub struct DirectoryCatalog {
    dir: PathBuf,
    extension: String,
}

impl DirectoryCatalog {
    pub fn new(dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            extension: extension.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Un nombre válido es un único componente normal: sin separadores ni `..`
    fn is_valid_name(name: &str) -> bool {
        let mut components = Path::new(name).components();
        matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        ) && !name.contains(['/', '\\'])
    }
}

#[async_trait]
impl ClipCatalog for DirectoryCatalog {
    async fn list(&self) -> Result<Vec<String>, SoundboardError> {
        let mut entries = fs::read_dir(&self.dir).await.map_err(|e| {
            warn!("⚠️ No se pudo leer {}: {}", self.dir.display(), e);
            SoundboardError::CatalogUnreadable(e)
        })?;

        let mut labels = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(SoundboardError::CatalogUnreadable)?
        {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(self.extension.as_str()) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                labels.push(stem.to_string());
            }
        }

        labels.sort();
        debug!("📜 {} clips en {}", labels.len(), self.dir.display());
        Ok(labels)
    }

    async fn resolve(&self, name: &str) -> Option<PathBuf> {
        if !Self::is_valid_name(name) {
            debug!("Nombre de clip inválido: {:?}", name);
            return None;
        }

        let path = self.dir.join(format!("{}.{}", name, self.extension));
        match fs::try_exists(&path).await {
            Ok(true) => Some(path),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn catalog_with(files: &[&str]) -> (tempfile::TempDir, DirectoryCatalog) {
        let dir = tempfile::tempdir().unwrap();
        for file in files {
            std::fs::write(dir.path().join(file), b"ID3").unwrap();
        }
        let catalog = DirectoryCatalog::new(dir.path(), "mp3");
        (dir, catalog)
    }

    #[tokio::test]
    async fn test_list_returns_sorted_stems_of_matching_files() {
        let (_dir, catalog) = catalog_with(&["laugh.mp3", "airhorn.mp3", "notes.txt", "intro.mp3"]);

        let labels = catalog.list().await.unwrap();

        assert_eq!(labels, vec!["airhorn", "intro", "laugh"]);
    }

    #[tokio::test]
    async fn test_list_empty_directory() {
        let (_dir, catalog) = catalog_with(&[]);
        assert!(catalog.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_missing_directory_is_unreadable() {
        let catalog = DirectoryCatalog::new("/definitely/not/here", "mp3");
        let err = catalog.list().await.unwrap_err();
        assert!(matches!(err, SoundboardError::CatalogUnreadable(_)));
    }

    #[tokio::test]
    async fn test_resolve_existing_clip() {
        let (dir, catalog) = catalog_with(&["intro.mp3"]);

        assert_eq!(catalog.resolve("intro").await, Some(dir.path().join("intro.mp3")));
        assert_eq!(catalog.resolve("outro").await, None);
    }

    #[tokio::test]
    async fn test_resolve_rejects_names_outside_directory() {
        let (_dir, catalog) = catalog_with(&["intro.mp3"]);

        assert_eq!(catalog.resolve("../secret").await, None);
        assert_eq!(catalog.resolve("..").await, None);
        assert_eq!(catalog.resolve("").await, None);
        assert_eq!(catalog.resolve("a/intro").await, None);
    }
}
