use crate::ports::staging::LocalStager;
use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::{AsyncWriteExt, BufWriter};
use uuid::Uuid;

/// Stages uploads as files inside a single transient directory.
#[derive(Clone, Debug)]
pub struct FsStager {
    dir: PathBuf,
}

impl FsStager {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn fresh_path(&self, extension: &str) -> PathBuf {
        let extension: String = extension
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();
        let name = if extension.is_empty() {
            Uuid::new_v4().to_string()
        } else {
            format!("{}.{}", Uuid::new_v4(), extension)
        };
        self.dir.join(name)
    }

    async fn write_new(path: &Path, bytes: &[u8]) -> io::Result<()> {
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .await?;
        let mut writer = BufWriter::new(file);
        writer.write_all(bytes).await?;
        writer.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl LocalStager for FsStager {
    async fn stage(&self, bytes: &[u8], extension: &str) -> io::Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let path = self.fresh_path(extension);
        if let Err(e) = Self::write_new(&path, bytes).await {
            // Don't leave a half-written file behind.
            let _ = tokio::fs::remove_file(&path).await;
            return Err(e);
        }
        tracing::debug!(path = %path.display(), size = bytes.len(), "staged upload");
        Ok(path)
    }

    async fn release(&self, path: &Path) -> io::Result<()> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}
