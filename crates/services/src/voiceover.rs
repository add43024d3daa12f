use std::path::{Path, PathBuf};

use async_trait::async_trait;
use reel_core::model::SlideId;
use tracing::debug;
use url::Url;
use uuid::Uuid;

use crate::error::VoiceoverError;

/// Keeps synthesized narration somewhere the player can fetch it from.
#[async_trait]
pub trait VoiceoverStore: Send + Sync {
    /// Persist `audio` for `slide` and return its URL.
    ///
    /// # Errors
    ///
    /// Returns `VoiceoverError` when the audio cannot be written.
    async fn store(&self, slide: SlideId, audio: &[u8]) -> Result<Url, VoiceoverError>;
}

/// Writes MP3 files into a directory served under `base_url`.
#[derive(Clone, Debug)]
pub struct FsVoiceoverStore {
    dir: PathBuf,
    base_url: Url,
    batch: Uuid,
}

impl FsVoiceoverStore {
    /// `base_url` is treated as a directory whether or not it ends in `/`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, mut base_url: Url) -> Self {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self {
            dir: dir.into(),
            base_url,
            batch: Uuid::new_v4(),
        }
    }

    /// Serve files straight from disk through `file://` URLs.
    ///
    /// # Errors
    ///
    /// Returns `VoiceoverError::Io` if the directory cannot be resolved.
    pub fn local(dir: impl AsRef<Path>) -> Result<Self, VoiceoverError> {
        let dir = std::path::absolute(dir.as_ref())?;
        let base_url = Url::from_directory_path(&dir).map_err(|()| {
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "not an absolute path")
        })?;
        Ok(Self::new(dir, base_url))
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_name(&self, slide: SlideId) -> String {
        format!("{}-{}.mp3", self.batch.simple(), slide.value())
    }
}

#[async_trait]
impl VoiceoverStore for FsVoiceoverStore {
    async fn store(&self, slide: SlideId, audio: &[u8]) -> Result<Url, VoiceoverError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let name = self.file_name(slide);
        tokio::fs::write(self.dir.join(&name), audio).await?;
        let url = self.base_url.join(&name)?;
        debug!(slide = %slide, bytes = audio.len(), %url, "stored voiceover");
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stores_audio_under_base_url() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsVoiceoverStore::new(
            dir.path().join("voice"),
            Url::parse("https://cdn.test/audio").unwrap(),
        );

        let url = store.store(SlideId::new(3), b"ID3").await.unwrap();
        assert!(url.as_str().starts_with("https://cdn.test/audio/"));
        assert!(url.as_str().ends_with("-3.mp3"));

        let name = url.path_segments().unwrap().next_back().unwrap().to_owned();
        let written = tokio::fs::read(dir.path().join("voice").join(name)).await.unwrap();
        assert_eq!(written, b"ID3");
    }

    #[tokio::test]
    async fn local_store_returns_file_urls() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsVoiceoverStore::local(dir.path()).unwrap();
        let url = store.store(SlideId::new(1), b"x").await.unwrap();
        assert_eq!(url.scheme(), "file");
        assert!(url.to_file_path().unwrap().exists());
    }
}
