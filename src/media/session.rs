use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{MediaError, Result};
use crate::media::backend::{MediaBackend, SourceKind};
use crate::media::clip::{AudioClip, Clip, SourceId};
use crate::media::probe::MediaInfo;

/// A source opened during a composition run
#[derive(Debug, Clone, Serialize)]
pub struct OpenSource {
    pub path: PathBuf,
    pub kind: SourceKind,
    pub info: MediaInfo,
}

/// Tracks every source opened for one composition.
///
/// Each load opens its own handle, so a file used twice is opened twice.
/// All handles are released on [`MediaSession::close`] or when the session
/// is dropped, whichever comes first.
pub struct MediaSession {
    backend: Arc<dyn MediaBackend>,
    sources: Vec<OpenSource>,
    released: bool,
}

impl MediaSession {
    pub fn new(backend: Arc<dyn MediaBackend>) -> Self {
        Self {
            backend,
            sources: Vec::new(),
            released: false,
        }
    }

    fn open(&mut self, path: &Path, kind: SourceKind) -> Result<(SourceId, f64)> {
        let info = self.backend.probe(path, kind)?;
        // Track before validating so the handle is released either way
        let id = SourceId(self.sources.len());
        let duration = info.duration;
        self.sources.push(OpenSource {
            path: path.to_path_buf(),
            kind,
            info,
        });

        if !(duration.is_finite() && duration > 0.0) {
            return Err(MediaError::NoDuration {
                path: path.display().to_string(),
            }.into());
        }

        debug!("Opened {:?} as {:?} ({:.2}s)", path, kind, duration);
        Ok((id, duration))
    }

    /// Open a video file as a full-length clip
    pub fn load_video<P: AsRef<Path>>(&mut self, path: P) -> Result<Clip> {
        let (id, duration) = self.open(path.as_ref(), SourceKind::Video)?;
        Ok(Clip::source(id, duration))
    }

    /// Open an audio file as a full-length clip at volume 1
    pub fn load_audio<P: AsRef<Path>>(&mut self, path: P) -> Result<AudioClip> {
        let (id, duration) = self.open(path.as_ref(), SourceKind::Audio)?;
        Ok(AudioClip::new(id, duration))
    }

    pub fn sources(&self) -> &[OpenSource] {
        &self.sources
    }

    pub fn source(&self, id: SourceId) -> Result<&OpenSource> {
        self.sources
            .get(id.0)
            .ok_or_else(|| MediaError::UnknownSource { id: id.0 }.into())
    }

    /// Handles still held by this session
    pub fn open_count(&self) -> usize {
        if self.released {
            0
        } else {
            self.sources.len()
        }
    }

    pub fn backend(&self) -> Arc<dyn MediaBackend> {
        Arc::clone(&self.backend)
    }

    /// Release every handle and return how many were closed
    pub fn close(mut self) -> usize {
        self.release_all()
    }

    fn release_all(&mut self) -> usize {
        if self.released {
            return 0;
        }
        self.released = true;
        for source in &self.sources {
            self.backend.release(&source.path);
        }
        debug!("Released {} media handles", self.sources.len());
        self.sources.len()
    }
}

impl Drop for MediaSession {
    fn drop(&mut self) {
        if !self.released && !self.sources.is_empty() {
            warn!("Media session dropped with open handles, releasing");
        }
        self.release_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::fake::FakeBackend;

    #[test]
    fn test_every_load_is_a_new_handle() {
        let backend = Arc::new(FakeBackend::with_duration(8.0));
        let mut session = MediaSession::new(backend.clone());

        let first = session.load_video("a.mp4").unwrap();
        let second = session.load_video("a.mp4").unwrap();
        let sound = session.load_audio("b.wav").unwrap();

        assert_ne!(first, second);
        assert_eq!(first.duration(), 8.0);
        assert_eq!(sound.source, SourceId(2));
        assert_eq!(session.open_count(), 3);
        assert_eq!(session.source(SourceId(2)).unwrap().kind, SourceKind::Audio);
        assert!(session.source(SourceId(9)).is_err());

        assert_eq!(session.close(), 3);
        assert_eq!(backend.release_count(), 3);
    }

    #[test]
    fn test_drop_releases_handles() {
        let backend = Arc::new(FakeBackend::with_duration(2.0));
        {
            let mut session = MediaSession::new(backend.clone());
            session.load_video("a.mp4").unwrap();
            session.load_audio("b.wav").unwrap();
        }
        assert_eq!(backend.release_count(), 2);
    }

    #[test]
    fn test_zero_duration_source_is_rejected_but_released() {
        let backend = Arc::new(FakeBackend::with_duration(2.0).duration_for("empty.mp4", 0.0));
        let mut session = MediaSession::new(backend.clone());

        assert!(session.load_video("empty.mp4").is_err());
        drop(session);

        assert_eq!(backend.probe_count(), 1);
        assert_eq!(backend.release_count(), 1);
    }
}
