use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::error::{MediaError, RenderError, Result};
use crate::media::backend::{EncodedVideo, MediaBackend, SourceKind};
use crate::media::probe::MediaInfo;
use crate::render::RenderJob;

/// In-memory backend for tests: reports configured durations and records renders
pub struct FakeBackend {
    default_duration: f64,
    durations: HashMap<PathBuf, f64>,
    fail_render: bool,
    probes: AtomicUsize,
    releases: AtomicUsize,
    rendered: Mutex<Vec<RenderJob>>,
}

impl FakeBackend {
    pub fn with_duration(default_duration: f64) -> Self {
        Self {
            default_duration,
            durations: HashMap::new(),
            fail_render: false,
            probes: AtomicUsize::new(0),
            releases: AtomicUsize::new(0),
            rendered: Mutex::new(Vec::new()),
        }
    }

    /// Override the duration reported for files with this name
    pub fn duration_for(mut self, file_name: &str, duration: f64) -> Self {
        self.durations.insert(PathBuf::from(file_name), duration);
        self
    }

    pub fn failing_render(mut self) -> Self {
        self.fail_render = true;
        self
    }

    pub fn probe_count(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    pub fn release_count(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    pub fn rendered(&self) -> Vec<RenderJob> {
        self.rendered.lock().unwrap().clone()
    }
}

impl MediaBackend for FakeBackend {
    fn probe(&self, path: &Path, kind: SourceKind) -> Result<MediaInfo> {
        let name = path.file_name().map(PathBuf::from).unwrap_or_default();
        if name.to_string_lossy().starts_with("broken") {
            return Err(MediaError::LoadFailed {
                path: path.display().to_string(),
            }.into());
        }
        self.probes.fetch_add(1, Ordering::SeqCst);

        let duration = self
            .durations
            .get(&name)
            .copied()
            .unwrap_or(self.default_duration);

        Ok(match kind {
            SourceKind::Video => MediaInfo {
                duration,
                width: Some(640),
                height: Some(360),
                has_video: true,
                has_audio: true,
            },
            SourceKind::Audio => MediaInfo::audio_only(duration),
        })
    }

    fn render(&self, job: &RenderJob) -> Result<EncodedVideo> {
        if self.fail_render {
            return Err(RenderError::EncodingFailed {
                reason: "fake encoder refused".to_string(),
            }.into());
        }
        self.rendered.lock().unwrap().push(job.clone());
        Ok(EncodedVideo {
            path: job.output.clone(),
            duration: job.duration,
            file_size: 0,
        })
    }

    fn release(&self, _path: &Path) {
        self.releases.fetch_add(1, Ordering::SeqCst);
    }
}
