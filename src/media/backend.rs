use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Mutex;

use tracing::{debug, info, warn};

use crate::error::{MediaError, RenderError, Result};
use crate::media::probe::{self, MediaInfo};
use crate::render::RenderJob;

/// Whether a source is opened as a video clip or as an audio clip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Video,
    Audio,
}

/// Represents an encoded video output
#[derive(Debug, Clone)]
pub struct EncodedVideo {
    pub path: PathBuf,
    pub duration: f64,
    pub file_size: u64,
}

/// The media library the compositor drives.
///
/// Probing happens while the composition is planned; rendering happens once
/// at the end. `release` is called once for every successful `probe`.
pub trait MediaBackend: Send + Sync {
    /// Open a source and report its duration and streams
    fn probe(&self, path: &Path, kind: SourceKind) -> Result<MediaInfo>;

    /// Write the final file
    fn render(&self, job: &RenderJob) -> Result<EncodedVideo>;

    /// Close a source opened by `probe`
    fn release(&self, _path: &Path) {}
}

/// Backend built on the external `ffmpeg` and `ffprobe` binaries
pub struct FfmpegBackend {
    metadata_cache: Mutex<HashMap<PathBuf, MediaInfo>>,
    open_handles: Mutex<HashMap<PathBuf, usize>>,
}

impl FfmpegBackend {
    pub fn new() -> Self {
        Self {
            metadata_cache: Mutex::new(HashMap::new()),
            open_handles: Mutex::new(HashMap::new()),
        }
    }

    pub fn check_ffmpeg_available() -> bool {
        Command::new("ffmpeg")
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }

    fn probe_uncached(path: &Path, kind: SourceKind) -> Result<MediaInfo> {
        match kind {
            SourceKind::Video => {
                let info = probe::probe_with_ffprobe(path)?;
                if !info.has_video {
                    return Err(MediaError::LoadFailed {
                        path: path.display().to_string(),
                    }.into());
                }
                Ok(info)
            }
            SourceKind::Audio => match probe::probe_audio_native(path) {
                Ok(info) => Ok(info),
                Err(e) => {
                    debug!("Native audio probe failed for {:?} ({}), asking ffprobe", path, e);
                    let info = probe::probe_with_ffprobe(path)?;
                    if !info.has_audio {
                        return Err(MediaError::LoadFailed {
                            path: path.display().to_string(),
                        }.into());
                    }
                    Ok(info)
                }
            },
        }
    }
}

impl Default for FfmpegBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaBackend for FfmpegBackend {
    fn probe(&self, path: &Path, kind: SourceKind) -> Result<MediaInfo> {
        let cached = self
            .metadata_cache
            .lock()
            .ok()
            .and_then(|cache| cache.get(path).cloned());

        let info = match cached {
            Some(info) => info,
            None => {
                let info = Self::probe_uncached(path, kind)?;
                if let Ok(mut cache) = self.metadata_cache.lock() {
                    cache.insert(path.to_path_buf(), info.clone());
                }
                info
            }
        };

        if let Ok(mut handles) = self.open_handles.lock() {
            *handles.entry(path.to_path_buf()).or_insert(0) += 1;
        }
        Ok(info)
    }

    fn render(&self, job: &RenderJob) -> Result<EncodedVideo> {
        if !Self::check_ffmpeg_available() {
            return Err(RenderError::FfmpegMissing.into());
        }

        let mut script = tempfile::Builder::new()
            .prefix("chaos_compositor_graph_")
            .suffix(".txt")
            .tempfile()?;
        script.write_all(job.filter_script.as_bytes())?;
        script.flush()?;

        let args = job.ffmpeg_args(script.path());
        info!("Running ffmpeg with {} inputs -> {:?}", job.inputs.len(), job.output);
        debug!("ffmpeg {}", args.join(" "));

        let output = Command::new("ffmpeg")
            .args(&args)
            .output()
            .map_err(|e| RenderError::EncodingFailed {
                reason: format!("FFmpeg execution failed: {}", e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RenderError::EncodingFailed {
                reason: format!("FFmpeg failed: {}", stderr.trim()),
            }.into());
        }

        let metadata = std::fs::metadata(&job.output)?;
        Ok(EncodedVideo {
            path: job.output.clone(),
            duration: job.duration,
            file_size: metadata.len(),
        })
    }

    fn release(&self, path: &Path) {
        let Ok(mut handles) = self.open_handles.lock() else {
            return;
        };
        match handles.get_mut(path) {
            Some(count) if *count > 1 => *count -= 1,
            Some(_) => {
                handles.remove(path);
                if let Ok(mut cache) = self.metadata_cache.lock() {
                    cache.remove(path);
                }
            }
            None => warn!("Released {:?} which was never opened", path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_evicts_after_last_handle() {
        let backend = FfmpegBackend::new();
        let path = PathBuf::from("clip.mp4");
        backend
            .metadata_cache
            .lock()
            .unwrap()
            .insert(path.clone(), MediaInfo::audio_only(1.0));

        // Two handles on the same cached file
        backend.probe(&path, SourceKind::Audio).unwrap();
        backend.probe(&path, SourceKind::Audio).unwrap();

        backend.release(&path);
        assert!(backend.metadata_cache.lock().unwrap().contains_key(&path));

        backend.release(&path);
        assert!(!backend.metadata_cache.lock().unwrap().contains_key(&path));
        assert!(backend.open_handles.lock().unwrap().is_empty());
    }
}
