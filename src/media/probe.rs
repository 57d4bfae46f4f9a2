use std::fs::File;
use std::path::Path;
use std::process::{Command, Stdio};

use serde::{Deserialize, Serialize};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::debug;

use crate::error::{MediaError, Result};

/// What a probe learned about a media file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    /// Duration in seconds
    pub duration: f64,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub has_video: bool,
    pub has_audio: bool,
}

impl MediaInfo {
    pub fn audio_only(duration: f64) -> Self {
        Self {
            duration,
            width: None,
            height: None,
            has_video: false,
            has_audio: true,
        }
    }
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    streams: Option<Vec<FfprobeStream>>,
    format: Option<FfprobeFormat>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

/// Check if ffprobe is available on the system
pub fn ffprobe_available() -> bool {
    Command::new("ffprobe")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

/// Probe any media file with ffprobe
pub fn probe_with_ffprobe(path: &Path) -> Result<MediaInfo> {
    let output = Command::new("ffprobe")
        .args([
            "-v", "quiet",
            "-print_format", "json",
            "-show_streams",
            "-show_format",
        ])
        .arg(path)
        .output()
        .map_err(|e| MediaError::ProbeFailed {
            path: path.display().to_string(),
            reason: format!("failed to run ffprobe: {}", e),
        })?;

    if !output.status.success() {
        return Err(MediaError::LoadFailed {
            path: path.display().to_string(),
        }.into());
    }

    let json = String::from_utf8_lossy(&output.stdout);
    parse_ffprobe_output(&json).map_err(|e| {
        MediaError::ProbeFailed {
            path: path.display().to_string(),
            reason: e,
        }
        .into()
    })
}

/// Parse ffprobe's JSON (`-show_streams -show_format`) into [`MediaInfo`]
pub fn parse_ffprobe_output(json: &str) -> std::result::Result<MediaInfo, String> {
    let output: FfprobeOutput = serde_json::from_str(json)
        .map_err(|e| format!("invalid ffprobe output: {}", e))?;

    let streams = output.streams.unwrap_or_default();
    let video = streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"));
    let has_audio = streams
        .iter()
        .any(|s| s.codec_type.as_deref() == Some("audio"));

    // Container duration first, the longest stream otherwise
    let duration = output
        .format
        .and_then(|f| f.duration)
        .and_then(|d| d.parse::<f64>().ok())
        .or_else(|| {
            streams
                .iter()
                .filter_map(|s| s.duration.as_deref()?.parse::<f64>().ok())
                .reduce(f64::max)
        })
        .ok_or_else(|| "no duration reported".to_string())?;

    Ok(MediaInfo {
        duration,
        width: video.and_then(|s| s.width),
        height: video.and_then(|s| s.height),
        has_video: video.is_some(),
        has_audio,
    })
}

/// Probe an audio file without spawning a process.
///
/// WAV goes through hound, everything else through symphonia.
pub fn probe_audio_native(path: &Path) -> Result<MediaInfo> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_lowercase();

    if extension == "wav" {
        match probe_wav(path) {
            Ok(info) => return Ok(info),
            Err(e) => debug!("hound could not read {:?}: {}", path, e),
        }
    }

    probe_with_symphonia(path)
}

/// Read the WAV header with hound
pub fn probe_wav(path: &Path) -> Result<MediaInfo> {
    let reader = hound::WavReader::open(path)
        .map_err(|_| MediaError::LoadFailed {
            path: path.display().to_string()
        })?;

    let sample_rate = reader.spec().sample_rate;
    if sample_rate == 0 {
        return Err(MediaError::NoDuration { path: path.display().to_string() }.into());
    }

    Ok(MediaInfo::audio_only(reader.duration() as f64 / sample_rate as f64))
}

/// Read the default track's frame count and sample rate with symphonia
pub fn probe_with_symphonia(path: &Path) -> Result<MediaInfo> {
    let file = File::open(path)
        .map_err(|_| MediaError::LoadFailed {
            path: path.display().to_string()
        })?;

    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = path.extension().and_then(|ext| ext.to_str()) {
        hint.with_extension(extension);
    }

    let meta_opts: MetadataOptions = Default::default();
    let fmt_opts: FormatOptions = Default::default();

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &fmt_opts, &meta_opts)
        .map_err(|e| MediaError::ProbeFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

    let track = probed
        .format
        .default_track()
        .ok_or_else(|| MediaError::LoadFailed {
            path: path.display().to_string()
        })?;

    let params = &track.codec_params;
    match (params.n_frames, params.sample_rate) {
        (Some(frames), Some(rate)) if rate > 0 => {
            Ok(MediaInfo::audio_only(frames as f64 / rate as f64))
        }
        _ => Err(MediaError::NoDuration { path: path.display().to_string() }.into()),
    }
}
