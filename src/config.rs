use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    effects::EffectKind,
    error::{ConfigError, Result},
};

/// Main configuration for the Chaos-Compositor
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where clips are read from and results written to
    pub sources: SourceConfig,

    /// Video sampling and trimming settings
    pub video: VideoConfig,

    /// Effect parameter ranges
    pub effects: EffectsConfig,

    /// Audio sampling, trimming and placement settings
    pub audio: AudioConfig,

    /// Output encoding settings
    pub render: RenderConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound { path: path.display().to_string() })?;

        let config: Config = toml::from_str(&content)
            .map_err(|_| ConfigError::ParseFailed { path: path.display().to_string() })?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::InvalidValue {
                key: "config".to_string(),
                value: e.to_string()
            })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Short, fast-cut preset: tiny video clips and dense audio
    pub fn chaos() -> Self {
        Self {
            video: VideoConfig {
                clip_length: Span::new(0.4, 0.8),
                ..VideoConfig::default()
            },
            audio: AudioConfig {
                amount_multiplier: 1.5,
                clip_length: Span::new(0.7, 3.0),
                ..AudioConfig::default()
            },
            ..Self::default()
        }
    }

    /// Build the configuration for a named preset
    pub fn preset(preset: Preset) -> Self {
        match preset {
            Preset::Default => Self::default(),
            Preset::Chaos => Self::chaos(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.video.validate()?;
        self.effects.validate()?;
        self.audio.validate()?;
        self.render.validate()?;
        Ok(())
    }
}

/// Named configuration presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Preset {
    #[default]
    Default,
    Chaos,
}

impl FromStr for Preset {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "default" => Ok(Self::Default),
            "chaos" => Ok(Self::Chaos),
            _ => Err(ConfigError::UnknownPreset { name: s.to_string() }),
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => write!(f, "default"),
            Self::Chaos => write!(f, "chaos"),
        }
    }
}

/// Inclusive `min..=max` range a random value is drawn from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Span<T> {
    pub min: T,
    pub max: T,
}

impl<T> Span<T> {
    pub const fn new(min: T, max: T) -> Self {
        Self { min, max }
    }
}

impl Span<f64> {
    /// Draw a uniform value. A collapsed or inverted span yields `min`.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        if self.max > self.min {
            rng.gen_range(self.min..=self.max)
        } else {
            self.min
        }
    }

    fn check(&self, key: &str, lower: f64) -> Result<()> {
        if !(self.min >= lower && self.min <= self.max && self.max.is_finite()) {
            return Err(ConfigError::InvalidValue {
                key: key.to_string(),
                value: format!("{}-{}", self.min, self.max),
            }.into());
        }
        Ok(())
    }
}

impl Span<u32> {
    /// Draw a uniform integer from the inclusive range
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        rng.gen_range(self.min..=self.max.max(self.min))
    }

    fn check(&self, key: &str, lower: u32) -> Result<()> {
        if self.min < lower || self.min > self.max {
            return Err(ConfigError::InvalidValue {
                key: key.to_string(),
                value: format!("{}-{}", self.min, self.max),
            }.into());
        }
        Ok(())
    }
}

/// Input and output directories
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub video_dir: PathBuf,
    pub audio_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            video_dir: PathBuf::from("input_video_sources"),
            audio_dir: PathBuf::from("input_audio_sources"),
            output_dir: PathBuf::from("output"),
        }
    }
}

/// Video compositing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    /// Height every source is resized to (aspect ratio preserved)
    pub target_height: u32,

    /// Length range each sampled clip is trimmed to (seconds)
    pub clip_length: Span<f64>,

    /// Chance that a clip gets an effect when effects are enabled
    pub effect_probability: f64,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            target_height: 480,
            clip_length: Span::new(0.5, 3.5),
            effect_probability: 2.0 / 3.0,
        }
    }
}

impl VideoConfig {
    fn validate(&self) -> Result<()> {
        if self.target_height == 0 || self.target_height % 2 != 0 {
            return Err(ConfigError::InvalidValue {
                key: "video.target_height".to_string(),
                value: self.target_height.to_string()
            }.into());
        }

        if !(self.clip_length.min > 0.0) {
            return Err(ConfigError::InvalidValue {
                key: "video.clip_length".to_string(),
                value: format!("{}-{}", self.clip_length.min, self.clip_length.max)
            }.into());
        }
        self.clip_length.check("video.clip_length", 0.0)?;

        if !(0.0..=1.0).contains(&self.effect_probability) {
            return Err(ConfigError::InvalidValue {
                key: "video.effect_probability".to_string(),
                value: self.effect_probability.to_string()
            }.into());
        }

        Ok(())
    }
}

/// Parameter ranges for the random video effects
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectsConfig {
    /// Effects that may be picked; defaults to all of them
    pub enabled: Vec<EffectKind>,

    /// Speed factor for speed-scale
    pub speed: Span<f64>,

    /// Speed factor applied after symmetrize
    pub symmetrize_speed: Span<f64>,

    /// Length of the repeated window (seconds)
    pub repeat_window: Span<f64>,

    /// Number of split points for shuffle
    pub shuffle_splits: Span<u32>,

    /// Number of split points for continuous-flip
    pub flip_splits: Span<u32>,

    /// Length of the flip-rotation window (seconds)
    pub flip_rotation_window: Span<f64>,

    /// How many times the flip-rotation pair repeats
    pub flip_rotation_repeats: Span<u32>,

    /// Speed factor for both halves of a flip-rotation pair
    pub flip_rotation_speed: f64,

    /// Contrast factor (luminance stays at 0)
    pub contrast: Span<f64>,
}

impl Default for EffectsConfig {
    fn default() -> Self {
        Self {
            enabled: EffectKind::ALL.to_vec(),
            speed: Span::new(0.7, 3.0),
            symmetrize_speed: Span::new(1.4, 2.3),
            repeat_window: Span::new(0.01, 0.2),
            shuffle_splits: Span::new(20, 50),
            flip_splits: Span::new(1, 7),
            flip_rotation_window: Span::new(0.1, 0.3),
            flip_rotation_repeats: Span::new(1, 4),
            flip_rotation_speed: 1.5,
            contrast: Span::new(0.3, 2.0),
        }
    }
}

impl EffectsConfig {
    fn validate(&self) -> Result<()> {
        if self.enabled.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "effects.enabled".to_string(),
                value: "[]".to_string()
            }.into());
        }

        if !(self.speed.min > 0.0) || !(self.symmetrize_speed.min > 0.0) {
            return Err(ConfigError::InvalidValue {
                key: "effects.speed".to_string(),
                value: format!("{}-{}", self.speed.min, self.symmetrize_speed.min)
            }.into());
        }

        if !(self.flip_rotation_speed > 0.0) {
            return Err(ConfigError::InvalidValue {
                key: "effects.flip_rotation_speed".to_string(),
                value: self.flip_rotation_speed.to_string()
            }.into());
        }

        self.speed.check("effects.speed", 0.0)?;
        self.symmetrize_speed.check("effects.symmetrize_speed", 0.0)?;
        self.repeat_window.check("effects.repeat_window", 0.0)?;
        self.flip_rotation_window.check("effects.flip_rotation_window", 0.0)?;
        self.contrast.check("effects.contrast", 0.0)?;
        self.shuffle_splits.check("effects.shuffle_splits", 0)?;
        self.flip_splits.check("effects.flip_splits", 0)?;
        self.flip_rotation_repeats.check("effects.flip_rotation_repeats", 1)?;

        if !(self.repeat_window.min > 0.0) || !(self.flip_rotation_window.min > 0.0) {
            return Err(ConfigError::InvalidValue {
                key: "effects.window".to_string(),
                value: format!("{}-{}", self.repeat_window.min, self.flip_rotation_window.min)
            }.into());
        }

        Ok(())
    }
}

/// Audio compositing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Audio clip count relative to the video clip count
    pub amount_multiplier: f64,

    /// Volume factor applied to every placed sound
    pub volume: f64,

    /// Sounds longer than this (seconds) are trimmed instead of duplicated
    pub long_clip_threshold: f64,

    /// Length range long sounds are trimmed to (seconds)
    pub clip_length: Span<f64>,

    /// How many near-duplicates a short sound gets
    pub duplicates: Span<u32>,

    /// Maximum distance (seconds) between a duplicate and its original
    pub duplicate_spread: f64,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            amount_multiplier: 0.75,
            volume: 0.8,
            long_clip_threshold: 5.0,
            clip_length: Span::new(0.7, 13.0),
            duplicates: Span::new(1, 5),
            duplicate_spread: 2.0,
        }
    }
}

impl AudioConfig {
    fn validate(&self) -> Result<()> {
        let checks = [
            ("audio.amount_multiplier", self.amount_multiplier),
            ("audio.volume", self.volume),
            ("audio.long_clip_threshold", self.long_clip_threshold),
            ("audio.duplicate_spread", self.duplicate_spread),
        ];
        for (key, value) in checks {
            if !(value >= 0.0 && value.is_finite()) {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    value: value.to_string()
                }.into());
            }
        }

        self.clip_length.check("audio.clip_length", 0.0)?;
        self.duplicates.check("audio.duplicates", 0)?;
        Ok(())
    }
}

/// Final render configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub fps: u32,

    /// Audio bitrate passed to the encoder, e.g. "96k"
    pub audio_bitrate: String,

    pub video_codec: String,

    pub audio_codec: String,

    /// Sample rate every audio stream is normalized to before mixing
    pub sample_rate: u32,

    /// Encoder threads
    pub threads: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            fps: 30,
            audio_bitrate: "96k".to_string(),
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
            sample_rate: 44100,
            threads: num_cpus::get(),
        }
    }
}

impl RenderConfig {
    fn validate(&self) -> Result<()> {
        if self.fps == 0 {
            return Err(ConfigError::InvalidValue {
                key: "render.fps".to_string(),
                value: self.fps.to_string()
            }.into());
        }

        if self.sample_rate == 0 {
            return Err(ConfigError::InvalidValue {
                key: "render.sample_rate".to_string(),
                value: self.sample_rate.to_string()
            }.into());
        }

        if self.threads == 0 {
            return Err(ConfigError::InvalidValue {
                key: "render.threads".to_string(),
                value: self.threads.to_string()
            }.into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};
    use tempfile::tempdir;

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
        assert!(Config::chaos().validate().is_ok());
    }

    #[test]
    fn test_config_roundtrip() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test_config.toml");

        let original_config = Config::chaos();

        original_config.save_to_file(&file_path).unwrap();
        let loaded_config = Config::from_file(&file_path).unwrap();

        assert_eq!(original_config.video.clip_length, loaded_config.video.clip_length);
        assert_eq!(original_config.audio.amount_multiplier, loaded_config.audio.amount_multiplier);
        assert_eq!(original_config.effects.enabled, loaded_config.effects.enabled);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("partial.toml");
        std::fs::write(&file_path, "[audio]\nvolume = 0.5\n").unwrap();

        let config = Config::from_file(&file_path).unwrap();
        assert_eq!(config.audio.volume, 0.5);
        assert_eq!(config.audio.amount_multiplier, 0.75);
        assert_eq!(config.render.fps, 30);
    }

    #[test]
    fn test_missing_file() {
        let result = Config::from_file("definitely/not/here.toml");
        assert!(matches!(
            result,
            Err(crate::CompositorError::Config(ConfigError::FileNotFound { .. }))
        ));
    }

    #[test]
    fn test_inverted_clip_length_rejected() {
        let mut config = Config::default();
        config.video.clip_length = Span::new(3.0, 1.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_effect_set_rejected() {
        let mut config = Config::default();
        config.effects.enabled.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_preset_parsing() {
        assert_eq!("CHAOS".parse::<Preset>().unwrap(), Preset::Chaos);
        assert_eq!("default".parse::<Preset>().unwrap(), Preset::Default);
        assert!("loud".parse::<Preset>().is_err());
    }

    #[test]
    fn test_span_draw_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let span = Span::new(0.5, 3.5);
        for _ in 0..200 {
            let value = span.draw(&mut rng);
            assert!((0.5..=3.5).contains(&value));
        }

        let collapsed = Span::new(2.0, 2.0);
        assert_eq!(collapsed.draw(&mut rng), 2.0);

        let ints = Span::new(1u32, 5);
        for _ in 0..200 {
            assert!((1..=5).contains(&ints.draw(&mut rng)));
        }
    }
}
