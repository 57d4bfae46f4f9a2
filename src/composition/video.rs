use std::path::{Path, PathBuf};

use rand::Rng;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::{EffectsConfig, VideoConfig};
use crate::effects::{self, Effect};
use crate::error::Result;
use crate::media::{Clip, MediaSession};
use crate::progress::progress_bar;

use super::sampling::sample_with_padding;

/// One sampled clip as it appears in the composed video
#[derive(Debug, Clone, Serialize)]
pub struct VideoSegment {
    pub path: PathBuf,
    pub source_duration: f64,

    /// Window kept from the source, if it was trimmed
    pub trim: Option<(f64, f64)>,

    pub effect: Option<Effect>,

    /// Duration after trim and effect
    pub duration: f64,
}

/// The concatenated video timeline
#[derive(Debug, Clone)]
pub struct ComposedVideo {
    /// Sampled files in timeline order
    pub files: Vec<PathBuf>,
    pub segments: Vec<VideoSegment>,
    pub timeline: Clip,
}

impl ComposedVideo {
    pub fn duration(&self) -> f64 {
        self.timeline.duration()
    }
}

/// Trims sampled video files and puts random effects on some of them
pub struct VideoCompositor<'a> {
    video: &'a VideoConfig,
    effects: &'a EffectsConfig,
}

impl<'a> VideoCompositor<'a> {
    pub fn new(video: &'a VideoConfig, effects: &'a EffectsConfig) -> Self {
        Self { video, effects }
    }

    /// Sample `count` files, load, trim and (maybe) effect each one, then
    /// concatenate them in sampling order
    pub fn compose<R: Rng + ?Sized>(
        &self,
        session: &mut MediaSession,
        available: &[PathBuf],
        count: usize,
        effects_enabled: bool,
        rng: &mut R,
    ) -> Result<ComposedVideo> {
        let files = sample_with_padding(available, count, rng);
        info!("Compiling {} videos...", files.len());

        let mut segments = Vec::with_capacity(files.len());
        let mut clips = Vec::with_capacity(files.len());

        for (index, path) in files.iter().enumerate() {
            let (clip, segment) = self.compose_one(session, path, effects_enabled, rng)?;
            debug!("{} {:?} -> {:.2}s", progress_bar(index + 1, files.len(), 20),
                   path.file_name().unwrap_or_default(), segment.duration);
            clips.push(clip);
            segments.push(segment);
        }

        let timeline = Clip::concat(clips);
        info!("Finished compiling videos ({:.2}s total)", timeline.duration());

        Ok(ComposedVideo { files, segments, timeline })
    }

    fn compose_one<R: Rng + ?Sized>(
        &self,
        session: &mut MediaSession,
        path: &Path,
        effects_enabled: bool,
        rng: &mut R,
    ) -> Result<(Clip, VideoSegment)> {
        let mut clip = session.load_video(path)?;
        let source_duration = clip.duration();

        let length = self.video.clip_length.draw(rng);
        let mut trim = None;
        if source_duration > length {
            let start = rng.gen_range(0.0..=source_duration - length);
            clip = clip.subclip(start, start + length);
            trim = Some((start, start + length));
        }

        // The roll is taken even with effects off so both modes sample alike
        let roll = rng.gen_bool(self.video.effect_probability);
        let mut effect = None;
        if roll && effects_enabled {
            if let Some(chosen) = effects::choose_effect(self.effects, rng) {
                debug!("Applying {} to {:?}", chosen.kind(), path);
                clip = effects::apply(&chosen, clip, rng);
                effect = Some(chosen);
            }
        }

        let segment = VideoSegment {
            path: path.to_path_buf(),
            source_duration,
            trim,
            effect,
            duration: clip.duration(),
        };
        Ok((clip, segment))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::fake::FakeBackend;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Arc;

    fn files(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn test_trims_stay_inside_sources() {
        let backend = Arc::new(FakeBackend::with_duration(10.0).duration_for("short.mp4", 0.3));
        let mut session = MediaSession::new(backend);
        let video = VideoConfig::default();
        let effects = EffectsConfig::default();
        let mut rng = StdRng::seed_from_u64(42);

        let composed = VideoCompositor::new(&video, &effects)
            .compose(&mut session, &files(&["a.mp4", "short.mp4", "b.mp4"]), 3, false, &mut rng)
            .unwrap();

        assert_eq!(composed.segments.len(), 3);
        for segment in &composed.segments {
            if let Some((start, end)) = segment.trim {
                assert!(0.0 <= start && start <= end && end <= segment.source_duration);
            }
            assert!(segment.effect.is_none());
        }
        // Shorter than any drawn length, so kept whole
        let short = composed
            .segments
            .iter()
            .find(|s| s.path == PathBuf::from("short.mp4"))
            .unwrap();
        assert!(short.trim.is_none());
        assert_eq!(short.duration, 0.3);

        let total: f64 = composed.segments.iter().map(|s| s.duration).sum();
        assert!((composed.duration() - total).abs() < 1e-9);
    }

    #[test]
    fn test_effects_applied_only_when_enabled() {
        let backend = Arc::new(FakeBackend::with_duration(10.0));
        let video = VideoConfig { effect_probability: 1.0, ..VideoConfig::default() };
        let effects = EffectsConfig::default();
        let names = files(&["a.mp4", "b.mp4", "c.mp4", "d.mp4"]);

        let mut session = MediaSession::new(backend.clone());
        let mut rng = StdRng::seed_from_u64(7);
        let with = VideoCompositor::new(&video, &effects)
            .compose(&mut session, &names, 4, true, &mut rng)
            .unwrap();
        assert!(with.segments.iter().all(|s| s.effect.is_some()));

        let mut session = MediaSession::new(backend);
        let mut rng = StdRng::seed_from_u64(7);
        let without = VideoCompositor::new(&video, &effects)
            .compose(&mut session, &names, 4, false, &mut rng)
            .unwrap();
        assert!(without.segments.iter().all(|s| s.effect.is_none()));
    }

    #[test]
    fn test_pads_when_count_exceeds_files() {
        let backend = Arc::new(FakeBackend::with_duration(4.0));
        let mut session = MediaSession::new(backend);
        let video = VideoConfig::default();
        let effects = EffectsConfig::default();
        let mut rng = StdRng::seed_from_u64(42);

        let composed = VideoCompositor::new(&video, &effects)
            .compose(&mut session, &files(&["a.mp4", "b.mp4", "c.mp4"]), 5, false, &mut rng)
            .unwrap();

        assert_eq!(composed.files.len(), 5);
        assert_eq!(composed.timeline.leaf_count(), 5);
        // Each use opens its own handle
        assert_eq!(session.open_count(), 5);
    }

    #[test]
    fn test_load_failure_propagates() {
        let backend = Arc::new(FakeBackend::with_duration(10.0));
        let mut session = MediaSession::new(backend);
        let video = VideoConfig::default();
        let effects = EffectsConfig::default();
        let mut rng = StdRng::seed_from_u64(1);

        let result = VideoCompositor::new(&video, &effects)
            .compose(&mut session, &files(&["broken.mp4"]), 2, true, &mut rng);
        assert!(result.is_err());
        assert_eq!(session.open_count(), 0);
    }
}
