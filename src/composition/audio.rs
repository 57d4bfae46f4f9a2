use std::path::{Path, PathBuf};

use rand::Rng;
use tracing::{debug, info};

use crate::config::AudioConfig;
use crate::error::Result;
use crate::media::{AudioClip, MediaSession};
use crate::progress::progress_bar;

use super::sampling::{draw_between, sample_with_padding};

/// Audio placements laid over the composed video
#[derive(Debug, Clone)]
pub struct ComposedAudio {
    /// Sampled files
    pub files: Vec<PathBuf>,

    /// Originals and near-duplicates, in insertion order
    pub placements: Vec<AudioClip>,

    pub duplicates: usize,
}

/// Places sampled sounds at random offsets of the video.
///
/// Long sounds are cut to a random length and placed once. Short sounds are
/// placed and then echoed by a few near-duplicates clustered around them.
pub struct AudioCompositor<'a> {
    config: &'a AudioConfig,
}

impl<'a> AudioCompositor<'a> {
    pub fn new(config: &'a AudioConfig) -> Self {
        Self { config }
    }

    /// Sample `count` files and place them within a video of `video_duration` seconds
    pub fn compose<R: Rng + ?Sized>(
        &self,
        session: &mut MediaSession,
        available: &[PathBuf],
        count: usize,
        video_duration: f64,
        rng: &mut R,
    ) -> Result<ComposedAudio> {
        let files = sample_with_padding(available, count, rng);
        info!("Compiling {} sounds...", files.len());

        let mut placements = Vec::new();
        let mut duplicates = 0;

        for (index, path) in files.iter().enumerate() {
            let before = placements.len();
            duplicates += self.place(session, path, video_duration, rng, &mut placements)?;
            debug!("{} {:?} -> {} placements", progress_bar(index + 1, files.len(), 20),
                   path.file_name().unwrap_or_default(), placements.len() - before);
        }

        info!("Finished compiling audio. Added {} duplicate sounds, total {}.",
              duplicates, placements.len());

        Ok(ComposedAudio { files, placements, duplicates })
    }

    /// Place one file, returning how many duplicates were added
    fn place<R: Rng + ?Sized>(
        &self,
        session: &mut MediaSession,
        path: &Path,
        video_duration: f64,
        rng: &mut R,
        placements: &mut Vec<AudioClip>,
    ) -> Result<usize> {
        let mut clip = session.load_audio(path)?.with_volume(self.config.volume);

        if clip.duration() > self.config.long_clip_threshold {
            let length = self.config.clip_length.draw(rng);
            if clip.duration() > length {
                let offset = rng.gen_range(0.0..=clip.duration() - length);
                let start = if rng.gen_bool(0.5) { offset } else { 0.0 };
                clip = clip.subclip(start, start + length);
            }

            let clip = fit_to(clip, video_duration);
            let position = draw_between(0.0, video_duration - clip.duration(), rng);
            placements.push(clip.at(position));
            return Ok(0);
        }

        let clip = fit_to(clip, video_duration);
        let duration = clip.duration();
        let base = draw_between(0.0, video_duration - duration, rng);
        placements.push(clip.clone().at(base));

        let spread = self.config.duplicate_spread;
        let copies = self.config.duplicates.draw(rng) as usize;
        for _ in 0..copies {
            let lo = (base - spread).max(0.0);
            let hi = ((base + spread).min(video_duration) - duration).max(lo);
            let position = draw_between(lo, hi, rng);
            placements.push(clip.clone().at(position).as_duplicate());
        }

        Ok(copies)
    }
}

/// Cut a clip down to the video length so that it can be placed at all
fn fit_to(clip: AudioClip, video_duration: f64) -> AudioClip {
    if clip.duration() > video_duration {
        clip.subclip(0.0, video_duration.max(0.0))
    } else {
        clip
    }
}
