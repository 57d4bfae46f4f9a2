use serde::{Deserialize, Serialize};

/// Index of an opened source inside a [`MediaSession`](crate::media::MediaSession)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceId(pub usize);

/// A video edit tree.
///
/// Nothing is decoded while a clip is built; the tree records which
/// operations to run and [`Clip::duration`] is derived from it. The renderer
/// turns the finished tree into an ffmpeg filter graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Clip {
    Source { id: SourceId, duration: f64 },
    Trim { clip: Box<Clip>, start: f64, end: f64 },
    Speed { clip: Box<Clip>, factor: f64 },
    MirrorX { clip: Box<Clip> },
    MirrorY { clip: Box<Clip> },
    Reverse { clip: Box<Clip> },
    Contrast { clip: Box<Clip>, contrast: f64, luminance: f64 },
    Concat { clips: Vec<Clip> },
}

impl Clip {
    pub fn source(id: SourceId, duration: f64) -> Self {
        Self::Source { id, duration: duration.max(0.0) }
    }

    /// Duration in seconds after every operation in the tree
    pub fn duration(&self) -> f64 {
        match self {
            Self::Source { duration, .. } => *duration,
            Self::Trim { start, end, .. } => end - start,
            Self::Speed { clip, factor } => clip.duration() / factor,
            Self::MirrorX { clip }
            | Self::MirrorY { clip }
            | Self::Reverse { clip }
            | Self::Contrast { clip, .. } => clip.duration(),
            Self::Concat { clips } => clips.iter().map(Clip::duration).sum(),
        }
    }

    /// Cut out `start..end`, clamped so that `0 <= start <= end <= duration`
    pub fn subclip(self, start: f64, end: f64) -> Self {
        let duration = self.duration();
        let start = start.clamp(0.0, duration);
        let end = end.clamp(start, duration);

        match self {
            // Trims of trims collapse into a single window on the inner clip
            Self::Trim { clip, start: outer, .. } => Self::Trim {
                clip,
                start: outer + start,
                end: outer + end,
            },
            clip => Self::Trim { clip: Box::new(clip), start, end },
        }
    }

    /// Play `factor` times faster
    pub fn speed(self, factor: f64) -> Self {
        Self::Speed { clip: Box::new(self), factor }
    }

    pub fn mirror_x(self) -> Self {
        Self::MirrorX { clip: Box::new(self) }
    }

    pub fn mirror_y(self) -> Self {
        Self::MirrorY { clip: Box::new(self) }
    }

    pub fn reversed(self) -> Self {
        Self::Reverse { clip: Box::new(self) }
    }

    /// Forward then backward
    pub fn symmetrized(self) -> Self {
        let backward = self.clone().reversed();
        Self::concat(vec![self, backward])
    }

    /// Each pixel value `x` (0-255) becomes `x + luminance + contrast * (x - 127)`
    pub fn contrast(self, contrast: f64, luminance: f64) -> Self {
        Self::Contrast { clip: Box::new(self), contrast, luminance }
    }

    pub fn concat(clips: Vec<Clip>) -> Self {
        Self::Concat { clips }
    }

    /// Visit every source leaf, once per use
    pub fn for_each_source<F: FnMut(SourceId)>(&self, visit: &mut F) {
        match self {
            Self::Source { id, .. } => visit(*id),
            Self::Trim { clip, .. }
            | Self::Speed { clip, .. }
            | Self::MirrorX { clip }
            | Self::MirrorY { clip }
            | Self::Reverse { clip }
            | Self::Contrast { clip, .. } => clip.for_each_source(visit),
            Self::Concat { clips } => {
                for clip in clips {
                    clip.for_each_source(visit);
                }
            }
        }
    }

    /// Number of source leaves in the tree
    pub fn leaf_count(&self) -> usize {
        let mut count = 0;
        self.for_each_source(&mut |_| count += 1);
        count
    }
}

/// An audio clip placed on the timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioClip {
    pub source: SourceId,

    /// Window of the source that is played (seconds)
    pub trim_start: f64,
    pub trim_end: f64,

    pub volume: f64,

    /// Offset from the start of the composed video (seconds)
    pub start: f64,

    /// Whether this is a near-duplicate of another placement
    pub duplicate: bool,
}

impl AudioClip {
    pub fn new(source: SourceId, duration: f64) -> Self {
        Self {
            source,
            trim_start: 0.0,
            trim_end: duration.max(0.0),
            volume: 1.0,
            start: 0.0,
            duplicate: false,
        }
    }

    pub fn duration(&self) -> f64 {
        self.trim_end - self.trim_start
    }

    /// Timeline offset at which this clip stops playing
    pub fn end(&self) -> f64 {
        self.start + self.duration()
    }

    pub fn with_volume(mut self, factor: f64) -> Self {
        self.volume *= factor;
        self
    }

    /// Cut `start..end` out of the current window, clamped to it
    pub fn subclip(mut self, start: f64, end: f64) -> Self {
        let duration = self.duration();
        let start = start.clamp(0.0, duration);
        let end = end.clamp(start, duration);
        self.trim_end = self.trim_start + end;
        self.trim_start += start;
        self
    }

    pub fn at(mut self, start: f64) -> Self {
        self.start = start;
        self
    }

    pub fn as_duplicate(mut self) -> Self {
        self.duplicate = true;
        self
    }
}
