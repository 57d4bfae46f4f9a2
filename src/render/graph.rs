// src/render/graph.rs - Edit tree to ffmpeg filter graph

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use tracing::debug;

use crate::error::{RenderError, Result};
use crate::media::{AudioClip, Clip, OpenSource, SourceId};

/// Output settings the graph normalizes every stream to
#[derive(Debug, Clone)]
pub struct GraphSettings {
    pub target_height: u32,
    pub fps: u32,
    pub sample_rate: u32,
}

/// A compiled filter graph ready for `ffmpeg -filter_complex_script`
#[derive(Debug, Clone)]
pub struct FilterGraph {
    /// Input files in `-i` order
    pub inputs: Vec<PathBuf>,

    /// Filter chains, one per line
    pub chains: Vec<String>,

    pub video_label: String,
    pub audio_label: String,

    /// Canvas every video source is padded to
    pub canvas: (u32, u32),
}

impl FilterGraph {
    /// The graph as script text, chains separated by `;`
    pub fn script(&self) -> String {
        self.chains.join(";\n")
    }
}

/// Whether an input is read for its picture (and soundtrack) or as an overlay sound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
enum InputRole {
    Video,
    Overlay,
}

/// Compile the composed video and audio placements into one filter graph.
///
/// The video's own soundtrack follows every edit (trim, speed, reverse,
/// concat) and is mixed with the overlay sounds. Sources without an audio
/// stream contribute silence.
pub fn compile(
    video: &Clip,
    overlays: &[AudioClip],
    sources: &[OpenSource],
    settings: &GraphSettings,
) -> Result<FilterGraph> {
    if video.leaf_count() == 0 {
        return Err(RenderError::GraphFailed {
            reason: "the composed video has no clips".to_string(),
        }.into());
    }

    let mut builder = GraphBuilder::new(sources, settings);
    builder.register_video(video)?;
    for overlay in overlays {
        builder.register_overlay(overlay.source)?;
    }
    builder.emit_source_chains();

    let (timeline, soundtrack) = builder.compile_clip(video)?;
    let video_label = builder.finish_video(&timeline, video.duration());
    let audio_label = builder.mix(soundtrack, overlays)?;

    debug!("Compiled filter graph: {} inputs, {} chains",
           builder.inputs.len(), builder.chains.len());

    Ok(FilterGraph {
        inputs: builder.inputs,
        chains: builder.chains,
        video_label,
        audio_label,
        canvas: builder.canvas,
    })
}

struct GraphBuilder<'a> {
    sources: &'a [OpenSource],
    settings: &'a GraphSettings,
    inputs: Vec<PathBuf>,
    /// First source opened for each input
    input_sources: Vec<SourceId>,
    input_index: HashMap<(PathBuf, InputRole), usize>,
    /// How many times each input is consumed
    uses: BTreeMap<(usize, InputRole), usize>,
    /// Split outputs not yet consumed, per input
    video_taps: HashMap<usize, Vec<String>>,
    sound_taps: HashMap<usize, Vec<String>>,
    overlay_taps: HashMap<usize, Vec<String>>,
    chains: Vec<String>,
    canvas: (u32, u32),
    next_label: usize,
}

impl<'a> GraphBuilder<'a> {
    fn new(sources: &'a [OpenSource], settings: &'a GraphSettings) -> Self {
        Self {
            sources,
            settings,
            inputs: Vec::new(),
            input_sources: Vec::new(),
            input_index: HashMap::new(),
            uses: BTreeMap::new(),
            video_taps: HashMap::new(),
            sound_taps: HashMap::new(),
            overlay_taps: HashMap::new(),
            chains: Vec::new(),
            canvas: (0, settings.target_height),
            next_label: 0,
        }
    }

    fn source(&self, id: SourceId) -> Result<&'a OpenSource> {
        self.sources.get(id.0).ok_or_else(|| {
            RenderError::GraphFailed {
                reason: format!("unknown source id {}", id.0),
            }
            .into()
        })
    }

    fn input_for(&mut self, id: SourceId, role: InputRole) -> Result<usize> {
        let path = self.source(id)?.path.clone();
        let next = self.inputs.len();
        let index = *self.input_index.entry((path.clone(), role)).or_insert(next);
        if index == next {
            self.inputs.push(path);
            self.input_sources.push(id);
        }
        *self.uses.entry((index, role)).or_insert(0) += 1;
        Ok(index)
    }

    fn register_video(&mut self, video: &Clip) -> Result<()> {
        let mut ids = Vec::new();
        video.for_each_source(&mut |id| ids.push(id));

        for id in ids {
            self.input_for(id, InputRole::Video)?;
            let width = self.scaled_width(self.source(id)?);
            self.canvas.0 = self.canvas.0.max(width);
        }
        Ok(())
    }

    fn register_overlay(&mut self, id: SourceId) -> Result<()> {
        self.input_for(id, InputRole::Overlay)?;
        Ok(())
    }

    /// Width after scaling to the target height, rounded to an even number
    fn scaled_width(&self, source: &OpenSource) -> u32 {
        let height = self.settings.target_height as f64;
        let width = match (source.info.width, source.info.height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => w as f64 * height / h as f64,
            _ => height * 16.0 / 9.0,
        };
        ((width / 2.0).round() as u32).max(1) * 2
    }

    fn label(&mut self, prefix: &str) -> String {
        self.next_label += 1;
        format!("{}{}", prefix, self.next_label)
    }

    fn split_outputs(&mut self, prefix: &str, count: usize) -> Vec<String> {
        (0..count).map(|_| self.label(prefix)).collect()
    }

    fn audio_format(&self) -> String {
        format!(
            "aformat=sample_fmts=fltp:sample_rates={}:channel_layouts=stereo",
            self.settings.sample_rate
        )
    }

    /// Decode-side chains: normalize each input once, then split it per use
    fn emit_source_chains(&mut self) {
        let uses: Vec<((usize, InputRole), usize)> =
            self.uses.iter().map(|(k, v)| (*k, *v)).collect();

        for ((index, role), count) in uses {
            let sources = self.sources;
            let source = &sources[self.input_sources[index].0];
            let audio_format = self.audio_format();

            match role {
                InputRole::Video => {
                    let (canvas_w, canvas_h) = self.canvas;
                    let taps = self.split_outputs("v", count);
                    // No frame-rate change here: windows are cut on source timestamps
                    let picture = format!(
                        "[{}:v]setpts=PTS-STARTPTS,scale=-2:{},setsar=1,pad={}:{}:(ow-iw)/2:(oh-ih)/2,format=yuv420p,split={}{}",
                        index, canvas_h, canvas_w, canvas_h, count, brackets(&taps)
                    );
                    self.chains.push(picture);
                    self.video_taps.insert(index, taps);

                    let taps = self.split_outputs("s", count);
                    let head = if source.info.has_audio {
                        format!("[{}:a]asetpts=PTS-STARTPTS,{}", index, audio_format)
                    } else {
                        format!("anullsrc=r={}:cl=stereo,{}", self.settings.sample_rate, audio_format)
                    };
                    let soundtrack = format!(
                        "{},apad,atrim=duration={:.6},asplit={}{}",
                        head, source.info.duration, count, brackets(&taps)
                    );
                    self.chains.push(soundtrack);
                    self.sound_taps.insert(index, taps);
                }
                InputRole::Overlay => {
                    let taps = self.split_outputs("o", count);
                    let sound = format!(
                        "[{}:a]asetpts=PTS-STARTPTS,{},asplit={}{}",
                        index, audio_format, count, brackets(&taps)
                    );
                    self.chains.push(sound);
                    self.overlay_taps.insert(index, taps);
                }
            }
        }
    }

    fn take_tap(taps: &mut HashMap<usize, Vec<String>>, index: usize) -> Result<String> {
        taps.get_mut(&index).and_then(Vec::pop).ok_or_else(|| {
            RenderError::GraphFailed {
                reason: format!("input {} used more often than registered", index),
            }
            .into()
        })
    }

    /// Push `[input]filter[output]` and return the output label
    fn chain(&mut self, input: &str, filter: &str, prefix: &str) -> String {
        let output = self.label(prefix);
        self.chains.push(format!("[{}]{}[{}]", input, filter, output));
        output
    }

    /// Unprocessed split outputs of a source
    fn source_taps(&mut self, id: SourceId) -> Result<(String, String)> {
        let index = self.input_for_lookup(id)?;
        let video = Self::take_tap(&mut self.video_taps, index)?;
        let sound = Self::take_tap(&mut self.sound_taps, index)?;
        Ok((video, sound))
    }

    /// Cut `start..end` out of a video stream whose first frame is at 0.
    ///
    /// The output starts with the frame on screen at `start`, placed at 0, and
    /// has no frame at or after `end - start`. Its length is therefore exact
    /// even when the window is shorter than one frame.
    fn window(&mut self, input: &str, start: f64, end: f64) -> String {
        let length = (end - start).max(MIN_WINDOW);
        let filter = format!(
            "trim=end={:.6},setpts=PTS-{:.6}/TB,tpad=stop_mode=clone:stop_duration={:.6},fps=fps={}:start_time=0,trim=duration={:.6}",
            end, start, length, self.settings.fps, length
        );
        self.chain(input, &filter, "w")
    }

    /// Compile one node into (video label, soundtrack label).
    ///
    /// Every video label starts with a frame at 0 and ends before the node's
    /// duration; concatenation relies on it to place children by offset.
    fn compile_clip(&mut self, clip: &Clip) -> Result<(String, String)> {
        match clip {
            Clip::Source { id, duration } => {
                let (video, sound) = self.source_taps(*id)?;
                Ok((self.window(&video, 0.0, *duration), sound))
            }
            Clip::Trim { clip, start, end } => {
                let (video, sound) = match &**clip {
                    Clip::Source { id, .. } => self.source_taps(*id)?,
                    inner => self.compile_clip(inner)?,
                };
                let video = self.window(&video, *start, *end);
                let sound = self.chain(
                    &sound,
                    &format!("atrim=start={:.6}:end={:.6},asetpts=PTS-STARTPTS", start, end),
                    "ta",
                );
                Ok((video, sound))
            }
            Clip::Speed { clip, factor } => {
                let (video, sound) = self.compile_clip(clip)?;
                let video = self.chain(&video, &format!("setpts=PTS/{:.6}", factor), "sp");
                let sound = self.chain(&sound, &atempo_chain(*factor), "spa");
                Ok((video, sound))
            }
            Clip::MirrorX { clip } => {
                let (video, sound) = self.compile_clip(clip)?;
                Ok((self.chain(&video, "hflip", "mx"), sound))
            }
            Clip::MirrorY { clip } => {
                let (video, sound) = self.compile_clip(clip)?;
                Ok((self.chain(&video, "vflip", "my"), sound))
            }
            Clip::Reverse { clip } => {
                let (video, sound) = self.compile_clip(clip)?;
                let video = self.chain(&video, "reverse", "r");
                let sound = self.chain(&sound, "areverse", "ra");
                Ok((video, sound))
            }
            Clip::Contrast { clip, contrast, luminance } => {
                let (video, sound) = self.compile_clip(clip)?;
                Ok((self.chain(&video, &contrast_filter(*contrast, *luminance), "c"), sound))
            }
            Clip::Concat { clips } => {
                match clips.as_slice() {
                    [] => {
                        return Err(RenderError::GraphFailed {
                            reason: "cannot concatenate zero clips".to_string(),
                        }.into())
                    }
                    [only] => return self.compile_clip(only),
                    _ => {}
                }

                let mut videos = Vec::with_capacity(clips.len());
                let mut sounds = Vec::with_capacity(clips.len());
                let mut offset = 0.0;
                for child in clips {
                    let (video, sound) = self.compile_clip(child)?;
                    let length = child.duration();
                    if length <= 0.0 {
                        // Every split output must be consumed
                        self.chains.push(format!("[{}]nullsink", video));
                        self.chains.push(format!("[{}]anullsink", sound));
                        continue;
                    }
                    videos.push(self.chain(&video, &format!("setpts=PTS+{:.6}/TB", offset), "at"));
                    sounds.push(sound);
                    offset += length;
                }

                match (videos.len(), videos.first(), sounds.first()) {
                    (0, _, _) => Err(RenderError::GraphFailed {
                        reason: "every concatenated clip is empty".to_string(),
                    }.into()),
                    (1, Some(video), Some(sound)) => Ok((video.clone(), sound.clone())),
                    (count, _, _) => {
                        // Video frames carry their timeline offset, so merging by
                        // timestamp keeps every child at its exact planned length
                        let video = self.label("cv");
                        let sound = self.label("ca");
                        self.chains.push(format!(
                            "{}interleave=nb_inputs={}[{}]",
                            brackets(&videos), count, video
                        ));
                        self.chains.push(format!(
                            "{}concat=n={}:v=0:a=1[{}]",
                            brackets(&sounds), count, sound
                        ));
                        Ok((video, sound))
                    }
                }
            }
        }
    }

    /// Resample the finished timeline to the output frame rate and cut it to `duration`
    fn finish_video(&mut self, input: &str, duration: f64) -> String {
        let filter = format!(
            "fps=fps={},tpad=stop_mode=clone:stop_duration=1,trim=duration={:.6}",
            self.settings.fps,
            duration.max(MIN_WINDOW)
        );
        self.chain(input, &filter, "out")
    }

    fn input_for_lookup(&self, id: SourceId) -> Result<usize> {
        let path = &self.source(id)?.path;
        self.input_index
            .get(&(path.clone(), InputRole::Video))
            .copied()
            .ok_or_else(|| {
                RenderError::GraphFailed {
                    reason: format!("source {} was not registered", id.0),
                }
                .into()
            })
    }

    /// Layer the overlays on top of the soundtrack
    fn mix(&mut self, soundtrack: String, overlays: &[AudioClip]) -> Result<String> {
        if overlays.is_empty() {
            return Ok(soundtrack);
        }

        let mut pads = format!("[{}]", soundtrack);
        for overlay in overlays {
            let path = &self.source(overlay.source)?.path;
            let index = self
                .input_index
                .get(&(path.clone(), InputRole::Overlay))
                .copied()
                .ok_or_else(|| RenderError::GraphFailed {
                    reason: format!("overlay source {} was not registered", overlay.source.0),
                })?;
            let tap = Self::take_tap(&mut self.overlay_taps, index)?;

            let delay_ms = (overlay.start * 1000.0).round().max(0.0) as u64;
            let placed = self.chain(
                &tap,
                &format!(
                    "atrim=start={:.6}:end={:.6},asetpts=PTS-STARTPTS,volume={:.4},adelay={}:all=1",
                    overlay.trim_start, overlay.trim_end, overlay.volume, delay_ms
                ),
                "p",
            );
            pads.push_str(&format!("[{}]", placed));
        }

        let mixed = self.label("mix");
        self.chains.push(format!(
            "{}amix=inputs={}:duration=first:dropout_transition=0:normalize=0[{}]",
            pads,
            overlays.len() + 1,
            mixed
        ));
        Ok(mixed)
    }
}

/// Shortest window handed to `trim=duration`, which treats 0 as unset (seconds)
const MIN_WINDOW: f64 = 1e-6;

/// `eq` filter for a contrast boost of `contrast * (x - 127)` plus `luminance`
/// on the 0-255 scale, i.e. a gain of `1 + contrast`
fn contrast_filter(contrast: f64, luminance: f64) -> String {
    format!(
        "eq=contrast={:.6}:brightness={:.6}",
        1.0 + contrast,
        luminance / 255.0
    )
}

fn brackets(labels: &[String]) -> String {
    labels.iter().map(|l| format!("[{}]", l)).collect()
}

/// atempo only accepts factors in 0.5..=2.0 on older ffmpeg builds, so chain it
pub fn atempo_chain(factor: f64) -> String {
    let mut remaining = factor;
    let mut stages = Vec::new();
    while remaining > 2.0 {
        stages.push("atempo=2.0".to_string());
        remaining /= 2.0;
    }
    while remaining < 0.5 {
        stages.push("atempo=0.5".to_string());
        remaining /= 0.5;
    }
    stages.push(format!("atempo={:.6}", remaining));
    stages.join(",")
}
