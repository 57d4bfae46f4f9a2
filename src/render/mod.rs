//! # Rendering
//!
//! Turns a composition plan into an ffmpeg invocation.
//!
//! - [`graph`] compiles the video edit tree and audio placements into a
//!   `-filter_complex` graph
//! - [`RenderJob`] bundles that graph with the encoder settings and output path

pub mod graph;

use std::path::{Path, PathBuf};

use crate::config::RenderConfig;

pub use graph::{compile, FilterGraph, GraphSettings};

/// Everything a backend needs to write the final file
#[derive(Debug, Clone)]
pub struct RenderJob {
    pub inputs: Vec<PathBuf>,
    pub filter_script: String,
    pub video_label: String,
    pub audio_label: String,
    pub output: PathBuf,
    pub fps: u32,
    pub audio_bitrate: String,
    pub video_codec: String,
    pub audio_codec: String,
    pub threads: usize,
    /// Expected duration of the result (seconds)
    pub duration: f64,
}

impl RenderJob {
    pub fn new(graph: FilterGraph, output: PathBuf, config: &RenderConfig, duration: f64) -> Self {
        Self {
            filter_script: graph.script(),
            inputs: graph.inputs,
            video_label: graph.video_label,
            audio_label: graph.audio_label,
            output,
            fps: config.fps,
            audio_bitrate: config.audio_bitrate.clone(),
            video_codec: config.video_codec.clone(),
            audio_codec: config.audio_codec.clone(),
            threads: config.threads,
            duration,
        }
    }

    /// ffmpeg arguments, given where the filter script was written
    pub fn ffmpeg_args(&self, script_path: &Path) -> Vec<String> {
        let mut args = vec![
            "-y".to_string(),
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
        ];
        for input in &self.inputs {
            args.push("-i".to_string());
            args.push(input.display().to_string());
        }
        args.extend([
            "-filter_complex_script".to_string(),
            script_path.display().to_string(),
            "-map".to_string(),
            format!("[{}]", self.video_label),
            "-map".to_string(),
            format!("[{}]", self.audio_label),
            "-r".to_string(),
            self.fps.to_string(),
            "-c:v".to_string(),
            self.video_codec.clone(),
            "-pix_fmt".to_string(),
            "yuv420p".to_string(),
            "-c:a".to_string(),
            self.audio_codec.clone(),
            "-b:a".to_string(),
            self.audio_bitrate.clone(),
            "-threads".to_string(),
            self.threads.to_string(),
            self.output.display().to_string(),
        ]);
        args
    }
}

/// Output name encoding the seed, clip count and effects flag
pub fn output_file_name(seed: u64, video_count: usize, effects: bool) -> String {
    format!(
        "result_seed-{}_{}{}.mp4",
        seed,
        video_count,
        if effects { "_effects" } else { "" }
    )
}

pub fn output_path<P: AsRef<Path>>(dir: P, seed: u64, video_count: usize, effects: bool) -> PathBuf {
    dir.as_ref().join(output_file_name(seed, video_count, effects))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_naming() {
        assert_eq!(output_file_name(42, 3, false), "result_seed-42_3.mp4");
        assert_eq!(output_file_name(7, 60, true), "result_seed-7_60_effects.mp4");
        assert_eq!(
            output_path("output", 1, 2, true),
            PathBuf::from("output/result_seed-1_2_effects.mp4")
        );
    }

    #[test]
    fn test_ffmpeg_args_map_graph_outputs() {
        let graph = FilterGraph {
            inputs: vec![PathBuf::from("a.mp4"), PathBuf::from("b.wav")],
            chains: vec!["[0:v]null[v1]".to_string()],
            video_label: "v1".to_string(),
            audio_label: "mix9".to_string(),
            canvas: (640, 480),
        };
        let job = RenderJob::new(graph, PathBuf::from("out.mp4"), &RenderConfig::default(), 4.0);

        let args = job.ffmpeg_args(Path::new("/tmp/graph.txt"));
        let joined = args.join(" ");

        assert!(joined.starts_with("-y -hide_banner"));
        assert!(joined.contains("-i a.mp4 -i b.wav"));
        assert!(joined.contains("-filter_complex_script /tmp/graph.txt"));
        assert!(joined.contains("-map [v1] -map [mix9]"));
        assert!(joined.contains("-r 30"));
        assert!(joined.contains("-b:a 96k"));
        assert_eq!(args.last().map(String::as_str), Some("out.mp4"));
    }
}
