use std::path::PathBuf;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{debug, info};

use crate::{
    config::Config,
    error::{CompositionError, RenderError, Result},
    input::CompositionRequest,
    inventory::SourceInventory,
    media::{AudioClip, Clip, EncodedVideo, FfmpegBackend, MediaBackend, MediaSession, OpenSource},
    render::{self, GraphSettings, RenderJob},
};

use super::audio::AudioCompositor;
use super::video::{VideoCompositor, VideoSegment};

/// Everything decided for one run, before anything is rendered
#[derive(Debug, Clone, Serialize)]
pub struct CompositionPlan {
    pub seed: u64,
    pub video_count: usize,
    pub effects: bool,
    pub audio_count: usize,

    pub video_files: Vec<PathBuf>,
    pub segments: Vec<VideoSegment>,
    pub timeline: Clip,

    pub audio_files: Vec<PathBuf>,
    pub audio: Vec<AudioClip>,
    pub duplicates: usize,

    /// Sources referenced by `timeline` and `audio`, indexed by `SourceId`
    pub sources: Vec<OpenSource>,

    /// Final duration in seconds
    pub duration: f64,
    pub output: PathBuf,
}

/// A finished run
#[derive(Debug, Clone)]
pub struct RenderOutcome {
    pub plan: CompositionPlan,
    pub video: EncodedVideo,
}

/// Main composition engine.
///
/// The engine follows a fixed pipeline, every random decision drawn from one
/// generator seeded with the request's seed:
/// 1. Inventory - list the video and audio sources
/// 2. Video - sample, trim and effect clips, concatenate them
/// 3. Audio - sample sounds and place them over the video
/// 4. Render - compile the filter graph and run the encoder
pub struct CompositionEngine {
    config: Config,
    backend: Arc<dyn MediaBackend>,
}

impl CompositionEngine {
    pub fn new(config: Config, backend: Arc<dyn MediaBackend>) -> Self {
        Self { config, backend }
    }

    /// Engine backed by the system's ffmpeg
    pub fn with_ffmpeg(config: Config) -> Self {
        Self::new(config, Arc::new(FfmpegBackend::new()))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Number of sounds laid over `video_count` clips
    pub fn audio_count(&self, video_count: usize) -> usize {
        (video_count as f64 * self.config.audio.amount_multiplier).round() as usize
    }

    /// Decide the whole composition without rendering
    pub fn plan_only(&self, request: &CompositionRequest) -> Result<CompositionPlan> {
        let mut session = MediaSession::new(Arc::clone(&self.backend));
        let plan = self.plan(request, &mut session);
        let released = session.close();
        debug!("Planning released {} sources", released);
        plan
    }

    /// Run the pipeline and write the output file.
    ///
    /// Every opened source is released before this returns, whether or not
    /// the render succeeded.
    pub async fn compose(&self, request: &CompositionRequest) -> Result<RenderOutcome> {
        info!("🎬 Starting composition (seed {})", request.seed);

        let mut session = MediaSession::new(Arc::clone(&self.backend));
        let result = self.plan_and_render(request, &mut session).await;
        let released = session.close();
        debug!("Released {} sources", released);

        result
    }

    async fn plan_and_render(
        &self,
        request: &CompositionRequest,
        session: &mut MediaSession,
    ) -> Result<RenderOutcome> {
        let plan = self.plan(request, session)?;

        if plan.timeline.leaf_count() == 0 || plan.duration <= 0.0 {
            return Err(CompositionError::NothingToRender {
                reason: format!("{} clips with a total length of {:.2}s",
                                plan.video_count, plan.duration),
            }.into());
        }

        info!("🎞️  Step 4: Rendering {:.2}s of video...", plan.duration);

        if let Some(dir) = plan.output.parent() {
            std::fs::create_dir_all(dir)?;
        }

        let settings = GraphSettings {
            target_height: self.config.video.target_height,
            fps: self.config.render.fps,
            sample_rate: self.config.render.sample_rate,
        };
        let graph = render::compile(&plan.timeline, &plan.audio, session.sources(), &settings)?;
        debug!("Canvas {}x{}", graph.canvas.0, graph.canvas.1);

        let job = RenderJob::new(graph, plan.output.clone(), &self.config.render, plan.duration);
        let backend = session.backend();
        let video = tokio::task::spawn_blocking(move || backend.render(&job))
            .await
            .map_err(|e| RenderError::TaskFailed { reason: e.to_string() })??;

        info!("   ✅ Output generation complete:");
        info!("      File saved: {:?}", video.path);
        info!("      Duration: {:.1}s", video.duration);
        info!("      File size: {:.1} MB", video.file_size as f64 / 1024.0 / 1024.0);

        Ok(RenderOutcome { plan, video })
    }

    /// Steps 1-3, opening sources through `session`
    pub fn plan(&self, request: &CompositionRequest, session: &mut MediaSession) -> Result<CompositionPlan> {
        let audio_count = self.audio_count(request.video_count);
        let sources = &self.config.sources;

        info!("📂 Step 1: Scanning sources...");
        let inventory = SourceInventory::scan(
            &sources.video_dir,
            &sources.audio_dir,
            request.video_count,
            audio_count,
        )?;

        let mut rng = StdRng::seed_from_u64(request.seed);

        info!("📹 Step 2: Composing {} video clips...", request.video_count);
        let video = VideoCompositor::new(&self.config.video, &self.config.effects).compose(
            session,
            &inventory.videos,
            request.video_count,
            request.effects,
            &mut rng,
        )?;
        let duration = video.duration();

        info!("🎵 Step 3: Placing {} sounds over {:.2}s...", audio_count, duration);
        let audio = AudioCompositor::new(&self.config.audio).compose(
            session,
            &inventory.audio,
            audio_count,
            duration,
            &mut rng,
        )?;

        let output = render::output_path(
            &sources.output_dir,
            request.seed,
            request.video_count,
            request.effects,
        );

        Ok(CompositionPlan {
            seed: request.seed,
            video_count: request.video_count,
            effects: request.effects,
            audio_count,
            video_files: video.files,
            segments: video.segments,
            timeline: video.timeline,
            audio_files: audio.files,
            audio: audio.placements,
            duplicates: audio.duplicates,
            sources: session.sources().to_vec(),
            duration,
            output,
        })
    }
}
