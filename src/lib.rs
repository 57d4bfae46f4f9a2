//! # Chaos-Compositor
//!
//! Randomized compilation videos from a folder of clips and a folder of sounds.
//!
//! A run samples video clips, trims them, puts random effects on some of
//! them, concatenates everything and scatters sounds over the result. Every
//! random decision comes from one seeded generator, so a seed and the same
//! source folders always reproduce the same video.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use chaos_compositor::{
//!     composition::CompositionEngine,
//!     config::Config,
//!     input::CompositionRequest,
//! };
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let engine = CompositionEngine::with_ffmpeg(Config::default());
//! let request = CompositionRequest { seed: 42, video_count: 20, effects: true };
//!
//! let outcome = engine.compose(&request).await?;
//! println!("Wrote {:?}", outcome.video.path);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`input`] - seed, clip count and effects toggle, prompted or given up front
//! - [`inventory`] - listing the source folders
//! - [`media`] - lazy clip edit trees and the backend that probes and renders them
//! - [`effects`] - the randomized video effects
//! - [`composition`] - sampling, trimming, audio placement and the pipeline
//! - [`render`] - compiling the edit tree into an ffmpeg filter graph
//! - [`config`] - configuration and presets

pub mod composition;
pub mod config;
pub mod effects;
pub mod error;
pub mod input;
pub mod inventory;
pub mod media;
pub mod progress;
pub mod render;

// Re-export commonly used types for convenience
pub use crate::{
    composition::{CompositionEngine, CompositionPlan},
    config::{Config, Preset},
    effects::{Effect, EffectKind},
    error::{CompositorError, Result},
    input::CompositionRequest,
    media::{Clip, MediaBackend},
};
