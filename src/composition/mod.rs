//! # Composition
//!
//! Turns a [`CompositionRequest`](crate::input::CompositionRequest) into a
//! plan and renders it.
//!
//! - [`sampling`] - picking files with and without replacement
//! - [`video`] - trimming, effects and concatenation
//! - [`audio`] - random placement of sounds and their near-duplicates
//! - [`engine`] - the pipeline tying the steps together

pub mod audio;
pub mod engine;
pub mod sampling;
pub mod video;

// Re-exports for convenience
pub use audio::{AudioCompositor, ComposedAudio};
pub use engine::{CompositionEngine, CompositionPlan, RenderOutcome};
pub use video::{ComposedVideo, VideoCompositor, VideoSegment};
