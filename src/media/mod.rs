//! # Media
//!
//! Opening sources and describing edits on them.
//!
//! Clips are lazy edit trees ([`Clip`], [`AudioClip`]); a [`MediaBackend`]
//! probes files while the composition is planned and renders the finished
//! tree at the end. A [`MediaSession`] owns every handle opened for a run.

pub mod backend;
pub mod clip;
pub mod probe;
pub mod session;

#[cfg(test)]
pub(crate) mod fake;

pub use backend::{EncodedVideo, FfmpegBackend, MediaBackend, SourceKind};
pub use clip::{AudioClip, Clip, SourceId};
pub use probe::MediaInfo;
pub use session::{MediaSession, OpenSource};
