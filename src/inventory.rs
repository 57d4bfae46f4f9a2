//! # Source Inventory
//!
//! Lists the files a run can sample from.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{InventoryError, Result};

/// Video and audio files available to a run, each list sorted by path
#[derive(Debug, Clone, Default)]
pub struct SourceInventory {
    pub videos: Vec<PathBuf>,
    pub audio: Vec<PathBuf>,
}

impl SourceInventory {
    /// Scan both source directories.
    ///
    /// A directory is only required to exist and be non-empty when clips are
    /// actually requested from it.
    pub fn scan<P: AsRef<Path>>(
        video_dir: P,
        audio_dir: P,
        video_count: usize,
        audio_count: usize,
    ) -> Result<Self> {
        let videos = list_required(video_dir.as_ref(), video_count)?;
        let audio = list_required(audio_dir.as_ref(), audio_count)?;

        info!("Found {} videos and {} sounds", videos.len(), audio.len());
        Ok(Self { videos, audio })
    }
}

fn list_required(directory: &Path, requested: usize) -> Result<Vec<PathBuf>> {
    if !directory.is_dir() {
        if requested == 0 {
            return Ok(Vec::new());
        }
        return Err(InventoryError::MissingDirectory {
            path: directory.display().to_string(),
        }.into());
    }

    let files = list_files(directory)?;
    if files.is_empty() && requested > 0 {
        return Err(InventoryError::EmptyDirectory {
            path: directory.display().to_string(),
            requested,
        }.into());
    }

    Ok(files)
}

/// Non-recursive listing of the regular, non-hidden files in `directory`
pub fn list_files<P: AsRef<Path>>(directory: P) -> Result<Vec<PathBuf>> {
    let directory = directory.as_ref();
    let mut files = Vec::new();

    for entry in std::fs::read_dir(directory)? {
        let path = entry?.path();

        if path.is_file() && !is_hidden_file(&path) {
            files.push(path);
        } else {
            debug!("Skipping {:?}", path);
        }
    }

    files.sort();
    Ok(files)
}

fn is_hidden_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}
