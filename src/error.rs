use thiserror::Error;

/// Main error type for the Chaos-Compositor library
#[derive(Error, Debug)]
pub enum CompositorError {
    #[error("Source inventory error: {0}")]
    Inventory(#[from] InventoryError),

    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    #[error("Composition error: {0}")]
    Composition(#[from] CompositionError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Input error: {0}")]
    Prompt(#[from] PromptError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Generic error: {0}")]
    Generic(String),
}

/// Errors raised while listing source directories
#[derive(Error, Debug)]
pub enum InventoryError {
    #[error("Source directory not found: {path}")]
    MissingDirectory { path: String },

    #[error("Source directory is empty: {path} ({requested} clips requested)")]
    EmptyDirectory { path: String, requested: usize },
}

/// Errors raised while opening or probing media sources
#[derive(Error, Debug)]
pub enum MediaError {
    #[error("Failed to load media file: {path}")]
    LoadFailed { path: String },

    #[error("Failed to probe {path}: {reason}")]
    ProbeFailed { path: String, reason: String },

    #[error("Media file has no usable duration: {path}")]
    NoDuration { path: String },

    #[error("Unknown media source id: {id}")]
    UnknownSource { id: usize },
}

/// Composition-specific errors
#[derive(Error, Debug)]
pub enum CompositionError {
    #[error("Nothing to render: {reason}")]
    NothingToRender { reason: String },

    #[error("Invalid composition parameters: {details}")]
    InvalidParameters { details: String },
}

/// Errors raised while compiling or running the final render
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("FFmpeg not found. Please install FFmpeg and make sure it is on PATH.")]
    FfmpegMissing,

    #[error("Filter graph compilation failed: {reason}")]
    GraphFailed { reason: String },

    #[error("Video encoding failed: {reason}")]
    EncodingFailed { reason: String },

    #[error("Render task failed: {reason}")]
    TaskFailed { reason: String },
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration file: {path}")]
    ParseFailed { path: String },

    #[error("Invalid configuration value: {key} = {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("Unknown preset: {name}")]
    UnknownPreset { name: String },
}

/// Interactive input errors
#[derive(Error, Debug)]
pub enum PromptError {
    #[error("Input closed before a valid answer was given to: {prompt}")]
    InputClosed { prompt: String },
}

/// Convenience type alias for Results using CompositorError
pub type Result<T> = std::result::Result<T, CompositorError>;

impl CompositorError {
    /// Create a generic error with a custom message
    pub fn generic<S: Into<String>>(message: S) -> Self {
        Self::Generic(message.into())
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Inventory(InventoryError::MissingDirectory { path }) => {
                format!("Source folder '{}' does not exist. Create it and drop some clips in.", path)
            }
            Self::Inventory(InventoryError::EmptyDirectory { path, .. }) => {
                format!("Source folder '{}' has no files to pick from.", path)
            }
            Self::Media(MediaError::LoadFailed { path }) => {
                format!("Could not load media file '{}'. Please check the file exists and is a supported format.", path)
            }
            Self::Render(RenderError::FfmpegMissing) => {
                "FFmpeg is required for rendering. Install it or run with --plan-only.".to_string()
            }
            Self::Config(ConfigError::FileNotFound { path }) => {
                format!("Configuration file '{}' not found.", path)
            }
            _ => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inventory_error_converts() {
        let err: CompositorError = InventoryError::MissingDirectory {
            path: "input_video_sources".to_string(),
        }
        .into();

        assert!(matches!(err, CompositorError::Inventory(_)));
        assert!(err.user_message().contains("input_video_sources"));
    }

    #[test]
    fn test_generic_message_falls_back_to_display() {
        let err = CompositorError::generic("boom");
        assert_eq!(err.user_message(), "Generic error: boom");
    }
}
