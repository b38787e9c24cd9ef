use thiserror::Error;

/// Analysis pipeline error kinds.
///
/// `error_type()` returns the wire name used in the stderr JSON contract,
/// so variants map 1:1 onto the orchestrator-facing error taxonomy.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("input video not found: {0}")]
    InputNotFound(String),

    #[error("input video could not be opened: {0}")]
    InputUnreadable(String),

    #[error("variable frame rate: declared {declared:.3} fps, measured {measured:.3} fps")]
    VariableFrameRate { declared: f64, measured: f64 },

    #[error("no frame produced a valid pose")]
    NoSubjectDetected,

    #[error("clip too short: {0} frames (minimum 3)")]
    ShortClip(usize),

    #[error("failed to write output: {0}")]
    OutputWrite(String),
}

impl AnalysisError {
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Config(_) => "ConfigError",
            Self::InputNotFound(_) => "InputNotFound",
            Self::InputUnreadable(_) => "InputUnreadable",
            Self::VariableFrameRate { .. } => "VariableFrameRate",
            Self::NoSubjectDetected => "NoSubjectDetected",
            Self::ShortClip(_) => "ShortClip",
            Self::OutputWrite(_) => "OutputWriteError",
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
