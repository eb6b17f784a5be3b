//! Error types.
//!
//! Two layers:
//!
//! - `CompositeError` / `PipelineError`: typed failures of the compositing core.
//!   Every variant carries enough data for a caller to decide what to do
//!   (source id, offending shapes, degenerate range).
//! - `AppError`: what the `udf` binary reports (message + process exit code).

use thiserror::Error;

use crate::domain::{Channel, Shape, Stage};

/// Failure of a single core operation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompositeError {
    /// The loader could not locate or open the source.
    #[error("source '{source_id}' not found: {reason}")]
    SourceNotFound { source_id: String, reason: String },

    /// The source was opened but its bytes are not a readable 2-D grid.
    #[error("source '{source_id}' is not a readable grid: {reason}")]
    CorruptData { source_id: String, reason: String },

    /// The grid has no dynamic range to scale.
    ///
    /// `constant` is `None` when the grid holds no finite value at all.
    #[error("{}", describe_degenerate(.constant))]
    DegenerateRange { constant: Option<f64> },

    /// A requested grid shape has a zero dimension.
    #[error("invalid target shape {rows}x{cols}: both dimensions must be >= 1")]
    InvalidShape { rows: usize, cols: usize },

    /// Channels handed to the compositor disagree on shape.
    #[error("channel shapes are not stackable: red={red}, green={green}, blue={blue}")]
    ShapeMismatch { red: Shape, green: Shape, blue: Shape },

    /// The fill value for undefined cells would break the [0, 1] invariant.
    #[error("fill value {0} is outside [0, 1]")]
    InvalidFill(f64),
}

fn describe_degenerate(constant: &Option<f64>) -> String {
    match constant {
        Some(v) => format!("degenerate range: every finite sample equals {v}"),
        None => "degenerate range: grid has no finite samples".to_string(),
    }
}

impl CompositeError {
    /// Exit code used by the binary when this error ends a run.
    pub fn exit_code(&self) -> u8 {
        match self {
            CompositeError::SourceNotFound { .. } | CompositeError::InvalidFill(_) => 2,
            CompositeError::CorruptData { .. } | CompositeError::DegenerateRange { .. } => 3,
            CompositeError::InvalidShape { .. } | CompositeError::ShapeMismatch { .. } => 4,
        }
    }
}

/// A core failure tagged with the pipeline stage and channel it came from.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{stage} stage failed{}: {error}", channel_suffix(.channel))]
pub struct PipelineError {
    pub stage: Stage,
    pub channel: Option<Channel>,
    #[source]
    pub error: CompositeError,
}

fn channel_suffix(channel: &Option<Channel>) -> String {
    channel
        .map(|c| format!(" for {c} channel"))
        .unwrap_or_default()
}

impl PipelineError {
    pub fn new(stage: Stage, channel: Option<Channel>, error: CompositeError) -> Self {
        Self { stage, channel, error }
    }

    pub fn for_channel(stage: Stage, channel: Channel, error: CompositeError) -> Self {
        Self::new(stage, Some(channel), error)
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        AppError::new(err.error.exit_code(), err.to_string())
    }
}

impl From<CompositeError> for AppError {
    fn from(err: CompositeError) -> Self {
        AppError::new(err.exit_code(), err.to_string())
    }
}
