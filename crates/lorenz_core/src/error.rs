//! Stage-tagged failures for the simulation run.
//!
//! Every failure is fatal: errors are propagated to the entry point rather than retried
//! or swallowed, and each one records which stage of the run produced it.

use std::error::Error as StdError;
use std::fmt;
use thiserror::Error;

type BoxedSource = Box<dyn StdError + Send + Sync + 'static>;

/// The part of the run that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Configuration, initial-condition generation, solver or render-surface setup.
    Setup,
    /// Geometry computation or draw call for a single frame.
    FrameRender,
    /// Writing the finished animation to its destination.
    Export,
}

impl Stage {
    pub fn name(self) -> &'static str {
        match self {
            Stage::Setup => "setup",
            Stage::FrameRender => "frame render",
            Stage::Export => "export",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error)]
#[error("{stage} failed: {message}")]
pub struct LorenzError {
    stage: Stage,
    message: String,
    #[source]
    source: Option<BoxedSource>,
}

pub type Result<T, E = LorenzError> = std::result::Result<T, E>;

impl LorenzError {
    pub fn new(stage: Stage, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
            source: None,
        }
    }

    pub fn setup(message: impl Into<String>) -> Self {
        Self::new(Stage::Setup, message)
    }

    pub fn frame_render(frame: u64, message: impl Into<String>) -> Self {
        let message: String = message.into();
        Self::new(Stage::FrameRender, format!("frame {frame}: {message}"))
    }

    pub fn export(message: impl Into<String>) -> Self {
        Self::new(Stage::Export, message)
    }

    /// Attaches the underlying cause.
    pub fn with_source(mut self, source: impl Into<BoxedSource>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
