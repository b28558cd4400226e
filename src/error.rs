//! Error types for the render pipeline

use crate::ConsoleMessage;
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, RenderError>;

/// Which bounded wait a timeout occurred in.
///
/// Container mount and chart-ready are distinct milestones with separate
/// bounds; failure reports name the stage that expired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitStage {
    /// Waiting for the chart container element to be mounted
    ContainerMount,
    /// Waiting for the chart-ready sentinel after the container exists
    ChartReady,
}

impl std::fmt::Display for WaitStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WaitStage::ContainerMount => write!(f, "container mount"),
            WaitStage::ChartReady => write!(f, "chart ready"),
        }
    }
}

/// Errors that can occur while rendering a chart
#[derive(Error, Debug)]
pub enum RenderError {
    /// Invalid input, reported before any surface is acquired
    #[error("Usage error: {0}")]
    Usage(String),

    /// Surface launch, navigation, or bundle/primitives loading failed
    #[error("Surface acquisition failed: {0}")]
    Acquisition(String),

    /// Chart construction threw inside the surface; carries the original
    /// error message verbatim
    #[error("Chart invocation failed: {0}")]
    Invocation(String),

    /// Completion was not signaled within the bounded wait
    #[error("Timed out waiting for {stage} after {waited_ms}ms")]
    Timeout { stage: WaitStage, waited_ms: u64 },

    /// Screenshot extraction failed after successful completion
    #[error("Capture failed: {0}")]
    Capture(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

// headless_chrome surfaces anyhow errors at its API boundary
impl From<anyhow::Error> for RenderError {
    fn from(err: anyhow::Error) -> Self {
        RenderError::Other(err.to_string())
    }
}

/// A failed pipeline run: the error itself plus best-effort diagnostics
/// collected before the surface was released.
///
/// Diagnostic collection can itself fail; that never masks the original
/// error, it just leaves `dom_snapshot` empty.
#[derive(Debug)]
pub struct RenderFailure {
    /// The failure kind and message
    pub error: RenderError,
    /// Outer HTML of the surface's document at failure time, if it could
    /// still be read
    pub dom_snapshot: Option<String>,
    /// Console messages emitted inside the surface up to the failure
    pub console: Vec<ConsoleMessage>,
}

impl RenderFailure {
    /// Wraps an error with no diagnostics attached.
    pub fn bare(error: RenderError) -> Self {
        Self {
            error,
            dom_snapshot: None,
            console: Vec::new(),
        }
    }
}

impl std::fmt::Display for RenderFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.error)?;
        if self.dom_snapshot.is_some() {
            write!(f, " (document snapshot captured)")?;
        }
        Ok(())
    }
}

impl std::error::Error for RenderFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

impl From<RenderError> for RenderFailure {
    fn from(error: RenderError) -> Self {
        RenderFailure::bare(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_reports_stage() {
        let container = RenderError::Timeout {
            stage: WaitStage::ContainerMount,
            waited_ms: 5_000,
        };
        let ready = RenderError::Timeout {
            stage: WaitStage::ChartReady,
            waited_ms: 5_000,
        };
        assert!(container.to_string().contains("container mount"));
        assert!(ready.to_string().contains("chart ready"));
        assert_ne!(container.to_string(), ready.to_string());
    }

    #[test]
    fn test_invocation_message_is_verbatim() {
        let err = RenderError::Invocation("boom from the page".to_string());
        assert!(err.to_string().ends_with("boom from the page"));
    }

    #[test]
    fn test_failure_display_mentions_snapshot() {
        let mut failure = RenderFailure::bare(RenderError::Capture("no data".into()));
        assert!(!failure.to_string().contains("snapshot"));
        failure.dom_snapshot = Some("<html></html>".to_string());
        assert!(failure.to_string().contains("snapshot"));
    }
}
