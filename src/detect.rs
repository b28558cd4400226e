//! Completion detector
//!
//! The chart draws asynchronously inside the surface with no push-based
//! completion callback, so progress is observed from outside as a sequence
//! of bounded polls: first for the container element, then for the ready
//! sentinel, each with its own budget because container mount and
//! chart-ready are distinct milestones. An error signal observed at any
//! point short-circuits the wait. After the sentinel appears, a fixed
//! settle delay covers deferred visual updates before completion is
//! reported.

use crate::invoke::{CONTAINER_ID, ERROR_SIGNAL_ID, READY_SENTINEL_ID};
use crate::{RenderConfig, RenderError, RenderSurface, Result, WaitStage};
use log::debug;
use std::time::{Duration, Instant};

/// Waits until the surface signals completion, an error, or a timeout.
///
/// `deadline` is the overall pipeline deadline; when it is closer than a
/// stage's own budget, the stage wait is clipped so an expired deadline
/// cancels the in-flight wait instead of letting it run to its full bound.
pub fn await_completion(
    surface: &RenderSurface,
    config: &RenderConfig,
    deadline: Option<Instant>,
) -> Result<()> {
    wait_for_marker(
        surface,
        WaitStage::ContainerMount,
        &element_probe(CONTAINER_ID),
        config.container_timeout_ms,
        config.poll_interval_ms,
        deadline,
    )?;
    debug!("container mounted");

    wait_for_marker(
        surface,
        WaitStage::ChartReady,
        &element_probe(READY_SENTINEL_ID),
        config.chart_ready_timeout_ms,
        config.poll_interval_ms,
        deadline,
    )?;
    debug!("chart ready, settling for {}ms", config.settle_delay_ms);

    // The sentinel is appended before deferred visual work (transitions)
    // necessarily finished; give the surface a fixed settle window.
    let settle = Duration::from_millis(config.settle_delay_ms);
    std::thread::sleep(clip_to_deadline(settle, deadline));
    Ok(())
}

fn wait_for_marker(
    surface: &RenderSurface,
    stage: WaitStage,
    probe: &str,
    timeout_ms: u64,
    poll_interval_ms: u64,
    deadline: Option<Instant>,
) -> Result<()> {
    let started = Instant::now();
    let budget = Duration::from_millis(timeout_ms);

    loop {
        if let Some(message) = error_signal(surface)? {
            return Err(RenderError::Invocation(message));
        }
        if probe_is_true(surface, probe)? {
            return Ok(());
        }

        let elapsed = started.elapsed();
        let expired = elapsed >= budget
            || deadline.is_some_and(|d| Instant::now() >= d);
        if expired {
            return Err(RenderError::Timeout {
                stage,
                waited_ms: elapsed.as_millis() as u64,
            });
        }

        let pause = clip_to_deadline(
            Duration::from_millis(poll_interval_ms).min(budget - elapsed),
            deadline,
        );
        std::thread::sleep(pause);
    }
}

// Non-empty text in the error element is the error signal; its content is
// the thrown message, reported verbatim.
fn error_signal(surface: &RenderSurface) -> Result<Option<String>> {
    let probe = format!(
        "(function() {{ var e = document.getElementById('{}'); return e && e.textContent ? e.textContent : ''; }})()",
        ERROR_SIGNAL_ID
    );
    match surface.evaluate(&probe, false)? {
        Some(serde_json::Value::String(text)) if !text.is_empty() => Ok(Some(text)),
        _ => Ok(None),
    }
}

fn probe_is_true(surface: &RenderSurface, probe: &str) -> Result<bool> {
    Ok(matches!(
        surface.evaluate(probe, false)?,
        Some(serde_json::Value::Bool(true))
    ))
}

fn element_probe(id: &str) -> String {
    format!("document.getElementById('{}') !== null", id)
}

// Never sleep past the overall deadline.
fn clip_to_deadline(pause: Duration, deadline: Option<Instant>) -> Duration {
    match deadline {
        Some(d) => pause.min(d.saturating_duration_since(Instant::now())),
        None => pause,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probes_reference_the_marker_elements() {
        assert!(element_probe(CONTAINER_ID).contains(CONTAINER_ID));
        assert!(element_probe(READY_SENTINEL_ID).contains(READY_SENTINEL_ID));
    }

    #[test]
    fn test_clip_to_deadline_passes_through_without_deadline() {
        let pause = Duration::from_millis(100);
        assert_eq!(clip_to_deadline(pause, None), pause);
    }

    #[test]
    fn test_clip_to_deadline_shortens_the_pause() {
        let pause = Duration::from_millis(10_000);
        let deadline = Some(Instant::now() + Duration::from_millis(50));
        assert!(clip_to_deadline(pause, deadline) <= Duration::from_millis(50));
    }

    #[test]
    fn test_clip_to_deadline_is_zero_after_expiry() {
        let deadline = Some(Instant::now() - Duration::from_millis(1));
        assert_eq!(
            clip_to_deadline(Duration::from_millis(100), deadline),
            Duration::ZERO
        );
    }
}
