//! Pipeline orchestrator
//!
//! Sequences one render: acquire a surface, inject the invocation script,
//! await completion, capture, release. Steps run strictly sequentially;
//! the surface is released on every exit path, and failures carry a
//! best-effort document snapshot plus the surface's console backlog.
//! There are no automatic retries; replaying a request means re-running
//! the whole pipeline from the start.

use crate::capture::{self, CaptureRegion};
use crate::detect;
use crate::invoke::{self, ChartStyle};
use crate::surface::RenderSurface;
use crate::{RenderConfig, RenderError, RenderFailure, RenderRequest, RenderedChart, Result};
use log::{debug, warn};
use std::time::{Duration, Instant};

/// Renders one chart with the default styling.
pub fn render(
    request: &RenderRequest,
    config: &RenderConfig,
) -> std::result::Result<RenderedChart, RenderFailure> {
    render_with_style(request, &ChartStyle::default(), config)
}

/// Renders one chart with explicit styling.
///
/// The overall deadline, when configured, starts counting here so surface
/// acquisition spends from the same budget as the completion waits.
pub fn render_with_style(
    request: &RenderRequest,
    style: &ChartStyle,
    config: &RenderConfig,
) -> std::result::Result<RenderedChart, RenderFailure> {
    let deadline = config
        .deadline_ms
        .map(|ms| Instant::now() + Duration::from_millis(ms));

    // Acquisition failures have no surface to diagnose.
    let surface = RenderSurface::acquire(
        config,
        request.width,
        request.height,
        request.device_pixel_ratio,
    )
    .map_err(RenderFailure::bare)?;
    debug!("pipeline: surface acquired");

    match drive_surface(&surface, request, style, config, deadline) {
        Ok(chart) => {
            debug!("pipeline: completed");
            surface.release();
            Ok(chart)
        }
        Err(error) => {
            let failure = collect_diagnostics(&surface, error);
            surface.release();
            Err(failure)
        }
    }
}

// inject -> await -> capture, on an already-acquired surface.
fn drive_surface(
    surface: &RenderSurface,
    request: &RenderRequest,
    style: &ChartStyle,
    config: &RenderConfig,
    deadline: Option<Instant>,
) -> Result<RenderedChart> {
    let script = invoke::build_invocation_script(request, style);
    surface.evaluate(&script, false)?;
    debug!("pipeline: invocation injected");

    detect::await_completion(surface, config, deadline)?;

    let region = CaptureRegion::full_surface(surface);
    let png = capture::capture(surface, region)?;
    Ok(RenderedChart { png, region })
}

// Best-effort: a failure to collect diagnostics must not mask the
// original failure.
fn collect_diagnostics(surface: &RenderSurface, error: RenderError) -> RenderFailure {
    let dom_snapshot = match surface.document_snapshot() {
        Ok(html) => Some(html),
        Err(e) => {
            warn!("failed to collect document snapshot: {}", e);
            None
        }
    };
    RenderFailure {
        error,
        dom_snapshot,
        console: surface.console_messages(),
    }
}
