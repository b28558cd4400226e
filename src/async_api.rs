//! Async facade over the render pipeline
//!
//! The pipeline itself is synchronous (the CDP transport blocks), so each
//! async render is backed by a dedicated worker thread that owns the whole
//! run and resolves a oneshot channel. Concurrent renders each acquire
//! their own surface; nothing is shared between them.

use crate::{pipeline, RenderConfig, RenderError, RenderFailure, RenderRequest, RenderedChart};
use std::thread;
use std::time::Duration;
use tokio::sync::oneshot;

/// Renders one chart on a dedicated worker thread.
pub async fn render(
    request: RenderRequest,
    config: RenderConfig,
) -> Result<RenderedChart, RenderFailure> {
    let rx = spawn_render_worker(request, config);
    rx.await.map_err(|e| {
        RenderFailure::bare(RenderError::Other(format!("render worker vanished: {}", e)))
    })?
}

/// Renders one chart under an overall deadline.
///
/// The deadline is threaded into the pipeline config, so an expired
/// deadline cancels the in-flight completion wait on the worker and the
/// surface is released there; the facade-level timeout is only a backstop
/// for a worker stuck in an unclippable step, with the launch bound as
/// grace.
pub async fn render_with_deadline(
    request: RenderRequest,
    mut config: RenderConfig,
    deadline: Duration,
) -> Result<RenderedChart, RenderFailure> {
    config.deadline_ms = Some(deadline.as_millis() as u64);
    let backstop = deadline + Duration::from_millis(config.launch_timeout_ms);

    let rx = spawn_render_worker(request, config);
    match tokio::time::timeout(backstop, rx).await {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => Err(RenderFailure::bare(RenderError::Other(format!(
            "render worker vanished: {}",
            e
        )))),
        Err(_) => Err(RenderFailure::bare(RenderError::Other(format!(
            "render did not finish within {}ms (deadline plus launch grace)",
            backstop.as_millis()
        )))),
    }
}

type RenderResult = Result<RenderedChart, RenderFailure>;

fn spawn_render_worker(
    request: RenderRequest,
    config: RenderConfig,
) -> oneshot::Receiver<RenderResult> {
    let (tx, rx) = oneshot::channel();
    thread::spawn(move || {
        let result = pipeline::render(&request, &config);
        // The receiver may have been dropped by a backstop timeout; the
        // surface was already released by the pipeline either way.
        let _ = tx.send(result);
    });
    rx
}
