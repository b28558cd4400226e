//! Chartshot
//!
//! Renders cartesian line/scatter chart definitions to fixed-size PNG images
//! by driving an off-screen Chrome instance. A prebuilt visualization bundle
//! is injected into an isolated page, a chart is constructed from JSON data
//! and style options, completion is detected from outside the page, and the
//! result is captured as a high-resolution screenshot.
//!
//! # Pipeline
//!
//! - **Surface**: launch an isolated browser page, load drawing primitives
//!   and the chart bundle ([`surface`])
//! - **Invocation**: generate the in-page script that mounts the chart
//!   ([`invoke`])
//! - **Detection**: wait for the ready sentinel or an error signal
//!   ([`detect`])
//! - **Capture**: screenshot the full allocated surface ([`capture`])
//! - **Orchestration**: sequence the above and guarantee teardown
//!   ([`pipeline`])
//!
//! # Example
//!
//! ```no_run
//! use chartshot::{DataPoint, RenderConfig, RenderRequest};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let request = RenderRequest::new(
//!     vec![DataPoint { x: 0.0, y: 0.0 }, DataPoint { x: 1.0, y: 2.0 }],
//!     800,
//!     600,
//!     1.0,
//! )?;
//! let chart = chartshot::pipeline::render(&request, &RenderConfig::default())?;
//! std::fs::write("chart.png", &chart.png)?;
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub mod error;
pub use error::{RenderError, RenderFailure, Result, WaitStage};

pub mod bundle;
pub mod capture;
pub mod detect;
pub mod invoke;
pub mod pipeline;
pub mod surface;

// Async-friendly facade (worker-thread backed, one surface per request)
pub mod async_api;

pub use capture::CaptureRegion;
pub use invoke::ChartStyle;
pub use surface::RenderSurface;

/// Extra visible area allocated on each side of the chart, in CSS pixels.
///
/// The rendering surface always exceeds the requested chart size by this
/// margin so presentational framing (card background, shadow, rounded
/// corners) is never clipped. The capture region includes it.
pub const SURFACE_MARGIN_PX: u32 = 40;

/// Bounded wait for the chart container element to appear.
pub const CONTAINER_TIMEOUT_MS: u64 = 5_000;

/// Bounded wait for the chart-ready sentinel, after the container exists.
pub const CHART_READY_TIMEOUT_MS: u64 = 5_000;

/// Fixed settle delay after the sentinel is observed, covering deferred
/// visual updates such as transition completion.
pub const SETTLE_DELAY_MS: u64 = 1_000;

/// Interval between observation polls of the rendering surface.
pub const POLL_INTERVAL_MS: u64 = 100;

/// Bound on browser launch and first navigation.
pub const DEFAULT_LAUNCH_TIMEOUT_MS: u64 = 30_000;

/// Pinned URL of the external drawing-primitives library (scales/shapes).
/// Loaded into the surface before the bundle artifact, which assumes its
/// symbols are present.
pub const DEFAULT_PRIMITIVES_URL: &str = "https://cdn.jsdelivr.net/npm/d3@7/dist/d3.min.js";

/// A single chart datum. Serialized into the page verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub x: f64,
    pub y: f64,
}

/// One chart rendering request.
///
/// Immutable once constructed; the pipeline allocates a fresh, exclusively
/// owned surface per request. An empty `data` vector renders an empty chart
/// and is not an error.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    /// Ordered data points, passed through to the chart untransformed.
    pub data: Vec<DataPoint>,
    /// Inner chart width in CSS pixels.
    pub width: u32,
    /// Inner chart height in CSS pixels.
    pub height: u32,
    /// Device scale factor applied to captured pixels.
    pub device_pixel_ratio: f64,
}

impl RenderRequest {
    /// Validates dimensions and builds a request.
    ///
    /// Width and height must be non-zero and the device pixel ratio a
    /// positive finite number; violations are usage errors, reported before
    /// any surface is acquired.
    pub fn new(
        data: Vec<DataPoint>,
        width: u32,
        height: u32,
        device_pixel_ratio: f64,
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(RenderError::Usage(format!(
                "chart dimensions must be positive, got {}x{}",
                width, height
            )));
        }
        if !(device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0) {
            return Err(RenderError::Usage(format!(
                "device pixel ratio must be a positive finite number, got {}",
                device_pixel_ratio
            )));
        }
        if data.iter().any(|p| !(p.x.is_finite() && p.y.is_finite())) {
            return Err(RenderError::Usage(
                "data points must have finite coordinates".to_string(),
            ));
        }
        Ok(Self {
            data,
            width,
            height,
            device_pixel_ratio,
        })
    }

    /// Width of the full allocated surface, margin included.
    pub fn surface_width(&self) -> u32 {
        self.width + 2 * SURFACE_MARGIN_PX
    }

    /// Height of the full allocated surface, margin included.
    pub fn surface_height(&self) -> u32 {
        self.height + 2 * SURFACE_MARGIN_PX
    }
}

/// Configuration for the render pipeline.
///
/// The defaults carry the pipeline's named timing constants; every wait the
/// pipeline performs is bounded by one of these fields.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Bounded wait for the container element, in milliseconds.
    pub container_timeout_ms: u64,
    /// Bounded wait for the ready sentinel, in milliseconds.
    pub chart_ready_timeout_ms: u64,
    /// Settle delay after the sentinel appears, in milliseconds.
    pub settle_delay_ms: u64,
    /// Surface observation poll interval, in milliseconds.
    pub poll_interval_ms: u64,
    /// Bound on browser launch, in milliseconds.
    pub launch_timeout_ms: u64,
    /// Optional overall pipeline deadline, in milliseconds. When set, the
    /// detector's waits are clipped so the surface is still released by the
    /// pipeline itself after expiry.
    pub deadline_ms: Option<u64>,
    /// Extra arguments appended to the Chrome command line.
    pub extra_chrome_args: Vec<String>,
    /// Override for the embedded bundle artifact (path to a script file).
    pub bundle_path: Option<PathBuf>,
    /// URL of the drawing-primitives library loaded before the bundle.
    pub primitives_url: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            container_timeout_ms: CONTAINER_TIMEOUT_MS,
            chart_ready_timeout_ms: CHART_READY_TIMEOUT_MS,
            settle_delay_ms: SETTLE_DELAY_MS,
            poll_interval_ms: POLL_INTERVAL_MS,
            launch_timeout_ms: DEFAULT_LAUNCH_TIMEOUT_MS,
            deadline_ms: None,
            extra_chrome_args: Vec::new(),
            bundle_path: None,
            primitives_url: DEFAULT_PRIMITIVES_URL.to_string(),
        }
    }
}

/// Console message emitted inside the rendering surface.
///
/// Forwarded to the orchestrator's diagnostic sink without altering
/// pipeline control flow.
#[derive(Debug, Clone)]
pub struct ConsoleMessage {
    /// Level such as "log", "warn", or "error"
    pub level: String,
    /// Textual content of the message
    pub text: String,
}

/// A captured chart: PNG bytes plus the exact CSS-pixel region captured.
#[derive(Debug, Clone)]
pub struct RenderedChart {
    /// Encoded PNG bytes. Persistence is the caller's decision.
    pub png: Vec<u8>,
    /// Region captured, independent of device-pixel-ratio scaling.
    pub region: CaptureRegion,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RenderConfig::default();
        assert_eq!(config.container_timeout_ms, 5_000);
        assert_eq!(config.chart_ready_timeout_ms, 5_000);
        assert_eq!(config.settle_delay_ms, 1_000);
        assert!(config.deadline_ms.is_none());
        assert!(config.primitives_url.contains("d3"));
    }

    #[test]
    fn test_request_validation() {
        assert!(RenderRequest::new(vec![], 800, 600, 1.0).is_ok());
        assert!(RenderRequest::new(vec![], 0, 600, 1.0).is_err());
        assert!(RenderRequest::new(vec![], 800, 0, 1.0).is_err());
        assert!(RenderRequest::new(vec![], 800, 600, 0.0).is_err());
        assert!(RenderRequest::new(vec![], 800, 600, -2.0).is_err());
        assert!(RenderRequest::new(vec![], 800, 600, f64::NAN).is_err());
        assert!(RenderRequest::new(
            vec![DataPoint {
                x: f64::INFINITY,
                y: 0.0
            }],
            800,
            600,
            1.0
        )
        .is_err());
    }

    #[test]
    fn test_empty_data_is_valid() {
        let request = RenderRequest::new(vec![], 400, 300, 1.0).unwrap();
        assert!(request.data.is_empty());
        assert_eq!(request.surface_width(), 480);
        assert_eq!(request.surface_height(), 380);
    }

    #[test]
    fn test_surface_dimensions_include_margin() {
        let request = RenderRequest::new(vec![], 800, 600, 2.0).unwrap();
        assert_eq!(request.surface_width(), 800 + 2 * SURFACE_MARGIN_PX);
        assert_eq!(request.surface_height(), 600 + 2 * SURFACE_MARGIN_PX);
    }
}
