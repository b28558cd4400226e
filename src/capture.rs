//! Capture engine
//!
//! Extracts a pixel-accurate PNG of the rendering surface once completion
//! has been signaled. The capture region always spans the full allocated
//! surface (chart plus margin) because the presentational framing is part
//! of the expected output, and capture is independent of scroll position
//! or viewport size.

use crate::{RenderError, RenderSurface, Result};
use base64::Engine as Base64Engine;
use headless_chrome::protocol::cdp::Page;

/// The exact CSS-pixel region a capture covers. Device-pixel-ratio scaling
/// is applied inside the surface; the region itself is unscaled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CaptureRegion {
    /// The full allocated surface, from the origin.
    pub fn full_surface(surface: &RenderSurface) -> Self {
        Self {
            x: 0,
            y: 0,
            width: surface.surface_width(),
            height: surface.surface_height(),
        }
    }
}

/// Captures `region` of the surface as PNG bytes.
///
/// Goes through the raw protocol call because the capture must extend
/// beyond the visible viewport when the allocated surface exceeds it. The
/// bytes are returned to the caller; persistence is the orchestrator's
/// decision.
pub fn capture(surface: &RenderSurface, region: CaptureRegion) -> Result<Vec<u8>> {
    let clip = Page::Viewport {
        x: region.x as f64,
        y: region.y as f64,
        width: region.width as f64,
        height: region.height as f64,
        scale: 1.0,
    };

    let screenshot = surface
        .tab()
        .call_method(Page::CaptureScreenshot {
            format: Some(Page::CaptureScreenshotFormatOption::Png),
            quality: None,
            clip: Some(clip),
            from_surface: Some(true),
            capture_beyond_viewport: Some(true),
            optimize_for_speed: None,
        })
        .map_err(|e| RenderError::Capture(format!("screenshot failed: {}", e)))?;

    base64::engine::general_purpose::STANDARD
        .decode(screenshot.data)
        .map_err(|e| RenderError::Capture(format!("screenshot payload decode failed: {}", e)))
}
