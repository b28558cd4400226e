//! Bundle artifact provider
//!
//! Supplies the prebuilt visualization bundle: a self-contained script that
//! exposes the chart-building primitives (`XYContainer`, `Line`, `Scatter`,
//! `Axis`) under a single namespace when evaluated inside a rendering
//! surface. The bundle is an opaque dist artifact; it assumes the drawing
//! primitives library has already been loaded into the page.

use crate::{RenderConfig, RenderError, Result};

/// Global namespace the bundle installs its constructors under.
pub const BUNDLE_NAMESPACE: &str = "ChartKit";

// Prebuilt artifact, shipped with the crate.
const EMBEDDED_BUNDLE: &str = include_str!("../assets/chartkit-bundle.js");

/// Returns the bundle script to inject into a surface.
///
/// Uses the embedded artifact unless the config overrides it with a file
/// path; an unreadable override is an acquisition error, not a silent
/// fallback.
pub fn bundle_source(config: &RenderConfig) -> Result<String> {
    match &config.bundle_path {
        Some(path) => std::fs::read_to_string(path).map_err(|e| {
            RenderError::Acquisition(format!(
                "failed to read bundle override {}: {}",
                path.display(),
                e
            ))
        }),
        None => Ok(EMBEDDED_BUNDLE.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_bundle_exposes_namespace() {
        let src = bundle_source(&RenderConfig::default()).unwrap();
        assert!(src.contains(&format!("window.{}", BUNDLE_NAMESPACE)));
        assert!(src.contains("XYContainer"));
        assert!(src.contains("Line"));
        assert!(src.contains("Scatter"));
        assert!(src.contains("Axis"));
    }

    #[test]
    fn test_missing_override_is_acquisition_error() {
        let config = RenderConfig {
            bundle_path: Some("/nonexistent/bundle.js".into()),
            ..Default::default()
        };
        match bundle_source(&config) {
            Err(RenderError::Acquisition(msg)) => assert!(msg.contains("bundle override")),
            other => panic!("expected acquisition error, got {:?}", other.map(|_| ())),
        }
    }
}
