//! Integration tests for the render pipeline
//!
//! Everything here drives a real Chrome instance and is `#[ignore]`d so the
//! suite stays runnable on machines without one.

use chartshot::{
    detect, pipeline, ChartStyle, DataPoint, RenderConfig, RenderError, RenderRequest,
    RenderSurface, WaitStage,
};

/// Reads the pixel dimensions out of a PNG's IHDR chunk.
fn png_dimensions(png: &[u8]) -> (u32, u32) {
    assert!(png.len() > 24, "PNG data seems too small");
    // PNG files start with these magic bytes
    assert_eq!(&png[0..8], b"\x89PNG\r\n\x1a\n");
    let width = u32::from_be_bytes(png[16..20].try_into().unwrap());
    let height = u32::from_be_bytes(png[20..24].try_into().unwrap());
    (width, height)
}

fn points(raw: &[(f64, f64)]) -> Vec<DataPoint> {
    raw.iter().map(|&(x, y)| DataPoint { x, y }).collect()
}

#[test]
#[ignore] // Requires Chrome to be installed
fn test_capture_dimensions_include_margin() {
    let request =
        RenderRequest::new(points(&[(0.0, 0.0), (1.0, 2.0), (2.0, 1.0)]), 800, 600, 1.0)
            .expect("valid request");

    let chart = pipeline::render(&request, &RenderConfig::default()).expect("render failed");

    assert_eq!(png_dimensions(&chart.png), (880, 680));
    assert_eq!(chart.region.width, 880);
    assert_eq!(chart.region.height, 680);
}

#[test]
#[ignore] // Requires Chrome to be installed
fn test_empty_data_renders_an_empty_chart() {
    let request = RenderRequest::new(vec![], 400, 300, 1.0).expect("valid request");

    let chart = pipeline::render(&request, &RenderConfig::default())
        .expect("empty data must not be a render failure");

    assert_eq!(png_dimensions(&chart.png), (480, 380));
}

#[test]
#[ignore] // Requires Chrome to be installed
fn test_device_pixel_ratio_scales_captured_pixels() {
    let request = RenderRequest::new(points(&[(0.0, 1.0), (1.0, 0.0)]), 400, 300, 2.0)
        .expect("valid request");

    let chart = pipeline::render(&request, &RenderConfig::default()).expect("render failed");

    // Region stays in CSS pixels; the PNG is scaled by the ratio.
    assert_eq!(chart.region.width, 480);
    assert_eq!(chart.region.height, 380);
    assert_eq!(png_dimensions(&chart.png), (960, 760));
}

#[test]
#[ignore] // Requires Chrome to be installed
fn test_thrown_constructor_error_is_reported_verbatim() {
    let request = RenderRequest::new(points(&[(0.0, 0.0), (1.0, 1.0)]), 400, 300, 1.0)
        .expect("valid request");
    let style = ChartStyle {
        curve: "curveBogus".to_string(),
        ..Default::default()
    };

    let failure = pipeline::render_with_style(&request, &style, &RenderConfig::default())
        .expect_err("unknown curve must fail the invocation");

    match failure.error {
        RenderError::Invocation(message) => assert_eq!(message, "unknown curve: curveBogus"),
        other => panic!("expected an invocation error, got: {}", other),
    }
    // Failure diagnostics should still see the page.
    let snapshot = failure.dom_snapshot.expect("snapshot should be collected");
    assert!(snapshot.contains("chart-error"));
}

#[test]
#[ignore] // Requires Chrome to be installed
fn test_missing_sentinel_times_out_and_releases_the_surface() {
    let config = RenderConfig {
        chart_ready_timeout_ms: 300,
        ..Default::default()
    };

    // The sentinel only ever appears after an invocation script runs, so a
    // bare surface observes the container but never chart-ready. Several
    // consecutive rounds also prove the surface handle is not leaked.
    for _ in 0..3 {
        let surface =
            RenderSurface::acquire(&config, 300, 200, 1.0).expect("failed to acquire surface");
        let result = detect::await_completion(&surface, &config, None);
        match result {
            Err(RenderError::Timeout { stage, .. }) => assert_eq!(stage, WaitStage::ChartReady),
            other => panic!("expected a chart-ready timeout, got {:?}", other.err()),
        }
        surface.release();
    }
}

#[test]
#[ignore] // Requires Chrome to be installed
fn test_identical_requests_render_identically_shaped_output() {
    let request =
        RenderRequest::new(points(&[(0.0, 0.0), (1.0, 3.0)]), 300, 200, 1.0).expect("valid");
    let config = RenderConfig::default();

    let first = pipeline::render(&request, &config).expect("first render failed");
    let second = pipeline::render(&request, &config).expect("second render failed");

    assert_eq!(png_dimensions(&first.png), png_dimensions(&second.png));
    assert_eq!(first.region, second.region);
}

#[tokio::test]
#[ignore] // Requires Chrome to be installed
async fn test_async_facade_renders() {
    let request = RenderRequest::new(points(&[(0.0, 0.0), (1.0, 1.0)]), 300, 200, 1.0)
        .expect("valid request");

    let chart = chartshot::async_api::render(request, RenderConfig::default())
        .await
        .expect("async render failed");

    assert_eq!(png_dimensions(&chart.png), (380, 280));
}
