//! Chart invocation adapter
//!
//! Generates the script that runs inside a rendering surface to mount the
//! chart: data is serialized verbatim into the page, the bundle's primitives
//! are constructed with the default styling, and the mount outcome is
//! signaled through DOM markers. Exceptions cannot cross the surface
//! boundary, so the script catches everything and writes the message to the
//! error element instead of re-throwing.

use crate::bundle::BUNDLE_NAMESPACE;
use crate::{RenderRequest, SURFACE_MARGIN_PX};

/// Id of the element the chart mounts into.
pub const CONTAINER_ID: &str = "vis-container";

/// Id of the sentinel element appended when mounting finishes cleanly.
pub const READY_SENTINEL_ID: &str = "chart-ready";

/// Id of the element that receives the error message when mounting throws.
pub const ERROR_SIGNAL_ID: &str = "chart-error";

/// Default series color (line stroke and marker fill).
pub const DEFAULT_SERIES_COLOR: &str = "#2196F3";

/// Default line stroke width in pixels.
pub const DEFAULT_STROKE_WIDTH: f64 = 5.0;

/// Default point-marker diameter in pixels.
pub const DEFAULT_MARKER_SIZE: f64 = 12.0;

/// Default curve interpolation kind.
pub const DEFAULT_CURVE: &str = "curveMonotoneX";

/// Default tick count per axis.
pub const DEFAULT_TICK_COUNT: u32 = 6;

/// Default axis tick size in pixels.
pub const DEFAULT_TICK_SIZE: f64 = 10.0;

/// Default axis tick padding in pixels.
pub const DEFAULT_TICK_PADDING: f64 = 10.0;

/// Default grid line color.
pub const DEFAULT_GRID_COLOR: &str = "#f0f0f0";

/// Default chart background color.
pub const DEFAULT_BACKGROUND: &str = "#ffffff";

/// Default container margins, clockwise from top.
pub const DEFAULT_CHART_MARGIN: (u32, u32, u32, u32) = (40, 40, 80, 100);

/// Display options passed through to the chart primitives.
///
/// Every field has a fixed default; the pipeline does not validate the
/// values beyond serializing them into the invocation script.
#[derive(Debug, Clone)]
pub struct ChartStyle {
    pub series_color: String,
    pub stroke_width: f64,
    pub marker_size: f64,
    /// Curve interpolation kind, by name. Unknown kinds make the bundle's
    /// line constructor throw, which surfaces as an invocation error.
    pub curve: String,
    pub animated: bool,
    pub animation_duration_ms: u64,
    /// Chart margins inside the container: top, right, bottom, left.
    pub margin: (u32, u32, u32, u32),
    pub x_label: String,
    pub y_label: String,
    pub tick_count: u32,
    pub tick_size: f64,
    pub tick_padding: f64,
    pub grid: bool,
    pub grid_color: String,
    pub background: String,
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            series_color: DEFAULT_SERIES_COLOR.to_string(),
            stroke_width: DEFAULT_STROKE_WIDTH,
            marker_size: DEFAULT_MARKER_SIZE,
            curve: DEFAULT_CURVE.to_string(),
            animated: false,
            animation_duration_ms: 0,
            margin: DEFAULT_CHART_MARGIN,
            x_label: "X Values".to_string(),
            y_label: "Y Values".to_string(),
            tick_count: DEFAULT_TICK_COUNT,
            tick_size: DEFAULT_TICK_SIZE,
            tick_padding: DEFAULT_TICK_PADDING,
            grid: true,
            grid_color: DEFAULT_GRID_COLOR.to_string(),
            background: DEFAULT_BACKGROUND.to_string(),
        }
    }
}

// Built from a template with token substitution to avoid escaping every
// brace for `format!`.
const INVOCATION_TEMPLATE: &str = r#"(function () {
    var errorEl = document.getElementById('{{ERROR_ID}}');
    try {
        var data = {{DATA_JSON}};
        console.log('chartshot: mounting chart with ' + data.length + ' points');

        var kit = window.{{NAMESPACE}};
        if (!kit) throw new Error('chart bundle namespace {{NAMESPACE}} is missing');

        var scatter = new kit.Scatter({
            x: function (d) { return d.x; },
            y: function (d) { return d.y; },
            size: {{MARKER_SIZE}},
            color: {{COLOR}}
        });

        var line = new kit.Line({
            x: function (d) { return d.x; },
            y: function (d) { return d.y; },
            color: {{COLOR}},
            curve: {{CURVE}},
            strokeWidth: {{STROKE_WIDTH}},
            opacity: 1,
            defined: function () { return true; },
            style: { stroke: {{COLOR}}, strokeWidth: {{STROKE_WIDTH}}, fill: 'none', vectorEffect: 'non-scaling-stroke' },
            duration: {{DURATION}},
            animated: {{ANIMATED}}
        });

        var container = new kit.XYContainer(document.getElementById('{{CONTAINER_ID}}'), {
            components: [line, scatter],
            margin: { top: {{M_TOP}}, right: {{M_RIGHT}}, bottom: {{M_BOTTOM}}, left: {{M_LEFT}} },
            background: {{BACKGROUND}},
            duration: {{DURATION}},
            animated: {{ANIMATED}},
            clipContent: false,
            xAxis: new kit.Axis({
                label: {{X_LABEL}},
                tickFormat: function (d) { return d.toString(); },
                grid: {{GRID}},
                gridColor: {{GRID_COLOR}},
                ticks: {{TICKS}},
                tickSize: {{TICK_SIZE}},
                tickPadding: {{TICK_PADDING}}
            }),
            yAxis: new kit.Axis({
                label: {{Y_LABEL}},
                tickFormat: function (d) { return d.toString(); },
                grid: {{GRID}},
                gridColor: {{GRID_COLOR}},
                ticks: {{TICKS}},
                tickSize: {{TICK_SIZE}},
                tickPadding: {{TICK_PADDING}}
            })
        }, data);
        void container;

        var ready = document.createElement('div');
        ready.id = '{{READY_ID}}';
        document.body.appendChild(ready);
    } catch (error) {
        console.error('chartshot: chart mount failed: ' + error);
        if (errorEl) {
            errorEl.textContent = (error && error.message) ? error.message : String(error);
        }
    }
})();"#;

/// Builds the in-page script that mounts the chart described by `request`.
///
/// Data points are serialized verbatim; styling comes from `style` with no
/// further interpretation. On success the script appends the ready
/// sentinel, on a thrown error it writes the message into the error
/// element and swallows the exception.
pub fn build_invocation_script(request: &RenderRequest, style: &ChartStyle) -> String {
    let data_json =
        serde_json::to_string(&request.data).unwrap_or_else(|_| "[]".to_string());
    let (m_top, m_right, m_bottom, m_left) = style.margin;

    INVOCATION_TEMPLATE
        .replace("{{DATA_JSON}}", &data_json)
        .replace("{{NAMESPACE}}", BUNDLE_NAMESPACE)
        .replace("{{CONTAINER_ID}}", CONTAINER_ID)
        .replace("{{READY_ID}}", READY_SENTINEL_ID)
        .replace("{{ERROR_ID}}", ERROR_SIGNAL_ID)
        .replace("{{COLOR}}", &js_string(&style.series_color))
        .replace("{{CURVE}}", &js_string(&style.curve))
        .replace("{{STROKE_WIDTH}}", &style.stroke_width.to_string())
        .replace("{{MARKER_SIZE}}", &style.marker_size.to_string())
        .replace("{{DURATION}}", &style.animation_duration_ms.to_string())
        .replace("{{ANIMATED}}", if style.animated { "true" } else { "false" })
        .replace("{{M_TOP}}", &m_top.to_string())
        .replace("{{M_RIGHT}}", &m_right.to_string())
        .replace("{{M_BOTTOM}}", &m_bottom.to_string())
        .replace("{{M_LEFT}}", &m_left.to_string())
        .replace("{{BACKGROUND}}", &js_string(&style.background))
        .replace("{{X_LABEL}}", &js_string(&style.x_label))
        .replace("{{Y_LABEL}}", &js_string(&style.y_label))
        .replace("{{GRID}}", if style.grid { "true" } else { "false" })
        .replace("{{GRID_COLOR}}", &js_string(&style.grid_color))
        .replace("{{TICKS}}", &style.tick_count.to_string())
        .replace("{{TICK_SIZE}}", &style.tick_size.to_string())
        .replace("{{TICK_PADDING}}", &style.tick_padding.to_string())
}

// JSON string escaping doubles as JS string-literal escaping here.
fn js_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}

/// The presentation shell written into the surface before any script runs.
///
/// Carries the card framing (background, rounded corners, shadow) that the
/// capture region includes, plus the container and error elements. The
/// container is offset by the surface margin on every side.
pub fn shell_html(width: u32, height: u32) -> String {
    const SHELL_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
<title>chartshot</title>
<style>
  body { background: #f5f5f5; margin: 0; padding: 0; }
  #{{CONTAINER_ID}} {
    width: {{WIDTH}}px;
    height: {{HEIGHT}}px;
    border: none;
    margin: {{MARGIN}}px;
    padding: 20px;
    box-sizing: border-box;
    font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif;
    background: white;
    border-radius: 8px;
    box-shadow: 0 2px 4px rgba(0,0,0,0.1);
  }
  .vis-line { stroke-opacity: 1; fill: none; }
  .vis-scatter-point { stroke: none; }
  .vis-axis line, .vis-axis path { stroke: #e0e0e0; stroke-width: 1px; }
  .vis-axis text { fill: #666; font-size: 24px; }
  .vis-axis-label { fill: #333; font-size: 28px; font-weight: 500; }
  .vis-grid-line { stroke: #f0f0f0; }
</style>
</head>
<body>
<div id="{{CONTAINER_ID}}"></div>
<div id="{{ERROR_ID}}" style="color: red;"></div>
</body>
</html>"#;

    SHELL_TEMPLATE
        .replace("{{CONTAINER_ID}}", CONTAINER_ID)
        .replace("{{ERROR_ID}}", ERROR_SIGNAL_ID)
        .replace("{{WIDTH}}", &width.to_string())
        .replace("{{HEIGHT}}", &height.to_string())
        .replace("{{MARGIN}}", &SURFACE_MARGIN_PX.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DataPoint;

    fn request(data: Vec<DataPoint>) -> RenderRequest {
        RenderRequest::new(data, 800, 600, 1.0).unwrap()
    }

    #[test]
    fn test_data_is_serialized_verbatim() {
        let points = vec![
            DataPoint { x: 0.0, y: 0.0 },
            DataPoint { x: 1.5, y: -2.25 },
        ];
        let expected = serde_json::to_string(&points).unwrap();
        let script = build_invocation_script(&request(points), &ChartStyle::default());
        assert!(script.contains(&expected));
    }

    #[test]
    fn test_empty_data_serializes_as_empty_array() {
        let script = build_invocation_script(&request(vec![]), &ChartStyle::default());
        assert!(script.contains("var data = [];"));
    }

    #[test]
    fn test_script_signals_through_dom_markers() {
        let script = build_invocation_script(&request(vec![]), &ChartStyle::default());
        assert!(script.contains(READY_SENTINEL_ID));
        assert!(script.contains(ERROR_SIGNAL_ID));
        // Errors must stay inside the surface
        assert!(script.contains("try {"));
        assert!(script.contains("} catch (error) {"));
        assert!(!script.contains("throw error"));
    }

    #[test]
    fn test_style_overrides_are_passed_through() {
        let style = ChartStyle {
            curve: "curveBasis".to_string(),
            series_color: "#ff0000".to_string(),
            tick_count: 3,
            ..Default::default()
        };
        let script = build_invocation_script(&request(vec![]), &style);
        assert!(script.contains("\"curveBasis\""));
        assert!(script.contains("\"#ff0000\""));
        assert!(script.contains("ticks: 3"));
        assert!(!script.contains("{{"));
    }

    #[test]
    fn test_labels_are_escaped_as_string_literals() {
        let style = ChartStyle {
            x_label: "Time \"s\"".to_string(),
            ..Default::default()
        };
        let script = build_invocation_script(&request(vec![]), &style);
        assert!(script.contains(r#""Time \"s\"""#));
    }

    #[test]
    fn test_shell_offsets_container_by_surface_margin() {
        let shell = shell_html(800, 600);
        assert!(shell.contains("width: 800px"));
        assert!(shell.contains("height: 600px"));
        assert!(shell.contains(&format!("margin: {}px", SURFACE_MARGIN_PX)));
        assert!(shell.contains(CONTAINER_ID));
        assert!(shell.contains(ERROR_SIGNAL_ID));
    }
}
