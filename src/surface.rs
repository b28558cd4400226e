//! Render surface controller
//!
//! Acquires the isolated execution context a chart is rendered in: a
//! dedicated headless Chrome process with a single page, sized to the
//! requested chart plus the surface margin, with the drawing-primitives
//! library and the chart bundle loaded in order. The surface is exclusively
//! owned by one pipeline run; dropping it tears the browser process down.

use crate::bundle::{self, BUNDLE_NAMESPACE};
use crate::invoke;
use crate::{ConsoleMessage, RenderConfig, RenderError, Result};
use headless_chrome::browser::tab::Tab;
use headless_chrome::{Browser, LaunchOptions};
use log::{debug, error, warn};
use std::ffi::OsStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

// Binding the in-page console wrapper posts messages through.
const CONSOLE_BINDING: &str = "__chartshot_console";

// Wraps the page's console methods and window errors so every message is
// observable from outside the surface, without altering rendering.
const CONSOLE_WRAPPER: &str = r#"(function(){
    const bind = window.__chartshot_console;
    if (!bind) return;
    ['log','info','warn','error'].forEach(function(k){
        const orig = console[k];
        console[k] = function(...args){
            try{ bind(JSON.stringify({ level:k, args: args.map(a=>String(a)) })); }catch(e){}
            try{ orig.apply(console, args); }catch(e){}
        };
    });
    window.addEventListener('error', function(ev){
        try{ bind(JSON.stringify({ level:'error', args:[String(ev.message)] })); }catch(e){}
    });
})();"#;

/// An isolated rendering surface with a bounded lifetime.
///
/// Created at pipeline start, destroyed unconditionally at pipeline end.
/// Owns one browser process, one page, one injected bundle instance. Never
/// shared or pooled across requests.
pub struct RenderSurface {
    browser: Browser,
    tab: Arc<Tab>,
    console: Arc<Mutex<Vec<ConsoleMessage>>>,
    surface_width: u32,
    surface_height: u32,
}

impl RenderSurface {
    /// Launches a browser sized for a `width` x `height` chart (the visible
    /// area exceeds it by the surface margin on each side) at the given
    /// device scale factor, then prepares the page: presentation shell,
    /// console forwarding, drawing primitives, then the bundle artifact,
    /// in that order, since the bundle assumes the primitives' symbols exist.
    pub fn acquire(
        config: &RenderConfig,
        width: u32,
        height: u32,
        device_pixel_ratio: f64,
    ) -> Result<Self> {
        let surface_width = width + 2 * crate::SURFACE_MARGIN_PX;
        let surface_height = height + 2 * crate::SURFACE_MARGIN_PX;

        let scale_arg = format!("--force-device-scale-factor={}", device_pixel_ratio);
        let mut args: Vec<&OsStr> = vec![
            OsStr::new("--no-sandbox"),
            OsStr::new("--disable-setuid-sandbox"),
            OsStr::new("--disable-dev-shm-usage"),
            OsStr::new("--disable-gpu"),
            OsStr::new("--font-render-hinting=none"),
            OsStr::new("--hide-scrollbars"),
            OsStr::new(scale_arg.as_str()),
        ];
        for extra in &config.extra_chrome_args {
            args.push(OsStr::new(extra.as_str()));
        }

        let launch_options = LaunchOptions::default_builder()
            .headless(true)
            .window_size(Some((surface_width, surface_height)))
            .idle_browser_timeout(Duration::from_millis(config.launch_timeout_ms))
            .args(args)
            .build()
            .map_err(|e| {
                RenderError::Acquisition(format!("failed to build launch options: {}", e))
            })?;

        let browser = Browser::new(launch_options)
            .map_err(|e| RenderError::Acquisition(format!("failed to launch browser: {}", e)))?;

        let tab = browser
            .new_tab()
            .map_err(|e| RenderError::Acquisition(format!("failed to create page: {}", e)))?;

        tab.navigate_to("about:blank")
            .map_err(|e| RenderError::Acquisition(format!("navigation failed: {}", e)))?;
        tab.wait_until_navigated()
            .map_err(|e| RenderError::Acquisition(format!("wait for navigation failed: {}", e)))?;

        let surface = Self {
            browser,
            tab,
            console: Arc::new(Mutex::new(Vec::new())),
            surface_width,
            surface_height,
        };

        surface.write_shell(width, height)?;
        surface.forward_console();
        surface.load_primitives(&config.primitives_url)?;
        surface.load_bundle(config)?;

        debug!(
            "render surface acquired: {}x{} @ {}x",
            surface_width, surface_height, device_pixel_ratio
        );
        Ok(surface)
    }

    // Replaces the blank document with the presentation shell (card
    // framing, chart CSS, container and error elements).
    fn write_shell(&self, width: u32, height: u32) -> Result<()> {
        let shell = invoke::shell_html(width, height);
        let script = format!(
            "document.open(); document.write({}); document.close();",
            serde_json::to_string(&shell)
                .map_err(|e| RenderError::Acquisition(format!("shell serialization: {}", e)))?
        );
        self.tab
            .evaluate(&script, false)
            .map_err(|e| RenderError::Acquisition(format!("failed to write shell: {}", e)))?;
        Ok(())
    }

    // Forwards the surface's console/error stream to the diagnostic sink.
    // Failures here degrade diagnostics, never the render; the shell must
    // already be written because document.open clears window listeners.
    fn forward_console(&self) {
        let buffer = self.console.clone();
        let _ = self
            .tab
            .expose_function(
                CONSOLE_BINDING,
                std::sync::Arc::new(move |payload: serde_json::Value| {
                    if let Some(message) = parse_console_payload(payload) {
                        match message.level.as_str() {
                            "error" => error!("surface console: {}", message.text),
                            "warn" => warn!("surface console: {}", message.text),
                            _ => debug!("surface console: {}", message.text),
                        }
                        if let Ok(mut buf) = buffer.lock() {
                            buf.push(message);
                        }
                    }
                }),
            )
            .map_err(|e| warn!("failed to expose console binding: {}", e))
            .ok();

        let _ = self
            .tab
            .evaluate(CONSOLE_WRAPPER, false)
            .map_err(|e| warn!("failed to install console wrapper: {}", e))
            .ok();
    }

    // Loads the external drawing-primitives library. The bundle artifact
    // depends on its symbols, so this must complete first.
    fn load_primitives(&self, url: &str) -> Result<()> {
        let loader = format!(
            r#"(function () {{
                return new Promise(function (resolve) {{
                    var script = document.createElement('script');
                    script.src = {};
                    script.onload = function () {{ resolve(true); }};
                    script.onerror = function () {{ resolve(false); }};
                    document.head.appendChild(script);
                }});
            }})()"#,
            serde_json::to_string(url)
                .map_err(|e| RenderError::Acquisition(format!("primitives url: {}", e)))?
        );

        let loaded = self
            .tab
            .evaluate(&loader, true)
            .map_err(|e| RenderError::Acquisition(format!("primitives load failed: {}", e)))?;
        match loaded.value {
            Some(serde_json::Value::Bool(true)) => Ok(()),
            _ => Err(RenderError::Acquisition(format!(
                "failed to load drawing primitives from {}",
                url
            ))),
        }
    }

    // Evaluates the bundle artifact and verifies it installed its namespace.
    fn load_bundle(&self, config: &RenderConfig) -> Result<()> {
        let source = bundle::bundle_source(config)?;
        self.tab
            .evaluate(&source, false)
            .map_err(|e| RenderError::Acquisition(format!("bundle evaluation failed: {}", e)))?;

        let probe = format!("typeof window.{} === 'object'", BUNDLE_NAMESPACE);
        let present = self
            .tab
            .evaluate(&probe, false)
            .map_err(|e| RenderError::Acquisition(format!("bundle probe failed: {}", e)))?;
        match present.value {
            Some(serde_json::Value::Bool(true)) => Ok(()),
            _ => Err(RenderError::Acquisition(format!(
                "bundle did not install the {} namespace",
                BUNDLE_NAMESPACE
            ))),
        }
    }

    /// Evaluates a script in the surface's page context.
    pub fn evaluate(
        &self,
        expression: &str,
        await_promise: bool,
    ) -> Result<Option<serde_json::Value>> {
        let result = self
            .tab
            .evaluate(expression, await_promise)
            .map_err(|e| RenderError::Other(format!("surface evaluation failed: {}", e)))?;
        Ok(result.value)
    }

    /// Best-effort snapshot of the surface's current document.
    pub fn document_snapshot(&self) -> Result<String> {
        let value = self.evaluate("document.documentElement.outerHTML", false)?;
        match value {
            Some(serde_json::Value::String(html)) => Ok(html),
            other => Err(RenderError::Other(format!(
                "document snapshot returned {:?}",
                other
            ))),
        }
    }

    /// Console messages captured so far.
    pub fn console_messages(&self) -> Vec<ConsoleMessage> {
        self.console
            .lock()
            .map(|buf| buf.clone())
            .unwrap_or_default()
    }

    /// Full allocated surface width in CSS pixels, margin included.
    pub fn surface_width(&self) -> u32 {
        self.surface_width
    }

    /// Full allocated surface height in CSS pixels, margin included.
    pub fn surface_height(&self) -> u32 {
        self.surface_height
    }

    pub(crate) fn tab(&self) -> &Tab {
        &self.tab
    }

    /// Releases the surface, terminating the browser process.
    ///
    /// Consuming the surface is the release; error paths that merely drop
    /// it get the same teardown. Either way release runs exactly once.
    pub fn release(self) {
        debug!("releasing render surface");
        drop(self.tab);
        drop(self.browser);
    }
}

// The binding payload is a JSON string of { level, args }.
fn parse_console_payload(payload: serde_json::Value) -> Option<ConsoleMessage> {
    let msg = if payload.is_string() {
        serde_json::from_str::<serde_json::Value>(payload.as_str()?).ok()?
    } else {
        payload
    };

    let level = msg.get("level")?.as_str()?.to_string();
    let text = match msg.get("args") {
        Some(serde_json::Value::Array(args)) => args
            .iter()
            .map(|v| {
                v.as_str()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| v.to_string())
            })
            .collect::<Vec<_>>()
            .join(" "),
        Some(other) => other.to_string(),
        None => String::new(),
    };

    Some(ConsoleMessage { level, text })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_console_payload_from_string() {
        let payload = serde_json::Value::String(
            r#"{"level":"warn","args":["slow","render"]}"#.to_string(),
        );
        let message = parse_console_payload(payload).unwrap();
        assert_eq!(message.level, "warn");
        assert_eq!(message.text, "slow render");
    }

    #[test]
    fn test_parse_console_payload_from_object() {
        let payload = serde_json::json!({ "level": "log", "args": ["x", 42] });
        let message = parse_console_payload(payload).unwrap();
        assert_eq!(message.level, "log");
        assert_eq!(message.text, "x 42");
    }

    #[test]
    fn test_parse_console_payload_rejects_unshaped_values() {
        assert!(parse_console_payload(serde_json::json!(["no", "level"])).is_none());
        assert!(parse_console_payload(serde_json::Value::String("not json".into())).is_none());
    }
}
