//! chartshot CLI
//!
//! Thin flag-to-option mapping over the render pipeline. Input problems
//! (missing output path, malformed data, bad dimensions) are usage errors
//! reported before any browser launches, with an exit code distinct from
//! render failures.

use chartshot::{pipeline, DataPoint, RenderConfig, RenderRequest};
use clap::Parser;
use log::{error, info, warn};
use std::path::PathBuf;
use std::process;

// Usage errors exit with 2 (clap's convention), render failures with 1.
const EXIT_USAGE: i32 = 2;
const EXIT_RENDER: i32 = 1;

#[derive(Parser, Debug)]
#[command(
    name = "chartshot",
    version,
    about = "Render a line/scatter chart to a PNG via off-screen Chrome"
)]
struct Cli {
    /// Output PNG path
    output: PathBuf,

    /// Chart width in pixels
    #[arg(long, default_value_t = 1600)]
    width: u32,

    /// Chart height in pixels
    #[arg(long, default_value_t = 900)]
    height: u32,

    /// Device scale factor
    #[arg(long = "dpr", default_value_t = 2.0)]
    device_pixel_ratio: f64,

    /// Data points as a JSON array of {"x":..,"y":..} objects
    #[arg(long)]
    data: Option<String>,

    /// Overall render deadline in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Bundle artifact overriding the embedded one
    #[arg(long)]
    bundle: Option<PathBuf>,

    /// Where to write the document snapshot when a render fails
    /// (defaults to debug.html next to the output)
    #[arg(long)]
    debug_html: Option<PathBuf>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().filter_or("RUST_LOG", "info"))
        .init();

    let cli = Cli::parse();

    let data = match &cli.data {
        Some(raw) => match parse_data(raw) {
            Ok(points) => points,
            Err(e) => {
                eprintln!("Error parsing data JSON: {}", e);
                process::exit(EXIT_USAGE);
            }
        },
        None => default_sample(),
    };

    let request = match RenderRequest::new(data, cli.width, cli.height, cli.device_pixel_ratio) {
        Ok(request) => request,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(EXIT_USAGE);
        }
    };

    // Data is passed through untransformed; an unsorted series draws a
    // self-crossing line, which is worth a warning but not a rejection.
    if !is_x_sorted(&request.data) {
        warn!("data points are not sorted by x; the line will follow input order");
    }

    let config = RenderConfig {
        deadline_ms: cli.timeout_ms,
        bundle_path: cli.bundle.clone(),
        ..Default::default()
    };

    match pipeline::render(&request, &config) {
        Ok(chart) => {
            if let Err(e) = std::fs::write(&cli.output, &chart.png) {
                error!("failed to write {}: {}", cli.output.display(), e);
                process::exit(EXIT_RENDER);
            }
            info!(
                "wrote {} ({} bytes, {}x{} region at {}x)",
                cli.output.display(),
                chart.png.len(),
                chart.region.width,
                chart.region.height,
                request.device_pixel_ratio
            );
        }
        Err(failure) => {
            error!("render failed: {}", failure.error);
            for message in &failure.console {
                warn!("surface {}: {}", message.level, message.text);
            }
            if let Some(snapshot) = &failure.dom_snapshot {
                let path = debug_html_path(&cli);
                match std::fs::write(&path, snapshot) {
                    Ok(()) => info!("document snapshot saved to {}", path.display()),
                    Err(e) => warn!("failed to save document snapshot: {}", e),
                }
            }
            process::exit(EXIT_RENDER);
        }
    }
}

fn parse_data(raw: &str) -> Result<Vec<DataPoint>, serde_json::Error> {
    serde_json::from_str(raw)
}

/// Fixed sample rendered when no data is supplied, ascending in x.
fn default_sample() -> Vec<DataPoint> {
    let mut sample = vec![
        DataPoint { x: 0.0, y: 0.0 },
        DataPoint { x: 1.0, y: 2.0 },
        DataPoint { x: 2.0, y: 1.0 },
        DataPoint { x: 3.0, y: 4.0 },
        DataPoint { x: 4.0, y: 3.0 },
        DataPoint { x: 5.0, y: 5.0 },
    ];
    sample.sort_by(|a, b| a.x.total_cmp(&b.x));
    sample
}

fn is_x_sorted(data: &[DataPoint]) -> bool {
    data.windows(2).all(|pair| pair[0].x <= pair[1].x)
}

fn debug_html_path(cli: &Cli) -> PathBuf {
    cli.debug_html.clone().unwrap_or_else(|| {
        cli.output
            .parent()
            .map(|dir| dir.join("debug.html"))
            .unwrap_or_else(|| PathBuf::from("debug.html"))
    })
}
