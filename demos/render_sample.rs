//! End-to-end render demo: sample data to sample.png

use chartshot::{pipeline, DataPoint, RenderConfig, RenderRequest};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    println!("Chartshot - render sample\n");

    let data = vec![
        DataPoint { x: 0.0, y: 0.0 },
        DataPoint { x: 1.0, y: 2.0 },
        DataPoint { x: 2.0, y: 1.0 },
        DataPoint { x: 3.0, y: 4.0 },
        DataPoint { x: 4.0, y: 3.0 },
        DataPoint { x: 5.0, y: 5.0 },
    ];

    let request = RenderRequest::new(data, 800, 600, 2.0)?;
    println!(
        "Rendering {} points at {}x{} (dpr {})...",
        request.data.len(),
        request.width,
        request.height,
        request.device_pixel_ratio
    );

    match pipeline::render(&request, &RenderConfig::default()) {
        Ok(chart) => {
            std::fs::write("sample.png", &chart.png)?;
            println!(
                "Captured {} bytes covering {}x{} css px",
                chart.png.len(),
                chart.region.width,
                chart.region.height
            );
            println!("Saved to: sample.png");
            Ok(())
        }
        Err(failure) => {
            eprintln!("Render failed: {}", failure.error);
            for message in &failure.console {
                eprintln!("  surface {}: {}", message.level, message.text);
            }
            Err(Box::new(failure))
        }
    }
}
