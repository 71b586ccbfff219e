use piece_locator::config::extract::ExtractToolConfig;
use piece_locator::diagnostics::{elapsed_ms, TimingBreakdown};
use piece_locator::geometry::Quadrilateral;
use piece_locator::image::io::{load_raster_image, save_luma, save_raster_image, write_json_file};
use piece_locator::pyramid::Pyramid;
use piece_locator::PieceLocator;
use serde::Serialize;
use std::env;
use std::path::Path;
use std::time::Instant;

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let config_path = env::args().nth(1).ok_or_else(usage)?;
    let config = ExtractToolConfig::load(Path::new(&config_path))?;

    let image = load_raster_image(&config.input)?;
    let locator = PieceLocator::new(config.params.clone()).map_err(|e| e.to_string())?;

    let start = Instant::now();
    let mut timing = TimingBreakdown::default();

    let stage = Instant::now();
    let quad = locator.detect_quad(&image);
    timing.push("detect", elapsed_ms(stage));

    let stage = Instant::now();
    let region = locator
        .extract_reference_region(&image)
        .map_err(|e| e.to_string())?;
    timing.push("extract", elapsed_ms(stage));
    timing.total_ms = elapsed_ms(start);

    save_raster_image(&region, &config.output.region_path)?;
    println!(
        "Saved {}x{} region to {} ({})",
        region.width(),
        region.height(),
        config.output.region_path.display(),
        if quad.is_some() { "rectified" } else { "fallback" }
    );

    if let Some(path) = &config.output.detector_view {
        let pyramid =
            Pyramid::build_to_max_side(image.to_luma(), config.params.detector.working_max_side);
        if let Some(level) = pyramid.coarsest() {
            save_luma(level, path)?;
            println!(
                "Saved detector view (level {}) to {}",
                pyramid.coarsest_index(),
                path.display()
            );
        }
    }

    if let Some(path) = &config.output.json_out {
        let report = ExtractReport {
            input_width: image.width(),
            input_height: image.height(),
            quad,
            region_width: region.width(),
            region_height: region.height(),
            timing,
        };
        write_json_file(path, &report)?;
        println!("JSON report written to {}", path.display());
    }

    Ok(())
}

fn usage() -> String {
    "Usage: extract_region <config.json>".to_string()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExtractReport {
    input_width: usize,
    input_height: usize,
    /// Detected corners in input pixels; absent when the fallback was used.
    quad: Option<Quadrilateral>,
    region_width: usize,
    region_height: usize,
    timing: TimingBreakdown,
}
