use piece_locator::config::locate::LocateToolConfig;
use piece_locator::image::io::{load_raster_image, save_raster_image, write_json_file};
use piece_locator::{AnalysisResult, PieceId, PieceLocator, PuzzleId};
use std::env;
use std::path::Path;

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let config_path = env::args().nth(1).ok_or_else(usage)?;
    let config = LocateToolConfig::load(Path::new(&config_path))?;

    let locator = PieceLocator::new(config.params.clone()).map_err(|e| e.to_string())?;
    let photo = load_raster_image(&config.puzzle)?;
    let reference = if config.extract_region {
        locator
            .extract_reference_region(&photo)
            .map_err(|e| e.to_string())?
    } else {
        photo
    };
    if let Some(path) = &config.output.region_out {
        save_raster_image(&reference, path)?;
    }

    let frame = (reference.width(), reference.height());
    let puzzle_id = PuzzleId::new(config.puzzle_id.clone());
    locator
        .build_feature_index(reference, puzzle_id.clone())
        .map_err(|e| e.to_string())?;

    let mut pieces = Vec::with_capacity(config.pieces.len());
    for piece in &config.pieces {
        pieces.push((PieceId::new(piece.id.clone()), load_raster_image(&piece.path)?));
    }

    let analysis = locator
        .analyze(&puzzle_id, &pieces)
        .map_err(|e| e.to_string())?;
    print_summary(&analysis, frame);

    if let Some(path) = &config.output.json_out {
        write_json_file(path, &analysis)?;
        println!("\nJSON report written to {}", path.display());
    }

    Ok(())
}

/// Best placement per piece, normalised and in reference pixels.
fn print_summary(analysis: &AnalysisResult, (frame_w, frame_h): (usize, usize)) {
    println!("Analysis of puzzle {}", analysis.puzzle_id);
    println!(
        "  located: {}/{}",
        analysis.located_count(),
        analysis.piece_ids.len()
    );
    for id in &analysis.piece_ids {
        match analysis.best_match(id) {
            Some(best) => {
                let (x0, y0, x1, y1) = best.rect.to_pixel_rect(frame_w, frame_h);
                println!(
                    "  {id}: x={:.3} y={:.3} w={:.3} h={:.3} px=[{x0:.0},{y0:.0}]-[{x1:.0},{y1:.0}] confidence={:.3} inliers={}",
                    best.rect.x,
                    best.rect.y,
                    best.rect.width,
                    best.rect.height,
                    best.confidence,
                    best.inlier_count
                )
            }
            None => println!("  {id}: no placement found"),
        }
    }
}

fn usage() -> String {
    "Usage: locate_pieces <config.json>".to_string()
}
