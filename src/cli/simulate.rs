//! CLI dispatch for the `rvl simulate` command.
//!
//! Mounts the showcase, applies one width observation, runs the virtual
//! clock and prints every grid's summary.

use std::path::Path;
use std::process::ExitCode;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

use crate::gif::FrameRecorder;
use crate::grid::GridSummary;
use crate::image_source::FsImageLoader;
use crate::models::GridId;
use crate::showcase::{Dispatched, Showcase};

use super::{load_config_or_report, print_json, EXIT_ERROR, EXIT_INVALID_ARGS, EXIT_SUCCESS};

/// Totals reported after a run.
#[derive(Debug, Default, Serialize)]
struct RunReport {
    elapsed_ms: u64,
    chunks: usize,
    clears: usize,
    rotations: usize,
    stray: usize,
    grids: Vec<GridSummary>,
}

impl RunReport {
    fn add(&mut self, dispatched: Dispatched) {
        self.chunks += dispatched.chunks;
        self.clears += dispatched.clears;
        self.rotations += dispatched.rotations;
        self.stray += dispatched.stray;
    }
}

fn print_text(report: &RunReport) {
    println!(
        "t={}ms: {} chunks painted, {} surfaces cleared, {} rotations",
        report.elapsed_ms, report.chunks, report.clears, report.rotations
    );
    for grid in &report.grids {
        println!();
        println!("{} [{}]", grid.title, grid.ribbon);
        let more = if grid.more_count > 0 { format!(", + {} more", grid.more_count) } else { String::new() };
        println!("  columns: {}, visible: {}{}", grid.columns, grid.visible, more);
        let lit: Vec<String> = grid.lit.iter().map(|i| i.to_string()).collect();
        println!("  lit: [{}]", lit.join(", "));
        let phases: Vec<String> = grid.phases.iter().map(|p| format!("{:?}", p).to_lowercase()).collect();
        println!("  phases: {}", phases.join(" "));
    }
}

/// Execute the simulate command.
pub fn run_simulate(
    config_path: Option<&Path>,
    width: u32,
    duration_ms: u64,
    seed: Option<u64>,
    collection: Option<&str>,
    gif: Option<&Path>,
    frame_ms: u64,
    json: bool,
) -> ExitCode {
    let loaded = match load_config_or_report(config_path) {
        Ok(l) => l,
        Err(code) => return code,
    };

    let mut catalog = loaded.config.catalog();
    if let Some(id) = collection {
        catalog = match catalog.only(id) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::from(EXIT_INVALID_ARGS);
            }
        };
    }

    let rng = match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };
    let loader = FsImageLoader::new(loaded.asset_root());
    let mut showcase = Showcase::new(&catalog, loaded.config.grid_settings(), &loader, rng);
    showcase.resize(width);

    let mut report = RunReport::default();
    let mut recorder = gif.map(|_| FrameRecorder::new(frame_ms));
    let recorded = GridId(0);

    match recorder.as_mut() {
        Some(recorder) => {
            let mut at = 0;
            loop {
                if let Some(grid) = showcase.grid(recorded) {
                    recorder.capture(at, grid.render_frame());
                }
                if at >= duration_ms {
                    break;
                }
                at = (at + frame_ms).min(duration_ms);
                report.add(showcase.advance_to(at));
            }
        }
        None => report.add(showcase.advance_to(duration_ms)),
    }

    report.elapsed_ms = showcase.now();
    report.grids = showcase.summaries();
    showcase.teardown();

    if let (Some(path), Some(recorder)) = (gif, recorder.as_ref()) {
        if let Err(e) = recorder.write_gif(path, 1) {
            eprintln!("Error: Failed to save '{}': {}", path.display(), e);
            return ExitCode::from(EXIT_ERROR);
        }
        eprintln!("Saved: {} ({} frames)", path.display(), recorder.len());
    }

    if json {
        return print_json(&report);
    }
    print_text(&report);
    ExitCode::from(EXIT_SUCCESS)
}
