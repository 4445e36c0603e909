//! CLI dispatch for the `rvl reveal` command.
//!
//! Drives one renderer over a single image on a virtual clock: switch on,
//! paint every chunk, then switch off and let the hide delay clear it.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::gif::FrameRecorder;
use crate::image_source::{FsImageLoader, ImageLoader};
use crate::models::{GridId, SilhouetteStyle, TileId, Wake};
use crate::output::{is_png_path, save_png, scale_image};
use crate::reveal::{ChunkedReveal, RevealPhase, RevealTiming};
use crate::silhouette::{backdrop, composite};
use crate::timer::Timers;

use super::{EXIT_ERROR, EXIT_INVALID_ARGS, EXIT_SUCCESS};

fn default_output(image: &Path) -> PathBuf {
    let stem = image.file_stem().and_then(|s| s.to_str()).unwrap_or("reveal");
    image.with_file_name(format!("{}_reveal.gif", stem))
}

/// Execute the reveal command.
pub fn run_reveal(
    image: &Path,
    output: Option<&Path>,
    size: u32,
    seed: Option<u64>,
    every: u32,
    scale: u8,
    style: SilhouetteStyle,
) -> ExitCode {
    if size == 0 {
        eprintln!("Error: --size must be a positive integer");
        return ExitCode::from(EXIT_INVALID_ARGS);
    }

    let source = image.to_string_lossy();
    let pixels = match FsImageLoader::new(".").load(&source) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let mut rng = match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };
    let timing = RevealTiming::default();
    let mut timers: Timers<Wake> = Timers::new();
    let base = backdrop(Some(&pixels), size, style);
    let mut reveal = ChunkedReveal::new(TileId { grid: GridId(0), serial: 0 }, size, Some(pixels), timing);
    let mut recorder = FrameRecorder::new(timing.hide_delay_ms);

    recorder.capture(timers.now(), composite(&base, reveal.surface()));
    reveal.set_on(true, &mut timers, &mut rng);

    let mut painted = 0u32;
    while let Some(due) = timers.pop_due(u64::MAX) {
        if let Wake::RevealTick(_) = due.payload {
            if reveal.on_reveal_tick(&mut timers).is_some() {
                painted += 1;
                if painted % every == 0 || reveal.phase() == RevealPhase::Revealed {
                    recorder.capture(due.at, composite(&base, reveal.surface()));
                }
            }
        }
        if reveal.phase() == RevealPhase::Revealed {
            break;
        }
    }
    // Zero-chunk surfaces reveal without ticking
    if painted == 0 {
        recorder.capture(timers.now(), composite(&base, reveal.surface()));
    }

    let output_path = output.map(Path::to_path_buf).unwrap_or_else(|| default_output(image));

    if is_png_path(&output_path) {
        let revealed = composite(&base, reveal.surface());
        if let Err(e) = save_png(&scale_image(revealed, scale), &output_path) {
            eprintln!("Error: Failed to save '{}': {}", output_path.display(), e);
            return ExitCode::from(EXIT_ERROR);
        }
        println!("Saved: {} ({} chunks)", output_path.display(), painted);
        return ExitCode::from(EXIT_SUCCESS);
    }

    reveal.set_on(false, &mut timers, &mut rng);
    while let Some(due) = timers.pop_due(u64::MAX) {
        if let Wake::ClearSurface(_) = due.payload {
            reveal.on_hide_elapsed();
            recorder.capture(due.at, composite(&base, reveal.surface()));
        }
    }

    if let Err(e) = recorder.write_gif(&output_path, scale) {
        eprintln!("Error: Failed to save '{}': {}", output_path.display(), e);
        return ExitCode::from(EXIT_ERROR);
    }
    println!("Saved: {} ({} chunks, {} frames)", output_path.display(), painted, recorder.len());
    ExitCode::from(EXIT_SUCCESS)
}
