//! Animated GIF export of captured reveal frames
//!
//! Frames are captured at virtual timestamps; each frame is shown until the
//! next one's timestamp, so irregular capture intervals keep their timing.

use crate::output::{ensure_parent_dir, scale_image, OutputError};
use crate::timer::Millis;
use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame, RgbaImage};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Smallest delay a GIF frame can carry (one centisecond).
const MIN_DELAY_MS: Millis = 10;

/// Frames captured along a virtual timeline.
#[derive(Debug, Clone, Default)]
pub struct FrameRecorder {
    frames: Vec<(Millis, RgbaImage)>,
    /// Delay given to the last frame
    hold_ms: Millis,
}

impl FrameRecorder {
    /// A recorder that holds the final frame for `hold_ms`.
    pub fn new(hold_ms: Millis) -> Self {
        Self { frames: Vec::new(), hold_ms }
    }

    /// Capture `frame` at virtual time `at`.
    ///
    /// Timestamps earlier than the previous capture are clamped to it.
    pub fn capture(&mut self, at: Millis, frame: RgbaImage) {
        let at = self.frames.last().map_or(at, |(last, _)| at.max(*last));
        self.frames.push((at, frame));
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn last_frame(&self) -> Option<&RgbaImage> {
        self.frames.last().map(|(_, f)| f)
    }

    /// Display time of each frame in milliseconds, at least one centisecond.
    pub fn delays(&self) -> Vec<Millis> {
        let mut delays: Vec<Millis> =
            self.frames.windows(2).map(|pair| pair[1].0 - pair[0].0).collect();
        if !self.frames.is_empty() {
            delays.push(self.hold_ms);
        }
        delays.into_iter().map(|d| d.max(MIN_DELAY_MS)).collect()
    }

    /// Encode the captured frames as a looping GIF, scaling each frame by `scale`.
    pub fn write_gif(&self, path: &Path, scale: u8) -> Result<(), OutputError> {
        if self.frames.is_empty() {
            return Err(OutputError::NoFrames);
        }
        ensure_parent_dir(path)?;

        let writer = BufWriter::new(File::create(path)?);
        let mut encoder = GifEncoder::new(writer);
        encoder.set_repeat(Repeat::Infinite)?;

        for ((_, image), delay_ms) in self.frames.iter().zip(self.delays()) {
            let delay = Delay::from_numer_denom_ms(delay_ms as u32, 1);
            let frame = Frame::from_parts(scale_image(image.clone(), scale), 0, 0, delay);
            encoder.encode_frame(frame)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use tempfile::tempdir;

    fn solid(color: Rgba<u8>) -> RgbaImage {
        RgbaImage::from_pixel(4, 4, color)
    }

    #[test]
    fn test_delays_follow_timestamps() {
        let mut recorder = FrameRecorder::new(500);
        recorder.capture(0, solid(Rgba([0, 0, 0, 255])));
        recorder.capture(40, solid(Rgba([1, 0, 0, 255])));
        recorder.capture(100, solid(Rgba([2, 0, 0, 255])));
        assert_eq!(recorder.delays(), vec![40, 60, 500]);
    }

    #[test]
    fn test_delays_clamped_to_centisecond() {
        let mut recorder = FrameRecorder::new(0);
        recorder.capture(0, solid(Rgba([0, 0, 0, 255])));
        recorder.capture(5, solid(Rgba([1, 0, 0, 255])));
        // Out-of-order capture clamps to the previous timestamp
        recorder.capture(2, solid(Rgba([2, 0, 0, 255])));
        assert_eq!(recorder.delays(), vec![10, 10, 10]);
    }

    #[test]
    fn test_write_gif_creates_valid_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/reveal.gif");

        let mut recorder = FrameRecorder::new(700);
        recorder.capture(0, solid(Rgba([255, 0, 0, 255])));
        recorder.capture(50, solid(Rgba([0, 255, 0, 255])));

        recorder.write_gif(&path, 2).unwrap();
        let img = image::open(&path).unwrap();
        assert_eq!((img.width(), img.height()), (8, 8));
    }

    #[test]
    fn test_write_gif_without_frames() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.gif");
        let err = FrameRecorder::new(100).write_gif(&path, 1).unwrap_err();
        assert!(matches!(err, OutputError::NoFrames));
        assert!(!path.exists());
    }
}
