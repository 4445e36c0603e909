//! A mounted grid cell: one reward item, its image, and its reveal renderer

use image::RgbaImage;

use crate::image_source::{ImageLoader, ImageStatus, ResolvedImage};
use crate::models::{RewardItem, SilhouetteStyle, TileId, Wake};
use crate::reveal::{ChunkedReveal, RevealPhase, RevealTiming};
use crate::shuffle::RandomSource;
use crate::silhouette::{backdrop, composite};
use crate::timer::Timers;

/// Settings shared by every tile of a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileSpec {
    /// Surface side in pixels
    pub size: u32,
    pub style: SilhouetteStyle,
    pub timing: RevealTiming,
}

/// A tile mounted for one reward item in one grid slot.
#[derive(Debug, Clone)]
pub struct RewardTile<'c> {
    item: &'c RewardItem,
    slot: usize,
    image: ResolvedImage,
    backdrop: RgbaImage,
    reveal: ChunkedReveal,
}

impl<'c> RewardTile<'c> {
    /// Mount a tile: resolve its image (with one fallback attempt) and build
    /// the backdrop and an idle renderer.
    pub fn mount(
        id: TileId,
        item: &'c RewardItem,
        slot: usize,
        spec: TileSpec,
        loader: &dyn ImageLoader,
        fallback: &str,
    ) -> Self {
        let image = ResolvedImage::resolve(loader, &item.image_source, fallback);
        let backdrop = backdrop(image.image(), spec.size, spec.style);
        let reveal = ChunkedReveal::new(id, spec.size, image.image().cloned(), spec.timing);
        Self { item, slot, image, backdrop, reveal }
    }

    pub fn id(&self) -> TileId {
        self.reveal.id()
    }

    pub fn item(&self) -> &'c RewardItem {
        self.item
    }

    /// Accessible label, passed through unchanged.
    pub fn label(&self) -> &str {
        &self.item.label
    }

    /// Slot index within the grid's sampled items.
    pub fn slot(&self) -> usize {
        self.slot
    }

    pub fn image_status(&self) -> ImageStatus {
        self.image.status()
    }

    /// Source actually displayed (the fallback after a failed load).
    pub fn resolved_source(&self) -> &str {
        self.image.resolved()
    }

    pub fn phase(&self) -> RevealPhase {
        self.reveal.phase()
    }

    pub fn reveal(&self) -> &ChunkedReveal {
        &self.reveal
    }

    pub fn reveal_mut(&mut self) -> &mut ChunkedReveal {
        &mut self.reveal
    }

    /// Static layer beneath the reveal surface.
    pub fn backdrop(&self) -> &RgbaImage {
        &self.backdrop
    }

    /// Reveal surface over the backdrop.
    pub fn composite(&self) -> RgbaImage {
        composite(&self.backdrop, self.reveal.surface())
    }

    /// Forward the grid's lit-membership signal to the renderer.
    pub fn set_on<R: RandomSource + ?Sized>(&mut self, on: bool, timers: &mut Timers<Wake>, rng: &mut R) -> bool {
        self.reveal.set_on(on, timers, rng)
    }

    pub fn teardown(&mut self, timers: &mut Timers<Wake>) {
        self.reveal.teardown(timers);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_source::MemoryImageLoader;
    use crate::models::GridId;
    use image::Rgba;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const FALLBACK: &str = "/fallback.png";

    fn spec() -> TileSpec {
        TileSpec { size: 16, style: SilhouetteStyle::Mask, timing: RevealTiming::default() }
    }

    fn id() -> TileId {
        TileId { grid: GridId(3), serial: 0 }
    }

    #[test]
    fn test_mount_loaded_tile() {
        let loader = MemoryImageLoader::new().with("/a.png", RgbaImage::from_pixel(16, 16, Rgba([9, 9, 9, 255])));
        let item = RewardItem::new("/a.png", "Pixel animal 1 lb");
        let tile = RewardTile::mount(id(), &item, 2, spec(), &loader, FALLBACK);

        assert_eq!(tile.label(), "Pixel animal 1 lb");
        assert_eq!(tile.slot(), 2);
        assert_eq!(tile.image_status(), ImageStatus::Loaded);
        assert_eq!(tile.phase(), RevealPhase::Idle);
        assert_eq!(tile.backdrop().dimensions(), (16, 16));
        // Idle tile shows only the backdrop
        assert_eq!(&tile.composite(), tile.backdrop());
    }

    #[test]
    fn test_failed_image_cycles_on_fallback_without_reloading() {
        let green = Rgba([0, 255, 0, 255]);
        let loader = MemoryImageLoader::new().with(FALLBACK, RgbaImage::from_pixel(16, 16, green));
        let item = RewardItem::new("/broken.png", "Broken");
        let mut tile = RewardTile::mount(id(), &item, 0, spec(), &loader, FALLBACK);
        assert_eq!(tile.image_status(), ImageStatus::Fallback);
        assert_eq!(tile.resolved_source(), FALLBACK);

        let mut timers = Timers::new();
        let mut rng = StdRng::seed_from_u64(1);
        for cycle in 0..3u64 {
            tile.set_on(true, &mut timers, &mut rng);
            while let Some(due) = timers.pop_due(cycle * 10_000 + 5_000) {
                if let Wake::RevealTick(_) = due.payload {
                    tile.reveal_mut().on_reveal_tick(&mut timers);
                }
            }
            assert_eq!(tile.phase(), RevealPhase::Revealed);
            assert_eq!(tile.reveal().surface().get_pixel(0, 0), &green);

            tile.set_on(false, &mut timers, &mut rng);
            while let Some(due) = timers.pop_due(cycle * 10_000 + 9_000) {
                if let Wake::ClearSurface(_) = due.payload {
                    tile.reveal_mut().on_hide_elapsed();
                }
            }
            assert_eq!(tile.phase(), RevealPhase::Idle);
        }

        assert_eq!(loader.attempts_for("/broken.png"), 1);
        assert_eq!(loader.attempts_for(FALLBACK), 1);
    }

    #[test]
    fn test_teardown_cancels_timers() {
        let loader = MemoryImageLoader::new().with("/a.png", RgbaImage::new(16, 16));
        let item = RewardItem::new("/a.png", "A");
        let mut tile = RewardTile::mount(id(), &item, 0, spec(), &loader, FALLBACK);
        let mut timers = Timers::new();
        tile.set_on(true, &mut timers, &mut StdRng::seed_from_u64(0));
        assert!(!timers.is_empty());
        tile.teardown(&mut timers);
        assert!(timers.is_empty());
    }
}
