//! Static backdrop layer drawn beneath a tile's reveal surface

use image::imageops::{self, FilterType};
use image::{Pixel, Rgba, RgbaImage};

use crate::models::SilhouetteStyle;

/// Fill colour for [`SilhouetteStyle::Mask`] backdrops.
pub const SILHOUETTE_COLOR: Rgba<u8> = Rgba([0x22, 0x22, 0x22, 0xFF]);

/// Brightness multiplier for [`SilhouetteStyle::Image`] backdrops.
const DIM_FACTOR: f32 = 0.35;

/// Render the backdrop for a tile at `size × size`.
///
/// Returns a transparent image when there is no source.
pub fn backdrop(source: Option<&RgbaImage>, size: u32, style: SilhouetteStyle) -> RgbaImage {
    let size = size.max(1);
    let Some(source) = source else {
        return RgbaImage::new(size, size);
    };

    let mut out = imageops::resize(source, size, size, FilterType::Nearest);
    for pixel in out.pixels_mut() {
        let [r, g, b, a] = pixel.0;
        if a == 0 {
            continue;
        }
        *pixel = match style {
            SilhouetteStyle::Mask => Rgba([SILHOUETTE_COLOR[0], SILHOUETTE_COLOR[1], SILHOUETTE_COLOR[2], a]),
            SilhouetteStyle::Image => {
                let luma = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
                let v = (luma * DIM_FACTOR).round().clamp(0.0, 255.0) as u8;
                Rgba([v, v, v, a])
            }
        };
    }
    out
}

/// Overlay `surface` on `backdrop` with source-over blending.
///
/// Opaque surface pixels replace the backdrop exactly.
pub fn composite(backdrop: &RgbaImage, surface: &RgbaImage) -> RgbaImage {
    let mut out = backdrop.clone();
    for (x, y, top) in surface.enumerate_pixels() {
        if x >= out.width() || y >= out.height() {
            continue;
        }
        match top.0[3] {
            0 => {}
            255 => out.put_pixel(x, y, *top),
            _ => out.get_pixel_mut(x, y).blend(top),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker() -> RgbaImage {
        RgbaImage::from_fn(2, 2, |x, y| {
            if (x + y) % 2 == 0 {
                Rgba([200, 100, 50, 255])
            } else {
                Rgba([0, 0, 0, 0])
            }
        })
    }

    #[test]
    fn test_mask_backdrop_flattens_opaque_pixels() {
        let out = backdrop(Some(&checker()), 2, SilhouetteStyle::Mask);
        assert_eq!(out.get_pixel(0, 0), &SILHOUETTE_COLOR);
        assert_eq!(out.get_pixel(1, 0).0[3], 0);
    }

    #[test]
    fn test_image_backdrop_is_dim_greyscale() {
        let out = backdrop(Some(&checker()), 2, SilhouetteStyle::Image);
        let [r, g, b, a] = out.get_pixel(1, 1).0;
        assert_eq!(r, g);
        assert_eq!(g, b);
        assert!(r < 100);
        assert_eq!(a, 255);
    }

    #[test]
    fn test_backdrop_scales_to_tile() {
        let out = backdrop(Some(&checker()), 8, SilhouetteStyle::Mask);
        assert_eq!(out.dimensions(), (8, 8));
        // Nearest-neighbour keeps the checker blocks crisp
        assert_eq!(out.get_pixel(0, 0), &SILHOUETTE_COLOR);
        assert_eq!(out.get_pixel(7, 0).0[3], 0);
    }

    #[test]
    fn test_backdrop_without_source_is_transparent() {
        let out = backdrop(None, 4, SilhouetteStyle::Image);
        assert!(out.pixels().all(|p| p.0[3] == 0));
    }

    #[test]
    fn test_composite_surface_wins_where_opaque() {
        let back = RgbaImage::from_pixel(2, 2, SILHOUETTE_COLOR);
        let mut surface = RgbaImage::new(2, 2);
        surface.put_pixel(1, 1, Rgba([255, 0, 0, 255]));
        let out = composite(&back, &surface);
        assert_eq!(out.get_pixel(1, 1).0, [255, 0, 0, 255]);
        assert_eq!(out.get_pixel(0, 0), &SILHOUETTE_COLOR);
    }
}
