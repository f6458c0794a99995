use crate::config::VisualizerConfig;
use crate::spectrum::SpectrumSnapshot;
use crate::surface::{RenderSurface, Rgb};

/// Bars tall enough to reach a third of the surface.
pub const TIER_GOLD: Rgb = Rgb::new(200, 177, 111);
/// Threshold for this tier sits above the bar height bound, so it never
/// fires; kept to match the shipped visuals.
pub const TIER_MID_GREY: Rgb = Rgb::new(199, 199, 199);
pub const TIER_LIGHT_GREY: Rgb = Rgb::new(144, 144, 144);

/// Computes bar geometry from a spectrum snapshot and issues draw calls.
///
/// Pure apart from the draw calls on the surface: one `render` produces one
/// fully composited frame.
pub struct BarRenderer {
    bar_weight: f32,
    padding: f32,
    intensity_floor: u8,
}

impl BarRenderer {
    pub fn new(bar_weight: f32, padding: f32, intensity_floor: u8) -> Self {
        Self {
            bar_weight,
            padding,
            intensity_floor,
        }
    }

    pub fn from_config(config: &VisualizerConfig) -> Self {
        Self::new(config.bar_weight, config.padding, config.intensity_floor)
    }

    pub fn render(&self, surface: &mut impl RenderSurface, snapshot: &SpectrumSnapshot) {
        let width = surface.width();
        let height = surface.height();
        // Dimensions of 0 mean the host has not measured the surface yet.
        if width <= 0.0 || height <= 0.0 || snapshot.is_empty() {
            return;
        }

        // Wider weight = fewer, more prominent bars.
        let bar_width = width / snapshot.len() as f32 * self.bar_weight;
        let visible_bars = (width / (bar_width + self.padding)).floor() as usize;

        surface.clear_region(0.0, 0.0, width, height);

        let mut x = 0.0;
        for i in 0..visible_bars {
            // Bump silent bins to the floor so every bar keeps a visible
            // baseline instead of vanishing.
            let intensity = snapshot.intensity(i).max(self.intensity_floor);
            let bar_height = f32::from(intensity) / 255.0 * height;
            let color = tier_color(bar_height, height);
            surface.fill_rect(x, height - bar_height, bar_width, bar_height, color);
            x += bar_width + self.padding;
        }
    }
}

fn tier_color(bar_height: f32, surface_height: f32) -> Rgb {
    if bar_height >= surface_height / 3.0 {
        TIER_GOLD
    } else if bar_height >= surface_height * 1.5 {
        TIER_MID_GREY
    } else {
        TIER_LIGHT_GREY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectrum::SpectrumSnapshot;
    use crate::surface::PixelSurface;

    fn renderer() -> BarRenderer {
        BarRenderer::new(13.0, 2.0, 25)
    }

    fn column_height(surface: &PixelSurface, x: u32) -> u32 {
        let h = surface.height() as u32;
        (0..h).filter(|&y| surface.pixel(x, y).is_some()).count() as u32
    }

    #[test]
    fn silent_bins_render_at_the_floor_height() {
        let mut surface = PixelSurface::new(120, 100);
        let snapshot = SpectrumSnapshot::zeroed(64);
        renderer().render(&mut surface, &snapshot);

        // 25/255 of a 100px surface, rounded at the raster edge.
        let expected = (25.0_f32 / 255.0 * 100.0).round() as u32;
        assert_eq!(column_height(&surface, 0), expected);
    }

    #[test]
    fn intensities_at_or_below_floor_match_floor_exactly() {
        let mut floor_surface = PixelSurface::new(120, 100);
        let mut low_surface = PixelSurface::new(120, 100);
        let r = renderer();
        r.render(&mut floor_surface, &SpectrumSnapshot::from_bins(vec![25; 64]));
        r.render(&mut low_surface, &SpectrumSnapshot::from_bins(vec![3; 64]));
        for x in 0..120 {
            assert_eq!(column_height(&floor_surface, x), column_height(&low_surface, x));
        }
    }

    #[test]
    fn bar_heights_stay_within_the_surface() {
        let mut surface = PixelSurface::new(90, 60);
        renderer().render(&mut surface, &SpectrumSnapshot::from_bins(vec![255; 32]));
        for x in 0..90 {
            assert!(column_height(&surface, x) <= 60);
        }
    }

    #[test]
    fn loud_bars_are_gold_and_quiet_bars_light_grey() {
        let mut surface = PixelSurface::new(120, 90);
        let mut bins = vec![0u8; 64];
        bins[0] = 255;
        renderer().render(&mut surface, &SpectrumSnapshot::from_bins(bins));

        // First bar: full height, well past h/3.
        assert_eq!(surface.pixel(0, 0), Some(TIER_GOLD));
        // A floor-height bar sits in the fallback tier.
        let bar_width: f32 = 120.0 / 64.0 * 13.0;
        let second_bar_x = (bar_width + 2.0).round() as u32;
        assert_eq!(surface.pixel(second_bar_x, 88), Some(TIER_LIGHT_GREY));
    }

    #[test]
    fn mid_grey_tier_is_never_produced() {
        // The second threshold is 1.5x the surface height while bar height is
        // bounded by the surface height, so only two tiers can appear.
        let mut surface = PixelSurface::new(60, 40);
        for intensity in (0u8..=255).step_by(5) {
            renderer().render(
                &mut surface,
                &SpectrumSnapshot::from_bins(vec![intensity; 16]),
            );
            for x in 0..60 {
                for y in 0..40 {
                    assert_ne!(surface.pixel(x, y), Some(TIER_MID_GREY));
                }
            }
        }
    }

    #[test]
    fn bars_are_laid_out_with_padding_gaps() {
        let mut surface = PixelSurface::new(130, 50);
        renderer().render(&mut surface, &SpectrumSnapshot::zeroed(64));
        let bar_width: f32 = 130.0 / 64.0 * 13.0; // ~26.4px
        // The pixel just past the first bar's right edge is in the gap.
        let gap_x = bar_width.round() as u32;
        assert_eq!(surface.pixel(gap_x, 49), None);
        // The second bar starts after bar_width + padding.
        let second_x = (bar_width + 2.0).round() as u32 + 1;
        assert!(surface.pixel(second_x, 49).is_some());
    }

    #[test]
    fn render_replaces_the_previous_frame() {
        let mut surface = PixelSurface::new(120, 100);
        let r = renderer();
        r.render(&mut surface, &SpectrumSnapshot::from_bins(vec![255; 64]));
        let tall = column_height(&surface, 0);
        r.render(&mut surface, &SpectrumSnapshot::zeroed(64));
        let short = column_height(&surface, 0);
        assert!(short < tall);
    }

    #[test]
    fn zero_dimensions_and_empty_snapshots_are_no_ops() {
        let mut surface = PixelSurface::new(0, 0);
        renderer().render(&mut surface, &SpectrumSnapshot::zeroed(64));
        assert!(surface.is_blank());

        let mut surface = PixelSurface::new(40, 40);
        renderer().render(&mut surface, &SpectrumSnapshot::zeroed(0));
        assert!(surface.is_blank());
    }
}
