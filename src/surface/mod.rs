use palette::Srgb;

pub type Rgb = Srgb<u8>;

/// A 2D raster drawing target with known pixel dimensions.
///
/// The bar renderer only ever needs these two operations plus the dimensions;
/// coordinates are f32 because bar geometry is computed in fractional pixels
/// and rounded at the raster edge.
pub trait RenderSurface {
    fn width(&self) -> f32;
    fn height(&self) -> f32;
    fn clear_region(&mut self, x: f32, y: f32, w: f32, h: f32);
    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgb);
}

/// In-memory RGBA-style raster. `None` pixels are cleared/transparent, which
/// lets the terminal blitter fall back to the default background.
pub struct PixelSurface {
    width: u32,
    height: u32,
    pixels: Vec<Option<Rgb>>,
}

impl PixelSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![None; (width * height) as usize],
        }
    }

    /// Replace the backing raster with a cleared one of the given size.
    /// The host calls this whenever the measured drawing area changes.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.pixels = vec![None; (width * height) as usize];
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels[(y * self.width + x) as usize]
    }

    pub fn is_blank(&self) -> bool {
        self.pixels.iter().all(Option::is_none)
    }

    /// Clip a fractional rect to the raster and visit each covered pixel.
    fn for_each_pixel(&mut self, x: f32, y: f32, w: f32, h: f32, value: Option<Rgb>) {
        if w <= 0.0 || h <= 0.0 || self.width == 0 || self.height == 0 {
            return;
        }
        let x0 = x.round().max(0.0) as u32;
        let y0 = y.round().max(0.0) as u32;
        let x1 = ((x + w).round().max(0.0) as u32).min(self.width);
        let y1 = ((y + h).round().max(0.0) as u32).min(self.height);
        for py in y0..y1 {
            for px in x0..x1 {
                self.pixels[(py * self.width + px) as usize] = value;
            }
        }
    }
}

impl RenderSurface for PixelSurface {
    fn width(&self) -> f32 {
        self.width as f32
    }

    fn height(&self) -> f32 {
        self.height as f32
    }

    fn clear_region(&mut self, x: f32, y: f32, w: f32, h: f32) {
        self.for_each_pixel(x, y, w, h, None);
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgb) {
        self.for_each_pixel(x, y, w, h, Some(color));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_then_clear_roundtrip() {
        let mut surface = PixelSurface::new(8, 4);
        let red = Rgb::new(255, 0, 0);
        surface.fill_rect(1.0, 1.0, 2.0, 2.0, red);
        assert_eq!(surface.pixel(1, 1), Some(red));
        assert_eq!(surface.pixel(2, 2), Some(red));
        assert_eq!(surface.pixel(3, 1), None);

        surface.clear_region(0.0, 0.0, 8.0, 4.0);
        assert!(surface.is_blank());
    }

    #[test]
    fn fills_are_clipped_to_the_raster() {
        let mut surface = PixelSurface::new(4, 4);
        surface.fill_rect(-2.0, -2.0, 100.0, 100.0, Rgb::new(1, 2, 3));
        assert!(!surface.is_blank());
        assert_eq!(surface.pixel(3, 3), Some(Rgb::new(1, 2, 3)));
        // Out-of-range reads stay None rather than panicking.
        assert_eq!(surface.pixel(4, 0), None);
    }

    #[test]
    fn zero_sized_surface_accepts_draws() {
        let mut surface = PixelSurface::new(0, 0);
        surface.fill_rect(0.0, 0.0, 10.0, 10.0, Rgb::new(9, 9, 9));
        surface.clear_region(0.0, 0.0, 10.0, 10.0);
        assert!(surface.is_blank());
    }

    #[test]
    fn resize_clears_previous_content() {
        let mut surface = PixelSurface::new(2, 2);
        surface.fill_rect(0.0, 0.0, 2.0, 2.0, Rgb::new(5, 5, 5));
        surface.resize(3, 3);
        assert!(surface.is_blank());
        assert_eq!(surface.width(), 3.0);
        assert_eq!(surface.height(), 3.0);
    }
}
