use crayfish_core::{BBox, Point};
use glam::DVec2;

/// Map coordinates to image pixels. Pixel rows grow downwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapToPixel {
    /// Lower left corner of the view in map units.
    pub ll_x: f64,
    pub ll_y: f64,
    pub map_units_per_pixel: f64,
    /// Image height in pixels.
    pub rows: f64,
}

impl MapToPixel {
    pub fn new(ll_x: f64, ll_y: f64, map_units_per_pixel: f64, rows: u32) -> Self {
        Self { ll_x, ll_y, map_units_per_pixel, rows: rows as f64 }
    }

    pub fn real_to_pixel(&self, p: Point) -> DVec2 {
        DVec2::new(
            (p.x - self.ll_x) / self.map_units_per_pixel,
            self.rows - (p.y - self.ll_y) / self.map_units_per_pixel,
        )
    }

    pub fn pixel_to_real(&self, px: DVec2) -> Point {
        Point::new(
            self.ll_x + px.x * self.map_units_per_pixel,
            self.ll_y + self.map_units_per_pixel * (self.rows - px.y),
        )
    }
}

/// An image of `width` x `height` pixels looking at part of the map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub map: MapToPixel,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(lower_left: Point, map_units_per_pixel: f64, width: u32, height: u32) -> Self {
        Self {
            map: MapToPixel::new(lower_left.x, lower_left.y, map_units_per_pixel, height),
            width,
            height,
        }
    }

    /// Visible area in map units.
    pub fn bounds(&self) -> BBox {
        let mupp = self.map.map_units_per_pixel;
        BBox {
            min_x: self.map.ll_x,
            max_x: self.map.ll_x + self.width as f64 * mupp,
            min_y: self.map.ll_y,
            max_y: self.map.ll_y + self.height as f64 * mupp,
        }
    }

    pub fn contains(&self, p: Point) -> bool {
        self.bounds().contains(p)
    }
}
