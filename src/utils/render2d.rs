use crate::core::RenderFrame;

#[derive(Clone, Copy, Debug)]
pub struct Color(pub u8, pub u8, pub u8, pub u8);

pub const BLACK: Color = Color(0, 0, 0, 255);
pub const WHITE: Color = Color(255, 255, 255, 255);
pub const RED: Color = Color(220, 20, 60, 255);
pub const BLUE: Color = Color(0, 120, 255, 255);
pub const GRAY: Color = Color(180, 180, 180, 255);

/// A minimal RGBA software canvas for simple 2D rendering.
pub struct Canvas {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>, // RGBA
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        let mut canvas = Self {
            width,
            height,
            pixels: vec![0; (width as usize) * (height as usize) * 4],
        };
        canvas.clear(BLACK);
        canvas
    }

    pub fn clear(&mut self, color: Color) {
        for y in 0..self.height as usize {
            for x in 0..self.width as usize {
                let idx = (y * self.width as usize + x) * 4;
                self.pixels[idx] = color.0;
                self.pixels[idx + 1] = color.1;
                self.pixels[idx + 2] = color.2;
                self.pixels[idx + 3] = color.3;
            }
        }
    }

    #[inline]
    pub fn put_pixel(&mut self, x: i32, y: i32, color: Color) {
        if x < 0 || y < 0 { return; }
        let (x, y) = (x as u32, y as u32);
        if x >= self.width || y >= self.height { return; }
        let idx = ((y * self.width + x) as usize) * 4;
        self.pixels[idx] = color.0;
        self.pixels[idx + 1] = color.1;
        self.pixels[idx + 2] = color.2;
        self.pixels[idx + 3] = color.3;
    }

    /// Draw a line using integer Bresenham.
    pub fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: Color) {
        let mut x0 = x0;
        let mut y0 = y0;
        let dx = (x1 - x0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let dy = -(y1 - y0).abs();
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        loop {
            self.put_pixel(x0, y0, color);
            if x0 == x1 && y0 == y1 { break; }
            let e2 = 2 * err;
            if e2 >= dy { err += dy; x0 += sx; }
            if e2 <= dx { err += dx; y0 += sy; }
        }
    }

    /// Outline of a rectangle with top-left (x, y), width w, height h.
    pub fn stroke_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: Color) {
        if w <= 0 || h <= 0 { return; }
        let (x1, y1) = (x + w - 1, y + h - 1);
        self.draw_line(x, y, x1, y, color);
        self.draw_line(x, y1, x1, y1, color);
        self.draw_line(x, y, x, y1, color);
        self.draw_line(x1, y, x1, y1, color);
    }

    /// Connect consecutive points with lines. A single point is drawn as a pixel.
    pub fn draw_polyline(&mut self, points: &[(i32, i32)], color: Color) {
        match points {
            [] => {}
            [(x, y)] => self.put_pixel(*x, *y, color),
            _ => {
                for w in points.windows(2) {
                    self.draw_line(w[0].0, w[0].1, w[1].0, w[1].1, color);
                }
            }
        }
    }

    pub fn into_render_frame(self) -> RenderFrame {
        RenderFrame::Pixels { width: self.width, height: self.height, data: self.pixels }
    }
}
