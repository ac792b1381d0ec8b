//! 2D raster drawing.
//!
//! [`DrawTarget`] is the small set of primitives the renderer needs: filled
//! discs, radial glows, ring outlines and lines. [`Canvas`] implements it in
//! software over an RGBA8 pixel buffer with anti-aliased edges and
//! source-over blending, which is what the GPU presenter uploads each frame.
//! [`CommandRecorder`] implements it by recording calls, for headless runs
//! and tests.

use glam::Vec2;
use std::path::Path;

use crate::color::Rgba;
use crate::error::SnapshotError;

/// One color stop of a radial gradient, `offset` in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientStop {
    pub offset: f32,
    pub color: Rgba,
}

impl GradientStop {
    pub const fn new(offset: f32, color: Rgba) -> Self {
        Self { offset, color }
    }
}

/// A surface the renderer can draw on.
pub trait DrawTarget {
    /// Surface size in pixels.
    fn size(&self) -> (u32, u32);

    /// Fill the whole surface with `color`, replacing what was there.
    fn clear(&mut self, color: Rgba);

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba);

    /// Fill a disc of radius `outer` with a gradient running from `inner` to `outer`.
    ///
    /// Inside `inner` the first stop's color is used.
    fn fill_radial_gradient(&mut self, center: Vec2, inner: f32, outer: f32, stops: &[GradientStop]);

    fn stroke_circle(&mut self, center: Vec2, radius: f32, width: f32, color: Rgba);

    fn stroke_line(&mut self, from: Vec2, to: Vec2, width: f32, color: Rgba);
}

/// Software RGBA8 surface.
///
/// Pixels are stored row-major, top-left origin, non-premultiplied.
#[derive(Debug, Clone)]
pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<[u8; 4]>,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![[0, 0, 0, 0]; (width as usize) * (height as usize)],
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Reallocate for a new size. Contents are discarded.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == self.width && height == self.height {
            return;
        }
        self.width = width;
        self.height = height;
        self.pixels = vec![[0, 0, 0, 0]; (width as usize) * (height as usize)];
    }

    pub fn pixels(&self) -> &[[u8; 4]] {
        &self.pixels
    }

    /// Raw bytes, ready for a texture upload.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[(y * self.width + x) as usize])
    }

    /// Copy the surface into an `image` buffer.
    pub fn to_image(&self) -> Result<image::RgbaImage, SnapshotError> {
        image::RgbaImage::from_raw(self.width, self.height, self.as_bytes().to_vec())
            .ok_or(SnapshotError::EmptySurface)
    }

    /// Write the surface to a PNG file.
    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
        if self.width == 0 || self.height == 0 {
            return Err(SnapshotError::EmptySurface);
        }
        self.to_image()?
            .save_with_format(path, image::ImageFormat::Png)?;
        Ok(())
    }

    /// Blend `color` over the pixel at `(x, y)` scaled by `coverage`.
    fn blend(&mut self, x: i64, y: i64, color: Rgba, coverage: f32) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let sa = (color.a * coverage).clamp(0.0, 1.0);
        if sa <= 0.0 {
            return;
        }
        let idx = (y as usize) * (self.width as usize) + x as usize;
        let dst = self.pixels[idx];
        let da = dst[3] as f32 / 255.0;
        let out_a = sa + da * (1.0 - sa);
        if out_a <= 0.0 {
            return;
        }
        let mix = |s: u8, d: u8| {
            let v = (s as f32 * sa + d as f32 * da * (1.0 - sa)) / out_a;
            v.round().clamp(0.0, 255.0) as u8
        };
        self.pixels[idx] = [
            mix(color.r, dst[0]),
            mix(color.g, dst[1]),
            mix(color.b, dst[2]),
            (out_a * 255.0).round() as u8,
        ];
    }

    /// Visit every pixel in the box `min..=max`, clipped to the surface.
    fn for_each_near(&mut self, min: Vec2, max: Vec2, mut f: impl FnMut(&mut Self, i64, i64, Vec2)) {
        let x0 = (min.x.floor() as i64).max(0);
        let y0 = (min.y.floor() as i64).max(0);
        let x1 = (max.x.ceil() as i64).min(self.width as i64 - 1);
        let y1 = (max.y.ceil() as i64).min(self.height as i64 - 1);
        for y in y0..=y1 {
            for x in x0..=x1 {
                let sample = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                f(self, x, y, sample);
            }
        }
    }
}

/// Coverage of a pixel whose center is `d` from an edge `half_width` away.
#[inline]
fn edge_coverage(half_width: f32, d: f32) -> f32 {
    (half_width + 0.5 - d).clamp(0.0, 1.0)
}

fn gradient_color(stops: &[GradientStop], t: f32) -> Rgba {
    let (first, last) = match (stops.first(), stops.last()) {
        (Some(f), Some(l)) => (f, l),
        _ => return Rgba::TRANSPARENT,
    };
    if t <= first.offset {
        return first.color;
    }
    for pair in stops.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if t <= b.offset {
            let span = b.offset - a.offset;
            let local = if span > 0.0 { (t - a.offset) / span } else { 1.0 };
            return a.color.blend(b.color, local);
        }
    }
    last.color
}

fn distance_to_segment(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let len2 = ab.length_squared();
    if len2 == 0.0 {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

impl DrawTarget for Canvas {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn clear(&mut self, color: Rgba) {
        let a = (color.a.clamp(0.0, 1.0) * 255.0).round() as u8;
        self.pixels.fill([color.r, color.g, color.b, a]);
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba) {
        if radius <= 0.0 {
            return;
        }
        let reach = Vec2::splat(radius + 1.0);
        self.for_each_near(center - reach, center + reach, |canvas, x, y, sample| {
            let coverage = edge_coverage(radius, sample.distance(center));
            canvas.blend(x, y, color, coverage);
        });
    }

    fn fill_radial_gradient(&mut self, center: Vec2, inner: f32, outer: f32, stops: &[GradientStop]) {
        if outer <= 0.0 || stops.is_empty() {
            return;
        }
        let span = (outer - inner).max(f32::EPSILON);
        let reach = Vec2::splat(outer + 1.0);
        self.for_each_near(center - reach, center + reach, |canvas, x, y, sample| {
            let d = sample.distance(center);
            let coverage = edge_coverage(outer, d);
            if coverage <= 0.0 {
                return;
            }
            let t = ((d - inner) / span).clamp(0.0, 1.0);
            canvas.blend(x, y, gradient_color(stops, t), coverage);
        });
    }

    fn stroke_circle(&mut self, center: Vec2, radius: f32, width: f32, color: Rgba) {
        let half = width / 2.0;
        let reach = Vec2::splat(radius + half + 1.0);
        self.for_each_near(center - reach, center + reach, |canvas, x, y, sample| {
            let d = (sample.distance(center) - radius).abs();
            canvas.blend(x, y, color, edge_coverage(half, d));
        });
    }

    fn stroke_line(&mut self, from: Vec2, to: Vec2, width: f32, color: Rgba) {
        let half = width / 2.0;
        let pad = Vec2::splat(half + 1.0);
        self.for_each_near(from.min(to) - pad, from.max(to) + pad, |canvas, x, y, sample| {
            let d = distance_to_segment(sample, from, to);
            canvas.blend(x, y, color, edge_coverage(half, d));
        });
    }
}

/// A draw call captured by [`CommandRecorder`].
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear(Rgba),
    FillCircle { center: Vec2, radius: f32, color: Rgba },
    RadialGradient { center: Vec2, inner: f32, outer: f32, stops: Vec<GradientStop> },
    StrokeCircle { center: Vec2, radius: f32, width: f32, color: Rgba },
    StrokeLine { from: Vec2, to: Vec2, width: f32, color: Rgba },
}

/// Draw target that records every call instead of rasterizing.
#[derive(Debug, Clone, Default)]
pub struct CommandRecorder {
    pub width: u32,
    pub height: u32,
    pub commands: Vec<DrawCommand>,
}

impl CommandRecorder {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            commands: Vec::new(),
        }
    }

    pub fn count(&self, pred: impl Fn(&DrawCommand) -> bool) -> usize {
        self.commands.iter().filter(|c| pred(c)).count()
    }
}

impl DrawTarget for CommandRecorder {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn clear(&mut self, color: Rgba) {
        self.commands.push(DrawCommand::Clear(color));
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba) {
        self.commands.push(DrawCommand::FillCircle { center, radius, color });
    }

    fn fill_radial_gradient(&mut self, center: Vec2, inner: f32, outer: f32, stops: &[GradientStop]) {
        self.commands.push(DrawCommand::RadialGradient {
            center,
            inner,
            outer,
            stops: stops.to_vec(),
        });
    }

    fn stroke_circle(&mut self, center: Vec2, radius: f32, width: f32, color: Rgba) {
        self.commands.push(DrawCommand::StrokeCircle { center, radius, width, color });
    }

    fn stroke_line(&mut self, from: Vec2, to: Vec2, width: f32, color: Rgba) {
        self.commands.push(DrawCommand::StrokeLine { from, to, width, color });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgba = Rgba::new(255, 0, 0, 1.0);

    #[test]
    fn test_clear_fills_every_pixel() {
        let mut canvas = Canvas::new(4, 3);
        canvas.clear(Rgba::new(8, 8, 16, 1.0));
        assert!(canvas.pixels().iter().all(|p| *p == [8, 8, 16, 255]));
        assert_eq!(canvas.as_bytes().len(), 4 * 3 * 4);
    }

    #[test]
    fn test_fill_circle_covers_center_not_corner() {
        let mut canvas = Canvas::new(20, 20);
        canvas.clear(Rgba::new(0, 0, 0, 1.0));
        canvas.fill_circle(Vec2::new(10.0, 10.0), 4.0, RED);
        assert_eq!(canvas.pixel(10, 10), Some([255, 0, 0, 255]));
        assert_eq!(canvas.pixel(0, 0), Some([0, 0, 0, 255]));
    }

    #[test]
    fn test_half_alpha_blends_over_black() {
        let mut canvas = Canvas::new(10, 10);
        canvas.clear(Rgba::new(0, 0, 0, 1.0));
        canvas.fill_circle(Vec2::new(5.0, 5.0), 3.0, RED.with_alpha(0.5));
        let [r, g, b, a] = canvas.pixel(5, 5).unwrap();
        assert!((127..=128).contains(&r));
        assert_eq!((g, b, a), (0, 0, 255));
    }

    #[test]
    fn test_drawing_off_surface_is_ignored() {
        let mut canvas = Canvas::new(8, 8);
        canvas.fill_circle(Vec2::new(-50.0, -50.0), 5.0, RED);
        canvas.stroke_line(Vec2::new(-20.0, 100.0), Vec2::new(-10.0, 200.0), 1.0, RED);
        assert!(canvas.pixels().iter().all(|p| p[3] == 0));
    }

    #[test]
    fn test_line_marks_pixels_along_segment() {
        let mut canvas = Canvas::new(20, 5);
        canvas.clear(Rgba::new(0, 0, 0, 1.0));
        canvas.stroke_line(Vec2::new(2.0, 2.5), Vec2::new(18.0, 2.5), 1.0, RED);
        assert!(canvas.pixel(10, 2).unwrap()[0] > 200);
        assert_eq!(canvas.pixel(10, 0).unwrap()[0], 0);
    }

    #[test]
    fn test_gradient_fades_outward() {
        let mut canvas = Canvas::new(41, 41);
        canvas.clear(Rgba::new(0, 0, 0, 1.0));
        canvas.fill_radial_gradient(
            Vec2::new(20.5, 20.5),
            1.0,
            20.0,
            &[GradientStop::new(0.0, RED), GradientStop::new(1.0, RED.with_alpha(0.0))],
        );
        let center = canvas.pixel(20, 20).unwrap()[0];
        let mid = canvas.pixel(30, 20).unwrap()[0];
        let edge = canvas.pixel(39, 20).unwrap()[0];
        assert!(center > mid && mid > edge);
    }

    #[test]
    fn test_gradient_color_interpolates_stops() {
        let stops = [
            GradientStop::new(0.0, Rgba::new(0, 0, 0, 1.0)),
            GradientStop::new(0.5, Rgba::new(100, 100, 100, 1.0)),
            GradientStop::new(1.0, Rgba::new(100, 100, 100, 0.0)),
        ];
        assert_eq!(gradient_color(&stops, 0.25).r, 50);
        assert!((gradient_color(&stops, 0.75).a - 0.5).abs() < 1e-6);
        assert_eq!(gradient_color(&stops, 1.0).a, 0.0);
    }

    #[test]
    fn test_png_snapshot() {
        let mut canvas = Canvas::new(6, 4);
        canvas.clear(Rgba::new(10, 20, 30, 1.0));
        let path = std::env::temp_dir().join(format!("clusterglow-test-{}.png", std::process::id()));
        canvas.save_png(&path).unwrap();

        let loaded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(loaded.dimensions(), (6, 4));
        assert_eq!(loaded.get_pixel(3, 2).0, [10, 20, 30, 255]);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_empty_canvas_snapshot_fails() {
        let canvas = Canvas::new(0, 0);
        assert!(canvas.save_png(std::env::temp_dir().join("never.png")).is_err());
    }

    #[test]
    fn test_recorder_keeps_order() {
        let mut rec = CommandRecorder::new(10, 10);
        rec.clear(RED);
        rec.fill_circle(Vec2::ZERO, 1.0, RED);
        assert_eq!(rec.commands.len(), 2);
        assert!(matches!(rec.commands[0], DrawCommand::Clear(_)));
        assert_eq!(rec.count(|c| matches!(c, DrawCommand::FillCircle { .. })), 1);
    }
}
