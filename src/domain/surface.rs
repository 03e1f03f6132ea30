use image::{codecs::png::PngEncoder, ColorType, ImageEncoder, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, BresenhamLineIter};

pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
pub const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

/// A fixed-size raster the board is drawn on. Coordinates outside the
/// surface are clipped, never rejected.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    image: RgbImage,
    background: Rgb<u8>,
}

impl Surface {
    pub fn new(width: u32, height: u32, background: Rgb<u8>) -> Self {
        Self { image: RgbImage::from_pixel(width, height, background), background }
    }

    pub fn width(&self) -> u32 { self.image.width() }
    pub fn height(&self) -> u32 { self.image.height() }
    pub fn background(&self) -> Rgb<u8> { self.background }

    pub fn clear(&mut self) {
        for pixel in self.image.pixels_mut() {
            *pixel = self.background;
        }
    }

    /// Strokes a round brush of diameter `width` along the segment.
    /// A zero-length segment leaves a single dot. Only the part of the segment
    /// within brush reach of the surface is walked.
    pub fn stroke_segment(&mut self, from: (f64, f64), to: (f64, f64), width: u32, color: Rgb<u8>) {
        let radius = (width / 2) as i32;
        let reach = f64::from(radius) + 1.0;
        let bounds = (
            -reach,
            -reach,
            f64::from(self.width()) - 1.0 + reach,
            f64::from(self.height()) - 1.0 + reach,
        );
        let Some((from, to)) = clip_segment(from, to, bounds) else { return };
        let start = (from.0 as f32, from.1 as f32);
        let end = (to.0 as f32, to.1 as f32);
        for point in BresenhamLineIter::new(start, end) {
            draw_filled_circle_mut(&mut self.image, point, radius, color);
        }
        draw_filled_circle_mut(&mut self.image, round(from), radius, color);
        draw_filled_circle_mut(&mut self.image, round(to), radius, color);
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb<u8>> {
        (x < self.width() && y < self.height()).then(|| *self.image.get_pixel(x, y))
    }

    pub fn is_blank(&self) -> bool {
        self.image.pixels().all(|p| *p == self.background)
    }

    pub fn as_raw(&self) -> &[u8] {
        self.image.as_raw()
    }

    pub fn encode_png(&self) -> anyhow::Result<Vec<u8>> {
        let mut out = Vec::new();
        PngEncoder::new(&mut out).write_image(self.image.as_raw(), self.width(), self.height(), ColorType::Rgb8)?;
        Ok(out)
    }
}

fn round(p: (f64, f64)) -> (i32, i32) {
    (p.0.round() as i32, p.1.round() as i32)
}

/// Liang-Barsky clip of a segment to `(min_x, min_y, max_x, max_y)`.
/// `None` when the segment misses the box or is not finite.
fn clip_segment(
    from: (f64, f64),
    to: (f64, f64),
    (min_x, min_y, max_x, max_y): (f64, f64, f64, f64),
) -> Option<((f64, f64), (f64, f64))> {
    if ![from.0, from.1, to.0, to.1].iter().all(|v| v.is_finite()) {
        return None;
    }
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    let (mut enter, mut leave) = (0.0_f64, 1.0_f64);
    for (p, q) in [(-dx, from.0 - min_x), (dx, max_x - from.0), (-dy, from.1 - min_y), (dy, max_y - from.1)] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let t = q / p;
        if p < 0.0 {
            if t > leave {
                return None;
            }
            enter = enter.max(t);
        } else {
            if t < enter {
                return None;
            }
            leave = leave.min(t);
        }
    }
    Some((
        (from.0 + enter * dx, from.1 + enter * dy),
        (from.0 + leave * dx, from.1 + leave * dy),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_surface_is_blank() {
        let surface = Surface::new(16, 8, WHITE);
        assert!(surface.is_blank());
        assert_eq!(surface.pixel(15, 7), Some(WHITE));
        assert_eq!(surface.pixel(16, 0), None);
    }

    #[test]
    fn stroke_clips_at_edges() {
        let mut surface = Surface::new(10, 10, WHITE);
        surface.stroke_segment((-20.0, 5.0), (30.0, 5.0), 4, BLACK);
        assert_eq!(surface.pixel(0, 5), Some(BLACK));
        assert_eq!(surface.pixel(9, 5), Some(BLACK));
        assert_eq!(surface.pixel(5, 0), Some(WHITE));
    }

    #[test]
    fn huge_coordinates_are_clipped_before_walking() {
        let mut surface = Surface::new(64, 64, WHITE);
        let started = std::time::Instant::now();
        surface.stroke_segment((0.0, 10.0), (5e9, 10.0), 4, BLACK);
        surface.stroke_segment((-5e9, -5e9), (5e9, 5e9), 4, BLACK);
        assert!(started.elapsed() < std::time::Duration::from_secs(1));
        assert_eq!(surface.pixel(0, 10), Some(BLACK));
        assert_eq!(surface.pixel(63, 10), Some(BLACK));
        assert_eq!(surface.pixel(32, 32), Some(BLACK));
        assert_eq!(surface.pixel(63, 0), Some(WHITE));
    }

    #[test]
    fn segment_outside_the_surface_draws_nothing() {
        let mut surface = Surface::new(16, 16, WHITE);
        surface.stroke_segment((1e6, 1e6), (2e6, 2e6), 4, BLACK);
        surface.stroke_segment((-100.0, 8.0), (-50.0, 8.0), 4, BLACK);
        surface.stroke_segment((f64::NAN, 0.0), (4.0, 4.0), 4, BLACK);
        assert!(surface.is_blank());
    }

    #[test]
    fn zero_length_segment_leaves_a_dot() {
        let mut surface = Surface::new(10, 10, WHITE);
        surface.stroke_segment((4.0, 4.0), (4.0, 4.0), 4, BLACK);
        assert_eq!(surface.pixel(4, 4), Some(BLACK));
        assert_eq!(surface.pixel(9, 9), Some(WHITE));
    }

    #[test]
    fn clear_restores_background() {
        let mut surface = Surface::new(10, 10, WHITE);
        surface.stroke_segment((0.0, 0.0), (9.0, 9.0), 4, BLACK);
        assert!(!surface.is_blank());
        surface.clear();
        assert!(surface.is_blank());
    }

    #[test]
    fn png_has_signature() {
        let png = Surface::new(4, 4, WHITE).encode_png().unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }
}
