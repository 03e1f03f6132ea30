//! Terminal presentation of a board surface.
//!
//! Each terminal cell shows two vertically stacked surface blocks using the
//! upper half block glyph: foreground is the top block, background the bottom.

use image::Rgb;
use ratatui::{buffer::Buffer, layout::Rect, style::Color, widgets::Widget};

use crate::domain::surface::Surface;

pub struct SurfaceView<'a> {
    surface: &'a Surface,
}

impl<'a> SurfaceView<'a> {
    pub fn new(surface: &'a Surface) -> Self { Self { surface } }
}

impl Widget for SurfaceView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 { return; }
        let rows = u32::from(area.height) * 2;
        for row in 0..area.height {
            for col in 0..area.width {
                let top = block_color(self.surface, u32::from(col), u32::from(area.width), u32::from(row) * 2, rows);
                let bottom = block_color(self.surface, u32::from(col), u32::from(area.width), u32::from(row) * 2 + 1, rows);
                buf.get_mut(area.x + col, area.y + row)
                    .set_char('▀')
                    .set_fg(to_color(top))
                    .set_bg(to_color(bottom));
            }
        }
    }
}

/// Maps a terminal position inside `area` to surface coordinates (block centre).
pub fn to_surface(area: Rect, surface: &Surface, column: u16, row: u16) -> Option<(f64, f64)> {
    let inside = column >= area.x && column < area.x + area.width && row >= area.y && row < area.y + area.height;
    if !inside { return None; }
    let x = (f64::from(column - area.x) + 0.5) * f64::from(surface.width()) / f64::from(area.width);
    let y = (f64::from(row - area.y) + 0.5) * f64::from(surface.height()) / f64::from(area.height);
    Some((x, y))
}

/// First non-background pixel of the block, so thin strokes survive downscaling.
fn block_color(surface: &Surface, col: u32, cols: u32, row: u32, rows: u32) -> Rgb<u8> {
    let (x0, x1) = span(col, cols, surface.width());
    let (y0, y1) = span(row, rows, surface.height());
    let background = surface.background();
    for y in y0..y1 {
        for x in x0..x1 {
            match surface.pixel(x, y) {
                Some(p) if p != background => return p,
                _ => {}
            }
        }
    }
    background
}

fn span(index: u32, count: u32, extent: u32) -> (u32, u32) {
    let start = index * extent / count;
    let end = ((index + 1) * extent / count).max(start + 1).min(extent);
    (start, end)
}

fn to_color(Rgb([r, g, b]): Rgb<u8>) -> Color {
    Color::Rgb(r, g, b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::surface::{BLACK, WHITE};

    #[test]
    fn strokes_show_up_in_the_right_half_cell() {
        let mut surface = Surface::new(8, 8, WHITE);
        surface.stroke_segment((1.0, 1.0), (1.0, 1.0), 1, BLACK);
        let area = Rect::new(0, 0, 4, 2);
        let mut buf = Buffer::empty(area);
        SurfaceView::new(&surface).render(area, &mut buf);

        let cell = buf.get(0, 0);
        assert_eq!(cell.symbol(), "▀");
        assert_eq!(cell.fg, Color::Rgb(0, 0, 0));
        assert_eq!(cell.bg, Color::Rgb(255, 255, 255));
        assert_eq!(buf.get(3, 1).fg, Color::Rgb(255, 255, 255));
    }

    #[test]
    fn maps_cells_to_block_centres() {
        let surface = Surface::new(800, 600, WHITE);
        let area = Rect::new(2, 1, 80, 30);
        assert_eq!(to_surface(area, &surface, 2, 1), Some((5.0, 10.0)));
        assert_eq!(to_surface(area, &surface, 81, 30), Some((795.0, 590.0)));
        assert_eq!(to_surface(area, &surface, 1, 1), None);
        assert_eq!(to_surface(area, &surface, 82, 1), None);
    }
}
