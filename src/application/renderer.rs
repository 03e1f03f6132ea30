use image::Rgb;

use crate::domain::command::Command;
use crate::domain::surface::{Surface, BLACK, WHITE};

pub const STROKE_WIDTH: u32 = 4;

/// Maps commands onto a surface. Holds no state besides its style, so the
/// pixels are a function of the commands applied and their order.
#[derive(Debug, Clone, Copy)]
pub struct Renderer {
    pub stroke_width: u32,
    pub stroke_color: Rgb<u8>,
    pub background: Rgb<u8>,
}

impl Default for Renderer {
    fn default() -> Self {
        Self { stroke_width: STROKE_WIDTH, stroke_color: BLACK, background: WHITE }
    }
}

impl Renderer {
    pub fn new_surface(&self, width: u32, height: u32) -> Surface {
        Surface::new(width, height, self.background)
    }

    pub fn apply(&self, surface: &mut Surface, command: &Command) {
        match *command {
            Command::Line { x, y, px, py } => {
                surface.stroke_segment((px, py), (x, y), self.stroke_width, self.stroke_color)
            }
            Command::Clear => surface.clear(),
        }
    }

    /// Builds a surface from a full command history.
    pub fn replay<'a>(&self, width: u32, height: u32, commands: impl IntoIterator<Item = &'a Command>) -> Surface {
        let mut surface = self.new_surface(width, height);
        for command in commands {
            self.apply(&mut surface, command);
        }
        surface
    }
}
