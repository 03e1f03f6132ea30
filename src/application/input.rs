use crate::domain::command::Command;

/// Pointer state between event-loop ticks.
///
/// Press, drag and release events only update the state; `sample` is called
/// once per tick and turns the movement since the previous tick into a line.
#[derive(Debug, Clone, Copy, Default)]
pub struct PointerTracker {
    pressed: bool,
    current: (f64, f64),
    previous: (f64, f64),
    pending_dot: bool,
}

impl PointerTracker {
    pub fn press(&mut self, x: f64, y: f64) {
        self.pressed = true;
        self.current = (x, y);
        self.previous = (x, y);
        self.pending_dot = true;
    }

    pub fn drag(&mut self, x: f64, y: f64) {
        if self.pressed {
            self.current = (x, y);
        }
    }

    pub fn release(&mut self) {
        self.pressed = false;
        self.pending_dot = false;
    }

    pub fn is_pressed(&self) -> bool { self.pressed }

    pub fn sample(&mut self) -> Option<Command> {
        if !self.pressed {
            return None;
        }
        if self.current == self.previous && !self.pending_dot {
            return None;
        }
        let command = Command::line(self.previous, self.current);
        self.previous = self.current;
        self.pending_dot = false;
        Some(command)
    }
}
