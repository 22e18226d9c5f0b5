//! Host side of the demo: application state and the stdout surface.

use tinker_console::{ConsoleSurface, Host};
use tinker_eval::Value;
use tinker_types::color::Color;

use crate::world::Game;

/// Application settings the console can change.
pub struct DemoHost {
    root: Value,
    pub running: bool,
    pub vsync: bool,
    pub fixed_timestep: bool,
    pub target_fps: f32,
    pub input_enabled: bool,
}

impl DemoHost {
    pub fn new() -> Self {
        Self {
            root: Value::object(Game::new()),
            running: true,
            vsync: true,
            fixed_timestep: false,
            target_fps: 60.0,
            input_enabled: true,
        }
    }

    /// Advance the simulation by one frame.
    pub fn tick(&mut self) {
        let ticked = tinker_eval::reflect::with_mut(&self.root, |g: &mut Game| {
            if !g.paused {
                g.frame += 1;
            }
        });
        if let Err(e) = ticked {
            log::warn!("Frame skipped: {e}");
        }
    }
}

impl Host for DemoHost {
    fn root(&self) -> Value {
        self.root.clone()
    }

    fn request_exit(&mut self) {
        self.running = false;
    }

    fn set_vsync(&mut self, enabled: bool) {
        self.vsync = enabled;
    }

    fn set_fixed_timestep(&mut self, enabled: bool) {
        self.fixed_timestep = enabled;
    }

    fn set_target_framerate(&mut self, fps: f32) {
        self.target_fps = fps;
    }

    fn set_input_enabled(&mut self, enabled: bool) {
        log::debug!("Game input {}", if enabled { "enabled" } else { "disabled" });
        self.input_enabled = enabled;
    }
}

/// Prints rendered console lines to stdout, tinted with ANSI true color.
pub struct StdoutSurface {
    pub width: usize,
}

impl ConsoleSurface for StdoutSurface {
    fn width(&self) -> usize {
        self.width
    }

    fn draw_line(&mut self, text: &str, color: Color) {
        println!("\x1b[38;2;{};{};{}m{text}\x1b[0m", color.r, color.g, color.b);
    }
}
