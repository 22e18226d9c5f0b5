//! Demo host for the tinker debug console.
//!
//! Runs a tiny game world one frame per stdin line. The console starts
//! open; type commands such as `help`, `call player.Heal(5)` or
//! `call player@`. Keys go in angle brackets: `<tab>`, `<s-tab>`, `<up>`,
//! `<toggle>`, `<f1>`, `<wheel+1>`.
//!
//! Usage: `tinker-app [console.toml]`

mod host;
mod script;
mod world;

use std::io::{self, BufRead};
use std::path::Path;

use anyhow::{Context, Result};
use tinker_console::Console;
use tinker_types::config::ConsoleConfig;
use tinker_types::input::InputEvent;

use host::{DemoHost, StdoutSurface};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match std::env::args().nth(1) {
        Some(path) => ConsoleConfig::load(Path::new(&path))
            .with_context(|| format!("loading console config from {path}"))?,
        None => ConsoleConfig::default(),
    };
    let width = config.wrap_width;
    let toggle = config.toggle_key;

    let mut console = Console::new(config)?;
    console.session_mut().bind_function_key(0, "vsync false");
    console.session_mut().bind_function_key(1, "call paused = true");
    console.session_mut().bind_function_key(2, "call paused = false");

    let mut host = DemoHost::new();
    let mut surface = StdoutSurface { width };
    console.update(&[InputEvent::key(toggle)], &mut host);
    log::info!("Console open. Type 'help' for commands, 'exit' to quit.");

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        host.tick();
        console.update(&script::line_events(&line), &mut host);
        console.render(&mut surface);
        if !host.running {
            break;
        }
    }
    log::info!(
        "Shutting down (vsync {}, fixed {}, {} fps)",
        host.vsync,
        host.fixed_timestep,
        host.target_fps
    );
    Ok(())
}
