//! Console session: open/closed state, line editing, history, scrollback.

use tinker_eval::Evaluator;
use tinker_types::color::Color;
use tinker_types::config::ConsoleConfig;
use tinker_types::input::{InputEvent, Key};

use crate::completion::{CompletionEngine, Direction, LiveSource};
use crate::history::HistoryList;
use crate::host::Host;
use crate::registry::{CommandRegistry, Dispatch, Environment};
use crate::scrollback::ScrollBuffer;
use crate::wrap::wrap_lines;

/// Number of function-key slots (`F1`..`F12`).
pub const FUNCTION_SLOTS: usize = 12;

/// Sink for rendered console lines.
pub trait ConsoleSurface {
    /// Line width in characters.
    fn width(&self) -> usize;

    fn draw_line(&mut self, text: &str, color: Color);
}

/// Interactive state of the console.
pub struct ConsoleSession {
    config: ConsoleConfig,
    open: bool,
    frame: u64,
    /// Frame in which the console last closed.
    closed_frame: Option<u64>,
    buffer: String,
    /// Cursor offset from the end of the buffer, in chars.
    cursor: usize,
    history: HistoryList,
    /// History entry shown by Up/Down; `None` is the live buffer.
    seek: Option<usize>,
    scrollback: ScrollBuffer,
    scroll: usize,
    completion: CompletionEngine,
    bindings: [Option<String>; FUNCTION_SLOTS],
}

impl ConsoleSession {
    pub fn new(config: ConsoleConfig) -> Self {
        Self {
            history: HistoryList::new(config.max_history),
            scrollback: ScrollBuffer::new(config.max_lines),
            completion: CompletionEngine::new(
                config.expression_prefix.clone(),
                config.space_placeholder,
            ),
            config,
            open: false,
            frame: 0,
            closed_frame: None,
            buffer: String::new(),
            cursor: 0,
            seek: None,
            scroll: 0,
            bindings: Default::default(),
        }
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Cursor offset from the end of the buffer.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroll
    }

    pub fn history(&self) -> &HistoryList {
        &self.history
    }

    pub fn scrollback(&self) -> &ScrollBuffer {
        &self.scrollback
    }

    /// Print a line of output.
    pub fn print(&mut self, text: impl Into<String>) {
        let color = self.config.palette.output_color();
        self.scrollback.push(text, color);
    }

    /// Bind a command line to a function-key slot (0 is `F1`).
    pub fn bind_function_key(&mut self, slot: usize, line: impl Into<String>) -> bool {
        match self.bindings.get_mut(slot) {
            Some(binding) => {
                *binding = Some(line.into());
                true
            },
            None => false,
        }
    }

    /// Start a new host frame.
    pub fn begin_frame(&mut self) {
        self.frame += 1;
    }

    /// Process one input event.
    pub fn handle_event(
        &mut self,
        event: &InputEvent,
        registry: &CommandRegistry,
        evaluator: &Evaluator,
        host: &mut dyn Host,
    ) {
        match *event {
            InputEvent::KeyPress { key, shift } => {
                if key == self.config.toggle_key {
                    if self.open {
                        self.close(host);
                    } else {
                        self.open(host);
                    }
                } else if let Some(slot) = key.function_slot() {
                    self.fire_binding(slot, registry, host);
                } else if self.open {
                    self.handle_key(key, shift, registry, evaluator, host);
                }
            },
            InputEvent::Text(c) if self.open => self.insert(c),
            InputEvent::Wheel(delta) if self.open => self.scroll_by(delta),
            InputEvent::Text(_) | InputEvent::Wheel(_) => {},
        }
    }

    /// Open the console. Ignored if it closed earlier in this frame.
    pub fn open(&mut self, host: &mut dyn Host) {
        if self.open || self.closed_frame == Some(self.frame) {
            return;
        }
        self.open = true;
        self.scroll = 0;
        if self.config.suppress_input {
            host.set_input_enabled(false);
        }
        log::info!("Console opened");
    }

    pub fn close(&mut self, host: &mut dyn Host) {
        if !self.open {
            return;
        }
        self.open = false;
        self.closed_frame = Some(self.frame);
        self.completion.reset();
        if self.config.suppress_input {
            host.set_input_enabled(true);
        }
        log::info!("Console closed");
    }

    /// Submit a line as if typed: record, echo and dispatch it.
    pub fn submit(
        &mut self,
        line: &str,
        registry: &CommandRegistry,
        host: &mut dyn Host,
    ) -> Dispatch {
        self.history.push(line);
        let echo = self.config.palette.echo_color();
        self.scrollback.push(format!("> {line}"), echo);
        let mut env = Environment {
            host,
            scrollback: &mut self.scrollback,
            palette: &self.config.palette,
        };
        registry.dispatch_line(line, &mut env)
    }

    /// Emit the visible scrollback window and the prompt line.
    pub fn render(&self, surface: &mut dyn ConsoleSurface) {
        if !self.open {
            return;
        }
        let width = surface.width();
        let visible: Vec<_> = self
            .scrollback
            .window(self.scroll, self.config.visible_lines)
            .collect();
        for line in visible.into_iter().rev() {
            for part in wrap_lines(&line.text, width) {
                surface.draw_line(&part, line.color);
            }
        }
        let split = self.insert_index();
        let before: String = self.buffer.chars().take(split).collect();
        let after: String = self.buffer.chars().skip(split).collect();
        let prompt = format!("> {before}|{after}");
        for part in wrap_lines(&prompt, width) {
            surface.draw_line(&part, self.config.palette.echo_color());
        }
    }

    fn handle_key(
        &mut self,
        key: Key,
        shift: bool,
        registry: &CommandRegistry,
        evaluator: &Evaluator,
        host: &mut dyn Host,
    ) {
        if key != Key::Tab {
            self.completion.reset();
        }
        match key {
            Key::Escape => self.close(host),
            Key::Enter => {
                if self.buffer.is_empty() {
                    return;
                }
                let line = std::mem::take(&mut self.buffer);
                self.cursor = 0;
                self.seek = None;
                self.submit(&line, registry, host);
            },
            Key::Backspace => {
                let idx = self.insert_index();
                if idx > 0 {
                    self.remove_char(idx - 1);
                }
            },
            Key::Delete => {
                self.buffer.clear();
                self.cursor = 0;
            },
            Key::Up => {
                let next = self.seek.map_or(0, |s| s + 1);
                if let Some(entry) = self.history.get(next) {
                    self.buffer = entry.to_string();
                    self.seek = Some(next);
                    self.cursor = 0;
                }
            },
            Key::Down => match self.seek {
                Some(s) if s > 0 => {
                    self.buffer = self.history.get(s - 1).unwrap_or_default().to_string();
                    self.seek = Some(s - 1);
                    self.cursor = 0;
                },
                _ => {
                    self.seek = None;
                    self.buffer.clear();
                    self.cursor = 0;
                },
            },
            Key::Left => self.cursor = (self.cursor + 1).min(self.buffer.chars().count()),
            Key::Right => self.cursor = self.cursor.saturating_sub(1),
            Key::Tab => {
                let direction = if shift {
                    Direction::Backward
                } else {
                    Direction::Forward
                };
                let root = host.root();
                let source = LiveSource {
                    registry,
                    evaluator,
                    root: &root,
                };
                if let Some(done) =
                    self.completion
                        .complete(&self.buffer, self.cursor, direction, &source)
                {
                    self.buffer = done.buffer;
                    self.cursor = done.cursor;
                }
            },
            Key::Backquote | Key::F(_) => {},
        }
    }

    fn insert(&mut self, c: char) {
        if c.is_control() || self.is_toggle_char(c) {
            return;
        }
        self.completion.reset();
        let idx = self.insert_index();
        let byte = self.byte_offset(idx);
        self.buffer.insert(byte, c);
    }

    fn remove_char(&mut self, idx: usize) {
        let byte = self.byte_offset(idx);
        if byte < self.buffer.len() {
            self.buffer.remove(byte);
        }
    }

    /// Char index the cursor sits at.
    fn insert_index(&self) -> usize {
        self.buffer.chars().count().saturating_sub(self.cursor)
    }

    fn byte_offset(&self, idx: usize) -> usize {
        self.buffer
            .char_indices()
            .nth(idx)
            .map_or(self.buffer.len(), |(i, _)| i)
    }

    fn is_toggle_char(&self, c: char) -> bool {
        self.config.toggle_key == Key::Backquote && matches!(c, '`' | '~')
    }

    fn scroll_by(&mut self, delta: i32) {
        let max = self.scrollback.len() as i64;
        self.scroll = (self.scroll as i64 + i64::from(delta)).clamp(0, max) as usize;
    }

    fn fire_binding(&mut self, slot: usize, registry: &CommandRegistry, host: &mut dyn Host) {
        let Some(line) = self.bindings.get(slot).cloned().flatten() else {
            return;
        };
        log::info!("F{} -> {line}", slot + 1);
        let mut env = Environment {
            host,
            scrollback: &mut self.scrollback,
            palette: &self.config.palette,
        };
        registry.dispatch_line(&line, &mut env);
    }
}
