//! The console as a host embeds it.

use tinker_eval::{EvalOptions, Evaluator};
use tinker_types::config::ConsoleConfig;
use tinker_types::error::Result;
use tinker_types::input::InputEvent;

use crate::builtins::register_builtins;
use crate::host::Host;
use crate::registry::{CommandRegistry, Dispatch};
use crate::session::{ConsoleSession, ConsoleSurface};

/// Session, command registry and evaluator bundled for a host frame loop.
pub struct Console {
    session: ConsoleSession,
    registry: CommandRegistry,
    evaluator: Evaluator,
}

impl Console {
    /// Create a console with the built-in commands registered.
    pub fn new(config: ConsoleConfig) -> Result<Self> {
        let mut registry = CommandRegistry::new();
        register_builtins(&mut registry, &config)?;
        let evaluator = Evaluator::new(EvalOptions {
            strict_operators: config.strict_operators,
        });
        log::info!("Console ready with {} commands", registry.len());
        Ok(Self {
            session: ConsoleSession::new(config),
            registry,
            evaluator,
        })
    }

    /// Registry for host-specific commands.
    pub fn registry_mut(&mut self) -> &mut CommandRegistry {
        &mut self.registry
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn session(&self) -> &ConsoleSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut ConsoleSession {
        &mut self.session
    }

    pub fn is_open(&self) -> bool {
        self.session.is_open()
    }

    /// Process one host frame of input.
    pub fn update(&mut self, events: &[InputEvent], host: &mut dyn Host) {
        self.session.begin_frame();
        for event in events {
            self.session
                .handle_event(event, &self.registry, &self.evaluator, host);
        }
    }

    /// Run a command line as if it had been typed and submitted.
    pub fn execute(&mut self, line: &str, host: &mut dyn Host) -> Dispatch {
        self.session.submit(line, &self.registry, host)
    }

    pub fn render(&self, surface: &mut dyn ConsoleSurface) {
        self.session.render(surface);
    }
}

#[cfg(test)]
mod tests {
    use tinker_types::input::Key;

    use super::*;
    use crate::testing::RecordingHost;

    #[test]
    fn host_commands_can_be_added() {
        let mut console = Console::new(ConsoleConfig::default()).unwrap();
        console
            .registry_mut()
            .register("god", "Toggle invulnerability", "on:bool=true", |args, env| {
                env.print(format!("god mode {}", args.bool("on")));
                Ok(())
            })
            .unwrap();
        let mut host = RecordingHost::default();
        assert_eq!(console.execute("god", &mut host), Dispatch::Completed);
        let newest = console.session().scrollback().get(0).unwrap();
        assert_eq!(newest.text, "god mode true");
    }

    #[test]
    fn update_drives_the_session() {
        let mut console = Console::new(ConsoleConfig::default()).unwrap();
        let mut host = RecordingHost::default();
        console.update(&[InputEvent::key(Key::Backquote)], &mut host);
        assert!(console.is_open());
        let mut events: Vec<InputEvent> = "call 5-2*2".chars().map(InputEvent::Text).collect();
        events.push(InputEvent::key(Key::Enter));
        console.update(&events, &mut host);
        assert_eq!(console.session().scrollback().get(0).unwrap().text, "1");
    }

    #[test]
    fn strict_console_rejects_missing_operators() {
        let config = ConsoleConfig {
            strict_operators: true,
            ..ConsoleConfig::default()
        };
        let mut console = Console::new(config).unwrap();
        let mut host = RecordingHost::default();
        assert_eq!(console.execute("call player + 1", &mut host), Dispatch::Failed);
    }
}
