//! Interactive debug console for a frame-driven host application.
//!
//! A [`Console`] owns the session state machine, the command registry and
//! the expression evaluator. The host feeds it input events once per frame
//! through [`Console::update`] and draws it through a [`ConsoleSurface`].
//! Everything the console asks of the application goes through [`Host`].

mod builtins;
mod completion;
mod console;
mod history;
mod host;
mod registry;
mod scrollback;
mod session;
#[cfg(test)]
mod testing;
pub mod wrap;

/// Register the built-in commands into a registry.
pub use builtins::register_builtins;
/// Tab-completion engine and its candidate sources.
pub use completion::{Completion, CompletionEngine, CompletionSource, Direction, LiveSource, cycle};
/// Session, registry and evaluator bundled for a host.
pub use console::Console;
/// Submitted-line history.
pub use history::HistoryList;
/// Services the host application provides.
pub use host::Host;
/// Command registration and dispatch.
pub use registry::{
    Args, CommandDescriptor, CommandRegistry, Dispatch, Environment, Handler, ParamKind, ParamSpec,
};
/// Bounded output buffer.
pub use scrollback::{ConsoleLine, ScrollBuffer};
/// Console state machine and rendering sink.
pub use session::{ConsoleSession, ConsoleSurface, FUNCTION_SLOTS};
