//! The boundary between the console and the application hosting it.

use tinker_eval::Value;

/// Services the hosting application provides to the console.
///
/// Built-in commands reach the application only through this trait.
pub trait Host {
    /// Object that unqualified expressions resolve against.
    fn root(&self) -> Value;

    /// Ask the application to shut down.
    fn request_exit(&mut self);

    fn set_vsync(&mut self, enabled: bool);

    fn set_fixed_timestep(&mut self, enabled: bool);

    fn set_target_framerate(&mut self, fps: f32);

    /// Enable or disable the application's own input handling. Called when
    /// the console opens or closes with input suppression on.
    fn set_input_enabled(&mut self, enabled: bool) {
        log::debug!("Host input {}", if enabled { "enabled" } else { "disabled" });
    }
}
