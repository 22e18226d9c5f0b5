//! Built-in console commands.

use tinker_eval::{EvalOptions, Evaluator, Outcome};
use tinker_types::config::ConsoleConfig;
use tinker_types::error::Result;

use crate::registry::CommandRegistry;

/// Register `clear`, `exit`, `vsync`, `fixed`, `framerate` and `call`.
/// `help` is built into the registry.
pub fn register_builtins(reg: &mut CommandRegistry, config: &ConsoleConfig) -> Result<()> {
    reg.register("clear", "Clear the console output", "", |_, env| {
        env.scrollback.clear();
        Ok(())
    })?;

    reg.register("exit", "Quit the application", "", |_, env| {
        log::info!("Exit requested from console");
        env.host.request_exit();
        Ok(())
    })?;

    reg.register("vsync", "Enable or disable vertical sync", "enabled:bool=true", |args, env| {
        let enabled = args.bool("enabled");
        log::info!("vsync {}", if enabled { "on" } else { "off" });
        env.host.set_vsync(enabled);
        Ok(())
    })?;

    reg.register(
        "fixed",
        "Enable or disable the fixed simulation timestep",
        "enabled:bool=true",
        |args, env| {
            let enabled = args.bool("enabled");
            log::info!("fixed timestep {}", if enabled { "on" } else { "off" });
            env.host.set_fixed_timestep(enabled);
            Ok(())
        },
    )?;

    reg.register("framerate", "Set the target frame rate", "fps:float", |args, env| {
        let fps = args.float("fps");
        if fps == 0.0 {
            return Ok(());
        }
        log::info!("Target framerate set to {fps}");
        env.host.set_target_framerate(fps);
        Ok(())
    })?;

    let evaluator = Evaluator::new(EvalOptions {
        strict_operators: config.strict_operators,
    });
    let placeholder = config.space_placeholder;
    reg.register(
        "call",
        "Evaluate an expression against the game state; end it with @ to list members",
        "expression:string",
        move |args, env| {
            let source = args.str("expression").replace(placeholder, " ");
            log::debug!("call {source}");
            let root = env.host.root();
            match evaluator.evaluate(&source, &root)? {
                Outcome::Value(value) => env.print(value.to_string()),
                Outcome::Members(members) => {
                    for member in members {
                        env.print(member.to_string());
                    }
                },
            }
            Ok(())
        },
    )?;

    Ok(())
}
