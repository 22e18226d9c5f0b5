//! Command registry: registration, argument coercion and dispatch.
//!
//! Commands are registered explicitly with a name, a help line and a
//! signature of `name:kind[=default]` parameter specs. Dispatch looks the
//! name up case-insensitively, coerces each positional argument to its
//! parameter kind and runs the handler. Handler failures and panics are
//! reported to the scrollback and the log; they never reach the caller.

use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use tinker_eval::Value;
use tinker_eval::scan::is_identifier;
use tinker_types::color::Color;
use tinker_types::config::Palette;
use tinker_types::error::{ConsoleError, Result};

use crate::host::Host;
use crate::scrollback::ScrollBuffer;

/// Primitive kind of a command parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Int,
    Float,
    Bool,
}

impl ParamKind {
    /// Look up a kind by name. Accepts `integer`, `boolean` and `str` as
    /// aliases.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "string" | "str" => Some(Self::String),
            "int" | "integer" => Some(Self::Int),
            "float" => Some(Self::Float),
            "bool" | "boolean" => Some(Self::Bool),
            _ => None,
        }
    }

    /// Parse a textual argument.
    pub fn parse(self, text: &str) -> Option<Value> {
        match self {
            Self::String => Some(Value::Str(text.to_string())),
            Self::Int => text.parse::<i64>().ok().map(Value::Int),
            Self::Float => text
                .parse::<f32>()
                .ok()
                .filter(|x| x.is_finite())
                .map(Value::Float),
            Self::Bool => match text.to_ascii_lowercase().as_str() {
                "true" | "1" | "on" => Some(Value::Bool(true)),
                "false" | "0" | "off" => Some(Value::Bool(false)),
                _ => None,
            },
        }
    }

    /// Value used when an argument is missing or does not parse.
    pub fn zero(self) -> Value {
        match self {
            Self::String => Value::Str(String::new()),
            Self::Int => Value::Int(0),
            Self::Float => Value::Float(0.0),
            Self::Bool => Value::Bool(false),
        }
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::String => "string",
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
        })
    }
}

/// One declared command parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub name: String,
    pub kind: ParamKind,
    pub default: Option<Value>,
    /// Default as written in the signature, for usage strings.
    default_text: Option<String>,
}

impl ParamSpec {
    /// Parse a `name:kind[=default]` spec.
    pub fn parse(spec: &str) -> Result<Self> {
        let malformed = || ConsoleError::Registration(format!("malformed parameter spec '{spec}'"));
        let (name, rest) = spec.split_once(':').ok_or_else(malformed)?;
        if !is_identifier(name) {
            return Err(malformed());
        }
        let (kind_name, default_text) = match rest.split_once('=') {
            Some((kind, default)) => (kind, Some(default)),
            None => (rest, None),
        };
        let kind = ParamKind::from_name(kind_name).ok_or_else(|| {
            ConsoleError::Registration(format!("unsupported parameter kind '{kind_name}' in '{spec}'"))
        })?;
        let default = match default_text {
            Some(text) => Some(kind.parse(text).ok_or_else(|| {
                ConsoleError::Registration(format!("default '{text}' is not a valid {kind}"))
            })?),
            None => None,
        };
        Ok(Self {
            name: name.to_string(),
            kind,
            default,
            default_text: default_text.map(str::to_string),
        })
    }

    /// Parse a whitespace-separated signature.
    pub fn parse_signature(signature: &str) -> Result<Vec<Self>> {
        let params = signature
            .split_whitespace()
            .map(Self::parse)
            .collect::<Result<Vec<_>>>()?;
        for (i, p) in params.iter().enumerate() {
            if params[..i].iter().any(|q| q.name == p.name) {
                return Err(ConsoleError::Registration(format!(
                    "duplicate parameter '{}'",
                    p.name
                )));
            }
        }
        Ok(params)
    }

    /// Resolve a textual argument: parsed value, then default, then zero.
    fn resolve(&self, arg: Option<&str>) -> Value {
        arg.and_then(|text| self.kind.parse(text))
            .or_else(|| self.default.clone())
            .unwrap_or_else(|| self.kind.zero())
    }
}

impl fmt::Display for ParamSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.default_text {
            Some(default) => write!(f, "[{}:{}={}]", self.name, self.kind, default),
            None => write!(f, "[{}:{}]", self.name, self.kind),
        }
    }
}

/// Arguments coerced to their declared kinds, addressed by parameter name.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Args {
    values: Vec<(String, Value)>,
}

impl Args {
    /// Coerce positional arguments against a parameter list. Surplus
    /// arguments are joined into a trailing string parameter.
    pub fn coerce(params: &[ParamSpec], raw: &[&str]) -> Self {
        let mut values = Vec::with_capacity(params.len());
        for (i, param) in params.iter().enumerate() {
            let is_rest = i + 1 == params.len() && param.kind == ParamKind::String;
            let value = if is_rest && raw.len() > params.len() {
                Value::Str(raw[i..].join(" "))
            } else {
                param.resolve(raw.get(i).copied())
            };
            values.push((param.name.clone(), value));
        }
        Self { values }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn str(&self, name: &str) -> &str {
        match self.get(name) {
            Some(Value::Str(s)) => s,
            _ => "",
        }
    }

    pub fn int(&self, name: &str) -> i64 {
        self.get(name).and_then(|v| v.as_int().ok()).unwrap_or(0)
    }

    pub fn float(&self, name: &str) -> f32 {
        self.get(name).and_then(|v| v.as_float().ok()).unwrap_or(0.0)
    }

    pub fn bool(&self, name: &str) -> bool {
        self.get(name).and_then(|v| v.as_bool().ok()).unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Everything a command handler may touch while it runs.
pub struct Environment<'a> {
    pub host: &'a mut dyn Host,
    pub scrollback: &'a mut ScrollBuffer,
    pub palette: &'a Palette,
}

impl Environment<'_> {
    /// Print a line of regular output.
    pub fn print(&mut self, text: impl Into<String>) {
        let color = self.palette.output_color();
        self.scrollback.push(text, color);
    }

    /// Print a line in the info color.
    pub fn info(&mut self, text: impl Into<String>) {
        let color = self.palette.info_color();
        self.scrollback.push(text, color);
    }

    /// Print a line in the error color.
    pub fn error(&mut self, text: impl Into<String>) {
        let color = self.palette.error_color();
        self.scrollback.push(text, color);
    }

    /// Print a line in an explicit color.
    pub fn print_colored(&mut self, text: impl Into<String>, color: Color) {
        self.scrollback.push(text, color);
    }

    /// Report a failure: the message, then one line per evaluation frame.
    pub fn report(&mut self, err: &ConsoleError) {
        log::warn!("{err}");
        self.error(err.to_string());
        for frame in err.stack() {
            log::warn!("  at {frame}");
            self.error(format!("  at {frame}"));
        }
    }
}

/// A command body.
pub type Handler = Box<dyn Fn(&Args, &mut Environment<'_>) -> Result<()>>;

enum Action {
    /// Served by the registry itself, which needs access to every descriptor.
    Help,
    Run(Handler),
}

/// A registered command.
pub struct CommandDescriptor {
    pub name: String,
    pub help: String,
    pub params: Vec<ParamSpec>,
    action: Action,
}

impl CommandDescriptor {
    /// `name [param:kind=default] ...`
    pub fn usage(&self) -> String {
        let mut usage = self.name.clone();
        for p in &self.params {
            usage.push(' ');
            usage.push_str(&p.to_string());
        }
        usage
    }
}

impl fmt::Debug for CommandDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDescriptor")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// What happened to a dispatched command. Informational only: every
/// failure has already been reported to the scrollback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Completed,
    UnknownCommand,
    Failed,
}

/// Registry of console commands keyed by lowercase name.
pub struct CommandRegistry {
    commands: HashMap<String, CommandDescriptor>,
}

impl CommandRegistry {
    /// A registry holding only `help`.
    pub fn new() -> Self {
        let mut commands = HashMap::new();
        commands.insert(
            "help".to_string(),
            CommandDescriptor {
                name: "help".to_string(),
                help: "List commands, or show usage for one command".to_string(),
                params: vec![ParamSpec {
                    name: "name".to_string(),
                    kind: ParamKind::String,
                    default: None,
                    default_text: None,
                }],
                action: Action::Help,
            },
        );
        Self { commands }
    }

    /// Register a command.
    ///
    /// Fails on a duplicate name (case-insensitive) or an invalid signature.
    pub fn register<F>(&mut self, name: &str, help: &str, signature: &str, handler: F) -> Result<()>
    where
        F: Fn(&Args, &mut Environment<'_>) -> Result<()> + 'static,
    {
        if name.is_empty() || name.chars().any(char::is_whitespace) {
            return Err(ConsoleError::Registration(format!(
                "invalid command name '{name}'"
            )));
        }
        let key = name.to_lowercase();
        if self.commands.contains_key(&key) {
            return Err(ConsoleError::Registration(format!(
                "command '{name}' is already registered"
            )));
        }
        let params = ParamSpec::parse_signature(signature)?;
        log::debug!("Registered command {name} ({} params)", params.len());
        self.commands.insert(
            key,
            CommandDescriptor {
                name: name.to_string(),
                help: help.to_string(),
                params,
                action: Action::Run(Box::new(handler)),
            },
        );
        Ok(())
    }

    /// Look up a command by name, ignoring case.
    pub fn get(&self, name: &str) -> Option<&CommandDescriptor> {
        self.commands.get(&name.to_lowercase())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.commands.values().map(|c| c.name.clone()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Run a command by name with textual arguments.
    pub fn dispatch(&self, name: &str, args: &[&str], env: &mut Environment<'_>) -> Dispatch {
        let Some(cmd) = self.get(name) else {
            let err = ConsoleError::UnknownCommand(name.to_string());
            log::warn!("{err}");
            env.error(err.to_string());
            return Dispatch::UnknownCommand;
        };
        let args = Args::coerce(&cmd.params, args);
        let result = match &cmd.action {
            Action::Help => self.help(args.str("name"), env),
            Action::Run(handler) => {
                panic::catch_unwind(AssertUnwindSafe(|| handler(&args, env))).unwrap_or_else(
                    |payload| {
                        Err(ConsoleError::Command(format!(
                            "{} panicked: {}",
                            cmd.name,
                            panic_message(payload.as_ref())
                        )))
                    },
                )
            },
        };
        match result {
            Ok(()) => Dispatch::Completed,
            Err(e) => {
                env.report(&e);
                Dispatch::Failed
            },
        }
    }

    /// Split a submitted line on whitespace and dispatch it.
    pub fn dispatch_line(&self, line: &str, env: &mut Environment<'_>) -> Dispatch {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Dispatch::Completed;
        };
        let args: Vec<&str> = words.collect();
        self.dispatch(name, &args, env)
    }

    fn help(&self, name: &str, env: &mut Environment<'_>) -> Result<()> {
        if name.is_empty() {
            env.info(format!("Commands: {}", self.names().join(", ")));
            return Ok(());
        }
        let cmd = self
            .get(name)
            .ok_or_else(|| ConsoleError::UnknownCommand(name.to_string()))?;
        let usage = cmd.usage();
        let help = cmd.help.clone();
        env.info(usage);
        if !help.is_empty() {
            env.info(help);
        }
        Ok(())
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::testing::RecordingHost;

    struct Fixture {
        host: RecordingHost,
        scrollback: ScrollBuffer,
        palette: Palette,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                host: RecordingHost::default(),
                scrollback: ScrollBuffer::new(50),
                palette: Palette::default(),
            }
        }

        fn env(&mut self) -> Environment<'_> {
            Environment {
                host: &mut self.host,
                scrollback: &mut self.scrollback,
                palette: &self.palette,
            }
        }

        fn lines(&self) -> Vec<String> {
            self.scrollback.iter().rev().map(|l| l.text.clone()).collect()
        }
    }

    // -------------------------------------------------------------------
    // Parameter specs
    // -------------------------------------------------------------------

    #[test]
    fn kind_aliases() {
        assert_eq!(ParamKind::from_name("integer"), Some(ParamKind::Int));
        assert_eq!(ParamKind::from_name("Boolean"), Some(ParamKind::Bool));
        assert_eq!(ParamKind::from_name("str"), Some(ParamKind::String));
        assert_eq!(ParamKind::from_name("vec3"), None);
    }

    #[test]
    fn spec_with_default() {
        let p = ParamSpec::parse("enabled:bool=true").unwrap();
        assert_eq!(p.name, "enabled");
        assert_eq!(p.kind, ParamKind::Bool);
        assert_eq!(p.default, Some(Value::Bool(true)));
        assert_eq!(p.to_string(), "[enabled:bool=true]");
    }

    #[test]
    fn usage_lists_params() {
        let mut reg = CommandRegistry::new();
        reg.register("warp", "", "x:float y:float=0 label:string", |_, _| Ok(()))
            .unwrap();
        assert_eq!(
            reg.get("warp").unwrap().usage(),
            "warp [x:float] [y:float=0] [label:string]"
        );
    }

    #[test]
    fn invalid_signatures_are_rejected() {
        for sig in ["x", "x:vec3", "x:int=abc", "1x:int", "a:int a:bool"] {
            let mut reg = CommandRegistry::new();
            let err = reg.register("cmd", "", sig, |_, _| Ok(())).unwrap_err();
            assert!(matches!(err, ConsoleError::Registration(_)), "{sig}");
        }
    }

    #[test]
    fn duplicate_names_ignore_case() {
        let mut reg = CommandRegistry::new();
        reg.register("Spawn", "", "", |_, _| Ok(())).unwrap();
        assert!(reg.register("spawn", "", "", |_, _| Ok(())).is_err());
        assert!(reg.register("HELP", "", "", |_, _| Ok(())).is_err());
    }

    // -------------------------------------------------------------------
    // Argument coercion
    // -------------------------------------------------------------------

    #[test]
    fn coercion_falls_back_to_default_then_zero() {
        let params = ParamSpec::parse_signature("n:int m:int=7 f:float b:bool").unwrap();
        let args = Args::coerce(&params, &["x", "nope", "2.5"]);
        assert_eq!(args.int("n"), 0);
        assert_eq!(args.int("m"), 7);
        assert_eq!(args.float("f"), 2.5);
        assert!(!args.bool("b"));
        assert_eq!(args.str("missing"), "");
    }

    #[test]
    fn surplus_joins_into_trailing_string() {
        let params = ParamSpec::parse_signature("count:int text:string").unwrap();
        let args = Args::coerce(&params, &["3", "x", "=", "1"]);
        assert_eq!(args.int("count"), 3);
        assert_eq!(args.str("text"), "x = 1");
    }

    #[test]
    fn surplus_dropped_without_trailing_string() {
        let params = ParamSpec::parse_signature("count:int").unwrap();
        let args = Args::coerce(&params, &["3", "4"]);
        assert_eq!(args.len(), 1);
        assert_eq!(args.int("count"), 3);
    }

    // -------------------------------------------------------------------
    // Dispatch
    // -------------------------------------------------------------------

    #[test]
    fn dispatch_is_case_insensitive() {
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        let mut reg = CommandRegistry::new();
        reg.register("Ping", "", "", move |_, _| {
            counter.set(counter.get() + 1);
            Ok(())
        })
        .unwrap();
        let mut fx = Fixture::new();
        assert_eq!(reg.dispatch("PING", &[], &mut fx.env()), Dispatch::Completed);
        assert_eq!(reg.dispatch("ping", &[], &mut fx.env()), Dispatch::Completed);
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn unknown_command_is_reported_not_raised() {
        let reg = CommandRegistry::new();
        let mut fx = Fixture::new();
        assert_eq!(reg.dispatch("zzz", &[], &mut fx.env()), Dispatch::UnknownCommand);
        let lines = fx.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("zzz"));
        assert_eq!(fx.scrollback.get(0).unwrap().color, fx.palette.error_color());
    }

    #[test]
    fn handler_error_reports_message_and_stack() {
        let mut reg = CommandRegistry::new();
        reg.register("boom", "", "", |_, _| {
            Err(ConsoleError::DivideByZero.traced(|| vec!["a / b".into(), "go(..)".into()]))
        })
        .unwrap();
        let mut fx = Fixture::new();
        assert_eq!(reg.dispatch("boom", &[], &mut fx.env()), Dispatch::Failed);
        assert_eq!(fx.lines(), vec!["division by zero", "  at a / b", "  at go(..)"]);
    }

    #[test]
    fn handler_panic_is_caught() {
        let mut reg = CommandRegistry::new();
        reg.register("crash", "", "", |_, _| panic!("kaboom")).unwrap();
        let mut fx = Fixture::new();
        assert_eq!(reg.dispatch("crash", &[], &mut fx.env()), Dispatch::Failed);
        assert!(fx.lines()[0].contains("kaboom"));
    }

    #[test]
    fn dispatch_line_splits_words() {
        let seen = Rc::new(Cell::new(0));
        let sink = Rc::clone(&seen);
        let mut reg = CommandRegistry::new();
        reg.register("add", "", "a:int b:int", move |args, _| {
            sink.set(args.int("a") + args.int("b"));
            Ok(())
        })
        .unwrap();
        let mut fx = Fixture::new();
        reg.dispatch_line("  add   2  40 ", &mut fx.env());
        assert_eq!(seen.get(), 42);
        assert_eq!(reg.dispatch_line("   ", &mut fx.env()), Dispatch::Completed);
    }

    #[test]
    fn help_lists_sorted_names() {
        let mut reg = CommandRegistry::new();
        reg.register("zoom", "", "", |_, _| Ok(())).unwrap();
        reg.register("alpha", "", "", |_, _| Ok(())).unwrap();
        let mut fx = Fixture::new();
        reg.dispatch_line("help", &mut fx.env());
        assert_eq!(fx.lines(), vec!["Commands: alpha, help, zoom"]);
    }

    #[test]
    fn help_for_one_command() {
        let mut reg = CommandRegistry::new();
        reg.register("vsync", "Toggle vsync", "enabled:bool=true", |_, _| Ok(()))
            .unwrap();
        let mut fx = Fixture::new();
        reg.dispatch_line("help VSYNC", &mut fx.env());
        assert_eq!(fx.lines(), vec!["vsync [enabled:bool=true]", "Toggle vsync"]);
        assert_eq!(reg.dispatch_line("help nope", &mut fx.env()), Dispatch::Failed);
    }
}
