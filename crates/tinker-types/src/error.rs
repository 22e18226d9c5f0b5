//! Error types for the tinker console.

use std::io;

/// Errors produced by the console, the command registry and the evaluator.
#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    #[error("Command '{0}' not found. Type 'help' for a list of commands.")]
    UnknownCommand(String),

    #[error("registration error: {0}")]
    Registration(String),

    #[error("command error: {0}")]
    Command(String),

    #[error("syntax error at column {pos}: {message}")]
    Syntax { pos: usize, message: String },

    #[error("'{name}' is not a field or member of {owner}")]
    UnresolvedMember { name: String, owner: String },

    #[error("no compatible overload of {owner}.{name} for ({args})")]
    NoCompatibleOverload {
        owner: String,
        name: String,
        args: String,
    },

    #[error("'{0}' is not a type")]
    NotAType(String),

    #[error("operator {op} is not defined for {left} and {right}")]
    NoOperator {
        op: String,
        left: String,
        right: String,
    },

    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("{owner}.{name} is read-only")]
    ReadOnly { owner: String, name: String },

    #[error("null reference while accessing '{0}'")]
    NullReference(String),

    #[error("{owner}.{name} is an instance member and needs an object")]
    InstanceRequired { owner: String, name: String },

    #[error("division by zero")]
    DivideByZero,

    #[error("evaluation error: {0}")]
    Eval(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// An evaluation failure together with the evaluation frames that were
    /// active when it happened, innermost first.
    #[error("{error}")]
    Traced {
        #[source]
        error: Box<ConsoleError>,
        stack: Vec<String>,
    },
}

impl ConsoleError {
    /// Shorthand for a syntax error at a character column.
    pub fn syntax(pos: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            pos,
            message: message.into(),
        }
    }

    /// Attach an evaluation stack. Already traced errors keep their
    /// original (deeper) stack.
    pub fn traced(self, stack: impl FnOnce() -> Vec<String>) -> Self {
        match self {
            Self::Traced { .. } => self,
            other => Self::Traced {
                error: Box::new(other),
                stack: stack(),
            },
        }
    }

    /// Evaluation frames recorded for this error (empty if untraced).
    pub fn stack(&self) -> &[String] {
        match self {
            Self::Traced { stack, .. } => stack,
            _ => &[],
        }
    }

    /// The underlying error with any trace wrapper removed.
    pub fn root_cause(&self) -> &ConsoleError {
        match self {
            Self::Traced { error, .. } => error.root_cause(),
            other => other,
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, ConsoleError>;
