//! Error taxonomy for the interpreter core.
//!
//! Every fallible operation in this crate returns a `Result<T, ForthError>`.
//! Nothing reachable from the public API panics on untrusted input; the
//! only panics left in the tree are `debug_assert!`s guarding internal
//! invariants that a caller cannot violate through the public surface.

use std::fmt;

/// Where an error occurred, for diagnostics and the `on_error` hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub stream: String,
    pub line: usize,
    pub column: usize,
}

impl Location {
    pub fn new(stream: impl Into<String>, line: usize, column: usize) -> Self {
        Location {
            stream: stream.into(),
            line,
            column,
        }
    }

    pub fn unknown() -> Self {
        Location {
            stream: String::from("?"),
            line: 0,
            column: 0,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.stream, self.line, self.column)
    }
}

/// The complete set of failures the interpreter core can surface.
#[derive(Debug, Clone, PartialEq)]
pub enum ForthError {
    UnknownWord { name: String, at: Location },
    NameTooLong { name: String, max: usize },
    NestedDefinition { at: Location },
    UnexpectedSemicolon { at: Location },
    UnexpectedEofInDefinition { name: String },

    StackUnderflow { word: String, needed: usize, have: usize },
    StackOverflow { word: String },
    ReturnStackUnderflow { word: String },
    ReturnStackOverflow { word: String },

    OutOfSpace { requested: usize, available: usize },
    InvalidToken { token: u16 },
    InvalidBranch { offset: i32, ip: usize },

    DivideByZero { word: String },
    NumericParse { text: String },
    BadBase { base: i64 },

    Io { context: String, message: String },
    ImageInvalid { reason: String },
    ImageCorrupt { reason: String },

    Interrupted,

    Config { field: String, reason: String },

    /// A compile-time control-structure word (`THEN`, `LOOP`, `REPEAT`, ...)
    /// was used without its matching opener, or nested inconsistently.
    ControlMismatch { word: String },
}

impl fmt::Display for ForthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForthError::UnknownWord { name, at } => write!(f, "unknown word {:?} at {}", name, at),
            ForthError::NameTooLong { name, max } => {
                write!(f, "name {:?} exceeds maximum length of {}", name, max)
            }
            ForthError::NestedDefinition { at } => write!(f, "nested definition at {}", at),
            ForthError::UnexpectedSemicolon { at } => write!(f, "unexpected ; at {}", at),
            ForthError::UnexpectedEofInDefinition { name } => {
                write!(f, "unexpected end of input defining {:?}", name)
            }
            ForthError::StackUnderflow { word, needed, have } => write!(
                f,
                "{}: stack underflow (needed {}, had {})",
                word, needed, have
            ),
            ForthError::StackOverflow { word } => write!(f, "{}: stack overflow", word),
            ForthError::ReturnStackUnderflow { word } => {
                write!(f, "{}: return stack underflow", word)
            }
            ForthError::ReturnStackOverflow { word } => {
                write!(f, "{}: return stack overflow", word)
            }
            ForthError::OutOfSpace { requested, available } => write!(
                f,
                "dictionary out of space: requested {} bytes, {} available",
                requested, available
            ),
            ForthError::InvalidToken { token } => write!(f, "invalid token {}", token),
            ForthError::InvalidBranch { offset, ip } => {
                write!(f, "invalid branch offset {} from ip {}", offset, ip)
            }
            ForthError::DivideByZero { word } => write!(f, "{}: division by zero", word),
            ForthError::NumericParse { text } => write!(f, "{:?} is not a number", text),
            ForthError::BadBase { base } => write!(f, "BASE {} out of range 2..=36", base),
            ForthError::Io { context, message } => {
                write!(f, "I/O error during {}: {}", context, message)
            }
            ForthError::ImageInvalid { reason } => write!(f, "invalid dictionary image: {}", reason),
            ForthError::ImageCorrupt { reason } => write!(f, "corrupt dictionary image: {}", reason),
            ForthError::Interrupted => write!(f, "interrupted"),
            ForthError::Config { field, reason } => {
                write!(f, "invalid configuration for {}: {}", field, reason)
            }
            ForthError::ControlMismatch { word } => {
                write!(f, "{}: used without its matching control-structure word", word)
            }
        }
    }
}

impl std::error::Error for ForthError {}

impl From<std::io::Error> for ForthError {
    fn from(e: std::io::Error) -> Self {
        ForthError::Io {
            context: "file".to_string(),
            message: e.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ForthError>;
