// Diagnostic sink and observer hooks.
//
// Kept deliberately free of any global state: every interpreter owns its
// own `Msg`, so two instances in the same process never share level or
// hook configuration.

use crate::error::{ForthError, Location};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DebugLevel {
    Error,
    Warning,
    Info,
    Debug,
}

impl fmt::Display for DebugLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DebugLevel::Error => "error",
            DebugLevel::Warning => "warning",
            DebugLevel::Info => "info",
            DebugLevel::Debug => "debug",
        };
        write!(f, "{}", s)
    }
}

/// A single diagnostic record: where it came from, what happened, and
/// optionally a formatted detail. Built only when the level gate passes.
pub struct Record<'a> {
    pub level: DebugLevel,
    pub source: &'a str,
    pub text: &'a str,
}

type WordHook = Box<dyn FnMut(&str)>;
type TraceHook = Box<dyn FnMut(u16)>;
type ErrorHook = Box<dyn FnMut(&ForthError, &Location)>;

/// Level-gated diagnostic sink plus the three observer hooks from the
/// embeddable API. Every call site that would otherwise `print!`/`eprint!`
/// goes through here instead.
pub struct Msg {
    level: DebugLevel,
    quiet: bool,
    on_word_defined: Option<WordHook>,
    on_trace: Option<TraceHook>,
    on_error: Option<ErrorHook>,
}

impl Msg {
    pub fn new(level: DebugLevel, quiet: bool) -> Msg {
        Msg {
            level,
            quiet,
            on_word_defined: None,
            on_trace: None,
            on_error: None,
        }
    }

    pub fn set_level(&mut self, level: DebugLevel) {
        self.level = level;
    }

    pub fn get_level(&self) -> DebugLevel {
        self.level
    }

    /// Effective level after the `quiet` clamp: `quiet` never allows
    /// `Info`/`Debug` through regardless of what is later requested.
    fn effective_level(&self) -> DebugLevel {
        if self.quiet && self.level > DebugLevel::Warning {
            DebugLevel::Warning
        } else {
            self.level
        }
    }

    fn enabled(&self, level: DebugLevel) -> bool {
        level <= self.effective_level()
    }

    pub fn error(&mut self, source: &str, text: &str) {
        if self.enabled(DebugLevel::Error) {
            eprintln!("[{}] {}: {}", DebugLevel::Error, source, text);
        }
    }

    pub fn warning(&mut self, source: &str, text: &str) {
        if self.enabled(DebugLevel::Warning) {
            eprintln!("[{}] {}: {}", DebugLevel::Warning, source, text);
        }
    }

    pub fn info(&mut self, source: &str, text: &str) {
        if self.enabled(DebugLevel::Info) {
            println!("[{}] {}: {}", DebugLevel::Info, source, text);
        }
    }

    pub fn debug(&mut self, source: &str, text: &str) {
        if self.enabled(DebugLevel::Debug) {
            println!("[{}] {}: {}", DebugLevel::Debug, source, text);
        }
    }

    pub fn set_on_word_defined(&mut self, hook: WordHook) {
        self.on_word_defined = Some(hook);
    }

    pub fn set_on_trace(&mut self, hook: TraceHook) {
        self.on_trace = Some(hook);
    }

    pub fn set_on_error(&mut self, hook: ErrorHook) {
        self.on_error = Some(hook);
    }

    pub fn word_defined(&mut self, name: &str) {
        if let Some(hook) = self.on_word_defined.as_mut() {
            hook(name);
        }
    }

    pub fn trace(&mut self, token: u16) {
        if let Some(hook) = self.on_trace.as_mut() {
            hook(token);
        }
    }

    pub fn error_hook(&mut self, err: &ForthError, at: &Location) {
        if let Some(hook) = self.on_error.as_mut() {
            hook(err, at);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_clamps_level() {
        let msg = Msg::new(DebugLevel::Debug, true);
        assert_eq!(msg.effective_level(), DebugLevel::Warning);
    }

    #[test]
    fn test_level_gate() {
        let msg = Msg::new(DebugLevel::Warning, false);
        assert!(msg.enabled(DebugLevel::Error));
        assert!(msg.enabled(DebugLevel::Warning));
        assert!(!msg.enabled(DebugLevel::Info));
    }

    #[test]
    fn test_word_defined_hook_fires() {
        let mut msg = Msg::new(DebugLevel::Error, false);
        let seen = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let seen2 = seen.clone();
        msg.set_on_word_defined(Box::new(move |name| seen2.borrow_mut().push(name.to_string())));
        msg.word_defined("SQUARE");
        assert_eq!(seen.borrow().as_slice(), ["SQUARE"]);
    }
}
