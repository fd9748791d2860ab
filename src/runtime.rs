//////////////////////////////////////////////////////////////////
/// runtime.rs
///
/// The `Interpreter`: the struct the rest of the crate hangs off of. It
/// owns the dictionary, both stacks, the instruction pointer, the input
/// stream stack, and the diagnostic sink, and exposes the embeddable API
/// (`new`, `boot`, `eval_*`, `find`, `to_number`, `save_image`/`load_image`).
///
use crate::cell::Cell;
use crate::config::Config;
use crate::dictionary::{Dictionary, Token};
use crate::error::{ForthError, Location};
use crate::internals::compiler;
use crate::internals::debug::TraceMode;
use crate::internals::image;
use crate::internals::messages::Msg;
use crate::internals::primitives::{self, PrimitiveDef};
use crate::internals::streams::{Source, Streams};
use crate::stack::Stack;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Two machine states (§3 `STATE`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Interpret,
    Compile,
}

/// Bookkeeping for the definition currently under construction (`:` .. `;`).
pub struct DefState {
    pub name: String,
    pub checkpoint: crate::dictionary::Checkpoint,
}

pub struct Interpreter {
    pub dict: Dictionary,
    pub ds: Stack<Cell>,
    pub rs: Stack<Cell>,
    pub ip: u32,
    pub state: State,
    pub base: u32,
    pub overflow: bool,
    pub streams: Streams,
    pub msg: Msg,
    pub config: Config,

    pub(crate) primitives: Vec<PrimitiveDef>,
    primitive_index: HashMap<String, u16>,
    pub(crate) tok_exit: Token,
    pub(crate) tok_lit: Token,
    pub(crate) tok_flit: Token,
    pub(crate) tok_branch: Token,
    pub(crate) tok_zbranch: Token,
    pub(crate) tok_create_default: Token,
    pub(crate) tok_does_install: Token,
    pub(crate) tok_does_jump: Token,
    pub(crate) tok_constant_fetch: Token,
    pub(crate) tok_paren_do: Token,
    pub(crate) tok_paren_loop: Token,
    pub(crate) tok_paren_plus_loop: Token,
    pub(crate) tok_paren_leave: Token,
    pub(crate) tok_paren_dot_quote: Token,

    pub defining: Option<DefState>,
    /// Loop-start dictionary addresses, one per open `DO`, consumed by the
    /// matching `LOOP`/`+LOOP`.
    pub do_stack: Vec<u32>,
    /// Pending `LEAVE` branch addresses, one frame per nesting level of
    /// `DO`, patched to the loop-exit address by `LOOP`/`+LOOP`.
    pub leave_stack: Vec<Vec<u32>>,
    /// Forward/backward branch-patch addresses for `IF`/`ELSE`/`THEN` and
    /// `BEGIN`/`WHILE`/`UNTIL`/`REPEAT`, shared across both constructs the
    /// way a single-pass Forth compiler conventionally does.
    pub control_stack: Vec<u32>,

    pub interrupt: Arc<AtomicBool>,
    pub yield_every: u64,
    tokens_since_yield: u64,
    pub yield_hook: Option<Box<dyn FnMut(u64)>>,

    pub trace_mode: TraceMode,
    pub trace_depth: usize,

    output: String,
}

impl Interpreter {
    pub fn new(config: Config) -> Result<Interpreter, ForthError> {
        config.validate()?;
        let primitives = primitives::build_table();
        let mut primitive_index = HashMap::with_capacity(primitives.len());
        for (i, p) in primitives.iter().enumerate() {
            primitive_index.insert(p.name.to_string(), i as u16);
        }
        let lookup = |name: &str| -> Token {
            *primitive_index
                .get(name)
                .unwrap_or_else(|| panic!("missing required primitive {name}"))
        };
        let tok_exit = lookup("EXIT");
        let tok_lit = lookup("LIT");
        let tok_flit = lookup("FLIT");
        let tok_branch = lookup("BRANCH");
        let tok_zbranch = lookup("0BRANCH");
        let tok_create_default = lookup("(CREATE-DEFAULT)");
        let tok_does_install = lookup("(DOES-INSTALL)");
        let tok_does_jump = lookup("(DOES-JUMP)");
        let tok_constant_fetch = lookup("(CONSTANT-FETCH)");
        let tok_paren_do = lookup("(DO)");
        let tok_paren_loop = lookup("(LOOP)");
        let tok_paren_plus_loop = lookup("(+LOOP)");
        let tok_paren_leave = lookup("(LEAVE)");
        let tok_paren_dot_quote = lookup("(.\")");

        let dict = Dictionary::new(config.dict_size);
        let ds = Stack::new(config.ds_size, "ds");
        let rs = Stack::new(config.rs_size, "rs");
        let streams = Streams::new(config.stream_depth);
        let msg = Msg::new(config.debug_level, config.quiet);
        let base = config.base;

        Ok(Interpreter {
            dict,
            ds,
            rs,
            ip: 0,
            state: State::Interpret,
            base,
            overflow: false,
            streams,
            msg,
            config,
            primitives,
            primitive_index,
            tok_exit,
            tok_lit,
            tok_flit,
            tok_branch,
            tok_zbranch,
            tok_create_default,
            tok_does_install,
            tok_does_jump,
            tok_constant_fetch,
            tok_paren_do,
            tok_paren_loop,
            tok_paren_plus_loop,
            tok_paren_leave,
            tok_paren_dot_quote,
            defining: None,
            do_stack: Vec::new(),
            leave_stack: Vec::new(),
            control_stack: Vec::new(),
            interrupt: Arc::new(AtomicBool::new(false)),
            yield_every: 0,
            tokens_since_yield: 0,
            yield_hook: None,
            trace_mode: TraceMode::Off,
            trace_depth: usize::MAX,
            output: String::new(),
        })
    }

    pub fn primitive_max(&self) -> u16 {
        self.primitives.len() as u16
    }

    /// A clonable handle the host can flip from another thread to abort
    /// the execution in progress (§5 cancellation).
    pub fn interrupt_handle(&self) -> Arc<AtomicBool> {
        self.interrupt.clone()
    }

    pub fn is_interrupted(&self) -> bool {
        self.interrupt.load(Ordering::Relaxed)
    }

    /// Called once per executed token by the inner interpreter; drives both
    /// the cooperative yield hook and the trace hook.
    pub(crate) fn on_token_executed(&mut self, token: Token) {
        if self.trace_mode != TraceMode::Off && self.rs.depth() <= self.trace_depth {
            self.msg.trace(token);
        }
        if self.yield_every > 0 {
            self.tokens_since_yield += 1;
            if self.tokens_since_yield >= self.yield_every {
                let count = self.tokens_since_yield;
                self.tokens_since_yield = 0;
                if let Some(hook) = self.yield_hook.as_mut() {
                    hook(count);
                }
            }
        }
    }

    /// Output sink for `.`/`EMIT`/`TYPE`/`."`. Always buffered so
    /// `eval_string` callers can inspect what ran; additionally echoed to
    /// stdout unless `quiet` was set.
    pub fn emit(&mut self, s: &str) {
        self.output.push_str(s);
        if !self.config.quiet {
            print!("{}", s);
        }
    }

    pub fn take_output(&mut self) -> String {
        std::mem::take(&mut self.output)
    }

    /// `find(name) -> (token, immediate)?`. Checks the dictionary first so
    /// a user redefinition shadows a same-named primitive, then falls back
    /// to the primitive table.
    pub fn find(&self, name: &str) -> Option<(Token, bool)> {
        if let Some((offset, immediate)) = self.dict.find(name) {
            let token = self.dict.token_for(offset, self.primitive_max()).ok()?;
            return Some((token, immediate));
        }
        let idx = *self.primitive_index.get(&name.to_ascii_uppercase())?;
        Some((idx, self.primitives[idx as usize].immediate))
    }

    pub fn to_number(&self, s: &str) -> Option<Cell> {
        compiler::to_number(s, self.base)
    }

    /// `>R`/`(DO)`/`EXIT`/`DOES>` all push/pop the return stack, but a
    /// generic `Stack::pop` error doesn't know it's the *return* stack —
    /// retag the error kind here so callers get `ReturnStackUnderflow`/
    /// `ReturnStackOverflow` instead of the data-stack variant.
    pub(crate) fn rs_pop(&mut self, word: &str) -> Result<Cell, ForthError> {
        self.rs.pop().map_err(|_| ForthError::ReturnStackUnderflow {
            word: word.to_string(),
        })
    }

    pub(crate) fn rs_push(&mut self, v: Cell, word: &str) -> Result<(), ForthError> {
        self.rs.push(v).map_err(|_| ForthError::ReturnStackOverflow {
            word: word.to_string(),
        })
    }

    /// Compiles `tok_lit`/`tok_flit` plus the cell's payload, or (in
    /// interpret state) just pushes it — shared by the outer interpreter's
    /// literal handling and by `LITERAL`/`S"`.
    pub fn compile_or_push(&mut self, c: Cell) -> Result<(), ForthError> {
        if self.state == State::Interpret {
            self.ds.push(c)
        } else {
            let tok = if matches!(c, Cell::Float(_)) {
                self.tok_flit
            } else {
                self.tok_lit
            };
            self.dict.compile_token(tok)?;
            self.dict.compile_cell(c)
        }
    }

    pub fn location(&self) -> Location {
        self.streams.location()
    }

    /// `boot(path)`: runs the bootstrap Forth source at `path`, or does
    /// nothing if `None` — loading a binary image is a separate, explicit
    /// `load_image` call.
    pub fn boot(&mut self, path: Option<&str>) -> Result<(), ForthError> {
        match path {
            Some(p) => self.eval_file(p),
            None => Ok(()),
        }
    }

    pub fn eval_string(&mut self, s: &str) -> Result<(), ForthError> {
        self.streams.push(Source::from_string("<eval>", s))?;
        self.run_outer_loop()
    }

    pub fn eval_file(&mut self, path: &str) -> Result<(), ForthError> {
        self.streams.push(Source::from_file(path)?)?;
        self.run_outer_loop()
    }

    /// Pushes an interactive source driven by `next_line` (called once per
    /// exhausted line, `None` signaling end of input) and runs the outer
    /// loop over it.
    pub fn eval_interactive(&mut self, next_line: Box<dyn FnMut() -> Option<String>>) -> Result<(), ForthError> {
        self.streams.push(Source::from_dynamic("<stdin>", next_line))?;
        self.run_outer_loop()
    }

    fn run_outer_loop(&mut self) -> Result<(), ForthError> {
        loop {
            if self.is_interrupted() {
                self.abort_current();
                return Err(ForthError::Interrupted);
            }
            if self.streams.is_empty() {
                if let Some(def) = &self.defining {
                    let err = ForthError::UnexpectedEofInDefinition {
                        name: def.name.clone(),
                    };
                    let at = self.location();
                    self.msg.error_hook(&err, &at);
                    self.abort_current();
                    return Err(err);
                }
                return Ok(());
            }
            match compiler::step(self) {
                Ok(true) => continue,
                Ok(false) => return Ok(()),
                Err(e) => {
                    let at = self.location();
                    self.msg.error_hook(&e, &at);
                    self.abort_current();
                    self.streams.rest_of_line();
                    return Err(e);
                }
            }
        }
    }

    /// §7 propagation: abort the in-progress definition (if any) and clear
    /// both stacks. Does not touch the input stream — callers decide
    /// whether to discard the rest of the line.
    pub(crate) fn abort_current(&mut self) {
        if let Some(def) = self.defining.take() {
            self.dict.abort_definition(def.checkpoint);
        }
        self.state = State::Interpret;
        self.ds.clear();
        self.rs.clear();
        self.do_stack.clear();
        self.leave_stack.clear();
        self.control_stack.clear();
    }

    pub fn save_image(&self, path: &str) -> Result<(), ForthError> {
        let bytes = image::save(&self.dict);
        std::fs::write(path, bytes).map_err(|e| ForthError::Io {
            context: path.to_string(),
            message: e.to_string(),
        })
    }

    pub fn load_image(&mut self, path: &str) -> Result<(), ForthError> {
        let bytes = std::fs::read(path).map_err(|e| ForthError::Io {
            context: path.to_string(),
            message: e.to_string(),
        })?;
        let (mem, here, latest) = image::load(&bytes, self.dict.max_size())?;
        self.dict.restore(mem, here, latest);
        Ok(())
    }

    pub fn set_on_word_defined(&mut self, hook: Box<dyn FnMut(&str)>) {
        self.msg.set_on_word_defined(hook);
    }

    pub fn set_on_trace(&mut self, hook: Box<dyn FnMut(u16)>) {
        self.msg.set_on_trace(hook);
    }

    pub fn set_on_error(&mut self, hook: Box<dyn FnMut(&ForthError, &Location)>) {
        self.msg.set_on_error(hook);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_with_default_config() {
        let interp = Interpreter::new(Config::default()).unwrap();
        assert_eq!(interp.state, State::Interpret);
        assert_eq!(interp.base, 10);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut cfg = Config::default();
        cfg.base = 0;
        assert!(Interpreter::new(cfg).is_err());
    }

    #[test]
    fn test_eval_simple_arithmetic() {
        let mut interp = Interpreter::new(Config { quiet: true, ..Config::default() }).unwrap();
        interp.eval_string("3 4 + .").unwrap();
        assert_eq!(interp.take_output().trim(), "7");
    }

    #[test]
    fn test_unknown_word_errors() {
        let mut interp = Interpreter::new(Config { quiet: true, ..Config::default() }).unwrap();
        let err = interp.eval_string("BOGUSWORD").unwrap_err();
        assert!(matches!(err, ForthError::UnknownWord { .. }));
    }

    #[test]
    fn test_stack_underflow_clears_stacks() {
        let mut interp = Interpreter::new(Config { quiet: true, ..Config::default() }).unwrap();
        interp.ds.push(Cell::Int(1)).unwrap();
        let err = interp.eval_string("DROP DROP").unwrap_err();
        assert!(matches!(err, ForthError::StackUnderflow { .. }));
        assert_eq!(interp.ds.depth(), 0);
    }

    #[test]
    fn test_define_and_call_word() {
        let mut interp = Interpreter::new(Config { quiet: true, ..Config::default() }).unwrap();
        interp.eval_string(": SQUARE DUP * ; 5 SQUARE .").unwrap();
        assert_eq!(interp.take_output().trim(), "25");
    }

    #[test]
    fn test_find_is_case_insensitive_through_interpreter() {
        let interp = Interpreter::new(Config::default()).unwrap();
        assert_eq!(interp.find("DUP"), interp.find("dup"));
    }

    #[test]
    fn test_boot_with_no_path_is_a_noop() {
        let mut interp = Interpreter::new(Config { quiet: true, ..Config::default() }).unwrap();
        interp.boot(None).unwrap();
        assert_eq!(interp.dict.here(), 0);
    }

    #[test]
    fn test_boot_runs_bootstrap_source_file() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("simforth-boot-{}.fs", std::process::id()));
        std::fs::write(&path, ": SQUARE DUP * ;").unwrap();

        let mut interp = Interpreter::new(Config { quiet: true, ..Config::default() }).unwrap();
        interp.boot(path.to_str()).unwrap();
        interp.eval_string("6 SQUARE .").unwrap();
        assert_eq!(interp.take_output().trim(), "36");

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_save_and_load_image_roundtrip() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("simforth-test-{}.img", std::process::id()));
        let path = path.to_str().unwrap();

        let mut interp = Interpreter::new(Config { quiet: true, ..Config::default() }).unwrap();
        interp.eval_string(": SQUARE DUP * ;").unwrap();
        interp.save_image(path).unwrap();

        let mut fresh = Interpreter::new(Config { quiet: true, ..Config::default() }).unwrap();
        fresh.load_image(path).unwrap();
        fresh.eval_string("5 SQUARE .").unwrap();
        assert_eq!(fresh.take_output().trim(), "25");

        let _ = std::fs::remove_file(path);
    }
}
