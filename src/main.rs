// simforth: standalone front end over the `simforth` library crate.
//
// Parses CLI flags into a `Config`, optionally boots a core image / source
// file, then drives the inner interpreter from stdin one line at a time —
// grounded on the teacher's `Reader`/`f_get_line` stdin loop (`files.rs`),
// restated over `Interpreter::eval_interactive` instead of a `Msg`-threaded
// global reader.

use simforth::config::Config;
use simforth::Interpreter;
use std::io::{self, Write};

fn main() {
    let mut config = Config::new();
    config.process_args();

    let mut interp = match Interpreter::new(config.clone()) {
        Ok(interp) => interp,
        Err(e) => {
            eprintln!("simforth: {}", e);
            std::process::exit(1);
        }
    };

    if interp.trace_mode == simforth::internals::debug::TraceMode::Off && config.traces {
        interp.trace_mode = simforth::internals::debug::TraceMode::Trace;
    }

    if let Some(core_file) = config.core_file.clone() {
        if let Err(e) = interp.load_image(&core_file) {
            eprintln!("simforth: failed to load core {}: {}", core_file, e);
        }
    }

    if let Some(path) = config.loaded_file.clone() {
        if let Err(e) = interp.eval_file(&path) {
            eprintln!("simforth: {}", e);
        }
        interp.take_output();
    }

    run_repl(&mut interp);
}

// `emit` already echoes to stdout live (unless `quiet`); `take_output` here
// only drains the buffer so it doesn't accumulate for the process lifetime.
fn run_repl(interp: &mut Interpreter) {
    let result = interp.eval_interactive(Box::new(next_line));
    interp.take_output();
    if let Err(e) = result {
        if !matches!(e, simforth::ForthError::Interrupted) {
            eprintln!("simforth: {}", e);
        }
    }
}

/// One line of stdin per call, `None` at end of input — the callback shape
/// `Source::from_dynamic` expects.
fn next_line() -> Option<String> {
    print!("ok> ");
    let _ = io::stdout().flush();
    let mut line = String::new();
    match io::stdin().read_line(&mut line) {
        Ok(0) => None,
        Ok(_) => Some(line),
        Err(_) => None,
    }
}
