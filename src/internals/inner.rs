//! The inner interpreter: dispatches a single token to either a primitive
//! function or the threaded body of a secondary (user-defined) word.
//!
//! Grounded on the teacher's `i_definition` threading loop, restated over
//! `Dictionary`'s token stream instead of the flat `i64` heap. The return
//! stack doubles as the call stack: entering a secondary pushes the saved
//! `ip`, and `EXIT` (a primitive, like every other opcode) pops it back —
//! so there is no separate "are we at top level" case to handle.

use crate::dictionary::{Resolved, Token};
use crate::error::ForthError;
use crate::runtime::Interpreter;

pub(crate) fn dispatch(interp: &mut Interpreter, token: Token) -> Result<(), ForthError> {
    match interp.dict.resolve(token, interp.primitive_max()) {
        Resolved::Primitive(idx) => {
            let func = interp.primitives[idx as usize].func;
            func(interp)
        }
        Resolved::Secondary(body_offset) => run_secondary(interp, body_offset),
    }
}

/// Entry point used by the outer interpreter and by `EXECUTE` to run a
/// single resolved token to completion.
pub fn execute(interp: &mut Interpreter, token: Token) -> Result<(), ForthError> {
    dispatch(interp, token)
}

/// Runs the token stream starting at `body_offset` until the matching
/// `EXIT` has unwound the return stack back to the depth it had on entry.
fn run_secondary(interp: &mut Interpreter, body_offset: u32) -> Result<(), ForthError> {
    let baseline = interp.rs.depth();
    interp.rs_push(crate::cell::Cell::Addr(interp.ip), "call")?;
    interp.ip = body_offset;
    loop {
        if interp.is_interrupted() {
            return Err(ForthError::Interrupted);
        }
        let token = interp.dict.read_token(interp.ip);
        interp.ip += 2;
        interp.on_token_executed(token);
        dispatch(interp, token)?;
        if interp.rs.depth() <= baseline {
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_execute_secondary_runs_to_exit() {
        let mut interp = Interpreter::new(Config { quiet: true, ..Config::default() }).unwrap();
        interp.eval_string(": DOUBLE DUP + ; 21 DOUBLE .").unwrap();
        assert_eq!(interp.take_output().trim(), "42");
    }

    #[test]
    fn test_nested_secondary_calls() {
        let mut interp = Interpreter::new(Config { quiet: true, ..Config::default() }).unwrap();
        interp
            .eval_string(": INC 1 + ; : INC2 INC INC ; 5 INC2 .")
            .unwrap();
        assert_eq!(interp.take_output().trim(), "7");
    }

    #[test]
    fn test_execute_on_primitive_token_is_noop_frame() {
        let mut interp = Interpreter::new(Config { quiet: true, ..Config::default() }).unwrap();
        let baseline = interp.rs.depth();
        let (token, _) = interp.find("DUP").unwrap();
        interp.ds.push(crate::cell::Cell::Int(9)).unwrap();
        execute(&mut interp, token).unwrap();
        assert_eq!(interp.rs.depth(), baseline);
        assert_eq!(interp.ds.depth(), 2);
    }
}
