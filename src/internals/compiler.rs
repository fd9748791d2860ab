//! The outer interpreter: turns one token of source text at a time into
//! either an executed primitive/secondary or a compiled one, per §4.6.
//! Grounded on the teacher's `f_d_compile`/`f_d_interpret`/`f_number_q`
//! trio, restated against `Dictionary`/`Cell` instead of the flat heap.

use crate::cell::Cell;
use crate::dictionary::Resolved;
use crate::error::{ForthError, Location};
use crate::internals::inner;
use crate::runtime::{Interpreter, State};

/// Parses `text` as a number in `base`, honoring a leading sign, a `0x`/
/// `0b`/`0o` override of `base`, and a trailing `.` or embedded `e`/`E`
/// forcing a float result regardless of `base`. Returns `None` — not an
/// error — on anything that doesn't parse, since the outer loop's fallback
/// is "not a word, not a number" → `UnknownWord`.
pub fn to_number(text: &str, base: u32) -> Option<Cell> {
    if text.is_empty() {
        return None;
    }
    let (sign, rest) = match text.as_bytes()[0] {
        b'-' => (-1i64, &text[1..]),
        b'+' => (1i64, &text[1..]),
        _ => (1i64, text),
    };
    if rest.is_empty() {
        return None;
    }
    if let Some(hex) = rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X")) {
        return i64::from_str_radix(hex, 16).ok().map(|n| Cell::Int(sign * n));
    }
    if let Some(bin) = rest.strip_prefix("0b").or_else(|| rest.strip_prefix("0B")) {
        return i64::from_str_radix(bin, 2).ok().map(|n| Cell::Int(sign * n));
    }
    if let Some(oct) = rest.strip_prefix("0o").or_else(|| rest.strip_prefix("0O")) {
        return i64::from_str_radix(oct, 8).ok().map(|n| Cell::Int(sign * n));
    }
    let looks_float = rest.contains('.') || rest.contains('e') || rest.contains('E');
    if looks_float && base == 10 {
        let cleaned: String = rest.chars().filter(|&c| c != '_').collect();
        return cleaned.parse::<f64>().ok().map(|f| Cell::Float(sign as f64 * f));
    }
    let cleaned: String = rest.chars().filter(|&c| c != '_').collect();
    i64::from_str_radix(&cleaned, base).ok().map(|n| Cell::Int(sign * n))
}

/// One pass of the outer loop: read a blank-delimited word, decide whether
/// to execute it (interpret state, or an immediate word in compile state),
/// compile it, or fall back to `to_number`. Returns `Ok(false)` once the
/// current input stream is exhausted.
pub fn step(interp: &mut Interpreter) -> Result<bool, ForthError> {
    let word = match interp.streams.word(' ') {
        Some(w) => w,
        None => return Ok(false),
    };
    if word.is_empty() {
        return Ok(true);
    }

    if let Some((token, immediate)) = interp.find(&word) {
        if interp.state == State::Interpret || immediate {
            inner::execute(interp, token)?;
        } else {
            interp.dict.compile_token(token)?;
        }
        return Ok(true);
    }

    match interp.to_number(&word) {
        Some(cell) => {
            interp.compile_or_push(cell)?;
            Ok(true)
        }
        None => Err(ForthError::UnknownWord {
            name: word,
            at: loc(interp),
        }),
    }
}

fn loc(interp: &Interpreter) -> Location {
    interp.location()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_integer() {
        assert_eq!(to_number("42", 10), Some(Cell::Int(42)));
    }

    #[test]
    fn test_negative_integer() {
        assert_eq!(to_number("-7", 10), Some(Cell::Int(-7)));
    }

    #[test]
    fn test_float() {
        assert_eq!(to_number("3.5", 10), Some(Cell::Float(3.5)));
    }

    #[test]
    fn test_hex_override() {
        assert_eq!(to_number("0xFF", 10), Some(Cell::Int(255)));
    }

    #[test]
    fn test_base_16_plain_digits() {
        assert_eq!(to_number("FF", 16), Some(Cell::Int(255)));
    }

    #[test]
    fn test_garbage_is_none() {
        assert_eq!(to_number("NOTANUMBER", 10), None);
    }

    #[test]
    fn test_underscore_separators() {
        assert_eq!(to_number("1_000", 10), Some(Cell::Int(1000)));
    }

    #[test]
    fn test_empty_is_none() {
        assert_eq!(to_number("", 10), None);
    }
}
