// Input stream stack: a LIFO of character sources feeding the tokenizer.
//
// Each source owns a growing line buffer plus a cursor; `refill` pulls the
// next line, `word` scans a delimited token from the current line, and
// `parse` scans without skipping leading delimiters (used by `S"`, `."`).

use crate::error::{ForthError, Location};
use std::fs;

/// How a `Source` gets its next line once the current one is exhausted.
enum LineFeed {
    /// A fixed, pre-split body of text (string or file source).
    Fixed(std::vec::IntoIter<String>),
    /// A host-supplied callback, polled lazily — used for interactive
    /// (stdin) sources where later lines don't exist yet when the source
    /// is constructed.
    Dynamic(Box<dyn FnMut() -> Option<String>>),
}

impl LineFeed {
    fn next(&mut self) -> Option<String> {
        match self {
            LineFeed::Fixed(it) => it.next(),
            LineFeed::Dynamic(f) => f(),
        }
    }
}

pub struct Source {
    pub tag: String,
    line: String,
    pos: usize,
    lineno: usize,
    rest: LineFeed,
}

impl Source {
    pub fn from_string(tag: impl Into<String>, text: &str) -> Source {
        let mut lines: Vec<String> = text.lines().map(|s| s.to_string()).collect();
        if lines.is_empty() {
            lines.push(String::new());
        }
        let mut iter = lines.into_iter();
        let first = iter.next().unwrap_or_default();
        Source {
            tag: tag.into(),
            line: first,
            pos: 0,
            lineno: 1,
            rest: LineFeed::Fixed(iter),
        }
    }

    pub fn from_file(path: &str) -> Result<Source, ForthError> {
        let text = fs::read_to_string(path).map_err(|e| ForthError::Io {
            context: path.to_string(),
            message: e.to_string(),
        })?;
        Ok(Source::from_string(path, &text))
    }

    /// A source fed by a host callback returning one line per call, `None`
    /// at end of input. Backs `eval_interactive`.
    pub fn from_dynamic(tag: impl Into<String>, supplier: Box<dyn FnMut() -> Option<String>>) -> Source {
        Source {
            tag: tag.into(),
            line: String::new(),
            pos: 0,
            lineno: 0,
            rest: LineFeed::Dynamic(supplier),
        }
    }

    fn at_eol(&self) -> bool {
        self.pos >= self.line.len()
    }

    /// Pull the next line into the buffer. Returns `false` on exhaustion.
    ///
    /// Strips a trailing `\r\n`/`\n`, matching `from_string`'s use of
    /// `str::lines` — a `Dynamic` feed (e.g. `main.rs`'s `read_line`-backed
    /// REPL callback) hands back the newline it read, and leaving it in
    /// would glue it onto the line's last token.
    fn refill(&mut self) -> bool {
        match self.rest.next() {
            Some(next) => {
                self.line = next.trim_end_matches(['\r', '\n']).to_string();
                self.pos = 0;
                self.lineno += 1;
                true
            }
            None => false,
        }
    }

    pub fn location(&self) -> Location {
        Location::new(self.tag.clone(), self.lineno, self.pos + 1)
    }

    fn peek(&self) -> Option<char> {
        self.line[self.pos..].chars().next()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// Scan forward skipping leading occurrences of `delim`, then collect up
    /// to the next `delim` or end of line. Returns `None` at end of input
    /// for this source (caller should pop it and retry on the next one).
    pub fn word(&mut self, delim: char) -> Option<String> {
        loop {
            while self.peek() == Some(delim) {
                self.advance();
            }
            if !self.at_eol() {
                break;
            }
            if !self.refill() {
                return None;
            }
        }
        let mut out = String::new();
        while let Some(c) = self.peek() {
            if c == delim {
                break;
            }
            out.push(c);
            self.advance();
        }
        Some(out)
    }

    /// Scan without skipping leading delimiters; used by `S"` / `."` / `(`.
    /// Returns `None` if end of line is reached before `delim`.
    pub fn parse(&mut self, delim: char) -> Option<String> {
        let mut out = String::new();
        loop {
            match self.peek() {
                Some(c) if c == delim => {
                    self.advance();
                    return Some(out);
                }
                Some(c) => {
                    out.push(c);
                    self.advance();
                }
                None => return None,
            }
        }
    }

    /// Read the rest of the current line, consuming it; used by `\`.
    pub fn rest_of_line(&mut self) {
        self.pos = self.line.len();
    }

    /// Consumes exactly one leading `delim`, if present — the mandatory
    /// separating space `."`/`S"` leave unconsumed after the tokenizer
    /// reads them as ordinary space-delimited words.
    pub fn skip_one(&mut self, delim: char) {
        if self.peek() == Some(delim) {
            self.advance();
        }
    }
}

pub struct Streams {
    stack: Vec<Source>,
    max_depth: usize,
}

impl Streams {
    pub fn new(max_depth: usize) -> Streams {
        Streams {
            stack: Vec::new(),
            max_depth,
        }
    }

    pub fn push(&mut self, source: Source) -> Result<(), ForthError> {
        if self.stack.len() >= self.max_depth {
            return Err(ForthError::OutOfSpace {
                requested: self.stack.len() + 1,
                available: self.max_depth,
            });
        }
        self.stack.push(source);
        Ok(())
    }

    pub fn pop(&mut self) -> Option<Source> {
        self.stack.pop()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn top(&mut self) -> Option<&mut Source> {
        self.stack.last_mut()
    }

    pub fn location(&self) -> Location {
        self.stack
            .last()
            .map(|s| s.location())
            .unwrap_or_else(Location::unknown)
    }

    /// `word(delim)`, popping exhausted sources until one yields a token
    /// or the whole stack is empty.
    pub fn word(&mut self, delim: char) -> Option<String> {
        loop {
            let top = self.stack.last_mut()?;
            if let Some(w) = top.word(delim) {
                return Some(w);
            }
            self.stack.pop();
        }
    }

    pub fn parse(&mut self, delim: char) -> Option<String> {
        self.stack.last_mut().and_then(|s| s.parse(delim))
    }

    pub fn rest_of_line(&mut self) {
        if let Some(s) = self.stack.last_mut() {
            s.rest_of_line();
        }
    }

    pub fn skip_one(&mut self, delim: char) {
        if let Some(s) = self.stack.last_mut() {
            s.skip_one(delim);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_skips_delimiters() {
        let mut src = Source::from_string("test", "  foo   bar");
        assert_eq!(src.word(' ').unwrap(), "foo");
        assert_eq!(src.word(' ').unwrap(), "bar");
        assert!(src.word(' ').is_none());
    }

    #[test]
    fn test_word_crosses_lines() {
        let mut streams = Streams::new(8);
        streams.push(Source::from_string("test", "foo\nbar")).unwrap();
        assert_eq!(streams.word(' ').unwrap(), "foo");
        assert_eq!(streams.word(' ').unwrap(), "bar");
    }

    #[test]
    fn test_parse_reads_until_delim() {
        let mut src = Source::from_string("test", "hello world\" rest");
        assert_eq!(src.parse('"').unwrap(), "hello world");
    }

    #[test]
    fn test_skip_one_consumes_single_separator() {
        let mut src = Source::from_string("test", " hello\" rest");
        src.skip_one(' ');
        assert_eq!(src.parse('"').unwrap(), "hello");
    }

    #[test]
    fn test_stream_depth_limit() {
        let mut streams = Streams::new(1);
        streams.push(Source::from_string("a", "")).unwrap();
        assert!(streams.push(Source::from_string("b", "")).is_err());
    }
}
