//! A bounded LIFO stack used for both the data stack and the return stack.
//!
//! The teacher's kernel indexed a fixed `Vec` from the top down with panics
//! on underflow/overflow; here the same shape (fixed capacity, grows down
//! conceptually but stored as a plain `Vec` growing up) is kept but every
//! boundary check returns a `ForthError` instead of aborting the process.

use crate::error::ForthError;

#[derive(Debug, Clone)]
pub struct Stack<T> {
    items: Vec<T>,
    capacity: usize,
    name: &'static str,
}

impl<T: Copy> Stack<T> {
    pub fn new(capacity: usize, name: &'static str) -> Self {
        Stack {
            items: Vec::with_capacity(capacity),
            capacity,
            name,
        }
    }

    pub fn push(&mut self, value: T) -> Result<(), ForthError> {
        if self.items.len() >= self.capacity {
            return Err(ForthError::StackOverflow {
                word: self.name.to_string(),
            });
        }
        self.items.push(value);
        Ok(())
    }

    pub fn pop(&mut self) -> Result<T, ForthError> {
        self.items.pop().ok_or_else(|| ForthError::StackUnderflow {
            word: self.name.to_string(),
            needed: 1,
            have: 0,
        })
    }

    /// Like `pop`, but the error names `caller` (the primitive in
    /// progress) rather than this stack's own label, so a failed
    /// `DUP`/`+`/etc. reports the word that actually underflowed.
    pub fn pop_for(&mut self, caller: &str) -> Result<T, ForthError> {
        self.items.pop().ok_or_else(|| ForthError::StackUnderflow {
            word: caller.to_string(),
            needed: 1,
            have: 0,
        })
    }

    pub fn top(&self) -> Result<T, ForthError> {
        self.items.last().copied().ok_or_else(|| ForthError::StackUnderflow {
            word: self.name.to_string(),
            needed: 1,
            have: 0,
        })
    }

    /// Peek `depth` items from the top, 0 = top of stack.
    pub fn peek(&self, depth: usize) -> Result<T, ForthError> {
        let len = self.items.len();
        if depth >= len {
            return Err(ForthError::StackUnderflow {
                word: self.name.to_string(),
                needed: depth + 1,
                have: len,
            });
        }
        Ok(self.items[len - 1 - depth])
    }

    pub fn ensure(&self, n: usize) -> Result<(), ForthError> {
        if self.items.len() < n {
            Err(ForthError::StackUnderflow {
                word: self.name.to_string(),
                needed: n,
                have: self.items.len(),
            })
        } else {
            Ok(())
        }
    }

    pub fn depth(&self) -> usize {
        self.items.len()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Remove the top `n` items. Fails, leaving the stack untouched, if
    /// fewer than `n` are present.
    pub fn drop_n(&mut self, n: usize) -> Result<(), ForthError> {
        self.ensure(n)?;
        let new_len = self.items.len() - n;
        self.items.truncate(new_len);
        Ok(())
    }

    pub fn swap(&mut self) -> Result<(), ForthError> {
        self.ensure(2)?;
        let len = self.items.len();
        self.items.swap(len - 1, len - 2);
        Ok(())
    }

    /// ( a b c -- b c a )
    pub fn rot(&mut self) -> Result<(), ForthError> {
        self.ensure(3)?;
        let len = self.items.len();
        self.items[len - 3..].rotate_left(1);
        Ok(())
    }

    /// `PICK`/`ROLL` support: remove the item `depth` down from the top and
    /// push it back on top (ROLL with `depth == 1` is `SWAP`, `depth == 2`
    /// is `ROT`).
    pub fn roll(&mut self, depth: usize) -> Result<(), ForthError> {
        self.ensure(depth + 1)?;
        let len = self.items.len();
        let item = self.items.remove(len - 1 - depth);
        self.items.push(item);
        Ok(())
    }

    /// The top `n` cells, oldest first, for diagnostic dumps. Does not
    /// consume the stack.
    pub fn dump(&self, n: usize) -> Vec<T> {
        let len = self.items.len();
        let take = n.min(len);
        self.items[len - take..].to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_pop() {
        let mut s: Stack<i64> = Stack::new(4, "ds");
        s.push(1).unwrap();
        s.push(2).unwrap();
        assert_eq!(s.pop().unwrap(), 2);
        assert_eq!(s.pop().unwrap(), 1);
    }

    #[test]
    fn test_underflow() {
        let mut s: Stack<i64> = Stack::new(4, "ds");
        assert!(s.pop().is_err());
    }

    #[test]
    fn test_overflow() {
        let mut s: Stack<i64> = Stack::new(1, "ds");
        s.push(1).unwrap();
        assert!(s.push(2).is_err());
    }

    #[test]
    fn test_peek() {
        let mut s: Stack<i64> = Stack::new(4, "ds");
        s.push(1).unwrap();
        s.push(2).unwrap();
        assert_eq!(s.peek(0).unwrap(), 2);
        assert_eq!(s.peek(1).unwrap(), 1);
        assert!(s.peek(2).is_err());
    }

    #[test]
    fn test_rot() {
        let mut s: Stack<i64> = Stack::new(4, "ds");
        s.push(1).unwrap();
        s.push(2).unwrap();
        s.push(3).unwrap();
        s.rot().unwrap();
        assert_eq!(s.dump(3), vec![2, 3, 1]);
    }

    #[test]
    fn test_roll_is_rot_at_depth_two() {
        let mut s: Stack<i64> = Stack::new(4, "ds");
        s.push(1).unwrap();
        s.push(2).unwrap();
        s.push(3).unwrap();
        s.roll(2).unwrap();
        assert_eq!(s.dump(3), vec![2, 3, 1]);
    }

    #[test]
    fn test_drop_n_fails_untouched() {
        let mut s: Stack<i64> = Stack::new(4, "ds");
        s.push(1).unwrap();
        assert!(s.drop_n(2).is_err());
        assert_eq!(s.depth(), 1);
    }

    #[test]
    fn test_dump() {
        let mut s: Stack<i64> = Stack::new(4, "ds");
        s.push(1).unwrap();
        s.push(2).unwrap();
        s.push(3).unwrap();
        assert_eq!(s.dump(2), vec![2, 3]);
        assert_eq!(s.dump(10), vec![1, 2, 3]);
    }
}
