//! Line-mode output for the one-shot `send` command.

use std::io::Write;

use crate::adventure::RevealTarget;

/// Writes revealed characters straight to a byte stream. The terminal scrolls on its
/// own, so `scroll_to_bottom` only flushes.
pub struct PlainTarget<W: Write + Send> {
    out: W,
    written: usize,
}

impl<W: Write + Send> PlainTarget<W> {
    pub fn new(out: W) -> Self {
        Self { out, written: 0 }
    }

    /// Characters written since the last clear.
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> RevealTarget for PlainTarget<W> {
    fn clear(&mut self) {
        // A stream cannot be cleared; start counting afresh.
        self.written = 0;
    }

    fn push_char(&mut self, ch: char) {
        let mut buf = [0u8; 4];
        if self.out.write_all(ch.encode_utf8(&mut buf).as_bytes()).is_ok() {
            self.written += 1;
        }
    }

    fn scroll_to_bottom(&mut self) {
        let _ = self.out.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_utf8_characters() {
        let mut t = PlainTarget::new(Vec::new());
        t.clear();
        for ch in "Тень".chars() {
            t.push_char(ch);
            t.scroll_to_bottom();
        }
        assert_eq!(t.written(), 4);
        assert_eq!(String::from_utf8(t.into_inner()).unwrap(), "Тень");
    }
}
