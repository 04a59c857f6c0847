//! Chunk: a compiled code unit
//!
//! Bytecode bytes, the constant pool, and the line-ends table that maps
//! instruction offsets back to source lines. A chunk lives for one
//! `interpret` call; the compiler writes it, the VM reads it, then it is
//! dropped.

use crate::value::{Value, ValueArray};

/// Per-line record of the greatest code offset written while the scanner
/// was on that line. `ends()[i]` covers line `i + 1`; `None` means the
/// line emitted no bytecode. Once a later line is written to, earlier
/// entries never change.
#[derive(Debug, Default)]
pub struct LineEnds {
    ends: Vec<Option<usize>>,
}

impl LineEnds {
    fn mark(&mut self, line: usize, offset: usize) {
        while self.ends.len() < line {
            self.ends.push(None);
        }
        self.ends[line - 1] = Some(offset);
    }

    pub fn ends(&self) -> &[Option<usize>] {
        &self.ends
    }

    /// Source line owning the byte at `offset`: the first line whose
    /// recorded end reaches it. Only used on error paths, so the linear
    /// scan is fine. Defaults to line 1 for offsets past the table.
    pub fn line_of(&self, offset: usize) -> usize {
        for (index, end) in self.ends.iter().enumerate() {
            if let Some(end) = end
                && *end >= offset
            {
                return index + 1;
            }
        }
        1
    }
}

#[derive(Debug, Default)]
pub struct Chunk {
    code: Vec<u8>,
    constants: ValueArray,
    lines: LineEnds,
}

impl Chunk {
    pub fn new() -> Self {
        Chunk::default()
    }

    /// Append one byte attributed to `line` (1-based).
    pub fn write(&mut self, byte: u8, line: usize) {
        self.code.push(byte);
        self.lines.mark(line, self.code.len() - 1);
    }

    /// Overwrite an already-written byte (jump backpatching).
    pub fn patch(&mut self, offset: usize, byte: u8) {
        self.code[offset] = byte;
    }

    /// Append a constant and return its pool index.
    pub fn add_constant(&mut self, value: Value) -> usize {
        self.constants.push(value);
        self.constants.len() - 1
    }

    pub fn constant(&self, index: usize) -> Option<&Value> {
        self.constants.get(index)
    }

    pub fn constants(&self) -> &[Value] {
        &self.constants
    }

    pub fn code(&self) -> &[u8] {
        &self.code
    }

    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    pub fn line_of(&self, offset: usize) -> usize {
        self.lines.line_of(offset)
    }

    pub fn lines(&self) -> &LineEnds {
        &self.lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_and_constants() {
        let mut chunk = Chunk::new();
        let idx = chunk.add_constant(Value::Integer(7));
        assert_eq!(idx, 0);
        chunk.write(3, 1);
        chunk.write(idx as u8, 1);
        assert_eq!(chunk.code(), &[3, 0]);
        assert_eq!(chunk.constant(0), Some(&Value::Integer(7)));
        assert_eq!(chunk.constant(1), None);
    }

    #[test]
    fn test_line_ends_skip_empty_lines() {
        let mut chunk = Chunk::new();
        chunk.write(0, 1);
        chunk.write(0, 1);
        // lines 2 and 3 emit nothing
        chunk.write(0, 4);

        assert_eq!(chunk.lines().ends(), &[Some(1), None, None, Some(2)]);
        assert_eq!(chunk.line_of(0), 1);
        assert_eq!(chunk.line_of(1), 1);
        assert_eq!(chunk.line_of(2), 4);
    }

    #[test]
    fn test_line_of_at_exact_end() {
        let mut chunk = Chunk::new();
        chunk.write(0, 1);
        chunk.write(0, 2);
        // offset 0 sits exactly at line 1's recorded end
        assert_eq!(chunk.line_of(0), 1);
        assert_eq!(chunk.line_of(1), 2);
    }

    #[test]
    fn test_line_table_is_monotone() {
        let mut chunk = Chunk::new();
        chunk.write(0, 1);
        let before = chunk.lines().ends()[0];
        chunk.write(0, 3);
        chunk.write(0, 3);
        assert_eq!(chunk.lines().ends()[0], before);
        assert_eq!(chunk.lines().ends()[2], Some(2));
    }
}
