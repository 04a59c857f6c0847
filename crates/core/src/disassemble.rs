//! Human-readable chunk dumps
//!
//! Debugging aid for compiler work and tests; the interpreter pipeline
//! never calls into this module.

use crate::chunk::Chunk;
use crate::opcode::OpCode;
use std::fmt::Write;

/// Render a whole chunk, one instruction per line.
pub fn disassemble(chunk: &Chunk, name: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== {} ==", name);
    let mut offset = 0;
    while offset < chunk.len() {
        offset = disassemble_instruction(chunk, offset, &mut out);
    }
    out
}

/// Render the instruction at `offset`, returning the offset of the next
/// one.
pub fn disassemble_instruction(chunk: &Chunk, offset: usize, out: &mut String) -> usize {
    let _ = write!(out, "{:04} {:4} ", offset, chunk.line_of(offset));

    let byte = chunk.code()[offset];
    let Ok(op) = OpCode::try_from(byte) else {
        let _ = writeln!(out, "Unknown opcode {}", byte);
        return offset + 1;
    };

    match op {
        OpCode::Constant => constant_instruction(chunk, offset, 1, op, out),
        OpCode::ConstantLong => constant_instruction(chunk, offset, 2, op, out),
        OpCode::ConstantLongLong => constant_instruction(chunk, offset, 3, op, out),
        OpCode::Jump | OpCode::JumpIfFalse => {
            let code = chunk.code();
            let jump = u16::from_le_bytes([code[offset + 1], code[offset + 2]]) as usize;
            let _ = writeln!(out, "{:<21} -> {:04}", op.name(), offset + 3 + jump);
            offset + 3
        }
        _ => {
            let _ = writeln!(out, "{}", op.name());
            offset + 1
        }
    }
}

fn constant_instruction(
    chunk: &Chunk,
    offset: usize,
    width: usize,
    op: OpCode,
    out: &mut String,
) -> usize {
    let code = chunk.code();
    let mut index = 0usize;
    for i in 0..width {
        index |= (code[offset + 1 + i] as usize) << (8 * i);
    }
    match chunk.constant(index) {
        Some(value) => {
            let _ = writeln!(out, "{:<21} {} '{}'", op.name(), index, value);
        }
        None => {
            // index vehicle for a local slot: no pool entry behind it
            let _ = writeln!(out, "{:<21} {}", op.name(), index);
        }
    }
    offset + 1 + width
}
