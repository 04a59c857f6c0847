//! The Fi instruction set
//!
//! One byte per opcode. Constant references are emitted through the
//! three `Constant*` opcodes, which double as the index vehicle for
//! instructions whose operand is a constant-pool index or a local slot
//! (`DefineGlobal`, `GetGlobal`, `SetGlobal`, `GetLocal`, `SetLocal`
//! are followed by a `Constant*` carrying the index). `Jump` and
//! `JumpIfFalse` carry a little-endian u16 offset inline.

use num_enum::{IntoPrimitive, TryFromPrimitive};

#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum OpCode {
    Return,
    Constant,
    ConstantLong,
    ConstantLongLong,
    Nil,
    True,
    False,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Pow,
    Negate,
    Not,
    BwNot,
    And,
    Or,
    BwAnd,
    BwOr,
    Xor,
    ShiftLeft,
    ShiftRight,
    Equals,
    Greater,
    Less,
    Ternary,
    Print,
    Pop,
    DefineGlobal,
    GetGlobal,
    SetGlobal,
    GetLocal,
    SetLocal,
    Jump,
    JumpIfFalse,
    Clock,
    TypeOf,
    /// Reserved placeholder; never emitted or executed.
    Error,
}

impl OpCode {
    pub fn name(self) -> &'static str {
        match self {
            OpCode::Return => "OP_RETURN",
            OpCode::Constant => "OP_CONSTANT",
            OpCode::ConstantLong => "OP_CONSTANT_LONG",
            OpCode::ConstantLongLong => "OP_CONSTANT_LONG_LONG",
            OpCode::Nil => "OP_NIL",
            OpCode::True => "OP_TRUE",
            OpCode::False => "OP_FALSE",
            OpCode::Add => "OP_ADD",
            OpCode::Subtract => "OP_SUBTRACT",
            OpCode::Multiply => "OP_MULTIPLY",
            OpCode::Divide => "OP_DIVIDE",
            OpCode::Modulo => "OP_MODULO",
            OpCode::Pow => "OP_POW",
            OpCode::Negate => "OP_NEGATE",
            OpCode::Not => "OP_NOT",
            OpCode::BwNot => "OP_BW_NOT",
            OpCode::And => "OP_AND",
            OpCode::Or => "OP_OR",
            OpCode::BwAnd => "OP_BW_AND",
            OpCode::BwOr => "OP_BW_OR",
            OpCode::Xor => "OP_XOR",
            OpCode::ShiftLeft => "OP_SHIFT_LEFT",
            OpCode::ShiftRight => "OP_SHIFT_RIGHT",
            OpCode::Equals => "OP_EQUALS",
            OpCode::Greater => "OP_GREATER",
            OpCode::Less => "OP_LESS",
            OpCode::Ternary => "OP_TERNARY",
            OpCode::Print => "OP_PRINT",
            OpCode::Pop => "OP_POP",
            OpCode::DefineGlobal => "OP_DEFINE_GLOBAL",
            OpCode::GetGlobal => "OP_GET_GLOBAL",
            OpCode::SetGlobal => "OP_SET_GLOBAL",
            OpCode::GetLocal => "OP_GET_LOCAL",
            OpCode::SetLocal => "OP_SET_LOCAL",
            OpCode::Jump => "OP_JUMP",
            OpCode::JumpIfFalse => "OP_JUMP_IF_FALSE",
            OpCode::Clock => "OP_CLOCK",
            OpCode::TypeOf => "OP_TYPEOF",
            OpCode::Error => "OP_ERROR",
        }
    }
}
