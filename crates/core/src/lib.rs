//! Fi Core: shared runtime primitives for the Fi language
//!
//! This crate holds everything both the compiler and the VM need to agree
//! on:
//! - `Value`: the tagged value the language talks about (Bool, Integer,
//!   Decimal, Nil, Str)
//! - `FiString` / `Strings`: interned heap strings and the pool that
//!   canonicalizes them, so string equality is pointer equality
//! - `Hashmap`: the open-addressed Robin-Hood map backing both the string
//!   pool and the globals table
//! - `Chunk` / `OpCode`: the compiled bytecode unit (code bytes, constant
//!   pool, line-ends table) and its instruction set
//!
//! # Modules
//!
//! - `value`: Value enum, truthiness, equality lattice, canonical formatting
//! - `intern`: interned strings and the string pool
//! - `hashmap`: Robin-Hood hashing keyed by Value
//! - `chunk`: bytecode container and line-ends encoding
//! - `opcode`: the instruction set
//! - `disassemble`: human-readable chunk dumps for debugging and tests

pub mod chunk;
pub mod disassemble;
pub mod hashmap;
pub mod intern;
pub mod opcode;
pub mod value;

pub use chunk::Chunk;
pub use hashmap::Hashmap;
pub use intern::{FiString, Strings};
pub use opcode::OpCode;
pub use value::{Value, ValueArray, format_decimal, values_equal};
