//! Fi Compiler Library
//!
//! Turns Fi source text into a bytecode [`Chunk`](fi_core::Chunk) in a
//! single pass: the scanner hands tokens to a Pratt-style compiler that
//! emits opcodes as it parses. There is no AST.
//!
//! The entry point is [`compile`]:
//!
//! ```rust,ignore
//! use fi_core::Strings;
//!
//! let mut strings = Strings::new();
//! let chunk = fic::compile("print 1 + 2;", &mut strings)?;
//! ```
//!
//! Compile diagnostics are printed to stderr as they are discovered
//! (`[line N] CompileError at 'lexeme': message`); the returned error
//! only carries the count.

pub mod compiler;
pub mod scanner;
pub mod token;

pub use compiler::{CompileErrors, compile};
pub use scanner::Scanner;
pub use token::{Token, TokenKind};
