//! Fi Runtime: the bytecode virtual machine
//!
//! A [`Vm`] owns everything that outlives a single program run: the
//! operand stack, the globals table, and the string-intern pool. Each
//! call to [`Vm::interpret`] compiles the source into a fresh chunk,
//! executes it to `OP_RETURN` or the first runtime error, and drops the
//! chunk. Globals and interned strings persist across calls, which is
//! what lets a REPL accumulate definitions line by line.
//!
//! The VM is strictly single-threaded and synchronous; there is no
//! scheduler and no sharing of chunks or values across threads.

pub mod vm;

pub use vm::{InterpretResult, Vm};
