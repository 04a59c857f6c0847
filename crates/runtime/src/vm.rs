//! Fetch–decode–execute loop over a compiled chunk
//!
//! Dispatch helpers return `Result<(), String>`; the error string is the
//! bare message, and the single exit point in `execute` wraps it with
//! the `[line N] RuntimeError:` prefix (resolving the line through the
//! chunk's line-ends table), resets the stack, and reports
//! `RuntimeError`. One error aborts the chunk; there is no in-language
//! recovery.
//!
//! # Numeric lattice
//!
//! Integers and bools are integer-like and compute in i64 with wrapping
//! semantics; any decimal operand promotes the operation to f64, and
//! division always computes in f64. Bitwise operations and modulo are
//! integer-only.

use fi_core::{Chunk, FiString, Hashmap, OpCode, Strings, Value, values_equal};
use tracing::debug;

/// Operand stack capacity. Pushing past it is a runtime error.
const STACK_MAX: usize = 256;

/// Catch-all for corrupt bytecode (bad index vehicle, truncated
/// operands). Compiled chunks never trigger it.
const GENERIC_ERROR: &str = "An error occurred.";

/// Outcome of one `interpret` call. Callers map these to exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpretResult {
    NoErrors,
    CompileError,
    RuntimeError,
}

#[derive(Clone, Copy, PartialEq)]
enum NumOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Greater,
    Less,
}

#[derive(Clone, Copy)]
enum IntOp {
    Modulo,
    BwAnd,
    BwOr,
    Xor,
    ShiftLeft,
    ShiftRight,
}

pub struct Vm {
    stack: Vec<Value>,
    globals: Hashmap,
    strings: Strings,
    /// Locals live here rather than on the operand stack, indexed by the
    /// compiler's slot numbers. Grown on demand, reused across scopes.
    locals: Vec<Value>,
    repl: bool,
}

impl Vm {
    /// `repl` selects whether expression-statement results are printed
    /// when popped.
    pub fn new(repl: bool) -> Self {
        Vm {
            stack: Vec::with_capacity(STACK_MAX),
            globals: Hashmap::new(),
            strings: Strings::new(),
            locals: Vec::new(),
            repl,
        }
    }

    /// Compile and run one source unit. Globals and interned strings
    /// survive into the next call.
    pub fn interpret(&mut self, source: &str) -> InterpretResult {
        let chunk = match fic::compile(source, &mut self.strings) {
            Ok(chunk) => chunk,
            Err(_) => return InterpretResult::CompileError,
        };

        debug!(bytes = chunk.len(), "executing chunk");
        self.execute(&chunk)
    }

    /// Current value of a global, if defined. Mainly for tests and
    /// embedding.
    pub fn global(&mut self, name: &str) -> Option<Value> {
        let key = Value::Str(self.strings.intern(name));
        self.globals.get(&key).cloned()
    }

    fn execute(&mut self, chunk: &Chunk) -> InterpretResult {
        let mut ip = 0;
        match self.run(chunk, &mut ip) {
            Ok(()) => InterpretResult::NoErrors,
            Err(message) => {
                let line = chunk.line_of(ip.saturating_sub(1));
                eprintln!("[line {}] RuntimeError: {}", line, message);
                self.stack.clear();
                InterpretResult::RuntimeError
            }
        }
    }

    fn run(&mut self, chunk: &Chunk, ip: &mut usize) -> Result<(), String> {
        loop {
            let byte = read_u8(chunk, ip)?;
            let op = OpCode::try_from(byte as u8).map_err(|_| GENERIC_ERROR.to_string())?;

            match op {
                OpCode::Return => return Ok(()),

                OpCode::Constant => {
                    let index = read_u8(chunk, ip)?;
                    let value = constant(chunk, index)?;
                    self.push(value)?;
                }
                OpCode::ConstantLong => {
                    let index = read_u16(chunk, ip)?;
                    let value = constant(chunk, index)?;
                    self.push(value)?;
                }
                OpCode::ConstantLongLong => {
                    let index = read_u24(chunk, ip)?;
                    let value = constant(chunk, index)?;
                    self.push(value)?;
                }

                OpCode::Nil => self.push(Value::Nil)?,
                OpCode::True => self.push(Value::Bool(true))?,
                OpCode::False => self.push(Value::Bool(false))?,

                OpCode::Add => self.add()?,
                OpCode::Subtract => self.numeric_binary(NumOp::Subtract, "-")?,
                OpCode::Multiply => self.numeric_binary(NumOp::Multiply, "*")?,
                OpCode::Divide => self.divide()?,
                OpCode::Modulo => self.modulo()?,
                OpCode::Pow => self.pow()?,

                OpCode::Negate => self.negate()?,
                OpCode::Not => {
                    let value = self.pop()?;
                    self.push(Value::Bool(!value.is_truthy()))?;
                }
                OpCode::BwNot => self.bw_not()?,

                OpCode::And => {
                    let (lhs, rhs) = self.pop_pair()?;
                    self.push(Value::Bool(lhs.is_truthy() && rhs.is_truthy()))?;
                }
                OpCode::Or => {
                    let (lhs, rhs) = self.pop_pair()?;
                    self.push(Value::Bool(lhs.is_truthy() || rhs.is_truthy()))?;
                }

                OpCode::BwAnd => self.integral_binary(IntOp::BwAnd, "&")?,
                OpCode::BwOr => self.integral_binary(IntOp::BwOr, "|")?,
                OpCode::Xor => self.integral_binary(IntOp::Xor, "^")?,
                OpCode::ShiftLeft => self.integral_binary(IntOp::ShiftLeft, "<<")?,
                OpCode::ShiftRight => self.integral_binary(IntOp::ShiftRight, ">>")?,

                OpCode::Equals => {
                    let (lhs, rhs) = self.pop_pair()?;
                    self.push(Value::Bool(values_equal(&lhs, &rhs)))?;
                }
                // A trailing NOT means this comparison was compiled from
                // <= or >=; the peek only upgrades the operator name in
                // error messages, the NOT still executes afterwards.
                OpCode::Greater => {
                    let display = if next_is_not(chunk, *ip) { "<=" } else { ">" };
                    self.numeric_binary(NumOp::Greater, display)?;
                }
                OpCode::Less => {
                    let display = if next_is_not(chunk, *ip) { ">=" } else { "<" };
                    self.numeric_binary(NumOp::Less, display)?;
                }

                OpCode::Ternary => {
                    let else_value = self.pop()?;
                    let then_value = self.pop()?;
                    let condition = self.pop()?;
                    self.push(if condition.is_truthy() {
                        then_value
                    } else {
                        else_value
                    })?;
                }

                OpCode::Print => {
                    let value = self.pop()?;
                    println!("{}", value);
                }
                OpCode::Pop => {
                    let value = self.pop()?;
                    if self.repl {
                        println!("{}", value);
                    }
                }

                OpCode::DefineGlobal => {
                    let index = read_generic_index(chunk, ip)?;
                    let name = constant(chunk, index)?;
                    if self.globals.get(&name).is_some() {
                        return Err(format!("redefinition of variable '{}'.", name));
                    }
                    let value = self.pop()?;
                    self.globals.insert(name, value);
                }
                OpCode::GetGlobal => {
                    let index = read_generic_index(chunk, ip)?;
                    let name = constant(chunk, index)?;
                    let Some(value) = self.globals.get(&name).cloned() else {
                        return Err(format!("undefined variable: '{}'.", name));
                    };
                    self.push(value)?;
                }
                // Assignment is an expression: the value stays on the
                // stack.
                OpCode::SetGlobal => {
                    let index = read_generic_index(chunk, ip)?;
                    let name = constant(chunk, index)?;
                    let value = self.peek(0)?.clone();
                    match self.globals.get_mut(&name) {
                        Some(slot) => *slot = value,
                        None => return Err(format!("undefined variable: '{}'.", name)),
                    }
                }

                OpCode::GetLocal => {
                    let slot = read_generic_index(chunk, ip)?;
                    let value = self
                        .locals
                        .get(slot)
                        .cloned()
                        .ok_or_else(|| GENERIC_ERROR.to_string())?;
                    self.push(value)?;
                }
                OpCode::SetLocal => {
                    let slot = read_generic_index(chunk, ip)?;
                    let value = self.peek(0)?.clone();
                    if slot >= self.locals.len() {
                        self.locals.resize(slot + 1, Value::Nil);
                    }
                    self.locals[slot] = value;
                }

                OpCode::Jump => {
                    let offset = read_u16(chunk, ip)?;
                    *ip += offset;
                }
                OpCode::JumpIfFalse => {
                    let offset = read_u16(chunk, ip)?;
                    if !self.peek(0)?.is_truthy() {
                        *ip += offset;
                    }
                }

                OpCode::Clock => self.push(Value::Decimal(cpu_seconds()))?,
                OpCode::TypeOf => {
                    let value = self.pop()?;
                    let name = self.strings.intern(value.type_name());
                    self.push(Value::Str(name))?;
                }

                OpCode::Error => return Err(GENERIC_ERROR.to_string()),
            }
        }
    }

    // ---- stack ----

    fn push(&mut self, value: Value) -> Result<(), String> {
        if self.stack.len() >= STACK_MAX {
            return Err("stack overflow.".to_string());
        }
        self.stack.push(value);
        Ok(())
    }

    fn pop(&mut self) -> Result<Value, String> {
        self.stack.pop().ok_or_else(|| GENERIC_ERROR.to_string())
    }

    /// Pop two operands, left beneath right. The pops reverse the stack
    /// order, so the pair comes back as (left, right).
    fn pop_pair(&mut self) -> Result<(Value, Value), String> {
        let rhs = self.pop()?;
        let lhs = self.pop()?;
        Ok((lhs, rhs))
    }

    fn peek(&self, distance: usize) -> Result<&Value, String> {
        let index = self
            .stack
            .len()
            .checked_sub(1 + distance)
            .ok_or_else(|| GENERIC_ERROR.to_string())?;
        Ok(&self.stack[index])
    }

    // ---- operators ----

    fn add(&mut self) -> Result<(), String> {
        let concatenating =
            matches!(self.peek(0)?, Value::Str(_)) || matches!(self.peek(1)?, Value::Str(_));
        if concatenating {
            let (lhs, rhs) = self.pop_pair()?;
            let left = self.value_to_string(&lhs);
            let right = self.value_to_string(&rhs);
            let joined = self.strings.concat(&left, &right);
            return self.push(Value::Str(joined));
        }

        self.numeric_binary(NumOp::Add, "+")
    }

    fn value_to_string(&mut self, value: &Value) -> FiString {
        match value {
            Value::Str(s) => s.clone(),
            other => self.strings.intern(&other.to_string()),
        }
    }

    fn numeric_binary(&mut self, op: NumOp, display: &str) -> Result<(), String> {
        let (lhs, rhs) = self.pop_pair()?;
        if !lhs.is_numeric() || !rhs.is_numeric() {
            return Err(type_error(display, &lhs, &rhs));
        }

        let value = if lhs.is_integral() && rhs.is_integral() && op != NumOp::Divide {
            let a = lhs.as_integer();
            let b = rhs.as_integer();
            match op {
                NumOp::Add => Value::Integer(a.wrapping_add(b)),
                NumOp::Subtract => Value::Integer(a.wrapping_sub(b)),
                NumOp::Multiply => Value::Integer(a.wrapping_mul(b)),
                NumOp::Divide => Value::Decimal(a as f64 / b as f64),
                NumOp::Greater => Value::Bool(a > b),
                NumOp::Less => Value::Bool(a < b),
            }
        } else {
            let a = lhs.as_decimal();
            let b = rhs.as_decimal();
            match op {
                NumOp::Add => Value::Decimal(a + b),
                NumOp::Subtract => Value::Decimal(a - b),
                NumOp::Multiply => Value::Decimal(a * b),
                NumOp::Divide => Value::Decimal(a / b),
                NumOp::Greater => Value::Bool(a > b),
                NumOp::Less => Value::Bool(a < b),
            }
        };

        self.push(value)
    }

    fn integral_binary(&mut self, op: IntOp, display: &str) -> Result<(), String> {
        let (lhs, rhs) = self.pop_pair()?;
        if !lhs.is_integral() || !rhs.is_integral() {
            return Err(type_error(display, &lhs, &rhs));
        }

        let a = lhs.as_integer();
        let b = rhs.as_integer();
        let value = match op {
            IntOp::Modulo => a.wrapping_rem(b),
            IntOp::BwAnd => a & b,
            IntOp::BwOr => a | b,
            IntOp::Xor => a ^ b,
            IntOp::ShiftLeft => a.wrapping_shl(b as u32),
            IntOp::ShiftRight => a.wrapping_shr(b as u32),
        };

        self.push(Value::Integer(value))
    }

    fn divide(&mut self) -> Result<(), String> {
        if self.peek(0)?.is_numeric_zero() {
            return Err("division by zero.".to_string());
        }
        self.numeric_binary(NumOp::Divide, "/")
    }

    fn modulo(&mut self) -> Result<(), String> {
        // integral-only, so a 0.0 divisor falls through to the type
        // error instead
        let divisor = self.peek(0)?;
        if divisor.is_integral() && divisor.is_numeric_zero() {
            return Err("division by zero.".to_string());
        }
        self.integral_binary(IntOp::Modulo, "%")
    }

    fn pow(&mut self) -> Result<(), String> {
        let (lhs, rhs) = self.pop_pair()?;
        if !lhs.is_numeric() || !rhs.is_numeric() {
            return Err(type_error("**", &lhs, &rhs));
        }

        let result = lhs.as_decimal().powf(rhs.as_decimal());
        // exact integers within i64 close back over Integer
        let value = if result.is_finite() && result == result.trunc() && result.abs() < 9.2e18 {
            Value::Integer(result as i64)
        } else {
            Value::Decimal(result)
        };

        self.push(value)
    }

    fn negate(&mut self) -> Result<(), String> {
        let value = self.pop()?;
        match value {
            Value::Decimal(d) => self.push(Value::Decimal(-d)),
            v if v.is_integral() => self.push(Value::Integer(v.as_integer().wrapping_neg())),
            other => Err(format!(
                "unsupported operand type for -: {}.",
                other.type_name()
            )),
        }
    }

    fn bw_not(&mut self) -> Result<(), String> {
        let value = self.pop()?;
        if !value.is_integral() {
            return Err(format!(
                "unsupported operand type for ~: {}.",
                value.type_name()
            ));
        }
        self.push(Value::Integer(!value.as_integer()))
    }
}

impl Default for Vm {
    fn default() -> Self {
        Vm::new(false)
    }
}

fn type_error(display: &str, lhs: &Value, rhs: &Value) -> String {
    format!(
        "unsupported operand type(s) for {}: {} and {}.",
        display,
        lhs.type_name(),
        rhs.type_name()
    )
}

fn cpu_seconds() -> f64 {
    let mut ts = libc::timespec {
        tv_sec: 0,
        tv_nsec: 0,
    };
    unsafe { libc::clock_gettime(libc::CLOCK_PROCESS_CPUTIME_ID, &mut ts) };
    ts.tv_sec as f64 + ts.tv_nsec as f64 / 1_000_000_000.0
}

fn constant(chunk: &Chunk, index: usize) -> Result<Value, String> {
    chunk
        .constant(index)
        .cloned()
        .ok_or_else(|| GENERIC_ERROR.to_string())
}

fn next_is_not(chunk: &Chunk, ip: usize) -> bool {
    chunk.code().get(ip) == Some(&u8::from(OpCode::Not))
}

fn read_u8(chunk: &Chunk, ip: &mut usize) -> Result<usize, String> {
    let byte = chunk
        .code()
        .get(*ip)
        .copied()
        .ok_or_else(|| GENERIC_ERROR.to_string())?;
    *ip += 1;
    Ok(byte as usize)
}

fn read_u16(chunk: &Chunk, ip: &mut usize) -> Result<usize, String> {
    let lo = read_u8(chunk, ip)?;
    let hi = read_u8(chunk, ip)?;
    Ok(lo | (hi << 8))
}

fn read_u24(chunk: &Chunk, ip: &mut usize) -> Result<usize, String> {
    let lo = read_u8(chunk, ip)?;
    let mid = read_u8(chunk, ip)?;
    let hi = read_u8(chunk, ip)?;
    Ok(lo | (mid << 8) | (hi << 16))
}

/// Index operand carried by a trailing `Constant*` opcode: read the
/// vehicle byte, then an index of the matching width.
fn read_generic_index(chunk: &Chunk, ip: &mut usize) -> Result<usize, String> {
    let byte = read_u8(chunk, ip)?;
    match OpCode::try_from(byte as u8) {
        Ok(OpCode::Constant) => read_u8(chunk, ip),
        Ok(OpCode::ConstantLong) => read_u16(chunk, ip),
        Ok(OpCode::ConstantLongLong) => read_u24(chunk, ip),
        _ => Err(GENERIC_ERROR.to_string()),
    }
}
