//! Session-level interpreter tests
//!
//! These drive the public `Vm` API the way the REPL does: several
//! `interpret` calls against one VM, asserting on the persistent state
//! between them.

use fi_core::Value;
use fi_runtime::{InterpretResult, Vm};

#[test]
fn test_definitions_accumulate_like_a_repl() {
    let mut vm = Vm::new(true);

    assert_eq!(vm.interpret(": greeting = \"hi\";"), InterpretResult::NoErrors);
    assert_eq!(vm.interpret(": count = 2;"), InterpretResult::NoErrors);
    assert_eq!(
        vm.interpret(": line = greeting + count;"),
        InterpretResult::NoErrors
    );

    assert_eq!(vm.global("line").map(|v| v.to_string()), Some("hi2".into()));
}

#[test]
fn test_a_failed_line_does_not_poison_the_session() {
    let mut vm = Vm::new(true);

    assert_eq!(vm.interpret(": x = 1;"), InterpretResult::NoErrors);
    assert_eq!(vm.interpret("x +;"), InterpretResult::CompileError);
    assert_eq!(vm.interpret("x / 0;"), InterpretResult::RuntimeError);

    // the stack was reset and globals are intact
    assert_eq!(vm.interpret(": y = x + 1;"), InterpretResult::NoErrors);
    assert_eq!(vm.global("y"), Some(Value::Integer(2)));
}

#[test]
fn test_block_scoping_matches_shadowing_rules() {
    let mut vm = Vm::new(false);

    let source = "\
: a = 1;
: outer = 0;
: inner = 0;
{
    : a = 2;
    inner = a;
}
outer = a;
";
    assert_eq!(vm.interpret(source), InterpretResult::NoErrors);
    assert_eq!(vm.global("inner"), Some(Value::Integer(2)));
    assert_eq!(vm.global("outer"), Some(Value::Integer(1)));
}

#[test]
fn test_nested_blocks_and_conditionals() {
    let mut vm = Vm::new(false);

    let source = "\
: r = 0;
{
    : threshold = 10;
    {
        : sample = 7;
        ? (sample < threshold) {
            r = sample * 2;
        } : {
            r = 0 - 1;
        }
    }
}
";
    assert_eq!(vm.interpret(source), InterpretResult::NoErrors);
    assert_eq!(vm.global("r"), Some(Value::Integer(14)));
}

#[test]
fn test_interned_strings_survive_across_calls() {
    let mut vm = Vm::new(false);

    assert_eq!(vm.interpret(": a = \"shared\";"), InterpretResult::NoErrors);
    assert_eq!(
        vm.interpret(": same = a == \"shared\";"),
        InterpretResult::NoErrors
    );
    assert_eq!(vm.global("same"), Some(Value::Bool(true)));
}

#[test]
fn test_line_reporting_uses_later_lines() {
    // the error sits on line 3; interpret only reports the result code
    // here, but the chunk must still execute the first two lines
    let mut vm = Vm::new(false);
    let source = ": a = 1;\n: b = 2;\nb / 0;\n";
    assert_eq!(vm.interpret(source), InterpretResult::RuntimeError);
    assert_eq!(vm.global("a"), Some(Value::Integer(1)));
    assert_eq!(vm.global("b"), Some(Value::Integer(2)));
}
