use cinder_core::{InterpretResult, VirtualMachine, VmConfig};

struct Run {
    result: InterpretResult,
    out: String,
    err: String,
}

fn run_with(vm: &mut VirtualMachine, source: &str) -> Run {
    let mut out = Vec::new();
    let mut err = Vec::new();
    let result = vm.interpret_with(source, &mut out, &mut err);
    Run {
        result,
        out: String::from_utf8(out).expect("stdout is utf8"),
        err: String::from_utf8(err).expect("stderr is utf8"),
    }
}

fn run(source: &str) -> Run {
    run_with(&mut VirtualMachine::default(), source)
}

fn assert_prints(source: &str, expected: &str) {
    let run = run(source);
    assert_eq!(run.result, InterpretResult::Ok, "stderr: {}", run.err);
    assert_eq!(run.out, expected);
    assert!(run.err.is_empty());
}

#[test]
fn literals_print_canonically() {
    assert_prints("print nil;", "nil\n");
    assert_prints("print true; print false;", "true\nfalse\n");
    assert_prints("print 42; print 2.5; print 0.1;", "42\n2.5\n0.1\n");
    assert_prints("print 1000000; print 123456789;", "1e+06\n1.23457e+08\n");
    assert_prints("print 1 / 3;", "0.333333\n");
    assert_prints("print \"hello world\";", "hello world\n");
}

#[test]
fn equal_strings_from_different_paths_are_equal() {
    assert_prints(
        "var a = \"ab\"; var b = \"a\" + \"b\"; var filler = \"zz\" + \"top\"; print a == b;",
        "true\n",
    );
}

#[test]
fn comparison_and_equality_operators() {
    assert_prints(
        "print 1 < 2; print 2 <= 2; print 3 > 4; print 4 >= 5; print 1 != 2; print nil == false;",
        "true\ntrue\nfalse\nfalse\ntrue\nfalse\n",
    );
    assert_prints("print !nil; print !0; print !\"\";", "true\nfalse\nfalse\n");
}

#[test]
fn inner_block_shadows_then_reverts() {
    assert_prints(
        "var a = \"outer\"; { var a = \"inner\"; print a; } print a;",
        "inner\nouter\n",
    );
}

#[test]
fn nested_locals_and_assignment() {
    assert_prints(
        "{ var a = 1; { var b = a + 1; a = b * 10; } print a; }",
        "20\n",
    );
}

#[test]
fn while_loop_counts() {
    assert_prints(
        "var i = 0; while (i < 3) { print i; i = i + 1; }",
        "0\n1\n2\n",
    );
}

#[test]
fn for_loop_with_all_clauses() {
    assert_prints("for (var i = 0; i < 3; i = i + 1) print i;", "0\n1\n2\n");
}

#[test]
fn for_loop_without_clauses_can_use_outer_state() {
    assert_prints(
        "var n = 0; for (; n < 2;) n = n + 1; print n;",
        "2\n",
    );
}

#[test]
fn if_else_picks_one_branch() {
    assert_prints(
        "if (1 > 2) print \"then\"; else print \"else\"; if (nil) print \"no\";",
        "else\n",
    );
}

#[test]
fn two_syntax_errors_are_both_reported_and_nothing_runs() {
    let run = run("print \"before\";\nprint ;\nvar = 1;\nprint \"after\";");
    assert_eq!(run.result, InterpretResult::CompileError);
    assert!(run.out.is_empty());
    assert_eq!(
        run.err,
        "[line 2] Error at ';': Expect expression.\n[line 3] Error at '=': Expect variable name.\n"
    );
}

#[test]
fn error_at_end_of_input() {
    let run = run("print 1");
    assert_eq!(run.result, InterpretResult::CompileError);
    assert_eq!(run.err, "[line 1] Error at end: Expect ';' after value.\n");
}

#[test]
fn single_type_error_reports_once() {
    let run = run("print \"a\" - 1;");
    assert_eq!(run.result, InterpretResult::RuntimeError);
    assert_eq!(run.err, "Operands must be numbers.\n[line 1] in script\n");
}

#[test]
fn output_before_runtime_error_is_kept() {
    let run = run("print 1;\nprint 2 + nil;\nprint 3;");
    assert_eq!(run.result, InterpretResult::RuntimeError);
    assert_eq!(run.out, "1\n");
    assert_eq!(run.err, "Operands must be two numbers or two strings.\n[line 2] in script\n");
}

#[test]
fn logical_operators_short_circuit() {
    assert_prints("false and (1/0);", "");
    assert_prints("true or (1/0);", "");
    // Evaluating the right side would be a type error
    assert_prints("print false and -\"x\";", "false\n");
    assert_prints("print true or -\"x\";", "true\n");
    assert_prints("print nil or \"fallback\";", "fallback\n");
    assert_prints("print 1 and 2;", "2\n");
}

#[test]
fn undefined_global_read() {
    let run = run("print missing;");
    assert_eq!(run.result, InterpretResult::RuntimeError);
    assert_eq!(run.err, "Undefined variable 'missing'.\n[line 1] in script\n");
}

#[test]
fn vm_is_reusable_after_errors() {
    let mut vm = VirtualMachine::default();
    assert_eq!(run_with(&mut vm, "var x = 1; print -true;").result, InterpretResult::RuntimeError);
    assert_eq!(run_with(&mut vm, "print (;").result, InterpretResult::CompileError);

    let run = run_with(&mut vm, "print x + 1;");
    assert_eq!(run.result, InterpretResult::Ok);
    assert_eq!(run.out, "2\n");
}

#[test]
fn local_read_in_own_initializer_is_rejected() {
    let run = run("{ var a = a; }");
    assert_eq!(run.result, InterpretResult::CompileError);
    assert_eq!(
        run.err,
        "[line 1] Error at 'a': Can't read local variable in its own initializer.\n"
    );
}

#[test]
fn deep_expression_overflows_small_stack() {
    let mut vm = VirtualMachine::new(VmConfig::new().with_max_stack_size(4));
    let run = run_with(&mut vm, "print 1 + (2 + (3 + (4 + (5 + 6))));");
    assert_eq!(run.result, InterpretResult::RuntimeError);
    assert_eq!(run.err, "Stack overflow.\n[line 1] in script\n");
    assert_eq!(vm.stack_size(), 0);
}

/// `nil;` statements totalling `bytes` bytes of bytecode (`bytes` even)
fn nil_statements(bytes: usize) -> String {
    "nil;".repeat(bytes / 2)
}

#[test]
fn jumps_at_the_16_bit_limit_land_on_their_targets() {
    // Body plus the 3-byte else jump and the POP gives a 65535-byte skip
    let skip_if = format!(
        "if (false) {{ !nil; {} }} print \"after if\";",
        nil_statements(u16::MAX as usize - 7)
    );
    assert_prints(&skip_if, "after if\n");

    // Exit jump spans body + 4; the loop back covers body + 8
    let skip_while = format!(
        "while (false) {{ !nil; {} }} print \"after while\";",
        nil_statements(u16::MAX as usize - 11)
    );
    assert_prints(&skip_while, "after while\n");
}

#[test]
fn loop_at_the_16_bit_limit_runs_repeatedly() {
    // Condition `i < 2` is 5 bytes and `i = i + 1;` is 8; with `!nil;`,
    // the exit jump, its POP and LOOP the span is the padding + 23
    let source = format!(
        "var i = 0; while (i < 2) {{ i = i + 1; !nil; {} }} print i;",
        nil_statements(u16::MAX as usize - 23)
    );
    assert_prints(&source, "2\n");
}
