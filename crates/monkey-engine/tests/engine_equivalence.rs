//! Engine equivalence integration tests
//!
//! Every program here runs on both backends; the rendered results (or error
//! messages) must match.

use monkey_engine::{Backend, Engine};

/// Runs `source` on a fresh engine and renders the outcome.
fn run(backend: Backend, source: &str) -> String {
    let mut engine = Engine::with_backend(backend);
    match engine.eval(source) {
        Ok(value) => value.to_string(),
        Err(error) => format!("ERROR: {}", error),
    }
}

fn assert_equivalent(source: &str, expected: &str) {
    let vm = run(Backend::Vm, source);
    let walker = run(Backend::TreeWalker, source);
    assert_eq!(vm, walker, "backends disagree on {:?}", source);
    assert_eq!(vm, expected, "unexpected result for {:?}", source);
}

#[test]
fn test_arithmetic_and_comparisons() {
    assert_equivalent("1 + 2 * 3", "7");
    assert_equivalent("(5 + 10 * 2 + 15 / 3) * 2 + -10", "50");
    assert_equivalent("-7 / 2", "-3");
    assert_equivalent("1 < 2", "true");
    assert_equivalent("2 > 1 == true", "true");
    assert_equivalent("!(1 == 2)", "true");
    assert_equivalent("9223372036854775807 + 1", "-9223372036854775808");
}

#[test]
fn test_conditionals() {
    assert_equivalent("if (1 < 2) { 10 } else { 20 }", "10");
    assert_equivalent("if (false) { 10 }", "null");
    assert_equivalent("if (null) { 1 } else { 2 }", "2");
    assert_equivalent("if (0) { 1 } else { 2 }", "1");
    assert_equivalent("if (true) { }", "null");
    assert_equivalent("if (true) { let a = 1; }", "null");
}

#[test]
fn test_bindings() {
    assert_equivalent("let a = 5; let b = a * 2; a + b", "15");
    assert_equivalent("let a = 5;", "null");
    assert_equivalent("let a = 1; let a = a + 1; a", "2");
}

#[test]
fn test_functions_and_closures() {
    assert_equivalent("let add = fn(a, b) { a + b }; add(2, 3)", "5");
    assert_equivalent("let addTwo = fn(x) { fn(y) { x + y } }; addTwo(2)(3);", "5");
    assert_equivalent(
        "let newAdder = fn(a, b) { let c = a + b; fn(d) { let e = d + c; fn(f) { e + f } } }; newAdder(1, 2)(3)(8)",
        "14",
    );
    assert_equivalent(
        "let factorial = fn(n) { if (n == 0) { 1 } else { n * factorial(n - 1) } }; factorial(5);",
        "120",
    );
    assert_equivalent(
        "let map = fn(arr, f) { \
           let iter = fn(arr, acc) { if (len(arr) == 0) { acc } else { iter(rest(arr), push(acc, f(first(arr)))) } }; \
           iter(arr, []) \
         }; map([1, 2, 3], fn(x) { x * 2 })",
        "[2, 4, 6]",
    );
    assert_equivalent("let f = fn() { return 1; 2 }; f()", "1");
    assert_equivalent("let f = fn() { }; f()", "null");
    assert_equivalent("return 3; 4", "3");
}

#[test]
fn test_collections() {
    assert_equivalent(r#"["a", 1 + 1, [true]]"#, "[a, 2, [true]]");
    assert_equivalent("[1, 2, 3][1]", "2");
    assert_equivalent("[1, 2, 3][5]", "null");
    assert_equivalent(r#"{"b": 2, "a": 1}"#, "{a: 1, b: 2}");
    assert_equivalent(r#"let h = {"one": 1, true: 2, 3: 3}; h["one"] + h[true] + h[3]"#, "6");
    assert_equivalent(r#"{"a": 1}["z"]"#, "null");
    assert_equivalent("let a = [1]; a == a", "true");
    assert_equivalent("[1] == [1]", "false");
    assert_equivalent(r#""mon" + "key" == "monkey""#, "true");
}

#[test]
fn test_builtins() {
    assert_equivalent(r#"len("hello")"#, "5");
    assert_equivalent("len([1, 2])", "2");
    assert_equivalent("first([7, 8])", "7");
    assert_equivalent("last([7, 8])", "8");
    assert_equivalent("rest([7, 8])", "[8]");
    assert_equivalent("let a = [1]; let b = push(a, 2); a", "[1]");
    assert_equivalent("len", "builtin function");
}

#[test]
fn test_runtime_errors() {
    assert_equivalent("1 + true", "ERROR: type mismatch: INTEGER + BOOLEAN");
    assert_equivalent("true + false", "ERROR: unknown operator: BOOLEAN + BOOLEAN");
    assert_equivalent("-true", "ERROR: unknown operator: -BOOLEAN");
    assert_equivalent("1 / 0", "ERROR: division by zero");
    assert_equivalent("1 < true", "ERROR: type mismatch: BOOLEAN > INTEGER");
    assert_equivalent("1[0]", "ERROR: index operator not supported: INTEGER");
    assert_equivalent("{[1]: 1}", "ERROR: unusable as hash key: ARRAY");
    assert_equivalent(r#"5()"#, "ERROR: not a function: INTEGER");
    assert_equivalent("fn(a) { a }()", "ERROR: wrong number of arguments: want=1, got=0");
    assert_equivalent("len(1)", "ERROR: argument to `len` not supported, got INTEGER");
    assert_equivalent("rest(1, 2)", "ERROR: wrong number of arguments. got=2, want=1");
}

#[test]
fn test_recursion_limits() {
    assert_equivalent(
        "let c = fn(x) { if (x == 0) { 0 } else { c(x - 1) } }; c(300)",
        "0",
    );
    assert_equivalent("let f = fn() { f() }; f();", "ERROR: stack overflow");
    assert_equivalent(
        "let f = fn(a, b, c) { f(a, b, c) }; f(1, 2, 3);",
        "ERROR: stack overflow",
    );
}

#[test]
fn test_parse_errors_are_shared() {
    assert_equivalent("let x 5;", "ERROR: expected next token to be =, got 5 instead");
}
