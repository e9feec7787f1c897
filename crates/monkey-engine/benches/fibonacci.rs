//! Recursive fibonacci on both backends.
//!
//! Parsing and compilation happen once outside the measured loop, so the
//! numbers compare the VM's dispatch loop against walking the tree.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use monkey_engine::compiler::Compiler;
use monkey_engine::evaluator::eval_program;
use monkey_engine::parser::Parser;
use monkey_engine::runtime::Environment;
use monkey_engine::{Value, Vm};

const FIBONACCI: &str = "
let fibonacci = fn(x) {
    if (x == 0) {
        0
    } else {
        if (x == 1) {
            return 1;
        } else {
            fibonacci(x - 1) + fibonacci(x - 2);
        }
    }
};
fibonacci(20);
";

fn bench_fibonacci(c: &mut Criterion) {
    let program = Parser::new(FIBONACCI).parse_program().expect("parse");
    let mut compiler = Compiler::new();
    compiler.compile(&program).expect("compile");
    let bytecode = compiler.bytecode();

    let mut group = c.benchmark_group("fibonacci_20");

    group.bench_function("vm", |b| {
        b.iter(|| {
            let mut vm = Vm::new(bytecode.clone());
            vm.run().expect("run");
            assert_eq!(vm.last_popped(), &Value::Integer(6765));
        })
    });

    group.bench_function("tree_walker", |b| {
        b.iter(|| {
            let env = Environment::new();
            black_box(eval_program(&program, &env).expect("eval"))
        })
    });

    group.finish();
}

criterion_group!(benches, bench_fibonacci);
criterion_main!(benches);
