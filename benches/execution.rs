//! Execution benchmarks: instruction dispatch, call overhead, and memory
//! traffic through the interpreter.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;
use wexec::instr::{BlockType, Instr, MemArg};
use wexec::module::{Export, ExportKind, FunctionDef, FunctionType, Limits, MemoryDef, Module, ValueType};
use wexec::runtime::Value;
use wexec::Vm;

/// fib(n), iteratively: exercises locals, the loop/branch path, and i32
/// arithmetic.
fn fib_module() -> Module {
    Module {
        types: vec![FunctionType::new(vec![ValueType::I32], vec![ValueType::I32])],
        functions: vec![FunctionDef {
            type_idx: 0,
            // locals: a, b, tmp
            locals: vec![ValueType::I32, ValueType::I32, ValueType::I32],
            body: vec![
                // b = 1
                Instr::I32Const { value: 1 },
                Instr::LocalSet { local_idx: 2 },
                Instr::Block {
                    block_type: BlockType::Empty,
                },
                Instr::Loop {
                    block_type: BlockType::Empty,
                },
                Instr::LocalGet { local_idx: 0 },
                Instr::I32Eqz,
                Instr::BrIf { depth: 1 },
                // tmp = a + b; a = b; b = tmp
                Instr::LocalGet { local_idx: 1 },
                Instr::LocalGet { local_idx: 2 },
                Instr::I32Add,
                Instr::LocalSet { local_idx: 3 },
                Instr::LocalGet { local_idx: 2 },
                Instr::LocalSet { local_idx: 1 },
                Instr::LocalGet { local_idx: 3 },
                Instr::LocalSet { local_idx: 2 },
                // n -= 1
                Instr::LocalGet { local_idx: 0 },
                Instr::I32Const { value: 1 },
                Instr::I32Sub,
                Instr::LocalSet { local_idx: 0 },
                Instr::Br { depth: 0 },
                Instr::End,
                Instr::End,
                Instr::LocalGet { local_idx: 1 },
                Instr::End,
            ],
        }],
        exports: vec![Export {
            name: "fib".into(),
            kind: ExportKind::Function,
            index: 0,
        }],
        ..Default::default()
    }
}

/// Recursive call overhead: fac(n) with one call per level.
fn fac_module() -> Module {
    Module {
        types: vec![FunctionType::new(vec![ValueType::I32], vec![ValueType::I32])],
        functions: vec![FunctionDef {
            type_idx: 0,
            locals: vec![],
            body: vec![
                Instr::LocalGet { local_idx: 0 },
                Instr::I32Eqz,
                Instr::If {
                    block_type: BlockType::Value(ValueType::I32),
                },
                Instr::I32Const { value: 1 },
                Instr::Else,
                Instr::LocalGet { local_idx: 0 },
                Instr::LocalGet { local_idx: 0 },
                Instr::I32Const { value: 1 },
                Instr::I32Sub,
                Instr::Call { func_idx: 0 },
                Instr::I32Mul,
                Instr::End,
                Instr::End,
            ],
        }],
        exports: vec![Export {
            name: "fac".into(),
            kind: ExportKind::Function,
            index: 0,
        }],
        ..Default::default()
    }
}

/// Sequential stores across a page: the load/store fast path.
fn memory_module() -> Module {
    Module {
        types: vec![FunctionType::new(vec![ValueType::I32], vec![])],
        memories: vec![MemoryDef {
            limits: Limits::new(1, None),
        }],
        functions: vec![FunctionDef {
            type_idx: 0,
            locals: vec![ValueType::I32],
            body: vec![
                Instr::Block {
                    block_type: BlockType::Empty,
                },
                Instr::Loop {
                    block_type: BlockType::Empty,
                },
                Instr::LocalGet { local_idx: 0 },
                Instr::I32Eqz,
                Instr::BrIf { depth: 1 },
                Instr::LocalGet { local_idx: 0 },
                Instr::I32Const { value: 1 },
                Instr::I32Sub,
                Instr::LocalTee { local_idx: 0 },
                Instr::I32Const { value: 4 },
                Instr::I32Mul,
                Instr::LocalTee { local_idx: 1 },
                Instr::LocalGet { local_idx: 1 },
                Instr::I32Store { memarg: MemArg { align: 2, offset: 0 } },
                Instr::Br { depth: 0 },
                Instr::End,
                Instr::End,
                Instr::End,
            ],
        }],
        exports: vec![Export {
            name: "sweep".into(),
            kind: ExportKind::Function,
            index: 0,
        }],
        ..Default::default()
    }
}

fn verify() {
    let mut vm = Vm::default();
    vm.instantiate(&fib_module()).unwrap();
    assert_eq!(
        vm.execute("fib", vec![Value::I32(20)]).unwrap(),
        vec![Value::I32(6765)]
    );

    let mut vm = Vm::default();
    vm.instantiate(&fac_module()).unwrap();
    assert_eq!(
        vm.execute("fac", vec![Value::I32(10)]).unwrap(),
        vec![Value::I32(3628800)]
    );

    let mut vm = Vm::default();
    vm.instantiate(&memory_module()).unwrap();
    vm.execute("sweep", vec![Value::I32(1024)]).unwrap();
}

fn bench_execution(c: &mut Criterion) {
    verify();

    let mut group = c.benchmark_group("execution");

    let mut vm = Vm::default();
    vm.instantiate(&fib_module()).unwrap();
    for n in [100, 1000] {
        group.bench_with_input(BenchmarkId::new("fib_iterative", n), &n, |bench, &n| {
            bench.iter(|| vm.execute("fib", vec![Value::I32(black_box(n))]).unwrap());
        });
    }

    let mut vm = Vm::default();
    vm.instantiate(&fac_module()).unwrap();
    group.bench_function("fac_recursive_12", |bench| {
        bench.iter(|| vm.execute("fac", vec![Value::I32(black_box(12))]).unwrap());
    });

    let mut vm = Vm::default();
    vm.instantiate(&memory_module()).unwrap();
    group.bench_function("memory_sweep_4k", |bench| {
        bench.iter(|| vm.execute("sweep", vec![Value::I32(black_box(1024))]).unwrap());
    });

    group.finish();
}

criterion_group!(benches, bench_execution);
criterion_main!(benches);
