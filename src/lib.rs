//! A WebAssembly execution core written in Rust.
//!
//! wexec is the runtime half of a WebAssembly virtual machine: the store
//! that owns tables, memories, globals, and functions behind stable numeric
//! addresses, the heterogeneous operand/control stack, and the stack-machine
//! interpreter that executes instruction streams. Decoding and validation
//! are left to a front-end; wexec consumes already-validated
//! [`module::Module`] descriptions.
//!
//! # Modules
//!
//! - [`module`] -- Structural module descriptions (types, bodies, segments,
//!   exports) handed over by a decoder.
//! - [`instr`] -- The instruction set and per-body control-target
//!   resolution.
//! - [`runtime`] -- Store, instances, stack manager, interpreter, and the
//!   host function seam (including an Ethereum Environment Interface host
//!   module).
//! - [`vm`] -- The embedder facade: configuration, module registration, and
//!   `execute`.
//!
//! # Example
//!
//! Describe a module with one exported function, instantiate it, and call
//! it:
//!
//! ```
//! use wexec::instr::Instr;
//! use wexec::module::{Export, ExportKind, FunctionDef, FunctionType, Module, ValueType};
//! use wexec::runtime::Value;
//! use wexec::vm::Vm;
//!
//! let module = Module {
//!     types: vec![FunctionType::new(
//!         vec![ValueType::I32, ValueType::I32],
//!         vec![ValueType::I32],
//!     )],
//!     functions: vec![FunctionDef {
//!         type_idx: 0,
//!         locals: vec![],
//!         body: vec![
//!             Instr::LocalGet { local_idx: 0 },
//!             Instr::LocalGet { local_idx: 1 },
//!             Instr::I32Add,
//!             Instr::End,
//!         ],
//!     }],
//!     exports: vec![Export {
//!         name: "add".into(),
//!         kind: ExportKind::Function,
//!         index: 0,
//!     }],
//!     ..Default::default()
//! };
//!
//! let mut vm = Vm::default();
//! vm.instantiate(&module).unwrap();
//! let results = vm.execute("add", vec![Value::I32(2), Value::I32(3)]).unwrap();
//! assert_eq!(results, vec![Value::I32(5)]);
//! ```

pub mod instr;
pub mod module;
pub mod runtime;
pub mod vm;

pub use runtime::{Trap, Value};
pub use vm::{Config, Vm};
