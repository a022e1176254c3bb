//! WebAssembly runtime core.
//!
//! This module provides the execution engine: the store that owns all
//! runtime instances, the heterogeneous operand/control stack, and the
//! instruction interpreter.

pub mod eei;
pub mod executor;
pub mod function;
pub mod global;
pub mod host;
pub mod instance;
pub mod memory;
pub mod ops;
pub mod stack;
pub mod store;
pub mod table;
pub mod value;

pub use executor::Executor;
pub use function::FunctionInstance;
pub use global::GlobalInstance;
pub use host::HostFunction;
pub use instance::ModuleInstance;
pub use memory::MemoryInstance;
pub use stack::{Frame, Label, LabelKind, StackManager};
pub use store::{FuncAddr, GlobalAddr, MemAddr, ModuleAddr, Store, TableAddr};
pub use table::TableInstance;
pub use value::{TableSlot, Value};

use crate::module::ValueType;

/// A non-recoverable execution failure.
///
/// Every runtime error is a trap: it unwinds the current `execute`
/// invocation and reaches the embedder as this single error value. Traps are
/// never caught inside the VM. `StackEmpty` and `StackWrongEntry` cannot
/// occur for validated modules; seeing one means the interpreter itself is
/// broken.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Trap {
    #[error("stack is empty")]
    StackEmpty,
    #[error("wrong entry kind on top of stack")]
    StackWrongEntry,
    #[error("no activation frame on the stack")]
    NoFrame,
    #[error("no label at the requested depth")]
    NoLabel,
    #[error("value type mismatch: expected {expected:?}, got {actual:?}")]
    TypeNotMatch { expected: ValueType, actual: ValueType },
    #[error("undefined table element")]
    UndefinedElement,
    #[error("uninitialized table element")]
    UninitializedElement,
    #[error("out of bounds memory access at {offset}..{offset}+{length}")]
    MemoryOutOfBounds { offset: u64, length: u64 },
    #[error("integer divide by zero")]
    DivideByZero,
    #[error("integer overflow")]
    IntegerOverflow,
    #[error("invalid conversion to integer")]
    InvalidConversionToInteger,
    #[error("function call failed: {0}")]
    CallFunctionError(String),
    #[error("incompatible import type: {0}")]
    IncompatibleImportType(String),
    #[error("unreachable executed")]
    Unreachable,
    #[error("indirect call type mismatch")]
    IndirectCallTypeMismatch,
    #[error("write to immutable global")]
    ImmutableGlobal,
    #[error("module name already registered: {0}")]
    DuplicateModuleName(String),
    #[error("call stack exhausted")]
    CallStackExhausted,
    #[error("instruction requires disabled feature: {0}")]
    FeatureDisabled(&'static str),
    #[error("unbalanced control flow in function body")]
    UnbalancedControlFlow,
    #[error("function address out of bounds: {0}")]
    FuncAddrOutOfBounds(u32),
    #[error("table address out of bounds: {0}")]
    TableAddrOutOfBounds(u32),
    #[error("memory address out of bounds: {0}")]
    MemAddrOutOfBounds(u32),
    #[error("global address out of bounds: {0}")]
    GlobalAddrOutOfBounds(u32),
    #[error("module address out of bounds: {0}")]
    ModuleAddrOutOfBounds(u32),
    #[error("function index out of bounds: {0}")]
    FuncIndexOutOfBounds(u32),
    #[error("table index out of bounds: {0}")]
    TableIndexOutOfBounds(u32),
    #[error("memory index out of bounds: {0}")]
    MemIndexOutOfBounds(u32),
    #[error("global index out of bounds: {0}")]
    GlobalIndexOutOfBounds(u32),
    #[error("local index out of bounds: {0}")]
    LocalIndexOutOfBounds(u32),
    #[error("type index out of bounds: {0}")]
    TypeIndexOutOfBounds(u32),
}
