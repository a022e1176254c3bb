//! Structural description of a WebAssembly module.
//!
//! wexec does not decode binaries: a front-end (decoder + validator) hands it
//! a [`Module`] whose constant expressions are already evaluated and whose
//! indices are already known to be in range. Instantiation
//! ([`crate::runtime::Store::instantiate`]) turns this description into live
//! instances.

use crate::instr::Instr;
use crate::runtime::Value;

/// The four WebAssembly number types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    I32,
    I64,
    F32,
    F64,
}

/// Reference types storable in tables.
///
/// Only function references exist at this level; external references arrive
/// with the reference-types proposal and are gated off by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefType {
    FuncRef,
}

/// A function signature: parameter types and result types.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FunctionType {
    pub params: Vec<ValueType>,
    pub results: Vec<ValueType>,
}

impl FunctionType {
    pub fn new(params: Vec<ValueType>, results: Vec<ValueType>) -> Self {
        FunctionType { params, results }
    }
}

/// Size limits for tables (slots) and memories (pages).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub min: u32,
    pub max: Option<u32>,
}

impl Limits {
    pub fn new(min: u32, max: Option<u32>) -> Self {
        Limits { min, max }
    }
}

/// What an import requests from the registering module.
#[derive(Debug, Clone, PartialEq)]
pub enum ImportDesc {
    /// Function import, carrying an index into [`Module::types`].
    Function(u32),
    Table(Limits),
    Memory(Limits),
    Global { ty: ValueType, mutable: bool },
}

/// A single import: resolved by name against modules registered in the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Import {
    pub module: String,
    pub name: String,
    pub desc: ImportDesc,
}

/// A defined function: its type, extra locals, and a flat instruction body.
///
/// The body is the function expression as decoded, including the terminating
/// `End`. Control structure is resolved once when the function instance is
/// allocated.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub type_idx: u32,
    pub locals: Vec<ValueType>,
    pub body: Vec<Instr>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableDef {
    pub elem: RefType,
    pub limits: Limits,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MemoryDef {
    pub limits: Limits,
}

/// A defined global. `init` is the pre-evaluated constant initializer.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalDef {
    pub ty: ValueType,
    pub mutable: bool,
    pub init: Value,
}

/// An active element segment: function indices written into a table at a
/// pre-evaluated offset during instantiation.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementSegment {
    pub table: u32,
    pub offset: u32,
    pub functions: Vec<u32>,
}

/// An active data segment: bytes copied into a memory during instantiation.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSegment {
    pub memory: u32,
    pub offset: u32,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Function,
    Table,
    Memory,
    Global,
}

/// A named export. `index` is into the module's combined index space for the
/// kind (imports first, then definitions).
#[derive(Debug, Clone, PartialEq)]
pub struct Export {
    pub name: String,
    pub kind: ExportKind,
    pub index: u32,
}

/// A validated module description, ready for instantiation.
#[derive(Debug, Clone, Default)]
pub struct Module {
    pub types: Vec<FunctionType>,
    pub imports: Vec<Import>,
    pub functions: Vec<FunctionDef>,
    pub tables: Vec<TableDef>,
    pub memories: Vec<MemoryDef>,
    pub globals: Vec<GlobalDef>,
    pub elements: Vec<ElementSegment>,
    pub data: Vec<DataSegment>,
    pub exports: Vec<Export>,
    pub start: Option<u32>,
}

impl Module {
    /// Number of function imports (they occupy the front of the function
    /// index space).
    pub fn imported_function_count(&self) -> usize {
        self.imports
            .iter()
            .filter(|i| matches!(i.desc, ImportDesc::Function(_)))
            .count()
    }

    /// Look up an export by name and kind.
    pub fn find_export(&self, name: &str, kind: ExportKind) -> Option<&Export> {
        self.exports.iter().find(|e| e.kind == kind && e.name == name)
    }
}
