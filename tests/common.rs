//! Shared helpers for building module descriptions in tests.

// Compiled both standalone and via `mod common;`, so not every helper is
// used in every compilation.
#![allow(dead_code)]

use wexec::instr::Instr;
use wexec::module::{
    Export, ExportKind, FunctionDef, FunctionType, GlobalDef, Limits, MemoryDef, Module, RefType, TableDef, ValueType,
};
use wexec::runtime::Value;

/// Incrementally builds a [`Module`] description.
#[derive(Default)]
pub struct ModuleBuilder {
    module: Module,
}

impl ModuleBuilder {
    pub fn new() -> Self {
        ModuleBuilder::default()
    }

    /// Add a function type, returning its index.
    pub fn ty(&mut self, params: Vec<ValueType>, results: Vec<ValueType>) -> u32 {
        self.module.types.push(FunctionType::new(params, results));
        (self.module.types.len() - 1) as u32
    }

    /// Add a function, returning its index in the function index space.
    /// Add imports before functions so the indices line up.
    pub fn func(&mut self, type_idx: u32, locals: Vec<ValueType>, body: Vec<Instr>) -> u32 {
        self.module.functions.push(FunctionDef { type_idx, locals, body });
        (self.module.imported_function_count() + self.module.functions.len() - 1) as u32
    }

    /// Add an exported function in one step.
    pub fn export_func(&mut self, name: &str, type_idx: u32, locals: Vec<ValueType>, body: Vec<Instr>) -> u32 {
        let idx = self.func(type_idx, locals, body);
        self.module.exports.push(Export {
            name: name.to_string(),
            kind: ExportKind::Function,
            index: idx,
        });
        idx
    }

    pub fn memory(&mut self, min: u32, max: Option<u32>) -> &mut Self {
        self.module.memories.push(MemoryDef {
            limits: Limits::new(min, max),
        });
        self
    }

    pub fn table(&mut self, min: u32, max: Option<u32>) -> &mut Self {
        self.module.tables.push(TableDef {
            elem: RefType::FuncRef,
            limits: Limits::new(min, max),
        });
        self
    }

    pub fn global(&mut self, init: Value, mutable: bool) -> u32 {
        self.module.globals.push(GlobalDef {
            ty: init.ty(),
            mutable,
            init,
        });
        (self.module.globals.len() - 1) as u32
    }

    pub fn element(&mut self, offset: u32, functions: Vec<u32>) -> &mut Self {
        self.module.elements.push(wexec::module::ElementSegment {
            table: 0,
            offset,
            functions,
        });
        self
    }

    pub fn import_func(&mut self, module: &str, name: &str, type_idx: u32) -> &mut Self {
        self.module.imports.push(wexec::module::Import {
            module: module.to_string(),
            name: name.to_string(),
            desc: wexec::module::ImportDesc::Function(type_idx),
        });
        self
    }

    pub fn export_table(&mut self, name: &str, index: u32) -> &mut Self {
        self.module.exports.push(Export {
            name: name.to_string(),
            kind: ExportKind::Table,
            index,
        });
        self
    }

    pub fn build(&mut self) -> Module {
        std::mem::take(&mut self.module)
    }
}
