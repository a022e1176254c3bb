//! Module instance: the per-module symbol tables built at instantiation.
//!
//! A module instance maps the module's local index spaces onto store
//! addresses and exposes its exports by name. It holds addresses only,
//! never references, so it stays cheap to point at from frames and free of
//! ownership cycles (module → function → module). Immutable once
//! instantiation finishes.

use crate::module::FunctionType;
use crate::runtime::store::{FuncAddr, GlobalAddr, MemAddr, TableAddr};
use crate::runtime::Trap;
use std::collections::HashMap;

/// Symbol tables for one instantiated module.
#[derive(Debug, Default)]
pub struct ModuleInstance {
    /// The module's type section, used by `call_indirect` type checks.
    types: Vec<FunctionType>,
    func_addrs: Vec<FuncAddr>,
    table_addrs: Vec<TableAddr>,
    mem_addrs: Vec<MemAddr>,
    global_addrs: Vec<GlobalAddr>,
    func_exports: HashMap<String, FuncAddr>,
    table_exports: HashMap<String, TableAddr>,
    mem_exports: HashMap<String, MemAddr>,
    global_exports: HashMap<String, GlobalAddr>,
}

impl ModuleInstance {
    pub fn new(types: Vec<FunctionType>) -> Self {
        ModuleInstance {
            types,
            ..Default::default()
        }
    }

    /// The function type at a type-section index.
    pub fn func_type(&self, type_idx: u32) -> Result<&FunctionType, Trap> {
        self.types
            .get(type_idx as usize)
            .ok_or(Trap::TypeIndexOutOfBounds(type_idx))
    }

    pub fn push_func_addr(&mut self, addr: FuncAddr) {
        self.func_addrs.push(addr);
    }

    pub fn push_table_addr(&mut self, addr: TableAddr) {
        self.table_addrs.push(addr);
    }

    pub fn push_mem_addr(&mut self, addr: MemAddr) {
        self.mem_addrs.push(addr);
    }

    pub fn push_global_addr(&mut self, addr: GlobalAddr) {
        self.global_addrs.push(addr);
    }

    /// Store address of the function at a local index.
    pub fn func_addr(&self, idx: u32) -> Result<FuncAddr, Trap> {
        self.func_addrs
            .get(idx as usize)
            .copied()
            .ok_or(Trap::FuncIndexOutOfBounds(idx))
    }

    /// Store address of the table at a local index.
    pub fn table_addr(&self, idx: u32) -> Result<TableAddr, Trap> {
        self.table_addrs
            .get(idx as usize)
            .copied()
            .ok_or(Trap::TableIndexOutOfBounds(idx))
    }

    /// Store address of the memory at a local index.
    pub fn mem_addr(&self, idx: u32) -> Result<MemAddr, Trap> {
        self.mem_addrs
            .get(idx as usize)
            .copied()
            .ok_or(Trap::MemIndexOutOfBounds(idx))
    }

    /// Store address of the global at a local index.
    pub fn global_addr(&self, idx: u32) -> Result<GlobalAddr, Trap> {
        self.global_addrs
            .get(idx as usize)
            .copied()
            .ok_or(Trap::GlobalIndexOutOfBounds(idx))
    }

    pub fn func_count(&self) -> u32 {
        self.func_addrs.len() as u32
    }

    pub fn export_func(&mut self, name: impl Into<String>, addr: FuncAddr) {
        self.func_exports.insert(name.into(), addr);
    }

    pub fn export_table(&mut self, name: impl Into<String>, addr: TableAddr) {
        self.table_exports.insert(name.into(), addr);
    }

    pub fn export_mem(&mut self, name: impl Into<String>, addr: MemAddr) {
        self.mem_exports.insert(name.into(), addr);
    }

    pub fn export_global(&mut self, name: impl Into<String>, addr: GlobalAddr) {
        self.global_exports.insert(name.into(), addr);
    }

    pub fn find_func_export(&self, name: &str) -> Option<FuncAddr> {
        self.func_exports.get(name).copied()
    }

    pub fn find_table_export(&self, name: &str) -> Option<TableAddr> {
        self.table_exports.get(name).copied()
    }

    pub fn find_mem_export(&self, name: &str) -> Option<MemAddr> {
        self.mem_exports.get(name).copied()
    }

    pub fn find_global_export(&self, name: &str) -> Option<GlobalAddr> {
        self.global_exports.get(name).copied()
    }
}
