//! The store: process-scoped owner of every runtime instance.
//!
//! Four append-only collections (functions, tables, memories, globals) plus
//! the module instances themselves, each addressed by its insertion
//! position. Addresses are stable for the store's lifetime: nothing is ever
//! moved, reindexed, or deleted, so an address cached during one call
//! remains valid for the next. Teardown drops the whole store at once.
//!
//! Instantiation lives here too: resolving a validated [`Module`]
//! description against registered modules and allocating its instances.

use crate::instr::FuncBody;
use crate::module::{ExportKind, ImportDesc, Limits, Module};
use crate::runtime::function::FunctionInstance;
use crate::runtime::global::GlobalInstance;
use crate::runtime::host::HostFunction;
use crate::runtime::instance::ModuleInstance;
use crate::runtime::memory::MemoryInstance;
use crate::runtime::table::TableInstance;
use crate::runtime::Trap;
use log::debug;
use std::collections::HashMap;
use std::sync::Arc;

/// Store address of a function instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FuncAddr(pub u32);

/// Store address of a table instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TableAddr(pub u32);

/// Store address of a memory instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemAddr(pub u32);

/// Store address of a global instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GlobalAddr(pub u32);

/// Store address of a module instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModuleAddr(pub u32);

/// Owner of all runtime instances, addressed by stable numeric indices.
#[derive(Debug, Default)]
pub struct Store {
    functions: Vec<FunctionInstance>,
    tables: Vec<TableInstance>,
    memories: Vec<MemoryInstance>,
    globals: Vec<GlobalInstance>,
    modules: Vec<ModuleInstance>,
    names: HashMap<String, ModuleAddr>,
    active: Option<ModuleAddr>,
}

impl Store {
    pub fn new() -> Self {
        Store::default()
    }

    // ------------------------------------------------------------------
    // Allocation. Each push hands back the assigned address.

    pub fn push_function(&mut self, func: FunctionInstance) -> FuncAddr {
        let addr = FuncAddr(self.functions.len() as u32);
        self.functions.push(func);
        addr
    }

    pub fn push_table(&mut self, table: TableInstance) -> TableAddr {
        let addr = TableAddr(self.tables.len() as u32);
        self.tables.push(table);
        addr
    }

    pub fn push_memory(&mut self, memory: MemoryInstance) -> MemAddr {
        let addr = MemAddr(self.memories.len() as u32);
        self.memories.push(memory);
        addr
    }

    pub fn push_global(&mut self, global: GlobalInstance) -> GlobalAddr {
        let addr = GlobalAddr(self.globals.len() as u32);
        self.globals.push(global);
        addr
    }

    pub fn push_module(&mut self, module: ModuleInstance) -> ModuleAddr {
        let addr = ModuleAddr(self.modules.len() as u32);
        self.modules.push(module);
        addr
    }

    // ------------------------------------------------------------------
    // Address-based lookup.

    pub fn function(&self, addr: FuncAddr) -> Result<&FunctionInstance, Trap> {
        self.functions
            .get(addr.0 as usize)
            .ok_or(Trap::FuncAddrOutOfBounds(addr.0))
    }

    pub fn table(&self, addr: TableAddr) -> Result<&TableInstance, Trap> {
        self.tables
            .get(addr.0 as usize)
            .ok_or(Trap::TableAddrOutOfBounds(addr.0))
    }

    pub fn table_mut(&mut self, addr: TableAddr) -> Result<&mut TableInstance, Trap> {
        self.tables
            .get_mut(addr.0 as usize)
            .ok_or(Trap::TableAddrOutOfBounds(addr.0))
    }

    pub fn memory(&self, addr: MemAddr) -> Result<&MemoryInstance, Trap> {
        self.memories
            .get(addr.0 as usize)
            .ok_or(Trap::MemAddrOutOfBounds(addr.0))
    }

    pub fn memory_mut(&mut self, addr: MemAddr) -> Result<&mut MemoryInstance, Trap> {
        self.memories
            .get_mut(addr.0 as usize)
            .ok_or(Trap::MemAddrOutOfBounds(addr.0))
    }

    pub fn global(&self, addr: GlobalAddr) -> Result<&GlobalInstance, Trap> {
        self.globals
            .get(addr.0 as usize)
            .ok_or(Trap::GlobalAddrOutOfBounds(addr.0))
    }

    pub fn global_mut(&mut self, addr: GlobalAddr) -> Result<&mut GlobalInstance, Trap> {
        self.globals
            .get_mut(addr.0 as usize)
            .ok_or(Trap::GlobalAddrOutOfBounds(addr.0))
    }

    pub fn module(&self, addr: ModuleAddr) -> Result<&ModuleInstance, Trap> {
        self.modules
            .get(addr.0 as usize)
            .ok_or(Trap::ModuleAddrOutOfBounds(addr.0))
    }

    // ------------------------------------------------------------------
    // Name registry and the active-module slot.

    /// Register an instantiated module under a name for import resolution.
    pub fn register(&mut self, name: impl Into<String>, addr: ModuleAddr) -> Result<(), Trap> {
        let name = name.into();
        if self.names.contains_key(&name) {
            return Err(Trap::DuplicateModuleName(name));
        }
        self.names.insert(name, addr);
        Ok(())
    }

    pub fn find_module(&self, name: &str) -> Option<ModuleAddr> {
        self.names.get(name).copied()
    }

    /// The module targeted by anonymous invocation, if one was instantiated.
    pub fn active_module(&self) -> Option<ModuleAddr> {
        self.active
    }

    pub fn set_active_module(&mut self, addr: ModuleAddr) {
        self.active = Some(addr);
    }

    // ------------------------------------------------------------------
    // Instantiation.

    /// Turn a validated module description into live instances.
    ///
    /// Imports are resolved against modules registered by name; a missing or
    /// type-incompatible import is `IncompatibleImportType`. Element
    /// segments are fit-checked against the table's declared minimum before
    /// any slot is written; data segments against the memory's declared
    /// minimum.
    pub fn instantiate(&mut self, module: &Module) -> Result<ModuleAddr, Trap> {
        let mod_addr = ModuleAddr(self.modules.len() as u32);
        let mut inst = ModuleInstance::new(module.types.clone());

        self.resolve_imports(module, &mut inst)?;

        // Defined functions. Bodies resolve their control structure once,
        // here.
        for def in &module.functions {
            let ty = module
                .types
                .get(def.type_idx as usize)
                .ok_or(Trap::TypeIndexOutOfBounds(def.type_idx))?
                .clone();
            let body = Arc::new(FuncBody::new(def.body.clone())?);
            let addr = self.push_function(FunctionInstance::Wasm {
                module: mod_addr,
                ty,
                locals: def.locals.clone(),
                body,
            });
            inst.push_func_addr(addr);
        }

        for def in &module.tables {
            let addr = self.push_table(TableInstance::new(def.elem, def.limits));
            inst.push_table_addr(addr);
        }

        for def in &module.memories {
            let addr = self.push_memory(MemoryInstance::new(def.limits));
            inst.push_mem_addr(addr);
        }

        for def in &module.globals {
            if def.init.ty() != def.ty {
                return Err(Trap::TypeNotMatch {
                    expected: def.ty,
                    actual: def.init.ty(),
                });
            }
            let addr = self.push_global(GlobalInstance::new(def.init, def.mutable));
            inst.push_global_addr(addr);
        }

        // Element segments: fit-check against the declared minimum, then
        // write the run.
        for seg in &module.elements {
            let table_addr = inst.table_addr(seg.table)?;
            let addrs: Vec<FuncAddr> = seg
                .functions
                .iter()
                .map(|fi| inst.func_addr(*fi))
                .collect::<Result<_, _>>()?;
            let table = self.table_mut(table_addr)?;
            if !table.check_access(seg.offset, addrs.len() as u32) {
                return Err(Trap::UndefinedElement);
            }
            table.set_init_list(seg.offset, &addrs)?;
        }

        // Data segments.
        for seg in &module.data {
            let mem_addr = inst.mem_addr(seg.memory)?;
            let memory = self.memory_mut(mem_addr)?;
            if !memory.check_access(seg.offset, seg.bytes.len() as u32) {
                return Err(Trap::MemoryOutOfBounds {
                    offset: seg.offset as u64,
                    length: seg.bytes.len() as u64,
                });
            }
            memory.write_bytes(seg.offset, &seg.bytes)?;
        }

        for export in &module.exports {
            match export.kind {
                ExportKind::Function => inst.export_func(&export.name, inst.func_addr(export.index)?),
                ExportKind::Table => inst.export_table(&export.name, inst.table_addr(export.index)?),
                ExportKind::Memory => inst.export_mem(&export.name, inst.mem_addr(export.index)?),
                ExportKind::Global => inst.export_global(&export.name, inst.global_addr(export.index)?),
            }
        }

        debug!(
            "instantiated module {}: {} functions, {} tables, {} memories, {} globals",
            mod_addr.0,
            inst.func_count(),
            module.tables.len(),
            module.memories.len(),
            module.globals.len(),
        );

        Ok(self.push_module(inst))
    }

    /// Wrap a set of named host functions as a module instance exporting
    /// them, so Wasm modules can import them like any other module.
    pub fn instantiate_host_module(&mut self, funcs: Vec<(String, Arc<dyn HostFunction>)>) -> ModuleAddr {
        let mut inst = ModuleInstance::new(Vec::new());
        for (name, callable) in funcs {
            let ty = callable.ty().clone();
            let addr = self.push_function(FunctionInstance::Host { ty, callable });
            inst.push_func_addr(addr);
            inst.export_func(name, addr);
        }
        self.push_module(inst)
    }

    fn resolve_imports(&self, module: &Module, inst: &mut ModuleInstance) -> Result<(), Trap> {
        for imp in &module.imports {
            let full_name = || format!("{}.{}", imp.module, imp.name);
            let exporter_addr = self
                .find_module(&imp.module)
                .ok_or_else(|| Trap::IncompatibleImportType(format!("{} (module not registered)", full_name())))?;
            let exporter = self.module(exporter_addr)?;

            match &imp.desc {
                ImportDesc::Function(type_idx) => {
                    let expected = module
                        .types
                        .get(*type_idx as usize)
                        .ok_or(Trap::TypeIndexOutOfBounds(*type_idx))?;
                    let addr = exporter
                        .find_func_export(&imp.name)
                        .ok_or_else(|| Trap::IncompatibleImportType(full_name()))?;
                    let actual = self.function(addr)?.ty();
                    if actual != expected {
                        return Err(Trap::IncompatibleImportType(format!(
                            "{}: expected {expected:?}, got {actual:?}",
                            full_name()
                        )));
                    }
                    inst.push_func_addr(addr);
                }
                ImportDesc::Table(limits) => {
                    let addr = exporter
                        .find_table_export(&imp.name)
                        .ok_or_else(|| Trap::IncompatibleImportType(full_name()))?;
                    let table = self.table(addr)?;
                    if !limits_match(*limits, table.size(), table.max_size()) {
                        return Err(Trap::IncompatibleImportType(full_name()));
                    }
                    inst.push_table_addr(addr);
                }
                ImportDesc::Memory(limits) => {
                    let addr = exporter
                        .find_mem_export(&imp.name)
                        .ok_or_else(|| Trap::IncompatibleImportType(full_name()))?;
                    let memory = self.memory(addr)?;
                    if !limits_match(*limits, memory.size(), memory.max_pages()) {
                        return Err(Trap::IncompatibleImportType(full_name()));
                    }
                    inst.push_mem_addr(addr);
                }
                ImportDesc::Global { ty, mutable } => {
                    let addr = exporter
                        .find_global_export(&imp.name)
                        .ok_or_else(|| Trap::IncompatibleImportType(full_name()))?;
                    let global = self.global(addr)?;
                    if global.ty() != *ty || global.is_mutable() != *mutable {
                        return Err(Trap::IncompatibleImportType(full_name()));
                    }
                    inst.push_global_addr(addr);
                }
            }
        }
        Ok(())
    }
}

/// Limits subtyping for table and memory imports: the exported instance must
/// be at least as large as required, and no more growable than allowed.
fn limits_match(required: Limits, actual_size: u32, actual_max: Option<u32>) -> bool {
    if actual_size < required.min {
        return false;
    }
    match required.max {
        None => true,
        Some(req_max) => matches!(actual_max, Some(act_max) if act_max <= req_max),
    }
}
