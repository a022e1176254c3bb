//! Embedder-facing virtual machine.
//!
//! Ties the store and the executor together behind the surface an embedder
//! works with: register modules under names, instantiate an anonymous active
//! module, invoke exports, and reach into the store for memories and
//! globals.

use crate::module::Module;
use crate::runtime::executor::Executor;
use crate::runtime::host::HostFunction;
use crate::runtime::store::{ModuleAddr, Store};
use crate::runtime::{Trap, Value};
use log::debug;
use std::sync::Arc;

/// Feature flags the VM is created with.
///
/// These gate instruction families at execution time; decoding and
/// validation of the corresponding opcodes is the front-end's concern.
#[derive(Debug, Clone, Copy)]
pub struct Config {
    /// Reference-types proposal. Off by default; tables hold funcrefs only.
    pub reference_types: bool,
    /// Bulk memory operations (`memory.copy`, `memory.fill`).
    pub bulk_memory: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            reference_types: false,
            bulk_memory: true,
        }
    }
}

/// A virtual machine: one store, one executor, one configuration.
pub struct Vm {
    store: Store,
    executor: Executor,
}

impl Default for Vm {
    fn default() -> Self {
        Vm::new(Config::default())
    }
}

impl Vm {
    pub fn new(config: Config) -> Self {
        Vm {
            store: Store::new(),
            executor: Executor::new(config),
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut Store {
        &mut self.store
    }

    /// Instantiate `module` and register it under `name` so later modules
    /// can import from it. Runs the start function, if declared.
    pub fn register_module(&mut self, name: &str, module: &Module) -> Result<ModuleAddr, Trap> {
        if self.store.find_module(name).is_some() {
            return Err(Trap::DuplicateModuleName(name.to_string()));
        }
        let addr = self.store.instantiate(module)?;
        self.run_start(module, addr)?;
        self.store.register(name, addr)?;
        Ok(addr)
    }

    /// Register a set of native functions as a named module.
    pub fn register_host_module(
        &mut self,
        name: &str,
        funcs: Vec<(String, Arc<dyn HostFunction>)>,
    ) -> Result<ModuleAddr, Trap> {
        if self.store.find_module(name).is_some() {
            return Err(Trap::DuplicateModuleName(name.to_string()));
        }
        let addr = self.store.instantiate_host_module(funcs);
        self.store.register(name, addr)?;
        Ok(addr)
    }

    /// Instantiate `module` as the anonymous active module targeted by
    /// [`execute`](Self::execute). Runs the start function, if declared.
    pub fn instantiate(&mut self, module: &Module) -> Result<ModuleAddr, Trap> {
        let addr = self.store.instantiate(module)?;
        self.store.set_active_module(addr);
        self.run_start(module, addr)?;
        Ok(addr)
    }

    /// Invoke an export of the active module.
    pub fn execute(&mut self, field: &str, params: Vec<Value>) -> Result<Vec<Value>, Trap> {
        let addr = self
            .store
            .active_module()
            .ok_or_else(|| Trap::IncompatibleImportType("no active module".to_string()))?;
        self.execute_at(addr, field, params)
    }

    /// Invoke an export of a module registered under `module_name`.
    pub fn execute_registered(
        &mut self,
        module_name: &str,
        field: &str,
        params: Vec<Value>,
    ) -> Result<Vec<Value>, Trap> {
        let addr = self
            .store
            .find_module(module_name)
            .ok_or_else(|| Trap::IncompatibleImportType(format!("{module_name} (module not registered)")))?;
        self.execute_at(addr, field, params)
    }

    fn execute_at(&mut self, addr: ModuleAddr, field: &str, params: Vec<Value>) -> Result<Vec<Value>, Trap> {
        let func = self
            .store
            .module(addr)?
            .find_func_export(field)
            .ok_or_else(|| Trap::IncompatibleImportType(format!("export not found: {field}")))?;
        debug!("executing {field} (function {})", func.0);
        self.executor.invoke(&mut self.store, addr, func, params)
    }

    fn run_start(&mut self, module: &Module, addr: ModuleAddr) -> Result<(), Trap> {
        if let Some(start_idx) = module.start {
            let func = self.store.module(addr)?.func_addr(start_idx)?;
            self.executor.invoke(&mut self.store, addr, func, Vec::new())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instr::Instr;
    use crate::module::{Export, ExportKind, FunctionDef, FunctionType, GlobalDef, ValueType};
    use crate::runtime::Value;

    fn counter_module() -> Module {
        // A mutable global and an exported function that increments it.
        Module {
            types: vec![FunctionType::new(vec![], vec![ValueType::I32])],
            functions: vec![FunctionDef {
                type_idx: 0,
                locals: vec![],
                body: vec![
                    Instr::GlobalGet { global_idx: 0 },
                    Instr::I32Const { value: 1 },
                    Instr::I32Add,
                    Instr::GlobalSet { global_idx: 0 },
                    Instr::GlobalGet { global_idx: 0 },
                    Instr::End,
                ],
            }],
            globals: vec![GlobalDef {
                ty: ValueType::I32,
                mutable: true,
                init: Value::I32(0),
            }],
            exports: vec![Export {
                name: "bump".into(),
                kind: ExportKind::Function,
                index: 0,
            }],
            ..Default::default()
        }
    }

    #[test]
    fn execute_on_active_module() {
        let mut vm = Vm::default();
        vm.instantiate(&counter_module()).unwrap();
        assert_eq!(vm.execute("bump", vec![]).unwrap(), vec![Value::I32(1)]);
        assert_eq!(vm.execute("bump", vec![]).unwrap(), vec![Value::I32(2)]);
    }

    #[test]
    fn execute_without_active_module() {
        let mut vm = Vm::default();
        assert!(matches!(
            vm.execute("f", vec![]),
            Err(Trap::IncompatibleImportType(_))
        ));
    }

    #[test]
    fn execute_registered_by_name() {
        let mut vm = Vm::default();
        vm.register_module("counter", &counter_module()).unwrap();
        assert_eq!(
            vm.execute_registered("counter", "bump", vec![]).unwrap(),
            vec![Value::I32(1)]
        );
        assert!(matches!(
            vm.execute_registered("missing", "bump", vec![]),
            Err(Trap::IncompatibleImportType(_))
        ));
    }

    #[test]
    fn missing_export_is_reported() {
        let mut vm = Vm::default();
        vm.instantiate(&counter_module()).unwrap();
        assert!(matches!(
            vm.execute("nope", vec![]),
            Err(Trap::IncompatibleImportType(_))
        ));
    }

    #[test]
    fn duplicate_name_is_rejected_before_instantiation() {
        let mut vm = Vm::default();
        vm.register_module("m", &counter_module()).unwrap();
        assert_eq!(
            vm.register_module("m", &counter_module()),
            Err(Trap::DuplicateModuleName("m".into()))
        );
    }

    #[test]
    fn start_function_runs_at_instantiation() {
        let mut module = counter_module();
        module.types.push(FunctionType::new(vec![], vec![]));
        module.functions.push(FunctionDef {
            type_idx: 1,
            locals: vec![],
            body: vec![
                Instr::GlobalGet { global_idx: 0 },
                Instr::I32Const { value: 10 },
                Instr::I32Add,
                Instr::GlobalSet { global_idx: 0 },
                Instr::End,
            ],
        });
        module.start = Some(1);

        let mut vm = Vm::default();
        vm.instantiate(&module).unwrap();
        // start bumped the counter by 10 before the first call.
        assert_eq!(vm.execute("bump", vec![]).unwrap(), vec![Value::I32(11)]);
    }

    #[test]
    fn param_checking() {
        let mut vm = Vm::default();
        vm.instantiate(&counter_module()).unwrap();
        assert!(matches!(
            vm.execute("bump", vec![Value::I32(1)]),
            Err(Trap::CallFunctionError(_))
        ));
    }
}
