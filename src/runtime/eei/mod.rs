//! Ethereum Environment Interface host module.
//!
//! A subset of the ewasm EEI covering the call data / return data seam:
//! `getCallDataSize`, `callDataCopy`, `getReturnDataSize`, `returnDataCopy`,
//! `finish`, and `revert`. Each host function resolves the caller's memory 0
//! through its module instance, so the functions work for whichever module
//! invoked them.
//!
//! Host function arguments arrive in declaration order: for
//! `finish(dataOffset, dataLength)`, `args[0]` is the offset. `finish` and
//! `revert` record the designated memory range as the call's return data and
//! return normally; whether the contract keeps running afterwards is the
//! contract's own code, and the embedder reads the outcome from the
//! [`EeiEnvironment`] once `execute` returns.

pub mod context;

pub use context::EeiEnvironment;

use crate::module::{FunctionType, ValueType};
use crate::runtime::host::HostFunction;
use crate::runtime::store::{MemAddr, ModuleAddr, Store};
use crate::runtime::{Trap, Value};
use std::sync::Arc;

/// The conventional import module name for these functions.
pub const EEI_MODULE: &str = "ethereum";

fn caller_memory(store: &Store, caller: ModuleAddr) -> Result<MemAddr, Trap> {
    store.module(caller)?.mem_addr(0)
}

struct GetCallDataSize {
    env: Arc<EeiEnvironment>,
    ty: FunctionType,
}

impl HostFunction for GetCallDataSize {
    fn ty(&self) -> &FunctionType {
        &self.ty
    }

    fn run(&self, _args: &[Value], _store: &mut Store, _caller: ModuleAddr) -> Result<Vec<Value>, Trap> {
        Ok(vec![Value::I32(self.env.call_data_size()? as i32)])
    }
}

struct CallDataCopy {
    env: Arc<EeiEnvironment>,
    ty: FunctionType,
}

impl HostFunction for CallDataCopy {
    fn ty(&self) -> &FunctionType {
        &self.ty
    }

    /// Args: resultOffset, dataOffset, length.
    fn run(&self, args: &[Value], store: &mut Store, caller: ModuleAddr) -> Result<Vec<Value>, Trap> {
        let [Value::I32(result_offset), Value::I32(data_offset), Value::I32(length)] = args else {
            return Err(Trap::CallFunctionError("callDataCopy: bad arguments".to_string()));
        };
        let bytes = self.env.call_data_slice(*data_offset as u32, *length as u32)?;
        let mem = caller_memory(store, caller)?;
        store.memory_mut(mem)?.write_bytes(*result_offset as u32, &bytes)?;
        Ok(vec![])
    }
}

struct GetReturnDataSize {
    env: Arc<EeiEnvironment>,
    ty: FunctionType,
}

impl HostFunction for GetReturnDataSize {
    fn ty(&self) -> &FunctionType {
        &self.ty
    }

    fn run(&self, _args: &[Value], _store: &mut Store, _caller: ModuleAddr) -> Result<Vec<Value>, Trap> {
        Ok(vec![Value::I32(self.env.return_data_size()? as i32)])
    }
}

struct ReturnDataCopy {
    env: Arc<EeiEnvironment>,
    ty: FunctionType,
}

impl HostFunction for ReturnDataCopy {
    fn ty(&self) -> &FunctionType {
        &self.ty
    }

    /// Args: resultOffset, dataOffset, length.
    fn run(&self, args: &[Value], store: &mut Store, caller: ModuleAddr) -> Result<Vec<Value>, Trap> {
        let [Value::I32(result_offset), Value::I32(data_offset), Value::I32(length)] = args else {
            return Err(Trap::CallFunctionError("returnDataCopy: bad arguments".to_string()));
        };
        let bytes = self.env.return_data_slice(*data_offset as u32, *length as u32)?;
        let mem = caller_memory(store, caller)?;
        store.memory_mut(mem)?.write_bytes(*result_offset as u32, &bytes)?;
        Ok(vec![])
    }
}

/// `finish` and `revert` share a body and differ only in the reverted flag.
struct SetOutcome {
    env: Arc<EeiEnvironment>,
    ty: FunctionType,
    reverted: bool,
}

impl HostFunction for SetOutcome {
    fn ty(&self) -> &FunctionType {
        &self.ty
    }

    /// Args: dataOffset, dataLength.
    fn run(&self, args: &[Value], store: &mut Store, caller: ModuleAddr) -> Result<Vec<Value>, Trap> {
        let [Value::I32(data_offset), Value::I32(data_length)] = args else {
            return Err(Trap::CallFunctionError("finish/revert: bad arguments".to_string()));
        };
        let data = if *data_length > 0 {
            let mem = caller_memory(store, caller)?;
            store.memory(mem)?.read_bytes(*data_offset as u32, *data_length as u32)?
        } else {
            Vec::new()
        };
        self.env.set_return_data(data, self.reverted)?;
        Ok(vec![])
    }
}

/// Build the EEI host function set over one shared environment, ready for
/// [`crate::vm::Vm::register_host_module`] under [`EEI_MODULE`].
pub fn eei_host_functions(env: &Arc<EeiEnvironment>) -> Vec<(String, Arc<dyn HostFunction>)> {
    let i32_result = FunctionType::new(vec![], vec![ValueType::I32]);
    let copy = FunctionType::new(vec![ValueType::I32, ValueType::I32, ValueType::I32], vec![]);
    let outcome = FunctionType::new(vec![ValueType::I32, ValueType::I32], vec![]);

    vec![
        (
            "getCallDataSize".to_string(),
            Arc::new(GetCallDataSize {
                env: Arc::clone(env),
                ty: i32_result.clone(),
            }) as Arc<dyn HostFunction>,
        ),
        (
            "callDataCopy".to_string(),
            Arc::new(CallDataCopy {
                env: Arc::clone(env),
                ty: copy.clone(),
            }),
        ),
        (
            "getReturnDataSize".to_string(),
            Arc::new(GetReturnDataSize {
                env: Arc::clone(env),
                ty: i32_result,
            }),
        ),
        (
            "returnDataCopy".to_string(),
            Arc::new(ReturnDataCopy {
                env: Arc::clone(env),
                ty: copy,
            }),
        ),
        (
            "finish".to_string(),
            Arc::new(SetOutcome {
                env: Arc::clone(env),
                ty: outcome.clone(),
                reverted: false,
            }),
        ),
        (
            "revert".to_string(),
            Arc::new(SetOutcome {
                env: Arc::clone(env),
                ty: outcome,
                reverted: true,
            }),
        ),
    ]
}
