//! Function instance: a Wasm function bound to its module, or a host
//! function behind the adapter trait.

use crate::instr::FuncBody;
use crate::module::{FunctionType, ValueType};
use crate::runtime::host::HostFunction;
use crate::runtime::store::ModuleAddr;
use std::sync::Arc;

/// A callable function owned by the store. Immutable once created.
#[derive(Clone)]
pub enum FunctionInstance {
    /// A Wasm function: its owning module, signature, extra locals, and
    /// resolved body. The body sits behind an `Arc` so activations can hold
    /// it without borrowing the store.
    Wasm {
        module: ModuleAddr,
        ty: FunctionType,
        locals: Vec<ValueType>,
        body: Arc<FuncBody>,
    },
    /// A native function behind the host adapter.
    Host {
        ty: FunctionType,
        callable: Arc<dyn HostFunction>,
    },
}

impl FunctionInstance {
    pub fn ty(&self) -> &FunctionType {
        match self {
            FunctionInstance::Wasm { ty, .. } => ty,
            FunctionInstance::Host { ty, .. } => ty,
        }
    }

    pub fn is_host(&self) -> bool {
        matches!(self, FunctionInstance::Host { .. })
    }
}

impl std::fmt::Debug for FunctionInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FunctionInstance::Wasm { module, ty, locals, body } => f
                .debug_struct("Wasm")
                .field("module", module)
                .field("ty", ty)
                .field("locals", locals)
                .field("body_len", &body.len())
                .finish(),
            FunctionInstance::Host { ty, .. } => f.debug_struct("Host").field("ty", ty).finish_non_exhaustive(),
        }
    }
}
