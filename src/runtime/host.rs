//! The host function adapter: the seam between Wasm execution and native
//! code.

use crate::module::FunctionType;
use crate::runtime::store::ModuleAddr;
use crate::runtime::{Store, Trap, Value};

/// A native-implemented function callable from Wasm.
///
/// Arguments are delivered in declaration order: `args[0]` is the first
/// declared parameter. The interpreter pops operands off the stack in
/// reverse and reorders them before invoking the adapter, so implementations
/// never see pop order.
///
/// The adapter may read and write memories and globals through the store,
/// resolving indices through the calling module instance at `caller`. It
/// runs to completion; there is no suspension. A returned error becomes a
/// trap in the calling execution.
pub trait HostFunction {
    /// The declared parameter and result types.
    fn ty(&self) -> &FunctionType;

    /// Invoke the function.
    fn run(&self, args: &[Value], store: &mut Store, caller: ModuleAddr) -> Result<Vec<Value>, Trap>;
}
