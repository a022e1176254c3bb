//! Shared state for the Ethereum Environment Interface host module.

use crate::runtime::Trap;
use std::sync::Mutex;

#[derive(Debug, Default)]
struct EeiState {
    call_data: Vec<u8>,
    return_data: Vec<u8>,
    reverted: bool,
}

/// The execution environment a contract call runs against: its input
/// (call data) and its output (return data plus the reverted flag).
///
/// Host functions capture this behind an `Arc` and the interpreter never
/// sees it; the embedder keeps its own handle to seed the call data before
/// `execute` and to read the outcome afterwards.
#[derive(Debug, Default)]
pub struct EeiEnvironment {
    state: Mutex<EeiState>,
}

impl EeiEnvironment {
    pub fn new(call_data: Vec<u8>) -> Self {
        EeiEnvironment {
            state: Mutex::new(EeiState {
                call_data,
                ..Default::default()
            }),
        }
    }

    fn locked<R>(&self, f: impl FnOnce(&mut EeiState) -> R) -> Result<R, Trap> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| Trap::CallFunctionError("environment lock poisoned".to_string()))?;
        Ok(f(&mut state))
    }

    /// Replace the call data and clear the previous call's outcome.
    pub fn reset(&self, call_data: Vec<u8>) -> Result<(), Trap> {
        self.locked(|s| {
            s.call_data = call_data;
            s.return_data.clear();
            s.reverted = false;
        })
    }

    pub fn call_data_size(&self) -> Result<u32, Trap> {
        self.locked(|s| s.call_data.len() as u32)
    }

    /// A copy of `length` bytes of call data starting at `offset`.
    pub fn call_data_slice(&self, offset: u32, length: u32) -> Result<Vec<u8>, Trap> {
        self.locked(|s| {
            let end = offset as u64 + length as u64;
            if end > s.call_data.len() as u64 {
                return Err(Trap::CallFunctionError("call data access out of range".to_string()));
            }
            Ok(s.call_data[offset as usize..end as usize].to_vec())
        })?
    }

    pub fn return_data(&self) -> Result<Vec<u8>, Trap> {
        self.locked(|s| s.return_data.clone())
    }

    pub fn return_data_size(&self) -> Result<u32, Trap> {
        self.locked(|s| s.return_data.len() as u32)
    }

    pub fn return_data_slice(&self, offset: u32, length: u32) -> Result<Vec<u8>, Trap> {
        self.locked(|s| {
            let end = offset as u64 + length as u64;
            if end > s.return_data.len() as u64 {
                return Err(Trap::CallFunctionError(
                    "return data access out of range".to_string(),
                ));
            }
            Ok(s.return_data[offset as usize..end as usize].to_vec())
        })?
    }

    pub fn set_return_data(&self, data: Vec<u8>, reverted: bool) -> Result<(), Trap> {
        self.locked(|s| {
            s.return_data = data;
            s.reverted = reverted;
        })
    }

    pub fn is_reverted(&self) -> Result<bool, Trap> {
        self.locked(|s| s.reverted)
    }
}
