//! Table instance: a bounded vector of function-reference slots.
//!
//! Tables back `call_indirect` dispatch, so the error split matters: an
//! index past the live size is `UndefinedElement`, an in-range slot that was
//! never initialized is `UninitializedElement`.

use crate::module::{Limits, RefType};
use crate::runtime::store::FuncAddr;
use crate::runtime::value::TableSlot;
use crate::runtime::Trap;
use log::error;

/// Hard cap on table size, in slots, applied on top of any declared maximum.
pub const MAX_TABLE_SLOTS: u32 = 65536;

/// Callback invoked with the new slot-array base whenever growth reallocates
/// the backing storage. Ahead-of-time compiled code holds raw pointers into
/// the array and must be told when they go stale.
pub type RelocationHook = Box<dyn FnMut(*const TableSlot)>;

/// A table of function references with declared size limits.
pub struct TableInstance {
    elem_type: RefType,
    min_size: u32,
    max_size: Option<u32>,
    slots: Vec<TableSlot>,
    relocation_hook: Option<RelocationHook>,
}

impl std::fmt::Debug for TableInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableInstance")
            .field("size", &self.size())
            .field("min", &self.min_size())
            .field("max", &self.max_size())
            .finish_non_exhaustive()
    }
}

impl TableInstance {
    /// Create a table with `limits.min` uninitialized slots.
    pub fn new(elem_type: RefType, limits: Limits) -> Self {
        TableInstance {
            elem_type,
            min_size: limits.min,
            max_size: limits.max,
            slots: vec![TableSlot::Uninitialized; limits.min as usize],
            relocation_hook: None,
        }
    }

    pub fn elem_type(&self) -> RefType {
        self.elem_type
    }

    /// Current slot count.
    pub fn size(&self) -> u32 {
        self.slots.len() as u32
    }

    /// Declared minimum size.
    pub fn min_size(&self) -> u32 {
        self.min_size
    }

    /// Declared maximum size, if any.
    pub fn max_size(&self) -> Option<u32> {
        self.max_size
    }

    /// The effective growth ceiling: the declared maximum capped at
    /// [`MAX_TABLE_SLOTS`].
    pub fn capped_max(&self) -> u32 {
        self.max_size.map_or(MAX_TABLE_SLOTS, |m| m.min(MAX_TABLE_SLOTS))
    }

    /// Read the function address stored at `idx`.
    ///
    /// # Errors
    ///
    /// - `UndefinedElement` if `idx` is past the live size.
    /// - `UninitializedElement` if the slot has never been written.
    pub fn get_element(&self, idx: u32) -> Result<FuncAddr, Trap> {
        match self.slots.get(idx as usize) {
            Some(TableSlot::FuncRef(addr)) => Ok(*addr),
            Some(TableSlot::Uninitialized) => {
                error!("table read of uninitialized slot {idx}");
                Err(Trap::UninitializedElement)
            }
            None => {
                error!("table read at {idx} past size {}", self.size());
                Err(Trap::UndefinedElement)
            }
        }
    }

    /// Write a single slot.
    ///
    /// # Errors
    ///
    /// - `UndefinedElement` if `idx` is past the live size.
    pub fn set_element(&mut self, idx: u32, addr: FuncAddr) -> Result<(), Trap> {
        match self.slots.get_mut(idx as usize) {
            Some(slot) => {
                *slot = TableSlot::FuncRef(addr);
                Ok(())
            }
            None => Err(Trap::UndefinedElement),
        }
    }

    /// Element-segment fit check, run at instantiation time.
    ///
    /// The bound is the declared minimum, not the live size: segments are
    /// validated against the size the module declared, before any growth has
    /// happened. Runtime access goes through [`get_element`](Self::get_element)
    /// and checks the live size.
    pub fn check_access(&self, offset: u32, length: u32) -> bool {
        offset as u64 + length as u64 <= self.min_size as u64
    }

    /// Overwrite a contiguous run of slots with function addresses, starting
    /// at `offset`. The caller has already run the fit check; a run past the
    /// live size is a bug upstream.
    pub fn set_init_list(&mut self, offset: u32, addrs: &[FuncAddr]) -> Result<(), Trap> {
        let start = offset as usize;
        let end = start + addrs.len();
        if end > self.slots.len() {
            return Err(Trap::UndefinedElement);
        }
        for (slot, addr) in self.slots[start..end].iter_mut().zip(addrs) {
            *slot = TableSlot::FuncRef(*addr);
        }
        Ok(())
    }

    /// Append `count` uninitialized slots.
    ///
    /// Returns false, with no side effect, if the new size would exceed the
    /// declared maximum capped at [`MAX_TABLE_SLOTS`]. On success the backing
    /// storage may relocate; a registered relocation hook is invoked with the
    /// new base pointer.
    pub fn grow(&mut self, count: u32) -> bool {
        let Some(new_size) = self.size().checked_add(count) else {
            return false;
        };
        if new_size > self.capped_max() {
            return false;
        }
        self.slots.resize(new_size as usize, TableSlot::Uninitialized);
        if let Some(hook) = self.relocation_hook.as_mut() {
            hook(self.slots.as_ptr());
        }
        true
    }

    /// Register the relocation hook and fire it once with the current base,
    /// so the holder starts out synchronized.
    pub fn set_relocation_hook(&mut self, mut hook: RelocationHook) {
        hook(self.slots.as_ptr());
        self.relocation_hook = Some(hook);
    }
}
