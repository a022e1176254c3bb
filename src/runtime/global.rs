//! Global variable instance.

use crate::module::ValueType;
use crate::runtime::{Trap, Value};

/// A single mutable or immutable global value.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalInstance {
    value: Value,
    mutable: bool,
}

impl GlobalInstance {
    pub fn new(value: Value, mutable: bool) -> Self {
        GlobalInstance { value, mutable }
    }

    pub fn value(&self) -> Value {
        self.value
    }

    pub fn ty(&self) -> ValueType {
        self.value.ty()
    }

    pub fn is_mutable(&self) -> bool {
        self.mutable
    }

    /// Replace the value.
    ///
    /// # Errors
    ///
    /// - `ImmutableGlobal` if the global was declared immutable; the stored
    ///   value is unchanged.
    /// - `TypeNotMatch` if the new value has a different type.
    pub fn set(&mut self, value: Value) -> Result<(), Trap> {
        if !self.mutable {
            return Err(Trap::ImmutableGlobal);
        }
        if value.ty() != self.value.ty() {
            return Err(Trap::TypeNotMatch {
                expected: self.value.ty(),
                actual: value.ty(),
            });
        }
        self.value = value;
        Ok(())
    }
}
