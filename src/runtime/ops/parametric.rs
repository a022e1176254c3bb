//! Parametric instructions: `drop` and `select`.

use super::{StackManager, Trap};
#[cfg(test)]
use super::Value;

pub fn drop(stack: &mut StackManager) -> Result<(), Trap> {
    stack.pop_value()?;
    Ok(())
}

/// Pop a condition and two values; push the first if the condition is
/// non-zero, the second otherwise. Both operands must share a type.
pub fn select(stack: &mut StackManager) -> Result<(), Trap> {
    let cond = stack.pop_i32()?;
    let v2 = stack.pop_value()?;
    let v1 = stack.pop_expect(v2.ty())?;
    stack.push_value(if cond != 0 { v1 } else { v2 });
    Ok(())
}
