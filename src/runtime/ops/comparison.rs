//! Comparison and test instructions. All push an i32 of 0 or 1.

use super::{StackManager, Trap, Value};

macro_rules! i32_relop {
    ($name:ident, $a:ident, $b:ident, $expr:expr) => {
        pub fn $name(stack: &mut StackManager) -> Result<(), Trap> {
            let $b = stack.pop_i32()?;
            let $a = stack.pop_i32()?;
            stack.push_value(Value::I32($expr as i32));
            Ok(())
        }
    };
}

macro_rules! i64_relop {
    ($name:ident, $a:ident, $b:ident, $expr:expr) => {
        pub fn $name(stack: &mut StackManager) -> Result<(), Trap> {
            let $b = stack.pop_i64()?;
            let $a = stack.pop_i64()?;
            stack.push_value(Value::I32($expr as i32));
            Ok(())
        }
    };
}

macro_rules! f32_relop {
    ($name:ident, $a:ident, $b:ident, $expr:expr) => {
        pub fn $name(stack: &mut StackManager) -> Result<(), Trap> {
            let $b = stack.pop_f32()?;
            let $a = stack.pop_f32()?;
            stack.push_value(Value::I32($expr as i32));
            Ok(())
        }
    };
}

macro_rules! f64_relop {
    ($name:ident, $a:ident, $b:ident, $expr:expr) => {
        pub fn $name(stack: &mut StackManager) -> Result<(), Trap> {
            let $b = stack.pop_f64()?;
            let $a = stack.pop_f64()?;
            stack.push_value(Value::I32($expr as i32));
            Ok(())
        }
    };
}

pub fn i32_eqz(stack: &mut StackManager) -> Result<(), Trap> {
    let c = stack.pop_i32()?;
    stack.push_value(Value::I32((c == 0) as i32));
    Ok(())
}

pub fn i64_eqz(stack: &mut StackManager) -> Result<(), Trap> {
    let c = stack.pop_i64()?;
    stack.push_value(Value::I32((c == 0) as i32));
    Ok(())
}

i32_relop!(i32_eq, a, b, a == b);
i32_relop!(i32_ne, a, b, a != b);
i32_relop!(i32_lt_s, a, b, a < b);
i32_relop!(i32_lt_u, a, b, (a as u32) < (b as u32));
i32_relop!(i32_gt_s, a, b, a > b);
i32_relop!(i32_gt_u, a, b, (a as u32) > (b as u32));
i32_relop!(i32_le_s, a, b, a <= b);
i32_relop!(i32_le_u, a, b, (a as u32) <= (b as u32));
i32_relop!(i32_ge_s, a, b, a >= b);
i32_relop!(i32_ge_u, a, b, (a as u32) >= (b as u32));

i64_relop!(i64_eq, a, b, a == b);
i64_relop!(i64_ne, a, b, a != b);
i64_relop!(i64_lt_s, a, b, a < b);
i64_relop!(i64_lt_u, a, b, (a as u64) < (b as u64));
i64_relop!(i64_gt_s, a, b, a > b);
i64_relop!(i64_gt_u, a, b, (a as u64) > (b as u64));
i64_relop!(i64_le_s, a, b, a <= b);
i64_relop!(i64_le_u, a, b, (a as u64) <= (b as u64));
i64_relop!(i64_ge_s, a, b, a >= b);
i64_relop!(i64_ge_u, a, b, (a as u64) >= (b as u64));

// IEEE comparisons: any comparison with NaN is false except `ne`.
f32_relop!(f32_eq, a, b, a == b);
f32_relop!(f32_ne, a, b, a != b);
f32_relop!(f32_lt, a, b, a < b);
f32_relop!(f32_gt, a, b, a > b);
f32_relop!(f32_le, a, b, a <= b);
f32_relop!(f32_ge, a, b, a >= b);

f64_relop!(f64_eq, a, b, a == b);
f64_relop!(f64_ne, a, b, a != b);
f64_relop!(f64_lt, a, b, a < b);
f64_relop!(f64_gt, a, b, a > b);
f64_relop!(f64_le, a, b, a <= b);
f64_relop!(f64_ge, a, b, a >= b);
