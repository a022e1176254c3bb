//! Bit operations: and/or/xor, shifts, and rotates.
//!
//! Shift and rotate counts are taken modulo the operand width, which is what
//! the wrapping shift intrinsics do.

use super::{StackManager, Trap, Value};

macro_rules! i32_binop {
    ($name:ident, $a:ident, $b:ident, $expr:expr) => {
        pub fn $name(stack: &mut StackManager) -> Result<(), Trap> {
            let $b = stack.pop_i32()?;
            let $a = stack.pop_i32()?;
            stack.push_value(Value::I32($expr));
            Ok(())
        }
    };
}

macro_rules! i64_binop {
    ($name:ident, $a:ident, $b:ident, $expr:expr) => {
        pub fn $name(stack: &mut StackManager) -> Result<(), Trap> {
            let $b = stack.pop_i64()?;
            let $a = stack.pop_i64()?;
            stack.push_value(Value::I64($expr));
            Ok(())
        }
    };
}

i32_binop!(i32_and, a, b, a & b);
i32_binop!(i32_or, a, b, a | b);
i32_binop!(i32_xor, a, b, a ^ b);
i32_binop!(i32_shl, a, b, a.wrapping_shl(b as u32));
i32_binop!(i32_shr_s, a, b, a.wrapping_shr(b as u32));
i32_binop!(i32_shr_u, a, b, ((a as u32).wrapping_shr(b as u32)) as i32);
i32_binop!(i32_rotl, a, b, a.rotate_left(b as u32 % 32));
i32_binop!(i32_rotr, a, b, a.rotate_right(b as u32 % 32));

i64_binop!(i64_and, a, b, a & b);
i64_binop!(i64_or, a, b, a | b);
i64_binop!(i64_xor, a, b, a ^ b);
i64_binop!(i64_shl, a, b, a.wrapping_shl(b as u32));
i64_binop!(i64_shr_s, a, b, a.wrapping_shr(b as u32));
i64_binop!(i64_shr_u, a, b, ((a as u64).wrapping_shr(b as u32)) as i64);
i64_binop!(i64_rotl, a, b, a.rotate_left((b % 64) as u32));
i64_binop!(i64_rotr, a, b, a.rotate_right((b % 64) as u32));
