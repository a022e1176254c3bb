//! Conversions between the number types.
//!
//! Float-to-integer truncations trap on NaN (`InvalidConversionToInteger`)
//! and on values whose truncation falls outside the target range
//! (`IntegerOverflow`). The range bounds are powers of two and exactly
//! representable, so the comparisons below are precise. Everything else is a
//! plain cast or a bit reinterpretation.

use super::{StackManager, Trap, Value};

fn trunc_f32(v: f32, lo: f64, hi: f64) -> Result<f64, Trap> {
    if v.is_nan() {
        return Err(Trap::InvalidConversionToInteger);
    }
    let t = v.trunc() as f64;
    if t < lo || t > hi {
        return Err(Trap::IntegerOverflow);
    }
    Ok(t)
}

fn trunc_f64(v: f64, lo: f64, hi: f64) -> Result<f64, Trap> {
    if v.is_nan() {
        return Err(Trap::InvalidConversionToInteger);
    }
    let t = v.trunc();
    if t < lo || t > hi {
        return Err(Trap::IntegerOverflow);
    }
    Ok(t)
}

// Inclusive 32-bit truncation bounds; exact in f64. The 64-bit conversions
// use half-open `< 2^63` / `< 2^64` comparisons inline, since 2^63 - 1 is
// not representable.
const I32_MIN_F: f64 = -2147483648.0;
const I32_MAX_F: f64 = 2147483647.0;
const U32_MAX_F: f64 = 4294967295.0;

// Integer width conversions

pub fn i32_wrap_i64(stack: &mut StackManager) -> Result<(), Trap> {
    let v = stack.pop_i64()?;
    stack.push_value(Value::I32(v as i32));
    Ok(())
}

pub fn i64_extend_i32_s(stack: &mut StackManager) -> Result<(), Trap> {
    let v = stack.pop_i32()?;
    stack.push_value(Value::I64(v as i64));
    Ok(())
}

pub fn i64_extend_i32_u(stack: &mut StackManager) -> Result<(), Trap> {
    let v = stack.pop_i32()?;
    stack.push_value(Value::I64((v as u32) as i64));
    Ok(())
}

// Sign extension within a width

pub fn i32_extend8_s(stack: &mut StackManager) -> Result<(), Trap> {
    let v = stack.pop_i32()?;
    stack.push_value(Value::I32(v as i8 as i32));
    Ok(())
}

pub fn i32_extend16_s(stack: &mut StackManager) -> Result<(), Trap> {
    let v = stack.pop_i32()?;
    stack.push_value(Value::I32(v as i16 as i32));
    Ok(())
}

pub fn i64_extend8_s(stack: &mut StackManager) -> Result<(), Trap> {
    let v = stack.pop_i64()?;
    stack.push_value(Value::I64(v as i8 as i64));
    Ok(())
}

pub fn i64_extend16_s(stack: &mut StackManager) -> Result<(), Trap> {
    let v = stack.pop_i64()?;
    stack.push_value(Value::I64(v as i16 as i64));
    Ok(())
}

pub fn i64_extend32_s(stack: &mut StackManager) -> Result<(), Trap> {
    let v = stack.pop_i64()?;
    stack.push_value(Value::I64(v as i32 as i64));
    Ok(())
}

// Float to integer truncations

pub fn i32_trunc_f32_s(stack: &mut StackManager) -> Result<(), Trap> {
    let v = stack.pop_f32()?;
    let t = trunc_f32(v, I32_MIN_F, I32_MAX_F)?;
    stack.push_value(Value::I32(t as i32));
    Ok(())
}

pub fn i32_trunc_f32_u(stack: &mut StackManager) -> Result<(), Trap> {
    let v = stack.pop_f32()?;
    let t = trunc_f32(v, 0.0, U32_MAX_F)?;
    stack.push_value(Value::I32(t as u32 as i32));
    Ok(())
}

pub fn i32_trunc_f64_s(stack: &mut StackManager) -> Result<(), Trap> {
    let v = stack.pop_f64()?;
    let t = trunc_f64(v, I32_MIN_F, I32_MAX_F)?;
    stack.push_value(Value::I32(t as i32));
    Ok(())
}

pub fn i32_trunc_f64_u(stack: &mut StackManager) -> Result<(), Trap> {
    let v = stack.pop_f64()?;
    let t = trunc_f64(v, 0.0, U32_MAX_F)?;
    stack.push_value(Value::I32(t as u32 as i32));
    Ok(())
}

pub fn i64_trunc_f32_s(stack: &mut StackManager) -> Result<(), Trap> {
    let v = stack.pop_f32()?;
    if v.is_nan() {
        return Err(Trap::InvalidConversionToInteger);
    }
    let t = v.trunc() as f64;
    // 2^63 is exact in f64; the largest valid f32 is well below it.
    if !(-9223372036854775808.0..9223372036854775808.0).contains(&t) {
        return Err(Trap::IntegerOverflow);
    }
    stack.push_value(Value::I64(t as i64));
    Ok(())
}

pub fn i64_trunc_f32_u(stack: &mut StackManager) -> Result<(), Trap> {
    let v = stack.pop_f32()?;
    if v.is_nan() {
        return Err(Trap::InvalidConversionToInteger);
    }
    let t = v.trunc() as f64;
    if !(0.0..18446744073709551616.0).contains(&t) {
        return Err(Trap::IntegerOverflow);
    }
    stack.push_value(Value::I64(t as u64 as i64));
    Ok(())
}

pub fn i64_trunc_f64_s(stack: &mut StackManager) -> Result<(), Trap> {
    let v = stack.pop_f64()?;
    if v.is_nan() {
        return Err(Trap::InvalidConversionToInteger);
    }
    let t = v.trunc();
    if !(-9223372036854775808.0..9223372036854775808.0).contains(&t) {
        return Err(Trap::IntegerOverflow);
    }
    stack.push_value(Value::I64(t as i64));
    Ok(())
}

pub fn i64_trunc_f64_u(stack: &mut StackManager) -> Result<(), Trap> {
    let v = stack.pop_f64()?;
    if v.is_nan() {
        return Err(Trap::InvalidConversionToInteger);
    }
    let t = v.trunc();
    if !(0.0..18446744073709551616.0).contains(&t) {
        return Err(Trap::IntegerOverflow);
    }
    stack.push_value(Value::I64(t as u64 as i64));
    Ok(())
}

// Integer to float conversions

pub fn f32_convert_i32_s(stack: &mut StackManager) -> Result<(), Trap> {
    let v = stack.pop_i32()?;
    stack.push_value(Value::F32(v as f32));
    Ok(())
}

pub fn f32_convert_i32_u(stack: &mut StackManager) -> Result<(), Trap> {
    let v = stack.pop_i32()?;
    stack.push_value(Value::F32(v as u32 as f32));
    Ok(())
}

pub fn f32_convert_i64_s(stack: &mut StackManager) -> Result<(), Trap> {
    let v = stack.pop_i64()?;
    stack.push_value(Value::F32(v as f32));
    Ok(())
}

pub fn f32_convert_i64_u(stack: &mut StackManager) -> Result<(), Trap> {
    let v = stack.pop_i64()?;
    stack.push_value(Value::F32(v as u64 as f32));
    Ok(())
}

pub fn f64_convert_i32_s(stack: &mut StackManager) -> Result<(), Trap> {
    let v = stack.pop_i32()?;
    stack.push_value(Value::F64(v as f64));
    Ok(())
}

pub fn f64_convert_i32_u(stack: &mut StackManager) -> Result<(), Trap> {
    let v = stack.pop_i32()?;
    stack.push_value(Value::F64(v as u32 as f64));
    Ok(())
}

pub fn f64_convert_i64_s(stack: &mut StackManager) -> Result<(), Trap> {
    let v = stack.pop_i64()?;
    stack.push_value(Value::F64(v as f64));
    Ok(())
}

pub fn f64_convert_i64_u(stack: &mut StackManager) -> Result<(), Trap> {
    let v = stack.pop_i64()?;
    stack.push_value(Value::F64(v as u64 as f64));
    Ok(())
}

// Float width conversions

pub fn f32_demote_f64(stack: &mut StackManager) -> Result<(), Trap> {
    let v = stack.pop_f64()?;
    stack.push_value(Value::F32(v as f32));
    Ok(())
}

pub fn f64_promote_f32(stack: &mut StackManager) -> Result<(), Trap> {
    let v = stack.pop_f32()?;
    stack.push_value(Value::F64(v as f64));
    Ok(())
}

// Reinterpretations

pub fn i32_reinterpret_f32(stack: &mut StackManager) -> Result<(), Trap> {
    let v = stack.pop_f32()?;
    stack.push_value(Value::I32(v.to_bits() as i32));
    Ok(())
}

pub fn i64_reinterpret_f64(stack: &mut StackManager) -> Result<(), Trap> {
    let v = stack.pop_f64()?;
    stack.push_value(Value::I64(v.to_bits() as i64));
    Ok(())
}

pub fn f32_reinterpret_i32(stack: &mut StackManager) -> Result<(), Trap> {
    let v = stack.pop_i32()?;
    stack.push_value(Value::F32(f32::from_bits(v as u32)));
    Ok(())
}

pub fn f64_reinterpret_i64(stack: &mut StackManager) -> Result<(), Trap> {
    let v = stack.pop_i64()?;
    stack.push_value(Value::F64(f64::from_bits(v as u64)));
    Ok(())
}
