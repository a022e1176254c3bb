//! Memory instructions: loads, stores, size queries, growth, and the bulk
//! copy/fill operations.
//!
//! The effective address is `base + memarg.offset` computed in 64-bit
//! arithmetic, so the 33-bit sum can never wrap; anything past the 32-bit
//! address space is out of bounds by construction.

use super::{MemArg, MemoryInstance, StackManager, Trap, Value};
use crate::runtime::memory::MemValue;

fn effective_address(base: u32, memarg: MemArg, access: usize) -> Result<u32, Trap> {
    let ea = base as u64 + memarg.offset as u64;
    if ea > u32::MAX as u64 {
        return Err(Trap::MemoryOutOfBounds {
            offset: ea,
            length: access as u64,
        });
    }
    Ok(ea as u32)
}

fn load<T: MemValue>(memory: &MemoryInstance, base: u32, memarg: MemArg) -> Result<T, Trap> {
    let ea = effective_address(base, memarg, T::SIZE)?;
    memory.read_value::<T>(ea)
}

fn store<T: MemValue>(memory: &mut MemoryInstance, base: u32, memarg: MemArg, value: T) -> Result<(), Trap> {
    let ea = effective_address(base, memarg, T::SIZE)?;
    memory.write_value::<T>(ea, value)
}

// Loads

pub fn i32_load(stack: &mut StackManager, memory: &MemoryInstance, memarg: MemArg) -> Result<(), Trap> {
    let base = stack.pop_u32()?;
    let v = load::<i32>(memory, base, memarg)?;
    stack.push_value(Value::I32(v));
    Ok(())
}

pub fn i64_load(stack: &mut StackManager, memory: &MemoryInstance, memarg: MemArg) -> Result<(), Trap> {
    let base = stack.pop_u32()?;
    let v = load::<i64>(memory, base, memarg)?;
    stack.push_value(Value::I64(v));
    Ok(())
}

pub fn f32_load(stack: &mut StackManager, memory: &MemoryInstance, memarg: MemArg) -> Result<(), Trap> {
    let base = stack.pop_u32()?;
    let v = load::<f32>(memory, base, memarg)?;
    stack.push_value(Value::F32(v));
    Ok(())
}

pub fn f64_load(stack: &mut StackManager, memory: &MemoryInstance, memarg: MemArg) -> Result<(), Trap> {
    let base = stack.pop_u32()?;
    let v = load::<f64>(memory, base, memarg)?;
    stack.push_value(Value::F64(v));
    Ok(())
}

pub fn i32_load8_s(stack: &mut StackManager, memory: &MemoryInstance, memarg: MemArg) -> Result<(), Trap> {
    let base = stack.pop_u32()?;
    let v = load::<i8>(memory, base, memarg)?;
    stack.push_value(Value::I32(v as i32));
    Ok(())
}

pub fn i32_load8_u(stack: &mut StackManager, memory: &MemoryInstance, memarg: MemArg) -> Result<(), Trap> {
    let base = stack.pop_u32()?;
    let v = load::<u8>(memory, base, memarg)?;
    stack.push_value(Value::I32(v as i32));
    Ok(())
}

pub fn i32_load16_s(stack: &mut StackManager, memory: &MemoryInstance, memarg: MemArg) -> Result<(), Trap> {
    let base = stack.pop_u32()?;
    let v = load::<i16>(memory, base, memarg)?;
    stack.push_value(Value::I32(v as i32));
    Ok(())
}

pub fn i32_load16_u(stack: &mut StackManager, memory: &MemoryInstance, memarg: MemArg) -> Result<(), Trap> {
    let base = stack.pop_u32()?;
    let v = load::<u16>(memory, base, memarg)?;
    stack.push_value(Value::I32(v as i32));
    Ok(())
}

pub fn i64_load8_s(stack: &mut StackManager, memory: &MemoryInstance, memarg: MemArg) -> Result<(), Trap> {
    let base = stack.pop_u32()?;
    let v = load::<i8>(memory, base, memarg)?;
    stack.push_value(Value::I64(v as i64));
    Ok(())
}

pub fn i64_load8_u(stack: &mut StackManager, memory: &MemoryInstance, memarg: MemArg) -> Result<(), Trap> {
    let base = stack.pop_u32()?;
    let v = load::<u8>(memory, base, memarg)?;
    stack.push_value(Value::I64(v as i64));
    Ok(())
}

pub fn i64_load16_s(stack: &mut StackManager, memory: &MemoryInstance, memarg: MemArg) -> Result<(), Trap> {
    let base = stack.pop_u32()?;
    let v = load::<i16>(memory, base, memarg)?;
    stack.push_value(Value::I64(v as i64));
    Ok(())
}

pub fn i64_load16_u(stack: &mut StackManager, memory: &MemoryInstance, memarg: MemArg) -> Result<(), Trap> {
    let base = stack.pop_u32()?;
    let v = load::<u16>(memory, base, memarg)?;
    stack.push_value(Value::I64(v as i64));
    Ok(())
}

pub fn i64_load32_s(stack: &mut StackManager, memory: &MemoryInstance, memarg: MemArg) -> Result<(), Trap> {
    let base = stack.pop_u32()?;
    let v = load::<i32>(memory, base, memarg)?;
    stack.push_value(Value::I64(v as i64));
    Ok(())
}

pub fn i64_load32_u(stack: &mut StackManager, memory: &MemoryInstance, memarg: MemArg) -> Result<(), Trap> {
    let base = stack.pop_u32()?;
    let v = load::<u32>(memory, base, memarg)?;
    stack.push_value(Value::I64(v as i64));
    Ok(())
}

// Stores

pub fn i32_store(stack: &mut StackManager, memory: &mut MemoryInstance, memarg: MemArg) -> Result<(), Trap> {
    let v = stack.pop_i32()?;
    let base = stack.pop_u32()?;
    store::<i32>(memory, base, memarg, v)
}

pub fn i64_store(stack: &mut StackManager, memory: &mut MemoryInstance, memarg: MemArg) -> Result<(), Trap> {
    let v = stack.pop_i64()?;
    let base = stack.pop_u32()?;
    store::<i64>(memory, base, memarg, v)
}

pub fn f32_store(stack: &mut StackManager, memory: &mut MemoryInstance, memarg: MemArg) -> Result<(), Trap> {
    let v = stack.pop_f32()?;
    let base = stack.pop_u32()?;
    store::<f32>(memory, base, memarg, v)
}

pub fn f64_store(stack: &mut StackManager, memory: &mut MemoryInstance, memarg: MemArg) -> Result<(), Trap> {
    let v = stack.pop_f64()?;
    let base = stack.pop_u32()?;
    store::<f64>(memory, base, memarg, v)
}

pub fn i32_store8(stack: &mut StackManager, memory: &mut MemoryInstance, memarg: MemArg) -> Result<(), Trap> {
    let v = stack.pop_i32()?;
    let base = stack.pop_u32()?;
    store::<u8>(memory, base, memarg, v as u8)
}

pub fn i32_store16(stack: &mut StackManager, memory: &mut MemoryInstance, memarg: MemArg) -> Result<(), Trap> {
    let v = stack.pop_i32()?;
    let base = stack.pop_u32()?;
    store::<u16>(memory, base, memarg, v as u16)
}

pub fn i64_store8(stack: &mut StackManager, memory: &mut MemoryInstance, memarg: MemArg) -> Result<(), Trap> {
    let v = stack.pop_i64()?;
    let base = stack.pop_u32()?;
    store::<u8>(memory, base, memarg, v as u8)
}

pub fn i64_store16(stack: &mut StackManager, memory: &mut MemoryInstance, memarg: MemArg) -> Result<(), Trap> {
    let v = stack.pop_i64()?;
    let base = stack.pop_u32()?;
    store::<u16>(memory, base, memarg, v as u16)
}

pub fn i64_store32(stack: &mut StackManager, memory: &mut MemoryInstance, memarg: MemArg) -> Result<(), Trap> {
    let v = stack.pop_i64()?;
    let base = stack.pop_u32()?;
    store::<u32>(memory, base, memarg, v as u32)
}

// Size and growth

pub fn memory_size(stack: &mut StackManager, memory: &MemoryInstance) -> Result<(), Trap> {
    stack.push_value(Value::I32(memory.size() as i32));
    Ok(())
}

/// Pushes the previous size in pages, or -1 when growth is refused.
pub fn memory_grow(stack: &mut StackManager, memory: &mut MemoryInstance) -> Result<(), Trap> {
    let delta = stack.pop_u32()?;
    let old = memory.size() as i32;
    if memory.grow(delta) {
        stack.push_value(Value::I32(old));
    } else {
        stack.push_value(Value::I32(-1));
    }
    Ok(())
}

// Bulk operations

pub fn memory_copy(stack: &mut StackManager, memory: &mut MemoryInstance) -> Result<(), Trap> {
    let len = stack.pop_u32()?;
    let src = stack.pop_u32()?;
    let dest = stack.pop_u32()?;
    memory.copy_within(dest, src, len)
}

pub fn memory_fill(stack: &mut StackManager, memory: &mut MemoryInstance) -> Result<(), Trap> {
    let len = stack.pop_u32()?;
    let value = stack.pop_i32()?;
    let dest = stack.pop_u32()?;
    memory.fill(dest, value as u8, len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::Limits;
    use crate::runtime::memory::PAGE_SIZE;

    fn memory() -> MemoryInstance {
        MemoryInstance::new(Limits::new(1, Some(2)))
    }

    fn offset(offset: u32) -> MemArg {
        MemArg { align: 0, offset }
    }

    #[test]
    fn store_then_load() {
        let mut mem = memory();
        let mut s = StackManager::new();
        s.push_value(Value::I32(100));
        s.push_value(Value::I32(-1));
        i32_store(&mut s, &mut mem, offset(0)).unwrap();

        s.push_value(Value::I32(100));
        i32_load(&mut s, &mem, offset(0)).unwrap();
        assert_eq!(s.pop_value().unwrap(), Value::I32(-1));

        // The immediate offset shifts the access.
        s.push_value(Value::I32(96));
        i32_load(&mut s, &mem, offset(4)).unwrap();
        assert_eq!(s.pop_value().unwrap(), Value::I32(-1));
    }

    #[test]
    fn narrow_loads_extend() {
        let mut mem = memory();
        mem.write_value::<u8>(0, 0xff).unwrap();

        let mut s = StackManager::new();
        s.push_value(Value::I32(0));
        i32_load8_s(&mut s, &mem, offset(0)).unwrap();
        assert_eq!(s.pop_value().unwrap(), Value::I32(-1));

        s.push_value(Value::I32(0));
        i32_load8_u(&mut s, &mem, offset(0)).unwrap();
        assert_eq!(s.pop_value().unwrap(), Value::I32(255));

        s.push_value(Value::I32(0));
        i64_load8_u(&mut s, &mem, offset(0)).unwrap();
        assert_eq!(s.pop_value().unwrap(), Value::I64(255));
    }

    #[test]
    fn narrow_stores_truncate() {
        let mut mem = memory();
        let mut s = StackManager::new();
        s.push_value(Value::I32(0));
        s.push_value(Value::I32(0x1_23));
        i32_store8(&mut s, &mut mem, offset(0)).unwrap();
        assert_eq!(mem.read_value::<u8>(0).unwrap(), 0x23);
    }

    #[test]
    fn out_of_bounds_traps() {
        let mut mem = memory();
        let mut s = StackManager::new();
        s.push_value(Value::I32((PAGE_SIZE - 3) as i32));
        assert!(matches!(
            i32_load(&mut s, &mem, offset(0)),
            Err(Trap::MemoryOutOfBounds { .. })
        ));

        // A large immediate offset pushes the 33-bit sum out of range.
        s.push_value(Value::I32(-1)); // base 0xffff_ffff
        assert!(matches!(
            i32_load(&mut s, &mem, offset(u32::MAX)),
            Err(Trap::MemoryOutOfBounds { .. })
        ));

        s.push_value(Value::I32((PAGE_SIZE - 1) as i32));
        s.push_value(Value::I64(0));
        assert!(matches!(
            i64_store(&mut s, &mut mem, offset(0)),
            Err(Trap::MemoryOutOfBounds { .. })
        ));
    }

    #[test]
    fn size_and_grow() {
        let mut mem = memory();
        let mut s = StackManager::new();
        memory_size(&mut s, &mem).unwrap();
        assert_eq!(s.pop_value().unwrap(), Value::I32(1));

        s.push_value(Value::I32(1));
        memory_grow(&mut s, &mut mem).unwrap();
        assert_eq!(s.pop_value().unwrap(), Value::I32(1)); // previous size
        assert_eq!(mem.size(), 2);

        // Past the declared max: -1, size unchanged.
        s.push_value(Value::I32(1));
        memory_grow(&mut s, &mut mem).unwrap();
        assert_eq!(s.pop_value().unwrap(), Value::I32(-1));
        assert_eq!(mem.size(), 2);
    }

    #[test]
    fn bulk_copy_and_fill() {
        let mut mem = memory();
        mem.write_bytes(0, &[1, 2, 3, 4]).unwrap();

        let mut s = StackManager::new();
        s.push_value(Value::I32(8)); // dest
        s.push_value(Value::I32(0)); // src
        s.push_value(Value::I32(4)); // len
        memory_copy(&mut s, &mut mem).unwrap();
        assert_eq!(mem.read_bytes(8, 4).unwrap(), vec![1, 2, 3, 4]);

        s.push_value(Value::I32(0)); // dest
        s.push_value(Value::I32(0x42)); // value
        s.push_value(Value::I32(3)); // len
        memory_fill(&mut s, &mut mem).unwrap();
        assert_eq!(mem.read_bytes(0, 4).unwrap(), vec![0x42, 0x42, 0x42, 4]);
    }
}
