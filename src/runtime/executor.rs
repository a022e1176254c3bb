//! The instruction interpreter.
//!
//! Executes flat instruction streams against the stack manager. Each
//! activation pairs a resolved function body with a program counter; the
//! frame itself lives on the stack and the activation list stays parallel to
//! the frame sidecar. Branches are plain jumps: labels carry their
//! continuation pc, resolved when the body was built.

use crate::instr::{FuncBody, Instr};
use crate::module::FunctionType;
use crate::runtime::function::FunctionInstance;
use crate::runtime::ops;
use crate::runtime::stack::{Frame, Label, LabelKind, StackManager};
use crate::runtime::store::{FuncAddr, MemAddr, ModuleAddr, Store};
use crate::runtime::{Trap, Value};
use crate::vm::Config;
use log::trace;
use std::sync::Arc;

/// Wasm-to-Wasm call depth cap, to fail cleanly instead of exhausting the
/// process.
const MAX_CALL_DEPTH: usize = 1000;

/// One live function body being executed.
struct Activation {
    body: Arc<FuncBody>,
    module: ModuleAddr,
    pc: usize,
}

/// What an executed instruction does to control flow.
enum Flow {
    /// Fall through to the next instruction.
    Next,
    /// Jump within the current body.
    Jump(usize),
    /// A Wasm callee was entered; switch to its activation.
    EnterCallee,
    /// The current activation returned.
    Return,
}

/// Drives instruction execution for one call at a time.
///
/// The executor assumes exclusive access to the store for the duration of
/// [`invoke`](Self::invoke); there are no internal suspension points. After a
/// trap the stack is discarded, not restored.
pub struct Executor {
    config: Config,
    stack: StackManager,
    acts: Vec<Activation>,
}

macro_rules! with_mem {
    ($self:ident, $store:ident, $module:ident, load $f:ident($memarg:expr)) => {{
        let addr = Self::mem0($store, $module)?;
        ops::memory::$f(&mut $self.stack, $store.memory(addr)?, $memarg)?;
    }};
    ($self:ident, $store:ident, $module:ident, store $f:ident($memarg:expr)) => {{
        let addr = Self::mem0($store, $module)?;
        ops::memory::$f(&mut $self.stack, $store.memory_mut(addr)?, $memarg)?;
    }};
}

impl Executor {
    pub fn new(config: Config) -> Self {
        Executor {
            config,
            stack: StackManager::new(),
            acts: Vec::new(),
        }
    }

    /// Run the function at `addr` to completion and return its results.
    ///
    /// `module` is the instance the call is made through; host functions
    /// receive it as their caller. Arguments are checked against the
    /// function type before anything is pushed. On a trap the executor
    /// resets itself and surfaces the trap to the embedder.
    pub fn invoke(
        &mut self,
        store: &mut Store,
        module: ModuleAddr,
        addr: FuncAddr,
        args: Vec<Value>,
    ) -> Result<Vec<Value>, Trap> {
        let ty = store.function(addr)?.ty().clone();
        check_params(&ty, &args)?;

        let result = self.invoke_checked(store, module, addr, args, &ty);
        if result.is_err() {
            // Traps are not recovered; drop whatever the aborted execution
            // left behind so the executor can be reused.
            self.stack = StackManager::new();
            self.acts.clear();
        }
        result
    }

    fn invoke_checked(
        &mut self,
        store: &mut Store,
        module: ModuleAddr,
        addr: FuncAddr,
        args: Vec<Value>,
        ty: &FunctionType,
    ) -> Result<Vec<Value>, Trap> {
        if store.function(addr)?.is_host() {
            // Direct host invocation bypasses the stack entirely.
            let FunctionInstance::Host { callable, .. } = store.function(addr)? else {
                unreachable!();
            };
            let callable = Arc::clone(callable);
            let results = callable.run(&args, store, module)?;
            check_results(ty, &results)?;
            return Ok(results);
        }

        self.enter_wasm(store, addr, args)?;
        self.run(store)?;

        let mut results = Vec::with_capacity(ty.results.len());
        for rt in ty.results.iter().rev() {
            results.push(self.stack.pop_expect(*rt)?);
        }
        results.reverse();
        debug_assert!(self.stack.is_empty(), "operands left behind after return");
        Ok(results)
    }

    /// Loop over activations until the outermost one returns.
    fn run(&mut self, store: &mut Store) -> Result<(), Trap> {
        while let Some(act) = self.acts.last() {
            let body = Arc::clone(&act.body);
            let module = act.module;
            self.run_activation(store, &body, module)?;
        }
        Ok(())
    }

    /// Execute the current activation until it returns or enters a callee.
    fn run_activation(&mut self, store: &mut Store, body: &FuncBody, module: ModuleAddr) -> Result<(), Trap> {
        let mut pc = self.acts.last().ok_or(Trap::NoFrame)?.pc;
        loop {
            if pc >= body.len() {
                // Implicit return at the end of the body.
                self.stack.pop_frame_unwind()?;
                self.acts.pop();
                return Ok(());
            }
            match self.step(store, module, body, pc)? {
                Flow::Next => pc += 1,
                Flow::Jump(target) => pc = target,
                Flow::EnterCallee => return Ok(()),
                Flow::Return => return Ok(()),
            }
        }
    }

    fn step(&mut self, store: &mut Store, module: ModuleAddr, body: &FuncBody, pc: usize) -> Result<Flow, Trap> {
        use Instr::*;

        let flow = match &body.instrs()[pc] {
            // ----------------------------------------------------------
            // Control
            Unreachable => return Err(Trap::Unreachable),
            Nop => Flow::Next,

            Block { block_type } => {
                let target = body.target(pc)?;
                self.stack.push_label(Label {
                    arity: block_type.arity(),
                    cont: target.end_pc + 1,
                    kind: LabelKind::Block,
                });
                Flow::Next
            }

            Loop { .. } => {
                // A branch to a loop label re-enters the body; it carries no
                // operands, so the arity is zero.
                self.stack.push_label(Label {
                    arity: 0,
                    cont: pc + 1,
                    kind: LabelKind::Loop,
                });
                Flow::Next
            }

            If { block_type } => {
                let cond = self.stack.pop_i32()?;
                let target = body.target(pc)?;
                let label = Label {
                    arity: block_type.arity(),
                    cont: target.end_pc + 1,
                    kind: LabelKind::Block,
                };
                if cond != 0 {
                    self.stack.push_label(label);
                    Flow::Next
                } else if let Some(else_pc) = target.else_pc {
                    self.stack.push_label(label);
                    Flow::Jump(else_pc + 1)
                } else {
                    // No else arm: skip the construct, label and all.
                    Flow::Jump(target.end_pc + 1)
                }
            }

            // Reached only by falling off the then arm: jump to the End so
            // the label is closed normally.
            Else => Flow::Jump(body.target(pc)?.end_pc),

            End => {
                self.stack.exit_label()?;
                Flow::Next
            }

            Br { depth } => {
                let label = self.stack.unwind_to_label(*depth)?;
                Flow::Jump(label.cont)
            }

            BrIf { depth } => {
                if self.stack.pop_i32()? != 0 {
                    let label = self.stack.unwind_to_label(*depth)?;
                    Flow::Jump(label.cont)
                } else {
                    Flow::Next
                }
            }

            BrTable { targets, default } => {
                let idx = self.stack.pop_u32()? as usize;
                let depth = targets.get(idx).copied().unwrap_or(*default);
                let label = self.stack.unwind_to_label(depth)?;
                Flow::Jump(label.cont)
            }

            Return => {
                self.stack.pop_frame_unwind()?;
                self.acts.pop();
                Flow::Return
            }

            Call { func_idx } => {
                let addr = store.module(module)?.func_addr(*func_idx)?;
                self.call(store, module, addr, pc)?
            }

            CallIndirect { type_idx } => {
                let elem_idx = self.stack.pop_u32()?;
                let inst = store.module(module)?;
                let table_addr = inst.table_addr(0)?;
                let expected = inst.func_type(*type_idx)?.clone();
                let addr = store.table(table_addr)?.get_element(elem_idx)?;
                if *store.function(addr)?.ty() != expected {
                    return Err(Trap::IndirectCallTypeMismatch);
                }
                self.call(store, module, addr, pc)?
            }

            // ----------------------------------------------------------
            // Parametric
            Drop => {
                ops::parametric::drop(&mut self.stack)?;
                Flow::Next
            }
            Select => {
                ops::parametric::select(&mut self.stack)?;
                Flow::Next
            }

            // ----------------------------------------------------------
            // Variables
            LocalGet { local_idx } => {
                let v = self.stack.current_frame()?.local(*local_idx)?;
                self.stack.push_value(v);
                Flow::Next
            }
            LocalSet { local_idx } => {
                let v = self.stack.pop_value()?;
                self.stack.current_frame_mut()?.set_local(*local_idx, v)?;
                Flow::Next
            }
            LocalTee { local_idx } => {
                let v = *self.stack.top_value()?;
                self.stack.current_frame_mut()?.set_local(*local_idx, v)?;
                Flow::Next
            }
            GlobalGet { global_idx } => {
                let addr = store.module(module)?.global_addr(*global_idx)?;
                let v = store.global(addr)?.value();
                self.stack.push_value(v);
                Flow::Next
            }
            GlobalSet { global_idx } => {
                let addr = store.module(module)?.global_addr(*global_idx)?;
                let v = self.stack.pop_value()?;
                store.global_mut(addr)?.set(v)?;
                Flow::Next
            }

            // ----------------------------------------------------------
            // Memory
            I32Load { memarg } => {
                with_mem!(self, store, module, load i32_load(*memarg));
                Flow::Next
            }
            I64Load { memarg } => {
                with_mem!(self, store, module, load i64_load(*memarg));
                Flow::Next
            }
            F32Load { memarg } => {
                with_mem!(self, store, module, load f32_load(*memarg));
                Flow::Next
            }
            F64Load { memarg } => {
                with_mem!(self, store, module, load f64_load(*memarg));
                Flow::Next
            }
            I32Load8S { memarg } => {
                with_mem!(self, store, module, load i32_load8_s(*memarg));
                Flow::Next
            }
            I32Load8U { memarg } => {
                with_mem!(self, store, module, load i32_load8_u(*memarg));
                Flow::Next
            }
            I32Load16S { memarg } => {
                with_mem!(self, store, module, load i32_load16_s(*memarg));
                Flow::Next
            }
            I32Load16U { memarg } => {
                with_mem!(self, store, module, load i32_load16_u(*memarg));
                Flow::Next
            }
            I64Load8S { memarg } => {
                with_mem!(self, store, module, load i64_load8_s(*memarg));
                Flow::Next
            }
            I64Load8U { memarg } => {
                with_mem!(self, store, module, load i64_load8_u(*memarg));
                Flow::Next
            }
            I64Load16S { memarg } => {
                with_mem!(self, store, module, load i64_load16_s(*memarg));
                Flow::Next
            }
            I64Load16U { memarg } => {
                with_mem!(self, store, module, load i64_load16_u(*memarg));
                Flow::Next
            }
            I64Load32S { memarg } => {
                with_mem!(self, store, module, load i64_load32_s(*memarg));
                Flow::Next
            }
            I64Load32U { memarg } => {
                with_mem!(self, store, module, load i64_load32_u(*memarg));
                Flow::Next
            }
            I32Store { memarg } => {
                with_mem!(self, store, module, store i32_store(*memarg));
                Flow::Next
            }
            I64Store { memarg } => {
                with_mem!(self, store, module, store i64_store(*memarg));
                Flow::Next
            }
            F32Store { memarg } => {
                with_mem!(self, store, module, store f32_store(*memarg));
                Flow::Next
            }
            F64Store { memarg } => {
                with_mem!(self, store, module, store f64_store(*memarg));
                Flow::Next
            }
            I32Store8 { memarg } => {
                with_mem!(self, store, module, store i32_store8(*memarg));
                Flow::Next
            }
            I32Store16 { memarg } => {
                with_mem!(self, store, module, store i32_store16(*memarg));
                Flow::Next
            }
            I64Store8 { memarg } => {
                with_mem!(self, store, module, store i64_store8(*memarg));
                Flow::Next
            }
            I64Store16 { memarg } => {
                with_mem!(self, store, module, store i64_store16(*memarg));
                Flow::Next
            }
            I64Store32 { memarg } => {
                with_mem!(self, store, module, store i64_store32(*memarg));
                Flow::Next
            }
            MemorySize => {
                let addr = Self::mem0(store, module)?;
                ops::memory::memory_size(&mut self.stack, store.memory(addr)?)?;
                Flow::Next
            }
            MemoryGrow => {
                let addr = Self::mem0(store, module)?;
                ops::memory::memory_grow(&mut self.stack, store.memory_mut(addr)?)?;
                Flow::Next
            }
            MemoryCopy => {
                if !self.config.bulk_memory {
                    return Err(Trap::FeatureDisabled("bulk-memory"));
                }
                let addr = Self::mem0(store, module)?;
                ops::memory::memory_copy(&mut self.stack, store.memory_mut(addr)?)?;
                Flow::Next
            }
            MemoryFill => {
                if !self.config.bulk_memory {
                    return Err(Trap::FeatureDisabled("bulk-memory"));
                }
                let addr = Self::mem0(store, module)?;
                ops::memory::memory_fill(&mut self.stack, store.memory_mut(addr)?)?;
                Flow::Next
            }

            // ----------------------------------------------------------
            // Constants
            I32Const { value } => {
                self.stack.push_value(Value::I32(*value));
                Flow::Next
            }
            I64Const { value } => {
                self.stack.push_value(Value::I64(*value));
                Flow::Next
            }
            F32Const { value } => {
                self.stack.push_value(Value::F32(*value));
                Flow::Next
            }
            F64Const { value } => {
                self.stack.push_value(Value::F64(*value));
                Flow::Next
            }

            // ----------------------------------------------------------
            // Comparisons
            I32Eqz => self.simple(ops::comparison::i32_eqz)?,
            I32Eq => self.simple(ops::comparison::i32_eq)?,
            I32Ne => self.simple(ops::comparison::i32_ne)?,
            I32LtS => self.simple(ops::comparison::i32_lt_s)?,
            I32LtU => self.simple(ops::comparison::i32_lt_u)?,
            I32GtS => self.simple(ops::comparison::i32_gt_s)?,
            I32GtU => self.simple(ops::comparison::i32_gt_u)?,
            I32LeS => self.simple(ops::comparison::i32_le_s)?,
            I32LeU => self.simple(ops::comparison::i32_le_u)?,
            I32GeS => self.simple(ops::comparison::i32_ge_s)?,
            I32GeU => self.simple(ops::comparison::i32_ge_u)?,
            I64Eqz => self.simple(ops::comparison::i64_eqz)?,
            I64Eq => self.simple(ops::comparison::i64_eq)?,
            I64Ne => self.simple(ops::comparison::i64_ne)?,
            I64LtS => self.simple(ops::comparison::i64_lt_s)?,
            I64LtU => self.simple(ops::comparison::i64_lt_u)?,
            I64GtS => self.simple(ops::comparison::i64_gt_s)?,
            I64GtU => self.simple(ops::comparison::i64_gt_u)?,
            I64LeS => self.simple(ops::comparison::i64_le_s)?,
            I64LeU => self.simple(ops::comparison::i64_le_u)?,
            I64GeS => self.simple(ops::comparison::i64_ge_s)?,
            I64GeU => self.simple(ops::comparison::i64_ge_u)?,
            F32Eq => self.simple(ops::comparison::f32_eq)?,
            F32Ne => self.simple(ops::comparison::f32_ne)?,
            F32Lt => self.simple(ops::comparison::f32_lt)?,
            F32Gt => self.simple(ops::comparison::f32_gt)?,
            F32Le => self.simple(ops::comparison::f32_le)?,
            F32Ge => self.simple(ops::comparison::f32_ge)?,
            F64Eq => self.simple(ops::comparison::f64_eq)?,
            F64Ne => self.simple(ops::comparison::f64_ne)?,
            F64Lt => self.simple(ops::comparison::f64_lt)?,
            F64Gt => self.simple(ops::comparison::f64_gt)?,
            F64Le => self.simple(ops::comparison::f64_le)?,
            F64Ge => self.simple(ops::comparison::f64_ge)?,

            // ----------------------------------------------------------
            // Numeric
            I32Clz => self.simple(ops::numeric::i32_clz)?,
            I32Ctz => self.simple(ops::numeric::i32_ctz)?,
            I32Popcnt => self.simple(ops::numeric::i32_popcnt)?,
            I32Add => self.simple(ops::numeric::i32_add)?,
            I32Sub => self.simple(ops::numeric::i32_sub)?,
            I32Mul => self.simple(ops::numeric::i32_mul)?,
            I32DivS => self.simple(ops::numeric::i32_div_s)?,
            I32DivU => self.simple(ops::numeric::i32_div_u)?,
            I32RemS => self.simple(ops::numeric::i32_rem_s)?,
            I32RemU => self.simple(ops::numeric::i32_rem_u)?,
            I32And => self.simple(ops::bitwise::i32_and)?,
            I32Or => self.simple(ops::bitwise::i32_or)?,
            I32Xor => self.simple(ops::bitwise::i32_xor)?,
            I32Shl => self.simple(ops::bitwise::i32_shl)?,
            I32ShrS => self.simple(ops::bitwise::i32_shr_s)?,
            I32ShrU => self.simple(ops::bitwise::i32_shr_u)?,
            I32Rotl => self.simple(ops::bitwise::i32_rotl)?,
            I32Rotr => self.simple(ops::bitwise::i32_rotr)?,
            I64Clz => self.simple(ops::numeric::i64_clz)?,
            I64Ctz => self.simple(ops::numeric::i64_ctz)?,
            I64Popcnt => self.simple(ops::numeric::i64_popcnt)?,
            I64Add => self.simple(ops::numeric::i64_add)?,
            I64Sub => self.simple(ops::numeric::i64_sub)?,
            I64Mul => self.simple(ops::numeric::i64_mul)?,
            I64DivS => self.simple(ops::numeric::i64_div_s)?,
            I64DivU => self.simple(ops::numeric::i64_div_u)?,
            I64RemS => self.simple(ops::numeric::i64_rem_s)?,
            I64RemU => self.simple(ops::numeric::i64_rem_u)?,
            I64And => self.simple(ops::bitwise::i64_and)?,
            I64Or => self.simple(ops::bitwise::i64_or)?,
            I64Xor => self.simple(ops::bitwise::i64_xor)?,
            I64Shl => self.simple(ops::bitwise::i64_shl)?,
            I64ShrS => self.simple(ops::bitwise::i64_shr_s)?,
            I64ShrU => self.simple(ops::bitwise::i64_shr_u)?,
            I64Rotl => self.simple(ops::bitwise::i64_rotl)?,
            I64Rotr => self.simple(ops::bitwise::i64_rotr)?,
            F32Abs => self.simple(ops::numeric::f32_abs)?,
            F32Neg => self.simple(ops::numeric::f32_neg)?,
            F32Ceil => self.simple(ops::numeric::f32_ceil)?,
            F32Floor => self.simple(ops::numeric::f32_floor)?,
            F32Trunc => self.simple(ops::numeric::f32_trunc)?,
            F32Nearest => self.simple(ops::numeric::f32_nearest)?,
            F32Sqrt => self.simple(ops::numeric::f32_sqrt)?,
            F32Add => self.simple(ops::numeric::f32_add)?,
            F32Sub => self.simple(ops::numeric::f32_sub)?,
            F32Mul => self.simple(ops::numeric::f32_mul)?,
            F32Div => self.simple(ops::numeric::f32_div)?,
            F32Min => self.simple(ops::numeric::f32_min)?,
            F32Max => self.simple(ops::numeric::f32_max)?,
            F32Copysign => self.simple(ops::numeric::f32_copysign)?,
            F64Abs => self.simple(ops::numeric::f64_abs)?,
            F64Neg => self.simple(ops::numeric::f64_neg)?,
            F64Ceil => self.simple(ops::numeric::f64_ceil)?,
            F64Floor => self.simple(ops::numeric::f64_floor)?,
            F64Trunc => self.simple(ops::numeric::f64_trunc)?,
            F64Nearest => self.simple(ops::numeric::f64_nearest)?,
            F64Sqrt => self.simple(ops::numeric::f64_sqrt)?,
            F64Add => self.simple(ops::numeric::f64_add)?,
            F64Sub => self.simple(ops::numeric::f64_sub)?,
            F64Mul => self.simple(ops::numeric::f64_mul)?,
            F64Div => self.simple(ops::numeric::f64_div)?,
            F64Min => self.simple(ops::numeric::f64_min)?,
            F64Max => self.simple(ops::numeric::f64_max)?,
            F64Copysign => self.simple(ops::numeric::f64_copysign)?,

            // ----------------------------------------------------------
            // Conversions
            I32WrapI64 => self.simple(ops::conversion::i32_wrap_i64)?,
            I32TruncF32S => self.simple(ops::conversion::i32_trunc_f32_s)?,
            I32TruncF32U => self.simple(ops::conversion::i32_trunc_f32_u)?,
            I32TruncF64S => self.simple(ops::conversion::i32_trunc_f64_s)?,
            I32TruncF64U => self.simple(ops::conversion::i32_trunc_f64_u)?,
            I64ExtendI32S => self.simple(ops::conversion::i64_extend_i32_s)?,
            I64ExtendI32U => self.simple(ops::conversion::i64_extend_i32_u)?,
            I64TruncF32S => self.simple(ops::conversion::i64_trunc_f32_s)?,
            I64TruncF32U => self.simple(ops::conversion::i64_trunc_f32_u)?,
            I64TruncF64S => self.simple(ops::conversion::i64_trunc_f64_s)?,
            I64TruncF64U => self.simple(ops::conversion::i64_trunc_f64_u)?,
            F32ConvertI32S => self.simple(ops::conversion::f32_convert_i32_s)?,
            F32ConvertI32U => self.simple(ops::conversion::f32_convert_i32_u)?,
            F32ConvertI64S => self.simple(ops::conversion::f32_convert_i64_s)?,
            F32ConvertI64U => self.simple(ops::conversion::f32_convert_i64_u)?,
            F32DemoteF64 => self.simple(ops::conversion::f32_demote_f64)?,
            F64ConvertI32S => self.simple(ops::conversion::f64_convert_i32_s)?,
            F64ConvertI32U => self.simple(ops::conversion::f64_convert_i32_u)?,
            F64ConvertI64S => self.simple(ops::conversion::f64_convert_i64_s)?,
            F64ConvertI64U => self.simple(ops::conversion::f64_convert_i64_u)?,
            F64PromoteF32 => self.simple(ops::conversion::f64_promote_f32)?,
            I32ReinterpretF32 => self.simple(ops::conversion::i32_reinterpret_f32)?,
            I64ReinterpretF64 => self.simple(ops::conversion::i64_reinterpret_f64)?,
            F32ReinterpretI32 => self.simple(ops::conversion::f32_reinterpret_i32)?,
            F64ReinterpretI64 => self.simple(ops::conversion::f64_reinterpret_i64)?,
            I32Extend8S => self.simple(ops::conversion::i32_extend8_s)?,
            I32Extend16S => self.simple(ops::conversion::i32_extend16_s)?,
            I64Extend8S => self.simple(ops::conversion::i64_extend8_s)?,
            I64Extend16S => self.simple(ops::conversion::i64_extend16_s)?,
            I64Extend32S => self.simple(ops::conversion::i64_extend32_s)?,
        };
        Ok(flow)
    }

    fn simple(&mut self, op: fn(&mut StackManager) -> Result<(), Trap>) -> Result<Flow, Trap> {
        op(&mut self.stack)?;
        Ok(Flow::Next)
    }

    fn mem0(store: &Store, module: ModuleAddr) -> Result<MemAddr, Trap> {
        store.module(module)?.mem_addr(0)
    }

    /// Dispatch a call to `addr`: host functions complete inline, Wasm
    /// functions push a new activation.
    fn call(&mut self, store: &mut Store, caller: ModuleAddr, addr: FuncAddr, pc: usize) -> Result<Flow, Trap> {
        trace!("call to function {} from module {}", addr.0, caller.0);
        if store.function(addr)?.is_host() {
            self.call_host(store, addr, caller)?;
            Ok(Flow::Next)
        } else {
            let ty = store.function(addr)?.ty().clone();
            let mut args = Vec::with_capacity(ty.params.len());
            for p in ty.params.iter().rev() {
                args.push(self.stack.pop_expect(*p)?);
            }
            args.reverse();

            // Save the resume point before switching activations.
            self.acts.last_mut().ok_or(Trap::NoFrame)?.pc = pc + 1;
            self.enter_wasm(store, addr, args)?;
            Ok(Flow::EnterCallee)
        }
    }

    /// Push the frame, the synthetic function-body label, and the
    /// activation for a Wasm function.
    fn enter_wasm(&mut self, store: &mut Store, addr: FuncAddr, args: Vec<Value>) -> Result<(), Trap> {
        if self.acts.len() >= MAX_CALL_DEPTH {
            return Err(Trap::CallStackExhausted);
        }
        let FunctionInstance::Wasm { module, ty, locals, body } = store.function(addr)? else {
            return Err(Trap::CallFunctionError(format!(
                "function {} is not a wasm function",
                addr.0
            )));
        };
        let module = *module;
        let arity = ty.results.len() as u32;
        let body = Arc::clone(body);

        let mut frame_locals = args;
        frame_locals.reserve(locals.len());
        for lt in locals {
            frame_locals.push(Value::zero(*lt));
        }

        self.stack.push_frame(Frame::new(module, frame_locals, arity));
        self.stack.push_label(Label {
            arity,
            cont: body.len(),
            kind: LabelKind::Block,
        });
        self.acts.push(Activation { body, module, pc: 0 });
        Ok(())
    }

    /// Invoke a host function mid-execution: pop its declared arguments,
    /// reorder them into declaration order, and push its results back.
    fn call_host(&mut self, store: &mut Store, addr: FuncAddr, caller: ModuleAddr) -> Result<(), Trap> {
        let FunctionInstance::Host { ty, callable } = store.function(addr)? else {
            return Err(Trap::CallFunctionError(format!(
                "function {} is not a host function",
                addr.0
            )));
        };
        let ty = ty.clone();
        let callable = Arc::clone(callable);

        let mut args = Vec::with_capacity(ty.params.len());
        for p in ty.params.iter().rev() {
            args.push(self.stack.pop_expect(*p)?);
        }
        args.reverse();

        let results = callable.run(&args, store, caller)?;
        check_results(&ty, &results)?;
        for v in results {
            self.stack.push_value(v);
        }
        Ok(())
    }
}

fn check_params(ty: &FunctionType, args: &[Value]) -> Result<(), Trap> {
    if args.len() != ty.params.len() {
        return Err(Trap::CallFunctionError(format!(
            "expected {} arguments, got {}",
            ty.params.len(),
            args.len()
        )));
    }
    for (arg, expected) in args.iter().zip(&ty.params) {
        if arg.ty() != *expected {
            return Err(Trap::TypeNotMatch {
                expected: *expected,
                actual: arg.ty(),
            });
        }
    }
    Ok(())
}

fn check_results(ty: &FunctionType, results: &[Value]) -> Result<(), Trap> {
    if results.len() != ty.results.len() {
        return Err(Trap::CallFunctionError(format!(
            "host function returned {} results, declared {}",
            results.len(),
            ty.results.len()
        )));
    }
    for (value, expected) in results.iter().zip(&ty.results) {
        if value.ty() != *expected {
            return Err(Trap::CallFunctionError(format!(
                "host function result type {:?} does not match declared {:?}",
                value.ty(),
                expected
            )));
        }
    }
    Ok(())
}
