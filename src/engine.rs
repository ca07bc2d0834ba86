//! The stack-based evaluator: operand stack, frame stack, instruction
//! dispatch and the host-call bridge.

use crate::error::Error;
use crate::frame::Frame;
use crate::host::Externs;
use crate::instr::Instruction;
use crate::store::{Func, Store};
use crate::value::{pop_args, Value};
use alloc::vec::Vec;

/// Owns the two stacks a running call needs: the operand stack and the
/// frame stack. [`crate::runtime::Runtime`] keeps one `Engine` alive across
/// calls so its `Vec`s keep their allocation; both stacks are always empty
/// on entry to [`Engine::call`], whether the previous call returned or
/// errored.
#[derive(Default)]
pub(crate) struct Engine {
    operands: Vec<Value>,
    frames: Vec<Frame>,
}

impl Engine {
    /// Invokes function `func_index` in `store` with `args` already typed
    /// and ordered, returning its single result if it has one.
    pub(crate) fn call(
        &mut self,
        store: &mut Store,
        externs: &Externs,
        func_index: usize,
        args: &[Value],
    ) -> Result<Option<Value>, Error> {
        self.operands.extend_from_slice(args);

        let func = store.funcs.get(func_index).ok_or(Error::NoSuchFunction)?;
        match func {
            Func::External { .. } => self.invoke_external(store, externs, func_index),
            Func::Internal { .. } => {
                let sp = self.operands.len() - args.len();
                let frame = Frame::enter(func_index, func, &mut self.operands, sp)?;
                self.frames.push(frame);
                self.run(store, externs)
            }
        }
    }

    /// Resets both stacks to empty, releasing any live frame locals. Called
    /// on every error path so a later call starts from a clean state.
    fn reset(&mut self) {
        self.operands.clear();
        self.frames.clear();
    }

    fn run(&mut self, store: &mut Store, externs: &Externs) -> Result<Option<Value>, Error> {
        match self.run_inner(store, externs) {
            Ok(result) => Ok(result),
            Err(e) => {
                self.reset();
                Err(e)
            }
        }
    }

    fn run_inner(&mut self, store: &mut Store, externs: &Externs) -> Result<Option<Value>, Error> {
        loop {
            let top = match self.frames.last_mut() {
                Some(f) => f,
                None => break,
            };
            top.pc += 1;
            let pc = top.pc;
            let func_index = top.func_index;

            let instructions = internal_instructions(store, func_index);
            if pc < 0 || pc as usize >= instructions.len() {
                // Safety net: well-formed code always hits `End` first.
                break;
            }
            let ins = instructions[pc as usize];

            match ins {
                Instruction::LocalGet(i) => {
                    let frame = self.frames.last().expect("frame stack non-empty");
                    let v = *frame
                        .locals
                        .get(i as usize)
                        .ok_or(Error::MissingLocal)?;
                    self.operands.push(v);
                }
                Instruction::LocalSet(i) => {
                    let v = self.operands.pop().ok_or(Error::StackEmpty)?;
                    let frame = self.frames.last_mut().expect("frame stack non-empty");
                    let slot = frame.locals.get_mut(i as usize).ok_or(Error::MissingLocal)?;
                    *slot = v;
                }
                Instruction::I32Const(v) => {
                    self.operands.push(Value::I32(v));
                }
                Instruction::I32Add => {
                    let r = self.pop_i32()?;
                    let l = self.pop_i32()?;
                    self.operands.push(Value::I32(l.wrapping_add(r)));
                }
                Instruction::I32Store { offset, .. } => {
                    let value = self.pop_i32()?;
                    let addr = self.pop_i32()? as u32;
                    store_i32(store, addr, offset, value)?;
                }
                Instruction::Call(callee) => {
                    let callee = callee as usize;
                    let func = store.funcs.get(callee).ok_or(Error::NoSuchFunction)?;
                    match func {
                        Func::Internal { .. } => {
                            let sp = self.operands.len() - func.ty().params.len();
                            let frame = Frame::enter(callee, func, &mut self.operands, sp)?;
                            self.frames.push(frame);
                        }
                        Func::External { .. } => {
                            if let Some(result) = self.invoke_external(store, externs, callee)? {
                                self.operands.push(result);
                            }
                        }
                    }
                }
                Instruction::End => {
                    let frame = self.frames.pop().expect("frame stack non-empty");
                    self.unwind(frame)?;
                }
            }
        }

        // The operand stack should be empty at this point for a void call,
        // or hold exactly the one result value otherwise.
        let result = self.operands.pop();
        debug_assert!(self.operands.is_empty());
        Ok(result)
    }

    /// Invokes an external function directly, outside of any frame: used
    /// both when the top-level `call` target is itself external and when
    /// a `Call` instruction inside a running frame targets one.
    fn invoke_external(
        &mut self,
        store: &Store,
        externs: &Externs,
        func_index: usize,
    ) -> Result<Option<Value>, Error> {
        let (module_name, item_name, params_len) = match &store.funcs[func_index] {
            Func::External {
                module_name,
                item_name,
                ty,
            } => (module_name.as_str(), item_name.as_str(), ty.params.len()),
            Func::Internal { .. } => unreachable!("caller already matched External"),
        };

        let args = pop_args(&mut self.operands, params_len)?;
        let f = externs
            .get(module_name, item_name)
            .ok_or(Error::NoSuchExtern)?;
        f.call(&args).map_err(Error::from)
    }

    /// Unwinds `frame` on `End`: truncates the operand stack back to the
    /// frame's base, re-pushing the single result value if the function
    /// has one.
    fn unwind(&mut self, frame: Frame) -> Result<(), Error> {
        match frame.arity {
            0 => {
                self.operands.truncate(frame.sp);
            }
            1 => {
                let v = self.operands.pop().ok_or(Error::StackEmpty)?;
                self.operands.truncate(frame.sp);
                self.operands.push(v);
            }
            _ => unreachable!("this subset only has 0 or 1 results"),
        }
        Ok(())
    }

    fn pop_i32(&mut self) -> Result<i32, Error> {
        let v = self.operands.pop().ok_or(Error::StackEmpty)?;
        Ok(v.as_i32()
            .expect("validated module: operand to an i32 instruction is i32"))
    }
}

fn internal_instructions(store: &Store, func_index: usize) -> &[Instruction] {
    match &store.funcs[func_index] {
        Func::Internal { code, .. } => &code.instructions,
        Func::External { .. } => unreachable!("only internal functions are stepped"),
    }
}

fn store_i32(store: &mut Store, addr: u32, offset: u32, value: i32) -> Result<(), Error> {
    let memory = store.memories.get_mut(0).ok_or(Error::NoSuchMemory)?;
    let base = addr.checked_add(offset).ok_or(Error::MemoryAddressOutOfRange)?;
    let end = base
        .checked_add(4)
        .ok_or(Error::MemoryAddressOutOfRange)?;
    if end as usize > memory.bytes.len() {
        return Err(Error::MemoryAddressOutOfRange);
    }
    let start = base as usize;
    memory.bytes[start..start + 4].copy_from_slice(&value.to_le_bytes());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::Externs;
    use crate::module::Code;
    use crate::types::FuncType;
    use crate::value::ValueType;
    use alloc::string::ToString;

    fn adder_store() -> Store {
        Store {
            funcs: vec![Func::Internal {
                ty: FuncType::new(vec![ValueType::I32, ValueType::I32], vec![ValueType::I32]),
                code: Code {
                    locals: vec![],
                    instructions: vec![
                        Instruction::LocalGet(0),
                        Instruction::LocalGet(1),
                        Instruction::I32Add,
                        Instruction::End,
                    ],
                },
            }],
            memories: vec![],
            export_index: Default::default(),
        }
    }

    #[test]
    fn i32_add_wraps_and_is_commutative() {
        let mut store = adder_store();
        let externs = Externs::new();
        let mut engine = Engine::default();

        let a = engine
            .call(&mut store, &externs, 0, &[Value::I32(1), Value::I32(2)])
            .unwrap();
        let b = engine
            .call(&mut store, &externs, 0, &[Value::I32(2), Value::I32(1)])
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(a, Some(Value::I32(3)));

        let wrapped = engine
            .call(&mut store, &externs, 0, &[Value::I32(i32::MAX), Value::I32(1)])
            .unwrap();
        assert_eq!(wrapped, Some(Value::I32(i32::MIN)));
    }

    #[test]
    fn stacks_are_empty_after_a_successful_call() {
        let mut store = adder_store();
        let externs = Externs::new();
        let mut engine = Engine::default();

        engine
            .call(&mut store, &externs, 0, &[Value::I32(1), Value::I32(2)])
            .unwrap();
        assert!(engine.operands.is_empty());
        assert!(engine.frames.is_empty());
    }

    #[test]
    fn a_call_to_an_out_of_range_function_index_errors_and_resets() {
        let mut store = adder_store();
        let externs = Externs::new();
        let mut engine = Engine::default();

        let err = engine
            .call(&mut store, &externs, 7, &[Value::I32(1), Value::I32(2)])
            .unwrap_err();
        assert!(matches!(err, Error::NoSuchFunction));
        assert!(engine.operands.is_empty());
        assert!(engine.frames.is_empty());
    }

    #[test]
    fn host_call_bridges_to_an_extern() {
        let mut store = Store {
            funcs: vec![Func::External {
                module_name: "env".to_string(),
                item_name: "add".to_string(),
                ty: FuncType::new(vec![ValueType::I32], vec![ValueType::I32]),
            }],
            memories: vec![],
            export_index: Default::default(),
        };
        let mut externs = Externs::new();
        externs.define(
            "env",
            "add",
            |args: &[Value]| -> Result<Option<Value>, alloc::boxed::Box<dyn crate::host::HostError>> {
                Ok(Some(Value::I32(args[0].as_i32().unwrap() + 1)))
            },
        );
        let mut engine = Engine::default();

        let result = engine
            .call(&mut store, &externs, 0, &[Value::I32(41)])
            .unwrap();
        assert_eq!(result, Some(Value::I32(42)));
    }
}
