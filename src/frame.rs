//! The call frame: one activation record per in-progress internal call.

use crate::error::Error;
use crate::store::Func;
use crate::value::{pop_args, Value};
use alloc::vec::Vec;

/// An activation record for one internal function call.
///
/// `pc` starts at `-1` rather than `0` so the dispatch loop can
/// unconditionally pre-increment before fetching: the first iteration
/// increments to `0` and reads the first instruction.
pub struct Frame {
    pub pc: i64,
    pub sp: usize,
    /// Index of this frame's function in the store's function table, used
    /// to fetch the next instruction each step without the frame holding a
    /// borrow into the store.
    pub func_index: usize,
    pub arity: usize,
    pub locals: Vec<Value>,
}

impl Frame {
    /// Builds the frame for entering `func` at `func_index` (which must be
    /// [`Func::Internal`]), popping its parameters off `operands`.
    pub fn enter(func_index: usize, func: &Func, operands: &mut Vec<Value>, sp: usize) -> Result<Frame, Error> {
        let ty = func.ty();
        let locals_decl = match func {
            Func::Internal { code, .. } => &code.locals,
            Func::External { .. } => unreachable!("only internal functions get frames"),
        };

        let params = pop_args(operands, ty.params.len())?;
        let mut locals = Vec::with_capacity(
            params.len() + locals_decl.iter().map(|l| l.count as usize).sum::<usize>(),
        );
        locals.extend(params);

        for local in locals_decl {
            for _ in 0..local.count {
                locals.push(Value::default_for(local.value_type));
            }
        }

        Ok(Frame {
            pc: -1,
            sp,
            func_index,
            arity: ty.results.len(),
            locals,
        })
    }
}
