//! Decoders for the typed shapes that appear inside Wasm sections: value
//! types, function signatures, memory limits, import/export descriptors,
//! locals, instructions and the prefix-counted list form they all share.

use super::cursor::Cursor;
use crate::error::Error;
use crate::instr::Instruction;
use crate::module::{Export, ExportKind, Import, ImportKind, MemoryType, Segment};
use crate::types::{FuncType, Local};
use crate::value::ValueType;
use alloc::string::String;
use alloc::vec::Vec;

/// Reads a LEB128 `u32` count followed by `count` items decoded by `item`.
///
/// Every section payload in this format uses this same prefix-counted list
/// shape, so every section-level decoder is a call to this function.
pub(crate) fn decode_vec<T>(
    cur: &mut Cursor<'_>,
    mut item: impl FnMut(&mut Cursor<'_>) -> Result<T, Error>,
) -> Result<Vec<T>, Error> {
    let count = cur.take_uleb128_u32()?;
    let mut out = Vec::with_capacity(count as usize);
    for _ in 0..count {
        out.push(item(cur)?);
    }
    Ok(out)
}

pub(crate) fn decode_value_type(cur: &mut Cursor<'_>) -> Result<ValueType, Error> {
    let byte = cur.take_u8()?;
    ValueType::from_byte(byte).ok_or(Error::UnknownType(byte))
}

pub(crate) fn decode_func_type(cur: &mut Cursor<'_>) -> Result<FuncType, Error> {
    const FUNC_FORM: u8 = 0x60;
    let form = cur.take_u8()?;
    if form != FUNC_FORM {
        return Err(Error::InvalidHeader);
    }
    let params = decode_vec(cur, decode_value_type)?;
    let results = decode_vec(cur, decode_value_type)?;
    Ok(FuncType::new(params, results))
}

pub(crate) fn decode_memory_type(cur: &mut Cursor<'_>) -> Result<MemoryType, Error> {
    let has_max = cur.take_u8()?;
    let min = cur.take_uleb128_u32()?;
    let max = if has_max != 0 {
        Some(cur.take_uleb128_u32()?)
    } else {
        None
    };
    Ok(MemoryType { min, max })
}

pub(crate) fn decode_name(cur: &mut Cursor<'_>) -> Result<String, Error> {
    let len = cur.take_uleb128_u32()?;
    let bytes = cur.take(len as usize)?;
    String::from_utf8(bytes.to_vec()).map_err(|_| Error::InvalidImportSection)
}

/// Only the function kind (`0x00`) is recognized for imports and exports;
/// any other kind byte is surfaced as the section-level error by the
/// caller, since there is no dedicated "unsupported kind" variant.
const EXTERNAL_KIND_FUNC: u8 = 0x00;

pub(crate) fn decode_import(cur: &mut Cursor<'_>) -> Result<Import, Error> {
    let module = decode_name(cur)?;
    let name = decode_name(cur)?;
    let kind = cur.take_u8()?;
    if kind != EXTERNAL_KIND_FUNC {
        return Err(Error::InvalidImportSection);
    }
    let type_index = cur.take_uleb128_u32()?;
    Ok(Import {
        module,
        name,
        kind: ImportKind::Func { type_index },
    })
}

pub(crate) fn decode_export(cur: &mut Cursor<'_>) -> Result<Export, Error> {
    let name = decode_name(cur)?;
    let kind = cur.take_u8()?;
    if kind != EXTERNAL_KIND_FUNC {
        return Err(Error::InvalidExportSection);
    }
    let index = cur.take_uleb128_u32()?;
    Ok(Export {
        name,
        kind: ExportKind::Func { index },
    })
}

pub(crate) fn decode_local(cur: &mut Cursor<'_>) -> Result<Local, Error> {
    let count = cur.take_uleb128_u32()?;
    let value_type = decode_value_type(cur)?;
    Ok(Local { count, value_type })
}

/// Decodes a data segment's offset expression: the only constant
/// expression this subset understands is `i32.const <n>; end`.
pub(crate) fn decode_offset_expr(cur: &mut Cursor<'_>) -> Result<u32, Error> {
    let opcode = cur.take_u8()?;
    if opcode != 0x41 {
        // i32.const
        return Err(Error::InvalidCode);
    }
    let offset = cur.take_sleb128_i32()?;
    let end = cur.take_u8()?;
    if end != 0x0B {
        return Err(Error::InvalidCode);
    }
    Ok(offset as u32)
}

pub(crate) fn decode_segment(cur: &mut Cursor<'_>) -> Result<Segment, Error> {
    let memory_index = cur.take_uleb128_u32()?;
    let offset = decode_offset_expr(cur)?;
    let len = cur.take_uleb128_u32()?;
    let bytes = cur.take(len as usize)?.to_vec();
    Ok(Segment {
        memory_index,
        offset,
        bytes,
    })
}

pub(crate) fn decode_instruction(cur: &mut Cursor<'_>) -> Result<Instruction, Error> {
    let opcode = cur.take_u8()?;
    let ins = match opcode {
        0x20 => Instruction::LocalGet(cur.take_uleb128_u32()?),
        0x21 => Instruction::LocalSet(cur.take_uleb128_u32()?),
        0x36 => {
            let align = cur.take_uleb128_u32()?;
            let offset = cur.take_uleb128_u32()?;
            Instruction::I32Store { align, offset }
        }
        0x41 => Instruction::I32Const(cur.take_sleb128_i32()?),
        0x6A => Instruction::I32Add,
        0x10 => Instruction::Call(cur.take_uleb128_u32()?),
        0x0B => Instruction::End,
        other => return Err(Error::UnknownInstruction(other)),
    };
    Ok(ins)
}
