//! The decoded module: the binary decoder's single output type, and the
//! entry point that drives it end to end.

use crate::binary::cursor::Cursor;
use crate::binary::primitives::{decode_func_type, decode_import, decode_export, decode_local, decode_memory_type, decode_segment, decode_vec, decode_instruction};
use crate::error::Error;
use crate::instr::Instruction;
use crate::types::{FuncType, Local};
use alloc::string::String;
use alloc::vec::Vec;

/// A memory's declared limits: an initial size and an optional maximum,
/// both expressed in 64KiB pages.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct MemoryType {
    pub min: u32,
    pub max: Option<u32>,
}

/// What kind of item an import or export names. Only the function form is
/// recognized; this is still an enum, not a bare index, so adding a
/// second kind later does not require reshaping `Import`/`Export`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ImportKind {
    Func { type_index: u32 },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExportKind {
    Func { index: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    pub module: String,
    pub name: String,
    pub kind: ImportKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Export {
    pub name: String,
    pub kind: ExportKind,
}

/// A data segment: a byte payload to be copied into a memory at a constant
/// offset during store construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub memory_index: u32,
    pub offset: u32,
    pub bytes: Vec<u8>,
}

/// A function body: its local declarations and its flat instruction
/// stream, always ending in exactly one `End`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Code {
    pub locals: Vec<Local>,
    pub instructions: Vec<Instruction>,
}

/// The decoded module. Every field but `version` is optional because the
/// *absence* of a section is semantically distinct from an *empty* one:
/// a module with no function section has no functions to resolve, while
/// one with an empty function section has zero, explicitly.
#[derive(Debug, Clone, Default)]
pub struct Module {
    pub version: u32,
    pub types: Option<Vec<FuncType>>,
    pub imports: Option<Vec<Import>>,
    pub funcs: Option<Vec<u32>>,
    pub memory: Option<Vec<MemoryType>>,
    pub exports: Option<Vec<Export>>,
    pub codes: Option<Vec<Code>>,
    pub data: Option<Vec<Segment>>,
}

const MAGIC: &[u8; 4] = b"\0asm";

/// Decodes a complete module from a byte slice.
///
/// 1. Checks the `\0asm` magic and version 1.
/// 2. Repeatedly reads a section header and payload until the input is
///    exhausted, filling in the corresponding `Module` field.
///
/// A section ID appearing twice silently overwrites the module's field
/// with the later occurrence's decode; the base format forbids this but
/// validating section uniqueness is explicitly an open, unenforced
/// question.
pub fn decode(bytes: &[u8]) -> Result<Module, Error> {
    let mut cur = Cursor::new(bytes);
    if cur.take(4)? != &MAGIC[..] {
        return Err(Error::InvalidModuleHeader);
    }
    let version = cur.take_u32_le()?;
    if version != 1 {
        return Err(Error::InvalidModuleHeader);
    }

    let mut module = Module {
        version,
        ..Module::default()
    };

    while !cur.is_empty() {
        decode_section(&mut cur, &mut module)?;
    }

    Ok(module)
}

/// Wasm section IDs, restricted to the subset this format's sections use.
/// IDs not in this list (globals, tables, elements, start, the
/// custom-name subsection, ...) are rejected as `UnknownSection`.
mod section_id {
    pub const CUSTOM: u8 = 0x00;
    pub const TYPE: u8 = 0x01;
    pub const IMPORT: u8 = 0x02;
    pub const FUNCTION: u8 = 0x03;
    pub const MEMORY: u8 = 0x05;
    pub const EXPORT: u8 = 0x07;
    pub const CODE: u8 = 0x0A;
    pub const DATA: u8 = 0x0B;
}

fn decode_section(cur: &mut Cursor<'_>, module: &mut Module) -> Result<(), Error> {
    let id = cur.take_u8()?;
    let len = cur.take_uleb128_u32()? as usize;
    let payload = cur.take(len)?;
    let mut payload_cur = Cursor::new(payload);

    match id {
        section_id::CUSTOM => {
            // The length prefix already consumed exactly the bytes of the
            // custom section's payload; there is nothing further to do.
        }
        section_id::TYPE => {
            module.types = Some(
                decode_vec(&mut payload_cur, decode_func_type).map_err(|_| Error::InvalidTypeSection)?,
            );
        }
        section_id::IMPORT => {
            module.imports = Some(
                decode_vec(&mut payload_cur, decode_import).map_err(|_| Error::InvalidImportSection)?,
            );
        }
        section_id::FUNCTION => {
            module.funcs = Some(
                decode_vec(&mut payload_cur, |c| c.take_uleb128_u32())
                    .map_err(|_| Error::InvalidFunctionSection)?,
            );
        }
        section_id::MEMORY => {
            module.memory = Some(
                decode_vec(&mut payload_cur, decode_memory_type)
                    .map_err(|_| Error::InvalidMemorySection)?,
            );
        }
        section_id::EXPORT => {
            module.exports = Some(
                decode_vec(&mut payload_cur, decode_export).map_err(|_| Error::InvalidExportSection)?,
            );
        }
        section_id::CODE => {
            module.codes = Some(
                decode_vec(&mut payload_cur, decode_code).map_err(|_| Error::InvalidCodeSection)?,
            );
        }
        section_id::DATA => {
            module.data =
                Some(decode_vec(&mut payload_cur, decode_segment).map_err(|_| Error::InvalidDataSection)?);
        }
        other => return Err(Error::UnknownSection(other)),
    }

    Ok(())
}

/// Decodes one code-section entry: a body-size prefix (read and discarded,
/// mirroring the section length prefix — it exists for skip-purposes only
/// and the inner decode is expected to consume exactly that many bytes),
/// then the locals declarations, then instructions up to and including
/// `End`.
fn decode_code(cur: &mut Cursor<'_>) -> Result<Code, Error> {
    let body_size = cur.take_uleb128_u32()? as usize;
    let body = cur.take(body_size)?;
    let mut body_cur = Cursor::new(body);

    let locals = decode_vec(&mut body_cur, decode_local)?;

    let mut instructions = Vec::new();
    loop {
        let ins = decode_instruction(&mut body_cur)?;
        let is_end = matches!(ins, Instruction::End);
        instructions.push(ins);
        if is_end {
            break;
        }
    }

    Ok(Code {
        locals,
        instructions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_module_has_no_sections() {
        let module = decode(b"\0asm\x01\x00\x00\x00").unwrap();
        assert_eq!(module.version, 1);
        assert!(module.types.is_none());
        assert!(module.imports.is_none());
        assert!(module.funcs.is_none());
        assert!(module.memory.is_none());
        assert!(module.exports.is_none());
        assert!(module.codes.is_none());
        assert!(module.data.is_none());
    }

    #[test]
    fn rejects_wrong_magic() {
        assert!(matches!(
            decode(b"nope\x01\x00\x00\x00"),
            Err(Error::InvalidModuleHeader)
        ));
    }

    #[test]
    fn rejects_unsupported_version() {
        assert!(matches!(
            decode(b"\0asm\x02\x00\x00\x00"),
            Err(Error::InvalidModuleHeader)
        ));
    }

    #[test]
    fn unknown_section_id_is_rejected() {
        // section id 0x06 (global) with a zero-length payload.
        let mut bytes = b"\0asm\x01\x00\x00\x00".to_vec();
        bytes.extend_from_slice(&[0x06, 0x00]);
        assert!(matches!(decode(&bytes), Err(Error::UnknownSection(0x06))));
    }
}
