//! Store construction: resolving the function index space, materializing
//! linear memory, and recording exports by name.

use crate::error::Error;
use crate::module::{Code, ExportKind, ImportKind, Module};
use crate::types::FuncType;
use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

/// 64 KiB, the fixed unit linear memory grows in.
pub const PAGE_SIZE: u32 = 65536;

/// A resolved function: either a host import (executed through
/// [`crate::host::Externs`]) or one defined by this module's code section.
///
/// Both variants carry the function's `FuncType` by value rather than by
/// index, since the store is built once from an immutable module and the
/// type is cheap to clone; `Internal` additionally carries its `Code` by
/// value for the same reason.
#[derive(Debug, Clone)]
pub enum Func {
    Internal { ty: FuncType, code: Code },
    External {
        module_name: String,
        item_name: String,
        ty: FuncType,
    },
}

impl Func {
    pub fn ty(&self) -> &FuncType {
        match self {
            Func::Internal { ty, .. } => ty,
            Func::External { ty, .. } => ty,
        }
    }
}

/// A materialized linear memory: a zero-initialized byte buffer sized
/// `min * PAGE_SIZE`, plus the declared maximum for bounds-checking growth
/// (growth itself is out of scope; this subset only ever reads the initial
/// allocation).
#[derive(Debug, Clone)]
pub struct MemoryInstance {
    pub bytes: Vec<u8>,
    pub max: Option<u32>,
}

/// The runtime-instantiated counterpart of a decoded `Module`: resolved
/// functions, materialized memories and an export name lookup.
#[derive(Debug, Clone, Default)]
pub struct Store {
    pub funcs: Vec<Func>,
    pub memories: Vec<MemoryInstance>,
    pub(crate) export_index: BTreeMap<String, u32>,
}

impl Store {
    pub fn export(&self, name: &str) -> Option<u32> {
        self.export_index.get(name).copied()
    }
}

/// Builds a `Store` from a decoded `Module`.
///
/// `module`'s types are consulted by index while building `funcs`; nothing
/// from the module is retained by reference afterward; `Code` bodies are
/// cloned into the store's `Func::Internal` entries so the store has no
/// lifetime tied to the module that produced it.
pub fn build(module: &Module) -> Result<Store, Error> {
    let types = module.types.as_deref().unwrap_or(&[]);
    let imports = module.imports.as_deref().unwrap_or(&[]);
    let func_type_indices = module.funcs.as_deref().unwrap_or(&[]);
    let codes = module.codes.as_deref().unwrap_or(&[]);

    let mut funcs = Vec::with_capacity(imports.len() + codes.len());

    // Step 1: imports first, in import order — the low end of the
    // function index space.
    for import in imports {
        let ImportKind::Func { type_index } = import.kind;
        let ty = types
            .get(type_index as usize)
            .ok_or(Error::NoSuchFuncType)?
            .clone();
        funcs.push(Func::External {
            module_name: import.module.clone(),
            item_name: import.name.clone(),
            ty,
        });
    }

    // Step 2: local definitions, in code order — the high end.
    for (i, code) in codes.iter().enumerate() {
        let type_index = *func_type_indices.get(i).ok_or(Error::NoSuchFunc)?;
        let ty = types
            .get(type_index as usize)
            .ok_or(Error::NoSuchFuncType)?
            .clone();
        funcs.push(Func::Internal {
            ty,
            code: code.clone(),
        });
    }

    // Step 3: allocate linear memories.
    let mut memories = Vec::new();
    if let Some(memory_types) = &module.memory {
        for mt in memory_types {
            memories.push(MemoryInstance {
                bytes: alloc::vec![0u8; (mt.min * PAGE_SIZE) as usize],
                max: mt.max,
            });
        }
    }

    // Step 4: record exports by name, over the combined index space built
    // in steps 1-2.
    let mut export_index = BTreeMap::new();
    if let Some(exports) = &module.exports {
        for export in exports {
            let ExportKind::Func { index } = export.kind;
            export_index.insert(export.name.clone(), index);
        }
    }

    // Step 5: apply data segments.
    if let Some(segments) = &module.data {
        for seg in segments {
            let mem = memories
                .get_mut(seg.memory_index as usize)
                .ok_or(Error::NoSuchMemory)?;
            let end = seg
                .offset
                .checked_add(seg.bytes.len() as u32)
                .ok_or(Error::MemoryAddressOutOfRange)?;
            if end as usize > mem.bytes.len() {
                return Err(Error::MemoryAddressOutOfRange);
            }
            let start = seg.offset as usize;
            mem.bytes[start..start + seg.bytes.len()].copy_from_slice(&seg.bytes);
        }
    }

    Ok(Store {
        funcs,
        memories,
        export_index,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::{MemoryType, Segment};

    #[test]
    fn data_segment_is_copied_into_memory_and_elsewhere_stays_zero() {
        let module = Module {
            version: 1,
            memory: Some(vec![MemoryType { min: 1, max: None }]),
            data: Some(vec![Segment {
                memory_index: 0,
                offset: 16,
                bytes: vec![0xDE, 0xAD, 0xBE, 0xEF],
            }]),
            ..Module::default()
        };

        let store = build(&module).unwrap();
        let mem = &store.memories[0];
        assert_eq!(mem.bytes.len(), PAGE_SIZE as usize);
        assert_eq!(&mem.bytes[16..20], &[0xDE, 0xAD, 0xBE, 0xEF]);
        assert!(mem.bytes[..16].iter().all(|&b| b == 0));
        assert!(mem.bytes[20..].iter().all(|&b| b == 0));
    }

    #[test]
    fn segment_overrunning_memory_is_rejected() {
        let module = Module {
            version: 1,
            memory: Some(vec![MemoryType { min: 1, max: None }]),
            data: Some(vec![Segment {
                memory_index: 0,
                offset: PAGE_SIZE - 2,
                bytes: vec![0x01, 0x02, 0x03, 0x04],
            }]),
            ..Module::default()
        };

        assert!(matches!(
            build(&module),
            Err(Error::MemoryAddressOutOfRange)
        ));
    }
}
