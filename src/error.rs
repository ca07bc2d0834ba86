//! Error types returned by the decoder, store builder and interpreter.

use crate::host::HostError;
use alloc::boxed::Box;
use core::fmt;

/// Errors produced while decoding, linking or executing a module.
///
/// This is a single hand-rolled sum type covering the decoder, the store
/// builder and the interpreter, mirroring `wasmi`'s own `Error`: every
/// failure mode the library can produce is a variant here, rather than an
/// opaque boxed error, so embedders can match on the specific cause.
#[derive(Debug)]
pub enum Error {
    // --- decode errors ---
    /// The module did not start with `\0asm` or did not declare version 1.
    InvalidModuleHeader,
    /// A section ID byte did not match any known section.
    UnknownSection(u8),
    /// A value-type byte did not match `i32`/`i64`/`f32`/`f64`.
    UnknownType(u8),
    /// An opcode byte is not part of the supported instruction subset.
    UnknownInstruction(u8),
    /// A `FuncType` did not begin with the `0x60` form marker.
    InvalidHeader,
    /// The type section could not be decoded.
    InvalidTypeSection,
    /// The import section could not be decoded.
    InvalidImportSection,
    /// The function section could not be decoded.
    InvalidFunctionSection,
    /// The memory section could not be decoded.
    InvalidMemorySection,
    /// The export section could not be decoded.
    InvalidExportSection,
    /// The code section could not be decoded.
    InvalidCodeSection,
    /// A function body's locals or instructions were malformed.
    InvalidCode,
    /// The data section could not be decoded.
    InvalidDataSection,
    /// The byte source ran out of bytes mid-decode.
    UnexpectedEof,

    // --- link / construction errors ---
    /// An import or function-section entry referenced a type index that
    /// does not exist in the module's type table.
    NoSuchFuncType,
    /// The code section has more entries than the function section declared
    /// type indices for.
    NoSuchFunc,
    /// A data segment targeted a memory index that was never declared.
    NoSuchMemory,
    /// A data segment's `offset + len` overruns the target memory.
    MemoryAddressOutOfRange,

    // --- missing-prerequisite errors, enforced at `Runtime::new` ---
    /// The module declares functions but no type section.
    MissingTypeSection,
    /// The module declares a code section but no function section (or vice
    /// versa).
    MissingFunctionSection,
    /// The embedder asked for an export but the module has no export
    /// section at all.
    MissingExportSection,
    /// The module declares functions but no code section.
    MissingCodeSection,

    // --- execution errors ---
    /// `LocalGet`/`LocalSet` referenced a local slot out of range.
    MissingLocal,
    /// The operand stack was popped while empty.
    StackEmpty,
    /// The frame stack was popped while empty.
    FramesEmpty,
    /// `Runtime::call` was given a name with no matching export.
    NoSuchExport,
    /// A `Call` targeted an import with no matching entry in `Externs`.
    NoSuchExtern,
    /// A `Call` targeted a function index out of range of the store.
    NoSuchFunction,

    /// Error raised by a host function implementation.
    Host(Box<dyn HostError>),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidModuleHeader => write!(f, "invalid module header"),
            Error::UnknownSection(id) => write!(f, "unknown section id: {:#x}", id),
            Error::UnknownType(b) => write!(f, "unknown value type: {:#x}", b),
            Error::UnknownInstruction(op) => write!(f, "unknown instruction opcode: {:#x}", op),
            Error::InvalidHeader => write!(f, "invalid function type header"),
            Error::InvalidTypeSection => write!(f, "invalid type section"),
            Error::InvalidImportSection => write!(f, "invalid import section"),
            Error::InvalidFunctionSection => write!(f, "invalid function section"),
            Error::InvalidMemorySection => write!(f, "invalid memory section"),
            Error::InvalidExportSection => write!(f, "invalid export section"),
            Error::InvalidCodeSection => write!(f, "invalid code section"),
            Error::InvalidCode => write!(f, "invalid function body"),
            Error::InvalidDataSection => write!(f, "invalid data section"),
            Error::UnexpectedEof => write!(f, "unexpected end of input"),
            Error::NoSuchFuncType => write!(f, "type index out of range"),
            Error::NoSuchFunc => write!(f, "code entry has no matching function-section entry"),
            Error::NoSuchMemory => write!(f, "data segment targets an undeclared memory"),
            Error::MemoryAddressOutOfRange => write!(f, "memory access out of range"),
            Error::MissingTypeSection => write!(f, "module has functions but no type section"),
            Error::MissingFunctionSection => {
                write!(f, "module has code but no function section")
            }
            Error::MissingExportSection => write!(f, "module has no export section"),
            Error::MissingCodeSection => write!(f, "module has functions but no code section"),
            Error::MissingLocal => write!(f, "local index out of range"),
            Error::StackEmpty => write!(f, "operand stack underflow"),
            Error::FramesEmpty => write!(f, "frame stack underflow"),
            Error::NoSuchExport => write!(f, "no export with that name"),
            Error::NoSuchExtern => write!(f, "no extern registered for that import"),
            Error::NoSuchFunction => write!(f, "function index out of range"),
            Error::Host(e) => write!(f, "host error: {}", e),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

impl<E> From<E> for Error
where
    E: HostError + Sized,
{
    fn from(e: E) -> Self {
        Error::Host(Box::new(e))
    }
}

impl From<Box<dyn HostError>> for Error {
    fn from(e: Box<dyn HostError>) -> Self {
        Error::Host(e)
    }
}
