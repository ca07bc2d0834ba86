//! The embeddable surface: decode a module, build its store, and invoke
//! exported functions over a typed value stack.

use crate::engine::Engine;
use crate::error::Error;
use crate::host::Externs;
use crate::module::{self, Module};
use crate::store::{self, Store};
use crate::value::Value;

/// A decoded, instantiated module ready to be called into.
///
/// `Runtime` owns the [`Store`] (resolved functions and linear memories),
/// the embedder's [`Externs`] registry, and a reusable [`Engine`] for the
/// operand/frame stacks. It is not `Sync`-shareable across threads by
/// design: each thread invoking functions needs its own `Runtime`.
pub struct Runtime {
    store: Store,
    externs: Externs,
    engine: Engine,
}

impl Runtime {
    /// Decodes `bytes` as a Wasm module and builds an executable store
    /// from it against the given host import table.
    ///
    /// Fails with one of the `Missing*Section` errors if the module's
    /// sections are present-but-inconsistent in a way that would make it
    /// impossible to resolve the function index space or ever be called
    /// into: a code section with no matching function section (or vice
    /// versa), functions with no type section to resolve against, or no
    /// export section at all (there would be nothing `call` could ever
    /// name).
    pub fn new(bytes: &[u8], externs: Externs) -> Result<Runtime, Error> {
        let decoded = module::decode(bytes)?;
        Self::check_sections(&decoded)?;
        let store = store::build(&decoded)?;
        Ok(Runtime {
            store,
            externs,
            engine: Engine::default(),
        })
    }

    fn check_sections(module: &Module) -> Result<(), Error> {
        let has_func_import = module
            .imports
            .as_deref()
            .unwrap_or(&[])
            .iter()
            .any(|i| matches!(i.kind, crate::module::ImportKind::Func { .. }));
        let declares_funcs = has_func_import || module.funcs.is_some();

        if declares_funcs && module.types.is_none() {
            return Err(Error::MissingTypeSection);
        }
        if module.codes.is_some() && module.funcs.is_none() {
            return Err(Error::MissingFunctionSection);
        }
        if module.funcs.is_some() && module.codes.is_none() {
            return Err(Error::MissingCodeSection);
        }
        if module.exports.is_none() {
            return Err(Error::MissingExportSection);
        }
        Ok(())
    }

    /// Invokes the exported function `name` with `args`, returning its
    /// single result if it has one.
    ///
    /// On any error, both the operand stack and the frame stack are reset
    /// to empty before the error is returned, so a subsequent `call`
    /// always starts clean.
    pub fn call(&mut self, name: &str, args: &[Value]) -> Result<Option<Value>, Error> {
        let func_index = self.store.export(name).ok_or(Error::NoSuchExport)? as usize;
        self.engine
            .call(&mut self.store, &self.externs, func_index, args)
    }
}
