//! The host-call bridge: the contract a host function must satisfy, and
//! the two-level registry the interpreter looks imports up in.

use crate::value::Value;
use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::string::String;
use core::fmt::{Debug, Display};
use downcast_rs::{impl_downcast, DowncastSync};

/// Trait for custom errors a host function can raise.
///
/// Types implementing this can be converted into [`crate::error::Error`]
/// via `?` (the blanket `From` impl in `error.rs`) and recovered afterwards
/// with [`HostError::downcast_ref`], mirroring `wasmi_core::HostError`.
pub trait HostError: 'static + Display + Debug + DowncastSync {}
impl_downcast!(sync HostError);

/// The canonical rejection a host function issues when called with
/// arguments it cannot accept. The interpreter does not type-check host
/// call arguments itself; this is how a host signals that it did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidArgs {
    pub message: String,
}

impl Display for InvalidArgs {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "invalid arguments: {}", self.message)
    }
}

impl HostError for InvalidArgs {}

/// A host-provided function: takes the ordered argument values popped off
/// the operand stack and returns an optional result, or a host error.
pub trait Extern {
    fn call(&self, args: &[Value]) -> Result<Option<Value>, Box<dyn HostError>>;
}

/// Blanket impl so a plain closure can be registered directly, without
/// requiring embedders to name a type for every import.
impl<F> Extern for F
where
    F: Fn(&[Value]) -> Result<Option<Value>, Box<dyn HostError>>,
{
    fn call(&self, args: &[Value]) -> Result<Option<Value>, Box<dyn HostError>> {
        (self)(args)
    }
}

/// The host-side import registry: `module_name -> (item_name -> Extern)`.
/// The embedder builds one of these and hands it to
/// [`crate::runtime::Runtime::new`]; the core only ever reads from it.
#[derive(Default)]
pub struct Externs {
    modules: BTreeMap<String, BTreeMap<String, Box<dyn Extern>>>,
}

impl Externs {
    pub fn new() -> Externs {
        Externs::default()
    }

    /// Registers a function under `module_name::item_name`, overwriting any
    /// function already registered at that path.
    pub fn define(
        &mut self,
        module_name: impl Into<String>,
        item_name: impl Into<String>,
        f: impl Extern + 'static,
    ) -> &mut Self {
        self.modules
            .entry(module_name.into())
            .or_default()
            .insert(item_name.into(), Box::new(f));
        self
    }

    pub(crate) fn get(&self, module_name: &str, item_name: &str) -> Option<&dyn Extern> {
        self.modules
            .get(module_name)?
            .get(item_name)
            .map(|b| b.as_ref())
    }
}
