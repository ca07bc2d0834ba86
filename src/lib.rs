//! # uwasm
//!
//! A minimal WebAssembly binary decoder and stack-machine interpreter.
//!
//! uwasm reads a subset of the WebAssembly binary format directly off a
//! byte slice and runs exported functions on a small stack machine. It
//! does not validate modules the way a full Wasm engine does: it assumes
//! the bytes it is given are well-formed and already type-checked, and it
//! supports only the instruction set and section shapes documented on
//! [`module::decode`] and [`engine`]. There is no JIT, no multi-value
//! returns, no tables, no globals and no `start` function; see each
//! module's documentation for exactly what is and isn't handled.
//!
//! ## Loading a module
//!
//! Decoding and instantiation are one step: [`Runtime::new`] decodes the
//! module bytes, resolves its function index space and import bridge
//! against the [`Externs`] the embedder provides, materializes linear
//! memory and applies any data segments.
//!
//! ## Calling into a module
//!
//! Once built, [`Runtime::call`] invokes an exported function by name
//! with a slice of typed [`Value`]s and returns its single result, if it
//! has one. Any error during execution resets both of the runtime's
//! internal stacks, so a `Runtime` is always safe to call into again
//! after a failed call.
//!
//! # Examples
//!
//! ```rust
//! use uwasm::{Externs, Runtime, Value};
//!
//! let wasm = wat::parse_str(
//!     r#"
//!     (module
//!       (func (export "add") (param i32 i32) (result i32)
//!         local.get 0
//!         local.get 1
//!         i32.add))
//!     "#,
//! )
//! .expect("failed to parse wat");
//!
//! let mut runtime = Runtime::new(&wasm, Externs::new()).expect("failed to build runtime");
//! let result = runtime
//!     .call("add", &[Value::I32(1), Value::I32(2)])
//!     .expect("call failed");
//! assert_eq!(result, Some(Value::I32(3)));
//! ```

#![warn(missing_docs)]
#![cfg_attr(not(feature = "std"), no_std)]
#![allow(clippy::len_without_is_empty)]

#[cfg(not(feature = "std"))]
#[macro_use]
extern crate alloc;
#[cfg(feature = "std")]
extern crate std as alloc;

mod binary;
mod engine;
mod error;
mod frame;
mod host;
mod instr;
mod module;
mod runtime;
mod store;
mod types;
mod value;

pub use error::Error;
pub use host::{Extern, Externs, HostError};
pub use runtime::Runtime;
pub use types::FuncType;
pub use value::{Value, ValueType};
