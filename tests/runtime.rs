use assert_matches::assert_matches;
use uwasm::{Error, Externs, HostError, Runtime, Value};

fn build(wat: &str, externs: Externs) -> Runtime {
    let wasm = wat::parse_str(wat).expect("failed to parse wat");
    Runtime::new(&wasm, externs).expect("failed to build runtime")
}

#[test]
fn add_two_locals() {
    let mut runtime = build(
        r#"
        (module
          (func (export "add") (param i32 i32) (result i32)
            local.get 0
            local.get 1
            i32.add))
        "#,
        Externs::new(),
    );

    assert_eq!(
        runtime.call("add", &[Value::I32(1), Value::I32(2)]).unwrap(),
        Some(Value::I32(3))
    );
    assert_eq!(
        runtime.call("add", &[Value::I32(-1), Value::I32(1)]).unwrap(),
        Some(Value::I32(0))
    );
}

#[test]
fn doubler_calls_a_local_function() {
    let mut runtime = build(
        r#"
        (module
          (func (export "call_doubler") (param i32) (result i32)
            local.get 0
            call 1)
          (func (param i32) (result i32)
            local.get 0
            local.get 0
            i32.add))
        "#,
        Externs::new(),
    );

    assert_eq!(
        runtime.call("call_doubler", &[Value::I32(2)]).unwrap(),
        Some(Value::I32(4))
    );
}

#[test]
fn calls_a_host_import() {
    let mut externs = Externs::new();
    externs.define(
        "env",
        "add",
        |args: &[Value]| -> Result<Option<Value>, Box<dyn HostError>> {
            let v = args[0].as_i32().expect("i32 argument");
            Ok(Some(Value::I32(v + 1)))
        },
    );

    let mut runtime = build(
        r#"
        (module
          (import "env" "add" (func $add (param i32) (result i32)))
          (func (export "call_add") (param i32) (result i32)
            local.get 0
            call $add))
        "#,
        externs,
    );

    assert_eq!(
        runtime.call("call_add", &[Value::I32(2)]).unwrap(),
        Some(Value::I32(3))
    );
}

#[test]
fn unknown_export_resets_state_for_the_next_call() {
    let mut runtime = build(
        r#"
        (module
          (func (export "add") (param i32 i32) (result i32)
            local.get 0
            local.get 1
            i32.add))
        "#,
        Externs::new(),
    );

    let err = runtime.call("nope", &[]).unwrap_err();
    assert_matches!(err, Error::NoSuchExport);

    assert_eq!(
        runtime.call("add", &[Value::I32(5), Value::I32(6)]).unwrap(),
        Some(Value::I32(11))
    );
}

#[test]
fn missing_import_is_reported_as_no_such_extern() {
    let mut runtime = build(
        r#"
        (module
          (import "env" "add" (func $add (param i32) (result i32)))
          (func (export "call_add") (param i32) (result i32)
            local.get 0
            call $add))
        "#,
        Externs::new(),
    );

    let err = runtime.call("call_add", &[Value::I32(2)]).unwrap_err();
    assert_matches!(err, Error::NoSuchExtern);
}

#[test]
fn data_segment_is_copied_into_memory_at_store_construction() {
    // No export decodes for anything but a function, and `Runtime::new`
    // requires an export section to exist at all, so this needs a dummy
    // exported function alongside the memory and data segment under test.
    let wasm = wat::parse_str(
        r#"
        (module
          (memory 1)
          (data (i32.const 16) "\de\ad\be\ef")
          (func (export "touch") (result i32)
            i32.const 0))
        "#,
    )
    .expect("failed to parse wat");

    // This subset has no load instruction to read memory back through the
    // public API, so the byte-level assertions live in `store::tests`;
    // this just confirms an in-range segment doesn't fail construction.
    let runtime = Runtime::new(&wasm, Externs::new());
    assert!(runtime.is_ok());
}

#[derive(Debug)]
struct RejectedArgs;

impl core::fmt::Display for RejectedArgs {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "rejected")
    }
}

impl HostError for RejectedArgs {}

#[test]
fn host_function_errors_propagate_through_call() {
    let mut externs = Externs::new();
    externs.define(
        "env",
        "add",
        |_args: &[Value]| -> Result<Option<Value>, Box<dyn HostError>> {
            Err(Box::new(RejectedArgs))
        },
    );

    let mut runtime = build(
        r#"
        (module
          (import "env" "add" (func $add (param i32) (result i32)))
          (func (export "call_add") (param i32) (result i32)
            local.get 0
            call $add))
        "#,
        externs,
    );

    let err = runtime.call("call_add", &[Value::I32(2)]).unwrap_err();
    assert_matches!(err, Error::Host(_));
}
