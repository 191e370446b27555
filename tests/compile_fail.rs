//! Compile-fail suite for `#[derive(BindParams)]`
//!
//! Each file under `tests/ui/` misuses the binding vocabulary and must be rejected with
//! the message recorded in its `.stderr` file.

#[test]
fn test_derive_rejects_bad_bindings() {
    let cases = trybuild::TestCases::new();
    cases.compile_fail("tests/ui/*.rs");
}
