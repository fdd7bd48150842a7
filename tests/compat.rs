//! Worked end-to-end examples driven through the public `Compiler`/
//! `Generator` API exactly as a host application would use it.

use mustang::{Compiler, FormatProvider, RenderConfig, Value};

fn render(template: &str, data: &Value) -> String {
    Compiler::new().compile(template).unwrap().render(data).unwrap_or_else(|e| panic!("render failed: {e}"))
}

#[test]
fn simple_interpolation() {
    let data = Value::object([("Name", Value::from("Bob"))]);
    assert_eq!(render("Hello, {{Name}}!!!", &data), "Hello, Bob!!!");
}

#[test]
fn left_aligned_interpolation() {
    let data = Value::object([("Name", Value::from("Bob"))]);
    assert_eq!(render("Hello, {{Name,-10}}!!!", &data), "Hello, Bob       !!!");
}

#[test]
fn standalone_if_block_elides_its_own_lines() {
    assert_eq!(render("{{#if this}}\nContent\n{{/if}}", &Value::Bool(true)), "Content");
}

#[test]
fn if_else_takes_the_else_branch_when_falsy() {
    let data = Value::Bool(false);
    assert_eq!(render("Before{{#if this}}Yay{{#else}}Nay{{/if}}After", &data), "BeforeNayAfter");
}

#[test]
fn each_over_a_sequence() {
    let data = Value::from(vec![1i64, 2, 3]);
    assert_eq!(render("Before{{#each this}}{{this}}{{/each}}After", &data), "Before123After");
}

#[test]
fn if_elif_else_chain_falls_through_to_else() {
    let data = Value::object([("First", Value::from(false)), ("Second", Value::from(false))]);
    assert_eq!(
        render("Before{{#if First}}First{{#elif Second}}Second{{#else}}Third{{/if}}After", &data),
        "BeforeThirdAfter"
    );
}

#[test]
fn standalone_comment_line_elided() {
    assert_eq!(render("{{#! c }}\n{{this}}", &Value::from("X")), "X");
}

#[test]
fn format_specifier_via_provider() {
    struct YyyyMmDd;
    impl FormatProvider for YyyyMmDd {
        fn format(&self, value: &Value, format: &str) -> Option<String> {
            if format == "yyyyMMdd" {
                value.as_str().map(|s| s.replace('-', ""))
            } else {
                None
            }
        }
    }
    let data = Value::object([("When", Value::from("2012-01-31"))]);
    let gen = Compiler::new().compile("Hello, {{When:yyyyMMdd}}!!!").unwrap();
    assert_eq!(gen.render_with(&data, &YyyyMmDd).unwrap(), "Hello, 20120131!!!");
}

/// A second `{{#else}}` inside the same `if` is rejected at compile time
/// rather than silently taking the first or last branch.
#[test]
fn duplicate_else_is_rejected_not_silently_resolved() {
    let err = Compiler::new().compile("{{#if x}}A{{#else}}B{{#else}}C{{/if}}").unwrap_err();
    assert_eq!(err, mustang::CompileError::DuplicateElse);
}

#[test]
fn a_format_provider_that_declines_falls_back_to_strict_error() {
    struct NeverFormats;
    impl FormatProvider for NeverFormats {
        fn format(&self, _value: &Value, _format: &str) -> Option<String> {
            None
        }
    }
    let gen = Compiler::new().compile("{{x:foo}}").unwrap();
    let data = Value::object([("x", Value::from("y"))]);
    let err = gen.render_with(&data, &NeverFormats).unwrap_err();
    assert!(matches!(err, mustang::RenderError::FormatProviderMissing { .. }));
}

#[test]
fn non_strict_render_config_falls_back_to_natural_string_form() {
    let gen = Compiler::new()
        .with_render_config(RenderConfig { strict_format: false })
        .compile("{{x:foo}}")
        .unwrap();
    let data = Value::object([("x", Value::from("y"))]);
    assert_eq!(gen.render(&data).unwrap(), "y");
}
