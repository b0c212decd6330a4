mod common;

use common::{engine, render, render_with};
use serde_json::json;
use templet::compiler::{Binding, Instr};
use templet::{Context, ErrorType, Renderer, Value};

#[test]
fn greet_uses_default_then_keyword_override() {
    let page = concat!(
        r#"{% macro greet(name, greeting="Hello") %}{{ greeting }} {{ name }}{% endmacro %}"#,
        r#"{{ greet("Ann") }};{{ greet("Ann", greeting="Hi") }}"#,
    );
    let files = [("page.html", page)];
    assert_eq!(render(&files, "page.html").unwrap(), "Hello Ann;Hi Ann");
}

#[test]
fn explicit_undefined_argument_falls_back_to_default() {
    let files = [(
        "page.html",
        r#"{% macro m(a="d") %}{{ a }}{% endmacro %}{{ m(missing) }}{{ m(none) }}"#,
    )];
    // `none` is a value; only undefined arguments take the default.
    assert_eq!(render(&files, "page.html").unwrap(), "d");
}

#[test]
fn context_keys_are_restored_after_a_call() {
    let files = [(
        "page.html",
        "{% macro m(title) %}{{ title }}{% endmacro %}{{ m(\"inner\") }}",
    )];
    let engine = engine(&files);
    let program = engine.compile_file("page.html").unwrap();
    let mut renderer = Renderer::new(Context::new().with("title", "outer"));
    assert_eq!(renderer.render(&program).unwrap(), "inner");
    assert_eq!(renderer.context().get("title"), Some(&Value::from("outer")));
    assert!(renderer.context().get("kwargs").is_none());
}

#[test]
fn macro_is_bound_on_the_context() {
    let files = [("page.html", "{% macro card(a, b=1) %}{% endmacro %}")];
    let program = engine(&files).compile_file("page.html").unwrap();
    let [Instr::DefineMacro { binding, def }] = program.instrs.as_slice() else {
        panic!("expected a single definition, got {:?}", program.instrs);
    };
    assert_eq!(binding, &Binding::Context("card".into()));
    assert_eq!(def.param_names().collect::<Vec<_>>(), ["a", "b"]);
    assert!(def.safe);

    let mut renderer = Renderer::new(Context::new());
    renderer.render(&program).unwrap();
    let context = renderer.into_context();
    let card = context.get("card").unwrap();
    assert_eq!(card.type_name(), "macro");
    assert!(card.is_safe());
}

#[test]
fn inline_source_imports_relative_to_its_name() {
    let engine = engine(&[("pages/parts.html", "{% macro hi(n) %}hi {{ n }}{% endmacro %}")]);
    let out = engine
        .render_source(
            "pages/index.html",
            "{% from \"./parts.html\" import hi %}{{ hi(who) }}",
            Context::new().with("who", "Bo"),
        )
        .unwrap();
    assert_eq!(out, "hi Bo");
}

#[test]
fn render_data_reaches_macro_bodies() {
    let files = [(
        "page.html",
        "{% macro who() %}{{ user.name }}#{{ user.tags[1] }}{% endmacro %}{{ who() }}",
    )];
    let out = render_with(
        &files,
        "page.html",
        json!({"user": {"name": "Ann", "tags": ["a", "b"]}}),
    )
    .unwrap();
    assert_eq!(out, "Ann#b");
}

#[test]
fn runaway_recursion_is_a_render_error() {
    let files = [("page.html", "{% macro loop() %}{{ loop() }}{% endmacro %}{{ loop() }}")];
    let err = render(&files, "page.html").unwrap_err();
    assert_eq!(err.error_type(), ErrorType::Render);
    assert!(err.message().contains("Maximum call depth"));
}

#[test]
fn signature_errors_name_the_line() {
    let files = [("page.html", "line one\n{% macro m(a) extra %}{% endmacro %}")];
    let err = render(&files, "page.html").unwrap_err();
    assert_eq!(err.error_type(), ErrorType::Syntax);
    assert!(err.message().contains("line 2"), "{}", err.message());
}
