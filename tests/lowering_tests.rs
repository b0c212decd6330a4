mod common;

use common::engine;
use templet::lower;

const FILES: &[(&str, &str)] = &[
    (
        "widgets.html",
        "Kit{% macro button(label, kind=\"primary\") %}<b class=\"{{ kind }}\">{{ icon() }}{{ label }}</b>{% endmacro %}{% macro icon() %}*{% endmacro %}",
    ),
    (
        "page.html",
        concat!(
            "{% import \"widgets.html\" as widgets %}",
            "{% from \"widgets.html\" import button %}",
            "{% call widgets.button(\"Go\", kind=\"ghost\") %}x{% endcall %}",
            "{{ widgets }}",
        ),
    ),
];

fn lowered() -> String {
    engine(FILES).lower_file("page.html").unwrap()
}

#[test]
fn compiling_twice_gives_identical_output() {
    let engine = engine(FILES);
    let first = engine.compile_file("page.html").unwrap();
    let second = engine.compile_file("page.html").unwrap();
    assert_eq!(first, second);
    assert_eq!(lower::to_source(&first), lower::to_source(&second));
}

#[test]
fn namespace_members_and_display_body() {
    let text = lowered();
    assert!(text.contains("_ctx.widgets = (_ctx.widgets || {});"), "{text}");
    assert!(text.contains("_ctx.widgets.button = function (label, kind) {"), "{text}");
    assert!(text.contains("_output += _ctx.widgets.icon();"), "{text}");
    assert!(text.contains("_ctx.widgets.toString = function () {"), "{text}");
    assert!(text.contains("_output += \"Kit\";"), "{text}");
    assert!(text.contains("_ctx.widgets.button.safe = true;"), "{text}");
}

#[test]
fn macro_prologue_handles_defaults_kwargs_and_context() {
    let text = lowered();
    assert!(text.contains("if (kind === undefined) { kind = \"primary\"; }"), "{text}");
    assert!(
        text.contains("if (_ctx.kwargs.label !== undefined) { label = _ctx.kwargs.label; }"),
        "{text}"
    );
    assert!(text.contains("__ctx = _utils.extend({}, _ctx);"), "{text}");
    assert!(text.contains("_ctx = _utils.extend(_ctx, __ctx);"), "{text}");
}

#[test]
fn from_uses_the_symbol_table_for_hidden_siblings() {
    let text = lowered();
    assert!(text.contains("_ctx.button = function (label, kind) {"), "{text}");
    assert!(text.contains("_symbols[\"widgets.html#icon\"] = function () {"), "{text}");
    assert!(text.contains("_output += _symbols[\"widgets.html#icon\"]();"), "{text}");
}

#[test]
fn call_block_binds_and_restores_caller() {
    let text = lowered();
    assert!(text.contains("var __caller = _ctx.caller;"), "{text}");
    assert!(
        text.contains(
            "_output += _utils.withKwargs(_ctx, {\"kind\": \"ghost\"}, function () { return _ctx.widgets.button(\"Go\"); });"
        ),
        "{text}"
    );
    assert!(text.contains("if (__caller === undefined) { delete _ctx.caller; }"), "{text}");
}
