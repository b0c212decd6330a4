mod common;

use common::engine;
use templet::ast::{Expr, SymbolKey};
use templet::compiler::{Binding, Instr, Program};
use templet::{Context, ErrorType, Renderer, Value};

const WIDGETS: &str = concat!(
    "Widget kit\n",
    "{% macro button(label) %}{{ icon() }}{{ label }}{{ buttonGroup }}{% endmacro %}\n",
    "{% macro icon() %}*{% endmacro %}",
);

fn definitions(instrs: &[Instr]) -> Vec<(&Binding, &str)> {
    instrs
        .iter()
        .filter_map(|instr| match instr {
            Instr::DefineMacro { binding, def } => Some((binding, def.name.as_str())),
            _ => None,
        })
        .collect()
}

fn compile(page: &str) -> Program {
    engine(&[("widgets.html", WIDGETS), ("page.html", page)])
        .compile_file("page.html")
        .unwrap()
}

#[test]
fn import_binds_every_macro_under_the_alias() {
    let program = compile(r#"{% import "widgets.html" as widgets %}"#);
    let [Instr::BindNamespace {
        alias,
        members,
        literal,
    }] = program.instrs.as_slice()
    else {
        panic!("expected one namespace binding, got {:?}", program.instrs);
    };
    assert_eq!(alias, "widgets");
    let bindings: Vec<_> = definitions(members).into_iter().map(|(b, _)| b.clone()).collect();
    assert_eq!(
        bindings,
        [
            Binding::Namespace {
                alias: "widgets".into(),
                name: "button".into()
            },
            Binding::Namespace {
                alias: "widgets".into(),
                name: "icon".into()
            },
        ]
    );
    assert!(matches!(&literal[0], Instr::EmitLiteral(text) if text == "Widget kit\n"));
}

#[test]
fn sibling_references_are_qualified_and_lookalikes_are_not() {
    let program = compile(r#"{% import "widgets.html" as widgets %}"#);
    let Instr::BindNamespace { members, .. } = &program.instrs[0] else {
        panic!("expected a namespace binding");
    };
    let Instr::DefineMacro { def, .. } = &members[0] else {
        panic!("expected the button definition");
    };
    let calls_icon = Expr::Call {
        callee: Box::new(Expr::Member(
            Box::new(Expr::Context("widgets".into())),
            "icon".into(),
        )),
        args: vec![],
        kwargs: vec![],
    };
    assert_eq!(def.body[0], Instr::EmitExpr(calls_icon));
    assert_eq!(def.body[1], Instr::EmitExpr(Expr::Local("label".into())));
    assert_eq!(def.body[2], Instr::EmitExpr(Expr::Context("buttonGroup".into())));
}

#[test]
fn from_hides_unselected_siblings() {
    let program = compile(r#"{% from "widgets.html" import button %}"#);
    let icon = SymbolKey {
        source: "widgets.html".into(),
        name: "icon".into(),
    };
    let defs = definitions(&program.instrs);
    assert_eq!(
        defs,
        [
            (&Binding::Context("button".into()), "button"),
            (&Binding::Hidden(icon.clone()), "icon"),
        ]
    );

    let mut renderer = Renderer::new(Context::new().with("buttonGroup", "!"));
    renderer.render(&program).unwrap();
    assert!(renderer.context().get("icon").is_none());
    let page = engine(&[
        ("widgets.html", WIDGETS),
        (
            "page.html",
            r#"{% from "widgets.html" import button %}{{ button("Go") }}"#,
        ),
    ]);
    let out = page
        .render_file("page.html", Context::new().with("buttonGroup", "!"))
        .unwrap();
    assert_eq!(out, "*Go!");
}

#[test]
fn import_into_an_existing_map_keeps_its_entries() {
    let program = compile(r#"{% import "widgets.html" as data %}{{ data.title }}:{{ data.icon() }}"#);
    let mut context = Context::new();
    context.insert(
        "data",
        Value::from(serde_json::json!({"title": "T"})),
    );
    assert_eq!(Renderer::new(context).render(&program).unwrap(), "T:*");
}

#[test]
fn from_unknown_name_is_a_compile_error_with_help() {
    let err = engine(&[
        ("widgets.html", WIDGETS),
        ("page.html", r#"{% from "widgets.html" import slider %}"#),
    ])
    .compile_file("page.html")
    .unwrap_err();
    assert_eq!(err.error_type(), ErrorType::Compile);
    let report = format!("{:?}", miette::Report::new(err));
    assert!(report.contains("defines: button, icon"), "{report}");
}

#[test]
fn import_depth_is_limited() {
    let mut files = vec![];
    let texts: Vec<String> = (0..5)
        .map(|i| format!(r#"{{% import "f{}.html" as n %}}"#, i + 1))
        .collect();
    let names: Vec<String> = (0..5).map(|i| format!("f{i}.html")).collect();
    for (name, text) in names.iter().zip(&texts) {
        files.push((name.as_str(), text.as_str()));
    }
    files.push(("f5.html", ""));

    let mut engine = engine(&files);
    let config = templet::config::Config {
        max_import_depth: 3,
        ..Default::default()
    };
    engine = templet::Engine::with_config(engine.resolver().clone(), config);
    let err = engine.compile_file("f0.html").unwrap_err();
    assert_eq!(err.error_type(), ErrorType::Resolve);
    assert!(err.message().contains("maximum import depth"));
}

#[test]
fn namespace_printing_itself_hits_the_call_depth_limit() {
    let engine = engine(&[
        ("w.html", "X{{ w }}{% macro b() %}B{% endmacro %}"),
        ("page.html", "{% import \"w.html\" as w %}{{ w }}"),
    ]);
    let err = engine.render_file("page.html", Context::new()).unwrap_err();
    assert_eq!(err.error_type(), ErrorType::Render);
    assert!(err.message().contains("Maximum call depth"), "{}", err.message());
}
