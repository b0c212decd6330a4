// Regression tests for the templet binary: diagnostics are rendered with
// miette, and the main subcommands work end to end on files on disk.

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::{prelude::PredicateBooleanExt, str::contains};

/// A fresh directory under the target dir for one test's templates.
fn scratch(name: &str) -> PathBuf {
    let dir = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join(name);
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn templet(dir: &PathBuf) -> Command {
    let mut cmd = Command::cargo_bin("templet").unwrap();
    cmd.current_dir(dir).env_remove("TEMPLET_LOG");
    cmd
}

#[test]
fn cli_reports_miette_diagnostics_on_error() {
    let dir = scratch("cli_diagnostics");
    fs::write(dir.join("bad.html"), "{% macro m(user.name) %}{% endmacro %}").unwrap();

    templet(&dir)
        .arg("render")
        .arg("bad.html")
        .assert()
        .failure()
        .stderr(contains("templet::syntax").and(contains("Unexpected dot")));
}

#[test]
fn render_with_json_data() {
    let dir = scratch("cli_render");
    fs::write(
        dir.join("widgets.html"),
        "{% macro hello(name) %}Hello {{ name }}{% endmacro %}",
    )
    .unwrap();
    fs::write(
        dir.join("page.html"),
        "{% import \"widgets.html\" as w %}{{ w.hello(who) }}",
    )
    .unwrap();

    templet(&dir)
        .args(["render", "page.html", "--data", r#"{"who": "Ann"}"#])
        .assert()
        .success()
        .stdout("Hello Ann");
}

#[test]
fn compile_prints_script_text() {
    let dir = scratch("cli_compile");
    fs::write(dir.join("page.html"), "{% macro m() %}x{% endmacro %}").unwrap();

    templet(&dir)
        .args(["compile", "page.html"])
        .assert()
        .success()
        .stdout(contains("_ctx.m = function () {"));
}

#[test]
fn check_walks_templates_and_fails_on_errors() {
    let dir = scratch("cli_check");
    fs::create_dir_all(dir.join("pages")).unwrap();
    fs::write(dir.join("pages/good.html"), "{% macro m() %}{% endmacro %}").unwrap();
    fs::write(dir.join("pages/bad.html"), "{% from \"./good.html\" import nope %}").unwrap();
    fs::write(dir.join("notes.txt"), "{% ignored").unwrap();

    templet(&dir)
        .arg("check")
        .assert()
        .failure()
        .stdout(contains("pages/good.html").and(contains("Failed: 1")))
        .stderr(contains("templet::compile"));
}

#[test]
fn config_file_sets_the_template_root() {
    let dir = scratch("cli_config");
    fs::create_dir_all(dir.join("templates")).unwrap();
    fs::write(dir.join("templates/page.html"), "ok").unwrap();
    fs::write(dir.join("templet.yaml"), "root: templates\n").unwrap();

    templet(&dir)
        .args(["render", "page.html"])
        .assert()
        .success()
        .stdout("ok");
}

#[test]
fn tags_lists_the_standard_tags() {
    templet(&scratch("cli_tags"))
        .arg("tags")
        .assert()
        .success()
        .stdout(contains("macro").and(contains("import")).and(contains("endcall")));
}
