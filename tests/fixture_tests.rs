//! Runs every YAML fixture suite under `tests/fixtures`.

mod common;

use std::path::Path;

#[test]
fn fixture_suites_pass() {
    let cases = common::load_fixtures(Path::new("tests/fixtures"));
    assert!(!cases.is_empty(), "no fixture cases found");

    let failures: Vec<String> = cases
        .iter()
        .filter_map(|(file, case)| {
            case.run()
                .err()
                .map(|why| format!("{file}: {}: {why}", case.name))
        })
        .collect();

    assert!(
        failures.is_empty(),
        "{} of {} fixture cases failed:\n{}",
        failures.len(),
        cases.len(),
        failures.join("\n")
    );
}
