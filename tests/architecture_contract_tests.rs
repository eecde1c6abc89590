//! Architecture contract tests.

mod support;

use support::architecture::find_lines_containing;

#[test]
fn domain_has_no_framework_or_outer_layer_imports() {
    let hits = find_lines_containing(
        "src/domain",
        &[
            "crate::adapter",
            "crate::infrastructure",
            "crate::application",
            "crate::chain",
            "crate::testkit",
            "tokio::",
        ],
    );

    assert!(
        hits.is_empty(),
        "found forbidden imports in domain layer: {hits:#?}"
    );
}

#[test]
fn application_does_not_reach_outward() {
    let hits = find_lines_containing(
        "src/application",
        &["crate::adapter", "crate::infrastructure", "crate::testkit"],
    );

    assert!(
        hits.is_empty(),
        "found outer-layer imports in application layer: {hits:#?}"
    );
}

#[test]
fn library_code_has_no_unwraps() {
    let hits: Vec<_> = find_lines_containing("src/application", &[".unwrap()", ".expect("])
        .into_iter()
        .chain(find_lines_containing("src/chain", &[".unwrap()", ".expect("]))
        .collect();
    let outside_tests: Vec<_> = hits
        .into_iter()
        .filter(|(path, line, _)| !in_test_module(path, *line))
        .collect();

    assert!(
        outside_tests.is_empty(),
        "found unwrap/expect outside tests: {outside_tests:#?}"
    );
}

fn in_test_module(path: &str, line: usize) -> bool {
    let content = std::fs::read_to_string(format!("{}/{path}", env!("CARGO_MANIFEST_DIR")))
        .unwrap_or_default();
    content
        .lines()
        .take(line)
        .any(|l| l.trim() == "#[cfg(test)]")
}
