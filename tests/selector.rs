// tests/selector.rs

use treerun::dag::{SelectionOptions, Selector, WorkingSet};
use treerun::errors::TreerunError;
use treerun_test_utils::builders::{fan_out_graph, GraphBuilder};

fn names(set: &WorkingSet) -> Vec<&str> {
    set.iter().collect()
}

fn selector(options: SelectionOptions) -> Selector {
    Selector::new(&options).expect("valid patterns")
}

#[test]
fn empty_patterns_select_everything() {
    let graph = fan_out_graph();
    let set = selector(SelectionOptions::default()).select(&graph);
    assert_eq!(names(&set), vec!["A", "B", "C"]);
}

#[test]
fn include_and_exclude_gate_the_base_selection() {
    let graph = GraphBuilder::new()
        .package("app-web", &[])
        .package("app-cli", &[])
        .package("lib-core", &[])
        .build();

    let set = selector(SelectionOptions {
        include: vec!["app-.*".into()],
        exclude: vec!["app-cli".into()],
        ..Default::default()
    })
    .select(&graph);

    assert_eq!(names(&set), vec!["app-web"]);
}

#[test]
fn patterns_match_the_whole_name() {
    let graph = GraphBuilder::new()
        .package("core", &[])
        .package("core-utils", &[])
        .build();

    let set = selector(SelectionOptions {
        include: vec!["core".into()],
        ..Default::default()
    })
    .select(&graph);

    assert_eq!(names(&set), vec!["core"]);
}

#[test]
fn expand_dependencies_force_includes_what_the_base_needs() {
    // Include matches only C; A comes in as C's dependency, B stays out.
    let graph = fan_out_graph();
    let set = selector(SelectionOptions {
        include: vec!["C".into()],
        with_dependencies: true,
        ..Default::default()
    })
    .select(&graph);

    assert_eq!(names(&set), vec!["A", "C"]);
}

#[test]
fn expand_dependents_adds_transitive_dependents() {
    let graph = GraphBuilder::new()
        .package("A", &[])
        .package("B", &["A"])
        .package("C", &["B"])
        .package("D", &[])
        .build();

    let set = selector(SelectionOptions {
        include: vec!["A".into()],
        with_dependents: true,
        ..Default::default()
    })
    .select(&graph);

    assert_eq!(names(&set), vec!["A", "B", "C"]);
}

#[test]
fn expansion_ignores_exclude_patterns() {
    let graph = fan_out_graph();
    let set = selector(SelectionOptions {
        include: vec!["B".into()],
        exclude: vec!["A".into()],
        with_dependencies: true,
        ..Default::default()
    })
    .select(&graph);

    assert_eq!(names(&set), vec!["A", "B"]);
}

#[test]
fn predicate_only_gates_the_base_selection() {
    let graph = GraphBuilder::new()
        .package("A", &[])
        .package_with_scripts("B", &["A"], &["build"])
        .package("C", &[])
        .build();

    let sel = selector(SelectionOptions {
        with_dependencies: true,
        ..Default::default()
    });
    let set = sel.select_where(&graph, |p| p.has_script("build"));

    assert_eq!(names(&set), vec!["A", "B"]);
}

#[test]
fn no_match_yields_an_empty_working_set() {
    let graph = fan_out_graph();
    let set = selector(SelectionOptions {
        include: vec!["nothing-here".into()],
        with_dependents: true,
        with_dependencies: true,
        ..Default::default()
    })
    .select(&graph);

    assert!(set.is_empty());
}

#[test]
fn selection_is_idempotent() {
    let graph = GraphBuilder::new()
        .package("A", &[])
        .package("B", &["A"])
        .package("C", &["B"])
        .package("D", &["A"])
        .build();
    let sel = selector(SelectionOptions {
        include: vec!["B|D".into()],
        exclude: vec!["D".into()],
        with_dependents: true,
        with_dependencies: true,
    });

    let first = sel.select(&graph);
    let second = sel.select(&graph);
    assert_eq!(first, second);
    assert_eq!(names(&first), vec!["A", "B", "C"]);
}

#[test]
fn invalid_pattern_is_reported() {
    let result = Selector::new(&SelectionOptions {
        include: vec!["(unclosed".into()],
        ..Default::default()
    });

    match result {
        Err(TreerunError::InvalidPattern { pattern, .. }) => assert_eq!(pattern, "(unclosed"),
        other => panic!("expected InvalidPattern, got {other:?}"),
    }
}

#[test]
fn explicit_working_set_rejects_unknown_packages() {
    let graph = fan_out_graph();
    match WorkingSet::from_names(&graph, ["A", "Z"]) {
        Err(TreerunError::PackageNotFound(name)) => assert_eq!(name, "Z"),
        other => panic!("expected PackageNotFound, got {other:?}"),
    }
}
