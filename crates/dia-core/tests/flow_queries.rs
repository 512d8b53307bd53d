//! Integration tests: traversal expressions over a small flowchart.
//!
//! ```text
//! Start ─► Ready? ─yes─► Ship ─┐
//!              └───no──► Fix  ─┴─► End
//! ```
//! `Ship` and `Fix` sit in a group; `yes`/`no` are text objects attached
//! to their lines.

use dia_core::expr::*;
use dia_core::{Diagram, DocNode, ObjectRef, build_diagram};
use pretty_assertions::assert_eq;

fn flow() -> Diagram {
    let root: DocNode = serde_json::from_str(include_str!("fixtures/flow.json")).unwrap();
    build_diagram(&root).unwrap()
}

fn run<'a, T>(seq: Seq<'a, T>) -> Vec<T> {
    seq.collect::<Result<_, _>>().expect("traversal failed")
}

fn ids(objs: Vec<ObjectRef<'_>>) -> Vec<&'static str> {
    objs.into_iter().map(|o| o.id().as_str()).collect()
}

fn branch_label<'d>((line, label): (ObjectRef<'d>, ObjectRef<'d>)) -> (&'d str, &'static str) {
    (label.text().unwrap_or_default(), line.id().as_str())
}

#[test]
fn find_start_by_text() {
    let d = flow();
    let expr = first(all(has_text("Start")));
    assert_eq!(run(expr.eval(d.objects())), vec![Some(d.objects().get("O0").unwrap())]);

    let missing = first(all(has_text("Nowhere")));
    assert_eq!(run(missing.eval(d.objects())), vec![None]);
}

#[test]
fn successors_follow_line_heads() {
    let d = flow();
    let next = outbound_lines(line_connected_to(identity()));
    let start = d.objects().get("O0").unwrap();
    let decision = d.objects().get("O1").unwrap();
    assert_eq!(ids(run(next.eval(start))), vec!["O1"]);
    assert_eq!(ids(run(next.eval(decision))), vec!["O2", "O3"]);
}

#[test]
fn two_hops_back_from_end() {
    let d = flow();
    let end = d.objects().get("O4").unwrap();
    let expr = inbound_lines(line_connected_from(inbound_lines(line_connected_from(
        identity(),
    ))));
    assert_eq!(ids(run(expr.eval(end))), vec!["O1", "O1"]);

    let typed = inbound_lines(line_connected_from(inbound_lines(line_connected_from(
        has_type("Flowchart - Terminal"),
    ))));
    assert!(run(typed.eval(end)).is_empty());
}

#[test]
fn branch_labels_pair_with_their_lines() {
    let d = flow();
    let decision = d.objects().get("O1").unwrap();
    let expr = map(
        outbound_lines(combine(connected_to_this(has_type("Standard - Text")))),
        branch_label,
    );
    assert_eq!(run(expr.eval(decision)), vec![("yes", "O6"), ("no", "O7")]);
}

#[test]
fn all_over_collected_inputs() {
    let d = flow();
    let tasks: Vec<ObjectRef<'_>> = d
        .objects()
        .iter()
        .filter(|o| o.type_name() == "Flowchart - Box")
        .collect();
    let expr = all(outbound_lines(line_connected_to(identity())));
    assert_eq!(ids(run(expr.eval(tasks))), vec!["O4", "O4"]);
}

#[test]
fn one_expression_many_diagrams() {
    let a = flow();
    let b = flow();
    let expr = first(all(has_type("Flowchart - Decision")));
    let in_a = run(expr.eval(a.objects()));
    let in_b = run(expr.eval(b.objects()));
    assert_eq!(in_a.len(), 1);
    assert_eq!(in_b.len(), 1);
    assert_ne!(in_a, in_b);
    assert_eq!(in_a[0].map(|o| o.id()), in_b[0].map(|o| o.id()));
}
