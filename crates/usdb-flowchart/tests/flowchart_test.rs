//! Whole-program flowchart and layout checks

use usdb_flowchart::{generate_all_flowcharts, layout, Language, NodeKind};

const PROGRAM: &str = r#"ALGORITHM Grades
CONST
    N = 3
VAR
    marks : ARRAY[N] OF INTEGER
    i, total : INTEGER

PROCEDURE Report(sum : INTEGER)
BEGIN
    IF sum >= 30 THEN
        PRINT("pass")
    ELSE
        PRINT("fail")
END

BEGIN
    total <- 0
    FOR i <- 1 TO N DO
    BEGIN
        SCAN(marks[i])
        total <- total + marks[i]
    END
    Report(total)
END.
"#;

#[test]
fn test_every_node_is_reachable_and_reaches_end() {
    let output = generate_all_flowcharts(PROGRAM, Language::Algo);
    assert!(output.success, "{:?}", output.error);

    let main = output.main.as_ref().expect("main");
    let charts = std::iter::once(main).chain(output.subroutines.values());
    for set in charts {
        assert_eq!(set.nodes_of(NodeKind::Start).count(), 1);
        assert_eq!(set.nodes_of(NodeKind::End).count(), 1);
        for node in &set.nodes {
            if node.kind != NodeKind::Start {
                assert!(set.incoming(node.id).count() > 0, "{} has no way in", node.label);
            }
            if node.kind != NodeKind::End {
                assert!(set.outgoing(node.id).count() > 0, "{} has no way out", node.label);
            }
        }
    }
}

#[test]
fn test_layout_places_loop_body_below_head() {
    let output = generate_all_flowcharts(PROGRAM, Language::Algo);
    let main = output.main.expect("main");
    let layout = layout(&main);
    assert_eq!(layout.cells.len(), main.nodes.len());

    let head = main.nodes_of(NodeKind::Loop).next().expect("loop").id;
    let scan = main
        .nodes
        .iter()
        .find(|n| n.label == "SCAN(marks[i])")
        .expect("scan");
    let head_rank = layout.cell(head).map(|c| c.rank);
    let scan_rank = layout.cell(scan.id).map(|c| c.rank);
    assert!(scan_rank > head_rank);

    let call = main.nodes_of(NodeKind::Call).next().expect("call");
    assert_eq!(call.target.as_deref(), Some("Report"));
    let end = main.end().expect("end").id;
    assert!(layout.cell(end).map(|c| c.rank) > layout.cell(call.id).map(|c| c.rank));
}

#[test]
fn test_layout_serializes_for_the_diagram_host() {
    let output = generate_all_flowcharts(PROGRAM, Language::Algo);
    let report = &output.subroutines["Report"];
    let json = serde_json::to_value(layout(report)).expect("serializable");
    assert_eq!(json["cells"][0]["rank"], 0);
    assert!(json["width"].as_f64().expect("width") > 0.0);
}
