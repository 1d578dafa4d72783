// tests/compile_tests.rs

use std::collections::HashSet;

use astrolabe::{
    Bound, CompileError, Evaluator, Script, ValidationError, compile, parse,
    sql::{NODES, RELATIONS, WAYS},
};
use proptest::prelude::*;

const SESSION: &str = "t1";

fn compile_ok(text: &str) -> Script {
    compile(text, SESSION).unwrap_or_else(|e| panic!("`{}` failed: {}", text, e))
}

fn validation_error(text: &str) -> ValidationError {
    match compile(text, SESSION) {
        Err(CompileError::Validation(e)) => e,
        other => panic!("`{}`: expected validation error, got {:?}", text, other),
    }
}

/// View names created by a script, in creation order
fn created_views(script: &Script) -> Vec<String> {
    script
        .statements()
        .iter()
        .filter_map(|s| s.strip_prefix("CREATE VIEW \""))
        .map(|rest| rest.split('"').next().unwrap_or_default().to_string())
        .collect()
}

// ============================================================================
// Script shape
// ============================================================================

#[test]
fn test_output_alone_reads_base_tables() {
    let script = compile_ok("output()");
    assert_eq!(script.len(), 1);
    let query = &script.statements()[0];
    assert!(query.contains(&format!("FROM \"{}\"", NODES)));
    assert!(query.contains(&format!("FROM \"{}\"", WAYS)));
    assert!(query.contains(&format!("FROM \"{}\"", RELATIONS)));
}

#[test]
fn test_full_range_bbox_script() {
    let script = compile_ok("nodes().bbox(-90,-180,90,180).output()");
    assert_eq!(script.len(), 7);
    assert_eq!(script.session(), SESSION);

    let statements = script.statements();
    assert_eq!(
        statements[0],
        format!("CREATE VIEW \"_astro_t1_0001_nodes_nodes\" AS SELECT * FROM \"{}\"", NODES)
    );
    assert_eq!(
        statements[1],
        format!("CREATE VIEW \"_astro_t1_0001_ways_nodes\" AS SELECT * FROM \"{}\" WHERE FALSE", WAYS)
    );
    assert!(statements[3].starts_with("CREATE VIEW \"_astro_t1_0002_nodes_bbox\""));
    assert!(statements[3].contains("FROM \"_astro_t1_0001_nodes_nodes\""));
    assert!(statements[3].contains("lat BETWEEN (-90) AND 90 AND lon BETWEEN (-180) AND 180"));

    let query = &statements[6];
    assert!(query.starts_with("SELECT 'node' AS type, id, lat, lon"));
    assert!(query.contains("FROM \"_astro_t1_0002_nodes_bbox\""));
    assert!(query.contains("'way' AS type"));
    assert!(query.contains("FROM \"_astro_t1_0002_ways_bbox\""));
    assert!(query.contains("'relation' AS type"));
    assert!(query.contains("FROM \"_astro_t1_0002_relations_bbox\""));
}

#[test]
fn test_bbox_ways_and_relations_follow_filtered_nodes() {
    let script = compile_ok("bbox(51.4, -0.2, 51.6, 0).output()");
    let statements = script.statements();
    assert_eq!(statements.len(), 4);
    assert!(statements[0].contains("lat BETWEEN 51.4 AND 51.6 AND lon BETWEEN (-0.2) AND 0"));
    assert!(statements[1].contains("way_constituent_nodes"));
    assert!(statements[1].contains("SELECT id FROM \"_astro_t1_0001_nodes_bbox\""));
    assert!(statements[2].contains("relation_constituent_nodes"));
    assert!(statements[2].contains("relation_constituent_ways"));
    assert!(statements[2].contains("SELECT id FROM \"_astro_t1_0001_ways_bbox\""));
}

#[test]
fn test_inverted_box_compiles() {
    let script = compile_ok("bbox(10, 10, -10, -10).output()");
    assert!(script.statements()[0].contains("lat BETWEEN 10 AND (-10)"));
}

#[test]
fn test_script_renders_as_sql_text() {
    let script = compile_ok("ways().output()");
    let text = script.to_sql();
    assert_eq!(text.matches(";\n").count(), 4);
    assert!(text.ends_with(";\n"));
}

#[test]
fn test_compilation_is_deterministic() {
    let text = "relations().bbox(0, 0, 1, 1).output()";
    assert_eq!(compile_ok(text), compile_ok(text));
}

#[test]
fn test_view_names_unique_within_session() {
    let script = compile_ok("nodes().ways().relations().bbox(0,0,1,1).nodes().output()");
    let views = created_views(&script);
    assert_eq!(views.len(), 15);
    let unique: HashSet<_> = views.iter().collect();
    assert_eq!(unique.len(), views.len());
}

#[test]
fn test_sessions_keep_names_apart() {
    let a = created_views(&compile("nodes().output()", "alpha").unwrap());
    let b = created_views(&compile("nodes().output()", "beta").unwrap());
    assert!(a.iter().all(|name| !b.contains(name)));
}

#[test]
fn test_evaluator_reuse_continues_counter() {
    let program = parse("nodes().output()").unwrap();
    let mut evaluator = Evaluator::new(SESSION).unwrap();
    let first = created_views(&evaluator.compile(&program).unwrap());
    let second = created_views(&evaluator.compile(&program).unwrap());
    assert!(first.iter().all(|name| !second.contains(name)));
}

// ============================================================================
// bbox validation
// ============================================================================

#[test]
fn test_southern_bound_out_of_range() {
    let err = validation_error("bbox(-95,0,10,10).output()");
    assert!(matches!(err, ValidationError::OutOfRange { bound: Bound::South, .. }));
    assert!(err.to_string().contains("southern"), "{}", err);
}

#[test]
fn test_bounds_checked_in_argument_order() {
    let cases = [
        ("bbox(91, 181, 91, 181)", Bound::South),
        ("bbox(0, 181, 91, 181)", Bound::West),
        ("bbox(0, 0, -91, 181)", Bound::North),
        ("bbox(0, 0, 0, -180.5)", Bound::East),
    ];
    for (call, expected) in cases {
        let err = validation_error(&format!("{}.output()", call));
        match err {
            ValidationError::OutOfRange { bound, .. } => assert_eq!(bound, expected, "{}", call),
            other => panic!("{}: unexpected {:?}", call, other),
        }
    }
}

#[test]
fn test_bbox_edges_are_inclusive() {
    compile_ok("bbox(-90, -180, 90, 180).output()");
    compile_ok("bbox(90, 180, -90, -180).output()");
}

#[test]
fn test_bbox_arity() {
    assert_eq!(
        validation_error("bbox(1, 2, 3).output()"),
        ValidationError::Arity {
            method: "bbox",
            expected: 4,
            found: 3,
        }
    );
    assert!(matches!(
        validation_error("bbox().output()"),
        ValidationError::Arity { found: 0, .. }
    ));
}

#[test]
fn test_bbox_rejects_non_numbers() {
    assert_eq!(
        validation_error("bbox(1, 2, 3, 4km).output()"),
        ValidationError::ArgumentType {
            method: "bbox",
            position: 4,
            expected: "number",
            found: "distance",
        }
    );
    assert!(matches!(
        validation_error("bbox('a', 2, 3, 4).output()"),
        ValidationError::ArgumentType { position: 1, found: "string", .. }
    ));
}

#[test]
fn test_type_checked_before_range() {
    // Position 1 is out of range, position 2 has the wrong type
    assert!(matches!(
        validation_error("bbox(500, 'x', 0, 0).output()"),
        ValidationError::ArgumentType { position: 2, .. }
    ));
}

#[test]
fn test_nested_call_rejected_as_argument() {
    assert!(matches!(
        validation_error("bbox(nodes(), 0, 1, 1).output()"),
        ValidationError::ArgumentType {
            position: 1,
            found: "method call",
            ..
        }
    ));
    assert!(matches!(
        validation_error("nodes(ways()).output()"),
        ValidationError::Arity { method: "nodes", .. }
    ));
}

#[test]
fn test_nested_call_errors_surface_first() {
    assert_eq!(
        validation_error("bbox(nope(), 0, 1, 1).output()"),
        ValidationError::UnknownMethod("nope".into())
    );
}

// ============================================================================
// Chain validation
// ============================================================================

#[test]
fn test_unknown_method() {
    assert_eq!(
        validation_error("nodes().around(5km).output()"),
        ValidationError::UnknownMethod("around".into())
    );
}

#[test]
fn test_missing_output() {
    assert_eq!(validation_error("nodes().bbox(0,0,1,1)"), ValidationError::MissingOutput);
}

#[test]
fn test_call_after_output() {
    assert_eq!(
        validation_error("output().nodes()"),
        ValidationError::CallAfterOutput { method: "nodes".into() }
    );
    assert!(matches!(
        validation_error("nodes().output().output()"),
        ValidationError::CallAfterOutput { .. }
    ));
}

#[test]
fn test_keep_methods_take_no_arguments() {
    for name in ["nodes", "ways", "relations", "output"] {
        let err = validation_error(&format!("{}(1).output()", name));
        assert!(matches!(err, ValidationError::Arity { expected: 0, found: 1, .. }), "{}", name);
    }
}

#[test]
fn test_invalid_session() {
    for session in ["", "Upper", "has-dash", "seventeenchars000"] {
        assert!(matches!(
            compile("output()", session),
            Err(CompileError::Validation(ValidationError::InvalidSession(_)))
        ), "{:?}", session);
    }
}

#[test]
fn test_syntax_error_is_distinct() {
    assert!(matches!(compile("nodes(", SESSION), Err(CompileError::Syntax(_))));
}

// ============================================================================
// Properties
// ============================================================================

fn arb_chain() -> impl Strategy<Value = Vec<&'static str>> {
    prop::collection::vec(
        prop_oneof![
            Just("nodes()"),
            Just("ways()"),
            Just("relations()"),
            Just("bbox(-1.5, 2, 3.25, 4)"),
        ],
        0..12,
    )
}

proptest! {
    /// Every in-range box compiles, whatever the order of its edges
    #[test]
    fn valid_boxes_compile(
        south in -90.0f64..=90.0,
        west in -180.0f64..=180.0,
        north in -90.0f64..=90.0,
        east in -180.0f64..=180.0,
    ) {
        let text = format!("bbox({}, {}, {}, {}).output()", south, west, north, east);
        let script = compile(&text, SESSION);
        prop_assert!(script.is_ok(), "{}: {:?}", text, script);
    }

    /// Latitudes beyond the poles are always rejected
    #[test]
    fn out_of_range_latitude_rejected(excess in 0.001f64..1000.0) {
        let text = format!("bbox({}, 0, 0, 0).output()", 90.0 + excess);
        let rejected = matches!(
            compile(&text, SESSION),
            Err(CompileError::Validation(ValidationError::OutOfRange { bound: Bound::South, .. }))
        );
        prop_assert!(rejected);
    }

    /// Each call creates exactly three fresh views, none reused
    #[test]
    fn views_are_fresh(chain in arb_chain()) {
        let mut calls = chain.clone();
        calls.push("output()");
        let script = compile(&calls.join("."), SESSION).unwrap();

        let views = created_views(&script);
        prop_assert_eq!(views.len(), chain.len() * 3);
        prop_assert_eq!(script.len(), chain.len() * 3 + 1);
        let unique: HashSet<_> = views.iter().collect();
        prop_assert_eq!(unique.len(), views.len());
    }
}
