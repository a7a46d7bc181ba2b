//! Integration tests for semantic error detection

use usdb_checker::{analyze, AnalysisResult, Severity};
use usdb_parser::parse;

fn check_source(source: &str) -> AnalysisResult {
    let output = parse(source);
    let program = output.ast.expect("parse failed");
    analyze(&program)
}

fn check_source_ok(source: &str) {
    let result = check_source(source);
    assert!(
        !result.has_errors(),
        "Expected check to succeed, got errors: {:?}",
        result.diagnostics
    );
}

// === Type Mismatch Tests ===

#[test]
fn test_return_type_mismatch() {
    let result = check_source(
        r#"ALGORITHM T
FUNCTION name() : INTEGER
BEGIN
  RETURN "not an int"
END
BEGIN
END."#,
    );
    let errors: Vec<_> = result.errors().collect();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("returns integer, found string"));
}

#[test]
fn test_integer_result_into_real_function() {
    check_source_ok(
        r#"ALGORITHM T
FUNCTION half(n : INTEGER) : REAL
BEGIN
  RETURN n / 2
END
BEGIN
  PRINT(half(3))
END."#,
    );
}

#[test]
fn test_boolean_into_integer_is_error() {
    let result = check_source(
        r#"ALGORITHM T
VAR n : INTEGER
BEGIN
  n <- 1 < 2
END."#,
    );
    assert_eq!(result.errors().count(), 1);
}

#[test]
fn test_arithmetic_on_boolean() {
    let result = check_source(
        r#"ALGORITHM T
VAR b : BOOLEAN
VAR n : INTEGER
BEGIN
  n <- b + 1
END."#,
    );
    assert!(result
        .errors()
        .any(|e| e.message.contains("requires numeric operands")));
}

// === Undefined Symbol Tests ===

#[test]
fn test_undefined_function() {
    let result = check_source(
        r#"ALGORITHM T
VAR x : INTEGER
BEGIN
  x <- missing(1)
END."#,
    );
    let messages: Vec<_> = result.errors().map(|e| e.message.as_str()).collect();
    assert_eq!(messages, vec!["Undefined function 'missing'"]);
}

#[test]
fn test_undefined_procedure() {
    let result = check_source(
        r#"ALGORITHM T
BEGIN
  draw(1, 2)
END."#,
    );
    let messages: Vec<_> = result.errors().map(|e| e.message.as_str()).collect();
    assert_eq!(messages, vec!["Undefined procedure 'draw'"]);
}

#[test]
fn test_undefined_inside_routine_does_not_stop_analysis() {
    let result = check_source(
        r#"ALGORITHM T
PROCEDURE p
BEGIN
  q <- 1
END
BEGIN
  r <- 2
END."#,
    );
    assert_eq!(result.errors().count(), 2);
}

// === Scope Tests ===

#[test]
fn test_parameters_visible_in_body() {
    check_source_ok(
        r#"ALGORITHM T
FUNCTION square(x : REAL) : REAL
BEGIN
  RETURN x * x
END
BEGIN
  PRINT(square(2.0))
END."#,
    );
}

#[test]
fn test_globals_visible_in_routines() {
    check_source_ok(
        r#"ALGORITHM T
CONST LIMIT = 10
VAR count : INTEGER
PROCEDURE bump
BEGIN
  IF count < LIMIT THEN count <- count + 1
END
BEGIN
  bump
END."#,
    );
}

#[test]
fn test_local_shadows_global() {
    check_source_ok(
        r#"ALGORITHM T
VAR x : BOOLEAN
PROCEDURE p
VAR x : INTEGER
BEGIN
  x <- 3
END
BEGIN
  x <- TRUE
END."#,
    );
}

// === Structure and Array Tests ===

#[test]
fn test_nested_structure_access() {
    check_source_ok(
        r#"ALGORITHM T
TYPE
  Point = STRUCTURE x, y : REAL END
  Shape = STRUCTURE
    corners : ARRAY[4] OF Point
    name : STRING
  END
VAR s : Shape
BEGIN
  s.corners[1].x <- 1.5
  s.name <- "square"
  PRINT(s.corners[2].y)
END."#,
    );
}

#[test]
fn test_multi_dimensional_array() {
    check_source_ok(
        r#"ALGORITHM T
VAR m : ARRAY[3, 3] OF INTEGER
VAR i, j : INTEGER
BEGIN
  FOR i <- 1 TO 3 DO
    FOR j <- 1 TO 3 DO
      m[i, j] <- i * j
END."#,
    );
}

#[test]
fn test_real_index_is_error() {
    let result = check_source(
        r#"ALGORITHM T
VAR a : ARRAY[5] OF INTEGER
BEGIN
  a[1.5] <- 0
END."#,
    );
    assert!(result.errors().any(|e| e.message.contains("Array index")));
}

// === Statement Tests ===

#[test]
fn test_switch_case_type() {
    let result = check_source(
        r#"ALGORITHM T
VAR n : INTEGER
BEGIN
  SWITCH n OF
    CASE 1: PRINT("one")
    CASE "two": PRINT("two")
  END
END."#,
    );
    assert_eq!(result.errors().count(), 1);
}

#[test]
fn test_for_requires_ordinal_variable() {
    let result = check_source(
        r#"ALGORITHM T
VAR r : REAL
BEGIN
  FOR r <- 1 TO 10 DO PRINT(r)
END."#,
    );
    assert!(result.errors().any(|e| e.message.contains("FOR loop variable")));
}

#[test]
fn test_return_value_in_procedure_warns() {
    let result = check_source(
        r#"ALGORITHM T
PROCEDURE p
BEGIN
  RETURN 1
END
BEGIN
END."#,
    );
    assert!(!result.has_errors());
    let warning = result.warnings().next().expect("a warning");
    assert_eq!(warning.severity, Severity::Warning);
    assert!(warning.message.contains("procedure 'p'"));
}

#[test]
fn test_function_called_as_statement_is_accepted() {
    check_source_ok(
        r#"ALGORITHM T
FUNCTION f(n : INTEGER) : INTEGER
BEGIN
  RETURN n
END
BEGIN
  f(1)
END."#,
    );
}

// === Declaration Tests ===

#[test]
fn test_unknown_parameter_type_reported_once() {
    let result = check_source(
        r#"ALGORITHM T
PROCEDURE P(a : Foo)
BEGIN
END
FUNCTION F(b : Bar) : Baz
BEGIN
  RETURN b
END
BEGIN
END."#,
    );
    let messages: Vec<_> = result.errors().map(|e| e.message.as_str()).collect();
    assert_eq!(
        messages,
        vec![
            "Unknown type 'Foo'",
            "Unknown type 'Bar'",
            "Unknown type 'Baz'"
        ]
    );
}

#[test]
fn test_array_size_out_of_range() {
    let result = check_source(
        r#"ALGORITHM T
VAR a : ARRAY[9223372036854775807] OF INTEGER
    b : ARRAY[0] OF INTEGER
    c : ARRAY[10] OF INTEGER
BEGIN
END."#,
    );
    let errors: Vec<_> = result.errors().collect();
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0].message, "Array size 9223372036854775807 is out of range");
    assert_eq!(errors[1].message, "Array size 0 is out of range");
    assert_eq!(errors[1].severity, Severity::Error);
}
