//! Integration tests for generated C

use usdb_codegen::{generate, generate_with, CodegenOptions};
use usdb_parser::parse;

fn compile_to_c(source: &str) -> String {
    let output = parse(source);
    let program = output.ast.expect("parse failed");
    generate(&program).code
}

fn position(code: &str, needle: &str) -> usize {
    code.find(needle)
        .unwrap_or_else(|| panic!("'{}' not found in:\n{}", needle, code))
}

// === Layout ===

#[test]
fn test_section_order() {
    let code = compile_to_c(
        r#"ALGORITHM Order
CONST MAX = 5
TYPE Point = STRUCTURE
  x, y : INTEGER
END
VAR p : Point; total : INTEGER
FUNCTION twice(n : INTEGER) : INTEGER
BEGIN
  RETURN n * 2
END
PROCEDURE show(n : INTEGER)
BEGIN
  PRINT(n)
END
BEGIN
  total <- twice(MAX)
  show(total)
END."#,
    );

    let typedef = position(&code, "typedef struct {");
    let define = position(&code, "#define MAX 5");
    let global = position(&code, "Point p;");
    let proto_fn = position(&code, "int twice(int n);");
    let proto_proc = position(&code, "void show(int n);");
    let def_fn = position(&code, "int twice(int n) {");
    let def_proc = position(&code, "void show(int n) {");
    let main = position(&code, "int main(void) {");

    assert!(typedef < define);
    assert!(define < global);
    assert!(global < proto_fn);
    assert!(proto_fn < proto_proc);
    assert!(proto_proc < def_fn);
    assert!(def_fn < def_proc);
    assert!(def_proc < main);
}

#[test]
fn test_structure_typedef_fields() {
    let code = compile_to_c(
        r#"ALGORITHM T
TYPE Person = STRUCTURE
  name : STRING
  age : INTEGER
END
VAR who : Person
BEGIN
  who.age <- 30
  PRINT(who.name)
END."#,
    );
    assert!(code.contains("typedef struct {\n    char name[256];\n    int age;\n} Person;"));
    assert!(code.contains("who.age = 30;"));
}

#[test]
fn test_enumeration_typedef() {
    let code = compile_to_c(
        r#"ALGORITHM T
TYPE Color = (Red, Green, Blue)
VAR c : Color
BEGIN
  c <- Green
END."#,
    );
    assert!(code.contains("typedef enum { Red, Green, Blue } Color;"));
    assert!(code.contains("Color c;"));
    assert!(code.contains("c = Green;"));
}

#[test]
fn test_string_length_option() {
    let program = parse("ALGORITHM T\nVAR s : STRING\nBEGIN\nEND.")
        .ast
        .expect("parse failed");
    let options = CodegenOptions {
        string_length: 32,
        ..CodegenOptions::default()
    };
    let code = generate_with(&program, &options).code;
    assert!(code.contains("char s[32];"));
}

// === Statements ===

#[test]
fn test_scan_formats_and_address_of() {
    let code = compile_to_c(
        r#"ALGORITHM T
VAR n : INTEGER; r : REAL; c : CHAR; s : STRING
BEGIN
  SCAN(n, r, c, s)
END."#,
    );
    assert!(code.contains("scanf(\"%d%lf %c%s\", &n, &r, &c, &s);"));
}

#[test]
fn test_print_mixed_arguments() {
    let code = compile_to_c(
        r#"ALGORITHM T
VAR x : REAL
BEGIN
  PRINT("x = ", x)
  PRINT()
END."#,
    );
    assert!(code.contains("printf(\"%s%f\\n\", \"x = \", x);"));
    assert!(code.contains("printf(\"\\n\");"));
}

#[test]
fn test_while_and_do_while() {
    let code = compile_to_c(
        r#"ALGORITHM T
VAR i : INTEGER
BEGIN
  WHILE (i < 10) DO
  BEGIN
    i <- i + 1
  END
  DO i <- i - 1 WHILE i > 0
END."#,
    );
    assert!(code.contains("while (i < 10) {\n        i = i + 1;\n    }"));
    assert!(code.contains("do {\n        i = i - 1;\n    } while (i > 0);"));
}

#[test]
fn test_power_and_real_division() {
    let code = compile_to_c(
        r#"ALGORITHM T
VAR a, b : REAL
BEGIN
  a <- b ^ 2 / 4.0
END."#,
    );
    assert!(code.contains("a = pow(b, 2) / 4.0;"));
}

#[test]
fn test_array_indexing_keeps_algo_indices() {
    let code = compile_to_c(
        r#"ALGORITHM T
VAR grid : ARRAY[3, 3] OF INTEGER; i : INTEGER
BEGIN
  FOR i <- 1 TO 3 DO grid[i, i] <- 1
END."#,
    );
    assert!(code.contains("int grid[4][4];"));
    assert!(code.contains("grid[i][i] = 1;"));
}

#[test]
fn test_local_declarations_in_routine() {
    let code = compile_to_c(
        r#"ALGORITHM T
FUNCTION sum(n : INTEGER) : INTEGER
CONST START = 1
VAR i, acc : INTEGER
BEGIN
  acc <- 0
  FOR i <- START TO n DO acc <- acc + i
  RETURN acc
END
BEGIN
  PRINT(sum(4))
END."#,
    );
    assert!(code.contains("    const int START = 1;"));
    assert!(code.contains("    int i;\n    int acc;"));
    assert!(code.contains("return acc;"));
}

#[test]
fn test_case_insensitive_names_use_declared_spelling() {
    let code = compile_to_c(
        r#"ALGORITHM T
VAR Count : INTEGER
BEGIN
  COUNT <- 1
  PRINT(count)
END."#,
    );
    assert!(code.contains("int Count;"));
    assert!(code.contains("Count = 1;"));
    assert!(code.contains("printf(\"%d\\n\", Count);"));
}

#[test]
fn test_generation_is_deterministic() {
    let source = "ALGORITHM T\nVAR x : INTEGER\nBEGIN\nx <- 1\nEND.";
    assert_eq!(compile_to_c(source), compile_to_c(source));
}

#[test]
fn test_library_names_are_suffixed() {
    let code = compile_to_c(
        r#"ALGORITHM T
VAR exit : INTEGER; log : REAL
BEGIN
  exit <- 1
  log <- ln(log)
END."#,
    );
    assert!(code.contains("int exit_;"));
    assert!(code.contains("double log_;"));
    assert!(code.contains("exit_ = 1;"));
    assert!(code.contains("log_ = log(log_);"));
}

#[test]
fn test_huge_array_bound_does_not_overflow() {
    let code = compile_to_c(
        "ALGORITHM T\nVAR a : ARRAY[9223372036854775807] OF INTEGER\nBEGIN\nEND.",
    );
    assert!(code.contains("a[9223372036854775807 + 1]"));
}
