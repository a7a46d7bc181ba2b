//! USDB Algo Semantic Checker
//!
//! Resolves names through a scoped symbol table, infers expression types and
//! reports errors and warnings. Analysis never stops early: every problem in
//! the program is reported in one pass.

mod checker;
mod error;
mod symbols;
mod types;

pub use checker::*;
pub use error::*;
pub use symbols::*;
pub use types::*;

use usdb_ast::Program;

/// Everything analysis found, errors and warnings interleaved in source order
#[derive(Debug, Clone, Default)]
pub struct AnalysisResult {
    pub diagnostics: Vec<SemanticError>,
}

impl AnalysisResult {
    pub fn errors(&self) -> impl Iterator<Item = &SemanticError> {
        self.diagnostics.iter().filter(|d| d.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &SemanticError> {
        self.diagnostics.iter().filter(|d| d.severity == Severity::Warning)
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }
}

/// Check a program
pub fn analyze(program: &Program) -> AnalysisResult {
    let diagnostics = Checker::new().check_program(program);
    log::debug!(
        "analyzed '{}': {} diagnostics",
        program.name,
        diagnostics.len()
    );
    AnalysisResult { diagnostics }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyze_source(source: &str) -> AnalysisResult {
        let output = usdb_parser::parse(source);
        let program = output.ast.unwrap_or_else(|| panic!("parse failed: {:?}", output.errors));
        analyze(&program)
    }

    fn error_messages(result: &AnalysisResult) -> Vec<String> {
        result.errors().map(|e| e.message.clone()).collect()
    }

    #[test]
    fn test_valid_program_is_clean() {
        let result = analyze_source("ALGORITHM T\nVAR x : INTEGER\nBEGIN\n x <- 5\n PRINT(x)\nEND.");
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
    }

    #[test]
    fn test_undefined_variable() {
        let result = analyze_source("ALGORITHM T\nBEGIN\n y <- 5\nEND.");
        assert_eq!(error_messages(&result), vec!["Undefined variable 'y'"]);
        let error = result.errors().next().expect("error");
        assert_eq!(error.location().line, 3);
    }

    #[test]
    fn test_assign_to_constant() {
        let result = analyze_source("ALGORITHM T\nCONST N = 5\nBEGIN\n N <- 6\nEND.");
        assert_eq!(error_messages(&result), vec!["Cannot assign to constant 'N'"]);
    }

    #[test]
    fn test_errors_are_collected() {
        let result = analyze_source("ALGORITHM T\nBEGIN\n a <- 1\n b <- c + 1\n PRINT(d)\nEND.");
        assert_eq!(result.errors().count(), 4);
    }

    #[test]
    fn test_builtins_are_known() {
        let result = analyze_source(
            "ALGORITHM T\nVAR r : REAL; n : INTEGER; s : STRING\nBEGIN\n r <- sqrt(2) + abs(-1.5)\n n <- length(s)\nEND.",
        );
        assert!(!result.has_errors(), "{:?}", result.diagnostics);
    }

    #[test]
    fn test_forward_and_recursive_calls() {
        let result = analyze_source(
            "ALGORITHM T
FUNCTION isEven(n : INTEGER) : BOOLEAN
BEGIN
  IF n = 0 THEN RETURN TRUE
  RETURN isOdd(n - 1)
END
FUNCTION isOdd(n : INTEGER) : BOOLEAN
BEGIN
  IF n = 0 THEN RETURN FALSE
  RETURN isEven(n - 1)
END
BEGIN
  PRINT(isEven(4))
END.",
        );
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
    }

    #[test]
    fn test_locals_do_not_leak() {
        let result = analyze_source(
            "ALGORITHM T\nPROCEDURE p\nVAR local : INTEGER\nBEGIN\n local <- 1\nEND\nBEGIN\n local <- 2\nEND.",
        );
        assert_eq!(error_messages(&result), vec!["Undefined variable 'local'"]);
    }

    #[test]
    fn test_case_insensitive_names() {
        let result = analyze_source("ALGORITHM T\nVAR Total : INTEGER\nBEGIN\n TOTAL <- 1\n total <- Total + 1\nEND.");
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
    }

    #[test]
    fn test_unknown_field() {
        let result = analyze_source(
            "ALGORITHM T\nTYPE Point = STRUCTURE x, y : REAL END\nVAR p : Point; n : INTEGER\nBEGIN\n p.z <- 1\n n.x <- 2\nEND.",
        );
        let messages = error_messages(&result);
        assert_eq!(messages.len(), 2);
        assert!(messages.iter().all(|m| m.starts_with("Unknown field")));
    }

    #[test]
    fn test_array_element_type() {
        let result = analyze_source(
            "ALGORITHM T\nVAR a : ARRAY[10] OF BOOLEAN; n : INTEGER\nBEGIN\n n <- a[1]\nEND.",
        );
        assert_eq!(result.errors().count(), 1);
        assert!(error_messages(&result)[0].contains("cannot assign boolean"));
    }

    #[test]
    fn test_real_into_integer_is_warning() {
        let result = analyze_source("ALGORITHM T\nVAR n : INTEGER\nBEGIN\n n <- 2.5\nEND.");
        assert!(!result.has_errors());
        assert_eq!(result.warnings().count(), 1);
    }

    #[test]
    fn test_duplicate_declaration() {
        let result = analyze_source("ALGORITHM T\nVAR x : INTEGER\nVAR X : REAL\nBEGIN\nEND.");
        assert_eq!(error_messages(&result), vec!["Duplicate declaration of 'X'"]);
    }

    #[test]
    fn test_argument_count_and_reference() {
        let result = analyze_source(
            "ALGORITHM T
VAR x : INTEGER
PROCEDURE swap(VAR a, b : INTEGER)
VAR t : INTEGER
BEGIN
  t <- a; a <- b; b <- t
END
BEGIN
  swap(x)
  swap(x, 1 + 2)
END.",
        );
        let messages = error_messages(&result);
        assert_eq!(messages.len(), 2, "{:?}", messages);
        assert!(messages[0].contains("expects 2 argument(s), found 1"));
        assert!(messages[1].contains("passed by reference"));
    }

    #[test]
    fn test_function_without_return_warns() {
        let result = analyze_source(
            "ALGORITHM T\nFUNCTION f() : INTEGER\nBEGIN\nEND\nBEGIN\n PRINT(f())\nEND.",
        );
        assert!(!result.has_errors());
        assert!(result.warnings().any(|w| w.message.contains("no RETURN")));
    }

    #[test]
    fn test_procedure_in_expression() {
        let result = analyze_source(
            "ALGORITHM T\nVAR x : INTEGER\nPROCEDURE p\nBEGIN\nEND\nBEGIN\n x <- p()\nEND.",
        );
        assert!(error_messages(&result)[0].contains("cannot be used in an expression"));
    }

    #[test]
    fn test_scan_into_constant() {
        let result = analyze_source("ALGORITHM T\nCONST N = 1\nBEGIN\n SCAN(N)\nEND.");
        assert_eq!(error_messages(&result), vec!["Cannot read into constant 'N'"]);
    }

    #[test]
    fn test_enumeration_values_are_constants() {
        let result = analyze_source(
            "ALGORITHM T\nTYPE Color = (Red, Green)\nVAR c : Color\nBEGIN\n c <- Green\n Red <- c\nEND.",
        );
        assert_eq!(error_messages(&result), vec!["Cannot assign to constant 'Red'"]);
    }

    #[test]
    fn test_unknown_type() {
        let result = analyze_source("ALGORITHM T\nVAR p : Missing\nBEGIN\nEND.");
        assert_eq!(error_messages(&result), vec!["Unknown type 'Missing'"]);
    }

    #[test]
    fn test_non_boolean_condition_warns() {
        let result = analyze_source("ALGORITHM T\nVAR x : INTEGER\nBEGIN\n WHILE x DO x <- x - 1\nEND.");
        assert!(!result.has_errors());
        assert_eq!(result.warnings().count(), 1);
    }
}
