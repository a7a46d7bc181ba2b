//! C to USDB Algo Translator
//!
//! Translates the small, teaching-sized subset of C that Algo can express:
//! scalar, string, array, struct and enum declarations, functions, control
//! flow and console I/O. The translation is line oriented and heuristic.
//! Anything outside the subset is kept as an Algo `//` comment and reported
//! as a warning instead of failing the whole file.
//!
//! Every Algo line records the C line it came from so editors can map
//! between the two views.

mod decl;
mod expr;
mod io;
mod source;
mod translator;

use std::collections::HashMap;

use serde::Serialize;
use thiserror::Error;

use source::{expand_includes, fragment, strip_comments};
use translator::Translator;

/// Problems that make a translation incomplete
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TranslationError {
    #[error("no main function and no routines found")]
    NothingToTranslate,

    #[error("Line {line}: '}}' without a matching '{{'")]
    UnbalancedBrace { line: usize },

    #[error("Line {line}: body of '{name}' is never closed")]
    UnclosedBody { name: String, line: usize },
}

/// Result of translating one C file
#[derive(Debug, Clone, Serialize)]
pub struct TranslationResult {
    pub success: bool,
    pub algo_code: String,
    /// `Line N: message`, in source order
    pub warnings: Vec<String>,
    pub errors: Vec<TranslationError>,
    /// 1-based C line of each Algo line, `-1` for lines with no C origin
    pub source_map: Vec<i64>,
}

impl TranslationResult {
    /// C line of a 1-based Algo line
    pub fn c_line(&self, algo_line: usize) -> Option<usize> {
        let entry = *self.source_map.get(algo_line.checked_sub(1)?)?;
        usize::try_from(entry).ok()
    }
}

/// Translate C source to Algo.
///
/// `files` holds the other files of the workspace by name; local
/// `#include "..."` directives are resolved against it.
pub fn translate_c_to_algo(
    c_code: &str,
    files: Option<&HashMap<String, String>>,
) -> TranslationResult {
    let mut warnings = Vec::new();
    let lines = expand_includes(c_code, files, &mut warnings);
    let fragments = fragment(&strip_comments(&lines));
    log::debug!(
        "translating {} lines as {} fragments",
        lines.len(),
        fragments.len()
    );

    let translation = Translator::new(warnings).run(&fragments);

    let mut algo_code = String::new();
    let mut source_map = Vec::with_capacity(translation.lines.len());
    for line in &translation.lines {
        algo_code.push_str(&line.text);
        algo_code.push('\n');
        source_map.push(line.source.map_or(-1, |source| source as i64));
    }

    log::debug!(
        "translation produced {} Algo lines, {} warnings",
        source_map.len(),
        translation.warnings.len()
    );

    TranslationResult {
        success: translation.has_program,
        algo_code,
        warnings: translation.warnings,
        errors: translation.errors,
        source_map,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn translate(c: &str) -> TranslationResult {
        translate_c_to_algo(c, None)
    }

    fn algo_lines(result: &TranslationResult) -> Vec<&str> {
        result.algo_code.lines().map(str::trim).collect()
    }

    #[test]
    fn test_add_function() {
        let result = translate(
            "int add(int a, int b) { return a + b; }\nint main() {\n    printf(\"%d\\n\", add(2, 3));\n    return 0;\n}\n",
        );
        assert!(result.success);
        assert!(result.algo_code.contains("FUNCTION add(a : INTEGER; b : INTEGER) : INTEGER"));
        assert!(result.algo_code.contains("PRINT(add(2, 3))"));
        assert_eq!(result.source_map.len(), result.algo_code.lines().count());

        let return_line = result
            .algo_code
            .lines()
            .position(|line| line.trim() == "RETURN a + b")
            .expect("RETURN line");
        assert_eq!(result.source_map[return_line], 1);
    }

    #[test]
    fn test_procedure_with_reference_parameter() {
        let result = translate("void bump(int *n) {\n    *n = *n + 1;\n}\nint main() { return 0; }");
        assert!(result.algo_code.contains("PROCEDURE bump(VAR n : INTEGER)"));
        assert!(result.algo_code.contains("n <- n + 1"));
    }

    #[test]
    fn test_main_locals_become_program_variables() {
        let result = translate("int main() {\n    int i, total = 0;\n    double avg;\n    return 0;\n}");
        let lines = algo_lines(&result);
        let var = lines.iter().position(|l| *l == "VAR").expect("VAR section");
        assert_eq!(lines[var + 1], "i : INTEGER");
        assert_eq!(lines[var + 2], "total : INTEGER");
        assert_eq!(lines[var + 3], "avg : REAL");
        assert!(lines.contains(&"total <- 0"));
    }

    #[test]
    fn test_if_else_chain() {
        let result = translate(
            "int main() {\n int x = 1;\n if (x > 0) printf(\"pos\\n\");\n else if (x < 0) { printf(\"neg\\n\"); }\n else printf(\"zero\\n\");\n}",
        );
        let lines = algo_lines(&result);
        let expected = [
            "IF (x > 0) THEN",
            "BEGIN",
            "PRINT(\"pos\")",
            "END",
            "ELSE IF (x < 0) THEN",
            "BEGIN",
            "PRINT(\"neg\")",
            "END",
            "ELSE",
            "BEGIN",
            "PRINT(\"zero\")",
            "END",
        ];
        let start = lines.iter().position(|l| *l == expected[0]).expect("IF line");
        assert_eq!(&lines[start..start + expected.len()], &expected);
    }

    #[test]
    fn test_counted_and_uncounted_for() {
        let result = translate(
            "int main() {\n int i, n = 5;\n for (i = 0; i < n; i++) printf(\"%d\", i);\n for (i = 1; i < 100; i *= 2) { printf(\"%d\", i); }\n}",
        );
        let lines = algo_lines(&result);
        assert!(lines.contains(&"FOR i <- 0 TO n - 1 DO"));

        let while_line = lines.iter().position(|l| *l == "WHILE (i < 100) DO").expect("WHILE");
        assert_eq!(lines[while_line - 1], "i <- 1");
        assert_eq!(lines[while_line + 2], "PRINT(i)");
        assert_eq!(lines[while_line + 3], "i <- i * 2");
        assert_eq!(lines[while_line + 4], "END");
    }

    #[test]
    fn test_do_while() {
        let result = translate("int main() {\n int n = 3;\n do {\n n--;\n } while (n > 0);\n}");
        let lines = algo_lines(&result);
        let start = lines.iter().position(|l| *l == "DO").expect("DO");
        assert_eq!(
            &lines[start..start + 5],
            &["DO", "BEGIN", "n <- n - 1", "END", "WHILE (n > 0)"]
        );
    }

    #[test]
    fn test_switch_merges_labels_and_drops_break() {
        let result = translate(
            "int main() {\n int d = 2;\n switch (d) {\n case 1:\n case 2: printf(\"low\\n\"); break;\n default: printf(\"high\\n\");\n }\n}",
        );
        let lines = algo_lines(&result);
        let start = lines.iter().position(|l| *l == "SWITCH d OF").expect("SWITCH");
        assert_eq!(
            &lines[start..start + 6],
            &["SWITCH d OF", "CASE 1, 2:", "PRINT(\"low\")", "DEFAULT:", "PRINT(\"high\")", "END"]
        );
        assert!(result.warnings.is_empty(), "{:?}", result.warnings);
    }

    #[test]
    fn test_defines_structs_and_enums() {
        let result = translate(
            "#include <stdio.h>\n#define MAX 10\n#define SQR(x) ((x) * (x))\ntypedef struct {\n  char name[20];\n  int age;\n} Person;\nenum Color { RED, GREEN };\nint main() { Person p; return 0; }",
        );
        let lines = algo_lines(&result);
        assert!(lines.contains(&"MAX = 10"));
        assert!(lines.contains(&"Person = STRUCTURE"));
        assert!(lines.contains(&"name : STRING"));
        assert!(lines.contains(&"Color = (RED, GREEN)"));
        assert!(lines.contains(&"p : Person"));
        assert!(result.warnings.iter().any(|w| w.contains("SQR")));
    }

    #[test]
    fn test_brace_initializers() {
        let result = translate(
            "typedef struct { int x; int y; } Point;\nint main() {\n int a[] = {4, 5};\n Point p = {1, 2};\n}",
        );
        let lines = algo_lines(&result);
        assert!(lines.contains(&"a : ARRAY[2] OF INTEGER"));
        assert!(lines.contains(&"a[0] <- 4"));
        assert!(lines.contains(&"a[1] <- 5"));
        assert!(lines.contains(&"p.x <- 1"));
        assert!(lines.contains(&"p.y <- 2"));
    }

    #[test]
    fn test_unsupported_constructs_become_comments() {
        let result = translate("int main() {\n int x = 1;\n int *p = &x;\n x = x > 0 ? 1 : 2;\n goto done;\n}");
        assert!(result.success);
        assert!(result.algo_code.contains("// int *p = &x"));
        assert!(result.algo_code.contains("// x = x > 0 ? 1 : 2;"));
        assert!(result.algo_code.contains("// goto done;"));
        assert_eq!(result.warnings.len(), 3);
    }

    #[test]
    fn test_nothing_to_translate() {
        let result = translate("#include <stdio.h>\nint counter;\n");
        assert!(!result.success);
        assert_eq!(result.errors, vec![TranslationError::NothingToTranslate]);
        assert_eq!(result.source_map.len(), result.algo_code.lines().count());
    }

    #[test]
    fn test_unclosed_body_is_reported() {
        let result = translate("int main() {\n  int x = 1;\n  if (x) {\n    x = 2;\n");
        assert!(result.success);
        assert!(matches!(
            result.errors.as_slice(),
            [TranslationError::UnclosedBody { line: 1, .. }]
        ));
        assert!(result.algo_code.trim_end().ends_with("END."));
    }

    #[test]
    fn test_include_from_workspace() {
        let mut files = HashMap::new();
        files.insert(
            "math_utils.h".to_string(),
            "int square(int x);".to_string(),
        );
        files.insert(
            "math_utils.c".to_string(),
            "int square(int x) {\n  return x * x;\n}".to_string(),
        );
        let result = translate_c_to_algo(
            "#include \"math_utils.h\"\nint main() {\n  printf(\"%d\\n\", square(4));\n}",
            Some(&files),
        );
        assert!(result.algo_code.contains("FUNCTION square(x : INTEGER) : INTEGER"));
        let function = result
            .algo_code
            .lines()
            .position(|l| l.starts_with("FUNCTION square"))
            .expect("FUNCTION line");
        assert_eq!(result.source_map[function], 1);
        assert_eq!(result.c_line(function + 1), Some(1));
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            TranslationError::UnbalancedBrace { line: 4 }.to_string(),
            "Line 4: '}' without a matching '{'"
        );
    }
}
