//! USDB Codegen - C99 code generation
//!
//! Lowers a checked Algo program to a single self-contained C translation
//! unit. Generation state lives in an explicit [`GenContext`] threaded through
//! every emitter.

mod context;
mod emit;
mod expr;
mod format;
mod types;

pub use context::*;
pub use expr::generate_expression;

use usdb_ast::{Program, Span};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodegenError {
    #[error("unsupported construct: {construct}")]
    Unsupported { construct: String, span: Span },
}

/// Knobs for the generated C
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodegenOptions {
    /// Capacity of `STRING` variables, terminator included
    pub string_length: usize,
    /// Emit the leading `/* ... */` banner
    pub emit_header: bool,
}

impl Default for CodegenOptions {
    fn default() -> Self {
        Self {
            string_length: 256,
            emit_header: true,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CodegenOutput {
    pub code: String,
    pub errors: Vec<CodegenError>,
}

impl CodegenOutput {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Generate C with default options
pub fn generate(program: &Program) -> CodegenOutput {
    generate_with(program, &CodegenOptions::default())
}

pub fn generate_with(program: &Program, options: &CodegenOptions) -> CodegenOutput {
    let mut ctx = GenContext::new(program, options);
    emit::emit_program(&mut ctx, program);
    let code = ctx.finish();
    log::debug!(
        "generated {} lines of C for '{}'",
        code.lines().count(),
        program.name
    );
    CodegenOutput {
        code,
        errors: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c_code(source: &str) -> String {
        let output = usdb_parser::parse(source);
        let program = output
            .ast
            .unwrap_or_else(|| panic!("parse failed: {:?}", output.errors));
        generate(&program).code
    }

    #[test]
    fn test_minimal_program() {
        let code = c_code("ALGORITHM T\nVAR x : INTEGER\nBEGIN\nx <- 5\nPRINT(x)\nEND.");
        assert!(code.contains("int x;"));
        assert!(code.contains("x = 5;"));
        assert!(code.contains("printf(\"%d\\n\", x);"));
        assert_eq!(code.matches("int main(").count(), 1);
        assert!(code.trim_end().ends_with('}'));
    }

    #[test]
    fn test_includes_and_header() {
        let code = c_code("ALGORITHM Demo\nBEGIN\nEND.");
        assert!(code.starts_with("/* Demo"));
        for header in ["stdio.h", "stdlib.h", "string.h", "math.h", "stdbool.h"] {
            assert!(code.contains(&format!("#include <{}>", header)), "{}", header);
        }
    }

    #[test]
    fn test_header_can_be_disabled() {
        let program = usdb_parser::parse("ALGORITHM Demo\nBEGIN\nEND.").ast.expect("program");
        let options = CodegenOptions {
            emit_header: false,
            string_length: 64,
        };
        let code = generate_with(&program, &options).code;
        assert!(code.starts_with("#include <stdio.h>"));
    }

    #[test]
    fn test_constants_become_defines() {
        let code = c_code(
            "ALGORITHM T\nCONST N = 10; NEG = -3; PI = 3.14; GREETING = \"hi\"; YES = TRUE\nBEGIN\nEND.",
        );
        assert!(code.contains("#define N 10"));
        assert!(code.contains("#define NEG (-3)"));
        assert!(code.contains("#define PI 3.14"));
        assert!(code.contains("#define GREETING \"hi\""));
        assert!(code.contains("#define YES true"));
    }

    #[test]
    fn test_string_assignment_uses_strcpy() {
        let code = c_code("ALGORITHM T\nVAR s : STRING\nBEGIN\ns <- \"hello\"\nEND.");
        assert!(code.contains("char s[256];"));
        assert!(code.contains("strcpy(s, \"hello\");"));
    }

    #[test]
    fn test_else_if_chain() {
        let code = c_code(
            "ALGORITHM T\nVAR x : INTEGER\nBEGIN\nIF x > 0 THEN PRINT(1) ELSE IF x < 0 THEN PRINT(2) ELSE PRINT(3)\nEND.",
        );
        assert!(code.contains("if (x > 0) {"));
        assert!(code.contains("} else if (x < 0) {"));
        assert!(code.contains("} else {"));
    }

    #[test]
    fn test_for_loop_lowering() {
        let code = c_code(
            "ALGORITHM T\nVAR i : INTEGER\nBEGIN\nFOR i <- 1 TO 10 DO PRINT(i)\nFOR i <- 10 TO 1 STEP -1 DO PRINT(i)\nEND.",
        );
        assert!(code.contains("for (i = 1; i <= 10; i += 1) {"));
        assert!(code.contains("for (i = 10; i >= 1; i += -1) {"));
    }

    #[test]
    fn test_switch_breaks_after_every_arm() {
        let code = c_code(
            "ALGORITHM T\nVAR x : INTEGER\nBEGIN\nSWITCH x OF\nCASE 1, 2: PRINT(\"low\")\nCASE 3: PRINT(\"three\")\nDEFAULT: PRINT(\"other\")\nEND\nEND.",
        );
        assert!(code.contains("switch (x) {"));
        assert!(code.contains("case 1:\n"));
        assert!(code.contains("case 2:\n"));
        assert!(code.contains("default:"));
        assert_eq!(code.matches("break;").count(), 3);
    }

    #[test]
    fn test_var_parameter_is_dereferenced() {
        let code = c_code(
            "ALGORITHM T\nVAR a : INTEGER\nPROCEDURE inc(VAR n : INTEGER)\nBEGIN\nn <- n + 1\nEND\nBEGIN\ninc(a)\nEND.",
        );
        assert!(code.contains("void inc(int *n);"));
        assert!(code.contains("(*n) = (*n) + 1;"));
        // No implicit address-of at the call site
        assert!(code.contains("inc(a);"));
    }

    #[test]
    fn test_function_definition_and_return() {
        let code = c_code(
            "ALGORITHM T\nFUNCTION square(x : REAL) : REAL\nBEGIN\nRETURN x * x\nEND\nBEGIN\nPRINT(square(2.0))\nEND.",
        );
        assert!(code.contains("double square(double x);"));
        assert!(code.contains("double square(double x) {"));
        assert!(code.contains("return x * x;"));
    }

    #[test]
    fn test_return_in_main_exits_zero() {
        let code = c_code("ALGORITHM T\nBEGIN\nRETURN\nEND.");
        let main = &code[code.find("int main(").expect("main")..];
        assert_eq!(main.matches("return 0;").count(), 2);
    }
}
