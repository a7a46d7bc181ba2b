//! USDB Driver - runs the compiler phases in order
//!
//! Lexing, parsing, semantic analysis and C generation run one after the
//! other. The first phase that reports a blocking error ends the run, and
//! only that phase's diagnostics are returned. Semantic warnings never
//! block.

mod error;

pub use error::*;

use serde::Serialize;
use usdb_ast::Program;
use usdb_codegen::CodegenOptions;

/// Result of compiling one source text
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompileOutput {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub c_code: Option<String>,
    pub errors: Vec<CompilerError>,
    pub warnings: Vec<CompilerError>,
}

impl CompileOutput {
    fn failed(errors: Vec<CompilerError>, warnings: Vec<CompilerError>) -> Self {
        Self {
            success: false,
            c_code: None,
            errors,
            warnings,
        }
    }

    /// Errors then warnings
    pub fn diagnostics(&self) -> impl Iterator<Item = &CompilerError> {
        self.errors.iter().chain(self.warnings.iter())
    }
}

/// Compile Algo source to C with default options
pub fn compile(source: &str) -> CompileOutput {
    compile_with(source, &CodegenOptions::default())
}

pub fn compile_with(source: &str, options: &CodegenOptions) -> CompileOutput {
    let mut warnings = Vec::new();
    let program = match front_end(source, &mut warnings) {
        Ok(program) => program,
        Err(errors) => return CompileOutput::failed(errors, warnings),
    };

    let generated = usdb_codegen::generate_with(&program, options);
    if !generated.is_ok() {
        let errors: Vec<CompilerError> = generated.errors.iter().map(CompilerError::from).collect();
        log::debug!("codegen failed with {} errors", errors.len());
        return CompileOutput::failed(errors, warnings);
    }

    CompileOutput {
        success: true,
        c_code: Some(generated.code),
        errors: Vec::new(),
        warnings,
    }
}

/// Lex, parse and analyze without generating code
pub fn check(source: &str) -> CompileOutput {
    let mut warnings = Vec::new();
    match front_end(source, &mut warnings) {
        Ok(_) => CompileOutput {
            success: true,
            c_code: None,
            errors: Vec::new(),
            warnings,
        },
        Err(errors) => CompileOutput::failed(errors, warnings),
    }
}

/// Everything up to a checked AST. Semantic warnings are pushed to
/// `warnings` whether or not analysis succeeds.
pub fn front_end(source: &str, warnings: &mut Vec<CompilerError>) -> Result<Program, Vec<CompilerError>> {
    let lexed = usdb_lexer::tokenize(source);
    if lexed.has_errors() {
        log::debug!("lexer reported {} errors", lexed.errors.len());
        return Err(lexed.errors.iter().map(CompilerError::from).collect());
    }
    log::trace!("lexer produced {} tokens", lexed.tokens.len());

    let parsed = usdb_parser::parse_tokens(lexed.tokens);
    let program = match parsed.ast {
        Some(program) if parsed.errors.is_empty() => program,
        _ => {
            log::debug!("parser reported {} errors", parsed.errors.len());
            return Err(parsed.errors.iter().map(CompilerError::from).collect());
        }
    };

    let analysis = usdb_checker::analyze(&program);
    warnings.extend(analysis.warnings().map(CompilerError::from));
    if analysis.has_errors() {
        let errors: Vec<CompilerError> = analysis.errors().map(CompilerError::from).collect();
        log::debug!("semantic analysis reported {} errors", errors.len());
        return Err(errors);
    }
    log::debug!(
        "'{}' checked: {} routines, {} warnings",
        program.name,
        program.routines().count(),
        warnings.len()
    );
    Ok(program)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_program() {
        let output = compile("ALGORITHM T\nVAR x : INTEGER\nBEGIN\n  x <- 5\n  PRINT(x)\nEND.\n");
        assert!(output.success, "{:?}", output.errors);
        let code = output.c_code.expect("C code");
        assert!(code.contains("int x;"));
        assert!(code.contains("x = 5;"));
        assert!(code.contains("printf(\"%d\\n\", x);"));
    }

    #[test]
    fn test_lexer_errors_stop_the_run() {
        let output = compile("ALGORITHM T\nBEGIN\n  PRINT(\"open)\nEND.\n");
        assert!(!output.success);
        assert!(output.c_code.is_none());
        assert!(output.errors.iter().all(|e| e.phase == Phase::Lexer));
    }

    #[test]
    fn test_parser_error_is_single() {
        let output = compile("ALGORITHM T\nVAR x : INTEGER\nBEGIN\n  x <- \nEND.\n");
        assert!(!output.success);
        assert_eq!(output.errors.len(), 1);
        assert_eq!(output.errors[0].phase, Phase::Parser);
        assert_eq!(output.errors[0].location.line, 5);
    }

    #[test]
    fn test_semantic_errors_block_codegen() {
        let output = compile("ALGORITHM T\nVAR x : INTEGER\nBEGIN\n  x <- y\nEND.\n");
        assert!(!output.success);
        assert!(output.c_code.is_none());
        assert!(output.errors.iter().all(|e| e.phase == Phase::Semantic && e.is_error()));
        assert!(output.errors.iter().any(|e| e.message.contains("'y'")));
    }

    #[test]
    fn test_check_skips_codegen() {
        let output = check("ALGORITHM T\nBEGIN\n  PRINT(1)\nEND.\n");
        assert!(output.success);
        assert!(output.c_code.is_none());
    }

    #[test]
    fn test_compile_is_idempotent() {
        let source = "ALGORITHM T\nVAR i : INTEGER\nBEGIN\n  FOR i <- 1 TO 3 DO PRINT(i)\nEND.\n";
        assert_eq!(compile(source), compile(source));
    }
}
