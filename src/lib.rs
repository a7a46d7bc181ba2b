//! USDB - Algo to C compiler, C to Algo translator and flowchart generator
//!
//! This is the root workspace crate that re-exports the three entry points
//! and holds the end-to-end tests. The implementation lives in the
//! workspace member crates.

pub use usdb_ast as ast;
pub use usdb_driver::{check, compile, compile_with, CompileOutput, CompilerError, Phase, Severity};
pub use usdb_flowchart::{generate_all_flowcharts, layout, FlowchartOutput, Language};
pub use usdb_translator::{translate_c_to_algo, TranslationResult};
pub use usdb_codegen::CodegenOptions;
