//! USDB Algo AST - Core types for the abstract syntax tree
//!
//! This crate defines the closed set of AST node types shared by the parser,
//! the semantic analyzer, the C code generator and the flowchart lowering,
//! together with source locations and spans.

mod span;
mod types;
mod expr;
mod stmt;
mod decl;
mod printer;

pub use span::*;
pub use types::*;
pub use expr::*;
pub use stmt::*;
pub use decl::*;
pub use printer::*;

use serde::{Deserialize, Serialize};

/// A complete USDB Algo program: `ALGORITHM name ... BEGIN ... END.`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub name: String,
    pub constants: Vec<ConstDeclaration>,
    pub types: Vec<TypeDeclaration>,
    pub variables: Vec<VarDeclaration>,
    pub functions: Vec<FunctionDeclaration>,
    pub procedures: Vec<ProcedureDeclaration>,
    pub body: Vec<Statement>,
    pub span: Span,
}

impl Program {
    /// Every routine, functions first then procedures
    pub fn routines(&self) -> impl Iterator<Item = Routine<'_>> {
        self.functions
            .iter()
            .map(Routine::Function)
            .chain(self.procedures.iter().map(Routine::Procedure))
    }

    /// Find a routine by name, ignoring case
    pub fn find_routine(&self, name: &str) -> Option<Routine<'_>> {
        self.routines().find(|r| r.name().eq_ignore_ascii_case(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_function(name: &str) -> FunctionDeclaration {
        FunctionDeclaration {
            name: name.to_string(),
            parameters: vec![],
            return_type: TypeExpression::Primitive(PrimitiveType::Integer),
            constants: vec![],
            types: vec![],
            variables: vec![],
            body: vec![],
            span: Span::dummy(),
        }
    }

    #[test]
    fn test_routines_lists_functions_before_procedures() {
        let program = Program {
            name: "T".to_string(),
            constants: vec![],
            types: vec![],
            variables: vec![],
            functions: vec![empty_function("Square")],
            procedures: vec![ProcedureDeclaration {
                name: "Show".to_string(),
                parameters: vec![],
                constants: vec![],
                types: vec![],
                variables: vec![],
                body: vec![],
                span: Span::dummy(),
            }],
            body: vec![],
            span: Span::dummy(),
        };

        let names: Vec<_> = program.routines().map(|r| r.name().to_string()).collect();
        assert_eq!(names, vec!["Square", "Show"]);
        assert!(program.find_routine("square").is_some());
        assert!(program.find_routine("SHOW").unwrap().is_procedure());
        assert!(program.find_routine("missing").is_none());
    }

    #[test]
    fn test_program_serializes_to_json() {
        let program = Program {
            name: "T".to_string(),
            constants: vec![],
            types: vec![],
            variables: vec![],
            functions: vec![],
            procedures: vec![],
            body: vec![],
            span: Span::dummy(),
        };
        let json = serde_json::to_string(&program).unwrap();
        assert!(json.contains("\"name\":\"T\""));
    }
}
