//! Generation state threaded through every emitter

use std::collections::{HashMap, HashSet};

use usdb_ast::{PrimitiveType, Program, Routine, TypeDeclaration, TypeExpression, VarDeclaration};

use crate::CodegenOptions;

/// C keywords and library names an Algo identifier must not take over
const C_RESERVED: &[&str] = &[
    "EOF", "NULL", "abort", "abs", "acos", "asin", "atan", "atan2", "atof", "atoi", "atol", "auto",
    "bool", "break", "bsearch", "calloc", "case", "ceil", "char", "const", "continue", "cos",
    "cosh", "default", "div", "do", "double", "else", "enum", "errno", "exit", "exp", "extern",
    "fabs", "false", "fclose", "feof", "ferror", "fgets", "float", "floor", "fmax", "fmin", "fmod",
    "fopen", "for", "fprintf", "fputs", "free", "fscanf", "getchar", "getenv", "gets", "goto",
    "if", "inline", "int", "labs", "log", "log10", "log2", "long", "main", "malloc", "memcmp",
    "memcpy", "memmove", "memset", "pow", "printf", "putchar", "puts", "qsort", "rand", "realloc",
    "register", "remove", "rename", "restrict", "return", "round", "scanf", "short", "signed",
    "sin", "sinh", "sizeof", "snprintf", "sprintf", "sqrt", "srand", "sscanf", "static", "stderr",
    "stdin", "stdout", "strcat", "strchr", "strcmp", "strcpy", "strlen", "strncat", "strncmp",
    "strncpy", "strstr", "struct", "switch", "system", "tan", "tanh", "true", "trunc", "typedef",
    "union", "unsigned", "void", "volatile", "while",
];

/// What the generator knows about a declared routine
#[derive(Debug, Clone)]
pub struct RoutineInfo {
    pub name: String,
    pub is_function: bool,
}

/// Output buffer, indentation, declared types and name casing.
///
/// Algo names are case-insensitive while C names are not, so every use of a
/// name is emitted with the casing of its declaration.
pub struct GenContext<'a> {
    pub options: &'a CodegenOptions,
    output: String,
    indent: usize,
    /// lowercase name -> primitive type of globals and constants
    type_map: HashMap<String, PrimitiveType>,
    /// Locals and parameters of the routine being emitted; `None` hides a global
    local_types: HashMap<String, Option<PrimitiveType>>,
    /// lowercase name -> declared spelling
    names: HashMap<String, String>,
    local_names: HashMap<String, String>,
    /// Named types, for seeing through aliases
    type_decls: HashMap<String, TypeExpression>,
    /// Pointer parameters of the current routine
    ref_params: HashSet<String>,
    routines: HashMap<String, RoutineInfo>,
    in_main: bool,
    in_function: bool,
}

impl<'a> GenContext<'a> {
    pub fn new(program: &Program, options: &'a CodegenOptions) -> Self {
        let mut ctx = Self {
            options,
            output: String::new(),
            indent: 0,
            type_map: HashMap::new(),
            local_types: HashMap::new(),
            names: HashMap::new(),
            local_names: HashMap::new(),
            type_decls: HashMap::new(),
            ref_params: HashSet::new(),
            routines: HashMap::new(),
            in_main: false,
            in_function: false,
        };

        for routine in program.routines() {
            ctx.names.insert(routine.name().to_lowercase(), routine.name().to_string());
            ctx.routines.insert(
                routine.name().to_lowercase(),
                RoutineInfo {
                    name: routine.name().to_string(),
                    is_function: !routine.is_procedure(),
                },
            );
        }
        ctx.register_types(&program.types, false);
        for constant in &program.constants {
            ctx.names.insert(constant.name.to_lowercase(), constant.name.clone());
            if let Some(ty) = crate::types::literal_primitive(&constant.value) {
                ctx.type_map.insert(constant.name.to_lowercase(), ty);
            }
        }
        ctx
    }

    // === Output ===

    pub fn write(&mut self, s: &str) {
        self.output.push_str(s);
    }

    pub fn writeln(&mut self, s: &str) {
        if !s.is_empty() {
            for _ in 0..self.indent {
                self.output.push_str("    ");
            }
        }
        self.output.push_str(s);
        self.output.push('\n');
    }

    pub fn indent(&mut self) {
        self.indent += 1;
    }

    pub fn dedent(&mut self) {
        self.indent = self.indent.saturating_sub(1);
    }

    pub fn finish(self) -> String {
        self.output
    }

    // === Declarations ===

    /// Names of type declarations, enum values and structure fields
    pub fn register_types(&mut self, types: &[TypeDeclaration], local: bool) {
        for decl in types {
            self.declare_name(&decl.name, local);
            self.type_decls.insert(decl.name.to_lowercase(), decl.definition.clone());
            self.register_type_names(&decl.definition, local);
        }
    }

    fn register_type_names(&mut self, ty: &TypeExpression, local: bool) {
        match ty {
            TypeExpression::Enumeration { values } => {
                for value in values {
                    self.declare_name(value, local);
                    self.record_type(value, Some(PrimitiveType::Integer), local);
                }
            }
            TypeExpression::Structure { fields } => {
                // Field names share one table; C needs a single spelling per field
                for field in fields {
                    for name in &field.names {
                        self.names
                            .entry(name.to_lowercase())
                            .or_insert_with(|| name.clone());
                    }
                    self.register_type_names(&field.var_type, local);
                }
            }
            TypeExpression::Array { element_type, .. } => {
                self.register_type_names(element_type, local)
            }
            TypeExpression::Primitive(_) | TypeExpression::Reference { .. } => {}
        }
    }

    /// Record variables, registering their primitive type for format inference
    pub fn register_variables(&mut self, variables: &[VarDeclaration], local: bool) {
        for decl in variables {
            let primitive = self.primitive_of(&decl.var_type);
            self.register_type_names(&decl.var_type, local);
            for name in &decl.names {
                self.declare_name(name, local);
                self.record_type(name, primitive, local);
            }
        }
    }

    pub fn declare_name(&mut self, name: &str, local: bool) {
        let table = if local { &mut self.local_names } else { &mut self.names };
        table.insert(name.to_lowercase(), name.to_string());
    }

    pub fn record_type(&mut self, name: &str, ty: Option<PrimitiveType>, local: bool) {
        if local {
            self.local_types.insert(name.to_lowercase(), ty);
        } else if let Some(ty) = ty {
            self.type_map.insert(name.to_lowercase(), ty);
        }
    }

    /// Enter a routine: parameters, local types and variables become visible
    pub fn enter_routine(&mut self, routine: Routine<'_>) {
        self.leave_routine();
        self.in_function = !routine.is_procedure();
        for param in routine.parameters() {
            self.declare_name(&param.name, true);
            let primitive = self.primitive_of(&param.param_type);
            self.record_type(&param.name, primitive, true);
            if param.by_reference && !self.is_pointer_like(&param.param_type) {
                self.ref_params.insert(param.name.to_lowercase());
            }
        }
        self.register_types(routine.types(), true);
        for constant in routine.constants() {
            self.declare_name(&constant.name, true);
            self.record_type(
                &constant.name,
                crate::types::literal_primitive(&constant.value),
                true,
            );
        }
        self.register_variables(routine.variables(), true);
    }

    pub fn leave_routine(&mut self) {
        self.in_function = false;
        self.local_types.clear();
        self.local_names.clear();
        self.ref_params.clear();
    }

    pub fn set_in_main(&mut self, in_main: bool) {
        self.in_main = in_main;
    }

    pub fn in_main(&self) -> bool {
        self.in_main
    }

    /// Inside a FUNCTION body, where RETURN carries a value
    pub fn in_function(&self) -> bool {
        self.in_function
    }

    // === Queries ===

    /// Primitive type of a declared variable, locals first
    pub fn lookup_type(&self, name: &str) -> Option<PrimitiveType> {
        let key = name.to_lowercase();
        match self.local_types.get(&key) {
            Some(ty) => *ty,
            None => self.type_map.get(&key).copied(),
        }
    }

    pub fn is_ref_param(&self, name: &str) -> bool {
        self.ref_params.contains(&name.to_lowercase())
    }

    pub fn routine(&self, name: &str) -> Option<&RoutineInfo> {
        let key = name.to_lowercase();
        if self.local_names.contains_key(&key) {
            return None;
        }
        self.routines.get(&key)
    }

    /// The C spelling of an Algo identifier
    pub fn c_name(&self, name: &str) -> String {
        let key = name.to_lowercase();
        let declared = self
            .local_names
            .get(&key)
            .or_else(|| self.names.get(&key))
            .map(String::as_str)
            .unwrap_or(name);
        if C_RESERVED.binary_search(&declared).is_ok() {
            format!("{}_", declared)
        } else {
            declared.to_string()
        }
    }

    /// Primitive behind a type, seeing through `TYPE` aliases
    pub fn primitive_of(&self, ty: &TypeExpression) -> Option<PrimitiveType> {
        self.resolve_alias(ty).primitive()
    }

    /// Strings and arrays are already pointers in C parameter position
    pub fn is_pointer_like(&self, ty: &TypeExpression) -> bool {
        matches!(
            self.resolve_alias(ty),
            TypeExpression::Primitive(PrimitiveType::String) | TypeExpression::Array { .. }
        )
    }

    fn resolve_alias<'t>(&'t self, ty: &'t TypeExpression) -> &'t TypeExpression {
        let mut current = ty;
        // Bounded so a cyclic alias cannot hang generation
        for _ in 0..16 {
            match current {
                TypeExpression::Reference { name } => match self.type_decls.get(&name.to_lowercase()) {
                    Some(next) => current = next,
                    None => return current,
                },
                _ => return current,
            }
        }
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_table_is_sorted() {
        let mut sorted = C_RESERVED.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, C_RESERVED);
    }

    #[test]
    fn test_c_name_uses_declared_casing() {
        let program = usdb_parser::parse("ALGORITHM T\nVAR Total, int : INTEGER\nBEGIN\nEND.")
            .ast
            .expect("program");
        let options = CodegenOptions::default();
        let mut ctx = GenContext::new(&program, &options);
        ctx.register_variables(&program.variables, false);
        assert_eq!(ctx.c_name("TOTAL"), "Total");
        assert_eq!(ctx.c_name("INT"), "int_");
        assert_eq!(ctx.lookup_type("total"), Some(PrimitiveType::Integer));
    }

    #[test]
    fn test_locals_hide_globals() {
        let program = usdb_parser::parse(
            "ALGORITHM T\nVAR x : REAL\nPROCEDURE p(VAR x : INTEGER; s : STRING)\nBEGIN\nEND\nBEGIN\nEND.",
        )
        .ast
        .expect("program");
        let options = CodegenOptions::default();
        let mut ctx = GenContext::new(&program, &options);
        ctx.register_variables(&program.variables, false);

        ctx.enter_routine(Routine::Procedure(&program.procedures[0]));
        assert_eq!(ctx.lookup_type("x"), Some(PrimitiveType::Integer));
        assert!(ctx.is_ref_param("X"));
        assert!(!ctx.is_ref_param("s"));

        ctx.leave_routine();
        assert_eq!(ctx.lookup_type("x"), Some(PrimitiveType::Real));
        assert!(!ctx.is_ref_param("x"));
    }
}
