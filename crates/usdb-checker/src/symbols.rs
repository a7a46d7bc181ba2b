//! Symbol table for name resolution
//!
//! A stack of scopes, each holding value symbols and type names. Keys are
//! lower-cased; the symbol keeps the name as written.

use std::collections::HashMap;

use usdb_ast::Literal;

use crate::SymbolType;

/// A symbol definition
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    /// Name with its declared casing
    pub name: String,
    pub ty: SymbolType,
    pub is_constant: bool,
    pub constant_value: Option<Literal>,
    pub by_reference: bool,
}

impl Symbol {
    pub fn variable(name: impl Into<String>, ty: SymbolType) -> Self {
        Self {
            name: name.into(),
            ty,
            is_constant: false,
            constant_value: None,
            by_reference: false,
        }
    }

    pub fn constant(name: impl Into<String>, ty: SymbolType, value: Literal) -> Self {
        Self {
            name: name.into(),
            ty,
            is_constant: true,
            constant_value: Some(value),
            by_reference: false,
        }
    }

    pub fn parameter(name: impl Into<String>, ty: SymbolType, by_reference: bool) -> Self {
        Self {
            name: name.into(),
            ty,
            is_constant: false,
            constant_value: None,
            by_reference,
        }
    }
}

/// A scope in the symbol table
#[derive(Debug, Default)]
struct Scope {
    symbols: HashMap<String, Symbol>,
    types: HashMap<String, SymbolType>,
}

/// Symbol table mapping names to their definitions
#[derive(Debug)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    /// A table with one (outermost) scope
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::default()],
        }
    }

    /// Enter a new scope
    pub fn enter_scope(&mut self) {
        self.scopes.push(Scope::default());
    }

    /// Exit the current scope; the outermost scope is never popped
    pub fn exit_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Define a symbol in the innermost scope.
    /// Returns the existing symbol if the name is already taken there.
    pub fn define(&mut self, symbol: Symbol) -> Result<(), Symbol> {
        let key = symbol.name.to_lowercase();
        let scope = self.current_scope();
        if let Some(existing) = scope.symbols.get(&key) {
            return Err(existing.clone());
        }
        scope.symbols.insert(key, symbol);
        Ok(())
    }

    /// Look up a symbol, innermost scope first
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        let key = name.to_lowercase();
        self.scopes.iter().rev().find_map(|scope| scope.symbols.get(&key))
    }

    pub fn lookup_local(&self, name: &str) -> Option<&Symbol> {
        self.scopes.last().and_then(|scope| scope.symbols.get(&name.to_lowercase()))
    }

    /// Register a named type in the innermost scope; false if already declared there
    pub fn define_type(&mut self, name: &str, ty: SymbolType) -> bool {
        let key = name.to_lowercase();
        let scope = self.current_scope();
        if scope.types.contains_key(&key) {
            return false;
        }
        scope.types.insert(key, ty);
        true
    }

    pub fn lookup_type(&self, name: &str) -> Option<&SymbolType> {
        let key = name.to_lowercase();
        self.scopes.iter().rev().find_map(|scope| scope.types.get(&key))
    }

    fn current_scope(&mut self) -> &mut Scope {
        if self.scopes.is_empty() {
            self.scopes.push(Scope::default());
        }
        let last = self.scopes.len() - 1;
        &mut self.scopes[last]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        let mut table = SymbolTable::new();
        table.define(Symbol::variable("Count", SymbolType::Integer)).unwrap();
        let symbol = table.lookup("COUNT").expect("found");
        assert_eq!(symbol.name, "Count");
    }

    #[test]
    fn test_inner_scope_shadows_and_pops() {
        let mut table = SymbolTable::new();
        table.define(Symbol::variable("x", SymbolType::Integer)).unwrap();

        table.enter_scope();
        table.define(Symbol::variable("x", SymbolType::Real)).unwrap();
        assert_eq!(table.lookup("x").map(|s| &s.ty), Some(&SymbolType::Real));
        table.exit_scope();

        assert_eq!(table.lookup("x").map(|s| &s.ty), Some(&SymbolType::Integer));
    }

    #[test]
    fn test_duplicate_in_same_scope() {
        let mut table = SymbolTable::new();
        table.define(Symbol::variable("x", SymbolType::Integer)).unwrap();
        let existing = table.define(Symbol::variable("X", SymbolType::Real)).unwrap_err();
        assert_eq!(existing.ty, SymbolType::Integer);
    }

    #[test]
    fn test_outer_symbols_visible_from_inner_scope() {
        let mut table = SymbolTable::new();
        table
            .define(Symbol::constant("N", SymbolType::Integer, Literal::Integer(5)))
            .unwrap();
        table.enter_scope();
        assert!(table.lookup("n").is_some_and(|s| s.is_constant));
        assert!(table.lookup_local("n").is_none());
    }

    #[test]
    fn test_outermost_scope_survives_exit() {
        let mut table = SymbolTable::new();
        table.exit_scope();
        assert_eq!(table.depth(), 1);
        assert!(table.define_type("Point", SymbolType::Unknown));
        assert!(!table.define_type("point", SymbolType::Unknown));
        assert!(table.lookup_type("POINT").is_some());
    }
}
