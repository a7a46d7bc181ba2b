//! C declarations: type prefixes, declarators and function signatures

use std::collections::HashMap;

use crate::expr::{algo_identifier, parenthesized, split_arguments, translate_expression, C_TYPE_WORDS};

/// A C base type reduced to what Algo can express
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum BaseType {
    Integer,
    Real,
    Char,
    Boolean,
    Void,
    /// A struct, enum or typedef name, already in its Algo spelling
    Named(String),
}

impl BaseType {
    pub fn algo(&self) -> &str {
        match self {
            BaseType::Integer => "INTEGER",
            BaseType::Real => "REAL",
            BaseType::Char => "CHAR",
            BaseType::Boolean => "BOOLEAN",
            BaseType::Void => "VOID",
            BaseType::Named(name) => name,
        }
    }
}

/// Type names introduced by the program: lowercase C name → Algo name
pub(crate) type KnownTypes = HashMap<String, String>;

/// Leading type words of a declaration
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TypePrefix<'t> {
    pub base: BaseType,
    pub is_const: bool,
    pub rest: &'t str,
}

/// Read the type words at the start of `text`.
///
/// Succeeds only when something declarator-like follows: an identifier or `*`.
pub(crate) fn type_prefix<'t>(text: &'t str, known: &KnownTypes) -> Option<TypePrefix<'t>> {
    let mut rest = text.trim_start();
    let mut words: Vec<&str> = Vec::new();
    let mut named: Option<String> = None;

    loop {
        let Some((word, after)) = leading_word(rest) else {
            break;
        };
        if C_TYPE_WORDS.contains(&word) {
            words.push(word);
            rest = after;
        } else if matches!(word, "struct" | "enum" | "union") && named.is_none() {
            let (tag, after_tag) = leading_word(after)?;
            named = Some(resolve_named(tag, known));
            rest = after_tag;
        } else if words.iter().all(|w| matches!(*w, "const" | "static")) && named.is_none() {
            match known.get(&word.to_lowercase()) {
                Some(algo) => {
                    named = Some(algo.clone());
                    rest = after;
                }
                None => break,
            }
        } else {
            break;
        }
    }

    let is_const = words.contains(&"const");
    let base = match named {
        Some(name) => BaseType::Named(name),
        None => base_from_words(&words)?,
    };

    let rest = rest.trim_start();
    let starts_declarator = rest.starts_with('*')
        || rest
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    starts_declarator.then_some(TypePrefix {
        base,
        is_const,
        rest,
    })
}

fn leading_word(text: &str) -> Option<(&str, &str)> {
    let text = text.trim_start();
    let end = text
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(text.len());
    if end == 0 || text.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    Some((&text[..end], &text[end..]))
}

fn resolve_named(tag: &str, known: &KnownTypes) -> String {
    known
        .get(&tag.to_lowercase())
        .cloned()
        .unwrap_or_else(|| algo_identifier(tag))
}

fn base_from_words(words: &[&str]) -> Option<BaseType> {
    let has = |w: &str| words.contains(&w);
    if has("double") || has("float") {
        Some(BaseType::Real)
    } else if has("char") {
        Some(BaseType::Char)
    } else if has("bool") || has("_Bool") {
        Some(BaseType::Boolean)
    } else if has("void") {
        Some(BaseType::Void)
    } else if ["int", "long", "short", "unsigned", "signed", "size_t"]
        .iter()
        .any(|w| has(w))
    {
        Some(BaseType::Integer)
    } else {
        None
    }
}

// === Declarators ===

/// One name of a declaration: `*p`, `grid[3][4]`, `n = 5`
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Declarator {
    pub pointers: usize,
    pub name: String,
    pub dimensions: Vec<String>,
    pub init: Option<String>,
}

impl Declarator {
    pub fn algo_name(&self) -> String {
        algo_identifier(&self.name)
    }
}

/// Split `a, *b, c[3] = {1, 2, 3}` into declarators
pub(crate) fn declarators(text: &str) -> Option<Vec<Declarator>> {
    let text = text.trim().trim_end_matches(';');
    split_arguments(text).iter().map(|part| declarator(part)).collect()
}

fn declarator(text: &str) -> Option<Declarator> {
    let mut rest = text.trim();
    let mut pointers = 0;
    while let Some(after) = rest.strip_prefix('*') {
        pointers += 1;
        rest = after.trim_start();
    }
    // `const` after the star: `char *const name`
    if let Some(after) = rest.strip_prefix("const ") {
        rest = after.trim_start();
    }
    let (name, after) = leading_word(rest)?;
    rest = after.trim_start();

    let mut dimensions = Vec::new();
    while let Some(after) = rest.strip_prefix('[') {
        let close = after.find(']')?;
        dimensions.push(after[..close].trim().to_string());
        rest = after[close + 1..].trim_start();
    }

    let init = match rest.strip_prefix('=') {
        Some(value) => Some(value.trim().to_string()),
        None if rest.is_empty() => None,
        None => return None,
    };

    Some(Declarator {
        pointers,
        name: name.to_string(),
        dimensions,
        init,
    })
}

/// Why a declaration has no Algo type
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Unsupported {
    Pointer,
    Void,
    UnsizedArray,
}

/// Algo type of one declarator.
///
/// `char *s` and `char s[N]` are strings; the last dimension of a char array
/// is its capacity. `fill` sizes an array left as `[]` by its initializer.
pub(crate) fn algo_type(
    base: &BaseType,
    decl: &Declarator,
    fill: Option<usize>,
) -> Result<String, Unsupported> {
    let mut dimensions: Vec<String> = decl.dimensions.clone();
    let element = match base {
        BaseType::Char if decl.pointers == 1 => "STRING".to_string(),
        BaseType::Char if !dimensions.is_empty() => {
            dimensions.pop();
            "STRING".to_string()
        }
        _ if decl.pointers > 0 => return Err(Unsupported::Pointer),
        BaseType::Void => return Err(Unsupported::Void),
        other => other.algo().to_string(),
    };
    if dimensions.is_empty() {
        return Ok(element);
    }

    let mut bounds = Vec::with_capacity(dimensions.len());
    for dimension in &dimensions {
        if dimension.is_empty() {
            match fill {
                Some(n) if bounds.is_empty() => bounds.push(n.to_string()),
                _ => return Err(Unsupported::UnsizedArray),
            }
        } else {
            bounds.push(translate_expression(dimension));
        }
    }
    Ok(format!("ARRAY[{}] OF {}", bounds.join(", "), element))
}

// === Signatures ===

/// `int add(int a, int b)` and friends
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Signature {
    pub return_type: BaseType,
    pub returns_pointer: bool,
    pub name: String,
    pub params: String,
    /// Ends in `;`: a prototype, not a definition
    pub is_prototype: bool,
}

pub(crate) fn signature(text: &str, known: &KnownTypes) -> Option<Signature> {
    let mut text = text.trim();
    let is_prototype = text.ends_with(';');
    text = text.trim_end_matches(';').trim_end();
    for qualifier in ["static ", "inline ", "extern "] {
        if let Some(after) = text.strip_prefix(qualifier) {
            text = after.trim_start();
        }
    }

    let prefix = type_prefix(text, known)?;
    let mut rest = prefix.rest;
    let mut returns_pointer = false;
    while let Some(after) = rest.strip_prefix('*') {
        returns_pointer = true;
        rest = after.trim_start();
    }
    let (name, after) = leading_word(rest)?;
    let (params, tail) = parenthesized(after)?;
    if !tail.is_empty() {
        return None;
    }

    Some(Signature {
        return_type: prefix.base,
        returns_pointer,
        name: name.to_string(),
        params: params.trim().to_string(),
        is_prototype,
    })
}

/// A routine parameter in Algo terms
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Param {
    pub name: String,
    pub algo_type: String,
    pub by_reference: bool,
}

/// Placeholder bound for `int a[]` parameters
pub(crate) const UNSIZED_PARAM_BOUND: usize = 100;

/// Parse a parameter list; unsupported parameters are reported by name
pub(crate) fn parameters(text: &str, known: &KnownTypes) -> (Vec<Param>, Vec<String>) {
    let mut params = Vec::new();
    let mut problems = Vec::new();
    if text.is_empty() || text == "void" {
        return (params, problems);
    }

    for part in split_arguments(text) {
        let Some(prefix) = type_prefix(&part, known) else {
            problems.push(format!("parameter '{}' has an unknown type", part));
            continue;
        };
        let Some(decl) = declarator(prefix.rest) else {
            problems.push(format!("parameter '{}' could not be read", part));
            continue;
        };

        let name = decl.algo_name();
        let is_string = prefix.base == BaseType::Char && (decl.pointers == 1 || !decl.dimensions.is_empty());
        let (algo_type, by_reference) = if is_string {
            let mut string_decl = decl.clone();
            if string_decl.dimensions.len() == 1 && string_decl.dimensions[0].is_empty() {
                string_decl.dimensions[0] = "1".to_string();
            }
            (algo_type(&prefix.base, &string_decl, None), false)
        } else if decl.pointers == 1 && decl.dimensions.is_empty() {
            // Out-parameter: `int *result` becomes `VAR result : INTEGER`
            let value = Declarator {
                pointers: 0,
                ..decl.clone()
            };
            (algo_type(&prefix.base, &value, None), true)
        } else {
            (algo_type(&prefix.base, &decl, Some(UNSIZED_PARAM_BOUND)), false)
        };

        match algo_type {
            Ok(algo_type) => params.push(Param {
                name,
                algo_type,
                by_reference,
            }),
            Err(_) => problems.push(format!("parameter '{}' is not supported", decl.name)),
        }
    }
    (params, problems)
}
