//! Fragment-driven translation of C into Algo lines
//!
//! The translator walks the fragments once. Top-level fragments build the
//! CONST, TYPE and VAR sections and open routines; inside a routine a stack
//! of frames tracks the blocks that are open. A control statement without
//! braces gets a frame too, closed as soon as its single statement ends.

use std::collections::{HashMap, HashSet};

use crate::decl::{
    algo_type, declarators, parameters, signature, type_prefix, BaseType, Declarator, KnownTypes,
    Signature, Unsupported,
};
use crate::expr::{
    algo_identifier, grouped, has_ternary, lex, matching_close, parenthesized, render,
    split_arguments, translate_expression, CToken,
};
use crate::io::{print_statement, puts_statement, scan_statement};
use crate::source::Fragment;
use crate::TranslationError;

const INDENT: &str = "  ";

/// Library calls with no Algo counterpart; they are dropped with a warning
const IGNORED_CALLS: &[&str] = &["fflush", "getchar", "srand", "system"];

/// One line of Algo and the C line it came from
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct AlgoLine {
    pub text: String,
    pub source: Option<usize>,
}

impl AlgoLine {
    fn new(text: impl Into<String>, source: usize) -> Self {
        Self {
            text: text.into(),
            source: Some(source),
        }
    }

    fn synthetic(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: None,
        }
    }
}

/// Finished translation, before it is joined into text
#[derive(Debug)]
pub(crate) struct Translation {
    pub lines: Vec<AlgoLine>,
    pub has_program: bool,
    pub warnings: Vec<String>,
    pub errors: Vec<TranslationError>,
}

// === Blocks ===

#[derive(Debug, Clone, Copy, PartialEq)]
enum FrameKind {
    Block,
    If,
    Else,
    Loop,
    DoWhile,
    Switch,
}

#[derive(Debug)]
struct Frame {
    kind: FrameKind,
    braced: bool,
    /// Statements replayed before END, for a `for` lowered to WHILE
    increment: Vec<String>,
    in_case: bool,
}

/// A control header waiting for its body
#[derive(Debug)]
struct PendingBody {
    kind: FrameKind,
    increment: Vec<String>,
}

/// A routine or main being translated
#[derive(Debug)]
struct Body {
    name: String,
    is_main: bool,
    header: Option<AlgoLine>,
    open_line: usize,
    close_line: Option<usize>,
    constants: Vec<AlgoLine>,
    variables: Vec<AlgoLine>,
    declared: HashSet<String>,
    lines: Vec<AlgoLine>,
    frames: Vec<Frame>,
    pending: Option<PendingBody>,
    awaiting_else: bool,
    awaiting_do_while: bool,
    indent: usize,
    /// CASE line with no statement yet; a following label joins it
    open_case: Option<usize>,
}

impl Body {
    fn new(routine: PendingRoutine, open_line: usize) -> Self {
        Self {
            name: routine.name,
            is_main: routine.header.is_none(),
            header: routine.header,
            open_line,
            close_line: None,
            constants: Vec::new(),
            variables: Vec::new(),
            declared: routine.params.into_iter().collect(),
            lines: Vec::new(),
            frames: Vec::new(),
            pending: None,
            awaiting_else: false,
            awaiting_do_while: false,
            indent: 1,
            open_case: None,
        }
    }

    fn emit(&mut self, text: impl AsRef<str>, line: usize) {
        self.lines.push(AlgoLine::new(
            format!("{}{}", INDENT.repeat(self.indent), text.as_ref()),
            line,
        ));
        self.open_case = None;
    }

    fn open_frame(&mut self, pending: PendingBody, braced: bool, line: usize) {
        if pending.kind != FrameKind::Switch {
            self.emit("BEGIN", line);
        }
        self.indent += 1;
        self.frames.push(Frame {
            kind: pending.kind,
            braced,
            increment: pending.increment,
            in_case: false,
        });
    }

    fn close_frame(&mut self, frame: Frame, line: usize) {
        if frame.kind == FrameKind::Switch && frame.in_case {
            self.indent = self.indent.saturating_sub(1);
        }
        for statement in &frame.increment {
            self.emit(statement, line);
        }
        self.indent = self.indent.saturating_sub(1);
        self.emit("END", line);
    }

    /// A statement just ended: close the brace-less frames it completes.
    ///
    /// Stops at an `if` (an `else` may follow) and at a `do` (its `while`
    /// must follow).
    fn statement_done(&mut self, line: usize) {
        while self.frames.last().is_some_and(|frame| !frame.braced) {
            let Some(frame) = self.frames.pop() else {
                break;
            };
            let kind = frame.kind;
            self.close_frame(frame, line);
            match kind {
                FrameKind::If => {
                    self.awaiting_else = true;
                    return;
                }
                FrameKind::DoWhile => {
                    self.awaiting_do_while = true;
                    return;
                }
                _ => {}
            }
        }
    }

    /// Close everything still open at end of input
    fn close_all(&mut self, line: usize) {
        if let Some(pending) = self.pending.take() {
            self.open_frame(pending, false, line);
        }
        loop {
            if self.awaiting_do_while {
                self.awaiting_do_while = false;
                self.emit("WHILE (FALSE)", line);
            }
            let Some(frame) = self.frames.pop() else {
                break;
            };
            let kind = frame.kind;
            self.close_frame(frame, line);
            self.awaiting_do_while = kind == FrameKind::DoWhile;
        }
        self.awaiting_else = false;
    }

    fn innermost_breakable(&self) -> Option<FrameKind> {
        self.frames
            .iter()
            .rev()
            .map(|frame| frame.kind)
            .find(|kind| matches!(kind, FrameKind::Loop | FrameKind::DoWhile | FrameKind::Switch))
    }
}

/// A definition whose `{` has not been seen yet
#[derive(Debug)]
struct PendingRoutine {
    name: String,
    /// `None` for main
    header: Option<AlgoLine>,
    params: Vec<String>,
    line: usize,
}

// === Aggregates ===

#[derive(Debug, Clone, Copy, PartialEq)]
enum AggregateKind {
    Struct,
    Enum,
}

/// A `struct` or `enum` definition being collected
#[derive(Debug)]
struct Aggregate {
    kind: AggregateKind,
    is_typedef: bool,
    tag: Option<String>,
    text: String,
    line: usize,
    depth: usize,
    members: Vec<Fragment>,
    closed: bool,
}

impl Aggregate {
    /// `struct Point`, `typedef struct`, `enum Color` and the like, when a
    /// body is expected next
    fn start(text: &str, line: usize) -> Option<Self> {
        let (is_typedef, rest) = match strip_word(text, "typedef") {
            Some(rest) => (true, rest),
            None => (false, text),
        };
        let (kind, rest) = if let Some(rest) = strip_word(rest, "struct") {
            (AggregateKind::Struct, rest)
        } else if let Some(rest) = strip_word(rest, "enum") {
            (AggregateKind::Enum, rest)
        } else {
            return None;
        };
        let tag = rest.trim();
        if !tag.is_empty() && !is_identifier(tag) {
            return None;
        }
        Some(Self {
            kind,
            is_typedef,
            tag: (!tag.is_empty()).then(|| tag.to_string()),
            text: text.to_string(),
            line,
            depth: 0,
            members: Vec::new(),
            closed: false,
        })
    }
}

// === Translator ===

#[derive(Debug, Default)]
pub(crate) struct Translator {
    known_types: KnownTypes,
    /// Lowercase structure name → its fields and their Algo types
    struct_fields: HashMap<String, Vec<(String, String)>>,
    constants: Vec<AlgoLine>,
    types: Vec<AlgoLine>,
    variables: Vec<AlgoLine>,
    declared: HashSet<String>,
    global_inits: Vec<AlgoLine>,
    top_comments: Vec<AlgoLine>,
    routines: Vec<Body>,
    main: Option<Body>,
    current: Option<Body>,
    pending_routine: Option<PendingRoutine>,
    aggregate: Option<Aggregate>,
    last_line: usize,
    warnings: Vec<String>,
    errors: Vec<TranslationError>,
}

impl Translator {
    pub fn new(warnings: Vec<String>) -> Self {
        Self {
            warnings,
            ..Self::default()
        }
    }

    pub fn run(mut self, fragments: &[Fragment]) -> Translation {
        for fragment in fragments {
            self.last_line = fragment.line;
            self.fragment(fragment);
        }
        self.finish()
    }

    fn warn(&mut self, line: usize, message: impl AsRef<str>) {
        let warning = format!("Line {}: {}", line, message.as_ref());
        log::debug!("{}", warning);
        self.warnings.push(warning);
    }

    fn fragment(&mut self, fragment: &Fragment) {
        if self.aggregate.is_some() {
            self.aggregate_fragment(fragment);
            return;
        }
        if let Some(mut body) = self.current.take() {
            if self.body_fragment(&mut body, &fragment.text, fragment.line) {
                self.finish_body(body);
            } else {
                self.current = Some(body);
            }
            return;
        }
        if let Some(routine) = self.pending_routine.take() {
            if fragment.text == "{" {
                self.open_routine(routine, fragment.line);
                return;
            }
            self.warn(routine.line, format!("definition of '{}' has no body", routine.name));
        }
        self.top_level(fragment);
    }

    // --- top level ---

    fn top_level(&mut self, fragment: &Fragment) {
        let text = fragment.text.as_str();
        let line = fragment.line;

        if text.starts_with('#') {
            self.directive(text, line);
        } else if text == "}" {
            self.errors.push(TranslationError::UnbalancedBrace { line });
        } else if text == ";" {
            log::trace!("stray ';' at line {}", line);
        } else if text == "{" {
            self.warn(line, "block outside any function ignored");
        } else if let Some(aggregate) = Aggregate::start(text, line) {
            self.aggregate = Some(aggregate);
        } else if let Some(rest) = strip_word(text, "typedef") {
            self.typedef(rest, line);
        } else if strip_word(text, "extern").is_some() {
            log::trace!("skipping extern declaration at line {}", line);
        } else if let Some(signature) = signature(text, &self.known_types) {
            self.routine_signature(signature, line);
        } else if !self.declaration(None, text, line) {
            self.unsupported(None, text, line, "unrecognized line");
        }
    }

    fn directive(&mut self, text: &str, line: usize) {
        let Some(rest) = strip_word(text[1..].trim_start(), "define") else {
            // Includes, guards and pragmas carry nothing to translate
            return;
        };
        let name_end = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        let (name, value) = rest.split_at(name_end);
        if name.is_empty() {
            return;
        }
        if value.starts_with('(') {
            self.warn(line, format!("function-like macro '{}' skipped", name));
            return;
        }
        let value = value.trim();
        if value.is_empty() {
            return;
        }
        match literal_value(value) {
            Some(value) => self.add_constant(None, &algo_identifier(name), &value, line),
            None => self.warn(line, format!("macro '{}' is not a literal constant", name)),
        }
    }

    fn typedef(&mut self, rest: &str, line: usize) {
        let Some(prefix) = type_prefix(rest, &self.known_types) else {
            self.unsupported(None, rest, line, "typedef");
            return;
        };
        let Some(decls) = declarators(prefix.rest) else {
            self.unsupported(None, rest, line, "typedef");
            return;
        };

        for decl in decls {
            let name = decl.algo_name();
            let key = decl.name.to_lowercase();
            // `typedef struct Node Node;` only introduces the name
            let same_name = matches!(&prefix.base, BaseType::Named(named) if named.eq_ignore_ascii_case(&name));
            if same_name && decl.pointers == 0 && decl.dimensions.is_empty() {
                self.known_types.insert(key, name);
                continue;
            }
            match algo_type(&prefix.base, &decl, None) {
                Ok(ty) => {
                    self.types
                        .push(AlgoLine::new(format!("{}{} = {}", INDENT, name, ty), line));
                    self.known_types.insert(key, name);
                }
                Err(reason) => self.warn(
                    line,
                    format!("typedef '{}' dropped: {}", decl.name, describe(&reason)),
                ),
            }
        }
    }

    fn aggregate_fragment(&mut self, fragment: &Fragment) {
        let Some(mut aggregate) = self.aggregate.take() else {
            return;
        };
        let text = fragment.text.as_str();

        if aggregate.closed {
            if text.ends_with(';') {
                self.finish_aggregate(aggregate, Some(text));
            } else {
                self.finish_aggregate(aggregate, None);
                self.fragment(fragment);
            }
            return;
        }
        if aggregate.depth == 0 {
            if text == "{" {
                aggregate.depth = 1;
                self.aggregate = Some(aggregate);
            } else {
                // `struct Point` broken across lines before its declarator
                let joined = format!("{} {}", aggregate.text, text);
                self.top_level(&Fragment::new(joined, aggregate.line));
            }
            return;
        }

        match text {
            "{" => aggregate.depth += 1,
            "}" => {
                aggregate.depth -= 1;
                aggregate.closed = aggregate.depth == 0;
            }
            _ if aggregate.depth == 1 => aggregate.members.push(fragment.clone()),
            _ => {}
        }
        self.aggregate = Some(aggregate);
    }

    fn finish_aggregate(&mut self, aggregate: Aggregate, tail: Option<&str>) {
        let tail_decls = tail.and_then(declarators).unwrap_or_default();
        let name = if aggregate.is_typedef {
            tail_decls.first().map(Declarator::algo_name)
        } else {
            aggregate.tag.as_deref().map(algo_identifier)
        };
        // Anonymous or empty aggregates have nothing to declare
        let Some(name) = name else {
            return;
        };
        if aggregate.members.is_empty() {
            return;
        }

        if let Some(tag) = &aggregate.tag {
            self.known_types.insert(tag.to_lowercase(), name.clone());
        }
        self.known_types.insert(name.to_lowercase(), name.clone());

        match aggregate.kind {
            AggregateKind::Struct => self.structure(&name, &aggregate),
            AggregateKind::Enum => self.enumeration(&name, &aggregate),
        }

        if !aggregate.is_typedef && !tail_decls.is_empty() {
            let text = tail.unwrap_or_default();
            let base = BaseType::Named(name);
            self.declare(None, &base, false, &tail_decls, text, aggregate.line);
        }
    }

    fn structure(&mut self, name: &str, aggregate: &Aggregate) {
        let mut fields = Vec::new();
        let mut lines = Vec::new();

        for member in &aggregate.members {
            let text = member.text.trim_end_matches(';');
            let parsed = type_prefix(text, &self.known_types)
                .and_then(|prefix| declarators(prefix.rest).map(|decls| (prefix.base, decls)));
            let Some((base, decls)) = parsed else {
                self.warn(member.line, format!("field '{}' could not be read", text));
                continue;
            };
            for decl in decls {
                match algo_type(&base, &decl, None) {
                    Ok(ty) => {
                        let field = decl.algo_name();
                        lines.push(AlgoLine::new(
                            format!("{}{}{} : {}", INDENT, INDENT, field, ty),
                            member.line,
                        ));
                        fields.push((field, ty));
                    }
                    Err(reason) => self.warn(
                        member.line,
                        format!("field '{}' dropped: {}", decl.name, describe(&reason)),
                    ),
                }
            }
        }

        if fields.is_empty() {
            self.warn(aggregate.line, format!("structure '{}' has no usable fields", name));
            return;
        }
        self.types.push(AlgoLine::new(
            format!("{}{} = STRUCTURE", INDENT, name),
            aggregate.line,
        ));
        self.types.extend(lines);
        self.types
            .push(AlgoLine::new(format!("{}END", INDENT), aggregate.line));
        self.struct_fields.insert(name.to_lowercase(), fields);
    }

    fn enumeration(&mut self, name: &str, aggregate: &Aggregate) {
        let joined: Vec<&str> = aggregate.members.iter().map(|m| m.text.as_str()).collect();
        let mut values = Vec::new();
        for item in split_arguments(&joined.join(", ")) {
            let item = item.trim().trim_end_matches(',').trim();
            if item.is_empty() {
                continue;
            }
            let (value, explicit) = match item.split_once('=') {
                Some((value, _)) => (value.trim(), true),
                None => (item, false),
            };
            if explicit {
                self.warn(
                    aggregate.line,
                    format!("explicit value of enumerator '{}' dropped", value),
                );
            }
            values.push(algo_identifier(value));
        }
        if values.is_empty() {
            return;
        }
        self.types.push(AlgoLine::new(
            format!("{}{} = ({})", INDENT, name, values.join(", ")),
            aggregate.line,
        ));
    }

    fn routine_signature(&mut self, signature: Signature, line: usize) {
        if signature.is_prototype {
            log::trace!("skipping prototype of '{}'", signature.name);
            return;
        }
        if signature.name == "main" {
            self.pending_routine = Some(PendingRoutine {
                name: "main".to_string(),
                header: None,
                params: Vec::new(),
                line,
            });
            return;
        }

        let (params, problems) = parameters(&signature.params, &self.known_types);
        for problem in problems {
            self.warn(line, problem);
        }
        let name = algo_identifier(&signature.name);
        let list = params
            .iter()
            .map(|p| {
                let mode = if p.by_reference { "VAR " } else { "" };
                format!("{}{} : {}", mode, p.name, p.algo_type)
            })
            .collect::<Vec<_>>()
            .join("; ");

        let header = match (&signature.return_type, signature.returns_pointer) {
            (BaseType::Void, pointer) => {
                if pointer {
                    self.warn(line, format!("pointer result of '{}' dropped", signature.name));
                }
                format!("PROCEDURE {}({})", name, list)
            }
            (BaseType::Char, true) => format!("FUNCTION {}({}) : STRING", name, list),
            (base, pointer) => {
                if pointer {
                    self.warn(line, format!("pointer result of '{}' dropped", signature.name));
                }
                format!("FUNCTION {}({}) : {}", name, list, base.algo())
            }
        };
        log::debug!("found routine '{}' at line {}", name, line);

        self.pending_routine = Some(PendingRoutine {
            name,
            header: Some(AlgoLine::new(header, line)),
            params: params.iter().map(|p| p.name.to_lowercase()).collect(),
            line,
        });
    }

    fn open_routine(&mut self, routine: PendingRoutine, line: usize) {
        if routine.header.is_none() && self.main.is_some() {
            self.warn(line, "second 'main' definition");
        }
        self.current = Some(Body::new(routine, line));
    }

    fn finish_body(&mut self, body: Body) {
        if body.is_main {
            self.main = Some(body);
        } else {
            self.routines.push(body);
        }
    }

    // --- declarations ---

    /// Handle `text` if it declares variables; `body` is `None` at top level
    fn declaration(&mut self, body: Option<&mut Body>, text: &str, line: usize) -> bool {
        let text = text.trim().trim_end_matches(';').trim_end();
        let Some(prefix) = type_prefix(text, &self.known_types) else {
            return false;
        };
        match declarators(prefix.rest) {
            Some(decls) => self.declare(body, &prefix.base, prefix.is_const, &decls, text, line),
            None => self.unsupported(body, text, line, "declaration"),
        }
        true
    }

    fn declare(
        &mut self,
        mut body: Option<&mut Body>,
        base: &BaseType,
        is_const: bool,
        decls: &[Declarator],
        text: &str,
        line: usize,
    ) {
        for decl in decls {
            let name = decl.algo_name();
            let init = decl.init.as_deref().map(str::trim);

            if is_const && decl.dimensions.is_empty() {
                if let Some(value) = init.and_then(literal_value) {
                    self.add_constant(body.as_deref_mut(), &name, &value, line);
                    continue;
                }
            }

            let fill = init.and_then(brace_items).map(|items| items.len());
            let ty = match algo_type(base, decl, fill) {
                Ok(ty) => ty,
                Err(reason) => {
                    self.warn(line, format!("'{}' dropped: {}", decl.name, describe(&reason)));
                    self.comment(body.as_deref_mut(), text, line);
                    continue;
                }
            };
            self.add_variable(body.as_deref_mut(), &name, &ty, line);

            let Some(init) = init else {
                continue;
            };
            if has_ternary(init) {
                self.unsupported(body.as_deref_mut(), text, line, "conditional initializer");
                continue;
            }
            let mut statements = Vec::new();
            match brace_items(init) {
                Some(items) => self.brace_assignments(&name, &ty, &items, &mut statements),
                None => statements.push(format!("{} <- {}", name, translate_expression(init))),
            }
            for statement in statements {
                match body.as_deref_mut() {
                    Some(body) => body.emit(statement, line),
                    None => self
                        .global_inits
                        .push(AlgoLine::new(format!("{}{}", INDENT, statement), line)),
                }
            }
        }
    }

    /// `{1, 2, 3}` → one assignment per element, nested braces per level
    fn brace_assignments(&self, target: &str, ty: &str, items: &[String], out: &mut Vec<String>) {
        let array = array_parts(ty);
        let fields = self.struct_fields.get(&ty.to_lowercase());

        for (index, item) in items.iter().enumerate() {
            let item = item.trim();
            let (element_target, element_type, value) = if let Some((field, value)) =
                designated(item)
            {
                let ty = fields
                    .and_then(|fields| fields.iter().find(|(name, _)| name.eq_ignore_ascii_case(&field)))
                    .map(|(_, ty)| ty.clone())
                    .unwrap_or_default();
                (format!("{}.{}", target, field), ty, value)
            } else if let Some((_, element)) = &array {
                (format!("{}[{}]", target, index), element.clone(), item)
            } else if let Some((field, ty)) = fields.and_then(|fields| fields.get(index)) {
                (format!("{}.{}", target, field), ty.clone(), item)
            } else {
                (target.to_string(), ty.to_string(), item)
            };

            match brace_items(value) {
                Some(nested) => self.brace_assignments(&element_target, &element_type, &nested, out),
                None => out.push(format!("{} <- {}", element_target, translate_expression(value))),
            }
        }
    }

    fn add_variable(&mut self, body: Option<&mut Body>, name: &str, ty: &str, line: usize) {
        let entry = AlgoLine::new(format!("{}{} : {}", INDENT, name, ty), line);
        match body {
            Some(body) if !body.is_main => {
                if body.declared.insert(name.to_lowercase()) {
                    body.variables.push(entry);
                }
            }
            _ => {
                if self.declared.insert(name.to_lowercase()) {
                    self.variables.push(entry);
                }
            }
        }
    }

    fn add_constant(&mut self, body: Option<&mut Body>, name: &str, value: &str, line: usize) {
        let entry = AlgoLine::new(format!("{}{} = {}", INDENT, name, value), line);
        match body {
            Some(body) if !body.is_main => {
                if body.declared.insert(name.to_lowercase()) {
                    body.constants.push(entry);
                }
            }
            _ => {
                if self.declared.insert(name.to_lowercase()) {
                    self.constants.push(entry);
                }
            }
        }
    }

    fn comment(&mut self, body: Option<&mut Body>, text: &str, line: usize) {
        let text = format!("// {}", text.trim());
        match body {
            Some(body) => body.emit(text, line),
            None => self.top_comments.push(AlgoLine::new(text, line)),
        }
    }

    fn unsupported(&mut self, body: Option<&mut Body>, text: &str, line: usize, what: &str) {
        self.warn(line, format!("{} not supported: {}", what, text.trim()));
        self.comment(body, text, line);
    }

    // --- bodies ---

    /// Feed one fragment to an open body; `true` once its closing brace is seen
    fn body_fragment(&mut self, body: &mut Body, text: &str, line: usize) -> bool {
        loop {
            if body.awaiting_else && strip_word(text, "else").is_none() {
                body.awaiting_else = false;
                body.statement_done(line);
                continue;
            }
            if body.awaiting_do_while {
                body.awaiting_do_while = false;
                if let Some((condition, _)) = strip_word(text, "while").and_then(parenthesized) {
                    let condition = self.condition(condition, line);
                    body.emit(format!("WHILE ({})", condition), line);
                    body.statement_done(line);
                    return false;
                }
                self.warn(line, "'do' loop without a closing 'while'");
                body.emit("WHILE (FALSE)", line);
                body.statement_done(line);
                continue;
            }
            break;
        }

        if body.awaiting_else {
            if let Some(rest) = strip_word(text, "else") {
                body.awaiting_else = false;
                self.else_branch(body, rest, line);
                return false;
            }
        }

        if let Some(pending) = body.pending.take() {
            let braced = text == "{";
            body.open_frame(pending, braced, line);
            if braced {
                return false;
            }
        }

        match text {
            "{" => {
                body.open_frame(
                    PendingBody {
                        kind: FrameKind::Block,
                        increment: Vec::new(),
                    },
                    true,
                    line,
                );
                false
            }
            "}" => self.close_brace(body, line),
            _ => {
                self.statement(body, text, line);
                false
            }
        }
    }

    fn close_brace(&mut self, body: &mut Body, line: usize) -> bool {
        while body.frames.last().is_some_and(|frame| !frame.braced) {
            if let Some(frame) = body.frames.pop() {
                body.close_frame(frame, line);
            }
        }
        let Some(frame) = body.frames.pop() else {
            body.close_line = Some(line);
            return true;
        };
        let kind = frame.kind;
        body.close_frame(frame, line);
        match kind {
            FrameKind::If => body.awaiting_else = true,
            FrameKind::DoWhile => body.awaiting_do_while = true,
            _ => body.statement_done(line),
        }
        false
    }

    /// Body of a control statement: the rest of this fragment, or whatever
    /// comes next when the fragment ends at the header
    fn control_body(
        &mut self,
        body: &mut Body,
        kind: FrameKind,
        increment: Vec<String>,
        tail: &str,
        line: usize,
    ) {
        let pending = PendingBody { kind, increment };
        if tail.is_empty() {
            body.pending = Some(pending);
        } else {
            body.open_frame(pending, false, line);
            self.statement(body, tail, line);
        }
    }

    fn condition(&mut self, text: &str, line: usize) -> String {
        if has_ternary(text) {
            self.warn(line, format!("conditional expression not supported: {}", text.trim()));
            return "FALSE".to_string();
        }
        let condition = translate_expression(text);
        match condition.parse::<i64>() {
            Ok(0) => "FALSE".to_string(),
            Ok(_) => "TRUE".to_string(),
            Err(_) => condition,
        }
    }

    fn else_branch(&mut self, body: &mut Body, rest: &str, line: usize) {
        if let Some(after_if) = strip_word(rest, "if") {
            let Some((condition, tail)) = parenthesized(after_if) else {
                self.unsupported(Some(&mut *body), rest, line, "else-if");
                body.statement_done(line);
                return;
            };
            let condition = self.condition(condition, line);
            body.emit(format!("ELSE IF ({}) THEN", condition), line);
            self.control_body(body, FrameKind::If, Vec::new(), tail, line);
        } else {
            body.emit("ELSE", line);
            self.control_body(body, FrameKind::Else, Vec::new(), rest, line);
        }
    }

    fn statement(&mut self, body: &mut Body, text: &str, line: usize) {
        let text = text.trim();
        if text.is_empty() || text == ";" {
            body.statement_done(line);
            return;
        }

        if let Some(rest) = strip_word(text, "if") {
            match parenthesized(rest) {
                Some((condition, tail)) => {
                    let condition = self.condition(condition, line);
                    body.emit(format!("IF ({}) THEN", condition), line);
                    self.control_body(body, FrameKind::If, Vec::new(), tail, line);
                }
                None => self.simple_unsupported(body, text, line, "if statement"),
            }
        } else if let Some(rest) = strip_word(text, "while") {
            match parenthesized(rest) {
                Some((condition, tail)) => {
                    let condition = self.condition(condition, line);
                    body.emit(format!("WHILE ({}) DO", condition), line);
                    self.control_body(body, FrameKind::Loop, Vec::new(), tail, line);
                }
                None => self.simple_unsupported(body, text, line, "while statement"),
            }
        } else if let Some(rest) = strip_word(text, "do") {
            body.emit("DO", line);
            self.control_body(body, FrameKind::DoWhile, Vec::new(), rest, line);
        } else if let Some(rest) = strip_word(text, "for") {
            self.for_statement(body, rest, line);
        } else if let Some(rest) = strip_word(text, "switch") {
            match parenthesized(rest) {
                Some((subject, tail)) => {
                    body.emit(format!("SWITCH {} OF", translate_expression(subject)), line);
                    self.control_body(body, FrameKind::Switch, Vec::new(), tail, line);
                }
                None => self.simple_unsupported(body, text, line, "switch statement"),
            }
        } else if let Some(rest) = strip_word(text, "case") {
            let value = rest.trim_end_matches(':').trim();
            self.case_label(body, Some(&translate_expression(value)), line);
        } else if strip_word(text, "default").is_some_and(|rest| rest.starts_with(':')) {
            self.case_label(body, None, line);
        } else if strip_word(text, "else").is_some() {
            self.simple_unsupported(body, text, line, "'else' without 'if'");
        } else if strip_word(text, "break").is_some() {
            if body.innermost_breakable() == Some(FrameKind::Switch) {
                body.statement_done(line);
            } else {
                self.simple_unsupported(body, text, line, "'break' outside a switch");
            }
        } else if strip_word(text, "continue").is_some() {
            self.simple_unsupported(body, text, line, "'continue'");
        } else if strip_word(text, "goto").is_some() || is_label(text) {
            self.simple_unsupported(body, text, line, "'goto'");
        } else if let Some(rest) = strip_word(text, "return") {
            self.return_statement(body, rest, line);
        } else {
            self.simple_statement(body, text, line);
        }
    }

    fn simple_unsupported(&mut self, body: &mut Body, text: &str, line: usize, what: &str) {
        self.unsupported(Some(&mut *body), text, line, what);
        body.statement_done(line);
    }

    fn return_statement(&mut self, body: &mut Body, rest: &str, line: usize) {
        let value = rest.trim_end_matches(';').trim();
        if body.is_main {
            // The program simply ends; only an early exit changes behaviour
            if !body.frames.is_empty() {
                self.warn(line, "'return' inside main dropped");
            }
        } else if value.is_empty() {
            body.emit("RETURN", line);
        } else if has_ternary(value) {
            self.unsupported(Some(&mut *body), rest, line, "conditional expression");
        } else {
            body.emit(format!("RETURN {}", translate_expression(value)), line);
        }
        body.statement_done(line);
    }

    fn simple_statement(&mut self, body: &mut Body, text: &str, line: usize) {
        if has_ternary(text) {
            self.simple_unsupported(body, text, line, "conditional expression");
            return;
        }
        if self.declaration(Some(&mut *body), text, line) {
            body.statement_done(line);
            return;
        }

        let code = text.trim_end_matches(';').trim_end();
        if let Some((name, args)) = call(code) {
            match name {
                "printf" => body.emit(print_statement(args), line),
                "puts" => body.emit(puts_statement(args), line),
                "scanf" => match scan_statement(args) {
                    Some(scan) => body.emit(scan, line),
                    None => self.warn(line, "scanf without targets dropped"),
                },
                "strcpy" => match split_arguments(args).as_slice() {
                    [target, value] => body.emit(
                        format!("{} <- {}", translate_expression(target), translate_expression(value)),
                        line,
                    ),
                    _ => self.unsupported(Some(&mut *body), text, line, "strcpy call"),
                },
                _ if IGNORED_CALLS.contains(&name) => {
                    self.warn(line, format!("call to '{}' dropped", name));
                    self.comment(Some(&mut *body), text, line);
                }
                _ => body.emit(translate_expression(code), line),
            }
            body.statement_done(line);
            return;
        }

        match assignment(code) {
            Some(statements) => {
                for statement in statements {
                    body.emit(statement, line);
                }
            }
            None => self.unsupported(Some(&mut *body), text, line, "statement"),
        }
        body.statement_done(line);
    }

    fn case_label(&mut self, body: &mut Body, value: Option<&str>, line: usize) {
        let in_case = match body.frames.last_mut() {
            Some(frame) if frame.kind == FrameKind::Switch => std::mem::replace(&mut frame.in_case, true),
            _ => {
                self.warn(line, "'case' outside a switch ignored");
                return;
            }
        };
        if in_case {
            body.indent = body.indent.saturating_sub(1);
        }

        // `case 1: case 2:` share one CASE line
        if let (Some(value), Some(index)) = (value, body.open_case) {
            if let Some(label) = body.lines.get_mut(index) {
                label.text.pop();
                label.text.push_str(&format!(", {}:", value));
                body.indent += 1;
                return;
            }
        }

        match value {
            Some(value) => {
                body.emit(format!("CASE {}:", value), line);
                body.open_case = Some(body.lines.len() - 1);
            }
            None => body.emit("DEFAULT:", line),
        }
        body.indent += 1;
    }

    fn for_statement(&mut self, body: &mut Body, rest: &str, line: usize) {
        let Some((header, tail)) = parenthesized(rest) else {
            self.simple_unsupported(body, rest, line, "for statement");
            return;
        };
        let parts = split_semicolons(header);
        let &[init, condition, step] = parts.as_slice() else {
            self.simple_unsupported(body, header, line, "for header");
            return;
        };

        // `for (int i = 0; ...)` declares the counter
        let init = match type_prefix(init, &self.known_types) {
            Some(prefix) => {
                if let Some(decls) = declarators(prefix.rest) {
                    let bare: Vec<Declarator> = decls
                        .into_iter()
                        .map(|decl| Declarator { init: None, ..decl })
                        .collect();
                    self.declare(Some(&mut *body), &prefix.base, false, &bare, init, line);
                }
                prefix.rest
            }
            None => init,
        };

        if let Some(header) = counted_for(init, condition, step) {
            body.emit(header, line);
            self.control_body(body, FrameKind::Loop, Vec::new(), tail, line);
            return;
        }

        log::trace!("for loop at line {} lowered to WHILE", line);
        for piece in split_arguments(init) {
            match assignment(&piece) {
                Some(statements) => statements.into_iter().for_each(|s| body.emit(s, line)),
                None => self.unsupported(Some(&mut *body), &piece, line, "loop initializer"),
            }
        }
        let condition = if condition.is_empty() {
            "TRUE".to_string()
        } else {
            self.condition(condition, line)
        };
        let mut increment = Vec::new();
        for piece in split_arguments(step) {
            match assignment(&piece) {
                Some(statements) => increment.extend(statements),
                None => self.warn(line, format!("loop step not supported: {}", piece)),
            }
        }
        body.emit(format!("WHILE ({}) DO", condition), line);
        self.control_body(body, FrameKind::Loop, increment, tail, line);
    }

    // --- output ---

    fn finish(mut self) -> Translation {
        let line = self.last_line;
        if let Some(aggregate) = self.aggregate.take() {
            if aggregate.closed {
                self.finish_aggregate(aggregate, None);
            }
        }
        if let Some(routine) = self.pending_routine.take() {
            self.warn(routine.line, format!("definition of '{}' has no body", routine.name));
        }
        if let Some(mut body) = self.current.take() {
            self.errors.push(TranslationError::UnclosedBody {
                name: body.name.clone(),
                line: body.open_line,
            });
            body.close_all(line);
            body.close_line = Some(line);
            self.finish_body(body);
        }

        let has_program = self.main.is_some() || !self.routines.is_empty();
        if !has_program {
            self.errors.push(TranslationError::NothingToTranslate);
        }
        log::debug!(
            "translated {} routines, main {}",
            self.routines.len(),
            if self.main.is_some() { "found" } else { "missing" }
        );

        let mut lines = vec![AlgoLine::synthetic("ALGORITHM Translated")];
        lines.append(&mut self.top_comments);
        section(&mut lines, "CONST", self.constants);
        section(&mut lines, "TYPE", self.types);
        section(&mut lines, "VAR", self.variables);

        for routine in self.routines {
            lines.push(AlgoLine::synthetic(""));
            lines.extend(routine.header);
            section(&mut lines, "CONST", routine.constants);
            section(&mut lines, "VAR", routine.variables);
            lines.push(AlgoLine::new("BEGIN", routine.open_line));
            lines.extend(routine.lines);
            lines.push(AlgoLine {
                text: "END".to_string(),
                source: routine.close_line,
            });
        }

        lines.push(AlgoLine::synthetic(""));
        match self.main {
            Some(main) => {
                lines.push(AlgoLine::new("BEGIN", main.open_line));
                lines.extend(self.global_inits);
                lines.extend(main.lines);
                lines.push(AlgoLine {
                    text: "END.".to_string(),
                    source: main.close_line,
                });
            }
            None => {
                lines.push(AlgoLine::synthetic("BEGIN"));
                lines.extend(self.global_inits);
                lines.push(AlgoLine::synthetic("END."));
            }
        }

        Translation {
            lines,
            has_program,
            warnings: self.warnings,
            errors: self.errors,
        }
    }
}

fn section(lines: &mut Vec<AlgoLine>, keyword: &str, entries: Vec<AlgoLine>) {
    if entries.is_empty() {
        return;
    }
    lines.push(AlgoLine::synthetic(keyword));
    lines.extend(entries);
}

// === Helpers ===

fn describe(reason: &Unsupported) -> &'static str {
    match reason {
        Unsupported::Pointer => "pointers are not supported",
        Unsupported::Void => "void has no Algo type",
        Unsupported::UnsizedArray => "array without a size",
    }
}

/// `word` at the start of `text` as a whole word; the rest, trimmed
fn strip_word<'t>(text: &'t str, word: &str) -> Option<&'t str> {
    let rest = text.strip_prefix(word)?;
    if rest.starts_with(|c: char| c.is_ascii_alphanumeric() || c == '_') {
        return None;
    }
    Some(rest.trim_start())
}

fn is_identifier(text: &str) -> bool {
    text.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_')
        && text.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn is_label(text: &str) -> bool {
    text.strip_suffix(':').is_some_and(|name| is_identifier(name.trim()))
}

/// A literal constant value in Algo spelling, outer parentheses removed
fn literal_value(text: &str) -> Option<String> {
    let mut text = text.trim();
    while let Some((inner, "")) = parenthesized(text) {
        text = inner.trim();
    }
    let value = translate_expression(text);
    let tokens = lex(&value);
    let tokens = match tokens.first() {
        Some(first) if first.is_punct("-") => &tokens[1..],
        _ => &tokens[..],
    };
    let is_literal = match tokens {
        [CToken::Number(_)] | [CToken::Literal(_)] => true,
        [CToken::Ident(word)] => word == "TRUE" || word == "FALSE",
        _ => false,
    };
    is_literal.then_some(value)
}

/// Items of a `{...}` initializer
fn brace_items(text: &str) -> Option<Vec<String>> {
    let inner = text.trim().strip_prefix('{')?.strip_suffix('}')?;
    Some(
        split_arguments(inner)
            .into_iter()
            .filter(|item| !item.is_empty())
            .collect(),
    )
}

/// `.field = value` inside a structure initializer
fn designated(item: &str) -> Option<(String, &str)> {
    let rest = item.strip_prefix('.')?;
    let (field, value) = rest.split_once('=')?;
    let field = field.trim();
    is_identifier(field).then(|| (algo_identifier(field), value.trim()))
}

/// `ARRAY[3, 4] OF INTEGER` → first bound and the type of one element
fn array_parts(ty: &str) -> Option<(String, String)> {
    let rest = ty.strip_prefix("ARRAY[")?;
    let (bounds, element) = rest.split_once("] OF ")?;
    let mut bounds = bounds.splitn(2, ", ");
    let first = bounds.next()?.to_string();
    let element = match bounds.next() {
        Some(remaining) => format!("ARRAY[{}] OF {}", remaining, element),
        None => element.to_string(),
    };
    Some((first, element))
}

/// `name(args)` with nothing after the closing parenthesis
fn call(code: &str) -> Option<(&str, &str)> {
    let end = code
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(code.len());
    let name = &code[..end];
    if !is_identifier(name) {
        return None;
    }
    let (args, tail) = parenthesized(&code[end..])?;
    tail.is_empty().then_some((name, args))
}

/// Split a `for` header on its top-level semicolons
fn split_semicolons(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut start = 0;
    for (index, c) in text.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '(' | '[' => depth += 1,
            ')' | ']' => depth = depth.saturating_sub(1),
            ';' if depth == 0 => {
                parts.push(text[start..index].trim());
                start = index + 1;
            }
            _ => {}
        }
    }
    parts.push(text[start..].trim());
    parts
}

fn is_lvalue(tokens: &[CToken]) -> bool {
    let start = tokens.iter().take_while(|t| t.is_punct("*")).count();
    let tokens = &tokens[start..];
    if !matches!(tokens.first(), Some(CToken::Ident(_))) {
        return false;
    }
    let mut i = 1;
    while i < tokens.len() {
        if tokens[i].is_punct("[") {
            let Some(close) = matching_close(tokens, i) else {
                return false;
            };
            i = close + 1;
        } else if (tokens[i].is_punct(".") || tokens[i].is_punct("->"))
            && tokens.get(i + 1).and_then(CToken::ident).is_some()
        {
            i += 2;
        } else {
            return false;
        }
    }
    true
}

/// Algo statements for a C assignment, compound assignment, `++` or `--`
fn assignment(code: &str) -> Option<Vec<String>> {
    let tokens = lex(code.trim().trim_end_matches(';'));
    let (first, last) = (tokens.first()?, tokens.last()?);

    for (op, algo) in [("++", "+"), ("--", "-")] {
        let target = if last.is_punct(op) {
            &tokens[..tokens.len() - 1]
        } else if first.is_punct(op) {
            &tokens[1..]
        } else {
            continue;
        };
        if !is_lvalue(target) {
            return None;
        }
        let target = render(target);
        return Some(vec![format!("{} <- {} {} 1", target, target, algo)]);
    }

    let mut depth = 0usize;
    let mut operators = Vec::new();
    for (index, token) in tokens.iter().enumerate() {
        match token {
            CToken::Punct(p) if p == "(" || p == "[" => depth += 1,
            CToken::Punct(p) if p == ")" || p == "]" => depth = depth.saturating_sub(1),
            CToken::Punct(p) if depth == 0 && p.len() <= 2 && p.ends_with('=') => {
                if !matches!(p.as_str(), "==" | "!=" | "<=" | ">=") {
                    operators.push(index);
                }
            }
            _ => {}
        }
    }
    let (&position, _) = operators.split_first()?;
    let target = &tokens[..position];
    if !is_lvalue(target) {
        return None;
    }

    let CToken::Punct(op) = &tokens[position] else {
        return None;
    };
    if op == "=" {
        // `a = b = 0` assigns from the right
        let mut bounds = vec![0];
        for &index in &operators {
            if !tokens[index].is_punct("=") {
                return None;
            }
            bounds.push(index);
        }
        let value = render(&tokens[bounds[bounds.len() - 1] + 1..]);
        if value.is_empty() {
            return None;
        }
        let mut statements = Vec::new();
        let mut source = value;
        for pair in bounds.windows(2).rev() {
            let from = if pair[0] == 0 { 0 } else { pair[0] + 1 };
            let lhs = &tokens[from..pair[1]];
            if !is_lvalue(lhs) {
                return None;
            }
            let lhs = render(lhs);
            statements.push(format!("{} <- {}", lhs, source));
            source = lhs;
        }
        return Some(statements);
    }

    if operators.len() > 1 {
        return None;
    }
    let algo = match op.as_str() {
        "+=" => "+",
        "-=" => "-",
        "*=" => "*",
        "/=" => "/",
        "%=" => "MOD",
        _ => return None,
    };
    let value = &tokens[position + 1..];
    if value.is_empty() {
        return None;
    }
    let target = render(target);
    Some(vec![format!(
        "{} <- {} {} {}",
        target,
        target,
        algo,
        grouped(value)
    )])
}

/// `FOR` header for a counting loop, if the C header is one
fn counted_for(init: &str, condition: &str, step: &str) -> Option<String> {
    let init_tokens = lex(init);
    let [CToken::Ident(variable), eq, ..] = init_tokens.as_slice() else {
        return None;
    };
    if !eq.is_punct("=") || init_tokens.len() < 3 {
        return None;
    }
    let start = render(&init_tokens[2..]);
    if init_tokens[2..].iter().any(|t| t.is_punct("=") || t.is_punct(",")) {
        return None;
    }

    let (amount, descending) = loop_step(step, variable)?;
    let (op, bound) = loop_bound(condition, variable)?;
    let end = match (op.as_str(), descending) {
        ("<", false) => offset(&bound, -1),
        ("<=", false) | (">=", true) => bound,
        (">", true) => offset(&bound, 1),
        _ => return None,
    };
    let step_clause = match (amount.as_str(), descending) {
        ("1", false) => String::new(),
        (amount, false) => format!(" STEP {}", amount),
        (amount, true) if amount.parse::<f64>().is_ok() => format!(" STEP -{}", amount),
        (amount, true) => format!(" STEP -({})", amount),
    };
    Some(format!(
        "FOR {} <- {} TO {}{} DO",
        algo_identifier(variable),
        start,
        end,
        step_clause
    ))
}

/// Step amount and direction of `i++`, `i -= 2`, `i = i + s`
fn loop_step(step: &str, variable: &str) -> Option<(String, bool)> {
    let tokens = lex(step);
    let names_variable = |token: &CToken| token.ident() == Some(variable);
    match tokens.as_slice() {
        [a, b] if names_variable(a) && (b.is_punct("++") || b.is_punct("--")) => {
            Some(("1".to_string(), b.is_punct("--")))
        }
        [a, b] if names_variable(b) && (a.is_punct("++") || a.is_punct("--")) => {
            Some(("1".to_string(), a.is_punct("--")))
        }
        [a, op, rest @ ..] if names_variable(a) && !rest.is_empty() && (op.is_punct("+=") || op.is_punct("-=")) => {
            Some((render(rest), op.is_punct("-=")))
        }
        [a, eq, b, op, rest @ ..]
            if names_variable(a)
                && eq.is_punct("=")
                && names_variable(b)
                && !rest.is_empty()
                && (op.is_punct("+") || op.is_punct("-")) =>
        {
            Some((render(rest), op.is_punct("-")))
        }
        _ => None,
    }
}

/// `i < n` → (`<`, `n`); anything more complex is not a counting bound
fn loop_bound(condition: &str, variable: &str) -> Option<(String, String)> {
    let tokens = lex(condition);
    let [CToken::Ident(name), CToken::Punct(op), rest @ ..] = tokens.as_slice() else {
        return None;
    };
    if name != variable || rest.is_empty() || !matches!(op.as_str(), "<" | "<=" | ">" | ">=") {
        return None;
    }
    let complex = rest.iter().any(|t| {
        ["&&", "||", "<", ">", "<=", ">=", "==", "!=", "?", ",", "="]
            .iter()
            .any(|p| t.is_punct(p))
    });
    (!complex).then(|| (op.clone(), render(rest)))
}

fn offset(bound: &str, delta: i64) -> String {
    match bound.parse::<i64>() {
        Ok(value) => (value + delta).to_string(),
        Err(_) if delta < 0 => format!("{} - {}", bound, -delta),
        Err(_) => format!("{} + {}", bound, delta),
    }
}
