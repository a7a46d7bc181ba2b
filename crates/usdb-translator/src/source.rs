//! Raw C text preparation: include expansion, comment stripping and
//! fragmenting into statement-sized pieces

use std::collections::{HashMap, HashSet};

/// A physical line of C and the line of the root file it is reported against
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SourceLine {
    pub text: String,
    pub line: usize,
}

/// A statement-sized piece of a line
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Fragment {
    pub text: String,
    pub line: usize,
}

impl Fragment {
    pub fn new(text: impl Into<String>, line: usize) -> Self {
        Self {
            text: text.into(),
            line,
        }
    }
}

// === Includes ===

/// Inline local `#include "file"` directives from the workspace files.
///
/// Included lines map back to the `#include` line of the root file. A header
/// also pulls in its companion `.c` file when the workspace has one.
pub(crate) fn expand_includes(
    source: &str,
    files: Option<&HashMap<String, String>>,
    warnings: &mut Vec<String>,
) -> Vec<SourceLine> {
    let mut expander = IncludeExpander {
        files,
        processed: HashSet::new(),
        lines: Vec::new(),
        warnings,
    };
    for (index, text) in source.lines().enumerate() {
        let line = index + 1;
        match local_include(text) {
            Some(name) => expander.include(name, line, true),
            None => expander.lines.push(SourceLine {
                text: text.to_string(),
                line,
            }),
        }
    }
    expander.lines
}

struct IncludeExpander<'a, 'w> {
    files: Option<&'a HashMap<String, String>>,
    processed: HashSet<String>,
    lines: Vec<SourceLine>,
    warnings: &'w mut Vec<String>,
}

impl<'a, 'w> IncludeExpander<'a, 'w> {
    fn include(&mut self, name: &str, line: usize, required: bool) {
        let Some((key, content)) = self.files.and_then(|files| find_file(files, name)) else {
            if required {
                self.warnings
                    .push(format!("Line {}: included file \"{}\" not found", line, name));
            }
            return;
        };
        // Guards repeats and include cycles alike
        if !self.processed.insert(key.to_string()) {
            return;
        }
        log::trace!("expanding include '{}' at line {}", key, line);

        for text in content.lines() {
            match local_include(text) {
                Some(inner) => self.include(inner, line, true),
                None => self.lines.push(SourceLine {
                    text: text.to_string(),
                    line,
                }),
            }
        }

        if let Some(stem) = key.strip_suffix(".h") {
            let companion = format!("{}.c", stem);
            self.include(&companion, line, false);
        }
    }
}

/// `#include "name"` → `name`; system includes are not local
fn local_include(text: &str) -> Option<&str> {
    let rest = text.trim().strip_prefix('#')?.trim_start();
    let rest = rest.strip_prefix("include")?.trim_start();
    let rest = rest.strip_prefix('"')?;
    let end = rest.find('"')?;
    Some(&rest[..end])
}

/// Exact name first, then the first file (in name order) containing it
fn find_file<'a>(files: &'a HashMap<String, String>, name: &str) -> Option<(&'a str, &'a str)> {
    if let Some((key, content)) = files.get_key_value(name) {
        return Some((key.as_str(), content.as_str()));
    }
    let mut keys: Vec<&String> = files.keys().filter(|key| key.contains(name)).collect();
    keys.sort();
    let key: &'a String = keys.first().copied()?;
    files.get(key).map(|content| (key.as_str(), content.as_str()))
}

// === Comments ===

/// Remove `//` and `/* */` comments, keeping one entry per line
pub(crate) fn strip_comments(lines: &[SourceLine]) -> Vec<SourceLine> {
    let mut in_block = false;
    let mut result = Vec::with_capacity(lines.len());

    for source in lines {
        let mut text = String::with_capacity(source.text.len());
        let mut chars = source.text.chars().peekable();
        let mut quote: Option<char> = None;

        while let Some(c) = chars.next() {
            if in_block {
                if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    in_block = false;
                    text.push(' ');
                }
                continue;
            }
            if let Some(q) = quote {
                text.push(c);
                if c == '\\' {
                    if let Some(escaped) = chars.next() {
                        text.push(escaped);
                    }
                } else if c == q {
                    quote = None;
                }
                continue;
            }
            match c {
                '"' | '\'' => {
                    quote = Some(c);
                    text.push(c);
                }
                '/' if chars.peek() == Some(&'/') => break,
                '/' if chars.peek() == Some(&'*') => {
                    chars.next();
                    in_block = true;
                }
                _ => text.push(c),
            }
        }

        result.push(SourceLine {
            text,
            line: source.line,
        });
    }
    result
}

// === Fragments ===

/// Split lines at `{`, `}`, top-level `;` and after `case X:` / `default:`.
///
/// Every fragment keeps the line it started on. Text inside open parentheses
/// or a brace initializer carries over to the next line.
pub(crate) fn fragment(lines: &[SourceLine]) -> Vec<Fragment> {
    let mut splitter = Splitter::default();
    for source in lines {
        splitter.line(source);
    }
    splitter.flush();
    splitter.fragments
}

#[derive(Default)]
struct Splitter {
    fragments: Vec<Fragment>,
    buffer: String,
    start_line: usize,
    paren_depth: usize,
    init_depth: usize,
}

impl Splitter {
    fn line(&mut self, source: &SourceLine) {
        let trimmed = source.text.trim();
        if self.buffer.trim().is_empty() {
            self.buffer.clear();
            self.start_line = source.line;
            if trimmed.starts_with('#') {
                self.fragments.push(Fragment::new(trimmed, source.line));
                return;
            }
        } else {
            self.buffer.push(' ');
        }

        let mut chars = trimmed.chars();
        let mut quote: Option<char> = None;
        while let Some(c) = chars.next() {
            if self.buffer.trim().is_empty() {
                self.start_line = source.line;
            }
            if let Some(q) = quote {
                self.buffer.push(c);
                if c == '\\' {
                    if let Some(escaped) = chars.next() {
                        self.buffer.push(escaped);
                    }
                } else if c == q {
                    quote = None;
                }
                continue;
            }
            if self.init_depth > 0 {
                self.buffer.push(c);
                match c {
                    '{' => self.init_depth += 1,
                    '}' => self.init_depth -= 1,
                    '"' | '\'' => quote = Some(c),
                    _ => {}
                }
                continue;
            }
            match c {
                '"' | '\'' => {
                    quote = Some(c);
                    self.buffer.push(c);
                }
                '(' | '[' => {
                    self.paren_depth += 1;
                    self.buffer.push(c);
                }
                ')' | ']' => {
                    self.paren_depth = self.paren_depth.saturating_sub(1);
                    self.buffer.push(c);
                }
                '{' if self.buffer.trim_end().ends_with('=') => {
                    self.init_depth = 1;
                    self.buffer.push(c);
                }
                '{' | '}' => {
                    self.flush_at(self.start_line);
                    self.fragments.push(Fragment::new(c.to_string(), source.line));
                }
                ';' if self.paren_depth == 0 => {
                    self.buffer.push(';');
                    self.flush_at(self.start_line);
                }
                ':' if self.paren_depth == 0 && self.is_case_label() => {
                    self.buffer.push(':');
                    self.flush_at(self.start_line);
                }
                _ => self.buffer.push(c),
            }
        }

        if self.paren_depth == 0 && self.init_depth == 0 {
            self.flush_at(self.start_line);
        }
    }

    fn is_case_label(&self) -> bool {
        let text = self.buffer.trim();
        text == "default" || text.starts_with("case ") || text.starts_with("case'") || text.starts_with("case(")
    }

    fn flush_at(&mut self, line: usize) {
        let text = self.buffer.trim();
        if !text.is_empty() {
            self.fragments.push(Fragment::new(text, line));
        }
        self.buffer.clear();
    }

    fn flush(&mut self) {
        self.flush_at(self.start_line);
    }
}
