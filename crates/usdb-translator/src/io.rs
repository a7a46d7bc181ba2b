//! `printf` / `scanf` / `puts` → `PRINT` / `SCAN`

use crate::expr::{split_arguments, translate_expression};

/// Conversion letters that end a `%` specification
const CONVERSIONS: &str = "diouxXfFeEgGcsp";

/// `printf("x = %d\n", x)` → `PRINT("x = ", x)`.
///
/// The format is cut into literal pieces interleaved with the arguments;
/// a trailing `\n` is dropped since PRINT ends the line itself.
pub(crate) fn print_statement(args: &str) -> String {
    let args = split_arguments(args);
    let Some((format, values)) = args.split_first() else {
        return "PRINT()".to_string();
    };
    let Some(raw) = string_body(format) else {
        let items: Vec<String> = args.iter().map(|a| translate_expression(a)).collect();
        return format!("PRINT({})", items.join(", "));
    };

    let mut items = Vec::new();
    let mut values = values.iter();
    let mut literal = String::new();
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                literal.push(c);
                if let Some(escaped) = chars.next() {
                    literal.push(escaped);
                }
            }
            '%' if chars.peek() == Some(&'%') => {
                chars.next();
                literal.push('%');
            }
            '%' => {
                // flags, width, precision and length modifiers
                for spec in chars.by_ref() {
                    if CONVERSIONS.contains(spec) {
                        break;
                    }
                }
                if !literal.is_empty() {
                    items.push(format!("\"{}\"", std::mem::take(&mut literal)));
                }
                if let Some(value) = values.next() {
                    items.push(translate_expression(value));
                }
            }
            _ => literal.push(c),
        }
    }

    if let Some(len) = literal.strip_suffix("\\n").map(str::len) {
        literal.truncate(len);
    }
    if !literal.is_empty() {
        items.push(format!("\"{}\"", literal));
    }
    items.extend(values.map(|v| translate_expression(v)));
    format!("PRINT({})", items.join(", "))
}

/// `puts(s)` prints its argument and a newline, exactly like PRINT
pub(crate) fn puts_statement(args: &str) -> String {
    format!("PRINT({})", translate_expression(args))
}

/// `scanf("%d %lf", &a, &b)` → `SCAN(a, b)`; `None` when nothing is read
pub(crate) fn scan_statement(args: &str) -> Option<String> {
    let args = split_arguments(args);
    let targets: Vec<String> = args
        .iter()
        .skip(1)
        .map(|a| translate_expression(a))
        .collect();
    if targets.is_empty() {
        return None;
    }
    Some(format!("SCAN({})", targets.join(", ")))
}

fn string_body(text: &str) -> Option<&str> {
    let text = text.trim();
    if text.len() >= 2 && text.starts_with('"') && text.ends_with('"') {
        Some(&text[1..text.len() - 1])
    } else {
        None
    }
}
