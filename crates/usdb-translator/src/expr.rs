//! C expression text → Algo expression text
//!
//! Works on a flat token list rather than a tree: operators are renamed,
//! casts and address-of are dropped, `pow(a, b)` becomes `(a ^ b)`.

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum CToken {
    Ident(String),
    Number(String),
    /// String or char literal, quotes and escapes kept
    Literal(String),
    Punct(String),
}

impl CToken {
    pub fn is_punct(&self, p: &str) -> bool {
        matches!(self, CToken::Punct(s) if s == p)
    }

    pub fn ident(&self) -> Option<&str> {
        match self {
            CToken::Ident(name) => Some(name),
            _ => None,
        }
    }

    fn text(&self) -> &str {
        match self {
            CToken::Ident(s) | CToken::Number(s) | CToken::Literal(s) | CToken::Punct(s) => s,
        }
    }
}

const PUNCT3: &[&str] = &["<<=", ">>=", "..."];
const PUNCT2: &[&str] = &[
    "->", "++", "--", "==", "!=", "<=", ">=", "&&", "||", "+=", "-=", "*=", "/=", "%=", "&=",
    "|=", "^=", "<<", ">>",
];

/// Words that can make up a cast or a declaration's type
pub(crate) const C_TYPE_WORDS: &[&str] = &[
    "_Bool", "bool", "char", "const", "double", "float", "int", "long", "short", "signed",
    "size_t", "static", "unsigned", "void",
];

pub(crate) fn lex(text: &str) -> Vec<CToken> {
    let chars: Vec<char> = text.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
        } else if c.is_ascii_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            tokens.push(CToken::Ident(chars[start..i].iter().collect()));
        } else if c.is_ascii_digit()
            || (c == '.' && chars.get(i + 1).is_some_and(|n| n.is_ascii_digit()))
        {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '.') {
                // Exponent signs belong to the literal
                if matches!(chars[i], 'e' | 'E')
                    && matches!(chars.get(i + 1), Some('+') | Some('-'))
                    && !chars[start..i].iter().any(|d| matches!(d, 'x' | 'X'))
                {
                    i += 1;
                }
                i += 1;
            }
            tokens.push(CToken::Number(chars[start..i].iter().collect()));
        } else if c == '"' || c == '\'' {
            let start = i;
            i += 1;
            while i < chars.len() && chars[i] != c {
                if chars[i] == '\\' {
                    i += 1;
                }
                i += 1;
            }
            i = (i + 1).min(chars.len());
            tokens.push(CToken::Literal(chars[start..i].iter().collect()));
        } else {
            let rest: String = chars[i..chars.len().min(i + 3)].iter().collect();
            let punct = PUNCT3
                .iter()
                .chain(PUNCT2)
                .find(|p| rest.starts_with(**p))
                .map(|p| p.to_string())
                .unwrap_or_else(|| c.to_string());
            i += punct.chars().count();
            tokens.push(CToken::Punct(punct));
        }
    }
    tokens
}

/// Normalize a C numeric literal: suffixes dropped, hex to decimal,
/// `1.` and `.5` completed
pub(crate) fn number(text: &str) -> String {
    let lower = text.to_ascii_lowercase();
    if let Some(hex) = lower.strip_prefix("0x") {
        let digits = hex.trim_end_matches(['u', 'l']);
        if let Ok(value) = i64::from_str_radix(digits, 16) {
            return value.to_string();
        }
        return text.to_string();
    }

    let is_real = lower.contains('.') || lower.contains('e');
    let digits = if is_real {
        lower.trim_end_matches(['f', 'l'])
    } else {
        lower.trim_end_matches(['u', 'l'])
    };
    if !is_real {
        return digits.to_string();
    }
    if lower.contains('e') {
        return match digits.parse::<f64>() {
            Ok(value) => format!("{:?}", value),
            Err(_) => digits.to_string(),
        };
    }
    let mut out = digits.to_string();
    if out.starts_with('.') {
        out.insert(0, '0');
    }
    if out.ends_with('.') {
        out.push('0');
    }
    out
}

/// Rename identifiers that would read as Algo keywords
pub(crate) fn algo_identifier(name: &str) -> String {
    if usdb_lexer::is_reserved_word(name) {
        format!("{}_", name)
    } else {
        name.to_string()
    }
}

/// Algo spelling of a C library call
fn builtin_name(name: &str) -> Option<&'static str> {
    Some(match name {
        "fabs" | "abs" => "abs",
        "strlen" => "length",
        "log" => "ln",
        "log10" => "log",
        _ => return None,
    })
}

/// Translate a C expression
pub(crate) fn translate_expression(text: &str) -> String {
    render(&lex(text))
}

pub(crate) fn has_ternary(text: &str) -> bool {
    lex(text).iter().any(|t| t.is_punct("?"))
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Piece {
    Operand,
    Open,
    Close,
    Comma,
    Dot,
    Binary,
    Unary,
}

struct Output {
    text: String,
    last: Option<Piece>,
}

impl Output {
    fn push(&mut self, piece: Piece, text: &str) {
        let space = match (self.last, piece) {
            (None, _) => false,
            (_, Piece::Close | Piece::Comma | Piece::Dot) => false,
            (Some(Piece::Open | Piece::Dot | Piece::Unary), _) => false,
            (_, Piece::Binary) => true,
            (Some(Piece::Binary | Piece::Comma), _) => true,
            (Some(Piece::Operand | Piece::Close), Piece::Open) => false,
            _ => true,
        };
        if space {
            self.text.push(' ');
        }
        self.text.push_str(text);
        self.last = Some(piece);
    }

    fn unary_position(&self) -> bool {
        matches!(
            self.last,
            None | Some(Piece::Open | Piece::Comma | Piece::Binary | Piece::Unary)
        )
    }
}

pub(crate) fn render(tokens: &[CToken]) -> String {
    let mut out = Output {
        text: String::new(),
        last: None,
    };
    let mut i = 0;

    while i < tokens.len() {
        match &tokens[i] {
            CToken::Ident(name) => {
                let calls = tokens.get(i + 1).is_some_and(|t| t.is_punct("("));
                match name.as_str() {
                    "true" => out.push(Piece::Operand, "TRUE"),
                    "false" => out.push(Piece::Operand, "FALSE"),
                    "pow" if calls => {
                        let call = matching_close(tokens, i + 1)
                            .map(|close| (close, split_top_level(&tokens[i + 2..close])));
                        if let Some((close, args)) = call.filter(|(_, args)| args.len() == 2) {
                            let text = format!(
                                "({} ^ {})",
                                grouped(args[0]),
                                grouped(args[1])
                            );
                            out.push(Piece::Operand, &text);
                            i = close + 1;
                            continue;
                        }
                        out.push(Piece::Operand, "pow");
                    }
                    _ if calls => out.push(
                        Piece::Operand,
                        &builtin_name(name)
                            .map(str::to_string)
                            .unwrap_or_else(|| algo_identifier(name)),
                    ),
                    _ => out.push(Piece::Operand, &algo_identifier(name)),
                }
            }
            CToken::Number(n) => out.push(Piece::Operand, &number(n)),
            CToken::Literal(text) => out.push(Piece::Operand, text),
            CToken::Punct(p) => match p.as_str() {
                "(" => {
                    if let Some(close) = matching_close(tokens, i) {
                        if out.unary_position() && is_cast(tokens, i, close) {
                            i = close + 1;
                            continue;
                        }
                    }
                    out.push(Piece::Open, "(");
                }
                "[" => out.push(Piece::Open, "["),
                ")" | "]" => out.push(Piece::Close, p),
                "," => out.push(Piece::Comma, ","),
                "." | "->" => out.push(Piece::Dot, "."),
                "==" => out.push(Piece::Binary, "="),
                "!=" => out.push(Piece::Binary, "<>"),
                "&&" => out.push(Piece::Binary, "AND"),
                "||" => out.push(Piece::Binary, "OR"),
                "%" => out.push(Piece::Binary, "MOD"),
                "!" => out.push(Piece::Unary, "NOT "),
                "-" | "+" if out.unary_position() => {
                    if p == "-" {
                        out.push(Piece::Unary, "-");
                    }
                }
                // Address-of and pointer dereference have no Algo spelling
                "&" | "*" if out.unary_position() => {}
                _ => out.push(Piece::Binary, p),
            },
        }
        i += 1;
    }
    out.text
}

/// An operand of `^`, parenthesized unless it is a single term
pub(crate) fn grouped(tokens: &[CToken]) -> String {
    let mut depth = 0usize;
    let mut compound = false;
    for token in tokens {
        match token {
            CToken::Punct(p) if p == "(" || p == "[" => depth += 1,
            CToken::Punct(p) if p == ")" || p == "]" => depth = depth.saturating_sub(1),
            CToken::Punct(p) if depth == 0 && p != "." && p != "->" => compound = true,
            _ => {}
        }
    }
    let text = render(tokens);
    if compound {
        format!("({})", text)
    } else {
        text
    }
}

/// Index of the bracket closing the one at `open`
pub(crate) fn matching_close(tokens: &[CToken], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (index, token) in tokens.iter().enumerate().skip(open) {
        match token {
            CToken::Punct(p) if p == "(" || p == "[" || p == "{" => depth += 1,
            CToken::Punct(p) if p == ")" || p == "]" || p == "}" => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(index);
                }
            }
            _ => {}
        }
    }
    None
}

/// `(int)`, `(double)`, `(unsigned long)`, `(char *)` followed by an operand
fn is_cast(tokens: &[CToken], open: usize, close: usize) -> bool {
    if close <= open + 1 {
        return false;
    }
    let inner = &tokens[open + 1..close];
    let all_type_words = inner.iter().all(|t| match t {
        CToken::Ident(word) => C_TYPE_WORDS.contains(&word.as_str()),
        CToken::Punct(p) => p == "*",
        _ => false,
    });
    let operand_follows = match tokens.get(close + 1) {
        Some(CToken::Ident(_) | CToken::Number(_) | CToken::Literal(_)) => true,
        Some(CToken::Punct(p)) => p == "(" || p == "-" || p == "!",
        None => false,
    };
    all_type_words && operand_follows && inner.first().is_some_and(|t| t.ident().is_some())
}

/// Split on commas outside any brackets
pub(crate) fn split_top_level(tokens: &[CToken]) -> Vec<&[CToken]> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (index, token) in tokens.iter().enumerate() {
        match token.text() {
            "(" | "[" | "{" if matches!(token, CToken::Punct(_)) => depth += 1,
            ")" | "]" | "}" if matches!(token, CToken::Punct(_)) => {
                depth = depth.saturating_sub(1)
            }
            "," if depth == 0 && matches!(token, CToken::Punct(_)) => {
                parts.push(&tokens[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }
    if start < tokens.len() || !parts.is_empty() {
        parts.push(&tokens[start..]);
    }
    parts
}

/// Split source text on top-level commas, respecting strings and brackets
pub(crate) fn split_arguments(text: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        if let Some(q) = quote {
            current.push(c);
            if c == '\\' {
                if let Some(escaped) = chars.next() {
                    current.push(escaped);
                }
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => {
                quote = Some(c);
                current.push(c);
            }
            '(' | '[' | '{' => {
                depth += 1;
                current.push(c);
            }
            ')' | ']' | '}' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            ',' if depth == 0 => parts.push(std::mem::take(&mut current).trim().to_string()),
            _ => current.push(c),
        }
    }
    if !current.trim().is_empty() || !parts.is_empty() {
        parts.push(current.trim().to_string());
    }
    parts
}

/// Text between the parenthesis opening at the start of `text` and its match,
/// and whatever follows the match
pub(crate) fn parenthesized(text: &str) -> Option<(&str, &str)> {
    let text = text.trim_start();
    if !text.starts_with('(') {
        return None;
    }
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
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
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some((&text[1..index], text[index + 1..].trim()));
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tr(text: &str) -> String {
        translate_expression(text)
    }

    #[test]
    fn test_operator_rewrites() {
        assert_eq!(tr("a == b && c != d"), "a = b AND c <> d");
        assert_eq!(tr("!(x || y)"), "NOT (x OR y)");
        assert_eq!(tr("n % 2 == 0"), "n MOD 2 = 0");
        assert_eq!(tr("a <= -b"), "a <= -b");
    }

    #[test]
    fn test_pow_becomes_caret() {
        assert_eq!(tr("pow(x, 2) + 1"), "(x ^ 2) + 1");
        assert_eq!(tr("pow(a + b, pow(c, 2))"), "((a + b) ^ (c ^ 2))");
    }

    #[test]
    fn test_unclosed_pow_is_left_as_call() {
        assert_eq!(tr("pow("), "pow(");
        assert_eq!(tr("pow(x, 2"), "pow(x, 2");
    }

    #[test]
    fn test_casts_and_address_of_removed() {
        assert_eq!(tr("(double) sum / n"), "sum / n");
        assert_eq!(tr("(a + b) * 2"), "(a + b) * 2");
        assert_eq!(tr("&x"), "x");
        assert_eq!(tr("a & b"), "a & b");
    }

    #[test]
    fn test_members_and_calls() {
        assert_eq!(tr("p->x + q.y"), "p.x + q.y");
        assert_eq!(tr("max(a[i], b[i + 1])"), "max(a[i], b[i + 1])");
        assert_eq!(tr("fabs(x) + strlen(s)"), "abs(x) + length(s)");
    }

    #[test]
    fn test_keywords_and_booleans() {
        assert_eq!(tr("end + type"), "end_ + type_");
        assert_eq!(tr("done == true"), "done = TRUE");
    }

    #[test]
    fn test_numbers() {
        assert_eq!(number("0x1F"), "31");
        assert_eq!(number("2.5f"), "2.5");
        assert_eq!(number("10UL"), "10");
        assert_eq!(number(".5"), "0.5");
        assert_eq!(number("1e3"), "1000.0");
    }

    #[test]
    fn test_split_arguments_respects_nesting() {
        assert_eq!(
            split_arguments("\"%d, %d\", f(a, b), c[1]"),
            vec!["\"%d, %d\"", "f(a, b)", "c[1]"]
        );
        assert!(split_arguments("").is_empty());
    }

    #[test]
    fn test_parenthesized() {
        assert_eq!(parenthesized("(a > (b)) x = 1;"), Some(("a > (b)", "x = 1;")));
        assert_eq!(parenthesized("(s == \")\")"), Some(("s == \")\"", "")));
        assert_eq!(parenthesized("x"), None);
    }
}
