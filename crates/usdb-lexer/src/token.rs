//! Token definitions for USDB Algo

use logos::Logos;

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[logos(skip r"[ \t\r\n\f]+")]                  // Skip whitespace
#[logos(skip r"//[^\n]*")]                      // Skip line comments
#[logos(skip r"\{[^}]*\}")]                     // Skip { ... } comments
#[logos(skip r"/\*([^*]|\*+[^*/])*\*+/")]       // Skip /* ... */ comments
pub enum TokenKind {
    // === Keywords ===
    // Words are lexed as `Ident` and reclassified through `keyword()`,
    // which keeps the match case-insensitive.
    Algorithm,
    Const,
    Type,
    Var,
    Begin,
    End,
    Function,
    Procedure,
    If,
    Then,
    Else,
    While,
    Do,
    For,
    To,
    Step,
    Switch,
    Case,
    Default,
    Of,
    Return,
    Scan,
    Print,
    And,
    Or,
    Not,
    Div,
    Mod,
    True,
    False,
    Integer,
    Real,
    Boolean,
    Char,
    String,
    Array,
    Structure,

    // === Operators ===
    #[token("<-")]
    Assign,
    #[token("=")]
    Eq,
    #[token("<>")]
    #[token("!=")]
    NotEq,
    #[token("<")]
    Lt,
    #[token("<=")]
    Le,
    #[token(">")]
    Gt,
    #[token(">=")]
    Ge,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("^")]
    #[token("↑")]
    Caret,

    // === Delimiters ===
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,

    // === Punctuation ===
    #[token(";")]
    Semicolon,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token(".")]
    Dot,

    // === Literals ===
    #[regex(r"[0-9]+", priority = 2)]
    IntegerLiteral,

    #[regex(r"[0-9]+\.[0-9]+")]
    RealLiteral,

    #[regex(r#""([^"\\\n]|\\.)*""#)]
    StringLiteral,

    #[regex(r#"'([^'\\\n]|\\.)*'"#)]
    CharLiteral,

    // === Identifiers ===
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Ident,

    // === Malformed input, reported as lexer errors ===
    #[regex(r#""([^"\\\n]|\\.)*"#)]
    UnterminatedString,
    #[regex(r#"'([^'\\\n]|\\.)*"#)]
    UnterminatedChar,
    #[regex(r"\{[^}]*")]
    #[regex(r"/\*([^*]|\*+[^*/])*\**")]
    UnterminatedComment,

    // === Special ===
    Error,
    Eof,
}

/// Case-insensitive keyword table, sorted by spelling
pub(crate) const KEYWORDS: &[(&str, TokenKind)] = &[
    ("algorithm", TokenKind::Algorithm),
    ("and", TokenKind::And),
    ("array", TokenKind::Array),
    ("begin", TokenKind::Begin),
    ("boolean", TokenKind::Boolean),
    ("case", TokenKind::Case),
    ("char", TokenKind::Char),
    ("const", TokenKind::Const),
    ("default", TokenKind::Default),
    ("div", TokenKind::Div),
    ("do", TokenKind::Do),
    ("else", TokenKind::Else),
    ("end", TokenKind::End),
    ("false", TokenKind::False),
    ("for", TokenKind::For),
    ("function", TokenKind::Function),
    ("if", TokenKind::If),
    ("integer", TokenKind::Integer),
    ("mod", TokenKind::Mod),
    ("not", TokenKind::Not),
    ("of", TokenKind::Of),
    ("or", TokenKind::Or),
    ("print", TokenKind::Print),
    ("procedure", TokenKind::Procedure),
    ("real", TokenKind::Real),
    ("return", TokenKind::Return),
    ("scan", TokenKind::Scan),
    ("step", TokenKind::Step),
    ("string", TokenKind::String),
    ("structure", TokenKind::Structure),
    ("switch", TokenKind::Switch),
    ("then", TokenKind::Then),
    ("to", TokenKind::To),
    ("true", TokenKind::True),
    ("type", TokenKind::Type),
    ("var", TokenKind::Var),
    ("while", TokenKind::While),
];

/// Look up a word in the keyword table, ignoring case
pub fn keyword(word: &str) -> Option<TokenKind> {
    let lower = word.to_ascii_lowercase();
    KEYWORDS
        .binary_search_by(|(spelling, _)| spelling.cmp(&lower.as_str()))
        .ok()
        .map(|i| KEYWORDS[i].1)
}

/// Whether a word would be read as a keyword rather than an identifier
pub fn is_reserved_word(word: &str) -> bool {
    keyword(word).is_some()
}

impl TokenKind {
    pub fn is_keyword(&self) -> bool {
        KEYWORDS.iter().any(|(_, kind)| kind == self)
    }

    /// Tokens that close a statement list
    pub fn ends_statement_list(&self) -> bool {
        matches!(
            self,
            TokenKind::End | TokenKind::Else | TokenKind::Case | TokenKind::Default | TokenKind::Eof
        )
    }

    pub fn describe(&self) -> &'static str {
        match self {
            TokenKind::Algorithm => "'ALGORITHM'",
            TokenKind::Const => "'CONST'",
            TokenKind::Type => "'TYPE'",
            TokenKind::Var => "'VAR'",
            TokenKind::Begin => "'BEGIN'",
            TokenKind::End => "'END'",
            TokenKind::Function => "'FUNCTION'",
            TokenKind::Procedure => "'PROCEDURE'",
            TokenKind::If => "'IF'",
            TokenKind::Then => "'THEN'",
            TokenKind::Else => "'ELSE'",
            TokenKind::While => "'WHILE'",
            TokenKind::Do => "'DO'",
            TokenKind::For => "'FOR'",
            TokenKind::To => "'TO'",
            TokenKind::Step => "'STEP'",
            TokenKind::Switch => "'SWITCH'",
            TokenKind::Case => "'CASE'",
            TokenKind::Default => "'DEFAULT'",
            TokenKind::Of => "'OF'",
            TokenKind::Return => "'RETURN'",
            TokenKind::Scan => "'SCAN'",
            TokenKind::Print => "'PRINT'",
            TokenKind::And => "'AND'",
            TokenKind::Or => "'OR'",
            TokenKind::Not => "'NOT'",
            TokenKind::Div => "'DIV'",
            TokenKind::Mod => "'MOD'",
            TokenKind::True => "'TRUE'",
            TokenKind::False => "'FALSE'",
            TokenKind::Integer => "'INTEGER'",
            TokenKind::Real => "'REAL'",
            TokenKind::Boolean => "'BOOLEAN'",
            TokenKind::Char => "'CHAR'",
            TokenKind::String => "'STRING'",
            TokenKind::Array => "'ARRAY'",
            TokenKind::Structure => "'STRUCTURE'",
            TokenKind::Assign => "'<-'",
            TokenKind::Eq => "'='",
            TokenKind::NotEq => "'<>'",
            TokenKind::Lt => "'<'",
            TokenKind::Le => "'<='",
            TokenKind::Gt => "'>'",
            TokenKind::Ge => "'>='",
            TokenKind::Plus => "'+'",
            TokenKind::Minus => "'-'",
            TokenKind::Star => "'*'",
            TokenKind::Slash => "'/'",
            TokenKind::Caret => "'^'",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::Semicolon => "';'",
            TokenKind::Comma => "','",
            TokenKind::Colon => "':'",
            TokenKind::Dot => "'.'",
            TokenKind::IntegerLiteral => "integer",
            TokenKind::RealLiteral => "real number",
            TokenKind::StringLiteral => "string",
            TokenKind::CharLiteral => "character",
            TokenKind::Ident => "identifier",
            TokenKind::UnterminatedString => "unterminated string",
            TokenKind::UnterminatedChar => "unterminated character",
            TokenKind::UnterminatedComment => "unterminated comment",
            TokenKind::Error => "error",
            TokenKind::Eof => "end of file",
        }
    }
}
