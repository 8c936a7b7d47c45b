// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Lexical analysis for Pixel Bender kernel sources.
//!
//! Tokenization is driven by logos. Whitespace is skipped by the generated
//! lexer; comments and preprocessor lines are real token kinds that
//! [`tokenize`] routes into side buckets so the grammar never sees them but
//! callers can still inspect them (the parser reads `#define` lines from the
//! directive bucket).
//!
//! # Examples
//!
//! ```
//! # use pbk_lexer::*;
//! let out = tokenize("#define TWO 2\nfloat4 p = float4(0.0);");
//! assert_eq!(out.directives.len(), 1);
//! assert_eq!(out.tokens[0].0, Token::FloatVector(4));
//! assert!(out.errors.is_empty());
//! ```

use logos::Logos;
use std::fmt;
use std::ops::Range;
use std::rc::Rc;

/// Dimensions of a `floatCxR` / `intCxR` matrix type keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatrixDims {
    pub columns: u8,
    pub rows: u8,
}

/// Pixel Bender token.
///
/// Type keywords carry their width so `float3` and `float3x3` never need a
/// second look at the source text. Keywords win over identifiers of equal
/// length, longer identifiers win over keyword prefixes (`integer`, `input2`).
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
pub enum Token {
    // === Trivia (bucketed by `tokenize`) ===
    /// `// ...` or `/* ... */`
    #[regex(r"//[^\n]*", |lex| lex.slice().to_string())]
    #[regex(r"/\*([^*]|\*+[^*/])*\*+/", |lex| lex.slice().to_string())]
    Comment(String),

    /// Preprocessor line, e.g. `#define TWO 2`
    #[regex(
        r"#[ \t]*(if|ifdef|ifndef|define|elif|else|endif|undef|pragma)[^\n]*",
        |lex| lex.slice().to_string()
    )]
    Directive(String),

    // === Keywords ===
    #[token("kernel")]
    Kernel,
    #[token("parameter")]
    Parameter,
    #[token("input")]
    Input,
    #[token("output")]
    Output,
    #[token("const")]
    Const,
    #[token("dependent")]
    Dependent,
    #[token("in")]
    In,
    #[token("out")]
    Out,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("for")]
    For,
    #[token("while")]
    While,
    #[token("do")]
    Do,
    #[token("break")]
    Break,
    #[token("continue")]
    Continue,
    #[token("return")]
    Return,
    #[token("null")]
    Null,
    #[token("true")]
    True,
    #[token("false")]
    False,

    // === Type keywords ===
    #[token("void")]
    Void,
    #[token("bool")]
    Bool,
    #[regex(r"bool[2-4]", trailing_digit)]
    BoolVector(u8),
    #[token("int")]
    Int,
    #[regex(r"int[2-4]", trailing_digit)]
    IntVector(u8),
    #[regex(r"int[2-4]x[2-4]", matrix_dims)]
    IntMatrix(MatrixDims),
    #[token("float")]
    Float,
    #[regex(r"float[2-4]", trailing_digit)]
    FloatVector(u8),
    #[regex(r"float[2-4]x[2-4]", matrix_dims)]
    FloatMatrix(MatrixDims),
    #[regex(r"pixel[1-4]", trailing_digit)]
    Pixel(u8),
    #[regex(r"image[1-4]", trailing_digit)]
    Image(u8),
    #[token("region")]
    Region,
    #[token("imageRef")]
    ImageRef,
    #[token("string")]
    StringType,

    // === Operators (multi-character first) ===
    #[token("==")]
    EqEq,
    #[token("!=")]
    BangEq,
    #[token("+=")]
    PlusEq,
    #[token("-=")]
    MinusEq,
    #[token("*=")]
    StarEq,
    #[token("/=")]
    SlashEq,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,
    #[token("++")]
    PlusPlus,
    #[token("--")]
    MinusMinus,
    #[token("&&")]
    AndAnd,
    #[token("||")]
    OrOr,
    #[token("^^")]
    CaretCaret,
    #[token("->")]
    Arrow,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("=")]
    Eq,
    #[token("!")]
    Bang,
    #[token("?")]
    Question,

    // === Delimiters ===
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(".")]
    Dot,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token(";")]
    Semicolon,

    // === Literals ===
    #[regex(r"0|[1-9][0-9]*", |lex| lex.slice().parse::<i64>().ok())]
    Integer(i64),

    #[regex(
        r"(0|[1-9][0-9]*)(\.[0-9]+([eE][+-]?[0-9]+)?|[eE][+-]?[0-9]+)",
        |lex| lex.slice().parse::<f64>().ok()
    )]
    Number(f64),

    #[regex(
        r#""([^"\\\n]|\\[bfnrtv"\\/]|\\u[0-9a-fA-F][0-9a-fA-F][0-9a-fA-F][0-9a-fA-F])*""#,
        |lex| {
            let s = lex.slice();
            unescape_string(&s[1..s.len() - 1])
        }
    )]
    String(String),

    #[regex(r"[_a-zA-Z][_a-zA-Z0-9]*", |lex| Rc::from(lex.slice()))]
    Ident(Rc<str>),
}

fn trailing_digit(lex: &mut logos::Lexer<Token>) -> Option<u8> {
    let digit = lex.slice().bytes().last()?;
    Some(digit - b'0')
}

fn matrix_dims(lex: &mut logos::Lexer<Token>) -> Option<MatrixDims> {
    let bytes = lex.slice().as_bytes();
    let rows = *bytes.last()?;
    let columns = *bytes.get(bytes.len().checked_sub(3)?)?;
    Some(MatrixDims {
        columns: columns - b'0',
        rows: rows - b'0',
    })
}

/// Unescape the content of a string literal (quotes already stripped).
fn unescape_string(s: &str) -> Option<String> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next()? {
            'b' => result.push('\u{8}'),
            'f' => result.push('\u{c}'),
            'n' => result.push('\n'),
            'r' => result.push('\r'),
            't' => result.push('\t'),
            'v' => result.push('\u{b}'),
            '"' => result.push('"'),
            '\\' => result.push('\\'),
            '/' => result.push('/'),
            'u' => {
                let hex: String = chars.by_ref().take(4).collect();
                let code = u32::from_str_radix(&hex, 16).ok()?;
                result.push(char::from_u32(code)?);
            }
            _ => return None,
        }
    }
    Some(result)
}

impl Token {
    /// Fixed spelling of keyword, operator and delimiter tokens.
    pub fn as_str(&self) -> Option<&'static str> {
        let s = match self {
            Token::Kernel => "kernel",
            Token::Parameter => "parameter",
            Token::Input => "input",
            Token::Output => "output",
            Token::Const => "const",
            Token::Dependent => "dependent",
            Token::In => "in",
            Token::Out => "out",
            Token::If => "if",
            Token::Else => "else",
            Token::For => "for",
            Token::While => "while",
            Token::Do => "do",
            Token::Break => "break",
            Token::Continue => "continue",
            Token::Return => "return",
            Token::Null => "null",
            Token::True => "true",
            Token::False => "false",
            Token::Void => "void",
            Token::Bool => "bool",
            Token::Int => "int",
            Token::Float => "float",
            Token::Region => "region",
            Token::ImageRef => "imageRef",
            Token::StringType => "string",
            Token::EqEq => "==",
            Token::BangEq => "!=",
            Token::PlusEq => "+=",
            Token::MinusEq => "-=",
            Token::StarEq => "*=",
            Token::SlashEq => "/=",
            Token::LtEq => "<=",
            Token::GtEq => ">=",
            Token::PlusPlus => "++",
            Token::MinusMinus => "--",
            Token::AndAnd => "&&",
            Token::OrOr => "||",
            Token::CaretCaret => "^^",
            Token::Arrow => "->",
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::Slash => "/",
            Token::Lt => "<",
            Token::Gt => ">",
            Token::Eq => "=",
            Token::Bang => "!",
            Token::Question => "?",
            Token::LParen => "(",
            Token::RParen => ")",
            Token::LBrace => "{",
            Token::RBrace => "}",
            Token::LBracket => "[",
            Token::RBracket => "]",
            Token::Dot => ".",
            Token::Comma => ",",
            Token::Colon => ":",
            Token::Semicolon => ";",
            _ => return None,
        };
        Some(s)
    }

    /// True for tokens that name a type (`float3`, `image4`, `void`, ...).
    pub fn is_type_keyword(&self) -> bool {
        matches!(
            self,
            Token::Void
                | Token::Bool
                | Token::BoolVector(_)
                | Token::Int
                | Token::IntVector(_)
                | Token::IntMatrix(_)
                | Token::Float
                | Token::FloatVector(_)
                | Token::FloatMatrix(_)
                | Token::Pixel(_)
                | Token::Image(_)
                | Token::Region
                | Token::ImageRef
                | Token::StringType
        )
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(s) = self.as_str() {
            return f.write_str(s);
        }
        match self {
            Token::Comment(text) | Token::Directive(text) => f.write_str(text),
            Token::BoolVector(n) => write!(f, "bool{n}"),
            Token::IntVector(n) => write!(f, "int{n}"),
            Token::IntMatrix(d) => write!(f, "int{}x{}", d.columns, d.rows),
            Token::FloatVector(n) => write!(f, "float{n}"),
            Token::FloatMatrix(d) => write!(f, "float{}x{}", d.columns, d.rows),
            Token::Pixel(n) => write!(f, "pixel{n}"),
            Token::Image(n) => write!(f, "image{n}"),
            Token::Integer(n) => write!(f, "{n}"),
            Token::Number(x) => write!(f, "{x:?}"),
            Token::String(s) => write!(f, "{s:?}"),
            Token::Ident(id) => f.write_str(id),
            _ => write!(f, "{self:?}"),
        }
    }
}

/// Input the tokenizer could not match.
///
/// Consecutive unmatched characters are merged into one error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub span: Range<usize>,
    pub text: String,
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unrecognized input `{}` at {}..{}",
            self.text, self.span.start, self.span.end
        )
    }
}

impl std::error::Error for LexError {}

/// Result of lexing one source text.
#[derive(Debug, Clone, Default)]
pub struct LexOutput {
    /// Grammar tokens paired with their byte ranges.
    pub tokens: Vec<(Token, Range<usize>)>,
    /// Comment text, including delimiters.
    pub comments: Vec<(String, Range<usize>)>,
    /// Whole preprocessor lines, starting at `#`.
    pub directives: Vec<(String, Range<usize>)>,
    pub errors: Vec<LexError>,
}

/// Tokenize `source`, collecting errors instead of stopping at the first.
pub fn tokenize(source: &str) -> LexOutput {
    let mut out = LexOutput::default();
    let mut lexer = Token::lexer(source);

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        match result {
            Ok(Token::Comment(text)) => out.comments.push((text, span)),
            Ok(Token::Directive(text)) => out.directives.push((text, span)),
            Ok(token) => out.tokens.push((token, span)),
            Err(()) => match out.errors.last_mut() {
                Some(last) if last.span.end == span.start => {
                    last.span.end = span.end;
                    last.text.push_str(&source[span]);
                }
                _ => out.errors.push(LexError {
                    text: source[span.clone()].to_string(),
                    span,
                }),
            },
        }
    }

    out
}
