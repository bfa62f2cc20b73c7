//! Typed view of the type strings clang prints in `qualType`, such as `const char *`,
//! `Uint8 [16]` or `void (*)(void *, int)`.
//!
//! clang's JSON dump does not carry a structured type tree for declarations, only the printed
//! type, so this module rebuilds one: specifiers first, then an abstract declarator read with the
//! usual inside-out rules.

use std::str::FromStr;
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Void,
    Bool,
    Char,
    SignedChar,
    UnsignedChar,
    WChar,
    Short,
    UnsignedShort,
    Int,
    UnsignedInt,
    Long,
    UnsignedLong,
    LongLong,
    UnsignedLongLong,
    Int128,
    UnsignedInt128,
    Float,
    Double,
    LongDouble,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Qualifier {
    Const,
    Volatile,
    ConstVolatile,
}

impl Qualifier {
    fn from_flags(konst: bool, volatile: bool) -> Option<Qualifier> {
        match (konst, volatile) {
            (false, false) => None,
            (true, false) => Some(Qualifier::Const),
            (false, true) => Some(Qualifier::Volatile),
            (true, true) => Some(Qualifier::ConstVolatile),
        }
    }

    pub fn is_const(self) -> bool {
        matches!(self, Qualifier::Const | Qualifier::ConstVolatile)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Struct,
    Union,
    Class,
}

impl RecordKind {
    /// Parses the `tagUsed` value of a `RecordDecl`.
    pub fn from_tag(tag: &str) -> Option<RecordKind> {
        match tag {
            "struct" => Some(RecordKind::Struct),
            "union" => Some(RecordKind::Union),
            "class" => Some(RecordKind::Class),
            _ => None,
        }
    }
}

/// A native type. Names refer to entries of the type registry built from the parsed headers;
/// anonymous enums and records have no name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum CType {
    Primitive(PrimitiveKind),
    Qualified {
        qualifier: Qualifier,
        inner: Box<CType>,
    },
    Enum(Option<String>),
    Typedef(String),
    Record {
        kind: RecordKind,
        name: Option<String>,
    },
    Pointer(Box<CType>),
    Array {
        element: Box<CType>,
        size: Option<u64>,
    },
    Function {
        ret: Box<CType>,
        params: Vec<CType>,
        variadic: bool,
    },
}

impl CType {
    /// The type with every top-level qualifier removed.
    pub fn unqualified(&self) -> &CType {
        match self {
            CType::Qualified { inner, .. } => inner.unqualified(),
            other => other,
        }
    }

    /// For `T (*)(...)` (possibly qualified), returns the function type.
    pub fn as_function_pointer(&self) -> Option<&CType> {
        match self.unqualified() {
            CType::Pointer(pointee) => match pointee.unqualified() {
                f @ CType::Function { .. } => Some(f),
                _ => None,
            },
            _ => None,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("cannot parse type {text:?}: {reason}")]
pub struct TypeParseError {
    pub text: String,
    pub reason: String,
}

impl FromStr for CType {
    type Err = TypeParseError;

    fn from_str(text: &str) -> Result<CType, TypeParseError> {
        let error = |reason: String| TypeParseError {
            text: text.to_string(),
            reason,
        };
        let tokens = tokenize(text).map_err(error)?;
        let mut parser = Parser { tokens, pos: 0 };
        let ty = parser.type_name().map_err(error)?;
        if let Some(token) = parser.peek() {
            return Err(error(format!("unexpected trailing token {token:?}")));
        }
        Ok(ty)
    }
}

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Ident(String),
    Number(u64),
    /// `(unnamed struct at file.h:3:5)` and friends, kept whole.
    Anonymous(String),
    Star,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Ellipsis,
}

fn tokenize(text: &str) -> Result<Vec<Token>, String> {
    let bytes = text.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];
        match c {
            b' ' | b'\t' => i += 1,
            b'*' => {
                tokens.push(Token::Star);
                i += 1;
            }
            b'(' => {
                let rest = &text[i + 1..];
                if rest.starts_with("unnamed ") || rest.starts_with("anonymous ") {
                    let end = matching_paren(bytes, i)
                        .ok_or_else(|| "unterminated anonymous type".to_string())?;
                    tokens.push(Token::Anonymous(text[i + 1..end].to_string()));
                    i = end + 1;
                } else {
                    tokens.push(Token::LParen);
                    i += 1;
                }
            }
            b')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            b'[' => {
                tokens.push(Token::LBracket);
                i += 1;
            }
            b']' => {
                tokens.push(Token::RBracket);
                i += 1;
            }
            b',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            b'.' if text[i..].starts_with("...") => {
                tokens.push(Token::Ellipsis);
                i += 3;
            }
            b'0'..=b'9' => {
                let start = i;
                while i < bytes.len() && bytes[i].is_ascii_digit() {
                    i += 1;
                }
                let n = text[start..i]
                    .parse()
                    .map_err(|e| format!("bad array size: {e}"))?;
                tokens.push(Token::Number(n));
            }
            c if c.is_ascii_alphabetic() || c == b'_' => {
                let start = i;
                while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                    i += 1;
                }
                let word = &text[start..i];
                if word == "__attribute__" {
                    // Attributes such as noreturn or a calling convention say nothing about layout.
                    let open = i + (text[i..].len() - text[i..].trim_start().len());
                    if bytes.get(open) != Some(&b'(') {
                        return Err("malformed __attribute__".to_string());
                    }
                    i = matching_paren(bytes, open)
                        .ok_or_else(|| "unterminated __attribute__".to_string())?
                        + 1;
                } else {
                    tokens.push(Token::Ident(word.to_string()));
                }
            }
            _ => {
                let other = text[i..].chars().next().unwrap_or('?');
                return Err(format!("unexpected character {other:?}"));
            }
        }
    }
    Ok(tokens)
}

fn matching_paren(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, &b) in bytes.iter().enumerate().skip(open) {
        match b {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

const BUILTIN_WORDS: &[&str] = &[
    "void", "_Bool", "bool", "char", "short", "int", "long", "signed", "unsigned", "float",
    "double", "__int128", "wchar_t",
];

const IGNORED_QUALIFIERS: &[&str] = &[
    "restrict",
    "__restrict",
    "_Nonnull",
    "_Nullable",
    "_Null_unspecified",
    "__unaligned",
    "__cdecl",
    "__stdcall",
    "__fastcall",
];

/// One step of a declarator, applied to the type built so far.
enum Op {
    Pointer,
    Qualify(Qualifier),
    Array(Option<u64>),
    Function(Vec<CType>, bool),
}

impl Op {
    fn apply(self, ty: CType) -> CType {
        match self {
            Op::Pointer => CType::Pointer(Box::new(ty)),
            Op::Qualify(qualifier) => CType::Qualified {
                qualifier,
                inner: Box::new(ty),
            },
            Op::Array(size) => CType::Array {
                element: Box::new(ty),
                size,
            },
            Op::Function(params, variadic) => CType::Function {
                ret: Box::new(ty),
                params,
                variadic,
            },
        }
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset)
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: Token) -> Result<(), String> {
        if self.eat(&token) {
            Ok(())
        } else {
            Err(format!("expected {token:?}, found {:?}", self.peek()))
        }
    }

    fn type_name(&mut self) -> Result<CType, String> {
        let base = self.specifiers()?;
        let ops = self.declarator()?;
        Ok(ops.into_iter().fold(base, |ty, op| op.apply(ty)))
    }

    fn specifiers(&mut self) -> Result<CType, String> {
        let (mut konst, mut volatile) = (false, false);
        let mut words: Vec<String> = Vec::new();
        let mut base: Option<CType> = None;
        while let Some(Token::Ident(word)) = self.peek().cloned() {
            match word.as_str() {
                "const" => konst = true,
                "volatile" => volatile = true,
                w if IGNORED_QUALIFIERS.contains(&w) => {}
                "struct" | "union" | "class" | "enum" => {
                    self.pos += 1;
                    let name = match self.peek().cloned() {
                        Some(Token::Ident(name)) => Some(name),
                        Some(Token::Anonymous(_)) => None,
                        other => return Err(format!("expected tag name, found {other:?}")),
                    };
                    self.pos += 1;
                    base = Some(match word.as_str() {
                        "enum" => CType::Enum(name),
                        "union" => CType::Record {
                            kind: RecordKind::Union,
                            name,
                        },
                        "class" => CType::Record {
                            kind: RecordKind::Class,
                            name,
                        },
                        _ => CType::Record {
                            kind: RecordKind::Struct,
                            name,
                        },
                    });
                    continue;
                }
                w if BUILTIN_WORDS.contains(&w) => words.push(word.clone()),
                _ if base.is_none() && words.is_empty() => base = Some(CType::Typedef(word.clone())),
                _ => break,
            }
            self.pos += 1;
        }
        let base = match (base, words.is_empty()) {
            (Some(base), true) => base,
            (None, false) => CType::Primitive(primitive(&words)?),
            (None, true) => return Err("missing type specifier".to_string()),
            (Some(_), false) => return Err("conflicting type specifiers".to_string()),
        };
        Ok(match Qualifier::from_flags(konst, volatile) {
            Some(qualifier) => CType::Qualified {
                qualifier,
                inner: Box::new(base),
            },
            None => base,
        })
    }

    /// Reads an abstract declarator and returns its steps in application order: leading
    /// pointers, then array/function suffixes innermost first, then the parenthesized part.
    fn declarator(&mut self) -> Result<Vec<Op>, String> {
        let mut ops = Vec::new();
        while self.eat(&Token::Star) {
            ops.push(Op::Pointer);
            let (mut konst, mut volatile) = (false, false);
            while let Some(Token::Ident(word)) = self.peek() {
                match word.as_str() {
                    "const" => konst = true,
                    "volatile" => volatile = true,
                    w if IGNORED_QUALIFIERS.contains(&w) => {}
                    _ => break,
                }
                self.pos += 1;
            }
            if let Some(qualifier) = Qualifier::from_flags(konst, volatile) {
                ops.push(Op::Qualify(qualifier));
            }
        }

        let mut nested = Vec::new();
        if self.peek() == Some(&Token::LParen)
            && matches!(
                self.peek_at(1),
                Some(Token::Star | Token::LParen | Token::LBracket)
            )
        {
            self.pos += 1;
            nested = self.declarator()?;
            self.expect(Token::RParen)?;
        }

        let mut suffixes = Vec::new();
        loop {
            if self.eat(&Token::LBracket) {
                let size = match self.peek() {
                    Some(&Token::Number(n)) => {
                        self.pos += 1;
                        Some(n)
                    }
                    _ => None,
                };
                self.expect(Token::RBracket)?;
                suffixes.push(Op::Array(size));
            } else if self.eat(&Token::LParen) {
                let (params, variadic) = self.parameters()?;
                suffixes.push(Op::Function(params, variadic));
            } else {
                break;
            }
        }
        ops.extend(suffixes.into_iter().rev());
        ops.extend(nested);
        Ok(ops)
    }

    /// Reads a parameter list; the opening parenthesis has been consumed.
    fn parameters(&mut self) -> Result<(Vec<CType>, bool), String> {
        let mut params = Vec::new();
        let mut variadic = false;
        if self.eat(&Token::RParen) {
            return Ok((params, variadic));
        }
        loop {
            if self.eat(&Token::Ellipsis) {
                variadic = true;
            } else {
                params.push(self.type_name()?);
            }
            if !self.eat(&Token::Comma) {
                self.expect(Token::RParen)?;
                break;
            }
        }
        if let [CType::Primitive(PrimitiveKind::Void)] = params.as_slice() {
            params.clear();
        }
        Ok((params, variadic))
    }
}

fn primitive(words: &[String]) -> Result<PrimitiveKind, String> {
    use PrimitiveKind::*;
    let has = |w: &str| words.iter().any(|x| x == w);
    let longs = words.iter().filter(|w| *w == "long").count();
    let unsigned = has("unsigned");
    let kind = if has("void") {
        Void
    } else if has("_Bool") || has("bool") {
        Bool
    } else if has("float") {
        Float
    } else if has("double") {
        if longs > 0 { LongDouble } else { Double }
    } else if has("wchar_t") {
        WChar
    } else if has("char") {
        if unsigned {
            UnsignedChar
        } else if has("signed") {
            SignedChar
        } else {
            Char
        }
    } else if has("__int128") {
        if unsigned { UnsignedInt128 } else { Int128 }
    } else if has("short") {
        if unsigned { UnsignedShort } else { Short }
    } else {
        match (longs, unsigned) {
            (0, false) => Int,
            (0, true) => UnsignedInt,
            (1, false) => Long,
            (1, true) => UnsignedLong,
            (2, false) => LongLong,
            (2, true) => UnsignedLongLong,
            _ => return Err(format!("unsupported specifiers {words:?}")),
        }
    };
    Ok(kind)
}
