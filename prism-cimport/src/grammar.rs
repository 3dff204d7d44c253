//! Parser for the front-end's qualified-type strings.
//!
//! The AST dump carries every type both structurally and as C source text
//! (`const unsigned long int * const [4]`); the importer parses the text
//! form. Qualifiers are discarded, primitive spellings collapse onto a fixed
//! canonical table, identifiers resolve through the context's typedef table
//! and tagged references through the tag table (falling back to
//! [`Type::Incomplete`] for forward references).
//!
//! Parsing stops at the first token that cannot extend the type, so feeding
//! a function declaration's own type string (`int (int, char *)`) yields its
//! return type. Unknown primitives or identifiers are errors; the strings
//! come straight from the front-end, so a failure here means the schema
//! drifted.

use anyhow::{Result, bail};

use crate::model::{ImportContext, Type, TypeId};

/// Qualifiers that may precede a type or trail a pointer; all are dropped.
const QUALIFIERS: [&str; 7] = [
    "const",
    "volatile",
    "restrict",
    "__unaligned",
    "__ptr32",
    "__sptr",
    "__uptr",
];

/// Words that can start or continue a primitive spelling.
const PRIMITIVE_WORDS: [&str; 9] = [
    "signed", "unsigned", "short", "long", "int", "char", "float", "double", "_Bool",
];

/// Parse a qualified-type string into the context's arena.
pub fn parse_type(ctx: &mut ImportContext, input: &str) -> Result<TypeId> {
    let tokens = lex(input)?;
    let mut parser = Parser {
        ctx,
        tokens,
        pos: 0,
    };
    parser.parse_qualified()
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Word(String),
    Star,
    LBracket,
    RBracket,
    LParen,
    RParen,
    Comma,
    Ellipsis,
}

fn lex(input: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '*' => {
                chars.next();
                tokens.push(Token::Star);
            }
            '[' => {
                chars.next();
                tokens.push(Token::LBracket);
            }
            ']' => {
                chars.next();
                tokens.push(Token::RBracket);
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            ',' => {
                chars.next();
                tokens.push(Token::Comma);
            }
            '.' => {
                for _ in 0..3 {
                    if chars.next() != Some('.') {
                        bail!("unresolved type `{input}`");
                    }
                }
                tokens.push(Token::Ellipsis);
            }
            c if c.is_ascii_alphanumeric() || c == '_' => {
                let mut word = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_ascii_alphanumeric() || c == '_' {
                        word.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Word(word));
            }
            _ => bail!("unresolved type `{input}`"),
        }
    }
    Ok(tokens)
}

struct Parser<'a> {
    ctx: &'a mut ImportContext,
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn skip_qualifiers(&mut self) {
        while let Some(Token::Word(word)) = self.peek() {
            if QUALIFIERS.contains(&word.as_str()) {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    /// `type_1`: leading qualifiers, then a type.
    fn parse_qualified(&mut self) -> Result<TypeId> {
        self.skip_qualifiers();
        self.parse_type()
    }

    fn parse_type(&mut self) -> Result<TypeId> {
        let mut ty = self.parse_primary()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.pos += 1;
                    self.skip_qualifiers();
                    ty = self.ctx.alloc(Type::Pointer(ty));
                }
                Some(Token::LBracket) => {
                    self.pos += 1;
                    let len = match self.next() {
                        Some(Token::RBracket) => None,
                        Some(Token::Word(word)) => {
                            let len = word
                                .parse::<u64>()
                                .map_err(|_| unresolved(&self.tokens))?;
                            match self.next() {
                                Some(Token::RBracket) => Some(len),
                                _ => bail!(unresolved(&self.tokens)),
                            }
                        }
                        _ => bail!(unresolved(&self.tokens)),
                    };
                    ty = self.ctx.alloc(Type::Array { element: ty, len });
                }
                // A `(*)` marks a function type; a bare `(` is the start of
                // trailing text we do not consume.
                Some(Token::LParen)
                    if self.peek_at(1) == Some(&Token::Star)
                        && self.peek_at(2) == Some(&Token::RParen) =>
                {
                    self.pos += 3;
                    let args = self.parse_argument_list()?;
                    ty = self.ctx.alloc(Type::Function { args, ret: ty });
                }
                _ => break,
            }
        }
        Ok(ty)
    }

    fn parse_argument_list(&mut self) -> Result<Vec<TypeId>> {
        if self.next() != Some(Token::LParen) {
            bail!(unresolved(&self.tokens));
        }
        let mut args = Vec::new();
        if self.peek() == Some(&Token::RParen) {
            self.pos += 1;
            return Ok(args);
        }
        loop {
            if self.peek() == Some(&Token::Ellipsis) {
                self.pos += 1;
                args.push(self.ctx.alloc(Type::Varargs));
            } else {
                args.push(self.parse_qualified()?);
            }
            match self.next() {
                Some(Token::Comma) => continue,
                Some(Token::RParen) => break,
                _ => bail!(unresolved(&self.tokens)),
            }
        }
        Ok(args)
    }

    fn parse_primary(&mut self) -> Result<TypeId> {
        let word = match self.next() {
            Some(Token::Word(word)) => word,
            Some(Token::Ellipsis) => return Ok(self.ctx.alloc(Type::Varargs)),
            _ => bail!(unresolved(&self.tokens)),
        };
        if word == "void" {
            return Ok(self.ctx.alloc(Type::Void));
        }
        if matches!(word.as_str(), "struct" | "union" | "enum") {
            let tag = match self.next() {
                Some(Token::Word(tag)) => tag,
                _ => bail!(unresolved(&self.tokens)),
            };
            return match self.ctx.tagged.get(&tag) {
                Some(&id) => Ok(id),
                None => Ok(self.ctx.alloc(Type::Incomplete(tag))),
            };
        }
        if PRIMITIVE_WORDS.contains(&word.as_str()) || word == "__int128" {
            return self.parse_primitive(word);
        }
        // A plain identifier: a typedef, or a builtin tag spelled without
        // its keyword.
        if let Some(&id) = self.ctx.typedefs.get(&word) {
            Ok(id)
        } else if let Some(&id) = self.ctx.tagged.get(&word) {
            Ok(id)
        } else {
            bail!("unresolved type `{word}`")
        }
    }

    fn parse_primitive(&mut self, first: String) -> Result<TypeId> {
        let mut words = vec![first];
        while let Some(Token::Word(word)) = self.peek() {
            if PRIMITIVE_WORDS.contains(&word.as_str()) || word == "__int128" {
                words.push(word.clone());
                self.pos += 1;
            } else {
                break;
            }
        }
        let ty = canonical_primitive(&words)
            .ok_or_else(|| anyhow::anyhow!("unresolved type `{}`", words.join(" ")))?;
        Ok(self.ctx.alloc(ty))
    }
}

fn unresolved(tokens: &[Token]) -> anyhow::Error {
    anyhow::anyhow!("unresolved type (near token {tokens:?})")
}

/// Collapse a primitive spelling onto its canonical name. Every combination
/// the C standard allows has exactly one entry.
fn canonical_primitive(words: &[String]) -> Option<Type> {
    let mut unsigned = false;
    let mut longs = 0u32;
    let mut short = false;
    let mut specifier: Option<&str> = None;
    for word in words {
        match word.as_str() {
            "signed" => {}
            "unsigned" => unsigned = true,
            "long" => longs += 1,
            "short" => short = true,
            other => {
                if specifier.is_some() {
                    return None;
                }
                specifier = Some(other);
            }
        }
    }

    let integer = |name: &str| Some(Type::Integer(name.to_string()));
    let float = |name: &str| Some(Type::Float(name.to_string()));

    match specifier {
        Some("char") => integer("char"),
        Some("_Bool") => integer("uint8"),
        Some("__int128") => integer(if unsigned { "uint128" } else { "int128" }),
        Some("float") => float("float"),
        Some("double") => {
            if longs > 0 {
                float("float80")
            } else {
                float("double")
            }
        }
        Some("int") | None => {
            if short {
                integer(if unsigned { "ushort" } else { "short" })
            } else {
                match longs {
                    0 => integer(if unsigned { "uint" } else { "int" }),
                    1 => integer(if unsigned { "ulong" } else { "long" }),
                    2 => integer(if unsigned { "uint64" } else { "int64" }),
                    _ => None,
                }
            }
        }
        _ => None,
    }
}
