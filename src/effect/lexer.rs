//! Effect script tokenizer

use super::EffectError;

/// A lexical token with its byte offset in the source
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Ident(String),
    Int(u64),
    Float(f64),
    Str(String),
    PathSep,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Dot,
    Amp,
    Minus,
}

impl TokenKind {
    /// Human readable description for error messages
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Ident(name) => format!("identifier '{}'", name),
            TokenKind::Int(v) => format!("integer {}", v),
            TokenKind::Float(v) => format!("number {}", v),
            TokenKind::Str(_) => "string literal".to_string(),
            TokenKind::PathSep => "'::'".to_string(),
            TokenKind::LParen => "'('".to_string(),
            TokenKind::RParen => "')'".to_string(),
            TokenKind::LBracket => "'['".to_string(),
            TokenKind::RBracket => "']'".to_string(),
            TokenKind::Comma => "','".to_string(),
            TokenKind::Dot => "'.'".to_string(),
            TokenKind::Amp => "'&'".to_string(),
            TokenKind::Minus => "'-'".to_string(),
        }
    }
}

/// Split effect source into tokens, skipping whitespace and `//` comments
pub fn tokenize(source: &str) -> Result<Vec<Token>, EffectError> {
    let mut tokens = Vec::new();
    let mut chars = source.char_indices().peekable();

    while let Some(&(offset, c)) = chars.peek() {
        let kind = match c {
            c if c.is_whitespace() => {
                chars.next();
                continue;
            }
            '/' => {
                chars.next();
                if !matches!(chars.peek(), Some((_, '/'))) {
                    return Err(EffectError::new("unexpected '/'", offset));
                }
                while let Some((_, c)) = chars.next() {
                    if c == '\n' {
                        break;
                    }
                }
                continue;
            }
            ':' => {
                chars.next();
                match chars.next() {
                    Some((_, ':')) => TokenKind::PathSep,
                    _ => return Err(EffectError::new("expected '::'", offset)),
                }
            }
            '(' | ')' | '[' | ']' | ',' | '.' | '&' | '-' => {
                chars.next();
                match c {
                    '(' => TokenKind::LParen,
                    ')' => TokenKind::RParen,
                    '[' => TokenKind::LBracket,
                    ']' => TokenKind::RBracket,
                    ',' => TokenKind::Comma,
                    '.' => TokenKind::Dot,
                    '&' => TokenKind::Amp,
                    _ => TokenKind::Minus,
                }
            }
            '"' => {
                chars.next();
                let mut text = String::new();
                loop {
                    match chars.next() {
                        Some((_, '"')) => break,
                        Some((_, '\\')) => match chars.next() {
                            Some((_, 'n')) => text.push('\n'),
                            Some((_, other)) => text.push(other),
                            None => return Err(EffectError::new("unterminated string", offset)),
                        },
                        Some((_, c)) => text.push(c),
                        None => return Err(EffectError::new("unterminated string", offset)),
                    }
                }
                TokenKind::Str(text)
            }
            c if c.is_ascii_digit() => lex_number(&mut chars, offset)?,
            c if c.is_alphabetic() || c == '_' => {
                let mut name = String::new();
                while let Some(&(_, c)) = chars.peek() {
                    if c.is_alphanumeric() || c == '_' {
                        name.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                TokenKind::Ident(name)
            }
            other => {
                return Err(EffectError::new(
                    format!("unexpected character '{}'", other),
                    offset,
                ))
            }
        };
        tokens.push(Token { kind, offset });
    }

    Ok(tokens)
}

fn lex_number(
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
    offset: usize,
) -> Result<TokenKind, EffectError> {
    let mut text = String::new();
    let mut is_float = false;

    while let Some(&(_, c)) = chars.peek() {
        match c {
            '0'..='9' | '_' => {
                if c != '_' {
                    text.push(c);
                }
                chars.next();
            }
            '.' if !is_float => {
                // `1.0` is a float, `1.max(...)` would be a method call
                let mut lookahead = chars.clone();
                lookahead.next();
                if !matches!(lookahead.peek(), Some((_, '0'..='9'))) {
                    break;
                }
                is_float = true;
                text.push('.');
                chars.next();
            }
            _ => break,
        }
    }

    if is_float {
        text.parse()
            .map(TokenKind::Float)
            .map_err(|_| EffectError::new("invalid number", offset))
    } else {
        text.parse()
            .map(TokenKind::Int)
            .map_err(|_| EffectError::new("integer out of range", offset))
    }
}
