//! Lexer for the model DSL.
//!
//! Produces a flat token stream with byte spans. Whitespace, `//` line
//! comments and `/* */` block comments are skipped. Keywords are plain
//! identifiers; the parser decides what they mean by position.

use std::fmt;

/// Byte-level source span for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl From<Span> for miette::SourceSpan {
    fn from(span: Span) -> Self {
        (span.start, span.len()).into()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Ident(String),
    Str(String),
    Int(i64),
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Colon,
    Semi,
    Comma,
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ident(s) => write!(f, "identifier `{s}`"),
            Self::Str(s) => write!(f, "string \"{s}\""),
            Self::Int(n) => write!(f, "integer {n}"),
            Self::LBrace => write!(f, "`{{`"),
            Self::RBrace => write!(f, "`}}`"),
            Self::LBracket => write!(f, "`[`"),
            Self::RBracket => write!(f, "`]`"),
            Self::Colon => write!(f, "`:`"),
            Self::Semi => write!(f, "`;`"),
            Self::Comma => write!(f, "`,`"),
            Self::Eof => write!(f, "end of input"),
        }
    }
}

/// A single lexical token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

/// A lexical error with the span it occurred at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub message: String,
    pub span: Span,
}

/// Tokenize `input`. The stream always ends with an [`TokenKind::Eof`] token.
pub fn tokenize(input: &str) -> Result<Vec<Token>, LexError> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let c = bytes[pos];
        let start = pos;

        if c.is_ascii_whitespace() {
            pos += 1;
            continue;
        }

        // comments
        if c == b'/' && bytes.get(pos + 1) == Some(&b'/') {
            while pos < bytes.len() && bytes[pos] != b'\n' {
                pos += 1;
            }
            continue;
        }
        if c == b'/' && bytes.get(pos + 1) == Some(&b'*') {
            pos += 2;
            loop {
                if pos + 1 >= bytes.len() {
                    return Err(LexError {
                        message: "unterminated block comment".into(),
                        span: Span::new(start, start + 2),
                    });
                }
                if bytes[pos] == b'*' && bytes[pos + 1] == b'/' {
                    pos += 2;
                    break;
                }
                pos += 1;
            }
            continue;
        }

        let single = match c {
            b'{' => Some(TokenKind::LBrace),
            b'}' => Some(TokenKind::RBrace),
            b'[' => Some(TokenKind::LBracket),
            b']' => Some(TokenKind::RBracket),
            b':' => Some(TokenKind::Colon),
            b';' => Some(TokenKind::Semi),
            b',' => Some(TokenKind::Comma),
            _ => None,
        };
        if let Some(kind) = single {
            pos += 1;
            tokens.push(Token {
                kind,
                span: Span::new(start, pos),
            });
            continue;
        }

        if c == b'"' {
            let (value, end) = lex_string(input, start)?;
            pos = end;
            tokens.push(Token {
                kind: TokenKind::Str(value),
                span: Span::new(start, end),
            });
            continue;
        }

        if c.is_ascii_digit() || (c == b'-' && bytes.get(pos + 1).is_some_and(u8::is_ascii_digit)) {
            pos += 1;
            while pos < bytes.len() && bytes[pos].is_ascii_digit() {
                pos += 1;
            }
            let text = &input[start..pos];
            let value = text.parse::<i64>().map_err(|_| LexError {
                message: format!("integer literal `{text}` out of range"),
                span: Span::new(start, pos),
            })?;
            tokens.push(Token {
                kind: TokenKind::Int(value),
                span: Span::new(start, pos),
            });
            continue;
        }

        if c.is_ascii_alphabetic() || c == b'_' {
            while pos < bytes.len()
                && (bytes[pos].is_ascii_alphanumeric() || bytes[pos] == b'_' || bytes[pos] == b'.')
            {
                pos += 1;
            }
            tokens.push(Token {
                kind: TokenKind::Ident(input[start..pos].to_string()),
                span: Span::new(start, pos),
            });
            continue;
        }

        let ch = input[start..].chars().next().unwrap_or('?');
        return Err(LexError {
            message: format!("unexpected character `{ch}`"),
            span: Span::new(start, start + ch.len_utf8()),
        });
    }

    tokens.push(Token {
        kind: TokenKind::Eof,
        span: Span::new(input.len(), input.len()),
    });
    Ok(tokens)
}

/// Lex a string literal starting at the opening quote. Returns the unescaped
/// value and the byte offset just past the closing quote.
fn lex_string(input: &str, start: usize) -> Result<(String, usize), LexError> {
    let mut value = String::new();
    let mut chars = input[start + 1..].char_indices();

    while let Some((offset, ch)) = chars.next() {
        let at = start + 1 + offset;
        match ch {
            '"' => return Ok((value, at + 1)),
            '\\' => match chars.next() {
                Some((_, '"')) => value.push('"'),
                Some((_, '\\')) => value.push('\\'),
                Some((_, 'n')) => value.push('\n'),
                Some((_, 't')) => value.push('\t'),
                Some((o, other)) => {
                    return Err(LexError {
                        message: format!("unknown escape `\\{other}`"),
                        span: Span::new(at, start + 1 + o + other.len_utf8()),
                    });
                }
                None => break,
            },
            '\n' => break,
            _ => value.push(ch),
        }
    }

    Err(LexError {
        message: "unterminated string literal".into(),
        span: Span::new(start, start + 1),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn tokenize_statement() {
        assert_eq!(
            kinds("create Domain DoEmail { dataType: String; }"),
            vec![
                TokenKind::Ident("create".into()),
                TokenKind::Ident("Domain".into()),
                TokenKind::Ident("DoEmail".into()),
                TokenKind::LBrace,
                TokenKind::Ident("dataType".into()),
                TokenKind::Colon,
                TokenKind::Ident("String".into()),
                TokenKind::Semi,
                TokenKind::RBrace,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn comments_are_skipped() {
        let input = "// line\npackage shop.model; /* block\n spanning */ 42";
        assert_eq!(
            kinds(input),
            vec![
                TokenKind::Ident("package".into()),
                TokenKind::Ident("shop.model".into()),
                TokenKind::Semi,
                TokenKind::Int(42),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn string_escapes_and_spans() {
        let tokens = tokenize(r#"label: "Say \"hi\"";"#).unwrap();
        assert_eq!(tokens[2].kind, TokenKind::Str("Say \"hi\"".into()));
        assert_eq!(tokens[2].span, Span::new(7, 19));
    }

    #[test]
    fn shorthand_types_are_strings() {
        assert_eq!(kinds(r#""*>1""#)[0], TokenKind::Str("*>1".into()));
    }

    #[test]
    fn negative_integers() {
        assert_eq!(kinds("-12")[0], TokenKind::Int(-12));
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let err = tokenize("label: \"oops").unwrap_err();
        assert_eq!(err.span.start, 7);
        assert!(err.message.contains("unterminated"));
    }

    #[test]
    fn unexpected_character_is_an_error() {
        let err = tokenize("a = b").unwrap_err();
        assert_eq!(err.span, Span::new(2, 3));
    }
}
