//! Recursive descent parser: model DSL tokens → statements.
//!
//! ```text
//! file      := ( "package" name ";" | statement )*
//! statement := ("create" | "alter") Entity name "{" entry* "}" ";"?
//!            | "declare" Entity name ";"
//! entry     := field ":" value ";"
//!            | head name "{" entry* "}" ";"?
//! value     := "string" | integer | "true" | "false" | key | "[" key ("," key)* ","? "]"
//! ```
//!
//! The parser knows nothing about the grammar: whether `field` exists, or
//! whether `head` names a child field or a child entity, is decided by the
//! loader.

use super::lexer::{self, LexError, Span, Token, TokenKind};

/// A value with the span it was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Create,
    Alter,
    Declare,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    String(String),
    Integer(i64),
    Boolean(bool),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Property {
        field: Spanned<String>,
        value: Spanned<Literal>,
    },
    Links {
        field: Spanned<String>,
        targets: Vec<Spanned<String>>,
    },
    Child {
        head: Spanned<String>,
        name: Spanned<String>,
        body: Vec<Entry>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub verb: Verb,
    /// Package in effect when the statement was read.
    pub package: Option<String>,
    pub entity: Spanned<String>,
    pub name: Spanned<String>,
    pub body: Vec<Entry>,
}

/// A syntax error with the span it occurred at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    pub span: Span,
}

impl From<LexError> for ParseError {
    fn from(err: LexError) -> Self {
        Self {
            message: err.message,
            span: err.span,
        }
    }
}

/// Parse a whole DSL source into statements.
pub fn parse(input: &str) -> Result<Vec<Statement>, ParseError> {
    let tokens = lexer::tokenize(input)?;
    Parser { tokens, pos: 0 }.file()
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        // tokenize always terminates the stream with Eof
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    fn error(&self, expected: &str) -> ParseError {
        let token = self.peek();
        ParseError {
            message: format!("expected {expected}, found {}", token.kind),
            span: token.span,
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        if self.peek().kind == kind {
            Ok(self.advance())
        } else {
            Err(self.error(&kind.to_string()))
        }
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if &self.peek().kind == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    fn ident(&mut self, what: &str) -> Result<Spanned<String>, ParseError> {
        match &self.peek().kind {
            TokenKind::Ident(name) => {
                let node = name.clone();
                let span = self.advance().span;
                Ok(Spanned::new(node, span))
            }
            _ => Err(self.error(what)),
        }
    }

    fn file(mut self) -> Result<Vec<Statement>, ParseError> {
        let mut package = None;
        let mut statements = Vec::new();

        loop {
            let keyword = match &self.peek().kind {
                TokenKind::Eof => break,
                TokenKind::Ident(word) => word.clone(),
                _ => return Err(self.error("`package`, `create`, `alter` or `declare`")),
            };
            let verb = match keyword.as_str() {
                "package" => {
                    self.advance();
                    package = Some(self.ident("a package name")?.node);
                    self.expect(TokenKind::Semi)?;
                    continue;
                }
                "create" => Verb::Create,
                "alter" => Verb::Alter,
                "declare" => Verb::Declare,
                _ => return Err(self.error("`package`, `create`, `alter` or `declare`")),
            };
            self.advance();

            let entity = self.ident("an entity name")?;
            let name = self.ident("a definition name")?;
            let body = if verb == Verb::Declare {
                self.expect(TokenKind::Semi)?;
                Vec::new()
            } else {
                let body = self.block()?;
                self.eat(&TokenKind::Semi);
                body
            };
            statements.push(Statement {
                verb,
                package: package.clone(),
                entity,
                name,
                body,
            });
        }
        Ok(statements)
    }

    fn block(&mut self) -> Result<Vec<Entry>, ParseError> {
        self.expect(TokenKind::LBrace)?;
        let mut entries = Vec::new();
        while !self.eat(&TokenKind::RBrace) {
            entries.push(self.entry()?);
        }
        Ok(entries)
    }

    fn entry(&mut self) -> Result<Entry, ParseError> {
        let head = self.ident("a field name or `}`")?;

        if matches!(self.peek().kind, TokenKind::Ident(_)) {
            let name = self.ident("a child name")?;
            let body = self.block()?;
            self.eat(&TokenKind::Semi);
            return Ok(Entry::Child { head, name, body });
        }

        self.expect(TokenKind::Colon)?;
        let entry = match self.peek().kind.clone() {
            TokenKind::Str(s) => {
                let span = self.advance().span;
                Entry::Property {
                    field: head,
                    value: Spanned::new(Literal::String(s), span),
                }
            }
            TokenKind::Int(n) => {
                let span = self.advance().span;
                Entry::Property {
                    field: head,
                    value: Spanned::new(Literal::Integer(n), span),
                }
            }
            TokenKind::Ident(word) if word == "true" || word == "false" => {
                let span = self.advance().span;
                Entry::Property {
                    field: head,
                    value: Spanned::new(Literal::Boolean(word == "true"), span),
                }
            }
            TokenKind::Ident(_) => {
                let target = self.ident("a definition name")?;
                Entry::Links {
                    field: head,
                    targets: vec![target],
                }
            }
            TokenKind::LBracket => {
                self.advance();
                let mut targets = Vec::new();
                while !self.eat(&TokenKind::RBracket) {
                    targets.push(self.ident("a definition name or `]`")?);
                    if !self.eat(&TokenKind::Comma) {
                        self.expect(TokenKind::RBracket)?;
                        break;
                    }
                }
                Entry::Links {
                    field: head,
                    targets,
                }
            }
            _ => return Err(self.error("a value")),
        };
        self.expect(TokenKind::Semi)?;
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_create_with_properties_and_links() {
        let src = r#"
            package shop;
            create Domain DoEmail {
                dataType: String;
                formatter: FmtDefault;
                constraint: [CkEmail, CkLength,];
                multiple: false;
            }
        "#;
        let statements = parse(src).unwrap();
        assert_eq!(statements.len(), 1);
        let st = &statements[0];
        assert_eq!(st.verb, Verb::Create);
        assert_eq!(st.package.as_deref(), Some("shop"));
        assert_eq!(st.entity.node, "Domain");
        assert_eq!(st.name.node, "DoEmail");
        assert_eq!(st.body.len(), 4);
        let Entry::Links { targets, .. } = &st.body[2] else {
            panic!("expected links");
        };
        assert_eq!(targets.len(), 2);
        let Entry::Property { value, .. } = &st.body[3] else {
            panic!("expected a property");
        };
        assert_eq!(value.node, Literal::Boolean(false));
    }

    #[test]
    fn parse_nested_children() {
        let src = r#"
            create DtDefinition Person {
                id perId { label: "Id"; domain: DoId; }
                field name { label: "Name"; domain: DoLabel; cardinality: "1"; };
            }
        "#;
        let statements = parse(src).unwrap();
        let body = &statements[0].body;
        assert_eq!(body.len(), 2);
        let Entry::Child { head, name, body } = &body[0] else {
            panic!("expected a child");
        };
        assert_eq!(head.node, "id");
        assert_eq!(name.node, "perId");
        assert_eq!(body.len(), 2);
    }

    #[test]
    fn parse_alter_and_declare() {
        let src = "declare Formatter FmtShared; alter Domain DoEmail { storeType: \"TEXT\"; }";
        let statements = parse(src).unwrap();
        assert_eq!(statements[0].verb, Verb::Declare);
        assert!(statements[0].body.is_empty());
        assert_eq!(statements[1].verb, Verb::Alter);
        assert!(statements[1].package.is_none());
    }

    #[test]
    fn empty_link_list() {
        let statements = parse("create Domain D { constraint: []; }").unwrap();
        let Entry::Links { targets, .. } = &statements[0].body[0] else {
            panic!("expected links");
        };
        assert!(targets.is_empty());
    }

    #[test]
    fn missing_semicolon_points_at_next_token() {
        let src = "create Domain DoEmail { dataType: String }";
        let err = parse(src).unwrap_err();
        assert!(err.message.contains("expected `;`"));
        assert_eq!(&src[err.span.start..err.span.end], "}");
    }

    #[test]
    fn unknown_verb() {
        let err = parse("make Domain X {}").unwrap_err();
        assert!(err.message.contains("`create`"));
        assert_eq!(err.span, Span::new(0, 4));
    }

    #[test]
    fn lex_errors_surface_as_parse_errors() {
        let err = parse("create Domain X { a: \"open }").unwrap_err();
        assert!(err.message.contains("unterminated"));
    }
}
