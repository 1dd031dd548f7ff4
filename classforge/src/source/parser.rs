//! Recursive-descent parser producing a [`Document`]
//!
//! The parser never aborts: class-level failures are recorded and parsing
//! resumes after the offending block. Nothing is backtracked across class
//! boundaries.

use crate::error::ParseError;
use crate::naming::is_portable_name;

use super::ast::{
    ClassBlock, Document, FieldLine, Item, MarkerNode, RelationshipLine, Stereotype,
};
use super::lexer::{Token, TokenKind, tokenize};

/// Parse a document, collecting every recoverable error
pub fn parse_ast(source: &str) -> (Document, Vec<ParseError>) {
    let mut parser = Parser::new(tokenize(source));
    let document = parser.document();
    (document, parser.errors)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    errors: Vec<ParseError>,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            errors: Vec::new(),
        }
    }

    fn peek(&self) -> &Token {
        // tokenize always ends with Eof
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_next(&self) -> &Token {
        &self.tokens[(self.pos + 1).min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn at_line_start(&self) -> bool {
        self.pos == 0
            || matches!(
                self.tokens[self.pos - 1].kind,
                TokenKind::Newline | TokenKind::Directive(_)
            )
    }

    /// `class` opening a new block, as opposed to a field named `class`
    fn at_class_keyword(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Word(ref w) if w == "class")
            && self.at_line_start()
            && self.peek_next().kind != TokenKind::Colon
    }

    fn skip_separators(&mut self) {
        while matches!(self.peek().kind, TokenKind::Newline | TokenKind::Semicolon) {
            self.advance();
        }
    }

    fn skip_line(&mut self) {
        while !matches!(self.peek().kind, TokenKind::Newline | TokenKind::Eof) {
            self.advance();
        }
    }

    /// Skip the remainder of a broken class block
    fn recover_class(&mut self) {
        loop {
            match self.peek().kind {
                TokenKind::Eof => return,
                TokenKind::RBrace => {
                    self.advance();
                    return;
                }
                TokenKind::Word(_) if self.at_class_keyword() => return,
                _ => {
                    self.advance();
                }
            }
        }
    }

    fn expect_word(&mut self, what: &str) -> Result<(String, usize), ParseError> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Word(w) => {
                self.advance();
                Ok((w, token.line))
            }
            other => Err(ParseError::new(
                token.line,
                format!("expected {}, found {}", what, other.describe()),
            )),
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<(), ParseError> {
        let token = self.peek().clone();
        if token.kind == kind {
            self.advance();
            Ok(())
        } else {
            Err(ParseError::new(
                token.line,
                format!("expected {}, found {}", what, token.kind.describe()),
            ))
        }
    }

    fn document(&mut self) -> Document {
        let mut items = Vec::new();
        let mut class_blocks = 0;
        loop {
            self.skip_separators();
            let token = self.peek().clone();
            match token.kind {
                TokenKind::Eof => break,
                TokenKind::Directive(_) => {
                    self.advance();
                }
                TokenKind::Word(ref w) if w == "class" => {
                    class_blocks += 1;
                    match self.class_block() {
                        Ok(block) => items.push(Item::Class(block)),
                        Err(err) => {
                            self.errors.push(err);
                            self.recover_class();
                        }
                    }
                }
                TokenKind::Word(_) => match self.relationship() {
                    Ok(rel) => items.push(Item::Relationship(rel)),
                    Err(err) => {
                        self.errors.push(err);
                        self.skip_line();
                    }
                },
                other => {
                    self.errors.push(ParseError::new(
                        token.line,
                        format!("unexpected {} at top level", other.describe()),
                    ));
                    self.advance();
                    self.skip_line();
                }
            }
        }
        Document {
            items,
            class_blocks,
        }
    }

    fn class_block(&mut self) -> Result<ClassBlock, ParseError> {
        let (_, line) = self.expect_word("'class'")?;
        let (name, _) = self.expect_word("class name")?;
        if !is_identifier(&name) || !is_portable_name(&name) {
            return Err(
                ParseError::new(line, format!("invalid class name '{}'", name)).in_class(&name),
            );
        }

        let mut stereotypes = Vec::new();
        while self.peek().kind == TokenKind::StereoOpen {
            self.advance();
            let stereotype = self.stereotype().map_err(|e| e.in_class(&name))?;
            stereotypes.push(stereotype);
        }

        while self.peek().kind == TokenKind::Newline {
            self.advance();
        }
        self.expect(TokenKind::LBrace, "'{'")
            .map_err(|e| e.in_class(&name))?;

        let mut fields: Vec<FieldLine> = Vec::new();
        loop {
            self.skip_separators();
            let token = self.peek().clone();
            match token.kind {
                TokenKind::RBrace => {
                    self.advance();
                    break;
                }
                TokenKind::Eof => {
                    return Err(ParseError::new(
                        line,
                        format!("class block '{}' is not terminated", name),
                    )
                    .in_class(&name));
                }
                TokenKind::Word(_) if self.at_class_keyword() => {
                    return Err(ParseError::new(
                        line,
                        format!("class block '{}' is not terminated", name),
                    )
                    .in_class(&name));
                }
                TokenKind::Word(_) => {
                    let field = self.field_line().map_err(|e| e.in_class(&name))?;
                    if fields.iter().any(|f| f.name == field.name) {
                        return Err(ParseError::new(
                            field.line,
                            format!("duplicate field '{}'", field.name),
                        )
                        .in_class(&name));
                    }
                    fields.push(field);
                }
                other => {
                    return Err(ParseError::new(
                        token.line,
                        format!("expected field declaration, found {}", other.describe()),
                    )
                    .in_class(&name));
                }
            }
        }

        Ok(ClassBlock {
            name,
            stereotypes,
            fields,
            line,
        })
    }

    fn stereotype(&mut self) -> Result<Stereotype, ParseError> {
        let (name, _) = self.expect_word("stereotype name")?;
        let mut args = Vec::new();
        if self.peek().kind == TokenKind::LParen {
            self.advance();
            loop {
                let (arg, _) = self.expect_word("stereotype argument")?;
                args.push(arg);
                match self.peek().kind {
                    TokenKind::Comma => {
                        self.advance();
                    }
                    _ => break,
                }
            }
            self.expect(TokenKind::RParen, "')'")?;
        }
        self.expect(TokenKind::StereoClose, "'>>'")?;
        Ok(Stereotype { name, args })
    }

    fn field_line(&mut self) -> Result<FieldLine, ParseError> {
        let (name, line) = self.expect_word("field name")?;
        if !is_identifier(&name) {
            return Err(ParseError::new(line, format!("invalid field name '{}'", name)));
        }
        self.expect(TokenKind::Colon, &format!("':' after field name '{}'", name))?;
        let (type_name, _) = self.expect_word(&format!("type for field '{}'", name))?;

        let mut type_args = Vec::new();
        if self.peek().kind == TokenKind::LParen {
            self.advance();
            loop {
                let token = self.advance();
                match token.kind {
                    TokenKind::Word(w) | TokenKind::Str(w) => type_args.push(w),
                    other => {
                        return Err(ParseError::new(
                            token.line,
                            format!("expected type argument, found {}", other.describe()),
                        ));
                    }
                }
                match self.peek().kind {
                    TokenKind::Comma => {
                        self.advance();
                    }
                    _ => break,
                }
            }
            self.expect(TokenKind::RParen, "')'")?;
        }

        let optional = if self.peek().kind == TokenKind::Question {
            self.advance();
            true
        } else {
            false
        };

        let mut markers = Vec::new();
        if self.peek().kind == TokenKind::LBracket {
            self.advance();
            if self.peek().kind != TokenKind::RBracket {
                loop {
                    markers.push(self.marker()?);
                    match self.peek().kind {
                        TokenKind::Comma => {
                            self.advance();
                        }
                        _ => break,
                    }
                }
            }
            self.expect(TokenKind::RBracket, "']'")?;
        }

        let token = self.peek().clone();
        match token.kind {
            TokenKind::Newline | TokenKind::Semicolon | TokenKind::Eof => {
                self.advance();
            }
            // Closing brace belongs to the class block
            TokenKind::RBrace => {}
            other => {
                return Err(ParseError::new(
                    token.line,
                    format!(
                        "unexpected {} after field '{}'",
                        other.describe(),
                        name
                    ),
                ));
            }
        }

        Ok(FieldLine {
            name,
            type_name,
            type_args,
            optional,
            markers,
            line,
        })
    }

    fn marker(&mut self) -> Result<MarkerNode, ParseError> {
        let (name, _) = self.expect_word("constraint marker")?;
        let mut value = None;
        if self.peek().kind == TokenKind::Equals {
            self.advance();
            let token = self.advance();
            match token.kind {
                TokenKind::Word(v) | TokenKind::Str(v) => value = Some(v),
                other => {
                    return Err(ParseError::new(
                        token.line,
                        format!("expected value for marker '{}', found {}", name, other.describe()),
                    ));
                }
            }
        }
        Ok(MarkerNode {
            name: name.to_lowercase(),
            value,
        })
    }

    fn relationship(&mut self) -> Result<RelationshipLine, ParseError> {
        let (left, line) = self.expect_word("class name")?;
        let left_card = self.multiplicity(&left)?;
        self.expect(TokenKind::DashDash, "'--'")?;
        let right_card = self.multiplicity(&left)?;
        let (right, _) = self.expect_word("class name")?;

        let label = if self.peek().kind == TokenKind::Colon {
            self.advance();
            Some(self.expect_word("relationship label")?.0)
        } else {
            None
        };

        let token = self.peek().clone();
        match token.kind {
            TokenKind::Newline | TokenKind::Semicolon | TokenKind::Eof => {
                self.advance();
            }
            other => {
                return Err(ParseError::new(
                    token.line,
                    format!("unexpected {} after relationship", other.describe()),
                ));
            }
        }

        Ok(RelationshipLine {
            left,
            left_card,
            right_card,
            right,
            label,
            line,
        })
    }

    fn multiplicity(&mut self, left: &str) -> Result<String, ParseError> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Str(card) => {
                self.advance();
                Ok(card)
            }
            other => Err(ParseError::new(
                token.line,
                format!(
                    "expected quoted multiplicity in relationship from '{}', found {}",
                    left,
                    other.describe()
                ),
            )),
        }
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphabetic() || c.is_ascii_digit() || c == '_')
}
