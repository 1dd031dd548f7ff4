//! Tokenizer for class-description documents
//!
//! Newlines are significant (they end field and relationship lines), so they
//! are emitted as tokens. Comments (`//`, `#`) and `@` directive lines such as
//! `@startuml` are dropped or reduced to a single token.

/// Kinds of tokens
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// Identifier-like run of letters, digits, `_` and `.`
    Word(String),
    /// Double-quoted string, unescaped
    Str(String),
    LBrace,
    RBrace,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Colon,
    Comma,
    Semicolon,
    Question,
    Equals,
    /// `--`
    DashDash,
    /// `<<`
    StereoOpen,
    /// `>>`
    StereoClose,
    /// `@name ...` up to end of line
    Directive(String),
    Newline,
    /// Something the grammar has no use for
    Unexpected(String),
    Eof,
}

impl TokenKind {
    /// Short human description for error messages
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Word(w) => format!("'{}'", w),
            TokenKind::Str(s) => format!("\"{}\"", s),
            TokenKind::LBrace => "'{'".to_string(),
            TokenKind::RBrace => "'}'".to_string(),
            TokenKind::LParen => "'('".to_string(),
            TokenKind::RParen => "')'".to_string(),
            TokenKind::LBracket => "'['".to_string(),
            TokenKind::RBracket => "']'".to_string(),
            TokenKind::Colon => "':'".to_string(),
            TokenKind::Comma => "','".to_string(),
            TokenKind::Semicolon => "';'".to_string(),
            TokenKind::Question => "'?'".to_string(),
            TokenKind::Equals => "'='".to_string(),
            TokenKind::DashDash => "'--'".to_string(),
            TokenKind::StereoOpen => "'<<'".to_string(),
            TokenKind::StereoClose => "'>>'".to_string(),
            TokenKind::Directive(d) => format!("'@{}'", d),
            TokenKind::Newline => "end of line".to_string(),
            TokenKind::Unexpected(s) => format!("'{}'", s),
            TokenKind::Eof => "end of input".to_string(),
        }
    }
}

/// A token with the line it starts on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
}

/// Tokenize a whole document; the last token is always [`TokenKind::Eof`]
pub fn tokenize(source: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = source.chars().peekable();
    let mut line = 1;

    while let Some(&c) = chars.peek() {
        let start_line = line;
        let kind = match c {
            '\n' => {
                chars.next();
                line += 1;
                TokenKind::Newline
            }
            c if c.is_whitespace() => {
                chars.next();
                continue;
            }
            '#' => {
                skip_to_eol(&mut chars);
                continue;
            }
            '/' => {
                chars.next();
                if chars.peek() == Some(&'/') {
                    skip_to_eol(&mut chars);
                    continue;
                }
                TokenKind::Unexpected("/".to_string())
            }
            '@' => {
                chars.next();
                let mut directive = String::new();
                while let Some(&c) = chars.peek() {
                    if c == '\n' {
                        break;
                    }
                    directive.push(c);
                    chars.next();
                }
                TokenKind::Directive(directive.trim().to_string())
            }
            '"' => {
                chars.next();
                let mut value = String::new();
                let mut closed = false;
                while let Some(c) = chars.next() {
                    match c {
                        '"' => {
                            closed = true;
                            break;
                        }
                        '\\' => {
                            if let Some(escaped) = chars.next() {
                                value.push(escaped);
                            }
                        }
                        '\n' => {
                            line += 1;
                            break;
                        }
                        other => value.push(other),
                    }
                }
                if closed {
                    TokenKind::Str(value)
                } else {
                    TokenKind::Unexpected(format!("\"{}", value))
                }
            }
            '-' => {
                chars.next();
                if chars.peek() == Some(&'-') {
                    chars.next();
                    TokenKind::DashDash
                } else {
                    TokenKind::Unexpected("-".to_string())
                }
            }
            '<' => {
                chars.next();
                if chars.peek() == Some(&'<') {
                    chars.next();
                    TokenKind::StereoOpen
                } else {
                    TokenKind::Unexpected("<".to_string())
                }
            }
            '>' => {
                chars.next();
                if chars.peek() == Some(&'>') {
                    chars.next();
                    TokenKind::StereoClose
                } else {
                    TokenKind::Unexpected(">".to_string())
                }
            }
            c if is_word_char(c) => {
                let mut word = String::new();
                while let Some(&c) = chars.peek() {
                    if !is_word_char(c) {
                        break;
                    }
                    word.push(c);
                    chars.next();
                }
                TokenKind::Word(word)
            }
            other => {
                chars.next();
                match other {
                    '{' => TokenKind::LBrace,
                    '}' => TokenKind::RBrace,
                    '(' => TokenKind::LParen,
                    ')' => TokenKind::RParen,
                    '[' => TokenKind::LBracket,
                    ']' => TokenKind::RBracket,
                    ':' => TokenKind::Colon,
                    ',' => TokenKind::Comma,
                    ';' => TokenKind::Semicolon,
                    '?' => TokenKind::Question,
                    '=' => TokenKind::Equals,
                    other => TokenKind::Unexpected(other.to_string()),
                }
            }
        };
        tokens.push(Token {
            kind,
            line: start_line,
        });
    }

    tokens.push(Token {
        kind: TokenKind::Eof,
        line,
    });
    tokens
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '.'
}

fn skip_to_eol(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) {
    while let Some(&c) = chars.peek() {
        if c == '\n' {
            break;
        }
        chars.next();
    }
}
