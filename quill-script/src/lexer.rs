//! Tokenizer for the script dialect
//!
//! Line-oriented: newlines are statement separators and every token carries
//! its 1-based line for error reporting. `#` starts a comment running to the
//! end of the line.

use crate::ExecError;

#[derive(Debug, Clone, PartialEq)]
pub enum Tok {
    Ident(String),
    Number(f64),
    Str(String),
    True,
    False,
    Null,
    Not,
    Assign,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Dot,
    Newline,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub tok: Tok,
    pub line: usize,
}

pub fn lex(source: &str) -> Result<Vec<Token>, ExecError> {
    let mut tokens = Vec::new();
    let mut chars = source.chars().peekable();
    let mut line = 1usize;

    while let Some(&c) = chars.peek() {
        match c {
            '\n' => {
                chars.next();
                tokens.push(Token { tok: Tok::Newline, line });
                line += 1;
            }
            ' ' | '\t' | '\r' => {
                chars.next();
            }
            '#' => {
                // comment to end of line
                while let Some(&c) = chars.peek() {
                    if c == '\n' {
                        break;
                    }
                    chars.next();
                }
            }
            '"' | '\'' => {
                let quote = c;
                chars.next();
                let mut text = String::new();
                let mut closed = false;
                while let Some(c) = chars.next() {
                    if c == quote {
                        closed = true;
                        break;
                    }
                    if c == '\n' {
                        break;
                    }
                    if c == '\\' {
                        match chars.next() {
                            Some('n') => text.push('\n'),
                            Some('t') => text.push('\t'),
                            Some('\\') => text.push('\\'),
                            Some(c) if c == quote => text.push(c),
                            Some(c) => {
                                text.push('\\');
                                text.push(c);
                            }
                            None => break,
                        }
                        continue;
                    }
                    text.push(c);
                }
                if !closed {
                    return Err(ExecError::syntax(line, "unterminated string literal"));
                }
                tokens.push(Token { tok: Tok::Str(text), line });
            }
            c if c.is_ascii_digit() => {
                let mut number = String::new();
                let mut seen_dot = false;
                while let Some(&c) = chars.peek() {
                    if c.is_ascii_digit() {
                        number.push(c);
                        chars.next();
                    } else if c == '.' && !seen_dot {
                        // lookahead: `1.foo` is member access on a number, not a decimal
                        let mut ahead = chars.clone();
                        ahead.next();
                        if ahead.peek().map_or(false, |d| d.is_ascii_digit()) {
                            seen_dot = true;
                            number.push(c);
                            chars.next();
                        } else {
                            break;
                        }
                    } else {
                        break;
                    }
                }
                let value: f64 = number
                    .parse()
                    .map_err(|_| ExecError::syntax(line, format!("invalid number '{}'", number)))?;
                tokens.push(Token { tok: Tok::Number(value), line });
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut ident = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_alphanumeric() || c == '_' {
                        ident.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let tok = match ident.as_str() {
                    "true" => Tok::True,
                    "false" => Tok::False,
                    "null" | "none" => Tok::Null,
                    "not" => Tok::Not,
                    _ => Tok::Ident(ident),
                };
                tokens.push(Token { tok, line });
            }
            '=' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Token { tok: Tok::Eq, line });
                } else {
                    tokens.push(Token { tok: Tok::Assign, line });
                }
            }
            '!' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Token { tok: Tok::Ne, line });
                } else {
                    return Err(ExecError::syntax(line, "unexpected character '!'"));
                }
            }
            '<' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Token { tok: Tok::Le, line });
                } else {
                    tokens.push(Token { tok: Tok::Lt, line });
                }
            }
            '>' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Token { tok: Tok::Ge, line });
                } else {
                    tokens.push(Token { tok: Tok::Gt, line });
                }
            }
            '+' => {
                chars.next();
                tokens.push(Token { tok: Tok::Plus, line });
            }
            '-' => {
                chars.next();
                tokens.push(Token { tok: Tok::Minus, line });
            }
            '*' => {
                chars.next();
                tokens.push(Token { tok: Tok::Star, line });
            }
            '/' => {
                chars.next();
                tokens.push(Token { tok: Tok::Slash, line });
            }
            '%' => {
                chars.next();
                tokens.push(Token { tok: Tok::Percent, line });
            }
            '(' => {
                chars.next();
                tokens.push(Token { tok: Tok::LParen, line });
            }
            ')' => {
                chars.next();
                tokens.push(Token { tok: Tok::RParen, line });
            }
            '[' => {
                chars.next();
                tokens.push(Token { tok: Tok::LBracket, line });
            }
            ']' => {
                chars.next();
                tokens.push(Token { tok: Tok::RBracket, line });
            }
            ',' => {
                chars.next();
                tokens.push(Token { tok: Tok::Comma, line });
            }
            '.' => {
                chars.next();
                tokens.push(Token { tok: Tok::Dot, line });
            }
            other => {
                return Err(ExecError::syntax(
                    line,
                    format!("unexpected character '{}'", other),
                ));
            }
        }
    }

    Ok(tokens)
}
