//! Recursive-descent parser
//!
//! Grammar, one statement per line:
//!
//! ```text
//! stmt    := ident '=' expr | expr
//! expr    := 'not' expr | cmp
//! cmp     := sum (('==' | '!=' | '<' | '<=' | '>' | '>=') sum)*
//! sum     := term (('+' | '-') term)*
//! term    := unary (('*' | '/' | '%') unary)*
//! unary   := '-' unary | postfix
//! postfix := primary ('.' ident [ '(' args ')' ])*
//! primary := number | string | 'true' | 'false' | 'null' | list | ident | '(' expr ')'
//! ```

use crate::ast::{BinOp, Expr, Stmt, UnaryOp};
use crate::lexer::{lex, Tok, Token};
use crate::ExecError;

pub fn parse(source: &str) -> Result<Vec<Stmt>, ExecError> {
    let tokens = lex(source)?;
    let mut parser = Parser { tokens, pos: 0 };
    parser.parse_program()
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn parse_program(&mut self) -> Result<Vec<Stmt>, ExecError> {
        let mut stmts = Vec::new();
        loop {
            while self.eat(&Tok::Newline) {}
            if self.at_end() {
                break;
            }
            stmts.push(self.parse_stmt()?);
            if !self.at_end() && !self.eat(&Tok::Newline) {
                return Err(self.error_here("expected end of line"));
            }
        }
        Ok(stmts)
    }

    fn parse_stmt(&mut self) -> Result<Stmt, ExecError> {
        let line = self.current_line();
        // assignment: ident '=' ...
        if let Some(Tok::Ident(name)) = self.peek().cloned() {
            if self.peek_at(1) == Some(&Tok::Assign) {
                self.pos += 2;
                let expr = self.parse_expr()?;
                return Ok(Stmt::Assign { name, expr, line });
            }
        }
        let expr = self.parse_expr()?;
        Ok(Stmt::Expr { expr, line })
    }

    fn parse_expr(&mut self) -> Result<Expr, ExecError> {
        if self.eat(&Tok::Not) {
            let expr = self.parse_expr()?;
            return Ok(Expr::Unary {
                op: UnaryOp::Not,
                expr: Box::new(expr),
            });
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expr, ExecError> {
        let mut left = self.parse_sum()?;
        loop {
            let op = match self.peek() {
                Some(Tok::Eq) => BinOp::Eq,
                Some(Tok::Ne) => BinOp::Ne,
                Some(Tok::Lt) => BinOp::Lt,
                Some(Tok::Le) => BinOp::Le,
                Some(Tok::Gt) => BinOp::Gt,
                Some(Tok::Ge) => BinOp::Ge,
                _ => break,
            };
            self.pos += 1;
            let right = self.parse_sum()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_sum(&mut self) -> Result<Expr, ExecError> {
        let mut left = self.parse_term()?;
        loop {
            let op = match self.peek() {
                Some(Tok::Plus) => BinOp::Add,
                Some(Tok::Minus) => BinOp::Sub,
                _ => break,
            };
            self.pos += 1;
            let right = self.parse_term()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_term(&mut self) -> Result<Expr, ExecError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Tok::Star) => BinOp::Mul,
                Some(Tok::Slash) => BinOp::Div,
                Some(Tok::Percent) => BinOp::Mod,
                _ => break,
            };
            self.pos += 1;
            let right = self.parse_unary()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, ExecError> {
        if self.eat(&Tok::Minus) {
            let expr = self.parse_unary()?;
            return Ok(Expr::Unary {
                op: UnaryOp::Neg,
                expr: Box::new(expr),
            });
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expr, ExecError> {
        let mut expr = self.parse_primary()?;
        while self.eat(&Tok::Dot) {
            let name = match self.peek().cloned() {
                Some(Tok::Ident(name)) => {
                    self.pos += 1;
                    name
                }
                _ => return Err(self.error_here("expected member name after '.'")),
            };
            if self.eat(&Tok::LParen) {
                // calls are only defined on named services
                let service = match &expr {
                    Expr::Var(service) => service.clone(),
                    _ => {
                        return Err(self.error_here("methods can only be called on a named service"))
                    }
                };
                let mut args = Vec::new();
                if !self.eat(&Tok::RParen) {
                    loop {
                        args.push(self.parse_expr()?);
                        if self.eat(&Tok::Comma) {
                            continue;
                        }
                        if self.eat(&Tok::RParen) {
                            break;
                        }
                        return Err(self.error_here("expected ',' or ')' in argument list"));
                    }
                }
                expr = Expr::Call {
                    service,
                    method: name,
                    args,
                };
            } else {
                expr = Expr::Member {
                    target: Box::new(expr),
                    name,
                };
            }
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr, ExecError> {
        let token = match self.peek().cloned() {
            Some(token) => token,
            None => return Err(self.error_here("unexpected end of input")),
        };
        match token {
            Tok::Number(n) => {
                self.pos += 1;
                Ok(Expr::Number(n))
            }
            Tok::Str(s) => {
                self.pos += 1;
                Ok(Expr::Text(s))
            }
            Tok::True => {
                self.pos += 1;
                Ok(Expr::Bool(true))
            }
            Tok::False => {
                self.pos += 1;
                Ok(Expr::Bool(false))
            }
            Tok::Null => {
                self.pos += 1;
                Ok(Expr::Null)
            }
            Tok::Ident(name) => {
                self.pos += 1;
                Ok(Expr::Var(name))
            }
            Tok::LBracket => {
                self.pos += 1;
                let mut items = Vec::new();
                if !self.eat(&Tok::RBracket) {
                    loop {
                        items.push(self.parse_expr()?);
                        if self.eat(&Tok::Comma) {
                            continue;
                        }
                        if self.eat(&Tok::RBracket) {
                            break;
                        }
                        return Err(self.error_here("expected ',' or ']' in list"));
                    }
                }
                Ok(Expr::List(items))
            }
            Tok::LParen => {
                self.pos += 1;
                let expr = self.parse_expr()?;
                if !self.eat(&Tok::RParen) {
                    return Err(self.error_here("expected ')'"));
                }
                Ok(expr)
            }
            other => Err(self.error_here(format!("unexpected token {:?}", other))),
        }
    }

    // ========== token helpers ==========

    fn peek(&self) -> Option<&Tok> {
        self.tokens.get(self.pos).map(|t| &t.tok)
    }

    fn peek_at(&self, offset: usize) -> Option<&Tok> {
        self.tokens.get(self.pos + offset).map(|t| &t.tok)
    }

    fn eat(&mut self, tok: &Tok) -> bool {
        if self.peek() == Some(tok) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn current_line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map(|t| t.line)
            .unwrap_or(1)
    }

    fn error_here(&self, message: impl Into<String>) -> ExecError {
        ExecError::syntax(self.current_line(), message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_assignment() {
        let stmts = parse("x = 1 + 2").unwrap();
        assert_eq!(stmts.len(), 1);
        assert!(matches!(&stmts[0], Stmt::Assign { name, .. } if name == "x"));
    }

    #[test]
    fn test_parse_service_call() {
        let stmts = parse("result = math.add(2, 3)").unwrap();
        let Stmt::Assign { expr, .. } = &stmts[0] else {
            panic!("expected assignment");
        };
        assert_eq!(
            *expr,
            Expr::Call {
                service: "math".into(),
                method: "add".into(),
                args: vec![Expr::Number(2.0), Expr::Number(3.0)],
            }
        );
    }

    #[test]
    fn test_parse_member_chain() {
        let stmts = parse("row.total").unwrap();
        let Stmt::Expr { expr, .. } = &stmts[0] else {
            panic!("expected expression");
        };
        assert!(matches!(expr, Expr::Member { name, .. } if name == "total"));
    }

    #[test]
    fn test_parse_precedence() {
        let stmts = parse("1 + 2 * 3").unwrap();
        let Stmt::Expr { expr, .. } = &stmts[0] else {
            panic!("expected expression");
        };
        let Expr::Binary { op: BinOp::Add, right, .. } = expr else {
            panic!("expected addition at the root, got {:?}", expr);
        };
        assert!(matches!(**right, Expr::Binary { op: BinOp::Mul, .. }));
    }

    #[test]
    fn test_syntax_error_carries_line() {
        let err = parse("a = 1\nb = 2\nc = = 3").unwrap_err();
        let ExecError::Syntax { line, .. } = err else {
            panic!("expected syntax error, got {:?}", err);
        };
        assert_eq!(line, 3);
    }

    #[test]
    fn test_trailing_garbage_rejected() {
        let err = parse("x = 1 2").unwrap_err();
        assert!(matches!(err, ExecError::Syntax { line: 1, .. }));
    }

    #[test]
    fn test_empty_and_comment_lines_skipped() {
        let stmts = parse("\n# comment only\n\nx = 1\n").unwrap();
        assert_eq!(stmts.len(), 1);
        assert_eq!(stmts[0].line(), 4);
    }
}
