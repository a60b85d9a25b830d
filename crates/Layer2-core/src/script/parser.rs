//! Script parser (precedence climbing)

use super::ast::*;
use super::lexer::{tokenize, RawSegment, Tok, Token};
use super::ScriptError;
use std::rc::Rc;

/// 중첩 한도 (깊은 재귀로 호스트 스택이 넘치지 않도록)
const MAX_DEPTH: usize = 200;

const RESERVED: &[&str] = &[
    "let", "const", "var", "return", "if", "else", "while", "for", "break", "continue", "throw",
    "typeof", "true", "false", "null", "undefined", "of", "function", "new", "class",
];

/// 함수 본문으로 파싱 (최상위 `return` 허용)
pub fn parse_program(source: &str) -> Result<Vec<Stmt>, ScriptError> {
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let mut body = Vec::new();
    while !parser.at_eof() {
        body.push(parser.statement()?);
    }
    Ok(body)
}

fn parse_expression_source(source: &str, depth: usize) -> Result<Expr, ScriptError> {
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth,
    };
    let expr = parser.expression()?;
    if !parser.at_eof() {
        return Err(parser.unexpected());
    }
    Ok(expr)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    // ========================================================================
    // Token helpers
    // ========================================================================

    fn peek(&self) -> &Tok {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> &Tok {
        self.tokens
            .get(self.pos + offset)
            .or_else(|| self.tokens.last())
            .map(|t| &t.tok)
            .unwrap_or(&Tok::Eof)
    }

    fn advance(&mut self) -> Tok {
        let tok = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn at_eof(&self) -> bool {
        matches!(self.peek(), Tok::Eof)
    }

    fn is_punct(&self, p: &str) -> bool {
        matches!(self.peek(), Tok::Punct(q) if *q == p)
    }

    fn is_keyword(&self, kw: &str) -> bool {
        matches!(self.peek(), Tok::Ident(name) if name == kw)
    }

    fn eat_punct(&mut self, p: &str) -> bool {
        if self.is_punct(p) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, kw: &str) -> bool {
        if self.is_keyword(kw) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_punct(&mut self, p: &str) -> Result<(), ScriptError> {
        if self.eat_punct(p) {
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn unexpected(&self) -> ScriptError {
        let token = self.tokens.get(self.pos).or_else(|| self.tokens.last());
        let (line, col) = token.map(|t| (t.line, t.col)).unwrap_or((1, 1));
        let what = match self.peek() {
            Tok::Eof => "Unexpected end of input".to_string(),
            Tok::Num(n) => format!("Unexpected number '{}'", n),
            Tok::Str(_) | Tok::Template(_) => "Unexpected string".to_string(),
            Tok::Ident(name) => format!("Unexpected token '{}'", name),
            Tok::Punct(p) => format!("Unexpected token '{}'", p),
        };
        ScriptError::Syntax(format!("{} ({}:{})", what, line, col))
    }

    fn binding_name(&mut self) -> Result<String, ScriptError> {
        match self.peek().clone() {
            Tok::Ident(name) if !RESERVED.contains(&name.as_str()) => {
                self.pos += 1;
                Ok(name)
            }
            _ => Err(self.unexpected()),
        }
    }

    fn enter(&mut self) -> Result<(), ScriptError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(ScriptError::Syntax(
                "Expression nested too deeply".to_string(),
            ));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn end_statement(&mut self) {
        self.eat_punct(";");
    }

    // ========================================================================
    // Statements
    // ========================================================================

    fn statement(&mut self) -> Result<Stmt, ScriptError> {
        self.enter()?;
        let stmt = self.statement_inner();
        self.leave();
        stmt
    }

    fn statement_inner(&mut self) -> Result<Stmt, ScriptError> {
        if self.eat_punct(";") {
            return Ok(Stmt::Empty);
        }
        if self.eat_punct("{") {
            return Ok(Stmt::Block(self.block_rest()?));
        }
        if let Some(kind) = self.decl_kind() {
            let stmt = self.declaration(kind)?;
            self.end_statement();
            return Ok(stmt);
        }
        if self.eat_keyword("return") {
            let value = if self.is_punct(";") || self.is_punct("}") || self.at_eof() {
                None
            } else {
                Some(self.expression()?)
            };
            self.end_statement();
            return Ok(Stmt::Return(value));
        }
        if self.eat_keyword("if") {
            self.expect_punct("(")?;
            let test = self.expression()?;
            self.expect_punct(")")?;
            let then = Box::new(self.statement()?);
            let otherwise = if self.eat_keyword("else") {
                Some(Box::new(self.statement()?))
            } else {
                None
            };
            return Ok(Stmt::If(test, then, otherwise));
        }
        if self.eat_keyword("while") {
            self.expect_punct("(")?;
            let test = self.expression()?;
            self.expect_punct(")")?;
            let body = Box::new(self.statement()?);
            return Ok(Stmt::While(test, body));
        }
        if self.eat_keyword("for") {
            return self.for_statement();
        }
        if self.eat_keyword("break") {
            self.end_statement();
            return Ok(Stmt::Break);
        }
        if self.eat_keyword("continue") {
            self.end_statement();
            return Ok(Stmt::Continue);
        }
        if self.eat_keyword("throw") {
            let value = self.expression()?;
            self.end_statement();
            return Ok(Stmt::Throw(value));
        }
        if self.is_keyword("function") || self.is_keyword("class") || self.is_keyword("new") {
            return Err(self.unexpected());
        }

        let expr = self.expression()?;
        self.end_statement();
        Ok(Stmt::Expr(expr))
    }

    fn decl_kind(&mut self) -> Option<DeclKind> {
        let kind = match self.peek() {
            Tok::Ident(name) if name == "let" => DeclKind::Let,
            Tok::Ident(name) if name == "const" => DeclKind::Const,
            Tok::Ident(name) if name == "var" => DeclKind::Var,
            _ => return None,
        };
        self.pos += 1;
        Some(kind)
    }

    fn declaration(&mut self, kind: DeclKind) -> Result<Stmt, ScriptError> {
        let mut decls = Vec::new();
        loop {
            let name = self.binding_name()?;
            let init = if self.eat_punct("=") {
                Some(self.assignment()?)
            } else {
                if kind == DeclKind::Const {
                    return Err(ScriptError::Syntax(
                        "Missing initializer in const declaration".to_string(),
                    ));
                }
                None
            };
            decls.push((name, init));
            if !self.eat_punct(",") {
                break;
            }
        }
        Ok(Stmt::Decl(kind, decls))
    }

    fn block_rest(&mut self) -> Result<Vec<Stmt>, ScriptError> {
        let mut body = Vec::new();
        while !self.eat_punct("}") {
            if self.at_eof() {
                return Err(self.unexpected());
            }
            body.push(self.statement()?);
        }
        Ok(body)
    }

    fn for_statement(&mut self) -> Result<Stmt, ScriptError> {
        self.expect_punct("(")?;

        // for (const x of xs)
        if let Some(kind) = self.decl_kind() {
            if matches!(self.peek_at(1), Tok::Ident(kw) if kw == "of") {
                let name = self.binding_name()?;
                self.pos += 1;
                let iterable = self.expression()?;
                self.expect_punct(")")?;
                let body = Box::new(self.statement()?);
                return Ok(Stmt::ForOf {
                    kind,
                    name,
                    iterable,
                    body,
                });
            }
            let init = self.declaration(kind)?;
            return self.for_rest(Some(Box::new(init)));
        }

        let init = if self.is_punct(";") {
            None
        } else {
            Some(Box::new(Stmt::Expr(self.expression()?)))
        };
        self.for_rest(init)
    }

    fn for_rest(&mut self, init: Option<Box<Stmt>>) -> Result<Stmt, ScriptError> {
        self.expect_punct(";")?;
        let test = if self.is_punct(";") {
            None
        } else {
            Some(self.expression()?)
        };
        self.expect_punct(";")?;
        let update = if self.is_punct(")") {
            None
        } else {
            Some(self.expression()?)
        };
        self.expect_punct(")")?;
        let body = Box::new(self.statement()?);
        Ok(Stmt::For {
            init,
            test,
            update,
            body,
        })
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    fn expression(&mut self) -> Result<Expr, ScriptError> {
        self.assignment()
    }

    fn assignment(&mut self) -> Result<Expr, ScriptError> {
        self.enter()?;
        let result = self.assignment_inner();
        self.leave();
        result
    }

    fn assignment_inner(&mut self) -> Result<Expr, ScriptError> {
        if let Some(arrow) = self.try_arrow()? {
            return Ok(arrow);
        }

        let target = self.conditional()?;
        let op = match self.peek() {
            Tok::Punct("=") => AssignOp::Assign,
            Tok::Punct("+=") => AssignOp::Add,
            Tok::Punct("-=") => AssignOp::Sub,
            Tok::Punct("*=") => AssignOp::Mul,
            Tok::Punct("/=") => AssignOp::Div,
            Tok::Punct("%=") => AssignOp::Rem,
            _ => return Ok(target),
        };
        if !target.is_assignable() {
            return Err(ScriptError::Syntax(
                "Invalid left-hand side in assignment".to_string(),
            ));
        }
        self.pos += 1;
        let value = self.assignment()?;
        Ok(Expr::Assign(op, Box::new(target), Box::new(value)))
    }

    /// `x => ...` 또는 `(a, b) => ...`
    fn try_arrow(&mut self) -> Result<Option<Expr>, ScriptError> {
        let params = match (self.peek().clone(), self.peek_at(1).clone()) {
            (Tok::Ident(name), Tok::Punct("=>")) if !RESERVED.contains(&name.as_str()) => {
                self.pos += 2;
                vec![name]
            }
            (Tok::Punct("("), _) => {
                let Some(close) = self.matching_paren() else {
                    return Ok(None);
                };
                if !matches!(
                    self.tokens.get(close + 1).map(|t| &t.tok),
                    Some(Tok::Punct("=>"))
                ) {
                    return Ok(None);
                }
                self.pos += 1;
                let mut params = Vec::new();
                while !self.eat_punct(")") {
                    params.push(self.binding_name()?);
                    if !self.is_punct(")") {
                        self.expect_punct(",")?;
                    }
                }
                self.expect_punct("=>")?;
                params
            }
            _ => return Ok(None),
        };

        let body = if self.eat_punct("{") {
            FnBody::Block(self.block_rest()?)
        } else {
            FnBody::Expr(Box::new(self.assignment()?))
        };
        Ok(Some(Expr::Arrow(Rc::new(Function { params, body }))))
    }

    fn matching_paren(&self) -> Option<usize> {
        let mut depth = 0usize;
        for (i, token) in self.tokens.iter().enumerate().skip(self.pos) {
            match token.tok {
                Tok::Punct("(") => depth += 1,
                Tok::Punct(")") => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(i);
                    }
                }
                Tok::Eof => return None,
                _ => {}
            }
        }
        None
    }

    fn conditional(&mut self) -> Result<Expr, ScriptError> {
        let test = self.nullish()?;
        if !self.eat_punct("?") {
            return Ok(test);
        }
        let then = self.assignment()?;
        self.expect_punct(":")?;
        let otherwise = self.assignment()?;
        Ok(Expr::Cond(
            Box::new(test),
            Box::new(then),
            Box::new(otherwise),
        ))
    }

    fn nullish(&mut self) -> Result<Expr, ScriptError> {
        let mut left = self.logical_or()?;
        while self.eat_punct("??") {
            let right = self.logical_or()?;
            left = Expr::Logical(LogicalOp::Nullish, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn logical_or(&mut self) -> Result<Expr, ScriptError> {
        let mut left = self.logical_and()?;
        while self.eat_punct("||") {
            let right = self.logical_and()?;
            left = Expr::Logical(LogicalOp::Or, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn logical_and(&mut self) -> Result<Expr, ScriptError> {
        let mut left = self.equality()?;
        while self.eat_punct("&&") {
            let right = self.equality()?;
            left = Expr::Logical(LogicalOp::And, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn equality(&mut self) -> Result<Expr, ScriptError> {
        let mut left = self.relational()?;
        loop {
            let op = match self.peek() {
                Tok::Punct("==") => BinaryOp::Eq,
                Tok::Punct("!=") => BinaryOp::NotEq,
                Tok::Punct("===") => BinaryOp::StrictEq,
                Tok::Punct("!==") => BinaryOp::StrictNotEq,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.relational()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
    }

    fn relational(&mut self) -> Result<Expr, ScriptError> {
        let mut left = self.additive()?;
        loop {
            let op = match self.peek() {
                Tok::Punct("<") => BinaryOp::Lt,
                Tok::Punct("<=") => BinaryOp::LtEq,
                Tok::Punct(">") => BinaryOp::Gt,
                Tok::Punct(">=") => BinaryOp::GtEq,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.additive()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
    }

    fn additive(&mut self) -> Result<Expr, ScriptError> {
        let mut left = self.multiplicative()?;
        loop {
            let op = match self.peek() {
                Tok::Punct("+") => BinaryOp::Add,
                Tok::Punct("-") => BinaryOp::Sub,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.multiplicative()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
    }

    fn multiplicative(&mut self) -> Result<Expr, ScriptError> {
        let mut left = self.unary()?;
        loop {
            let op = match self.peek() {
                Tok::Punct("*") => BinaryOp::Mul,
                Tok::Punct("/") => BinaryOp::Div,
                Tok::Punct("%") => BinaryOp::Rem,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.unary()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
    }

    fn unary(&mut self) -> Result<Expr, ScriptError> {
        self.enter()?;
        let result = self.unary_inner();
        self.leave();
        result
    }

    fn unary_inner(&mut self) -> Result<Expr, ScriptError> {
        let op = match self.peek() {
            Tok::Punct("!") => Some(UnaryOp::Not),
            Tok::Punct("-") => Some(UnaryOp::Neg),
            Tok::Punct("+") => Some(UnaryOp::Plus),
            Tok::Ident(name) if name == "typeof" => Some(UnaryOp::TypeOf),
            _ => None,
        };
        if let Some(op) = op {
            self.pos += 1;
            let operand = self.unary()?;
            return Ok(Expr::Unary(op, Box::new(operand)));
        }

        if self.is_punct("++") || self.is_punct("--") {
            let increment = self.is_punct("++");
            self.pos += 1;
            let target = self.unary()?;
            if !target.is_assignable() {
                return Err(ScriptError::Syntax(
                    "Invalid left-hand side expression in prefix operation".to_string(),
                ));
            }
            return Ok(Expr::Update {
                increment,
                prefix: true,
                target: Box::new(target),
            });
        }

        let expr = self.postfix()?;
        if self.is_punct("++") || self.is_punct("--") {
            let increment = self.is_punct("++");
            if !expr.is_assignable() {
                return Err(ScriptError::Syntax(
                    "Invalid left-hand side expression in postfix operation".to_string(),
                ));
            }
            self.pos += 1;
            return Ok(Expr::Update {
                increment,
                prefix: false,
                target: Box::new(expr),
            });
        }
        Ok(expr)
    }

    fn postfix(&mut self) -> Result<Expr, ScriptError> {
        let mut expr = self.primary()?;
        loop {
            if self.eat_punct(".") || self.is_punct("?.") {
                let optional = self.eat_punct("?.");
                let property = match self.advance() {
                    Tok::Ident(name) => name,
                    _ => {
                        self.pos -= 1;
                        return Err(self.unexpected());
                    }
                };
                expr = Expr::Member {
                    object: Box::new(expr),
                    property,
                    optional,
                };
            } else if self.eat_punct("[") {
                let index = self.expression()?;
                self.expect_punct("]")?;
                expr = Expr::Index {
                    object: Box::new(expr),
                    index: Box::new(index),
                };
            } else if self.eat_punct("(") {
                let args = self.arguments()?;
                expr = Expr::Call {
                    callee: Box::new(expr),
                    args,
                };
            } else {
                return Ok(expr);
            }
        }
    }

    fn arguments(&mut self) -> Result<Vec<Expr>, ScriptError> {
        let mut args = Vec::new();
        while !self.eat_punct(")") {
            args.push(self.assignment()?);
            if !self.is_punct(")") {
                self.expect_punct(",")?;
            }
        }
        Ok(args)
    }

    fn primary(&mut self) -> Result<Expr, ScriptError> {
        match self.advance() {
            Tok::Num(n) => Ok(Expr::Num(n)),
            Tok::Str(s) => Ok(Expr::Str(s)),
            Tok::Template(segments) => {
                let mut parts = Vec::with_capacity(segments.len());
                for segment in segments {
                    parts.push(match segment {
                        RawSegment::Lit(s) => TemplatePart::Lit(s),
                        RawSegment::Code(code) => {
                            TemplatePart::Expr(parse_expression_source(&code, self.depth)?)
                        }
                    });
                }
                Ok(Expr::Template(parts))
            }
            Tok::Ident(name) => match name.as_str() {
                "true" => Ok(Expr::Bool(true)),
                "false" => Ok(Expr::Bool(false)),
                "null" => Ok(Expr::Null),
                "undefined" => Ok(Expr::Undefined),
                _ if RESERVED.contains(&name.as_str()) => {
                    self.pos -= 1;
                    Err(self.unexpected())
                }
                _ => Ok(Expr::Ident(name)),
            },
            Tok::Punct("(") => {
                let expr = self.expression()?;
                self.expect_punct(")")?;
                Ok(expr)
            }
            Tok::Punct("[") => {
                let mut items = Vec::new();
                while !self.eat_punct("]") {
                    items.push(self.assignment()?);
                    if !self.is_punct("]") {
                        self.expect_punct(",")?;
                    }
                }
                Ok(Expr::Array(items))
            }
            Tok::Eof => Err(self.unexpected()),
            _ => {
                self.pos -= 1;
                Err(self.unexpected())
            }
        }
    }
}
