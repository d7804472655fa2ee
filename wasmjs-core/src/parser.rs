//! Recursive-descent parser producing an unresolved [`Module`].
//!
//! The parser stops at the first syntax error; everything after it would
//! only produce follow-on noise.

use crate::ast::{BinaryOp, Expr, ExprKind, Extern, Function, Module, Param};
use crate::diagnostic::Diagnostic;
use crate::lexer::{Token, TokenKind, lex};
use crate::span::{FileId, Span};
use crate::types::ValueType;

#[derive(Debug)]
pub struct ParseResult {
    pub module: Option<Module>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Lex and parse one source file.
pub fn parse_module(file_id: FileId, source: &str) -> ParseResult {
    let lexed = lex(file_id, source);
    if !lexed.diagnostics.is_empty() {
        return ParseResult {
            module: None,
            diagnostics: lexed.diagnostics,
        };
    }

    let mut parser = Parser {
        source,
        tokens: &lexed.tokens,
        position: 0,
    };
    match parser.module() {
        Ok(module) => ParseResult {
            module: Some(module),
            diagnostics: Vec::new(),
        },
        Err(diag) => ParseResult {
            module: None,
            diagnostics: vec![diag],
        },
    }
}

type PResult<T> = Result<T, Diagnostic>;

struct Parser<'a> {
    source: &'a str,
    tokens: &'a [Token],
    position: usize,
}

impl<'a> Parser<'a> {
    fn module(&mut self) -> PResult<Module> {
        let mut module = Module::default();
        loop {
            match self.peek().kind {
                TokenKind::Eof => return Ok(module),
                TokenKind::Import => module.externs.push(self.extern_decl()?),
                TokenKind::Export | TokenKind::Func => module.funcs.push(self.function()?),
                _ => return Err(self.unexpected("`import`, `export` or `func`")),
            }
        }
    }

    /// `import func NAME ( types ) [type] ;`
    fn extern_decl(&mut self) -> PResult<Extern> {
        let start = self.expect(TokenKind::Import, "`import`")?.span;
        self.expect(TokenKind::Func, "`func`")?;
        let name = self.ident()?;

        self.expect(TokenKind::LParen, "`(`")?;
        let mut params = Vec::new();
        if !self.at(TokenKind::RParen) {
            loop {
                params.push(self.value_type()?.0);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen, "`)`")?;
        let result = self.result_type()?;
        let end = self.expect(TokenKind::Semi, "`;`")?.span;

        Ok(Extern {
            name: name.0,
            params,
            result,
            span: start.to(end),
        })
    }

    /// `[export] func NAME ( params ) [type] { stmts }`
    fn function(&mut self) -> PResult<Function> {
        let start = self.peek().span;
        let exported = self.eat(TokenKind::Export);
        self.expect(TokenKind::Func, "`func`")?;
        let (name, _) = self.ident()?;

        self.expect(TokenKind::LParen, "`(`")?;
        let mut params = Vec::new();
        if !self.at(TokenKind::RParen) {
            loop {
                params.push(self.param()?);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen, "`)`")?;
        let result = self.result_type()?;

        self.expect(TokenKind::LBrace, "`{`")?;
        let mut locals = Vec::new();
        let mut body = Vec::new();
        while !self.at(TokenKind::RBrace) {
            match self.peek().kind {
                TokenKind::Var => {
                    self.advance();
                    locals.push(self.param()?);
                    self.expect(TokenKind::Semi, "`;`")?;
                }
                TokenKind::Return => {
                    let ret = self.advance().span;
                    let value = self.expr()?;
                    let end = self.expect(TokenKind::Semi, "`;`")?.span;
                    body.push(Expr::ret(value, ret.to(end)));
                }
                _ => {
                    body.push(self.expr()?);
                    self.expect(TokenKind::Semi, "`;`")?;
                }
            }
        }
        let end = self.expect(TokenKind::RBrace, "`}`")?.span;

        Ok(Function {
            name,
            exported,
            params,
            result,
            locals,
            body,
            span: start.to(end),
        })
    }

    fn param(&mut self) -> PResult<Param> {
        let (name, name_span) = self.ident()?;
        let (ty, ty_span) = self.value_type()?;
        Ok(Param::new(name, ty, name_span.to(ty_span)))
    }

    /// Optional result type; absent means `void`.
    fn result_type(&mut self) -> PResult<ValueType> {
        if self.at(TokenKind::Ident) {
            Ok(self.value_type()?.0)
        } else {
            Ok(ValueType::Void)
        }
    }

    fn value_type(&mut self) -> PResult<(ValueType, Span)> {
        let (name, span) = self.ident()?;
        match ValueType::from_name(&name) {
            Some(ty) => Ok((ty, span)),
            None => Err(Diagnostic::error(format!("unknown type `{name}`"), span).with_code("E0100")),
        }
    }

    fn expr(&mut self) -> PResult<Expr> {
        let mut left = self.additive()?;
        while let Some(op) = self.binary_op(&[
            (TokenKind::EqEq, BinaryOp::Eq),
            (TokenKind::NotEq, BinaryOp::Ne),
            (TokenKind::Less, BinaryOp::Lt),
            (TokenKind::LessEq, BinaryOp::Le),
            (TokenKind::Greater, BinaryOp::Gt),
            (TokenKind::GreaterEq, BinaryOp::Ge),
        ]) {
            let right = self.additive()?;
            left = Expr::binary(left, op, right);
        }
        Ok(left)
    }

    fn additive(&mut self) -> PResult<Expr> {
        let mut left = self.term()?;
        while let Some(op) =
            self.binary_op(&[(TokenKind::Plus, BinaryOp::Add), (TokenKind::Minus, BinaryOp::Sub)])
        {
            let right = self.term()?;
            left = Expr::binary(left, op, right);
        }
        Ok(left)
    }

    fn term(&mut self) -> PResult<Expr> {
        let mut left = self.unary()?;
        while let Some(op) = self.binary_op(&[
            (TokenKind::Star, BinaryOp::Mul),
            (TokenKind::Slash, BinaryOp::Div),
            (TokenKind::Percent, BinaryOp::Rem),
        ]) {
            let right = self.unary()?;
            left = Expr::binary(left, op, right);
        }
        Ok(left)
    }

    fn binary_op(&mut self, table: &[(TokenKind, BinaryOp)]) -> Option<BinaryOp> {
        let kind = self.peek().kind;
        let op = table.iter().find(|(k, _)| *k == kind).map(|(_, op)| *op)?;
        self.advance();
        Some(op)
    }

    fn unary(&mut self) -> PResult<Expr> {
        if self.at(TokenKind::Minus) {
            let minus = self.advance().span;
            return match self.peek().kind {
                TokenKind::IntLiteral | TokenKind::FloatLiteral => self.number(Some(minus)),
                _ => Err(Diagnostic::error(
                    "unary `-` is only supported on numeric literals",
                    minus,
                )
                .with_code("E0100")),
            };
        }
        self.primary()
    }

    fn primary(&mut self) -> PResult<Expr> {
        match self.peek().kind {
            TokenKind::IntLiteral | TokenKind::FloatLiteral => self.number(None),
            TokenKind::Ident => {
                let (name, span) = self.ident()?;
                let callee = Expr::name(name, span);
                if !self.eat(TokenKind::LParen) {
                    return Ok(callee);
                }
                let mut args = Vec::new();
                if !self.at(TokenKind::RParen) {
                    loop {
                        args.push(self.expr()?);
                        if !self.eat(TokenKind::Comma) {
                            break;
                        }
                    }
                }
                let end = self.expect(TokenKind::RParen, "`)`")?.span;
                Ok(Expr::call(callee, args, span.to(end)))
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.expr()?;
                self.expect(TokenKind::RParen, "`)`")?;
                Ok(inner)
            }
            _ => Err(self.unexpected("an expression")),
        }
    }

    /// Numeric literal, optionally negated by an already consumed `-`.
    fn number(&mut self, minus: Option<Span>) -> PResult<Expr> {
        let token = self.advance().clone();
        let text = token.text(self.source);
        let span = minus.map_or(token.span, |m| m.to(token.span));
        let negative = minus.is_some();

        let kind = match token.kind {
            TokenKind::FloatLiteral => {
                let value: f32 = text.parse().map_err(|_| invalid_literal(text, span))?;
                ExprKind::ConstF32(if negative { -value } else { value })
            }
            _ => {
                let value: i64 = text.parse().map_err(|_| invalid_literal(text, span))?;
                let value = if negative { -value } else { value };
                let value = i32::try_from(value).map_err(|_| {
                    Diagnostic::error(format!("integer literal `{value}` does not fit in i32"), span)
                        .with_code("E0002")
                })?;
                ExprKind::ConstI32(value)
            }
        };
        Ok(Expr::new(kind, span))
    }

    fn ident(&mut self) -> PResult<(String, Span)> {
        let token = self.expect(TokenKind::Ident, "an identifier")?;
        Ok((token.text(self.source).to_string(), token.span))
    }

    fn peek(&self) -> &'a Token {
        // The token stream always ends with Eof and `advance` never moves past it.
        &self.tokens[self.position]
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn advance(&mut self) -> &'a Token {
        let token = self.peek();
        if token.kind != TokenKind::Eof {
            self.position += 1;
        }
        token
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> PResult<&'a Token> {
        if self.at(kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(what))
        }
    }

    fn unexpected(&self, what: &str) -> Diagnostic {
        let token = self.peek();
        let found = match token.kind {
            TokenKind::Eof => "end of input".to_string(),
            _ => format!("`{}`", token.text(self.source)),
        };
        Diagnostic::error(format!("expected {what}, found {found}"), token.span).with_code("E0100")
    }
}

fn invalid_literal(text: &str, span: Span) -> Diagnostic {
    Diagnostic::error(format!("invalid numeric literal `{text}`"), span).with_code("E0002")
}
