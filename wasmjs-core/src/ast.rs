//! Unresolved module tree, as produced by the parser or a desugaring pass.
//!
//! Names are still plain strings here and expressions carry no types. The
//! resolver turns this tree into [`crate::hir::HirModule`].

use crate::span::Span;
use crate::types::ValueType;

/// Binary operators understood by the checker and the emitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    ConstI32(i32),
    ConstF32(f32),
    /// A bare identifier.
    Name(String),
    /// Already resolved local slot (a desugarer may emit these directly).
    Local(u32),
    /// Already resolved function index; only meaningful as a callee.
    FuncRef(u32),
    /// Already resolved extern index; only meaningful as a callee.
    ExternRef(u32),
    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },
    /// Call whose callee is still an arbitrary expression.
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    CallDirect {
        func: u32,
        args: Vec<Expr>,
    },
    CallExternal {
        func: u32,
        args: Vec<Expr>,
    },
    Return(Box<Expr>),
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Expr { kind, span }
    }

    pub fn name(name: impl Into<String>, span: Span) -> Self {
        Expr::new(ExprKind::Name(name.into()), span)
    }

    pub fn binary(left: Expr, op: BinaryOp, right: Expr) -> Self {
        let span = left.span.to(right.span);
        Expr::new(
            ExprKind::Binary {
                left: Box::new(left),
                op,
                right: Box::new(right),
            },
            span,
        )
    }

    pub fn call(callee: Expr, args: Vec<Expr>, span: Span) -> Self {
        Expr::new(
            ExprKind::Call {
                callee: Box::new(callee),
                args,
            },
            span,
        )
    }

    pub fn ret(value: Expr, span: Span) -> Self {
        Expr::new(ExprKind::Return(Box::new(value)), span)
    }
}

/// A named, typed slot declaration: a parameter or an extra local.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub ty: ValueType,
    pub span: Span,
}

impl Param {
    pub fn new(name: impl Into<String>, ty: ValueType, span: Span) -> Self {
        Param {
            name: name.into(),
            ty,
            span,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: String,
    pub exported: bool,
    pub params: Vec<Param>,
    pub result: ValueType,
    /// Locals beyond the parameters, in declaration order.
    pub locals: Vec<Param>,
    pub body: Vec<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Extern {
    pub name: String,
    pub params: Vec<ValueType>,
    pub result: ValueType,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Module {
    pub externs: Vec<Extern>,
    pub funcs: Vec<Function>,
}

impl Module {
    /// Append `other`'s declarations after this module's own.
    pub fn append(&mut self, other: Module) {
        self.externs.extend(other.externs);
        self.funcs.extend(other.funcs);
    }
}
