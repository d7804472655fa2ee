//! Resolved, typed module tree.
//!
//! HIR is what the resolver produces and what every back end consumes.
//! Unlike [`crate::ast`], it has no variant for an unresolved name or an
//! unresolved call, and every expression carries its [`ValueType`].

use crate::ast::BinaryOp;
use crate::span::Span;
use crate::types::{Signature, ValueType};

/// A parameter or local after slot assignment.
///
/// `slot` always equals the local's position in [`HirFunction::locals`].
#[derive(Debug, Clone, PartialEq)]
pub struct HirLocal {
    pub name: String,
    pub ty: ValueType,
    pub slot: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HirFunction {
    pub name: String,
    pub index: u32,
    pub exported: bool,
    /// The first `param_count` entries of `locals` are the parameters.
    pub param_count: usize,
    pub locals: Vec<HirLocal>,
    pub result: ValueType,
    pub body: Vec<HirExpr>,
}

impl HirFunction {
    pub fn params(&self) -> &[HirLocal] {
        &self.locals[..self.param_count]
    }

    pub fn extra_locals(&self) -> &[HirLocal] {
        &self.locals[self.param_count..]
    }

    pub fn signature(&self) -> Signature {
        Signature::new(self.params().iter().map(|l| l.ty).collect(), self.result)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HirExtern {
    pub name: String,
    pub index: u32,
    pub signature: Signature,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct HirModule {
    pub externs: Vec<HirExtern>,
    pub functions: Vec<HirFunction>,
}

impl HirModule {
    pub fn exported(&self) -> impl Iterator<Item = &HirFunction> {
        self.functions.iter().filter(|f| f.exported)
    }

    pub fn function(&self, name: &str) -> Option<&HirFunction> {
        self.functions.iter().find(|f| f.name == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HirExpr {
    pub kind: HirExprKind,
    pub ty: ValueType,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum HirExprKind {
    ConstI32(i32),
    ConstF32(f32),
    Local(u32),
    Binary {
        left: Box<HirExpr>,
        op: BinaryOp,
        right: Box<HirExpr>,
    },
    CallDirect {
        func: u32,
        args: Vec<HirExpr>,
    },
    CallExternal {
        func: u32,
        args: Vec<HirExpr>,
    },
    Return(Box<HirExpr>),
}
