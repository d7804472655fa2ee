//! Name resolution and type checking.
//!
//! This pass turns an [`ast::Module`] into a [`HirModule`]:
//!
//! - every bare name becomes a local slot, or the callee of a direct or
//!   external call;
//! - every expression gets a [`ValueType`];
//! - operand, argument and arity constraints are checked.
//!
//! The module is indexed once, before any body is looked at, so a function
//! may call another that is declared after it. The first error aborts the
//! whole module.

use crate::ast::{self, ExprKind};
use crate::error::ResolveError;
use crate::hir::{HirExpr, HirExprKind, HirExtern, HirFunction, HirModule};
use crate::name_resolve::{Binding, LocalScope, ModuleScope, lookup};
use crate::options::DuplicatePolicy;
use crate::span::Span;
use crate::types::{Signature, ValueType};

/// Resolve and type-check a whole module.
pub fn resolve_module(
    module: &ast::Module,
    policy: DuplicatePolicy,
) -> Result<HirModule, ResolveError> {
    let scope = ModuleScope::build(module, policy)?;

    let externs = module
        .externs
        .iter()
        .enumerate()
        .map(|(index, ext)| HirExtern {
            name: ext.name.clone(),
            index: index as u32,
            signature: Signature::new(ext.params.clone(), ext.result),
        })
        .collect();

    let mut functions = Vec::with_capacity(module.funcs.len());
    for (index, func) in module.funcs.iter().enumerate() {
        functions.push(resolve_function(&scope, index as u32, func, policy)?);
    }

    Ok(HirModule { externs, functions })
}

fn resolve_function(
    scope: &ModuleScope,
    index: u32,
    func: &ast::Function,
    policy: DuplicatePolicy,
) -> Result<HirFunction, ResolveError> {
    let mut locals = LocalScope::new(policy);
    for param in &func.params {
        locals.declare(&param.name, param.ty, param.span)?;
    }
    let param_count = locals.next_slot() as usize;
    for local in &func.locals {
        locals.declare(&local.name, local.ty, local.span)?;
    }

    let mut cx = FunctionCx { scope, locals };
    let body = func
        .body
        .iter()
        .map(|stmt| cx.expr(stmt))
        .collect::<Result<Vec<_>, _>>()?;

    log::debug!(
        "resolved function `{}` ({} local(s), {} statement(s))",
        func.name,
        cx.locals.next_slot(),
        body.len()
    );

    Ok(HirFunction {
        name: func.name.clone(),
        index,
        exported: func.exported,
        param_count,
        locals: cx.locals.into_locals(),
        result: func.result,
        body,
    })
}

/// The resolved target of a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Callee {
    Function(u32),
    Extern(u32),
}

struct FunctionCx<'a> {
    scope: &'a ModuleScope,
    locals: LocalScope,
}

impl FunctionCx<'_> {
    fn expr(&mut self, expr: &ast::Expr) -> Result<HirExpr, ResolveError> {
        let span = expr.span;
        match &expr.kind {
            ExprKind::ConstI32(value) => Ok(typed(HirExprKind::ConstI32(*value), ValueType::I32, span)),
            ExprKind::ConstF32(value) => Ok(typed(HirExprKind::ConstF32(*value), ValueType::F32, span)),

            ExprKind::Name(name) => match self.binding(name, span)? {
                Binding::Local { slot, ty } => Ok(typed(HirExprKind::Local(slot), ty, span)),
                Binding::Function(_) | Binding::Extern(_) => Err(ResolveError::NotAValue {
                    name: name.clone(),
                    span,
                }),
            },
            ExprKind::Local(slot) => self.local(*slot, span),
            ExprKind::FuncRef(index) => {
                let (name, _) = self.function_target(*index, span)?;
                Err(ResolveError::NotAValue {
                    name: name.to_string(),
                    span,
                })
            }
            ExprKind::ExternRef(index) => {
                let (name, _) = self.extern_target(*index, span)?;
                Err(ResolveError::NotAValue {
                    name: name.to_string(),
                    span,
                })
            }

            ExprKind::Binary { left, op, right } => {
                let left = self.expr(left)?;
                let right = self.expr(right)?;
                if left.ty != right.ty {
                    return Err(ResolveError::TypeMismatch {
                        context: format!("binary `{}`", op.symbol()),
                        expected: left.ty,
                        found: right.ty,
                        span,
                    });
                }
                let ty = left.ty;
                Ok(typed(
                    HirExprKind::Binary {
                        left: Box::new(left),
                        op: *op,
                        right: Box::new(right),
                    },
                    ty,
                    span,
                ))
            }

            ExprKind::Call { callee, args } => match self.callee(callee)? {
                Callee::Function(index) => self.call_direct(index, args, span),
                Callee::Extern(index) => self.call_external(index, args, span),
            },
            ExprKind::CallDirect { func, args } => self.call_direct(*func, args, span),
            ExprKind::CallExternal { func, args } => self.call_external(*func, args, span),

            ExprKind::Return(value) => {
                let value = self.expr(value)?;
                Ok(typed(HirExprKind::Return(Box::new(value)), ValueType::Void, span))
            }
        }
    }

    fn binding(&self, name: &str, span: Span) -> Result<Binding, ResolveError> {
        let binding = lookup(&self.locals, self.scope, name).ok_or_else(|| {
            ResolveError::UnresolvedName {
                name: name.to_string(),
                span,
            }
        })?;
        log::trace!("`{name}` resolved to {binding:?}");
        Ok(binding)
    }

    fn local(&self, slot: u32, span: Span) -> Result<HirExpr, ResolveError> {
        let local = self
            .locals
            .get(slot)
            .ok_or(ResolveError::UnknownLocal { slot, span })?;
        Ok(typed(HirExprKind::Local(slot), local.ty, span))
    }

    /// Resolve the callee position of an unresolved call.
    fn callee(&mut self, expr: &ast::Expr) -> Result<Callee, ResolveError> {
        let span = expr.span;
        match &expr.kind {
            ExprKind::Name(name) => match self.binding(name, span)? {
                Binding::Function(index) => Ok(Callee::Function(index)),
                Binding::Extern(index) => Ok(Callee::Extern(index)),
                Binding::Local { .. } => Err(ResolveError::InvalidCallee { span }),
            },
            ExprKind::FuncRef(index) => Ok(Callee::Function(*index)),
            ExprKind::ExternRef(index) => Ok(Callee::Extern(*index)),
            _ => {
                // Errors inside the callee expression win over the callee error.
                self.expr(expr)?;
                Err(ResolveError::InvalidCallee { span })
            }
        }
    }

    fn function_target(&self, index: u32, span: Span) -> Result<(&str, &Signature), ResolveError> {
        self.scope
            .function(index)
            .ok_or(ResolveError::UnknownFunction { index, span })
    }

    fn extern_target(&self, index: u32, span: Span) -> Result<(&str, &Signature), ResolveError> {
        self.scope
            .external(index)
            .ok_or(ResolveError::UnknownExtern { index, span })
    }

    fn call_direct(
        &mut self,
        func: u32,
        args: &[ast::Expr],
        span: Span,
    ) -> Result<HirExpr, ResolveError> {
        let (name, signature) = self.function_target(func, span)?;
        let (name, signature) = (name.to_string(), signature.clone());
        let args = self.call_args(&name, &signature, args, span)?;
        Ok(typed(HirExprKind::CallDirect { func, args }, signature.result, span))
    }

    fn call_external(
        &mut self,
        func: u32,
        args: &[ast::Expr],
        span: Span,
    ) -> Result<HirExpr, ResolveError> {
        let (name, signature) = self.extern_target(func, span)?;
        let (name, signature) = (name.to_string(), signature.clone());
        let args = self.call_args(&name, &signature, args, span)?;
        Ok(typed(HirExprKind::CallExternal { func, args }, signature.result, span))
    }

    /// Check arity, then resolve each argument against its parameter type.
    fn call_args(
        &mut self,
        callee: &str,
        signature: &Signature,
        args: &[ast::Expr],
        span: Span,
    ) -> Result<Vec<HirExpr>, ResolveError> {
        if args.len() != signature.arity() {
            return Err(ResolveError::ArityMismatch {
                callee: callee.to_string(),
                expected: signature.arity(),
                found: args.len(),
                span,
            });
        }

        let mut resolved = Vec::with_capacity(args.len());
        for (position, (arg, expected)) in args.iter().zip(&signature.params).enumerate() {
            let arg = self.expr(arg)?;
            if arg.ty != *expected {
                return Err(ResolveError::TypeMismatch {
                    context: format!("argument {} of `{callee}`", position + 1),
                    expected: *expected,
                    found: arg.ty,
                    span: arg.span,
                });
            }
            resolved.push(arg);
        }
        Ok(resolved)
    }
}

fn typed(kind: HirExprKind, ty: ValueType, span: Span) -> HirExpr {
    HirExpr { kind, ty, span }
}
