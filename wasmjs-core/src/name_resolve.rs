//! Module and local scopes.
//!
//! Bare names are looked up in the local scope of the current function
//! first and then in the module scope. Both scopes are plain maps with a
//! fixed entry shape; they are rebuilt for every resolution run.

use std::collections::HashMap;

use crate::ast;
use crate::error::ResolveError;
use crate::hir::HirLocal;
use crate::options::DuplicatePolicy;
use crate::span::Span;
use crate::types::{Signature, ValueType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Function,
    Extern,
}

/// One module-level declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleEntry {
    pub kind: SymbolKind,
    pub index: u32,
    pub signature: Signature,
}

/// Function and extern names of one module.
///
/// Indices are assigned once, in declaration order, externs and functions
/// each counting from zero.
#[derive(Debug, Default)]
pub struct ModuleScope {
    entries: HashMap<String, ModuleEntry>,
    externs: Vec<(String, Signature)>,
    functions: Vec<(String, Signature)>,
}

impl ModuleScope {
    /// Index every extern, then every function, of `module`.
    pub fn build(module: &ast::Module, policy: DuplicatePolicy) -> Result<Self, ResolveError> {
        let mut scope = ModuleScope::default();
        for ext in &module.externs {
            let signature = Signature::new(ext.params.clone(), ext.result);
            scope.declare(&ext.name, SymbolKind::Extern, signature, ext.span, policy)?;
        }
        for func in &module.funcs {
            let signature = Signature::new(func.params.iter().map(|p| p.ty).collect(), func.result);
            scope.declare(&func.name, SymbolKind::Function, signature, func.span, policy)?;
        }
        log::debug!(
            "indexed {} extern(s) and {} function(s)",
            scope.externs.len(),
            scope.functions.len()
        );
        Ok(scope)
    }

    fn declare(
        &mut self,
        name: &str,
        kind: SymbolKind,
        signature: Signature,
        span: Span,
        policy: DuplicatePolicy,
    ) -> Result<u32, ResolveError> {
        if policy == DuplicatePolicy::Reject && self.entries.contains_key(name) {
            return Err(ResolveError::DuplicateDefinition {
                name: name.to_string(),
                span,
            });
        }

        let list = match kind {
            SymbolKind::Extern => &mut self.externs,
            SymbolKind::Function => &mut self.functions,
        };
        let index = list.len() as u32;
        list.push((name.to_string(), signature.clone()));
        self.entries.insert(
            name.to_string(),
            ModuleEntry {
                kind,
                index,
                signature,
            },
        );
        Ok(index)
    }

    pub fn lookup(&self, name: &str) -> Option<&ModuleEntry> {
        self.entries.get(name)
    }

    /// Name and signature of the function at `index`.
    pub fn function(&self, index: u32) -> Option<(&str, &Signature)> {
        self.functions
            .get(index as usize)
            .map(|(name, sig)| (name.as_str(), sig))
    }

    /// Name and signature of the extern at `index`.
    pub fn external(&self, index: u32) -> Option<(&str, &Signature)> {
        self.externs
            .get(index as usize)
            .map(|(name, sig)| (name.as_str(), sig))
    }
}

/// Parameters and locals of the function being resolved.
///
/// A local's slot is its position in declaration order: parameters
/// first, in order, then every later declaration.
#[derive(Debug)]
pub struct LocalScope {
    names: HashMap<String, u32>,
    locals: Vec<HirLocal>,
    policy: DuplicatePolicy,
}

impl LocalScope {
    pub fn new(policy: DuplicatePolicy) -> Self {
        LocalScope {
            names: HashMap::new(),
            locals: Vec::new(),
            policy,
        }
    }

    /// Register a new local and return its slot.
    pub fn declare(&mut self, name: &str, ty: ValueType, span: Span) -> Result<u32, ResolveError> {
        if ty.is_void() {
            return Err(ResolveError::InvalidLocalType {
                name: name.to_string(),
                span,
            });
        }
        if self.policy == DuplicatePolicy::Reject && self.names.contains_key(name) {
            return Err(ResolveError::DuplicateDefinition {
                name: name.to_string(),
                span,
            });
        }

        let slot = self.next_slot();
        self.locals.push(HirLocal {
            name: name.to_string(),
            ty,
            slot,
        });
        self.names.insert(name.to_string(), slot);
        Ok(slot)
    }

    pub fn lookup(&self, name: &str) -> Option<&HirLocal> {
        self.names.get(name).map(|slot| &self.locals[*slot as usize])
    }

    pub fn get(&self, slot: u32) -> Option<&HirLocal> {
        self.locals.get(slot as usize)
    }

    /// Slot the next declaration will receive.
    pub fn next_slot(&self) -> u32 {
        self.locals.len() as u32
    }

    pub fn into_locals(self) -> Vec<HirLocal> {
        self.locals
    }
}

/// What a bare name refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    Local { slot: u32, ty: ValueType },
    Function(u32),
    Extern(u32),
}

/// Look a name up, local scope first.
pub fn lookup(locals: &LocalScope, module: &ModuleScope, name: &str) -> Option<Binding> {
    if let Some(local) = locals.lookup(name) {
        return Some(Binding::Local {
            slot: local.slot,
            ty: local.ty,
        });
    }
    module.lookup(name).map(|entry| match entry.kind {
        SymbolKind::Function => Binding::Function(entry.index),
        SymbolKind::Extern => Binding::Extern(entry.index),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Extern, Function, Module, Param};

    fn func(name: &str, params: Vec<Param>) -> Function {
        Function {
            name: name.into(),
            exported: false,
            params,
            result: ValueType::I32,
            locals: Vec::new(),
            body: Vec::new(),
            span: Span::dummy(),
        }
    }

    fn ext(name: &str) -> Extern {
        Extern {
            name: name.into(),
            params: vec![ValueType::F32],
            result: ValueType::F32,
            span: Span::dummy(),
        }
    }

    #[test]
    fn indexes_externs_and_functions_separately() {
        let module = Module {
            externs: vec![ext("sqrt"), ext("sin")],
            funcs: vec![func("a", Vec::new()), func("b", Vec::new())],
        };
        let scope = ModuleScope::build(&module, DuplicatePolicy::Reject).unwrap();

        let sin = scope.lookup("sin").unwrap();
        assert_eq!((sin.kind, sin.index), (SymbolKind::Extern, 1));
        let b = scope.lookup("b").unwrap();
        assert_eq!((b.kind, b.index), (SymbolKind::Function, 1));
        assert_eq!(scope.function(0).map(|(n, _)| n), Some("a"));
        assert_eq!(scope.external(0).map(|(n, _)| n), Some("sqrt"));
        assert!(scope.function(2).is_none());
    }

    #[test]
    fn rejects_duplicate_module_names() {
        let module = Module {
            externs: vec![ext("f")],
            funcs: vec![func("f", Vec::new())],
        };
        let err = ModuleScope::build(&module, DuplicatePolicy::Reject).unwrap_err();
        assert!(matches!(err, ResolveError::DuplicateDefinition { ref name, .. } if name == "f"));
    }

    #[test]
    fn shadowing_keeps_every_index_but_last_name_wins() {
        let module = Module {
            externs: vec![ext("f")],
            funcs: vec![func("f", Vec::new()), func("f", Vec::new())],
        };
        let scope = ModuleScope::build(&module, DuplicatePolicy::Shadow).unwrap();
        let f = scope.lookup("f").unwrap();
        assert_eq!((f.kind, f.index), (SymbolKind::Function, 1));
        assert!(scope.function(0).is_some());
        assert!(scope.external(0).is_some());
    }

    #[test]
    fn assigns_slots_in_declaration_order() {
        let mut locals = LocalScope::new(DuplicatePolicy::Reject);
        assert_eq!(locals.declare("x", ValueType::I32, Span::dummy()), Ok(0));
        assert_eq!(locals.declare("y", ValueType::F32, Span::dummy()), Ok(1));
        assert_eq!(locals.declare("tmp", ValueType::I32, Span::dummy()), Ok(2));
        for (k, local) in locals.into_locals().iter().enumerate() {
            assert_eq!(local.slot as usize, k);
        }
    }

    #[test]
    fn rejects_void_locals() {
        let mut locals = LocalScope::new(DuplicatePolicy::Reject);
        let err = locals.declare("v", ValueType::Void, Span::dummy()).unwrap_err();
        assert!(matches!(err, ResolveError::InvalidLocalType { .. }));
    }

    #[test]
    fn local_names_shadow_module_names() {
        let module = Module {
            externs: Vec::new(),
            funcs: vec![func("x", Vec::new())],
        };
        let scope = ModuleScope::build(&module, DuplicatePolicy::Reject).unwrap();
        let mut locals = LocalScope::new(DuplicatePolicy::Reject);
        locals.declare("x", ValueType::F32, Span::dummy()).unwrap();

        assert_eq!(
            lookup(&locals, &scope, "x"),
            Some(Binding::Local {
                slot: 0,
                ty: ValueType::F32
            })
        );
        assert_eq!(lookup(&LocalScope::new(DuplicatePolicy::Reject), &scope, "x"), Some(Binding::Function(0)));
        assert_eq!(lookup(&locals, &scope, "nope"), None);
    }
}
