//! JavaScript backend.
//!
//! Emits a module as a JS function expression taking the import table and
//! returning the exported functions:
//!
//! ```text
//! (function(imports) {
//!   var imported = imports.imported;
//!   function f(x) {
//!     x = (x|0);
//!     return (imported(x)|0);
//!   }
//!   return {
//!     f: f,
//!   };
//! })
//! ```
//!
//! JS numbers are doubles, so every value-producing operation is wrapped in
//! a coercion back to its declared width: `(…|0)` for `i32` and
//! `Math.fround(…)` for `f32`.
//!
//! A declaration keeps its own name unless a later one in the same scope
//! reuses it (only possible with shadowing enabled), it is a JS reserved
//! word, or it would hide a name the generated code itself relies on
//! (`imports`, `Math`, or a module-level binding seen from a function). It
//! is then spelled `name$index`, suffixed further if that is also taken.

use std::collections::HashSet;

use crate::ast::BinaryOp;
use crate::error::CodegenError;
use crate::hir::{HirExpr, HirExprKind, HirFunction, HirModule};
use crate::types::ValueType;
use crate::writer::CodeWriter;

/// Generate JS source for a resolved module.
pub fn generate_js(module: &HirModule) -> Result<String, CodegenError> {
    let names = scope_names(
        module
            .externs
            .iter()
            .map(|e| e.name.as_str())
            .chain(module.functions.iter().map(|f| f.name.as_str())),
        &[],
    );
    let (extern_names, function_names) = names.split_at(module.externs.len());
    let mut generator = JsGenerator {
        module,
        extern_names,
        function_names,
        local_names: Vec::new(),
        writer: CodeWriter::new(),
    };
    generator.module()?;
    let js = generator.writer.finish();
    log::debug!("emitted {} byte(s) of JS", js.len());
    Ok(js)
}

struct JsGenerator<'m> {
    module: &'m HirModule,
    extern_names: &'m [String],
    function_names: &'m [String],
    /// JS names of the current function's locals, by slot.
    local_names: Vec<String>,
    writer: CodeWriter,
}

impl<'m> JsGenerator<'m> {
    fn module(&mut self) -> Result<(), CodegenError> {
        let module = self.module;
        self.writer.out("(function(imports) {").eol().indent();
        for (ext, js_name) in module.externs.iter().zip(self.extern_names) {
            self.writer
                .out("var ")
                .out(js_name)
                .out(" = imports.")
                .out(&ext.name)
                .out(";")
                .eol();
        }

        let function_names = self.function_names;
        for (func, js_name) in module.functions.iter().zip(function_names) {
            self.function(func, js_name)?;
        }

        self.writer.out("return {").eol().indent();
        for (func, js_name) in module.functions.iter().zip(function_names) {
            if func.exported {
                self.writer.out(&func.name).out(": ").out(js_name).out(",").eol();
            }
        }
        self.writer.dedent().out("};").eol();
        self.writer.dedent().out("})");
        Ok(())
    }

    fn function(&mut self, func: &'m HirFunction, js_name: &str) -> Result<(), CodegenError> {
        let outer: Vec<&str> = self
            .extern_names
            .iter()
            .chain(self.function_names)
            .map(String::as_str)
            .collect();
        let names = scope_names(func.locals.iter().map(|l| l.name.as_str()), &outer);
        let (param_names, extra_names) = names.split_at(func.param_count.min(names.len()));

        self.writer.out("function ").out(js_name).out("(");
        for (i, name) in param_names.iter().enumerate() {
            if i != 0 {
                self.writer.out(", ");
            }
            self.writer.out(name);
        }
        self.writer.out(") {").eol().indent();

        // The caller may pass any JS number.
        for (param, name) in func.params().iter().zip(param_names) {
            self.writer.out(name).out(" = ");
            self.begin_coerce(param.ty);
            self.writer.out(name);
            self.end_coerce(param.ty);
            self.writer.out(";").eol();
        }

        for (local, name) in func.extra_locals().iter().zip(extra_names) {
            self.writer
                .out("var ")
                .out(name)
                .out(" = ")
                .out(zero_literal(local.ty))
                .out(";")
                .eol();
        }

        self.local_names = names;
        for stmt in &func.body {
            self.expr(func, stmt)?;
            self.writer.out(";").eol();
        }

        self.writer.dedent().out("}").eol();
        Ok(())
    }

    fn begin_coerce(&mut self, ty: ValueType) {
        match ty {
            ValueType::I32 => {
                self.writer.out("(");
            }
            ValueType::F32 => {
                self.writer.out("Math.fround(");
            }
            ValueType::Void => {}
        }
    }

    fn end_coerce(&mut self, ty: ValueType) {
        match ty {
            ValueType::I32 => {
                self.writer.out("|0)");
            }
            ValueType::F32 => {
                self.writer.out(")");
            }
            ValueType::Void => {}
        }
    }

    fn expr(&mut self, func: &HirFunction, expr: &HirExpr) -> Result<(), CodegenError> {
        let (function_names, extern_names) = (self.function_names, self.extern_names);
        match &expr.kind {
            // Literals are range-checked and locals are coerced on entry, so
            // neither needs a wrapper.
            HirExprKind::ConstI32(value) => {
                self.writer.out(value);
            }
            HirExprKind::Local(slot) => {
                let name = self.local_names.get(*slot as usize).ok_or_else(|| {
                    CodegenError::UnknownLocal {
                        function: func.name.clone(),
                        slot: *slot,
                    }
                })?;
                self.writer.out(name);
            }
            HirExprKind::ConstF32(value) => {
                self.begin_coerce(expr.ty);
                self.writer.out(f32_literal(*value));
                self.end_coerce(expr.ty);
            }
            // Exact low 32 bits; a double product loses them past 2^53.
            HirExprKind::Binary {
                left,
                op: BinaryOp::Mul,
                right,
            } if expr.ty == ValueType::I32 => {
                self.begin_coerce(expr.ty);
                self.writer.out("Math.imul(");
                self.expr(func, left)?;
                self.writer.out(", ");
                self.expr(func, right)?;
                self.writer.out(")");
                self.end_coerce(expr.ty);
            }
            HirExprKind::Binary { left, op, right } => {
                self.begin_coerce(expr.ty);
                self.writer.out("(");
                self.expr(func, left)?;
                self.writer.out(" ").out(op.symbol()).out(" ");
                self.expr(func, right)?;
                self.writer.out(")");
                self.end_coerce(expr.ty);
            }
            HirExprKind::CallDirect { func: index, args } => {
                let name = function_names
                    .get(*index as usize)
                    .ok_or(CodegenError::UnknownFunction(*index))?;
                self.call(func, expr.ty, name, args)?;
            }
            HirExprKind::CallExternal { func: index, args } => {
                let name = extern_names
                    .get(*index as usize)
                    .ok_or(CodegenError::UnknownExtern(*index))?;
                self.call(func, expr.ty, name, args)?;
            }
            HirExprKind::Return(value) => {
                self.writer.out("return ");
                self.expr(func, value)?;
            }
        }
        Ok(())
    }

    fn call(
        &mut self,
        func: &HirFunction,
        ty: ValueType,
        name: &str,
        args: &[HirExpr],
    ) -> Result<(), CodegenError> {
        self.begin_coerce(ty);
        self.writer.out(name).out("(");
        for (i, arg) in args.iter().enumerate() {
            if i != 0 {
                self.writer.out(", ");
            }
            self.expr(func, arg)?;
        }
        self.writer.out(")");
        self.end_coerce(ty);
        Ok(())
    }
}

/// Names the emitted wrapper and coercions refer to.
const RUNTIME_NAMES: &[&str] = &["imports", "Math"];

/// Reserved words, plus globals the emitted code may spell out.
const JS_RESERVED: &[&str] = &[
    "arguments", "await", "break", "case", "catch", "class", "const", "continue", "debugger",
    "default", "delete", "do", "else", "enum", "eval", "export", "extends", "false", "finally",
    "for", "function", "if", "implements", "import", "in", "instanceof", "interface", "let",
    "new", "null", "package", "private", "protected", "public", "return", "static", "super",
    "switch", "this", "throw", "true", "try", "typeof", "var", "void", "while", "with",
    "yield", "undefined", "NaN", "Infinity",
];

/// JS names for the declarations of one scope, in declaration order.
///
/// `outer` holds names already bound around this scope that its code may
/// still need to reach.
fn scope_names<'a>(names: impl Iterator<Item = &'a str>, outer: &[&str]) -> Vec<String> {
    let names: Vec<&str> = names.collect();
    let mut taken: HashSet<String> = names.iter().map(|name| name.to_string()).collect();
    taken.extend(outer.iter().map(|name| name.to_string()));

    names
        .iter()
        .enumerate()
        .map(|(i, &name)| {
            let keep = !names[i + 1..].contains(&name)
                && !RUNTIME_NAMES.contains(&name)
                && !JS_RESERVED.contains(&name)
                && !outer.iter().any(|bound| *bound == name);
            if keep {
                return name.to_string();
            }
            let mut candidate = format!("{name}${i}");
            let mut suffix = 0;
            while taken.contains(&candidate) {
                suffix += 1;
                candidate = format!("{name}${i}_{suffix}");
            }
            taken.insert(candidate.clone());
            candidate
        })
        .collect()
}

fn zero_literal(ty: ValueType) -> &'static str {
    match ty {
        ValueType::F32 => "Math.fround(0)",
        ValueType::I32 | ValueType::Void => "0",
    }
}

/// Spell an `f32` the way JS reads it back to the same value.
fn f32_literal(value: f32) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else {
        format!("{value:?}")
    }
}
