//! Core compiler pipeline for the wasmjs toolchain.
//!
//! Takes a small typed module language (the shape of a WebAssembly module:
//! imported functions, locals, `i32`/`f32` arithmetic and calls) and turns
//! it into a JavaScript module. The pipeline is roughly:
//!
//!   source .wt
//!     -> lexer      (tokens)
//!     -> parser     (AST with unresolved names)
//!     -> name_resolve + typecheck (fully typed HIR)
//!     -> codegen_js (JS text)
//!
//! Front ends that already build an [`ast::Module`] can skip straight to
//! [`compile_module`].

// ---------------------------------------------------------------------
// Error handling and diagnostics
// ---------------------------------------------------------------------

pub mod span;
pub mod diagnostic;
pub mod error;

// ---------------------------------------------------------------------
// Front-end: lexing and parsing
// ---------------------------------------------------------------------

pub mod lexer;
pub mod parser;
pub mod ast;

// ---------------------------------------------------------------------
// Semantic layers: types, name resolution, type checking, HIR
// ---------------------------------------------------------------------

pub mod types;
pub mod name_resolve;
pub mod typecheck;
pub mod hir;

// ---------------------------------------------------------------------
// Prelude and configuration
// ---------------------------------------------------------------------

pub mod stdlib;
pub mod options;

// ---------------------------------------------------------------------
// Back-end: code generation and compiler orchestration
// ---------------------------------------------------------------------

mod writer;
pub mod codegen_js;
pub mod compiler;

// ---------------------------------------------------------------------
// Public API re-exports
// ---------------------------------------------------------------------

pub use compiler::{CompilationArtifact, CompiledModule, compile_module, compile_source};
pub use error::{CoreError, ResolveError};
pub use options::{CompileOptions, DuplicatePolicy};
