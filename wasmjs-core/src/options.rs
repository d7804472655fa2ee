//! Compilation options.

use std::path::PathBuf;

use crate::stdlib::default_stdlib_root;

/// How repeated names are treated when building a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// A repeated module-level name, or a repeated parameter/local name in
    /// one function, is a `DuplicateDefinition` error.
    #[default]
    Reject,
    /// The later declaration wins the name. Every declaration still gets
    /// its own index or slot.
    Shadow,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    /// Directory of prelude `.wt` files compiled ahead of the user module.
    /// `None` compiles the module on its own.
    pub stdlib_root: Option<PathBuf>,
    pub duplicates: DuplicatePolicy,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            stdlib_root: Some(default_stdlib_root()),
            duplicates: DuplicatePolicy::Reject,
        }
    }
}

impl CompileOptions {
    /// Options for compiling a module without any prelude.
    pub fn standalone() -> Self {
        CompileOptions {
            stdlib_root: None,
            ..CompileOptions::default()
        }
    }

    pub fn with_stdlib(mut self, root: impl Into<PathBuf>) -> Self {
        self.stdlib_root = Some(root.into());
        self
    }

    pub fn with_duplicates(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicates = policy;
        self
    }
}
