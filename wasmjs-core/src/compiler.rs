use std::path::Path;

use crate::ast::Module;
use crate::codegen_js::generate_js;
use crate::diagnostic::Diagnostics;
use crate::error::{CoreError, Phase};
use crate::hir::HirModule;
use crate::options::CompileOptions;
use crate::parser::parse_module;
use crate::span::FileId;
use crate::stdlib::{StdlibFile, load_stdlib_files};
use crate::typecheck::resolve_module;

/// Output of compiling one module.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledModule {
    pub js: String,
    /// The resolved module, for back ends other than JS.
    pub module: HirModule,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompilationArtifact {
    pub js: String,
    pub module: HirModule,
    pub stdlib: Vec<StdlibFile>,
}

/// Compile source text together with the configured prelude.
///
/// Prelude files get file ids 1.., in load order; the user source is
/// [`FileId::MAIN`]. Prelude declarations come before the user's own.
pub fn compile_source(
    source: &str,
    options: &CompileOptions,
) -> Result<CompilationArtifact, CoreError> {
    let stdlib = match &options.stdlib_root {
        Some(root) => load_prelude(root)?,
        None => Vec::new(),
    };

    let mut diagnostics = Diagnostics::new();
    let mut module = Module::default();
    for (i, file) in stdlib.iter().enumerate() {
        let parsed = parse_module(FileId(i as u32 + 1), &file.contents);
        diagnostics.extend(parsed.diagnostics);
        if let Some(prelude) = parsed.module {
            module.append(prelude);
        }
    }

    let parsed = parse_module(FileId::MAIN, source);
    diagnostics.extend(parsed.diagnostics);
    if let Some(user) = parsed.module {
        module.append(user);
    }
    halt_on_errors(diagnostics, Phase::Parse)?;

    let compiled = compile_module(&module, options)?;
    Ok(CompilationArtifact {
        js: compiled.js,
        module: compiled.module,
        stdlib,
    })
}

/// Resolve an already parsed (and desugared) module, then emit JS.
///
/// Emission only runs when resolution reported no errors.
pub fn compile_module(
    module: &Module,
    options: &CompileOptions,
) -> Result<CompiledModule, CoreError> {
    let hir = match resolve_module(module, options.duplicates) {
        Ok(hir) => hir,
        Err(err) => {
            log::debug!("resolution failed: {err}");
            let mut diagnostics = Diagnostics::new();
            diagnostics.push(err.to_diagnostic());
            return Err(rejection(diagnostics, Phase::Resolve));
        }
    };
    let js = generate_js(&hir)?;
    Ok(CompiledModule { js, module: hir })
}

fn load_prelude(root: &Path) -> Result<Vec<StdlibFile>, CoreError> {
    if !root.is_dir() {
        return Err(CoreError::MissingStdlib(root.to_path_buf()));
    }
    Ok(load_stdlib_files(root)?)
}

fn halt_on_errors(diagnostics: Diagnostics, phase: Phase) -> Result<(), CoreError> {
    if diagnostics.has_errors() {
        return Err(rejection(diagnostics, phase));
    }
    Ok(())
}

fn rejection(diagnostics: Diagnostics, phase: Phase) -> CoreError {
    log::debug!("{phase} reported {} error(s)", diagnostics.error_count());
    CoreError::Rejected {
        phase,
        diagnostics: diagnostics.into_vec(),
    }
}
