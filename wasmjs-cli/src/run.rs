use anyhow::{Context as _, Result, anyhow, bail};
use boa_engine::{Context, Source};
use wasmjs_core::CompilationArtifact;

const HOST_RUNTIME: &str = include_str!("host.js");

/// Instantiate the emitted module against the host runtime and call its
/// exported `main`. Returns `None` for a `void` main.
pub fn run_main(artifact: &CompilationArtifact) -> Result<Option<f64>> {
    let main = artifact
        .module
        .function("main")
        .filter(|func| func.exported)
        .context("module does not export a `main` function")?;
    if main.param_count != 0 {
        bail!("exported `main` must take no parameters, found {}", main.param_count);
    }

    let externs: Vec<String> = artifact
        .module
        .externs
        .iter()
        .map(|ext| format!("\"{}\"", ext.name))
        .collect();
    let script = format!(
        "({js})({HOST_RUNTIME}([{names}])).main();",
        js = artifact.js,
        names = externs.join(", "),
    );

    let mut context = Context::default();
    let value = context
        .eval(Source::from_bytes(script.as_str()))
        .map_err(|err| anyhow!("running `main` failed: {err}"))?;
    log::debug!("`main` returned {}", value.display());

    if value.is_undefined() {
        return Ok(None);
    }
    value
        .as_number()
        .map(Some)
        .context("`main` returned a non-numeric value")
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasmjs_core::{CompileOptions, DuplicatePolicy, compile_source};

    fn run(source: &str) -> Option<f64> {
        run_with(source, &CompileOptions::default())
    }

    fn run_with(source: &str, options: &CompileOptions) -> Option<f64> {
        let artifact = compile_source(source, options).expect("compile should succeed");
        run_main(&artifact).expect("run should succeed")
    }

    #[test]
    fn calls_extern_through_import_table() {
        let source = "export func main() i32 { setTop(64); alloc(8); return alloc(4); }";
        assert_eq!(run(source), Some(72.0));
    }

    #[test]
    fn i32_addition_wraps() {
        let source = "export func main() i32 { return 2147483647 + 1; }";
        assert_eq!(run(source), Some(f64::from(i32::MIN)));
    }

    #[test]
    fn i32_multiplication_keeps_low_bits() {
        let source = "func sq(n i32) i32 { return n * n; }\n\
                      export func main() i32 { return sq(2147483647) + sq(65537) * 65536; }";
        let expected = 2147483647i32
            .wrapping_mul(2147483647)
            .wrapping_add(65537i32.wrapping_mul(65537).wrapping_mul(65536));
        assert_eq!(run(source), Some(f64::from(expected)));
    }

    #[test]
    fn i32_division_truncates() {
        assert_eq!(run("export func main() i32 { return -7 / 2; }"), Some(-3.0));
        assert_eq!(run("export func main() i32 { return -7 % 2; }"), Some(-1.0));
    }

    #[test]
    fn f32_results_are_rounded_to_single_precision() {
        let value = run("export func main() f32 { return 0.1 + 0.2; }").expect("value");
        assert_eq!(value, f64::from(0.1f32 + 0.2f32));

        let value = run("export func main() f32 { return sqrtF32(2.0); }").expect("value");
        assert_eq!(value, f64::from(2.0f32.sqrt()));
    }

    #[test]
    fn parameters_are_coerced_on_entry() {
        let source = "func third(x f32) f32 { return x / 3.0; }\n\
                      export func main() f32 { return third(1.0); }";
        assert_eq!(run(source), Some(f64::from(1.0f32 / 3.0f32)));
    }

    #[test]
    fn void_main_returns_nothing() {
        assert_eq!(run("export func main() { setTop(0); }"), None);
    }

    #[test]
    fn names_clashing_with_generated_code_still_run() {
        let source = "func imports() i32 { return 1; }\n\
                      func half(Math f32) f32 { return Math * 0.5; }\n\
                      export func main() f32 { setTop(imports()); return half(3.0); }";
        assert_eq!(run(source), Some(1.5));

        let source = "func new(this i32) i32 { return this + 1; }\n\
                      export func main() i32 { return new(41); }";
        assert_eq!(run(source), Some(42.0));
    }

    #[test]
    fn shadowed_names_reach_their_own_targets() {
        let source = "import func tick() i32;\n\
                      func tick() i32 { return 1; }\n\
                      func tick$0() i32 { return 2; }\n\
                      export func main() i32 { return tick$0() * 10 + tick(); }";
        let options = CompileOptions::standalone().with_duplicates(DuplicatePolicy::Shadow);
        assert_eq!(run_with(source, &options), Some(21.0));
    }

    #[test]
    fn requires_exported_main() {
        let artifact = compile_source("func main() i32 { return 1; }", &CompileOptions::standalone())
            .expect("compile should succeed");
        let err = run_main(&artifact).unwrap_err();
        assert!(err.to_string().contains("does not export a `main`"));
    }
}
