use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use wasmjs_core::span::FileId;
use wasmjs_core::{CompileOptions, CoreError, DuplicatePolicy, compile_source};

mod run;

#[derive(Parser, Debug)]
#[command(version, about = "Compile typed module sources to JavaScript", long_about = None)]
struct Cli {
    /// Source file; reads stdin when omitted
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output file; writes stdout when omitted
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(
        long,
        value_name = "PATH",
        help = "Path to the standard library root (defaults to bundled stdlib)",
        conflicts_with = "no_stdlib"
    )]
    stdlib: Option<PathBuf>,

    #[arg(long, help = "Compile without any prelude")]
    no_stdlib: bool,

    #[arg(long, value_enum, value_name = "FORMAT", default_value_t = Emit::Js)]
    emit: Emit,

    #[arg(long, help = "Let later declarations shadow earlier ones with the same name")]
    allow_shadowing: bool,

    #[arg(long, help = "Run the exported `main` of the compiled module")]
    run: bool,

    #[arg(short, long, help = "Log pipeline progress to stderr")]
    verbose: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Emit {
    /// JavaScript module text
    Js,
    /// Resolved, fully typed module tree
    Hir,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut logger = env_logger::builder();
    logger.format_timestamp(None);
    if cli.verbose {
        logger.filter_level(log::LevelFilter::Debug);
    }
    logger.init();

    execute(cli)
}

fn execute(cli: Cli) -> Result<()> {
    let mut options = CompileOptions::default();
    if cli.no_stdlib {
        options.stdlib_root = None;
    } else if let Some(root) = &cli.stdlib {
        options = options.with_stdlib(root);
    }
    if cli.allow_shadowing {
        options = options.with_duplicates(DuplicatePolicy::Shadow);
    }

    let (source, label) = match &cli.input {
        Some(path) => (
            fs::read_to_string(path)
                .with_context(|| format!("failed to read input file {}", path.display()))?,
            path.display().to_string(),
        ),
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read stdin")?;
            (buffer, "<stdin>".to_string())
        }
    };

    log::debug!("compiling {label} with {options:?}");
    let artifact = match compile_source(&source, &options) {
        Ok(artifact) => artifact,
        Err(err) => {
            report(&err, &source, &label);
            return Err(err.into());
        }
    };

    let text = match cli.emit {
        Emit::Js => artifact.js.clone(),
        Emit::Hir => format!("{:#?}", artifact.module),
    };
    write_output(cli.output.as_ref(), &text)?;

    if cli.run {
        match run::run_main(&artifact)? {
            Some(result) => println!("Program exited with {result}"),
            None => println!("Program exited"),
        }
    }
    Ok(())
}

/// Print each diagnostic of a rejected module to stderr.
fn report(err: &CoreError, source: &str, label: &str) {
    for diagnostic in err.diagnostics() {
        if diagnostic.span.file == FileId::MAIN {
            eprintln!("{}\n", diagnostic.render(source, Some(label)));
        } else {
            // Prelude file; its text is not at hand here.
            eprintln!("{diagnostic} (in prelude file #{})\n", diagnostic.span.file.0);
        }
    }
}

fn write_output(path: Option<&PathBuf>, text: &str) -> Result<()> {
    let Some(path) = path else {
        let mut stdout = io::stdout().lock();
        stdout.write_all(text.as_bytes())?;
        stdout.write_all(b"\n")?;
        return Ok(());
    };
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {parent:?}"))?;
        }
    }
    fs::write(path, text)
        .with_context(|| format!("failed to write output file {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_cmd::Command;
    use predicates::prelude::*;
    use tempfile::tempdir;

    fn cli() -> Command {
        Command::cargo_bin("wasmjs-cli").expect("binary exists")
    }

    #[test]
    fn compiles_file_to_js() {
        let dir = tempdir().expect("tempdir");
        let input_path = dir.path().join("input.wt");
        fs::write(
            &input_path,
            "import func imported(i32) i32;\nexport func f(x i32) i32 { return imported(x); }",
        )
        .expect("write input");
        let output_path = dir.path().join("out/module.js");

        cli()
            .arg("--input")
            .arg(&input_path)
            .arg("--output")
            .arg(&output_path)
            .arg("--no-stdlib")
            .assert()
            .success();

        let js = fs::read_to_string(&output_path).expect("read js");
        assert!(js.starts_with("(function(imports) {"));
        assert!(js.contains("return (imported(x)|0);"));
        assert!(js.contains("f: f,"));
    }

    #[test]
    fn reads_stdin_and_writes_stdout() {
        cli()
            .write_stdin("export func main() f32 { return sqrtF32(2.0); }")
            .assert()
            .success()
            .stdout(predicate::str::contains("var sqrtF32 = imports.sqrtF32;"))
            .stdout(predicate::str::contains("main: main,"));
    }

    #[test]
    fn emits_resolved_tree() {
        cli()
            .arg("--no-stdlib")
            .arg("--emit")
            .arg("hir")
            .write_stdin("func f(a i32) i32 { return a; }")
            .assert()
            .success()
            .stdout(predicate::str::contains("HirModule"))
            .stdout(predicate::str::contains("Local("));
    }

    #[test]
    fn renders_diagnostics_and_fails() {
        let dir = tempdir().expect("tempdir");
        let input_path = dir.path().join("bad.wt");
        fs::write(&input_path, "func f() i32 {\n  return 1 + 1.0;\n}\n").expect("write input");

        cli()
            .arg("--input")
            .arg(&input_path)
            .arg("--no-stdlib")
            .assert()
            .failure()
            .stderr(predicate::str::contains("error[E0201]"))
            .stderr(predicate::str::contains("bad.wt:2:10"))
            .stderr(predicate::str::contains("resolution failed with 1 error(s)"));
    }

    #[test]
    fn supports_custom_stdlib_root() {
        let dir = tempdir().expect("tempdir");
        let stdlib_root = dir.path().join("stdlib");
        fs::create_dir_all(&stdlib_root).expect("create stdlib root");
        fs::write(stdlib_root.join("host.wt"), "import func hostNow() f32;")
            .expect("write stdlib file");

        cli()
            .arg("--stdlib")
            .arg(&stdlib_root)
            .write_stdin("export func now() f32 { return hostNow(); }")
            .assert()
            .success()
            .stdout(predicate::str::contains("var hostNow = imports.hostNow;"))
            .stdout(predicate::str::contains("var alloc").not());
    }

    #[test]
    fn runs_compiled_main() {
        let dir = tempdir().expect("tempdir");
        let output_path = dir.path().join("out.js");

        cli()
            .arg("--output")
            .arg(&output_path)
            .arg("--run")
            .write_stdin(
                "func sq(n i32) i32 { return n * n; }\n\
                 export func main() i32 { return sq(46341) + 1; }",
            )
            .assert()
            .success()
            .stdout(predicate::str::contains("Program exited with -2147479014"));

        assert!(output_path.exists(), "js output was not created");
    }

    #[test]
    fn run_requires_exported_main() {
        let dir = tempdir().expect("tempdir");

        cli()
            .arg("--no-stdlib")
            .arg("--run")
            .arg("--output")
            .arg(dir.path().join("out.js"))
            .write_stdin("func main() i32 { return 0; }")
            .assert()
            .failure()
            .stderr(predicate::str::contains("does not export a `main` function"));
    }

    #[test]
    fn reports_missing_stdlib_root() {
        let dir = tempdir().expect("tempdir");

        cli()
            .arg("--stdlib")
            .arg(dir.path().join("missing"))
            .write_stdin("func f() {}")
            .assert()
            .failure()
            .stderr(predicate::str::contains("standard library directory was not found"));
    }

    #[test]
    fn shadowing_flag_relaxes_duplicate_check() {
        let source = "func f(a i32) i32 { var a f32; return 1; }";

        cli()
            .arg("--no-stdlib")
            .write_stdin(source)
            .assert()
            .failure()
            .stderr(predicate::str::contains("error[E0205]"));

        cli()
            .arg("--no-stdlib")
            .arg("--allow-shadowing")
            .write_stdin(source)
            .assert()
            .success()
            .stdout(predicate::str::contains("var a = Math.fround(0);"));
    }
}
