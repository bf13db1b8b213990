//! Hand-rolled CLI argument handling (§6.5, `SPEC_FULL.md` §11.3).
//!
//! Mirrors the teacher workspace's choice not to reach for `clap` for its
//! own `oric` binary: a small match over `std::env::args()`. `§6.5`'s
//! contract is `compile <file> [--target esm|cjs] [--source-map]
//! [--no-runtime]`; `--explain` and `--verbose` are supplemented per §12.

use std::path::{Path, PathBuf};

use lumina_codegen::Target;
use lumina_diagnostic::{Diagnostic, ErrorCode, Severity};
use lumina_module::{Lockfile, ModuleRegistry};

use crate::pipeline::{compile_source, CompileOptions, PipelineOutput};

const KNOWN_CODES: &[ErrorCode] = &[
    ErrorCode::Lum001,
    ErrorCode::UnknownIdentifier,
    ErrorCode::UnknownType,
    ErrorCode::UnknownFunction,
    ErrorCode::UnknownMember,
    ErrorCode::UnresolvedMember,
    ErrorCode::UnknownQualifier,
    ErrorCode::QualifierMismatch,
    ErrorCode::BoundMismatch,
    ErrorCode::RefLvalueRequired,
    ErrorCode::RefMutRequired,
    ErrorCode::ShadowedBinding,
    ErrorCode::ShadowedImport,
    ErrorCode::MatchNotExhaustive,
    ErrorCode::RecursiveStruct,
    ErrorCode::TypeError,
    ErrorCode::Lint,
    ErrorCode::Pkg001,
    ErrorCode::Pkg002,
    ErrorCode::Pkg003,
    ErrorCode::InternalIrInvalid,
    ErrorCode::SyntaxError,
];

pub fn main() {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    let verbose = args.iter().any(|a| a == "--verbose" || a == "-v");
    crate::tracing_setup::init(verbose);

    match args[1].as_str() {
        "compile" => run_compile(&args[2..], false),
        "check" => run_compile(&args[2..], true),
        "explain" | "--explain" => run_explain(&args[2..]),
        "help" | "--help" | "-h" => print_usage(),
        "version" | "--version" => println!("Lumina compiler 0.1.0"),
        other => {
            eprintln!("Unknown command: {other}");
            print_usage();
            std::process::exit(1);
        }
    }
}

fn print_usage() {
    println!("Lumina compiler (JavaScript-family emission)");
    println!();
    println!("Usage: lumina <command> [options]");
    println!();
    println!("Commands:");
    println!("  compile <file.lm>    Compile to JavaScript");
    println!("  check <file.lm>      Type/flow-check only, no JS output");
    println!("  explain <CODE>       Print the long-form description of a diagnostic code");
    println!("  help                 Show this help message");
    println!("  version              Show version information");
    println!();
    println!("Compile/check options:");
    println!("  --target esm|cjs     Module format for emitted JS (default: esm)");
    println!("  --source-map         Emit a .map file alongside the .js output");
    println!("  --no-runtime         Skip the runtime import/require prelude");
    println!("  --cache-dir <dir>    Enable module-level caching under <dir>");
    println!("  --verbose, -v        Verbose tracing output");
    println!();
    println!("Examples:");
    println!("  lumina compile main.lm --target cjs --source-map");
    println!("  lumina check lib.lm");
    println!("  lumina explain MATCH_NOT_EXHAUSTIVE");
}

struct CompileArgs {
    input: PathBuf,
    options: CompileOptions,
    lockfile_path: Option<PathBuf>,
    #[cfg(feature = "cache")]
    cache_dir: Option<PathBuf>,
}

fn parse_compile_args(args: &[String]) -> CompileArgs {
    let Some(input) = args.first() else {
        eprintln!("Usage: lumina compile <file.lm> [--target esm|cjs] [--source-map] [--no-runtime]");
        std::process::exit(1);
    };
    let input = PathBuf::from(input);
    let mut options = CompileOptions {
        source_name: input.display().to_string(),
        output_name: input.with_extension("js").display().to_string(),
        ..CompileOptions::default()
    };
    let mut lockfile_path = None;
    #[cfg(feature = "cache")]
    let mut cache_dir = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--target" => {
                i += 1;
                options.target = match args.get(i).map(String::as_str) {
                    Some("esm") => Target::Esm,
                    Some("cjs") => Target::Cjs,
                    other => {
                        eprintln!("Unknown --target value: {other:?} (expected esm|cjs)");
                        std::process::exit(1);
                    }
                };
            }
            "--source-map" => options.source_map = true,
            "--no-runtime" => options.no_runtime = true,
            "--lockfile" => {
                i += 1;
                lockfile_path = args.get(i).map(PathBuf::from);
            }
            "--cache-dir" => {
                i += 1;
                #[cfg(feature = "cache")]
                {
                    cache_dir = args.get(i).map(PathBuf::from);
                }
                #[cfg(not(feature = "cache"))]
                {
                    eprintln!("--cache-dir requires the `cache` feature");
                    std::process::exit(1);
                }
            }
            "--verbose" | "-v" => {}
            other => {
                eprintln!("Unknown option: {other}");
                std::process::exit(1);
            }
        }
        i += 1;
    }

    CompileArgs {
        input,
        options,
        lockfile_path,
        #[cfg(feature = "cache")]
        cache_dir,
    }
}

fn load_lockfile(explicit: Option<&Path>, project_root: &Path) -> Lockfile {
    let candidate = explicit.map(PathBuf::from).unwrap_or_else(|| project_root.join("lumina.lock.json"));
    match std::fs::read_to_string(&candidate) {
        Ok(contents) => match Lockfile::parse(&contents) {
            Ok(lockfile) => lockfile,
            Err(e) => {
                eprintln!("warning: malformed lockfile at {}: {e}", candidate.display());
                Lockfile::empty()
            }
        },
        Err(_) => Lockfile::empty(),
    }
}

fn run_compile(args: &[String], check_only: bool) {
    let parsed = parse_compile_args(args);
    let source = match std::fs::read_to_string(&parsed.input) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error reading '{}': {e}", parsed.input.display());
            std::process::exit(1);
        }
    };

    let project_root = parsed.input.parent().unwrap_or_else(|| Path::new("."));
    let lockfile = load_lockfile(parsed.lockfile_path.as_deref(), project_root);
    let registry = ModuleRegistry::new();

    let output = run_with_cache(&parsed, &source, &registry, &lockfile);

    print_diagnostics(&output.diagnostics);

    if output.has_errors() {
        std::process::exit(1);
    }

    if check_only {
        println!("OK: {}", parsed.input.display());
        return;
    }

    let Some(js) = &output.js else {
        eprintln!("internal error: no diagnostics reported but no JS was produced");
        std::process::exit(1);
    };

    let out_path = parsed.input.with_extension("js");
    if let Err(e) = std::fs::write(&out_path, js) {
        eprintln!("error writing '{}': {e}", out_path.display());
        std::process::exit(1);
    }
    if let Some(map) = &output.source_map {
        let map_path = parsed.input.with_extension("js.map");
        if let Err(e) = std::fs::write(&map_path, map) {
            eprintln!("error writing '{}': {e}", map_path.display());
            std::process::exit(1);
        }
    }
    println!("Generated: {}", out_path.display());
}

#[cfg(feature = "cache")]
fn run_with_cache(parsed: &CompileArgs, source: &str, registry: &ModuleRegistry, lockfile: &Lockfile) -> PipelineOutput {
    let Some(cache_dir) = &parsed.cache_dir else {
        return compile_source(source, &parsed.options.source_name, registry, lockfile, &parsed.options);
    };
    let fp = crate::cache::fingerprint(source, lockfile);
    if let Ok(Some(hit)) = crate::cache::lookup(cache_dir, fp) {
        tracing::debug!(fingerprint = fp, "module cache hit");
        return hit;
    }
    let output = compile_source(source, &parsed.options.source_name, registry, lockfile, &parsed.options);
    if let Err(e) = crate::cache::store(cache_dir, fp, &output) {
        tracing::warn!(error = %e, "failed to write module cache entry");
    }
    output
}

#[cfg(not(feature = "cache"))]
fn run_with_cache(parsed: &CompileArgs, source: &str, registry: &ModuleRegistry, lockfile: &Lockfile) -> PipelineOutput {
    compile_source(source, &parsed.options.source_name, registry, lockfile, &parsed.options)
}

fn print_diagnostics(diagnostics: &[Diagnostic]) {
    let mut sorted: Vec<&Diagnostic> = diagnostics.iter().collect();
    sorted.sort_by_key(|d| (d.location.start.offset, d.location.end.offset));
    for d in sorted {
        let sev = match d.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        };
        eprintln!("{sev}[{}] {}: {}", d.code, d.location, d.message);
        for related in &d.related_information {
            eprintln!("  note: {} ({})", related.message, related.location);
        }
    }
}

fn run_explain(args: &[String]) {
    let Some(code_str) = args.first() else {
        eprintln!("Usage: lumina explain <CODE>");
        std::process::exit(1);
    };
    let Some(code) = KNOWN_CODES.iter().copied().find(|c| c.as_str().eq_ignore_ascii_case(code_str)) else {
        eprintln!("Unknown diagnostic code: {code_str}");
        eprintln!();
        eprintln!("Known codes:");
        for c in KNOWN_CODES {
            eprintln!("  {c}");
        }
        std::process::exit(1);
    };
    println!("{code}: {}", code.explain());
}
