//! Compile command implementation.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use console::style;

use qmap_compile::{CompiledCircuit, Compiler};

use super::common::{TargetConfig, load_circuits};

/// Arguments of `qmap compile`.
#[derive(Debug, Clone, Default)]
pub struct CompileArgs {
    pub input: String,
    pub target: Option<String>,
    pub device: Option<String>,
    pub output: Option<String>,
    pub seed: Option<u64>,
    pub trials: Option<usize>,
    pub swap_cap: Option<usize>,
    pub config: bool,
    pub diagnostics: bool,
}

/// Execute the compile command.
pub fn execute(args: &CompileArgs) -> Result<()> {
    let mut target = match &args.target {
        Some(path) => TargetConfig::load(path)?,
        None => TargetConfig::default(),
    };
    if args.seed.is_some() {
        target.seed = args.seed;
    }
    if args.trials.is_some() {
        target.trials = args.trials;
    }
    if args.swap_cap.is_some() {
        target.swap_cap = args.swap_cap;
    }
    let options = target.into_options(args.device.as_deref())?;

    let device = match options.coupling_map() {
        Some(map) => format!("{}-qubit device", map.num_qubits()),
        None => "all-to-all".to_string(),
    };
    eprintln!(
        "{} Compiling {} for {}",
        style("→").cyan().bold(),
        style(&args.input).green(),
        style(device).yellow()
    );

    let circuits = load_circuits(&args.input)?;
    eprintln!("  Loaded: {} circuit(s)", circuits.len());

    let compiler = Compiler::new(options).context("Invalid compile options")?;
    let batch = compiler.compile_batch(circuits);

    if let Some(dir) = &args.output {
        fs::create_dir_all(dir).with_context(|| format!("Failed to create directory: {dir}"))?;
    }

    let mut written = HashSet::new();
    for (index, (name, result)) in batch.iter().enumerate() {
        match result {
            Ok(compiled) => {
                let base = file_stem(name);
                let stem = if written.insert(base.clone()) {
                    base
                } else {
                    format!("{base}_{index}")
                };
                emit(compiled, &stem, args)?;
            }
            Err(e) => {
                eprintln!(
                    "{} {} ({:?} error): {}",
                    style("✗").red().bold(),
                    style(name).bold(),
                    e.category(),
                    e
                );
            }
        }
    }

    let failed = batch.failures().count();
    if failed > 0 {
        anyhow::bail!("{failed} of {} circuit(s) failed to compile", batch.len());
    }
    eprintln!("{} Compilation complete", style("✓").green().bold());
    Ok(())
}

/// Output file stem for a circuit name. Anything that is not an ASCII
/// letter, digit, `-` or `_` becomes `_`, so names cannot leave the
/// output directory.
fn file_stem(name: &str) -> String {
    let stem: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if stem.is_empty() {
        "circuit".to_string()
    } else {
        stem
    }
}

/// Print or save one compiled circuit.
fn emit(compiled: &CompiledCircuit, stem: &str, args: &CompileArgs) -> Result<()> {
    let stats = compiled.stats();
    eprintln!(
        "{} {}: {} ops, depth {}, {} cx, {} swap(s), seed {}",
        style("✓").green().bold(),
        style(compiled.name()).bold(),
        stats.ops_after,
        stats.depth,
        stats.cx_count,
        stats.swaps,
        compiled.seed()
    );
    if args.diagnostics {
        eprint!("{}", compiled.diagnostics());
    }

    let qasm = compiled
        .qasm()
        .with_context(|| format!("Failed to emit '{}'", compiled.name()))?;
    let config = if args.config {
        Some(serde_json::to_string_pretty(&compiled.config())?)
    } else {
        None
    };

    match &args.output {
        Some(dir) => {
            let qasm_path = Path::new(dir).join(format!("{stem}.qasm"));
            fs::write(&qasm_path, qasm)
                .with_context(|| format!("Failed to write file: {}", qasm_path.display()))?;
            eprintln!("  Output: {}", style(qasm_path.display()).green());

            if let Some(config) = config {
                let config_path = Path::new(dir).join(format!("{stem}.json"));
                fs::write(&config_path, config).with_context(|| {
                    format!("Failed to write file: {}", config_path.display())
                })?;
                eprintln!("  Config: {}", style(config_path.display()).green());
            }
        }
        None => {
            println!("// {}", compiled.name());
            print!("{qasm}");
            if let Some(config) = config {
                println!("{config}");
            }
        }
    }
    Ok(())
}
