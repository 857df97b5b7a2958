//! Shared helpers for CLI commands.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use qmap_compile::{BasisGates, CompileOptions, CouplingMap, Layout, MAX_QUBITS};
use qmap_ir::{Circuit, CircuitDescription};

/// Contents of a target configuration file.
///
/// ```yaml
/// coupling_map:
///   0: [1, 2]
///   1: [2]
/// initial_layout: [0, 1, 2]
/// basis_gates: [u1, u2, u3, cx, id]
/// seed: 11
/// trials: 20
/// swap_cap: 16
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetConfig {
    /// Control qubit to the targets it can drive.
    #[serde(default)]
    pub coupling_map: Option<BTreeMap<u32, Vec<u32>>>,
    /// Physical qubit of each circuit qubit, in circuit order.
    #[serde(default)]
    pub initial_layout: Option<Vec<u32>>,
    #[serde(default)]
    pub basis_gates: Option<Vec<String>>,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub trials: Option<usize>,
    /// Swaps a single routing trial may insert.
    #[serde(default)]
    pub swap_cap: Option<usize>,
}

impl TargetConfig {
    /// Read a target file, choosing the format by extension.
    pub fn load(path: &str) -> Result<Self> {
        let source = read_file(path)?;
        let ext = extension(path);
        if ext == "json" {
            serde_json::from_str(&source).with_context(|| format!("Invalid target file: {path}"))
        } else {
            serde_yaml_ng::from_str(&source)
                .with_context(|| format!("Invalid target file: {path}"))
        }
    }

    /// Turn the file contents into compile options. A `device` preset fills
    /// in the coupling map when the file does not give one.
    pub fn into_options(self, device: Option<&str>) -> Result<CompileOptions> {
        let mut options = CompileOptions::new();

        let coupling_map = match (&self.coupling_map, device) {
            (Some(adjacency), _) => Some(
                CouplingMap::from_adjacency(adjacency).context("Invalid coupling map")?,
            ),
            (None, Some(device)) => Some(parse_device(device)?),
            (None, None) => None,
        };
        if let Some(coupling_map) = coupling_map {
            options = options.with_coupling_map(coupling_map);
        }
        if let Some(physical) = &self.initial_layout {
            let layout = Layout::from_physical(physical).context("Invalid initial layout")?;
            options = options.with_initial_layout(layout);
        }
        if let Some(gates) = self.basis_gates {
            options = options.with_basis_gates(BasisGates::new(gates));
        }
        if let Some(seed) = self.seed {
            options = options.with_seed(seed);
        }
        if let Some(trials) = self.trials {
            options = options.with_trials(trials);
        }
        if let Some(cap) = self.swap_cap {
            options = options.with_swap_cap(cap);
        }
        Ok(options)
    }
}

/// Parse a device preset such as `linear:5`, `star:5` or `full:4`.
pub fn parse_device(device: &str) -> Result<CouplingMap> {
    let (kind, size) = device
        .split_once(':')
        .with_context(|| format!("Device '{device}' must look like 'linear:5'"))?;
    let n: u32 = size
        .trim()
        .parse()
        .with_context(|| format!("Invalid device size: '{size}'"))?;
    if n == 0 {
        anyhow::bail!("Device '{device}' has no qubits");
    }
    if n > MAX_QUBITS {
        anyhow::bail!("Device '{device}' exceeds the limit of {MAX_QUBITS} qubits");
    }

    match kind.trim().to_lowercase().as_str() {
        "linear" | "line" => Ok(CouplingMap::linear(n)),
        "star" => Ok(CouplingMap::star(n)),
        "full" => Ok(CouplingMap::full(n)),
        other => anyhow::bail!("Unknown device kind: '{other}'. Available: linear, star, full"),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CircuitFile {
    One(CircuitDescription),
    Many(Vec<CircuitDescription>),
}

/// Load circuits from a JSON file holding one description or a list.
pub fn load_circuits(path: &str) -> Result<Vec<Circuit>> {
    let source = read_file(path)?;
    let descriptions = match serde_json::from_str(&source)
        .with_context(|| format!("Invalid circuit file: {path}"))?
    {
        CircuitFile::One(description) => vec![description],
        CircuitFile::Many(descriptions) => descriptions,
    };

    descriptions
        .iter()
        .map(|d| {
            d.to_circuit()
                .with_context(|| format!("Invalid circuit '{}'", d.name))
        })
        .collect()
}

fn read_file(path: &str) -> Result<String> {
    if !Path::new(path).exists() {
        anyhow::bail!("File not found: {path}");
    }
    fs::read_to_string(path).with_context(|| format!("Failed to read file: {path}"))
}

fn extension(path: &str) -> String {
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}
