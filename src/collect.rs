//! The aggregation pass: enumerate the per-gene chain exports, summarize
//! each gene, and write all rows to one flat table.

use crate::model::{time_grid, Interp1d, ProteinModel};
use crate::summary::{summarize_chain, SummaryRow};
use crate::tables::{read_te_profile, ChainTable, PredictiveTable, ProfileTable};
use anyhow::{anyhow, Context, Error, Result};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

pub const CHAIN_FILE_SUFFIX: &str = "_chain_sample.csv";
pub const PREDICTIVE_FILE_SUFFIX: &str = "_posterior_predictive_results.csv";
/// Fixed initial protein level used by the model variant that does not
/// sample it.
pub const DEFAULT_INITIAL_PROTEIN: f64 = 10_000.0;
/// Default RK4 step size in hours.
pub const DEFAULT_DT: f64 = 0.05;

/// Inputs of one summary pass.
#[derive(Debug, Clone)]
pub struct SummaryConfig {
    /// Directory holding `{gene}_chain_sample.csv` and
    /// `{gene}_posterior_predictive_results.csv` files
    pub results_dir: PathBuf,
    /// Gene-indexed mRNA profile table driving the model simulation
    pub mrna_profiles: PathBuf,
    /// Optional translation-efficiency decline profile
    pub te_profile: Option<PathBuf>,
    /// Initial protein level for chains without a `Pzero` column
    pub initial_protein: f64,
    /// RK4 step size in hours
    pub dt: f64,
}

/// Lists the genes with a chain export under `results_dir`, sorted
/// lexicographically. An empty result is an error: it almost always means
/// the directory is wrong, and silently writing an empty summary would
/// mask that.
pub fn enumerate_genes(results_dir: &Path) -> Result<Vec<String>, Error> {
    let entries = fs::read_dir(results_dir)
        .with_context(|| format!("Failed to read results directory {}", results_dir.display()))?;
    let mut genes = Vec::new();
    for entry in entries {
        let name = entry?.file_name();
        if let Some(name) = name.to_str() {
            if let Some(gene) = name.strip_suffix(CHAIN_FILE_SUFFIX) {
                genes.push(gene.to_string());
            }
        }
    }
    if genes.is_empty() {
        return Err(anyhow!(
            "No *{} files found in {}",
            CHAIN_FILE_SUFFIX,
            results_dir.display()
        ));
    }
    genes.sort();
    Ok(genes)
}

/// Runs the full per-gene pipeline: read the chain and posterior predictive
/// tables, summarize the chain, simulate the model at the MAP parameters,
/// and assemble the flat output record.
pub fn summarize_gene(
    gene: &str,
    config: &SummaryConfig,
    profiles: &ProfileTable,
    te_decline: Option<&Interp1d>,
) -> Result<SummaryRow, Error> {
    let chain_path = config.results_dir.join(format!("{}{}", gene, CHAIN_FILE_SUFFIX));
    let chain = ChainTable::read(&chain_path)
        .with_context(|| format!("Failed to read chain for gene {}", gene))?;

    let predictive_path = config
        .results_dir
        .join(format!("{}{}", gene, PREDICTIVE_FILE_SUFFIX));
    let predictive = PredictiveTable::read(&predictive_path)
        .with_context(|| format!("Failed to read posterior predictive results for gene {}", gene))?;

    let summary = summarize_chain(&chain)
        .with_context(|| format!("Failed to summarize chain for gene {}", gene))?;
    let pzero = summary.pzero_map.unwrap_or(config.initial_protein);

    let model = ProteinModel {
        beta: summary.beta.map,
        delta: summary.delta.map,
        mrna: profiles.interpolator(gene)?,
        te_decline: te_decline.cloned(),
    };
    let trajectory = model
        .simulate(pzero, &time_grid(), config.dt)
        .with_context(|| format!("Model simulation failed for gene {}", gene))?;

    SummaryRow::assemble(gene, &summary, pzero, predictive.pp_pval()?, &trajectory)
}

/// Summarizes every gene found under the results directory, in sorted
/// order. Any missing or malformed file aborts the pass; partial summary
/// tables are worse than none.
pub fn summarize_directory(config: &SummaryConfig) -> Result<Vec<SummaryRow>, Error> {
    let profiles = ProfileTable::read(&config.mrna_profiles)?;
    let te_decline = match &config.te_profile {
        Some(path) => Some(read_te_profile(path)?),
        None => None,
    };

    let genes = enumerate_genes(&config.results_dir)?;
    info!("Summarizing {} genes from {}", genes.len(), config.results_dir.display());

    let mut rows = Vec::with_capacity(genes.len());
    for gene in &genes {
        info!("Summarizing gene {}", gene);
        rows.push(summarize_gene(gene, config, &profiles, te_decline.as_ref())?);
    }
    Ok(rows)
}

/// Writes all summary rows to one CSV file.
pub fn write_summary(rows: &[SummaryRow], path: &Path) -> Result<(), Error> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    info!("Wrote {} summary rows to {}", rows.len(), path.display());
    Ok(())
}
