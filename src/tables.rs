//! Readers for the delimited-text tables exported by the upstream sampling
//! pipeline. All tables are written with pandas, so the first column is an
//! unnamed row index; columns are therefore located by header name rather
//! than by position.

use crate::model::{linspace, Interp1d, T_FINAL};
use crate::Array1;
use anyhow::{anyhow, Context, Error, Result};
use std::collections::HashMap;
use std::path::Path;

fn open_reader(path: &Path) -> Result<csv::Reader<std::fs::File>, Error> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))
}

fn parse_field(record: &csv::StringRecord, idx: usize, path: &Path, row: usize) -> Result<f64, Error> {
    let raw = record
        .get(idx)
        .ok_or_else(|| anyhow!("Row {} of {} is too short", row + 1, path.display()))?;
    raw.parse::<f64>()
        .with_context(|| format!("Bad numeric value {:?} in row {} of {}", raw, row + 1, path.display()))
}

/// A per-gene chain sample table (`{gene}_chain_sample.csv`): flattened,
/// thinned posterior draws with their log-probabilities. The `Pzero` column
/// is only present in the model variant that samples the initial protein
/// level.
#[derive(Debug, Clone)]
pub struct ChainTable {
    pub log_beta: Array1,
    pub log_delta: Array1,
    pub pzero: Option<Array1>,
    pub log_prob: Array1,
}

impl ChainTable {
    pub fn read(path: &Path) -> Result<Self, Error> {
        let mut rdr = open_reader(path)?;
        let headers = rdr.headers()?.clone();
        let col = |name: &str| headers.iter().position(|h| h == name);
        let required = |name: &str| {
            col(name).ok_or_else(|| anyhow!("Column {:?} missing in {}", name, path.display()))
        };
        let log_beta_col = required("log_beta")?;
        let log_delta_col = required("log_delta")?;
        let log_prob_col = required("log_prob")?;
        let pzero_col = col("Pzero");

        let mut table = ChainTable {
            log_beta: Vec::new(),
            log_delta: Vec::new(),
            pzero: pzero_col.map(|_| Vec::new()),
            log_prob: Vec::new(),
        };
        for (row, record) in rdr.records().enumerate() {
            let record = record?;
            table.log_beta.push(parse_field(&record, log_beta_col, path, row)?);
            table.log_delta.push(parse_field(&record, log_delta_col, path, row)?);
            table.log_prob.push(parse_field(&record, log_prob_col, path, row)?);
            if let (Some(idx), Some(pzero)) = (pzero_col, table.pzero.as_mut()) {
                pzero.push(parse_field(&record, idx, path, row)?);
            }
        }
        if table.log_prob.is_empty() {
            return Err(anyhow!("Chain table {} has no draws", path.display()));
        }
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.log_prob.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log_prob.is_empty()
    }

    /// Row index of the draw with the highest log-probability (the MAP
    /// draw); the first such row wins ties.
    pub fn map_index(&self) -> Result<usize, Error> {
        if self.log_prob.iter().any(|v| !v.is_finite()) {
            return Err(anyhow!("All log-probabilities must be finite to locate the MAP draw"));
        }
        let mut best = 0;
        for (i, &lp) in self.log_prob.iter().enumerate() {
            if lp > self.log_prob[best] {
                best = i;
            }
        }
        Ok(best)
    }
}

/// A per-gene posterior predictive results table
/// (`{gene}_posterior_predictive_results.csv`): named scalar statistics,
/// one `(key, value)` row each.
#[derive(Debug, Clone)]
pub struct PredictiveTable {
    entries: Vec<(String, f64)>,
}

impl PredictiveTable {
    pub fn read(path: &Path) -> Result<Self, Error> {
        let mut rdr = open_reader(path)?;
        let mut entries = Vec::new();
        for (row, record) in rdr.records().enumerate() {
            let record = record?;
            let key = record
                .get(0)
                .ok_or_else(|| anyhow!("Row {} of {} is empty", row + 1, path.display()))?
                .to_string();
            let value = parse_field(&record, 1, path, row)?;
            entries.push((key, value));
        }
        Ok(PredictiveTable { entries })
    }

    pub fn value(&self, key: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| *v)
    }

    /// The posterior predictive p-value (Gelman et al. 1996) computed by
    /// the sampling pipeline.
    pub fn pp_pval(&self) -> Result<f64, Error> {
        self.value("pp_pval")
            .ok_or_else(|| anyhow!("No pp_pval entry in posterior predictive table"))
    }
}

/// A gene-indexed expression profile matrix: one row per gene, one column
/// per timepoint of the 96 h experiment.
#[derive(Debug, Clone)]
pub struct ProfileTable {
    rows: HashMap<String, Array1>,
}

impl ProfileTable {
    pub fn read(path: &Path) -> Result<Self, Error> {
        let mut rdr = open_reader(path)?;
        let mut rows = HashMap::new();
        for (row, record) in rdr.records().enumerate() {
            let record = record?;
            let gene = record
                .get(0)
                .ok_or_else(|| anyhow!("Row {} of {} is empty", row + 1, path.display()))?
                .to_string();
            let mut values = Vec::with_capacity(record.len() - 1);
            for idx in 1..record.len() {
                values.push(parse_field(&record, idx, path, row)?);
            }
            if rows.insert(gene.clone(), values).is_some() {
                return Err(anyhow!("Duplicate gene {:?} in {}", gene, path.display()));
            }
        }
        Ok(ProfileTable { rows })
    }

    pub fn get(&self, gene: &str) -> Result<&Array1, Error> {
        self.rows
            .get(gene)
            .ok_or_else(|| anyhow!("Gene {:?} not found in profile table", gene))
    }

    /// Linear interpolant of the gene's profile, with the timepoint columns
    /// spread evenly over the 96 h experiment.
    pub fn interpolator(&self, gene: &str) -> Result<Interp1d, Error> {
        let values = self.get(gene)?;
        let xs = linspace(0.0, T_FINAL, values.len());
        Interp1d::new(xs, values.clone())
    }
}

/// Reads a translation-efficiency decline profile: a two-column table of
/// (time, factor) samples, interpolated linearly.
pub fn read_te_profile(path: &Path) -> Result<Interp1d, Error> {
    let mut rdr = open_reader(path)?;
    let mut xs = Vec::new();
    let mut ys = Vec::new();
    for (row, record) in rdr.records().enumerate() {
        let record = record?;
        xs.push(parse_field(&record, 0, path, row)?);
        ys.push(parse_field(&record, 1, path, row)?);
    }
    Interp1d::new(xs, ys).with_context(|| format!("Bad efficiency profile in {}", path.display()))
}
