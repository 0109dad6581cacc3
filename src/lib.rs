//! Post-hoc summary extraction for per-gene MCMC posterior chains produced
//! by a protein translation/decay rate inference pipeline.
//!
//! The sampler itself lives upstream; this crate only reduces its exported
//! chain tables. For each gene it extracts the MAP parameter vector, credible
//! intervals and percentiles of the sampled rates, single-chain convergence
//! diagnostics, and one forward simulation of the protein model at the MAP
//! parameters, then collects everything into a single flat summary table.
#[macro_use]
extern crate approx;

/// The aggregation pass: gene enumeration, per-gene summaries, table output
pub mod collect;
/// Single-chain convergence diagnostics (effective sample size, split Rhat)
pub mod diagnostics;
/// Highest density interval (HDI) of a posterior sample
pub mod hdi;
/// Protein dynamics model and its fixed-step forward integration
pub mod model;
/// Per-gene summary statistics assembled from a chain table
pub mod summary;
/// Readers for the delimited-text tables exported by the upstream pipeline
pub mod tables;
/// Convenience utilities like chain splitting and certain helper functions
/// intended mostly for internal use (e.g. summary statistics)
pub mod utils;

/// One-dimensional vector of numeric values
pub type Array1 = Vec<f64>;
