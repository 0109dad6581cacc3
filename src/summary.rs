use crate::diagnostics::{effective_sample_size, split_rhat};
use crate::hdi::highest_density_interval;
use crate::tables::ChainTable;
use crate::utils::percentile;
use crate::Array1;
use anyhow::{anyhow, Error, Result};
use serde::Serialize;

/// Point and interval estimates for one rate parameter on the natural
/// scale: MAP, median, 2.5/97.5 percentiles, and 68%/95% HDIs.
#[derive(Debug, Clone)]
pub struct ParameterSummary {
    pub map: f64,
    pub median: f64,
    pub p2_5: f64,
    pub p97_5: f64,
    pub hdi68: (f64, f64),
    pub hdi95: (f64, f64),
}

impl ParameterSummary {
    /// Summarizes log-scale draws after back-transforming them with `exp`.
    /// The HDI is not invariant under the transform, so all intervals are
    /// computed on the natural scale, where the rates themselves live.
    pub fn from_log_samples(log_samples: &[f64], map_index: usize) -> Result<Self, Error> {
        if map_index >= log_samples.len() {
            return Err(anyhow!(
                "MAP index {} out of bounds for {} draws",
                map_index,
                log_samples.len()
            ));
        }
        let samples: Array1 = log_samples.iter().map(|v| v.exp()).collect();
        Ok(ParameterSummary {
            map: samples[map_index],
            median: percentile(&samples, 50.0)?,
            p2_5: percentile(&samples, 2.5)?,
            p97_5: percentile(&samples, 97.5)?,
            hdi68: highest_density_interval(&samples, 0.68)?,
            hdi95: highest_density_interval(&samples, 0.95)?,
        })
    }
}

/// Everything derivable from one gene's chain table alone: parameter
/// summaries, the MAP initial protein level (when sampled), the half-life
/// implied by the MAP decay rate, and convergence diagnostics on the
/// sampling (log) scale.
#[derive(Debug, Clone)]
pub struct ChainSummary {
    pub beta: ParameterSummary,
    pub delta: ParameterSummary,
    pub pzero_map: Option<f64>,
    pub half_life_h: f64,
    pub ess_log_beta: f64,
    pub ess_log_delta: f64,
    pub rhat_log_beta: f64,
    pub rhat_log_delta: f64,
}

pub fn summarize_chain(chain: &ChainTable) -> Result<ChainSummary, Error> {
    let map_index = chain.map_index()?;
    let beta = ParameterSummary::from_log_samples(&chain.log_beta, map_index)?;
    let delta = ParameterSummary::from_log_samples(&chain.log_delta, map_index)?;
    let half_life_h = 2.0_f64.ln() / delta.map;
    Ok(ChainSummary {
        pzero_map: chain.pzero.as_ref().map(|p| p[map_index]),
        half_life_h,
        ess_log_beta: effective_sample_size(&chain.log_beta)?,
        ess_log_delta: effective_sample_size(&chain.log_delta)?,
        rhat_log_beta: split_rhat(&chain.log_beta)?,
        rhat_log_delta: split_rhat(&chain.log_delta)?,
        beta,
        delta,
    })
}

/// One flat output record of the summary table.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryRow {
    pub gene: String,
    pub beta_map: f64,
    pub beta_median: f64,
    pub beta_p2_5: f64,
    pub beta_p97_5: f64,
    pub beta_hdi68_low: f64,
    pub beta_hdi68_high: f64,
    pub beta_hdi95_low: f64,
    pub beta_hdi95_high: f64,
    pub delta_map: f64,
    pub delta_median: f64,
    pub delta_p2_5: f64,
    pub delta_p97_5: f64,
    pub delta_hdi68_low: f64,
    pub delta_hdi68_high: f64,
    pub delta_hdi95_low: f64,
    pub delta_hdi95_high: f64,
    pub pzero_map: f64,
    pub half_life_h: f64,
    pub ess_log_beta: f64,
    pub ess_log_delta: f64,
    pub rhat_log_beta: f64,
    pub rhat_log_delta: f64,
    pub pp_pval: f64,
    pub model_tp1: f64,
    pub model_tp2: f64,
    pub model_tp3: f64,
    pub model_tp4: f64,
    pub model_tp5: f64,
    pub model_tp6: f64,
}

impl SummaryRow {
    /// Flattens a chain summary plus the externally supplied pieces (the
    /// effective initial protein level, the posterior predictive p-value,
    /// and the 6-point MAP trajectory) into one record.
    pub fn assemble(
        gene: &str,
        summary: &ChainSummary,
        pzero: f64,
        pp_pval: f64,
        trajectory: &[f64],
    ) -> Result<Self, Error> {
        if trajectory.len() != crate::model::N_TIMEPOINTS {
            return Err(anyhow!(
                "Expected a {}-point trajectory, got {} points",
                crate::model::N_TIMEPOINTS,
                trajectory.len()
            ));
        }
        Ok(SummaryRow {
            gene: gene.to_string(),
            beta_map: summary.beta.map,
            beta_median: summary.beta.median,
            beta_p2_5: summary.beta.p2_5,
            beta_p97_5: summary.beta.p97_5,
            beta_hdi68_low: summary.beta.hdi68.0,
            beta_hdi68_high: summary.beta.hdi68.1,
            beta_hdi95_low: summary.beta.hdi95.0,
            beta_hdi95_high: summary.beta.hdi95.1,
            delta_map: summary.delta.map,
            delta_median: summary.delta.median,
            delta_p2_5: summary.delta.p2_5,
            delta_p97_5: summary.delta.p97_5,
            delta_hdi68_low: summary.delta.hdi68.0,
            delta_hdi68_high: summary.delta.hdi68.1,
            delta_hdi95_low: summary.delta.hdi95.0,
            delta_hdi95_high: summary.delta.hdi95.1,
            pzero_map: pzero,
            half_life_h: summary.half_life_h,
            ess_log_beta: summary.ess_log_beta,
            ess_log_delta: summary.ess_log_delta,
            rhat_log_beta: summary.rhat_log_beta,
            rhat_log_delta: summary.rhat_log_delta,
            pp_pval,
            model_tp1: trajectory[0],
            model_tp2: trajectory[1],
            model_tp3: trajectory[2],
            model_tp4: trajectory[3],
            model_tp5: trajectory[4],
            model_tp6: trajectory[5],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synthetic_chain() -> ChainTable {
        // exp-transformed draws come out as 1, 4, 9, ..., 400 (the squares
        // of 1..20), which makes every statistic hand-checkable; the gaps
        // grow strictly, so the narrowest HDI window is unique
        let log_beta: Vec<f64> = (1..=20).map(|i| 2.0 * f64::from(i).ln()).collect();
        let log_delta: Vec<f64> = log_beta.iter().map(|v| v - 3.0).collect();
        // highest log-probability at the 5th draw
        let log_prob: Vec<f64> = (0..20)
            .map(|i| if i == 4 { -1.0 } else { -10.0 - i as f64 })
            .collect();
        ChainTable {
            log_beta,
            log_delta,
            pzero: Some((0..20).map(|i| 100.0 + f64::from(i)).collect()),
            log_prob,
        }
    }

    #[test]
    fn test_parameter_summary_hand_checked() {
        let chain = synthetic_chain();
        let summary = summarize_chain(&chain).unwrap();

        // MAP draw is row 4, where exp(log_beta) == 25
        assert_abs_diff_eq!(summary.beta.map, 25.0, epsilon = 1e-9);
        // numpy on the squares of 1..20: median 110.5, p2.5 = 2.425,
        // p97.5 = 381.475
        assert_abs_diff_eq!(summary.beta.median, 110.5, epsilon = 1e-9);
        assert_abs_diff_eq!(summary.beta.p2_5, 2.425, epsilon = 1e-9);
        assert_abs_diff_eq!(summary.beta.p97_5, 381.475, epsilon = 1e-9);
        // gaps grow to the right, so both HDI windows hug the left edge:
        // 14 of 20 points for 68% mass, 19 of 20 for 95%
        assert_abs_diff_eq!(summary.beta.hdi68.0, 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(summary.beta.hdi68.1, 225.0, epsilon = 1e-9);
        assert_abs_diff_eq!(summary.beta.hdi95.0, 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(summary.beta.hdi95.1, 400.0, epsilon = 1e-9);
    }

    #[test]
    fn test_half_life_and_pzero() {
        let chain = synthetic_chain();
        let summary = summarize_chain(&chain).unwrap();
        let delta_map = (chain.log_delta[4]).exp();
        assert_abs_diff_eq!(
            summary.half_life_h,
            2.0_f64.ln() / delta_map,
            epsilon = 1e-12
        );
        assert_abs_diff_eq!(summary.pzero_map.unwrap(), 104.0, epsilon = 1e-12);
    }

    #[test]
    fn test_diagnostics_on_log_scale() {
        let chain = synthetic_chain();
        let summary = summarize_chain(&chain).unwrap();
        assert!(summary.ess_log_beta.is_finite() && summary.ess_log_beta > 0.0);
        assert!(summary.ess_log_delta.is_finite() && summary.ess_log_delta > 0.0);
        // a monotone ramp has clearly diverged halves
        assert!(summary.rhat_log_beta > 1.0);
        assert!(summary.rhat_log_delta > 1.0);
    }

    #[test]
    fn test_assemble_checks_trajectory_length() {
        let chain = synthetic_chain();
        let summary = summarize_chain(&chain).unwrap();
        assert!(SummaryRow::assemble("g", &summary, 100.0, 0.5, &[1.0; 5]).is_err());
        let row = SummaryRow::assemble("g", &summary, 100.0, 0.5, &[1.0; 6]).unwrap();
        assert_eq!(row.gene, "g");
        assert_abs_diff_eq!(row.pp_pval, 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(row.model_tp6, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_map_index_out_of_bounds() {
        assert!(ParameterSummary::from_log_samples(&[0.0, 0.1], 2).is_err());
    }

    #[test]
    fn test_nan_draw_is_an_error() {
        // "NaN" parses as a valid f64, so a corrupt chain export can reach
        // the summary stage; it must come back as an error, not a panic
        let mut chain = synthetic_chain();
        chain.log_beta[2] = f64::NAN;
        assert!(summarize_chain(&chain).is_err());

        let mut chain = synthetic_chain();
        chain.log_delta[7] = f64::NAN;
        assert!(summarize_chain(&chain).is_err());
    }
}
