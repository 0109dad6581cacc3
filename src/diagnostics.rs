use crate::utils::{mean, sample_variance, split_in_half};
use anyhow::{anyhow, Error, Result};
use arima::acf;

/// Computes the effective sample size (ESS) of one flat chain. The value
/// returned is the minimum of ESS and `n * log10(n)`. The chains exported
/// by the sampling pipeline are already flattened across walkers, so the
/// between-chain variance terms of the multi-chain estimator collapse and
/// only the autocovariance of the single chain remains.
///
/// Note that the effective sample size can not be estimated with fewer
/// than four draws.
///
/// See more details in Stan reference manual section
/// ["Effective Sample Size"](http://mc-stan.org/users/documentation)
///
/// Based on reference implementation in Stan v2.24.0 at
/// [https://github.com/stan-dev/stan/blob/v2.24.0/src/stan/analyze/mcmc/compute_effective_sample_size.hpp#L32-L138]()
///
/// # Arguments
/// * `samples` - draws of one parameter, in sampling order
pub fn effective_sample_size(samples: &[f64]) -> Result<f64, Error> {
    let num_draws = samples.len();
    if num_draws < 4 {
        return Err(anyhow!("Must have at least 4 samples to compute ESS"));
    }
    if samples.iter().any(|v| !v.is_finite()) {
        return Err(anyhow!("All values must be finite to compute ESS"));
    }
    if samples.windows(2).all(|w| (w[1] - w[0]).abs() < 1e-10) {
        return Err(anyhow!(
            "No ESS when elements are all constant (value={})",
            samples[0]
        ));
    }

    let acov = acf::acf(samples, None, true).unwrap();
    let n = num_draws as f64;
    let mean_var = acov[0] * n / (n - 1.0);
    // single chain: var_plus = mean_var * (n - 1) / n, i.e. acov[0]
    let var_plus = acov[0];

    let mut rho_hat_s = vec![0.0; num_draws];
    let mut rho_hat_even = 1.0;
    rho_hat_s[0] = rho_hat_even;
    let mut rho_hat_odd = 1.0 - (mean_var - acov[1]) / var_plus;
    rho_hat_s[1] = rho_hat_odd;

    // Convert raw autocovariance estimators into Geyer's initial
    // positive sequence. Loop only until num_draws - 4 to
    // leave the last pair of autocorrelations as a bias term that
    // reduces variance in the case of antithetical chains.
    let mut s = 1;
    while s < (num_draws - 4) && (rho_hat_even + rho_hat_odd) > 0.0 {
        rho_hat_even = 1.0 - (mean_var - acov[s + 1]) / var_plus;
        rho_hat_odd = 1.0 - (mean_var - acov[s + 2]) / var_plus;
        if (rho_hat_even + rho_hat_odd) >= 0.0 {
            rho_hat_s[s + 1] = rho_hat_even;
            rho_hat_s[s + 2] = rho_hat_odd;
        }
        s += 2;
    }

    let max_s = s;
    // this is used in the improved estimate, which reduces variance
    // in antithetic case -- see tau_hat below
    if rho_hat_even > 0.0 {
        rho_hat_s[max_s + 1] = rho_hat_even;
    }

    // Convert Geyer's initial positive sequence into an initial
    // monotone sequence
    let mut s = 1;
    while max_s >= 3 && s <= (max_s - 3) {
        if (rho_hat_s[s + 1] + rho_hat_s[s + 2]) > (rho_hat_s[s - 1] + rho_hat_s[s]) {
            rho_hat_s[s + 1] = (rho_hat_s[s - 1] + rho_hat_s[s]) / 2.0;
            rho_hat_s[s + 2] = rho_hat_s[s + 1];
        };
        s += 2;
    }

    // Geyer's truncated estimator for the asymptotic variance
    let tau_hat: f64 =
        -1.0 + 2.0 * rho_hat_s.iter().take(max_s).sum::<f64>() + rho_hat_s[max_s + 1];
    let option1: f64 = n / tau_hat;
    let option2: f64 = n * n.log10();
    Ok(option1.min(option2))
}

/// Computes the split potential scale reduction factor (Rhat) of one flat
/// chain: the chain is split in half and the two halves are compared as if
/// they were independent chains. When the number of draws N is odd, the
/// (N+1)/2th draw is ignored.
///
/// See more details in Stan reference manual section
/// ["Potential Scale Reduction"](https://mc-stan.org/docs/2_24/reference-manual/notation-for-samples-chains-and-draws.html#potential-scale-reduction)
///
/// Based on reference implementation in Stan v2.24.0 at
/// [https://github.com/stan-dev/stan/blob/v2.24.0/src/stan/analyze/mcmc/compute_potential_scale_reduction.hpp]()
pub fn split_rhat(samples: &[f64]) -> Result<f64, Error> {
    let (first, second) = split_in_half(samples)?;
    let n = first.len() as f64;

    let half_means = vec![mean(&first)?, mean(&second)?];
    let half_vars = vec![sample_variance(&first)?, sample_variance(&second)?];

    let var_between = n * sample_variance(&half_means)?;
    let var_within = mean(&half_vars)?;
    Ok(((var_between / var_within + n - 1.0) / n).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_rhat_diverged_halves() {
        // Halves [1, 2] and [3, 4]: B = 2 * var([1.5, 3.5]) = 4,
        // W = mean([0.5, 0.5]) = 0.5, Rhat = sqrt((4 / 0.5 + 1) / 2)
        let samples = vec![1.0, 2.0, 3.0, 4.0];
        let rhat = split_rhat(&samples).unwrap();
        assert_abs_diff_eq!(rhat, 4.5_f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_split_rhat_identical_halves() {
        // Identical halves have zero between-half variance, so
        // Rhat = sqrt((n - 1) / n) with n = 4 draws per half.
        let samples = vec![1.0, 2.0, 1.0, 2.0, 1.0, 2.0, 1.0, 2.0];
        let rhat = split_rhat(&samples).unwrap();
        assert_abs_diff_eq!(rhat, 0.75_f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_split_rhat_minimum_n() {
        assert!(split_rhat(&[1.0, 2.0, 3.0]).is_err());
    }

    #[test]
    fn test_ess_minimum_n() {
        assert!(effective_sample_size(&[1.0, 2.0, 3.0]).is_err());
    }

    #[test]
    fn test_ess_sufficient_n() {
        let ess = effective_sample_size(&[1.0, 2.0, 3.0, 4.0]);
        assert!(ess.unwrap().is_finite());
    }

    #[test]
    fn test_ess_nan() {
        assert!(effective_sample_size(&[1.0, f64::NAN, 3.0, 4.0]).is_err());
    }

    #[test]
    fn test_ess_constant() {
        assert!(effective_sample_size(&[1.0, 1.0, 1.0, 1.0]).is_err());
    }

    #[test]
    fn test_ess_trending_chain_is_penalized() {
        // A monotone ramp is maximally autocorrelated; its ESS must come
        // out far below the nominal draw count.
        let samples: Vec<f64> = (0..200).map(f64::from).collect();
        let ess = effective_sample_size(&samples).unwrap();
        assert!(ess > 0.0);
        assert!(ess < samples.len() as f64 / 2.0);
    }

    #[test]
    fn test_ess_antithetic_chain_stays_bounded() {
        // A perfectly alternating chain trips the bias-correction path;
        // the estimate must stay positive and below the n log10(n) cap.
        let samples: Vec<f64> = (0..100).map(|i| f64::from(i % 2)).collect();
        let n = samples.len() as f64;
        let ess = effective_sample_size(&samples).unwrap();
        assert!(ess > 0.0);
        assert!(ess <= n * n.log10() + 1e-9);
    }
}
