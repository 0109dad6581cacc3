use anyhow::{anyhow, Error, Result};

/// Computes the highest density interval (HDI) from a sample of
/// representative values, estimated as the shortest interval containing
/// `credible_mass` of the probability mass. For unimodal posteriors this
/// is the meaningful companion interval to the MAP estimate.
///
/// The interval is found by sweeping a window of `ceil(credible_mass * n)`
/// consecutive sorted samples and keeping the narrowest one; width ties
/// resolve to the left-most window.
///
/// # Arguments
/// * `samples` - draws from the posterior, in any order
/// * `credible_mass` - probability mass the interval must contain, in (0, 1)
pub fn highest_density_interval(samples: &[f64], credible_mass: f64) -> Result<(f64, f64), Error> {
    if samples.is_empty() {
        return Err(anyhow!("Can't compute HDI of empty sample"));
    }
    if !(0.0 < credible_mass && credible_mass < 1.0) {
        return Err(anyhow!(
            "Credible mass must be in (0, 1), got {}",
            credible_mass
        ));
    }
    if samples.iter().any(|v| !v.is_finite()) {
        return Err(anyhow!("All values must be finite to compute HDI"));
    }

    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());

    let window = (credible_mass * sorted.len() as f64).ceil() as usize;
    if window >= sorted.len() {
        return Err(anyhow!(
            "Too few samples ({}) to resolve a {} mass interval",
            sorted.len(),
            credible_mass
        ));
    }

    let mut best = 0;
    let mut best_width = f64::INFINITY;
    for i in 0..(sorted.len() - window) {
        let width = sorted[i + window] - sorted[i];
        if width < best_width {
            best_width = width;
            best = i;
        }
    }
    Ok((sorted[best], sorted[best + window]))
}
