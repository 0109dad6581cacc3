use anyhow::{anyhow, Error, Result};

/// Compute the arithmetic mean of an array.
pub fn mean(arr: &[f64]) -> Result<f64, Error> {
    if arr.is_empty() {
        return Err(anyhow!("Can't take mean of empty array"));
    }
    let sum = arr.iter().sum::<f64>();
    let count = arr.len() as f64;
    Ok(sum / count)
}

/// Compute the sample variance of an array using Bessel's correction.
pub fn sample_variance(arr: &[f64]) -> Result<f64, Error> {
    if arr.len() < 2 {
        return Err(anyhow!(
            "Need at least 2 values for sample variance, got {}",
            arr.len()
        ));
    }
    let xbar = mean(arr)?;
    Ok(arr.iter().map(|x| (x - xbar).powi(2)).sum::<f64>() / (arr.len() as f64 - 1.0))
}

/// Linearly interpolated percentile of an array for `q` in [0, 100],
/// matching the numpy default definition. The input does not need to
/// be sorted.
pub fn percentile(arr: &[f64], q: f64) -> Result<f64, Error> {
    if arr.is_empty() {
        return Err(anyhow!("Can't take percentile of empty array"));
    }
    if !(0.0..=100.0).contains(&q) {
        return Err(anyhow!("Percentile must be in [0, 100], got {}", q));
    }
    if arr.iter().any(|v| !v.is_finite()) {
        return Err(anyhow!("All values must be finite to compute a percentile"));
    }
    let mut sorted = arr.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let pos = q / 100.0 * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    Ok(sorted[lo] + (pos - lo as f64) * (sorted[hi] - sorted[lo]))
}

/// Splits one flat chain into two halves of equal length. When the number
/// of draws N is odd, the (N+1)/2th draw is ignored, per the Stan split
/// convention.
///
/// See more details in Stan reference manual section
/// ["Effective Sample Size"](http://mc-stan.org/users/documentation).
pub fn split_in_half(arr: &[f64]) -> Result<(Vec<f64>, Vec<f64>), Error> {
    if arr.len() < 4 {
        return Err(anyhow!(
            "Need at least 4 draws to split a chain, got {}",
            arr.len()
        ));
    }
    let (half, offset) = if arr.len() % 2 == 0 {
        (arr.len() / 2, 0)
    } else {
        ((arr.len() - 1) / 2, 1)
    };
    Ok((arr[..half].to_vec(), arr[(half + offset)..].to_vec()))
}
