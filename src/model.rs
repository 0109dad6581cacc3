use crate::Array1;
use anyhow::{anyhow, Error, Result};

/// Duration of the experiment in hours.
pub const T_FINAL: f64 = 96.0;
/// Number of profile timepoints.
pub const N_TIMEPOINTS: usize = 6;

/// `n` evenly spaced values from `start` to `stop` inclusive.
pub fn linspace(start: f64, stop: f64, n: usize) -> Array1 {
    let step = (stop - start) / (n - 1) as f64;
    (0..n).map(|i| start + step * i as f64).collect()
}

/// The fixed 6-point observation grid over the 96 h experiment:
/// `[0.0, 19.2, 38.4, 57.6, 76.8, 96.0]`.
pub fn time_grid() -> Array1 {
    linspace(0.0, T_FINAL, N_TIMEPOINTS)
}

/// Linear interpolation over strictly increasing knots. Evaluation is
/// clamped to the boundary values outside the knot range.
#[derive(Debug, Clone)]
pub struct Interp1d {
    xs: Array1,
    ys: Array1,
}

impl Interp1d {
    pub fn new(xs: Array1, ys: Array1) -> Result<Self, Error> {
        if xs.len() != ys.len() {
            return Err(anyhow!(
                "Interpolation knots and values differ in length ({} vs {})",
                xs.len(),
                ys.len()
            ));
        }
        if xs.len() < 2 {
            return Err(anyhow!("Need at least 2 knots to interpolate"));
        }
        if xs.iter().chain(ys.iter()).any(|v| !v.is_finite()) {
            return Err(anyhow!("Interpolation knots and values must be finite"));
        }
        if xs.windows(2).any(|w| w[1] <= w[0]) {
            return Err(anyhow!("Interpolation knots must be strictly increasing"));
        }
        Ok(Interp1d { xs, ys })
    }

    /// Value at `x`; constant beyond the first and last knot.
    pub fn eval(&self, x: f64) -> f64 {
        if x <= self.xs[0] {
            return self.ys[0];
        }
        let last = self.xs.len() - 1;
        if x >= self.xs[last] {
            return self.ys[last];
        }
        let i = match self
            .xs
            .binary_search_by(|v| v.partial_cmp(&x).unwrap())
        {
            Ok(i) => return self.ys[i],
            Err(i) => i - 1,
        };
        let t = (x - self.xs[i]) / (self.xs[i + 1] - self.xs[i]);
        self.ys[i] + t * (self.ys[i + 1] - self.ys[i])
    }
}

/// Protein dynamics given current mRNA levels and the translation and
/// decay rates:
///
/// `dp/dt = beta * m(t) * te(t) - delta * p`
///
/// where `m(t)` is the interpolated mRNA profile and `te(t)` an optional
/// translation-efficiency decline factor (1 when absent, as in the
/// constant-efficiency model variant).
#[derive(Debug, Clone)]
pub struct ProteinModel {
    pub beta: f64,
    pub delta: f64,
    pub mrna: Interp1d,
    pub te_decline: Option<Interp1d>,
}

impl ProteinModel {
    fn derivative(&self, t: f64, p: f64) -> f64 {
        let te = self.te_decline.as_ref().map_or(1.0, |f| f.eval(t));
        self.beta * self.mrna.eval(t) * te - self.delta * p
    }

    /// Integrates the model forward from `pzero` with classic fixed-step
    /// RK4, returning one protein value per grid point (the first grid
    /// point gets `pzero` itself). Uses step size `dt` except for the
    /// final step of each segment, which is shortened to land exactly on
    /// the grid point.
    pub fn simulate(&self, pzero: f64, grid: &[f64], dt: f64) -> Result<Array1, Error> {
        if !pzero.is_finite() {
            return Err(anyhow!("Initial protein value must be finite"));
        }
        if !dt.is_finite() || dt <= 0.0 {
            return Err(anyhow!("Step size must be finite and > 0, got {}", dt));
        }
        if grid.is_empty() {
            return Err(anyhow!("Time grid must be non-empty"));
        }
        if grid.iter().any(|t| !t.is_finite()) {
            return Err(anyhow!("Time grid must be finite"));
        }
        if grid.windows(2).any(|w| w[1] <= w[0]) {
            return Err(anyhow!("Time grid must be strictly increasing"));
        }

        let mut out = Vec::with_capacity(grid.len());
        out.push(pzero);

        let mut t = grid[0];
        let mut p = pzero;
        for &target in &grid[1..] {
            // hard guard against runaway loops for tiny dt
            let max_steps = ((target - t) / dt).ceil() as usize + 16;
            let mut steps = 0;
            while t < target {
                if steps >= max_steps {
                    return Err(anyhow!(
                        "Exceeded {} integration steps before reaching t={}",
                        max_steps,
                        target
                    ));
                }
                let h = (target - t).min(dt);
                let k1 = self.derivative(t, p);
                let k2 = self.derivative(t + 0.5 * h, p + 0.5 * h * k1);
                let k3 = self.derivative(t + 0.5 * h, p + 0.5 * h * k2);
                let k4 = self.derivative(t + h, p + h * k3);
                p += h / 6.0 * (k1 + 2.0 * k2 + 2.0 * k3 + k4);
                t += h;
                steps += 1;
            }
            t = target;
            out.push(p);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(value: f64) -> Interp1d {
        Interp1d::new(vec![0.0, T_FINAL], vec![value, value]).unwrap()
    }

    #[test]
    fn test_time_grid() {
        let grid = time_grid();
        let expected = [0.0, 19.2, 38.4, 57.6, 76.8, 96.0];
        assert_eq!(grid.len(), expected.len());
        for (actual, expected) in grid.iter().zip(expected.iter()) {
            assert_abs_diff_eq!(actual, expected, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_interp_eval() {
        let f = Interp1d::new(vec![0.0, 1.0, 2.0], vec![0.0, 10.0, 0.0]).unwrap();
        assert_abs_diff_eq!(f.eval(0.5), 5.0, epsilon = 1e-12);
        assert_abs_diff_eq!(f.eval(1.0), 10.0, epsilon = 1e-12);
        assert_abs_diff_eq!(f.eval(1.5), 5.0, epsilon = 1e-12);
        // clamped outside the knot range
        assert_abs_diff_eq!(f.eval(-1.0), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(f.eval(3.0), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_interp_rejects_bad_knots() {
        assert!(Interp1d::new(vec![0.0, 1.0], vec![1.0]).is_err());
        assert!(Interp1d::new(vec![0.0], vec![1.0]).is_err());
        assert!(Interp1d::new(vec![1.0, 1.0], vec![0.0, 0.0]).is_err());
        assert!(Interp1d::new(vec![1.0, 0.0], vec![0.0, 0.0]).is_err());
        assert!(Interp1d::new(vec![0.0, f64::NAN], vec![0.0, 0.0]).is_err());
    }

    #[test]
    fn test_simulate_constant_mrna_matches_analytic() {
        // With m(t) = m constant the model has the closed form
        // p(t) = beta m / delta + (p0 - beta m / delta) exp(-delta t)
        let model = ProteinModel {
            beta: 3.0,
            delta: 0.1,
            mrna: flat(2.0),
            te_decline: None,
        };
        let grid = time_grid();
        let values = model.simulate(5.0, &grid, 0.05).unwrap();
        for (&t, &p) in grid.iter().zip(values.iter()) {
            let expected = 60.0 + (5.0 - 60.0) * (-0.1 * t).exp();
            assert_abs_diff_eq!(p, expected, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_simulate_te_decline_scales_production() {
        // A constant efficiency factor of 0.5 halves the equilibrium level.
        let model = ProteinModel {
            beta: 3.0,
            delta: 0.1,
            mrna: flat(2.0),
            te_decline: Some(flat(0.5)),
        };
        let values = model.simulate(30.0, &time_grid(), 0.05).unwrap();
        for &p in &values {
            assert_abs_diff_eq!(p, 30.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_simulate_pure_decay() {
        let model = ProteinModel {
            beta: 0.0,
            delta: 0.05,
            mrna: flat(1.0),
            te_decline: None,
        };
        let grid = time_grid();
        let values = model.simulate(100.0, &grid, 0.05).unwrap();
        for (&t, &p) in grid.iter().zip(values.iter()) {
            assert_abs_diff_eq!(p, 100.0 * (-0.05 * t).exp(), epsilon = 1e-6);
        }
    }

    #[test]
    fn test_simulate_rejects_bad_input() {
        let model = ProteinModel {
            beta: 1.0,
            delta: 0.1,
            mrna: flat(1.0),
            te_decline: None,
        };
        assert!(model.simulate(f64::NAN, &[0.0, 1.0], 0.1).is_err());
        assert!(model.simulate(1.0, &[0.0, 1.0], 0.0).is_err());
        assert!(model.simulate(1.0, &[0.0, 1.0], -0.1).is_err());
        assert!(model.simulate(1.0, &[], 0.1).is_err());
        assert!(model.simulate(1.0, &[1.0, 0.5], 0.1).is_err());
    }
}
