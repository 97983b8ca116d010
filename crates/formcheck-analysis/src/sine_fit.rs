//! Sinusoid fitting for repetition detection.
//!
//! A repeated movement traces a roughly sinusoidal joint-angle curve over
//! time. Fitting `A*sin(w*t + p) + c` to the densified angle samples gives
//! the trough level (`offset - |amplitude|`) that the key-frame extractor
//! uses to pick per-repetition minima.
//!
//! The fit is seeded from the dominant non-zero frequency bin of the
//! discrete Fourier transform of the samples, then refined with a small
//! Levenberg-Marquardt loop over the four parameters. Samples are assumed
//! evenly spaced at unit intervals (the extractor densifies before calling).

use ndarray::Array1;
use rustfft::{num_complex::Complex, FftPlanner};
use tracing::debug;

use crate::error::{AnalysisError, AnalysisResult};

/// Fitted sinusoid parameters for one angle series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SineFit {
    /// Amplitude `A` (sign as fitted; use `trough_level` for the minimum).
    pub amplitude: f64,
    /// Angular frequency `w` in radians per sample.
    pub omega: f64,
    /// Phase `p` in radians.
    pub phase: f64,
    /// Vertical offset `c`.
    pub offset: f64,
    /// Derived frequency in cycles per sample, `w / 2pi`.
    pub frequency: f64,
    /// Derived period in samples, `1 / frequency`.
    pub period: f64,
    /// Largest element of the parameter covariance estimate. Large values
    /// mean the samples did not constrain the fit well.
    pub max_covariance: f64,
}

impl SineFit {
    /// Evaluate the fitted sinusoid at sample position `t`.
    pub fn eval(&self, t: f64) -> f64 {
        self.amplitude * (self.omega * t + self.phase).sin() + self.offset
    }

    /// The fitted curve's minimum level, `offset - |amplitude|`.
    pub fn trough_level(&self) -> f64 {
        self.offset - self.amplitude.abs()
    }
}

/// Minimum number of samples needed to constrain the four parameters.
const MIN_SAMPLES: usize = 4;

/// Maximum Levenberg-Marquardt iterations before giving up on improvement.
const MAX_ITERATIONS: usize = 200;

/// Fit `A*sin(w*t + p) + c` to evenly spaced samples.
///
/// Errors when the series is too short or the regression cannot take a
/// single valid step; callers recover by falling back to the global minimum.
pub fn fit_sine(values: &[f64]) -> AnalysisResult<SineFit> {
    let n = values.len();
    if n < MIN_SAMPLES {
        return Err(AnalysisError::fit_failed(format!(
            "{n} samples, need at least {MIN_SAMPLES}"
        )));
    }

    let samples = Array1::from_vec(values.to_vec());
    let mean = samples.mean().unwrap_or(0.0);
    let std = samples.std(0.0);

    let guess_freq = dominant_frequency(values);
    let mut params = [
        std * std::f64::consts::SQRT_2,              // amplitude
        2.0 * std::f64::consts::PI * guess_freq,     // omega
        0.0,                                         // phase
        mean,                                        // offset
    ];

    debug!(
        samples = n,
        guess_freq,
        guess_amp = params[0],
        guess_offset = params[3],
        "seeding sine fit"
    );

    let mut cost = sum_squared_residuals(&params, values);
    let mut lambda = 1e-3;
    let mut converged = false;

    for _ in 0..MAX_ITERATIONS {
        let (jtj, jtr) = normal_equations(&params, values);

        let mut stepped = false;
        while lambda < 1e12 {
            let mut damped = jtj;
            for (i, row) in damped.iter_mut().enumerate() {
                row[i] += lambda * jtj[i][i].max(1e-12);
            }
            let Some(delta) = solve4(damped, [-jtr[0], -jtr[1], -jtr[2], -jtr[3]]) else {
                return Err(AnalysisError::fit_failed("singular normal equations"));
            };

            let trial = [
                params[0] + delta[0],
                params[1] + delta[1],
                params[2] + delta[2],
                params[3] + delta[3],
            ];
            let trial_cost = sum_squared_residuals(&trial, values);
            if trial_cost < cost {
                let improvement = cost - trial_cost;
                params = trial;
                cost = trial_cost;
                lambda = (lambda * 0.5).max(1e-12);
                stepped = true;
                if improvement <= 1e-12 * (cost + 1e-12) {
                    converged = true;
                }
                break;
            }
            lambda *= 10.0;
        }

        if !stepped || converged {
            break;
        }
    }

    let (jtj, _) = normal_equations(&params, values);
    let max_covariance = covariance_bound(jtj, cost, n);

    let frequency = params[1] / (2.0 * std::f64::consts::PI);
    let fit = SineFit {
        amplitude: params[0],
        omega: params[1],
        phase: params[2],
        offset: params[3],
        frequency,
        period: 1.0 / frequency,
        max_covariance,
    };
    debug!(
        amplitude = fit.amplitude,
        offset = fit.offset,
        period = fit.period,
        max_covariance = fit.max_covariance,
        residual = cost,
        "sine fit refined"
    );
    Ok(fit)
}

/// Dominant non-zero frequency (cycles per sample) of the sample sequence.
///
/// Bin 0 is excluded: it carries the vertical offset, not the repetition
/// rate. With unit sample spacing, bin `k` of an `n`-point transform maps to
/// `k/n` cycles per sample (mirrored for the negative-frequency half).
fn dominant_frequency(values: &[f64]) -> f64 {
    let n = values.len();
    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(n);

    let mut buffer: Vec<Complex<f64>> = values.iter().map(|&v| Complex::new(v, 0.0)).collect();
    fft.process(&mut buffer);

    let peak_bin = buffer
        .iter()
        .enumerate()
        .skip(1)
        .max_by(|(_, a), (_, b)| a.norm().total_cmp(&b.norm()))
        .map(|(k, _)| k)
        .unwrap_or(1);

    let folded = if peak_bin <= n / 2 { peak_bin } else { n - peak_bin };
    folded as f64 / n as f64
}

fn residual(params: &[f64; 4], t: f64, y: f64) -> f64 {
    let [a, w, p, c] = *params;
    a * (w * t + p).sin() + c - y
}

fn sum_squared_residuals(params: &[f64; 4], values: &[f64]) -> f64 {
    values
        .iter()
        .enumerate()
        .map(|(t, &y)| {
            let r = residual(params, t as f64, y);
            r * r
        })
        .sum()
}

/// Accumulate `J^T J` and `J^T r` for the current parameters.
fn normal_equations(params: &[f64; 4], values: &[f64]) -> ([[f64; 4]; 4], [f64; 4]) {
    let [a, w, p, _] = *params;
    let mut jtj = [[0.0; 4]; 4];
    let mut jtr = [0.0; 4];

    for (t, &y) in values.iter().enumerate() {
        let t = t as f64;
        let arg = w * t + p;
        let (sin, cos) = arg.sin_cos();
        // Partial derivatives of the residual w.r.t. (A, w, p, c).
        let jac = [sin, a * t * cos, a * cos, 1.0];
        let r = a * sin + params[3] - y;

        for i in 0..4 {
            jtr[i] += jac[i] * r;
            for j in 0..4 {
                jtj[i][j] += jac[i] * jac[j];
            }
        }
    }
    (jtj, jtr)
}

/// Largest element of `(J^T J)^-1 * s^2`, the covariance estimate.
fn covariance_bound(jtj: [[f64; 4]; 4], cost: f64, n: usize) -> f64 {
    if n <= 4 {
        return f64::INFINITY;
    }
    let s2 = cost / (n - 4) as f64;

    let mut max_cov = 0.0f64;
    for col in 0..4 {
        let mut unit = [0.0; 4];
        unit[col] = 1.0;
        match solve4(jtj, unit) {
            Some(column) => {
                for v in column {
                    max_cov = max_cov.max((v * s2).abs());
                }
            }
            None => return f64::INFINITY,
        }
    }
    max_cov
}

/// Solve a 4x4 linear system by Gaussian elimination with partial pivoting.
fn solve4(mut a: [[f64; 4]; 4], mut b: [f64; 4]) -> Option<[f64; 4]> {
    for col in 0..4 {
        let pivot = (col..4).max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))?;
        if a[pivot][col].abs() < 1e-300 {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in (col + 1)..4 {
            let factor = a[row][col] / a[col][col];
            for k in col..4 {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = [0.0; 4];
    for row in (0..4).rev() {
        let mut sum = b[row];
        for k in (row + 1)..4 {
            sum -= a[row][k] * x[k];
        }
        x[row] = sum / a[row][row];
    }
    Some(x)
}
