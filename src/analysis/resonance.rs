//! Resonance characterisation: Fano lineshape fit and quality factor.

use log::debug;
use nalgebra::{SMatrix, SVector};
use serde::{Deserialize, Serialize};

use crate::error::{CrossingSide, FitError, SolverDiagnostic};

/// Rise above the notch floor, in dB, that defines the linewidth edges.
///
/// Existing measurement records were produced with +6 dB, not the textbook
/// 3 dB half-power point, so this value must stay as is for comparability.
pub const QUALITY_THRESHOLD_DB: f64 = 6.0;

/// Initial asymmetry parameter of the Fano fit.
pub const INITIAL_Q: f64 = 1.0;

/// Initial linewidth of the Fano fit, in frequency-axis units.
pub const INITIAL_GAMMA: f64 = 0.01;

const N_PARAMS: usize = 5;

/// Trial-step budget, `200 * (N_PARAMS + 1)`.
pub const MAX_EVALUATIONS: usize = 200 * (N_PARAMS + 1);

const FTOL: f64 = 1.49012e-8;
const XTOL: f64 = 1.49012e-8;
const GTOL: f64 = 1e-12;
const LAMBDA_INIT: f64 = 1e-3;
const LAMBDA_MIN: f64 = 1e-15;
const LAMBDA_MAX: f64 = 1e16;
const GAUSS_NEWTON_LAMBDA: f64 = 1e-2;

type Vec5 = SVector<f64, N_PARAMS>;
type Mat5 = SMatrix<f64, N_PARAMS, N_PARAMS>;

// ---------------------------------------------------------------------------
// Fano model
// ---------------------------------------------------------------------------

/// Parameters of `y(f) = a * (q + ε)² / (1 + ε²) + b`, `ε = (f - f0) / gamma`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FanoParameters {
    pub f0: f64,
    pub q: f64,
    pub gamma: f64,
    pub a: f64,
    pub b: f64,
}

impl FanoParameters {
    pub fn evaluate(&self, f: f64) -> f64 {
        let eps = (f - self.f0) / self.gamma;
        self.a * (self.q + eps).powi(2) / (1.0 + eps * eps) + self.b
    }

    /// Model value and its partial derivatives `[∂f0, ∂q, ∂gamma, ∂a, ∂b]`.
    fn evaluate_with_gradient(&self, f: f64) -> (f64, [f64; N_PARAMS]) {
        let eps = (f - self.f0) / self.gamma;
        let denom = 1.0 + eps * eps;
        let qe = self.q + eps;
        let shape = qe * qe / denom;
        // d(shape)/d(eps)
        let d_eps = 2.0 * qe * (1.0 - self.q * eps) / (denom * denom);

        let value = self.a * shape + self.b;
        let grad = [
            -self.a * d_eps / self.gamma,
            self.a * 2.0 * qe / denom,
            -self.a * d_eps * eps / self.gamma,
            shape,
            1.0,
        ];
        (value, grad)
    }

    fn to_vector(self) -> Vec5 {
        Vec5::new(self.f0, self.q, self.gamma, self.a, self.b)
    }

    fn from_vector(v: &Vec5) -> Self {
        FanoParameters {
            f0: v[0],
            q: v[1],
            gamma: v[2],
            a: v[3],
            b: v[4],
        }
    }

    /// Starting point derived from the data: notch position, unit
    /// asymmetry, a narrow linewidth, and the trace's range and floor.
    pub fn initial_guess(frequencies: &[f64], powers: &[f64]) -> Option<Self> {
        let (i_min, &p_min) = powers
            .iter()
            .enumerate()
            .fold(None, |best: Option<(usize, &f64)>, (i, p)| match best {
                Some((_, b)) if !(p < b) => best,
                _ => Some((i, p)),
            })?;
        let p_max = powers.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        Some(FanoParameters {
            f0: frequencies[i_min],
            q: INITIAL_Q,
            gamma: INITIAL_GAMMA,
            a: p_max - p_min,
            b: p_min,
        })
    }
}

/// Fitted Fano parameters with their covariance estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FanoFitResult {
    pub params: FanoParameters,
    /// Row/column order: f0, q, gamma, a, b.
    pub covariance: [[f64; N_PARAMS]; N_PARAMS],
    /// Trial steps taken by the solver.
    pub evaluations: usize,
    /// Sum of squared residuals at the solution.
    pub residual_sum_squares: f64,
}

impl FanoFitResult {
    /// One-sigma uncertainty of each parameter (square root of the diagonal).
    pub fn std_errors(&self) -> [f64; N_PARAMS] {
        let mut out = [0.0; N_PARAMS];
        for (i, v) in out.iter_mut().enumerate() {
            *v = self.covariance[i][i].sqrt();
        }
        out
    }

    /// Fitted model at each frequency.
    pub fn curve(&self, frequencies: &[f64]) -> Vec<f64> {
        frequencies.iter().map(|&f| self.params.evaluate(f)).collect()
    }
}

// ---------------------------------------------------------------------------
// Levenberg-Marquardt
// ---------------------------------------------------------------------------

fn cost(params: &FanoParameters, x: &[f64], y: &[f64]) -> f64 {
    0.5 * x
        .iter()
        .zip(y)
        .map(|(&f, &p)| (params.evaluate(f) - p).powi(2))
        .sum::<f64>()
}

/// Normal matrix `JᵀJ` and gradient `Jᵀr` at `params`.
fn normal_equations(params: &FanoParameters, x: &[f64], y: &[f64]) -> (Mat5, Vec5) {
    let mut jtj = Mat5::zeros();
    let mut jtr = Vec5::zeros();
    for (&f, &p) in x.iter().zip(y) {
        let (value, grad) = params.evaluate_with_gradient(f);
        let row = Vec5::from(grad);
        let r = value - p;
        jtj += row * row.transpose();
        jtr += row * r;
    }
    (jtj, jtr)
}

/// Fit a Fano lineshape to linear `powers` by nonlinear least squares.
///
/// Seeded with [`FanoParameters::initial_guess`]. Fails with
/// [`FitError::DidNotConverge`] when the step budget runs out or no
/// downhill step exists, and with [`FitError::SingularCovariance`] when
/// the solution does not determine all five parameters.
pub fn fit_fano(frequencies: &[f64], powers: &[f64]) -> Result<FanoFitResult, FitError> {
    FitError::check_shape(frequencies.len(), powers.len())?;
    let m = frequencies.len();
    if m <= N_PARAMS {
        return Err(FitError::InsufficientData {
            points: m,
            required: N_PARAMS + 1,
        });
    }
    let start = FanoParameters::initial_guess(frequencies, powers).ok_or(FitError::InsufficientData {
        points: 0,
        required: N_PARAMS + 1,
    })?;
    debug!("fano fit over {m} points, initial {start:?}");

    let (params, evaluations) = levenberg_marquardt(start, frequencies, powers)?;

    let (jtj, _) = normal_equations(&params, frequencies, powers);
    let ssr = 2.0 * cost(&params, frequencies, powers);
    let inv = jtj
        .cholesky()
        .map(|c| c.inverse())
        .ok_or(FitError::SingularCovariance)?;
    let scaled = (inv + inv.transpose()) * (0.5 * ssr / (m - N_PARAMS) as f64);
    if scaled.iter().any(|v| !v.is_finite()) {
        return Err(FitError::SingularCovariance);
    }

    let mut covariance = [[0.0; N_PARAMS]; N_PARAMS];
    for (i, row) in covariance.iter_mut().enumerate() {
        for (j, v) in row.iter_mut().enumerate() {
            *v = scaled[(i, j)];
        }
    }

    debug!("fano fit converged after {evaluations} evaluations: {params:?}");
    Ok(FanoFitResult {
        params,
        covariance,
        evaluations,
        residual_sum_squares: ssr,
    })
}

fn levenberg_marquardt(
    start: FanoParameters,
    x: &[f64],
    y: &[f64],
) -> Result<(FanoParameters, usize), FitError> {
    let mut p = start.to_vector();
    let mut current = cost(&start, x, y);
    let mut lambda = LAMBDA_INIT;
    let mut evaluations = 1;

    let fail = |evaluations: usize, cost: f64, lambda: f64, reason: &'static str| {
        FitError::DidNotConverge(SolverDiagnostic {
            iterations: evaluations,
            cost,
            lambda,
            reason,
        })
    };

    if !current.is_finite() {
        return Err(fail(evaluations, current, lambda, "non-finite residual at initial guess"));
    }

    let (mut jtj, mut jtr) = normal_equations(&FanoParameters::from_vector(&p), x, y);
    loop {
        if jtr.amax() <= GTOL {
            break;
        }
        if evaluations >= MAX_EVALUATIONS {
            return Err(fail(evaluations, current, lambda, "evaluation budget exhausted"));
        }

        let mut damped = jtj;
        for i in 0..N_PARAMS {
            damped[(i, i)] += lambda * jtj[(i, i)].max(f64::EPSILON);
        }
        let Some(delta) = damped.cholesky().map(|c| c.solve(&(-jtr))) else {
            lambda *= 10.0;
            if lambda > LAMBDA_MAX {
                return Err(fail(evaluations, current, lambda, "damped normal matrix not positive definite"));
            }
            continue;
        };

        let trial = p + delta;
        let trial_cost = cost(&FanoParameters::from_vector(&trial), x, y);
        evaluations += 1;
        let small_step = delta.norm() <= XTOL * (p.norm() + XTOL);

        if trial_cost.is_finite() && trial_cost < current {
            let reduction = current - trial_cost;
            let previous = current;
            // Heavily damped steps are short by construction; only judge
            // convergence on steps close to Gauss-Newton.
            let undamped = lambda <= GAUSS_NEWTON_LAMBDA;
            p = trial;
            current = trial_cost;
            lambda = (lambda * 0.1).max(LAMBDA_MIN);
            if undamped && (reduction <= FTOL * previous || small_step) {
                break;
            }
            (jtj, jtr) = normal_equations(&FanoParameters::from_vector(&p), x, y);
        } else {
            if small_step {
                break;
            }
            lambda *= 10.0;
            if lambda > LAMBDA_MAX {
                return Err(fail(evaluations, current, lambda, "no downhill step found"));
            }
        }
    }

    Ok((FanoParameters::from_vector(&p), evaluations))
}

// ---------------------------------------------------------------------------
// Quality factor
// ---------------------------------------------------------------------------

/// Notch frequency divided by the linewidth measured
/// [`QUALITY_THRESHOLD_DB`] above the notch floor.
///
/// `powers_linear` is converted with `20 * log10`. The left edge is the
/// last sample before the notch at or above the threshold, the right edge
/// the first such sample from the notch onward. The frequency axis is
/// assumed monotonic and is not checked. Every power must be positive and
/// finite, otherwise the floor has no level in dB and
/// [`FitError::NonFiniteLevel`] names the first offending sample.
pub fn quality_factor(frequencies: &[f64], powers_linear: &[f64]) -> Result<f64, FitError> {
    FitError::check_shape(frequencies.len(), powers_linear.len())?;
    if powers_linear.is_empty() {
        return Err(FitError::InsufficientData {
            points: 0,
            required: 1,
        });
    }

    let db: Vec<f64> = powers_linear.iter().map(|p| 20.0 * p.log10()).collect();
    if let Some(index) = db.iter().position(|v| !v.is_finite()) {
        return Err(FitError::NonFiniteLevel {
            index,
            value: powers_linear[index],
        });
    }

    let mut notch_index = 0;
    for (i, &v) in db.iter().enumerate() {
        if v < db[notch_index] {
            notch_index = i;
        }
    }
    let notch_frequency = frequencies[notch_index];
    let threshold_db = db[notch_index] + QUALITY_THRESHOLD_DB;

    let left = db[..notch_index]
        .iter()
        .rposition(|&v| v >= threshold_db)
        .ok_or(FitError::NoHalfPowerCrossing {
            side: CrossingSide::Left,
            notch_index,
            threshold_db,
            search_start: 0,
            search_end: notch_index,
        })?;
    let right = db[notch_index..]
        .iter()
        .position(|&v| v >= threshold_db)
        .map(|i| i + notch_index)
        .ok_or(FitError::NoHalfPowerCrossing {
            side: CrossingSide::Right,
            notch_index,
            threshold_db,
            search_start: notch_index,
            search_end: db.len(),
        })?;

    let fwhm = frequencies[right] - frequencies[left];
    let q = notch_frequency / fwhm;
    debug!("notch at {notch_frequency} (index {notch_index}), width {fwhm}, Q = {q:.1}");
    Ok(q)
}
