//! Quadratic regression predictor.

use serde::{Deserialize, Serialize};

use super::{solve_intercept, Predictor, Sample};
use crate::math::Vec2;

/// Samples used for the fit, newest last.
const MAX_SAMPLES: usize = 10;

/// Normal-equation determinant below which the quadratic fit is abandoned.
const SINGULAR_EPSILON: f64 = 1e-10;

/// Polynomial `c0 + c1·t + c2·t²`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct Poly {
    c0: f64,
    c1: f64,
    c2: f64,
}

impl Poly {
    fn eval(self, t: f64) -> f64 {
        self.c0 + t * (self.c1 + t * self.c2)
    }
}

/// Fits independent quadratics to x(t) and y(t).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuadraticPredictor {
    fit: Option<(Poly, Poly)>,
}

impl QuadraticPredictor {
    /// Fit the newest samples (up to ten), oldest to newest.
    ///
    /// Time is shifted so the newest sample sits at `t = 0`. A singular
    /// system degrades to a straight-line fit, and that in turn to the mean
    /// position.
    #[must_use]
    pub fn new(samples: &[Sample]) -> Self {
        if samples.len() < 3 {
            return Self { fit: None };
        }
        let recent = &samples[samples.len().saturating_sub(MAX_SAMPLES)..];
        let newest = recent[recent.len() - 1].time as f64;
        let times: Vec<f64> = recent.iter().map(|s| s.time as f64 - newest).collect();
        let xs: Vec<f64> = recent.iter().map(|s| s.position.x).collect();
        let ys: Vec<f64> = recent.iter().map(|s| s.position.y).collect();

        Self {
            fit: Some((fit_quadratic(&times, &xs), fit_quadratic(&times, &ys))),
        }
    }

    /// True when a fit exists.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.fit.is_some()
    }
}

impl Predictor for QuadraticPredictor {
    fn predict(&self, ticks_ahead: f64) -> Option<Vec2> {
        self.fit
            .map(|(px, py)| Vec2::new(px.eval(ticks_ahead), py.eval(ticks_ahead)))
    }

    fn intercept(&self, projectile_speed: f64, origin: Vec2) -> Option<Vec2> {
        let now = self.predict(0.0)?;
        let next = self.predict(1.0)?;
        Some(solve_intercept(now, next - now, origin, projectile_speed))
    }
}

/// Least-squares quadratic through `(t, v)` by Cramer's rule on the 3×3
/// normal equations.
fn fit_quadratic(t: &[f64], v: &[f64]) -> Poly {
    let n = t.len() as f64;
    let (mut s1, mut s2, mut s3, mut s4) = (0.0, 0.0, 0.0, 0.0);
    let (mut sv, mut stv, mut st2v) = (0.0, 0.0, 0.0);
    for (&ti, &vi) in t.iter().zip(v) {
        let t2 = ti * ti;
        s1 += ti;
        s2 += t2;
        s3 += t2 * ti;
        s4 += t2 * t2;
        sv += vi;
        stv += ti * vi;
        st2v += t2 * vi;
    }

    let det = n * (s2 * s4 - s3 * s3) - s1 * (s1 * s4 - s2 * s3) + s2 * (s1 * s3 - s2 * s2);
    if det.abs() < SINGULAR_EPSILON {
        return fit_line(n, s1, s2, sv, stv);
    }

    let c0 = (sv * (s2 * s4 - s3 * s3) - s1 * (stv * s4 - st2v * s3)
        + s2 * (stv * s3 - st2v * s2))
        / det;
    let c1 = (n * (stv * s4 - st2v * s3) - sv * (s1 * s4 - s2 * s3)
        + s2 * (s1 * st2v - s2 * stv))
        / det;
    let c2 = (n * (s2 * st2v - s3 * stv) - s1 * (s1 * st2v - s2 * stv)
        + sv * (s1 * s3 - s2 * s2))
        / det;
    Poly { c0, c1, c2 }
}

fn fit_line(n: f64, s1: f64, s2: f64, sv: f64, stv: f64) -> Poly {
    let denom = n * s2 - s1 * s1;
    if denom.abs() < SINGULAR_EPSILON {
        return Poly {
            c0: sv / n,
            c1: 0.0,
            c2: 0.0,
        };
    }
    let slope = (n * stv - s1 * sv) / denom;
    Poly {
        c0: (sv - slope * s1) / n,
        c1: slope,
        c2: 0.0,
    }
}
