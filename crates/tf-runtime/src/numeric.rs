//! Numerical collaborators the host runtime provides.
//!
//! Only the calling contract lives here; implementations are supplied by the
//! embedding host.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{BoundaryError, ErrorKind};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum NumericError {
    #[error("root finder did not converge after {iterations} iterations")]
    NoConvergence { iterations: usize },
    #[error("roots not bracketed: f({lo}) and f({hi}) have the same sign")]
    RootsNotBracketed { lo: f64, hi: f64 },
    #[error("invalid bounds: lower {lower} exceeds upper {upper}")]
    InvalidBounds { lower: f64, upper: f64 },
}

impl BoundaryError for NumericError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::NoConvergence { .. } => ErrorKind::NoConvergence,
            Self::RootsNotBracketed { .. } => ErrorKind::RootsNotBracketed,
            Self::InvalidBounds { .. } => ErrorKind::InvalidRange,
        }
    }
}

pub trait RootFinder {
    /// Find `x` in `[lo, hi]` with `|f(x)| <= tol`.
    fn find_root(
        &self,
        f: &mut dyn FnMut(f64) -> f64,
        lo: f64,
        hi: f64,
        tol: f64,
        max_iter: usize,
    ) -> Result<f64, NumericError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimumStatus {
    Converged,
    IterationLimit,
    Abnormal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Optimum {
    pub x: Vec<f64>,
    pub value: f64,
    pub gradient: Vec<f64>,
    pub status: OptimumStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bound {
    pub lower: f64,
    pub upper: f64,
}

impl Bound {
    pub fn new(lower: f64, upper: f64) -> Result<Self, NumericError> {
        if lower > upper {
            return Err(NumericError::InvalidBounds { lower, upper });
        }
        Ok(Self { lower, upper })
    }

    #[must_use]
    pub fn unbounded() -> Self {
        Self {
            lower: f64::NEG_INFINITY,
            upper: f64::INFINITY,
        }
    }

    #[must_use]
    pub fn contains(&self, x: f64) -> bool {
        x >= self.lower && x <= self.upper
    }
}

pub trait BoundedMinimizer {
    /// `objective` returns the value at `x` and writes the gradient into its
    /// second argument.
    fn minimize(
        &self,
        objective: &mut dyn FnMut(&[f64], &mut [f64]) -> f64,
        bounds: &[Bound],
        start: &[f64],
    ) -> Result<Optimum, NumericError>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Complex64 {
    pub re: f64,
    pub im: f64,
}

impl Complex64 {
    #[must_use]
    pub const fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }

    #[must_use]
    pub fn norm(&self) -> f64 {
        self.re.hypot(self.im)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Forward,
    Inverse,
}

pub trait FourierTransform {
    fn transform(&self, input: &[Complex64], direction: Direction) -> Vec<Complex64>;
}
