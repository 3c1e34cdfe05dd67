//! Correction vectors.
//!
//! Each unconverged tracked root contributes one new search direction built
//! from its residual `r = A q − λ q`, using the operator diagonal `D` as a
//! cheap approximation of `A`.

use crate::config::CorrectionScheme;
use ritz_math::DVec;

/// Smallest magnitude allowed for `λ − D_i` before dividing.
pub const DPR_CUTOFF: f64 = 1e-8;

/// Builds a search direction for one Ritz pair.
pub trait CorrectionVector {
    fn correction(&self, residual: &DVec, ritz_vector: &DVec, lambda: f64, diagonal: &DVec) -> DVec;
}

/// Diagonal-preconditioned residual, `t_i = r_i / (λ − D_i)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DprCorrection;

/// Olsen correction, `t = M⁻¹r − ε M⁻¹q` with `ε = qᵀM⁻¹r / qᵀM⁻¹q`,
/// which keeps `t` orthogonal to the Ritz vector `q`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OlsenCorrection;

/// Apply the diagonal preconditioner `(λ − D)⁻¹` to `x`.
///
/// Denominators smaller than [`DPR_CUTOFF`] in magnitude are replaced by
/// `±DPR_CUTOFF`, keeping their sign.
pub fn precondition(x: &DVec, lambda: f64, diagonal: &DVec) -> DVec {
    DVec::from_iterator(
        x.len(),
        x.iter()
            .zip(diagonal.iter())
            .map(|(&xi, &di)| xi / clamp_denominator(lambda - di)),
    )
}

fn clamp_denominator(d: f64) -> f64 {
    if d.abs() >= DPR_CUTOFF {
        d
    } else if d < 0.0 {
        -DPR_CUTOFF
    } else {
        DPR_CUTOFF
    }
}

impl CorrectionVector for DprCorrection {
    fn correction(&self, residual: &DVec, _ritz_vector: &DVec, lambda: f64, diagonal: &DVec) -> DVec {
        precondition(residual, lambda, diagonal)
    }
}

impl CorrectionVector for OlsenCorrection {
    fn correction(&self, residual: &DVec, ritz_vector: &DVec, lambda: f64, diagonal: &DVec) -> DVec {
        let mr = precondition(residual, lambda, diagonal);
        let mq = precondition(ritz_vector, lambda, diagonal);
        let denom = ritz_vector.dot(&mq);
        if denom.abs() < f64::EPSILON || !denom.is_finite() {
            return mr;
        }
        let eps = ritz_vector.dot(&mr) / denom;
        mr - mq * eps
    }
}

impl CorrectionScheme {
    pub fn strategy(self) -> Box<dyn CorrectionVector> {
        match self {
            Self::Dpr => Box::new(DprCorrection),
            Self::Olsen => Box::new(OlsenCorrection),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_dpr_values() {
        let r = DVec::from_vec(vec![1.0, -2.0, 3.0]);
        let d = DVec::from_vec(vec![1.0, 2.0, 4.0]);
        let t = DprCorrection.correction(&r, &DVec::zeros(3), 0.0, &d);
        assert_relative_eq!(t[0], -1.0);
        assert_relative_eq!(t[1], 1.0);
        assert_relative_eq!(t[2], -0.75);
    }

    #[test]
    fn test_dpr_cutoff_keeps_sign() {
        let r = DVec::from_vec(vec![1.0, 1.0, 1.0]);
        let d = DVec::from_vec(vec![2.0, 2.0 + 1e-12, 2.0 - 1e-12]);
        let t = precondition(&r, 2.0, &d);
        assert!(t.iter().all(|x| x.is_finite()));
        assert_relative_eq!(t[0], 1.0 / DPR_CUTOFF);
        assert_relative_eq!(t[1], -1.0 / DPR_CUTOFF);
        assert_relative_eq!(t[2], 1.0 / DPR_CUTOFF);
    }

    #[test]
    fn test_olsen_orthogonal_to_ritz_vector() {
        let q = DVec::from_vec(vec![0.8, 0.6, 0.0, 0.0]);
        let r = DVec::from_vec(vec![0.03, -0.04, 0.2, -0.1]);
        let d = DVec::from_vec(vec![1.0, 1.5, 3.0, 4.0]);
        let t = OlsenCorrection.correction(&r, &q, 1.1, &d);
        assert!(t.dot(&q).abs() < 1e-12);
        assert!(t.norm() > 0.0);
    }

    #[test]
    fn test_olsen_falls_back_to_dpr() {
        // q has no weight where the preconditioner is defined, so qᵀM⁻¹q = 0.
        let q = DVec::zeros(3);
        let r = DVec::from_vec(vec![1.0, 2.0, 3.0]);
        let d = DVec::from_vec(vec![2.0, 3.0, 4.0]);
        let olsen = OlsenCorrection.correction(&r, &q, 1.0, &d);
        let dpr = DprCorrection.correction(&r, &q, 1.0, &d);
        assert_relative_eq!(olsen, dpr);
    }

    #[test]
    fn test_strategy_dispatch() {
        let q = DVec::from_vec(vec![1.0, 0.0]);
        let r = DVec::from_vec(vec![0.0, 1.0]);
        let d = DVec::from_vec(vec![1.0, 3.0]);
        let a = CorrectionScheme::Dpr.strategy().correction(&r, &q, 1.0, &d);
        let b = CorrectionScheme::Olsen.strategy().correction(&r, &q, 1.0, &d);
        assert_relative_eq!(a[1], -0.5);
        assert!(b.dot(&q).abs() < 1e-12);
    }
}
