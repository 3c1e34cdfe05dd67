//! Ritz pair extraction from the projected problem.

use crate::error::{DavidsonError, Result};
use crate::projection::ProjectedSpace;
use ritz_math::{Complex64, DMat, DVec, argsort, column_norms, diagonalize, generalized_eigen};

/// Absolute tolerance used to match conjugate harmonic Ritz values.
pub const PAIR_TOL: f64 = 1e-9;

/// Approximate eigenpairs recovered from the search space.
///
/// Column `j` of `q` is the Ritz vector `V u_j` for the value `lambda[j]`,
/// and column `j` of `res` its residual `A q_j − λ_j q_j`.
#[derive(Debug, Clone)]
pub struct RitzEigenPair {
    pub lambda: DVec,
    pub u: DMat,
    pub q: DMat,
    pub res: DMat,
}

impl RitzEigenPair {
    fn from_subspace(space: &ProjectedSpace, lambda: DVec, u: DMat) -> Self {
        let q = space.basis() * &u;
        let mut res = space.image() * &u;
        for (j, mut col) in res.column_iter_mut().enumerate() {
            col.axpy(-lambda[j], &q.column(j), 1.0);
        }
        Self { lambda, u, q, res }
    }

    pub fn len(&self) -> usize {
        self.lambda.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lambda.is_empty()
    }

    pub fn residual_norms(&self) -> DVec {
        column_norms(&self.res)
    }
}

/// Standard Ritz pairs of a symmetric operator, sorted ascending.
pub fn ritz(space: &ProjectedSpace) -> RitzEigenPair {
    let t = space.projected();
    let sym = (t + t.transpose()) * 0.5;
    let spectrum = diagonalize(&sym, None);
    RitzEigenPair::from_subspace(space, spectrum.values, spectrum.vectors)
}

/// Match every complex eigenvalue with its conjugate.
///
/// Returns `(first, second)` index pairs in order of first appearance.
/// Real eigenvalues are ignored; a complex value without a partner is an
/// error.
pub fn pair_complex_eigenvalues(values: &[Complex64]) -> Result<Vec<(usize, usize)>> {
    let mut open: Vec<(usize, Option<usize>)> = Vec::new();
    for (i, v) in values.iter().enumerate() {
        if v.im == 0.0 {
            continue;
        }
        let partner = open.iter_mut().find(|(k, p)| {
            p.is_none()
                && (values[*k].re - v.re).abs() < PAIR_TOL
                && (values[*k].im + v.im).abs() < PAIR_TOL
        });
        match partner {
            Some(entry) => entry.1 = Some(i),
            None => open.push((i, None)),
        }
    }

    open.into_iter()
        .map(|(k, p)| {
            p.map(|p| (k, p))
                .ok_or(DavidsonError::UnpairedComplexEigenvalue {
                    index: k,
                    value: values[k],
                })
        })
        .collect()
}

/// Harmonic Ritz pairs for the paired operator.
///
/// Solves `T u = θ (VᵀA·AV) u`, keeps one member of every conjugate pair,
/// and orders by `θ` descending so the lowest positive eigenvalues come
/// first. Each `λ_j` is the Rayleigh quotient `u_jᵀ T u_j`. Also returns
/// the number of conjugate pairs removed.
pub fn harmonic_ritz(space: &ProjectedSpace) -> Result<(RitzEigenPair, usize)> {
    let metric = space.harmonic_metric().ok_or_else(|| {
        DavidsonError::IllConditioned("harmonic extraction without cached A·AV".to_string())
    })?;
    let t = space.projected();
    let m = t.nrows();
    let ges = generalized_eigen(t, &metric).ok_or_else(|| {
        DavidsonError::IllConditioned(format!(
            "generalized eigenproblem of dimension {m} has a singular metric or did not converge"
        ))
    })?;

    let pairs = pair_complex_eigenvalues(&ges.values)?;
    let mut dropped = vec![false; ges.len()];
    for &(_, second) in &pairs {
        dropped[second] = true;
    }

    let mut theta = Vec::with_capacity(ges.len());
    let mut vectors = Vec::with_capacity(ges.len());
    for (k, value) in ges.values.iter().enumerate() {
        if dropped[k] {
            continue;
        }
        let u = DVec::from_iterator(m, ges.vectors.column(k).iter().map(|z| z.re));
        let norm = u.norm();
        if norm <= 0.0 || !norm.is_finite() {
            continue;
        }
        theta.push(value.re);
        vectors.push(u / norm);
    }

    let mut order = argsort(&theta);
    order.reverse();
    let mut u = DMat::zeros(m, order.len());
    for (j, &k) in order.iter().enumerate() {
        u.set_column(j, &vectors[k]);
    }

    let tu = t * &u;
    let lambda = DVec::from_iterator(
        u.ncols(),
        u.column_iter().zip(tu.column_iter()).map(|(a, b)| a.dot(&b)),
    );

    Ok((RitzEigenPair::from_subspace(space, lambda, u), pairs.len()))
}
