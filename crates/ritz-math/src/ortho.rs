//! Orthogonalization of column blocks.
//!
//! Both schemes treat the leading columns of the block as the frozen,
//! already-orthonormal search space and only change what comes after them,
//! so cached operator products for the leading columns stay valid.

use crate::{DMat, DVec};

/// Relative norm below which a column is considered linearly dependent on
/// its predecessors and dropped.
pub const DEPENDENCE_TOL: f64 = 1e-10;

/// Modified Gram-Schmidt, two passes per column.
///
/// Columns `0..start` are copied unchanged and assumed orthonormal. Every
/// later column is projected against all columns kept before it, twice, and
/// normalized. A column that loses more than `1 - DEPENDENCE_TOL` of its norm
/// to the projection is dropped, so the result can have fewer columns than
/// `v`.
pub fn gram_schmidt(v: &DMat, start: usize) -> DMat {
    let start = start.min(v.ncols());
    let mut basis: Vec<DVec> = (0..start).map(|j| v.column(j).into_owned()).collect();

    for j in start..v.ncols() {
        let mut w = v.column(j).into_owned();
        let norm = w.norm();
        if norm <= 0.0 || !norm.is_finite() {
            continue;
        }
        w /= norm;

        let mut independent = true;
        for _pass in 0..2 {
            for b in &basis {
                let overlap = b.dot(&w);
                w.axpy(-overlap, b, 1.0);
            }
            let norm = w.norm();
            if norm < DEPENDENCE_TOL {
                independent = false;
                break;
            }
            w /= norm;
        }

        if independent {
            basis.push(w);
        }
    }

    if basis.is_empty() {
        return DMat::zeros(v.nrows(), 0);
    }
    DMat::from_columns(&basis)
}

/// Orthonormalize `v` through a thin Householder QR.
///
/// The signs of Q are fixed so that R has a non-negative diagonal; for an
/// already-orthonormal leading block this reproduces those columns exactly
/// (up to rounding). Columns whose R diagonal is negligible compared to the
/// largest one are dropped.
pub fn qr_orthonormalize(v: &DMat) -> DMat {
    let k = v.nrows().min(v.ncols());
    if k == 0 {
        return DMat::zeros(v.nrows(), 0);
    }

    let qr = v.clone().qr();
    let q = qr.q();
    let r = qr.r();

    let r_max = (0..k).map(|j| r[(j, j)].abs()).fold(0.0_f64, f64::max);
    let mut kept: Vec<DVec> = Vec::with_capacity(k);
    for j in 0..k {
        let rjj = r[(j, j)];
        if rjj.abs() <= DEPENDENCE_TOL * r_max {
            continue;
        }
        let col = q.column(j);
        kept.push(if rjj < 0.0 { -col } else { col.into_owned() });
    }

    if kept.is_empty() {
        return DMat::zeros(v.nrows(), 0);
    }
    DMat::from_columns(&kept)
}

/// Largest absolute entry of `VᵗV − I`.
pub fn orthonormality_error(v: &DMat) -> f64 {
    if v.ncols() == 0 {
        return 0.0;
    }
    let gram = v.tr_mul(v) - DMat::identity(v.ncols(), v.ncols());
    gram.amax()
}
