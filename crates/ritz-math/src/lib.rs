//! Dense linear algebra primitives for the ritz eigensolvers.
//!
//! Everything the iterative solvers need from a dense backend lives here:
//! type aliases over nalgebra, index sorting, orthogonalization of column
//! blocks, and small dense eigenproblems (symmetric, nonsymmetric and
//! generalized) used for the reduced subspace problem and as test
//! references.

pub mod eigen;
pub mod ortho;

pub use eigen::{GeneralEigen, Spectrum, diagonalize, general_eigen, generalized_eigen};
pub use ortho::{gram_schmidt, orthonormality_error, qr_orthonormalize};

use nalgebra as na;
pub use num_complex::Complex64;

/// Dynamic vector.
pub type DVec = na::DVector<f64>;
/// Dynamic matrix.
pub type DMat = na::DMatrix<f64>;
/// Dynamic complex vector.
pub type CVec = na::DVector<Complex64>;
/// Dynamic complex matrix.
pub type CMat = na::DMatrix<Complex64>;

/// Indices that sort `values` ascending.
///
/// Uses `total_cmp`, so NaN entries sort last instead of panicking.
pub fn argsort(values: &[f64]) -> Vec<usize> {
    let mut idx: Vec<usize> = (0..values.len()).collect();
    idx.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
    idx
}

/// Gather the columns `idx` of `m` (in that order) into a new matrix.
pub fn select_columns(m: &DMat, idx: &[usize]) -> DMat {
    let mut out = DMat::zeros(m.nrows(), idx.len());
    for (j, &i) in idx.iter().enumerate() {
        out.set_column(j, &m.column(i));
    }
    out
}

/// Normalize every column of `m` in place. Zero columns are left untouched.
pub fn normalize_columns(m: &mut DMat) {
    for mut col in m.column_iter_mut() {
        let norm = col.norm();
        if norm > 0.0 {
            col /= norm;
        }
    }
}

/// Euclidean norm of every column.
pub fn column_norms(m: &DMat) -> DVec {
    DVec::from_iterator(m.ncols(), m.column_iter().map(|c| c.norm()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_argsort_ascending() {
        let idx = argsort(&[3.0, -1.0, 2.0, 0.5]);
        assert_eq!(idx, vec![1, 3, 2, 0]);
    }

    #[test]
    fn test_argsort_nan_last() {
        let idx = argsort(&[f64::NAN, 1.0, 0.0]);
        assert_eq!(idx, vec![2, 1, 0]);
    }

    #[test]
    fn test_select_columns_order() {
        let m = DMat::from_row_slice(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let s = select_columns(&m, &[2, 0]);
        assert_eq!(s.ncols(), 2);
        assert_eq!(s[(0, 0)], 3.0);
        assert_eq!(s[(1, 1)], 4.0);
    }

    #[test]
    fn test_normalize_columns() {
        let mut m = DMat::from_row_slice(2, 2, &[3.0, 0.0, 4.0, 0.0]);
        normalize_columns(&mut m);
        assert_relative_eq!(m.column(0).norm(), 1.0, epsilon = 1e-15);
        assert_eq!(m.column(1).norm(), 0.0);
        assert_relative_eq!(column_norms(&m)[0], 1.0, epsilon = 1e-15);
    }
}
