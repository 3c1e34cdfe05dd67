//! Paired operator for non-symmetric doubled eigenproblems.
//!
//! Two square blocks A and B of equal size n compose into
//!
//!   H = [  A   B ]
//!       [ -B  -A ]
//!
//! of size 2n. When A ± B are symmetric positive definite the spectrum of H
//! comes in real pairs ±ω; the eigenvectors split into an A-block half X
//! and a B-block half Y.

use crate::LinearOperator;
use crate::error::{OperatorError, Result};
use ritz_math::{DMat, DVec};

/// The operator `[[A, B], [-B, -A]]`.
#[derive(Debug, Clone)]
pub struct HamiltonianOperator<A, B> {
    a: A,
    b: B,
}

impl<A: LinearOperator, B: LinearOperator> HamiltonianOperator<A, B> {
    /// Compose A and B. Both blocks must be square and of the same size.
    pub fn new(a: A, b: B) -> Result<Self> {
        if a.rows() != a.cols() {
            return Err(OperatorError::NotSquare {
                what: "A block",
                rows: a.rows(),
                cols: a.cols(),
            });
        }
        if b.rows() != b.cols() {
            return Err(OperatorError::NotSquare {
                what: "B block",
                rows: b.rows(),
                cols: b.cols(),
            });
        }
        if a.rows() != b.rows() {
            return Err(OperatorError::DimensionMismatch {
                what: "B block",
                expected: a.rows(),
                found: b.rows(),
            });
        }
        Ok(Self { a, b })
    }

    /// Size of each block (half the operator dimension).
    pub fn block_size(&self) -> usize {
        self.a.rows()
    }

    pub fn a(&self) -> &A {
        &self.a
    }

    pub fn b(&self) -> &B {
        &self.b
    }

    /// Split a full-space vector into its A-block and B-block halves.
    pub fn split(&self, v: &DVec) -> (DVec, DVec) {
        let n = self.block_size();
        assert_eq!(v.len(), 2 * n, "HamiltonianOperator::split: wrong vector length");
        (v.rows(0, n).into_owned(), v.rows(n, n).into_owned())
    }

    /// Split every column of a full-space block into `(X, Y)`.
    pub fn split_columns(&self, m: &DMat) -> (DMat, DMat) {
        let n = self.block_size();
        assert_eq!(m.nrows(), 2 * n, "HamiltonianOperator::split_columns: wrong row count");
        (m.rows(0, n).into_owned(), m.rows(n, n).into_owned())
    }

    /// Split eigenvectors into `(X, Y)` scaled so that `|X_i|² − |Y_i|² = 1`.
    ///
    /// Columns whose norm difference is not positive (negative-frequency
    /// partners) are returned unscaled.
    pub fn normalize_excitations(&self, vectors: &DMat) -> (DMat, DMat) {
        let (mut x, mut y) = self.split_columns(vectors);
        for j in 0..x.ncols() {
            let diff = x.column(j).norm_squared() - y.column(j).norm_squared();
            if diff > 0.0 {
                let scale = diff.sqrt().recip();
                x.column_mut(j).scale_mut(scale);
                y.column_mut(j).scale_mut(scale);
            }
        }
        (x, y)
    }
}

impl<A: LinearOperator, B: LinearOperator> LinearOperator for HamiltonianOperator<A, B> {
    fn rows(&self) -> usize {
        self.a.rows() + self.b.rows()
    }

    fn diagonal(&self) -> DVec {
        let da = self.a.diagonal();
        let n = da.len();
        let mut d = DVec::zeros(2 * n);
        d.rows_mut(0, n).copy_from(&da);
        d.rows_mut(n, n).copy_from(&(-da));
        d
    }

    fn apply(&self, x: &DMat) -> DMat {
        let n = self.block_size();
        assert_eq!(x.nrows(), 2 * n, "HamiltonianOperator::apply: block has wrong row count");

        let top = x.rows(0, n).into_owned();
        let bottom = x.rows(n, n).into_owned();

        let a_top = self.a.apply(&top);
        let a_bottom = self.a.apply(&bottom);
        let b_top = self.b.apply(&top);
        let b_bottom = self.b.apply(&bottom);

        let mut y = DMat::zeros(2 * n, x.ncols());
        y.rows_mut(0, n).copy_from(&(a_top + b_bottom));
        y.rows_mut(n, n).copy_from(&(-(b_top + a_bottom)));
        y
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn blocks() -> (DMat, DMat) {
        let a = DMat::from_row_slice(2, 2, &[3.0, 0.2, 0.2, 5.0]);
        let b = DMat::from_row_slice(2, 2, &[0.1, 0.05, 0.05, 0.3]);
        (a, b)
    }

    fn dense_h(a: &DMat, b: &DMat) -> DMat {
        let n = a.nrows();
        let mut h = DMat::zeros(2 * n, 2 * n);
        h.view_mut((0, 0), (n, n)).copy_from(a);
        h.view_mut((0, n), (n, n)).copy_from(b);
        h.view_mut((n, 0), (n, n)).copy_from(&(-b));
        h.view_mut((n, n), (n, n)).copy_from(&(-a));
        h
    }

    #[test]
    fn test_product_matches_block_matrix() {
        let (a, b) = blocks();
        let expected = dense_h(&a, &b);
        let h = HamiltonianOperator::new(a, b).unwrap();

        assert_eq!(h.rows(), 4);
        assert!((h.to_dense() - &expected).amax() < 1e-15);
        assert_eq!(h.diagonal(), DVec::from_vec(vec![3.0, 5.0, -3.0, -5.0]));
    }

    #[test]
    fn test_spectrum_is_paired() {
        let (a, b) = blocks();
        let h = HamiltonianOperator::new(a, b).unwrap();
        let mut re: Vec<f64> = h.to_dense().complex_eigenvalues().iter().map(|z| z.re).collect();
        re.sort_by(|x, y| x.total_cmp(y));
        assert_relative_eq!(re[0], -re[3], epsilon = 1e-10);
        assert_relative_eq!(re[1], -re[2], epsilon = 1e-10);
    }

    #[test]
    fn test_mismatched_blocks_rejected() {
        let err = HamiltonianOperator::new(DMat::identity(2, 2), DMat::identity(3, 3)).unwrap_err();
        assert_eq!(
            err,
            OperatorError::DimensionMismatch {
                what: "B block",
                expected: 2,
                found: 3
            }
        );
        assert!(HamiltonianOperator::new(DMat::zeros(2, 3), DMat::zeros(2, 3)).is_err());
    }

    #[test]
    fn test_split_and_normalize() {
        let (a, b) = blocks();
        let h = HamiltonianOperator::new(a, b).unwrap();

        let v = DVec::from_vec(vec![1.0, 2.0, 3.0, 4.0]);
        let (x, y) = h.split(&v);
        assert_eq!(x.as_slice(), &[1.0, 2.0]);
        assert_eq!(y.as_slice(), &[3.0, 4.0]);

        let vecs = DMat::from_column_slice(4, 2, &[2.0, 0.0, 0.5, 0.0, 0.1, 0.0, 1.0, 0.0]);
        let (x, y) = h.normalize_excitations(&vecs);
        assert_relative_eq!(x.column(0).norm_squared() - y.column(0).norm_squared(), 1.0, epsilon = 1e-12);
        // Negative norm difference: left as is.
        assert_relative_eq!(x[(0, 1)], 0.1);
        assert_relative_eq!(y[(0, 1)], 1.0);
    }
}
