//! Matrix-free operators defined by row access.
//!
//! Many physical operators are cheap to evaluate one row at a time but too
//! large to store. Implement [`RowOperator`] and wrap it in [`MatrixFree`] to
//! get a [`LinearOperator`]; the product is assembled row by row in parallel
//! and no n × n matrix is ever held.

use crate::LinearOperator;
use rayon::prelude::*;
use ritz_math::{DMat, DVec};

/// An operator that can produce any of its rows on demand.
pub trait RowOperator {
    /// Operator dimension n.
    fn size(&self) -> usize;

    /// Row `index` of the operator, length n.
    fn row(&self, index: usize) -> DVec;

    /// Diagonal element `index`.
    ///
    /// The default builds the whole row; override when the diagonal is
    /// known in closed form.
    fn diagonal_element(&self, index: usize) -> f64 {
        self.row(index)[index]
    }
}

/// Adapter turning a [`RowOperator`] into a [`LinearOperator`].
#[derive(Debug, Clone)]
pub struct MatrixFree<T> {
    inner: T,
}

impl<T: RowOperator> MatrixFree<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: RowOperator + Sync> LinearOperator for MatrixFree<T> {
    fn rows(&self) -> usize {
        self.inner.size()
    }

    fn diagonal(&self) -> DVec {
        let n = self.inner.size();
        DVec::from_iterator(n, (0..n).map(|i| self.inner.diagonal_element(i)))
    }

    fn apply(&self, x: &DMat) -> DMat {
        let n = self.inner.size();
        assert_eq!(x.nrows(), n, "MatrixFree::apply: block has wrong row count");
        if n == 0 || x.ncols() == 0 {
            return DMat::zeros(n, x.ncols());
        }

        let rows: Vec<_> = (0..n)
            .into_par_iter()
            .map(|i| self.inner.row(i).tr_mul(x))
            .collect();
        DMat::from_rows(&rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Tridiagonal test operator: 2 on the diagonal, -1 on the neighbours.
    struct Laplacian1d {
        n: usize,
    }

    impl RowOperator for Laplacian1d {
        fn size(&self) -> usize {
            self.n
        }

        fn row(&self, index: usize) -> DVec {
            let mut row = DVec::zeros(self.n);
            row[index] = 2.0;
            if index > 0 {
                row[index - 1] = -1.0;
            }
            if index + 1 < self.n {
                row[index + 1] = -1.0;
            }
            row
        }

        fn diagonal_element(&self, _index: usize) -> f64 {
            2.0
        }
    }

    fn dense_laplacian(n: usize) -> DMat {
        DMat::from_fn(n, n, |i, j| match i.abs_diff(j) {
            0 => 2.0,
            1 => -1.0,
            _ => 0.0,
        })
    }

    #[test]
    fn test_matrix_free_matches_dense() {
        let op = MatrixFree::new(Laplacian1d { n: 7 });
        let x = DMat::from_fn(7, 3, |i, j| (i * 3 + j) as f64 * 0.1 - 0.5);

        let y = op.apply(&x);
        let expected = dense_laplacian(7) * &x;
        assert!((y - expected).amax() < 1e-14);
    }

    #[test]
    fn test_matrix_free_diagonal_and_dense() {
        let op = MatrixFree::new(Laplacian1d { n: 5 });
        assert_eq!(op.rows(), 5);
        assert_eq!(op.diagonal(), DVec::from_element(5, 2.0));
        assert_eq!(op.to_dense(), dense_laplacian(5));
        assert_eq!(op.inner().n, 5);
    }

    #[test]
    fn test_matrix_free_empty_block() {
        let op = MatrixFree::new(Laplacian1d { n: 4 });
        let y = op.apply(&DMat::zeros(4, 0));
        assert_eq!(y.shape(), (4, 0));
    }
}
