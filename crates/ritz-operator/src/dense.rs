//! Dense matrices as operators.

use crate::LinearOperator;
use ritz_math::{DMat, DVec};

impl LinearOperator for DMat {
    fn rows(&self) -> usize {
        self.nrows()
    }

    fn cols(&self) -> usize {
        self.ncols()
    }

    fn diagonal(&self) -> DVec {
        DMat::diagonal(self)
    }

    fn apply(&self, x: &DMat) -> DMat {
        self * x
    }

    fn apply_vec(&self, x: &DVec) -> DVec {
        self * x
    }

    fn to_dense(&self) -> DMat {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dense_operator_matches_matrix() {
        let a = DMat::from_row_slice(3, 3, &[2.0, 1.0, 0.0, 1.0, 3.0, 1.0, 0.0, 1.0, 4.0]);
        let x = DVec::from_vec(vec![1.0, -1.0, 2.0]);

        assert_eq!(LinearOperator::rows(&a), 3);
        assert_eq!(LinearOperator::diagonal(&a), DVec::from_vec(vec![2.0, 3.0, 4.0]));
        assert_eq!(a.apply_vec(&x), &a * &x);
        assert_eq!(LinearOperator::to_dense(&a), a);
    }

    #[test]
    fn test_reference_forwards() {
        let a = DMat::identity(4, 4) * 2.0;
        let op: &dyn LinearOperator = &a;
        let y = (&op).apply(&DMat::identity(4, 2));
        assert_eq!(y[(1, 1)], 2.0);
        assert_eq!(y[(0, 1)], 0.0);
    }
}
