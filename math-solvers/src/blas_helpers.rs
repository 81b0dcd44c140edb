//! Vector kernels shared by the Krylov solvers

use ndarray::Array1;

/// Compute inner product (x, y) = Σ x_i * y_i
#[inline]
pub fn inner_product(x: &Array1<f64>, y: &Array1<f64>) -> f64 {
    assert_eq!(
        x.len(),
        y.len(),
        "Vector lengths must match for inner product"
    );
    x.dot(y)
}

/// Compute vector 2-norm: ||x||_2 = sqrt(Σ x_i^2)
#[inline]
pub fn vector_norm(x: &Array1<f64>) -> f64 {
    x.iter().map(|xi| xi * xi).sum::<f64>().sqrt()
}

/// Compute axpy: y = α * x + y
#[inline]
pub fn axpy(alpha: f64, x: &Array1<f64>, y: &mut Array1<f64>) {
    y.scaled_add(alpha, x);
}

/// Residual normaliser: ||b|| when it is meaningful, 1 otherwise.
///
/// A zero right-hand side with a non-zero initial guess is measured in
/// absolute terms instead of returning the guess unchanged.
#[inline]
pub fn residual_scale(b: &Array1<f64>) -> f64 {
    let b_norm = vector_norm(b);
    if b_norm < 1e-15 { 1.0 } else { b_norm }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_inner_product_and_norm() {
        let x = array![3.0, 4.0];
        let y = array![1.0, 2.0];
        assert_relative_eq!(inner_product(&x, &y), 11.0);
        assert_relative_eq!(vector_norm(&x), 5.0);
    }

    #[test]
    fn test_axpy() {
        let x = array![1.0, 2.0];
        let mut y = array![10.0, 20.0];
        axpy(2.0, &x, &mut y);
        assert_eq!(y, array![12.0, 24.0]);
    }

    #[test]
    fn test_residual_scale_zero_rhs() {
        assert_relative_eq!(residual_scale(&array![0.0, 0.0]), 1.0);
        assert_relative_eq!(residual_scale(&array![0.0, 2.0]), 2.0);
    }
}
