use fecalc::Function;
use nalgebra::DVector;

mod demos;

/// Discrete squared l2 distance between the coefficients of two functions.
fn squared_coefficient_error(u: &Function<f64>, expected: &DVector<f64>) -> f64 {
    assert_eq!(u.coefficients().len(), expected.len());
    (u.coefficients() - expected).norm_squared()
}
