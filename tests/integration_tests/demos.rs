use super::squared_coefficient_error;
use fecalc::element::{FiniteElement, ScalarElement, Shape};
use fecalc::expr::{cofac, det, dev, inner, inv, skew, sym, tr};
use fecalc::mesh::procedural::create_unit_square_uniform_tri_mesh_2d;
use fecalc::mesh::CellType;
use fecalc::space::FunctionSpace;
use fecalc::{evaluate, Expr, Function};
use matrixcompare::assert_scalar_eq;
use nalgebra::DVector;
use std::sync::Arc;

fn evaluate_function(expr: &Expr<f64>) -> Function<f64> {
    evaluate(expr)
        .unwrap()
        .into_function()
        .expect("Expression must evaluate to a function")
}

#[test]
fn linear_combination_of_interpolated_coordinates() {
    let mesh = Arc::new(create_unit_square_uniform_tri_mesh_2d(32));
    let v = Arc::new(FunctionSpace::new(mesh, ScalarElement::lagrange(CellType::Triangle, 1)).unwrap());

    let u = Function::interpolate(Arc::clone(&v), |x| vec![x[0]]).unwrap();
    let w = Function::interpolate(Arc::clone(&v), |x| vec![x[1]]).unwrap();
    let (a, b) = (1.0, 2.0);

    let result = evaluate_function(&(Expr::from(&u) * a + Expr::from(&w) * b));
    let expected = Function::interpolate(v, |x| vec![a * x[0] + b * x[1]]).unwrap();
    let error = squared_coefficient_error(&result, expected.coefficients());
    assert!(error < 1e-24, "Squared error {} too large", error);
}

#[test]
fn sym_skew_decomposition_of_constant_tensor() {
    let mesh = Arc::new(create_unit_square_uniform_tri_mesh_2d(5));
    let dg0 = ScalarElement::discontinuous_lagrange(CellType::Triangle, 0);
    let t = Arc::new(FunctionSpace::new(Arc::clone(&mesh), FiniteElement::tensor(dg0, [2, 2])).unwrap());
    let u = Function::constant(t, &[0.0, 1.0, 2.0, 3.0]).unwrap();

    let result = evaluate_function(&(sym(&u) + skew(&u)));
    assert_eq!(result.function_space().num_sub_spaces(), 4);
    let error = squared_coefficient_error(&result, u.coefficients());
    assert!(error < 1e-24, "Squared error {} too large", error);

    let trace = evaluate_function(&tr(sym(&u) + skew(&u)));
    assert_eq!(trace.value_shape(), Shape::scalar());
    assert_eq!(trace.function_space().element(), &FiniteElement::Scalar(dg0));
    let expected = DVector::repeat(mesh.num_cells(), 3.0);
    let error = squared_coefficient_error(&trace, &expected);
    assert!(error < 1e-24, "Squared error {} too large", error);
}

#[test]
fn matrix_identities_hold_nodewise() {
    let mesh = Arc::new(create_unit_square_uniform_tri_mesh_2d(4));
    let cg1 = ScalarElement::lagrange(CellType::Triangle, 1);
    let t = Arc::new(FunctionSpace::new(Arc::clone(&mesh), FiniteElement::tensor(cg1, [3, 3])).unwrap());
    // Diagonally dominant, hence invertible everywhere
    let u = Function::interpolate(t, |x| {
        vec![4.0 + x[0], x[1], 0.5, x[0] * x[1], 5.0, x[0], 1.0, -x[1], 6.0 - x[0]]
    })
    .unwrap();

    // The deviatoric part is trace free
    let trace_of_dev = evaluate_function(&tr(dev(&u)));
    assert!(trace_of_dev.coefficients().amax() < 1e-12);

    // cof(A) = det(A) inv(A)^T, hence inner(cof(A), A) = 3 det(A)
    let lhs = evaluate_function(&inner(cofac(&u), &u));
    let rhs = evaluate_function(&(det(&u) * 3.0));
    for (l, r) in lhs.coefficients().iter().zip(rhs.coefficients().iter()) {
        assert_scalar_eq!(*l, *r, comp = abs, tol = 1e-9);
    }

    // det(inv(A)) det(A) = 1
    let product = evaluate_function(&(det(inv(&u)) * det(&u)));
    for &p in product.coefficients().iter() {
        assert_scalar_eq!(p, 1.0, comp = abs, tol = 1e-12);
    }
}
