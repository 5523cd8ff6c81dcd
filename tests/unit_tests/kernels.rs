use fecalc::element::Shape;
use fecalc::function::Coefficients;
use fecalc::kernels::{
    cofactor, cross, determinant, deviatoric, dot, inner, inverse, outer, skew, sym, trace, transpose,
    KernelApplyError, Rules, RulesError, SameSpaceKernel, TensorValue,
};
use fecalc::Operator;
use matrixcompare::{assert_matrix_eq, assert_scalar_eq};
use nalgebra::{dmatrix, dvector, DMatrix, DVector};

fn as_matrix(value: TensorValue<f64>) -> DMatrix<f64> {
    match value {
        TensorValue::Matrix(m) => m,
        other => panic!("Expected matrix, got {:?}", other),
    }
}

fn as_vector(value: TensorValue<f64>) -> DVector<f64> {
    match value {
        TensorValue::Vector(v) => v,
        other => panic!("Expected vector, got {:?}", other),
    }
}

fn as_scalar(value: TensorValue<f64>) -> f64 {
    match value {
        TensorValue::Scalar(x) => x,
        other => panic!("Expected scalar, got {:?}", other),
    }
}

fn m(a: DMatrix<f64>) -> TensorValue<f64> {
    TensorValue::Matrix(a)
}

fn v(a: DVector<f64>) -> TensorValue<f64> {
    TensorValue::Vector(a)
}

#[test]
fn tensor_value_row_major_layout() {
    let value = TensorValue::from_row_major(&Shape::matrix(2, 3), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
    assert_eq!(value, m(dmatrix![1.0, 2.0, 3.0; 4.0, 5.0, 6.0]));
    assert_eq!(value.shape(), Shape::matrix(2, 3));

    let mut out = [0.0; 6];
    value.write_row_major(&mut out);
    assert_eq!(out, [1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);

    assert_eq!(
        TensorValue::from_row_major(&Shape::scalar(), &[7.0]),
        Some(TensorValue::Scalar(7.0))
    );
    assert_eq!(TensorValue::from_row_major(&Shape::vector(3), &[1.0, 2.0]), None);
    assert_eq!(TensorValue::<f64>::from_row_major(&Shape::new(vec![1, 1, 1]), &[1.0]), None);
}

#[test]
fn standard_rules_cover_everything_but_indexed() {
    let rules = Rules::<f64>::standard();
    assert_eq!(rules.unsupported_operators(), vec![Operator::Indexed]);
    assert!(rules.validate().is_ok());
    assert!(rules.tensor_kernel(Operator::Trace).is_some());
    assert!(rules.same_space_kernel(Operator::Trace).is_none());
    assert!(rules.same_space_kernel(Operator::Sum).is_some());
    assert_eq!(Rules::<f64>::empty().unsupported_operators(), Operator::ALL.to_vec());
}

#[test]
fn rules_are_cloneable_and_debuggable() {
    let rules = Rules::<f64>::standard();
    let copy = rules.clone();
    assert!(copy.validate().is_ok());
    assert_eq!(copy.unsupported_operators(), rules.unsupported_operators());

    let interpreter = fecalc::Interpreter::with_rules(copy);
    assert!(!format!("{:?}", interpreter).is_empty());
    assert!(!format!("{:?}", m(DMatrix::identity(2, 2))).is_empty());
}

#[test]
fn standard_rules_match_builder_construction() {
    let mut builder = Rules::<f64>::builder();
    for op in Operator::ALL {
        let standard = Rules::<f64>::standard();
        if let Some(kernel) = standard.same_space_kernel(op) {
            builder = builder.same_space(op, kernel);
        }
        if let Some(kernel) = standard.tensor_kernel(op) {
            builder = builder.tensor(op, kernel);
        }
    }
    let rebuilt = builder.build().unwrap();
    assert_eq!(rebuilt.unsupported_operators(), vec![Operator::Indexed]);
}

#[test]
fn builder_rejects_inconsistent_tables() {
    let ambiguous = Rules::<f64>::builder()
        .same_space(Operator::Trace, SameSpaceKernel::Unary(|x| x))
        .tensor(Operator::Trace, trace)
        .build();
    assert_eq!(ambiguous.unwrap_err(), RulesError::Ambiguous(Operator::Trace));

    let arity = Rules::<f64>::builder()
        .same_space(Operator::Sum, SameSpaceKernel::Unary(|x| x))
        .build();
    assert_eq!(
        arity.unwrap_err(),
        RulesError::ArityMismatch {
            operator: Operator::Sum,
            expected: 2,
            actual: 1
        }
    );

    let rules = fecalc::kernels::RulesBuilder::from_rules(Rules::<f64>::standard())
        .remove(Operator::Dot)
        .build()
        .unwrap();
    assert!(!rules.is_supported(Operator::Dot));
    assert_eq!(rules.unsupported_operators(), vec![Operator::Dot, Operator::Indexed]);
}

#[test]
fn same_space_kernel_broadcasts_scalars() {
    let sub = SameSpaceKernel::<f64>::Binary(|x, y| x - y);
    let a = dvector![1.0, 2.0, 3.0];
    let b = dvector![3.0, 2.0, 1.0];

    let result = sub.apply(&[Coefficients::Array(&a), Coefficients::Array(&b)]).unwrap();
    assert_eq!(result, dvector![-2.0, 0.0, 2.0]);

    let result = sub.apply(&[Coefficients::Array(&a), Coefficients::Scalar(1.0)]).unwrap();
    assert_eq!(result, dvector![0.0, 1.0, 2.0]);

    let result = sub.apply(&[Coefficients::Scalar(1.0), Coefficients::Array(&a)]).unwrap();
    assert_eq!(result, dvector![0.0, -1.0, -2.0]);

    let neg = SameSpaceKernel::<f64>::Unary(|x| -x);
    assert_eq!(neg.apply(&[Coefficients::Array(&a)]).unwrap(), dvector![-1.0, -2.0, -3.0]);
}

#[test]
fn same_space_kernel_errors() {
    let add = SameSpaceKernel::<f64>::Binary(|x, y| x + y);
    let a = dvector![1.0, 2.0, 3.0];
    let short = dvector![1.0];

    assert_eq!(
        add.apply(&[Coefficients::Array(&a)]).unwrap_err(),
        KernelApplyError::Arity { expected: 2, actual: 1 }
    );
    assert_eq!(
        add.apply(&[Coefficients::Array(&a), Coefficients::Array(&short)])
            .unwrap_err(),
        KernelApplyError::LengthMismatch { left: 3, right: 1 }
    );
    assert_eq!(
        add.apply(&[Coefficients::Scalar(1.0), Coefficients::Scalar(2.0)])
            .unwrap_err(),
        KernelApplyError::NoArrayOperand
    );
}

#[test]
fn matrix_kernels() {
    let a = dmatrix![2.0, 1.0; 4.0, 3.0];

    assert_scalar_eq!(as_scalar(trace(&[m(a.clone())]).unwrap()), 5.0, comp = abs, tol = 1e-14);
    assert_scalar_eq!(as_scalar(determinant(&[m(a.clone())]).unwrap()), 2.0, comp = abs, tol = 1e-14);
    assert_matrix_eq!(
        as_matrix(inverse(&[m(a.clone())]).unwrap()),
        dmatrix![1.5, -0.5; -2.0, 1.0],
        comp = abs,
        tol = 1e-14
    );
    assert_matrix_eq!(
        as_matrix(cofactor(&[m(a.clone())]).unwrap()),
        dmatrix![3.0, -4.0; -1.0, 2.0],
        comp = abs,
        tol = 1e-14
    );
    assert_matrix_eq!(
        as_matrix(deviatoric(&[m(a.clone())]).unwrap()),
        dmatrix![-0.5, 1.0; 4.0, 0.5],
        comp = abs,
        tol = 1e-14
    );
    assert_matrix_eq!(
        as_matrix(sym(&[m(a.clone())]).unwrap()),
        dmatrix![2.0, 2.5; 2.5, 3.0],
        comp = abs,
        tol = 1e-14
    );
    assert_matrix_eq!(
        as_matrix(skew(&[m(a.clone())]).unwrap()),
        dmatrix![0.0, -1.5; 1.5, 0.0],
        comp = abs,
        tol = 1e-14
    );
    assert_eq!(
        as_matrix(transpose(&[m(dmatrix![1.0, 2.0, 3.0; 4.0, 5.0, 6.0])]).unwrap()),
        dmatrix![1.0, 4.0; 2.0, 5.0; 3.0, 6.0]
    );
}

#[test]
fn singular_matrices_are_errors() {
    let singular = dmatrix![1.0, 2.0; 2.0, 4.0];
    let err = inverse(&[m(singular.clone())]).unwrap_err();
    assert!(err.to_string().contains("Singular"));
    assert!(cofactor(&[m(singular)]).is_err());
}

#[test]
fn matrix_kernels_reject_bad_operands() {
    assert!(trace(&[m(dmatrix![1.0, 2.0, 3.0])]).is_err());
    assert!(determinant(&[v(dvector![1.0, 2.0])]).is_err());
    assert!(inverse::<f64>(&[]).is_err());
    assert!(trace(&[m(DMatrix::identity(2, 2)), m(DMatrix::identity(2, 2))]).is_err());
}

#[test]
fn product_kernels() {
    let a = dmatrix![1.0, 2.0; 3.0, 4.0];
    let x = dvector![1.0, -1.0];

    assert_eq!(as_vector(dot(&[m(a.clone()), v(x.clone())]).unwrap()), dvector![-1.0, -1.0]);
    assert_eq!(as_vector(dot(&[v(x.clone()), m(a.clone())]).unwrap()), dvector![-2.0, -2.0]);
    assert_eq!(as_scalar(dot(&[v(x.clone()), v(x.clone())]).unwrap()), 2.0);
    assert_eq!(
        as_matrix(dot(&[m(a.clone()), m(a.clone())]).unwrap()),
        dmatrix![7.0, 10.0; 15.0, 22.0]
    );
    assert!(dot(&[m(a.clone()), v(dvector![1.0, 2.0, 3.0])]).is_err());

    assert_eq!(as_scalar(inner(&[m(a.clone()), m(a.clone())]).unwrap()), 30.0);
    assert_eq!(as_scalar(inner(&[v(x.clone()), v(x.clone())]).unwrap()), 2.0);
    assert!(inner(&[m(a.clone()), v(x.clone())]).is_err());

    assert_eq!(
        as_matrix(outer(&[v(dvector![1.0, 2.0]), v(dvector![3.0, 4.0, 5.0])]).unwrap()),
        dmatrix![3.0, 4.0, 5.0; 6.0, 8.0, 10.0]
    );
    assert_eq!(
        as_vector(outer(&[TensorValue::Scalar(2.0), v(x.clone())]).unwrap()),
        dvector![2.0, -2.0]
    );
    assert!(outer(&[m(a), v(x)]).is_err());

    assert_eq!(
        as_vector(cross(&[v(dvector![1.0, 0.0, 0.0]), v(dvector![0.0, 1.0, 0.0])]).unwrap()),
        dvector![0.0, 0.0, 1.0]
    );
    assert!(cross(&[v(dvector![1.0, 0.0]), v(dvector![0.0, 1.0])]).is_err());
}
