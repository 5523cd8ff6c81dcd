//! Numeric kernels and the tables that map operators to them.
//!
//! Operators fall into two groups. *Same-space* operators act componentwise on whole
//! coefficient vectors, and their result lives in the same space as their operands.
//! *Tensor* operators act on the tensor value held at each node of the operands, and their
//! result generally lives in a space with a different value shape.
use crate::element::Shape;
use crate::expr::Operator;
use crate::function::Coefficients;
use crate::Real;
use eyre::eyre;
use nalgebra::{DMatrix, DVector, Scalar};
use numeric_literals::replace_float_literals;
use rustc_hash::FxHashMap;
use std::error::Error;
use std::fmt;

/// The value of a function at a single node, viewed as a tensor.
#[derive(Debug, Clone, PartialEq)]
pub enum TensorValue<T> {
    Scalar(T),
    Vector(DVector<T>),
    Matrix(DMatrix<T>),
}

impl<T: Scalar> TensorValue<T> {
    /// Builds a tensor value of the given shape from its components in row-major order.
    ///
    /// Returns `None` if the number of components does not match the shape, or if the shape
    /// has rank 3 or higher.
    pub fn from_row_major(shape: &Shape, values: &[T]) -> Option<Self> {
        if values.len() != shape.num_components() {
            return None;
        }
        match shape.dims() {
            [] => Some(TensorValue::Scalar(values[0].clone())),
            [n] => Some(TensorValue::Vector(DVector::from_column_slice(&values[..*n]))),
            [r, c] => Some(TensorValue::Matrix(DMatrix::from_row_slice(*r, *c, values))),
            _ => None,
        }
    }

    pub fn shape(&self) -> Shape {
        match self {
            TensorValue::Scalar(_) => Shape::scalar(),
            TensorValue::Vector(v) => Shape::vector(v.len()),
            TensorValue::Matrix(m) => Shape::matrix(m.nrows(), m.ncols()),
        }
    }

    /// Writes the components in row-major order.
    ///
    /// # Panics
    ///
    /// Panics if the output length does not match the number of components.
    pub fn write_row_major(&self, output: &mut [T]) {
        assert_eq!(output.len(), self.shape().num_components());
        match self {
            TensorValue::Scalar(x) => output[0] = x.clone(),
            TensorValue::Vector(v) => output.clone_from_slice(v.as_slice()),
            TensorValue::Matrix(m) => {
                let ncols = m.ncols();
                for ((i, j), out) in (0..m.nrows())
                    .flat_map(|i| (0..ncols).map(move |j| (i, j)))
                    .zip(output.iter_mut())
                {
                    *out = m[(i, j)].clone();
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KernelApplyError {
    Arity { expected: usize, actual: usize },
    /// Two coefficient arrays of different length.
    LengthMismatch { left: usize, right: usize },
    /// None of the operands is a coefficient array.
    NoArrayOperand,
}

impl fmt::Display for KernelApplyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelApplyError::Arity { expected, actual } => {
                write!(f, "Kernel expects {} operands, got {}.", expected, actual)
            }
            KernelApplyError::LengthMismatch { left, right } => {
                write!(f, "Coefficient arrays of length {} and {} can not be combined.", left, right)
            }
            KernelApplyError::NoArrayOperand => write!(f, "Kernel needs at least one coefficient array."),
        }
    }
}

impl Error for KernelApplyError {}

/// A componentwise kernel acting on whole coefficient arrays.
#[derive(Debug, Copy, Clone)]
pub enum SameSpaceKernel<T> {
    Unary(fn(T) -> T),
    Binary(fn(T, T) -> T),
}

impl<T: Real> SameSpaceKernel<T> {
    pub fn arity(&self) -> usize {
        match self {
            SameSpaceKernel::Unary(_) => 1,
            SameSpaceKernel::Binary(_) => 2,
        }
    }

    /// Applies the kernel componentwise. Scalar operands are broadcast against arrays.
    pub fn apply(&self, args: &[Coefficients<T>]) -> Result<DVector<T>, KernelApplyError> {
        use Coefficients::{Array, Scalar};
        if args.len() != self.arity() {
            return Err(KernelApplyError::Arity {
                expected: self.arity(),
                actual: args.len(),
            });
        }

        match (self, args) {
            (SameSpaceKernel::Unary(f), [Array(a)]) => Ok(a.map(*f)),
            (SameSpaceKernel::Binary(f), [Array(a), Array(b)]) => {
                if a.len() != b.len() {
                    return Err(KernelApplyError::LengthMismatch {
                        left: a.len(),
                        right: b.len(),
                    });
                }
                Ok(a.zip_map(*b, *f))
            }
            (SameSpaceKernel::Binary(f), [Array(a), Scalar(y)]) => Ok(a.map(|x| f(x, *y))),
            (SameSpaceKernel::Binary(f), [Scalar(x), Array(b)]) => Ok(b.map(|y| f(*x, y))),
            _ => Err(KernelApplyError::NoArrayOperand),
        }
    }
}

/// A kernel acting on the tensor values held by the operands at a single node.
pub type TensorKernel<T> = fn(&[TensorValue<T>]) -> eyre::Result<TensorValue<T>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RulesError {
    /// The operator has a kernel in both tables.
    Ambiguous(Operator),
    /// The kernel does not take as many operands as the operator.
    ArityMismatch { operator: Operator, expected: usize, actual: usize },
}

impl fmt::Display for RulesError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RulesError::Ambiguous(op) => {
                write!(f, "Operator {} is registered as both same-space and tensor operator.", op)
            }
            RulesError::ArityMismatch {
                operator,
                expected,
                actual,
            } => write!(
                f,
                "Operator {} takes {} operands, but its kernel takes {}.",
                operator, expected, actual
            ),
        }
    }
}

impl Error for RulesError {}

/// The two kernel tables consulted by the interpreter.
#[derive(Debug, Clone)]
pub struct Rules<T> {
    same_space: FxHashMap<Operator, SameSpaceKernel<T>>,
    tensor: FxHashMap<Operator, TensorKernel<T>>,
}

impl<T: Real> Default for Rules<T> {
    fn default() -> Self {
        Self::standard()
    }
}

impl<T: Real> Rules<T> {
    /// Rules without any kernels.
    pub fn empty() -> Self {
        Self {
            same_space: FxHashMap::default(),
            tensor: FxHashMap::default(),
        }
    }

    pub fn builder() -> RulesBuilder<T> {
        RulesBuilder { rules: Self::empty() }
    }

    /// Kernels for every operator in the grammar except [`Operator::Indexed`].
    ///
    /// The tables are validated with [`Rules::validate`] on construction.
    pub fn standard() -> Self {
        use Operator::*;
        use SameSpaceKernel::{Binary, Unary};

        let same_space: [(Operator, SameSpaceKernel<T>); 18] = [
            (Sum, Binary(|x, y| x + y)),
            (Product, Binary(|x, y| x * y)),
            (Division, Binary(|x, y| x / y)),
            (Power, Binary(|x, y| x.powf(y))),
            (Atan2, Binary(|y, x| y.atan2(x))),
            (Abs, Unary(|x| x.abs())),
            (Sin, Unary(|x| x.sin())),
            (Cos, Unary(|x| x.cos())),
            (Tan, Unary(|x| x.tan())),
            (Sqrt, Unary(|x| x.sqrt())),
            (Exp, Unary(|x| x.exp())),
            (Ln, Unary(|x| x.ln())),
            (Sinh, Unary(|x| x.sinh())),
            (Cosh, Unary(|x| x.cosh())),
            (Tanh, Unary(|x| x.tanh())),
            (Asin, Unary(|x| x.asin())),
            (Acos, Unary(|x| x.acos())),
            (Atan, Unary(|x| x.atan())),
        ];

        let tensor: [(Operator, TensorKernel<T>); 12] = [
            (Inverse, inverse),
            (Transposed, transpose),
            (Sym, sym),
            (Skew, skew),
            (Deviatoric, deviatoric),
            (Cofactor, cofactor),
            (Determinant, determinant),
            (Trace, trace),
            (Dot, dot),
            (Cross, cross),
            (Outer, outer),
            (Inner, inner),
        ];

        let builder = same_space
            .into_iter()
            .fold(Self::builder(), |builder, (op, kernel)| builder.same_space(op, kernel));
        tensor
            .into_iter()
            .fold(builder, |builder, (op, kernel)| builder.tensor(op, kernel))
            .build()
            .expect("Standard kernel tables must be consistent")
    }

    pub fn same_space_kernel(&self, operator: Operator) -> Option<SameSpaceKernel<T>> {
        self.same_space.get(&operator).copied()
    }

    pub fn tensor_kernel(&self, operator: Operator) -> Option<TensorKernel<T>> {
        self.tensor.get(&operator).copied()
    }

    pub fn is_supported(&self, operator: Operator) -> bool {
        self.same_space.contains_key(&operator) || self.tensor.contains_key(&operator)
    }

    /// Operators of the grammar for which neither table holds a kernel.
    pub fn unsupported_operators(&self) -> Vec<Operator> {
        Operator::ALL
            .iter()
            .copied()
            .filter(|op| !self.is_supported(*op))
            .collect()
    }

    /// Checks that no operator is in both tables and that kernel arities match.
    pub fn validate(&self) -> Result<(), RulesError> {
        let mut operators: Vec<_> = self.same_space.keys().copied().collect();
        operators.sort();
        for op in operators {
            if self.tensor.contains_key(&op) {
                return Err(RulesError::Ambiguous(op));
            }
            let kernel_arity = self.same_space[&op].arity();
            if let Some(expected) = op.arity() {
                if expected != kernel_arity {
                    return Err(RulesError::ArityMismatch {
                        operator: op,
                        expected,
                        actual: kernel_arity,
                    });
                }
            }
        }
        Ok(())
    }
}

/// Builder for custom kernel tables.
#[derive(Debug, Clone)]
pub struct RulesBuilder<T> {
    rules: Rules<T>,
}

impl<T: Real> RulesBuilder<T> {
    /// Starts from the given rules instead of empty tables.
    pub fn from_rules(rules: Rules<T>) -> Self {
        Self { rules }
    }

    pub fn same_space(mut self, operator: Operator, kernel: SameSpaceKernel<T>) -> Self {
        self.rules.same_space.insert(operator, kernel);
        self
    }

    pub fn tensor(mut self, operator: Operator, kernel: TensorKernel<T>) -> Self {
        self.rules.tensor.insert(operator, kernel);
        self
    }

    /// Removes the operator from both tables.
    pub fn remove(mut self, operator: Operator) -> Self {
        self.rules.same_space.remove(&operator);
        self.rules.tensor.remove(&operator);
        self
    }

    pub fn build(self) -> Result<Rules<T>, RulesError> {
        self.rules.validate()?;
        Ok(self.rules)
    }
}

fn unary_operand<T: Scalar>(args: &[TensorValue<T>]) -> eyre::Result<&TensorValue<T>> {
    match args {
        [a] => Ok(a),
        _ => Err(eyre!("Expected 1 operand, got {}", args.len())),
    }
}

fn binary_operands<T: Scalar>(args: &[TensorValue<T>]) -> eyre::Result<(&TensorValue<T>, &TensorValue<T>)> {
    match args {
        [a, b] => Ok((a, b)),
        _ => Err(eyre!("Expected 2 operands, got {}", args.len())),
    }
}

fn matrix_operand<T: Scalar>(args: &[TensorValue<T>]) -> eyre::Result<&DMatrix<T>> {
    match unary_operand(args)? {
        TensorValue::Matrix(a) => Ok(a),
        other => Err(eyre!("Expected matrix operand, got shape {}", other.shape())),
    }
}

fn square_matrix_operand<T: Scalar>(args: &[TensorValue<T>]) -> eyre::Result<&DMatrix<T>> {
    let a = matrix_operand(args)?;
    if a.is_square() {
        Ok(a)
    } else {
        Err(eyre!("Expected square matrix, got {}x{}", a.nrows(), a.ncols()))
    }
}

fn try_inverse<T: Real>(a: &DMatrix<T>) -> eyre::Result<DMatrix<T>> {
    a.clone()
        .try_inverse()
        .ok_or_else(|| eyre!("Singular matrix encountered in inverse"))
}

fn dim_as_real<T: Real>(a: &DMatrix<T>) -> T {
    T::from_usize(a.nrows()).expect("Must be able to fit usize in T")
}

pub fn inverse<T: Real>(args: &[TensorValue<T>]) -> eyre::Result<TensorValue<T>> {
    let a = square_matrix_operand(args)?;
    Ok(TensorValue::Matrix(try_inverse(a)?))
}

pub fn transpose<T: Real>(args: &[TensorValue<T>]) -> eyre::Result<TensorValue<T>> {
    Ok(TensorValue::Matrix(matrix_operand(args)?.transpose()))
}

/// The symmetric part `(A + A^T) / 2`.
#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
pub fn sym<T: Real>(args: &[TensorValue<T>]) -> eyre::Result<TensorValue<T>> {
    let a = square_matrix_operand(args)?;
    Ok(TensorValue::Matrix((a + a.transpose()) * 0.5))
}

/// The skew-symmetric part `(A - A^T) / 2`.
#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
pub fn skew<T: Real>(args: &[TensorValue<T>]) -> eyre::Result<TensorValue<T>> {
    let a = square_matrix_operand(args)?;
    Ok(TensorValue::Matrix((a - a.transpose()) * 0.5))
}

/// The deviatoric part `A - tr(A) / n * I`.
pub fn deviatoric<T: Real>(args: &[TensorValue<T>]) -> eyre::Result<TensorValue<T>> {
    let a = square_matrix_operand(args)?;
    let n = a.nrows();
    let mean = a.trace() / dim_as_real(a);
    Ok(TensorValue::Matrix(a - DMatrix::identity(n, n) * mean))
}

/// The cofactor matrix `det(A) * A^{-T}`.
pub fn cofactor<T: Real>(args: &[TensorValue<T>]) -> eyre::Result<TensorValue<T>> {
    let a = square_matrix_operand(args)?;
    let a_inv = try_inverse(a)?;
    Ok(TensorValue::Matrix(a_inv.transpose() * a.determinant()))
}

pub fn determinant<T: Real>(args: &[TensorValue<T>]) -> eyre::Result<TensorValue<T>> {
    let a = square_matrix_operand(args)?;
    Ok(TensorValue::Scalar(a.determinant()))
}

pub fn trace<T: Real>(args: &[TensorValue<T>]) -> eyre::Result<TensorValue<T>> {
    let a = square_matrix_operand(args)?;
    Ok(TensorValue::Scalar(a.trace()))
}

/// Contraction of the last axis of the first operand with the first axis of the second.
pub fn dot<T: Real>(args: &[TensorValue<T>]) -> eyre::Result<TensorValue<T>> {
    use TensorValue::{Matrix, Scalar, Vector};
    match binary_operands(args)? {
        (Scalar(x), Scalar(y)) => Ok(Scalar(*x * *y)),
        (Vector(u), Vector(v)) if u.len() == v.len() => Ok(Scalar(u.dot(v))),
        (Matrix(a), Vector(v)) if a.ncols() == v.len() => Ok(Vector(a * v)),
        (Vector(u), Matrix(b)) if u.len() == b.nrows() => Ok(Vector(b.tr_mul(u))),
        (Matrix(a), Matrix(b)) if a.ncols() == b.nrows() => Ok(Matrix(a * b)),
        (a, b) => Err(eyre!("Can not take dot product of shapes {} and {}", a.shape(), b.shape())),
    }
}

/// Full contraction of two tensors of equal shape.
pub fn inner<T: Real>(args: &[TensorValue<T>]) -> eyre::Result<TensorValue<T>> {
    use TensorValue::{Matrix, Scalar, Vector};
    let (a, b) = binary_operands(args)?;
    if a.shape() != b.shape() {
        return Err(eyre!("Can not take inner product of shapes {} and {}", a.shape(), b.shape()));
    }
    match (a, b) {
        (Scalar(x), Scalar(y)) => Ok(Scalar(*x * *y)),
        (Vector(u), Vector(v)) => Ok(Scalar(u.dot(v))),
        (Matrix(a), Matrix(b)) => Ok(Scalar(a.dot(b))),
        _ => unreachable!("Equal shapes imply equal variants"),
    }
}

/// Tensor product of two operands whose ranks sum to at most two.
pub fn outer<T: Real>(args: &[TensorValue<T>]) -> eyre::Result<TensorValue<T>> {
    use TensorValue::{Matrix, Scalar, Vector};
    match binary_operands(args)? {
        (Scalar(x), Scalar(y)) => Ok(Scalar(*x * *y)),
        (Scalar(x), Vector(v)) | (Vector(v), Scalar(x)) => Ok(Vector(v * *x)),
        (Scalar(x), Matrix(a)) | (Matrix(a), Scalar(x)) => Ok(Matrix(a * *x)),
        (Vector(u), Vector(v)) => Ok(Matrix(u * v.transpose())),
        (a, b) => Err(eyre!(
            "Outer product of shapes {} and {} has rank 3 or higher",
            a.shape(),
            b.shape()
        )),
    }
}

pub fn cross<T: Real>(args: &[TensorValue<T>]) -> eyre::Result<TensorValue<T>> {
    match binary_operands(args)? {
        (TensorValue::Vector(u), TensorValue::Vector(v)) if u.len() == 3 && v.len() == 3 => {
            Ok(TensorValue::Vector(DVector::from_column_slice(&[
                u[1] * v[2] - u[2] * v[1],
                u[2] * v[0] - u[0] * v[2],
                u[0] * v[1] - u[1] * v[0],
            ])))
        }
        (a, b) => Err(eyre!(
            "Cross product requires two 3-vectors, got shapes {} and {}",
            a.shape(),
            b.shape()
        )),
    }
}
