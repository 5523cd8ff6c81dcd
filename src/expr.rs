//! Symbolic operator expressions over finite element functions.
//!
//! Expressions are built with a small front end which infers the value shape of every node,
//! following the usual rules of tensor algebra:
//!
//! ```ignore
//! let e = tr(sym(u.clone()) + skew(u)) * 2.0;
//! ```
//!
//! Nodes with an arbitrary declared shape can also be built directly with [`Operation::new`].
use crate::element::Shape;
use crate::function::Function;
use crate::Real;
use nalgebra::Scalar;
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

/// Every operator kind in the expression grammar.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Operator {
    Sum,
    Product,
    Division,
    Power,
    Abs,
    Sin,
    Cos,
    Tan,
    Sqrt,
    Exp,
    Ln,
    Sinh,
    Cosh,
    Tanh,
    Asin,
    Acos,
    Atan,
    Atan2,
    Transposed,
    Trace,
    Determinant,
    Inverse,
    Sym,
    Skew,
    Deviatoric,
    Cofactor,
    Dot,
    Cross,
    Outer,
    Inner,
    /// Extraction of a single tensor component.
    Indexed,
}

impl Operator {
    pub const ALL: [Operator; 31] = [
        Operator::Sum,
        Operator::Product,
        Operator::Division,
        Operator::Power,
        Operator::Abs,
        Operator::Sin,
        Operator::Cos,
        Operator::Tan,
        Operator::Sqrt,
        Operator::Exp,
        Operator::Ln,
        Operator::Sinh,
        Operator::Cosh,
        Operator::Tanh,
        Operator::Asin,
        Operator::Acos,
        Operator::Atan,
        Operator::Atan2,
        Operator::Transposed,
        Operator::Trace,
        Operator::Determinant,
        Operator::Inverse,
        Operator::Sym,
        Operator::Skew,
        Operator::Deviatoric,
        Operator::Cofactor,
        Operator::Dot,
        Operator::Cross,
        Operator::Outer,
        Operator::Inner,
        Operator::Indexed,
    ];

    /// The number of operands the operator takes, if fixed.
    ///
    /// [`Operator::Indexed`] takes the indexed expression followed by one index per axis.
    pub fn arity(&self) -> Option<usize> {
        use Operator::*;
        match self {
            Sum | Product | Division | Power | Atan2 | Dot | Cross | Outer | Inner => Some(2),
            Indexed => None,
            _ => Some(1),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// An operator applied to an ordered list of operands, with a declared result shape.
#[derive(Debug, Clone)]
pub struct Operation<T: Scalar> {
    operator: Operator,
    operands: Vec<Expr<T>>,
    shape: Shape,
}

impl<T: Scalar> Operation<T> {
    /// Creates an operation with an explicitly declared result shape.
    ///
    /// No shape inference or validation takes place.
    pub fn new(operator: Operator, operands: Vec<Expr<T>>, shape: Shape) -> Self {
        Self {
            operator,
            operands,
            shape,
        }
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn operands(&self) -> &[Expr<T>] {
        &self.operands
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }
}

/// A node in an expression tree.
#[derive(Debug, Clone)]
pub enum Expr<T: Scalar> {
    /// A stored finite element function.
    Function(Function<T>),
    /// A scalar constant.
    Constant(T),
    Operation(Operation<T>),
}

impl<T: Scalar> Expr<T> {
    pub fn constant(value: T) -> Self {
        Expr::Constant(value)
    }

    /// The value shape of the expression.
    pub fn shape(&self) -> Shape {
        match self {
            Expr::Function(f) => f.value_shape(),
            Expr::Constant(_) => Shape::scalar(),
            Expr::Operation(op) => op.shape().clone(),
        }
    }

    /// The depth of the expression tree, where terminals have depth 1.
    pub fn depth(&self) -> usize {
        match self {
            Expr::Operation(op) => 1 + op.operands.iter().map(Expr::depth).max().unwrap_or(0),
            _ => 1,
        }
    }

    fn operation(operator: Operator, operands: Vec<Expr<T>>, shape: Shape) -> Self {
        Expr::Operation(Operation::new(operator, operands, shape))
    }
}

impl<T: Scalar> From<Function<T>> for Expr<T> {
    fn from(f: Function<T>) -> Self {
        Expr::Function(f)
    }
}

impl<T: Scalar> From<&Function<T>> for Expr<T> {
    fn from(f: &Function<T>) -> Self {
        Expr::Function(f.clone())
    }
}

impl From<f64> for Expr<f64> {
    fn from(value: f64) -> Self {
        Expr::Constant(value)
    }
}

impl From<f32> for Expr<f32> {
    fn from(value: f32) -> Self {
        Expr::Constant(value)
    }
}

fn unary_same_shape<T: Scalar>(operator: Operator, a: impl Into<Expr<T>>) -> Expr<T> {
    let a = a.into();
    let shape = a.shape();
    Expr::operation(operator, vec![a], shape)
}

fn square_matrix_operand<T: Scalar>(operator: Operator, a: &Expr<T>) -> Shape {
    let shape = a.shape();
    assert!(
        shape.is_square(),
        "{} requires a square matrix operand, got shape {}",
        operator,
        shape
    );
    shape
}

fn unary_square<T: Scalar>(operator: Operator, a: impl Into<Expr<T>>, scalar_result: bool) -> Expr<T> {
    let a = a.into();
    let shape = square_matrix_operand(operator, &a);
    let result_shape = if scalar_result { Shape::scalar() } else { shape };
    Expr::operation(operator, vec![a], result_shape)
}

/// The sum of two expressions of equal shape.
///
/// # Panics
///
/// Panics if the shapes differ.
pub fn sum<T: Scalar>(a: impl Into<Expr<T>>, b: impl Into<Expr<T>>) -> Expr<T> {
    let (a, b) = (a.into(), b.into());
    let shape = a.shape();
    assert_eq!(shape, b.shape(), "Operands of a sum must have the same shape");
    Expr::operation(Operator::Sum, vec![a, b], shape)
}

/// The product of a scalar with an expression of any shape.
///
/// # Panics
///
/// Panics if neither operand is scalar. Use [`dot`], [`inner`] or [`outer`] for tensor products.
pub fn product<T: Scalar>(a: impl Into<Expr<T>>, b: impl Into<Expr<T>>) -> Expr<T> {
    let (a, b) = (a.into(), b.into());
    let (sa, sb) = (a.shape(), b.shape());
    let shape = match (sa.is_scalar(), sb.is_scalar()) {
        (true, _) => sb,
        (false, true) => sa,
        (false, false) => panic!("Product requires at least one scalar operand, got shapes {} and {}", sa, sb),
    };
    Expr::operation(Operator::Product, vec![a, b], shape)
}

/// Division of an expression by a scalar expression.
///
/// # Panics
///
/// Panics if the denominator is not scalar.
pub fn division<T: Scalar>(a: impl Into<Expr<T>>, b: impl Into<Expr<T>>) -> Expr<T> {
    let (a, b) = (a.into(), b.into());
    assert!(b.shape().is_scalar(), "Denominator must be scalar");
    let shape = a.shape();
    Expr::operation(Operator::Division, vec![a, b], shape)
}

/// `a` raised to the scalar power `b`, componentwise.
///
/// # Panics
///
/// Panics if the exponent is not scalar.
pub fn pow<T: Scalar>(a: impl Into<Expr<T>>, b: impl Into<Expr<T>>) -> Expr<T> {
    let (a, b) = (a.into(), b.into());
    assert!(b.shape().is_scalar(), "Exponent must be scalar");
    let shape = a.shape();
    Expr::operation(Operator::Power, vec![a, b], shape)
}

/// Componentwise four-quadrant arctangent of `a / b`.
///
/// # Panics
///
/// Panics if the shapes differ.
pub fn atan2<T: Scalar>(a: impl Into<Expr<T>>, b: impl Into<Expr<T>>) -> Expr<T> {
    let (a, b) = (a.into(), b.into());
    let shape = a.shape();
    assert_eq!(shape, b.shape(), "Operands of atan2 must have the same shape");
    Expr::operation(Operator::Atan2, vec![a, b], shape)
}

macro_rules! componentwise_functions {
    ($($name:ident => $operator:ident),* $(,)?) => {
        $(
            pub fn $name<T: Scalar>(a: impl Into<Expr<T>>) -> Expr<T> {
                unary_same_shape(Operator::$operator, a)
            }
        )*
    };
}

componentwise_functions!(
    abs => Abs,
    sin => Sin,
    cos => Cos,
    tan => Tan,
    sqrt => Sqrt,
    exp => Exp,
    ln => Ln,
    sinh => Sinh,
    cosh => Cosh,
    tanh => Tanh,
    asin => Asin,
    acos => Acos,
    atan => Atan,
);

/// # Panics
///
/// Panics if the operand is not a matrix.
pub fn transpose<T: Scalar>(a: impl Into<Expr<T>>) -> Expr<T> {
    let a = a.into();
    let shape = match a.shape().dims() {
        &[r, c] => Shape::matrix(c, r),
        _ => panic!("Transpose requires a matrix operand, got shape {}", a.shape()),
    };
    Expr::operation(Operator::Transposed, vec![a], shape)
}

/// Trace of a square matrix.
///
/// # Panics
///
/// Panics if the operand is not a square matrix. The same holds for the other matrix functions
/// [`det`], [`inv`], [`sym`], [`skew`], [`dev`] and [`cofac`].
pub fn tr<T: Scalar>(a: impl Into<Expr<T>>) -> Expr<T> {
    unary_square(Operator::Trace, a, true)
}

pub fn det<T: Scalar>(a: impl Into<Expr<T>>) -> Expr<T> {
    unary_square(Operator::Determinant, a, true)
}

pub fn inv<T: Scalar>(a: impl Into<Expr<T>>) -> Expr<T> {
    unary_square(Operator::Inverse, a, false)
}

pub fn sym<T: Scalar>(a: impl Into<Expr<T>>) -> Expr<T> {
    unary_square(Operator::Sym, a, false)
}

pub fn skew<T: Scalar>(a: impl Into<Expr<T>>) -> Expr<T> {
    unary_square(Operator::Skew, a, false)
}

pub fn dev<T: Scalar>(a: impl Into<Expr<T>>) -> Expr<T> {
    unary_square(Operator::Deviatoric, a, false)
}

pub fn cofac<T: Scalar>(a: impl Into<Expr<T>>) -> Expr<T> {
    unary_square(Operator::Cofactor, a, false)
}

/// Contraction of the last axis of `a` with the first axis of `b`.
///
/// # Panics
///
/// Panics if either operand is scalar or the contracted dimensions differ.
pub fn dot<T: Scalar>(a: impl Into<Expr<T>>, b: impl Into<Expr<T>>) -> Expr<T> {
    let (a, b) = (a.into(), b.into());
    let (sa, sb) = (a.shape(), b.shape());
    let (a_dims, b_dims) = (sa.dims(), sb.dims());
    assert!(
        !a_dims.is_empty() && !b_dims.is_empty() && a_dims.last() == b_dims.first(),
        "Dimension mismatch in dot product of shapes {} and {}",
        sa,
        sb
    );
    let dims: Vec<_> = a_dims[..a_dims.len() - 1]
        .iter()
        .chain(&b_dims[1..])
        .copied()
        .collect();
    Expr::operation(Operator::Dot, vec![a, b], Shape::new(dims))
}

/// Full contraction of two expressions of equal shape.
///
/// # Panics
///
/// Panics if the shapes differ.
pub fn inner<T: Scalar>(a: impl Into<Expr<T>>, b: impl Into<Expr<T>>) -> Expr<T> {
    let (a, b) = (a.into(), b.into());
    assert_eq!(a.shape(), b.shape(), "Operands of an inner product must have the same shape");
    Expr::operation(Operator::Inner, vec![a, b], Shape::scalar())
}

/// Tensor product of `a` and `b`. The result has rank equal to the sum of the operand ranks.
pub fn outer<T: Scalar>(a: impl Into<Expr<T>>, b: impl Into<Expr<T>>) -> Expr<T> {
    let (a, b) = (a.into(), b.into());
    let dims: Vec<_> = a
        .shape()
        .dims()
        .iter()
        .chain(b.shape().dims())
        .copied()
        .collect();
    Expr::operation(Operator::Outer, vec![a, b], Shape::new(dims))
}

/// Cross product of two 3-vectors.
///
/// # Panics
///
/// Panics if either operand is not a 3-vector.
pub fn cross<T: Scalar>(a: impl Into<Expr<T>>, b: impl Into<Expr<T>>) -> Expr<T> {
    let (a, b) = (a.into(), b.into());
    assert!(
        a.shape() == Shape::vector(3) && b.shape() == Shape::vector(3),
        "Cross product requires two 3-vectors"
    );
    Expr::operation(Operator::Cross, vec![a, b], Shape::vector(3))
}

/// The component of `a` at the given multi-index.
///
/// Each axis of the multi-index is stored as a scalar constant operand.
///
/// # Panics
///
/// Panics if the multi-index does not match the rank of `a` or is out of bounds.
pub fn indexed<T: Real>(a: impl Into<Expr<T>>, index: &[usize]) -> Expr<T> {
    let a = a.into();
    let shape = a.shape();
    assert_eq!(index.len(), shape.rank(), "Multi-index must match rank of indexed expression");
    assert!(
        index.iter().zip(shape.dims()).all(|(i, d)| i < d),
        "Multi-index out of bounds"
    );
    let operands = std::iter::once(a)
        .chain(
            index
                .iter()
                .map(|&i| Expr::Constant(T::from_usize(i).expect("Must be able to fit usize in T"))),
        )
        .collect();
    Expr::operation(Operator::Indexed, operands, Shape::scalar())
}

impl<T: Scalar, Rhs: Into<Expr<T>>> Add<Rhs> for Expr<T> {
    type Output = Expr<T>;

    fn add(self, rhs: Rhs) -> Self::Output {
        sum(self, rhs)
    }
}

impl<T: Scalar, Rhs: Into<Expr<T>>> Mul<Rhs> for Expr<T> {
    type Output = Expr<T>;

    fn mul(self, rhs: Rhs) -> Self::Output {
        product(self, rhs)
    }
}

impl<T: Scalar, Rhs: Into<Expr<T>>> Div<Rhs> for Expr<T> {
    type Output = Expr<T>;

    fn div(self, rhs: Rhs) -> Self::Output {
        division(self, rhs)
    }
}

impl<T: Real, Rhs: Into<Expr<T>>> Sub<Rhs> for Expr<T> {
    type Output = Expr<T>;

    /// `a - b` is represented as `a + (-1) * b`.
    fn sub(self, rhs: Rhs) -> Self::Output {
        sum(self, -rhs.into())
    }
}

impl<T: Real> Neg for Expr<T> {
    type Output = Expr<T>;

    /// `-a` is represented as `(-1) * a`.
    fn neg(self) -> Self::Output {
        product(Expr::Constant(-T::one()), self)
    }
}

