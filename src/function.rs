//! Finite element functions and the values an expression evaluates to.
use crate::element::Shape;
use crate::kernels::TensorValue;
use crate::space::{FunctionSpace, SpaceError};
use crate::Real;
use nalgebra::{DVector, Scalar};
use std::sync::Arc;

#[derive(Debug)]
struct FunctionData<T: Scalar> {
    space: Arc<FunctionSpace<T>>,
    coefficients: DVector<T>,
}

/// A finite element function: a function space together with one coefficient per degree of freedom.
///
/// `Function` is a shared handle. Cloning it is cheap and produces a handle to the same function,
/// which can be checked with [`Function::ptr_eq`]. The coefficients can not be modified after
/// construction; operations on functions always produce new functions.
#[derive(Debug, Clone)]
pub struct Function<T: Scalar> {
    data: Arc<FunctionData<T>>,
}

impl<T: Scalar> Function<T> {
    /// Creates a function in the given space with the given coefficients.
    pub fn from_coefficients(space: Arc<FunctionSpace<T>>, coefficients: DVector<T>) -> Result<Self, SpaceError> {
        if space.is_sub_space() {
            return Err(SpaceError::SubSpace);
        }
        if coefficients.len() != space.dim() {
            return Err(SpaceError::CoefficientLength {
                expected: space.dim(),
                actual: coefficients.len(),
            });
        }
        Ok(Self {
            data: Arc::new(FunctionData { space, coefficients }),
        })
    }

    pub fn coefficients(&self) -> &DVector<T> {
        &self.data.coefficients
    }

    pub fn function_space(&self) -> &Arc<FunctionSpace<T>> {
        &self.data.space
    }

    pub fn value_shape(&self) -> Shape {
        self.data.space.element().value_shape()
    }

    /// Whether the two handles refer to the very same function.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.data, &b.data)
    }
}

impl<T: Real> Function<T> {
    pub fn zeros(space: Arc<FunctionSpace<T>>) -> Result<Self, SpaceError> {
        let dim = space.dim();
        Self::from_coefficients(space, DVector::zeros(dim))
    }

    /// Creates a function taking the same value at every node.
    ///
    /// The value is given by its components in row-major order.
    ///
    /// # Panics
    ///
    /// Panics if the number of components does not match the value shape of the space.
    pub fn constant(space: Arc<FunctionSpace<T>>, value: &[T]) -> Result<Self, SpaceError> {
        let k = space.element().value_shape().num_components();
        assert_eq!(value.len(), k, "Number of components must match value shape of space");
        let coefficients = DVector::from_fn(space.dim(), |i, _| value[i % k]);
        Self::from_coefficients(space, coefficients)
    }

    /// Interpolates a function given pointwise into the space by evaluating it at each node.
    ///
    /// The closure returns the components of the value at a point in row-major order.
    ///
    /// # Panics
    ///
    /// Panics if the closure returns a number of components that does not match the value shape
    /// of the space.
    pub fn interpolate<F>(space: Arc<FunctionSpace<T>>, f: F) -> Result<Self, SpaceError>
    where
        F: Fn(&DVector<T>) -> Vec<T>,
    {
        let k = space.element().value_shape().num_components();
        let mut coefficients = DVector::zeros(space.dim());
        for (node, x) in space.tabulate_node_coordinates().iter().enumerate() {
            let value = f(x);
            assert_eq!(value.len(), k, "Number of components must match value shape of space");
            coefficients
                .rows_mut(node * k, k)
                .copy_from_slice(&value);
        }
        Self::from_coefficients(space, coefficients)
    }

    /// The tensor value the function takes at the given node.
    ///
    /// Returns `None` if the node is out of bounds.
    pub fn node_value(&self, node: usize) -> Option<TensorValue<T>> {
        let space = self.function_space();
        if node >= space.num_nodes() {
            return None;
        }
        let coefficients = self.coefficients();
        let values: Vec<T> = if space.sub_spaces().is_empty() {
            vec![coefficients[space.dofs()[node]]]
        } else {
            space
                .sub_spaces()
                .iter()
                .map(|sub| coefficients[sub.dofs()[node]])
                .collect()
        };
        TensorValue::from_row_major(&self.value_shape(), &values)
    }
}

/// Borrowed view of the coefficients of an evaluated operand.
///
/// Numbers are passed through as scalars, so that kernels can broadcast them against arrays.
#[derive(Debug, Clone, Copy)]
pub enum Coefficients<'a, T: Scalar> {
    Array(&'a DVector<T>),
    Scalar(T),
}

/// The result of evaluating an expression: either a function or a number.
#[derive(Debug, Clone)]
pub enum Value<T: Scalar> {
    Function(Function<T>),
    Number(T),
}

impl<T: Scalar> Value<T> {
    pub fn as_function(&self) -> Option<&Function<T>> {
        match self {
            Value::Function(f) => Some(f),
            Value::Number(_) => None,
        }
    }

    pub fn into_function(self) -> Option<Function<T>> {
        match self {
            Value::Function(f) => Some(f),
            Value::Number(_) => None,
        }
    }

    pub fn as_number(&self) -> Option<T> {
        match self {
            Value::Function(_) => None,
            Value::Number(x) => Some(x.clone()),
        }
    }

    pub fn coefficients(&self) -> Coefficients<'_, T> {
        match self {
            Value::Function(f) => Coefficients::Array(f.coefficients()),
            Value::Number(x) => Coefficients::Scalar(x.clone()),
        }
    }
}

impl<T: Scalar> From<Function<T>> for Value<T> {
    fn from(f: Function<T>) -> Self {
        Value::Function(f)
    }
}
