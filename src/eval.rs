//! The expression interpreter.
//!
//! Terminals evaluate to themselves. An operation first has its operands evaluated, and is then
//! dispatched on its operator:
//!
//! - operators with a tensor kernel are applied node by node to the tensor values of the
//!   operands, and the result is stored in a new space whose value shape is the declared shape
//!   of the operation;
//! - operators with a same-space kernel are applied componentwise to the coefficient arrays of
//!   the operands, and the result is stored in the space shared by the operands.
use crate::element::Shape;
use crate::expr::{Expr, Operation, Operator};
use crate::function::{Function, Value};
use crate::kernels::{KernelApplyError, Rules, SameSpaceKernel, TensorKernel};
use crate::reconcile::{common_sub_element, make_space, space_of, TensorIndexMap};
use crate::space::SpaceError;
use crate::Real;
use itertools::izip;
use log::{debug, trace};
use nalgebra::DVector;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

#[derive(Debug)]
pub enum EvalError {
    /// Operands do not share one consistent element and mesh.
    InconsistentSpace { reason: String },
    /// Neither kernel table holds a kernel for the operator.
    UnsupportedOperator(Operator),
    /// No function space exists for values of rank 3 or higher.
    UnsupportedRank(Shape),
    /// An operation needs at least one function operand, or only function operands.
    NoFunctionOperand,
    /// The operation has a different number of operands than its operator takes.
    Arity {
        operator: Operator,
        expected: usize,
        actual: usize,
    },
    /// A tensor kernel produced a value of different shape than the operation declares.
    KernelShape { expected: Shape, actual: Shape },
    /// A numeric kernel failed.
    Kernel { operator: Operator, source: eyre::Report },
    Space(SpaceError),
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalError::InconsistentSpace { reason } => write!(f, "Inconsistent function spaces: {}.", reason),
            EvalError::UnsupportedOperator(op) => write!(f, "No kernel registered for operator {}.", op),
            EvalError::UnsupportedRank(shape) => {
                write!(f, "No function space for values of shape {} (rank 3 and higher).", shape)
            }
            EvalError::NoFunctionOperand => write!(f, "Operation has no function operand to take the space from."),
            EvalError::Arity {
                operator,
                expected,
                actual,
            } => write!(
                f,
                "Operator {} takes {} operands, got {}.",
                operator, expected, actual
            ),
            EvalError::KernelShape { expected, actual } => write!(
                f,
                "Kernel produced value of shape {}, expected shape {}.",
                actual, expected
            ),
            EvalError::Kernel { operator, source } => {
                write!(f, "Kernel for operator {} failed. Error: {}", operator, source)
            }
            EvalError::Space(err) => write!(f, "Function space error: {}", err),
        }
    }
}

impl Error for EvalError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            EvalError::Kernel { source, .. } => Some(&**source),
            EvalError::Space(err) => Some(err),
            _ => None,
        }
    }
}

impl From<SpaceError> for EvalError {
    fn from(err: SpaceError) -> Self {
        EvalError::Space(err)
    }
}

/// Evaluates expressions with a fixed set of kernel tables.
#[derive(Debug, Clone)]
pub struct Interpreter<T> {
    rules: Rules<T>,
}

impl<T: Real> Default for Interpreter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Real> Interpreter<T> {
    /// An interpreter with the standard kernel tables.
    pub fn new() -> Self {
        Self::with_rules(Rules::standard())
    }

    pub fn with_rules(rules: Rules<T>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &Rules<T> {
        &self.rules
    }

    /// Evaluates the expression to a function or a number.
    ///
    /// A terminal function evaluates to a handle to the very same function. Every operation
    /// in the tree allocates exactly one new function.
    pub fn evaluate(&self, expr: &Expr<T>) -> Result<Value<T>, EvalError> {
        match expr {
            Expr::Function(f) => Ok(Value::Function(f.clone())),
            Expr::Constant(x) => Ok(Value::Number(*x)),
            Expr::Operation(op) => self.evaluate_operation(op).map(Value::Function),
        }
    }

    fn evaluate_operation(&self, op: &Operation<T>) -> Result<Function<T>, EvalError> {
        let operator = op.operator();
        let num_operands = op.operands().len();
        trace!("Evaluating {} with {} operands", operator, num_operands);
        if let Some(expected) = operator.arity() {
            if expected != num_operands {
                return Err(EvalError::Arity {
                    operator,
                    expected,
                    actual: num_operands,
                });
            }
        }
        if let Some(kernel) = self.rules.tensor_kernel(operator) {
            self.evaluate_reshaped(op, kernel)
        } else if let Some(kernel) = self.rules.same_space_kernel(operator) {
            self.evaluate_same_space(op, kernel)
        } else {
            Err(EvalError::UnsupportedOperator(operator))
        }
    }

    fn evaluate_operands(&self, op: &Operation<T>) -> Result<Vec<Value<T>>, EvalError> {
        op.operands()
            .iter()
            .map(|operand| self.evaluate(operand))
            .collect()
    }

    fn evaluate_same_space(&self, op: &Operation<T>, kernel: SameSpaceKernel<T>) -> Result<Function<T>, EvalError> {
        let operator = op.operator();
        let args = self.evaluate_operands(op)?;
        let space = space_of(&args)?;

        let coefficients: Vec<_> = args.iter().map(Value::coefficients).collect();
        let result = kernel
            .apply(&coefficients)
            .map_err(|err| match err {
                KernelApplyError::Arity { expected, actual } => EvalError::Arity {
                    operator,
                    expected,
                    actual,
                },
                KernelApplyError::LengthMismatch { left, right } => EvalError::InconsistentSpace {
                    reason: format!("coefficient arrays of length {} and {}", left, right),
                },
                KernelApplyError::NoArrayOperand => EvalError::NoFunctionOperand,
            })?;

        debug!(
            "{} produced function in space {} with {} dofs",
            operator,
            space.element(),
            result.len()
        );
        Ok(Function::from_coefficients(space, result)?)
    }

    fn evaluate_reshaped(&self, op: &Operation<T>, kernel: TensorKernel<T>) -> Result<Function<T>, EvalError> {
        let operator = op.operator();
        let args = self.evaluate_operands(op)?;
        let functions = args
            .iter()
            .map(|arg| arg.as_function().ok_or(EvalError::NoFunctionOperand))
            .collect::<Result<Vec<_>, _>>()?;

        let (sub_element, mesh) = common_sub_element(functions.iter().map(|f| f.function_space().as_ref()))?;

        let operand_maps = functions
            .iter()
            .map(|f| TensorIndexMap::new(f.function_space(), &f.value_shape()))
            .collect::<Result<Vec<_>, _>>()?;
        let num_nodes = operand_maps
            .first()
            .map(TensorIndexMap::num_nodes)
            .unwrap_or(0);
        if operand_maps.iter().any(|map| map.num_nodes() != num_nodes) {
            return Err(EvalError::InconsistentSpace {
                reason: format!("operands of {} have different numbers of nodes", operator),
            });
        }

        let result_space = Arc::new(make_space(sub_element, op.shape(), mesh)?);
        let result_map = TensorIndexMap::new(&result_space, op.shape())?;
        debug_assert_eq!(result_map.num_nodes(), num_nodes);

        let mut coefficients = DVector::zeros(result_space.dim());
        let mut values = Vec::with_capacity(functions.len());
        for node in 0..num_nodes {
            values.clear();
            for (map, f) in izip!(&operand_maps, &functions) {
                values.push(map.gather(f.coefficients(), node)?);
            }
            let value = kernel(&values).map_err(|source| EvalError::Kernel { operator, source })?;
            result_map.scatter(&mut coefficients, node, &value)?;
        }

        debug!(
            "{} produced function in space {} with {} dofs",
            operator,
            result_space.element(),
            coefficients.len()
        );
        Ok(Function::from_coefficients(result_space, coefficients)?)
    }
}

/// Evaluates the expression with the standard kernel tables.
pub fn evaluate<T: Real>(expr: &Expr<T>) -> Result<Value<T>, EvalError> {
    Interpreter::new().evaluate(expr)
}
