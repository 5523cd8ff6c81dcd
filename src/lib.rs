//! Evaluation of finite element operator expressions by direct manipulation of coefficient arrays.
//!
//! Many common operators act identically on the local value held by each degree of freedom.
//! Given an expression tree such as `tr(sym(u) + skew(u))`, where `u` is a finite element function,
//! the [`eval`] module produces a new [`Function`](function::Function) whose coefficients are obtained
//! by applying the corresponding numeric kernel to the coefficients of the operands, without
//! performing any assembly.
use nalgebra::RealField;

pub mod element;
pub mod eval;
pub mod expr;
pub mod function;
pub mod kernels;
pub mod mesh;
pub mod reconcile;
pub mod space;

#[cfg(feature = "proptest")]
pub mod proptest;

pub extern crate nalgebra;

pub use eval::{evaluate, EvalError, Interpreter};
pub use expr::{Expr, Operation, Operator};
pub use function::{Function, Value};

/// Real scalar type used throughout `fecalc`.
///
/// Used as a trait alias for the traits needed by generic `fecalc` routines.
pub trait Real: RealField + Copy {}

impl<T: RealField + Copy> Real for T {}
