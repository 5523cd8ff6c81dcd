//! Reconciliation of the function spaces of operands and results.
//!
//! Before a kernel can be applied, the interpreter must know which space holds its operands,
//! which space must hold its result, and how the flat coefficient array of each function
//! splits into one tensor value per node. The latter is captured by [`TensorIndexMap`].
use crate::element::{FiniteElement, ScalarElement, Shape};
use crate::eval::EvalError;
use crate::function::Value;
use crate::kernels::TensorValue;
use crate::mesh::Mesh;
use crate::space::FunctionSpace;
use crate::Real;
use itertools::izip;
use log::debug;
use nalgebra::{DVector, Scalar};
use std::sync::Arc;

/// The single space shared by all functions among the given values.
///
/// Numbers are ignored. The space of the first function is used as reference and
/// returned.
pub fn space_of<'a, T, I>(values: I) -> Result<Arc<FunctionSpace<T>>, EvalError>
where
    T: Scalar,
    I: IntoIterator<Item = &'a Value<T>>,
{
    let mut reference: Option<&Arc<FunctionSpace<T>>> = None;
    for f in values.into_iter().filter_map(Value::as_function) {
        let space = f.function_space();
        if let Some(reference) = reference {
            if !reference.is_compatible(space) {
                return Err(EvalError::InconsistentSpace {
                    reason: format!(
                        "operand in space {} on mesh {} does not match space {} on mesh {}",
                        space.element(),
                        space.mesh().id(),
                        reference.element(),
                        reference.mesh().id()
                    ),
                });
            }
        } else {
            reference = Some(space);
        }
    }
    reference.cloned().ok_or(EvalError::NoFunctionOperand)
}

/// The scalar element and mesh shared by the given spaces.
///
/// A space without sub-spaces contributes its own element. A space with sub-spaces must have
/// the same element in every sub-space, which is then contributed.
pub fn common_sub_element<'a, T, I>(spaces: I) -> Result<(ScalarElement, Arc<Mesh<T>>), EvalError>
where
    T: Scalar,
    I: IntoIterator<Item = &'a FunctionSpace<T>>,
{
    let mut common: Option<(ScalarElement, &Arc<Mesh<T>>)> = None;
    for space in spaces {
        let element = sub_element_of(space)?;
        match common {
            None => common = Some((element, space.mesh())),
            Some((common_element, mesh)) => {
                if common_element != element {
                    return Err(EvalError::InconsistentSpace {
                        reason: format!(
                            "sub-element {} does not match sub-element {}",
                            element, common_element
                        ),
                    });
                }
                if mesh.id() != space.mesh().id() {
                    return Err(EvalError::InconsistentSpace {
                        reason: format!("mesh {} does not match mesh {}", space.mesh().id(), mesh.id()),
                    });
                }
            }
        }
    }
    common
        .map(|(element, mesh)| (element, Arc::clone(mesh)))
        .ok_or(EvalError::NoFunctionOperand)
}

fn sub_element_of<T: Scalar>(space: &FunctionSpace<T>) -> Result<ScalarElement, EvalError> {
    match (space.element(), space.sub_spaces()) {
        (FiniteElement::Scalar(element), []) => Ok(*element),
        (_, []) => Err(EvalError::InconsistentSpace {
            reason: format!("space {} has no sub-spaces", space.element()),
        }),
        (_, [first, rest @ ..]) => {
            let element = first.element();
            if rest.iter().any(|sub| sub.element() != element) {
                return Err(EvalError::InconsistentSpace {
                    reason: format!("sub-spaces of {} do not share one element", space.element()),
                });
            }
            Ok(element.scalar_element())
        }
    }
}

/// The space over `mesh` holding values of the given shape, discretized with `sub_element`.
pub fn make_space<T: Scalar>(
    sub_element: ScalarElement,
    shape: &Shape,
    mesh: Arc<Mesh<T>>,
) -> Result<FunctionSpace<T>, EvalError> {
    let element = match shape.dims() {
        [] => FiniteElement::Scalar(sub_element),
        [n] => FiniteElement::vector(sub_element, *n),
        [r, c] => FiniteElement::tensor(sub_element, [*r, *c]),
        _ => return Err(EvalError::UnsupportedRank(shape.clone())),
    };
    debug!("Constructing space {} on mesh {}", element, mesh.id());
    Ok(FunctionSpace::new(mesh, element)?)
}

/// Maps every node of a space to the coefficient indices holding the components of the
/// tensor value at that node.
///
/// Row `n` of the map holds one index per component, in row-major order, so that gathering
/// the coefficients at these indices and reshaping them gives the tensor value at node `n`.
/// For a scalar space the rows have length one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TensorIndexMap {
    shape: Shape,
    num_components: usize,
    indices: Vec<usize>,
}

impl TensorIndexMap {
    /// Builds the map for values of the given shape in the given space.
    ///
    /// A space with sub-spaces needs a vector or matrix shape with one component per sub-space,
    /// while a space without sub-spaces needs a scalar shape.
    pub fn new<T: Scalar>(space: &FunctionSpace<T>, shape: &Shape) -> Result<Self, EvalError> {
        if shape.rank() > 2 {
            return Err(EvalError::UnsupportedRank(shape.clone()));
        }

        let subs = space.sub_spaces();
        if subs.is_empty() {
            if !shape.is_scalar() {
                return Err(EvalError::InconsistentSpace {
                    reason: format!("scalar space {} can not hold values of shape {}", space.element(), shape),
                });
            }
            return Ok(Self {
                shape: shape.clone(),
                num_components: 1,
                indices: space.dofs().to_vec(),
            });
        }

        if shape.is_scalar() || shape.num_components() != subs.len() {
            return Err(EvalError::InconsistentSpace {
                reason: format!(
                    "space with {} sub-spaces can not hold values of shape {}",
                    subs.len(),
                    shape
                ),
            });
        }

        let num_nodes = subs[0].dofs().len();
        if subs.iter().any(|sub| sub.dofs().len() != num_nodes) {
            return Err(EvalError::InconsistentSpace {
                reason: format!("sub-spaces of {} differ in size", space.element()),
            });
        }

        let indices = (0..num_nodes)
            .flat_map(|node| subs.iter().map(move |sub| sub.dofs()[node]))
            .collect();

        Ok(Self {
            shape: shape.clone(),
            num_components: subs.len(),
            indices,
        })
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn num_components(&self) -> usize {
        self.num_components
    }

    pub fn num_nodes(&self) -> usize {
        self.indices.len() / self.num_components
    }

    /// Coefficient indices of the components at the given node.
    ///
    /// # Panics
    ///
    /// Panics if the node is out of bounds.
    pub fn node_indices(&self, node: usize) -> &[usize] {
        let k = self.num_components;
        &self.indices[k * node..k * (node + 1)]
    }

    /// The tensor value at the given node.
    ///
    /// # Panics
    ///
    /// Panics if the node or any of its indices are out of bounds.
    pub fn gather<T: Scalar>(&self, coefficients: &DVector<T>, node: usize) -> Result<TensorValue<T>, EvalError> {
        let values: Vec<T> = self
            .node_indices(node)
            .iter()
            .map(|&i| coefficients[i].clone())
            .collect();
        TensorValue::from_row_major(&self.shape, &values).ok_or_else(|| EvalError::UnsupportedRank(self.shape.clone()))
    }

    /// Writes the tensor value into the coefficients at the given node.
    ///
    /// # Panics
    ///
    /// Panics if the node or any of its indices are out of bounds.
    pub fn scatter<T: Real>(
        &self,
        coefficients: &mut DVector<T>,
        node: usize,
        value: &TensorValue<T>,
    ) -> Result<(), EvalError> {
        let value_shape = value.shape();
        if value_shape != self.shape {
            return Err(EvalError::KernelShape {
                expected: self.shape.clone(),
                actual: value_shape,
            });
        }
        let mut components = vec![T::zero(); self.num_components];
        value.write_row_major(&mut components);
        for (&i, x) in izip!(self.node_indices(node), components) {
            coefficients[i] = x;
        }
        Ok(())
    }
}
