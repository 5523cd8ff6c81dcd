//! Function spaces over a mesh and their degree-of-freedom layout.
//!
//! Each scalar element places a number of *nodes* on the mesh. A scalar space has one
//! degree of freedom per node. A vector or tensor space with `k` components stores its
//! degrees of freedom interleaved, so that the value of component `c` at node `n` is found at
//! global index `n * k + c`, with components of a tensor flattened in row-major order.
//! Each component forms a sub-space whose dof list picks out that component for every node.
use crate::element::{ElementFamily, FiniteElement, ScalarElement};
use crate::mesh::{CellType, Mesh};
use crate::Real;
use nalgebra::{DVector, Scalar};
use std::error::Error;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpaceError {
    /// The element is defined on a different cell type than the mesh.
    CellMismatch { element: CellType, mesh: CellType },
    /// No degree-of-freedom layout is available for this element.
    UnsupportedElement(ScalarElement),
    /// A vector or tensor element without components.
    NoComponents(FiniteElement),
    /// A coefficient vector does not match the dimension of its space.
    CoefficientLength { expected: usize, actual: usize },
    /// Functions can only be created on whole spaces, not on component sub-spaces.
    SubSpace,
}

impl fmt::Display for SpaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpaceError::CellMismatch { element, mesh } => {
                write!(f, "Element defined on {} cells, but mesh consists of {} cells.", element, mesh)
            }
            SpaceError::UnsupportedElement(element) => {
                write!(f, "No degree-of-freedom layout for element {}.", element)
            }
            SpaceError::NoComponents(element) => {
                write!(f, "Element {} has no components.", element)
            }
            SpaceError::CoefficientLength { expected, actual } => write!(
                f,
                "Expected {} coefficients, got {}.",
                expected, actual
            ),
            SpaceError::SubSpace => write!(f, "Cannot create a function on a sub-space."),
        }
    }
}

impl Error for SpaceError {}

/// A finite element space, identified by its element and the identity of its mesh.
#[derive(Debug, Clone)]
pub struct FunctionSpace<T: Scalar> {
    mesh: Arc<Mesh<T>>,
    element: FiniteElement,
    dim: usize,
    dofs: Vec<usize>,
    sub_spaces: Vec<FunctionSpace<T>>,
    is_sub_space: bool,
}

/// Two spaces are equal if they are built from equal elements on the same mesh.
impl<T: Scalar> PartialEq for FunctionSpace<T> {
    fn eq(&self, other: &Self) -> bool {
        self.is_compatible(other)
    }
}

impl<T: Scalar> FunctionSpace<T> {
    pub fn new(mesh: Arc<Mesh<T>>, element: impl Into<FiniteElement>) -> Result<Self, SpaceError> {
        let element = element.into();
        let sub = element.scalar_element();
        if sub.cell != mesh.cell_type() {
            return Err(SpaceError::CellMismatch {
                element: sub.cell,
                mesh: mesh.cell_type(),
            });
        }

        let num_nodes = num_scalar_nodes(&mesh, &sub)?;
        let num_components = element.num_sub_elements();

        if num_components == 0 {
            if let FiniteElement::Scalar(_) = element {
                let dofs = (0..num_nodes).collect();
                return Ok(Self {
                    mesh,
                    element,
                    dim: num_nodes,
                    dofs,
                    sub_spaces: Vec::new(),
                    is_sub_space: false,
                });
            }
            return Err(SpaceError::NoComponents(element));
        }

        let dim = num_nodes * num_components;
        let sub_spaces = (0..num_components)
            .map(|component| FunctionSpace {
                mesh: Arc::clone(&mesh),
                element: FiniteElement::Scalar(sub),
                dim,
                dofs: (0..num_nodes)
                    .map(|node| node * num_components + component)
                    .collect(),
                sub_spaces: Vec::new(),
                is_sub_space: true,
            })
            .collect();

        Ok(Self {
            mesh,
            element,
            dim,
            dofs: (0..dim).collect(),
            sub_spaces,
            is_sub_space: false,
        })
    }

    pub fn mesh(&self) -> &Arc<Mesh<T>> {
        &self.mesh
    }

    pub fn element(&self) -> &FiniteElement {
        &self.element
    }

    /// The total number of degrees of freedom in the (parent) space.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Global degree-of-freedom indices owned by this space, in node order.
    pub fn dofs(&self) -> &[usize] {
        &self.dofs
    }

    pub fn num_sub_spaces(&self) -> usize {
        self.sub_spaces.len()
    }

    pub fn sub(&self, component: usize) -> Option<&FunctionSpace<T>> {
        self.sub_spaces.get(component)
    }

    pub fn sub_spaces(&self) -> &[FunctionSpace<T>] {
        &self.sub_spaces
    }

    pub fn is_sub_space(&self) -> bool {
        self.is_sub_space
    }

    /// The number of nodes of the underlying scalar element.
    pub fn num_nodes(&self) -> usize {
        self.dofs.len() / self.num_sub_spaces().max(1)
    }

    /// Whether the two spaces share element and mesh identity.
    pub fn is_compatible(&self, other: &Self) -> bool {
        self.element == other.element && self.mesh.id() == other.mesh.id()
    }
}

impl<T: Real> FunctionSpace<T> {
    /// Coordinates of the nodes of the scalar element, in node order.
    pub fn tabulate_node_coordinates(&self) -> Vec<DVector<T>> {
        let mesh = &self.mesh;
        let sub = self.element.scalar_element();
        match (sub.family, sub.degree) {
            (ElementFamily::DiscontinuousLagrange, 0) => (0..mesh.num_cells())
                .map(|cell| mesh.cell_centroid(cell))
                .collect(),
            (ElementFamily::DiscontinuousLagrange, _) => mesh
                .cell_vertex_iter()
                .flatten()
                .map(|&v| mesh.vertices()[v].clone())
                .collect(),
            _ => mesh.vertices().to_vec(),
        }
    }
}

fn num_scalar_nodes<T: Scalar>(mesh: &Mesh<T>, element: &ScalarElement) -> Result<usize, SpaceError> {
    match (element.family, element.degree) {
        (ElementFamily::Lagrange, 1) => Ok(mesh.vertices().len()),
        (ElementFamily::DiscontinuousLagrange, 0) => Ok(mesh.num_cells()),
        (ElementFamily::DiscontinuousLagrange, 1) => Ok(mesh.num_cells() * mesh.cell_type().num_vertices()),
        _ => Err(SpaceError::UnsupportedElement(*element)),
    }
}
