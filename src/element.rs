//! Descriptions of finite elements and the value shapes of the functions built on them.
use crate::mesh::CellType;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementFamily {
    /// Continuous Lagrange elements ("CG").
    Lagrange,
    /// Discontinuous Lagrange elements ("DG").
    DiscontinuousLagrange,
}

/// A scalar-valued finite element, identified by its family, polynomial degree and cell.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScalarElement {
    pub family: ElementFamily,
    pub degree: usize,
    pub cell: CellType,
}

impl ScalarElement {
    pub fn new(family: ElementFamily, degree: usize, cell: CellType) -> Self {
        Self { family, degree, cell }
    }

    pub fn lagrange(cell: CellType, degree: usize) -> Self {
        Self::new(ElementFamily::Lagrange, degree, cell)
    }

    pub fn discontinuous_lagrange(cell: CellType, degree: usize) -> Self {
        Self::new(ElementFamily::DiscontinuousLagrange, degree, cell)
    }
}

impl fmt::Display for ScalarElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let family = match self.family {
            ElementFamily::Lagrange => "CG",
            ElementFamily::DiscontinuousLagrange => "DG",
        };
        write!(f, "{}{}({})", family, self.degree, self.cell)
    }
}

/// The shape of the value a function takes at a point.
///
/// A scalar has the empty shape, a vector of length `n` has shape `[n]` and an `r x c` matrix
/// has shape `[r, c]`. Shapes of higher rank can be expressed, but no function space holds them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Shape(Vec<usize>);

impl Shape {
    pub fn new(dims: impl Into<Vec<usize>>) -> Self {
        Self(dims.into())
    }

    pub fn scalar() -> Self {
        Self(Vec::new())
    }

    pub fn vector(n: usize) -> Self {
        Self(vec![n])
    }

    pub fn matrix(rows: usize, cols: usize) -> Self {
        Self(vec![rows, cols])
    }

    pub fn rank(&self) -> usize {
        self.0.len()
    }

    pub fn dims(&self) -> &[usize] {
        &self.0
    }

    pub fn is_scalar(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_square(&self) -> bool {
        matches!(self.0.as_slice(), &[r, c] if r == c)
    }

    /// The number of scalar components of a value with this shape.
    pub fn num_components(&self) -> usize {
        self.0.iter().product()
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, d) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", d)?;
        }
        write!(f, ")")
    }
}

/// Element description of a function space.
///
/// Vector and tensor elements are built from a single scalar element, repeated once per
/// component.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FiniteElement {
    Scalar(ScalarElement),
    Vector { sub: ScalarElement, dim: usize },
    Tensor { sub: ScalarElement, shape: [usize; 2] },
}

impl From<ScalarElement> for FiniteElement {
    fn from(element: ScalarElement) -> Self {
        FiniteElement::Scalar(element)
    }
}

impl FiniteElement {
    pub fn vector(sub: ScalarElement, dim: usize) -> Self {
        FiniteElement::Vector { sub, dim }
    }

    pub fn tensor(sub: ScalarElement, shape: [usize; 2]) -> Self {
        FiniteElement::Tensor { sub, shape }
    }

    pub fn value_shape(&self) -> Shape {
        match self {
            FiniteElement::Scalar(_) => Shape::scalar(),
            FiniteElement::Vector { dim, .. } => Shape::vector(*dim),
            FiniteElement::Tensor { shape: [r, c], .. } => Shape::matrix(*r, *c),
        }
    }

    /// The scalar element every component is discretized with.
    pub fn scalar_element(&self) -> ScalarElement {
        match self {
            FiniteElement::Scalar(element) => *element,
            FiniteElement::Vector { sub, .. } | FiniteElement::Tensor { sub, .. } => *sub,
        }
    }

    /// The number of sub-elements, which is zero for scalar elements.
    pub fn num_sub_elements(&self) -> usize {
        match self {
            FiniteElement::Scalar(_) => 0,
            _ => self.value_shape().num_components(),
        }
    }

    pub fn sub_elements(&self) -> Vec<ScalarElement> {
        vec![self.scalar_element(); self.num_sub_elements()]
    }

    pub fn cell(&self) -> CellType {
        self.scalar_element().cell
    }
}

impl fmt::Display for FiniteElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FiniteElement::Scalar(element) => write!(f, "{}", element),
            FiniteElement::Vector { sub, dim } => write!(f, "Vector({}, {})", sub, dim),
            FiniteElement::Tensor { sub, shape: [r, c] } => write!(f, "Tensor({}, ({}, {}))", sub, r, c),
        }
    }
}
