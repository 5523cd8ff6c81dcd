use nalgebra::{DVector, Scalar};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::Real;

pub mod procedural;

/// The reference cell shared by all cells of a mesh.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellType {
    Interval,
    Triangle,
    Quadrilateral,
    Tetrahedron,
    Hexahedron,
}

impl CellType {
    pub fn num_vertices(&self) -> usize {
        match self {
            CellType::Interval => 2,
            CellType::Triangle => 3,
            CellType::Quadrilateral => 4,
            CellType::Tetrahedron => 4,
            CellType::Hexahedron => 8,
        }
    }

    pub fn reference_dim(&self) -> usize {
        match self {
            CellType::Interval => 1,
            CellType::Triangle | CellType::Quadrilateral => 2,
            CellType::Tetrahedron | CellType::Hexahedron => 3,
        }
    }
}

impl fmt::Display for CellType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CellType::Interval => "interval",
            CellType::Triangle => "triangle",
            CellType::Quadrilateral => "quadrilateral",
            CellType::Tetrahedron => "tetrahedron",
            CellType::Hexahedron => "hexahedron",
        };
        write!(f, "{}", name)
    }
}

/// Process-unique identity of a mesh.
///
/// Every mesh constructed through [`Mesh::from_vertices_and_connectivity`] receives a fresh
/// identity. Clones of a mesh share the identity of the original.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshId(usize);

impl MeshId {
    fn next() -> Self {
        static NEXT_MESH_ID: AtomicUsize = AtomicUsize::new(0);
        Self(NEXT_MESH_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for MeshId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MeshError {
    /// The flat connectivity does not describe a whole number of cells.
    InvalidConnectivityLength { len: usize, vertices_per_cell: usize },
    /// A cell references a vertex which does not exist.
    IndexOutOfBounds { cell: usize, index: usize, num_vertices: usize },
    /// Vertex `vertex` does not have the same dimension as the first vertex.
    InconsistentVertexDimension { vertex: usize, dim: usize, expected: usize },
}

impl fmt::Display for MeshError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeshError::InvalidConnectivityLength { len, vertices_per_cell } => write!(
                f,
                "Connectivity of length {} is not a multiple of {} vertices per cell.",
                len, vertices_per_cell
            ),
            MeshError::IndexOutOfBounds { cell, index, num_vertices } => write!(
                f,
                "Cell {} references vertex {}, but the mesh only has {} vertices.",
                cell, index, num_vertices
            ),
            MeshError::InconsistentVertexDimension { vertex, dim, expected } => write!(
                f,
                "Vertex {} has dimension {}, expected {}.",
                vertex, dim, expected
            ),
        }
    }
}

impl Error for MeshError {}

/// Index-based mesh made of cells of a single type.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh<T: Scalar> {
    id: MeshId,
    cell_type: CellType,
    vertices: Vec<DVector<T>>,
    connectivity: Vec<usize>,
}

impl<T: Scalar> Mesh<T> {
    /// Construct a mesh from vertices and a flat cell connectivity.
    ///
    /// Cell `i` is made of the vertices with indices
    /// `connectivity[i * k .. (i + 1) * k]`, where `k = cell_type.num_vertices()`.
    /// The connectivity is always checked, since the rest of the crate indexes vertices
    /// through it.
    pub fn from_vertices_and_connectivity(
        cell_type: CellType,
        vertices: Vec<DVector<T>>,
        connectivity: Vec<usize>,
    ) -> Result<Self, MeshError> {
        let k = cell_type.num_vertices();
        if connectivity.len() % k != 0 {
            return Err(MeshError::InvalidConnectivityLength {
                len: connectivity.len(),
                vertices_per_cell: k,
            });
        }

        if let Some(first) = vertices.first() {
            let expected = first.len();
            if let Some((vertex, v)) = vertices
                .iter()
                .enumerate()
                .find(|(_, v)| v.len() != expected)
            {
                return Err(MeshError::InconsistentVertexDimension {
                    vertex,
                    dim: v.len(),
                    expected,
                });
            }
        }

        if let Some((position, &index)) = connectivity
            .iter()
            .enumerate()
            .find(|&(_, &index)| index >= vertices.len())
        {
            return Err(MeshError::IndexOutOfBounds {
                cell: position / k,
                index,
                num_vertices: vertices.len(),
            });
        }

        Ok(Self {
            id: MeshId::next(),
            cell_type,
            vertices,
            connectivity,
        })
    }

    pub fn id(&self) -> MeshId {
        self.id
    }

    pub fn cell_type(&self) -> CellType {
        self.cell_type
    }

    pub fn vertices(&self) -> &[DVector<T>] {
        &self.vertices
    }

    /// The dimension of the space the vertices live in.
    ///
    /// An empty mesh reports the reference dimension of its cell type.
    pub fn geometry_dim(&self) -> usize {
        self.vertices
            .first()
            .map(|v| v.len())
            .unwrap_or_else(|| self.cell_type.reference_dim())
    }

    pub fn num_cells(&self) -> usize {
        self.connectivity.len() / self.cell_type.num_vertices()
    }

    /// Vertex indices of the given cell.
    ///
    /// # Panics
    ///
    /// Panics if the cell index is out of bounds.
    pub fn cell_vertices(&self, cell_index: usize) -> &[usize] {
        let k = self.cell_type.num_vertices();
        &self.connectivity[k * cell_index..k * (cell_index + 1)]
    }

    pub fn cell_vertex_iter(&self) -> impl '_ + Iterator<Item = &[usize]> {
        self.connectivity
            .chunks_exact(self.cell_type.num_vertices())
    }
}

impl<T: Real> Mesh<T> {
    /// The arithmetic mean of the vertices of the given cell.
    ///
    /// # Panics
    ///
    /// Panics if the cell index is out of bounds.
    pub fn cell_centroid(&self, cell_index: usize) -> DVector<T> {
        let cell = self.cell_vertices(cell_index);
        let mut centroid = DVector::zeros(self.geometry_dim());
        for &v in cell {
            centroid += &self.vertices[v];
        }
        let n = T::from_usize(cell.len()).expect("Must be able to fit usize in T");
        centroid / n
    }
}
