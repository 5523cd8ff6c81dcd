//! Basic procedural mesh generation routines.
use crate::mesh::{CellType, Mesh};
use crate::Real;
use nalgebra::{DVector, Vector2};

pub fn create_unit_square_uniform_quad_mesh_2d<T>(cells_per_dim: usize) -> Mesh<T>
where
    T: Real,
{
    create_rectangular_uniform_quad_mesh_2d(T::one(), 1, 1, cells_per_dim, &Vector2::new(T::zero(), T::one()))
}

pub fn create_unit_square_uniform_tri_mesh_2d<T>(cells_per_dim: usize) -> Mesh<T>
where
    T: Real,
{
    let quad_mesh = create_unit_square_uniform_quad_mesh_2d(cells_per_dim);
    split_quads_into_triangles(&quad_mesh)
}

/// Generates a uniform mesh of the unit interval with the given number of cells.
pub fn create_unit_interval_mesh_1d<T>(num_cells: usize) -> Mesh<T>
where
    T: Real,
{
    if num_cells == 0 {
        return empty_mesh(CellType::Interval);
    }

    let h = T::one() / T::from_usize(num_cells).expect("Must be able to fit usize in T");
    let vertices = (0..=num_cells)
        .map(|i| {
            let i_as_t = T::from_usize(i).expect("Must be able to fit usize in T");
            DVector::from_element(1, i_as_t * h)
        })
        .collect();
    let connectivity = (0..num_cells).flat_map(|i| [i, i + 1]).collect();

    Mesh::from_vertices_and_connectivity(CellType::Interval, vertices, connectivity)
        .expect("Interval connectivity is valid by construction")
}

/// Generates an axis-aligned rectangular uniform mesh given a unit length,
/// dimensions as multipliers of the unit length and the number of cells per unit length.
pub fn create_rectangular_uniform_quad_mesh_2d<T>(
    unit_length: T,
    units_x: usize,
    units_y: usize,
    cells_per_unit: usize,
    top_left: &Vector2<T>,
) -> Mesh<T>
where
    T: Real,
{
    if cells_per_unit == 0 || units_x == 0 || units_y == 0 {
        return empty_mesh(CellType::Quadrilateral);
    }

    let mut vertices = Vec::new();
    let mut connectivity = Vec::new();

    let cell_size = unit_length / T::from_usize(cells_per_unit).expect("Must be able to fit usize in T");
    let num_cells_x = units_x * cells_per_unit;
    let num_cells_y = units_y * cells_per_unit;
    let num_vertices_x = num_cells_x + 1;
    let num_vertices_y = num_cells_y + 1;

    let to_global_vertex_index = |i, j| (num_cells_x + 1) * j + i;

    for j in 0..num_vertices_y {
        for i in 0..num_vertices_x {
            let i_as_t = T::from_usize(i).expect("Must be able to fit usize in T");
            let j_as_t = T::from_usize(j).expect("Must be able to fit usize in T");
            let v = top_left + Vector2::new(i_as_t, -j_as_t) * cell_size;
            vertices.push(DVector::from_column_slice(v.as_slice()));
        }
    }

    for j in 0..num_cells_y {
        for i in 0..num_cells_x {
            connectivity.extend_from_slice(&[
                to_global_vertex_index(i, j + 1),
                to_global_vertex_index(i + 1, j + 1),
                to_global_vertex_index(i + 1, j),
                to_global_vertex_index(i, j),
            ]);
        }
    }

    Mesh::from_vertices_and_connectivity(CellType::Quadrilateral, vertices, connectivity)
        .expect("Quad connectivity is valid by construction")
}

/// Splits every quadrilateral `[a, b, c, d]` into the triangles `[a, b, c]` and `[a, c, d]`.
///
/// # Panics
///
/// Panics if the mesh does not consist of quadrilaterals.
fn split_quads_into_triangles<T>(mesh: &Mesh<T>) -> Mesh<T>
where
    T: Real,
{
    assert_eq!(mesh.cell_type(), CellType::Quadrilateral);
    let connectivity = mesh
        .cell_vertex_iter()
        .flat_map(|quad| [quad[0], quad[1], quad[2], quad[0], quad[2], quad[3]])
        .collect();
    Mesh::from_vertices_and_connectivity(CellType::Triangle, mesh.vertices().to_vec(), connectivity)
        .expect("Splitting valid quads produces valid triangles")
}

fn empty_mesh<T: Real>(cell_type: CellType) -> Mesh<T> {
    Mesh::from_vertices_and_connectivity(cell_type, Vec::new(), Vec::new())
        .expect("Empty mesh is always valid")
}
