use fecalc::mesh::procedural::{
    create_rectangular_uniform_quad_mesh_2d, create_unit_interval_mesh_1d, create_unit_square_uniform_quad_mesh_2d,
    create_unit_square_uniform_tri_mesh_2d,
};
use fecalc::mesh::{CellType, Mesh, MeshError};
use matrixcompare::assert_matrix_eq;
use nalgebra::{DVector, Vector2};

fn v2(x: f64, y: f64) -> DVector<f64> {
    DVector::from_column_slice(&[x, y])
}

#[test]
fn mesh_from_vertices_and_connectivity_validates_input() {
    let vertices = vec![v2(0.0, 0.0), v2(1.0, 0.0), v2(0.0, 1.0)];

    let err = Mesh::from_vertices_and_connectivity(CellType::Triangle, vertices.clone(), vec![0, 1]).unwrap_err();
    assert_eq!(
        err,
        MeshError::InvalidConnectivityLength {
            len: 2,
            vertices_per_cell: 3
        }
    );

    let err = Mesh::from_vertices_and_connectivity(CellType::Triangle, vertices.clone(), vec![0, 1, 2, 0, 2, 3])
        .unwrap_err();
    assert_eq!(
        err,
        MeshError::IndexOutOfBounds {
            cell: 1,
            index: 3,
            num_vertices: 3
        }
    );

    let mut bad_vertices = vertices.clone();
    bad_vertices.push(DVector::zeros(3));
    let err = Mesh::from_vertices_and_connectivity(CellType::Triangle, bad_vertices, vec![0, 1, 2]).unwrap_err();
    assert_eq!(
        err,
        MeshError::InconsistentVertexDimension {
            vertex: 3,
            dim: 3,
            expected: 2
        }
    );

    let mesh = Mesh::from_vertices_and_connectivity(CellType::Triangle, vertices, vec![0, 1, 2]).unwrap();
    assert_eq!(mesh.num_cells(), 1);
    assert_eq!(mesh.geometry_dim(), 2);
    assert_eq!(mesh.cell_vertices(0), &[0, 1, 2]);
}

#[test]
fn meshes_have_distinct_identities() {
    let a: Mesh<f64> = create_unit_square_uniform_tri_mesh_2d(2);
    let b: Mesh<f64> = create_unit_square_uniform_tri_mesh_2d(2);
    assert_ne!(a.id(), b.id());
    // Same geometry, but a different mesh
    assert_eq!(a.vertices(), b.vertices());

    let a_clone = a.clone();
    assert_eq!(a.id(), a_clone.id());
}

#[test]
fn procedural_unit_square_meshes_have_expected_sizes() {
    let quads: Mesh<f64> = create_unit_square_uniform_quad_mesh_2d(2);
    assert_eq!(quads.cell_type(), CellType::Quadrilateral);
    assert_eq!(quads.vertices().len(), 9);
    assert_eq!(quads.num_cells(), 4);

    let triangles: Mesh<f64> = create_unit_square_uniform_tri_mesh_2d(2);
    assert_eq!(triangles.cell_type(), CellType::Triangle);
    assert_eq!(triangles.vertices().len(), 9);
    assert_eq!(triangles.num_cells(), 8);
    assert_eq!(triangles.cell_vertex_iter().count(), 8);

    let empty: Mesh<f64> = create_rectangular_uniform_quad_mesh_2d(1.0, 0, 1, 1, &Vector2::new(0.0, 1.0));
    assert_eq!(empty.num_cells(), 0);
    assert_eq!(empty.geometry_dim(), 2);
}

#[test]
fn procedural_unit_interval_mesh() {
    let mesh: Mesh<f64> = create_unit_interval_mesh_1d(4);
    assert_eq!(mesh.cell_type(), CellType::Interval);
    assert_eq!(mesh.num_cells(), 4);
    assert_eq!(mesh.vertices().len(), 5);
    assert_eq!(mesh.cell_vertices(3), &[3, 4]);
    assert_matrix_eq!(mesh.vertices()[4], DVector::from_element(1, 1.0), comp = abs, tol = 1e-14);
}

#[test]
fn cell_centroid_of_unit_quad() {
    let mesh: Mesh<f64> = create_unit_square_uniform_quad_mesh_2d(1);
    assert_eq!(mesh.num_cells(), 1);
    assert_matrix_eq!(mesh.cell_centroid(0), v2(0.5, 0.5), comp = abs, tol = 1e-14);

    let triangles: Mesh<f64> = create_unit_square_uniform_tri_mesh_2d(1);
    let sum = triangles.cell_centroid(0) + triangles.cell_centroid(1);
    // Both triangles split the unit square along one diagonal, so their centroids are symmetric about its center
    assert_matrix_eq!(sum, v2(1.0, 1.0), comp = abs, tol = 1e-14);
}
