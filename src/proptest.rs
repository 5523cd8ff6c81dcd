//! Strategies for generating meshes, spaces and functions with `proptest`.
use crate::element::{FiniteElement, ScalarElement};
use crate::function::Function;
use crate::mesh::procedural::{create_unit_square_uniform_quad_mesh_2d, create_unit_square_uniform_tri_mesh_2d};
use crate::mesh::{CellType, Mesh};
use crate::space::FunctionSpace;
use ::proptest::collection::vec;
use ::proptest::prelude::*;
use nalgebra::DVector;
use std::sync::Arc;

/// Unit square meshes of triangles or quadrilaterals with at most `max_cells_per_dim` cells along each axis.
pub fn unit_square_mesh(max_cells_per_dim: usize) -> impl Strategy<Value = Arc<Mesh<f64>>> {
    let cells_per_dim = 1..=max_cells_per_dim.max(1);
    (cells_per_dim, any::<bool>()).prop_map(|(n, triangles)| {
        let mesh = if triangles {
            create_unit_square_uniform_tri_mesh_2d(n)
        } else {
            create_unit_square_uniform_quad_mesh_2d(n)
        };
        Arc::new(mesh)
    })
}

/// One of the scalar elements that have a degree-of-freedom layout on the given cell.
pub fn scalar_element(cell: CellType) -> impl Strategy<Value = ScalarElement> {
    prop_oneof![
        Just(ScalarElement::lagrange(cell, 1)),
        Just(ScalarElement::discontinuous_lagrange(cell, 0)),
        Just(ScalarElement::discontinuous_lagrange(cell, 1)),
    ]
}

/// Spaces of square matrices of dimension 2 or 3 over small unit square meshes.
pub fn square_tensor_space() -> impl Strategy<Value = Arc<FunctionSpace<f64>>> {
    unit_square_mesh(3)
        .prop_flat_map(|mesh| {
            let cell = mesh.cell_type();
            (Just(mesh), scalar_element(cell), 2..=3usize)
        })
        .prop_map(|(mesh, sub, n)| {
            let space = FunctionSpace::new(mesh, FiniteElement::tensor(sub, [n, n]))
                .expect("Generated elements always have a layout on the generated mesh");
            Arc::new(space)
        })
}

/// Scalar spaces over small unit square meshes.
pub fn scalar_space() -> impl Strategy<Value = Arc<FunctionSpace<f64>>> {
    unit_square_mesh(3)
        .prop_flat_map(|mesh| {
            let cell = mesh.cell_type();
            (Just(mesh), scalar_element(cell))
        })
        .prop_map(|(mesh, element)| {
            let space = FunctionSpace::new(mesh, element)
                .expect("Generated elements always have a layout on the generated mesh");
            Arc::new(space)
        })
}

/// Functions in the given space with coefficients drawn from `[-10, 10]`.
pub fn function_in_space(space: Arc<FunctionSpace<f64>>) -> impl Strategy<Value = Function<f64>> {
    // Pick a reasonably small range so that products and sums stay well within
    // the range where absolute tolerances are meaningful
    vec(-10.0..10.0, space.dim()).prop_map(move |coefficients| {
        Function::from_coefficients(Arc::clone(&space), DVector::from_vec(coefficients))
            .expect("Coefficient vector has the dimension of the space")
    })
}

/// Pairs of functions sharing one randomly generated space.
pub fn function_pair(
    space: impl Strategy<Value = Arc<FunctionSpace<f64>>>,
) -> impl Strategy<Value = (Function<f64>, Function<f64>)> {
    space.prop_flat_map(|space| (function_in_space(Arc::clone(&space)), function_in_space(space)))
}
