//! Data-dependent indexing: gathers, scatters, and dynamic slices.

use crate::attributes::{GatherDimensions, ScatterDimensions};
use crate::operations::OpType;
use crate::shape_inference::{
    ClosureSignature, ShapeError, check_combinator, check_length, matching_data_type, normalize_axes, normalize_axis,
    valid_data_type,
};
use crate::types::{DataType, Shape};

/// Infers the output shape of a gather.
///
/// The output has one axis per batch axis of `start_indices` (every axis except for `index_vector_dim`) and one
/// axis per entry of `offset_dims`. Output axes listed in `offset_dims` take, in order, the slice sizes of the
/// operand axes that are neither collapsed nor batching axes. All remaining output axes take, in order, the sizes of
/// the batch axes of `start_indices`.
pub fn gather(
    operand: &Shape,
    start_indices: &Shape,
    dimensions: &GatherDimensions,
    slice_sizes: &[usize],
) -> Result<Shape, ShapeError> {
    let op = OpType::Gather;
    let data_type = valid_data_type(op, operand)?;
    check_index_data_type(op, start_indices)?;
    let rank = operand.rank();
    check_length(op, "slice_sizes", rank, slice_sizes.len())?;
    for (axis, (slice_size, dimension)) in slice_sizes.iter().zip(operand.dimensions()).enumerate() {
        if slice_size > dimension {
            return Err(ShapeError::InvalidParameter {
                op,
                parameter: "slice_sizes",
                message: format!("slice size {slice_size} of axis {axis} exceeds the operand size {dimension}"),
            });
        }
    }

    let indexed = IndexedAxes::new(
        op,
        operand,
        start_indices,
        IndexedAxesParameters {
            collapsed: ("collapsed_slice_dims", &dimensions.collapsed_slice_dims),
            operand_batching: ("operand_batching_dims", &dimensions.operand_batching_dims),
            indices_batching: ("start_indices_batching_dims", &dimensions.start_indices_batching_dims),
            index_map: ("start_index_map", &dimensions.start_index_map),
            index_vector_dim: dimensions.index_vector_dim,
        },
    )?;
    for axis in indexed.collapsed.iter().chain(indexed.operand_batching.iter()) {
        if slice_sizes[*axis] > 1 {
            return Err(ShapeError::InvalidParameter {
                op,
                parameter: "slice_sizes",
                message: format!("collapsed or batching axis {axis} must have slice size 1 or 0"),
            });
        }
    }

    let offset_sizes = (0..rank)
        .filter(|axis| !indexed.collapsed.contains(axis) && !indexed.operand_batching.contains(axis))
        .map(|axis| slice_sizes[axis])
        .collect::<Vec<_>>();
    check_length(op, "offset_dims", offset_sizes.len(), dimensions.offset_dims.len())?;
    let output_rank = indexed.batch_sizes.len() + offset_sizes.len();
    let offset_dims = sorted_axes(op, "offset_dims", &dimensions.offset_dims, output_rank)?;

    let mut offset_sizes = offset_sizes.into_iter();
    let mut batch_sizes = indexed.batch_sizes.into_iter();
    let output_dimensions = (0..output_rank)
        .map(|axis| if offset_dims.contains(&axis) { offset_sizes.next() } else { batch_sizes.next() })
        .collect::<Option<Vec<_>>>()
        .ok_or(ShapeError::InvalidParameter {
            op,
            parameter: "offset_dims",
            message: "offset and batch axes do not cover the output".to_string(),
        })?;
    Ok(Shape::new(data_type, output_dimensions))
}

/// Infers the output shapes of a scatter, which are always the shapes of the scattered `inputs`.
///
/// `update_combinator` is the signature of the closure that combines existing values with updates. It must take
/// `2 * N` scalars and return `N` scalars, where `N` is the number of inputs, with element types that the element
/// types of the inputs can be promoted to.
pub fn scatter(
    inputs: &[&Shape],
    scatter_indices: &Shape,
    updates: &[&Shape],
    dimensions: &ScatterDimensions,
    update_combinator: &ClosureSignature,
) -> Result<Vec<Shape>, ShapeError> {
    let op = OpType::Scatter;
    let Some(input) = inputs.first() else {
        return Err(ShapeError::OperandCountMismatch { op, expected: 1, actual: 0 });
    };
    if updates.len() != inputs.len() {
        return Err(ShapeError::OperandCountMismatch { op, expected: inputs.len(), actual: updates.len() });
    }
    let mut data_types = Vec::with_capacity(inputs.len());
    for (other_input, update) in inputs.iter().zip(updates) {
        data_types.push(matching_data_type(op, other_input, update)?);
        if other_input.dimensions() != input.dimensions() {
            return Err(ShapeError::IncompatibleShapes { op, lhs: (*input).clone(), rhs: (*other_input).clone() });
        }
        if update.dimensions() != updates[0].dimensions() {
            return Err(ShapeError::IncompatibleShapes { op, lhs: updates[0].clone(), rhs: (*update).clone() });
        }
    }
    check_index_data_type(op, scatter_indices)?;

    let indexed = IndexedAxes::new(
        op,
        input,
        scatter_indices,
        IndexedAxesParameters {
            collapsed: ("inserted_window_dims", &dimensions.inserted_window_dims),
            operand_batching: ("input_batching_dims", &dimensions.input_batching_dims),
            indices_batching: ("scatter_indices_batching_dims", &dimensions.scatter_indices_batching_dims),
            index_map: ("scatter_dims_to_operand_dims", &dimensions.scatter_dims_to_operand_dims),
            index_vector_dim: dimensions.index_vector_dim,
        },
    )?;

    let window_bounds = (0..input.rank())
        .filter(|axis| !indexed.collapsed.contains(axis) && !indexed.operand_batching.contains(axis))
        .map(|axis| input.dimensions()[axis])
        .collect::<Vec<_>>();
    check_length(op, "update_window_dims", window_bounds.len(), dimensions.update_window_dims.len())?;
    let update = updates[0];
    let expected_update_rank = indexed.batch_sizes.len() + window_bounds.len();
    if update.rank() != expected_update_rank {
        return Err(ShapeError::RankMismatch { op, expected: expected_update_rank, shape: update.clone() });
    }
    let update_window_dims = sorted_axes(op, "update_window_dims", &dimensions.update_window_dims, update.rank())?;

    let mut window_bounds = window_bounds.into_iter();
    let mut batch_sizes = indexed.batch_sizes.into_iter();
    for (axis, size) in update.dimensions().iter().enumerate() {
        let compatible = if update_window_dims.contains(&axis) {
            window_bounds.next().is_some_and(|bound| *size <= bound)
        } else {
            batch_sizes.next() == Some(*size)
        };
        if !compatible {
            return Err(ShapeError::IncompatibleShapes { op, lhs: (*input).clone(), rhs: update.clone() });
        }
    }

    check_combinator(op, update_combinator, &data_types, true)?;
    Ok(inputs.iter().map(|input| (*input).clone()).collect())
}

/// Infers the output shape of a dynamic slice. There must be one scalar integer start index per operand axis, all
/// with the same element type, and `slice_sizes` must not exceed the operand dimensions.
pub fn dynamic_slice(operand: &Shape, start_indices: &[&Shape], slice_sizes: &[usize]) -> Result<Shape, ShapeError> {
    let op = OpType::DynamicSlice;
    let data_type = valid_data_type(op, operand)?;
    check_start_indices(op, operand, start_indices)?;
    check_length(op, "slice_sizes", operand.rank(), slice_sizes.len())?;
    for (axis, (slice_size, dimension)) in slice_sizes.iter().zip(operand.dimensions()).enumerate() {
        if slice_size > dimension {
            return Err(ShapeError::InvalidParameter {
                op,
                parameter: "slice_sizes",
                message: format!("slice size {slice_size} of axis {axis} exceeds the operand size {dimension}"),
            });
        }
    }
    Ok(Shape::new(data_type, slice_sizes))
}

/// Infers the output shape of a dynamic update slice, which is the shape of the operand. The update must have the
/// same rank and element type as the operand and must fit within it.
pub fn dynamic_update_slice(operand: &Shape, update: &Shape, start_indices: &[&Shape]) -> Result<Shape, ShapeError> {
    let op = OpType::DynamicUpdateSlice;
    matching_data_type(op, operand, update)?;
    let fits = update.rank() == operand.rank()
        && update.dimensions().iter().zip(operand.dimensions()).all(|(update, operand)| update <= operand);
    if !fits {
        return Err(ShapeError::IncompatibleShapes { op, lhs: operand.clone(), rhs: update.clone() });
    }
    check_start_indices(op, operand, start_indices)?;
    Ok(operand.clone())
}

fn check_index_data_type(op: OpType, indices: &Shape) -> Result<DataType, ShapeError> {
    let data_type = valid_data_type(op, indices)?;
    if !data_type.is_integer() {
        return Err(ShapeError::UnsupportedDataType { op, data_type, expected: "an integer type" });
    }
    Ok(data_type)
}

fn check_start_indices(op: OpType, operand: &Shape, start_indices: &[&Shape]) -> Result<(), ShapeError> {
    check_length(op, "start_indices", operand.rank(), start_indices.len())?;
    for start_index in start_indices {
        check_index_data_type(op, start_index)?;
        if start_index.rank() != 0 {
            return Err(ShapeError::NotScalar { op, shape: (*start_index).clone() });
        }
        matching_data_type(op, start_indices[0], start_index)?;
    }
    Ok(())
}

/// Normalizes `axes` against `rank` and checks that they are sorted in increasing order.
fn sorted_axes(op: OpType, parameter: &'static str, axes: &[i64], rank: usize) -> Result<Vec<usize>, ShapeError> {
    let axes = normalize_axes(op, parameter, axes, rank)?;
    if axes.windows(2).any(|pair| pair[0] > pair[1]) {
        return Err(ShapeError::InvalidParameter { op, parameter, message: "axes must be sorted".to_string() });
    }
    Ok(axes)
}

/// Parameter names and values shared by gathers and scatters, named from the perspective of a gather.
struct IndexedAxesParameters<'a> {
    collapsed: (&'static str, &'a [i64]),
    operand_batching: (&'static str, &'a [i64]),
    indices_batching: (&'static str, &'a [i64]),
    index_map: (&'static str, &'a [i64]),
    index_vector_dim: i64,
}

/// Validated axis bookkeeping shared by gathers and scatters.
struct IndexedAxes {
    collapsed: Vec<usize>,
    operand_batching: Vec<usize>,

    /// Sizes of the batch axes of the indices (i.e., all axes except for the index vector axis), in order.
    batch_sizes: Vec<usize>,
}

impl IndexedAxes {
    fn new(
        op: OpType,
        operand: &Shape,
        indices: &Shape,
        parameters: IndexedAxesParameters<'_>,
    ) -> Result<Self, ShapeError> {
        let rank = operand.rank();
        let indices_rank = indices.rank();

        let index_vector_dim = normalize_axis(op, parameters.index_vector_dim, indices_rank + 1)?;
        let index_vector_size = indices.dimensions().get(index_vector_dim).copied().unwrap_or(1);

        let (collapsed_name, collapsed) = parameters.collapsed;
        let collapsed = normalize_axes(op, collapsed_name, collapsed, rank)?;
        let (operand_batching_name, operand_batching) = parameters.operand_batching;
        let operand_batching = normalize_axes(op, operand_batching_name, operand_batching, rank)?;
        if let Some(axis) = collapsed.iter().find(|axis| operand_batching.contains(axis)) {
            return Err(ShapeError::DuplicateAxis { op, parameter: operand_batching_name, axis: *axis });
        }

        let (indices_batching_name, indices_batching) = parameters.indices_batching;
        let indices_batching = normalize_axes(op, indices_batching_name, indices_batching, indices_rank)?;
        check_length(op, indices_batching_name, operand_batching.len(), indices_batching.len())?;
        for (operand_axis, indices_axis) in operand_batching.iter().zip(&indices_batching) {
            if *indices_axis == index_vector_dim {
                return Err(ShapeError::InvalidParameter {
                    op,
                    parameter: indices_batching_name,
                    message: format!("axis {indices_axis} is the index vector axis"),
                });
            }
            if operand.dimensions()[*operand_axis] != indices.dimensions()[*indices_axis] {
                return Err(ShapeError::InvalidParameter {
                    op,
                    parameter: indices_batching_name,
                    message: format!(
                        "operand axis {operand_axis} of {operand} and indices axis {indices_axis} of {indices} differ",
                    ),
                });
            }
        }

        let (index_map_name, index_map) = parameters.index_map;
        check_length(op, index_map_name, index_vector_size, index_map.len())?;
        let index_map = normalize_axes(op, index_map_name, index_map, rank)?;
        if let Some(axis) = index_map.iter().find(|axis| operand_batching.contains(axis)) {
            return Err(ShapeError::InvalidParameter {
                op,
                parameter: index_map_name,
                message: format!("axis {axis} is also a batching axis"),
            });
        }

        let batch_sizes = indices
            .dimensions()
            .iter()
            .enumerate()
            .filter(|(axis, _)| *axis != index_vector_dim)
            .map(|(_, size)| *size)
            .collect();
        Ok(Self { collapsed, operand_batching, batch_sizes })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    use crate::types::DataType::*;

    fn add_signature(data_type: DataType) -> ClosureSignature {
        let scalar = Shape::scalar(data_type);
        ClosureSignature::new(vec![scalar.clone(), scalar.clone()], vec![scalar])
    }

    #[test]
    fn test_gather_rows() {
        // Gathers 5 rows of a [10, 8] matrix.
        let dimensions = GatherDimensions {
            offset_dims: vec![1],
            collapsed_slice_dims: vec![0],
            start_index_map: vec![0],
            index_vector_dim: 1,
            ..Default::default()
        };
        assert_eq!(
            gather(&Shape::new(Float32, [10, 8]), &Shape::new(Int32, [5, 1]), &dimensions, &[1, 8]),
            Ok(Shape::new(Float32, [5, 8])),
        );

        // The same gather with an implicit trailing index vector axis.
        let dimensions = GatherDimensions { index_vector_dim: 1, ..dimensions };
        assert_eq!(
            gather(&Shape::new(Float32, [10, 8]), &Shape::new(Int32, [5]), &dimensions, &[1, 8]),
            Ok(Shape::new(Float32, [5, 8])),
        );
    }

    #[test]
    fn test_gather_offset_placement() {
        let dimensions = GatherDimensions {
            offset_dims: vec![0, 3],
            collapsed_slice_dims: vec![1],
            start_index_map: vec![0, 1],
            index_vector_dim: 2,
            ..Default::default()
        };
        assert_eq!(
            gather(&Shape::new(Float32, [4, 5, 6]), &Shape::new(Int64, [2, 3, 2]), &dimensions, &[2, 1, 3]),
            Ok(Shape::new(Float32, [2, 2, 3, 3])),
        );
    }

    #[test]
    fn test_gather_batching() {
        let dimensions = GatherDimensions {
            offset_dims: vec![2],
            collapsed_slice_dims: vec![1],
            operand_batching_dims: vec![0],
            start_indices_batching_dims: vec![0],
            start_index_map: vec![1],
            index_vector_dim: 2,
        };
        assert_eq!(
            gather(&Shape::new(Float32, [3, 10, 8]), &Shape::new(Int32, [3, 4, 1]), &dimensions, &[1, 1, 8]),
            Ok(Shape::new(Float32, [3, 4, 8])),
        );
        assert!(gather(&Shape::new(Float32, [2, 10, 8]), &Shape::new(Int32, [3, 4, 1]), &dimensions, &[1, 1, 8])
            .is_err());
    }

    #[test]
    fn test_gather_errors() {
        let operand = Shape::new(Float32, [10, 8]);
        let indices = Shape::new(Int32, [5, 1]);
        let dimensions = GatherDimensions {
            offset_dims: vec![1],
            collapsed_slice_dims: vec![0],
            start_index_map: vec![0],
            index_vector_dim: 1,
            ..Default::default()
        };
        assert!(gather(&operand, &indices, &dimensions, &[2, 8]).is_err());
        assert!(gather(&operand, &indices, &dimensions, &[1, 9]).is_err());
        assert!(gather(&operand, &indices, &dimensions, &[1]).is_err());
        assert!(gather(&operand, &Shape::new(Float32, [5, 1]), &dimensions, &[1, 8]).is_err());
        let bad_index_map = GatherDimensions { start_index_map: vec![0, 1], ..dimensions.clone() };
        assert!(gather(&operand, &indices, &bad_index_map, &[1, 8]).is_err());
        let bad_offsets = GatherDimensions { offset_dims: vec![], ..dimensions.clone() };
        assert!(gather(&operand, &indices, &bad_offsets, &[1, 8]).is_err());
        let overlapping = GatherDimensions { operand_batching_dims: vec![0], ..dimensions };
        assert!(matches!(
            gather(&operand, &indices, &overlapping, &[1, 8]),
            Err(ShapeError::DuplicateAxis { .. } | ShapeError::LengthMismatch { .. }),
        ));
    }

    #[test]
    fn test_scatter() {
        let input = Shape::new(Float32, [10, 8]);
        let indices = Shape::new(Int32, [5, 1]);
        let updates = Shape::new(Float32, [5, 8]);
        let dimensions = ScatterDimensions {
            update_window_dims: vec![1],
            inserted_window_dims: vec![0],
            scatter_dims_to_operand_dims: vec![0],
            index_vector_dim: 1,
            ..Default::default()
        };
        assert_eq!(
            scatter(&[&input], &indices, &[&updates], &dimensions, &add_signature(Float32)),
            Ok(vec![input.clone()]),
        );
        assert_eq!(
            scatter(&[&input], &indices, &[&Shape::new(Float32, [5, 4])], &dimensions, &add_signature(Float32)),
            Ok(vec![input.clone()]),
        );
        assert!(scatter(&[&input], &indices, &[&Shape::new(Float32, [4, 8])], &dimensions, &add_signature(Float32))
            .is_err());
        assert!(scatter(&[&input], &indices, &[&Shape::new(Float32, [5, 9])], &dimensions, &add_signature(Float32))
            .is_err());
        assert!(scatter(&[&input], &indices, &[&updates, &updates], &dimensions, &add_signature(Float32)).is_err());
        assert!(scatter(&[], &indices, &[], &dimensions, &add_signature(Float32)).is_err());
    }

    #[test]
    fn test_scatter_combinator() {
        let input = Shape::new(Float16, [10]);
        let indices = Shape::new(Int32, [3, 1]);
        let updates = Shape::new(Float16, [3]);
        let dimensions = ScatterDimensions {
            inserted_window_dims: vec![0],
            scatter_dims_to_operand_dims: vec![0],
            index_vector_dim: 1,
            ..Default::default()
        };
        assert!(scatter(&[&input], &indices, &[&updates], &dimensions, &add_signature(Float32)).is_ok());
        assert!(matches!(
            scatter(&[&input], &indices, &[&updates], &dimensions, &add_signature(Int8)),
            Err(ShapeError::InvalidClosure { op: OpType::Scatter, .. }),
        ));
    }

    #[test]
    fn test_dynamic_slice() {
        let operand = Shape::new(Float32, [4, 6]);
        let index = Shape::scalar(Int32);
        assert_eq!(dynamic_slice(&operand, &[&index, &index], &[2, 6]), Ok(Shape::new(Float32, [2, 6])));
        assert!(dynamic_slice(&operand, &[&index], &[2, 6]).is_err());
        assert!(dynamic_slice(&operand, &[&index, &index], &[2, 7]).is_err());
        assert!(dynamic_slice(&operand, &[&index, &Shape::scalar(Int64)], &[2, 6]).is_err());
        assert!(dynamic_slice(&operand, &[&index, &Shape::new(Int32, [1])], &[2, 6]).is_err());
        assert!(dynamic_slice(&operand, &[&index, &Shape::scalar(Float32)], &[2, 6]).is_err());
    }

    #[test]
    fn test_dynamic_update_slice() {
        let operand = Shape::new(Float32, [4, 6]);
        let index = Shape::scalar(UnsignedInt32);
        assert_eq!(
            dynamic_update_slice(&operand, &Shape::new(Float32, [1, 6]), &[&index, &index]),
            Ok(operand.clone()),
        );
        assert!(dynamic_update_slice(&operand, &Shape::new(Float32, [5, 6]), &[&index, &index]).is_err());
        assert!(dynamic_update_slice(&operand, &Shape::new(Float32, [6]), &[&index, &index]).is_err());
        assert!(dynamic_update_slice(&operand, &Shape::new(Int32, [1, 6]), &[&index, &index]).is_err());
    }
}
