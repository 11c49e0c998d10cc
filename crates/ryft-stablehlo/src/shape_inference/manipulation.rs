//! Operations that rearrange tensors without looking at their contents: broadcasting, reshaping, transposing,
//! slicing, concatenating, and padding.

use crate::operations::OpType;
use crate::shape_inference::{
    ShapeError, check_length, matching_data_type, normalize_axes, normalize_axis, scalar_data_type, valid_data_type,
};
use crate::types::Shape;

/// Infers the output shape of a broadcast. `broadcast_dimensions[i]` is the axis of the output that the `i`-th
/// operand axis maps to. Operand axes of size `1` may map to output axes of any size while all other operand axes
/// must map to output axes of the same size.
pub fn broadcast_in_dim(
    operand: &Shape,
    dimensions: &[usize],
    broadcast_dimensions: &[i64],
) -> Result<Shape, ShapeError> {
    let op = OpType::BroadcastInDim;
    let data_type = valid_data_type(op, operand)?;
    let output = Shape::new(data_type, dimensions);
    if operand.rank() > output.rank() {
        return Err(ShapeError::RankMismatch { op, expected: output.rank(), shape: operand.clone() });
    }
    check_length(op, "broadcast_dimensions", operand.rank(), broadcast_dimensions.len())?;
    let broadcast_dimensions = normalize_axes(op, "broadcast_dimensions", broadcast_dimensions, output.rank())?;
    for (operand_dimension, output_axis) in operand.dimensions().iter().zip(broadcast_dimensions) {
        if *operand_dimension != 1 && *operand_dimension != dimensions[output_axis] {
            return Err(ShapeError::IncompatibleShapes { op, lhs: operand.clone(), rhs: output });
        }
    }
    Ok(output)
}

/// Infers the output shape of a reshape, which must preserve the number of elements.
pub fn reshape(operand: &Shape, dimensions: &[usize]) -> Result<Shape, ShapeError> {
    let op = OpType::Reshape;
    let output = Shape::new(valid_data_type(op, operand)?, dimensions);
    if output.size() != operand.size() {
        return Err(ShapeError::ElementCountMismatch { op, from: operand.clone(), to: output });
    }
    Ok(output)
}

/// Infers the output shape of a transpose. Output axis `i` takes its size from operand axis `permutation[i]`.
pub fn transpose(operand: &Shape, permutation: &[i64]) -> Result<Shape, ShapeError> {
    let op = OpType::Transpose;
    let data_type = valid_data_type(op, operand)?;
    check_length(op, "permutation", operand.rank(), permutation.len())?;
    let permutation = normalize_axes(op, "permutation", permutation, operand.rank())?;
    Ok(Shape::new(data_type, permutation.iter().map(|axis| operand.dimensions()[*axis]).collect::<Vec<_>>()))
}

/// Infers the output shape of a static slice. For every axis, `0 <= start <= limit <= size` and `stride > 0` must hold,
/// and the output size is `ceil((limit - start) / stride)`. Note that `start == limit` yields an empty axis.
pub fn slice(operand: &Shape, starts: &[i64], limits: &[i64], strides: &[i64]) -> Result<Shape, ShapeError> {
    let op = OpType::Slice;
    let data_type = valid_data_type(op, operand)?;
    check_length(op, "start_indices", operand.rank(), starts.len())?;
    check_length(op, "limit_indices", operand.rank(), limits.len())?;
    check_length(op, "strides", operand.rank(), strides.len())?;
    let mut dimensions = Vec::with_capacity(operand.rank());
    for (axis, &dimension) in operand.dimensions().iter().enumerate() {
        let (start, limit, stride) = (starts[axis], limits[axis], strides[axis]);
        if stride <= 0 {
            return Err(ShapeError::InvalidParameter {
                op,
                parameter: "strides",
                message: format!("stride {stride} of axis {axis} must be positive"),
            });
        }
        if start < 0 || start > limit || limit > dimension as i64 {
            return Err(ShapeError::InvalidParameter {
                op,
                parameter: "start_indices",
                message: format!("range [{start}, {limit}) of axis {axis} is not within [0, {dimension}]"),
            });
        }
        dimensions.push(((limit - start + stride - 1) / stride) as usize);
    }
    Ok(Shape::new(data_type, dimensions))
}

/// Infers the output shape of a concatenation along `axis`. All inputs must share their element type, their rank,
/// and the sizes of every axis other than `axis`.
pub fn concatenate(inputs: &[&Shape], axis: i64) -> Result<Shape, ShapeError> {
    let op = OpType::Concatenate;
    let Some(first) = inputs.first() else {
        return Err(ShapeError::OperandCountMismatch { op, expected: 1, actual: 0 });
    };
    let data_type = valid_data_type(op, first)?;
    if first.rank() == 0 {
        return Err(ShapeError::ScalarOperand { op });
    }
    let axis = normalize_axis(op, axis, first.rank())?;
    let mut dimensions = first.dimensions().to_vec();
    for input in &inputs[1..] {
        matching_data_type(op, first, input)?;
        let compatible = input.rank() == first.rank()
            && input.dimensions().iter().zip(first.dimensions()).enumerate().all(|(index, (lhs, rhs))| {
                index == axis || lhs == rhs
            });
        if !compatible {
            return Err(ShapeError::IncompatibleShapes { op, lhs: (*first).clone(), rhs: (*input).clone() });
        }
        dimensions[axis] += input.dimensions()[axis];
    }
    Ok(Shape::new(data_type, dimensions))
}

/// Infers the output shape of a padding operation. Negative edge padding removes elements. Interior padding is
/// inserted between neighboring elements and must be non-negative.
pub fn pad(
    operand: &Shape,
    padding_value: &Shape,
    low: &[i64],
    high: &[i64],
    interior: &[i64],
) -> Result<Shape, ShapeError> {
    let op = OpType::Pad;
    let data_type = valid_data_type(op, operand)?;
    scalar_data_type(op, padding_value)?;
    matching_data_type(op, operand, padding_value)?;
    check_length(op, "edge_padding_low", operand.rank(), low.len())?;
    check_length(op, "edge_padding_high", operand.rank(), high.len())?;
    check_length(op, "interior_padding", operand.rank(), interior.len())?;
    let mut dimensions = Vec::with_capacity(operand.rank());
    for (axis, &dimension) in operand.dimensions().iter().enumerate() {
        if interior[axis] < 0 {
            return Err(ShapeError::InvalidParameter {
                op,
                parameter: "interior_padding",
                message: format!("interior padding {} of axis {axis} must be non-negative", interior[axis]),
            });
        }
        let dimension = dimension as i64;
        let padded = low[axis] + high[axis] + dimension + (dimension - 1).max(0) * interior[axis];
        if padded < 0 {
            return Err(ShapeError::InvalidParameter {
                op,
                parameter: "edge_padding_low",
                message: format!("padding of axis {axis} results in negative size {padded}"),
            });
        }
        dimensions.push(padded as usize);
    }
    Ok(Shape::new(data_type, dimensions))
}
