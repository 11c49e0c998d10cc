//! Index generation, random bit generation, and custom calls.

use crate::operations::OpType;
use crate::shape_inference::{ShapeError, check_capabilities, normalize_axis, valid_data_type};
use crate::types::{DataType, Shape};

/// Infers the output shape of an iota, which is `shape` itself. `shape` must be a numeric, non-scalar shape and
/// `iota_dimension` must be one of its axes.
pub fn iota(shape: &Shape, iota_dimension: i64) -> Result<Shape, ShapeError> {
    let op = OpType::Iota;
    let data_type = valid_data_type(op, shape)?;
    check_capabilities(op, data_type)?;
    if shape.is_scalar() {
        return Err(ShapeError::ScalarOperand { op });
    }
    normalize_axis(op, iota_dimension, shape.rank())?;
    Ok(shape.clone())
}

/// Infers the output shapes of a random bit generator. The first output is the updated generator state, which has the
/// shape of `initial_state`, and the second output holds the generated random bits, which have the requested `shape`.
pub fn rng_bit_generator(initial_state: &Shape, shape: &Shape) -> Result<Vec<Shape>, ShapeError> {
    let op = OpType::RngBitGenerator;
    let state_data_type = valid_data_type(op, initial_state)?;
    if !matches!(state_data_type, DataType::UnsignedInt32 | DataType::UnsignedInt64) {
        return Err(ShapeError::UnsupportedDataType { op, data_type: state_data_type, expected: "'ui32' or 'ui64'" });
    }
    if initial_state.rank() != 1 {
        return Err(ShapeError::RankMismatch { op, expected: 1, shape: initial_state.clone() });
    }
    let data_type = valid_data_type(op, shape)?;
    if !data_type.is_integer() && !data_type.is_float() {
        return Err(ShapeError::UnsupportedDataType { op, data_type, expected: "an integer or floating-point type" });
    }
    Ok(vec![initial_state.clone(), shape.clone()])
}

/// Infers the output shapes of a custom call, which are provided by the caller since the target is opaque.
pub fn custom_call(inputs: &[&Shape], output_shapes: &[Shape]) -> Result<Vec<Shape>, ShapeError> {
    let op = OpType::CustomCall;
    for shape in inputs.iter().copied().chain(output_shapes) {
        valid_data_type(op, shape)?;
    }
    Ok(output_shapes.to_vec())
}
