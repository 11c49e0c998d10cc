//! Elementwise operations: unary and binary arithmetic, comparisons, selection, clamping, and conversions.

use crate::attributes::{ComparisonDirection, ComparisonType};
use crate::operations::{Capability, OpType};
use crate::shape_inference::{ShapeError, check_capabilities, matching_data_type, valid_data_type};
use crate::types::{DataType, Shape};

/// Infers the output shape of a standard unary operation. The output shape matches the operand shape, except that
/// [`OpType::Abs`], [`OpType::Real`], and [`OpType::Imag`] map complex element types to their real counterparts and
/// [`OpType::IsFinite`] produces booleans.
pub fn unary(op: OpType, operand: &Shape) -> Result<Shape, ShapeError> {
    if !op.has_capability(Capability::StandardUnary) {
        return Err(ShapeError::NotApplicable { op, family: "unary" });
    }
    let data_type = valid_data_type(op, operand)?;
    check_capabilities(op, data_type)?;
    match op {
        OpType::Abs | OpType::Real | OpType::Imag => {
            Ok(operand.with_data_type(data_type.real_counterpart().unwrap_or(data_type)))
        }
        OpType::IsFinite => Ok(operand.with_data_type(DataType::Boolean)),
        _ => Ok(operand.clone()),
    }
}

/// Computes the broadcast dimensions of two operands. If either operand is a scalar the result takes the dimensions
/// of the other one. Otherwise, the ranks must match and each pair of dimensions must either be equal or contain a
/// `1`, in which case the result takes the other dimension.
pub(crate) fn broadcast_dimensions(op: OpType, lhs: &Shape, rhs: &Shape) -> Result<Vec<usize>, ShapeError> {
    if lhs.rank() == 0 {
        return Ok(rhs.dimensions().to_vec());
    }
    if rhs.rank() == 0 {
        return Ok(lhs.dimensions().to_vec());
    }
    let incompatible = || ShapeError::IncompatibleShapes { op, lhs: lhs.clone(), rhs: rhs.clone() };
    if lhs.rank() != rhs.rank() {
        return Err(incompatible());
    }
    lhs.dimensions()
        .iter()
        .zip(rhs.dimensions())
        .map(|(&lhs_dimension, &rhs_dimension)| match (lhs_dimension, rhs_dimension) {
            (lhs_dimension, rhs_dimension) if lhs_dimension == rhs_dimension => Ok(lhs_dimension),
            (1, rhs_dimension) => Ok(rhs_dimension),
            (lhs_dimension, 1) => Ok(lhs_dimension),
            _ => Err(incompatible()),
        })
        .collect()
}

/// Infers the output shape of a standard binary operation.
pub fn binary(op: OpType, lhs: &Shape, rhs: &Shape) -> Result<Shape, ShapeError> {
    if !op.has_capability(Capability::StandardBinary) {
        return Err(ShapeError::NotApplicable { op, family: "binary" });
    }
    let data_type = matching_data_type(op, lhs, rhs)?;
    check_capabilities(op, data_type)?;
    let data_type = match op {
        OpType::Complex => data_type.complex_counterpart().ok_or(ShapeError::UnsupportedDataType {
            op,
            data_type,
            expected: "'f32' or 'f64'",
        })?,
        _ => data_type,
    };
    Ok(Shape::new(data_type, broadcast_dimensions(op, lhs, rhs)?))
}

/// Infers the output shape of a comparison. When `comparison_type` is [`None`], the default comparison type for the
/// element type of the operands is used (see [`ComparisonType::default_for`]).
pub fn compare(
    lhs: &Shape,
    rhs: &Shape,
    direction: ComparisonDirection,
    comparison_type: Option<ComparisonType>,
) -> Result<Shape, ShapeError> {
    let op = OpType::Compare;
    let data_type = matching_data_type(op, lhs, rhs)?;
    let comparison_type = comparison_type.unwrap_or(ComparisonType::default_for(data_type));
    let valid = match comparison_type {
        ComparisonType::Float => data_type.is_float() || data_type.is_complex(),
        ComparisonType::TotalOrder => data_type.is_float(),
        ComparisonType::Signed => data_type.is_signed_integer(),
        ComparisonType::Unsigned => data_type.is_unsigned_integer() || data_type.is_boolean(),
    };
    if !valid {
        return Err(ShapeError::InvalidParameter {
            op,
            parameter: "compare_type",
            message: format!("comparison type '{comparison_type}' cannot be used with element type '{data_type}'"),
        });
    }
    if data_type.is_complex() && !matches!(direction, ComparisonDirection::Equal | ComparisonDirection::NotEqual) {
        return Err(ShapeError::InvalidParameter {
            op,
            parameter: "comparison_direction",
            message: format!("complex values only support 'EQ' and 'NE' but got '{direction}'"),
        });
    }
    Ok(Shape::new(DataType::Boolean, broadcast_dimensions(op, lhs, rhs)?))
}

/// Infers the output shape of a selection. The predicate must be a boolean scalar or match the shape of the two
/// branches, which must match each other exactly.
pub fn select(predicate: &Shape, on_true: &Shape, on_false: &Shape) -> Result<Shape, ShapeError> {
    let op = OpType::Select;
    let predicate_data_type = valid_data_type(op, predicate)?;
    if !predicate_data_type.is_boolean() {
        return Err(ShapeError::UnsupportedDataType { op, data_type: predicate_data_type, expected: "'bool'" });
    }
    matching_data_type(op, on_true, on_false)?;
    if on_true.dimensions() != on_false.dimensions() {
        return Err(ShapeError::IncompatibleShapes { op, lhs: on_true.clone(), rhs: on_false.clone() });
    }
    if predicate.rank() != 0 && predicate.dimensions() != on_true.dimensions() {
        return Err(ShapeError::IncompatibleShapes { op, lhs: predicate.clone(), rhs: on_true.clone() });
    }
    Ok(on_true.clone())
}

/// Infers the output shape of a clamp. Each bound must either be a scalar or match the shape of the operand.
pub fn clamp(min: &Shape, operand: &Shape, max: &Shape) -> Result<Shape, ShapeError> {
    let op = OpType::Clamp;
    let data_type = valid_data_type(op, operand)?;
    check_capabilities(op, data_type)?;
    if data_type.is_complex() {
        return Err(ShapeError::UnsupportedDataType { op, data_type, expected: "a non-complex type" });
    }
    for bound in [min, max] {
        matching_data_type(op, bound, operand)?;
        if bound.rank() != 0 && bound.dimensions() != operand.dimensions() {
            return Err(ShapeError::IncompatibleShapes { op, lhs: bound.clone(), rhs: operand.clone() });
        }
    }
    Ok(operand.clone())
}

/// Infers the output shape of an element type conversion.
pub fn convert(operand: &Shape, data_type: DataType) -> Result<Shape, ShapeError> {
    valid_data_type(OpType::Convert, operand)?;
    Ok(operand.with_data_type(data_type))
}

/// Infers the output shape of a bitcast. Converting to a narrower element type appends a trailing axis of size
/// `source_bits / target_bits`, and converting to a wider element type requires and removes a trailing axis of size
/// `target_bits / source_bits`.
pub fn bitcast_convert(operand: &Shape, data_type: DataType) -> Result<Shape, ShapeError> {
    let op = OpType::BitcastConvert;
    let source_bits = valid_data_type(op, operand)?.bit_width();
    let target_bits = data_type.bit_width();
    let mut dimensions = operand.dimensions().to_vec();
    if source_bits > target_bits {
        if source_bits % target_bits != 0 {
            return Err(ShapeError::InvalidParameter {
                op,
                parameter: "data_type",
                message: format!("{source_bits} bits cannot be split evenly into '{data_type}' elements"),
            });
        }
        dimensions.push(source_bits / target_bits);
    } else if source_bits < target_bits {
        let expected = target_bits / source_bits;
        if target_bits % source_bits != 0 || dimensions.last() != Some(&expected) {
            return Err(ShapeError::InvalidParameter {
                op,
                parameter: "data_type",
                message: format!("widening {operand} to '{data_type}' requires a trailing axis of size {expected}"),
            });
        }
        dimensions.pop();
    }
    Ok(Shape::new(data_type, dimensions))
}

/// Infers the output shape of a precision reduction, which preserves the operand shape.
pub fn reduce_precision(operand: &Shape, exponent_bits: u32, mantissa_bits: u32) -> Result<Shape, ShapeError> {
    let op = OpType::ReducePrecision;
    let data_type = valid_data_type(op, operand)?;
    check_capabilities(op, data_type)?;
    if exponent_bits < 1 {
        return Err(ShapeError::InvalidParameter {
            op,
            parameter: "exponent_bits",
            message: format!("must be at least 1 but got {exponent_bits} (mantissa bits: {mantissa_bits})"),
        });
    }
    Ok(operand.clone())
}
