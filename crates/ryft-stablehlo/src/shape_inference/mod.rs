//! Shape inference and type checking for every supported operation.
//!
//! Each submodule contains one family of pure functions that take the [`Shape`]s of the operands of an operation
//! along with its static parameters and return either the inferred output [`Shape`]s or a [`ShapeError`]. None of
//! these functions mutate their inputs. Negative axis indices are normalized to `axis + rank` before use and are
//! rejected if they are still out of range.

use thiserror::Error;

use crate::operations::OpType;
use crate::types::{DataType, Shape};

pub mod communication;
pub mod elementwise;
pub mod indexing;
pub mod linear_algebra;
pub mod manipulation;
pub mod miscellaneous;
pub mod reduction;
pub mod spectral;

/// Error type for shape and element type legality violations. Every variant carries the offending [`OpType`].
#[derive(Error, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ShapeError {
    #[error("'{op}' received an invalid shape")]
    InvalidShape { op: OpType },

    #[error("'{op}' is not a {family} operation")]
    NotApplicable { op: OpType, family: &'static str },

    #[error("'{op}' does not support element type '{data_type}'; expected {expected}")]
    UnsupportedDataType { op: OpType, data_type: DataType, expected: &'static str },

    #[error("'{op}' requires matching element types but got {lhs} and {rhs}")]
    DataTypeMismatch { op: OpType, lhs: Shape, rhs: Shape },

    #[error("'{op}' received incompatible shapes {lhs} and {rhs}")]
    IncompatibleShapes { op: OpType, lhs: Shape, rhs: Shape },

    #[error("'{op}' expected an operand of rank {expected} but got {shape}")]
    RankMismatch { op: OpType, expected: usize, shape: Shape },

    #[error("'{op}' expected a scalar but got {shape}")]
    NotScalar { op: OpType, shape: Shape },

    #[error("'{op}' does not accept scalar operands")]
    ScalarOperand { op: OpType },

    #[error("'{op}' got axis {axis} which is out of range for rank {rank}")]
    AxisOutOfRange { op: OpType, axis: i64, rank: usize },

    #[error("'{op}' got axis {axis} more than once in '{parameter}'")]
    DuplicateAxis { op: OpType, parameter: &'static str, axis: usize },

    #[error("'{op}' expected '{parameter}' to have length {expected} but got {actual}")]
    LengthMismatch { op: OpType, parameter: &'static str, expected: usize, actual: usize },

    #[error("'{op}' expected {expected} operand(s) but got {actual}")]
    OperandCountMismatch { op: OpType, expected: usize, actual: usize },

    #[error("'{op}' cannot change the element count of {from} to {to}")]
    ElementCountMismatch { op: OpType, from: Shape, to: Shape },

    #[error("'{op}' has an invalid '{parameter}': {message}")]
    InvalidParameter { op: OpType, parameter: &'static str, message: String },

    #[error("'{op}' has an invalid closure: {message}")]
    InvalidClosure { op: OpType, message: String },
}

/// Signature of a closure that parameterizes an operation (e.g., the combinator of a reduction).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClosureSignature {
    pub inputs: Vec<Shape>,
    pub outputs: Vec<Shape>,
}

impl ClosureSignature {
    pub fn new(inputs: Vec<Shape>, outputs: Vec<Shape>) -> Self {
        Self { inputs, outputs }
    }
}

/// Returns the [`DataType`] of `shape`, or [`ShapeError::InvalidShape`] if it is the invalid sentinel.
pub(crate) fn valid_data_type(op: OpType, shape: &Shape) -> Result<DataType, ShapeError> {
    shape.data_type().ok_or(ShapeError::InvalidShape { op })
}

/// Checks `data_type` against every element type constraint implied by the capabilities of `op`.
pub(crate) fn check_capabilities(op: OpType, data_type: DataType) -> Result<(), ShapeError> {
    for capability in op.capabilities() {
        if capability.admits(data_type) == Some(false) {
            return Err(ShapeError::UnsupportedDataType { op, data_type, expected: capability.description() });
        }
    }
    Ok(())
}

/// Normalizes a (possibly negative) axis index against `rank`.
pub(crate) fn normalize_axis(op: OpType, axis: i64, rank: usize) -> Result<usize, ShapeError> {
    let normalized = if axis < 0 { axis + rank as i64 } else { axis };
    if normalized < 0 || normalized >= rank as i64 {
        return Err(ShapeError::AxisOutOfRange { op, axis, rank });
    }
    Ok(normalized as usize)
}

/// Normalizes a list of axes against `rank`, rejecting duplicates.
pub(crate) fn normalize_axes(
    op: OpType,
    parameter: &'static str,
    axes: &[i64],
    rank: usize,
) -> Result<Vec<usize>, ShapeError> {
    let mut normalized = Vec::with_capacity(axes.len());
    for axis in axes {
        let axis = normalize_axis(op, *axis, rank)?;
        if normalized.contains(&axis) {
            return Err(ShapeError::DuplicateAxis { op, parameter, axis });
        }
        normalized.push(axis);
    }
    Ok(normalized)
}

/// Checks that `parameter` has the expected length.
pub(crate) fn check_length(
    op: OpType,
    parameter: &'static str,
    expected: usize,
    actual: usize,
) -> Result<(), ShapeError> {
    if expected != actual {
        return Err(ShapeError::LengthMismatch { op, parameter, expected, actual });
    }
    Ok(())
}

/// Checks that `shape` is a valid scalar and returns its [`DataType`].
pub(crate) fn scalar_data_type(op: OpType, shape: &Shape) -> Result<DataType, ShapeError> {
    let data_type = valid_data_type(op, shape)?;
    if shape.rank() != 0 {
        return Err(ShapeError::NotScalar { op, shape: shape.clone() });
    }
    Ok(data_type)
}

/// Checks that `lhs` and `rhs` have the same [`DataType`] and returns it.
pub(crate) fn matching_data_type(op: OpType, lhs: &Shape, rhs: &Shape) -> Result<DataType, ShapeError> {
    let lhs_data_type = valid_data_type(op, lhs)?;
    let rhs_data_type = valid_data_type(op, rhs)?;
    if lhs_data_type != rhs_data_type {
        return Err(ShapeError::DataTypeMismatch { op, lhs: lhs.clone(), rhs: rhs.clone() });
    }
    Ok(lhs_data_type)
}

/// Checks that `signature` takes `2 * N` scalars and returns `N` scalars, where the `i`-th and `(N + i)`-th inputs
/// as well as the `i`-th output have a data type that `data_types[i]` can be promoted to (or exactly `data_types[i]`
/// when `allow_promotion` is `false`).
pub(crate) fn check_combinator(
    op: OpType,
    signature: &ClosureSignature,
    data_types: &[DataType],
    allow_promotion: bool,
) -> Result<(), ShapeError> {
    let count = data_types.len();
    if signature.inputs.len() != 2 * count || signature.outputs.len() != count {
        return Err(ShapeError::InvalidClosure {
            op,
            message: format!(
                "expected {} input(s) and {count} output(s) but got {} input(s) and {} output(s)",
                2 * count,
                signature.inputs.len(),
                signature.outputs.len(),
            ),
        });
    }
    let compatible = |expected: DataType, actual: DataType| {
        if allow_promotion { expected.promotable_to(&actual) } else { expected == actual }
    };
    for (index, data_type) in data_types.iter().enumerate() {
        for shape in [&signature.inputs[index], &signature.inputs[count + index], &signature.outputs[index]] {
            let actual = shape.data_type().ok_or(ShapeError::InvalidShape { op })?;
            if !shape.is_scalar() || !compatible(*data_type, actual) {
                return Err(ShapeError::InvalidClosure {
                    op,
                    message: format!("expected a scalar of type '{data_type}' at position {index} but got {shape}"),
                });
            }
        }
    }
    Ok(())
}
