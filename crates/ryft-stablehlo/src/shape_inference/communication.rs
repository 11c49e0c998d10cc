//! Collective communication operations.
//!
//! These operations exchange data between the devices that participate in one replica group. Replica groups are
//! lists of device ids (typically computed by
//! [`DeviceMesh::compute_replica_groups`](crate::sharding::DeviceMesh::compute_replica_groups)) that must all have the
//! same size, and no device may appear in more than one group.

use std::collections::HashSet;

use crate::operations::OpType;
use crate::shape_inference::{ClosureSignature, ShapeError, check_combinator, normalize_axis, valid_data_type};
use crate::types::Shape;

/// Validates `replica_groups` and returns the size of each group.
pub fn replica_group_size(op: OpType, replica_groups: &[Vec<i64>]) -> Result<usize, ShapeError> {
    let invalid = |message: String| ShapeError::InvalidParameter { op, parameter: "replica_groups", message };
    let Some(first) = replica_groups.first() else {
        return Err(invalid("expected at least one replica group".to_string()));
    };
    let size = first.len();
    if size == 0 {
        return Err(invalid("replica groups must not be empty".to_string()));
    }
    let mut seen = HashSet::new();
    for group in replica_groups {
        if group.len() != size {
            return Err(invalid(format!("expected every replica group to have size {size} but got {group:?}")));
        }
        for id in group {
            if *id < 0 {
                return Err(invalid(format!("device id {id} is negative")));
            }
            if !seen.insert(*id) {
                return Err(invalid(format!("device id {id} appears in more than one position")));
            }
        }
    }
    Ok(size)
}

fn check_operands(op: OpType, operands: &[&Shape]) -> Result<(), ShapeError> {
    if operands.is_empty() {
        return Err(ShapeError::OperandCountMismatch { op, expected: 1, actual: 0 });
    }
    for operand in operands {
        valid_data_type(op, operand)?;
    }
    Ok(())
}

/// Infers the output shapes of an all-gather, which concatenates the operands of every device in a replica group
/// along `all_gather_dim`.
pub fn all_gather(
    operands: &[&Shape],
    all_gather_dim: i64,
    replica_groups: &[Vec<i64>],
) -> Result<Vec<Shape>, ShapeError> {
    let op = OpType::AllGather;
    check_operands(op, operands)?;
    let group_size = replica_group_size(op, replica_groups)?;
    operands
        .iter()
        .map(|operand| -> Result<Shape, ShapeError> {
            let axis = normalize_axis(op, all_gather_dim, operand.rank())?;
            let mut dimensions = operand.dimensions().to_vec();
            dimensions[axis] *= group_size;
            Ok(operand.with_dimensions(dimensions))
        })
        .collect()
}

/// Infers the output shapes of an all-to-all, which splits every operand into `split_count` blocks along
/// `split_dimension`, scatters the blocks among the devices of a replica group, and concatenates the received blocks
/// along `concat_dimension`.
pub fn all_to_all(
    operands: &[&Shape],
    split_dimension: i64,
    concat_dimension: i64,
    split_count: usize,
    replica_groups: &[Vec<i64>],
) -> Result<Vec<Shape>, ShapeError> {
    let op = OpType::AllToAll;
    check_operands(op, operands)?;
    let group_size = replica_group_size(op, replica_groups)?;
    if split_count == 0 || split_count != group_size {
        return Err(ShapeError::InvalidParameter {
            op,
            parameter: "split_count",
            message: format!("expected the replica group size {group_size} but got {split_count}"),
        });
    }
    operands
        .iter()
        .map(|operand| -> Result<Shape, ShapeError> {
            let split_axis = normalize_axis(op, split_dimension, operand.rank())?;
            let concat_axis = normalize_axis(op, concat_dimension, operand.rank())?;
            let mut dimensions = operand.dimensions().to_vec();
            if dimensions[split_axis] % split_count != 0 {
                return Err(ShapeError::InvalidParameter {
                    op,
                    parameter: "split_dimension",
                    message: format!("size {} is not divisible by {split_count}", dimensions[split_axis]),
                });
            }
            dimensions[split_axis] /= split_count;
            dimensions[concat_axis] *= split_count;
            Ok(operand.with_dimensions(dimensions))
        })
        .collect()
}

/// Infers the output shapes of an all-reduce, which are the operand shapes. `computation` must combine two scalars
/// of the element type of each operand into one.
pub fn all_reduce(
    operands: &[&Shape],
    replica_groups: &[Vec<i64>],
    computation: &ClosureSignature,
) -> Result<Vec<Shape>, ShapeError> {
    let op = OpType::AllReduce;
    check_operands(op, operands)?;
    replica_group_size(op, replica_groups)?;
    let data_types = operands.iter().map(|operand| valid_data_type(op, operand)).collect::<Result<Vec<_>, _>>()?;
    check_combinator(op, computation, &data_types, false)?;
    Ok(operands.iter().map(|operand| (*operand).clone()).collect())
}

/// Infers the output shape of a collective permute, which sends the operand of every source device to the paired
/// target device. No device may appear more than once as a source or more than once as a target.
pub fn collective_permute(operand: &Shape, source_target_pairs: &[(i64, i64)]) -> Result<Shape, ShapeError> {
    let op = OpType::CollectivePermute;
    valid_data_type(op, operand)?;
    let invalid = |message: String| ShapeError::InvalidParameter { op, parameter: "source_target_pairs", message };
    if source_target_pairs.is_empty() {
        return Err(invalid("expected at least one source-target pair".to_string()));
    }
    let mut sources = HashSet::new();
    let mut targets = HashSet::new();
    for (source, target) in source_target_pairs {
        if *source < 0 || *target < 0 {
            return Err(invalid(format!("pair ({source}, {target}) contains a negative device id")));
        }
        if !sources.insert(*source) || !targets.insert(*target) {
            return Err(invalid(format!("pair ({source}, {target}) reuses a source or a target")));
        }
    }
    Ok(operand.clone())
}

/// Infers the output shape of a collective broadcast, which is the operand shape.
pub fn collective_broadcast(operand: &Shape, replica_groups: &[Vec<i64>]) -> Result<Shape, ShapeError> {
    let op = OpType::CollectiveBroadcast;
    valid_data_type(op, operand)?;
    replica_group_size(op, replica_groups)?;
    Ok(operand.clone())
}
