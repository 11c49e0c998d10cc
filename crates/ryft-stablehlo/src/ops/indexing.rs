//! Gathers, scatters, and dynamic slices.

use crate::attributes::{AttributeValue, GatherDimensions, ScatterDimensions};
use crate::errors::Error;
use crate::functions::FunctionBuilder;
use crate::operations::OpType;
use crate::ops::{normalized_axes, normalized_axis, shape_refs};
use crate::shape_inference::indexing;
use crate::statements::ClosureRef;
use crate::values::{FunctionId, Value};

pub const GATHER_DIMENSION_NUMBERS_ATTRIBUTE: &'static str = "dimension_numbers";
pub const GATHER_SLICE_SIZES_ATTRIBUTE: &'static str = "slice_sizes";
pub const SCATTER_DIMENSION_NUMBERS_ATTRIBUTE: &'static str = "scatter_dimension_numbers";
pub const DYNAMIC_SLICE_SIZES_ATTRIBUTE: &'static str = "slice_sizes";

/// Label of the block that introduces the update combinator of a [`FunctionBuilder::scatter`].
pub const SCATTER_UPDATE_COMPUTATION_LABEL: &'static str = "update_computation";

impl<'p> FunctionBuilder<'p> {
    /// Appends a gather of slices of `operand` that start at the positions stored in `start_indices`. Refer to
    /// [`indexing::gather`] for the rules that determine the output shape.
    pub fn gather(
        &mut self,
        operand: Value,
        start_indices: Value,
        dimensions: &GatherDimensions,
        slice_sizes: &[usize],
    ) -> Result<Value, Error> {
        let shapes = self.input_shapes(&[operand, start_indices])?;
        let output = indexing::gather(&shapes[0], &shapes[1], dimensions, slice_sizes)?;
        let dimensions = normalized_gather_dimensions(dimensions, shapes[0].rank(), shapes[1].rank(), output.rank());
        let slice_sizes = slice_sizes.iter().map(|size| *size as i64).collect::<Vec<_>>();
        let attributes = vec![
            (GATHER_DIMENSION_NUMBERS_ATTRIBUTE, AttributeValue::literal(&dimensions)),
            (GATHER_SLICE_SIZES_ATTRIBUTE, AttributeValue::i64_array(&slice_sizes)),
        ];
        self.append_single(OpType::Gather, &[operand, start_indices], attributes, Vec::new(), output)
    }

    /// Appends a scatter of `updates` into `inputs` at the positions stored in `scatter_indices`. Existing values and
    /// updates are combined by `update_computation`, which must be a returned closure of this function that takes
    /// `2 * inputs.len()` scalars (all current values followed by all updates) and returns `inputs.len()` scalars.
    pub fn scatter(
        &mut self,
        inputs: &[Value],
        scatter_indices: Value,
        updates: &[Value],
        dimensions: &ScatterDimensions,
        update_computation: FunctionId,
    ) -> Result<Vec<Value>, Error> {
        let input_shapes = self.input_shapes(inputs)?;
        let index_shapes = self.input_shapes(&[scatter_indices])?;
        let update_shapes = self.input_shapes(updates)?;
        let signature = self.closure_signature(update_computation)?;
        let outputs = indexing::scatter(
            &shape_refs(&input_shapes),
            &index_shapes[0],
            &shape_refs(&update_shapes),
            dimensions,
            &signature,
        )?;
        let operands =
            inputs.iter().copied().chain([scatter_indices]).chain(updates.iter().copied()).collect::<Vec<_>>();
        let dimensions = normalized_scatter_dimensions(
            dimensions,
            input_shapes[0].rank(),
            index_shapes[0].rank(),
            update_shapes[0].rank(),
        );
        let attributes = vec![(SCATTER_DIMENSION_NUMBERS_ATTRIBUTE, AttributeValue::literal(&dimensions))];
        let closures = vec![ClosureRef { label: SCATTER_UPDATE_COMPUTATION_LABEL, function: update_computation }];
        self.append(OpType::Scatter, &operands, attributes, closures, outputs)
    }

    /// Appends a slice of `operand` with static `slice_sizes` that starts at the dynamic, scalar `start_indices`.
    pub fn dynamic_slice(
        &mut self,
        operand: Value,
        start_indices: &[Value],
        slice_sizes: &[usize],
    ) -> Result<Value, Error> {
        let operand_shapes = self.input_shapes(&[operand])?;
        let index_shapes = self.input_shapes(start_indices)?;
        let output = indexing::dynamic_slice(&operand_shapes[0], &shape_refs(&index_shapes), slice_sizes)?;
        let slice_sizes = slice_sizes.iter().map(|size| *size as i64).collect::<Vec<_>>();
        let attributes = vec![(DYNAMIC_SLICE_SIZES_ATTRIBUTE, AttributeValue::i64_array(&slice_sizes))];
        let operands = [operand].into_iter().chain(start_indices.iter().copied()).collect::<Vec<_>>();
        self.append_single(OpType::DynamicSlice, &operands, attributes, Vec::new(), output)
    }

    /// Appends an overwrite of the slice of `operand` that starts at the dynamic, scalar `start_indices` with `update`.
    pub fn dynamic_update_slice(
        &mut self,
        operand: Value,
        update: Value,
        start_indices: &[Value],
    ) -> Result<Value, Error> {
        let shapes = self.input_shapes(&[operand, update])?;
        let index_shapes = self.input_shapes(start_indices)?;
        let output = indexing::dynamic_update_slice(&shapes[0], &shapes[1], &shape_refs(&index_shapes))?;
        let operands = [operand, update].into_iter().chain(start_indices.iter().copied()).collect::<Vec<_>>();
        self.append_single(OpType::DynamicUpdateSlice, &operands, Vec::new(), Vec::new(), output)
    }
}

/// The index vector axis may refer to the implicit trailing axis of the indices, so it is normalized against
/// `indices_rank + 1`.
fn normalized_gather_dimensions(
    dimensions: &GatherDimensions,
    operand_rank: usize,
    indices_rank: usize,
    output_rank: usize,
) -> GatherDimensions {
    GatherDimensions {
        offset_dims: normalized_axes(&dimensions.offset_dims, output_rank),
        collapsed_slice_dims: normalized_axes(&dimensions.collapsed_slice_dims, operand_rank),
        operand_batching_dims: normalized_axes(&dimensions.operand_batching_dims, operand_rank),
        start_indices_batching_dims: normalized_axes(&dimensions.start_indices_batching_dims, indices_rank),
        start_index_map: normalized_axes(&dimensions.start_index_map, operand_rank),
        index_vector_dim: normalized_axis(dimensions.index_vector_dim, indices_rank + 1),
    }
}

fn normalized_scatter_dimensions(
    dimensions: &ScatterDimensions,
    input_rank: usize,
    indices_rank: usize,
    update_rank: usize,
) -> ScatterDimensions {
    ScatterDimensions {
        update_window_dims: normalized_axes(&dimensions.update_window_dims, update_rank),
        inserted_window_dims: normalized_axes(&dimensions.inserted_window_dims, input_rank),
        input_batching_dims: normalized_axes(&dimensions.input_batching_dims, input_rank),
        scatter_indices_batching_dims: normalized_axes(&dimensions.scatter_indices_batching_dims, indices_rank),
        scatter_dims_to_operand_dims: normalized_axes(&dimensions.scatter_dims_to_operand_dims, input_rank),
        index_vector_dim: normalized_axis(dimensions.index_vector_dim, indices_rank + 1),
    }
}
