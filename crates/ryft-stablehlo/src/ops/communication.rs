//! Collective communication operations.
//!
//! Every collective is assigned a fresh [`ChannelHandle`](crate::attributes::ChannelHandle) from the per-program
//! counter, but only once its operands and parameters have been validated. Hence, rejected collectives never leave
//! gaps in the channel numbering.

use tracing::debug;

use crate::attributes::AttributeValue;
use crate::errors::Error;
use crate::functions::FunctionBuilder;
use crate::operations::OpType;
use crate::ops::{normalized_axis, shape_refs};
use crate::shape_inference::communication;
use crate::statements::ClosureRef;
use crate::types::{DataType, Shape};
use crate::values::{FunctionId, Value};

pub const COLLECTIVE_CHANNEL_HANDLE_ATTRIBUTE: &'static str = "channel_handle";
pub const COLLECTIVE_REPLICA_GROUPS_ATTRIBUTE: &'static str = "replica_groups";
pub const COLLECTIVE_SOURCE_TARGET_PAIRS_ATTRIBUTE: &'static str = "source_target_pairs";
pub const ALL_GATHER_DIMENSION_ATTRIBUTE: &'static str = "all_gather_dim";
pub const ALL_TO_ALL_SPLIT_DIMENSION_ATTRIBUTE: &'static str = "split_dimension";
pub const ALL_TO_ALL_SPLIT_COUNT_ATTRIBUTE: &'static str = "split_count";
pub const ALL_TO_ALL_CONCATENATION_DIMENSION_ATTRIBUTE: &'static str = "concat_dimension";

/// Label of the block that introduces the combinator of a [`FunctionBuilder::all_reduce`].
pub const ALL_REDUCE_COMPUTATION_LABEL: &'static str = "computation";

impl<'p> FunctionBuilder<'p> {
    /// Appends an all-gather that concatenates `operands` across the devices of each replica group along
    /// `all_gather_dim`.
    pub fn all_gather(
        &mut self,
        operands: &[Value],
        all_gather_dim: i64,
        replica_groups: &[Vec<i64>],
    ) -> Result<Vec<Value>, Error> {
        let shapes = self.input_shapes(operands)?;
        let outputs = communication::all_gather(&shape_refs(&shapes), all_gather_dim, replica_groups)?;
        let all_gather_dim = normalized_axis(all_gather_dim, shapes[0].rank());
        let attributes = vec![
            (ALL_GATHER_DIMENSION_ATTRIBUTE, AttributeValue::typed_integer(all_gather_dim, DataType::Int64)),
            (COLLECTIVE_REPLICA_GROUPS_ATTRIBUTE, AttributeValue::i64_matrix(replica_groups)),
        ];
        self.append_collective(OpType::AllGather, operands, attributes, Vec::new(), outputs)
    }

    /// Appends an all-to-all that splits `operands` into `split_count` blocks along `split_dimension`, exchanges the
    /// blocks between the devices of each replica group, and concatenates the received blocks along
    /// `concat_dimension`.
    pub fn all_to_all(
        &mut self,
        operands: &[Value],
        split_dimension: i64,
        concat_dimension: i64,
        split_count: usize,
        replica_groups: &[Vec<i64>],
    ) -> Result<Vec<Value>, Error> {
        let shapes = self.input_shapes(operands)?;
        let outputs = communication::all_to_all(
            &shape_refs(&shapes),
            split_dimension,
            concat_dimension,
            split_count,
            replica_groups,
        )?;
        let rank = shapes[0].rank();
        let integer = |value: i64| AttributeValue::typed_integer(value, DataType::Int64);
        let attributes = vec![
            (ALL_TO_ALL_SPLIT_DIMENSION_ATTRIBUTE, integer(normalized_axis(split_dimension, rank))),
            (ALL_TO_ALL_CONCATENATION_DIMENSION_ATTRIBUTE, integer(normalized_axis(concat_dimension, rank))),
            (ALL_TO_ALL_SPLIT_COUNT_ATTRIBUTE, integer(split_count as i64)),
            (COLLECTIVE_REPLICA_GROUPS_ATTRIBUTE, AttributeValue::i64_matrix(replica_groups)),
        ];
        self.append_collective(OpType::AllToAll, operands, attributes, Vec::new(), outputs)
    }

    /// Appends an all-reduce that combines `operands` across the devices of each replica group using `computation`,
    /// which must be a returned closure of this function.
    pub fn all_reduce(
        &mut self,
        operands: &[Value],
        replica_groups: &[Vec<i64>],
        computation: FunctionId,
    ) -> Result<Vec<Value>, Error> {
        let shapes = self.input_shapes(operands)?;
        let signature = self.closure_signature(computation)?;
        let outputs = communication::all_reduce(&shape_refs(&shapes), replica_groups, &signature)?;
        let attributes = vec![(COLLECTIVE_REPLICA_GROUPS_ATTRIBUTE, AttributeValue::i64_matrix(replica_groups))];
        let closures = vec![ClosureRef { label: ALL_REDUCE_COMPUTATION_LABEL, function: computation }];
        self.append_collective(OpType::AllReduce, operands, attributes, closures, outputs)
    }

    /// Appends a collective permute that sends `operand` from the source to the target of every pair.
    pub fn collective_permute(&mut self, operand: Value, source_target_pairs: &[(i64, i64)]) -> Result<Value, Error> {
        let shapes = self.input_shapes(&[operand])?;
        let output = communication::collective_permute(&shapes[0], source_target_pairs)?;
        let pairs = source_target_pairs.iter().map(|(source, target)| [*source, *target]).collect::<Vec<_>>();
        let attributes = vec![(COLLECTIVE_SOURCE_TARGET_PAIRS_ATTRIBUTE, AttributeValue::i64_matrix(&pairs))];
        let outputs =
            self.append_collective(OpType::CollectivePermute, &[operand], attributes, Vec::new(), vec![output])?;
        Ok(outputs[0])
    }

    /// Appends a collective broadcast that sends `operand` from the first device of each replica group to all other
    /// devices of that group.
    pub fn collective_broadcast(&mut self, operand: Value, replica_groups: &[Vec<i64>]) -> Result<Value, Error> {
        let shapes = self.input_shapes(&[operand])?;
        let output = communication::collective_broadcast(&shapes[0], replica_groups)?;
        let attributes = vec![(COLLECTIVE_REPLICA_GROUPS_ATTRIBUTE, AttributeValue::i64_matrix(replica_groups))];
        let outputs =
            self.append_collective(OpType::CollectiveBroadcast, &[operand], attributes, Vec::new(), vec![output])?;
        Ok(outputs[0])
    }

    fn append_collective(
        &mut self,
        op: OpType,
        operands: &[Value],
        mut attributes: Vec<(&str, AttributeValue)>,
        closures: Vec<ClosureRef>,
        outputs: Vec<Shape>,
    ) -> Result<Vec<Value>, Error> {
        let handle = self.next_channel_handle();
        debug!(%op, channel = handle.handle, "allocated channel handle");
        attributes.push((COLLECTIVE_CHANNEL_HANDLE_ATTRIBUTE, AttributeValue::literal(&handle)));
        self.append(op, operands, attributes, closures, outputs)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::attributes::Render;
    use crate::errors::Error;
    use crate::programs::Program;
    use crate::shape_inference::ShapeError;
    use crate::types::{DataType, Shape};

    #[test]
    fn test_all_gather_and_all_to_all() {
        let mut program = Program::new("test");
        let main = program.function("main", &[Shape::new(DataType::Float32, [4, 6])]).unwrap();
        let mut builder = program.builder(main).unwrap();
        let x = builder.inputs()[0];
        let groups = vec![vec![0, 1], vec![2, 3]];
        let gathered = builder.all_gather(&[x], -1, &groups).unwrap();
        let exchanged = builder.all_to_all(&[x], 0, 1, 2, &groups).unwrap();
        assert_eq!(builder.shape(gathered[0]).unwrap(), &Shape::new(DataType::Float32, [4, 12]));
        assert_eq!(builder.shape(exchanged[0]).unwrap(), &Shape::new(DataType::Float32, [2, 12]));
        let statements = builder.function().statements();
        assert_eq!(statements[0].attribute("all_gather_dim").unwrap().render(), "1 : i64");
        assert_eq!(
            statements[0].attribute("replica_groups").unwrap().render(),
            "dense<[[0, 1], [2, 3]]> : tensor<2x2xi64>",
        );
        assert_eq!(
            statements[0].attribute("channel_handle").unwrap().render(),
            "#stablehlo.channel_handle<handle = 1, type = 1>",
        );
        assert_eq!(
            statements[1].attribute("channel_handle").unwrap().render(),
            "#stablehlo.channel_handle<handle = 2, type = 1>",
        );
        assert!(matches!(
            builder.all_to_all(&[x], 0, 1, 3, &groups),
            Err(Error::Shape(ShapeError::InvalidParameter { parameter: "split_count", .. })),
        ));
        assert!(builder.all_gather(&[x], 0, &[vec![0, 1], vec![1, 2]]).is_err());
    }

    #[test]
    fn test_all_reduce() {
        let mut program = Program::new("test");
        let main = program.function("main", &[Shape::new(DataType::Float32, [4])]).unwrap();
        let mut builder = program.builder(main).unwrap();
        let x = builder.inputs()[0];
        let sum = {
            let mut closure = builder.closure().unwrap();
            let lhs = closure.input(Shape::scalar(DataType::Float32)).unwrap();
            let rhs = closure.input(Shape::scalar(DataType::Float32)).unwrap();
            let sum = closure.add(lhs, rhs).unwrap();
            closure.r#return(&[sum]).unwrap();
            closure.id()
        };
        let outputs = builder.all_reduce(&[x], &[vec![0, 1, 2, 3]], sum).unwrap();
        builder.r#return(&outputs).unwrap();
        assert!(program.build().unwrap().contains(concat!(
            "    %1 = \"stablehlo.all_reduce\"(%arg0) ({\n",
            "    ^computation(%arg1: tensor<f32>, %arg2: tensor<f32>):\n",
            "      %0 = \"stablehlo.add\"(%arg1, %arg2) : (tensor<f32>, tensor<f32>) -> tensor<f32>\n",
            "      \"stablehlo.return\"(%0) : (tensor<f32>) -> ()\n",
            "    }) {\n",
            "      channel_handle = #stablehlo.channel_handle<handle = 1, type = 1>,\n",
            "      replica_groups = dense<[[0, 1, 2, 3]]> : tensor<1x4xi64>\n",
            "    } : (tensor<4xf32>) -> tensor<4xf32>\n",
        )));
    }

    #[test]
    fn test_rejected_collectives_do_not_allocate_channels() {
        let mut program = Program::new("test");
        let main = program.function("main", &[Shape::new(DataType::Int32, [4])]).unwrap();
        let mut builder = program.builder(main).unwrap();
        let x = builder.inputs()[0];
        assert!(builder.collective_permute(x, &[(0, 1), (1, 1)]).is_err());
        assert!(builder.collective_broadcast(x, &[]).is_err());
        let permuted = builder.collective_permute(x, &[(0, 1), (1, 0)]).unwrap();
        let broadcast = builder.collective_broadcast(permuted, &[vec![0, 1]]).unwrap();
        assert_eq!(builder.shape(broadcast).unwrap(), &Shape::new(DataType::Int32, [4]));
        let statements = builder.function().statements();
        assert_eq!(statements.len(), 2);
        assert_eq!(
            statements[0].attribute("source_target_pairs").unwrap().render(),
            "dense<[[0, 1], [1, 0]]> : tensor<2x2xi64>",
        );
        assert_eq!(
            statements[0].attribute("channel_handle").unwrap().render(),
            "#stablehlo.channel_handle<handle = 1, type = 1>",
        );
        assert_eq!(
            statements[1].attribute("channel_handle").unwrap().render(),
            "#stablehlo.channel_handle<handle = 2, type = 1>",
        );
    }
}
