//! Constants and operations that rearrange tensors: broadcasting, reshaping, transposing, slicing, concatenating,
//! and padding.

use crate::attributes::AttributeValue;
use crate::errors::Error;
use crate::functions::FunctionBuilder;
use crate::literals::TensorLiteral;
use crate::operations::OpType;
use crate::ops::{normalized_axes, normalized_axis, shape_refs};
use crate::shape_inference::manipulation;
use crate::types::DataType;
use crate::values::Value;

pub const CONSTANT_VALUE_ATTRIBUTE: &'static str = "value";
pub const BROADCAST_DIMENSIONS_ATTRIBUTE: &'static str = "broadcast_dimensions";
pub const TRANSPOSE_PERMUTATION_ATTRIBUTE: &'static str = "permutation";
pub const SLICE_START_INDICES_ATTRIBUTE: &'static str = "start_indices";
pub const SLICE_LIMIT_INDICES_ATTRIBUTE: &'static str = "limit_indices";
pub const SLICE_STRIDES_ATTRIBUTE: &'static str = "strides";
pub const CONCATENATE_DIMENSION_ATTRIBUTE: &'static str = "dimension";
pub const PAD_EDGE_PADDING_LOW_ATTRIBUTE: &'static str = "edge_padding_low";
pub const PAD_EDGE_PADDING_HIGH_ATTRIBUTE: &'static str = "edge_padding_high";
pub const PAD_INTERIOR_PADDING_ATTRIBUTE: &'static str = "interior_padding";

impl<'p> FunctionBuilder<'p> {
    /// Appends a constant whose shape and contents are those of `literal`.
    pub fn constant(&mut self, literal: TensorLiteral) -> Result<Value, Error> {
        let output = literal.shape().clone();
        let attributes = vec![(CONSTANT_VALUE_ATTRIBUTE, AttributeValue::Tensor(literal))];
        self.append_single(OpType::Constant, &[], attributes, Vec::new(), output)
    }

    /// Appends a broadcast of `operand` to a tensor with the provided `dimensions`. Axis `i` of `operand` is mapped
    /// to axis `broadcast_dimensions[i]` of the output.
    pub fn broadcast_in_dim(
        &mut self,
        operand: Value,
        dimensions: &[usize],
        broadcast_dimensions: &[i64],
    ) -> Result<Value, Error> {
        let shapes = self.input_shapes(&[operand])?;
        let output = manipulation::broadcast_in_dim(&shapes[0], dimensions, broadcast_dimensions)?;
        let broadcast_dimensions = normalized_axes(broadcast_dimensions, dimensions.len());
        let attributes = vec![(BROADCAST_DIMENSIONS_ATTRIBUTE, AttributeValue::i64_array(&broadcast_dimensions))];
        self.append_single(OpType::BroadcastInDim, &[operand], attributes, Vec::new(), output)
    }

    pub fn reshape(&mut self, operand: Value, dimensions: &[usize]) -> Result<Value, Error> {
        let shapes = self.input_shapes(&[operand])?;
        let output = manipulation::reshape(&shapes[0], dimensions)?;
        self.append_single(OpType::Reshape, &[operand], Vec::new(), Vec::new(), output)
    }

    pub fn transpose(&mut self, operand: Value, permutation: &[i64]) -> Result<Value, Error> {
        let shapes = self.input_shapes(&[operand])?;
        let output = manipulation::transpose(&shapes[0], permutation)?;
        let permutation = normalized_axes(permutation, shapes[0].rank());
        let attributes = vec![(TRANSPOSE_PERMUTATION_ATTRIBUTE, AttributeValue::i64_array(&permutation))];
        self.append_single(OpType::Transpose, &[operand], attributes, Vec::new(), output)
    }

    /// Appends a static slice of `operand`. Every axis is sliced from `starts[i]` (inclusive) to `limits[i]`
    /// (exclusive) taking every `strides[i]`-th element.
    pub fn slice(&mut self, operand: Value, starts: &[i64], limits: &[i64], strides: &[i64]) -> Result<Value, Error> {
        let shapes = self.input_shapes(&[operand])?;
        let output = manipulation::slice(&shapes[0], starts, limits, strides)?;
        let attributes = vec![
            (SLICE_START_INDICES_ATTRIBUTE, AttributeValue::i64_array(starts)),
            (SLICE_LIMIT_INDICES_ATTRIBUTE, AttributeValue::i64_array(limits)),
            (SLICE_STRIDES_ATTRIBUTE, AttributeValue::i64_array(strides)),
        ];
        self.append_single(OpType::Slice, &[operand], attributes, Vec::new(), output)
    }

    /// Appends a concatenation of `inputs` along `axis`.
    pub fn concatenate(&mut self, inputs: &[Value], axis: i64) -> Result<Value, Error> {
        let shapes = self.input_shapes(inputs)?;
        let output = manipulation::concatenate(&shape_refs(&shapes), axis)?;
        let axis = normalized_axis(axis, output.rank());
        let attributes = vec![(CONCATENATE_DIMENSION_ATTRIBUTE, AttributeValue::typed_integer(axis, DataType::Int64))];
        self.append_single(OpType::Concatenate, inputs, attributes, Vec::new(), output)
    }

    /// Appends a padding of `operand` with the scalar `padding_value`. `low` and `high` are added to the edges of
    /// every axis (negative values remove elements) and `interior` is inserted between neighboring elements.
    pub fn pad(
        &mut self,
        operand: Value,
        padding_value: Value,
        low: &[i64],
        high: &[i64],
        interior: &[i64],
    ) -> Result<Value, Error> {
        let shapes = self.input_shapes(&[operand, padding_value])?;
        let output = manipulation::pad(&shapes[0], &shapes[1], low, high, interior)?;
        let attributes = vec![
            (PAD_EDGE_PADDING_LOW_ATTRIBUTE, AttributeValue::i64_array(low)),
            (PAD_EDGE_PADDING_HIGH_ATTRIBUTE, AttributeValue::i64_array(high)),
            (PAD_INTERIOR_PADDING_ATTRIBUTE, AttributeValue::i64_array(interior)),
        ];
        self.append_single(OpType::Pad, &[operand, padding_value], attributes, Vec::new(), output)
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    use crate::attributes::Render;
    use crate::errors::Error;
    use crate::literals::TensorLiteral;
    use crate::programs::Program;
    use crate::shape_inference::ShapeError;
    use crate::types::{DataType, Shape};

    #[test]
    fn test_constant() {
        let mut program = Program::new("test");
        let main = program.function("main", &[]).unwrap();
        let mut builder = program.builder(main).unwrap();
        let x = builder.constant(TensorLiteral::new([2, 2], vec![1.0f32, 2.5, -0.0, f32::NAN]).unwrap()).unwrap();
        let y = builder.constant(TensorLiteral::scalar(true)).unwrap();
        assert_eq!(builder.shape(x).unwrap(), &Shape::new(DataType::Float32, [2, 2]));
        assert_eq!(
            builder.function().statements()[0].attribute("value").unwrap().render(),
            "dense<[[1.0, 2.5], [-0.0, 0x7FC00000]]> : tensor<2x2xf32>",
        );
        builder.r#return(&[y]).unwrap();
        assert!(program.build().unwrap().ends_with(indoc! {r#"
                %1 = "stablehlo.constant"() { value = dense<true> : tensor<i1> } : () -> tensor<i1>
                "func.return"(%1) : (tensor<i1>) -> ()
              }
            }
        "#}));
    }

    #[test]
    fn test_broadcast_reshape_and_transpose() {
        let mut program = Program::new("test");
        let main = program.function("main", &[Shape::new(DataType::Float32, [3, 1])]).unwrap();
        let mut builder = program.builder(main).unwrap();
        let x = builder.inputs()[0];
        let broadcast = builder.broadcast_in_dim(x, &[2, 3, 4], &[1, -1]).unwrap();
        let reshaped = builder.reshape(broadcast, &[6, 4]).unwrap();
        let transposed = builder.transpose(reshaped, &[-1, 0]).unwrap();
        assert_eq!(builder.shape(broadcast).unwrap(), &Shape::new(DataType::Float32, [2, 3, 4]));
        assert_eq!(builder.shape(transposed).unwrap(), &Shape::new(DataType::Float32, [4, 6]));
        assert!(matches!(builder.reshape(x, &[4]), Err(Error::Shape(ShapeError::ElementCountMismatch { .. }))));
        let statements = builder.function().statements();
        assert_eq!(statements[0].attribute("broadcast_dimensions").unwrap().render(), "array<i64: 1, 2>");
        assert_eq!(statements[2].attribute("permutation").unwrap().render(), "array<i64: 1, 0>");
    }

    #[test]
    fn test_slice_concatenate_and_pad() {
        let mut program = Program::new("test");
        let main = program
            .function("main", &[Shape::new(DataType::Float32, [10]), Shape::scalar(DataType::Float32)])
            .unwrap();
        let mut builder = program.builder(main).unwrap();
        let inputs = builder.inputs();
        let sliced = builder.slice(inputs[0], &[2], &[4], &[1]).unwrap();
        let empty = builder.slice(inputs[0], &[3], &[3], &[1]).unwrap();
        let concatenated = builder.concatenate(&[sliced, inputs[0], empty], -1).unwrap();
        let padded = builder.pad(concatenated, inputs[1], &[1], &[-2], &[1]).unwrap();
        assert_eq!(builder.shape(sliced).unwrap(), &Shape::new(DataType::Float32, [2]));
        assert_eq!(builder.shape(empty).unwrap(), &Shape::new(DataType::Float32, [0]));
        assert_eq!(builder.shape(concatenated).unwrap(), &Shape::new(DataType::Float32, [12]));
        assert_eq!(builder.shape(padded).unwrap(), &Shape::new(DataType::Float32, [22]));
        assert_eq!(builder.function().statements()[2].attribute("dimension").unwrap().render(), "0 : i64");
        assert!(builder.slice(inputs[0], &[4], &[2], &[1]).is_err());
        assert!(builder.pad(inputs[0], inputs[0], &[0], &[0], &[0]).is_err());
    }
}
