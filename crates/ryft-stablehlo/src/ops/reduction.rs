//! Reductions over whole axes and over sliding windows, along with the arg-min/arg-max composite.

use half::{bf16, f16};
use tracing::trace;

use crate::attributes::{AttributeValue, ComparisonDirection};
use crate::errors::Error;
use crate::functions::FunctionBuilder;
use crate::literals::{TensorData, TensorLiteral};
use crate::operations::OpType;
use crate::ops::{normalized_axes, normalized_axis, shape_refs};
use crate::shape_inference::ShapeError;
use crate::shape_inference::reduction::{self, Window};
use crate::statements::ClosureRef;
use crate::types::{DataType, Shape};
use crate::values::{FunctionId, Value};

pub const REDUCE_DIMENSIONS_ATTRIBUTE: &'static str = "dimensions";
pub const REDUCE_WINDOW_DIMENSIONS_ATTRIBUTE: &'static str = "window_dimensions";
pub const REDUCE_WINDOW_STRIDES_ATTRIBUTE: &'static str = "window_strides";
pub const REDUCE_WINDOW_BASE_DILATIONS_ATTRIBUTE: &'static str = "base_dilations";
pub const REDUCE_WINDOW_WINDOW_DILATIONS_ATTRIBUTE: &'static str = "window_dilations";
pub const REDUCE_WINDOW_PADDING_ATTRIBUTE: &'static str = "padding";

/// Label of the block that introduces the combinator of a reduction.
pub const REDUCTION_BODY_LABEL: &'static str = "body";

/// Extremum that [`FunctionBuilder::arg_min_max`] looks for.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ArgMinMaxMode {
    Min,
    Max,
}

impl<'p> FunctionBuilder<'p> {
    /// Appends a reduction of `inputs` over `dimensions` using `body` as the combinator.
    ///
    /// Every input is paired with a scalar initial value of the same element type. `body` must be a returned closure
    /// of this function that takes `2 * inputs.len()` scalars (the accumulated values followed by the values being
    /// reduced) and returns `inputs.len()` scalars.
    pub fn reduce(
        &mut self,
        inputs: &[Value],
        init_values: &[Value],
        dimensions: &[i64],
        body: FunctionId,
    ) -> Result<Vec<Value>, Error> {
        let input_shapes = self.input_shapes(inputs)?;
        let init_value_shapes = self.input_shapes(init_values)?;
        let signature = self.closure_signature(body)?;
        let outputs =
            reduction::reduce(&shape_refs(&input_shapes), &shape_refs(&init_value_shapes), dimensions, &signature)?;
        let dimensions = normalized_axes(dimensions, input_shapes[0].rank());
        let attributes = vec![(REDUCE_DIMENSIONS_ATTRIBUTE, AttributeValue::i64_array(&dimensions))];
        let operands = inputs.iter().chain(init_values).copied().collect::<Vec<_>>();
        let closures = vec![ClosureRef { label: REDUCTION_BODY_LABEL, function: body }];
        self.append(OpType::Reduce, &operands, attributes, closures, outputs)
    }

    /// Appends a reduction of every `window` of `inputs` using `body` as the combinator. The requirements on
    /// `init_values` and `body` are the same as for [`FunctionBuilder::reduce`].
    pub fn reduce_window(
        &mut self,
        inputs: &[Value],
        init_values: &[Value],
        window: &Window,
        body: FunctionId,
    ) -> Result<Vec<Value>, Error> {
        let input_shapes = self.input_shapes(inputs)?;
        let init_value_shapes = self.input_shapes(init_values)?;
        let signature = self.closure_signature(body)?;
        let outputs =
            reduction::reduce_window(&shape_refs(&input_shapes), &shape_refs(&init_value_shapes), window, &signature)?;
        let as_i64 = |values: &[usize]| values.iter().map(|value| *value as i64).collect::<Vec<_>>();
        let padding = window.padding.iter().map(|(low, high)| [*low, *high]).collect::<Vec<_>>();
        let attributes = vec![
            (REDUCE_WINDOW_DIMENSIONS_ATTRIBUTE, AttributeValue::i64_array(&as_i64(&window.dimensions))),
            (REDUCE_WINDOW_STRIDES_ATTRIBUTE, AttributeValue::i64_array(&as_i64(&window.strides))),
            (REDUCE_WINDOW_BASE_DILATIONS_ATTRIBUTE, AttributeValue::i64_array(&as_i64(&window.base_dilations))),
            (REDUCE_WINDOW_WINDOW_DILATIONS_ATTRIBUTE, AttributeValue::i64_array(&as_i64(&window.window_dilations))),
            (REDUCE_WINDOW_PADDING_ATTRIBUTE, AttributeValue::i64_matrix(&padding)),
        ];
        let operands = inputs.iter().chain(init_values).copied().collect::<Vec<_>>();
        let closures = vec![ClosureRef { label: REDUCTION_BODY_LABEL, function: body }];
        self.append(OpType::ReduceWindow, &operands, attributes, closures, outputs)
    }

    /// Appends the computation of the index of the smallest value along `axis` of `operand`.
    pub fn arg_min(&mut self, operand: Value, axis: i64, index_data_type: DataType) -> Result<Value, Error> {
        self.arg_min_max(operand, axis, index_data_type, ArgMinMaxMode::Min)
    }

    /// Appends the computation of the index of the largest value along `axis` of `operand`.
    pub fn arg_max(&mut self, operand: Value, axis: i64, index_data_type: DataType) -> Result<Value, Error> {
        self.arg_min_max(operand, axis, index_data_type, ArgMinMaxMode::Max)
    }

    /// Appends the computation of the index of the extreme value along `axis` of `operand` and returns the indices,
    /// which have element type `index_data_type`. Ties are broken in favor of the smallest index.
    ///
    /// There is no dedicated operation for this. Instead, this appends an iota of candidate indices, the initial
    /// values of the search, a closure that picks the better of two `(value, index)` pairs, and a two-operand
    /// [`FunctionBuilder::reduce`] that uses that closure. The element type of `operand` must be an integer type or
    /// one of `f16`, `bf16`, `f32`, and `f64`, since the initial value of the search must be representable as a
    /// literal.
    pub fn arg_min_max(
        &mut self,
        operand: Value,
        axis: i64,
        index_data_type: DataType,
        mode: ArgMinMaxMode,
    ) -> Result<Value, Error> {
        let op = OpType::ArgMinMax;
        let shapes = self.input_shapes(&[operand])?;
        let shape = &shapes[0];
        reduction::arg_min_max(shape, axis, index_data_type)?;
        let data_type = shape.data_type().ok_or(ShapeError::InvalidShape { op })?;
        let initial_value = initial_value(data_type, mode).ok_or(ShapeError::UnsupportedDataType {
            op,
            data_type,
            expected: "an integer type or one of 'f16', 'bf16', 'f32', and 'f64'",
        })?;
        let initial_index = TensorLiteral::from_data(Shape::scalar(index_data_type), zero(index_data_type))?;
        let axis = normalized_axis(axis, shape.rank());

        let indices = self.iota(shape.with_data_type(index_data_type), axis)?;
        let initial_value = self.constant(initial_value)?;
        let initial_index = self.constant(initial_index)?;
        let combinator = {
            let mut closure = self.closure()?;
            let lhs_value = closure.input(Shape::scalar(data_type))?;
            let lhs_index = closure.input(Shape::scalar(index_data_type))?;
            let rhs_value = closure.input(Shape::scalar(data_type))?;
            let rhs_index = closure.input(Shape::scalar(index_data_type))?;
            let direction = match mode {
                ArgMinMaxMode::Min => ComparisonDirection::LessThan,
                ArgMinMaxMode::Max => ComparisonDirection::GreaterThan,
            };
            let lhs_is_better = closure.compare(lhs_value, rhs_value, direction, None)?;
            let is_tie = closure.compare(lhs_value, rhs_value, ComparisonDirection::Equal, None)?;
            let value = closure.select(lhs_is_better, lhs_value, rhs_value)?;
            let index = closure.select(lhs_is_better, lhs_index, rhs_index)?;
            let smallest_index = closure.minimum(lhs_index, rhs_index)?;
            let index = closure.select(is_tie, smallest_index, index)?;
            closure.r#return(&[value, index])?;
            closure.id()
        };
        let outputs = self.reduce(&[operand, indices], &[initial_value, initial_index], &[axis], combinator)?;
        trace!(?mode, axis, "appended arg-min/arg-max reduction");
        Ok(outputs[1])
    }
}

/// Returns the value that every element of `data_type` compares as better than or equal to for `mode`, or [`None`]
/// if that value cannot be represented as a literal.
fn initial_value(data_type: DataType, mode: ArgMinMaxMode) -> Option<TensorLiteral> {
    let maximum = mode == ArgMinMaxMode::Min;
    let bits = data_type.bit_width();
    let data = match data_type {
        DataType::Float16 => TensorData::Float16(vec![if maximum { f16::INFINITY } else { f16::NEG_INFINITY }]),
        DataType::BFloat16 => TensorData::BFloat16(vec![if maximum { bf16::INFINITY } else { bf16::NEG_INFINITY }]),
        DataType::Float32 => TensorData::Float32(vec![if maximum { f32::INFINITY } else { f32::NEG_INFINITY }]),
        DataType::Float64 => TensorData::Float64(vec![if maximum { f64::INFINITY } else { f64::NEG_INFINITY }]),
        data_type if data_type.is_signed_integer() => {
            let largest = if bits >= 64 { i64::MAX } else { (1i64 << (bits - 1)) - 1 };
            TensorData::Integer(vec![if maximum { largest } else { -largest - 1 }])
        }
        data_type if data_type.is_unsigned_integer() => {
            let largest = if bits >= 64 { u64::MAX } else { (1u64 << bits) - 1 };
            TensorData::UnsignedInteger(vec![if maximum { largest } else { 0 }])
        }
        _ => return None,
    };
    TensorLiteral::from_data(Shape::scalar(data_type), data).ok()
}

fn zero(data_type: DataType) -> TensorData {
    if data_type.is_unsigned_integer() { TensorData::UnsignedInteger(vec![0]) } else { TensorData::Integer(vec![0]) }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    use super::*;

    use crate::programs::Program;

    fn sum_closure(builder: &mut FunctionBuilder<'_>, data_type: DataType) -> FunctionId {
        let mut closure = builder.closure().unwrap();
        let lhs = closure.input(Shape::scalar(data_type)).unwrap();
        let rhs = closure.input(Shape::scalar(data_type)).unwrap();
        let sum = closure.add(lhs, rhs).unwrap();
        closure.r#return(&[sum]).unwrap();
        closure.id()
    }

    #[test]
    fn test_reduce() {
        let mut program = Program::new("test");
        let main = program.function("main", &[Shape::new(DataType::Float32, [2, 3])]).unwrap();
        let mut builder = program.builder(main).unwrap();
        let x = builder.inputs()[0];
        let zero = builder.constant(TensorLiteral::scalar(0.0f32)).unwrap();
        let sum = sum_closure(&mut builder, DataType::Float32);
        let outputs = builder.reduce(&[x], &[zero], &[-1], sum).unwrap();
        builder.r#return(&outputs).unwrap();
        assert_eq!(
            program.build().unwrap(),
            indoc! {r#"
                module @test {
                  func.func @main(%arg0: tensor<2x3xf32>) -> tensor<2xf32> {
                    %0 = "stablehlo.constant"() { value = dense<0.0> : tensor<f32> } : () -> tensor<f32>
                    %2 = "stablehlo.reduce"(%arg0, %0) ({
                    ^body(%arg1: tensor<f32>, %arg2: tensor<f32>):
                      %1 = "stablehlo.add"(%arg1, %arg2) : (tensor<f32>, tensor<f32>) -> tensor<f32>
                      "stablehlo.return"(%1) : (tensor<f32>) -> ()
                    }) { dimensions = array<i64: 1> } : (tensor<2x3xf32>, tensor<f32>) -> tensor<2xf32>
                    "func.return"(%2) : (tensor<2xf32>) -> ()
                  }
                }
            "#},
        );
    }

    #[test]
    fn test_reduce_rejects_mismatched_combinators() {
        let mut program = Program::new("test");
        let main = program.function("main", &[Shape::new(DataType::Float32, [2, 3])]).unwrap();
        let mut builder = program.builder(main).unwrap();
        let x = builder.inputs()[0];
        let zero = builder.constant(TensorLiteral::scalar(0.0f32)).unwrap();
        let sum = sum_closure(&mut builder, DataType::Int32);
        assert!(matches!(
            builder.reduce(&[x], &[zero], &[0], sum),
            Err(Error::Shape(ShapeError::InvalidClosure { op: OpType::Reduce, .. })),
        ));
        assert_eq!(builder.function().statements().len(), 1);
    }

    #[test]
    fn test_reduce_window() {
        let mut program = Program::new("test");
        let main = program.function("main", &[Shape::new(DataType::Float32, [10])]).unwrap();
        let mut builder = program.builder(main).unwrap();
        let x = builder.inputs()[0];
        let zero = builder.constant(TensorLiteral::scalar(0.0f32)).unwrap();
        let sum = sum_closure(&mut builder, DataType::Float32);
        let window = Window::new([3]).with_strides([3]).with_padding([(1, 0)]);
        let outputs = builder.reduce_window(&[x], &[zero], &window, sum).unwrap();
        assert_eq!(builder.shape(outputs[0]).unwrap(), &Shape::new(DataType::Float32, [3]));
        builder.r#return(&outputs).unwrap();
        assert!(program.build().unwrap().contains(concat!(
            "    }) {\n",
            "      base_dilations = array<i64: 1>,\n",
            "      padding = dense<[[1, 0]]> : tensor<1x2xi64>,\n",
            "      window_dilations = array<i64: 1>,\n",
            "      window_dimensions = array<i64: 3>,\n",
            "      window_strides = array<i64: 3>\n",
            "    } : (tensor<10xf32>, tensor<f32>) -> tensor<3xf32>\n",
        )));
    }

    #[test]
    fn test_arg_min_max() {
        let mut program = Program::new("test");
        let main = program.function("main", &[Shape::new(DataType::Float32, [4, 5])]).unwrap();
        let mut builder = program.builder(main).unwrap();
        let x = builder.inputs()[0];
        let indices = builder.arg_max(x, -1, DataType::Int32).unwrap();
        assert_eq!(builder.shape(indices).unwrap(), &Shape::new(DataType::Int32, [4]));
        builder.r#return(&[indices]).unwrap();
        let text = program.build().unwrap();
        assert!(text.contains(
            "%0 = \"stablehlo.iota\"() { iota_dimension = 1 : i64 } : () -> tensor<4x5xi32>\n",
        ));
        assert!(text.contains(
            "%1 = \"stablehlo.constant\"() { value = dense<0xFF800000> : tensor<f32> } : () -> tensor<f32>\n",
        ));
        assert!(text.contains(concat!(
            "    ^body(%arg1: tensor<f32>, %arg2: tensor<i32>, ",
            "%arg3: tensor<f32>, %arg4: tensor<i32>):\n",
        )));
        assert!(text.contains("comparison_direction = #stablehlo<comparison_direction GT>"));
        assert!(text.contains("    \"func.return\"(%10) : (tensor<4xi32>) -> ()\n"));
    }

    #[test]
    fn test_arg_min_max_rejects_invalid_inputs() {
        let mut program = Program::new("test");
        let main = program
            .function(
                "main",
                &[
                    Shape::new(DataType::Float8E4M3FN, [4]),
                    Shape::new(DataType::Boolean, [4]),
                    Shape::scalar(DataType::Float32),
                ],
            )
            .unwrap();
        let mut builder = program.builder(main).unwrap();
        let inputs = builder.inputs();
        assert!(matches!(
            builder.arg_min(inputs[0], 0, DataType::Int32),
            Err(Error::Shape(ShapeError::UnsupportedDataType { op: OpType::ArgMinMax, .. })),
        ));
        assert!(builder.arg_min(inputs[1], 0, DataType::Int32).is_err());
        assert!(builder.arg_min(inputs[2], 0, DataType::Int32).is_err());
        assert!(builder.arg_min(inputs[0], 0, DataType::Float32).is_err());
        assert!(builder.function().statements().is_empty());
    }

    #[test]
    fn test_initial_values() {
        let render = |data_type, mode| initial_value(data_type, mode).unwrap().render();
        assert_eq!(render(DataType::Int8, ArgMinMaxMode::Min), "dense<127> : tensor<i8>");
        assert_eq!(render(DataType::Int8, ArgMinMaxMode::Max), "dense<-128> : tensor<i8>");
        assert_eq!(render(DataType::UnsignedInt64, ArgMinMaxMode::Min), "dense<18446744073709551615> : tensor<ui64>");
        assert_eq!(render(DataType::BFloat16, ArgMinMaxMode::Min), "dense<0x7F80> : tensor<bf16>");
        assert!(initial_value(DataType::Complex64, ArgMinMaxMode::Max).is_none());
    }
}
