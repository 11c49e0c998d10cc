//! General dot products and convolutions.

use crate::attributes::{AttributeValue, ConvolutionDimensions, DotDimensions};
use crate::errors::Error;
use crate::functions::FunctionBuilder;
use crate::operations::OpType;
use crate::ops::{normalized_axes, normalized_axis};
use crate::shape_inference::linear_algebra::{self, ConvolutionConfiguration};
use crate::types::DataType;
use crate::values::Value;

pub const DOT_DIMENSION_NUMBERS_ATTRIBUTE: &'static str = "dot_dimension_numbers";
pub const CONVOLUTION_DIMENSION_NUMBERS_ATTRIBUTE: &'static str = "dimension_numbers";
pub const CONVOLUTION_WINDOW_STRIDES_ATTRIBUTE: &'static str = "window_strides";
pub const CONVOLUTION_PADDING_ATTRIBUTE: &'static str = "padding";
pub const CONVOLUTION_LHS_DILATION_ATTRIBUTE: &'static str = "lhs_dilation";
pub const CONVOLUTION_RHS_DILATION_ATTRIBUTE: &'static str = "rhs_dilation";
pub const CONVOLUTION_FEATURE_GROUP_COUNT_ATTRIBUTE: &'static str = "feature_group_count";
pub const CONVOLUTION_BATCH_GROUP_COUNT_ATTRIBUTE: &'static str = "batch_group_count";

impl<'p> FunctionBuilder<'p> {
    /// Appends a general dot product of `lhs` and `rhs`. Refer to [`linear_algebra::dot_general`] for the layout of
    /// the output.
    pub fn dot_general(&mut self, lhs: Value, rhs: Value, dimensions: &DotDimensions) -> Result<Value, Error> {
        let shapes = self.input_shapes(&[lhs, rhs])?;
        let output = linear_algebra::dot_general(&shapes[0], &shapes[1], dimensions)?;
        let dimensions = normalized_dot_dimensions(dimensions, shapes[0].rank(), shapes[1].rank());
        let attributes = vec![(DOT_DIMENSION_NUMBERS_ATTRIBUTE, AttributeValue::literal(&dimensions))];
        self.append_single(OpType::DotGeneral, &[lhs, rhs], attributes, Vec::new(), output)
    }

    /// Appends a convolution of `lhs` (the input) with `rhs` (the kernel).
    pub fn convolution(
        &mut self,
        lhs: Value,
        rhs: Value,
        configuration: &ConvolutionConfiguration,
    ) -> Result<Value, Error> {
        let shapes = self.input_shapes(&[lhs, rhs])?;
        let output = linear_algebra::convolution(&shapes[0], &shapes[1], configuration)?;
        let as_i64 = |values: &[usize]| values.iter().map(|value| *value as i64).collect::<Vec<_>>();
        let padding = configuration.padding.iter().map(|(low, high)| [*low, *high]).collect::<Vec<_>>();
        let group_count = |count: usize| AttributeValue::typed_integer(count as i64, DataType::Int64);
        let dimensions = normalized_convolution_dimensions(&configuration.dimensions, shapes[0].rank());
        let attributes = vec![
            (CONVOLUTION_DIMENSION_NUMBERS_ATTRIBUTE, AttributeValue::literal(&dimensions)),
            (CONVOLUTION_WINDOW_STRIDES_ATTRIBUTE, AttributeValue::i64_array(&as_i64(&configuration.window_strides))),
            (CONVOLUTION_PADDING_ATTRIBUTE, AttributeValue::i64_matrix(&padding)),
            (CONVOLUTION_LHS_DILATION_ATTRIBUTE, AttributeValue::i64_array(&as_i64(&configuration.lhs_dilation))),
            (CONVOLUTION_RHS_DILATION_ATTRIBUTE, AttributeValue::i64_array(&as_i64(&configuration.rhs_dilation))),
            (CONVOLUTION_FEATURE_GROUP_COUNT_ATTRIBUTE, group_count(configuration.feature_group_count)),
            (CONVOLUTION_BATCH_GROUP_COUNT_ATTRIBUTE, group_count(configuration.batch_group_count)),
        ];
        self.append_single(OpType::Convolution, &[lhs, rhs], attributes, Vec::new(), output)
    }
}

fn normalized_dot_dimensions(dimensions: &DotDimensions, lhs_rank: usize, rhs_rank: usize) -> DotDimensions {
    DotDimensions {
        lhs_batching_dimensions: normalized_axes(&dimensions.lhs_batching_dimensions, lhs_rank),
        rhs_batching_dimensions: normalized_axes(&dimensions.rhs_batching_dimensions, rhs_rank),
        lhs_contracting_dimensions: normalized_axes(&dimensions.lhs_contracting_dimensions, lhs_rank),
        rhs_contracting_dimensions: normalized_axes(&dimensions.rhs_contracting_dimensions, rhs_rank),
    }
}

/// The input, kernel, and output of a convolution all have the same rank.
fn normalized_convolution_dimensions(dimensions: &ConvolutionDimensions, rank: usize) -> ConvolutionDimensions {
    ConvolutionDimensions {
        input_batch_dimension: normalized_axis(dimensions.input_batch_dimension, rank),
        input_feature_dimension: normalized_axis(dimensions.input_feature_dimension, rank),
        input_spatial_dimensions: normalized_axes(&dimensions.input_spatial_dimensions, rank),
        kernel_input_feature_dimension: normalized_axis(dimensions.kernel_input_feature_dimension, rank),
        kernel_output_feature_dimension: normalized_axis(dimensions.kernel_output_feature_dimension, rank),
        kernel_spatial_dimensions: normalized_axes(&dimensions.kernel_spatial_dimensions, rank),
        output_batch_dimension: normalized_axis(dimensions.output_batch_dimension, rank),
        output_feature_dimension: normalized_axis(dimensions.output_feature_dimension, rank),
        output_spatial_dimensions: normalized_axes(&dimensions.output_spatial_dimensions, rank),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::attributes::{ConvolutionDimensions, DotDimensions, Render};
    use crate::errors::Error;
    use crate::programs::Program;
    use crate::shape_inference::ShapeError;
    use crate::shape_inference::linear_algebra::ConvolutionConfiguration;
    use crate::types::{DataType, Shape};

    #[test]
    fn test_dot_general() {
        let mut program = Program::new("test");
        let main = program
            .function("main", &[Shape::new(DataType::Float32, [2, 3]), Shape::new(DataType::Float32, [3, 4])])
            .unwrap();
        let mut builder = program.builder(main).unwrap();
        let inputs = builder.inputs();
        let dimensions = DotDimensions::new(vec![1], vec![0], vec![], vec![]);
        let product = builder.dot_general(inputs[0], inputs[1], &dimensions).unwrap();
        assert_eq!(
            builder.function().statements()[0].attribute("dot_dimension_numbers").unwrap().render(),
            "#stablehlo.dot<lhs_contracting_dimensions = [1], rhs_contracting_dimensions = [0]>",
        );
        builder.r#return(&[product]).unwrap();
        assert!(program.build().unwrap().ends_with(concat!(
            "    %0 = \"stablehlo.dot_general\"(%arg0, %arg1) { dot_dimension_numbers = #stablehlo.dot<",
            "lhs_contracting_dimensions = [1], rhs_contracting_dimensions = [0]> }",
            " : (tensor<2x3xf32>, tensor<3x4xf32>) -> tensor<2x4xf32>\n",
            "    \"func.return\"(%0) : (tensor<2x4xf32>) -> ()\n",
            "  }\n",
            "}\n",
        )));
    }

    #[test]
    fn test_dot_general_rejects_mismatched_contractions() {
        let mut program = Program::new("test");
        let main = program
            .function("main", &[Shape::new(DataType::Float32, [2, 3]), Shape::new(DataType::Float32, [4, 3])])
            .unwrap();
        let mut builder = program.builder(main).unwrap();
        let inputs = builder.inputs();
        let dimensions = DotDimensions::new(vec![1], vec![0], vec![], vec![]);
        assert!(matches!(
            builder.dot_general(inputs[0], inputs[1], &dimensions),
            Err(Error::Shape(ShapeError::IncompatibleShapes { .. })),
        ));
        assert!(builder.function().statements().is_empty());
    }

    #[test]
    fn test_convolution() {
        let mut program = Program::new("test");
        let main = program
            .function(
                "main",
                &[Shape::new(DataType::Float32, [8, 32, 32, 3]), Shape::new(DataType::Float32, [3, 3, 3, 16])],
            )
            .unwrap();
        let mut builder = program.builder(main).unwrap();
        let inputs = builder.inputs();
        let configuration = ConvolutionConfiguration::new(ConvolutionDimensions::channels_last(2))
            .with_window_strides([2, 2])
            .with_padding([(1, 1), (1, 1)]);
        let output = builder.convolution(inputs[0], inputs[1], &configuration).unwrap();
        assert_eq!(builder.shape(output).unwrap(), &Shape::new(DataType::Float32, [8, 16, 16, 16]));
        builder.r#return(&[output]).unwrap();
        assert!(program.build().unwrap().contains(concat!(
            "    %0 = \"stablehlo.convolution\"(%arg0, %arg1) {\n",
            "      batch_group_count = 1 : i64,\n",
            "      dimension_numbers = #stablehlo.conv<[b, 0, 1, f]x[0, 1, i, o]->[b, 0, 1, f]>,\n",
            "      feature_group_count = 1 : i64,\n",
            "      lhs_dilation = array<i64: 1, 1>,\n",
            "      padding = dense<[[1, 1], [1, 1]]> : tensor<2x2xi64>,\n",
            "      rhs_dilation = array<i64: 1, 1>,\n",
            "      window_strides = array<i64: 2, 2>\n",
            "    } : (tensor<8x32x32x3xf32>, tensor<3x3x3x16xf32>) -> tensor<8x16x16x16xf32>\n",
        )));
    }

    #[test]
    fn test_dot_general_with_negative_axes() {
        let mut program = Program::new("test");
        let main = program
            .function("main", &[Shape::new(DataType::Float32, [5, 2, 3]), Shape::new(DataType::Float32, [5, 3, 4])])
            .unwrap();
        let mut builder = program.builder(main).unwrap();
        let inputs = builder.inputs();
        let dimensions = DotDimensions::new(vec![-1], vec![-2], vec![-3], vec![0]);
        let product = builder.dot_general(inputs[0], inputs[1], &dimensions).unwrap();
        assert_eq!(builder.shape(product).unwrap(), &Shape::new(DataType::Float32, [5, 2, 4]));
        assert_eq!(
            builder.function().statements()[0].attribute("dot_dimension_numbers").unwrap().render(),
            concat!(
                "#stablehlo.dot<lhs_batching_dimensions = [0], rhs_batching_dimensions = [0], ",
                "lhs_contracting_dimensions = [2], rhs_contracting_dimensions = [1]>",
            ),
        );
    }

    #[test]
    fn test_convolution_with_negative_axes() {
        let mut program = Program::new("test");
        let main = program
            .function("main", &[Shape::new(DataType::Float32, [1, 8, 2]), Shape::new(DataType::Float32, [3, 2, 4])])
            .unwrap();
        let mut builder = program.builder(main).unwrap();
        let inputs = builder.inputs();
        let dimensions = ConvolutionDimensions {
            input_feature_dimension: -1,
            kernel_output_feature_dimension: -1,
            output_spatial_dimensions: vec![-2],
            ..ConvolutionDimensions::channels_last(1)
        };
        let output = builder.convolution(inputs[0], inputs[1], &ConvolutionConfiguration::new(dimensions)).unwrap();
        assert_eq!(builder.shape(output).unwrap(), &Shape::new(DataType::Float32, [1, 6, 4]));
        assert_eq!(
            builder.function().statements()[0].attribute("dimension_numbers").unwrap().render(),
            "#stablehlo.conv<[b, 0, f]x[0, i, o]->[b, 0, f]>",
        );
    }
}
