//! General dot products and convolutions.

use crate::attributes::{ConvolutionDimensions, DotDimensions};
use crate::operations::OpType;
use crate::shape_inference::reduction::{WindowedAxis, windowed_output_dimension};
use crate::shape_inference::{ShapeError, check_capabilities, check_length, matching_data_type, normalize_axes};
use crate::types::Shape;

/// Infers the output shape of a general dot product.
///
/// The axes of each operand are classified as batching axes, contracting axes, or free axes. Batching and contracting
/// axes are paired positionally between the two operands and paired axes must have the same size. The output
/// dimensions consist of the batching dimensions (in the order in which they are listed), followed by the free
/// dimensions of `lhs`, followed by the free dimensions of `rhs` (both in their original order).
///
/// # Examples
///
/// ```rust
/// # use ryft_stablehlo::attributes::DotDimensions;
/// # use ryft_stablehlo::shape_inference::linear_algebra::dot_general;
/// # use ryft_stablehlo::types::{DataType, Shape};
/// let lhs = Shape::new(DataType::Float32, [2, 3, 4, 5]);
/// let rhs = Shape::new(DataType::Float32, [5, 1, 2, 3]);
/// let dimensions = DotDimensions::new(vec![1], vec![3], vec![3, 0], vec![0, 2]);
/// assert_eq!(dot_general(&lhs, &rhs, &dimensions), Ok(Shape::new(DataType::Float32, [5, 2, 4, 1])));
/// ```
pub fn dot_general(lhs: &Shape, rhs: &Shape, dimensions: &DotDimensions) -> Result<Shape, ShapeError> {
    let op = OpType::DotGeneral;
    let data_type = matching_data_type(op, lhs, rhs)?;

    let lhs_batching = normalize_axes(op, "lhs_batching_dimensions", &dimensions.lhs_batching_dimensions, lhs.rank())?;
    let rhs_batching = normalize_axes(op, "rhs_batching_dimensions", &dimensions.rhs_batching_dimensions, rhs.rank())?;
    let lhs_contracting =
        normalize_axes(op, "lhs_contracting_dimensions", &dimensions.lhs_contracting_dimensions, lhs.rank())?;
    let rhs_contracting =
        normalize_axes(op, "rhs_contracting_dimensions", &dimensions.rhs_contracting_dimensions, rhs.rank())?;
    check_length(op, "rhs_batching_dimensions", lhs_batching.len(), rhs_batching.len())?;
    check_length(op, "rhs_contracting_dimensions", lhs_contracting.len(), rhs_contracting.len())?;

    for (parameter, batching, contracting) in [
        ("lhs_contracting_dimensions", &lhs_batching, &lhs_contracting),
        ("rhs_contracting_dimensions", &rhs_batching, &rhs_contracting),
    ] {
        if let Some(axis) = contracting.iter().find(|axis| batching.contains(axis)) {
            return Err(ShapeError::DuplicateAxis { op, parameter, axis: *axis });
        }
    }
    let paired_axes = lhs_batching.iter().zip(&rhs_batching).chain(lhs_contracting.iter().zip(&rhs_contracting));
    for (lhs_axis, rhs_axis) in paired_axes {
        if lhs.dimensions()[*lhs_axis] != rhs.dimensions()[*rhs_axis] {
            return Err(ShapeError::IncompatibleShapes { op, lhs: lhs.clone(), rhs: rhs.clone() });
        }
    }

    let free = |shape: &Shape, batching: &[usize], contracting: &[usize]| {
        shape
            .dimensions()
            .iter()
            .enumerate()
            .filter(|(axis, _)| !batching.contains(axis) && !contracting.contains(axis))
            .map(|(_, size)| *size)
            .collect::<Vec<_>>()
    };
    let output_dimensions = lhs_batching
        .iter()
        .map(|axis| lhs.dimensions()[*axis])
        .chain(free(lhs, &lhs_batching, &lhs_contracting))
        .chain(free(rhs, &rhs_batching, &rhs_contracting))
        .collect::<Vec<_>>();
    Ok(Shape::new(data_type, output_dimensions))
}

/// Static configuration of a convolution. The per-spatial-axis fields have one entry per spatial axis.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ConvolutionConfiguration {
    pub dimensions: ConvolutionDimensions,
    pub window_strides: Vec<usize>,

    /// `(low, high)` padding of every spatial axis of the input.
    pub padding: Vec<(i64, i64)>,
    pub lhs_dilation: Vec<usize>,
    pub rhs_dilation: Vec<usize>,
    pub feature_group_count: usize,
    pub batch_group_count: usize,
}

impl ConvolutionConfiguration {
    /// Creates a new [`ConvolutionConfiguration`] with unit strides and dilations, no padding, and no grouping.
    pub fn new(dimensions: ConvolutionDimensions) -> Self {
        let spatial_rank = dimensions.input_spatial_dimensions.len();
        Self {
            dimensions,
            window_strides: vec![1; spatial_rank],
            padding: vec![(0, 0); spatial_rank],
            lhs_dilation: vec![1; spatial_rank],
            rhs_dilation: vec![1; spatial_rank],
            feature_group_count: 1,
            batch_group_count: 1,
        }
    }

    pub fn with_window_strides<S: Into<Vec<usize>>>(mut self, window_strides: S) -> Self {
        self.window_strides = window_strides.into();
        self
    }

    pub fn with_padding<P: Into<Vec<(i64, i64)>>>(mut self, padding: P) -> Self {
        self.padding = padding.into();
        self
    }

    pub fn with_lhs_dilation<D: Into<Vec<usize>>>(mut self, lhs_dilation: D) -> Self {
        self.lhs_dilation = lhs_dilation.into();
        self
    }

    pub fn with_rhs_dilation<D: Into<Vec<usize>>>(mut self, rhs_dilation: D) -> Self {
        self.rhs_dilation = rhs_dilation.into();
        self
    }

    pub fn with_feature_group_count(mut self, feature_group_count: usize) -> Self {
        self.feature_group_count = feature_group_count;
        self
    }

    pub fn with_batch_group_count(mut self, batch_group_count: usize) -> Self {
        self.batch_group_count = batch_group_count;
        self
    }
}

/// Infers the output shape of a convolution of `lhs` (the input) with `rhs` (the kernel).
///
/// The batch, feature, and spatial roles of the axes of the input, the kernel, and the output must each form a
/// permutation of all axes. The output batch size is the input batch size divided by the batch group count, the
/// output feature size is the kernel output feature size, and every spatial output size follows the windowing rules
/// of [`reduce_window`](crate::shape_inference::reduction::reduce_window), where the kernel is the window, the input
/// dilation acts as base dilation, and the kernel dilation acts as window dilation.
pub fn convolution(lhs: &Shape, rhs: &Shape, configuration: &ConvolutionConfiguration) -> Result<Shape, ShapeError> {
    let op = OpType::Convolution;
    let data_type = matching_data_type(op, lhs, rhs)?;
    check_capabilities(op, data_type)?;
    let rank = lhs.rank();
    if rank < 2 {
        return Err(ShapeError::RankMismatch { op, expected: 2, shape: lhs.clone() });
    }
    if rhs.rank() != rank {
        return Err(ShapeError::RankMismatch { op, expected: rank, shape: rhs.clone() });
    }

    let dimensions = &configuration.dimensions;
    let spatial_rank = rank - 2;
    let input = axis_roles(
        op,
        "input_dimensions",
        rank,
        [dimensions.input_batch_dimension, dimensions.input_feature_dimension],
        &dimensions.input_spatial_dimensions,
    )?;
    let kernel = axis_roles(
        op,
        "kernel_dimensions",
        rank,
        [dimensions.kernel_input_feature_dimension, dimensions.kernel_output_feature_dimension],
        &dimensions.kernel_spatial_dimensions,
    )?;
    let output = axis_roles(
        op,
        "output_dimensions",
        rank,
        [dimensions.output_batch_dimension, dimensions.output_feature_dimension],
        &dimensions.output_spatial_dimensions,
    )?;
    check_length(op, "window_strides", spatial_rank, configuration.window_strides.len())?;
    check_length(op, "padding", spatial_rank, configuration.padding.len())?;
    check_length(op, "lhs_dilation", spatial_rank, configuration.lhs_dilation.len())?;
    check_length(op, "rhs_dilation", spatial_rank, configuration.rhs_dilation.len())?;

    let feature_group_count = configuration.feature_group_count;
    let batch_group_count = configuration.batch_group_count;
    let invalid_groups = |message: String| ShapeError::InvalidParameter { op, parameter: "group_counts", message };
    if feature_group_count == 0 || batch_group_count == 0 {
        return Err(invalid_groups("group counts must be positive".to_string()));
    }
    if feature_group_count > 1 && batch_group_count > 1 {
        return Err(invalid_groups("at most one of the feature and batch group counts may exceed 1".to_string()));
    }

    let input_batch = lhs.dimensions()[input.batch];
    let input_features = lhs.dimensions()[input.feature];
    let kernel_input_features = rhs.dimensions()[kernel.batch];
    let kernel_output_features = rhs.dimensions()[kernel.feature];
    if input_features % feature_group_count != 0 || input_features / feature_group_count != kernel_input_features {
        return Err(ShapeError::IncompatibleShapes { op, lhs: lhs.clone(), rhs: rhs.clone() });
    }
    if kernel_output_features % feature_group_count != 0 || kernel_output_features % batch_group_count != 0 {
        return Err(invalid_groups(format!(
            "the kernel output feature size {kernel_output_features} is not divisible by the group counts",
        )));
    }
    if input_batch % batch_group_count != 0 {
        return Err(invalid_groups(format!(
            "the input batch size {input_batch} is not divisible by the batch group count {batch_group_count}",
        )));
    }

    let mut output_dimensions = vec![0; rank];
    output_dimensions[output.batch] = input_batch / batch_group_count;
    output_dimensions[output.feature] = kernel_output_features;
    for index in 0..spatial_rank {
        output_dimensions[output.spatial[index]] = windowed_output_dimension(
            op,
            input.spatial[index],
            WindowedAxis {
                size: lhs.dimensions()[input.spatial[index]],
                window: rhs.dimensions()[kernel.spatial[index]],
                stride: configuration.window_strides[index],
                base_dilation: configuration.lhs_dilation[index],
                window_dilation: configuration.rhs_dilation[index],
                padding: configuration.padding[index],
            },
        )?;
    }
    Ok(Shape::new(data_type, output_dimensions))
}

/// Normalized roles of the axes of one convolution operand. For kernels, `batch` holds the input feature axis and
/// `feature` holds the output feature axis.
struct AxisRoles {
    batch: usize,
    feature: usize,
    spatial: Vec<usize>,
}

fn axis_roles(
    op: OpType,
    parameter: &'static str,
    rank: usize,
    [batch, feature]: [i64; 2],
    spatial: &[i64],
) -> Result<AxisRoles, ShapeError> {
    check_length(op, parameter, rank - 2, spatial.len())?;
    let mut axes = vec![batch, feature];
    axes.extend_from_slice(spatial);
    let axes = normalize_axes(op, parameter, &axes, rank)?;
    Ok(AxisRoles { batch: axes[0], feature: axes[1], spatial: axes[2..].to_vec() })
}
