//! Reductions over whole axes and over sliding windows.

use crate::operations::OpType;
use crate::shape_inference::{
    ClosureSignature, ShapeError, check_capabilities, check_combinator, check_length, normalize_axes, normalize_axis,
    scalar_data_type, valid_data_type,
};
use crate::types::{DataType, Shape};

/// Sliding window of a [`reduce_window`] operation. Every field has one entry per operand axis.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Window {
    pub dimensions: Vec<usize>,
    pub strides: Vec<usize>,
    pub base_dilations: Vec<usize>,
    pub window_dilations: Vec<usize>,

    /// `(low, high)` padding of every axis. Negative values remove elements from the corresponding edge.
    pub padding: Vec<(i64, i64)>,
}

impl Window {
    /// Creates a new [`Window`] with the provided dimensions, unit strides and dilations, and no padding.
    pub fn new<D: Into<Vec<usize>>>(dimensions: D) -> Self {
        let dimensions = dimensions.into();
        let rank = dimensions.len();
        Self {
            dimensions,
            strides: vec![1; rank],
            base_dilations: vec![1; rank],
            window_dilations: vec![1; rank],
            padding: vec![(0, 0); rank],
        }
    }

    pub fn with_strides<S: Into<Vec<usize>>>(mut self, strides: S) -> Self {
        self.strides = strides.into();
        self
    }

    pub fn with_base_dilations<D: Into<Vec<usize>>>(mut self, base_dilations: D) -> Self {
        self.base_dilations = base_dilations.into();
        self
    }

    pub fn with_window_dilations<D: Into<Vec<usize>>>(mut self, window_dilations: D) -> Self {
        self.window_dilations = window_dilations.into();
        self
    }

    pub fn with_padding<P: Into<Vec<(i64, i64)>>>(mut self, padding: P) -> Self {
        self.padding = padding.into();
        self
    }
}

/// Per-axis parameters of a windowed computation. This is shared by [`reduce_window`] and by convolutions.
#[derive(Copy, Clone, Debug)]
pub(crate) struct WindowedAxis {
    pub size: usize,
    pub window: usize,
    pub stride: usize,
    pub base_dilation: usize,
    pub window_dilation: usize,
    pub padding: (i64, i64),
}

/// Computes the size of an output axis of a windowed computation from the size of the corresponding input axis.
///
/// The input is first dilated, then padded, and the (dilated) window is finally slid over the result using `stride`.
/// It is an error for the dilated window to be larger than the padded input.
pub(crate) fn windowed_output_dimension(
    op: OpType,
    axis: usize,
    parameters: WindowedAxis,
) -> Result<usize, ShapeError> {
    let WindowedAxis { size, window, stride, base_dilation, window_dilation, padding } = parameters;
    let invalid = |message: String| ShapeError::InvalidParameter { op, parameter: "window", message };
    if window == 0 || stride == 0 || base_dilation == 0 || window_dilation == 0 {
        return Err(invalid(format!("axis {axis} has a zero window size, stride, or dilation")));
    }
    let effective_input = if size == 0 { 0 } else { ((size - 1) * base_dilation + 1) as i64 };
    let effective_window = ((window - 1) * window_dilation + 1) as i64;
    let padded_input = effective_input + padding.0 + padding.1;
    if effective_window > padded_input {
        return Err(invalid(format!(
            "the dilated window of axis {axis} has size {effective_window}, which exceeds the padded input size \
             {padded_input}",
        )));
    }
    Ok(((padded_input - effective_window) / stride as i64 + 1) as usize)
}

/// Infers the output shapes of a reduction of `inputs` over `dimensions`.
///
/// All inputs must have the same dimensions and each must be paired with a scalar initial value of the same element
/// type. `combinator` must take `2 * N` scalars and return `N` scalars of exactly those element types.
pub fn reduce(
    inputs: &[&Shape],
    init_values: &[&Shape],
    dimensions: &[i64],
    combinator: &ClosureSignature,
) -> Result<Vec<Shape>, ShapeError> {
    let op = OpType::Reduce;
    let data_types = check_inputs_and_init_values(op, inputs, init_values)?;
    let reduced = normalize_axes(op, "dimensions", dimensions, inputs[0].rank())?;
    check_combinator(op, combinator, &data_types, false)?;
    let output_dimensions = inputs[0]
        .dimensions()
        .iter()
        .enumerate()
        .filter(|(axis, _)| !reduced.contains(axis))
        .map(|(_, size)| *size)
        .collect::<Vec<_>>();
    Ok(data_types.into_iter().map(|data_type| Shape::new(data_type, output_dimensions.clone())).collect())
}

/// Infers the output shapes of a windowed reduction of `inputs`.
///
/// # Examples
///
/// ```rust
/// # use ryft_stablehlo::shape_inference::ClosureSignature;
/// # use ryft_stablehlo::shape_inference::reduction::{Window, reduce_window};
/// # use ryft_stablehlo::types::{DataType, Shape};
/// let scalar = Shape::scalar(DataType::Float32);
/// let sum = ClosureSignature::new(vec![scalar.clone(), scalar.clone()], vec![scalar.clone()]);
/// let input = Shape::new(DataType::Float32, [10]);
/// let window = Window::new([3]).with_strides([3]);
/// assert_eq!(reduce_window(&[&input], &[&scalar], &window, &sum), Ok(vec![Shape::new(DataType::Float32, [3])]));
/// ```
pub fn reduce_window(
    inputs: &[&Shape],
    init_values: &[&Shape],
    window: &Window,
    combinator: &ClosureSignature,
) -> Result<Vec<Shape>, ShapeError> {
    let op = OpType::ReduceWindow;
    let data_types = check_inputs_and_init_values(op, inputs, init_values)?;
    let rank = inputs[0].rank();
    check_length(op, "window_dimensions", rank, window.dimensions.len())?;
    check_length(op, "window_strides", rank, window.strides.len())?;
    check_length(op, "base_dilations", rank, window.base_dilations.len())?;
    check_length(op, "window_dilations", rank, window.window_dilations.len())?;
    check_length(op, "padding", rank, window.padding.len())?;
    check_combinator(op, combinator, &data_types, false)?;
    let output_dimensions = inputs[0]
        .dimensions()
        .iter()
        .enumerate()
        .map(|(axis, size)| {
            windowed_output_dimension(
                op,
                axis,
                WindowedAxis {
                    size: *size,
                    window: window.dimensions[axis],
                    stride: window.strides[axis],
                    base_dilation: window.base_dilations[axis],
                    window_dilation: window.window_dilations[axis],
                    padding: window.padding[axis],
                },
            )
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(data_types.into_iter().map(|data_type| Shape::new(data_type, output_dimensions.clone())).collect())
}

/// Infers the shape of the indices produced by an arg-min or arg-max over `axis`. The operand must be a numeric,
/// non-scalar tensor and `index_data_type` must be an integer type.
pub fn arg_min_max(operand: &Shape, axis: i64, index_data_type: DataType) -> Result<Shape, ShapeError> {
    let op = OpType::ArgMinMax;
    let data_type = valid_data_type(op, operand)?;
    check_capabilities(op, data_type)?;
    if operand.is_scalar() {
        return Err(ShapeError::ScalarOperand { op });
    }
    if !index_data_type.is_integer() {
        return Err(ShapeError::UnsupportedDataType { op, data_type: index_data_type, expected: "an integer type" });
    }
    let axis = normalize_axis(op, axis, operand.rank())?;
    let mut dimensions = operand.dimensions().to_vec();
    dimensions.remove(axis);
    Ok(Shape::new(index_data_type, dimensions))
}

fn check_inputs_and_init_values(
    op: OpType,
    inputs: &[&Shape],
    init_values: &[&Shape],
) -> Result<Vec<DataType>, ShapeError> {
    if inputs.is_empty() {
        return Err(ShapeError::OperandCountMismatch { op, expected: 1, actual: 0 });
    }
    if init_values.len() != inputs.len() {
        return Err(ShapeError::OperandCountMismatch { op, expected: inputs.len(), actual: init_values.len() });
    }
    let mut data_types = Vec::with_capacity(inputs.len());
    for (input, init_value) in inputs.iter().zip(init_values) {
        let data_type = valid_data_type(op, input)?;
        if input.dimensions() != inputs[0].dimensions() {
            return Err(ShapeError::IncompatibleShapes { op, lhs: inputs[0].clone(), rhs: (*input).clone() });
        }
        if scalar_data_type(op, init_value)? != data_type {
            return Err(ShapeError::DataTypeMismatch { op, lhs: (*input).clone(), rhs: (*init_value).clone() });
        }
        data_types.push(data_type);
    }
    Ok(data_types)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    use crate::types::DataType::*;

    fn combinator(data_types: &[DataType]) -> ClosureSignature {
        let scalars = data_types.iter().map(|data_type| Shape::scalar(*data_type)).collect::<Vec<_>>();
        ClosureSignature::new([scalars.clone(), scalars.clone()].concat(), scalars)
    }

    #[test]
    fn test_reduce() {
        let input = Shape::new(Float32, [2, 3, 4]);
        let init = Shape::scalar(Float32);
        assert_eq!(
            reduce(&[&input], &[&init], &[1], &combinator(&[Float32])),
            Ok(vec![Shape::new(Float32, [2, 4])]),
        );
        assert_eq!(
            reduce(&[&input], &[&init], &[-1, 0], &combinator(&[Float32])),
            Ok(vec![Shape::new(Float32, [3])]),
        );
        assert_eq!(reduce(&[&input], &[&init], &[], &combinator(&[Float32])), Ok(vec![input.clone()]));

        let indices = Shape::new(Int32, [2, 3, 4]);
        let index_init = Shape::scalar(Int32);
        assert_eq!(
            reduce(&[&input, &indices], &[&init, &index_init], &[2], &combinator(&[Float32, Int32])),
            Ok(vec![Shape::new(Float32, [2, 3]), Shape::new(Int32, [2, 3])]),
        );
    }

    #[test]
    fn test_reduce_errors() {
        let input = Shape::new(Float32, [2, 3]);
        let init = Shape::scalar(Float32);
        assert!(matches!(
            reduce(&[&input], &[&init], &[2], &combinator(&[Float32])),
            Err(ShapeError::AxisOutOfRange { op: OpType::Reduce, axis: 2, rank: 2 }),
        ));
        assert!(matches!(
            reduce(&[&input], &[&init], &[0, 0], &combinator(&[Float32])),
            Err(ShapeError::DuplicateAxis { .. }),
        ));
        assert!(matches!(
            reduce(&[&input], &[&Shape::scalar(Float16)], &[0], &combinator(&[Float32])),
            Err(ShapeError::DataTypeMismatch { .. }),
        ));
        assert!(matches!(
            reduce(&[&input], &[&Shape::new(Float32, [1])], &[0], &combinator(&[Float32])),
            Err(ShapeError::NotScalar { .. }),
        ));
        assert!(matches!(
            reduce(&[&input], &[&init], &[0], &combinator(&[Float16])),
            Err(ShapeError::InvalidClosure { .. }),
        ));
        assert!(matches!(
            reduce(&[&input], &[], &[0], &combinator(&[Float32])),
            Err(ShapeError::OperandCountMismatch { expected: 1, actual: 0, .. }),
        ));
        assert!(matches!(
            reduce(&[&Shape::invalid()], &[&init], &[0], &combinator(&[Float32])),
            Err(ShapeError::InvalidShape { op: OpType::Reduce }),
        ));
    }

    #[test]
    fn test_reduce_window() {
        let input = Shape::new(Float32, [10]);
        let init = Shape::scalar(Float32);
        let window = Window::new([3])
            .with_strides([3])
            .with_base_dilations([1])
            .with_window_dilations([1])
            .with_padding([(0, 0)]);
        assert_eq!(
            reduce_window(&[&input], &[&init], &window, &combinator(&[Float32])),
            Ok(vec![Shape::new(Float32, [3])]),
        );

        let input = Shape::new(Float32, [4, 6]);
        let window = Window::new([2, 3]).with_strides([2, 1]).with_padding([(0, 0), (1, 1)]);
        assert_eq!(
            reduce_window(&[&input], &[&init], &window, &combinator(&[Float32])),
            Ok(vec![Shape::new(Float32, [2, 6])]),
        );

        let window = Window::new([2, 2]).with_base_dilations([2, 1]).with_window_dilations([1, 2]);
        assert_eq!(
            reduce_window(&[&input], &[&init], &window, &combinator(&[Float32])),
            Ok(vec![Shape::new(Float32, [6, 4])]),
        );
    }

    #[test]
    fn test_reduce_window_errors() {
        let input = Shape::new(Float32, [4]);
        let init = Shape::scalar(Float32);
        assert!(matches!(
            reduce_window(&[&input], &[&init], &Window::new([5]), &combinator(&[Float32])),
            Err(ShapeError::InvalidParameter { parameter: "window", .. }),
        ));
        assert!(reduce_window(&[&input], &[&init], &Window::new([5]).with_padding([(1, 0)]), &combinator(&[Float32]))
            .is_ok());
        assert!(matches!(
            reduce_window(&[&input], &[&init], &Window::new([2, 2]), &combinator(&[Float32])),
            Err(ShapeError::LengthMismatch { parameter: "window_dimensions", .. }),
        ));
        assert!(matches!(
            reduce_window(&[&input], &[&init], &Window::new([2]).with_strides([0]), &combinator(&[Float32])),
            Err(ShapeError::InvalidParameter { parameter: "window", .. }),
        ));
    }

    #[test]
    fn test_windowed_output_dimension() {
        let axis =
            WindowedAxis { size: 7, window: 3, stride: 2, base_dilation: 1, window_dilation: 1, padding: (0, 0) };
        assert_eq!(windowed_output_dimension(OpType::ReduceWindow, 0, axis), Ok(3));
        let axis = WindowedAxis { padding: (-1, -1), ..axis };
        assert_eq!(windowed_output_dimension(OpType::ReduceWindow, 0, axis), Ok(2));
        let axis = WindowedAxis { size: 0, padding: (0, 0), ..axis };
        assert!(windowed_output_dimension(OpType::ReduceWindow, 0, axis).is_err());
    }

    #[test]
    fn test_arg_min_max() {
        assert_eq!(arg_min_max(&Shape::new(Float32, [3, 5]), 1, Int32), Ok(Shape::new(Int32, [3])));
        assert_eq!(arg_min_max(&Shape::new(Int8, [3, 5, 2]), -3, Int64), Ok(Shape::new(Int64, [5, 2])));
        assert!(matches!(
            arg_min_max(&Shape::scalar(Float32), 0, Int32),
            Err(ShapeError::ScalarOperand { op: OpType::ArgMinMax }),
        ));
        assert!(matches!(
            arg_min_max(&Shape::new(Boolean, [3]), 0, Int32),
            Err(ShapeError::UnsupportedDataType { data_type: Boolean, .. }),
        ));
        assert!(matches!(
            arg_min_max(&Shape::new(Float32, [3]), 0, Float32),
            Err(ShapeError::UnsupportedDataType { data_type: Float32, .. }),
        ));
        assert!(arg_min_max(&Shape::new(Float32, [3]), 1, Int32).is_err());
    }
}
