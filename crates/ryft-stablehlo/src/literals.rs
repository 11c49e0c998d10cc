//! Dense tensor literals and the exact textual rendering of numeric values.
//!
//! Floating-point values are rendered using the shortest decimal representation that round-trips at their own
//! width, always containing a decimal point (e.g., `1.0` or `1.0e-7`). Non-finite values are rendered as the raw bit
//! pattern of the value at its own width (e.g., `0x7F800000` for an `f32` positive infinity) since the consumer of
//! the textual format has no symbolic token for them.

use half::{bf16, f16};

use crate::operations::OpType;
use crate::shape_inference::ShapeError;
use crate::types::{DataType, Shape};

/// Storage for the elements of a [`TensorLiteral`], in row-major order.
#[derive(Clone, Debug, PartialEq)]
pub enum TensorData {
    Boolean(Vec<bool>),
    Integer(Vec<i64>),
    UnsignedInteger(Vec<u64>),
    Float16(Vec<f16>),
    BFloat16(Vec<bf16>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
    Complex64(Vec<(f32, f32)>),
    Complex128(Vec<(f64, f64)>),
}

impl TensorData {
    /// Returns the number of elements stored in this [`TensorData`].
    pub fn len(&self) -> usize {
        match self {
            Self::Boolean(values) => values.len(),
            Self::Integer(values) => values.len(),
            Self::UnsignedInteger(values) => values.len(),
            Self::Float16(values) => values.len(),
            Self::BFloat16(values) => values.len(),
            Self::Float32(values) => values.len(),
            Self::Float64(values) => values.len(),
            Self::Complex64(values) => values.len(),
            Self::Complex128(values) => values.len(),
        }
    }

    /// Returns `true` if this [`TensorData`] stores no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if this storage can hold elements of the provided [`DataType`].
    fn supports(&self, data_type: DataType) -> bool {
        match self {
            Self::Boolean(_) => data_type.is_boolean(),
            Self::Integer(_) => data_type.is_signed_integer(),
            Self::UnsignedInteger(_) => data_type.is_unsigned_integer(),
            Self::Float16(_) => data_type == DataType::Float16,
            Self::BFloat16(_) => data_type == DataType::BFloat16,
            Self::Float32(_) => data_type == DataType::Float32,
            Self::Float64(_) => data_type == DataType::Float64,
            Self::Complex64(_) => data_type == DataType::Complex64,
            Self::Complex128(_) => data_type == DataType::Complex128,
        }
    }

    fn render_element(&self, index: usize) -> String {
        match self {
            Self::Boolean(values) => values[index].to_string(),
            Self::Integer(values) => values[index].to_string(),
            Self::UnsignedInteger(values) => values[index].to_string(),
            Self::Float16(values) => format_f16(values[index]),
            Self::BFloat16(values) => format_bf16(values[index]),
            Self::Float32(values) => format_f32(values[index]),
            Self::Float64(values) => format_f64(values[index]),
            Self::Complex64(values) => {
                let (real, imaginary) = values[index];
                format!("({}, {})", format_f32(real), format_f32(imaginary))
            }
            Self::Complex128(values) => {
                let (real, imaginary) = values[index];
                format!("({}, {})", format_f64(real), format_f64(imaginary))
            }
        }
    }
}

/// Scalar types that can be used as the elements of a [`TensorLiteral`].
pub trait Element: Copy {
    /// [`DataType`] of literals built from values of this type.
    const DATA_TYPE: DataType;

    /// Wraps `values` into the matching [`TensorData`] variant.
    fn into_data(values: Vec<Self>) -> TensorData;
}

macro_rules! impl_element {
    ($ty:ty, $data_type:ident, $variant:ident) => {
        impl Element for $ty {
            const DATA_TYPE: DataType = DataType::$data_type;

            #[inline]
            fn into_data(values: Vec<Self>) -> TensorData {
                TensorData::$variant(values)
            }
        }
    };
    ($ty:ty, $data_type:ident, $variant:ident, $storage:ty) => {
        impl Element for $ty {
            const DATA_TYPE: DataType = DataType::$data_type;

            #[inline]
            fn into_data(values: Vec<Self>) -> TensorData {
                TensorData::$variant(values.into_iter().map(<$storage>::from).collect())
            }
        }
    };
}

impl_element!(bool, Boolean, Boolean);
impl_element!(i8, Int8, Integer, i64);
impl_element!(i16, Int16, Integer, i64);
impl_element!(i32, Int32, Integer, i64);
impl_element!(i64, Int64, Integer);
impl_element!(u8, UnsignedInt8, UnsignedInteger, u64);
impl_element!(u16, UnsignedInt16, UnsignedInteger, u64);
impl_element!(u32, UnsignedInt32, UnsignedInteger, u64);
impl_element!(u64, UnsignedInt64, UnsignedInteger);
impl_element!(f16, Float16, Float16);
impl_element!(bf16, BFloat16, BFloat16);
impl_element!(f32, Float32, Float32);
impl_element!(f64, Float64, Float64);
impl_element!((f32, f32), Complex64, Complex64);
impl_element!((f64, f64), Complex128, Complex128);

/// Dense tensor constant: a [`Shape`] together with its elements in row-major order.
///
/// # Examples
///
/// ```rust
/// # use ryft_stablehlo::literals::TensorLiteral;
/// let literal = TensorLiteral::new([2, 2], vec![1.0f32, 2.0, 3.0, f32::INFINITY]).unwrap();
/// assert_eq!(literal.render(), "dense<[[1.0, 2.0], [3.0, 0x7F800000]]> : tensor<2x2xf32>");
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct TensorLiteral {
    shape: Shape,
    data: TensorData,
}

impl TensorLiteral {
    /// Creates a new [`TensorLiteral`] with the provided dimensions and row-major elements.
    pub fn new<T: Element, D: Into<Vec<usize>>>(dimensions: D, values: Vec<T>) -> Result<Self, ShapeError> {
        Self::from_data(Shape::new(T::DATA_TYPE, dimensions), T::into_data(values))
    }

    /// Creates a new scalar [`TensorLiteral`].
    pub fn scalar<T: Element>(value: T) -> Self {
        Self { shape: Shape::scalar(T::DATA_TYPE), data: T::into_data(vec![value]) }
    }

    /// Creates a new [`TensorLiteral`] from raw storage. This is how literals of element types without a native Rust
    /// counterpart (e.g., [`DataType::Int4`] using [`TensorData::Integer`]) are constructed.
    pub fn from_data(shape: Shape, data: TensorData) -> Result<Self, ShapeError> {
        let data_type = shape.data_type().ok_or(ShapeError::InvalidShape { op: OpType::Constant })?;
        if !data.supports(data_type) {
            return Err(ShapeError::InvalidParameter {
                op: OpType::Constant,
                parameter: "value",
                message: format!("element storage does not match element type '{data_type}'"),
            });
        }
        if data.len() != shape.size() {
            return Err(ShapeError::InvalidParameter {
                op: OpType::Constant,
                parameter: "value",
                message: format!("expected {} element(s) for {shape} but got {}", shape.size(), data.len()),
            });
        }
        Ok(Self { shape, data })
    }

    /// Returns the [`Shape`] of this literal.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Returns the elements of this literal.
    pub fn data(&self) -> &TensorData {
        &self.data
    }

    /// Renders this literal as a dense elements attribute (e.g., `dense<[1, 2]> : tensor<2xi32>`).
    pub fn render(&self) -> String {
        let mut rendered = String::from("dense<");
        if self.shape.size() > 0 {
            self.render_dimension(&mut rendered, 0, 0);
        }
        rendered.push_str("> : ");
        rendered.push_str(self.shape.wire_type().as_str());
        rendered
    }

    fn render_dimension(&self, rendered: &mut String, axis: usize, offset: usize) {
        if axis == self.shape.rank() {
            rendered.push_str(self.data.render_element(offset).as_str());
            return;
        }
        let dimensions = self.shape.dimensions();
        let stride = dimensions[axis + 1..].iter().product::<usize>();
        rendered.push('[');
        for index in 0..dimensions[axis] {
            if index > 0 {
                rendered.push_str(", ");
            }
            self.render_dimension(rendered, axis + 1, offset + index * stride);
        }
        rendered.push(']');
    }
}

/// Renders an `f64` using its shortest round-trip representation.
pub fn format_f64(value: f64) -> String {
    if !value.is_finite() {
        return format!("0x{:016X}", value.to_bits());
    }
    with_decimal_point(format!("{value:?}"))
}

/// Renders an `f32` using its shortest round-trip representation.
pub fn format_f32(value: f32) -> String {
    if !value.is_finite() {
        return format!("0x{:08X}", value.to_bits());
    }
    with_decimal_point(format!("{value:?}"))
}

/// Renders an `f16` using its shortest round-trip representation.
pub fn format_f16(value: f16) -> String {
    if !value.is_finite() {
        return format!("0x{:04X}", value.to_bits());
    }
    shortest_round_trip(value.to_f64(), |candidate| f16::from_f64(candidate).to_bits() == value.to_bits())
}

/// Renders a `bf16` using its shortest round-trip representation.
pub fn format_bf16(value: bf16) -> String {
    if !value.is_finite() {
        return format!("0x{:04X}", value.to_bits());
    }
    shortest_round_trip(value.to_f64(), |candidate| bf16::from_f64(candidate).to_bits() == value.to_bits())
}

/// Finds the decimal with the fewest significant digits that `round_trips` back to `value`.
fn shortest_round_trip<F: Fn(f64) -> bool>(value: f64, round_trips: F) -> String {
    for precision in 0..17 {
        if let Ok(candidate) = format!("{value:.precision$e}").parse::<f64>() {
            if round_trips(candidate) {
                return with_decimal_point(format!("{candidate:?}"));
            }
        }
    }
    with_decimal_point(format!("{value:?}"))
}

/// Makes sure that a rendered number contains a decimal point, placing it before the exponent if there is one.
fn with_decimal_point(rendered: String) -> String {
    match rendered.find(['e', 'E']) {
        Some(_) if rendered.contains('.') => rendered,
        Some(exponent) => format!("{}.0{}", &rendered[..exponent], &rendered[exponent..]),
        None if rendered.contains('.') => rendered,
        None => format!("{rendered}.0"),
    }
}
