//! Attribute values attached to statements and the types that know how to render themselves as attributes.

use std::fmt::Display;

use crate::literals::{TensorLiteral, format_f64};
use crate::naming::escape_string;
use crate::types::DataType;

/// Types that have their own textual attribute representation.
pub trait Render {
    /// Renders this value exactly as it must appear on the right-hand side of an attribute assignment.
    fn render(&self) -> String;
}

/// Value of a statement attribute.
///
/// Most attributes are pre-rendered through [`Render`] into [`AttributeValue::Literal`]s when the statement is
/// created. [`AttributeValue::Unsupported`] marks values of a kind that has no textual representation yet. It is
/// rendered as a placeholder by [`Program::write`](crate::programs::Program::write) and rejected by
/// [`Program::build`](crate::programs::Program::build).
#[derive(Clone, Debug, PartialEq)]
pub enum AttributeValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Literal(String),
    Tensor(TensorLiteral),
    Unsupported { type_name: String },
}

impl AttributeValue {
    /// Creates an [`AttributeValue::Literal`] from any value that can [`Render`] itself.
    pub fn literal<R: Render + ?Sized>(value: &R) -> Self {
        Self::Literal(value.render())
    }

    /// Creates a dense `i64` array attribute (e.g., `array<i64: 1, 2>`).
    pub fn i64_array(values: &[i64]) -> Self {
        if values.is_empty() {
            return Self::Literal("array<i64>".to_string());
        }
        Self::Literal(format!("array<i64: {}>", join(values.iter())))
    }

    /// Creates a dense two-dimensional `i64` tensor attribute (e.g., `dense<[[0, 1]]> : tensor<1x2xi64>`). Rows that
    /// are shorter than the longest row are padded with `-1`.
    pub fn i64_matrix<R: AsRef<[i64]>>(rows: &[R]) -> Self {
        let columns = rows.iter().map(|row| row.as_ref().len()).max().unwrap_or(0);
        if rows.is_empty() || columns == 0 {
            return Self::Literal(format!("dense<> : tensor<{}x{columns}xi64>", rows.len()));
        }
        let rendered_rows = rows
            .iter()
            .map(|row| {
                let row = row.as_ref();
                let padding = std::iter::repeat_n(&-1i64, columns - row.len());
                format!("[{}]", join(row.iter().chain(padding)))
            })
            .collect::<Vec<_>>();
        Self::Literal(format!("dense<[{}]> : tensor<{}x{columns}xi64>", rendered_rows.join(", "), rows.len()))
    }

    /// Creates an integer attribute with an explicit integer type (e.g., `5 : i32`).
    pub fn typed_integer(value: i64, data_type: DataType) -> Self {
        Self::Literal(format!("{value} : {}", data_type.wire_token()))
    }

    /// Returns `true` if this is an [`AttributeValue::Unsupported`] value.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported { .. })
    }
}

impl Render for AttributeValue {
    fn render(&self) -> String {
        match self {
            Self::String(value) => format!("\"{}\"", escape_string(value)),
            Self::Integer(value) => format!("{value} : i64"),
            Self::Float(value) => format!("{} : f64", format_f64(*value)),
            Self::Boolean(value) => value.to_string(),
            Self::Literal(value) => value.clone(),
            Self::Tensor(value) => value.render(),
            Self::Unsupported { type_name } => format!("<<unsupported attribute: {type_name}>>"),
        }
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<TensorLiteral> for AttributeValue {
    fn from(value: TensorLiteral) -> Self {
        Self::Tensor(value)
    }
}

impl Render for TensorLiteral {
    fn render(&self) -> String {
        TensorLiteral::render(self)
    }
}

macro_rules! enum_attribute {
    (
        rust_name = $rust_name:ident,
        mlir_name = $mlir_name:literal,
        description = $description:literal,
        variants = { $($variant:ident => $token:literal),* $(,)? } $(,)?
    ) => {
        #[doc = $description]
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
        pub enum $rust_name {
            $($variant,)*
        }

        impl $rust_name {
            /// Returns the token that represents this value in the textual format.
            pub fn token(&self) -> &'static str {
                match self {
                    $(Self::$variant => $token,)*
                }
            }
        }

        impl Render for $rust_name {
            fn render(&self) -> String {
                format!("#stablehlo<{} {}>", $mlir_name, self.token())
            }
        }

        impl Display for $rust_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.token())
            }
        }
    };
}

enum_attribute!(
    rust_name = ComparisonDirection,
    mlir_name = "comparison_direction",
    description = "Direction of a comparison.",
    variants = {
        Equal => "EQ",
        NotEqual => "NE",
        GreaterThanOrEqual => "GE",
        GreaterThan => "GT",
        LessThanOrEqual => "LE",
        LessThan => "LT",
    },
);

enum_attribute!(
    rust_name = ComparisonType,
    mlir_name = "comparison_type",
    description = "Semantics of a comparison, which must agree with the element type of the compared operands.",
    variants = {
        Float => "FLOAT",
        TotalOrder => "TOTALORDER",
        Signed => "SIGNED",
        Unsigned => "UNSIGNED",
    },
);

enum_attribute!(
    rust_name = FftType,
    mlir_name = "fft_type",
    description = "Kind of fast Fourier transform.",
    variants = {
        Fft => "FFT",
        Ifft => "IFFT",
        Rfft => "RFFT",
        Irfft => "IRFFT",
    },
);

enum_attribute!(
    rust_name = RngAlgorithm,
    mlir_name = "rng_algorithm",
    description = "Algorithm used by random bit generation.",
    variants = {
        Default => "DEFAULT",
        ThreeFry => "THREE_FRY",
        Philox => "PHILOX",
    },
);

impl ComparisonType {
    /// Returns the [`ComparisonType`] that is used by default when comparing values of the provided [`DataType`].
    pub fn default_for(data_type: DataType) -> Self {
        if data_type.is_float() || data_type.is_complex() {
            Self::Float
        } else if data_type.is_signed_integer() {
            Self::Signed
        } else {
            Self::Unsigned
        }
    }
}

/// Dimension numbers of a general dot product. Lists at the same position in the `lhs` and `rhs` fields are paired.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct DotDimensions {
    pub lhs_batching_dimensions: Vec<i64>,
    pub rhs_batching_dimensions: Vec<i64>,
    pub lhs_contracting_dimensions: Vec<i64>,
    pub rhs_contracting_dimensions: Vec<i64>,
}

impl DotDimensions {
    pub fn new(
        lhs_contracting_dimensions: Vec<i64>,
        rhs_contracting_dimensions: Vec<i64>,
        lhs_batching_dimensions: Vec<i64>,
        rhs_batching_dimensions: Vec<i64>,
    ) -> Self {
        Self {
            lhs_batching_dimensions,
            rhs_batching_dimensions,
            lhs_contracting_dimensions,
            rhs_contracting_dimensions,
        }
    }
}

impl Render for DotDimensions {
    fn render(&self) -> String {
        render_struct(
            "#stablehlo.dot",
            &[
                ("lhs_batching_dimensions", list_field(&self.lhs_batching_dimensions)),
                ("rhs_batching_dimensions", list_field(&self.rhs_batching_dimensions)),
                ("lhs_contracting_dimensions", list_field(&self.lhs_contracting_dimensions)),
                ("rhs_contracting_dimensions", list_field(&self.rhs_contracting_dimensions)),
            ],
        )
    }
}

/// Dimension numbers of a gather.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct GatherDimensions {
    /// Output axes that hold the (non-collapsed, non-batching) slice dimensions.
    pub offset_dims: Vec<i64>,

    /// Operand axes that are sliced with size one and dropped from the output.
    pub collapsed_slice_dims: Vec<i64>,
    pub operand_batching_dims: Vec<i64>,
    pub start_indices_batching_dims: Vec<i64>,

    /// Operand axis that each entry of an index vector refers to.
    pub start_index_map: Vec<i64>,

    /// Axis of the start indices that holds the index vectors. It may be equal to the rank of the start indices, in
    /// which case every start index is implicitly a vector of length one.
    pub index_vector_dim: i64,
}

impl Render for GatherDimensions {
    fn render(&self) -> String {
        render_struct(
            "#stablehlo.gather",
            &[
                ("offset_dims", list_field(&self.offset_dims)),
                ("collapsed_slice_dims", list_field(&self.collapsed_slice_dims)),
                ("operand_batching_dims", list_field(&self.operand_batching_dims)),
                ("start_indices_batching_dims", list_field(&self.start_indices_batching_dims)),
                ("start_index_map", list_field(&self.start_index_map)),
                ("index_vector_dim", Some(self.index_vector_dim.to_string())),
            ],
        )
    }
}

/// Dimension numbers of a scatter. These mirror [`GatherDimensions`] from the perspective of the updates.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ScatterDimensions {
    pub update_window_dims: Vec<i64>,
    pub inserted_window_dims: Vec<i64>,
    pub input_batching_dims: Vec<i64>,
    pub scatter_indices_batching_dims: Vec<i64>,
    pub scatter_dims_to_operand_dims: Vec<i64>,
    pub index_vector_dim: i64,
}

impl Render for ScatterDimensions {
    fn render(&self) -> String {
        render_struct(
            "#stablehlo.scatter",
            &[
                ("update_window_dims", list_field(&self.update_window_dims)),
                ("inserted_window_dims", list_field(&self.inserted_window_dims)),
                ("input_batching_dims", list_field(&self.input_batching_dims)),
                ("scatter_indices_batching_dims", list_field(&self.scatter_indices_batching_dims)),
                ("scatter_dims_to_operand_dims", list_field(&self.scatter_dims_to_operand_dims)),
                ("index_vector_dim", Some(self.index_vector_dim.to_string())),
            ],
        )
    }
}

/// Roles of the axes of the input, kernel, and output of a convolution.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ConvolutionDimensions {
    pub input_batch_dimension: i64,
    pub input_feature_dimension: i64,
    pub input_spatial_dimensions: Vec<i64>,
    pub kernel_input_feature_dimension: i64,
    pub kernel_output_feature_dimension: i64,
    pub kernel_spatial_dimensions: Vec<i64>,
    pub output_batch_dimension: i64,
    pub output_feature_dimension: i64,
    pub output_spatial_dimensions: Vec<i64>,
}

impl ConvolutionDimensions {
    /// Returns the dimension numbers of the conventional `[batch, spatial..., feature]` input layout,
    /// `[spatial..., input_feature, output_feature]` kernel layout, and `[batch, spatial..., feature]` output layout
    /// with `spatial_rank` spatial axes.
    pub fn channels_last(spatial_rank: usize) -> Self {
        let spatial = (1..=spatial_rank as i64).collect::<Vec<_>>();
        let kernel_spatial = (0..spatial_rank as i64).collect::<Vec<_>>();
        let last = spatial_rank as i64 + 1;
        Self {
            input_batch_dimension: 0,
            input_feature_dimension: last,
            input_spatial_dimensions: spatial.clone(),
            kernel_input_feature_dimension: last - 1,
            kernel_output_feature_dimension: last,
            kernel_spatial_dimensions: kernel_spatial,
            output_batch_dimension: 0,
            output_feature_dimension: last,
            output_spatial_dimensions: spatial,
        }
    }
}

impl Render for ConvolutionDimensions {
    fn render(&self) -> String {
        let layout = |roles: &[(i64, String)], spatial: &[i64]| {
            let rank = roles.len() + spatial.len();
            let mut tokens = vec!["?".to_string(); rank];
            let spatial_roles = spatial.iter().enumerate().map(|(index, axis)| (*axis, index.to_string()));
            for (axis, token) in roles.iter().cloned().chain(spatial_roles) {
                if (0..rank as i64).contains(&axis) {
                    tokens[axis as usize] = token;
                }
            }
            format!("[{}]", tokens.join(", "))
        };
        let input = layout(
            &[(self.input_batch_dimension, "b".to_string()), (self.input_feature_dimension, "f".to_string())],
            &self.input_spatial_dimensions,
        );
        let kernel = layout(
            &[
                (self.kernel_input_feature_dimension, "i".to_string()),
                (self.kernel_output_feature_dimension, "o".to_string()),
            ],
            &self.kernel_spatial_dimensions,
        );
        let output = layout(
            &[(self.output_batch_dimension, "b".to_string()), (self.output_feature_dimension, "f".to_string())],
            &self.output_spatial_dimensions,
        );
        format!("#stablehlo.conv<{input}x{kernel}->{output}>")
    }
}

/// Identifier of the communication channel that is used by a collective operation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ChannelHandle {
    pub handle: i64,
    pub channel_type: i64,
}

impl ChannelHandle {
    /// Channel type of device-to-device transfers, which is the one used by all collective operations.
    pub const DEVICE_TO_DEVICE: i64 = 1;

    pub fn new(handle: i64) -> Self {
        Self { handle, channel_type: Self::DEVICE_TO_DEVICE }
    }
}

impl Render for ChannelHandle {
    fn render(&self) -> String {
        format!("#stablehlo.channel_handle<handle = {}, type = {}>", self.handle, self.channel_type)
    }
}

fn join<T: Display, I: Iterator<Item = T>>(values: I) -> String {
    values.map(|value| value.to_string()).collect::<Vec<_>>().join(", ")
}

fn list_field(values: &[i64]) -> Option<String> {
    if values.is_empty() { None } else { Some(format!("[{}]", join(values.iter()))) }
}

/// Renders `name<field = value, ...>` skipping fields whose value is [`None`].
fn render_struct(name: &str, fields: &[(&str, Option<String>)]) -> String {
    let fields = fields
        .iter()
        .filter_map(|(field, value)| value.as_ref().map(|value| format!("{field} = {value}")))
        .collect::<Vec<_>>();
    format!("{name}<{}>", fields.join(", "))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_attribute_value_render() {
        assert_eq!(AttributeValue::from("foo").render(), "\"foo\"");
        assert_eq!(AttributeValue::from("say \"hi\"").render(), "\"say \\\"hi\\\"\"");
        assert_eq!(AttributeValue::from(3i64).render(), "3 : i64");
        assert_eq!(AttributeValue::from(2.0f64).render(), "2.0 : f64");
        assert_eq!(AttributeValue::from(false).render(), "false");
        assert_eq!(AttributeValue::typed_integer(5, DataType::Int32).render(), "5 : i32");
        assert_eq!(
            AttributeValue::Unsupported { type_name: "Foo".to_string() }.render(),
            "<<unsupported attribute: Foo>>",
        );
    }

    #[test]
    fn test_attribute_value_arrays() {
        assert_eq!(AttributeValue::i64_array(&[]).render(), "array<i64>");
        assert_eq!(AttributeValue::i64_array(&[1, 0, 2]).render(), "array<i64: 1, 0, 2>");
        assert_eq!(
            AttributeValue::i64_matrix(&[vec![0, 1], vec![2, 3]]).render(),
            "dense<[[0, 1], [2, 3]]> : tensor<2x2xi64>",
        );
        assert_eq!(
            AttributeValue::i64_matrix(&[vec![0, 1, 2], vec![3]]).render(),
            "dense<[[0, 1, 2], [3, -1, -1]]> : tensor<2x3xi64>",
        );
        assert_eq!(AttributeValue::i64_matrix::<Vec<i64>>(&[]).render(), "dense<> : tensor<0x0xi64>");
    }

    #[test]
    fn test_enum_attributes() {
        assert_eq!(ComparisonDirection::LessThan.render(), "#stablehlo<comparison_direction LT>");
        assert_eq!(ComparisonType::TotalOrder.render(), "#stablehlo<comparison_type TOTALORDER>");
        assert_eq!(FftType::Rfft.render(), "#stablehlo<fft_type RFFT>");
        assert_eq!(RngAlgorithm::ThreeFry.render(), "#stablehlo<rng_algorithm THREE_FRY>");
        assert_eq!(ComparisonDirection::GreaterThanOrEqual.to_string(), "GE");
    }

    #[test]
    fn test_comparison_type_default_for() {
        assert_eq!(ComparisonType::default_for(DataType::Float32), ComparisonType::Float);
        assert_eq!(ComparisonType::default_for(DataType::Complex64), ComparisonType::Float);
        assert_eq!(ComparisonType::default_for(DataType::Int8), ComparisonType::Signed);
        assert_eq!(ComparisonType::default_for(DataType::UnsignedInt8), ComparisonType::Unsigned);
        assert_eq!(ComparisonType::default_for(DataType::Boolean), ComparisonType::Unsigned);
    }

    #[test]
    fn test_dimension_numbers_render() {
        let dot = DotDimensions::new(vec![2], vec![1], vec![0], vec![0]);
        assert_eq!(
            dot.render(),
            concat!(
                "#stablehlo.dot<lhs_batching_dimensions = [0], rhs_batching_dimensions = [0], ",
                "lhs_contracting_dimensions = [2], rhs_contracting_dimensions = [1]>",
            ),
        );
        assert_eq!(
            DotDimensions::new(vec![1], vec![0], vec![], vec![]).render(),
            "#stablehlo.dot<lhs_contracting_dimensions = [1], rhs_contracting_dimensions = [0]>",
        );

        let gather = GatherDimensions {
            offset_dims: vec![1],
            collapsed_slice_dims: vec![0],
            start_index_map: vec![0],
            index_vector_dim: 1,
            ..Default::default()
        };
        assert_eq!(
            gather.render(),
            concat!(
                "#stablehlo.gather<offset_dims = [1], collapsed_slice_dims = [0], start_index_map = [0], ",
                "index_vector_dim = 1>",
            ),
        );

        let scatter = ScatterDimensions {
            inserted_window_dims: vec![0],
            scatter_dims_to_operand_dims: vec![0],
            index_vector_dim: 1,
            ..Default::default()
        };
        assert_eq!(
            scatter.render(),
            concat!(
                "#stablehlo.scatter<inserted_window_dims = [0], scatter_dims_to_operand_dims = [0], ",
                "index_vector_dim = 1>",
            ),
        );
    }

    #[test]
    fn test_convolution_dimensions_render() {
        assert_eq!(
            ConvolutionDimensions::channels_last(2).render(),
            "#stablehlo.conv<[b, 0, 1, f]x[0, 1, i, o]->[b, 0, 1, f]>",
        );
        let dimensions = ConvolutionDimensions {
            input_batch_dimension: 0,
            input_feature_dimension: 1,
            input_spatial_dimensions: vec![2],
            kernel_input_feature_dimension: 1,
            kernel_output_feature_dimension: 0,
            kernel_spatial_dimensions: vec![2],
            output_batch_dimension: 0,
            output_feature_dimension: 1,
            output_spatial_dimensions: vec![2],
        };
        assert_eq!(dimensions.render(), "#stablehlo.conv<[b, f, 0]x[o, i, 0]->[b, f, 0]>");
    }

    #[test]
    fn test_channel_handle_render() {
        assert_eq!(ChannelHandle::new(3).render(), "#stablehlo.channel_handle<handle = 3, type = 1>");
    }
}
