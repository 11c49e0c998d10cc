//! Element [`DataType`]s and tensor [`Shape`]s.
//!
//! These are plain value types with no lifecycle. Every operation appended to a
//! [`Function`](crate::functions::Function) is type checked in terms of them and every value in a program carries
//! exactly one [`Shape`].

use std::fmt::Display;

/// Represents the primitive data types that can be stored in tensors, ranging from booleans, integers, floating-point
/// numbers, and complex numbers of various precisions to the narrow floating-point formats that mirror the
/// corresponding [LLVM/MLIR types](https://mlir.llvm.org/docs/Dialects/Builtin)
/// (e.g., [8-bit floating-point variants](https://arxiv.org/abs/2209.05433)).
///
/// # Type Promotion
///
/// The data types form a hierarchy for type promotion that follows the
/// [type promotion semantics of JAX](https://docs.jax.dev/en/latest/type_promotion.html):
///
///   - [`DataType::Boolean`] can be promoted to any other type.
///   - Integer types can be promoted to wider integer types and to floating-point types.
///   - Floating-point types can be promoted to floating-point types that are at least as wide in both their exponent
///     and their mantissa, and 8-bit-or-narrower formats can be promoted to any 16-bit-or-wider format.
///   - Real types can be promoted to complex types whose components they can be promoted to.
///
/// StableHLO itself never promotes implicitly. The only place where promotion matters in this crate is the check of
/// scatter update combinators, whose scalar signature may widen the input and update data types.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DataType {
    /// Boolean values (`i1` on the wire).
    Boolean,

    /// 2-bit signed integers.
    Int2,

    /// 4-bit signed integers.
    Int4,

    /// 8-bit signed integers.
    Int8,

    /// 16-bit signed integers.
    Int16,

    /// 32-bit signed integers.
    Int32,

    /// 64-bit signed integers.
    Int64,

    /// 2-bit unsigned integers.
    UnsignedInt2,

    /// 4-bit unsigned integers.
    UnsignedInt4,

    /// 8-bit unsigned integers.
    UnsignedInt8,

    /// 16-bit unsigned integers.
    UnsignedInt16,

    /// 32-bit unsigned integers.
    UnsignedInt32,

    /// 64-bit unsigned integers.
    UnsignedInt64,

    /// 4-bit floating-point values with an S1E2M1 encoding and no infinities or NaNs.
    Float4E2M1FN,

    /// 6-bit floating-point values with an S1E2M3 encoding and no infinities or NaNs.
    Float6E2M3FN,

    /// 6-bit floating-point values with an S1E3M2 encoding and no infinities or NaNs.
    Float6E3M2FN,

    /// 8-bit floating-point values with an S1E3M4 encoding and IEEE-like infinities and NaNs.
    Float8E3M4,

    /// 8-bit floating-point values with an S1E4M3 encoding and IEEE-like infinities and NaNs.
    Float8E4M3,

    /// 8-bit floating-point values with an S1E4M3 encoding, no infinities, and a single NaN pattern.
    Float8E4M3FN,

    /// 8-bit floating-point values with an S1E4M3 encoding, exponent bias 8, and an unsigned zero.
    Float8E4M3FNUZ,

    /// 8-bit floating-point values with an S1E4M3 encoding, exponent bias 11, and an unsigned zero.
    Float8E4M3B11FNUZ,

    /// 8-bit floating-point values with an S1E5M2 encoding and IEEE-like infinities and NaNs.
    Float8E5M2,

    /// 8-bit floating-point values with an S1E5M2 encoding, exponent bias 16, and an unsigned zero.
    Float8E5M2FNUZ,

    /// 8-bit exponent-only values (S0E8M0) used for scaling factors.
    Float8E8M0FNU,

    /// 16-bit ["brain" floating-point](https://en.wikipedia.org/wiki/Bfloat16_floating-point_format) values
    /// (S1E8M7).
    BFloat16,

    /// 16-bit [IEEE 754](https://en.wikipedia.org/wiki/Half-precision_floating-point_format) floating-point values.
    Float16,

    /// 32-bit [IEEE 754](https://en.wikipedia.org/wiki/Single-precision_floating-point_format) floating-point values.
    Float32,

    /// 64-bit [IEEE 754](https://en.wikipedia.org/wiki/Double-precision_floating-point_format) floating-point values.
    Float64,

    /// 64-bit complex numbers whose real and imaginary parts are [`DataType::Float32`]s.
    Complex64,

    /// 128-bit complex numbers whose real and imaginary parts are [`DataType::Float64`]s.
    Complex128,
}

impl DataType {
    /// Returns `true` if this is [`DataType::Boolean`].
    #[inline]
    pub fn is_boolean(&self) -> bool {
        matches!(self, Self::Boolean)
    }

    /// Returns `true` if this is a signed integer [`DataType`].
    #[inline]
    pub fn is_signed_integer(&self) -> bool {
        matches!(self, Self::Int2 | Self::Int4 | Self::Int8 | Self::Int16 | Self::Int32 | Self::Int64)
    }

    /// Returns `true` if this is an unsigned integer [`DataType`].
    #[inline]
    pub fn is_unsigned_integer(&self) -> bool {
        matches!(
            self,
            Self::UnsignedInt2
                | Self::UnsignedInt4
                | Self::UnsignedInt8
                | Self::UnsignedInt16
                | Self::UnsignedInt32
                | Self::UnsignedInt64
        )
    }

    /// Returns `true` if this is a signed or unsigned integer [`DataType`]. Note that [`DataType::Boolean`] is not
    /// considered to be an integer type.
    #[inline]
    pub fn is_integer(&self) -> bool {
        self.is_signed_integer() || self.is_unsigned_integer()
    }

    /// Returns `true` if this is a real floating-point [`DataType`] (of any width).
    #[inline]
    pub fn is_float(&self) -> bool {
        self.float_format().is_some()
    }

    /// Returns `true` if this is a complex [`DataType`].
    #[inline]
    pub fn is_complex(&self) -> bool {
        matches!(self, Self::Complex64 | Self::Complex128)
    }

    /// Returns `true` for every [`DataType`] except for [`DataType::Boolean`].
    #[inline]
    pub fn is_numeric(&self) -> bool {
        !self.is_boolean()
    }

    /// Returns the number of bits used to store a single element of this [`DataType`]. Booleans are stored using
    /// a full byte and so they report a bit width of `8`.
    pub fn bit_width(&self) -> usize {
        match self {
            Self::Boolean => 8,
            Self::Int2 | Self::UnsignedInt2 => 2,
            Self::Int4 | Self::UnsignedInt4 | Self::Float4E2M1FN => 4,
            Self::Float6E2M3FN | Self::Float6E3M2FN => 6,
            Self::Int8
            | Self::UnsignedInt8
            | Self::Float8E3M4
            | Self::Float8E4M3
            | Self::Float8E4M3FN
            | Self::Float8E4M3FNUZ
            | Self::Float8E4M3B11FNUZ
            | Self::Float8E5M2
            | Self::Float8E5M2FNUZ
            | Self::Float8E8M0FNU => 8,
            Self::Int16 | Self::UnsignedInt16 | Self::BFloat16 | Self::Float16 => 16,
            Self::Int32 | Self::UnsignedInt32 | Self::Float32 => 32,
            Self::Int64 | Self::UnsignedInt64 | Self::Float64 | Self::Complex64 => 64,
            Self::Complex128 => 128,
        }
    }

    /// Returns the `(exponent_bits, mantissa_bits)` pair of this [`DataType`] if it is a real floating-point type.
    fn float_format(&self) -> Option<(usize, usize)> {
        match self {
            Self::Float4E2M1FN => Some((2, 1)),
            Self::Float6E2M3FN => Some((2, 3)),
            Self::Float6E3M2FN => Some((3, 2)),
            Self::Float8E3M4 => Some((3, 4)),
            Self::Float8E4M3 | Self::Float8E4M3FN | Self::Float8E4M3FNUZ | Self::Float8E4M3B11FNUZ => Some((4, 3)),
            Self::Float8E5M2 | Self::Float8E5M2FNUZ => Some((5, 2)),
            Self::Float8E8M0FNU => Some((8, 0)),
            Self::BFloat16 => Some((8, 7)),
            Self::Float16 => Some((5, 10)),
            Self::Float32 => Some((8, 23)),
            Self::Float64 => Some((11, 52)),
            _ => None,
        }
    }

    /// Returns the real [`DataType`] of the components of this [`DataType`] if it is complex, and [`None`] otherwise.
    #[inline]
    pub fn real_counterpart(&self) -> Option<DataType> {
        match self {
            Self::Complex64 => Some(Self::Float32),
            Self::Complex128 => Some(Self::Float64),
            _ => None,
        }
    }

    /// Returns the complex [`DataType`] whose components have this [`DataType`], if one exists. Only
    /// [`DataType::Float32`] and [`DataType::Float64`] have complex counterparts.
    #[inline]
    pub fn complex_counterpart(&self) -> Option<DataType> {
        match self {
            Self::Float32 => Some(Self::Complex64),
            Self::Float64 => Some(Self::Complex128),
            _ => None,
        }
    }

    /// Returns `true` if this [`DataType`] can be promoted to the provided [`DataType`]. Note that this function will
    /// always return `true` when `self == other`. Refer to the documentation of [`DataType`] for more information on
    /// type promotions and the rules that govern them.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use ryft_stablehlo::types::DataType;
    /// assert!(DataType::Int32.promotable_to(&DataType::Float64));
    /// assert!(DataType::Float32.promotable_to(&DataType::Complex64));
    /// assert!(!DataType::Float64.promotable_to(&DataType::Int32));
    /// ```
    pub fn promotable_to(&self, other: &Self) -> bool {
        if self == other || self.is_boolean() {
            return true;
        }
        if other.is_boolean() {
            return false;
        }
        if self.is_signed_integer() {
            return (other.is_signed_integer() && self.bit_width() < other.bit_width())
                || other.is_float()
                || other.is_complex();
        }
        if self.is_unsigned_integer() {
            return (other.is_integer() && self.bit_width() < other.bit_width())
                || other.is_float()
                || other.is_complex();
        }
        if let Some((exponent_bits, mantissa_bits)) = self.float_format() {
            return match (other.float_format(), other.real_counterpart()) {
                (Some((other_exponent_bits, other_mantissa_bits)), _) => {
                    (self.bit_width() <= 8 && other.bit_width() >= 16)
                        || (exponent_bits <= other_exponent_bits && mantissa_bits <= other_mantissa_bits)
                }
                (None, Some(component)) => self.promotable_to(&component),
                (None, None) => false,
            };
        }
        match (self.real_counterpart(), other.real_counterpart()) {
            (Some(component), Some(other_component)) => component.promotable_to(&other_component),
            _ => false,
        }
    }

    /// Returns the token that is used to represent this [`DataType`] in StableHLO text
    /// (e.g., `i1`, `ui8`, `bf16`, `f8E4M3FN`, or `complex<f32>`).
    pub fn wire_token(&self) -> &'static str {
        match self {
            Self::Boolean => "i1",
            Self::Int2 => "i2",
            Self::Int4 => "i4",
            Self::Int8 => "i8",
            Self::Int16 => "i16",
            Self::Int32 => "i32",
            Self::Int64 => "i64",
            Self::UnsignedInt2 => "ui2",
            Self::UnsignedInt4 => "ui4",
            Self::UnsignedInt8 => "ui8",
            Self::UnsignedInt16 => "ui16",
            Self::UnsignedInt32 => "ui32",
            Self::UnsignedInt64 => "ui64",
            Self::Float4E2M1FN => "f4E2M1FN",
            Self::Float6E2M3FN => "f6E2M3FN",
            Self::Float6E3M2FN => "f6E3M2FN",
            Self::Float8E3M4 => "f8E3M4",
            Self::Float8E4M3 => "f8E4M3",
            Self::Float8E4M3FN => "f8E4M3FN",
            Self::Float8E4M3FNUZ => "f8E4M3FNUZ",
            Self::Float8E4M3B11FNUZ => "f8E4M3B11FNUZ",
            Self::Float8E5M2 => "f8E5M2",
            Self::Float8E5M2FNUZ => "f8E5M2FNUZ",
            Self::Float8E8M0FNU => "f8E8M0FNU",
            Self::BFloat16 => "bf16",
            Self::Float16 => "f16",
            Self::Float32 => "f32",
            Self::Float64 => "f64",
            Self::Complex64 => "complex<f32>",
            Self::Complex128 => "complex<f64>",
        }
    }
}

impl Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self {
            DataType::Boolean => write!(f, "bool"),
            DataType::Int2 => write!(f, "i2"),
            DataType::Int4 => write!(f, "i4"),
            DataType::Int8 => write!(f, "i8"),
            DataType::Int16 => write!(f, "i16"),
            DataType::Int32 => write!(f, "i32"),
            DataType::Int64 => write!(f, "i64"),
            DataType::UnsignedInt2 => write!(f, "u2"),
            DataType::UnsignedInt4 => write!(f, "u4"),
            DataType::UnsignedInt8 => write!(f, "u8"),
            DataType::UnsignedInt16 => write!(f, "u16"),
            DataType::UnsignedInt32 => write!(f, "u32"),
            DataType::UnsignedInt64 => write!(f, "u64"),
            DataType::Float4E2M1FN => write!(f, "f4e2m1fn"),
            DataType::Float6E2M3FN => write!(f, "f6e2m3fn"),
            DataType::Float6E3M2FN => write!(f, "f6e3m2fn"),
            DataType::Float8E3M4 => write!(f, "f8e3m4"),
            DataType::Float8E4M3 => write!(f, "f8e4m3"),
            DataType::Float8E4M3FN => write!(f, "f8e4m3fn"),
            DataType::Float8E4M3FNUZ => write!(f, "f8e4m3fnuz"),
            DataType::Float8E4M3B11FNUZ => write!(f, "f8e4m3b11fnuz"),
            DataType::Float8E5M2 => write!(f, "f8e5m2"),
            DataType::Float8E5M2FNUZ => write!(f, "f8e5m2fnuz"),
            DataType::Float8E8M0FNU => write!(f, "f8e8m0fnu"),
            DataType::BFloat16 => write!(f, "bf16"),
            DataType::Float16 => write!(f, "f16"),
            DataType::Float32 => write!(f, "f32"),
            DataType::Float64 => write!(f, "f64"),
            DataType::Complex64 => write!(f, "c64"),
            DataType::Complex128 => write!(f, "c128"),
        }
    }
}

/// Represents the type of a tensor: its element [`DataType`] along with the sizes of its dimensions, ordered from
/// outermost to innermost. Only static shapes are supported.
///
/// A [`Shape`] is either _valid_, in which case it carries a [`DataType`], or it is the _invalid_ sentinel returned
/// by [`Shape::invalid`], which carries neither a data type nor dimensions. Shape inference rejects the invalid
/// sentinel immediately.
///
/// Note that the [`Display`] implementation of [`Shape`] renders shapes as their [`DataType`] followed by their
/// dimension sizes in a comma-separated list surrounded by square brackets (e.g., `f32[2, 3]`), while
/// [`Shape::wire_type`] renders the StableHLO tensor type (e.g., `tensor<2x3xf32>`).
///
/// # Examples
///
/// ```rust
/// # use ryft_stablehlo::types::{DataType, Shape};
/// let shape = Shape::new(DataType::Float32, [2, 3]);
/// assert_eq!(shape.rank(), 2);
/// assert_eq!(shape.size(), 6);
/// assert_eq!(shape.to_string(), "f32[2, 3]");
/// assert_eq!(shape.wire_type(), "tensor<2x3xf32>");
/// assert_eq!(Shape::scalar(DataType::Boolean).wire_type(), "tensor<i1>");
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Shape {
    data_type: Option<DataType>,
    dimensions: Vec<usize>,
}

impl Shape {
    /// Constructs a new [`Shape`] with the provided [`DataType`] and dimension sizes.
    #[inline]
    pub fn new<D: Into<Vec<usize>>>(data_type: DataType, dimensions: D) -> Self {
        Self { data_type: Some(data_type), dimensions: dimensions.into() }
    }

    /// Constructs a new scalar [`Shape`] (i.e., one with rank 0) with the provided [`DataType`].
    #[inline]
    pub fn scalar(data_type: DataType) -> Self {
        Self::new(data_type, Vec::new())
    }

    /// Constructs the invalid [`Shape`] sentinel.
    #[inline]
    pub fn invalid() -> Self {
        Self { data_type: None, dimensions: Vec::new() }
    }

    /// Returns `true` if this [`Shape`] is not the invalid sentinel.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.data_type.is_some()
    }

    /// Returns the [`DataType`] of this [`Shape`], or [`None`] if it is the invalid sentinel.
    #[inline]
    pub fn data_type(&self) -> Option<DataType> {
        self.data_type
    }

    /// Returns the dimension sizes of this [`Shape`].
    #[inline]
    pub fn dimensions(&self) -> &[usize] {
        self.dimensions.as_slice()
    }

    /// Returns the rank (i.e., the number of dimensions) of this [`Shape`].
    #[inline]
    pub fn rank(&self) -> usize {
        self.dimensions.len()
    }

    /// Returns `true` if this is a valid [`Shape`] with rank 0.
    #[inline]
    pub fn is_scalar(&self) -> bool {
        self.is_valid() && self.dimensions.is_empty()
    }

    /// Returns the number of elements of a tensor with this [`Shape`] (i.e., the product of its dimension sizes),
    /// which is `1` for scalars.
    #[inline]
    pub fn size(&self) -> usize {
        self.dimensions.iter().product()
    }

    /// Returns the size of the `index`-th dimension of this [`Shape`]. A negative `index` can be used to obtain
    /// dimension sizes using the end of the dimensions vector as the reference point. For example, an index value of
    /// `-1` will result in the last dimension (i.e., innermost) size being returned. Returns [`None`] if the index
    /// is out of bounds.
    #[inline]
    pub fn dimension(&self, index: i64) -> Option<usize> {
        let rank = self.rank() as i64;
        let index = if index < 0 { index + rank } else { index };
        if (0..rank).contains(&index) { Some(self.dimensions[index as usize]) } else { None }
    }

    /// Returns a copy of this [`Shape`] with its [`DataType`] replaced by the provided one.
    #[inline]
    pub fn with_data_type(&self, data_type: DataType) -> Self {
        Self { data_type: Some(data_type), dimensions: self.dimensions.clone() }
    }

    /// Returns a copy of this [`Shape`] with its dimensions replaced by the provided ones.
    #[inline]
    pub fn with_dimensions<D: Into<Vec<usize>>>(&self, dimensions: D) -> Self {
        Self { data_type: self.data_type, dimensions: dimensions.into() }
    }

    /// Renders this [`Shape`] as a StableHLO tensor type (e.g., `tensor<2x3xf32>` or `tensor<i1>` for a boolean
    /// scalar). The invalid sentinel renders as `tensor<invalid>` which is not parseable. It only shows up in the
    /// output of the lenient debug rendering of programs.
    pub fn wire_type(&self) -> String {
        let data_type = self.data_type.map(|data_type| data_type.wire_token()).unwrap_or("invalid");
        let mut rendered = String::from("tensor<");
        for dimension in &self.dimensions {
            rendered.push_str(dimension.to_string().as_str());
            rendered.push('x');
        }
        rendered.push_str(data_type);
        rendered.push('>');
        rendered
    }
}

impl Display for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.data_type {
            None => write!(f, "invalid"),
            Some(data_type) => write!(
                f,
                "{data_type}[{}]",
                self.dimensions.iter().map(|dimension| dimension.to_string()).collect::<Vec<_>>().join(", "),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    use DataType::*;

    #[test]
    fn test_data_type_families() {
        assert!(Boolean.is_boolean());
        assert!(!Boolean.is_integer());
        assert!(!Boolean.is_numeric());
        assert!(Int4.is_signed_integer());
        assert!(UnsignedInt16.is_unsigned_integer());
        assert!(UnsignedInt16.is_integer());
        assert!(Float8E4M3FNUZ.is_float());
        assert!(BFloat16.is_float());
        assert!(!Complex64.is_float());
        assert!(Complex128.is_complex());
        assert!(Complex128.is_numeric());
    }

    #[test]
    fn test_data_type_bit_width() {
        assert_eq!(Boolean.bit_width(), 8);
        assert_eq!(Int2.bit_width(), 2);
        assert_eq!(Float6E3M2FN.bit_width(), 6);
        assert_eq!(BFloat16.bit_width(), 16);
        assert_eq!(UnsignedInt32.bit_width(), 32);
        assert_eq!(Complex64.bit_width(), 64);
        assert_eq!(Complex128.bit_width(), 128);
    }

    #[test]
    fn test_data_type_counterparts() {
        assert_eq!(Complex64.real_counterpart(), Some(Float32));
        assert_eq!(Complex128.real_counterpart(), Some(Float64));
        assert_eq!(Float32.real_counterpart(), None);
        assert_eq!(Float32.complex_counterpart(), Some(Complex64));
        assert_eq!(Float64.complex_counterpart(), Some(Complex128));
        assert_eq!(Float16.complex_counterpart(), None);
    }

    #[test]
    fn test_data_type_promotable_to() {
        assert!(Boolean.promotable_to(&Float4E2M1FN));
        assert!(Boolean.promotable_to(&BFloat16));
        assert!(Boolean.promotable_to(&Complex128));
        assert!(UnsignedInt4.promotable_to(&UnsignedInt4));
        assert!(UnsignedInt4.promotable_to(&Int64));
        assert!(Float8E4M3B11FNUZ.promotable_to(&BFloat16));
        assert!(Float8E8M0FNU.promotable_to(&Float16));
        assert!(Float16.promotable_to(&Float32));
        assert!(Float32.promotable_to(&Complex64));
        assert!(Complex64.promotable_to(&Complex128));

        assert!(!UnsignedInt8.promotable_to(&Int8));
        assert!(!Int8.promotable_to(&UnsignedInt16));
        assert!(!Int2.promotable_to(&Boolean));
        assert!(!Float6E2M3FN.promotable_to(&UnsignedInt2));
        assert!(!Float6E3M2FN.promotable_to(&Float6E2M3FN));
        assert!(!Float8E4M3B11FNUZ.promotable_to(&Float4E2M1FN));
        assert!(!Float16.promotable_to(&BFloat16));
        assert!(!Float64.promotable_to(&Complex64));
    }

    #[test]
    fn test_data_type_to_string() {
        assert_eq!(Boolean.to_string(), "bool");
        assert_eq!(UnsignedInt4.to_string(), "u4");
        assert_eq!(Int64.to_string(), "i64");
        assert_eq!(Float8E4M3FNUZ.to_string(), "f8e4m3fnuz");
        assert_eq!(BFloat16.to_string(), "bf16");
        assert_eq!(Complex128.to_string(), "c128");
    }

    #[test]
    fn test_data_type_wire_token() {
        assert_eq!(Boolean.wire_token(), "i1");
        assert_eq!(UnsignedInt8.wire_token(), "ui8");
        assert_eq!(Float8E4M3FN.wire_token(), "f8E4M3FN");
        assert_eq!(BFloat16.wire_token(), "bf16");
        assert_eq!(Complex64.wire_token(), "complex<f32>");
    }

    #[test]
    fn test_shape_rank_and_size() {
        let s0 = Shape::scalar(Float32);
        let s1 = Shape::new(Float32, [42]);
        let s2 = Shape::new(Int8, [4, 0]);

        assert_eq!(s0.rank(), 0);
        assert_eq!(s0.size(), 1);
        assert!(s0.is_scalar());
        assert_eq!(s1.rank(), 1);
        assert_eq!(s1.size(), 42);
        assert_eq!(s2.rank(), 2);
        assert_eq!(s2.size(), 0);
    }

    #[test]
    fn test_shape_invalid() {
        let shape = Shape::invalid();
        assert!(!shape.is_valid());
        assert!(!shape.is_scalar());
        assert_eq!(shape.data_type(), None);
        assert_eq!(shape.to_string(), "invalid");
        assert_ne!(shape, Shape::scalar(Float32));
    }

    #[test]
    fn test_shape_dimension() {
        let shape = Shape::new(Float32, [4, 5, 6]);
        assert_eq!(shape.dimension(0), Some(4));
        assert_eq!(shape.dimension(-1), Some(6));
        assert_eq!(shape.dimension(-3), Some(4));
        assert_eq!(shape.dimension(3), None);
        assert_eq!(shape.dimension(-4), None);
    }

    #[test]
    fn test_shape_to_string() {
        assert_eq!(Shape::scalar(Boolean).to_string(), "bool[]");
        assert_eq!(Shape::new(UnsignedInt64, [42]).to_string(), "u64[42]");
        assert_eq!(Shape::new(Float32, [42, 10]).to_string(), "f32[42, 10]");
    }

    #[test]
    fn test_shape_wire_type() {
        assert_eq!(Shape::scalar(Float32).wire_type(), "tensor<f32>");
        assert_eq!(Shape::new(BFloat16, [2, 3]).wire_type(), "tensor<2x3xbf16>");
        assert_eq!(Shape::new(Complex128, [7]).wire_type(), "tensor<7xcomplex<f64>>");
        assert_eq!(Shape::new(Boolean, [1, 0]).wire_type(), "tensor<1x0xi1>");
    }
}
