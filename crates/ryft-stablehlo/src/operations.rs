//! Closed registry of the operation kinds that can appear in a program.
//!
//! Each [`OpType`] belongs to a fixed set of [`Capability`]s. Shape inference consults these sets (e.g., to decide
//! which element types an operation accepts) instead of special-casing individual operations.

use std::fmt::Display;

use crate::naming::snake_case;
use crate::types::DataType;

/// Named capability sets that operations belong to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Elementwise operations with one operand whose output shape matches the operand shape.
    StandardUnary,

    /// Elementwise operations with two operands that follow the standard broadcasting rules.
    StandardBinary,

    /// Operations that compare their operands and produce booleans.
    Comparison,

    /// Operations that only accept real floating-point element types.
    FloatOnly,

    /// Operations that accept floating-point and complex element types.
    FloatOrComplex,

    /// Operations that only accept (signed or unsigned) integer element types.
    Bitwise,

    /// Operations that accept boolean and integer element types.
    Logical,

    /// Operations that accept signed integer, floating-point, and complex element types.
    SignedOrFloat,

    /// Operations that accept every element type except for booleans.
    NonBoolean,

    /// Operations that extract the real or imaginary part of their operand (floating-point or complex).
    ComplexParts,

    /// Cross-device communication operations that are parameterized by replica groups.
    Collective,

    /// Operations whose semantics are parameterized by one or more closures.
    HasClosures,
}

impl Capability {
    /// Returns whether this [`Capability`] admits the provided element type, or [`None`] if this [`Capability`] does
    /// not constrain element types at all.
    pub fn admits(&self, data_type: DataType) -> Option<bool> {
        match self {
            Self::FloatOnly => Some(data_type.is_float()),
            Self::FloatOrComplex | Self::ComplexParts => Some(data_type.is_float() || data_type.is_complex()),
            Self::Bitwise => Some(data_type.is_integer()),
            Self::Logical => Some(data_type.is_boolean() || data_type.is_integer()),
            Self::SignedOrFloat => {
                Some(data_type.is_signed_integer() || data_type.is_float() || data_type.is_complex())
            }
            Self::NonBoolean => Some(!data_type.is_boolean()),
            _ => None,
        }
    }

    /// Human-readable description of the element types admitted by this [`Capability`], used in error messages.
    pub fn description(&self) -> &'static str {
        match self {
            Self::FloatOnly => "a floating-point type",
            Self::FloatOrComplex | Self::ComplexParts => "a floating-point or complex type",
            Self::Bitwise => "an integer type",
            Self::Logical => "a boolean or integer type",
            Self::SignedOrFloat => "a signed integer, floating-point, or complex type",
            Self::NonBoolean => "a non-boolean type",
            _ => "any type",
        }
    }
}

macro_rules! op_types {
    ($($variant:ident => [$($capability:ident),* $(,)?]),* $(,)?) => {
        /// Kinds of operations that can appear in a program.
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum OpType {
            $($variant,)*
        }

        impl OpType {
            /// All [`OpType`]s, in declaration order.
            pub const ALL: &'static [OpType] = &[$(OpType::$variant,)*];

            /// Returns the `CamelCase` name of this [`OpType`].
            pub fn name(&self) -> &'static str {
                match self {
                    $(Self::$variant => stringify!($variant),)*
                }
            }

            /// Returns the [`Capability`] sets that this [`OpType`] belongs to.
            pub fn capabilities(&self) -> &'static [Capability] {
                match self {
                    $(Self::$variant => &[$(Capability::$capability,)*],)*
                }
            }
        }
    };
}

op_types! {
    Abs => [StandardUnary, SignedOrFloat],
    Cbrt => [StandardUnary, FloatOrComplex],
    Ceil => [StandardUnary, FloatOnly],
    CountLeadingZeros => [StandardUnary, Bitwise],
    Cosine => [StandardUnary, FloatOrComplex],
    Exponential => [StandardUnary, FloatOrComplex],
    ExponentialMinusOne => [StandardUnary, FloatOrComplex],
    Floor => [StandardUnary, FloatOnly],
    Imag => [StandardUnary, ComplexParts],
    IsFinite => [StandardUnary, FloatOnly],
    Log => [StandardUnary, FloatOrComplex],
    LogPlusOne => [StandardUnary, FloatOrComplex],
    Logistic => [StandardUnary, FloatOrComplex],
    Negate => [StandardUnary, NonBoolean],
    Not => [StandardUnary, Logical],
    Popcnt => [StandardUnary, Bitwise],
    Real => [StandardUnary, ComplexParts],
    RoundNearestAfz => [StandardUnary, FloatOnly],
    RoundNearestEven => [StandardUnary, FloatOnly],
    Rsqrt => [StandardUnary, FloatOrComplex],
    Sign => [StandardUnary, SignedOrFloat],
    Sine => [StandardUnary, FloatOrComplex],
    Sqrt => [StandardUnary, FloatOrComplex],
    Tan => [StandardUnary, FloatOrComplex],
    Tanh => [StandardUnary, FloatOrComplex],
    Add => [StandardBinary],
    And => [StandardBinary, Logical],
    Atan2 => [StandardBinary, FloatOrComplex],
    Complex => [StandardBinary, FloatOnly],
    Divide => [StandardBinary, NonBoolean],
    Maximum => [StandardBinary],
    Minimum => [StandardBinary],
    Multiply => [StandardBinary],
    Or => [StandardBinary, Logical],
    Power => [StandardBinary, NonBoolean],
    Remainder => [StandardBinary, NonBoolean],
    ShiftLeft => [StandardBinary, Bitwise],
    ShiftRightArithmetic => [StandardBinary, Bitwise],
    ShiftRightLogical => [StandardBinary, Bitwise],
    Subtract => [StandardBinary, NonBoolean],
    Xor => [StandardBinary, Logical],
    Compare => [Comparison],
    Select => [],
    Clamp => [NonBoolean],
    Constant => [],
    Iota => [NonBoolean],
    Convert => [],
    BitcastConvert => [],
    Reshape => [],
    BroadcastInDim => [],
    Transpose => [],
    Slice => [],
    DynamicSlice => [],
    DynamicUpdateSlice => [],
    Concatenate => [],
    Gather => [],
    Scatter => [HasClosures],
    Reduce => [HasClosures],
    ReduceWindow => [HasClosures],
    Convolution => [NonBoolean],
    DotGeneral => [],
    Pad => [],
    Fft => [],
    ReducePrecision => [FloatOnly],
    RngBitGenerator => [],
    AllGather => [Collective],
    AllToAll => [Collective],
    AllReduce => [Collective, HasClosures],
    CollectivePermute => [Collective],
    CollectiveBroadcast => [Collective],
    CustomCall => [],
    Return => [],
    FuncReturn => [],
    ArgMinMax => [NonBoolean],
}

/// Operations whose wire names do not follow the generic `stablehlo.<snake_case>` rule.
const WIRE_NAME_EXCEPTIONS: &[(OpType, &str)] =
    &[(OpType::FuncReturn, "func.return"), (OpType::ArgMinMax, "stablehlo.reduce")];

impl OpType {
    /// Returns `true` if this [`OpType`] belongs to the provided [`Capability`] set.
    #[inline]
    pub fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }

    /// Returns `true` for the operations that terminate a function body.
    #[inline]
    pub fn is_return(&self) -> bool {
        matches!(self, Self::Return | Self::FuncReturn)
    }

    /// Returns the name of this [`OpType`] as it appears in the textual wire format (e.g., `stablehlo.add` or
    /// `func.return`).
    ///
    /// [`OpType::ArgMinMax`] never appears on the wire on its own. It is lowered to an iota followed by a
    /// two-operand reduction, and so it reports the name of that reduction.
    pub fn wire_name(&self) -> String {
        WIRE_NAME_EXCEPTIONS
            .iter()
            .find(|(op, _)| op == self)
            .map(|(_, name)| name.to_string())
            .unwrap_or_else(|| format!("stablehlo.{}", snake_case(self.name())))
    }
}

impl Display for OpType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.wire_name())
    }
}
