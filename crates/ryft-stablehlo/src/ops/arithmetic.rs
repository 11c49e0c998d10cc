//! Element-wise unary and binary operations and element type conversions.

use crate::attributes::AttributeValue;
use crate::errors::Error;
use crate::functions::FunctionBuilder;
use crate::operations::OpType;
use crate::shape_inference::elementwise;
use crate::types::DataType;
use crate::values::Value;

/// Name of the attribute that holds the number of exponent bits of a [`FunctionBuilder::reduce_precision`].
pub const REDUCE_PRECISION_EXPONENT_BITS_ATTRIBUTE: &'static str = "exponent_bits";

/// Name of the attribute that holds the number of mantissa bits of a [`FunctionBuilder::reduce_precision`].
pub const REDUCE_PRECISION_MANTISSA_BITS_ATTRIBUTE: &'static str = "mantissa_bits";

impl<'p> FunctionBuilder<'p> {
    /// Appends a standard unary operation. `op` must have the [`Capability::StandardUnary`] capability.
    ///
    /// [`Capability::StandardUnary`]: crate::operations::Capability::StandardUnary
    pub fn unary(&mut self, op: OpType, operand: Value) -> Result<Value, Error> {
        let shapes = self.input_shapes(&[operand])?;
        let output = elementwise::unary(op, &shapes[0])?;
        self.append_single(op, &[operand], Vec::new(), Vec::new(), output)
    }

    /// Appends a standard binary operation. `op` must have the [`Capability::StandardBinary`] capability. The
    /// operands must have the same element type and broadcast-compatible shapes.
    ///
    /// [`Capability::StandardBinary`]: crate::operations::Capability::StandardBinary
    pub fn binary(&mut self, op: OpType, lhs: Value, rhs: Value) -> Result<Value, Error> {
        let shapes = self.input_shapes(&[lhs, rhs])?;
        let output = elementwise::binary(op, &shapes[0], &shapes[1])?;
        self.append_single(op, &[lhs, rhs], Vec::new(), Vec::new(), output)
    }

    /// Appends a conversion of `operand` to `data_type`. The conversion is performed value by value.
    pub fn convert(&mut self, operand: Value, data_type: DataType) -> Result<Value, Error> {
        let shapes = self.input_shapes(&[operand])?;
        let output = elementwise::convert(&shapes[0], data_type)?;
        self.append_single(OpType::Convert, &[operand], Vec::new(), Vec::new(), output)
    }

    /// Appends a reinterpretation of the bits of `operand` as `data_type`. When the bit widths differ, a trailing axis
    /// is added (narrowing) or removed (widening) so that the total number of bits stays the same.
    pub fn bitcast_convert(&mut self, operand: Value, data_type: DataType) -> Result<Value, Error> {
        let shapes = self.input_shapes(&[operand])?;
        let output = elementwise::bitcast_convert(&shapes[0], data_type)?;
        self.append_single(OpType::BitcastConvert, &[operand], Vec::new(), Vec::new(), output)
    }

    /// Appends a rounding of `operand` to a floating-point format with the provided number of exponent and mantissa
    /// bits.
    pub fn reduce_precision(&mut self, operand: Value, exponent_bits: u32, mantissa_bits: u32) -> Result<Value, Error> {
        let shapes = self.input_shapes(&[operand])?;
        let output = elementwise::reduce_precision(&shapes[0], exponent_bits, mantissa_bits)?;
        let attributes = vec![
            (
                REDUCE_PRECISION_EXPONENT_BITS_ATTRIBUTE,
                AttributeValue::typed_integer(exponent_bits as i64, DataType::Int32),
            ),
            (
                REDUCE_PRECISION_MANTISSA_BITS_ATTRIBUTE,
                AttributeValue::typed_integer(mantissa_bits as i64, DataType::Int32),
            ),
        ];
        self.append_single(OpType::ReducePrecision, &[operand], attributes, Vec::new(), output)
    }
}

macro_rules! unary_operations {
    ($($(#[$meta:meta])* $name:ident => $op:ident),* $(,)?) => {
        impl<'p> FunctionBuilder<'p> {
            $(
                $(#[$meta])*
                pub fn $name(&mut self, operand: Value) -> Result<Value, Error> {
                    self.unary(OpType::$op, operand)
                }
            )*
        }
    };
}

macro_rules! binary_operations {
    ($($(#[$meta:meta])* $name:ident => $op:ident),* $(,)?) => {
        impl<'p> FunctionBuilder<'p> {
            $(
                $(#[$meta])*
                pub fn $name(&mut self, lhs: Value, rhs: Value) -> Result<Value, Error> {
                    self.binary(OpType::$op, lhs, rhs)
                }
            )*
        }
    };
}

unary_operations!(
    /// Appends an element-wise absolute value. Complex operands produce their magnitude as a real value.
    abs => Abs,
    cbrt => Cbrt,
    ceil => Ceil,
    count_leading_zeros => CountLeadingZeros,
    cosine => Cosine,
    exponential => Exponential,
    /// Appends an element-wise `exp(x) - 1`, which is accurate for values of `x` close to zero.
    exponential_minus_one => ExponentialMinusOne,
    floor => Floor,
    /// Appends the extraction of the imaginary part of every element. Real operands produce zeros.
    imag => Imag,
    /// Appends an element-wise check for finite values, which produces booleans.
    is_finite => IsFinite,
    log => Log,
    /// Appends an element-wise `log(1 + x)`, which is accurate for values of `x` close to zero.
    log_plus_one => LogPlusOne,
    logistic => Logistic,
    negate => Negate,
    /// Appends an element-wise logical (for booleans) or bitwise (for integers) negation.
    not => Not,
    popcnt => Popcnt,
    /// Appends the extraction of the real part of every element.
    real => Real,
    /// Appends an element-wise rounding to the nearest integer, breaking ties away from zero.
    round_nearest_afz => RoundNearestAfz,
    /// Appends an element-wise rounding to the nearest integer, breaking ties towards the even integer.
    round_nearest_even => RoundNearestEven,
    rsqrt => Rsqrt,
    sign => Sign,
    sine => Sine,
    sqrt => Sqrt,
    tan => Tan,
    tanh => Tanh,
);

binary_operations!(
    /// Appends an element-wise addition. Boolean operands are combined with a logical or.
    add => Add,
    and => And,
    atan2 => Atan2,
    /// Appends the construction of complex values from their real (`lhs`) and imaginary (`rhs`) parts.
    complex => Complex,
    divide => Divide,
    maximum => Maximum,
    minimum => Minimum,
    multiply => Multiply,
    or => Or,
    power => Power,
    remainder => Remainder,
    shift_left => ShiftLeft,
    shift_right_arithmetic => ShiftRightArithmetic,
    shift_right_logical => ShiftRightLogical,
    subtract => Subtract,
    xor => Xor,
);
