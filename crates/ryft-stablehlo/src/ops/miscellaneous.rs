//! Index generation, random bit generation, and custom calls.

use crate::attributes::{AttributeValue, RngAlgorithm};
use crate::errors::Error;
use crate::functions::FunctionBuilder;
use crate::operations::OpType;
use crate::ops::{normalized_axis, shape_refs};
use crate::shape_inference::miscellaneous;
use crate::types::{DataType, Shape};
use crate::values::Value;

pub const IOTA_DIMENSION_ATTRIBUTE: &'static str = "iota_dimension";
pub const RNG_ALGORITHM_ATTRIBUTE: &'static str = "rng_algorithm";
pub const CUSTOM_CALL_TARGET_NAME_ATTRIBUTE: &'static str = "call_target_name";
pub const CUSTOM_CALL_HAS_SIDE_EFFECT_ATTRIBUTE: &'static str = "has_side_effect";

impl<'p> FunctionBuilder<'p> {
    /// Appends a tensor with the provided `shape` whose elements are equal to their index along `iota_dimension`.
    pub fn iota(&mut self, shape: Shape, iota_dimension: i64) -> Result<Value, Error> {
        let output = miscellaneous::iota(&shape, iota_dimension)?;
        let iota_dimension = normalized_axis(iota_dimension, shape.rank());
        let attributes =
            vec![(IOTA_DIMENSION_ATTRIBUTE, AttributeValue::typed_integer(iota_dimension, DataType::Int64))];
        self.append_single(OpType::Iota, &[], attributes, Vec::new(), output)
    }

    /// Appends the generation of random bits with the provided `shape` from `initial_state`. Returns the updated
    /// generator state followed by the generated bits.
    pub fn rng_bit_generator(
        &mut self,
        initial_state: Value,
        shape: Shape,
        algorithm: RngAlgorithm,
    ) -> Result<Vec<Value>, Error> {
        let shapes = self.input_shapes(&[initial_state])?;
        let outputs = miscellaneous::rng_bit_generator(&shapes[0], &shape)?;
        let attributes = vec![(RNG_ALGORITHM_ATTRIBUTE, AttributeValue::literal(&algorithm))];
        self.append(OpType::RngBitGenerator, &[initial_state], attributes, Vec::new(), outputs)
    }

    /// Appends a call to the opaque `target`, which produces values with the provided `output_shapes`.
    pub fn custom_call(
        &mut self,
        target: &str,
        inputs: &[Value],
        output_shapes: &[Shape],
        has_side_effect: bool,
    ) -> Result<Vec<Value>, Error> {
        self.custom_call_with_attributes(target, inputs, output_shapes, has_side_effect, Vec::new())
    }

    /// Appends a call to the opaque `target` that also carries the provided target-specific `attributes`.
    pub fn custom_call_with_attributes(
        &mut self,
        target: &str,
        inputs: &[Value],
        output_shapes: &[Shape],
        has_side_effect: bool,
        attributes: Vec<(&str, AttributeValue)>,
    ) -> Result<Vec<Value>, Error> {
        let shapes = self.input_shapes(inputs)?;
        let outputs = miscellaneous::custom_call(&shape_refs(&shapes), output_shapes)?;
        let mut attributes = attributes;
        attributes.push((CUSTOM_CALL_TARGET_NAME_ATTRIBUTE, AttributeValue::from(target)));
        if has_side_effect {
            attributes.push((CUSTOM_CALL_HAS_SIDE_EFFECT_ATTRIBUTE, AttributeValue::from(true)));
        }
        self.append(OpType::CustomCall, inputs, attributes, Vec::new(), outputs)
    }
}
