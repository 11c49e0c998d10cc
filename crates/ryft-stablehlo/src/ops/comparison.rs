//! Comparisons, selections, and clamping.

use crate::attributes::{AttributeValue, ComparisonDirection, ComparisonType};
use crate::errors::Error;
use crate::functions::FunctionBuilder;
use crate::operations::OpType;
use crate::shape_inference::elementwise;
use crate::values::Value;

/// Name of the attribute that holds the [`ComparisonDirection`] of a [`FunctionBuilder::compare`].
pub const COMPARISON_DIRECTION_ATTRIBUTE: &'static str = "comparison_direction";

/// Name of the attribute that holds the [`ComparisonType`] of a [`FunctionBuilder::compare`].
pub const COMPARISON_TYPE_ATTRIBUTE: &'static str = "compare_type";

impl<'p> FunctionBuilder<'p> {
    /// Appends an element-wise comparison of `lhs` and `rhs` that produces booleans. When `comparison_type` is
    /// [`None`], the default comparison type for the element type of the operands is used and rendered explicitly.
    pub fn compare(
        &mut self,
        lhs: Value,
        rhs: Value,
        direction: ComparisonDirection,
        comparison_type: Option<ComparisonType>,
    ) -> Result<Value, Error> {
        let shapes = self.input_shapes(&[lhs, rhs])?;
        let output = elementwise::compare(&shapes[0], &shapes[1], direction, comparison_type)?;
        let comparison_type = match (comparison_type, shapes[0].data_type()) {
            (Some(comparison_type), _) => comparison_type,
            (None, Some(data_type)) => ComparisonType::default_for(data_type),
            (None, None) => ComparisonType::Float,
        };
        let attributes = vec![
            (COMPARISON_DIRECTION_ATTRIBUTE, AttributeValue::literal(&direction)),
            (COMPARISON_TYPE_ATTRIBUTE, AttributeValue::literal(&comparison_type)),
        ];
        self.append_single(OpType::Compare, &[lhs, rhs], attributes, Vec::new(), output)
    }

    /// Appends an element-wise selection between `on_true` and `on_false` based on `predicate`, which must be a
    /// boolean scalar or have the same dimensions as the two branches.
    pub fn select(&mut self, predicate: Value, on_true: Value, on_false: Value) -> Result<Value, Error> {
        let shapes = self.input_shapes(&[predicate, on_true, on_false])?;
        let output = elementwise::select(&shapes[0], &shapes[1], &shapes[2])?;
        self.append_single(OpType::Select, &[predicate, on_true, on_false], Vec::new(), Vec::new(), output)
    }

    /// Appends an element-wise clamping of `operand` to `[min, max]`. Each bound may be a scalar or have the shape of
    /// `operand`.
    pub fn clamp(&mut self, min: Value, operand: Value, max: Value) -> Result<Value, Error> {
        let shapes = self.input_shapes(&[min, operand, max])?;
        let output = elementwise::clamp(&shapes[0], &shapes[1], &shapes[2])?;
        self.append_single(OpType::Clamp, &[min, operand, max], Vec::new(), Vec::new(), output)
    }
}
