//! Operation-specific methods of [`FunctionBuilder`](crate::functions::FunctionBuilder).
//!
//! Every method follows the same steps. It looks up the shapes of its operands (which also checks that the function
//! is still open and that the operands are in scope), infers the output shapes using the matching
//! [`shape_inference`](crate::shape_inference) function, and only then appends a single statement. Operations that
//! take a combinator (e.g., [`reduce`](crate::functions::FunctionBuilder::reduce)) receive the [`FunctionId`] of a
//! returned closure of the current function and consume it.
//!
//! The attribute names that each operation uses in the textual format are exposed as `*_ATTRIBUTE` constants.
//!
//! [`FunctionId`]: crate::values::FunctionId

use crate::types::Shape;

pub mod arithmetic;
pub mod communication;
pub mod comparison;
pub mod indexing;
pub mod linear_algebra;
pub mod manipulation;
pub mod miscellaneous;
pub mod reduction;
pub mod spectral;

pub use arithmetic::*;
pub use communication::*;
pub use comparison::*;
pub use indexing::*;
pub use linear_algebra::*;
pub use manipulation::*;
pub use miscellaneous::*;
pub use reduction::*;
pub use spectral::*;

/// Maps negative axis indices to their non-negative counterparts. `axes` must have already been validated against
/// `rank` by the shape inference function of the operation.
pub(crate) fn normalized_axes(axes: &[i64], rank: usize) -> Vec<i64> {
    axes.iter().map(|axis| normalized_axis(*axis, rank)).collect()
}

pub(crate) fn normalized_axis(axis: i64, rank: usize) -> i64 {
    if axis < 0 { axis + rank as i64 } else { axis }
}

/// Borrows every shape in `shapes`, which is the form that the multi-operand inference functions expect.
pub(crate) fn shape_refs(shapes: &[Shape]) -> Vec<&Shape> {
    shapes.iter().collect()
}
