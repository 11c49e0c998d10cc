use std::collections::BTreeMap;

use crate::attributes::AttributeValue;
use crate::operations::OpType;
use crate::values::{FunctionId, Value};

/// Closure that parameterizes a [`Statement`] (e.g., the body of a reduction), together with the label that
/// introduces its block in the textual format.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ClosureRef {
    pub label: &'static str,
    pub function: FunctionId,
}

/// Single operation invocation in a function body.
///
/// Statements are created by [`FunctionBuilder`](crate::functions::FunctionBuilder) and are immutable afterwards.
/// Attributes are kept sorted by name so that rendering is deterministic.
#[derive(Clone, Debug, PartialEq)]
pub struct Statement {
    pub(crate) op: OpType,
    pub(crate) inputs: Vec<Value>,
    pub(crate) attributes: BTreeMap<String, AttributeValue>,
    pub(crate) closures: Vec<ClosureRef>,
    pub(crate) outputs: Vec<Value>,
}

impl Statement {
    pub fn op(&self) -> OpType {
        self.op
    }

    pub fn inputs(&self) -> &[Value] {
        self.inputs.as_slice()
    }

    pub fn attributes(&self) -> &BTreeMap<String, AttributeValue> {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    pub fn closures(&self) -> &[ClosureRef] {
        self.closures.as_slice()
    }

    /// Output values of this statement. This is empty only for return statements and for custom calls without
    /// results.
    pub fn outputs(&self) -> &[Value] {
        self.outputs.as_slice()
    }

    /// Returns the name and the type name of the first [`AttributeValue::Unsupported`] attribute of this statement.
    pub(crate) fn unsupported_attribute(&self) -> Option<(&str, &str)> {
        self.attributes.iter().find_map(|(name, value)| match value {
            AttributeValue::Unsupported { type_name } => Some((name.as_str(), type_name.as_str())),
            _ => None,
        })
    }
}
