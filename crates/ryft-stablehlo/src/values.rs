use std::fmt::Display;

use crate::sharding::ShardingSpec;
use crate::types::Shape;

/// Handle of a [`Function`](crate::functions::Function) in the arena of its [`Program`](crate::programs::Program).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FunctionId(pub(crate) usize);

impl FunctionId {
    /// Index of this function in the arena of its program.
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Handle of an SSA value: either an input of a function or an output of one of its statements.
///
/// Values are owned by the function that created them and can only be used by statements of that same function.
/// They are cheap to copy and carry no data themselves. Their [`Shape`] can be obtained through
/// [`Program::shape`](crate::programs::Program::shape) or
/// [`FunctionBuilder::shape`](crate::functions::FunctionBuilder::shape).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Value {
    pub(crate) function: FunctionId,
    pub(crate) index: usize,
}

impl Value {
    /// Returns the [`FunctionId`] of the function that owns this value.
    pub fn function(&self) -> FunctionId {
        self.function
    }
}

/// Name of a [`Value`] in the textual format.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ValueName {
    /// Positional function input, rendered as `%argN`.
    Argument(usize),

    /// Statement output, rendered as `%N`.
    Numbered(usize),

    /// Function input with a caller-provided (normalized) name, rendered as `%name`.
    Named(String),
}

impl Display for ValueName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Argument(index) => write!(f, "%arg{index}"),
            Self::Numbered(index) => write!(f, "%{index}"),
            Self::Named(name) => write!(f, "%{name}"),
        }
    }
}

/// Data that a [`Function`](crate::functions::Function) stores for each of the values it owns.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct ValueData {
    pub(crate) name: ValueName,
    pub(crate) shape: Shape,
    pub(crate) sharding: Option<ShardingSpec>,
}
