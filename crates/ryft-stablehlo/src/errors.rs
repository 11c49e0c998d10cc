use thiserror::Error;

use crate::shape_inference::ShapeError;
use crate::sharding::ShardingError;

/// Error type for violations of the structural rules of a [`Program`](crate::programs::Program), such as appending to
/// a function that has already returned or referring to a value from outside of its scope.
#[derive(Error, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ProgramError {
    #[error("unknown function #{id}")]
    UnknownFunction { id: usize },

    #[error("function '{function}' has already returned")]
    FunctionAlreadyReturned { function: String },

    #[error("value '{value}' is not in the scope of function '{function}'")]
    ValueOutOfScope { value: String, function: String },

    #[error("closure '{closure}' is not a direct child of function '{function}'")]
    ClosureNotChild { closure: String, function: String },

    #[error("closure '{closure}' must return before it can be used")]
    ClosureNotReturned { closure: String },

    #[error("closure '{closure}' has already been used by another operation")]
    ClosureAlreadyUsed { closure: String },

    #[error("function name '{name}' is used more than once")]
    DuplicateFunctionName { name: String },

    #[error("value name '{name}' is used more than once in function '{function}'")]
    DuplicateValueName { name: String, function: String },

    #[error("function names must be non-empty")]
    EmptyFunctionName,

    #[error("value names must be non-empty")]
    EmptyValueName,

    #[error("program '{program}' has no function named 'main'")]
    MissingMain { program: String },

    #[error("function '{function}' has no statements")]
    EmptyFunctionBody { function: String },

    #[error("function '{function}' never returned")]
    MissingReturn { function: String },

    #[error("mesh '{mesh}' is not registered with the program")]
    UnknownMesh { mesh: String },

    #[error("mesh '{mesh}' is registered more than once")]
    DuplicateMesh { mesh: String },

    #[error("mesh '{mesh}' has {actual} device(s) but the program is partitioned across {expected} device(s)")]
    MeshDeviceCountMismatch { mesh: String, expected: usize, actual: usize },

    #[error("cannot configure {requested} because the program already uses {configured}")]
    DistributionConflict { configured: &'static str, requested: &'static str },

    #[error("attribute '{attribute}' has a value of unsupported type '{type_name}'")]
    UnsupportedAttribute { attribute: String, type_name: String },

    #[error("sharding with {sharding_rank} axes cannot be attached to a value of rank {rank}")]
    ShardingRankMismatch { sharding_rank: usize, rank: usize },

    #[error("expected {expected} sharding(s) but got {actual}")]
    ShardingCountMismatch { expected: usize, actual: usize },
}

/// Error type returned by every fallible construction operation of this crate.
#[derive(Error, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Error {
    #[error(transparent)]
    Shape(#[from] ShapeError),

    #[error(transparent)]
    Program(#[from] ProgramError),

    #[error(transparent)]
    Sharding(#[from] ShardingError),
}
