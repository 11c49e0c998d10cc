//! Shape-checked construction of StableHLO programs.
//!
//! A [`Program`](programs::Program) owns a set of functions. Statements are appended to a function through a
//! [`FunctionBuilder`](functions::FunctionBuilder), which infers the output shapes of every operation eagerly and
//! rejects invalid operations without modifying the program. Complete programs are rendered in the textual StableHLO
//! format, optionally annotated with Shardy shardings over the [`DeviceMesh`](sharding::DeviceMesh)es of the program.

pub mod attributes;
pub mod emitter;
pub mod errors;
pub mod functions;
pub mod literals;
pub mod naming;
pub mod operations;
pub mod ops;
pub mod programs;
pub mod shape_inference;
pub mod sharding;
pub mod statements;
pub mod types;
pub mod values;
