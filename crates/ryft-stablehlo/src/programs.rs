//! Programs: named collections of top-level functions plus their distribution configuration.

use std::fmt::Display;
use std::sync::Arc;

use tracing::debug;

use crate::emitter::write_program;
use crate::errors::{Error, ProgramError};
use crate::functions::{Function, FunctionBuilder};
use crate::naming::normalize_identifier;
use crate::sharding::{DeviceMesh, Distribution, ShardingSpec};
use crate::types::Shape;
use crate::values::{FunctionId, Value};

/// Name of the function that every complete [`Program`] must contain.
pub const MAIN_FUNCTION_NAME: &'static str = "main";

/// Program under construction.
///
/// A program owns an arena with all of its functions (top-level functions and closures alike), the optional
/// [`Distribution`] that it is compiled for, and the counter from which the channel handles of collective operations
/// are allocated. Separate programs never share any state.
///
/// Programs are rendered in two ways:
///
///   - [`Program::build`] checks that the program is complete (i.e., that it has a `main` function and that every
///     top-level function has returned) and returns its textual representation.
///   - [`Program::write`] (and the [`Display`] implementation) renders whatever has been constructed so far without
///     any checks. This is meant for debugging partially constructed programs.
#[derive(Clone, Debug, PartialEq)]
pub struct Program {
    name: String,
    pub(crate) functions: Vec<Function>,
    top_level: Vec<FunctionId>,
    distribution: Option<Distribution>,
    pub(crate) channel_count: i64,
}

impl Program {
    /// Creates a new empty program. The name is normalized into a valid identifier.
    pub fn new<N: AsRef<str>>(name: N) -> Self {
        Self {
            name: normalize_identifier(name),
            functions: Vec::new(),
            top_level: Vec::new(),
            distribution: None,
            channel_count: 0,
        }
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Adds a new top-level function with one positional input per entry of `inputs`. The name is normalized into a
    /// valid identifier and must be unique within this program.
    pub fn function<N: AsRef<str>>(&mut self, name: N, inputs: &[Shape]) -> Result<FunctionId, Error> {
        let name = normalize_identifier(name);
        if name.is_empty() {
            return Err(ProgramError::EmptyFunctionName.into());
        }
        if self.top_level.iter().any(|id| self.functions[id.0].name == name) {
            return Err(ProgramError::DuplicateFunctionName { name }.into());
        }
        let id = FunctionId(self.functions.len());
        debug!(program = %self.name, function = %name, inputs = inputs.len(), "created function");
        self.functions.push(Function::new(id, name, None, id));
        self.top_level.push(id);
        let mut builder = FunctionBuilder::new(self, id);
        for shape in inputs {
            builder.input(shape.clone())?;
        }
        Ok(id)
    }

    /// Returns a [`FunctionBuilder`] for the function with the provided [`FunctionId`].
    pub fn builder(&mut self, id: FunctionId) -> Result<FunctionBuilder<'_>, Error> {
        if self.get(id).is_none() {
            return Err(ProgramError::UnknownFunction { id: id.0 }.into());
        }
        Ok(FunctionBuilder::new(self, id))
    }

    /// Returns the function with the provided [`FunctionId`], which may be a top-level function or a closure.
    pub fn get(&self, id: FunctionId) -> Option<&Function> {
        self.functions.get(id.0)
    }

    /// Returns the top-level function with the provided name.
    pub fn get_by_name<N: AsRef<str>>(&self, name: N) -> Option<&Function> {
        self.top_level_functions().find(|function| function.name == name.as_ref())
    }

    /// Top-level functions of this program, in creation order.
    pub fn top_level_functions(&self) -> impl Iterator<Item = &Function> {
        self.top_level.iter().map(|id| &self.functions[id.0])
    }

    /// Returns the [`Shape`] of `value`.
    pub fn shape(&self, value: Value) -> Option<&Shape> {
        self.get(value.function).and_then(|function| function.shape(value))
    }

    pub fn distribution(&self) -> Option<&Distribution> {
        self.distribution.as_ref()
    }

    /// Configures this program as an SPMD program that is replicated `replicas` times with each replica being
    /// partitioned across `partitions` devices. This cannot be combined with device meshes.
    pub fn set_replicas_and_partitions(&mut self, replicas: usize, partitions: usize) -> Result<(), Error> {
        if let Some(Distribution::Meshes(_)) = self.distribution {
            return Err(ProgramError::DistributionConflict {
                configured: "device meshes",
                requested: "replica and partition counts",
            }
            .into());
        }
        debug!(program = %self.name, replicas, partitions, "configured replicas and partitions");
        self.distribution = Some(Distribution::Replicated { replicas, partitions });
        Ok(())
    }

    /// Registers a device mesh with this program. Mesh names must be unique and all meshes must have the same device
    /// count, which becomes the number of partitions of the program.
    pub fn add_mesh(&mut self, mesh: Arc<DeviceMesh>) -> Result<(), Error> {
        if let Some(Distribution::Replicated { .. }) = self.distribution {
            return Err(ProgramError::DistributionConflict {
                configured: "replica and partition counts",
                requested: "device meshes",
            }
            .into());
        }
        let meshes = self.meshes();
        if meshes.iter().any(|registered| registered.name() == mesh.name()) {
            return Err(ProgramError::DuplicateMesh { mesh: mesh.name().to_string() }.into());
        }
        if let Some(first) = meshes.first() {
            if first.device_count() != mesh.device_count() {
                return Err(ProgramError::MeshDeviceCountMismatch {
                    mesh: mesh.name().to_string(),
                    expected: first.device_count(),
                    actual: mesh.device_count(),
                }
                .into());
            }
        }
        debug!(program = %self.name, mesh = %mesh.name(), devices = mesh.device_count(), "registered mesh");
        match &mut self.distribution {
            Some(Distribution::Meshes(meshes)) => meshes.push(mesh),
            _ => self.distribution = Some(Distribution::Meshes(vec![mesh])),
        }
        Ok(())
    }

    /// Device meshes registered with this program, in registration order.
    pub fn meshes(&self) -> &[Arc<DeviceMesh>] {
        match &self.distribution {
            Some(Distribution::Meshes(meshes)) => meshes.as_slice(),
            _ => &[],
        }
    }

    /// Returns the registered device mesh with the provided name.
    pub fn mesh<N: AsRef<str>>(&self, name: N) -> Option<&Arc<DeviceMesh>> {
        self.meshes().iter().find(|mesh| mesh.name() == name.as_ref())
    }

    /// Checks that `sharding` refers to a mesh registered with this program and that it can annotate a value with
    /// the provided [`Shape`].
    pub(crate) fn check_sharding(&self, sharding: &ShardingSpec, shape: &Shape) -> Result<(), Error> {
        let mesh = sharding.mesh();
        if self.mesh(mesh.name()).is_none_or(|registered| registered != mesh) {
            return Err(ProgramError::UnknownMesh { mesh: mesh.name().to_string() }.into());
        }
        if sharding.rank() > shape.rank() {
            let (sharding_rank, rank) = (sharding.rank(), shape.rank());
            return Err(ProgramError::ShardingRankMismatch { sharding_rank, rank }.into());
        }
        sharding.validate()?;
        Ok(())
    }

    /// Checks that this program is complete and returns its textual representation.
    ///
    /// A program is complete when it has a top-level function named `main`, when every top-level function has at
    /// least one statement and has returned, and when no statement carries an
    /// [`AttributeValue::Unsupported`](crate::attributes::AttributeValue::Unsupported) attribute.
    pub fn build(&self) -> Result<String, Error> {
        debug!(program = %self.name, functions = self.top_level.len(), "building program");
        if self.get_by_name(MAIN_FUNCTION_NAME).is_none() {
            return Err(ProgramError::MissingMain { program: self.name.clone() }.into());
        }
        for function in self.top_level_functions() {
            if function.statements.is_empty() {
                return Err(ProgramError::EmptyFunctionBody { function: function.display_name() }.into());
            }
            if !function.returned {
                return Err(ProgramError::MissingReturn { function: function.display_name() }.into());
            }
        }
        for function in &self.functions {
            let unsupported = function.statements.iter().find_map(|statement| statement.unsupported_attribute());
            if let Some((attribute, type_name)) = unsupported {
                let (attribute, type_name) = (attribute.to_string(), type_name.to_string());
                return Err(ProgramError::UnsupportedAttribute { attribute, type_name }.into());
            }
        }
        Ok(self.to_string())
    }

    /// Renders this program without checking that it is complete.
    pub fn write<W: std::fmt::Write>(&self, writer: &mut W) -> std::fmt::Result {
        write_program(self, writer)
    }
}

impl Display for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.write(f)
    }
}
