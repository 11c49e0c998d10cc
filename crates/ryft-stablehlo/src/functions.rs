//! Functions and the builder through which statements are appended to them.
//!
//! Every [`Function`] lives in the arena of its [`Program`] and is referred to by a [`FunctionId`]. A function is
//! either a *top-level* function, which has a unique name and is emitted as a `func.func`, or an anonymous *closure*
//! that is created inside another function (its parent) and is later consumed by exactly one statement of that parent
//! as an operation body (e.g., the combinator of a reduction). Closures do not capture values of their parent. All
//! data that crosses the boundary is passed explicitly as closure inputs.
//!
//! Functions go through two states. While *building*, inputs and statements can be appended. Appending the terminal
//! return statement moves the function to the *returned* state, after which it is frozen and every further mutation
//! fails with [`ProgramError::FunctionAlreadyReturned`].
//!
//! Value numbering is scoped to the outermost (i.e., top-level) function that encloses a closure. This means that
//! every `%N` and `%argN` name is unique across a top-level function and all of its nested closures.

use std::collections::{BTreeMap, HashSet};

use tracing::{debug, trace};

use crate::attributes::{AttributeValue, ChannelHandle};
use crate::errors::{Error, ProgramError};
use crate::naming::normalize_identifier;
use crate::operations::OpType;
use crate::programs::Program;
use crate::shape_inference::ClosureSignature;
use crate::sharding::ShardingSpec;
use crate::statements::{ClosureRef, Statement};
use crate::types::Shape;
use crate::values::{FunctionId, Value, ValueData, ValueName};

/// Function in a [`Program`]. Functions can only be mutated through a [`FunctionBuilder`].
#[derive(Clone, Debug, PartialEq)]
pub struct Function {
    pub(crate) id: FunctionId,
    pub(crate) name: String,
    pub(crate) parent: Option<FunctionId>,
    pub(crate) root: FunctionId,
    pub(crate) inputs: Vec<Value>,
    pub(crate) values: Vec<ValueData>,
    pub(crate) statements: Vec<Statement>,
    pub(crate) outputs: Vec<Shape>,
    pub(crate) output_shardings: Vec<Option<ShardingSpec>>,
    pub(crate) returned: bool,
    pub(crate) consumed: bool,
    pub(crate) scope: Scope,
}

/// Naming state shared by a top-level function and all of its closures. Only the scope of the top-level function is
/// ever used.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Scope {
    argument_count: usize,
    value_count: usize,
    names: HashSet<String>,
}

impl Function {
    pub(crate) fn new(id: FunctionId, name: String, parent: Option<FunctionId>, root: FunctionId) -> Self {
        Self {
            id,
            name,
            parent,
            root,
            inputs: Vec::new(),
            values: Vec::new(),
            statements: Vec::new(),
            outputs: Vec::new(),
            output_shardings: Vec::new(),
            returned: false,
            consumed: false,
            scope: Scope::default(),
        }
    }

    pub fn id(&self) -> FunctionId {
        self.id
    }

    /// Name of this function, which is empty for closures.
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Function that this closure was created in, or [`None`] for top-level functions.
    pub fn parent(&self) -> Option<FunctionId> {
        self.parent
    }

    pub fn is_closure(&self) -> bool {
        self.parent.is_some()
    }

    pub fn inputs(&self) -> &[Value] {
        self.inputs.as_slice()
    }

    pub fn statements(&self) -> &[Statement] {
        self.statements.as_slice()
    }

    /// Output shapes of this function. These are only known once the function has returned.
    pub fn outputs(&self) -> &[Shape] {
        self.outputs.as_slice()
    }

    pub fn is_returned(&self) -> bool {
        self.returned
    }

    /// Returns the [`Shape`] of `value` if it is owned by this function.
    pub fn shape(&self, value: Value) -> Option<&Shape> {
        self.value_data(value).map(|data| &data.shape)
    }

    /// Returns the textual name of `value` (e.g., `%3`) if it is owned by this function.
    pub fn value_name(&self, value: Value) -> Option<&ValueName> {
        self.value_data(value).map(|data| &data.name)
    }

    /// Returns the sharding annotation of `value` if it is an input of this function that carries one.
    pub fn value_sharding(&self, value: Value) -> Option<&ShardingSpec> {
        self.value_data(value).and_then(|data| data.sharding.as_ref())
    }

    /// Sharding annotations of the outputs of this function, one entry per output.
    pub fn output_shardings(&self) -> &[Option<ShardingSpec>] {
        self.output_shardings.as_slice()
    }

    pub(crate) fn value_data(&self, value: Value) -> Option<&ValueData> {
        if value.function != self.id { None } else { self.values.get(value.index) }
    }

    /// Name used to refer to this function in error messages.
    pub(crate) fn display_name(&self) -> String {
        if self.name.is_empty() { format!("<closure #{}>", self.id.0) } else { self.name.clone() }
    }

    fn display_value_name(&self, value: Value) -> String {
        self.value_name(value).map(|name| name.to_string()).unwrap_or_else(|| format!("<value #{}>", value.index))
    }
}

/// Mutable view of one [`Function`] of a [`Program`] that appends inputs and statements to it.
///
/// Operation-specific methods (e.g., [`FunctionBuilder::add`] or [`FunctionBuilder::reduce`]) are defined in the
/// [`ops`](crate::ops) modules. Each of them infers the output shapes of the operation before touching the function,
/// so a failed call never leaves a partially appended statement behind.
///
/// # Examples
///
/// ```rust
/// # use ryft_stablehlo::programs::Program;
/// # use ryft_stablehlo::types::{DataType, Shape};
/// let mut program = Program::new("example");
/// let main = program.function("main", &[Shape::new(DataType::Float32, [2, 3])]).unwrap();
/// let mut builder = program.builder(main).unwrap();
/// let x = builder.inputs()[0];
/// let y = builder.add(x, x).unwrap();
/// builder.r#return(&[y]).unwrap();
/// assert!(program.build().unwrap().contains("\"stablehlo.add\"(%arg0, %arg0)"));
/// ```
#[derive(Debug)]
pub struct FunctionBuilder<'p> {
    program: &'p mut Program,
    function: FunctionId,
}

impl<'p> FunctionBuilder<'p> {
    pub(crate) fn new(program: &'p mut Program, function: FunctionId) -> Self {
        Self { program, function }
    }

    /// [`FunctionId`] of the function that this builder appends to.
    pub fn id(&self) -> FunctionId {
        self.function
    }

    pub fn function(&self) -> &Function {
        &self.program.functions[self.function.0]
    }

    pub fn program(&self) -> &Program {
        self.program
    }

    /// Inputs of the function, in declaration order.
    pub fn inputs(&self) -> Vec<Value> {
        self.function().inputs.clone()
    }

    /// Returns the [`Shape`] of `value`, which must be owned by this function.
    pub fn shape(&self, value: Value) -> Result<&Shape, Error> {
        self.check_scope(&[value])?;
        let function = self.function();
        function.shape(value).ok_or_else(|| self.out_of_scope(value))
    }

    /// Appends a positional input (named `%argN`) to the function.
    pub fn input(&mut self, shape: Shape) -> Result<Value, Error> {
        self.check_open()?;
        let scope = self.scope_mut();
        let name = loop {
            let index = scope.argument_count;
            scope.argument_count += 1;
            if scope.names.insert(format!("arg{index}")) {
                break ValueName::Argument(index);
            }
        };
        Ok(self.push_input(name, shape, None))
    }

    /// Appends an input with an explicit name to the function. The name is normalized into a valid identifier and
    /// must be unique across the enclosing top-level function and all of its closures.
    pub fn named_input<N: AsRef<str>>(&mut self, name: N, shape: Shape) -> Result<Value, Error> {
        self.check_open()?;
        let name = normalize_identifier(name);
        if name.is_empty() {
            return Err(ProgramError::EmptyValueName.into());
        }
        if !self.scope_mut().names.insert(name.clone()) {
            let function = self.program.functions[self.root().0].display_name();
            return Err(ProgramError::DuplicateValueName { name, function }.into());
        }
        Ok(self.push_input(ValueName::Named(name), shape, None))
    }

    /// Appends a positional input that carries a sharding annotation. The mesh of `sharding` must be registered with
    /// the program and `sharding` cannot shard more axes than `shape` has.
    pub fn input_with_sharding(&mut self, shape: Shape, sharding: ShardingSpec) -> Result<Value, Error> {
        self.check_open()?;
        self.program.check_sharding(&sharding, &shape)?;
        let value = self.input(shape)?;
        self.program.functions[self.function.0].values[value.index].sharding = Some(sharding);
        Ok(value)
    }

    /// Creates a new closure whose parent is this function and returns a builder for it. The closure must return
    /// before it can be passed to an operation of this function.
    pub fn closure(&mut self) -> Result<FunctionBuilder<'_>, Error> {
        self.check_open()?;
        let id = FunctionId(self.program.functions.len());
        let root = self.root();
        self.program.functions.push(Function::new(id, String::new(), Some(self.function), root));
        debug!(closure = id.0, parent = self.function.0, "created closure");
        Ok(FunctionBuilder::new(self.program, id))
    }

    /// Appends the terminal return statement, which freezes the function. Top-level functions return with
    /// `func.return` and closures with `stablehlo.return`.
    pub fn r#return(&mut self, values: &[Value]) -> Result<(), Error> {
        self.return_with_shardings(values, vec![None; values.len()])
    }

    /// Same as [`FunctionBuilder::r#return`], but also attaches a sharding annotation to each output.
    pub fn return_with_shardings(
        &mut self,
        values: &[Value],
        shardings: Vec<Option<ShardingSpec>>,
    ) -> Result<(), Error> {
        let shapes = self.input_shapes(values)?;
        if shardings.len() != values.len() {
            return Err(ProgramError::ShardingCountMismatch { expected: values.len(), actual: shardings.len() }.into());
        }
        for (sharding, shape) in shardings.iter().zip(&shapes) {
            if let Some(sharding) = sharding {
                self.program.check_sharding(sharding, shape)?;
            }
        }
        let op = if self.function().is_closure() { OpType::Return } else { OpType::FuncReturn };
        self.append(op, values, Vec::new(), Vec::new(), Vec::new())?;
        let function = &mut self.program.functions[self.function.0];
        function.outputs = shapes;
        function.output_shardings = shardings;
        function.returned = true;
        debug!(function = %function.display_name(), outputs = function.outputs.len(), "function returned");
        Ok(())
    }

    /// Returns the shapes of `values` after checking that the function is still open and that every value is in
    /// its scope.
    pub(crate) fn input_shapes(&self, values: &[Value]) -> Result<Vec<Shape>, Error> {
        self.check_open()?;
        self.check_scope(values)?;
        let function = self.function();
        Ok(values.iter().map(|value| function.values[value.index].shape.clone()).collect())
    }

    /// Returns the signature of `closure` after checking that it can be consumed by a statement of this function.
    pub(crate) fn closure_signature(&self, closure: FunctionId) -> Result<ClosureSignature, Error> {
        let function = self.function();
        let child = self.program.get(closure).ok_or(ProgramError::UnknownFunction { id: closure.0 })?;
        if child.parent != Some(self.function) {
            return Err(ProgramError::ClosureNotChild {
                closure: child.display_name(),
                function: function.display_name(),
            }
            .into());
        }
        if !child.returned {
            return Err(ProgramError::ClosureNotReturned { closure: child.display_name() }.into());
        }
        if child.consumed {
            return Err(ProgramError::ClosureAlreadyUsed { closure: child.display_name() }.into());
        }
        let inputs = child.inputs.iter().map(|input| child.values[input.index].shape.clone()).collect();
        Ok(ClosureSignature::new(inputs, child.outputs.clone()))
    }

    /// Appends a statement whose output shapes have already been inferred, allocating one new value per output.
    pub(crate) fn append(
        &mut self,
        op: OpType,
        inputs: &[Value],
        attributes: Vec<(&str, AttributeValue)>,
        closures: Vec<ClosureRef>,
        output_shapes: Vec<Shape>,
    ) -> Result<Vec<Value>, Error> {
        self.check_open()?;
        self.check_scope(inputs)?;
        let mut seen = HashSet::new();
        for closure in &closures {
            self.closure_signature(closure.function)?;
            if !seen.insert(closure.function) {
                let closure = self.program.functions[closure.function.0].display_name();
                return Err(ProgramError::ClosureAlreadyUsed { closure }.into());
            }
        }
        for closure in &closures {
            self.program.functions[closure.function.0].consumed = true;
        }

        let scope = self.scope_mut();
        let first_number = scope.value_count;
        scope.value_count += output_shapes.len();
        let function = &mut self.program.functions[self.function.0];
        let outputs = output_shapes
            .into_iter()
            .enumerate()
            .map(|(offset, shape)| {
                let value = Value { function: function.id, index: function.values.len() };
                let name = ValueName::Numbered(first_number + offset);
                function.values.push(ValueData { name, shape, sharding: None });
                value
            })
            .collect::<Vec<_>>();
        let attributes =
            attributes.into_iter().map(|(name, value)| (name.to_string(), value)).collect::<BTreeMap<_, _>>();
        let statement = Statement { op, inputs: inputs.to_vec(), attributes, closures, outputs: outputs.clone() };
        function.statements.push(statement);
        trace!(function = %function.display_name(), op = %op, outputs = outputs.len(), "appended statement");
        Ok(outputs)
    }

    /// Appends a statement with exactly one output and returns that output.
    pub(crate) fn append_single(
        &mut self,
        op: OpType,
        inputs: &[Value],
        attributes: Vec<(&str, AttributeValue)>,
        closures: Vec<ClosureRef>,
        output_shape: Shape,
    ) -> Result<Value, Error> {
        let outputs = self.append(op, inputs, attributes, closures, vec![output_shape])?;
        Ok(outputs[0])
    }

    /// Allocates the next channel handle of the program. Handles are only allocated after the statement that uses
    /// them has been validated.
    pub(crate) fn next_channel_handle(&mut self) -> ChannelHandle {
        self.program.channel_count += 1;
        ChannelHandle::new(self.program.channel_count)
    }

    fn root(&self) -> FunctionId {
        self.function().root
    }

    fn scope_mut(&mut self) -> &mut Scope {
        let root = self.root();
        &mut self.program.functions[root.0].scope
    }

    fn push_input(&mut self, name: ValueName, shape: Shape, sharding: Option<ShardingSpec>) -> Value {
        let function = &mut self.program.functions[self.function.0];
        let value = Value { function: function.id, index: function.values.len() };
        trace!(function = %function.display_name(), input = %name, shape = %shape, "added input");
        function.values.push(ValueData { name, shape, sharding });
        function.inputs.push(value);
        value
    }

    fn check_open(&self) -> Result<(), Error> {
        let function = self.function();
        if function.returned {
            return Err(ProgramError::FunctionAlreadyReturned { function: function.display_name() }.into());
        }
        Ok(())
    }

    fn check_scope(&self, values: &[Value]) -> Result<(), Error> {
        let function = self.function();
        match values.iter().find(|value| function.value_data(**value).is_none()) {
            Some(value) => Err(self.out_of_scope(*value)),
            None => Ok(()),
        }
    }

    fn out_of_scope(&self, value: Value) -> Error {
        let value_name = self
            .program
            .get(value.function)
            .map(|owner| owner.display_value_name(value))
            .unwrap_or_else(|| format!("<value #{}>", value.index));
        ProgramError::ValueOutOfScope { value: value_name, function: self.function().display_name() }.into()
    }
}
