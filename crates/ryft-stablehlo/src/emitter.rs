//! Rendering of [`Program`]s in the textual StableHLO format.
//!
//! Programs are rendered as an MLIR module that uses the generic operation syntax for every statement:
//!
//! ```text
//! module @program attributes {mhlo.num_partitions = 4 : i32, mhlo.num_replicas = 1 : i32} {
//!   sdy.mesh @mesh = <["x"=2, "y"=2]>
//!   func.func @main(%arg0: tensor<4xf32> {sdy.sharding = #sdy.sharding<@mesh, [{"x"}]>}) -> tensor<f32> {
//!     %0 = "stablehlo.constant"() { value = dense<0.0> : tensor<f32> } : () -> tensor<f32>
//!     %2 = "stablehlo.reduce"(%arg0, %0) ({
//!     ^body(%arg1: tensor<f32>, %arg2: tensor<f32>):
//!       %1 = "stablehlo.add"(%arg1, %arg2) : (tensor<f32>, tensor<f32>) -> tensor<f32>
//!       "stablehlo.return"(%1) : (tensor<f32>) -> ()
//!     }) { dimensions = array<i64: 0> } : (tensor<4xf32>, tensor<f32>) -> tensor<f32>
//!     "func.return"(%2) : (tensor<f32>) -> ()
//!   }
//! }
//! ```
//!
//! Every nested construct is indented by [`INDENTATION`] relative to its parent. Closures are rendered as regions
//! right after the operand list of the statement that consumes them and their block label sits at the same
//! indentation level as that statement.

use std::fmt::Write;

use crate::attributes::Render;
use crate::functions::Function;
use crate::programs::Program;
use crate::sharding::ShardingSpec;
use crate::statements::Statement;
use crate::types::Shape;
use crate::values::Value;

/// Indentation that is added for each level of nesting.
pub const INDENTATION: &'static str = "  ";

/// Writes the textual representation of `program` to `writer` without validating it.
pub(crate) fn write_program<W: Write>(program: &Program, writer: &mut W) -> std::fmt::Result {
    write!(writer, "module @{}", program.name())?;
    if let Some(distribution) = program.distribution() {
        let (replicas, partitions) = distribution.replicas_and_partitions();
        write!(
            writer,
            " attributes {{mhlo.num_partitions = {partitions} : i32, mhlo.num_replicas = {replicas} : i32}}",
        )?;
    }
    writeln!(writer, " {{")?;
    for mesh in program.meshes() {
        writeln!(writer, "{INDENTATION}{}", mesh.wire_declaration())?;
    }
    for function in program.top_level_functions() {
        write_function(program, function, writer)?;
    }
    writeln!(writer, "}}")
}

fn write_function<W: Write>(program: &Program, function: &Function, writer: &mut W) -> std::fmt::Result {
    let inputs = function
        .inputs()
        .iter()
        .map(|input| {
            let shape = function.shape(*input).cloned().unwrap_or_else(Shape::invalid);
            let mut rendered = format!("{}: {}", value_name(program, *input), shape.wire_type());
            if let Some(sharding) = function.value_sharding(*input) {
                rendered.push(' ');
                rendered.push_str(sharding_attribute(sharding, &shape).as_str());
            }
            rendered
        })
        .collect::<Vec<_>>()
        .join(", ");
    let outputs = function_output_types(function);
    writeln!(writer, "{INDENTATION}func.func @{}({inputs}) -> {outputs} {{", function.name())?;
    for statement in function.statements() {
        write_statement(program, statement, 2, writer)?;
    }
    writeln!(writer, "{INDENTATION}}}")
}

fn function_output_types(function: &Function) -> String {
    let outputs = function.outputs();
    let shardings = function.output_shardings();
    let sharded = shardings.iter().any(Option::is_some);
    if outputs.len() == 1 && !sharded {
        return outputs[0].wire_type();
    }
    let outputs = outputs
        .iter()
        .enumerate()
        .map(|(index, shape)| match shardings.get(index).and_then(Option::as_ref) {
            Some(sharding) => format!("{} {}", shape.wire_type(), sharding_attribute(sharding, shape)),
            None => shape.wire_type(),
        })
        .collect::<Vec<_>>();
    format!("({})", outputs.join(", "))
}

fn sharding_attribute(sharding: &ShardingSpec, shape: &Shape) -> String {
    format!("{{sdy.sharding = {}}}", sharding.wire_attribute(shape.rank()))
}

fn write_statement<W: Write>(
    program: &Program,
    statement: &Statement,
    depth: usize,
    writer: &mut W,
) -> std::fmt::Result {
    let indentation = INDENTATION.repeat(depth);
    write!(writer, "{indentation}")?;
    if !statement.outputs().is_empty() {
        write!(writer, "{} = ", value_names(program, statement.outputs()))?;
    }
    write!(writer, "\"{}\"({})", statement.op().wire_name(), value_names(program, statement.inputs()))?;

    if !statement.closures().is_empty() {
        write!(writer, " (")?;
        for (index, closure) in statement.closures().iter().enumerate() {
            if index > 0 {
                write!(writer, ", ")?;
            }
            writeln!(writer, "{{")?;
            if let Some(function) = program.get(closure.function) {
                let inputs = function
                    .inputs()
                    .iter()
                    .map(|input| format!("{}: {}", value_name(program, *input), value_type(program, *input)))
                    .collect::<Vec<_>>();
                if inputs.is_empty() {
                    writeln!(writer, "{indentation}^{}:", closure.label)?;
                } else {
                    writeln!(writer, "{indentation}^{}({}):", closure.label, inputs.join(", "))?;
                }
                for nested in function.statements() {
                    write_statement(program, nested, depth + 1, writer)?;
                }
            }
            write!(writer, "{indentation}}}")?;
        }
        write!(writer, ")")?;
    }

    let attributes = statement
        .attributes()
        .iter()
        .map(|(name, value)| format!("{name} = {}", value.render()))
        .collect::<Vec<_>>();
    match attributes.as_slice() {
        [] => {}
        [attribute] if !attribute.contains('\n') => write!(writer, " {{ {attribute} }}")?,
        attributes => {
            let nested_indentation = INDENTATION.repeat(depth + 1);
            let separator = format!(",\n{nested_indentation}");
            write!(writer, " {{\n{nested_indentation}{}\n{indentation}}}", attributes.join(separator.as_str()))?;
        }
    }

    let input_types = statement.inputs().iter().map(|input| value_type(program, *input)).collect::<Vec<_>>();
    let output_types = statement.outputs().iter().map(|output| value_type(program, *output)).collect::<Vec<_>>();
    let output_types = match output_types.as_slice() {
        [output_type] => output_type.clone(),
        output_types => format!("({})", output_types.join(", ")),
    };
    writeln!(writer, " : ({}) -> {output_types}", input_types.join(", "))
}

fn value_name(program: &Program, value: Value) -> String {
    program
        .get(value.function())
        .and_then(|function| function.value_name(value))
        .map(|name| name.to_string())
        .unwrap_or_else(|| "%<unknown>".to_string())
}

fn value_names(program: &Program, values: &[Value]) -> String {
    values.iter().map(|value| value_name(program, *value)).collect::<Vec<_>>().join(", ")
}

fn value_type(program: &Program, value: Value) -> String {
    program.shape(value).map(Shape::wire_type).unwrap_or_else(|| Shape::invalid().wire_type())
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    use crate::attributes::AttributeValue;
    use crate::operations::OpType;
    use crate::programs::Program;
    use crate::types::{DataType, Shape};

    #[test]
    fn test_write_empty_program() {
        let program = Program::new("empty");
        assert_eq!(program.to_string(), "module @empty {\n}\n");
    }

    #[test]
    fn test_write_function_with_multiple_outputs() {
        let mut program = Program::new("test");
        let main = program
            .function("main", &[Shape::new(DataType::Float32, [2, 3]), Shape::scalar(DataType::Int32)])
            .unwrap();
        let mut builder = program.builder(main).unwrap();
        let inputs = builder.inputs();
        let x = builder.negate(inputs[0]).unwrap();
        builder.r#return(&[x, inputs[1]]).unwrap();
        assert_eq!(
            program.build().unwrap(),
            indoc! {r#"
                module @test {
                  func.func @main(%arg0: tensor<2x3xf32>, %arg1: tensor<i32>) -> (tensor<2x3xf32>, tensor<i32>) {
                    %0 = "stablehlo.negate"(%arg0) : (tensor<2x3xf32>) -> tensor<2x3xf32>
                    "func.return"(%0, %arg1) : (tensor<2x3xf32>, tensor<i32>) -> ()
                  }
                }
            "#},
        );
    }

    #[test]
    fn test_write_attribute_blocks() {
        let mut program = Program::new("test");
        let main = program.function("main", &[]).unwrap();
        let mut builder = program.builder(main).unwrap();
        builder
            .append(
                OpType::CustomCall,
                &[],
                vec![
                    ("call_target_name", AttributeValue::from("foo")),
                    ("has_side_effect", AttributeValue::from(true)),
                ],
                Vec::new(),
                Vec::new(),
            )
            .unwrap();
        builder
            .append(
                OpType::CustomCall,
                &[],
                vec![("call_target_name", AttributeValue::from("bar"))],
                Vec::new(),
                vec![Shape::scalar(DataType::Boolean)],
            )
            .unwrap();
        assert_eq!(
            program.to_string(),
            indoc! {r#"
                module @test {
                  func.func @main() -> () {
                    "stablehlo.custom_call"() {
                      call_target_name = "foo",
                      has_side_effect = true
                    } : () -> ()
                    %0 = "stablehlo.custom_call"() { call_target_name = "bar" } : () -> tensor<i1>
                  }
                }
            "#},
        );
    }

    #[test]
    fn test_write_multi_line_attribute() {
        let mut program = Program::new("test");
        let main = program.function("main", &[]).unwrap();
        let mut builder = program.builder(main).unwrap();
        let value = AttributeValue::Literal("[\n  1\n]".to_string());
        builder.append(OpType::CustomCall, &[], vec![("config", value)], Vec::new(), Vec::new()).unwrap();
        let expected = "    \"stablehlo.custom_call\"() {\n      config = [\n  1\n]\n    } : () -> ()\n";
        assert!(program.to_string().contains(expected));
    }
}
