//! # Kairo - Function Graph Compilation and Execution Engine
//!
//! **Kairo** turns editor-authored node graphs (entry → operations → return)
//! into directly executable node networks and walks them like a tree-walking
//! interpreter. Graphs are linked and compiled ahead of time; at runtime the
//! engine advances control flow through continuation calls between compiled
//! nodes while threading data values between them.
//!
//! ## Core Workflow
//!
//! The engine is format-agnostic. It operates on a canonical
//! [`GraphDescription`](graph::GraphDescription); the graphical editor and
//! its persistence layer are external producers of that description. The
//! primary workflow is:
//!
//! 1. **Load Your Graph**: Parse the editor's persisted document into a
//!    description, either through the bundled [`GraphDocument`](graph::GraphDocument)
//!    JSON shape or by implementing [`IntoGraph`](graph::IntoGraph) for your
//!    own format.
//! 2. **Compile**: Use [`Compiler::builder`](compiler::Compiler::builder) to
//!    validate, link and lower the description into a
//!    [`CompiledGraph`](exec::CompiledGraph). Unknown node kinds, unwired
//!    required pins and shape errors all fail here, never at runtime.
//! 3. **Invoke**: Call [`CompiledGraph::invoke`](exec::CompiledGraph::invoke)
//!    with the argument values and a [`Host`](exec::Host) implementation.
//!    Each invocation owns a fresh frame, so one compiled graph serves any
//!    number of concurrent invocations.
//!
//! ## Quick Start
//!
//! The following example builds a graph computing `y = x * 2` by hand and
//! invokes it.
//!
//! ```rust,no_run
//! use kairo::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let mut graph = GraphDescription::new("double");
//!     graph.inputs.push(ParameterDeclaration::new("x", ValueType::Int));
//!     graph.outputs.push(ParameterDeclaration::new("y", ValueType::Int));
//!
//!     graph.nodes.push(
//!         NodeDescription::new("entry", NodeKind::Entry)
//!             .with_pin(PinDeclaration::exec_out("then"))
//!             .with_pin(PinDeclaration::data_out("x", ValueType::Int)),
//!     );
//!     graph.nodes.push(
//!         NodeDescription::new("double", NodeKind::Inline { op: InlineOp::Multiply })
//!             .with_pin(PinDeclaration::data_in("lhs", ValueType::Int).required())
//!             .with_pin(PinDeclaration::data_in("rhs", ValueType::Int).with_default(Value::Int(2)))
//!             .with_pin(PinDeclaration::data_out("result", ValueType::Int)),
//!     );
//!     graph.nodes.push(
//!         NodeDescription::new("exit", NodeKind::Return)
//!             .with_pin(PinDeclaration::exec_in("exec"))
//!             .with_pin(PinDeclaration::data_in("y", ValueType::Int)),
//!     );
//!     graph.wires.push(Wire::new("entry", "then", "exit", "exec"));
//!     graph.wires.push(Wire::new("entry", "x", "double", "lhs"));
//!     graph.wires.push(Wire::new("double", "result", "exit", "y"));
//!
//!     let compiled = Compiler::builder(graph).build().compile()?;
//!
//!     let mut host = NoHost;
//!     let result = compiled.invoke(&mut host, vec![Value::Int(21)])?;
//!     assert_eq!(result.get("y"), Some(&Value::Int(42)));
//!     Ok(())
//! }
//! ```

pub mod compiler;
pub mod error;
pub mod exec;
pub mod graph;
pub mod linker;
pub mod prelude;
pub mod value;
