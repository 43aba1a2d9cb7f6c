//! Prelude module for convenient imports
//!
//! Re-exports the most commonly used types from the kairo crate: the graph
//! description model, the compiler surface and the execution engine. Import
//! this module to get access to the core functionality without having to
//! import each type individually.
//!
//! # Example
//!
//! ```rust,no_run
//! use kairo::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let json = std::fs::read_to_string("path/to/graph.json")?;
//! let description = GraphDocument::from_json(&json)?.into_description()?;
//!
//! let compiled = Compiler::builder(description).build().compile()?;
//!
//! let mut host = NoHost;
//! let result = compiled.invoke(&mut host, vec![Value::Int(21)])?;
//! println!("Invocation result: {:?}", result);
//! # Ok(())
//! # }
//! ```

// Compiler surface
pub use crate::compiler::{CompileMode, Compiler, CompilerBuilder, compile};

// Execution engine
pub use crate::exec::{
    CompiledGraph, EngineConfig, Host, InvocationResult, LoopState, MethodReturn, NoHost,
};

// Graph description model
pub use crate::graph::{
    AccessMode, AccessScope, GraphDescription, GraphDocument, InlineOp, IntoGraph,
    NodeDescription, NodeKind, ParameterDeclaration, PinDeclaration, PinDirection, PinKind,
    PinRef, SwitchCase, VariableDeclaration, Wire,
};

// Values
pub use crate::value::{ObjectRef, Value, ValueType};

// Error types
pub use crate::error::{
    CompileError, ExecError, GraphError, HostError, InvocationError, LinkError,
};

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
