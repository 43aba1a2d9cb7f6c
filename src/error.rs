use crate::value::{Value, ValueType};
use thiserror::Error;

/// Errors reported by [`GraphDescription::validate`](crate::graph::GraphDescription::validate)
/// before any linking or compilation takes place.
#[derive(Error, Debug, Clone)]
pub enum GraphError {
    #[error("Graph '{graph}' has no entry node")]
    MissingEntryNode { graph: String },

    #[error("Graph '{graph}' has {count} entry nodes, expected exactly one")]
    MultipleEntryNodes { graph: String, count: usize },

    #[error("Graph '{graph}' has no return node")]
    MissingReturnNode { graph: String },

    #[error("Node '{node_id}' declares the pin name '{pin}' more than once")]
    DuplicatePinName { node_id: String, pin: String },

    #[error("Graph '{graph}' declares the name '{name}' more than once")]
    DuplicateDeclaration { graph: String, name: String },

    #[error("Entry node '{node_id}' does not expose input parameter '{name}'")]
    EntryParameterMissing { node_id: String, name: String },

    #[error("Entry node '{node_id}' exposes '{pin}', which is not a declared input parameter")]
    EntryPinUndeclared { node_id: String, pin: String },

    #[error("Return node '{node_id}' accepts '{pin}', which is not a declared output parameter")]
    ReturnPinUndeclared { node_id: String, pin: String },

    #[error("Pin '{pin}' on node '{node_id}' does not accept the declared type {expected}")]
    PinTypeMismatch {
        node_id: String,
        pin: String,
        expected: ValueType,
    },
}

/// Errors reported while resolving wires into pin bindings.
#[derive(Error, Debug, Clone)]
pub enum LinkError {
    #[error("Required {kind} pin '{pin}' on node '{node_id}' has no wire")]
    RequiredPinUnwired {
        node_id: String,
        pin: String,
        kind: String,
    },

    #[error("Consuming pin '{pin}' on node '{node_id}' has {count} wires, at most one is allowed")]
    DuplicateWireIntoPin {
        node_id: String,
        pin: String,
        count: usize,
    },

    #[error(
        "Producing pin '{pin}' on node '{node_id}' feeds {count} wires but is not marked multi-capable"
    )]
    FanOutOnSinglePin {
        node_id: String,
        pin: String,
        count: usize,
    },

    #[error("Redirect chain through node '{node_id}' forms a cycle")]
    RedirectCycle { node_id: String },
}

/// Errors reported by the node compiler, including the editor document
/// conversion where unknown node-kind tags surface.
#[derive(Error, Debug, Clone)]
pub enum CompileError {
    #[error("Failed to parse graph document JSON: {0}")]
    JsonParse(String),

    #[error("Node '{node_id}' has an unknown node kind tag: '{kind}'")]
    UnknownNodeKind { node_id: String, kind: String },

    #[error("Node '{node_id}' ({kind}) is malformed: {message}")]
    MalformedNode {
        node_id: String,
        kind: String,
        message: String,
    },

    #[error("Node '{node_id}' ({kind}) is missing expected pin '{pin}'")]
    MissingPin {
        node_id: String,
        kind: String,
        pin: String,
    },

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Link(#[from] LinkError),
}

/// Errors reported when persisting or restoring a graph description.
#[derive(Error, Debug, Clone)]
pub enum ArtifactError {
    #[error("Could not access '{path}': {message}")]
    Io { path: String, message: String },

    #[error("Serialization failed: {0}")]
    Encode(String),

    #[error("Deserialization failed: {0}")]
    Decode(String),
}

/// Contract violations detected at invoke time, before any node executes.
#[derive(Error, Debug, Clone)]
pub enum InvocationError {
    #[error("Expected {expected} argument(s), got {got}")]
    ArgumentCountMismatch { expected: usize, got: usize },

    #[error("Argument {index} ('{name}') expects {expected}, got '{found}'")]
    ArgumentTypeMismatch {
        index: usize,
        name: String,
        expected: ValueType,
        found: Value,
    },
}

/// Errors raised by a [`Host`](crate::exec::Host) implementation.
#[derive(Error, Debug, Clone)]
pub enum HostError {
    #[error("Member '{member}' not found")]
    MemberNotFound { member: String },

    #[error("Member '{member}' is not callable")]
    NotCallable { member: String },

    #[error("{0}")]
    Other(String),
}

/// Errors that can occur while walking a compiled graph.
#[derive(Error, Debug, Clone)]
pub enum ExecError {
    #[error(transparent)]
    Contract(#[from] InvocationError),

    #[error(
        "Type mismatch during '{operation}' at node '{node_id}': expected {expected}, found '{found}'"
    )]
    TypeMismatch {
        node_id: String,
        operation: String,
        expected: String,
        found: Value,
    },

    #[error("Division by zero at node '{node_id}'")]
    DivisionByZero { node_id: String },

    #[error("Conversion at node '{node_id}' cannot coerce '{found}' to {to}")]
    ConversionFailed {
        node_id: String,
        to: ValueType,
        found: Value,
    },

    #[error("Host rejected '{member}' at node '{node_id}': {reason}")]
    Host {
        node_id: String,
        member: String,
        reason: HostError,
    },

    #[error("Pin '{pin}' of node '{node_id}' was read before the node executed")]
    ValueUnavailable { node_id: String, pin: String },

    #[error("Break at node '{node_id}' fired outside of any loop")]
    BreakOutsideLoop { node_id: String },

    #[error("Continue at node '{node_id}' fired outside of any loop")]
    ContinueOutsideLoop { node_id: String },

    #[error("Node '{node_id}' was driven as a flow node but produces values only")]
    NotExecutable { node_id: String },

    #[error("Unknown local variable '{name}' at node '{node_id}'")]
    UnknownLocal { node_id: String, name: String },

    #[error("Unknown input parameter '{name}' at node '{node_id}'")]
    UnknownParameter { node_id: String, name: String },

    #[error("Step budget of {budget} exhausted at node '{node_id}'")]
    StepBudgetExhausted { node_id: String, budget: u64 },
}

/// Errors that can occur when converting a custom editor format into a
/// [`GraphDescription`](crate::graph::GraphDescription).
#[derive(Error, Debug, Clone)]
pub enum GraphConversionError {
    #[error("Invalid graph data: {0}")]
    Validation(String),
}
