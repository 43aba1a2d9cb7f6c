use super::pin::{PinDeclaration, PinDirection, PinKind, Wire};
use crate::error::GraphError;
use crate::linker;
use crate::value::{Value, ValueType};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether a member-access node touches frame-local storage or the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessScope {
    /// A temporary variable owned by the invocation frame.
    Frame,
    /// A member resolved through the host capability interface.
    Host,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessMode {
    Get,
    Set,
}

/// The closed operator set of inline operation nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InlineOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Negate,
    Abs,
    Not,
    And,
    Or,
    Xor,
    Equal,
    NotEqual,
    Greater,
    GreaterOrEqual,
    Less,
    LessOrEqual,
}

impl InlineOp {
    pub fn is_unary(&self) -> bool {
        matches!(self, InlineOp::Negate | InlineOp::Abs | InlineOp::Not)
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            InlineOp::Add => "+",
            InlineOp::Subtract => "-",
            InlineOp::Multiply => "*",
            InlineOp::Divide => "/",
            InlineOp::Negate => "NEG",
            InlineOp::Abs => "ABS",
            InlineOp::Not => "NOT",
            InlineOp::And => "AND",
            InlineOp::Or => "OR",
            InlineOp::Xor => "XOR",
            InlineOp::Equal => "==",
            InlineOp::NotEqual => "!=",
            InlineOp::Greater => ">",
            InlineOp::GreaterOrEqual => ">=",
            InlineOp::Less => "<",
            InlineOp::LessOrEqual => "<=",
        }
    }

    /// Parses an editor document operator tag.
    pub fn parse(tag: &str) -> Option<InlineOp> {
        match tag {
            "add" => Some(InlineOp::Add),
            "subtract" => Some(InlineOp::Subtract),
            "multiply" => Some(InlineOp::Multiply),
            "divide" => Some(InlineOp::Divide),
            "negate" => Some(InlineOp::Negate),
            "abs" => Some(InlineOp::Abs),
            "not" => Some(InlineOp::Not),
            "and" => Some(InlineOp::And),
            "or" => Some(InlineOp::Or),
            "xor" => Some(InlineOp::Xor),
            "equal" => Some(InlineOp::Equal),
            "notEqual" => Some(InlineOp::NotEqual),
            "greater" => Some(InlineOp::Greater),
            "greaterOrEqual" => Some(InlineOp::GreaterOrEqual),
            "less" => Some(InlineOp::Less),
            "lessOrEqual" => Some(InlineOp::LessOrEqual),
            _ => None,
        }
    }
}

/// One arm of a switch node: a case value and the exec-out pin it routes to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchCase {
    pub value: Value,
    pub pin: String,
}

/// The closed set of node kinds the compiler understands.
///
/// Kind-specific configuration travels with the variant, so the per-kind
/// lowering is an exhaustive match and adding a kind is a compile-time
/// checked exercise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    /// Seeds the frame with the caller's arguments; exec-out `then`, one
    /// data-out per declared input parameter, named after it.
    Entry,
    /// Calls a host method: optional data-in `target` (owner), the remaining
    /// data-ins as positional arguments, data-out `return` plus one data-out
    /// per positional out-argument, exec-out `then`.
    Call { method: String },
    /// Reads or writes a frame temporary (pin named after the variable) or a
    /// host member (data-in `target` for the owner). `Get` produces a value;
    /// `Set` is a flow node.
    MemberAccess {
        member: String,
        scope: AccessScope,
        mode: AccessMode,
    },
    /// Writes its data-ins (named after output parameters) into the return
    /// bag and completes the invocation.
    Return,
    /// Data-in `condition`, exec-outs `true` and `false`.
    Branch,
    /// Data-in `value`, one exec-out per case, exec-out `default`.
    Switch { cases: Vec<SwitchCase> },
    /// Fires every exec-out in declared order before yielding to its caller.
    Sequence,
    /// Data-ins `first` and `last` (half-open range), exec-outs `body`,
    /// `completed`, `broken`; data-out `index`.
    For,
    /// Data-in `items`, exec-outs `body`, `completed`, `broken`; data-outs
    /// `element` and `index`.
    ForEach,
    /// Data-in `condition`, exec-outs `body`, `completed`, `broken`.
    While,
    /// Ends the innermost active loop.
    Break,
    /// Ends the current iteration of the innermost active loop.
    Continue,
    /// Data-in `value`; produces the coerced value or fails the invocation.
    Conversion { to: ValueType },
    /// Data-in `value`, exec-outs `valid` and `invalid`; on success the
    /// coerced value is readable from data-out `result`.
    Cast { to: ValueType },
    /// Pass-through routing point; compiles to a no-op link in runtime mode.
    Redirect,
    /// An inline operator applied to data-in `value` (unary) or `lhs`/`rhs`
    /// (binary); result on data-out `result`.
    Inline { op: InlineOp },
}

impl NodeKind {
    /// Short tag used in log lines and error messages.
    pub fn tag(&self) -> &'static str {
        match self {
            NodeKind::Entry => "entry",
            NodeKind::Call { .. } => "call",
            NodeKind::MemberAccess { .. } => "memberAccess",
            NodeKind::Return => "return",
            NodeKind::Branch => "branch",
            NodeKind::Switch { .. } => "switch",
            NodeKind::Sequence => "sequence",
            NodeKind::For => "for",
            NodeKind::ForEach => "forEach",
            NodeKind::While => "while",
            NodeKind::Break => "break",
            NodeKind::Continue => "continue",
            NodeKind::Conversion { .. } => "conversion",
            NodeKind::Cast { .. } => "cast",
            NodeKind::Redirect => "redirect",
            NodeKind::Inline { .. } => "inline",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// Serialized, editor-authored specification of one graph node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDescription {
    pub id: String,
    pub kind: NodeKind,
    /// Canvas coordinates; carried for the editor, ignored by the engine.
    pub position: (f32, f32),
    pub pins: Vec<PinDeclaration>,
}

impl NodeDescription {
    pub fn new(id: &str, kind: NodeKind) -> Self {
        Self {
            id: id.to_string(),
            kind,
            position: (0.0, 0.0),
            pins: Vec::new(),
        }
    }

    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.position = (x, y);
        self
    }

    pub fn with_pin(mut self, pin: PinDeclaration) -> Self {
        self.pins.push(pin);
        self
    }

    pub fn pin(&self, name: &str) -> Option<&PinDeclaration> {
        self.pins.iter().find(|p| p.name == name)
    }

    pub fn input_pins(&self) -> impl Iterator<Item = &PinDeclaration> {
        self.pins.iter().filter(|p| p.is_input())
    }

    pub fn output_pins(&self) -> impl Iterator<Item = &PinDeclaration> {
        self.pins.iter().filter(|p| p.is_output())
    }
}

/// A declared input or output parameter of the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDeclaration {
    pub name: String,
    pub ty: ValueType,
}

impl ParameterDeclaration {
    pub fn new(name: &str, ty: ValueType) -> Self {
        Self {
            name: name.to_string(),
            ty,
        }
    }
}

/// A declared temporary variable, defaulted per invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDeclaration {
    pub name: String,
    pub ty: ValueType,
    /// Initial value; the type's zero value when absent.
    pub default: Option<Value>,
}

impl VariableDeclaration {
    pub fn new(name: &str, ty: ValueType) -> Self {
        Self {
            name: name.to_string(),
            ty,
            default: None,
        }
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }
}

/// The complete, canonical definition of one function graph, ready for
/// compilation. Produced by the editor / persistence layer, immutable once
/// compiled; every edit bumps `version` so hosts know when to recompile.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GraphDescription {
    pub name: String,
    pub version: u64,
    pub nodes: Vec<NodeDescription>,
    pub wires: Vec<Wire>,
    pub inputs: Vec<ParameterDeclaration>,
    pub outputs: Vec<ParameterDeclaration>,
    pub locals: Vec<VariableDeclaration>,
}

impl GraphDescription {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn find_node(&self, id: &str) -> Option<&NodeDescription> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn entry_node(&self) -> Option<&NodeDescription> {
        self.nodes.iter().find(|n| n.kind == NodeKind::Entry)
    }

    /// Marks the description as edited; compiled graphs built from an older
    /// version report themselves stale.
    pub fn touch(&mut self) {
        self.version += 1;
    }

    /// Checks the structural invariants the compiler relies on: exactly one
    /// entry node, at least one return node, unique pin and declaration
    /// names, and entry/return pin sets consistent with the declared
    /// parameter lists.
    pub fn validate(&self) -> Result<(), GraphError> {
        let entry_count = self
            .nodes
            .iter()
            .filter(|n| n.kind == NodeKind::Entry)
            .count();
        if entry_count == 0 {
            return Err(GraphError::MissingEntryNode {
                graph: self.name.clone(),
            });
        }
        if entry_count > 1 {
            return Err(GraphError::MultipleEntryNodes {
                graph: self.name.clone(),
                count: entry_count,
            });
        }
        if !self.nodes.iter().any(|n| n.kind == NodeKind::Return) {
            return Err(GraphError::MissingReturnNode {
                graph: self.name.clone(),
            });
        }

        for node in &self.nodes {
            if let Some(dup) = node.pins.iter().map(|p| &p.name).duplicates().next() {
                return Err(GraphError::DuplicatePinName {
                    node_id: node.id.clone(),
                    pin: dup.clone(),
                });
            }
        }

        // Inputs, outputs and locals are separate namespaces; names must
        // only be unique within their own list.
        for list in [
            self.inputs.iter().map(|p| &p.name).collect::<Vec<_>>(),
            self.outputs.iter().map(|p| &p.name).collect(),
            self.locals.iter().map(|v| &v.name).collect(),
        ] {
            if let Some(dup) = list.into_iter().duplicates().next() {
                return Err(GraphError::DuplicateDeclaration {
                    graph: self.name.clone(),
                    name: dup.clone(),
                });
            }
        }

        for node in &self.nodes {
            match node.kind {
                NodeKind::Entry => self.validate_entry(node)?,
                NodeKind::Return => self.validate_return(node)?,
                _ => {}
            }
        }
        Ok(())
    }

    /// The entry node must expose every declared input parameter as a data
    /// output of a compatible type, and nothing else.
    fn validate_entry(&self, node: &NodeDescription) -> Result<(), GraphError> {
        for param in &self.inputs {
            let pin = node
                .output_pins()
                .find(|p| p.is_data() && p.name == param.name)
                .ok_or_else(|| GraphError::EntryParameterMissing {
                    node_id: node.id.clone(),
                    name: param.name.clone(),
                })?;
            if !pin.accepts(param.ty) {
                return Err(GraphError::PinTypeMismatch {
                    node_id: node.id.clone(),
                    pin: pin.name.clone(),
                    expected: param.ty,
                });
            }
        }
        for pin in node.output_pins().filter(|p| p.is_data()) {
            if !self.inputs.iter().any(|p| p.name == pin.name) {
                return Err(GraphError::EntryPinUndeclared {
                    node_id: node.id.clone(),
                    pin: pin.name.clone(),
                });
            }
        }
        Ok(())
    }

    /// A return node may accept any subset of the declared output
    /// parameters; unknown data inputs are rejected.
    fn validate_return(&self, node: &NodeDescription) -> Result<(), GraphError> {
        for pin in node.input_pins().filter(|p| p.is_data()) {
            let param = self
                .outputs
                .iter()
                .find(|p| p.name == pin.name)
                .ok_or_else(|| GraphError::ReturnPinUndeclared {
                    node_id: node.id.clone(),
                    pin: pin.name.clone(),
                })?;
            if !pin.accepts(param.ty) {
                return Err(GraphError::PinTypeMismatch {
                    node_id: node.id.clone(),
                    pin: pin.name.clone(),
                    expected: param.ty,
                });
            }
        }
        Ok(())
    }

    /// Removes wires whose endpoints no longer resolve to a declared pin.
    /// Invoked before persistence; returns the number of wires removed.
    pub fn prune_dangling_wires(&mut self) -> usize {
        let before = self.wires.len();
        let endpoint_ok = |node_id: &str, pin_name: &str, dir: PinDirection| {
            self.nodes
                .iter()
                .find(|n| n.id == node_id)
                .and_then(|n| n.pin(pin_name))
                .is_some_and(|p| p.direction == dir)
        };
        let kept: Vec<Wire> = self
            .wires
            .iter()
            .filter(|w| {
                endpoint_ok(&w.source.node, &w.source.pin, PinDirection::Out)
                    && endpoint_ok(&w.target.node, &w.target.pin, PinDirection::In)
            })
            .cloned()
            .collect();
        self.wires = kept;
        let removed = before - self.wires.len();
        if removed > 0 {
            tracing::debug!(graph = %self.name, removed, "pruned dangling wires");
        }
        removed
    }

    /// Renames a declared input parameter, rewriting the entry node's pin
    /// and every wire endpoint that referenced the old name.
    pub fn rename_input(&mut self, old: &str, new: &str) -> usize {
        let rewritten = linker::rename_entry_outputs(self, old, new);
        if let Some(param) = self.inputs.iter_mut().find(|p| p.name == old) {
            param.name = new.to_string();
        }
        self.touch();
        rewritten
    }

    /// Renames a declared output parameter, rewriting return-node pins and
    /// their wire endpoints.
    pub fn rename_output(&mut self, old: &str, new: &str) -> usize {
        let rewritten = linker::rename_return_inputs(self, old, new);
        if let Some(param) = self.outputs.iter_mut().find(|p| p.name == old) {
            param.name = new.to_string();
        }
        self.touch();
        rewritten
    }

    /// Renames a temporary variable, rewriting every getter/setter node that
    /// shares the variable's field name, on both pin directions.
    pub fn rename_local(&mut self, old: &str, new: &str) -> usize {
        let rewritten = linker::rename_variable_pins(self, old, new);
        if let Some(var) = self.locals.iter_mut().find(|v| v.name == old) {
            var.name = new.to_string();
        }
        self.touch();
        rewritten
    }

    pub(crate) fn pin_of(&self, node_id: &str, pin_name: &str) -> Option<&PinDeclaration> {
        self.find_node(node_id).and_then(|n| n.pin(pin_name))
    }
}

// Exec pins on a redirect are untyped pass-throughs, so PinKind decides which
// side of the node a chase enters.
pub(crate) fn redirect_in_pin(node: &NodeDescription, kind: PinKind) -> Option<&PinDeclaration> {
    node.input_pins().find(|p| p.kind == kind)
}

pub(crate) fn redirect_out_pin(node: &NodeDescription, kind: PinKind) -> Option<&PinDeclaration> {
    node.output_pins().find(|p| p.kind == kind)
}
