use crate::graph::InlineOp;
use crate::value::{Value, ValueType};

/// Stable index of an executable node inside the compiled graph's arena.
///
/// Loop constructs make the node graph cyclic, so executable nodes never own
/// their neighbours; they address them through the arena instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeIndex(pub(crate) usize);

/// Resolved source of one data input, fixed at compile time.
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    /// Evaluate the named pin of another executable node on demand.
    Producer { node: NodeIndex, pin: String },
    /// The pin's declared default.
    Literal(Value),
    /// Optional and unwired; reads as `Null`.
    Unbound,
}

/// The compiled, runtime-resolved form of one node description.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecNode {
    /// Description id, carried for error reporting and logs.
    pub id: String,
    pub op: ExecOp,
}

/// Per-kind behaviour and resolved wiring of an executable node.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecOp {
    Entry {
        then: Option<NodeIndex>,
    },
    Return {
        /// Output parameter name and the binding feeding it.
        writes: Vec<(String, Binding)>,
    },
    Branch {
        condition: Binding,
        on_true: Option<NodeIndex>,
        on_false: Option<NodeIndex>,
    },
    Switch {
        value: Binding,
        cases: Vec<(Value, Option<NodeIndex>)>,
        default: Option<NodeIndex>,
    },
    Sequence {
        steps: Vec<NodeIndex>,
    },
    For {
        first: Binding,
        last: Binding,
        body: Option<NodeIndex>,
        completed: Option<NodeIndex>,
        broken: Option<NodeIndex>,
    },
    ForEach {
        items: Binding,
        body: Option<NodeIndex>,
        completed: Option<NodeIndex>,
        broken: Option<NodeIndex>,
    },
    While {
        condition: Binding,
        body: Option<NodeIndex>,
        completed: Option<NodeIndex>,
        broken: Option<NodeIndex>,
    },
    Break,
    Continue,
    Conversion {
        to: ValueType,
        input: Binding,
    },
    Cast {
        to: ValueType,
        input: Binding,
        valid: Option<NodeIndex>,
        invalid: Option<NodeIndex>,
    },
    /// Pass-through node, only allocated in preview mode.
    Redirect {
        input: Binding,
        next: Option<NodeIndex>,
    },
    Inline {
        op: InlineOp,
        lhs: Binding,
        /// `Unbound` for unary operators.
        rhs: Binding,
    },
    Call {
        method: String,
        owner: Binding,
        args: Vec<Binding>,
        /// Data-out pin names receiving positional out-arguments.
        outs: Vec<String>,
        then: Option<NodeIndex>,
    },
    LocalGet {
        name: String,
    },
    LocalSet {
        name: String,
        value: Binding,
        then: Option<NodeIndex>,
    },
    HostGet {
        member: String,
        owner: Binding,
    },
    HostSet {
        member: String,
        owner: Binding,
        value: Binding,
        then: Option<NodeIndex>,
    },
}
