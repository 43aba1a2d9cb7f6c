//! Per-kind lowering of node descriptions into executable nodes.
//!
//! One exhaustive match over [`NodeKind`] builds the arena; resolving
//! neighbour references to arena indices happens against the index map
//! assigned up front, so every executable node is fully initialized before
//! the first invocation.

use super::CompileMode;
use crate::error::{CompileError, GraphError};
use crate::exec::{Binding, CompiledGraph, EngineConfig, ExecNode, ExecOp, NodeIndex};
use crate::graph::{AccessMode, AccessScope, GraphDescription, NodeDescription, NodeKind};
use crate::linker::{InputBinding, NodeBindings, ResolvedGraph};
use ahash::AHashMap;

pub(super) fn lower(
    desc: &GraphDescription,
    resolved: &ResolvedGraph,
    mode: CompileMode,
    config: EngineConfig,
) -> Result<CompiledGraph, CompileError> {
    // Arena order follows description order, so identical descriptions
    // compile to identical arenas.
    let mut index_of: AHashMap<&str, NodeIndex> = AHashMap::new();
    let mut kept: Vec<&NodeDescription> = Vec::new();
    for node in &desc.nodes {
        if mode == CompileMode::Runtime && node.kind == NodeKind::Redirect {
            continue;
        }
        index_of.insert(node.id.as_str(), NodeIndex(kept.len()));
        kept.push(node);
    }

    let empty = NodeBindings::default();
    let mut nodes = Vec::with_capacity(kept.len());
    let mut entry = None;
    for node in kept {
        let bindings = resolved.bindings_for(&node.id).unwrap_or(&empty);
        let ctx = LowerCtx {
            node,
            bindings,
            index_of: &index_of,
        };
        let op = lower_node(&ctx)?;
        if matches!(op, ExecOp::Entry { .. }) {
            entry = Some(NodeIndex(nodes.len()));
        }
        nodes.push(ExecNode {
            id: node.id.clone(),
            op,
        });
    }

    let entry = entry.ok_or_else(|| {
        CompileError::Graph(GraphError::MissingEntryNode {
            graph: desc.name.clone(),
        })
    })?;

    Ok(CompiledGraph {
        name: desc.name.clone(),
        version: desc.version,
        nodes,
        entry,
        inputs: desc.inputs.clone(),
        outputs: desc.outputs.clone(),
        locals: desc.locals.clone(),
        config,
    })
}

struct LowerCtx<'a> {
    node: &'a NodeDescription,
    bindings: &'a NodeBindings,
    index_of: &'a AHashMap<&'a str, NodeIndex>,
}

impl LowerCtx<'_> {
    /// Binding of a data input the kind contract expects to be declared.
    fn binding(&self, pin: &str) -> Result<Binding, CompileError> {
        if self
            .node
            .pin(pin)
            .filter(|p| p.is_input() && p.is_data())
            .is_none()
        {
            return Err(self.missing_pin(pin));
        }
        Ok(self.convert(self.bindings.inputs.get(pin)))
    }

    /// Binding of a data input the kind contract treats as optional.
    fn optional_binding(&self, pin: &str) -> Binding {
        self.convert(self.bindings.inputs.get(pin))
    }

    fn convert(&self, binding: Option<&InputBinding>) -> Binding {
        match binding {
            Some(InputBinding::Producer { node, pin }) => {
                match self.index_of.get(node.as_str()) {
                    Some(idx) => Binding::Producer {
                        node: *idx,
                        pin: pin.clone(),
                    },
                    None => Binding::Unbound,
                }
            }
            Some(InputBinding::Default(value)) => Binding::Literal(value.clone()),
            Some(InputBinding::Unbound) | None => Binding::Unbound,
        }
    }

    /// Continuation of an exec output the kind contract expects declared.
    fn continuation(&self, pin: &str) -> Result<Option<NodeIndex>, CompileError> {
        if self
            .node
            .pin(pin)
            .filter(|p| p.is_output() && p.is_execution())
            .is_none()
        {
            return Err(self.missing_pin(pin));
        }
        Ok(self.lenient_continuation(pin))
    }

    fn lenient_continuation(&self, pin: &str) -> Option<NodeIndex> {
        self.bindings
            .continuations
            .get(pin)
            .and_then(|id| self.index_of.get(id.as_str()))
            .copied()
    }

    /// First wired exec-out continuation, in declared pin order. Used by
    /// kinds with a single forward edge (entry, call, setters).
    fn flow_next(&self) -> Option<NodeIndex> {
        self.bindings
            .exec_order
            .iter()
            .find_map(|pin| self.bindings.continuations.get(pin))
            .and_then(|id| self.index_of.get(id.as_str()))
            .copied()
    }

    fn missing_pin(&self, pin: &str) -> CompileError {
        CompileError::MissingPin {
            node_id: self.node.id.clone(),
            kind: self.node.kind.tag().to_string(),
            pin: pin.to_string(),
        }
    }
}

fn lower_node(ctx: &LowerCtx<'_>) -> Result<ExecOp, CompileError> {
    let op = match &ctx.node.kind {
        NodeKind::Entry => ExecOp::Entry {
            then: ctx.flow_next(),
        },

        NodeKind::Return => {
            let writes = ctx
                .node
                .input_pins()
                .filter(|p| p.is_data())
                .map(|p| (p.name.clone(), ctx.optional_binding(&p.name)))
                .collect();
            ExecOp::Return { writes }
        }

        NodeKind::Branch => ExecOp::Branch {
            condition: ctx.binding("condition")?,
            on_true: ctx.continuation("true")?,
            on_false: ctx.continuation("false")?,
        },

        NodeKind::Switch { cases } => {
            let lowered = cases
                .iter()
                .map(|case| Ok((case.value.clone(), ctx.continuation(&case.pin)?)))
                .collect::<Result<Vec<_>, CompileError>>()?;
            ExecOp::Switch {
                value: ctx.binding("value")?,
                cases: lowered,
                default: ctx.lenient_continuation("default"),
            }
        }

        NodeKind::Sequence => {
            let steps = ctx
                .bindings
                .exec_order
                .iter()
                .filter_map(|pin| ctx.lenient_continuation(pin))
                .collect();
            ExecOp::Sequence { steps }
        }

        NodeKind::For => ExecOp::For {
            first: ctx.binding("first")?,
            last: ctx.binding("last")?,
            body: ctx.continuation("body")?,
            completed: ctx.lenient_continuation("completed"),
            broken: ctx.lenient_continuation("broken"),
        },

        NodeKind::ForEach => ExecOp::ForEach {
            items: ctx.binding("items")?,
            body: ctx.continuation("body")?,
            completed: ctx.lenient_continuation("completed"),
            broken: ctx.lenient_continuation("broken"),
        },

        NodeKind::While => ExecOp::While {
            condition: ctx.binding("condition")?,
            body: ctx.continuation("body")?,
            completed: ctx.lenient_continuation("completed"),
            broken: ctx.lenient_continuation("broken"),
        },

        NodeKind::Break => ExecOp::Break,
        NodeKind::Continue => ExecOp::Continue,

        NodeKind::Conversion { to } => ExecOp::Conversion {
            to: *to,
            input: ctx.binding("value")?,
        },

        NodeKind::Cast { to } => ExecOp::Cast {
            to: *to,
            input: ctx.binding("value")?,
            valid: ctx.continuation("valid")?,
            invalid: ctx.continuation("invalid")?,
        },

        NodeKind::Redirect => {
            // Only reachable in preview mode; runtime compiles elide these
            // nodes entirely.
            let input = ctx
                .node
                .input_pins()
                .find(|p| p.is_data())
                .map(|p| ctx.optional_binding(&p.name))
                .unwrap_or(Binding::Unbound);
            ExecOp::Redirect {
                input,
                next: ctx.flow_next(),
            }
        }

        NodeKind::Inline { op } => {
            if op.is_unary() {
                ExecOp::Inline {
                    op: *op,
                    lhs: ctx.binding("value")?,
                    rhs: Binding::Unbound,
                }
            } else {
                ExecOp::Inline {
                    op: *op,
                    lhs: ctx.binding("lhs")?,
                    rhs: ctx.binding("rhs")?,
                }
            }
        }

        NodeKind::Call { method } => {
            let args = ctx
                .node
                .input_pins()
                .filter(|p| p.is_data() && p.name != "target")
                .map(|p| ctx.optional_binding(&p.name))
                .collect();
            let outs = ctx
                .node
                .output_pins()
                .filter(|p| p.is_data() && p.name != "return")
                .map(|p| p.name.clone())
                .collect();
            ExecOp::Call {
                method: method.clone(),
                owner: ctx.optional_binding("target"),
                args,
                outs,
                then: ctx.flow_next(),
            }
        }

        NodeKind::MemberAccess {
            member,
            scope,
            mode,
        } => match (scope, mode) {
            (AccessScope::Frame, AccessMode::Get) => ExecOp::LocalGet {
                name: member.clone(),
            },
            (AccessScope::Frame, AccessMode::Set) => ExecOp::LocalSet {
                name: member.clone(),
                value: ctx.binding(member)?,
                then: ctx.flow_next(),
            },
            (AccessScope::Host, AccessMode::Get) => ExecOp::HostGet {
                member: member.clone(),
                owner: ctx.optional_binding("target"),
            },
            (AccessScope::Host, AccessMode::Set) => ExecOp::HostSet {
                member: member.clone(),
                owner: ctx.optional_binding("target"),
                value: ctx.binding(member)?,
                then: ctx.flow_next(),
            },
        },
    };
    Ok(op)
}
