//! Wire resolution.
//!
//! Turns the wire list of a [`GraphDescription`] into per-node bindings:
//! every data input resolves to exactly one producing pin, a declared
//! default, or stays unbound; every exec output resolves to at most one
//! continuation target. Stale wires are dropped, the single-wire-per-input
//! and fan-out invariants are enforced, and redirect nodes are chased into
//! direct links when the compiler asks for it.

use crate::error::LinkError;
use crate::graph::description::{redirect_in_pin, redirect_out_pin};
use crate::graph::{
    AccessScope, GraphDescription, NodeDescription, NodeKind, PinDeclaration, PinDirection,
    PinKind, PinRef, Wire,
};
use ahash::AHashMap;
use std::collections::HashSet;

/// How one data input gets its value at runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum InputBinding {
    /// Wired to a producing pin on another node.
    Producer { node: String, pin: String },
    /// Unwired, falling back to the pin's declared default.
    Default(crate::value::Value),
    /// Unwired and optional, with no declared default.
    Unbound,
}

/// Fully resolved wiring for one node.
#[derive(Debug, Clone, Default)]
pub struct NodeBindings {
    /// Data inputs keyed by pin name.
    pub inputs: AHashMap<String, InputBinding>,
    /// Continuation target node per wired exec-out pin.
    pub continuations: AHashMap<String, String>,
    /// Every declared exec-out pin name, in declared order.
    pub exec_order: Vec<String>,
}

/// The fully cross-referenced in-memory graph the node compiler lowers from.
#[derive(Debug, Clone, Default)]
pub struct ResolvedGraph {
    pub bindings: AHashMap<String, NodeBindings>,
}

impl ResolvedGraph {
    pub fn bindings_for(&self, node_id: &str) -> Option<&NodeBindings> {
        self.bindings.get(node_id)
    }
}

/// Resolves every wire of the description. With `elide_redirects` set,
/// redirect nodes disappear from the result: producers and continuations
/// point through them to the real endpoints.
pub fn resolve(
    desc: &GraphDescription,
    elide_redirects: bool,
) -> Result<ResolvedGraph, LinkError> {
    let live: Vec<&Wire> = desc
        .wires
        .iter()
        .filter(|w| {
            let ok = wire_is_live(desc, w);
            if !ok {
                tracing::debug!(
                    source_node = %w.source.node,
                    source_pin = %w.source.pin,
                    target_node = %w.target.node,
                    target_pin = %w.target.pin,
                    "dropping stale wire"
                );
            }
            ok
        })
        .collect();

    let mut into: AHashMap<(String, String), Vec<&Wire>> = AHashMap::new();
    let mut from: AHashMap<(String, String), Vec<&Wire>> = AHashMap::new();
    for wire in &live {
        into.entry((wire.target.node.clone(), wire.target.pin.clone()))
            .or_default()
            .push(wire);
        from.entry((wire.source.node.clone(), wire.source.pin.clone()))
            .or_default()
            .push(wire);
    }

    for ((node_id, pin_name), wires) in &into {
        if wires.len() > 1 {
            return Err(LinkError::DuplicateWireIntoPin {
                node_id: node_id.clone(),
                pin: pin_name.clone(),
                count: wires.len(),
            });
        }
    }
    for ((node_id, pin_name), wires) in &from {
        if wires.len() > 1 {
            let multi = desc
                .pin_of(node_id, pin_name)
                .is_some_and(|p| p.multi);
            if !multi {
                return Err(LinkError::FanOutOnSinglePin {
                    node_id: node_id.clone(),
                    pin: pin_name.clone(),
                    count: wires.len(),
                });
            }
        }
    }

    let mut resolved = ResolvedGraph::default();
    for node in &desc.nodes {
        let mut bindings = NodeBindings::default();
        for pin in node.input_pins().filter(|p| p.is_data()) {
            let key = (node.id.clone(), pin.name.clone());
            let binding = match into.get(&key).and_then(|wires| wires.first()) {
                Some(wire) => {
                    match chase_producer(desc, &into, &wire.source, elide_redirects)? {
                        Some(source) => InputBinding::Producer {
                            node: source.node,
                            pin: source.pin,
                        },
                        None => unwired_binding(node, pin)?,
                    }
                }
                None => unwired_binding(node, pin)?,
            };
            bindings.inputs.insert(pin.name.clone(), binding);
        }
        for pin in node.output_pins().filter(|p| p.is_execution()) {
            bindings.exec_order.push(pin.name.clone());
            let key = (node.id.clone(), pin.name.clone());
            if let Some(wire) = from.get(&key).and_then(|wires| wires.first()) {
                if let Some(target) =
                    chase_continuation(desc, &from, &wire.target, elide_redirects)?
                {
                    bindings.continuations.insert(pin.name.clone(), target.node);
                }
            }
        }
        resolved.bindings.insert(node.id.clone(), bindings);
    }
    Ok(resolved)
}

/// A wire is live when both endpoints still name an existing pin of the
/// right direction and the pin kinds agree.
fn wire_is_live(desc: &GraphDescription, wire: &Wire) -> bool {
    let source = desc.pin_of(&wire.source.node, &wire.source.pin);
    let target = desc.pin_of(&wire.target.node, &wire.target.pin);
    match (source, target) {
        (Some(s), Some(t)) => {
            s.direction == PinDirection::Out
                && t.direction == PinDirection::In
                && s.kind == t.kind
        }
        _ => false,
    }
}

fn unwired_binding(
    node: &NodeDescription,
    pin: &PinDeclaration,
) -> Result<InputBinding, LinkError> {
    if let Some(default) = &pin.default {
        Ok(InputBinding::Default(default.clone()))
    } else if pin.required {
        Err(LinkError::RequiredPinUnwired {
            node_id: node.id.clone(),
            pin: pin.name.clone(),
            kind: node.kind.tag().to_string(),
        })
    } else {
        Ok(InputBinding::Unbound)
    }
}

/// Follows a data wire's producing side through redirect nodes. `None`
/// means the chain dead-ends in an unwired redirect.
fn chase_producer(
    desc: &GraphDescription,
    into: &AHashMap<(String, String), Vec<&Wire>>,
    source: &PinRef,
    elide: bool,
) -> Result<Option<PinRef>, LinkError> {
    let mut current = source.clone();
    let mut visited: HashSet<String> = HashSet::new();
    loop {
        let node = match desc.find_node(&current.node) {
            Some(n) => n,
            None => return Ok(None),
        };
        if !elide || node.kind != NodeKind::Redirect {
            return Ok(Some(current));
        }
        if !visited.insert(node.id.clone()) {
            return Err(LinkError::RedirectCycle {
                node_id: node.id.clone(),
            });
        }
        let in_pin = match redirect_in_pin(node, PinKind::Data) {
            Some(p) => p,
            None => return Ok(None),
        };
        let key = (node.id.clone(), in_pin.name.clone());
        match into.get(&key).and_then(|wires| wires.first()) {
            Some(wire) => current = wire.source.clone(),
            None => return Ok(None),
        }
    }
}

/// Follows an exec wire's consuming side through redirect nodes.
fn chase_continuation(
    desc: &GraphDescription,
    from: &AHashMap<(String, String), Vec<&Wire>>,
    target: &PinRef,
    elide: bool,
) -> Result<Option<PinRef>, LinkError> {
    let mut current = target.clone();
    let mut visited: HashSet<String> = HashSet::new();
    loop {
        let node = match desc.find_node(&current.node) {
            Some(n) => n,
            None => return Ok(None),
        };
        if !elide || node.kind != NodeKind::Redirect {
            return Ok(Some(current));
        }
        if !visited.insert(node.id.clone()) {
            return Err(LinkError::RedirectCycle {
                node_id: node.id.clone(),
            });
        }
        let out_pin = match redirect_out_pin(node, PinKind::Execution) {
            Some(p) => p,
            None => return Ok(None),
        };
        let key = (node.id.clone(), out_pin.name.clone());
        match from.get(&key).and_then(|wires| wires.first()) {
            Some(wire) => current = wire.target.clone(),
            None => return Ok(None),
        }
    }
}

/// Renames the entry node's data outputs for a renamed input parameter.
/// Returns the number of pins and wire endpoints rewritten.
pub(crate) fn rename_entry_outputs(desc: &mut GraphDescription, old: &str, new: &str) -> usize {
    rename_node_pins(desc, old, new, |node| node.kind == NodeKind::Entry, Some(PinDirection::Out))
}

/// Renames return-node data inputs for a renamed output parameter.
pub(crate) fn rename_return_inputs(desc: &mut GraphDescription, old: &str, new: &str) -> usize {
    rename_node_pins(desc, old, new, |node| node.kind == NodeKind::Return, Some(PinDirection::In))
}

/// Renames the pins of every getter/setter sharing a renamed temporary's
/// field name, in both directions, and updates their member configuration.
pub(crate) fn rename_variable_pins(desc: &mut GraphDescription, old: &str, new: &str) -> usize {
    let mut count = 0;
    let mut affected: HashSet<String> = HashSet::new();
    for node in &mut desc.nodes {
        if let NodeKind::MemberAccess {
            member,
            scope: AccessScope::Frame,
            ..
        } = &mut node.kind
        {
            if member == old {
                *member = new.to_string();
                affected.insert(node.id.clone());
                count += 1;
            }
        }
    }
    count + rename_node_pins(desc, old, new, |node| affected.contains(&node.id), None)
}

/// Renames matching data pins on selected nodes, then rewrites every wire
/// endpoint that referenced the old pin name on those nodes. Wires are
/// rewritten, never dropped.
fn rename_node_pins<F>(
    desc: &mut GraphDescription,
    old: &str,
    new: &str,
    select: F,
    direction: Option<PinDirection>,
) -> usize
where
    F: Fn(&NodeDescription) -> bool,
{
    let mut count = 0;
    let mut renamed: HashSet<(String, PinDirection)> = HashSet::new();
    for node in &mut desc.nodes {
        if !select(node) {
            continue;
        }
        let node_id = node.id.clone();
        for pin in &mut node.pins {
            let dir_ok = direction.is_none_or(|d| pin.direction == d);
            if pin.is_data() && pin.name == old && dir_ok {
                pin.name = new.to_string();
                renamed.insert((node_id.clone(), pin.direction));
                count += 1;
            }
        }
    }
    for wire in &mut desc.wires {
        if wire.source.pin == old
            && renamed.contains(&(wire.source.node.clone(), PinDirection::Out))
        {
            wire.source.pin = new.to_string();
            count += 1;
        }
        if wire.target.pin == old
            && renamed.contains(&(wire.target.node.clone(), PinDirection::In))
        {
            wire.target.pin = new.to_string();
            count += 1;
        }
    }
    count
}
