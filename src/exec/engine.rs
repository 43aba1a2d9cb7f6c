//! The continuation-driven graph walker.
//!
//! Flow nodes advance by handing the engine the next node reachable from
//! their exec-out pins; there is no program counter. Chains are walked
//! iteratively through a cursor, recursion happens only at nesting
//! boundaries (sequence arms, loop bodies), and a step budget shared between
//! flow steps and pure evaluations bounds runaway graphs.

use super::CompiledGraph;
use super::frame::{InvocationFrame, LoopState};
use super::host::Host;
use super::node::{Binding, ExecNode, ExecOp, NodeIndex};
use crate::error::ExecError;
use crate::graph::InlineOp;
use crate::value::Value;

/// How a chain of flow nodes ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum FlowOutcome {
    /// The chain ran off its last continuation.
    Completed,
    /// A return node fired; unwind the whole walk.
    Returned,
    /// A break node fired; unwind to the innermost loop.
    LoopBreak,
    /// A continue node fired; unwind to the current iteration.
    LoopContinue,
}

pub(super) struct Engine<'a> {
    graph: &'a CompiledGraph,
    host: &'a mut dyn Host,
    budget: u64,
    steps: u64,
}

impl<'a> Engine<'a> {
    pub(super) fn new(graph: &'a CompiledGraph, host: &'a mut dyn Host) -> Self {
        Self {
            graph,
            host,
            budget: graph.config.step_budget,
            steps: 0,
        }
    }

    pub(super) fn run(&mut self, frame: &mut InvocationFrame) -> Result<(), ExecError> {
        self.run_chain(Some(self.graph.entry), frame)?;
        Ok(())
    }

    fn charge(&mut self, node: &ExecNode) -> Result<(), ExecError> {
        self.steps += 1;
        if self.steps > self.budget {
            return Err(ExecError::StepBudgetExhausted {
                node_id: node.id.clone(),
                budget: self.budget,
            });
        }
        Ok(())
    }

    /// Walks one chain of flow nodes until it ends or an unwind signal fires.
    fn run_chain(
        &mut self,
        start: Option<NodeIndex>,
        frame: &mut InvocationFrame,
    ) -> Result<FlowOutcome, ExecError> {
        let mut cursor = start;
        while let Some(idx) = cursor {
            let node = self.graph.node(idx);
            self.charge(node)?;
            tracing::trace!(node = %node.id, "step");
            cursor = match &node.op {
                ExecOp::Entry { then } => *then,
                ExecOp::Redirect { next, .. } => *next,

                ExecOp::Return { writes } => {
                    for (name, binding) in writes {
                        if matches!(binding, Binding::Unbound) {
                            continue;
                        }
                        let value = self.eval_binding(binding, frame)?;
                        frame.write_return(name, value);
                    }
                    return Ok(FlowOutcome::Returned);
                }

                ExecOp::Branch {
                    condition,
                    on_true,
                    on_false,
                } => {
                    if self.eval_bool(node, condition, "branch condition", frame)? {
                        *on_true
                    } else {
                        *on_false
                    }
                }

                ExecOp::Switch {
                    value,
                    cases,
                    default,
                } => {
                    let discriminant = self.eval_binding(value, frame)?;
                    cases
                        .iter()
                        .find(|(case, _)| case.loose_eq(&discriminant))
                        .map_or(*default, |(_, target)| *target)
                }

                ExecOp::Sequence { steps } => {
                    for step in steps {
                        match self.run_chain(Some(*step), frame)? {
                            FlowOutcome::Completed => {}
                            other => return Ok(other),
                        }
                    }
                    None
                }

                ExecOp::For {
                    first,
                    last,
                    body,
                    completed,
                    broken,
                } => {
                    let first_v = self.eval_int(node, first, "for first", frame)?;
                    let last_v = self.eval_int(node, last, "for last", frame)?;
                    frame.push_loop(LoopState::new(idx));
                    let mut exit = *completed;
                    let mut i = first_v;
                    while i < last_v {
                        self.charge(node)?;
                        if let Some(state) = frame.innermost_loop_mut() {
                            state.iteration = (i - first_v) as u64;
                            state.current = Value::Int(i);
                        }
                        match self.run_chain(*body, frame)? {
                            FlowOutcome::Completed | FlowOutcome::LoopContinue => {}
                            FlowOutcome::LoopBreak => {
                                exit = *broken;
                                break;
                            }
                            FlowOutcome::Returned => {
                                frame.pop_loop();
                                return Ok(FlowOutcome::Returned);
                            }
                        }
                        i += 1;
                    }
                    frame.pop_loop();
                    exit
                }

                ExecOp::ForEach {
                    items,
                    body,
                    completed,
                    broken,
                } => {
                    let items_v = self.eval_binding(items, frame)?;
                    let list = match items_v {
                        Value::List(elements) => elements,
                        other => {
                            return Err(type_mismatch(&node.id, "for-each items", "List", other));
                        }
                    };
                    frame.push_loop(LoopState::new(idx));
                    let mut exit = *completed;
                    for (i, element) in list.into_iter().enumerate() {
                        self.charge(node)?;
                        if let Some(state) = frame.innermost_loop_mut() {
                            state.iteration = i as u64;
                            state.current = element;
                        }
                        match self.run_chain(*body, frame)? {
                            FlowOutcome::Completed | FlowOutcome::LoopContinue => {}
                            FlowOutcome::LoopBreak => {
                                exit = *broken;
                                break;
                            }
                            FlowOutcome::Returned => {
                                frame.pop_loop();
                                return Ok(FlowOutcome::Returned);
                            }
                        }
                    }
                    frame.pop_loop();
                    exit
                }

                ExecOp::While {
                    condition,
                    body,
                    completed,
                    broken,
                } => {
                    frame.push_loop(LoopState::new(idx));
                    let mut exit = *completed;
                    loop {
                        self.charge(node)?;
                        if !self.eval_bool(node, condition, "while condition", frame)? {
                            break;
                        }
                        match self.run_chain(*body, frame)? {
                            FlowOutcome::Completed | FlowOutcome::LoopContinue => {}
                            FlowOutcome::LoopBreak => {
                                exit = *broken;
                                break;
                            }
                            FlowOutcome::Returned => {
                                frame.pop_loop();
                                return Ok(FlowOutcome::Returned);
                            }
                        }
                        if let Some(state) = frame.innermost_loop_mut() {
                            state.iteration += 1;
                        }
                    }
                    frame.pop_loop();
                    exit
                }

                ExecOp::Break => match frame.innermost_loop_mut() {
                    Some(state) => {
                        state.broke = true;
                        return Ok(FlowOutcome::LoopBreak);
                    }
                    None => {
                        return Err(ExecError::BreakOutsideLoop {
                            node_id: node.id.clone(),
                        });
                    }
                },

                ExecOp::Continue => {
                    if frame.loop_depth() == 0 {
                        return Err(ExecError::ContinueOutsideLoop {
                            node_id: node.id.clone(),
                        });
                    }
                    return Ok(FlowOutcome::LoopContinue);
                }

                ExecOp::Cast {
                    to,
                    input,
                    valid,
                    invalid,
                } => {
                    let value = self.eval_binding(input, frame)?;
                    match value.convert(*to) {
                        Some(converted) => {
                            frame.cache_value(idx, "result", converted);
                            *valid
                        }
                        None => *invalid,
                    }
                }

                ExecOp::Call {
                    method,
                    owner,
                    args,
                    outs,
                    then,
                } => {
                    let owner_v = self.eval_binding(owner, frame)?;
                    let mut arg_values = Vec::with_capacity(args.len());
                    for arg in args {
                        arg_values.push(self.eval_binding(arg, frame)?);
                    }
                    let result = self
                        .host
                        .call_method(&owner_v, method, &arg_values)
                        .map_err(|reason| ExecError::Host {
                            node_id: node.id.clone(),
                            member: method.clone(),
                            reason,
                        })?;
                    frame.cache_value(idx, "return", result.value);
                    for (pin, value) in outs.iter().zip(result.out_args) {
                        frame.cache_value(idx, pin, value);
                    }
                    *then
                }

                ExecOp::LocalSet { name, value, then } => {
                    let v = self.eval_binding(value, frame)?;
                    if !frame.set_local(name, v) {
                        return Err(ExecError::UnknownLocal {
                            node_id: node.id.clone(),
                            name: name.clone(),
                        });
                    }
                    *then
                }

                ExecOp::HostSet {
                    member,
                    owner,
                    value,
                    then,
                } => {
                    let owner_v = self.eval_binding(owner, frame)?;
                    let v = self.eval_binding(value, frame)?;
                    self.host
                        .set_member(&owner_v, member, v)
                        .map_err(|reason| ExecError::Host {
                            node_id: node.id.clone(),
                            member: member.clone(),
                            reason,
                        })?;
                    *then
                }

                ExecOp::Inline { .. }
                | ExecOp::Conversion { .. }
                | ExecOp::LocalGet { .. }
                | ExecOp::HostGet { .. } => {
                    return Err(ExecError::NotExecutable {
                        node_id: node.id.clone(),
                    });
                }
            };
        }
        Ok(FlowOutcome::Completed)
    }

    fn eval_binding(
        &mut self,
        binding: &Binding,
        frame: &InvocationFrame,
    ) -> Result<Value, ExecError> {
        match binding {
            Binding::Literal(value) => Ok(value.clone()),
            Binding::Unbound => Ok(Value::Null),
            Binding::Producer { node, pin } => self.eval_pin(*node, pin, frame),
        }
    }

    /// Demand-driven evaluation of one producing pin. Pure nodes recurse
    /// into their own inputs; flow nodes answer from the frame's cache.
    fn eval_pin(
        &mut self,
        idx: NodeIndex,
        pin: &str,
        frame: &InvocationFrame,
    ) -> Result<Value, ExecError> {
        let node = self.graph.node(idx);
        self.charge(node)?;
        match &node.op {
            ExecOp::Entry { .. } => {
                frame
                    .input(pin)
                    .cloned()
                    .ok_or_else(|| ExecError::UnknownParameter {
                        node_id: node.id.clone(),
                        name: pin.to_string(),
                    })
            }

            ExecOp::Inline { op, lhs, rhs } => self.eval_inline(node, *op, lhs, rhs, frame),

            ExecOp::Conversion { to, input } => {
                let value = self.eval_binding(input, frame)?;
                value
                    .convert(*to)
                    .ok_or_else(|| ExecError::ConversionFailed {
                        node_id: node.id.clone(),
                        to: *to,
                        found: value.clone(),
                    })
            }

            ExecOp::LocalGet { name } => {
                frame
                    .local(name)
                    .cloned()
                    .ok_or_else(|| ExecError::UnknownLocal {
                        node_id: node.id.clone(),
                        name: name.clone(),
                    })
            }

            ExecOp::HostGet { member, owner } => {
                let owner_v = self.eval_binding(owner, frame)?;
                self.host
                    .get_member(&owner_v, member)
                    .map_err(|reason| ExecError::Host {
                        node_id: node.id.clone(),
                        member: member.clone(),
                        reason,
                    })
            }

            ExecOp::For { .. } => {
                let state = frame
                    .loop_state(idx)
                    .ok_or_else(|| unavailable(&node.id, pin))?;
                match pin {
                    "index" => Ok(state.current.clone()),
                    _ => Err(unavailable(&node.id, pin)),
                }
            }

            ExecOp::ForEach { .. } => {
                let state = frame
                    .loop_state(idx)
                    .ok_or_else(|| unavailable(&node.id, pin))?;
                match pin {
                    "element" => Ok(state.current.clone()),
                    "index" => Ok(Value::Int(state.iteration as i64)),
                    _ => Err(unavailable(&node.id, pin)),
                }
            }

            ExecOp::Call { .. } | ExecOp::Cast { .. } => frame
                .cached(idx, pin)
                .cloned()
                .ok_or_else(|| unavailable(&node.id, pin)),

            ExecOp::Redirect { input, .. } => self.eval_binding(input, frame),

            ExecOp::Return { .. }
            | ExecOp::Branch { .. }
            | ExecOp::Switch { .. }
            | ExecOp::Sequence { .. }
            | ExecOp::While { .. }
            | ExecOp::Break
            | ExecOp::Continue
            | ExecOp::LocalSet { .. }
            | ExecOp::HostSet { .. } => Err(unavailable(&node.id, pin)),
        }
    }

    fn eval_inline(
        &mut self,
        node: &ExecNode,
        op: InlineOp,
        lhs: &Binding,
        rhs: &Binding,
        frame: &InvocationFrame,
    ) -> Result<Value, ExecError> {
        if op.is_unary() {
            let value = self.eval_binding(lhs, frame)?;
            return match op {
                InlineOp::Negate => match value {
                    Value::Int(i) => Ok(Value::Int(-i)),
                    Value::Float(f) => Ok(Value::Float(-f)),
                    other => Err(type_mismatch(&node.id, op.symbol(), "Number", other)),
                },
                InlineOp::Abs => match value {
                    Value::Int(i) => Ok(Value::Int(i.abs())),
                    Value::Float(f) => Ok(Value::Float(f.abs())),
                    other => Err(type_mismatch(&node.id, op.symbol(), "Number", other)),
                },
                InlineOp::Not => match value.as_bool() {
                    Some(b) => Ok(Value::Bool(!b)),
                    None => Err(type_mismatch(&node.id, op.symbol(), "Bool", value)),
                },
                _ => Err(unavailable(&node.id, "result")),
            };
        }

        // Logical operators short-circuit, so the right side is only
        // evaluated when it can still decide the outcome.
        match op {
            InlineOp::And => {
                let left = self.eval_bool_value(node, op, lhs, frame)?;
                if !left {
                    return Ok(Value::Bool(false));
                }
                let right = self.eval_bool_value(node, op, rhs, frame)?;
                return Ok(Value::Bool(right));
            }
            InlineOp::Or => {
                let left = self.eval_bool_value(node, op, lhs, frame)?;
                if left {
                    return Ok(Value::Bool(true));
                }
                let right = self.eval_bool_value(node, op, rhs, frame)?;
                return Ok(Value::Bool(right));
            }
            InlineOp::Xor => {
                let left = self.eval_bool_value(node, op, lhs, frame)?;
                let right = self.eval_bool_value(node, op, rhs, frame)?;
                return Ok(Value::Bool(left ^ right));
            }
            _ => {}
        }

        let a = self.eval_binding(lhs, frame)?;
        let b = self.eval_binding(rhs, frame)?;
        match op {
            InlineOp::Equal => Ok(Value::Bool(a.loose_eq(&b))),
            InlineOp::NotEqual => Ok(Value::Bool(!a.loose_eq(&b))),

            InlineOp::Add
            | InlineOp::Subtract
            | InlineOp::Multiply
            | InlineOp::Divide => self.eval_arithmetic(node, op, a, b),

            InlineOp::Greater
            | InlineOp::GreaterOrEqual
            | InlineOp::Less
            | InlineOp::LessOrEqual => {
                let (x, y) = match (a.as_number(), b.as_number()) {
                    (Some(x), Some(y)) => (x, y),
                    (None, _) => return Err(type_mismatch(&node.id, op.symbol(), "Number", a)),
                    (_, None) => return Err(type_mismatch(&node.id, op.symbol(), "Number", b)),
                };
                let outcome = match op {
                    InlineOp::Greater => x > y,
                    InlineOp::GreaterOrEqual => x >= y,
                    InlineOp::Less => x < y,
                    _ => x <= y,
                };
                Ok(Value::Bool(outcome))
            }

            InlineOp::Negate
            | InlineOp::Abs
            | InlineOp::Not
            | InlineOp::And
            | InlineOp::Or
            | InlineOp::Xor => Err(unavailable(&node.id, "result")),
        }
    }

    /// Integer pairs stay integral; any float operand widens the result.
    fn eval_arithmetic(
        &mut self,
        node: &ExecNode,
        op: InlineOp,
        a: Value,
        b: Value,
    ) -> Result<Value, ExecError> {
        if let (Value::Int(x), Value::Int(y)) = (&a, &b) {
            let (x, y) = (*x, *y);
            return match op {
                InlineOp::Add => Ok(Value::Int(x.wrapping_add(y))),
                InlineOp::Subtract => Ok(Value::Int(x.wrapping_sub(y))),
                InlineOp::Multiply => Ok(Value::Int(x.wrapping_mul(y))),
                InlineOp::Divide => {
                    if y == 0 {
                        Err(ExecError::DivisionByZero {
                            node_id: node.id.clone(),
                        })
                    } else {
                        Ok(Value::Int(x / y))
                    }
                }
                _ => Err(unavailable(&node.id, "result")),
            };
        }
        let (x, y) = match (a.as_number(), b.as_number()) {
            (Some(x), Some(y)) => (x, y),
            (None, _) => return Err(type_mismatch(&node.id, op.symbol(), "Number", a)),
            (_, None) => return Err(type_mismatch(&node.id, op.symbol(), "Number", b)),
        };
        let outcome = match op {
            InlineOp::Add => x + y,
            InlineOp::Subtract => x - y,
            InlineOp::Multiply => x * y,
            InlineOp::Divide => x / y,
            _ => return Err(unavailable(&node.id, "result")),
        };
        Ok(Value::Float(outcome))
    }

    fn eval_bool(
        &mut self,
        node: &ExecNode,
        binding: &Binding,
        what: &str,
        frame: &InvocationFrame,
    ) -> Result<bool, ExecError> {
        let value = self.eval_binding(binding, frame)?;
        match value.as_bool() {
            Some(b) => Ok(b),
            None => Err(type_mismatch(&node.id, what, "Bool", value)),
        }
    }

    fn eval_bool_value(
        &mut self,
        node: &ExecNode,
        op: InlineOp,
        binding: &Binding,
        frame: &InvocationFrame,
    ) -> Result<bool, ExecError> {
        let value = self.eval_binding(binding, frame)?;
        match value.as_bool() {
            Some(b) => Ok(b),
            None => Err(type_mismatch(&node.id, op.symbol(), "Bool", value)),
        }
    }

    fn eval_int(
        &mut self,
        node: &ExecNode,
        binding: &Binding,
        what: &str,
        frame: &InvocationFrame,
    ) -> Result<i64, ExecError> {
        let value = self.eval_binding(binding, frame)?;
        match value.as_int() {
            Some(i) => Ok(i),
            None => Err(type_mismatch(&node.id, what, "Int", value)),
        }
    }
}

fn type_mismatch(node_id: &str, operation: &str, expected: &str, found: Value) -> ExecError {
    ExecError::TypeMismatch {
        node_id: node_id.to_string(),
        operation: operation.to_string(),
        expected: expected.to_string(),
        found,
    }
}

fn unavailable(node_id: &str, pin: &str) -> ExecError {
    ExecError::ValueUnavailable {
        node_id: node_id.to_string(),
        pin: pin.to_string(),
    }
}
