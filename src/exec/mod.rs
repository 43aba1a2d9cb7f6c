//! The execution engine: compiled graphs, invocation frames and the host
//! capability interface.

pub mod engine;
pub mod frame;
pub mod host;
pub mod node;

pub use frame::{InvocationFrame, LoopState};
pub use host::{Host, MethodReturn, NoHost};
pub use node::{Binding, ExecNode, ExecOp, NodeIndex};

use crate::error::{ExecError, InvocationError};
use crate::graph::{GraphDescription, ParameterDeclaration, VariableDeclaration};
use crate::value::{Value, ValueType};
use engine::Engine;

/// Tunables of the graph walker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Upper bound on flow steps plus pure evaluations per invocation.
    /// Runaway graphs fail with [`ExecError::StepBudgetExhausted`] instead
    /// of spinning forever.
    pub step_budget: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            step_budget: 1_000_000,
        }
    }
}

/// The result of one completed invocation: every declared output parameter
/// in declaration order, defaulted per type when no return node wrote it.
#[derive(Debug, Clone, PartialEq)]
pub struct InvocationResult {
    pub outputs: Vec<(String, Value)>,
}

impl InvocationResult {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.outputs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }
}

/// One compiled function graph: the arena of executable nodes plus the
/// declarations needed to seed and drain an invocation frame.
///
/// A compiled graph is immutable and holds no per-invocation state, so it is
/// safely shared across threads; each concurrent invocation gets its own
/// frame. Recompile when [`CompiledGraph::is_stale`] reports the source
/// description has moved on.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledGraph {
    pub(crate) name: String,
    pub(crate) version: u64,
    pub(crate) nodes: Vec<ExecNode>,
    pub(crate) entry: NodeIndex,
    pub(crate) inputs: Vec<ParameterDeclaration>,
    pub(crate) outputs: Vec<ParameterDeclaration>,
    pub(crate) locals: Vec<VariableDeclaration>,
    pub(crate) config: EngineConfig,
}

impl CompiledGraph {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Version of the description this graph was compiled from.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the source description has been edited since compilation.
    pub fn is_stale(&self, description: &GraphDescription) -> bool {
        self.version != description.version
    }

    pub(crate) fn node(&self, idx: NodeIndex) -> &ExecNode {
        &self.nodes[idx.0]
    }

    /// Runs the graph against the given arguments. The argument list must
    /// match the declared input parameters in count and type; a mismatch is
    /// a contract violation reported before any node executes. The entire
    /// walk completes before this returns.
    pub fn invoke(
        &self,
        host: &mut dyn Host,
        args: Vec<Value>,
    ) -> Result<InvocationResult, ExecError> {
        if args.len() != self.inputs.len() {
            return Err(InvocationError::ArgumentCountMismatch {
                expected: self.inputs.len(),
                got: args.len(),
            }
            .into());
        }

        let mut frame = InvocationFrame::new(&self.locals);
        for (index, (param, value)) in self.inputs.iter().zip(args).enumerate() {
            if !param.ty.admits(&value) {
                return Err(InvocationError::ArgumentTypeMismatch {
                    index,
                    name: param.name.clone(),
                    expected: param.ty,
                    found: value,
                }
                .into());
            }
            let seeded = widen(value, param.ty);
            frame.seed_input(&param.name, seeded);
        }

        tracing::debug!(graph = %self.name, "invoking");
        let mut engine = Engine::new(self, host);
        engine.run(&mut frame)?;

        let outputs = self
            .outputs
            .iter()
            .map(|param| {
                let value = frame
                    .return_value(&param.name)
                    .cloned()
                    .unwrap_or_else(|| param.ty.default_value());
                (param.name.clone(), value)
            })
            .collect();
        Ok(InvocationResult { outputs })
    }

    /// [`invoke`](Self::invoke), with a completion callback fired after the
    /// walk finishes and before control returns to the caller.
    pub fn invoke_with_callback<F>(
        &self,
        host: &mut dyn Host,
        args: Vec<Value>,
        on_complete: F,
    ) -> Result<InvocationResult, ExecError>
    where
        F: FnOnce(&CompiledGraph, &InvocationResult),
    {
        let result = self.invoke(host, args)?;
        on_complete(self, &result);
        Ok(result)
    }
}

/// Arguments declared `Float` accept `Int` values; store the widened form so
/// downstream nodes see a consistent type.
fn widen(value: Value, ty: ValueType) -> Value {
    match (ty, &value) {
        (ValueType::Float, Value::Int(i)) => Value::Float(*i as f64),
        _ => value,
    }
}
