use super::node::NodeIndex;
use crate::graph::VariableDeclaration;
use crate::value::Value;
use ahash::AHashMap;

/// State record of one active loop on the frame's iterator stack.
#[derive(Debug, Clone)]
pub struct LoopState {
    /// Arena index of the loop node that pushed this record.
    pub node: NodeIndex,
    /// Completed iterations so far.
    pub iteration: u64,
    /// Set when a break node ended the loop early.
    pub broke: bool,
    /// The value exposed on the loop's data outputs: the index of a `for`,
    /// the element of a `for-each`, `Null` for a `while`.
    pub current: Value,
}

impl LoopState {
    pub(crate) fn new(node: NodeIndex) -> Self {
        Self {
            node,
            iteration: 0,
            broke: false,
            current: Value::Null,
        }
    }
}

/// Per-call storage for one active invocation: input parameter values,
/// temporary variables, the return-value bag and the iterator stack.
///
/// A frame is created fresh by `invoke`, never shared between invocations,
/// and discarded together with its caches when the walk finishes.
#[derive(Debug)]
pub struct InvocationFrame {
    inputs: AHashMap<String, Value>,
    locals: AHashMap<String, Value>,
    returns: AHashMap<String, Value>,
    loops: Vec<LoopState>,
    /// Data outputs of flow nodes that already executed (call results, cast
    /// results), keyed by arena index and pin name.
    cache: AHashMap<(usize, String), Value>,
}

impl InvocationFrame {
    pub(crate) fn new(locals: &[VariableDeclaration]) -> Self {
        let seeded = locals
            .iter()
            .map(|var| {
                let value = var
                    .default
                    .clone()
                    .unwrap_or_else(|| var.ty.default_value());
                (var.name.clone(), value)
            })
            .collect();
        Self {
            inputs: AHashMap::new(),
            locals: seeded,
            returns: AHashMap::new(),
            loops: Vec::new(),
            cache: AHashMap::new(),
        }
    }

    pub(crate) fn seed_input(&mut self, name: &str, value: Value) {
        self.inputs.insert(name.to_string(), value);
    }

    pub fn input(&self, name: &str) -> Option<&Value> {
        self.inputs.get(name)
    }

    pub fn local(&self, name: &str) -> Option<&Value> {
        self.locals.get(name)
    }

    /// Writes a temporary; the set of locals is fixed by the declarations,
    /// so writing an undeclared name reports failure.
    pub(crate) fn set_local(&mut self, name: &str, value: Value) -> bool {
        match self.locals.get_mut(name) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    pub(crate) fn write_return(&mut self, name: &str, value: Value) {
        self.returns.insert(name.to_string(), value);
    }

    pub fn return_value(&self, name: &str) -> Option<&Value> {
        self.returns.get(name)
    }

    pub(crate) fn push_loop(&mut self, state: LoopState) {
        self.loops.push(state);
    }

    pub(crate) fn pop_loop(&mut self) {
        self.loops.pop();
    }

    pub(crate) fn loop_depth(&self) -> usize {
        self.loops.len()
    }

    pub(crate) fn innermost_loop_mut(&mut self) -> Option<&mut LoopState> {
        self.loops.last_mut()
    }

    /// The topmost active state pushed by the given loop node, read by its
    /// data-out pins while the body runs.
    pub fn loop_state(&self, node: NodeIndex) -> Option<&LoopState> {
        self.loops.iter().rev().find(|s| s.node == node)
    }

    pub(crate) fn cache_value(&mut self, node: NodeIndex, pin: &str, value: Value) {
        self.cache.insert((node.0, pin.to_string()), value);
    }

    pub(crate) fn cached(&self, node: NodeIndex, pin: &str) -> Option<&Value> {
        self.cache.get(&(node.0, pin.to_string()))
    }
}
