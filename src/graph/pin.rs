use crate::value::{Value, ValueType};
use serde::{Deserialize, Serialize};

/// Which side of a node a pin sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PinDirection {
    In,
    Out,
}

/// Execution pins carry control flow and "fire"; data pins carry typed values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PinKind {
    Execution,
    Data,
}

/// A named connection point declared on a node.
///
/// Pin order within a node is the declared vector order; the linker and the
/// compiler enumerate pins in that stable order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PinDeclaration {
    pub name: String,
    pub direction: PinDirection,
    pub kind: PinKind,
    /// Closed set of accepted value types; empty accepts any type.
    pub value_types: Vec<ValueType>,
    /// A required input pin without a wire is a link error.
    pub required: bool,
    /// A producing pin may feed more than one wire only when set.
    pub multi: bool,
    /// Fallback for an optional, unwired data input.
    pub default: Option<Value>,
}

impl PinDeclaration {
    fn new(name: &str, direction: PinDirection, kind: PinKind) -> Self {
        Self {
            name: name.to_string(),
            direction,
            kind,
            value_types: Vec::new(),
            required: false,
            multi: false,
            default: None,
        }
    }

    pub fn exec_in(name: &str) -> Self {
        Self::new(name, PinDirection::In, PinKind::Execution)
    }

    pub fn exec_out(name: &str) -> Self {
        Self::new(name, PinDirection::Out, PinKind::Execution)
    }

    pub fn data_in(name: &str, ty: ValueType) -> Self {
        let mut pin = Self::new(name, PinDirection::In, PinKind::Data);
        pin.value_types = vec![ty];
        pin
    }

    /// A data input accepting any value type.
    pub fn data_in_any(name: &str) -> Self {
        Self::new(name, PinDirection::In, PinKind::Data)
    }

    /// Data outputs are fan-out capable by default; the value can be read by
    /// any number of consumers.
    pub fn data_out(name: &str, ty: ValueType) -> Self {
        let mut pin = Self::new(name, PinDirection::Out, PinKind::Data);
        pin.value_types = vec![ty];
        pin.multi = true;
        pin
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn single(mut self) -> Self {
        self.multi = false;
        self
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn with_types(mut self, types: Vec<ValueType>) -> Self {
        self.value_types = types;
        self
    }

    pub fn is_input(&self) -> bool {
        self.direction == PinDirection::In
    }

    pub fn is_output(&self) -> bool {
        self.direction == PinDirection::Out
    }

    pub fn is_data(&self) -> bool {
        self.kind == PinKind::Data
    }

    pub fn is_execution(&self) -> bool {
        self.kind == PinKind::Execution
    }

    /// Whether a value of the given type may flow through this pin.
    /// `Int` widens into a `Float`-typed pin.
    pub fn accepts(&self, ty: ValueType) -> bool {
        self.value_types.is_empty()
            || self.value_types.contains(&ty)
            || (ty == ValueType::Int && self.value_types.contains(&ValueType::Float))
    }
}

/// One endpoint of a wire: a pin identified by owning node id and pin name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PinRef {
    pub node: String,
    pub pin: String,
}

impl PinRef {
    pub fn new(node: &str, pin: &str) -> Self {
        Self {
            node: node.to_string(),
            pin: pin.to_string(),
        }
    }
}

/// A directed connection from one producing pin to one consuming pin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wire {
    pub source: PinRef,
    pub target: PinRef,
}

impl Wire {
    pub fn new(source_node: &str, source_pin: &str, target_node: &str, target_pin: &str) -> Self {
        Self {
            source: PinRef::new(source_node, source_pin),
            target: PinRef::new(target_node, target_pin),
        }
    }
}
