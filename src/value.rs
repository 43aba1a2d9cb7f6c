use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque handle to a host-owned object. The engine never looks inside it;
/// it is minted and interpreted exclusively by the [`Host`](crate::exec::Host).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectRef(pub u64);

/// Runtime value threaded between nodes during an invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Object(ObjectRef),
}

impl Value {
    pub fn value_type(&self) -> Option<ValueType> {
        match self {
            Value::Null => None,
            Value::Bool(_) => Some(ValueType::Bool),
            Value::Int(_) => Some(ValueType::Int),
            Value::Float(_) => Some(ValueType::Float),
            Value::Str(_) => Some(ValueType::Str),
            Value::List(_) => Some(ValueType::List),
            Value::Object(_) => Some(ValueType::Object),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            _ => None,
        }
    }

    /// Numeric view of the value, widening `Int` to `f64`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Equality with numeric widening, used by switch cases and the equality
    /// operators so that `Int(3)` matches `Float(3.0)`.
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => *a as f64 == *b,
            (a, b) => a == b,
        }
    }

    /// Applies the declared coercion table. `None` means the value cannot be
    /// represented in the requested type; cast nodes route that as control
    /// flow, conversion nodes report it as an execution error.
    pub fn convert(&self, to: ValueType) -> Option<Value> {
        match (self, to) {
            (Value::Bool(b), ValueType::Bool) => Some(Value::Bool(*b)),
            (Value::Int(i), ValueType::Bool) => Some(Value::Bool(*i != 0)),
            (Value::Float(f), ValueType::Bool) => Some(Value::Bool(*f != 0.0)),

            (Value::Int(i), ValueType::Int) => Some(Value::Int(*i)),
            (Value::Float(f), ValueType::Int) => Some(Value::Int(f.trunc() as i64)),
            (Value::Bool(b), ValueType::Int) => Some(Value::Int(i64::from(*b))),
            (Value::Str(s), ValueType::Int) => s.parse().ok().map(Value::Int),

            (Value::Float(f), ValueType::Float) => Some(Value::Float(*f)),
            (Value::Int(i), ValueType::Float) => Some(Value::Float(*i as f64)),
            (Value::Str(s), ValueType::Float) => s.parse().ok().map(Value::Float),

            (Value::Str(s), ValueType::Str) => Some(Value::Str(s.clone())),
            (Value::Bool(_) | Value::Int(_) | Value::Float(_), ValueType::Str) => {
                Some(Value::Str(self.to_string()))
            }

            (Value::List(items), ValueType::List) => Some(Value::List(items.clone())),
            (Value::Object(r), ValueType::Object) => Some(Value::Object(*r)),

            _ => None,
        }
    }

    /// Maps a JSON literal (pin default, switch case, document value) into a
    /// runtime value. Whole numbers become `Int`, everything else `Float`.
    pub fn from_json(json: &serde_json::Value) -> Option<Value> {
        match json {
            serde_json::Value::Null => Some(Value::Null),
            serde_json::Value::Bool(b) => Some(Value::Bool(*b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(Value::Int(i))
                } else {
                    n.as_f64().map(Value::Float)
                }
            }
            serde_json::Value::String(s) => Some(Value::Str(s.clone())),
            serde_json::Value::Array(items) => items
                .iter()
                .map(Value::from_json)
                .collect::<Option<Vec<_>>>()
                .map(Value::List),
            serde_json::Value::Object(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(n) => {
                if n.fract() == 0.0 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            Value::Str(s) => write!(f, "{}", s),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Object(r) => write!(f, "object#{}", r.0),
        }
    }
}

/// Declared type of a data pin, parameter or temporary variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValueType {
    Bool,
    Int,
    Float,
    Str,
    List,
    Object,
}

impl ValueType {
    /// The zero value used for unwritten outputs and undefaulted temporaries.
    pub fn default_value(&self) -> Value {
        match self {
            ValueType::Bool => Value::Bool(false),
            ValueType::Int => Value::Int(0),
            ValueType::Float => Value::Float(0.0),
            ValueType::Str => Value::Str(String::new()),
            ValueType::List => Value::List(Vec::new()),
            ValueType::Object => Value::Null,
        }
    }

    /// Whether a value is acceptable where this type is declared. `Int`
    /// widens into `Float`; `Null` stands in only for missing objects.
    pub fn admits(&self, value: &Value) -> bool {
        match (self, value) {
            (ValueType::Float, Value::Int(_)) => true,
            (ValueType::Object, Value::Null) => true,
            (ty, v) => v.value_type() == Some(*ty),
        }
    }

    /// Parses an editor document type tag.
    pub fn parse(tag: &str) -> Option<ValueType> {
        match tag {
            "bool" | "boolean" => Some(ValueType::Bool),
            "int" | "integer" => Some(ValueType::Int),
            "float" | "number" => Some(ValueType::Float),
            "string" => Some(ValueType::Str),
            "list" | "array" => Some(ValueType::List),
            "object" => Some(ValueType::Object),
            _ => None,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::Bool => "bool",
            ValueType::Int => "int",
            ValueType::Float => "float",
            ValueType::Str => "string",
            ValueType::List => "list",
            ValueType::Object => "object",
        };
        write!(f, "{}", name)
    }
}
