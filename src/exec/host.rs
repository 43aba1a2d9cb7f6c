use crate::error::HostError;
use crate::value::Value;

/// Result of a host method call: the return value plus positional
/// out-arguments, mapped back onto the call node's data outputs in order.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodReturn {
    pub value: Value,
    pub out_args: Vec<Value>,
}

impl MethodReturn {
    pub fn value(value: Value) -> Self {
        Self {
            value,
            out_args: Vec::new(),
        }
    }
}

/// The capability interface call and member-access nodes use to reach
/// outside the graph.
///
/// The engine never resolves members itself; it delegates the three
/// operations here and treats the implementation as opaque. An external
/// variable is addressed as a member with a `Null` owner, interpreted by the
/// host.
pub trait Host {
    fn get_member(&self, owner: &Value, member: &str) -> Result<Value, HostError>;

    fn set_member(&mut self, owner: &Value, member: &str, value: Value) -> Result<(), HostError>;

    fn call_method(
        &mut self,
        owner: &Value,
        method: &str,
        args: &[Value],
    ) -> Result<MethodReturn, HostError>;
}

/// Host for graphs that never leave the frame; every member lookup fails.
pub struct NoHost;

impl Host for NoHost {
    fn get_member(&self, _owner: &Value, member: &str) -> Result<Value, HostError> {
        Err(HostError::MemberNotFound {
            member: member.to_string(),
        })
    }

    fn set_member(&mut self, _owner: &Value, member: &str, _value: Value) -> Result<(), HostError> {
        Err(HostError::MemberNotFound {
            member: member.to_string(),
        })
    }

    fn call_method(
        &mut self,
        _owner: &Value,
        method: &str,
        _args: &[Value],
    ) -> Result<MethodReturn, HostError> {
        Err(HostError::MemberNotFound {
            member: method.to_string(),
        })
    }
}
