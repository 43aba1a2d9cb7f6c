//! Common test utilities for building graph descriptions and hosts.
use kairo::error::HostError;
use kairo::prelude::*;
use std::collections::HashMap;
use std::result::Result;

/// Creates the reference doubling graph: `y = x * 2`.
///
/// entry --then--> exit, with `x * 2` feeding the return value.
#[allow(dead_code)]
pub fn doubling_graph() -> GraphDescription {
    let mut graph = GraphDescription::new("double");
    graph.inputs.push(ParameterDeclaration::new("x", ValueType::Int));
    graph.outputs.push(ParameterDeclaration::new("y", ValueType::Int));

    graph.nodes.push(
        NodeDescription::new("entry", NodeKind::Entry)
            .with_pin(PinDeclaration::exec_out("then"))
            .with_pin(PinDeclaration::data_out("x", ValueType::Int)),
    );
    graph.nodes.push(
        NodeDescription::new("double", NodeKind::Inline { op: InlineOp::Multiply })
            .with_pin(PinDeclaration::data_in("lhs", ValueType::Int).required())
            .with_pin(PinDeclaration::data_in("rhs", ValueType::Int).with_default(Value::Int(2)))
            .with_pin(PinDeclaration::data_out("result", ValueType::Int)),
    );
    graph.nodes.push(
        NodeDescription::new("exit", NodeKind::Return)
            .with_pin(PinDeclaration::exec_in("exec"))
            .with_pin(PinDeclaration::data_in("y", ValueType::Int)),
    );

    graph.wires.push(Wire::new("entry", "then", "exit", "exec"));
    graph.wires.push(Wire::new("entry", "x", "double", "lhs"));
    graph.wires.push(Wire::new("double", "result", "exit", "y"));
    graph
}

/// Branch graph reporting which side fired.
///
/// Outputs `took_true` / `took_false`, written by two separate return nodes
/// so that exactly one of them can fire per invocation.
#[allow(dead_code)]
pub fn branch_graph() -> GraphDescription {
    let mut graph = GraphDescription::new("branching");
    graph.inputs.push(ParameterDeclaration::new("cond", ValueType::Bool));
    graph.outputs.push(ParameterDeclaration::new("took_true", ValueType::Bool));
    graph.outputs.push(ParameterDeclaration::new("took_false", ValueType::Bool));

    graph.nodes.push(
        NodeDescription::new("entry", NodeKind::Entry)
            .with_pin(PinDeclaration::exec_out("then"))
            .with_pin(PinDeclaration::data_out("cond", ValueType::Bool)),
    );
    graph.nodes.push(
        NodeDescription::new("branch", NodeKind::Branch)
            .with_pin(PinDeclaration::exec_in("exec"))
            .with_pin(PinDeclaration::data_in("condition", ValueType::Bool).required())
            .with_pin(PinDeclaration::exec_out("true"))
            .with_pin(PinDeclaration::exec_out("false")),
    );
    graph.nodes.push(
        NodeDescription::new("ret_true", NodeKind::Return)
            .with_pin(PinDeclaration::exec_in("exec"))
            .with_pin(
                PinDeclaration::data_in("took_true", ValueType::Bool)
                    .with_default(Value::Bool(true)),
            ),
    );
    graph.nodes.push(
        NodeDescription::new("ret_false", NodeKind::Return)
            .with_pin(PinDeclaration::exec_in("exec"))
            .with_pin(
                PinDeclaration::data_in("took_false", ValueType::Bool)
                    .with_default(Value::Bool(true)),
            ),
    );

    graph.wires.push(Wire::new("entry", "then", "branch", "exec"));
    graph.wires.push(Wire::new("entry", "cond", "branch", "condition"));
    graph.wires.push(Wire::new("branch", "true", "ret_true", "exec"));
    graph.wires.push(Wire::new("branch", "false", "ret_false", "exec"));
    graph
}

/// Counter loop: `for i in 0..5 { if i == break_at { break } else { acc += 1 } }`.
///
/// Outputs `count` (the accumulator) and `exhausted` (true only when the
/// loop ran off the end of its range). Pass `break_at >= 5` for natural
/// exhaustion.
#[allow(dead_code)]
pub fn counter_loop_graph(break_at: i64) -> GraphDescription {
    let mut graph = GraphDescription::new("counter");
    graph.outputs.push(ParameterDeclaration::new("count", ValueType::Int));
    graph.outputs.push(ParameterDeclaration::new("exhausted", ValueType::Bool));
    graph.locals.push(VariableDeclaration::new("acc", ValueType::Int));

    graph.nodes.push(
        NodeDescription::new("entry", NodeKind::Entry).with_pin(PinDeclaration::exec_out("then")),
    );
    graph.nodes.push(
        NodeDescription::new("loop", NodeKind::For)
            .with_pin(PinDeclaration::exec_in("exec"))
            .with_pin(PinDeclaration::data_in("first", ValueType::Int).with_default(Value::Int(0)))
            .with_pin(PinDeclaration::data_in("last", ValueType::Int).with_default(Value::Int(5)))
            .with_pin(PinDeclaration::exec_out("body"))
            .with_pin(PinDeclaration::exec_out("completed"))
            .with_pin(PinDeclaration::exec_out("broken"))
            .with_pin(PinDeclaration::data_out("index", ValueType::Int)),
    );
    graph.nodes.push(
        NodeDescription::new("at_limit", NodeKind::Inline { op: InlineOp::Equal })
            .with_pin(PinDeclaration::data_in("lhs", ValueType::Int).required())
            .with_pin(
                PinDeclaration::data_in("rhs", ValueType::Int).with_default(Value::Int(break_at)),
            )
            .with_pin(PinDeclaration::data_out("result", ValueType::Bool)),
    );
    graph.nodes.push(
        NodeDescription::new("check", NodeKind::Branch)
            .with_pin(PinDeclaration::exec_in("exec"))
            .with_pin(PinDeclaration::data_in("condition", ValueType::Bool).required())
            .with_pin(PinDeclaration::exec_out("true"))
            .with_pin(PinDeclaration::exec_out("false")),
    );
    graph.nodes.push(
        NodeDescription::new("stop", NodeKind::Break).with_pin(PinDeclaration::exec_in("exec")),
    );
    graph.nodes.push(
        NodeDescription::new(
            "get_acc",
            NodeKind::MemberAccess {
                member: "acc".to_string(),
                scope: AccessScope::Frame,
                mode: AccessMode::Get,
            },
        )
        .with_pin(PinDeclaration::data_out("acc", ValueType::Int)),
    );
    graph.nodes.push(
        NodeDescription::new("bump", NodeKind::Inline { op: InlineOp::Add })
            .with_pin(PinDeclaration::data_in("lhs", ValueType::Int).required())
            .with_pin(PinDeclaration::data_in("rhs", ValueType::Int).with_default(Value::Int(1)))
            .with_pin(PinDeclaration::data_out("result", ValueType::Int)),
    );
    graph.nodes.push(
        NodeDescription::new(
            "set_acc",
            NodeKind::MemberAccess {
                member: "acc".to_string(),
                scope: AccessScope::Frame,
                mode: AccessMode::Set,
            },
        )
        .with_pin(PinDeclaration::exec_in("exec"))
        .with_pin(PinDeclaration::data_in("acc", ValueType::Int).required())
        .with_pin(PinDeclaration::exec_out("then")),
    );
    graph.nodes.push(
        NodeDescription::new("ret_done", NodeKind::Return)
            .with_pin(PinDeclaration::exec_in("exec"))
            .with_pin(PinDeclaration::data_in("count", ValueType::Int))
            .with_pin(
                PinDeclaration::data_in("exhausted", ValueType::Bool)
                    .with_default(Value::Bool(true)),
            ),
    );
    graph.nodes.push(
        NodeDescription::new("ret_broken", NodeKind::Return)
            .with_pin(PinDeclaration::exec_in("exec"))
            .with_pin(PinDeclaration::data_in("count", ValueType::Int)),
    );

    graph.wires.push(Wire::new("entry", "then", "loop", "exec"));
    graph.wires.push(Wire::new("loop", "body", "check", "exec"));
    graph.wires.push(Wire::new("loop", "index", "at_limit", "lhs"));
    graph.wires.push(Wire::new("at_limit", "result", "check", "condition"));
    graph.wires.push(Wire::new("check", "true", "stop", "exec"));
    graph.wires.push(Wire::new("check", "false", "set_acc", "exec"));
    graph.wires.push(Wire::new("get_acc", "acc", "bump", "lhs"));
    graph.wires.push(Wire::new("bump", "result", "set_acc", "acc"));
    graph.wires.push(Wire::new("loop", "completed", "ret_done", "exec"));
    graph.wires.push(Wire::new("loop", "broken", "ret_broken", "exec"));
    graph.wires.push(Wire::new("get_acc", "acc", "ret_done", "count"));
    graph.wires.push(Wire::new("get_acc", "acc", "ret_broken", "count"));
    graph
}

/// Sequence graph logging "a", "b", "c" through the host, returning from
/// the last arm.
#[allow(dead_code)]
pub fn sequence_graph() -> GraphDescription {
    let mut graph = GraphDescription::new("sequenced");

    graph.nodes.push(
        NodeDescription::new("entry", NodeKind::Entry).with_pin(PinDeclaration::exec_out("then")),
    );
    graph.nodes.push(
        NodeDescription::new("seq", NodeKind::Sequence)
            .with_pin(PinDeclaration::exec_in("exec"))
            .with_pin(PinDeclaration::exec_out("0"))
            .with_pin(PinDeclaration::exec_out("1"))
            .with_pin(PinDeclaration::exec_out("2")),
    );
    for (id, label) in [("log_a", "a"), ("log_b", "b"), ("log_c", "c")] {
        graph.nodes.push(
            NodeDescription::new(id, NodeKind::Call { method: "log".to_string() })
                .with_pin(PinDeclaration::exec_in("exec"))
                .with_pin(
                    PinDeclaration::data_in("message", ValueType::Str)
                        .with_default(Value::Str(label.to_string())),
                )
                .with_pin(PinDeclaration::exec_out("then"))
                .with_pin(PinDeclaration::data_out("return", ValueType::Object)),
        );
    }
    graph.nodes.push(
        NodeDescription::new("exit", NodeKind::Return).with_pin(PinDeclaration::exec_in("exec")),
    );

    graph.wires.push(Wire::new("entry", "then", "seq", "exec"));
    graph.wires.push(Wire::new("seq", "0", "log_a", "exec"));
    graph.wires.push(Wire::new("seq", "1", "log_b", "exec"));
    graph.wires.push(Wire::new("seq", "2", "log_c", "exec"));
    graph.wires.push(Wire::new("log_c", "then", "exit", "exec"));
    graph
}

/// Switch graph mapping `sel` 1 -> "one", 2 -> "two", anything else ->
/// "other", via return-pin defaults on three return nodes.
#[allow(dead_code)]
pub fn switch_graph() -> GraphDescription {
    let mut graph = GraphDescription::new("switching");
    graph.inputs.push(ParameterDeclaration::new("sel", ValueType::Int));
    graph.outputs.push(ParameterDeclaration::new("label", ValueType::Str));

    graph.nodes.push(
        NodeDescription::new("entry", NodeKind::Entry)
            .with_pin(PinDeclaration::exec_out("then"))
            .with_pin(PinDeclaration::data_out("sel", ValueType::Int)),
    );
    graph.nodes.push(
        NodeDescription::new(
            "select",
            NodeKind::Switch {
                cases: vec![
                    SwitchCase { value: Value::Int(1), pin: "one".to_string() },
                    SwitchCase { value: Value::Int(2), pin: "two".to_string() },
                ],
            },
        )
        .with_pin(PinDeclaration::exec_in("exec"))
        .with_pin(PinDeclaration::data_in("value", ValueType::Int).required())
        .with_pin(PinDeclaration::exec_out("one"))
        .with_pin(PinDeclaration::exec_out("two"))
        .with_pin(PinDeclaration::exec_out("default")),
    );
    for (id, label) in [("ret_one", "one"), ("ret_two", "two"), ("ret_other", "other")] {
        graph.nodes.push(
            NodeDescription::new(id, NodeKind::Return)
                .with_pin(PinDeclaration::exec_in("exec"))
                .with_pin(
                    PinDeclaration::data_in("label", ValueType::Str)
                        .with_default(Value::Str(label.to_string())),
                ),
        );
    }

    graph.wires.push(Wire::new("entry", "then", "select", "exec"));
    graph.wires.push(Wire::new("entry", "sel", "select", "value"));
    graph.wires.push(Wire::new("select", "one", "ret_one", "exec"));
    graph.wires.push(Wire::new("select", "two", "ret_two", "exec"));
    graph.wires.push(Wire::new("select", "default", "ret_other", "exec"));
    graph
}

/// For-each graph summing a list of ints into the `total` output.
#[allow(dead_code)]
pub fn foreach_sum_graph() -> GraphDescription {
    let mut graph = GraphDescription::new("summing");
    graph.inputs.push(ParameterDeclaration::new("items", ValueType::List));
    graph.outputs.push(ParameterDeclaration::new("total", ValueType::Int));
    graph.locals.push(VariableDeclaration::new("acc", ValueType::Int));

    graph.nodes.push(
        NodeDescription::new("entry", NodeKind::Entry)
            .with_pin(PinDeclaration::exec_out("then"))
            .with_pin(PinDeclaration::data_out("items", ValueType::List)),
    );
    graph.nodes.push(
        NodeDescription::new("each", NodeKind::ForEach)
            .with_pin(PinDeclaration::exec_in("exec"))
            .with_pin(PinDeclaration::data_in("items", ValueType::List).required())
            .with_pin(PinDeclaration::exec_out("body"))
            .with_pin(PinDeclaration::exec_out("completed"))
            .with_pin(PinDeclaration::data_out("element", ValueType::Int))
            .with_pin(PinDeclaration::data_out("index", ValueType::Int)),
    );
    graph.nodes.push(
        NodeDescription::new(
            "get_acc",
            NodeKind::MemberAccess {
                member: "acc".to_string(),
                scope: AccessScope::Frame,
                mode: AccessMode::Get,
            },
        )
        .with_pin(PinDeclaration::data_out("acc", ValueType::Int)),
    );
    graph.nodes.push(
        NodeDescription::new("add", NodeKind::Inline { op: InlineOp::Add })
            .with_pin(PinDeclaration::data_in("lhs", ValueType::Int).required())
            .with_pin(PinDeclaration::data_in("rhs", ValueType::Int).required())
            .with_pin(PinDeclaration::data_out("result", ValueType::Int)),
    );
    graph.nodes.push(
        NodeDescription::new(
            "set_acc",
            NodeKind::MemberAccess {
                member: "acc".to_string(),
                scope: AccessScope::Frame,
                mode: AccessMode::Set,
            },
        )
        .with_pin(PinDeclaration::exec_in("exec"))
        .with_pin(PinDeclaration::data_in("acc", ValueType::Int).required())
        .with_pin(PinDeclaration::exec_out("then")),
    );
    graph.nodes.push(
        NodeDescription::new("exit", NodeKind::Return)
            .with_pin(PinDeclaration::exec_in("exec"))
            .with_pin(PinDeclaration::data_in("total", ValueType::Int)),
    );

    graph.wires.push(Wire::new("entry", "then", "each", "exec"));
    graph.wires.push(Wire::new("entry", "items", "each", "items"));
    graph.wires.push(Wire::new("each", "body", "set_acc", "exec"));
    graph.wires.push(Wire::new("get_acc", "acc", "add", "lhs"));
    graph.wires.push(Wire::new("each", "element", "add", "rhs"));
    graph.wires.push(Wire::new("add", "result", "set_acc", "acc"));
    graph.wires.push(Wire::new("each", "completed", "exit", "exec"));
    graph.wires.push(Wire::new("get_acc", "acc", "exit", "total"));
    graph
}

/// While graph counting `n` down to zero.
#[allow(dead_code)]
pub fn while_countdown_graph() -> GraphDescription {
    let mut graph = GraphDescription::new("countdown");
    graph.outputs.push(ParameterDeclaration::new("n", ValueType::Int));
    graph
        .locals
        .push(VariableDeclaration::new("n", ValueType::Int).with_default(Value::Int(3)));

    graph.nodes.push(
        NodeDescription::new("entry", NodeKind::Entry).with_pin(PinDeclaration::exec_out("then")),
    );
    graph.nodes.push(
        NodeDescription::new(
            "get_n",
            NodeKind::MemberAccess {
                member: "n".to_string(),
                scope: AccessScope::Frame,
                mode: AccessMode::Get,
            },
        )
        .with_pin(PinDeclaration::data_out("n", ValueType::Int)),
    );
    graph.nodes.push(
        NodeDescription::new("positive", NodeKind::Inline { op: InlineOp::Greater })
            .with_pin(PinDeclaration::data_in("lhs", ValueType::Int).required())
            .with_pin(PinDeclaration::data_in("rhs", ValueType::Int).with_default(Value::Int(0)))
            .with_pin(PinDeclaration::data_out("result", ValueType::Bool)),
    );
    graph.nodes.push(
        NodeDescription::new("spin", NodeKind::While)
            .with_pin(PinDeclaration::exec_in("exec"))
            .with_pin(PinDeclaration::data_in("condition", ValueType::Bool).required())
            .with_pin(PinDeclaration::exec_out("body"))
            .with_pin(PinDeclaration::exec_out("completed")),
    );
    graph.nodes.push(
        NodeDescription::new("decrement", NodeKind::Inline { op: InlineOp::Subtract })
            .with_pin(PinDeclaration::data_in("lhs", ValueType::Int).required())
            .with_pin(PinDeclaration::data_in("rhs", ValueType::Int).with_default(Value::Int(1)))
            .with_pin(PinDeclaration::data_out("result", ValueType::Int)),
    );
    graph.nodes.push(
        NodeDescription::new(
            "set_n",
            NodeKind::MemberAccess {
                member: "n".to_string(),
                scope: AccessScope::Frame,
                mode: AccessMode::Set,
            },
        )
        .with_pin(PinDeclaration::exec_in("exec"))
        .with_pin(PinDeclaration::data_in("n", ValueType::Int).required())
        .with_pin(PinDeclaration::exec_out("then")),
    );
    graph.nodes.push(
        NodeDescription::new("exit", NodeKind::Return)
            .with_pin(PinDeclaration::exec_in("exec"))
            .with_pin(PinDeclaration::data_in("n", ValueType::Int)),
    );

    graph.wires.push(Wire::new("entry", "then", "spin", "exec"));
    graph.wires.push(Wire::new("get_n", "n", "positive", "lhs"));
    graph.wires.push(Wire::new("positive", "result", "spin", "condition"));
    graph.wires.push(Wire::new("spin", "body", "set_n", "exec"));
    graph.wires.push(Wire::new("get_n", "n", "decrement", "lhs"));
    graph.wires.push(Wire::new("decrement", "result", "set_n", "n"));
    graph.wires.push(Wire::new("spin", "completed", "exit", "exec"));
    graph.wires.push(Wire::new("get_n", "n", "exit", "n"));
    graph
}

/// Cast graph parsing a string input into an int, with both continuations
/// wired: `parsed`/`ok` on success, defaults on failure.
#[allow(dead_code)]
pub fn cast_graph() -> GraphDescription {
    let mut graph = GraphDescription::new("casting");
    graph.inputs.push(ParameterDeclaration::new("raw", ValueType::Str));
    graph.outputs.push(ParameterDeclaration::new("parsed", ValueType::Int));
    graph.outputs.push(ParameterDeclaration::new("ok", ValueType::Bool));

    graph.nodes.push(
        NodeDescription::new("entry", NodeKind::Entry)
            .with_pin(PinDeclaration::exec_out("then"))
            .with_pin(PinDeclaration::data_out("raw", ValueType::Str)),
    );
    graph.nodes.push(
        NodeDescription::new("as_int", NodeKind::Cast { to: ValueType::Int })
            .with_pin(PinDeclaration::exec_in("exec"))
            .with_pin(PinDeclaration::data_in("value", ValueType::Str).required())
            .with_pin(PinDeclaration::exec_out("valid"))
            .with_pin(PinDeclaration::exec_out("invalid"))
            .with_pin(PinDeclaration::data_out("result", ValueType::Int)),
    );
    graph.nodes.push(
        NodeDescription::new("ret_ok", NodeKind::Return)
            .with_pin(PinDeclaration::exec_in("exec"))
            .with_pin(PinDeclaration::data_in("parsed", ValueType::Int))
            .with_pin(
                PinDeclaration::data_in("ok", ValueType::Bool).with_default(Value::Bool(true)),
            ),
    );
    graph.nodes.push(
        NodeDescription::new("ret_bad", NodeKind::Return)
            .with_pin(PinDeclaration::exec_in("exec")),
    );

    graph.wires.push(Wire::new("entry", "then", "as_int", "exec"));
    graph.wires.push(Wire::new("entry", "raw", "as_int", "value"));
    graph.wires.push(Wire::new("as_int", "valid", "ret_ok", "exec"));
    graph.wires.push(Wire::new("as_int", "invalid", "ret_bad", "exec"));
    graph.wires.push(Wire::new("as_int", "result", "ret_ok", "parsed"));
    graph
}

/// Doubling graph routed through one exec redirect and one data redirect.
#[allow(dead_code)]
pub fn redirected_doubling_graph() -> GraphDescription {
    let mut graph = doubling_graph();
    graph.name = "double_redirected".to_string();

    graph.nodes.push(
        NodeDescription::new("elbow_exec", NodeKind::Redirect)
            .with_pin(PinDeclaration::exec_in("in"))
            .with_pin(PinDeclaration::exec_out("out")),
    );
    graph.nodes.push(
        NodeDescription::new("elbow_data", NodeKind::Redirect)
            .with_pin(PinDeclaration::data_in("in", ValueType::Int))
            .with_pin(PinDeclaration::data_out("out", ValueType::Int)),
    );

    graph.wires.retain(|w| {
        !(w.source.node == "entry" && w.source.pin == "then")
            && !(w.source.node == "entry" && w.source.pin == "x")
    });
    graph.wires.push(Wire::new("entry", "then", "elbow_exec", "in"));
    graph.wires.push(Wire::new("elbow_exec", "out", "exit", "exec"));
    graph.wires.push(Wire::new("entry", "x", "elbow_data", "in"));
    graph.wires.push(Wire::new("elbow_data", "out", "double", "lhs"));
    graph
}

/// Host recording every member write and method call, with a couple of
/// canned methods: `combine` sums its int arguments and reports a `Bool`
/// out-argument, `log` records and returns null.
#[allow(dead_code)]
#[derive(Default)]
pub struct RecordingHost {
    pub members: HashMap<String, Value>,
    pub calls: Vec<(String, Vec<Value>)>,
}

impl Host for RecordingHost {
    fn get_member(&self, _owner: &Value, member: &str) -> Result<Value, HostError> {
        self.members
            .get(member)
            .cloned()
            .ok_or_else(|| HostError::MemberNotFound {
                member: member.to_string(),
            })
    }

    fn set_member(&mut self, _owner: &Value, member: &str, value: Value) -> Result<(), HostError> {
        self.members.insert(member.to_string(), value);
        Ok(())
    }

    fn call_method(
        &mut self,
        _owner: &Value,
        method: &str,
        args: &[Value],
    ) -> Result<MethodReturn, HostError> {
        self.calls.push((method.to_string(), args.to_vec()));
        match method {
            "combine" => {
                let sum = args.iter().filter_map(|v| v.as_int()).sum();
                Ok(MethodReturn {
                    value: Value::Int(sum),
                    out_args: vec![Value::Bool(true)],
                })
            }
            "log" => Ok(MethodReturn::value(Value::Null)),
            _ => Err(HostError::MemberNotFound {
                member: method.to_string(),
            }),
        }
    }
}
