//! Serde shapes for the editor's persisted graph document.
//!
//! The editor owns the on-disk encoding; this module only fixes the logical
//! shape: node list (id, kind tag, position, pin snapshot), wire list,
//! parameter and variable declarations. Conversion into the canonical
//! [`GraphDescription`] is where unknown node-kind tags and malformed
//! per-kind configuration are rejected.

use super::description::{
    AccessMode, AccessScope, GraphDescription, InlineOp, NodeDescription, NodeKind,
    ParameterDeclaration, SwitchCase, VariableDeclaration,
};
use super::pin::{PinDeclaration, PinDirection, PinKind, Wire};
use crate::error::CompileError;
use crate::value::{Value, ValueType};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct PinDocument {
    pub name: String,
    /// "in" | "out"
    pub direction: String,
    /// "exec" | "data"; data when absent.
    #[serde(default, alias = "pinKind")]
    pub kind: Option<String>,
    #[serde(default, alias = "valueTypes")]
    pub value_types: Vec<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub multi: bool,
    #[serde(default)]
    pub default: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct NodeDocument {
    pub id: String,
    pub kind: String,
    #[serde(default)]
    pub position: (f32, f32),
    #[serde(default)]
    pub pins: Vec<PinDocument>,
    /// Kind-specific configuration (method name, cases, target type, ...).
    #[serde(default)]
    pub config: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct WireDocument {
    #[serde(alias = "sourceNode")]
    pub source_node: String,
    #[serde(alias = "sourcePin")]
    pub source_pin: String,
    #[serde(alias = "targetNode")]
    pub target_node: String,
    #[serde(alias = "targetPin")]
    pub target_pin: String,
}

#[derive(Debug, Deserialize)]
pub struct ParameterDocument {
    pub name: String,
    #[serde(alias = "type")]
    pub ty: String,
}

#[derive(Debug, Deserialize)]
pub struct VariableDocument {
    pub name: String,
    #[serde(alias = "type")]
    pub ty: String,
    #[serde(default)]
    pub default: Option<serde_json::Value>,
}

/// Complete editor document for one function graph.
#[derive(Debug, Deserialize)]
pub struct GraphDocument {
    pub name: String,
    #[serde(default)]
    pub version: u64,
    pub nodes: Vec<NodeDocument>,
    #[serde(default, alias = "edges")]
    pub wires: Vec<WireDocument>,
    #[serde(default)]
    pub inputs: Vec<ParameterDocument>,
    #[serde(default)]
    pub outputs: Vec<ParameterDocument>,
    #[serde(default, alias = "variables")]
    pub locals: Vec<VariableDocument>,
}

impl GraphDocument {
    pub fn from_json(json: &str) -> Result<Self, CompileError> {
        serde_json::from_str(json).map_err(|e| CompileError::JsonParse(e.to_string()))
    }

    /// Converts the document into the canonical description the compiler
    /// consumes. Unknown kind tags fail here, named, never later.
    pub fn into_description(self) -> Result<GraphDescription, CompileError> {
        let mut description = GraphDescription::new(&self.name);
        description.version = self.version;

        for node in self.nodes {
            description.nodes.push(convert_node(node)?);
        }
        for wire in self.wires {
            description.wires.push(Wire::new(
                &wire.source_node,
                &wire.source_pin,
                &wire.target_node,
                &wire.target_pin,
            ));
        }
        for param in self.inputs {
            description
                .inputs
                .push(ParameterDeclaration::new(&param.name, parse_type(&param.ty)?));
        }
        for param in self.outputs {
            description
                .outputs
                .push(ParameterDeclaration::new(&param.name, parse_type(&param.ty)?));
        }
        for var in self.locals {
            let mut decl = VariableDeclaration::new(&var.name, parse_type(&var.ty)?);
            if let Some(json) = &var.default {
                decl.default = Some(parse_value(json).ok_or_else(|| CompileError::JsonParse(
                    format!("variable '{}' has an unsupported default value", var.name),
                ))?);
            }
            description.locals.push(decl);
        }
        Ok(description)
    }
}

fn convert_node(doc: NodeDocument) -> Result<NodeDescription, CompileError> {
    let kind = parse_kind(&doc.id, &doc.kind, &doc.config)?;
    let mut node = NodeDescription::new(&doc.id, kind).at(doc.position.0, doc.position.1);
    for pin in doc.pins {
        node.pins.push(convert_pin(&doc.id, &doc.kind, pin)?);
    }
    Ok(node)
}

fn parse_kind(
    node_id: &str,
    tag: &str,
    config: &serde_json::Value,
) -> Result<NodeKind, CompileError> {
    let kind = match tag {
        "entry" => NodeKind::Entry,
        "call" => NodeKind::Call {
            method: config_str(node_id, tag, config, "method")?,
        },
        "memberAccess" => {
            let member = config_str(node_id, tag, config, "member")?;
            let scope = match config_str(node_id, tag, config, "scope")?.as_str() {
                "frame" => AccessScope::Frame,
                "host" => AccessScope::Host,
                other => return Err(malformed(node_id, tag, format!("unknown scope '{}'", other))),
            };
            let mode = match config_str(node_id, tag, config, "mode")?.as_str() {
                "get" => AccessMode::Get,
                "set" => AccessMode::Set,
                other => return Err(malformed(node_id, tag, format!("unknown mode '{}'", other))),
            };
            NodeKind::MemberAccess {
                member,
                scope,
                mode,
            }
        }
        "return" => NodeKind::Return,
        "branch" => NodeKind::Branch,
        "switch" => NodeKind::Switch {
            cases: parse_cases(node_id, tag, config)?,
        },
        "sequence" => NodeKind::Sequence,
        "for" => NodeKind::For,
        "forEach" => NodeKind::ForEach,
        "while" => NodeKind::While,
        "break" => NodeKind::Break,
        "continue" => NodeKind::Continue,
        "conversion" => NodeKind::Conversion {
            to: config_type(node_id, tag, config, "to")?,
        },
        "cast" => NodeKind::Cast {
            to: config_type(node_id, tag, config, "to")?,
        },
        "redirect" => NodeKind::Redirect,
        "inline" => {
            let op_tag = config_str(node_id, tag, config, "op")?;
            let op = InlineOp::parse(&op_tag)
                .ok_or_else(|| malformed(node_id, tag, format!("unknown operator '{}'", op_tag)))?;
            NodeKind::Inline { op }
        }
        _ => {
            return Err(CompileError::UnknownNodeKind {
                node_id: node_id.to_string(),
                kind: tag.to_string(),
            });
        }
    };
    Ok(kind)
}

fn parse_cases(
    node_id: &str,
    tag: &str,
    config: &serde_json::Value,
) -> Result<Vec<SwitchCase>, CompileError> {
    let cases = config
        .get("cases")
        .and_then(|c| c.as_array())
        .ok_or_else(|| malformed(node_id, tag, "missing 'cases' array".to_string()))?;
    cases
        .iter()
        .map(|case| {
            let value = case
                .get("value")
                .and_then(parse_value)
                .ok_or_else(|| malformed(node_id, tag, "case without a value".to_string()))?;
            let pin = case
                .get("pin")
                .and_then(|p| p.as_str())
                .ok_or_else(|| malformed(node_id, tag, "case without a pin".to_string()))?;
            Ok(SwitchCase {
                value,
                pin: pin.to_string(),
            })
        })
        .collect()
}

fn convert_pin(node_id: &str, tag: &str, doc: PinDocument) -> Result<PinDeclaration, CompileError> {
    let direction = match doc.direction.as_str() {
        "in" | "input" => PinDirection::In,
        "out" | "output" => PinDirection::Out,
        other => {
            return Err(malformed(
                node_id,
                tag,
                format!("pin '{}' has unknown direction '{}'", doc.name, other),
            ));
        }
    };
    let kind = match doc.kind.as_deref() {
        None | Some("data") => PinKind::Data,
        Some("exec") | Some("execution") => PinKind::Execution,
        Some(other) => {
            return Err(malformed(
                node_id,
                tag,
                format!("pin '{}' has unknown kind '{}'", doc.name, other),
            ));
        }
    };
    let value_types = doc
        .value_types
        .iter()
        .map(|t| {
            ValueType::parse(t).ok_or_else(|| {
                malformed(
                    node_id,
                    tag,
                    format!("pin '{}' has unknown value type '{}'", doc.name, t),
                )
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    let default = match &doc.default {
        Some(json) => Some(parse_value(json).ok_or_else(|| {
            malformed(
                node_id,
                tag,
                format!("pin '{}' has an unsupported default value", doc.name),
            )
        })?),
        None => None,
    };
    Ok(PinDeclaration {
        name: doc.name,
        direction,
        kind,
        value_types,
        required: doc.required,
        multi: doc.multi,
        default,
    })
}

fn parse_type(tag: &str) -> Result<ValueType, CompileError> {
    ValueType::parse(tag)
        .ok_or_else(|| CompileError::JsonParse(format!("unknown value type '{}'", tag)))
}

fn parse_value(json: &serde_json::Value) -> Option<Value> {
    Value::from_json(json)
}

fn config_str(
    node_id: &str,
    tag: &str,
    config: &serde_json::Value,
    key: &str,
) -> Result<String, CompileError> {
    config
        .get(key)
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| malformed(node_id, tag, format!("missing '{}' in config", key)))
}

fn config_type(
    node_id: &str,
    tag: &str,
    config: &serde_json::Value,
    key: &str,
) -> Result<ValueType, CompileError> {
    let tag_value = config_str(node_id, tag, config, key)?;
    ValueType::parse(&tag_value)
        .ok_or_else(|| malformed(node_id, tag, format!("unknown value type '{}'", tag_value)))
}

fn malformed(node_id: &str, kind: &str, message: String) -> CompileError {
    CompileError::MalformedNode {
        node_id: node_id.to_string(),
        kind: kind.to_string(),
        message,
    }
}
