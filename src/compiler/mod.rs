//! The node compiler.
//!
//! Turns a validated [`GraphDescription`] into a [`CompiledGraph`]:
//! validate, link, then lower every node description into its executable
//! form. Compilation is deterministic for a given description; hosts
//! recompile only when the description's version counter moves.

use crate::error::CompileError;
use crate::exec::{CompiledGraph, EngineConfig};
use crate::graph::GraphDescription;
use crate::linker;

mod lower;

/// Wiring strategy of a compile.
///
/// Both modes share the full node-kind set and per-kind lowering; they only
/// differ in how redirect nodes are wired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompileMode {
    /// Production wiring: redirect nodes collapse into direct links and are
    /// never allocated.
    #[default]
    Runtime,
    /// Editor preview wiring: redirects stay allocated as pass-through
    /// nodes so the editor can trace live wires through them.
    Preview,
}

pub struct CompilerBuilder {
    description: GraphDescription,
    mode: CompileMode,
    config: EngineConfig,
}

impl CompilerBuilder {
    pub fn new(description: GraphDescription) -> Self {
        Self {
            description,
            mode: CompileMode::default(),
            config: EngineConfig::default(),
        }
    }

    pub fn mode(mut self, mode: CompileMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn engine_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Compiler {
        Compiler {
            description: self.description,
            mode: self.mode,
            config: self.config,
        }
    }
}

pub struct Compiler {
    description: GraphDescription,
    mode: CompileMode,
    config: EngineConfig,
}

impl Compiler {
    pub fn builder(description: GraphDescription) -> CompilerBuilder {
        CompilerBuilder::new(description)
    }

    pub fn compile(self) -> Result<CompiledGraph, CompileError> {
        tracing::info!(
            graph = %self.description.name,
            nodes = self.description.nodes.len(),
            wires = self.description.wires.len(),
            "compiling graph"
        );

        self.description.validate()?;
        tracing::debug!(graph = %self.description.name, "validation passed");

        let elide = self.mode == CompileMode::Runtime;
        let resolved = linker::resolve(&self.description, elide)?;
        tracing::debug!(graph = %self.description.name, "linking complete");

        let compiled = lower::lower(&self.description, &resolved, self.mode, self.config)?;
        tracing::info!(
            graph = %compiled.name(),
            nodes = compiled.node_count(),
            "compilation successful"
        );
        Ok(compiled)
    }
}

/// Compiles a description with default settings. Pure function of the
/// description and the built-in node-kind set.
pub fn compile(description: &GraphDescription) -> Result<CompiledGraph, CompileError> {
    Compiler::builder(description.clone()).build().compile()
}
