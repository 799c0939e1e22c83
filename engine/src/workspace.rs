use indexmap::IndexMap;
use tracing::debug;

use crate::block::Block;
use crate::codegen::{Expr, Program};
use crate::context::Context;
use crate::error::Result;
use crate::runtime_value::RuntimeValue;

/// The parsed program: top-level chains in order. Immutable once built.
#[derive(Debug, Default)]
pub struct Workspace {
    blocks: Vec<Block>,
}

/// Outcome of running a workspace.
#[derive(Debug, Clone, PartialEq)]
pub struct Execution {
    /// Value of the last top-level chain.
    pub value: RuntimeValue,
    /// Root bindings after the run.
    pub variables: IndexMap<String, RuntimeValue>,
}

impl Workspace {
    pub fn new(blocks: Vec<Block>) -> Self {
        Workspace { blocks }
    }

    /// Heads of the top-level chains.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Evaluate every chain against `ctx`. An escape left over at top level
    /// only ends its own chain.
    pub fn evaluate(&self, ctx: &mut Context<RuntimeValue>) -> Result<RuntimeValue> {
        debug!(chains = self.blocks.len(), "evaluating workspace");
        let mut last = RuntimeValue::Null;
        for block in &self.blocks {
            last = block.evaluate(ctx)?;
            ctx.take_escape();
        }
        Ok(last)
    }

    pub fn generate(&self, ctx: &mut Context<Expr>) -> Result<Program> {
        debug!(chains = self.blocks.len(), "generating workspace");
        let mut body = Vec::new();
        for block in &self.blocks {
            body.extend(block.generate(ctx)?);
            ctx.take_escape();
        }
        Ok(Program {
            variables: ctx.root().variables().keys().cloned().collect(),
            body,
        })
    }

    /// Run against a fresh root seeded with `globals`.
    pub fn run(
        &self,
        globals: impl IntoIterator<Item = (String, RuntimeValue)>,
    ) -> Result<Execution> {
        let mut ctx = Context::with_variables(globals);
        let value = self.evaluate(&mut ctx)?;
        Ok(Execution {
            value,
            variables: ctx.into_variables(),
        })
    }

    /// Generate against a fresh root.
    pub fn compile(&self) -> Result<Program> {
        self.generate(&mut Context::new())
    }
}
