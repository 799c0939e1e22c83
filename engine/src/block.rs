use indexmap::IndexMap;
use tracing::trace;

use crate::codegen::{Expr, Generated, Stmt};
use crate::context::{Context, EscapeMode};
use crate::error::{EngineError, Result, SlotKind};
use crate::kinds::BlockKind;
use crate::runtime_value::RuntimeValue;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub value: String,
}

/// A named expression slot. An empty slot has no block.
#[derive(Debug)]
pub struct Value {
    pub name: String,
    pub block: Option<Box<Block>>,
}

impl Value {
    pub fn is_empty(&self) -> bool {
        self.block.is_none()
    }
}

/// A named statement slot holding the head of a nested chain.
#[derive(Debug)]
pub struct Statement {
    pub name: String,
    pub block: Option<Box<Block>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mutation {
    pub domain: String,
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub text: String,
}

/// A program node. Owns everything reachable through its slots and `next`.
#[derive(Debug)]
pub struct Block {
    pub block_type: String,
    pub id: String,
    pub fields: IndexMap<String, Field>,
    pub values: IndexMap<String, Value>,
    pub statements: IndexMap<String, Statement>,
    pub mutations: Vec<Mutation>,
    pub comments: Vec<Comment>,
    pub next: Option<Box<Block>>,
    kind: Box<dyn BlockKind>,
}

impl Block {
    pub fn new(block_type: impl Into<String>, id: impl Into<String>, kind: Box<dyn BlockKind>) -> Self {
        Block {
            block_type: block_type.into(),
            id: id.into(),
            fields: IndexMap::new(),
            values: IndexMap::new(),
            statements: IndexMap::new(),
            mutations: Vec::new(),
            comments: Vec::new(),
            next: None,
            kind,
        }
    }

    pub fn kind(&self) -> &dyn BlockKind {
        self.kind.as_ref()
    }

    /// Iterate this block and every block after it in the same sequence.
    pub fn chain(&self) -> impl Iterator<Item = &Block> {
        std::iter::successors(Some(self), |&block| block.next.as_deref())
    }

    fn missing(&self, slot: SlotKind, name: &str) -> EngineError {
        EngineError::MissingNamedSlot {
            slot,
            name: name.to_string(),
            block_type: self.block_type.clone(),
            block_id: self.id.clone(),
        }
    }

    pub fn field(&self, name: &str) -> Result<&str> {
        self.fields
            .get(name)
            .map(|field| field.value.as_str())
            .ok_or_else(|| self.missing(SlotKind::Field, name))
    }

    pub fn value(&self, name: &str) -> Result<&Value> {
        self.values
            .get(name)
            .ok_or_else(|| self.missing(SlotKind::Value, name))
    }

    pub fn statement(&self, name: &str) -> Result<&Statement> {
        self.statements
            .get(name)
            .ok_or_else(|| self.missing(SlotKind::Statement, name))
    }

    /// The head of a statement body, or `None` when the slot is absent or empty.
    pub fn body(&self, name: &str) -> Option<&Block> {
        self.statements
            .get(name)
            .and_then(|statement| statement.block.as_deref())
    }

    pub fn mutation(&self, domain: &str, name: &str) -> Option<&str> {
        self.mutations
            .iter()
            .find(|m| m.domain == domain && m.name == name)
            .map(|m| m.value.as_str())
    }

    pub fn require_mutation(&self, domain: &str, name: &str) -> Result<&str> {
        self.mutation(domain, name)
            .ok_or_else(|| self.missing(SlotKind::Mutation, name))
    }

    fn evaluate_own(&self, ctx: &mut Context<RuntimeValue>) -> Result<RuntimeValue> {
        trace!(block_type = %self.block_type, id = %self.id, depth = ctx.depth(), "evaluate");
        self.kind.evaluate(self, ctx)
    }

    /// Evaluate this block, then the rest of its sequence. Advancing stops as
    /// soon as an escape signal is pending. Returns the head's value.
    pub fn evaluate(&self, ctx: &mut Context<RuntimeValue>) -> Result<RuntimeValue> {
        let value = self.evaluate_own(ctx)?;
        let mut next = self.next.as_deref();
        while let Some(block) = next {
            if ctx.escape_mode() != EscapeMode::None {
                break;
            }
            block.evaluate_own(ctx)?;
            next = block.next.as_deref();
        }
        Ok(value)
    }

    /// Evaluate a value slot. An empty slot evaluates to null.
    pub fn evaluate_value(&self, name: &str, ctx: &mut Context<RuntimeValue>) -> Result<RuntimeValue> {
        match self.value(name)?.block.as_deref() {
            Some(block) => block.evaluate(ctx),
            None => Ok(RuntimeValue::Null),
        }
    }

    /// Evaluate a statement body in the current context. A missing body does nothing.
    pub fn evaluate_statement(&self, name: &str, ctx: &mut Context<RuntimeValue>) -> Result<()> {
        if let Some(body) = self.body(name) {
            body.evaluate(ctx)?;
        }
        Ok(())
    }

    /// Generate this block and the rest of its sequence as statements.
    pub fn generate(&self, ctx: &mut Context<Expr>) -> Result<Vec<Stmt>> {
        let mut statements = Vec::new();
        for block in self.chain() {
            match block.kind.generate(block, ctx)? {
                Generated::Expression(expr) => statements.push(Stmt::Expr(expr)),
                Generated::Statements(generated) => statements.extend(generated),
            }
        }
        Ok(statements)
    }

    pub fn generate_expression(&self, ctx: &mut Context<Expr>) -> Result<Expr> {
        match self.kind.generate(self, ctx)? {
            Generated::Expression(expr) => Ok(expr),
            Generated::Statements(_) => Err(EngineError::type_mismatch(
                "expression",
                format!("statement block `{}`", self.block_type),
            )),
        }
    }

    /// Generate a value slot. An empty slot generates `null`.
    pub fn generate_value(&self, name: &str, ctx: &mut Context<Expr>) -> Result<Expr> {
        match self.value(name)?.block.as_deref() {
            Some(block) => block.generate_expression(ctx),
            None => Ok(Expr::Null),
        }
    }

    pub fn generate_statement(&self, name: &str, ctx: &mut Context<Expr>) -> Result<Vec<Stmt>> {
        match self.body(name) {
            Some(body) => body.generate(ctx),
            None => Ok(Vec::new()),
        }
    }
}

impl Drop for Block {
    fn drop(&mut self) {
        let mut next = self.next.take();
        while let Some(mut block) = next {
            next = block.next.take();
        }
    }
}
