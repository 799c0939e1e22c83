//! Block kinds: the behaviour attached to each node by its type tag.

pub mod controls;
pub mod lists;
pub mod logic;
pub mod math;
pub mod text;
pub mod variables;

use std::fmt;

use crate::block::Block;
use crate::codegen::{Expr, Generated};
use crate::context::Context;
use crate::error::{EngineError, Result};
use crate::runtime_value::RuntimeValue;

/// Domain of mutations given as top-level attributes.
pub const MUTATION_DOMAIN: &str = "mutation";

/// Behaviour of one block type. Both traversals receive the block they run
/// for; chaining along `next` is handled by the caller.
pub trait BlockKind: fmt::Debug + Send + Sync {
    fn evaluate(&self, block: &Block, ctx: &mut Context<RuntimeValue>) -> Result<RuntimeValue>;

    fn generate(&self, block: &Block, ctx: &mut Context<Expr>) -> Result<Generated>;
}

/// Parse a literal numeric field.
pub(crate) fn parse_number(text: &str) -> Result<f64> {
    text.trim()
        .parse::<f64>()
        .map_err(|_| EngineError::type_mismatch("Number", format!("`{}`", text)))
}

/// Upper bound for slot counts read from mutations.
pub const MAX_MUTATION_COUNT: usize = 10_000;

/// Read a count mutation, trying each alias in turn.
pub(crate) fn mutation_count(block: &Block, names: &[&str], default: usize) -> Result<usize> {
    let Some((name, raw)) = names
        .iter()
        .find_map(|name| block.mutation(MUTATION_DOMAIN, name).map(|raw| (name, raw)))
    else {
        return Ok(default);
    };
    match raw.trim().parse::<f64>() {
        Ok(n) if n >= 0.0 && n.fract() == 0.0 && n <= MAX_MUTATION_COUNT as f64 => {
            Ok(n as usize)
        }
        _ => Err(EngineError::type_mismatch(
            format!("integer from 0 to {}", MAX_MUTATION_COUNT),
            format!("`{}` for mutation `{}`", raw, name),
        )),
    }
}

pub(crate) fn mutation_flag(block: &Block, names: &[&str]) -> bool {
    names
        .iter()
        .find_map(|name| block.mutation(MUTATION_DOMAIN, name))
        .is_some_and(|raw| raw.eq_ignore_ascii_case("true") || raw.trim() == "1")
}

pub(crate) fn unknown_option(block: &Block, field: &str, value: &str) -> EngineError {
    EngineError::unsupported(format!(
        "`{}` has no {} option `{}`",
        block.block_type, field, value
    ))
}
