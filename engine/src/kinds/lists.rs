use crate::block::Block;
use crate::codegen::{BinaryOperator, Expr, Generated};
use crate::context::Context;
use crate::error::{EngineError, Result};
use crate::kinds::{BlockKind, mutation_count};
use crate::runtime_value::RuntimeValue;

#[derive(Debug, Default)]
pub struct CreateEmpty;

impl BlockKind for CreateEmpty {
    fn evaluate(&self, _block: &Block, _ctx: &mut Context<RuntimeValue>) -> Result<RuntimeValue> {
        Ok(RuntimeValue::List(Vec::new()))
    }

    fn generate(&self, _block: &Block, _ctx: &mut Context<Expr>) -> Result<Generated> {
        Ok(Generated::Expression(Expr::List(Vec::new())))
    }
}

/// `lists_create_with`: one element per `ADD<i>` slot; empty slots give null.
#[derive(Debug, Default)]
pub struct CreateWith;

impl BlockKind for CreateWith {
    fn evaluate(&self, block: &Block, ctx: &mut Context<RuntimeValue>) -> Result<RuntimeValue> {
        let items = mutation_count(block, &["items"], 3)?;
        let list = (0..items)
            .map(|i| block.evaluate_value(&format!("ADD{}", i), ctx))
            .collect::<Result<Vec<_>>>()?;
        Ok(RuntimeValue::List(list))
    }

    fn generate(&self, block: &Block, ctx: &mut Context<Expr>) -> Result<Generated> {
        let items = mutation_count(block, &["items"], 3)?;
        let list = (0..items)
            .map(|i| block.generate_value(&format!("ADD{}", i), ctx))
            .collect::<Result<Vec<_>>>()?;
        Ok(Generated::Expression(Expr::List(list)))
    }
}

/// Longest list `lists_repeat` builds.
pub const MAX_REPEAT_LENGTH: usize = 1 << 24;

/// `lists_repeat`: `NUM` copies of `ITEM`.
#[derive(Debug, Default)]
pub struct Repeat;

impl BlockKind for Repeat {
    fn evaluate(&self, block: &Block, ctx: &mut Context<RuntimeValue>) -> Result<RuntimeValue> {
        let item = block.evaluate_value("ITEM", ctx)?;
        let count = block.evaluate_value("NUM", ctx)?.as_number()?;
        if count < 0.0 || count.fract() != 0.0 {
            return Err(EngineError::type_mismatch(
                "non-negative whole Number",
                count.to_string(),
            ));
        }
        if count > MAX_REPEAT_LENGTH as f64 {
            return Err(EngineError::unsupported(format!(
                "`lists_repeat` of {} items exceeds the limit of {}",
                count, MAX_REPEAT_LENGTH
            )));
        }
        Ok(RuntimeValue::List(vec![item; count as usize]))
    }

    fn generate(&self, block: &Block, ctx: &mut Context<Expr>) -> Result<Generated> {
        let item = block.generate_value("ITEM", ctx)?;
        let count = block.generate_value("NUM", ctx)?;
        Ok(Generated::Expression(Expr::call("listsRepeat", vec![item, count])))
    }
}

fn list_length(block: &Block, ctx: &mut Context<RuntimeValue>) -> Result<usize> {
    Ok(block.evaluate_value("VALUE", ctx)?.as_list()?.len())
}

#[derive(Debug, Default)]
pub struct Length;

impl BlockKind for Length {
    fn evaluate(&self, block: &Block, ctx: &mut Context<RuntimeValue>) -> Result<RuntimeValue> {
        Ok(RuntimeValue::Number(list_length(block, ctx)? as f64))
    }

    fn generate(&self, block: &Block, ctx: &mut Context<Expr>) -> Result<Generated> {
        let list = block.generate_value("VALUE", ctx)?;
        Ok(Generated::Expression(Expr::member(list, "length")))
    }
}

#[derive(Debug, Default)]
pub struct IsEmpty;

impl BlockKind for IsEmpty {
    fn evaluate(&self, block: &Block, ctx: &mut Context<RuntimeValue>) -> Result<RuntimeValue> {
        Ok(RuntimeValue::Boolean(list_length(block, ctx)? == 0))
    }

    fn generate(&self, block: &Block, ctx: &mut Context<Expr>) -> Result<Generated> {
        let list = block.generate_value("VALUE", ctx)?;
        Ok(Generated::Expression(Expr::binary(
            BinaryOperator::Equal,
            Expr::member(list, "length"),
            Expr::Number(0.0),
        )))
    }
}
