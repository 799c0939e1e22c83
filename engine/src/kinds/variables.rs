use crate::block::Block;
use crate::codegen::{Expr, Generated};
use crate::context::Context;
use crate::error::Result;
use crate::kinds::BlockKind;
use crate::runtime_value::RuntimeValue;

/// `variables_get`: an unbound name reads as null.
#[derive(Debug, Default)]
pub struct Get;

impl BlockKind for Get {
    fn evaluate(&self, block: &Block, ctx: &mut Context<RuntimeValue>) -> Result<RuntimeValue> {
        let name = block.field("VAR")?;
        Ok(ctx.get(name).cloned().unwrap_or_default())
    }

    fn generate(&self, block: &Block, _ctx: &mut Context<Expr>) -> Result<Generated> {
        Ok(Generated::Expression(Expr::variable(block.field("VAR")?)))
    }
}

#[derive(Debug, Default)]
pub struct Set;

impl BlockKind for Set {
    fn evaluate(&self, block: &Block, ctx: &mut Context<RuntimeValue>) -> Result<RuntimeValue> {
        let name = block.field("VAR")?;
        let value = block.evaluate_value("VALUE", ctx)?;
        ctx.set(name, value);
        Ok(RuntimeValue::Null)
    }

    fn generate(&self, block: &Block, ctx: &mut Context<Expr>) -> Result<Generated> {
        let name = block.field("VAR")?;
        let value = block.generate_value("VALUE", ctx)?;
        ctx.declare_root(name, value.clone());
        Ok(Generated::Expression(Expr::assign(name, value)))
    }
}
