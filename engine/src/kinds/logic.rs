use std::cmp::Ordering;

use crate::block::Block;
use crate::codegen::{BinaryOperator, Expr, Generated, UnaryOperator};
use crate::context::Context;
use crate::error::{EngineError, Result};
use crate::kinds::{BlockKind, unknown_option};
use crate::runtime_value::RuntimeValue;

#[derive(Debug, Default)]
pub struct Boolean;

fn boolean_field(block: &Block) -> Result<bool> {
    let raw = block.field("BOOL")?;
    if raw.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if raw.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(EngineError::type_mismatch("TRUE or FALSE", format!("`{}`", raw)))
    }
}

impl BlockKind for Boolean {
    fn evaluate(&self, block: &Block, _ctx: &mut Context<RuntimeValue>) -> Result<RuntimeValue> {
        boolean_field(block).map(RuntimeValue::Boolean)
    }

    fn generate(&self, block: &Block, _ctx: &mut Context<Expr>) -> Result<Generated> {
        boolean_field(block).map(|b| Generated::Expression(Expr::Boolean(b)))
    }
}

#[derive(Debug, Default)]
pub struct Null;

impl BlockKind for Null {
    fn evaluate(&self, _block: &Block, _ctx: &mut Context<RuntimeValue>) -> Result<RuntimeValue> {
        Ok(RuntimeValue::Null)
    }

    fn generate(&self, _block: &Block, _ctx: &mut Context<Expr>) -> Result<Generated> {
        Ok(Generated::Expression(Expr::Null))
    }
}

#[derive(Debug, Default)]
pub struct Negate;

impl BlockKind for Negate {
    fn evaluate(&self, block: &Block, ctx: &mut Context<RuntimeValue>) -> Result<RuntimeValue> {
        let value = block.evaluate_value("BOOL", ctx)?.as_condition()?;
        Ok(RuntimeValue::Boolean(!value))
    }

    fn generate(&self, block: &Block, ctx: &mut Context<Expr>) -> Result<Generated> {
        let operand = block.generate_value("BOOL", ctx)?;
        Ok(Generated::Expression(Expr::unary(UnaryOperator::Not, operand)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Comparison {
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl Comparison {
    fn from_field(block: &Block) -> Result<Self> {
        Ok(match block.field("OP")? {
            "EQ" => Comparison::Eq,
            "NEQ" => Comparison::Neq,
            "LT" => Comparison::Lt,
            "LTE" => Comparison::Lte,
            "GT" => Comparison::Gt,
            "GTE" => Comparison::Gte,
            other => return Err(unknown_option(block, "OP", other)),
        })
    }

    fn operator(self) -> BinaryOperator {
        match self {
            Comparison::Eq => BinaryOperator::Equal,
            Comparison::Neq => BinaryOperator::NotEqual,
            Comparison::Lt => BinaryOperator::Less,
            Comparison::Lte => BinaryOperator::LessOrEqual,
            Comparison::Gt => BinaryOperator::Greater,
            Comparison::Gte => BinaryOperator::GreaterOrEqual,
        }
    }
}

/// Ordering of two numbers or two texts; `None` when a NaN is involved.
fn order(a: &RuntimeValue, b: &RuntimeValue) -> Result<Option<Ordering>> {
    match (a, b) {
        (RuntimeValue::Number(x), RuntimeValue::Number(y)) => Ok(x.partial_cmp(y)),
        (RuntimeValue::Text(x), RuntimeValue::Text(y)) => Ok(Some(x.cmp(y))),
        (a, b) => Err(EngineError::type_mismatch(
            "two Numbers or two Texts",
            format!("{} and {}", a.type_name(), b.type_name()),
        )),
    }
}

#[derive(Debug, Default)]
pub struct Compare;

impl BlockKind for Compare {
    fn evaluate(&self, block: &Block, ctx: &mut Context<RuntimeValue>) -> Result<RuntimeValue> {
        let comparison = Comparison::from_field(block)?;
        let a = block.evaluate_value("A", ctx)?;
        let b = block.evaluate_value("B", ctx)?;
        let result = match comparison {
            Comparison::Eq => a == b,
            Comparison::Neq => a != b,
            Comparison::Lt => order(&a, &b)? == Some(Ordering::Less),
            Comparison::Lte => matches!(order(&a, &b)?, Some(Ordering::Less | Ordering::Equal)),
            Comparison::Gt => order(&a, &b)? == Some(Ordering::Greater),
            Comparison::Gte => matches!(order(&a, &b)?, Some(Ordering::Greater | Ordering::Equal)),
        };
        Ok(RuntimeValue::Boolean(result))
    }

    fn generate(&self, block: &Block, ctx: &mut Context<Expr>) -> Result<Generated> {
        let comparison = Comparison::from_field(block)?;
        let a = block.generate_value("A", ctx)?;
        let b = block.generate_value("B", ctx)?;
        Ok(Generated::Expression(Expr::binary(comparison.operator(), a, b)))
    }
}

/// `logic_operation`: AND / OR with short-circuiting.
#[derive(Debug, Default)]
pub struct Operation;

fn is_and(block: &Block) -> Result<bool> {
    match block.field("OP")? {
        "AND" => Ok(true),
        "OR" => Ok(false),
        other => Err(unknown_option(block, "OP", other)),
    }
}

impl BlockKind for Operation {
    fn evaluate(&self, block: &Block, ctx: &mut Context<RuntimeValue>) -> Result<RuntimeValue> {
        let and = is_and(block)?;
        let a = block.evaluate_value("A", ctx)?.as_condition()?;
        let result = if and == a {
            block.evaluate_value("B", ctx)?.as_condition()?
        } else {
            a
        };
        Ok(RuntimeValue::Boolean(result))
    }

    fn generate(&self, block: &Block, ctx: &mut Context<Expr>) -> Result<Generated> {
        let op = if is_and(block)? {
            BinaryOperator::And
        } else {
            BinaryOperator::Or
        };
        let a = block.generate_value("A", ctx)?;
        let b = block.generate_value("B", ctx)?;
        Ok(Generated::Expression(Expr::binary(op, a, b)))
    }
}

/// `logic_ternary`: only the selected arm runs.
#[derive(Debug, Default)]
pub struct Ternary;

impl BlockKind for Ternary {
    fn evaluate(&self, block: &Block, ctx: &mut Context<RuntimeValue>) -> Result<RuntimeValue> {
        if block.evaluate_value("IF", ctx)?.as_condition()? {
            block.evaluate_value("THEN", ctx)
        } else {
            block.evaluate_value("ELSE", ctx)
        }
    }

    fn generate(&self, block: &Block, ctx: &mut Context<Expr>) -> Result<Generated> {
        let condition = block.generate_value("IF", ctx)?;
        let then = block.generate_value("THEN", ctx)?;
        let otherwise = block.generate_value("ELSE", ctx)?;
        Ok(Generated::Expression(Expr::conditional(condition, then, otherwise)))
    }
}
