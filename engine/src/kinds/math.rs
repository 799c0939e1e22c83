use crate::block::Block;
use crate::codegen::{BinaryOperator, Expr, Generated, UnaryOperator};
use crate::context::Context;
use crate::error::{EngineError, Result};
use crate::kinds::{BlockKind, parse_number, unknown_option};
use crate::runtime_value::RuntimeValue;

fn number(block: &Block, name: &str, ctx: &mut Context<RuntimeValue>) -> Result<f64> {
    block.evaluate_value(name, ctx)?.as_number()
}

#[derive(Debug, Default)]
pub struct Number;

impl BlockKind for Number {
    fn evaluate(&self, block: &Block, _ctx: &mut Context<RuntimeValue>) -> Result<RuntimeValue> {
        parse_number(block.field("NUM")?).map(RuntimeValue::Number)
    }

    fn generate(&self, block: &Block, _ctx: &mut Context<Expr>) -> Result<Generated> {
        parse_number(block.field("NUM")?).map(|n| Generated::Expression(Expr::Number(n)))
    }
}

fn arithmetic_operator(block: &Block) -> Result<BinaryOperator> {
    Ok(match block.field("OP")? {
        "ADD" => BinaryOperator::Add,
        "MINUS" => BinaryOperator::Subtract,
        "MULTIPLY" => BinaryOperator::Multiply,
        "DIVIDE" => BinaryOperator::Divide,
        "POWER" => BinaryOperator::Power,
        other => return Err(unknown_option(block, "OP", other)),
    })
}

#[derive(Debug, Default)]
pub struct Arithmetic;

impl BlockKind for Arithmetic {
    fn evaluate(&self, block: &Block, ctx: &mut Context<RuntimeValue>) -> Result<RuntimeValue> {
        let op = arithmetic_operator(block)?;
        let a = number(block, "A", ctx)?;
        let b = number(block, "B", ctx)?;
        let result = match op {
            BinaryOperator::Add => a + b,
            BinaryOperator::Subtract => a - b,
            BinaryOperator::Multiply => a * b,
            BinaryOperator::Divide => a / b,
            _ => a.powf(b),
        };
        Ok(RuntimeValue::Number(result))
    }

    fn generate(&self, block: &Block, ctx: &mut Context<Expr>) -> Result<Generated> {
        let op = arithmetic_operator(block)?;
        let a = block.generate_value("A", ctx)?;
        let b = block.generate_value("B", ctx)?;
        Ok(Generated::Expression(Expr::binary(op, a, b)))
    }
}

/// `math_single`: one-argument functions on `NUM`.
#[derive(Debug, Default)]
pub struct Single;

impl BlockKind for Single {
    fn evaluate(&self, block: &Block, ctx: &mut Context<RuntimeValue>) -> Result<RuntimeValue> {
        let op = block.field("OP")?;
        let f: fn(f64) -> f64 = match op {
            "ROOT" => f64::sqrt,
            "ABS" => f64::abs,
            "NEG" => |x| -x,
            "LN" => f64::ln,
            "LOG10" => f64::log10,
            "EXP" => f64::exp,
            "POW10" => |x| 10f64.powf(x),
            other => return Err(unknown_option(block, "OP", other)),
        };
        Ok(RuntimeValue::Number(f(number(block, "NUM", ctx)?)))
    }

    fn generate(&self, block: &Block, ctx: &mut Context<Expr>) -> Result<Generated> {
        let op = block.field("OP")?;
        let function = match op {
            "ROOT" => "Math.sqrt",
            "ABS" => "Math.abs",
            "LN" => "Math.log",
            "LOG10" => "Math.log10",
            "EXP" => "Math.exp",
            "NEG" | "POW10" => "",
            other => return Err(unknown_option(block, "OP", other)),
        };
        let arg = block.generate_value("NUM", ctx)?;
        let expr = match op {
            "NEG" => Expr::unary(UnaryOperator::Negate, arg),
            "POW10" => Expr::binary(BinaryOperator::Power, Expr::Number(10.0), arg),
            _ => Expr::call(function, vec![arg]),
        };
        Ok(Generated::Expression(expr))
    }
}

/// `math_round`: ROUND rounds halves up, the way the generated target does.
#[derive(Debug, Default)]
pub struct Round;

impl BlockKind for Round {
    fn evaluate(&self, block: &Block, ctx: &mut Context<RuntimeValue>) -> Result<RuntimeValue> {
        let op = block.field("OP")?;
        let f: fn(f64) -> f64 = match op {
            "ROUND" => |x| (x + 0.5).floor(),
            "ROUNDUP" => f64::ceil,
            "ROUNDDOWN" => f64::floor,
            other => return Err(unknown_option(block, "OP", other)),
        };
        Ok(RuntimeValue::Number(f(number(block, "NUM", ctx)?)))
    }

    fn generate(&self, block: &Block, ctx: &mut Context<Expr>) -> Result<Generated> {
        let function = match block.field("OP")? {
            "ROUND" => "Math.round",
            "ROUNDUP" => "Math.ceil",
            "ROUNDDOWN" => "Math.floor",
            other => return Err(unknown_option(block, "OP", other)),
        };
        let arg = block.generate_value("NUM", ctx)?;
        Ok(Generated::Expression(Expr::call(function, vec![arg])))
    }
}

fn constant(block: &Block) -> Result<f64> {
    Ok(match block.field("CONSTANT")? {
        "PI" => std::f64::consts::PI,
        "E" => std::f64::consts::E,
        "GOLDEN_RATIO" => (1.0 + 5f64.sqrt()) / 2.0,
        "SQRT2" => std::f64::consts::SQRT_2,
        "SQRT1_2" => std::f64::consts::FRAC_1_SQRT_2,
        "INFINITY" => f64::INFINITY,
        other => return Err(unknown_option(block, "CONSTANT", other)),
    })
}

#[derive(Debug, Default)]
pub struct Constant;

impl BlockKind for Constant {
    fn evaluate(&self, block: &Block, _ctx: &mut Context<RuntimeValue>) -> Result<RuntimeValue> {
        constant(block).map(RuntimeValue::Number)
    }

    fn generate(&self, block: &Block, _ctx: &mut Context<Expr>) -> Result<Generated> {
        constant(block).map(|n| Generated::Expression(Expr::Number(n)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Property {
    Even,
    Odd,
    Prime,
    Whole,
    Positive,
    Negative,
    DivisibleBy,
}

impl Property {
    fn from_field(block: &Block) -> Result<Self> {
        Ok(match block.field("PROPERTY")? {
            "EVEN" => Property::Even,
            "ODD" => Property::Odd,
            "PRIME" => Property::Prime,
            "WHOLE" => Property::Whole,
            "POSITIVE" => Property::Positive,
            "NEGATIVE" => Property::Negative,
            "DIVISIBLE_BY" => Property::DivisibleBy,
            other => return Err(unknown_option(block, "PROPERTY", other)),
        })
    }
}

/// Trial division up to the integer square root.
pub fn is_prime(n: f64) -> bool {
    if n == 2.0 || n == 3.0 {
        return true;
    }
    if !n.is_finite() || n <= 1.0 || n.fract() != 0.0 || n % 2.0 == 0.0 {
        return false;
    }
    let limit = n.sqrt().floor();
    let mut divisor = 3.0;
    while divisor <= limit {
        if n % divisor == 0.0 {
            return false;
        }
        divisor += 2.0;
    }
    true
}

/// `math_number_property`. Remainders truncate toward zero, so `-3` is not odd.
#[derive(Debug, Default)]
pub struct NumberProperty;

impl BlockKind for NumberProperty {
    fn evaluate(&self, block: &Block, ctx: &mut Context<RuntimeValue>) -> Result<RuntimeValue> {
        let property = Property::from_field(block)?;
        let n = number(block, "NUMBER_TO_CHECK", ctx)?;
        let result = match property {
            Property::Even => n % 2.0 == 0.0,
            Property::Odd => n % 2.0 == 1.0,
            Property::Prime => is_prime(n),
            Property::Whole => n % 1.0 == 0.0,
            Property::Positive => n > 0.0,
            Property::Negative => n < 0.0,
            Property::DivisibleBy => n % number(block, "DIVISOR", ctx)? == 0.0,
        };
        Ok(RuntimeValue::Boolean(result))
    }

    fn generate(&self, block: &Block, ctx: &mut Context<Expr>) -> Result<Generated> {
        use BinaryOperator::*;

        let property = Property::from_field(block)?;
        let n = block.generate_value("NUMBER_TO_CHECK", ctx)?;
        let remainder_is = |n: Expr, divisor: Expr, expected: f64| {
            Expr::binary(Equal, Expr::binary(Modulo, n, divisor), Expr::Number(expected))
        };
        let expr = match property {
            Property::Prime => {
                return Err(EngineError::unsupported(
                    "the PRIME property of `math_number_property` has no generated form",
                ));
            }
            Property::Even => remainder_is(n, Expr::Number(2.0), 0.0),
            Property::Odd => remainder_is(n, Expr::Number(2.0), 1.0),
            Property::Whole => remainder_is(n, Expr::Number(1.0), 0.0),
            Property::Positive => Expr::binary(Greater, n, Expr::Number(0.0)),
            Property::Negative => Expr::binary(Less, n, Expr::Number(0.0)),
            Property::DivisibleBy => {
                let divisor = block.generate_value("DIVISOR", ctx)?;
                remainder_is(n, divisor, 0.0)
            }
        };
        Ok(Generated::Expression(expr))
    }
}

#[derive(Debug, Default)]
pub struct Modulo;

impl BlockKind for Modulo {
    fn evaluate(&self, block: &Block, ctx: &mut Context<RuntimeValue>) -> Result<RuntimeValue> {
        let dividend = number(block, "DIVIDEND", ctx)?;
        let divisor = number(block, "DIVISOR", ctx)?;
        Ok(RuntimeValue::Number(dividend % divisor))
    }

    fn generate(&self, block: &Block, ctx: &mut Context<Expr>) -> Result<Generated> {
        let dividend = block.generate_value("DIVIDEND", ctx)?;
        let divisor = block.generate_value("DIVISOR", ctx)?;
        Ok(Generated::Expression(Expr::binary(
            BinaryOperator::Modulo,
            dividend,
            divisor,
        )))
    }
}

#[derive(Debug, Default)]
pub struct Constrain;

impl BlockKind for Constrain {
    fn evaluate(&self, block: &Block, ctx: &mut Context<RuntimeValue>) -> Result<RuntimeValue> {
        let value = number(block, "VALUE", ctx)?;
        let low = number(block, "LOW", ctx)?;
        let high = number(block, "HIGH", ctx)?;
        Ok(RuntimeValue::Number(value.max(low).min(high)))
    }

    fn generate(&self, block: &Block, ctx: &mut Context<Expr>) -> Result<Generated> {
        let value = block.generate_value("VALUE", ctx)?;
        let low = block.generate_value("LOW", ctx)?;
        let high = block.generate_value("HIGH", ctx)?;
        Ok(Generated::Expression(Expr::call(
            "Math.min",
            vec![Expr::call("Math.max", vec![value, low]), high],
        )))
    }
}

/// `math_change`: adds `DELTA` to `VAR`, treating an unset variable as 0.
#[derive(Debug, Default)]
pub struct Change;

impl BlockKind for Change {
    fn evaluate(&self, block: &Block, ctx: &mut Context<RuntimeValue>) -> Result<RuntimeValue> {
        let variable = block.field("VAR")?;
        let delta = number(block, "DELTA", ctx)?;
        let current = match ctx.get(variable) {
            None | Some(RuntimeValue::Null) => 0.0,
            Some(value) => value.as_number()?,
        };
        ctx.set(variable, RuntimeValue::Number(current + delta));
        Ok(RuntimeValue::Null)
    }

    fn generate(&self, block: &Block, ctx: &mut Context<Expr>) -> Result<Generated> {
        use BinaryOperator::*;

        let variable = block.field("VAR")?;
        let delta = block.generate_value("DELTA", ctx)?;
        let current = Expr::conditional(
            Expr::binary(
                Equal,
                Expr::unary(UnaryOperator::TypeOf, Expr::variable(variable)),
                Expr::Text("number".to_string()),
            ),
            Expr::variable(variable),
            Expr::Number(0.0),
        );
        let value = Expr::binary(Add, current, delta);
        ctx.declare_root(variable, value.clone());
        Ok(Generated::Expression(Expr::assign(variable, value)))
    }
}
