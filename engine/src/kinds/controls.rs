use crate::block::Block;
use crate::codegen::{BinaryOperator, Expr, Generated, Stmt, UnaryOperator};
use crate::context::{Context, EscapeMode};
use crate::error::Result;
use crate::kinds::{BlockKind, mutation_count, mutation_flag, parse_number, unknown_option};
use crate::runtime_value::RuntimeValue;

/// `controls_if` / `controls_ifelse`: condition branches `IF<i>`/`DO<i>`
/// tested in order, then an optional `ELSE`.
#[derive(Debug, Default)]
pub struct If {
    always_else: bool,
}

impl If {
    /// The two-armed variant whose else branch is always present.
    pub fn with_else() -> Self {
        If { always_else: true }
    }

    fn shape(&self, block: &Block) -> Result<(usize, bool)> {
        let else_ifs = mutation_count(block, &["elseif", "elseIfCount"], 0)?;
        let has_else = self.always_else || mutation_flag(block, &["else", "hasElse"]);
        Ok((else_ifs + 1, has_else))
    }
}

impl BlockKind for If {
    fn evaluate(&self, block: &Block, ctx: &mut Context<RuntimeValue>) -> Result<RuntimeValue> {
        let (branches, has_else) = self.shape(block)?;
        for i in 0..branches {
            if block.evaluate_value(&format!("IF{}", i), ctx)?.as_condition()? {
                let body = format!("DO{}", i);
                ctx.in_branch(|ctx| block.evaluate_statement(&body, ctx))?;
                return Ok(RuntimeValue::Null);
            }
        }
        if has_else {
            ctx.in_branch(|ctx| block.evaluate_statement("ELSE", ctx))?;
        }
        Ok(RuntimeValue::Null)
    }

    fn generate(&self, block: &Block, ctx: &mut Context<Expr>) -> Result<Generated> {
        let (branches, has_else) = self.shape(block)?;
        let mut arms = Vec::with_capacity(branches);
        for i in 0..branches {
            let condition = block.generate_value(&format!("IF{}", i), ctx)?;
            let body = format!("DO{}", i);
            let then = ctx.in_branch(|ctx| block.generate_statement(&body, ctx))?;
            arms.push((condition, then));
        }
        let mut otherwise = if has_else {
            ctx.in_branch(|ctx| block.generate_statement("ELSE", ctx))?
        } else {
            Vec::new()
        };
        // Each arm's else is the conditional built for the arm after it.
        for (condition, then) in arms.into_iter().rev() {
            otherwise = vec![Stmt::If {
                condition,
                then,
                otherwise,
            }];
        }
        Ok(Generated::Statements(otherwise))
    }
}

#[derive(Debug, Clone, Copy)]
enum Times {
    Input,
    Field,
}

/// `controls_repeat_ext` (count from the `TIMES` input) and `controls_repeat`
/// (count from the `TIMES` field).
#[derive(Debug)]
pub struct Repeat {
    times: Times,
}

impl Repeat {
    pub fn from_input() -> Self {
        Repeat { times: Times::Input }
    }

    pub fn from_field() -> Self {
        Repeat { times: Times::Field }
    }
}

impl BlockKind for Repeat {
    fn evaluate(&self, block: &Block, ctx: &mut Context<RuntimeValue>) -> Result<RuntimeValue> {
        let times = match self.times {
            Times::Input => block.evaluate_value("TIMES", ctx)?.as_number()?,
            Times::Field => parse_number(block.field("TIMES")?)?,
        };
        ctx.in_loop(|ctx| {
            let mut count = 0.0;
            while count < times {
                block.evaluate_statement("DO", ctx)?;
                if ctx.take_escape() == EscapeMode::Break {
                    break;
                }
                count += 1.0;
            }
            Ok(RuntimeValue::Null)
        })
    }

    fn generate(&self, block: &Block, ctx: &mut Context<Expr>) -> Result<Generated> {
        let counter = format!("count{}", ctx.depth());
        let limit = match self.times {
            Times::Input => block.generate_value("TIMES", ctx)?,
            Times::Field => Expr::Number(parse_number(block.field("TIMES")?)?),
        };

        let mut statements = Vec::new();
        let limit = if matches!(limit, Expr::Number(_)) {
            limit
        } else {
            let end = format!("{}_end", counter);
            ctx.declare_root(&end, limit.clone());
            statements.push(Stmt::Expr(Expr::assign(&end, limit)));
            Expr::variable(end)
        };
        ctx.declare_root(&counter, Expr::Number(0.0));

        let body = ctx.in_loop(|ctx| block.generate_statement("DO", ctx))?;
        statements.push(Stmt::For {
            init: Expr::assign(&counter, Expr::Number(0.0)),
            condition: Expr::binary(BinaryOperator::Less, Expr::variable(&counter), limit),
            update: Expr::assign(
                &counter,
                Expr::binary(BinaryOperator::Add, Expr::variable(&counter), Expr::Number(1.0)),
            ),
            body,
        });
        Ok(Generated::Statements(statements))
    }
}

/// `controls_whileUntil`. Only the `WHILE` mode honours Break.
#[derive(Debug, Default)]
pub struct WhileUntil;

impl BlockKind for WhileUntil {
    fn evaluate(&self, block: &Block, ctx: &mut Context<RuntimeValue>) -> Result<RuntimeValue> {
        match block.field("MODE")? {
            "WHILE" => ctx.in_loop(|ctx| {
                while block.evaluate_value("BOOL", ctx)?.as_condition()? {
                    block.evaluate_statement("DO", ctx)?;
                    if ctx.take_escape() == EscapeMode::Break {
                        break;
                    }
                }
                Ok(RuntimeValue::Null)
            }),
            "UNTIL" => ctx.in_loop(|ctx| {
                while !block.evaluate_value("BOOL", ctx)?.as_condition()? {
                    block.evaluate_statement("DO", ctx)?;
                }
                Ok(RuntimeValue::Null)
            }),
            other => Err(unknown_option(block, "MODE", other)),
        }
    }

    fn generate(&self, block: &Block, ctx: &mut Context<Expr>) -> Result<Generated> {
        let until = match block.field("MODE")? {
            "WHILE" => false,
            "UNTIL" => true,
            other => return Err(unknown_option(block, "MODE", other)),
        };
        let condition = block.generate_value("BOOL", ctx)?;
        let condition = if until {
            Expr::unary(UnaryOperator::Not, condition)
        } else {
            condition
        };
        let body = ctx.in_loop(|ctx| block.generate_statement("DO", ctx))?;
        Ok(Generated::statement(Stmt::While { condition, body }))
    }
}

/// `controls_for`: counts `VAR` from `FROM` to `TO` by `abs(BY)`, stepping
/// down when the range runs backwards.
#[derive(Debug, Default)]
pub struct For;

impl BlockKind for For {
    fn evaluate(&self, block: &Block, ctx: &mut Context<RuntimeValue>) -> Result<RuntimeValue> {
        let variable = block.field("VAR")?;
        let start = block.evaluate_value("FROM", ctx)?.as_number()?;
        let end = block.evaluate_value("TO", ctx)?.as_number()?;
        let mut step = block.evaluate_value("BY", ctx)?.as_number()?.abs();
        if start > end {
            step = -step;
        }

        ctx.in_loop(|ctx| {
            ctx.set(variable, RuntimeValue::Number(start));
            loop {
                let current = current_number(ctx, variable)?;
                let within = if step >= 0.0 {
                    current <= end
                } else {
                    current >= end
                };
                if !within {
                    break;
                }
                block.evaluate_statement("DO", ctx)?;
                if ctx.take_escape() == EscapeMode::Break {
                    break;
                }
                let current = current_number(ctx, variable)?;
                ctx.set(variable, RuntimeValue::Number(current + step));
            }
            Ok(RuntimeValue::Null)
        })
    }

    fn generate(&self, block: &Block, ctx: &mut Context<Expr>) -> Result<Generated> {
        use BinaryOperator::*;

        let variable = block.field("VAR")?;
        let from = block.generate_value("FROM", ctx)?;
        let to = block.generate_value("TO", ctx)?;
        let by = block.generate_value("BY", ctx)?;

        let start = format!("{}_start", variable);
        let end = format!("{}_end", variable);
        let inc = format!("{}_inc", variable);
        for (name, value) in [(&start, &from), (&end, &to), (&inc, &by)] {
            ctx.declare_root(name, value.clone());
        }
        ctx.declare_root(variable, Expr::variable(&start));

        let mut statements = vec![
            Stmt::Expr(Expr::assign(&start, from)),
            Stmt::Expr(Expr::assign(&end, to)),
            Stmt::Expr(Expr::assign(&inc, Expr::call("Math.abs", vec![by]))),
            Stmt::If {
                condition: Expr::binary(Greater, Expr::variable(&start), Expr::variable(&end)),
                then: vec![Stmt::Expr(Expr::assign(
                    &inc,
                    Expr::unary(UnaryOperator::Negate, Expr::variable(&inc)),
                ))],
                otherwise: Vec::new(),
            },
        ];

        let body = ctx.in_loop(|ctx| block.generate_statement("DO", ctx))?;
        statements.push(Stmt::For {
            init: Expr::assign(variable, Expr::variable(&start)),
            condition: Expr::conditional(
                Expr::binary(GreaterOrEqual, Expr::variable(&inc), Expr::Number(0.0)),
                Expr::binary(LessOrEqual, Expr::variable(variable), Expr::variable(&end)),
                Expr::binary(GreaterOrEqual, Expr::variable(variable), Expr::variable(&end)),
            ),
            update: Expr::assign(
                variable,
                Expr::binary(Add, Expr::variable(variable), Expr::variable(&inc)),
            ),
            body,
        });
        Ok(Generated::Statements(statements))
    }
}

fn current_number(ctx: &Context<RuntimeValue>, name: &str) -> Result<f64> {
    ctx.get(name).cloned().unwrap_or_default().as_number()
}

/// `controls_forEach`: binds each element of `LIST` to `VAR`.
#[derive(Debug, Default)]
pub struct ForEach;

impl BlockKind for ForEach {
    fn evaluate(&self, block: &Block, ctx: &mut Context<RuntimeValue>) -> Result<RuntimeValue> {
        let variable = block.field("VAR")?;
        let items = match block.evaluate_value("LIST", ctx)? {
            RuntimeValue::List(items) => items,
            other => other.as_list()?.to_vec(),
        };
        ctx.in_loop(|ctx| {
            for item in items {
                ctx.set(variable, item);
                block.evaluate_statement("DO", ctx)?;
                if ctx.take_escape() == EscapeMode::Break {
                    break;
                }
            }
            Ok(RuntimeValue::Null)
        })
    }

    fn generate(&self, block: &Block, ctx: &mut Context<Expr>) -> Result<Generated> {
        let variable = block.field("VAR")?;
        let sequence = block.generate_value("LIST", ctx)?;
        ctx.declare_root(variable, Expr::Null);
        let body = ctx.in_loop(|ctx| block.generate_statement("DO", ctx))?;
        Ok(Generated::statement(Stmt::ForEach {
            variable: variable.to_string(),
            sequence,
            body,
        }))
    }
}

/// `controls_flow_statements`: raises Break or Continue.
#[derive(Debug, Default)]
pub struct Flow;

impl BlockKind for Flow {
    fn evaluate(&self, block: &Block, ctx: &mut Context<RuntimeValue>) -> Result<RuntimeValue> {
        let mode = match block.field("FLOW")? {
            "BREAK" => EscapeMode::Break,
            "CONTINUE" => EscapeMode::Continue,
            other => return Err(unknown_option(block, "FLOW", other)),
        };
        ctx.set_escape_mode(mode);
        Ok(RuntimeValue::Null)
    }

    fn generate(&self, block: &Block, _ctx: &mut Context<Expr>) -> Result<Generated> {
        match block.field("FLOW")? {
            "BREAK" => Ok(Generated::statement(Stmt::Break)),
            "CONTINUE" => Ok(Generated::statement(Stmt::Continue)),
            other => Err(unknown_option(block, "FLOW", other)),
        }
    }
}
