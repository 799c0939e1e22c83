use crate::block::Block;
use crate::codegen::{BinaryOperator, Expr, Generated};
use crate::context::Context;
use crate::error::Result;
use crate::kinds::{BlockKind, mutation_count, unknown_option};
use crate::runtime_value::RuntimeValue;

fn display(block: &Block, name: &str, ctx: &mut Context<RuntimeValue>) -> Result<String> {
    Ok(block.evaluate_value(name, ctx)?.to_string())
}

fn generate_display(block: &Block, name: &str, ctx: &mut Context<Expr>) -> Result<Expr> {
    Ok(Expr::to_text(block.generate_value(name, ctx)?))
}

#[derive(Debug, Default)]
pub struct Text;

impl BlockKind for Text {
    fn evaluate(&self, block: &Block, _ctx: &mut Context<RuntimeValue>) -> Result<RuntimeValue> {
        Ok(RuntimeValue::Text(block.field("TEXT")?.to_string()))
    }

    fn generate(&self, block: &Block, _ctx: &mut Context<Expr>) -> Result<Generated> {
        Ok(Generated::Expression(Expr::Text(block.field("TEXT")?.to_string())))
    }
}

/// `text_join`: concatenates `ADD0..ADDn`, skipping empty slots.
#[derive(Debug, Default)]
pub struct Join;

impl BlockKind for Join {
    fn evaluate(&self, block: &Block, ctx: &mut Context<RuntimeValue>) -> Result<RuntimeValue> {
        let items = mutation_count(block, &["items"], 2)?;
        let mut joined = String::new();
        for i in 0..items {
            let name = format!("ADD{}", i);
            if block.value(&name)?.is_empty() {
                continue;
            }
            joined.push_str(&display(block, &name, ctx)?);
        }
        Ok(RuntimeValue::Text(joined))
    }

    fn generate(&self, block: &Block, ctx: &mut Context<Expr>) -> Result<Generated> {
        let items = mutation_count(block, &["items"], 2)?;
        let mut parts = Vec::new();
        for i in 0..items {
            let name = format!("ADD{}", i);
            if block.value(&name)?.is_empty() {
                continue;
            }
            parts.push(generate_display(block, &name, ctx)?);
        }
        let joined = parts
            .into_iter()
            .reduce(|left, right| Expr::binary(BinaryOperator::Add, left, right))
            .unwrap_or_else(|| Expr::Text(String::new()));
        Ok(Generated::Expression(joined))
    }
}

/// `text_append`: `VAR = display(VAR or "") + display(TEXT)`.
#[derive(Debug, Default)]
pub struct Append;

impl BlockKind for Append {
    fn evaluate(&self, block: &Block, ctx: &mut Context<RuntimeValue>) -> Result<RuntimeValue> {
        let variable = block.field("VAR")?;
        let suffix = display(block, "TEXT", ctx)?;
        let mut current = match ctx.get(variable) {
            None | Some(RuntimeValue::Null) => String::new(),
            Some(value) => value.to_string(),
        };
        current.push_str(&suffix);
        ctx.set(variable, RuntimeValue::Text(current));
        Ok(RuntimeValue::Null)
    }

    fn generate(&self, block: &Block, ctx: &mut Context<Expr>) -> Result<Generated> {
        let variable = block.field("VAR")?;
        let suffix = generate_display(block, "TEXT", ctx)?;
        let current = Expr::to_text(Expr::binary(
            BinaryOperator::Coalesce,
            Expr::variable(variable),
            Expr::Text(String::new()),
        ));
        let value = Expr::binary(BinaryOperator::Add, current, suffix);
        ctx.declare_root(variable, value.clone());
        Ok(Generated::Expression(Expr::assign(variable, value)))
    }
}

/// `text_length`: counted in UTF-16 units, as the generated target counts them.
#[derive(Debug, Default)]
pub struct Length;

impl BlockKind for Length {
    fn evaluate(&self, block: &Block, ctx: &mut Context<RuntimeValue>) -> Result<RuntimeValue> {
        let text = display(block, "VALUE", ctx)?;
        Ok(RuntimeValue::Number(text.encode_utf16().count() as f64))
    }

    fn generate(&self, block: &Block, ctx: &mut Context<Expr>) -> Result<Generated> {
        let text = generate_display(block, "VALUE", ctx)?;
        Ok(Generated::Expression(Expr::member(text, "length")))
    }
}

#[derive(Debug, Default)]
pub struct IsEmpty;

impl BlockKind for IsEmpty {
    fn evaluate(&self, block: &Block, ctx: &mut Context<RuntimeValue>) -> Result<RuntimeValue> {
        Ok(RuntimeValue::Boolean(display(block, "VALUE", ctx)?.is_empty()))
    }

    fn generate(&self, block: &Block, ctx: &mut Context<Expr>) -> Result<Generated> {
        let text = generate_display(block, "VALUE", ctx)?;
        Ok(Generated::Expression(Expr::binary(
            BinaryOperator::Equal,
            Expr::member(text, "length"),
            Expr::Number(0.0),
        )))
    }
}

/// Uppercase the first character of each whitespace-separated word and
/// lowercase the rest.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for c in text.chars() {
        if c.is_whitespace() {
            at_word_start = true;
            out.push(c);
        } else if at_word_start {
            at_word_start = false;
            out.extend(c.to_uppercase());
        } else {
            out.extend(c.to_lowercase());
        }
    }
    out
}

#[derive(Debug, Default)]
pub struct ChangeCase;

impl BlockKind for ChangeCase {
    fn evaluate(&self, block: &Block, ctx: &mut Context<RuntimeValue>) -> Result<RuntimeValue> {
        let case = block.field("CASE")?;
        let f: fn(&str) -> String = match case {
            "UPPERCASE" => str::to_uppercase,
            "LOWERCASE" => str::to_lowercase,
            "TITLECASE" => title_case,
            other => return Err(unknown_option(block, "CASE", other)),
        };
        Ok(RuntimeValue::Text(f(&display(block, "TEXT", ctx)?)))
    }

    fn generate(&self, block: &Block, ctx: &mut Context<Expr>) -> Result<Generated> {
        let case = block.field("CASE")?;
        if !matches!(case, "UPPERCASE" | "LOWERCASE" | "TITLECASE") {
            return Err(unknown_option(block, "CASE", case));
        }
        let text = generate_display(block, "TEXT", ctx)?;
        let expr = match case {
            "UPPERCASE" => Expr::method(text, "toUpperCase", Vec::new()),
            "LOWERCASE" => Expr::method(text, "toLowerCase", Vec::new()),
            _ => Expr::call("textToTitleCase", vec![text]),
        };
        Ok(Generated::Expression(expr))
    }
}

#[derive(Debug, Default)]
pub struct Trim;

impl BlockKind for Trim {
    fn evaluate(&self, block: &Block, ctx: &mut Context<RuntimeValue>) -> Result<RuntimeValue> {
        let mode = block.field("MODE")?;
        let f: fn(&str) -> &str = match mode {
            "BOTH" => str::trim,
            "LEFT" => str::trim_start,
            "RIGHT" => str::trim_end,
            other => return Err(unknown_option(block, "MODE", other)),
        };
        let text = display(block, "TEXT", ctx)?;
        Ok(RuntimeValue::Text(f(&text).to_string()))
    }

    fn generate(&self, block: &Block, ctx: &mut Context<Expr>) -> Result<Generated> {
        let method = match block.field("MODE")? {
            "BOTH" => "trim",
            "LEFT" => "trimStart",
            "RIGHT" => "trimEnd",
            other => return Err(unknown_option(block, "MODE", other)),
        };
        let text = generate_display(block, "TEXT", ctx)?;
        Ok(Generated::Expression(Expr::method(text, method, Vec::new())))
    }
}
