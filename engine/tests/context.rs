mod common;

use common::*;
use engine::codegen::{Expr, Generated};
use engine::{Block, BlockKind, Context, EngineError, EscapeMode, Parser, Registry, RuntimeValue};
use serde_json::json;

#[test]
fn set_in_nested_context_updates_root_binding() {
    let mut ctx = Context::with_variables([("x".to_string(), RuntimeValue::from(1))]);
    ctx.push_scope();
    ctx.set("x", RuntimeValue::from(5));
    assert!(!ctx.current().contains("x"));
    ctx.pop_scope();

    // An unrelated nested context still sees the root binding.
    ctx.push_scope();
    ctx.push_scope();
    assert_eq!(ctx.get("x"), Some(&RuntimeValue::from(5)));
}

#[test]
fn lookups_skip_intermediate_contexts() {
    let mut ctx: Context<RuntimeValue> = Context::new();
    ctx.push_scope();
    ctx.set("loop_var", RuntimeValue::from(1));
    ctx.push_scope();
    assert_eq!(ctx.get("loop_var"), None);

    // A set from here creates a fresh binding instead of reaching the middle one.
    ctx.set("loop_var", RuntimeValue::from(2));
    ctx.pop_scope();
    assert_eq!(ctx.get("loop_var"), Some(&RuntimeValue::from(1)));
}

#[test]
fn new_names_land_in_current_context() {
    let mut ctx: Context<RuntimeValue> = Context::new();
    ctx.push_scope();
    ctx.set("temp", RuntimeValue::from(true));
    ctx.pop_scope();
    assert_eq!(ctx.get("temp"), None);
}

#[test]
fn root_is_never_popped() {
    let mut ctx: Context<RuntimeValue> = Context::new();
    assert!(ctx.pop_scope().is_none());
    assert_eq!(ctx.depth(), 0);
}

#[test]
fn branch_hands_escape_to_parent() {
    let mut ctx: Context<RuntimeValue> = Context::new();
    ctx.push_scope();
    ctx.in_branch(|ctx| {
        ctx.set_escape_mode(EscapeMode::Break);
        Ok(())
    })
    .expect("branch");
    assert_eq!(ctx.escape_mode(), EscapeMode::Break);
    assert_eq!(ctx.take_escape(), EscapeMode::Break);
    assert_eq!(ctx.escape_mode(), EscapeMode::None);
}

#[test]
fn loop_scope_keeps_its_escape() {
    let mut ctx: Context<RuntimeValue> = Context::new();
    ctx.in_loop(|ctx| {
        ctx.set_escape_mode(EscapeMode::Continue);
        Ok(())
    })
    .expect("loop");
    assert_eq!(ctx.escape_mode(), EscapeMode::None);
}

#[test]
fn into_variables_returns_root_bindings() {
    let mut ctx = Context::new();
    ctx.set("a", RuntimeValue::from(1));
    ctx.push_scope();
    ctx.set("b", RuntimeValue::from(2));
    let variables = ctx.into_variables();
    assert_eq!(variables.keys().collect::<Vec<_>>(), vec!["a"]);
}

/// A stand-in for `math_number` that always yields 42.
#[derive(Debug, Default)]
struct Answer;

impl BlockKind for Answer {
    fn evaluate(&self, _block: &Block, _ctx: &mut Context<RuntimeValue>) -> engine::Result<RuntimeValue> {
        Ok(RuntimeValue::from(42))
    }

    fn generate(&self, _block: &Block, _ctx: &mut Context<Expr>) -> engine::Result<Generated> {
        Ok(Generated::Expression(Expr::Number(42.0)))
    }
}

#[test]
fn registering_a_tag_again_replaces_it() {
    let mut registry = Registry::standard();
    assert!(registry.register_kind::<Answer>("math_number").is_some());
    assert!(registry.register_kind::<Answer>("answer").is_none());

    let graph = program(&["v"], vec![set("v", num(1.0))]);
    let workspace = Parser::new(&registry)
        .parse_json(&graph.to_string())
        .expect("parse");
    let execution = workspace.run(Vec::new()).expect("run");
    assert_eq!(execution.variables["v"], RuntimeValue::from(42));
}

#[test]
fn unknown_tag_fails_parse() {
    let graph = program(&[], vec![json!({ "type": "robot_move", "id": "r1" })]);
    assert_eq!(
        engine::parse_program(&graph.to_string()).unwrap_err(),
        EngineError::UnknownBlockKind("robot_move".to_string())
    );
}

#[test]
fn empty_registry_knows_nothing() {
    let registry = Registry::new();
    assert!(registry.is_empty());
    assert!(matches!(
        registry.create("text"),
        Err(EngineError::UnknownBlockKind(_))
    ));
}

#[test]
fn standard_registry_tags() {
    let registry = Registry::standard();
    for tag in [
        "controls_if",
        "controls_ifelse",
        "controls_repeat_ext",
        "controls_repeat",
        "controls_whileUntil",
        "controls_for",
        "controls_forEach",
        "controls_flow_statements",
        "logic_compare",
        "math_number_property",
        "text_join",
        "variables_get",
        "variables_set",
        "lists_create_with",
    ] {
        assert!(registry.contains(tag), "missing `{}`", tag);
    }
    let tags = registry.tags();
    assert!(tags.windows(2).all(|pair| pair[0] < pair[1]));
    assert_eq!(tags.len(), registry.len());
}
