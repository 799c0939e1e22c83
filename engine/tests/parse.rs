mod common;

use common::*;
use engine::{EngineError, Parser, Registry, RuntimeValue, Workspace};
use graph::{BlockEntry, SerializedGraph, VariableDeclaration};
use serde_json::json;

fn parse(value: &serde_json::Value) -> Result<Workspace, EngineError> {
    engine::parse_program(&value.to_string())
}

fn malformed(value: serde_json::Value) -> String {
    match parse(&value) {
        Err(EngineError::MalformedGraph(message)) => message,
        other => panic!("expected a malformed graph, got {:?}", other),
    }
}

#[test]
fn declared_globals_are_prepended() {
    let graph = json!({
        "blocks": [set("y", num(1.0))],
        "variables": [{ "name": "x", "id": "var-x" }, { "name": "y" }]
    });
    let workspace = parse(&graph).expect("parse");
    assert_eq!(workspace.len(), 3);

    let first = &workspace.blocks()[0];
    assert_eq!(first.block_type, "variables_set");
    assert_eq!(first.id, "var-x");
    assert_eq!(first.field("VAR"), Ok("x"));
    let value = first.value("VALUE").expect("value slot");
    assert_eq!(
        value.block.as_ref().map(|b| b.block_type.as_str()),
        Some("variables_get")
    );

    assert_eq!(workspace.blocks()[1].id, "global:y");
    assert_eq!(workspace.blocks()[2].block_type, "variables_set");
}

#[test]
fn declared_globals_default_to_null() {
    let graph = program(&["x"], vec![]);
    let execution = parse(&graph).expect("parse").run(Vec::new()).expect("run");
    assert_eq!(execution.variables["x"], RuntimeValue::Null);
}

#[test]
fn variable_references_resolve_by_id_or_name() {
    let graph = json!({
        "blocks": [
            {
                "type": "variables_set",
                "fields": { "VAR": { "id": "var-1" } },
                "inputs": [slot("VALUE", num(3.0))]
            },
            {
                "type": "variables_set",
                "fields": { "VAR": { "name": "other" } },
                "inputs": [slot("VALUE", num(4.0))]
            }
        ],
        "variables": [{ "name": "count", "id": "var-1" }]
    });
    let execution = parse(&graph).expect("parse").run(Vec::new()).expect("run");
    assert_eq!(execution.variables["count"], RuntimeValue::from(3));
    assert_eq!(execution.variables["other"], RuntimeValue::from(4));
}

#[test]
fn unresolved_variable_id_is_malformed() {
    let message = malformed(json!({
        "blocks": [{ "type": "variables_get", "id": "g", "fields": { "VAR": { "id": "nope" } } }]
    }));
    assert!(message.contains("nope"), "{}", message);
}

#[test]
fn field_scalars_are_stringified() {
    let graph = json!({
        "blocks": [{
            "type": "logic_boolean",
            "fields": { "BOOL": true, "EXTRA": 2.5 }
        }]
    });
    let workspace = parse(&graph).expect("parse");
    let block = &workspace.blocks()[0];
    assert_eq!(block.field("BOOL"), Ok("TRUE"));
    assert_eq!(block.field("EXTRA"), Ok("2.5"));
}

#[test]
fn mutations_keep_their_domain() {
    let graph = json!({
        "blocks": [{
            "type": "controls_if",
            "mutation": {
                "elseif": 2,
                "else": true,
                "editor": { "collapsed": false, "shape": "round" },
                "order": [1, 2]
            }
        }]
    });
    let workspace = parse(&graph).expect("parse");
    let block = &workspace.blocks()[0];
    assert_eq!(block.mutation("mutation", "elseif"), Some("2"));
    assert_eq!(block.mutation("mutation", "else"), Some("true"));
    assert_eq!(block.mutation("editor", "shape"), Some("round"));
    assert_eq!(block.mutation("editor", "collapsed"), Some("false"));
    assert_eq!(block.mutation("mutation", "order"), Some("[1,2]"));
    assert_eq!(block.mutation("mutation", "shape"), None);
    assert!(matches!(
        block.require_mutation("mutation", "items"),
        Err(EngineError::MissingNamedSlot { .. })
    ));
}

#[test]
fn comments_and_slots_are_recorded() {
    let graph = json!({
        "blocks": [{
            "type": "controls_repeat_ext",
            "id": "loop",
            "comment": "runs twice",
            "inputs": [{ "name": "TIMES", "shadow": num(2.0) }],
            "statements": [{ "name": "DO" }]
        }]
    });
    let workspace = parse(&graph).expect("parse");
    let block = &workspace.blocks()[0];
    assert_eq!(block.comments[0].text, "runs twice");
    assert!(!block.value("TIMES").expect("TIMES").is_empty());
    assert!(block.statement("DO").expect("DO").block.is_none());
    assert!(block.body("DO").is_none());
    assert!(matches!(
        block.statement("ELSE"),
        Err(EngineError::MissingNamedSlot { .. })
    ));
}

#[test]
fn empty_type_is_malformed() {
    malformed(json!({ "blocks": [{ "type": "", "id": "x" }] }));
}

#[test]
fn empty_slot_name_is_malformed() {
    malformed(json!({
        "blocks": [{ "type": "logic_negate", "inputs": [{ "name": "" }] }]
    }));
}

#[test]
fn duplicate_slot_is_malformed() {
    let message = malformed(json!({
        "blocks": [{
            "type": "math_arithmetic",
            "id": "dup",
            "fields": { "OP": "ADD" },
            "inputs": [slot("A", num(1.0)), slot("A", num(2.0))]
        }]
    }));
    assert!(message.contains("`A`"), "{}", message);
}

#[test]
fn invalid_json_is_malformed_with_position() {
    let message = match engine::parse_program("{ \"blocks\": [ { \"type\": } ] }") {
        Err(EngineError::MalformedGraph(message)) => message,
        other => panic!("unexpected {:?}", other),
    };
    assert!(message.contains("line 1"), "{}", message);
}

#[test]
fn missing_type_is_malformed() {
    let message = match engine::parse_program(r#"{ "blocks": [ { "id": "a" } ] }"#) {
        Err(EngineError::MalformedGraph(message)) => message,
        other => panic!("unexpected {:?}", other),
    };
    assert!(message.contains("type"), "{}", message);
}

#[test]
fn parsing_twice_is_deterministic() {
    let graph = program(
        &["n", "s"],
        vec![
            repeat(num(4.0), change("n", 2.0)),
            json!({
                "type": "text_append",
                "fields": { "VAR": "s" },
                "inputs": [slot("TEXT", get("n"))]
            }),
        ],
    );
    let first = parse(&graph).expect("parse");
    let second = parse(&graph).expect("parse");
    assert_eq!(
        first.run(Vec::new()).expect("run"),
        second.run(Vec::new()).expect("run")
    );
    assert_eq!(first.compile().expect("compile"), second.compile().expect("compile"));
}

#[test]
fn long_chains_do_not_recurse() {
    const LENGTH: usize = 2_000;
    let step = || {
        BlockEntry::new("math_change")
            .with_field("VAR", "n")
            .with_input(
                "DELTA",
                BlockEntry::new("math_number").with_field("NUM", 1),
            )
    };
    let mut head = step();
    for _ in 1..LENGTH {
        head = step().with_next(head);
    }
    let graph = SerializedGraph {
        blocks: vec![head],
        variables: vec![VariableDeclaration {
            name: "n".to_string(),
            id: None,
            kind: None,
        }],
    };

    let registry = Registry::standard();
    let workspace = Parser::new(&registry).parse(&graph).expect("parse");
    assert_eq!(workspace.blocks()[1].chain().count(), LENGTH);
    let execution = workspace.run(Vec::new()).expect("run");
    assert_eq!(execution.variables["n"], RuntimeValue::from(LENGTH as f64));
    assert_eq!(workspace.compile().expect("compile").body.len(), LENGTH + 1);
}

#[test]
fn long_chains_load_from_json() {
    let blocks: Vec<_> = (0..300).map(|_| change("n", 1.0)).collect();
    let graph = program(&["n"], vec![chain(blocks)]);
    assert_eq!(binding(&graph, "n"), RuntimeValue::from(300));
}

#[test]
fn hundred_thousand_block_chain_runs_and_compiles() {
    const LENGTH: usize = 100_000;
    let link = r#"{"type":"math_change","fields":{"VAR":"n"},"inputs":[{"name":"DELTA","block":{"type":"math_number","fields":{"NUM":1}}}],"next":"#;
    let mut json = String::from(r#"{"variables":[{"name":"n"}],"blocks":["#);
    for _ in 1..LENGTH {
        json.push_str(link);
    }
    json.push_str(r#"{"type":"logic_null"}"#);
    json.push_str(&"}".repeat(LENGTH - 1));
    json.push_str("]}");

    let workspace = engine::parse_program(&json).expect("parse");
    assert_eq!(workspace.blocks()[1].chain().count(), LENGTH);
    let execution = workspace.run(Vec::new()).expect("run");
    assert_eq!(execution.variables["n"], RuntimeValue::from((LENGTH - 1) as f64));
    let source = engine::codegen::emit::emit_program(&workspace.compile().expect("compile"));
    assert_eq!(source.lines().count(), LENGTH + 3);
}
