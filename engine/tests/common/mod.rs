#![allow(dead_code)]

use engine::codegen::{BinaryOperator, Expr, Program, Stmt, UnaryOperator};
use engine::{EngineError, Execution, RuntimeValue};
use indexmap::IndexMap;
use serde_json::{Value, json};

// Program builders.

pub fn program(variables: &[&str], chains: Vec<Value>) -> Value {
    let variables: Vec<Value> = variables.iter().map(|name| json!({ "name": name })).collect();
    json!({ "blocks": chains, "variables": variables })
}

/// Link blocks through `next`, first to last.
pub fn chain(blocks: Vec<Value>) -> Value {
    let mut reversed = blocks.into_iter().rev();
    let mut next = reversed.next().expect("a chain needs at least one block");
    for mut block in reversed {
        block["next"] = next;
        next = block;
    }
    next
}

pub fn slot(name: &str, block: Value) -> Value {
    json!({ "name": name, "block": block })
}

pub fn num(n: f64) -> Value {
    json!({ "type": "math_number", "fields": { "NUM": n } })
}

pub fn text(s: &str) -> Value {
    json!({ "type": "text", "fields": { "TEXT": s } })
}

pub fn boolean(b: bool) -> Value {
    json!({ "type": "logic_boolean", "fields": { "BOOL": if b { "TRUE" } else { "FALSE" } } })
}

pub fn get(name: &str) -> Value {
    json!({ "type": "variables_get", "fields": { "VAR": name } })
}

pub fn set(name: &str, value: Value) -> Value {
    json!({
        "type": "variables_set",
        "fields": { "VAR": name },
        "inputs": [slot("VALUE", value)]
    })
}

pub fn change(name: &str, delta: f64) -> Value {
    json!({
        "type": "math_change",
        "fields": { "VAR": name },
        "inputs": [slot("DELTA", num(delta))]
    })
}

pub fn arithmetic(op: &str, a: Value, b: Value) -> Value {
    json!({
        "type": "math_arithmetic",
        "fields": { "OP": op },
        "inputs": [slot("A", a), slot("B", b)]
    })
}

pub fn compare(op: &str, a: Value, b: Value) -> Value {
    json!({
        "type": "logic_compare",
        "fields": { "OP": op },
        "inputs": [slot("A", a), slot("B", b)]
    })
}

pub fn flow(mode: &str) -> Value {
    json!({ "type": "controls_flow_statements", "fields": { "FLOW": mode } })
}

pub fn if_then(condition: Value, body: Value) -> Value {
    json!({
        "type": "controls_if",
        "inputs": [slot("IF0", condition)],
        "statements": [slot("DO0", body)]
    })
}

pub fn repeat(times: Value, body: Value) -> Value {
    json!({
        "type": "controls_repeat_ext",
        "inputs": [slot("TIMES", times)],
        "statements": [slot("DO", body)]
    })
}

pub fn while_until(mode: &str, condition: Value, body: Value) -> Value {
    json!({
        "type": "controls_whileUntil",
        "fields": { "MODE": mode },
        "inputs": [slot("BOOL", condition)],
        "statements": [slot("DO", body)]
    })
}

pub fn number_property(property: &str, n: f64) -> Value {
    json!({
        "type": "math_number_property",
        "fields": { "PROPERTY": property },
        "inputs": [slot("NUMBER_TO_CHECK", num(n))]
    })
}

// Running.

pub fn run(program: &Value) -> Result<Execution, EngineError> {
    engine::execute_program(&program.to_string(), Vec::new())
}

pub fn bindings(program: &Value) -> IndexMap<String, RuntimeValue> {
    run(program).expect("program failed").variables
}

pub fn binding(program: &Value, name: &str) -> RuntimeValue {
    bindings(program)
        .get(name)
        .cloned()
        .unwrap_or_else(|| panic!("`{}` is not bound", name))
}

pub fn compile(program: &Value) -> Result<Program, EngineError> {
    engine::parse_program(&program.to_string())?.compile()
}

pub fn source(program: &Value) -> String {
    engine::generate_program(&program.to_string()).expect("generation failed")
}

/// Interpret `program`, execute its generated form, and require the same
/// final value for every root binding the interpreter produced.
pub fn assert_parity(program: &Value) {
    let interpreted = bindings(program);
    let generated = execute(&compile(program).expect("generation failed"));
    for (name, value) in &interpreted {
        let target = generated
            .get(name)
            .cloned()
            .map(JsValue::into_runtime)
            .unwrap_or_default();
        assert_eq!(&target, value, "binding `{}` differs", name);
    }
}

// A small executor for generated programs, following the target's semantics.

const ITERATION_LIMIT: usize = 100_000;

#[derive(Debug, Clone, PartialEq)]
pub enum JsValue {
    Undefined,
    Null,
    Boolean(bool),
    Number(f64),
    Text(String),
    List(Vec<JsValue>),
}

impl JsValue {
    pub fn into_runtime(self) -> RuntimeValue {
        match self {
            JsValue::Undefined | JsValue::Null => RuntimeValue::Null,
            JsValue::Boolean(b) => RuntimeValue::Boolean(b),
            JsValue::Number(n) => RuntimeValue::Number(n),
            JsValue::Text(s) => RuntimeValue::Text(s),
            JsValue::List(items) => {
                RuntimeValue::List(items.into_iter().map(JsValue::into_runtime).collect())
            }
        }
    }

    fn truthy(&self) -> bool {
        match self {
            JsValue::Undefined | JsValue::Null => false,
            JsValue::Boolean(b) => *b,
            JsValue::Number(n) => *n != 0.0 && !n.is_nan(),
            JsValue::Text(s) => !s.is_empty(),
            JsValue::List(_) => true,
        }
    }

    fn number(&self) -> f64 {
        match self {
            JsValue::Undefined => f64::NAN,
            JsValue::Null => 0.0,
            JsValue::Boolean(b) => f64::from(u8::from(*b)),
            JsValue::Number(n) => *n,
            JsValue::Text(s) if s.trim().is_empty() => 0.0,
            JsValue::Text(s) => s.trim().parse().unwrap_or(f64::NAN),
            JsValue::List(_) => f64::NAN,
        }
    }

    fn display(&self) -> String {
        match self {
            JsValue::Undefined => "undefined".to_string(),
            JsValue::List(items) => items
                .iter()
                .map(|item| match item {
                    JsValue::Undefined | JsValue::Null => String::new(),
                    other => other.display(),
                })
                .collect::<Vec<_>>()
                .join(","),
            other => other.clone().into_runtime().to_string(),
        }
    }

    fn type_of(&self) -> &'static str {
        match self {
            JsValue::Undefined => "undefined",
            JsValue::Boolean(_) => "boolean",
            JsValue::Number(_) => "number",
            JsValue::Text(_) => "string",
            JsValue::Null | JsValue::List(_) => "object",
        }
    }
}

enum Signal {
    Normal,
    Break,
    Continue,
}

pub fn execute(program: &Program) -> IndexMap<String, JsValue> {
    let mut vars: IndexMap<String, JsValue> = program
        .variables
        .iter()
        .map(|name| (name.clone(), JsValue::Undefined))
        .collect();
    exec_block(&program.body, &mut vars);
    vars
}

fn exec_block(statements: &[Stmt], vars: &mut IndexMap<String, JsValue>) -> Signal {
    for stmt in statements {
        match exec(stmt, vars) {
            Signal::Normal => {}
            signal => return signal,
        }
    }
    Signal::Normal
}

fn exec(stmt: &Stmt, vars: &mut IndexMap<String, JsValue>) -> Signal {
    match stmt {
        Stmt::Expr(expr) => {
            eval(expr, vars);
            Signal::Normal
        }
        Stmt::If {
            condition,
            then,
            otherwise,
        } => {
            if eval(condition, vars).truthy() {
                exec_block(then, vars)
            } else {
                exec_block(otherwise, vars)
            }
        }
        Stmt::While { condition, body } => {
            for _ in 0..ITERATION_LIMIT {
                if !eval(condition, vars).truthy() {
                    return Signal::Normal;
                }
                if let Signal::Break = exec_block(body, vars) {
                    return Signal::Normal;
                }
            }
            panic!("while loop exceeded {} iterations", ITERATION_LIMIT);
        }
        Stmt::For {
            init,
            condition,
            update,
            body,
        } => {
            eval(init, vars);
            for _ in 0..ITERATION_LIMIT {
                if !eval(condition, vars).truthy() {
                    return Signal::Normal;
                }
                if let Signal::Break = exec_block(body, vars) {
                    return Signal::Normal;
                }
                eval(update, vars);
            }
            panic!("for loop exceeded {} iterations", ITERATION_LIMIT);
        }
        Stmt::ForEach {
            variable,
            sequence,
            body,
        } => {
            let JsValue::List(items) = eval(sequence, vars) else {
                panic!("for-of over a non-list");
            };
            for item in items {
                vars.insert(variable.clone(), item);
                if let Signal::Break = exec_block(body, vars) {
                    break;
                }
            }
            Signal::Normal
        }
        Stmt::Break => Signal::Break,
        Stmt::Continue => Signal::Continue,
    }
}

fn eval(expr: &Expr, vars: &mut IndexMap<String, JsValue>) -> JsValue {
    match expr {
        Expr::Null => JsValue::Null,
        Expr::Boolean(b) => JsValue::Boolean(*b),
        Expr::Number(n) => JsValue::Number(*n),
        Expr::Text(s) => JsValue::Text(s.clone()),
        Expr::List(items) => JsValue::List(items.iter().map(|item| eval(item, vars)).collect()),
        Expr::Variable(name) => vars.get(name).cloned().unwrap_or(JsValue::Undefined),
        Expr::Assign { name, value } => {
            let value = eval(value, vars);
            vars.insert(name.clone(), value.clone());
            value
        }
        Expr::Unary { op, operand } => {
            let value = eval(operand, vars);
            match op {
                UnaryOperator::Negate => JsValue::Number(-value.number()),
                UnaryOperator::Not => JsValue::Boolean(!value.truthy()),
                UnaryOperator::TypeOf => JsValue::Text(value.type_of().to_string()),
            }
        }
        Expr::Binary { op, left, right } => binary(*op, left, right, vars),
        Expr::Conditional {
            condition,
            then,
            otherwise,
        } => {
            if eval(condition, vars).truthy() {
                eval(then, vars)
            } else {
                eval(otherwise, vars)
            }
        }
        Expr::Call { function, args } => {
            let args: Vec<JsValue> = args.iter().map(|arg| eval(arg, vars)).collect();
            call(function, args)
        }
        Expr::Method {
            receiver,
            method,
            args,
        } => {
            assert!(args.is_empty(), "no string method takes arguments");
            let JsValue::Text(s) = eval(receiver, vars) else {
                panic!("`{}` called on a non-string", method);
            };
            JsValue::Text(match method.as_str() {
                "toUpperCase" => s.to_uppercase(),
                "toLowerCase" => s.to_lowercase(),
                "trim" => s.trim().to_string(),
                "trimStart" => s.trim_start().to_string(),
                "trimEnd" => s.trim_end().to_string(),
                other => panic!("unknown method `{}`", other),
            })
        }
        Expr::Member { object, property } => {
            assert_eq!(property, "length");
            match eval(object, vars) {
                JsValue::Text(s) => JsValue::Number(s.encode_utf16().count() as f64),
                JsValue::List(items) => JsValue::Number(items.len() as f64),
                other => panic!("no length on {:?}", other),
            }
        }
    }
}

fn binary(
    op: BinaryOperator,
    left: &Expr,
    right: &Expr,
    vars: &mut IndexMap<String, JsValue>,
) -> JsValue {
    use BinaryOperator::*;

    let a = eval(left, vars);
    match op {
        And if !a.truthy() => return a,
        Or if a.truthy() => return a,
        Coalesce if !matches!(a, JsValue::Null | JsValue::Undefined) => return a,
        And | Or | Coalesce => return eval(right, vars),
        _ => {}
    }
    let b = eval(right, vars);
    match op {
        Add => match (&a, &b) {
            (JsValue::Text(_), _) | (_, JsValue::Text(_)) | (JsValue::List(_), _) | (_, JsValue::List(_)) => {
                JsValue::Text(a.display() + &b.display())
            }
            _ => JsValue::Number(a.number() + b.number()),
        },
        Subtract => JsValue::Number(a.number() - b.number()),
        Multiply => JsValue::Number(a.number() * b.number()),
        Divide => JsValue::Number(a.number() / b.number()),
        Modulo => JsValue::Number(a.number() % b.number()),
        Power => JsValue::Number(a.number().powf(b.number())),
        Equal => JsValue::Boolean(strict_equal(&a, &b)),
        NotEqual => JsValue::Boolean(!strict_equal(&a, &b)),
        Less | LessOrEqual | Greater | GreaterOrEqual => {
            let ordering = match (&a, &b) {
                (JsValue::Text(x), JsValue::Text(y)) => Some(x.cmp(y)),
                _ => a.number().partial_cmp(&b.number()),
            };
            let result = match ordering {
                None => false,
                Some(ordering) => match op {
                    Less => ordering.is_lt(),
                    LessOrEqual => ordering.is_le(),
                    Greater => ordering.is_gt(),
                    _ => ordering.is_ge(),
                },
            };
            JsValue::Boolean(result)
        }
        And | Or | Coalesce => unreachable!(),
    }
}

fn strict_equal(a: &JsValue, b: &JsValue) -> bool {
    match (a, b) {
        (JsValue::Number(x), JsValue::Number(y)) => x == y,
        _ => a == b,
    }
}

fn call(function: &str, args: Vec<JsValue>) -> JsValue {
    let n = |i: usize| args.get(i).map(JsValue::number).unwrap_or(f64::NAN);
    match function {
        "String" => JsValue::Text(args.first().map(JsValue::display).unwrap_or_default()),
        "Math.sqrt" => JsValue::Number(n(0).sqrt()),
        "Math.abs" => JsValue::Number(n(0).abs()),
        "Math.log" => JsValue::Number(n(0).ln()),
        "Math.log10" => JsValue::Number(n(0).log10()),
        "Math.exp" => JsValue::Number(n(0).exp()),
        "Math.round" => JsValue::Number((n(0) + 0.5).floor()),
        "Math.ceil" => JsValue::Number(n(0).ceil()),
        "Math.floor" => JsValue::Number(n(0).floor()),
        "Math.min" => JsValue::Number(n(0).min(n(1))),
        "Math.max" => JsValue::Number(n(0).max(n(1))),
        "textToTitleCase" => JsValue::Text(engine::kinds::text::title_case(
            &args.first().map(JsValue::display).unwrap_or_default(),
        )),
        "listsRepeat" => {
            let item = args.first().cloned().unwrap_or(JsValue::Undefined);
            JsValue::List(vec![item; n(1) as usize])
        }
        other => panic!("unknown helper `{}`", other),
    }
}
