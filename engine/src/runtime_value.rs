use std::fmt;

use crate::error::{EngineError, Result};

/// A runtime value produced by evaluating a block.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RuntimeValue {
    #[default]
    Null,
    Boolean(bool),
    Number(f64),
    Text(String),
    List(Vec<RuntimeValue>),
}

impl RuntimeValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            RuntimeValue::Null => "Null",
            RuntimeValue::Boolean(_) => "Boolean",
            RuntimeValue::Number(_) => "Number",
            RuntimeValue::Text(_) => "Text",
            RuntimeValue::List(_) => "List",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, RuntimeValue::Null)
    }

    /// Interpret the value as a branch or loop condition.
    /// An empty slot (null) counts as false.
    pub fn as_condition(&self) -> Result<bool> {
        match self {
            RuntimeValue::Boolean(b) => Ok(*b),
            RuntimeValue::Null => Ok(false),
            other => Err(EngineError::type_mismatch("Boolean", other.type_name())),
        }
    }

    pub fn as_number(&self) -> Result<f64> {
        match self {
            RuntimeValue::Number(n) => Ok(*n),
            other => Err(EngineError::type_mismatch("Number", other.type_name())),
        }
    }

    pub fn as_list(&self) -> Result<&[RuntimeValue]> {
        match self {
            RuntimeValue::List(items) => Ok(items),
            other => Err(EngineError::type_mismatch("List", other.type_name())),
        }
    }

    /// Convert a host-supplied JSON value. Objects have no runtime counterpart.
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        use serde_json::Value;
        Ok(match value {
            Value::Null => RuntimeValue::Null,
            Value::Bool(b) => RuntimeValue::Boolean(*b),
            Value::Number(n) => RuntimeValue::Number(n.as_f64().unwrap_or(f64::NAN)),
            Value::String(s) => RuntimeValue::Text(s.clone()),
            Value::Array(items) => RuntimeValue::List(
                items
                    .iter()
                    .map(RuntimeValue::from_json)
                    .collect::<Result<_>>()?,
            ),
            Value::Object(_) => {
                return Err(EngineError::type_mismatch(
                    "null, boolean, number, text or list",
                    "object",
                ));
            }
        })
    }

    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value;
        match self {
            RuntimeValue::Null => Value::Null,
            RuntimeValue::Boolean(b) => Value::Bool(*b),
            RuntimeValue::Number(n) => {
                if let Some(i) = integral(*n) {
                    Value::from(i)
                } else {
                    serde_json::Number::from_f64(*n)
                        .map(Value::Number)
                        .unwrap_or_else(|| Value::String(self.to_string()))
                }
            }
            RuntimeValue::Text(s) => Value::String(s.clone()),
            RuntimeValue::List(items) => Value::Array(items.iter().map(|v| v.to_json()).collect()),
        }
    }
}

/// The integer a number prints as, if it has no fractional part.
fn integral(n: f64) -> Option<i64> {
    if n.is_finite() && n == n.floor() && n.abs() < 1e15 {
        Some(n as i64)
    } else {
        None
    }
}

/// Render a number the way the generated target prints it.
pub fn format_number(n: f64) -> String {
    if let Some(i) = integral(n) {
        i.to_string()
    } else if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let text = if n > 0.0 { "Infinity" } else { "-Infinity" };
        text.to_string()
    } else {
        n.to_string()
    }
}

impl fmt::Display for RuntimeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeValue::Null => write!(f, "null"),
            RuntimeValue::Boolean(b) => write!(f, "{}", b),
            RuntimeValue::Number(n) => write!(f, "{}", format_number(*n)),
            RuntimeValue::Text(s) => write!(f, "{}", s),
            RuntimeValue::List(items) => {
                // Nulls inside a list render as empty entries.
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    if !item.is_null() {
                        write!(f, "{}", item)?;
                    }
                }
                Ok(())
            }
        }
    }
}

impl From<bool> for RuntimeValue {
    fn from(b: bool) -> Self {
        RuntimeValue::Boolean(b)
    }
}

impl From<f64> for RuntimeValue {
    fn from(n: f64) -> Self {
        RuntimeValue::Number(n)
    }
}

impl From<i32> for RuntimeValue {
    fn from(n: i32) -> Self {
        RuntimeValue::Number(n as f64)
    }
}

impl From<&str> for RuntimeValue {
    fn from(s: &str) -> Self {
        RuntimeValue::Text(s.to_string())
    }
}

impl From<String> for RuntimeValue {
    fn from(s: String) -> Self {
        RuntimeValue::Text(s)
    }
}

impl From<Vec<RuntimeValue>> for RuntimeValue {
    fn from(items: Vec<RuntimeValue>) -> Self {
        RuntimeValue::List(items)
    }
}
