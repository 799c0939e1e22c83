use anyhow::{Context, Result, bail};
use engine::RuntimeValue;

/// Convert a TOML value from a globals table or an expectation.
pub fn from_toml(value: &toml::Value) -> Result<RuntimeValue> {
    Ok(match value {
        toml::Value::Integer(n) => RuntimeValue::Number(*n as f64),
        toml::Value::Float(f) => RuntimeValue::Number(*f),
        toml::Value::Boolean(b) => RuntimeValue::Boolean(*b),
        toml::Value::String(s) => RuntimeValue::Text(s.clone()),
        toml::Value::Array(items) => {
            RuntimeValue::List(items.iter().map(from_toml).collect::<Result<_>>()?)
        }
        toml::Value::Datetime(d) => bail!("datetime `{}` has no runtime value", d),
        toml::Value::Table(_) => bail!("tables have no runtime value"),
    })
}

/// Read every entry of a `[globals]`-style table.
pub fn bindings_from_table(table: &toml::Table) -> Result<Vec<(String, RuntimeValue)>> {
    table
        .iter()
        .map(|(name, value)| {
            let value = from_toml(value).with_context(|| format!("global `{}`", name))?;
            Ok((name.clone(), value))
        })
        .collect()
}

/// TOML has no null, so null values (even inside lists) have no TOML form.
pub fn to_toml(value: &RuntimeValue) -> Option<toml::Value> {
    Some(match value {
        RuntimeValue::Null => return None,
        RuntimeValue::Boolean(b) => toml::Value::Boolean(*b),
        RuntimeValue::Number(n) => {
            if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
                toml::Value::Integer(*n as i64)
            } else {
                toml::Value::Float(*n)
            }
        }
        RuntimeValue::Text(s) => toml::Value::String(s.clone()),
        RuntimeValue::List(items) => {
            toml::Value::Array(items.iter().map(to_toml).collect::<Option<_>>()?)
        }
    })
}

/// Render root bindings as TOML lines, in binding order. Values without a
/// TOML form are written as comments carrying their JSON rendering.
pub fn render_toml<'a>(
    bindings: impl IntoIterator<Item = (&'a String, &'a RuntimeValue)>,
) -> String {
    let mut out = String::new();
    for (name, value) in bindings {
        let key = toml_key(name);
        match to_toml(value) {
            Some(value) => out.push_str(&format!("{} = {}\n", key, value)),
            None => out.push_str(&format!("# {} = {}\n", key, value.to_json())),
        }
    }
    out
}

pub fn render_json<'a>(
    bindings: impl IntoIterator<Item = (&'a String, &'a RuntimeValue)>,
) -> Result<String> {
    let object: serde_json::Map<String, serde_json::Value> = bindings
        .into_iter()
        .map(|(name, value)| (name.clone(), value.to_json()))
        .collect();
    Ok(serde_json::to_string_pretty(&object)?)
}

fn toml_key(name: &str) -> String {
    let bare = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if bare {
        name.to_string()
    } else {
        toml::Value::String(name.to_string()).to_string()
    }
}

