use std::collections::HashMap;

use graph::{BlockEntry, SerializedGraph, VariableDeclaration};
use serde_json::Value as Json;
use tracing::debug;

use crate::block::{Block, Comment, Field, Mutation, Statement, Value};
use crate::error::{EngineError, Result};
use crate::kinds::MUTATION_DOMAIN;
use crate::registry::Registry;
use crate::workspace::Workspace;

/// Builds workspaces from serialized graphs using the kinds in a registry.
#[derive(Debug, Clone, Copy)]
pub struct Parser<'r> {
    registry: &'r Registry,
}

impl<'r> Parser<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Parser { registry }
    }

    /// Decode JSON text and build its workspace.
    pub fn parse_json(&self, json: &str) -> Result<Workspace> {
        let graph =
            graph::load_from_json(json).map_err(|e| EngineError::MalformedGraph(e.to_string()))?;
        self.parse(&graph)
    }

    pub fn parse(&self, graph: &SerializedGraph) -> Result<Workspace> {
        let builder = Builder::new(self.registry, &graph.variables)?;

        let mut blocks = Vec::with_capacity(graph.variables.len() + graph.blocks.len());
        for declaration in &graph.variables {
            blocks.push(builder.build_chain(&declare_global(declaration))?);
        }
        for head in &graph.blocks {
            blocks.push(builder.build_chain(head)?);
        }

        debug!(
            chains = graph.blocks.len(),
            globals = graph.variables.len(),
            "parsed workspace"
        );
        Ok(Workspace::new(blocks))
    }
}

/// `x = x`: puts a declared global in the root without clobbering a host binding.
fn declare_global(declaration: &VariableDeclaration) -> BlockEntry {
    let id = declaration
        .id
        .clone()
        .unwrap_or_else(|| format!("global:{}", declaration.name));
    BlockEntry::new("variables_set")
        .with_id(id.clone())
        .with_field("VAR", declaration.name.as_str())
        .with_input(
            "VALUE",
            BlockEntry::new("variables_get")
                .with_id(format!("{}:value", id))
                .with_field("VAR", declaration.name.as_str()),
        )
}

struct Builder<'a> {
    registry: &'a Registry,
    /// Declared variable ids to names.
    variable_ids: HashMap<&'a str, &'a str>,
}

impl<'a> Builder<'a> {
    fn new(registry: &'a Registry, variables: &'a [VariableDeclaration]) -> Result<Self> {
        let mut variable_ids = HashMap::new();
        for declaration in variables {
            if declaration.name.is_empty() {
                return Err(EngineError::MalformedGraph(
                    "declared variable with an empty name".to_string(),
                ));
            }
            if let Some(id) = &declaration.id {
                variable_ids.insert(id.as_str(), declaration.name.as_str());
            }
        }
        debug!(count = variables.len(), "synthesizing declared globals");
        Ok(Builder {
            registry,
            variable_ids,
        })
    }

    /// Build a `next`-linked sequence, linking from the tail so long chains
    /// never recurse.
    fn build_chain(&self, head: &BlockEntry) -> Result<Block> {
        let mut built = head
            .chain()
            .map(|entry| self.build_block(entry))
            .collect::<Result<Vec<_>>>()?;
        let mut next: Option<Box<Block>> = None;
        while let Some(mut block) = built.pop() {
            block.next = next;
            next = Some(Box::new(block));
        }
        next.map(|block| *block)
            .ok_or_else(|| EngineError::MalformedGraph("empty block chain".to_string()))
    }

    fn build_block(&self, entry: &BlockEntry) -> Result<Block> {
        if entry.kind.is_empty() {
            return Err(EngineError::MalformedGraph(format!(
                "block `{}` has an empty type",
                entry.id
            )));
        }
        let kind = self.registry.create(&entry.kind)?;
        let mut block = Block::new(entry.kind.clone(), entry.id.clone(), kind);

        for (name, raw) in &entry.fields {
            let value = self.field_text(entry, name, raw)?;
            block.fields.insert(
                name.clone(),
                Field {
                    name: name.clone(),
                    value,
                },
            );
        }

        for slot in &entry.inputs {
            check_slot_name(entry, &slot.name, block.values.contains_key(&slot.name))?;
            let nested = match slot.payload() {
                Some(nested) => Some(Box::new(self.build_chain(nested)?)),
                None => None,
            };
            block.values.insert(
                slot.name.clone(),
                Value {
                    name: slot.name.clone(),
                    block: nested,
                },
            );
        }

        for slot in &entry.statements {
            check_slot_name(entry, &slot.name, block.statements.contains_key(&slot.name))?;
            let nested = match slot.payload() {
                Some(nested) => Some(Box::new(self.build_chain(nested)?)),
                None => None,
            };
            block.statements.insert(
                slot.name.clone(),
                Statement {
                    name: slot.name.clone(),
                    block: nested,
                },
            );
        }

        if let Some(text) = &entry.comment {
            block.comments.push(Comment { text: text.clone() });
        }

        for (key, value) in &entry.mutation {
            match value {
                Json::Object(members) => {
                    for (name, member) in members {
                        block.mutations.push(Mutation {
                            domain: key.clone(),
                            name: name.clone(),
                            value: mutation_text(member),
                        });
                    }
                }
                other => block.mutations.push(Mutation {
                    domain: MUTATION_DOMAIN.to_string(),
                    name: key.clone(),
                    value: mutation_text(other),
                }),
            }
        }

        Ok(block)
    }

    fn field_text(&self, entry: &BlockEntry, name: &str, raw: &Json) -> Result<String> {
        match raw {
            Json::String(s) => Ok(s.clone()),
            Json::Number(n) => Ok(n.to_string()),
            Json::Bool(b) => Ok(if *b { "TRUE" } else { "FALSE" }.to_string()),
            Json::Object(reference) => {
                if let Some(variable) = reference.get("name").and_then(Json::as_str) {
                    return Ok(variable.to_string());
                }
                let Some(id) = reference.get("id").and_then(Json::as_str) else {
                    return Err(malformed_field(entry, name, "a reference needs a `name` or `id`"));
                };
                self.variable_ids
                    .get(id)
                    .map(|variable| variable.to_string())
                    .ok_or_else(|| {
                        malformed_field(entry, name, &format!("undeclared variable id `{}`", id))
                    })
            }
            Json::Null | Json::Array(_) => {
                Err(malformed_field(entry, name, "expected a string, number, boolean or reference"))
            }
        }
    }
}

fn check_slot_name(entry: &BlockEntry, name: &str, duplicate: bool) -> Result<()> {
    if name.is_empty() {
        return Err(EngineError::MalformedGraph(format!(
            "block `{}` ({}) has a slot with an empty name",
            entry.kind, entry.id
        )));
    }
    if duplicate {
        return Err(EngineError::MalformedGraph(format!(
            "block `{}` ({}) declares slot `{}` twice",
            entry.kind, entry.id, name
        )));
    }
    Ok(())
}

fn malformed_field(entry: &BlockEntry, name: &str, problem: &str) -> EngineError {
    EngineError::MalformedGraph(format!(
        "field `{}` of block `{}` ({}): {}",
        name, entry.kind, entry.id, problem
    ))
}

fn mutation_text(value: &Json) -> String {
    match value {
        Json::String(s) => s.clone(),
        Json::Null => String::new(),
        other => other.to_string(),
    }
}
