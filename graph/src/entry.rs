use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A whole program as it comes out of the JSON loader.
///
/// Everything stays in raw form; the engine decides what a block
/// type means when it builds the workspace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SerializedGraph {
    /// Heads of the top-level statement chains, in program order.
    #[serde(default)]
    pub blocks: Vec<BlockEntry>,
    /// Module-level variables declared outside the statement chains.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variables: Vec<VariableDeclaration>,
}

impl SerializedGraph {
    /// Count every block entry, including nested slots, shadows and `next` links.
    pub fn block_count(&self) -> usize {
        self.blocks.iter().map(BlockEntry::tree_size).sum()
    }
}

/// One serialized block node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockEntry {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub id: String,
    /// Literal configuration: strings, numbers, booleans, or variable references
    /// of the form `{"id": …}` / `{"name": …}`.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub fields: IndexMap<String, Value>,
    /// Expression slots, in declared order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<SlotEntry>,
    /// Statement slots, in declared order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub statements: Vec<SlotEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Structural attributes, possibly nested one level.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub mutation: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<Box<BlockEntry>>,
}

impl BlockEntry {
    pub fn new(kind: impl Into<String>) -> Self {
        let mut entry = BlockEntry::default();
        entry.kind = kind.into();
        entry
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn with_input(mut self, name: impl Into<String>, block: BlockEntry) -> Self {
        self.inputs.push(SlotEntry::filled(name, block));
        self
    }

    pub fn with_statement(mut self, name: impl Into<String>, block: BlockEntry) -> Self {
        self.statements.push(SlotEntry::filled(name, block));
        self
    }

    pub fn with_mutation(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.mutation.insert(name.into(), value.into());
        self
    }

    pub fn with_next(mut self, next: BlockEntry) -> Self {
        self.next = Some(Box::new(next));
        self
    }

    /// Iterate this entry and its `next` successors.
    pub fn chain(&self) -> impl Iterator<Item = &BlockEntry> {
        std::iter::successors(Some(self), |&entry| entry.next.as_deref())
    }

    fn tree_size(&self) -> usize {
        self.chain()
            .map(|entry| {
                let slots: usize = entry
                    .inputs
                    .iter()
                    .chain(&entry.statements)
                    .map(|slot| {
                        slot.block.as_deref().map_or(0, BlockEntry::tree_size)
                            + slot.shadow.as_deref().map_or(0, BlockEntry::tree_size)
                    })
                    .sum();
                1 + slots
            })
            .sum()
    }
}

impl Drop for BlockEntry {
    // Unlink the `next` chain one entry at a time; the derived drop would
    // recurse once per link.
    fn drop(&mut self) {
        let mut next = self.next.take();
        while let Some(mut entry) = next {
            next = entry.next.take();
        }
    }
}

/// A named input or statement slot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlotEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block: Option<Box<BlockEntry>>,
    /// Placeholder used when no real block is plugged in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shadow: Option<Box<BlockEntry>>,
}

impl SlotEntry {
    pub fn empty(name: impl Into<String>) -> Self {
        SlotEntry {
            name: name.into(),
            block: None,
            shadow: None,
        }
    }

    pub fn filled(name: impl Into<String>, block: BlockEntry) -> Self {
        SlotEntry {
            name: name.into(),
            block: Some(Box::new(block)),
            shadow: None,
        }
    }

    /// The block occupying this slot: the real block, else the shadow.
    pub fn payload(&self) -> Option<&BlockEntry> {
        self.block.as_deref().or(self.shadow.as_deref())
    }
}

/// A module-level variable declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDeclaration {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}
