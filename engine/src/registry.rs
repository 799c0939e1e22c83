use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::error::{EngineError, Result};
use crate::kinds::BlockKind;

/// Creates a fresh behaviour for one block.
pub type Factory = Arc<dyn Fn() -> Box<dyn BlockKind> + Send + Sync>;

/// Maps block type tags to the factories that build their behaviour.
/// Registering a tag twice replaces the earlier factory.
#[derive(Clone, Default)]
pub struct Registry {
    factories: HashMap<String, Factory>,
}

impl Registry {
    /// An empty registry with no kinds at all.
    pub fn new() -> Self {
        Registry::default()
    }

    /// A registry holding every built-in kind.
    pub fn standard() -> Self {
        let mut registry = Registry::new();
        crate::stdlib::register(&mut registry);
        registry
    }

    /// Register `factory` under `tag`, returning the factory it replaced.
    pub fn register<F>(&mut self, tag: impl Into<String>, factory: F) -> Option<Factory>
    where
        F: Fn() -> Box<dyn BlockKind> + Send + Sync + 'static,
    {
        let tag = tag.into();
        let previous = self.factories.insert(tag.clone(), Arc::new(factory));
        if previous.is_some() {
            debug!(tag = %tag, "replaced block kind");
        }
        previous
    }

    /// Register a kind that needs no configuration.
    pub fn register_kind<K>(&mut self, tag: impl Into<String>) -> Option<Factory>
    where
        K: BlockKind + Default + 'static,
    {
        self.register(tag, || Box::new(K::default()) as Box<dyn BlockKind>)
    }

    pub fn create(&self, tag: &str) -> Result<Box<dyn BlockKind>> {
        self.factories
            .get(tag)
            .map(|factory| factory())
            .ok_or_else(|| EngineError::UnknownBlockKind(tag.to_string()))
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.factories.contains_key(tag)
    }

    /// All registered tags, sorted.
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.factories.keys().map(|s| s.as_str()).collect();
        tags.sort_unstable();
        tags
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("tags", &self.tags())
            .finish()
    }
}
