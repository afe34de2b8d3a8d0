//! Lazily populated caches of loaded enumerations and formats
//!
//! A [`SchemaRegistry`] resolves each enum or format name at most once per
//! registry and hands out shared references afterwards. Resolution failures
//! are logged and reported as `None`, and are not cached, so a fixed
//! descriptor is picked up on the next lookup.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::enumeration::Enum;
use crate::format::Format;
use crate::schema_loader::SchemaSource;

/// Shared cache of schema objects backed by a [`SchemaSource`]
pub struct SchemaRegistry {
    source: Box<dyn SchemaSource>,
    enums: RwLock<HashMap<String, Arc<Enum>>>,
    formats: RwLock<HashMap<String, Arc<Format>>>,
}

impl SchemaRegistry {
    /// Create a registry reading definitions from `source`
    pub fn new<S: SchemaSource + 'static>(source: S) -> Self {
        Self {
            source: Box::new(source),
            enums: RwLock::new(HashMap::new()),
            formats: RwLock::new(HashMap::new()),
        }
    }

    /// Get the enumeration called `name`, loading it on first use
    pub fn get_enum(&self, name: &str) -> Option<Arc<Enum>> {
        self.resolve_enum(name, &mut Vec::new())
    }

    fn resolve_enum(&self, name: &str, chain: &mut Vec<String>) -> Option<Arc<Enum>> {
        if let Some(cached) = self.enums.read().get(name) {
            return Some(Arc::clone(cached));
        }

        if chain.iter().any(|visited| visited == name) {
            log::warn!(
                "Enumeration {name} extends itself through {}",
                chain.join(" -> ")
            );
            return None;
        }

        log::debug!("Loading enumeration {name}");
        let definition = match self.source.enum_definition(name) {
            Ok(definition) => definition,
            Err(e) => {
                log::warn!("Couldn't load enumeration {name}: {e}");
                return None;
            }
        };

        let parent = match &definition.extends {
            Some(parent_name) => {
                chain.push(name.to_string());
                let parent = self.resolve_enum(parent_name, chain);
                chain.pop();
                parent
            }
            None => None,
        };

        let enumeration = Arc::new(definition.to_enum(name, parent.as_deref()));
        let mut enums = self.enums.write();
        let entry = enums
            .entry(name.to_string())
            .or_insert_with(|| Arc::clone(&enumeration));
        Some(Arc::clone(entry))
    }

    /// Get the format called `name`, loading it on first use
    pub fn get_format(&self, name: &str) -> Option<Arc<Format>> {
        if let Some(cached) = self.formats.read().get(name) {
            return Some(Arc::clone(cached));
        }

        log::debug!("Loading format {name}");
        let definition = match self.source.format_definition(name) {
            Ok(definition) => definition,
            Err(e) => {
                log::warn!("Couldn't load format {name}: {e}");
                return None;
            }
        };

        let format = Arc::new(definition.to_format(name, |enum_name| self.get_enum(enum_name)));
        let mut formats = self.formats.write();
        let entry = formats
            .entry(name.to_string())
            .or_insert_with(|| Arc::clone(&format));
        Some(Arc::clone(entry))
    }

    /// Number of cached enumerations
    pub fn cached_enums(&self) -> usize {
        self.enums.read().len()
    }

    /// Number of cached formats
    pub fn cached_formats(&self) -> usize {
        self.formats.read().len()
    }
}

impl fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaRegistry")
            .field("enums", &self.enums.read().keys().collect::<Vec<_>>())
            .field("formats", &self.formats.read().keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema_loader::{EnumDefinition, FormatDefinition, MemorySource};
    use crate::{Error, Result};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        inner: MemorySource,
        loads: Arc<AtomicUsize>,
    }

    impl SchemaSource for CountingSource {
        fn enum_definition(&self, name: &str) -> Result<EnumDefinition> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            self.inner.enum_definition(name)
        }

        fn format_definition(&self, name: &str) -> Result<FormatDefinition> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            self.inner.format_definition(name)
        }
    }

    fn source() -> MemorySource {
        MemorySource::new()
            .with_enum_yaml(
                "Element",
                "type: Unsigned\noptions:\n  - { name: Fire, value: 1 }\n",
            )
            .unwrap()
            .with_enum_yaml(
                "ElementEx",
                "type: Unsigned\nextends: Element\noptions:\n  - { name: Ice, value: 2 }\n",
            )
            .unwrap()
            .with_enum_yaml("Loop", "type: Unsigned\nextends: Loop\n")
            .unwrap()
            .with_format_yaml(
                "spell",
                "size: 4\nattributes:\n  - { name: element, type: Unsigned, offset: '0', enum: ElementEx }\n",
            )
            .unwrap()
    }

    #[test]
    fn test_resolves_once() {
        let loads = Arc::new(AtomicUsize::new(0));
        let registry = SchemaRegistry::new(CountingSource {
            inner: source(),
            loads: Arc::clone(&loads),
        });

        let first = registry.get_enum("Element").unwrap();
        let second = registry.get_enum("Element").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_format_resolves_enum_chain() {
        let registry = SchemaRegistry::new(source());
        let spell = registry.get_format("spell").unwrap();
        assert_eq!(
            spell.attribute("element").unwrap().enum_name.as_deref(),
            Some("ElementEx")
        );

        let element = registry.get_enum("ElementEx").unwrap();
        assert_eq!(element.get_unsigned("Fire").unwrap(), 1);
        assert_eq!(element.get_unsigned("Ice").unwrap(), 2);
        assert_eq!(registry.cached_enums(), 2);
        assert_eq!(registry.cached_formats(), 1);
    }

    #[test]
    fn test_failures_are_not_cached() {
        let loads = Arc::new(AtomicUsize::new(0));
        let registry = SchemaRegistry::new(CountingSource {
            inner: source(),
            loads: Arc::clone(&loads),
        });

        assert!(registry.get_format("missing").is_none());
        assert!(registry.get_format("missing").is_none());
        assert_eq!(loads.load(Ordering::SeqCst), 2);
        assert_eq!(registry.cached_formats(), 0);
    }

    #[test]
    fn test_cyclic_extends_is_broken() {
        let registry = SchemaRegistry::new(source());
        let looping = registry.get_enum("Loop").unwrap();
        assert!(looping.is_empty());
    }

    #[test]
    fn test_memory_source_missing_is_not_found() {
        assert!(matches!(
            source().enum_definition("Nope"),
            Err(Error::NotFound(_))
        ));
    }
}
