//! Process-wide cache of resolved message schemas.
//!
//! Schemas are keyed by the record's `TypeId` and resolved lazily on first
//! use. Resolution runs outside the lock; when two threads race on the same
//! type the first insert wins, which is safe because resolution is
//! deterministic.

use std::any::TypeId;
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;

use crate::error::SchemaError;
use crate::resolver;
use crate::types::{MessageRef, MessageSchema};

thread_local! {
    /// Types whose resolution is in progress on this thread.
    static RESOLVING: RefCell<Vec<TypeId>> = const { RefCell::new(Vec::new()) };
}

/// Table of resolved schemas keyed by record type.
#[derive(Default)]
pub struct SchemaRegistry {
    schemas: RwLock<HashMap<TypeId, Arc<MessageSchema>>>,
}

impl SchemaRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        SchemaRegistry::default()
    }

    /// Return the cached schema for `msg`, resolving it on first use.
    ///
    /// Failed resolutions are not cached; they fail identically on every call.
    pub fn schema_for(&self, msg: &MessageRef) -> Result<Arc<MessageSchema>, SchemaError> {
        let type_id = msg.type_id();
        if let Some(schema) = self.schemas.read().get(&type_id) {
            tracing::trace!(record = msg.name(), "schema cache hit");
            return Ok(Arc::clone(schema));
        }

        let schema = {
            let _guard = ResolvingGuard::enter(type_id);
            resolver::resolve(&msg.declaration())?
        };

        let mut schemas = self.schemas.write();
        let entry = schemas.entry(type_id).or_insert_with(|| {
            tracing::debug!(
                record = msg.name(),
                fields = schema.fields.len(),
                "resolved message schema"
            );
            Arc::new(schema)
        });
        Ok(Arc::clone(entry))
    }

    /// Whether a schema for `type_id` has been cached.
    pub fn contains(&self, type_id: TypeId) -> bool {
        self.schemas.read().contains_key(&type_id)
    }

    /// Number of cached schemas.
    pub fn len(&self) -> usize {
        self.schemas.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.read().is_empty()
    }
}

/// The registry shared by every encode/decode call in the process.
pub fn global() -> &'static SchemaRegistry {
    static GLOBAL: OnceLock<SchemaRegistry> = OnceLock::new();
    GLOBAL.get_or_init(SchemaRegistry::new)
}

/// Whether `type_id` is currently being resolved on this thread.
///
/// The resolver uses this to leave self-referential message fields to lazy
/// lookup instead of recursing forever.
pub fn is_resolving(type_id: TypeId) -> bool {
    RESOLVING.with(|stack| stack.borrow().contains(&type_id))
}

struct ResolvingGuard;

impl ResolvingGuard {
    fn enter(type_id: TypeId) -> Self {
        RESOLVING.with(|stack| stack.borrow_mut().push(type_id));
        ResolvingGuard
    }
}

impl Drop for ResolvingGuard {
    fn drop(&mut self) {
        RESOLVING.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DecodeError;
    use crate::traits::{ProtoMessage, ProtoType};
    use crate::types::{DeclaredType, FieldDecl, RecordDecl};
    use crate::value::Value;

    struct Leaf;

    impl ProtoType for Leaf {
        fn declared_type() -> DeclaredType {
            DeclaredType::Message(MessageRef::of::<Leaf>())
        }

        fn to_value(&self) -> Value {
            Value::new_message()
        }

        fn from_value(_value: Value) -> Result<Self, DecodeError> {
            Ok(Leaf)
        }
    }

    impl ProtoMessage for Leaf {
        const NAME: &'static str = "Leaf";

        fn declaration() -> RecordDecl {
            RecordDecl {
                name: "Leaf",
                fields: vec![FieldDecl::new("n", DeclaredType::Int)],
            }
        }
    }

    #[test]
    fn test_schema_cached_once() {
        let registry = SchemaRegistry::new();
        assert!(registry.is_empty());

        let first = registry.schema_for(&MessageRef::of::<Leaf>()).unwrap();
        let second = registry.schema_for(&MessageRef::of::<Leaf>()).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);
        assert!(registry.contains(TypeId::of::<Leaf>()));
    }

    #[test]
    fn test_resolving_guard_unwinds() {
        let id = TypeId::of::<Leaf>();
        {
            let _guard = ResolvingGuard::enter(id);
            assert!(is_resolving(id));
        }
        assert!(!is_resolving(id));
    }

    #[test]
    fn test_concurrent_first_use() {
        let registry = Arc::new(SchemaRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || registry.schema_for(&MessageRef::of::<Leaf>()).unwrap())
            })
            .collect();
        let schemas: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for schema in &schemas {
            assert_eq!(**schema, *schemas[0]);
        }
        assert_eq!(registry.len(), 1);
    }
}
