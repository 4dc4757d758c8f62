//! Entity-to-collection mapping passed to adapter construction.
//!
//! A [`Mapper`] declares which collections exist and which typed attributes
//! each one carries. Adapters consume it at build time: the SQLite backend
//! derives its schema from it, the memory backend seeds one store per
//! collection. The registry itself never inspects it.

use indexmap::IndexMap;

/// Value kind a mapped attribute can hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttributeKind {
    Integer,
    Real,
    Text,
    Boolean,
}

/// One typed attribute of a collection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub kind: AttributeKind,
}

/// A named collection of records with a fixed attribute set.
///
/// The identity column is managed by the adapter, not declared as an
/// attribute; it defaults to `id`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Collection {
    pub name: String,
    pub identity: String,
    pub attributes: Vec<Attribute>,
}

impl Collection {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            identity: "id".to_string(),
            attributes: Vec::new(),
        }
    }

    /// Append an attribute, keeping declaration order.
    pub fn attribute<S: Into<String>>(mut self, name: S, kind: AttributeKind) -> Self {
        self.attributes.push(Attribute {
            name: name.into(),
            kind,
        });
        self
    }
}

/// Ordered set of collection definitions.
#[derive(Clone, Debug, Default)]
pub struct Mapper {
    collections: IndexMap<String, Collection>,
}

impl Mapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a collection. A collection registered under an existing name
    /// replaces the previous definition.
    pub fn collection(mut self, collection: Collection) -> Self {
        self.collections
            .insert(collection.name.clone(), collection);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Collection> {
        self.collections.get(name)
    }

    pub fn collections(&self) -> impl Iterator<Item = &Collection> {
        self.collections.values()
    }

    pub fn len(&self) -> usize {
        self.collections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collections_keep_declaration_order() {
        let mapper = Mapper::new()
            .collection(Collection::new("books").attribute("title", AttributeKind::Text))
            .collection(Collection::new("authors").attribute("name", AttributeKind::Text));
        let names: Vec<_> = mapper.collections().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["books", "authors"]);
    }

    #[test]
    fn redefining_a_collection_replaces_it() {
        let mapper = Mapper::new()
            .collection(Collection::new("books").attribute("title", AttributeKind::Text))
            .collection(Collection::new("books").attribute("isbn", AttributeKind::Text));
        let books = mapper.get("books").expect("collection present");
        assert_eq!(books.attributes.len(), 1);
        assert_eq!(books.attributes[0].name, "isbn");
    }

    #[test]
    fn identity_defaults_to_id() {
        let c = Collection::new("books");
        assert_eq!(c.identity, "id");
    }
}
