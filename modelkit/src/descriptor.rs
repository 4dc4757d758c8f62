//! Adapter configuration descriptors.
//!
//! [`AdapterConfig`] is the seam the registry builds adapters through; it
//! never sees a concrete backend. [`AdapterDescriptor`] is the shipped
//! implementation covering the built-in backends.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::adapters::MemoryAdapter;
#[cfg(feature = "sqlite")]
use crate::adapters::SqliteAdapter;
use crate::mapper::Mapper;
use crate::{Adapter, AdapterType, ModelError};

/// Constructs and instantiates adapter configurations.
///
/// `Clone` lets the registry keep a default slot by value; `PartialEq`
/// powers the default check during the build pass.
pub trait AdapterConfig: Clone + PartialEq + Sized {
    /// Construct a descriptor from a backend kind and a connection URI.
    ///
    /// Validation beyond recording the inputs is up to the implementation;
    /// failures surface through `AdapterRegistry::register` unchanged.
    fn new(adapter_type: AdapterType, uri: &str) -> Result<Self, ModelError>;

    /// Instantiate the described adapter against `mapper`.
    fn build(&self, mapper: &Mapper) -> Result<Arc<dyn Adapter>, ModelError>;
}

/// Immutable record of an adapter configuration: backend kind plus
/// connection URI. The URI is stored as given, uninterpreted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterDescriptor {
    #[serde(rename = "type")]
    adapter_type: AdapterType,
    uri: String,
}

impl AdapterDescriptor {
    pub fn adapter_type(&self) -> AdapterType {
        self.adapter_type
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }
}

impl AdapterConfig for AdapterDescriptor {
    fn new(adapter_type: AdapterType, uri: &str) -> Result<Self, ModelError> {
        Ok(Self {
            adapter_type,
            uri: uri.to_string(),
        })
    }

    fn build(&self, mapper: &Mapper) -> Result<Arc<dyn Adapter>, ModelError> {
        match self.adapter_type {
            AdapterType::Memory => Ok(Arc::new(MemoryAdapter::new(mapper))),
            #[cfg(feature = "sqlite")]
            AdapterType::Sql => Ok(Arc::new(SqliteAdapter::new(&self.uri, mapper)?)),
            #[cfg(not(feature = "sqlite"))]
            AdapterType::Sql => Err(ModelError::UnsupportedAdapter(self.adapter_type)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::{AttributeKind, Collection};

    fn mapper() -> Mapper {
        Mapper::new()
            .collection(Collection::new("books").attribute("title", AttributeKind::Text))
    }

    #[test]
    fn descriptor_records_type_and_uri() {
        let d = AdapterDescriptor::new(AdapterType::Memory, "memory://x").unwrap();
        assert_eq!(d.adapter_type(), AdapterType::Memory);
        assert_eq!(d.uri(), "memory://x");
    }

    #[test]
    fn memory_descriptor_builds_a_working_adapter() {
        let d = AdapterDescriptor::new(AdapterType::Memory, "memory://x").unwrap();
        let adapter = d.build(&mapper()).unwrap();
        let mut record = crate::Record::new();
        record.insert("title".into(), serde_json::Value::String("dune".into()));
        let id = adapter.create("books", record).unwrap();
        assert!(adapter.find("books", id).unwrap().is_some());
    }

    #[cfg(feature = "sqlite")]
    #[test]
    fn sql_descriptor_builds_a_sqlite_adapter() {
        let dir = tempfile::tempdir().expect("tempdir");
        let uri = format!("sqlite://{}", dir.path().join("books.db").display());
        let d = AdapterDescriptor::new(AdapterType::Sql, &uri).unwrap();
        let adapter = d.build(&mapper()).unwrap();
        assert_eq!(adapter.all("books").unwrap().len(), 0);
    }

    #[test]
    fn descriptor_serializes_with_a_type_field() {
        let d = AdapterDescriptor::new(AdapterType::Sql, "sqlite://test.db").unwrap();
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["type"], "sql");
        assert_eq!(json["uri"], "sqlite://test.db");
    }
}
