//! modelkit — adapter configuration and registry for a data-mapper
//! persistence layer.
//!
//! Purpose
//! - Describe storage backends as named, immutable descriptors (type +
//!   connection URI) collected in an [`AdapterRegistry`].
//! - Instantiate every registered descriptor into a live [`Adapter`] in one
//!   build pass, keeping a designated default for callers that do not name
//!   an adapter explicitly.
//! - Ship two backends: an in-memory adapter and, behind the `sqlite`
//!   feature (on by default), a SQLite adapter.
//!
//! Notes
//! - The registry is plain mutable state: populate it at startup, build it
//!   once, then treat it as read-mostly. It takes no locks of its own;
//!   concurrent mutation is the caller's problem.
//! - Built adapter instances are `Send + Sync` so they can be shared freely
//!   after the build phase.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

pub mod adapters;
pub mod descriptor;
pub mod mapper;
pub mod registry;

pub use adapters::MemoryAdapter;
#[cfg(feature = "sqlite")]
pub use adapters::SqliteAdapter;
pub use descriptor::{AdapterConfig, AdapterDescriptor};
pub use mapper::{Attribute, AttributeKind, Collection, Mapper};
pub use registry::{AdapterRegistry, DefaultMap, RegisterOptions};

/// Identifier under which an adapter is registered and later looked up.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AdapterName(String);

impl AdapterName {
    pub fn new<S: Into<String>>(s: S) -> Result<Self, ModelError> {
        let val = s.into();
        if val.is_empty() {
            return Err(ModelError::InvalidAdapterName("empty".into()));
        }
        if !val
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ModelError::InvalidAdapterName("invalid characters".into()));
        }
        Ok(Self(val))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for AdapterName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Storage backend kind a descriptor refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdapterType {
    /// In-memory storage (data lost on drop)
    Memory,
    /// SQLite file-based storage
    Sql,
}

impl AdapterType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdapterType::Memory => "memory",
            AdapterType::Sql => "sql",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "memory" => Some(AdapterType::Memory),
            "sql" | "sqlite" => Some(AdapterType::Sql),
            _ => None,
        }
    }
}

impl Display for AdapterType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity value assigned to a stored record by its adapter.
pub type RecordId = u64;

/// A single persisted record: attribute name → value.
///
/// The identity attribute is part of the record once it has been stored.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Persistence port implemented by every storage backend.
///
/// All operations are keyed by collection name as declared in the
/// [`Mapper`] the adapter was built with.
pub trait Adapter: Send + Sync {
    /// Store a new record, assigning and returning its identity.
    fn create(&self, collection: &str, record: Record) -> Result<RecordId, ModelError>;
    /// Fetch one record by identity.
    fn find(&self, collection: &str, id: RecordId) -> Result<Option<Record>, ModelError>;
    /// Fetch every record of a collection, ordered by identity.
    fn all(&self, collection: &str) -> Result<Vec<Record>, ModelError>;
    /// Replace every mapped attribute of an existing record.
    fn update(&self, collection: &str, id: RecordId, record: Record) -> Result<(), ModelError>;
    /// Remove one record by identity.
    fn delete(&self, collection: &str, id: RecordId) -> Result<(), ModelError>;
    /// Remove every record of a collection.
    fn clear(&self, collection: &str) -> Result<(), ModelError>;
}

/// Errors surfaced by descriptors and adapters.
///
/// The registry itself defines no failures; it propagates these without
/// interpretation and never retries.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("invalid adapter name: {0}")]
    InvalidAdapterName(String),
    #[error("adapter type `{0}` is not enabled in this build")]
    UnsupportedAdapter(AdapterType),
    #[error("unknown collection: {0}")]
    UnknownCollection(String),
    #[error("record not found")]
    NotFound,
    #[error("adapter error: {0}")]
    Adapter(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adapter_name_accepts_simple_values() {
        let n = AdapterName::new("primary-db_1").expect("valid name");
        assert_eq!(n.as_str(), "primary-db_1");
    }

    #[test]
    fn adapter_name_rejects_empty() {
        let err = AdapterName::new("").unwrap_err();
        assert!(matches!(err, ModelError::InvalidAdapterName(_)));
    }

    #[test]
    fn adapter_name_rejects_invalid_characters() {
        let err = AdapterName::new("no spaces").unwrap_err();
        assert!(matches!(err, ModelError::InvalidAdapterName(_)));
    }

    #[test]
    fn adapter_type_parsing() {
        assert_eq!(AdapterType::parse("memory"), Some(AdapterType::Memory));
        assert_eq!(AdapterType::parse("MEMORY"), Some(AdapterType::Memory));
        assert_eq!(AdapterType::parse("sql"), Some(AdapterType::Sql));
        assert_eq!(AdapterType::parse("sqlite"), Some(AdapterType::Sql));
        assert_eq!(AdapterType::parse("anything"), None);
    }

    #[test]
    fn adapter_type_round_trips_through_str() {
        for t in [AdapterType::Memory, AdapterType::Sql] {
            assert_eq!(AdapterType::parse(t.as_str()), Some(t));
        }
    }
}
