//! SQLite adapter, for file-based local storage.
//!
//! Purpose
//! - Persist mapped collections without cloud dependencies: one table per
//!   collection, created from the mapper at build time.
//! - Accepts `sqlite://PATH` URIs; bare paths and `:memory:` work too.
//!
//! Notes
//! - Uses `rusqlite` with the `bundled` feature for portability.
//! - Attribute kinds map onto SQLite column types; booleans are stored as
//!   integers, the identity column is `INTEGER PRIMARY KEY AUTOINCREMENT`.

use std::path::Path;
use std::sync::Mutex;

use indexmap::IndexMap;
use rusqlite::{params, params_from_iter, Connection};
use serde_json::Value;

use crate::mapper::{AttributeKind, Collection, Mapper};
use crate::{Adapter, ModelError, Record, RecordId};

/// SQLite-backed storage adapter.
pub struct SqliteAdapter {
    conn: Mutex<Connection>,
    collections: IndexMap<String, Collection>,
}

impl SqliteAdapter {
    /// Open (or create) the database behind `uri` and ensure one table per
    /// mapped collection.
    pub fn new(uri: &str, mapper: &Mapper) -> Result<Self, ModelError> {
        let path = database_path(uri);
        let conn = if path == ":memory:" {
            Connection::open_in_memory().map_err(map_sqerr)?
        } else {
            if let Some(dir) = Path::new(path).parent() {
                let _ = std::fs::create_dir_all(dir);
            }
            Connection::open(path).map_err(map_sqerr)?
        };

        let collections: IndexMap<String, Collection> = mapper
            .collections()
            .map(|c| (c.name.clone(), c.clone()))
            .collect();
        init_schema(&conn, collections.values())?;

        Ok(Self {
            conn: Mutex::new(conn),
            collections,
        })
    }

    fn collection(&self, name: &str) -> Result<&Collection, ModelError> {
        self.collections
            .get(name)
            .ok_or_else(|| ModelError::UnknownCollection(name.to_string()))
    }
}

/// Extract the filesystem path from a `sqlite://` URI; anything without the
/// scheme is treated as a path already.
fn database_path(uri: &str) -> &str {
    uri.strip_prefix("sqlite://").unwrap_or(uri)
}

fn map_sqerr<E: std::fmt::Display>(e: E) -> ModelError {
    ModelError::Adapter(format!("sqlite error: {e}"))
}

fn init_schema<'a>(
    conn: &Connection,
    collections: impl Iterator<Item = &'a Collection>,
) -> Result<(), ModelError> {
    for collection in collections {
        let mut columns = vec![format!(
            "{} INTEGER PRIMARY KEY AUTOINCREMENT",
            quote_ident(&collection.identity)
        )];
        for attr in &collection.attributes {
            columns.push(format!(
                "{} {}",
                quote_ident(&attr.name),
                column_type(attr.kind)
            ));
        }
        let ddl = format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            quote_ident(&collection.name),
            columns.join(", ")
        );
        conn.execute(&ddl, []).map_err(map_sqerr)?;
    }
    Ok(())
}

fn column_type(kind: AttributeKind) -> &'static str {
    match kind {
        AttributeKind::Integer | AttributeKind::Boolean => "INTEGER",
        AttributeKind::Real => "REAL",
        AttributeKind::Text => "TEXT",
    }
}

// Identifiers come from the mapper, not from user input; quoting keeps
// reserved words usable as names.
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn to_sql_value(value: &Value) -> rusqlite::types::Value {
    match value {
        Value::Null => rusqlite::types::Value::Null,
        Value::Bool(b) => rusqlite::types::Value::Integer(i64::from(*b)),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                rusqlite::types::Value::Integer(i)
            } else {
                rusqlite::types::Value::Real(n.as_f64().unwrap_or_default())
            }
        }
        Value::String(s) => rusqlite::types::Value::Text(s.clone()),
        // Nested structures are stored as their JSON text.
        other => rusqlite::types::Value::Text(other.to_string()),
    }
}

fn row_to_record(row: &rusqlite::Row, collection: &Collection) -> Result<Record, ModelError> {
    let mut record = Record::new();
    let id: i64 = row.get(0).map_err(map_sqerr)?;
    record.insert(collection.identity.clone(), Value::from(id));
    for (i, attr) in collection.attributes.iter().enumerate() {
        let idx = i + 1;
        let value = match attr.kind {
            AttributeKind::Integer => row
                .get::<_, Option<i64>>(idx)
                .map_err(map_sqerr)?
                .map_or(Value::Null, Value::from),
            AttributeKind::Real => row
                .get::<_, Option<f64>>(idx)
                .map_err(map_sqerr)?
                .map_or(Value::Null, Value::from),
            AttributeKind::Text => row
                .get::<_, Option<String>>(idx)
                .map_err(map_sqerr)?
                .map_or(Value::Null, Value::from),
            AttributeKind::Boolean => row
                .get::<_, Option<i64>>(idx)
                .map_err(map_sqerr)?
                .map_or(Value::Null, |v| Value::Bool(v != 0)),
        };
        record.insert(attr.name.clone(), value);
    }
    Ok(record)
}

fn select_columns(collection: &Collection) -> String {
    let mut cols = vec![quote_ident(&collection.identity)];
    cols.extend(collection.attributes.iter().map(|a| quote_ident(&a.name)));
    cols.join(", ")
}

impl Adapter for SqliteAdapter {
    fn create(&self, collection: &str, record: Record) -> Result<RecordId, ModelError> {
        let collection = self.collection(collection)?;
        let conn = self
            .conn
            .lock()
            .map_err(|_| ModelError::Adapter("mutex poisoned".into()))?;

        if collection.attributes.is_empty() {
            let sql = format!(
                "INSERT INTO {} DEFAULT VALUES",
                quote_ident(&collection.name)
            );
            conn.execute(&sql, []).map_err(map_sqerr)?;
        } else {
            let columns: Vec<_> = collection
                .attributes
                .iter()
                .map(|a| quote_ident(&a.name))
                .collect();
            let placeholders: Vec<_> = (1..=columns.len()).map(|i| format!("?{i}")).collect();
            let sql = format!(
                "INSERT INTO {} ({}) VALUES ({})",
                quote_ident(&collection.name),
                columns.join(", "),
                placeholders.join(", ")
            );
            let values: Vec<_> = collection
                .attributes
                .iter()
                .map(|a| to_sql_value(record.get(&a.name).unwrap_or(&Value::Null)))
                .collect();
            conn.execute(&sql, params_from_iter(values)).map_err(map_sqerr)?;
        }
        Ok(conn.last_insert_rowid() as RecordId)
    }

    fn find(&self, collection: &str, id: RecordId) -> Result<Option<Record>, ModelError> {
        let collection = self.collection(collection)?;
        let conn = self
            .conn
            .lock()
            .map_err(|_| ModelError::Adapter("mutex poisoned".into()))?;
        let sql = format!(
            "SELECT {} FROM {} WHERE {} = ?1",
            select_columns(collection),
            quote_ident(&collection.name),
            quote_ident(&collection.identity)
        );
        let mut stmt = conn.prepare(&sql).map_err(map_sqerr)?;
        let mut rows = stmt.query(params![id as i64]).map_err(map_sqerr)?;
        match rows.next().map_err(map_sqerr)? {
            Some(row) => Ok(Some(row_to_record(row, collection)?)),
            None => Ok(None),
        }
    }

    fn all(&self, collection: &str) -> Result<Vec<Record>, ModelError> {
        let collection = self.collection(collection)?;
        let conn = self
            .conn
            .lock()
            .map_err(|_| ModelError::Adapter("mutex poisoned".into()))?;
        let sql = format!(
            "SELECT {} FROM {} ORDER BY {}",
            select_columns(collection),
            quote_ident(&collection.name),
            quote_ident(&collection.identity)
        );
        let mut stmt = conn.prepare(&sql).map_err(map_sqerr)?;
        let mut rows = stmt.query([]).map_err(map_sqerr)?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().map_err(map_sqerr)? {
            out.push(row_to_record(row, collection)?);
        }
        Ok(out)
    }

    fn update(&self, collection: &str, id: RecordId, record: Record) -> Result<(), ModelError> {
        let collection = self.collection(collection)?;
        if collection.attributes.is_empty() {
            return self
                .find(&collection.name, id)?
                .map(|_| ())
                .ok_or(ModelError::NotFound);
        }
        let conn = self
            .conn
            .lock()
            .map_err(|_| ModelError::Adapter("mutex poisoned".into()))?;
        let assignments: Vec<_> = collection
            .attributes
            .iter()
            .enumerate()
            .map(|(i, a)| format!("{} = ?{}", quote_ident(&a.name), i + 1))
            .collect();
        let sql = format!(
            "UPDATE {} SET {} WHERE {} = ?{}",
            quote_ident(&collection.name),
            assignments.join(", "),
            quote_ident(&collection.identity),
            collection.attributes.len() + 1
        );
        let mut values: Vec<_> = collection
            .attributes
            .iter()
            .map(|a| to_sql_value(record.get(&a.name).unwrap_or(&Value::Null)))
            .collect();
        values.push(rusqlite::types::Value::Integer(id as i64));
        let changed = conn
            .execute(&sql, params_from_iter(values))
            .map_err(map_sqerr)?;
        if changed == 0 {
            Err(ModelError::NotFound)
        } else {
            Ok(())
        }
    }

    fn delete(&self, collection: &str, id: RecordId) -> Result<(), ModelError> {
        let collection = self.collection(collection)?;
        let conn = self
            .conn
            .lock()
            .map_err(|_| ModelError::Adapter("mutex poisoned".into()))?;
        let sql = format!(
            "DELETE FROM {} WHERE {} = ?1",
            quote_ident(&collection.name),
            quote_ident(&collection.identity)
        );
        let changed = conn.execute(&sql, params![id as i64]).map_err(map_sqerr)?;
        if changed == 0 {
            Err(ModelError::NotFound)
        } else {
            Ok(())
        }
    }

    fn clear(&self, collection: &str) -> Result<(), ModelError> {
        let collection = self.collection(collection)?;
        let conn = self
            .conn
            .lock()
            .map_err(|_| ModelError::Adapter("mutex poisoned".into()))?;
        let sql = format!("DELETE FROM {}", quote_ident(&collection.name));
        conn.execute(&sql, []).map_err(map_sqerr)?;
        Ok(())
    }
}
